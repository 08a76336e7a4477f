//! Company-side candidate review: loads candidate/job rows, reconciles them
//! with manually recorded statuses and dispatches reviewer decisions.

pub mod cli;
pub mod core;
pub mod environment;
pub mod logging;
pub mod reconciler;
pub mod session;
pub mod types;
pub mod web;

pub use environment::ReviewConfig;
pub use reconciler::{
    CandidateReconciler, LoadOutcome, LoadPhase, Notification, ReviewState, RowQuery,
};
pub use session::CompanySession;
pub use web::start_web_server;

/// Log through `tracing` at the given level: `app_log!(info, "...", args)`
#[macro_export]
macro_rules! app_log {
    ($level:ident, $($arg:tt)+) => {
        ::tracing::$level!($($arg)+)
    };
}
