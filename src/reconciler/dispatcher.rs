// src/reconciler/dispatcher.rs
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::app_log;
use crate::core::ReviewApi;
use crate::reconciler::refresher::{refresh_statuses, RefreshOutcome, RetryPolicy};
use crate::types::{CandidateRow, Decision, DecisionRequest};

/// Transient message shown after a decision
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "message", rename_all = "lowercase")]
pub enum Notification {
    Success(String),
    Error(String),
}

impl Notification {
    pub fn is_success(&self) -> bool {
        matches!(self, Notification::Success(_))
    }

    pub fn message(&self) -> &str {
        match self {
            Notification::Success(message) | Notification::Error(message) => message,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DispatchOutcome {
    pub notification: Notification,
    /// Re-read of the pending set plus the acted-on row. `None` when the
    /// write failed or the re-read was cancelled; state must stay as it was.
    pub refreshed: Option<RefreshOutcome>,
}

/// Send one decision, then re-read statuses.
///
/// The decision and status services are separate systems, so the acted-on
/// row is taken out of `pending` and re-read with `post_write` (its own
/// initial delay and attempt cap) while the remaining pending rows are
/// re-read with `refresh`.
pub async fn dispatch_decision(
    api: &dyn ReviewApi,
    row: &CandidateRow,
    action: Decision,
    pending: &[CandidateRow],
    refresh: &RetryPolicy,
    post_write: &RetryPolicy,
    cancel: &CancellationToken,
) -> DispatchOutcome {
    let key = row.key();
    let request = DecisionRequest::new(&key, action);

    if let Err(e) = api.send_decision(&request).await {
        app_log!(error, "Failed to {} candidate {}: {:#}", action, key, e);
        return DispatchOutcome {
            notification: Notification::Error(format!(
                "Could not {} candidate {} for job {}",
                action, key.candidate_id, key.job_id
            )),
            refreshed: None,
        };
    }

    app_log!(info, "Recorded {} decision for {}", action, key);

    let remaining: Vec<CandidateRow> = pending
        .iter()
        .filter(|candidate| !candidate.matches(&key))
        .cloned()
        .collect();

    let (rest, acted) = tokio::join!(
        refresh_statuses(api, remaining, refresh, cancel),
        refresh_statuses(api, vec![row.clone()], post_write, cancel),
    );

    let refreshed = match (rest, acted) {
        (Some(mut rest), Some(acted)) => {
            rest.extend(acted);
            Some(rest)
        }
        _ => None,
    };

    let verb = match action {
        Decision::Approve => "approved",
        Decision::Reject => "rejected",
    };
    DispatchOutcome {
        notification: Notification::Success(format!(
            "Candidate {} {} for job {}",
            key.candidate_id, verb, key.job_id
        )),
        refreshed,
    }
}
