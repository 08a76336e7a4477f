// src/reconciler/mod.rs
//! Candidate status reconciliation for the company review page.
//!
//! A load fetches the baseline rows, enriches them with manual statuses and
//! commits both partitions in one write. Decisions go through the
//! dispatcher and commit the re-read the same way.

pub mod dispatcher;
pub mod loader;
pub mod merger;
pub mod refresher;

pub use dispatcher::{dispatch_decision, DispatchOutcome, Notification};
pub use loader::load_baseline;
pub use merger::{
    apply_query, merge_rows, RowQuery, SortDirection, SortField, SortSpec, StatusFilter,
};
pub use refresher::{refresh_statuses, RefreshOutcome, RetryPolicy};

use anyhow::Result;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{watch, Mutex as AsyncMutex, RwLock};
use tokio_util::sync::CancellationToken;

use crate::app_log;
use crate::core::ReviewApi;
use crate::environment::ReviewConfig;
use crate::session::CompanySession;
use crate::types::{CandidateRow, Decision, RowKey};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", content = "detail", rename_all = "snake_case")]
pub enum LoadPhase {
    #[default]
    Idle,
    Loading,
    Ready,
    /// No company identity in the session; terminal until sign-in
    MissingCompany,
    Failed(String),
}

/// How a `load` call ended when it did not fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Ready,
    /// A newer `load` or a `reset` took over; this call committed nothing
    Superseded,
}

#[derive(Debug, Clone, Default)]
pub struct ReviewState {
    pub company_id: Option<String>,
    pub phase: LoadPhase,
    pub updated: Vec<CandidateRow>,
    pub pending: Vec<CandidateRow>,
    pub notification: Option<Notification>,
}

impl ReviewState {
    pub fn find(&self, key: &RowKey) -> Option<&CandidateRow> {
        self.updated
            .iter()
            .chain(self.pending.iter())
            .find(|row| row.matches(key))
    }
}

pub struct CandidateReconciler {
    api: Arc<dyn ReviewApi>,
    session: CompanySession,
    refresh_policy: RetryPolicy,
    post_write_policy: RetryPolicy,
    state: RwLock<ReviewState>,
    phase: watch::Sender<LoadPhase>,
    generation: Mutex<CancellationToken>,
    decisions: AsyncMutex<()>,
}

impl CandidateReconciler {
    pub fn new(api: Arc<dyn ReviewApi>, session: CompanySession, config: &ReviewConfig) -> Self {
        Self::with_policies(
            api,
            session,
            config.retry_policy(),
            config.post_write_policy(),
        )
    }

    pub fn with_policies(
        api: Arc<dyn ReviewApi>,
        session: CompanySession,
        refresh_policy: RetryPolicy,
        post_write_policy: RetryPolicy,
    ) -> Self {
        Self {
            api,
            session,
            refresh_policy,
            post_write_policy,
            state: RwLock::new(ReviewState::default()),
            phase: watch::Sender::new(LoadPhase::default()),
            generation: Mutex::new(CancellationToken::new()),
            decisions: AsyncMutex::new(()),
        }
    }

    pub fn session(&self) -> &CompanySession {
        &self.session
    }

    /// Cancel whatever the previous generation still has in flight
    fn next_generation(&self) -> CancellationToken {
        let mut current = self.generation.lock().unwrap_or_else(PoisonError::into_inner);
        current.cancel();
        *current = CancellationToken::new();
        current.clone()
    }

    /// Write the phase and wake anyone waiting in `settled`. Callers hold
    /// the state write lock.
    fn set_phase(&self, state: &mut ReviewState, phase: LoadPhase) {
        state.phase = phase.clone();
        self.phase.send_replace(phase);
    }

    fn current_generation(&self) -> CancellationToken {
        self.generation
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Load the baseline for the session's company and refresh statuses.
    ///
    /// A load superseded by `reset` or another `load` returns
    /// `LoadOutcome::Superseded` without touching state; use `settled` to
    /// wait for whichever load took over.
    pub async fn load(&self) -> Result<LoadOutcome> {
        let Some(company_id) = self.session.company_id() else {
            self.next_generation();
            let mut state = self.state.write().await;
            *state = ReviewState::default();
            self.set_phase(&mut state, LoadPhase::MissingCompany);
            anyhow::bail!("No company identifier available for this session");
        };

        let token = self.next_generation();
        {
            let mut state = self.state.write().await;
            *state = ReviewState {
                company_id: Some(company_id.clone()),
                ..ReviewState::default()
            };
            self.set_phase(&mut state, LoadPhase::Loading);
        }

        let rows = match load_baseline(self.api.as_ref(), &company_id).await {
            Ok(rows) => rows,
            Err(e) => {
                app_log!(error, "Baseline load failed: {:#}", e);
                let mut state = self.state.write().await;
                if token.is_cancelled() {
                    return Ok(LoadOutcome::Superseded);
                }
                let message = format!("Failed to load candidates for company {}", company_id);
                self.set_phase(&mut state, LoadPhase::Failed(message));
                return Err(e);
            }
        };

        let Some(outcome) =
            refresh_statuses(self.api.as_ref(), rows, &self.refresh_policy, &token).await
        else {
            app_log!(info, "Dropping stale load for company {}", company_id);
            return Ok(LoadOutcome::Superseded);
        };

        let mut state = self.state.write().await;
        if token.is_cancelled() {
            app_log!(info, "Dropping stale load for company {}", company_id);
            return Ok(LoadOutcome::Superseded);
        }
        state.updated = outcome.updated;
        state.pending = outcome.pending;
        self.set_phase(&mut state, LoadPhase::Ready);
        Ok(LoadOutcome::Ready)
    }

    /// Wait until no load is in flight and return the phase it left behind
    pub async fn settled(&self) -> LoadPhase {
        let mut phase = self.phase.subscribe();
        let settled = phase
            .wait_for(|phase| *phase != LoadPhase::Loading)
            .await
            .map(|phase| (*phase).clone());
        match settled {
            Ok(phase) => phase,
            Err(_) => self.state.read().await.phase.clone(),
        }
    }

    /// Send a decision for one row and commit the re-read.
    ///
    /// Failures come back as an error notification; state is left as it was.
    /// Decisions on one controller run one at a time, so each re-read starts
    /// from the pending set the previous decision committed.
    pub async fn decide(&self, key: &RowKey, action: Decision) -> Notification {
        let _turn = self.decisions.lock().await;
        let token = self.current_generation();
        let (row, pending) = {
            let state = self.state.read().await;
            if state.phase != LoadPhase::Ready {
                return Notification::Error("Candidates are not loaded yet".to_string());
            }
            match state.find(key) {
                Some(row) => (row.clone(), state.pending.clone()),
                None => {
                    return Notification::Error(format!(
                        "Candidate {} is not listed for job {}",
                        key.candidate_id, key.job_id
                    ))
                }
            }
        };

        let outcome = dispatch_decision(
            self.api.as_ref(),
            &row,
            action,
            &pending,
            &self.refresh_policy,
            &self.post_write_policy,
            &token,
        )
        .await;

        let mut state = self.state.write().await;
        if token.is_cancelled() {
            return outcome.notification;
        }
        if let Some(refreshed) = outcome.refreshed {
            // Replace by identity so a row never sits in both partitions
            let touched: HashSet<RowKey> = refreshed
                .updated
                .iter()
                .chain(refreshed.pending.iter())
                .map(CandidateRow::key)
                .chain(std::iter::once(key.clone()))
                .collect();
            state.updated.retain(|candidate| !touched.contains(&candidate.key()));
            state.pending.retain(|candidate| !touched.contains(&candidate.key()));
            state.updated.extend(refreshed.updated);
            state.pending.extend(refreshed.pending);
        }
        state.notification = Some(outcome.notification.clone());
        outcome.notification
    }

    /// Merged rows, filtered and sorted for display
    pub async fn view(&self, query: &RowQuery) -> Vec<CandidateRow> {
        let state = self.state.read().await;
        apply_query(merge_rows(&state.updated, &state.pending), query)
    }

    pub async fn snapshot(&self) -> ReviewState {
        self.state.read().await.clone()
    }

    /// Drop all rows and cancel in-flight work (company change or logout)
    pub async fn reset(&self) {
        self.next_generation();
        let mut state = self.state.write().await;
        *state = ReviewState::default();
        self.set_phase(&mut state, LoadPhase::Idle);
    }
}
