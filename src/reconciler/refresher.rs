// src/reconciler/refresher.rs
//! Per-row manual status lookups, fanned out and joined.

use futures_util::future::join_all;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::app_log;
use crate::core::ReviewApi;
use crate::types::{CandidateRow, RowKey, StatusRecord};

/// Bounded retry for one status lookup.
///
/// After failed attempt `n` (1-based) the next attempt waits `base_delay * n`.
/// `initial_delay` is waited once before the first attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub initial_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(1000),
            initial_delay: Duration::ZERO,
        }
    }
}

impl RetryPolicy {
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(attempt)
    }
}

/// Rows split by whether a manual status was found. Every input identity
/// lands in exactly one of the two vectors.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RefreshOutcome {
    pub updated: Vec<CandidateRow>,
    pub pending: Vec<CandidateRow>,
}

impl RefreshOutcome {
    pub fn extend(&mut self, other: RefreshOutcome) {
        self.updated.extend(other.updated);
        self.pending.extend(other.pending);
    }
}

enum Lookup {
    Found(Vec<StatusRecord>),
    Empty,
    Exhausted,
    Cancelled,
}

/// Look up the manual status of every row concurrently and wait for all of
/// them. Returns `None` if `cancel` fired before the join completed; the
/// partial result must then be discarded.
pub async fn refresh_statuses(
    api: &dyn ReviewApi,
    rows: Vec<CandidateRow>,
    policy: &RetryPolicy,
    cancel: &CancellationToken,
) -> Option<RefreshOutcome> {
    if rows.is_empty() {
        return Some(RefreshOutcome::default());
    }

    app_log!(debug, "Refreshing manual statuses for {} rows", rows.len());

    let lookups = rows
        .iter()
        .map(|row| lookup_with_retry(api, row.key(), policy, cancel));
    let results = join_all(lookups).await;

    if cancel.is_cancelled() {
        app_log!(info, "Status refresh cancelled, discarding results");
        return None;
    }

    let mut outcome = RefreshOutcome::default();
    for (row, result) in rows.into_iter().zip(results) {
        match result {
            Lookup::Found(records) => outcome
                .updated
                .extend(records.into_iter().map(|record| merge_record(&row, record))),
            Lookup::Empty | Lookup::Exhausted => outcome.pending.push(as_pending(row)),
            Lookup::Cancelled => return None,
        }
    }

    app_log!(
        info,
        "Status refresh complete: {} updated, {} pending",
        outcome.updated.len(),
        outcome.pending.len()
    );
    Some(outcome)
}

async fn lookup_with_retry(
    api: &dyn ReviewApi,
    key: RowKey,
    policy: &RetryPolicy,
    cancel: &CancellationToken,
) -> Lookup {
    if !policy.initial_delay.is_zero() && !pause(policy.initial_delay, cancel).await {
        return Lookup::Cancelled;
    }

    for attempt in 1..=policy.max_attempts {
        let result = tokio::select! {
            _ = cancel.cancelled() => return Lookup::Cancelled,
            result = api.fetch_manual_status(&key) => result,
        };

        match result {
            Ok(records) if records.is_empty() => return Lookup::Empty,
            Ok(records) => return Lookup::Found(records),
            Err(e) => {
                app_log!(
                    warn,
                    "Status lookup for {} failed (attempt {}/{}): {:#}",
                    key,
                    attempt,
                    policy.max_attempts,
                    e
                );
                let retry_left = attempt < policy.max_attempts;
                if retry_left && !pause(policy.delay_after(attempt), cancel).await {
                    return Lookup::Cancelled;
                }
            }
        }
    }

    app_log!(warn, "Giving up on status lookup for {}, leaving it pending", key);
    Lookup::Exhausted
}

/// Sleep unless cancelled first; false means cancelled
async fn pause(delay: Duration, cancel: &CancellationToken) -> bool {
    tokio::select! {
        _ = cancel.cancelled() => false,
        _ = tokio::time::sleep(delay) => true,
    }
}

fn merge_record(row: &CandidateRow, record: StatusRecord) -> CandidateRow {
    CandidateRow {
        manual_status: Some(record.status),
        manager_message: record.manager_message,
        timestamp: record.timestamp,
        updated: true,
        ..row.clone()
    }
}

fn as_pending(row: CandidateRow) -> CandidateRow {
    CandidateRow {
        manual_status: None,
        manager_message: None,
        timestamp: None,
        updated: false,
        ..row
    }
}
