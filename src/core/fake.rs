// Scripted stand-in for the review services, used by unit tests.

use anyhow::Result;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use crate::core::ReviewApi;
use crate::types::candidate::{STATUS_REJECTED, STATUS_SELECTED};
use crate::types::{CandidateEntry, Decision, DecisionRequest, JobListing, RowKey, StatusRecord};

pub(crate) enum StatusReply {
    Fail,
    Records(Vec<StatusRecord>),
}

#[derive(Default)]
pub(crate) struct FakeReviewApi {
    jobs: Mutex<Option<Vec<JobListing>>>,
    scripted: Mutex<HashMap<RowKey, VecDeque<StatusReply>>>,
    settled: Mutex<HashMap<RowKey, Vec<StatusRecord>>>,
    lookups: Mutex<HashMap<RowKey, usize>>,
    decisions: Mutex<Vec<DecisionRequest>>,
    reject_decisions: AtomicBool,
}

pub(crate) fn record(status: i64) -> StatusRecord {
    StatusRecord {
        status,
        manager_message: Some(format!("set to {}", status)),
        timestamp: Some("2024-06-01T09:00:00Z".to_string()),
    }
}

pub(crate) fn job(
    job_id: i64,
    title: &str,
    posted_on: &str,
    candidates: &[(&str, i64)],
) -> JobListing {
    JobListing {
        job_id,
        title: Some(title.to_string()),
        posted_on: Some(posted_on.to_string()),
        candidates: candidates
            .iter()
            .map(|(id, status)| CandidateEntry {
                candidate_id: id.to_string(),
                status: *status,
            })
            .collect(),
    }
}

impl FakeReviewApi {
    pub(crate) fn with_jobs(jobs: Vec<JobListing>) -> Self {
        let api = Self::default();
        *api.jobs.lock().unwrap() = Some(jobs);
        api
    }

    /// Every listing call fails
    pub(crate) fn unavailable() -> Self {
        Self::default()
    }

    /// Records returned once the scripted replies for `key` are used up
    pub(crate) fn settle(&self, key: RowKey, records: Vec<StatusRecord>) {
        self.settled.lock().unwrap().insert(key, records);
    }

    pub(crate) fn script(&self, key: RowKey, replies: Vec<StatusReply>) {
        self.scripted
            .lock()
            .unwrap()
            .insert(key, replies.into_iter().collect());
    }

    pub(crate) fn fail_decisions(&self) {
        self.reject_decisions.store(true, Ordering::SeqCst);
    }

    pub(crate) fn lookup_count(&self, key: &RowKey) -> usize {
        self.lookups.lock().unwrap().get(key).copied().unwrap_or(0)
    }

    pub(crate) fn decisions(&self) -> Vec<DecisionRequest> {
        self.decisions.lock().unwrap().clone()
    }
}

#[rocket::async_trait]
impl ReviewApi for FakeReviewApi {
    async fn fetch_company_jobs(&self, company_id: &str) -> Result<Vec<JobListing>> {
        let jobs = self.jobs.lock().unwrap().clone();
        match jobs {
            Some(jobs) => Ok(jobs),
            None => anyhow::bail!("listing service unavailable for {}", company_id),
        }
    }

    async fn fetch_manual_status(&self, key: &RowKey) -> Result<Vec<StatusRecord>> {
        *self.lookups.lock().unwrap().entry(key.clone()).or_insert(0) += 1;

        let reply = self
            .scripted
            .lock()
            .unwrap()
            .get_mut(key)
            .and_then(|queue| queue.pop_front());

        match reply {
            Some(StatusReply::Fail) => anyhow::bail!("status lookup failed for {}", key),
            Some(StatusReply::Records(records)) => Ok(records),
            None => Ok(self
                .settled
                .lock()
                .unwrap()
                .get(key)
                .cloned()
                .unwrap_or_default()),
        }
    }

    async fn send_decision(&self, request: &DecisionRequest) -> Result<()> {
        if self.reject_decisions.load(Ordering::SeqCst) {
            anyhow::bail!("decision service returned 503");
        }
        self.decisions.lock().unwrap().push(request.clone());

        // The written status becomes readable on the next lookup
        let status = match request.action {
            Decision::Approve => STATUS_SELECTED,
            Decision::Reject => STATUS_REJECTED,
        };
        self.settle(request.key(), vec![record(status)]);
        Ok(())
    }
}
