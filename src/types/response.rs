use serde::{Deserialize, Serialize};

use crate::types::candidate::{Decision, RowKey};

// ===== Listing Service Types =====

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanyJobsResponse {
    #[serde(default)]
    pub jobs: Vec<JobListing>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobListing {
    pub job_id: i64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub posted_on: Option<String>,
    #[serde(default)]
    pub candidates: Vec<CandidateEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateEntry {
    pub candidate_id: String,
    pub status: i64,
}

// ===== Status Lookup Types =====

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusLookupResponse {
    #[serde(default)]
    pub updates: Vec<StatusRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusRecord {
    pub status: i64,
    #[serde(default)]
    pub manager_message: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

// ===== Decision Mutation Types =====

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionRequest {
    pub candidate_id: String,
    pub job_id: i64,
    pub action: Decision,
}

impl DecisionRequest {
    pub fn new(key: &RowKey, action: Decision) -> Self {
        Self {
            candidate_id: key.candidate_id.clone(),
            job_id: key.job_id,
            action,
        }
    }

    pub fn key(&self) -> RowKey {
        RowKey::new(self.candidate_id.clone(), self.job_id)
    }
}
