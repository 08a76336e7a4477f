// src/types/candidate.rs
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Status code meaning the candidate was selected for the job
pub const STATUS_SELECTED: i64 = 10;
/// Status code meaning the candidate was rejected
pub const STATUS_REJECTED: i64 = 5;

/// Placeholder used when the listing service omits job metadata
pub const NOT_AVAILABLE: &str = "N/A";

/// Composite identity of a row: one candidate applied to one job
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RowKey {
    pub candidate_id: String,
    pub job_id: i64,
}

impl RowKey {
    pub fn new(candidate_id: impl Into<String>, job_id: i64) -> Self {
        Self {
            candidate_id: candidate_id.into(),
            job_id,
        }
    }
}

impl fmt::Display for RowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.candidate_id, self.job_id)
    }
}

/// A candidate/job pair as shown on the review page.
///
/// Rows only ever live in memory. The listing and status services are the
/// system of record, so a row is rebuilt rather than edited in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateRow {
    pub candidate_id: String,
    pub job_id: i64,
    pub ai_status: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manual_status: Option<i64>,
    pub title: String,
    pub posted_on: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manager_message: Option<String>,
    pub updated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl CandidateRow {
    /// Build a baseline row straight from the listing service
    pub fn baseline(
        candidate_id: impl Into<String>,
        job_id: i64,
        ai_status: i64,
        title: Option<String>,
        posted_on: Option<String>,
    ) -> Self {
        Self {
            candidate_id: candidate_id.into(),
            job_id,
            ai_status,
            manual_status: None,
            title: title.unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            posted_on: posted_on.unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            manager_message: None,
            updated: false,
            timestamp: None,
        }
    }

    pub fn key(&self) -> RowKey {
        RowKey::new(self.candidate_id.clone(), self.job_id)
    }

    pub fn matches(&self, key: &RowKey) -> bool {
        self.candidate_id == key.candidate_id && self.job_id == key.job_id
    }

    /// Manual status wins over the AI status whenever one is known
    pub fn effective_status(&self) -> i64 {
        self.manual_status.unwrap_or(self.ai_status)
    }

    pub fn label(&self) -> StatusLabel {
        StatusLabel::from_code(self.effective_status())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusLabel {
    Selected,
    Rejected,
    Pending,
}

impl StatusLabel {
    pub fn from_code(code: i64) -> Self {
        match code {
            STATUS_SELECTED => StatusLabel::Selected,
            STATUS_REJECTED => StatusLabel::Rejected,
            _ => StatusLabel::Pending,
        }
    }
}

impl fmt::Display for StatusLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            StatusLabel::Selected => "selected",
            StatusLabel::Rejected => "rejected",
            StatusLabel::Pending => "pending",
        };
        f.write_str(label)
    }
}

/// Reviewer decision sent to the mutation service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Approve,
    Reject,
}

impl Decision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Approve => "approve",
            Decision::Reject => "reject",
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Decision {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "approve" => Ok(Decision::Approve),
            "reject" => Ok(Decision::Reject),
            other => anyhow::bail!("Unknown decision: {}. Use approve or reject", other),
        }
    }
}
