// src/core/mod.rs
//! Seams to the externally operated review services

pub mod service_client;

#[cfg(test)]
pub(crate) mod fake;

pub use service_client::ServiceClient;

use anyhow::Result;

use crate::types::{DecisionRequest, JobListing, RowKey, StatusRecord};

/// The three services the review page consumes.
///
/// `ServiceClient` talks to them over HTTP; tests plug in a scripted fake.
#[rocket::async_trait]
pub trait ReviewApi: Send + Sync {
    /// All jobs of a company, each with its nested candidate list
    async fn fetch_company_jobs(&self, company_id: &str) -> Result<Vec<JobListing>>;

    /// Manual status entries recorded for one candidate/job pair (may be empty)
    async fn fetch_manual_status(&self, key: &RowKey) -> Result<Vec<StatusRecord>>;

    /// Submit a reviewer decision; only success or failure is meaningful
    async fn send_decision(&self, request: &DecisionRequest) -> Result<()>;
}
