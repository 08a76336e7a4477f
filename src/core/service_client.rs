// src/core/service_client.rs
//! HTTP client for the listing, status lookup and decision services

use anyhow::{Context, Result};
use std::time::Duration;

use crate::app_log;
use crate::core::ReviewApi;
use crate::environment::ServiceConfig;
use crate::types::{
    CompanyJobsResponse, DecisionRequest, JobListing, RowKey, StatusLookupResponse, StatusRecord,
};

const COMPANY_JOBS_PATH: [&str; 2] = ["jobs", "company"];
const CANDIDATE_STATUS_ENDPOINT: &str = "/candidate-status";
const DECISION_ENDPOINT: &str = "/decision";

pub struct ServiceClient {
    client: reqwest::Client,
    listing_url: String,
    status_url: String,
    decision_url: String,
}

impl ServiceClient {
    /// Create new service client with configuration
    pub fn new(config: &ServiceConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            listing_url: trim_base(&config.listing_url),
            status_url: trim_base(&config.status_url),
            decision_url: trim_base(&config.decision_url),
        })
    }

    /// The company id is one path segment, percent-encoded
    fn company_jobs_url(&self, company_id: &str) -> Result<reqwest::Url> {
        let mut url = reqwest::Url::parse(&self.listing_url)
            .with_context(|| format!("Invalid listing service URL {}", self.listing_url))?;
        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("Listing service URL {} has no path", self.listing_url))?
            .pop_if_empty()
            .extend(COMPANY_JOBS_PATH)
            .push(company_id);
        Ok(url)
    }

    fn candidate_status_url(&self) -> String {
        format!("{}{}", self.status_url, CANDIDATE_STATUS_ENDPOINT)
    }

    fn decision_url(&self) -> String {
        format!("{}{}", self.decision_url, DECISION_ENDPOINT)
    }

    async fn error_body(response: reqwest::Response) -> String {
        response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string())
    }
}

fn trim_base(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}

#[rocket::async_trait]
impl ReviewApi for ServiceClient {
    async fn fetch_company_jobs(&self, company_id: &str) -> Result<Vec<JobListing>> {
        let url = self.company_jobs_url(company_id)?;
        app_log!(trace, "Calling job listing service: {}", url);

        let response = self
            .client
            .get(url.as_str())
            .send()
            .await
            .with_context(|| format!("Failed to GET from {}", url))?;

        let status = response.status();
        if status.is_success() {
            let listing: CompanyJobsResponse = response
                .json()
                .await
                .context("Failed to parse job listing response")?;
            Ok(listing.jobs)
        } else {
            let error_text = Self::error_body(response).await;
            app_log!(error, "Job listing service error response: {}", error_text);
            anyhow::bail!("Job listing failed with status {}: {}", status, error_text)
        }
    }

    async fn fetch_manual_status(&self, key: &RowKey) -> Result<Vec<StatusRecord>> {
        let url = self.candidate_status_url();
        let job_id = key.job_id.to_string();

        let response = self
            .client
            .get(&url)
            .query(&[
                ("candidateId", key.candidate_id.as_str()),
                ("jobId", job_id.as_str()),
            ])
            .send()
            .await
            .with_context(|| format!("Failed to look up status for {}", key))?;

        let status = response.status();
        if status.is_success() {
            let lookup: StatusLookupResponse = response
                .json()
                .await
                .context("Failed to parse status lookup response")?;
            Ok(lookup.updates)
        } else {
            let error_text = Self::error_body(response).await;
            anyhow::bail!("Status lookup failed with status {}: {}", status, error_text)
        }
    }

    async fn send_decision(&self, request: &DecisionRequest) -> Result<()> {
        let url = self.decision_url();
        app_log!(
            info,
            "Sending {} decision for {} to {}",
            request.action,
            request.key(),
            url
        );

        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .context("Failed to call decision service")?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let error_text = Self::error_body(response).await;
            app_log!(error, "Decision service error response: {}", error_text);
            anyhow::bail!("Decision failed with status {}: {}", status, error_text)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ServiceConfig {
        ServiceConfig {
            listing_url: "http://listing.local/".to_string(),
            status_url: "http://status.local".to_string(),
            decision_url: "http://decision.local//".to_string(),
            timeout_seconds: 5,
        }
    }

    #[test]
    fn test_endpoint_urls_join_cleanly() {
        let client = ServiceClient::new(&config()).unwrap();
        assert_eq!(
            client.company_jobs_url("acme").unwrap().as_str(),
            "http://listing.local/jobs/company/acme"
        );
        assert_eq!(
            client.candidate_status_url(),
            "http://status.local/candidate-status"
        );
        assert_eq!(client.decision_url(), "http://decision.local/decision");
    }

    #[test]
    fn test_company_id_is_a_single_encoded_segment() {
        let client = ServiceClient::new(&config()).unwrap();
        assert_eq!(
            client.company_jobs_url("a/b?c#d").unwrap().as_str(),
            "http://listing.local/jobs/company/a%2Fb%3Fc%23d"
        );

        let nested = ServiceClient::new(&ServiceConfig {
            listing_url: "http://gateway.local/listing/".to_string(),
            ..config()
        })
        .unwrap();
        assert_eq!(
            nested.company_jobs_url("acme").unwrap().as_str(),
            "http://gateway.local/listing/jobs/company/acme"
        );
    }

    #[tokio::test]
    async fn test_unreachable_service_is_an_error() {
        let client = ServiceClient::new(&ServiceConfig {
            listing_url: "http://127.0.0.1:9".to_string(),
            status_url: "http://127.0.0.1:9".to_string(),
            decision_url: "http://127.0.0.1:9".to_string(),
            timeout_seconds: 2,
        })
        .unwrap();

        assert!(client.fetch_company_jobs("acme").await.is_err());
        assert!(client
            .fetch_manual_status(&RowKey::new("c1", 1))
            .await
            .is_err());
    }
}
