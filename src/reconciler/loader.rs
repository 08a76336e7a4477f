// src/reconciler/loader.rs
use anyhow::{Context, Result};

use crate::app_log;
use crate::core::ReviewApi;
use crate::types::{CandidateRow, JobListing};

/// Fetch every job of `company_id` and flatten it into one row per
/// (job, candidate) pair. Failures are returned as-is; nothing is retried here.
pub async fn load_baseline(api: &dyn ReviewApi, company_id: &str) -> Result<Vec<CandidateRow>> {
    if company_id.trim().is_empty() {
        anyhow::bail!("No company identifier available for this session");
    }

    let jobs = api
        .fetch_company_jobs(company_id)
        .await
        .with_context(|| format!("Failed to load jobs for company {}", company_id))?;

    let rows = flatten_jobs(jobs);
    app_log!(info, "Loaded {} candidate rows for company {}", rows.len(), company_id);
    Ok(rows)
}

pub fn flatten_jobs(jobs: Vec<JobListing>) -> Vec<CandidateRow> {
    jobs.into_iter()
        .flat_map(|job| {
            let JobListing {
                job_id,
                title,
                posted_on,
                candidates,
            } = job;
            candidates.into_iter().map(move |candidate| {
                CandidateRow::baseline(
                    candidate.candidate_id,
                    job_id,
                    candidate.status,
                    title.clone(),
                    posted_on.clone(),
                )
            })
        })
        .collect()
}
