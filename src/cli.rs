// src/cli.rs
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use crate::app_log;
use crate::core::{ReviewApi, ServiceClient};
use crate::environment::ReviewConfig;
use crate::reconciler::{
    CandidateReconciler, RowQuery, SortDirection, SortField, SortSpec, StatusFilter,
};
use crate::session::CompanySession;
use crate::types::{CandidateRow, Decision, RowKey};

#[derive(Parser)]
#[command(name = "talent-review")]
#[command(about = "Review candidates and record hiring decisions for a company")]
pub struct ReviewCli {
    #[command(subcommand)]
    pub command: ReviewCommand,

    #[arg(long, default_value = "config.yaml")]
    pub config: PathBuf,
}

#[derive(Subcommand)]
pub enum ReviewCommand {
    /// Run the review API server
    Serve {
        #[arg(long)]
        port: Option<u16>,
    },
    /// Print the reconciled candidate list of a company
    List {
        #[arg(long)]
        company: String,
        #[arg(long, default_value = "")]
        search: String,
        /// all, selected or rejected
        #[arg(long, default_value = "all")]
        status: StatusFilter,
        /// candidateId, jobId, title, postedOn, status or timestamp
        #[arg(long)]
        sort: Option<SortField>,
        #[arg(long)]
        desc: bool,
    },
    /// Approve or reject one candidate for one job
    Decide {
        #[arg(long)]
        company: String,
        #[arg(long)]
        candidate: String,
        #[arg(long)]
        job: i64,
        /// approve or reject
        action: Decision,
    },
}

pub async fn handle_review_command(cli: ReviewCli, mut config: ReviewConfig) -> Result<()> {
    match cli.command {
        ReviewCommand::Serve { port } => {
            if let Some(port) = port {
                config.server.port = port;
            }
            crate::start_web_server(config).await
        }

        ReviewCommand::List {
            company,
            search,
            status,
            sort,
            desc,
        } => {
            let controller = build_controller(&config, &company)?;
            controller.load().await?;

            let query = RowQuery {
                search,
                status,
                sort: sort.map(|field| SortSpec {
                    field,
                    direction: if desc {
                        SortDirection::Desc
                    } else {
                        SortDirection::Asc
                    },
                }),
            };
            let rows = controller.view(&query).await;
            let state = controller.snapshot().await;

            println!(
                "{} candidates for {} ({} updated, {} pending)",
                rows.len(),
                company,
                state.updated.len(),
                state.pending.len()
            );
            for row in &rows {
                println!("{}", format_row(row));
            }
            Ok(())
        }

        ReviewCommand::Decide {
            company,
            candidate,
            job,
            action,
        } => {
            let controller = build_controller(&config, &company)?;
            controller.load().await?;

            let notification = controller.decide(&RowKey::new(candidate, job), action).await;
            if notification.is_success() {
                println!("✓ {}", notification.message());
                Ok(())
            } else {
                app_log!(error, "Decision failed: {}", notification.message());
                anyhow::bail!("{}", notification.message())
            }
        }
    }
}

fn build_controller(config: &ReviewConfig, company: &str) -> Result<CandidateReconciler> {
    let api: Arc<dyn ReviewApi> = Arc::new(ServiceClient::new(&config.services)?);
    let session = CompanySession::for_company(company)?;
    Ok(CandidateReconciler::new(api, session, config))
}

fn format_row(row: &CandidateRow) -> String {
    let mut line = format!(
        "{:<16} {:>6}  {:<9} {:<28} {}",
        row.candidate_id,
        row.job_id,
        row.label().to_string(),
        row.title,
        row.posted_on
    );
    if let Some(message) = &row.manager_message {
        line.push_str(&format!("  \"{}\"", message));
    }
    line
}
