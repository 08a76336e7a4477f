use anyhow::Result;
use candidate_review::app_log;
use candidate_review::cli::{handle_review_command, ReviewCli};
use candidate_review::{logging, ReviewConfig};
use clap::Parser;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = ReviewCli::parse();

    let config = ReviewConfig::load_file(&cli.config)?;

    // Initialize logging before anything talks to the services
    logging::init(&config.log_path)?;

    app_log!(info, "Log file: {}", config.log_path.display());
    app_log!(
        info,
        "Environment: {}",
        std::env::var("ENVIRONMENT").unwrap_or_else(|_| "local".to_string())
    );

    handle_review_command(cli, config).await
}
