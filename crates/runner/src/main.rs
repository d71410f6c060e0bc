use anyhow::{Context, Result};
use clap::Parser;

use digest_core::config::load_dotenv;
use digest_runner::{CliArgs, Pipeline};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    // .env must be loaded before clap reads its env fallbacks.
    load_dotenv();
    let args = CliArgs::parse();

    let config = args.load_config();
    config.validate().context("invalid configuration")?;
    config.log_summary();

    let pipeline = Pipeline::from_config(&config)?;
    let summary = pipeline
        .run(args.report_date())
        .await
        .context("report run failed")?;
    summary.log();

    if let Some(error) = &summary.delivery.error {
        tracing::warn!(error = %error, "Report was not delivered");
    }

    Ok(())
}
