use anyhow::{Context, Result};
use firmware_updater::{Pipeline, UpdaterConfig};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = UpdaterConfig::load().context("failed to load configuration")?;
    info!(
        "Updating {} into {}",
        config.repository_url,
        config.project_dir.display()
    );

    let (pipeline, recorder) = Pipeline::from_config(config);
    let report = pipeline.run().await;

    if let Some(recorder) = recorder {
        for line in recorder.command_lines() {
            println!("{line}");
        }
    }

    // The process exits normally whatever the pipeline outcome.
    match serde_json::to_string_pretty(&report) {
        Ok(json) => debug!("Run report:\n{}", json),
        Err(e) => debug!("Run report could not be serialized: {}", e),
    }

    Ok(())
}
