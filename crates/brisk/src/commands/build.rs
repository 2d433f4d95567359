//! Full build command.

use std::sync::Arc;

use anyhow::Result;
use brisk_pipeline::{BuildConfig, BuildSummary, Pipeline};

/// Run every task once.
pub async fn run(config: BuildConfig) -> Result<()> {
    tracing::info!("Building {}...", config.root.display());

    let pipeline = Arc::new(Pipeline::new(config)?);
    let summary = Arc::clone(&pipeline).build().await?;

    report(&pipeline, &summary)
}

/// Log the outcome of a build, failing when any task reported an error.
pub fn report(pipeline: &Pipeline, summary: &BuildSummary) -> Result<()> {
    if !summary.is_ok() {
        anyhow::bail!(
            "Build finished with {} error(s) in {}ms",
            summary.error_count(),
            summary.duration_ms
        );
    }

    tracing::info!(
        "Built {} files in {}ms",
        summary.files_written(),
        summary.duration_ms
    );
    tracing::info!("Output: {}", pipeline.output_dir().display());

    Ok(())
}
