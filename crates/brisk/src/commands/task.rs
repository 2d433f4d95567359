//! Single-task commands (`scss`, `scripts`, `images`).

use anyhow::{Context, Result};
use brisk_pipeline::{BuildConfig, Pipeline, TaskKind};

pub async fn run(config: BuildConfig, task: TaskKind) -> Result<()> {
    let pipeline = Pipeline::new(config)?;
    let report = tokio::task::spawn_blocking(move || pipeline.run_task(task))
        .await
        .with_context(|| format!("'{}' task aborted", task))?;

    if !report.is_ok() {
        anyhow::bail!("'{}' finished with {} error(s)", task, report.errors.len());
    }
    Ok(())
}
