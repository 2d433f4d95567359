//! Watch mode: build, serve, rebuild on change.

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::watch;

use brisk_pipeline::Pipeline;
use brisk_server::{DevServer, FileWatcher, WatchOrchestrator};

use crate::config::Settings;

/// Run until Ctrl-C.
pub async fn run(settings: Settings) -> Result<()> {
    let pipeline = Arc::new(Pipeline::new(settings.build)?);

    // A failing initial build is logged; watching lets the user fix it.
    let summary = Arc::clone(&pipeline).build().await?;
    if let Err(e) = super::build::report(&pipeline, &summary) {
        tracing::warn!("{}", e);
    }

    let mut server = DevServer::new(settings.server);
    server.start().await?;

    let source_root = pipeline.root().join(&pipeline.config().paths.source_root);
    let (watcher, events) = FileWatcher::new(&[source_root])?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let orchestrator = WatchOrchestrator::new(Arc::clone(&pipeline), server.hub().clone());
    let dispatch = tokio::spawn(orchestrator.run(events, shutdown_rx));

    tracing::info!("Watching for changes. Press Ctrl-C to stop.");
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl-C")?;

    tracing::info!("Shutting down...");
    let _ = shutdown_tx.send(true);
    drop(watcher);
    if let Err(e) = dispatch.await {
        tracing::warn!("Watch dispatcher ended abnormally: {}", e);
    }
    server.stop().await;

    Ok(())
}
