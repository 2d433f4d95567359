//! Maps source changes to rebuild jobs and reload signals.
//!
//! Each [`Category`] gets one worker task. A worker runs its job to
//! completion before looking at its queue again, so reruns of one category
//! never overlap while different categories rebuild in parallel. The queue
//! holds at most one pending trigger: changes arriving during a run collapse
//! into a single follow-up run.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use brisk_pipeline::{Category, Pipeline, TaskReport};

use crate::reload::{ReloadHub, ReloadMessage};
use crate::watcher::WatchEvent;

/// One rebuild of a category, yielding what to tell browsers.
type Job = dyn Fn(Category) -> Vec<ReloadMessage> + Send + Sync;

/// Routes watch events to per-category rebuild workers.
pub struct WatchOrchestrator {
    pipeline: Arc<Pipeline>,
    hub: ReloadHub,
    roots: Vec<PathBuf>,
}

impl WatchOrchestrator {
    pub fn new(pipeline: Arc<Pipeline>, hub: ReloadHub) -> Self {
        let root = pipeline.root().to_path_buf();
        let mut roots = vec![root.clone()];
        // notify may report canonical paths
        if let Ok(canonical) = root.canonicalize() {
            if canonical != root {
                roots.push(canonical);
            }
        }

        Self {
            pipeline,
            hub,
            roots,
        }
    }

    /// Categories whose job should rerun after `path` changed.
    pub fn categories_for(&self, path: &Path) -> Vec<Category> {
        let Some(rel) = self.relative(path) else {
            return Vec::new();
        };

        Category::ALL
            .into_iter()
            .filter(|c| self.pipeline.watch_set(*c).matches(&rel))
            .collect()
    }

    fn relative(&self, path: &Path) -> Option<String> {
        let rel = self.roots.iter().find_map(|root| path.strip_prefix(root).ok())?;
        Some(
            rel.components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/"),
        )
    }

    /// Dispatch `events` until `shutdown` flips or the event stream ends,
    /// then let in-flight jobs finish.
    pub async fn run(self, events: mpsc::Receiver<WatchEvent>, shutdown: watch::Receiver<bool>) {
        let pipeline = Arc::clone(&self.pipeline);
        let job: Arc<Job> = Arc::new(move |category: Category| {
            let reports = pipeline.run_category(category);
            signals(&pipeline, category, &reports)
        });
        self.dispatch(events, shutdown, job).await;
    }

    async fn dispatch(
        self,
        mut events: mpsc::Receiver<WatchEvent>,
        mut shutdown: watch::Receiver<bool>,
        job: Arc<Job>,
    ) {
        let mut triggers = HashMap::new();
        let mut workers: Vec<JoinHandle<()>> = Vec::new();

        for category in Category::ALL {
            let (tx, rx) = mpsc::channel(1);
            triggers.insert(category, tx);
            workers.push(tokio::spawn(worker(
                category,
                Arc::clone(&job),
                self.hub.clone(),
                rx,
            )));
        }

        loop {
            tokio::select! {
                event = events.recv() => {
                    let Some(event) = event else { break };
                    for category in self.categories_for(event.path()) {
                        tracing::debug!("{} changed, queueing {}", event.path().display(), category);
                        if let Some(tx) = triggers.get(&category) {
                            // A full queue already holds a rerun that will
                            // see this change.
                            let _ = tx.try_send(());
                        }
                    }
                }
                _ = shutdown.changed() => break,
            }
        }

        drop(triggers);
        for handle in workers {
            if let Err(e) = handle.await {
                tracing::warn!("Watch worker ended abnormally: {}", e);
            }
        }
    }
}

async fn worker(
    category: Category,
    job: Arc<Job>,
    hub: ReloadHub,
    mut triggers: mpsc::Receiver<()>,
) {
    while triggers.recv().await.is_some() {
        let run = Arc::clone(&job);
        let messages = match tokio::task::spawn_blocking(move || run(category)).await {
            Ok(messages) => messages,
            Err(e) => {
                tracing::error!("Rebuild of {} aborted: {}", category, e);
                continue;
            }
        };

        for msg in messages {
            hub.send(msg);
        }
    }
}

/// Messages for browsers after `category`'s job produced `reports`.
///
/// Style output is swapped in place; anything else reloads the page. Runs
/// that wrote nothing send nothing.
fn signals(pipeline: &Pipeline, category: Category, reports: &[TaskReport]) -> Vec<ReloadMessage> {
    let written: Vec<&PathBuf> = reports.iter().flat_map(|r| &r.written).collect();
    if written.is_empty() {
        return Vec::new();
    }

    if category != Category::Styles {
        return vec![ReloadMessage::Reload];
    }

    let output = pipeline.output_dir();
    let mut messages = Vec::with_capacity(written.len());
    for path in written {
        match path.strip_prefix(&output) {
            Ok(rel) => {
                let url = rel
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/");
                messages.push(ReloadMessage::InjectCss {
                    path: format!("/{}", url),
                });
            }
            // Not served, so a stylesheet swap cannot pick it up.
            Err(_) => return vec![ReloadMessage::Reload],
        }
    }
    messages
}
