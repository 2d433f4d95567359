//! Task pipeline.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use minijinja::Environment;

use brisk_transforms::{Autoprefixer, ImageOptimizer, JsMinifier, ScssCompiler, Transform};

use crate::config::BuildConfig;
use crate::error::BuildError;
use crate::fileset::FileSet;
use crate::output;
use crate::paths::{Category, TaskKind};

/// Name of the link template registered with minijinja. No extension, so
/// paths are not HTML-escaped.
pub(crate) const LINK_TEMPLATE: &str = "link";

/// Tasks that `build` runs concurrently; each group runs in order.
const BUILD_GROUPS: [&[TaskKind]; 4] = [
    &[TaskKind::Styles],
    &[TaskKind::Scripts],
    &[TaskKind::Images],
    &[TaskKind::Markup, TaskKind::Index],
];

/// Outcome of one task run.
#[derive(Debug)]
pub struct TaskReport {
    pub task: TaskKind,

    /// Files written to the output tree
    pub written: Vec<PathBuf>,

    /// Inputs skipped because their output was up to date
    pub skipped: usize,

    pub errors: Vec<BuildError>,

    pub duration_ms: u64,
}

impl TaskReport {
    fn new(task: TaskKind) -> Self {
        Self {
            task,
            written: Vec::new(),
            skipped: 0,
            errors: Vec::new(),
            duration_ms: 0,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    pub(crate) fn record(&mut self, result: Result<PathBuf, BuildError>) {
        match result {
            Ok(path) => self.written.push(path),
            Err(e) => self.errors.push(e),
        }
    }
}

/// Result of a full build.
#[derive(Debug)]
pub struct BuildSummary {
    pub reports: Vec<TaskReport>,
    pub duration_ms: u64,
}

impl BuildSummary {
    pub fn files_written(&self) -> usize {
        self.reports.iter().map(|r| r.written.len()).sum()
    }

    pub fn error_count(&self) -> usize {
        self.reports.iter().map(|r| r.errors.len()).sum()
    }

    pub fn is_ok(&self) -> bool {
        self.error_count() == 0
    }
}

/// The configured set of build tasks.
pub struct Pipeline {
    pub(crate) config: BuildConfig,
    pub(crate) markup: FileSet,
    pub(crate) index_links: FileSet,
    pub(crate) scripts: FileSet,
    pub(crate) styles: FileSet,
    pub(crate) images: FileSet,
    markup_watch: FileSet,
    pub(crate) style_chain: Vec<Box<dyn Transform>>,
    pub(crate) minifier: Option<JsMinifier>,
    pub(crate) image_optimizer: ImageOptimizer,
    pub(crate) templates: Environment<'static>,
}

impl Pipeline {
    /// Validate the configuration and compile every pattern.
    pub fn new(config: BuildConfig) -> Result<Self, BuildError> {
        if !config.root.is_dir() {
            return Err(BuildError::Setup(format!(
                "Project root not found: {}",
                config.root.display()
            )));
        }

        let paths = &config.paths;
        let setup = |e: brisk_transforms::TransformError| BuildError::Setup(e.to_string());

        let style_chain: Vec<Box<dyn Transform>> = vec![
            Box::new(ScssCompiler::new()),
            Box::new(
                Autoprefixer::new(&config.styles.browsers, config.styles.output_style)
                    .map_err(setup)?,
            ),
        ];

        let image_optimizer =
            ImageOptimizer::new(config.images.jpeg_quality, config.images.png_level)
                .map_err(setup)?;

        let mut templates = Environment::new();
        templates
            .add_template_owned(LINK_TEMPLATE.to_string(), config.index.link_template.clone())
            .map_err(|e| BuildError::Setup(format!("Invalid link template: {}", e)))?;

        Ok(Self {
            markup: FileSet::new(&paths.markup)?,
            index_links: FileSet::new(&paths.index_links())?,
            scripts: FileSet::new(&paths.scripts)?,
            styles: FileSet::new(&paths.styles)?,
            images: FileSet::new(&paths.images)?,
            markup_watch: FileSet::new(&paths.markup_watch())?,
            style_chain,
            minifier: config.scripts.minify.then(JsMinifier::new),
            image_optimizer,
            templates,
            config,
        })
    }

    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    pub fn root(&self) -> &Path {
        &self.config.root
    }

    /// Absolute output root.
    pub fn output_dir(&self) -> PathBuf {
        self.config.root.join(&self.config.paths.output_root)
    }

    /// Patterns whose changes should rerun `category`'s job.
    pub fn watch_set(&self, category: Category) -> &FileSet {
        match category {
            Category::Styles => &self.styles,
            Category::Scripts => &self.scripts,
            Category::Images => &self.images,
            Category::Markup => &self.markup_watch,
        }
    }

    pub(crate) fn dest(&self, dir: &str) -> PathBuf {
        self.config.root.join(dir)
    }

    /// Run one task to completion, logging its outcome.
    pub fn run_task(&self, task: TaskKind) -> TaskReport {
        let start = Instant::now();
        let mut report = TaskReport::new(task);
        tracing::debug!("Starting '{}'", task);

        match task {
            TaskKind::Styles => self.run_styles(&mut report),
            TaskKind::Scripts => self.run_scripts(&mut report),
            TaskKind::Images => self.run_images(&mut report),
            TaskKind::Markup => self.run_markup(&mut report),
            TaskKind::Index => self.run_index(&mut report),
        }

        report.duration_ms = start.elapsed().as_millis() as u64;

        for error in &report.errors {
            tracing::error!("[{}] {}", task, error);
        }

        if report.skipped > 0 {
            tracing::info!(
                "Finished '{}': {} written, {} up to date in {}ms",
                task,
                report.written.len(),
                report.skipped,
                report.duration_ms
            );
        } else {
            tracing::info!(
                "Finished '{}': {} written in {}ms",
                task,
                report.written.len(),
                report.duration_ms
            );
        }

        report
    }

    /// Run the job bound to a watched category.
    pub fn run_category(&self, category: Category) -> Vec<TaskReport> {
        category.jobs().iter().map(|task| self.run_task(*task)).collect()
    }

    /// Run every task once. Styles, scripts and images run concurrently with
    /// markup; the index injector runs after markup completes.
    pub async fn build(self: Arc<Self>) -> Result<BuildSummary, BuildError> {
        let start = Instant::now();

        let handles: Vec<_> = BUILD_GROUPS
            .iter()
            .map(|group| {
                let pipeline = Arc::clone(&self);
                let group: &'static [TaskKind] = *group;
                let handle = tokio::task::spawn_blocking(move || {
                    group
                        .iter()
                        .map(|task| pipeline.run_task(*task))
                        .collect::<Vec<_>>()
                });
                (group[0], handle)
            })
            .collect();

        let mut reports = Vec::with_capacity(TaskKind::ALL.len());
        for (task, handle) in handles {
            let group_reports = handle.await.map_err(|_| BuildError::Aborted(task))?;
            reports.extend(group_reports);
        }

        Ok(BuildSummary {
            reports,
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }

    /// Delete the whole output tree.
    pub fn clean(&self) -> Result<bool, BuildError> {
        let dir = self.output_dir();
        let removed = output::remove_tree(&dir)?;
        if removed {
            tracing::info!("Removed {}", dir.display());
        } else {
            tracing::info!("Nothing to clean at {}", dir.display());
        }
        Ok(removed)
    }
}
