//! Build pipeline for brisk.
//!
//! Resolves source file sets from glob patterns, runs the per-category
//! transform tasks (styles, scripts, images, markup) plus the index injector,
//! and cleans the output tree.

pub mod config;
pub mod error;
pub mod fileset;
pub mod output;
pub mod paths;
pub mod pipeline;

mod tasks;

pub use config::{BuildConfig, ImageOptions, IndexOptions, ScriptOptions, StyleOptions};
pub use error::BuildError;
pub use fileset::{FileSet, SourceFile};
pub use paths::{Category, PathMap, TaskKind};
pub use pipeline::{BuildSummary, Pipeline, TaskReport};
