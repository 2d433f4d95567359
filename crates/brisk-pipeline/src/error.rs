//! Build error taxonomy.

use std::io;
use std::path::{Path, PathBuf};

use brisk_markup::IncludeError;
use brisk_transforms::TransformError;

use crate::paths::TaskKind;

/// Errors that can occur during a build.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("Setup error: {0}")]
    Setup(String),

    #[error("{}{}: {message}", .path.display(), line_suffix(.line))]
    Transform {
        path: PathBuf,
        line: Option<usize>,
        message: String,
    },

    #[error("Include cycle in {}: {}", .path.display(), format_chain(.chain))]
    IncludeCycle { path: PathBuf, chain: Vec<PathBuf> },

    #[error("Failed to read {}: {source}", .path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("Failed to write {}: {source}", .path.display())]
    Write { path: PathBuf, source: io::Error },

    #[error("{0} task aborted unexpectedly")]
    Aborted(TaskKind),
}

impl BuildError {
    /// Wrap a transform failure with the file it happened in.
    pub fn transform(path: &Path, err: TransformError) -> Self {
        BuildError::Transform {
            path: path.to_path_buf(),
            line: err.line(),
            message: err.to_string(),
        }
    }

    /// Map an include failure for the page at `path`.
    pub fn include(path: &Path, err: IncludeError) -> Self {
        match err {
            IncludeError::Cycle { chain } => BuildError::IncludeCycle {
                path: path.to_path_buf(),
                chain,
            },
            IncludeError::Missing { file, line, target } => BuildError::Transform {
                path: file,
                line: Some(line),
                message: format!("included file not found: {}", target.display()),
            },
            IncludeError::Read { path, source } => BuildError::Read { path, source },
        }
    }

    pub fn read(path: &Path, source: io::Error) -> Self {
        BuildError::Read {
            path: path.to_path_buf(),
            source,
        }
    }

    pub fn write(path: &Path, source: io::Error) -> Self {
        BuildError::Write {
            path: path.to_path_buf(),
            source,
        }
    }
}

fn line_suffix(line: &Option<usize>) -> String {
    line.map(|l| format!(":{}", l)).unwrap_or_default()
}

fn format_chain(chain: &[PathBuf]) -> String {
    chain
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}
