//! Per-category build tasks.

mod images;
mod index;
mod markup;
mod scripts;
mod styles;

use std::fs;

use crate::error::BuildError;
use crate::fileset::{FileSet, SourceFile};
use crate::pipeline::{Pipeline, TaskReport};

impl Pipeline {
    /// Resolve `set`, recording a failure on `report`.
    pub(crate) fn resolve(&self, set: &FileSet, report: &mut TaskReport) -> Option<Vec<SourceFile>> {
        match set.resolve(self.root()) {
            Ok(files) => Some(files),
            Err(e) => {
                report.errors.push(e);
                None
            }
        }
    }
}

fn read(file: &SourceFile) -> Result<Vec<u8>, BuildError> {
    fs::read(&file.path).map_err(|e| BuildError::read(&file.path, e))
}
