//! Markup task: expand includes in every page.

use std::path::PathBuf;

use rayon::prelude::*;

use brisk_markup::{expand_includes, FsLoader};

use crate::error::BuildError;
use crate::output::write_atomic;
use crate::pipeline::{Pipeline, TaskReport};

impl Pipeline {
    pub(crate) fn run_markup(&self, report: &mut TaskReport) {
        let Some(files) = self.resolve(&self.markup, report) else {
            return;
        };
        let dest = self.dest(&self.config.paths.markup_dest);

        let results: Vec<Result<PathBuf, BuildError>> = files
            .par_iter()
            .map(|file| {
                let html = expand_includes(&file.path, &FsLoader)
                    .map_err(|e| BuildError::include(&file.path, e))?;

                let out = dest.join(&file.base_relative);
                write_atomic(&out, html.as_bytes())?;
                Ok(out)
            })
            .collect();

        for result in results {
            report.record(result);
        }
    }
}
