//! Script task: concatenate every matched file into one bundle, then minify.

use brisk_transforms::{check_syntax, concat, Asset, Transform};

use super::read;
use crate::error::BuildError;
use crate::output::write_atomic;
use crate::pipeline::{Pipeline, TaskReport};

impl Pipeline {
    pub(crate) fn run_scripts(&self, report: &mut TaskReport) {
        let Some(files) = self.resolve(&self.scripts, report) else {
            return;
        };
        if files.is_empty() {
            return;
        }

        // Check each input on its own so errors name the file they came from.
        let mut assets = Vec::with_capacity(files.len());
        for file in &files {
            let contents = match read(file) {
                Ok(contents) => contents,
                Err(e) => {
                    report.errors.push(e);
                    continue;
                }
            };
            let asset = Asset::new(file.base_relative.clone(), file.path.clone(), contents);
            if let Err(e) = asset.text().and_then(check_syntax) {
                report.errors.push(BuildError::transform(&file.path, e));
            }
            assets.push(asset);
        }

        let bundle_name = &self.config.scripts.bundle;
        if !report.errors.is_empty() {
            tracing::warn!("Not writing {}: bundle inputs have errors", bundle_name);
            return;
        }

        let mut bundle = concat(&assets, bundle_name);
        if let Some(minifier) = &self.minifier {
            bundle = match minifier.apply(bundle) {
                Ok(minified) => minified,
                Err(e) => {
                    report.errors.push(BuildError::transform(
                        &self.dest(&self.config.paths.scripts_dest).join(bundle_name),
                        e,
                    ));
                    return;
                }
            };
        }

        let out = self.dest(&self.config.paths.scripts_dest).join(&bundle.relative);
        report.record(write_atomic(&out, &bundle.contents).map(|_| out));
    }
}
