//! Style task: SCSS compile, prefix, write one `.css` per entry point.

use std::path::PathBuf;

use rayon::prelude::*;

use brisk_transforms::{apply_chain, Asset};

use super::read;
use crate::error::BuildError;
use crate::fileset::SourceFile;
use crate::output::write_atomic;
use crate::pipeline::{Pipeline, TaskReport};

/// Partials (`_name.scss`) are only compiled through the files using them.
fn is_partial(file: &SourceFile) -> bool {
    file.path
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with('_'))
}

impl Pipeline {
    pub(crate) fn run_styles(&self, report: &mut TaskReport) {
        let Some(files) = self.resolve(&self.styles, report) else {
            return;
        };
        let dest = self.dest(&self.config.paths.styles_dest);

        let results: Vec<Result<PathBuf, BuildError>> = files
            .par_iter()
            .filter(|file| !is_partial(file))
            .map(|file| {
                let asset = Asset::new(file.base_relative.clone(), file.path.clone(), read(file)?);
                let compiled = apply_chain(&self.style_chain, asset)
                    .map_err(|e| BuildError::transform(&file.path, e))?;

                let out = dest.join(&compiled.relative);
                write_atomic(&out, &compiled.contents)?;
                Ok(out)
            })
            .collect();

        for result in results {
            report.record(result);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;

    use crate::config::BuildConfig;
    use crate::error::BuildError;
    use crate::paths::TaskKind;
    use crate::pipeline::Pipeline;

    fn write(root: &std::path::Path, rel: &str, contents: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    #[test]
    fn compiles_entry_points_and_skips_partials() {
        let temp = tempdir().unwrap();
        write(temp.path(), "src/scss/_vars.scss", "$brand: #336699;\n");
        write(temp.path(), "src/scss/main.scss", "@import 'vars';\nbody { color: $brand; }\n");
        write(temp.path(), "src/scss/pages/home.scss", ".hero { .title { margin: 0; } }\n");

        let pipeline = Pipeline::new(BuildConfig::new(temp.path())).unwrap();
        let report = pipeline.run_task(TaskKind::Styles);

        assert!(report.is_ok(), "{:?}", report.errors);
        let css = fs::read_to_string(temp.path().join("build/css/main.css")).unwrap();
        assert!(css.contains("#369"));
        assert!(temp.path().join("build/css/pages/home.css").exists());
        assert!(!temp.path().join("build/css/_vars.css").exists());
        assert_eq!(report.written.len(), 2);
    }

    #[test]
    fn error_in_one_file_does_not_block_others() {
        let temp = tempdir().unwrap();
        write(temp.path(), "src/scss/broken.scss", "a {\n  color: $nope;\n}\n");
        write(temp.path(), "src/scss/ok.scss", "a { color: red; }\n");

        let pipeline = Pipeline::new(BuildConfig::new(temp.path())).unwrap();
        let report = pipeline.run_task(TaskKind::Styles);

        assert_eq!(report.errors.len(), 1);
        match &report.errors[0] {
            BuildError::Transform { path, line, .. } => {
                assert!(path.ends_with("src/scss/broken.scss"));
                assert_eq!(*line, Some(2));
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert!(temp.path().join("build/css/ok.css").exists());
        assert!(!temp.path().join("build/css/broken.css").exists());
    }
}
