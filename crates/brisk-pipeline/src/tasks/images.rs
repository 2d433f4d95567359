//! Image task: compress new or changed images into the output tree.

use std::path::PathBuf;

use rayon::prelude::*;

use brisk_transforms::{Asset, Transform};

use super::read;
use crate::error::BuildError;
use crate::output::{is_up_to_date, write_atomic};
use crate::pipeline::{Pipeline, TaskReport};

enum Outcome {
    Written(PathBuf),
    Fresh,
}

impl Pipeline {
    pub(crate) fn run_images(&self, report: &mut TaskReport) {
        let Some(files) = self.resolve(&self.images, report) else {
            return;
        };
        let dest = self.dest(&self.config.paths.images_dest);

        let results: Vec<Result<Outcome, BuildError>> = files
            .par_iter()
            .map(|file| {
                let out = dest.join(&file.base_relative);
                if is_up_to_date(&file.path, &out) {
                    tracing::debug!("Up to date: {}", file.relative);
                    return Ok(Outcome::Fresh);
                }

                let asset = Asset::new(file.base_relative.clone(), file.path.clone(), read(file)?);
                let compressed = self
                    .image_optimizer
                    .apply(asset)
                    .map_err(|e| BuildError::transform(&file.path, e))?;

                write_atomic(&out, &compressed.contents)?;
                Ok(Outcome::Written(out))
            })
            .collect();

        for result in results {
            match result {
                Ok(Outcome::Fresh) => report.skipped += 1,
                Ok(Outcome::Written(path)) => report.written.push(path),
                Err(e) => report.errors.push(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::io::Cursor;
    use std::path::Path;

    use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb};
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    use crate::config::BuildConfig;
    use crate::error::BuildError;
    use crate::paths::TaskKind;
    use crate::pipeline::Pipeline;

    fn png() -> Vec<u8> {
        let img = ImageBuffer::from_fn(16, 16, |x, _| Rgb([(x * 16) as u8, 40, 200]));
        let mut out = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(img).write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    fn write(root: &Path, rel: &str, contents: &[u8]) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    #[test]
    fn second_run_skips_unchanged_images() {
        let temp = tempdir().unwrap();
        write(temp.path(), "src/images/logo.png", &png());
        write(temp.path(), "src/images/icons/readme.txt", b"icons");
        let pipeline = Pipeline::new(BuildConfig::new(temp.path())).unwrap();

        let first = pipeline.run_task(TaskKind::Images);
        assert!(first.is_ok(), "{:?}", first.errors);
        assert_eq!(first.written.len(), 2);
        assert_eq!(first.skipped, 0);

        let out = temp.path().join("build/images/logo.png");
        assert!(image::load_from_memory(&fs::read(&out).unwrap()).is_ok());
        assert_eq!(
            fs::read(temp.path().join("build/images/icons/readme.txt")).unwrap(),
            b"icons"
        );

        let second = pipeline.run_task(TaskKind::Images);
        assert!(second.written.is_empty());
        assert_eq!(second.skipped, 2);
    }

    #[test]
    fn corrupt_image_is_reported() {
        let temp = tempdir().unwrap();
        write(temp.path(), "src/images/broken.jpg", b"not a jpeg");
        write(temp.path(), "src/images/ok.svg", b"<svg>\n  <!-- c -->\n  <g/>\n</svg>\n");
        let pipeline = Pipeline::new(BuildConfig::new(temp.path())).unwrap();

        let report = pipeline.run_task(TaskKind::Images);

        assert_eq!(report.errors.len(), 1);
        assert!(matches!(
            &report.errors[0],
            BuildError::Transform { path, .. } if path.ends_with("src/images/broken.jpg")
        ));
        assert_eq!(
            fs::read_to_string(temp.path().join("build/images/ok.svg")).unwrap(),
            "<svg><g/></svg>"
        );
    }
}
