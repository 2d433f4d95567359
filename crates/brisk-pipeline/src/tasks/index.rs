//! Index task: list every page between the template's markers.

use std::fs;
use std::path::{Path, PathBuf};

use brisk_markup::inject_lines;
use minijinja::context;

use crate::error::BuildError;
use crate::output::write_atomic;
use crate::pipeline::{Pipeline, TaskReport, LINK_TEMPLATE};

impl Pipeline {
    pub(crate) fn run_index(&self, report: &mut TaskReport) {
        report.record(self.write_index());
    }

    fn write_index(&self) -> Result<PathBuf, BuildError> {
        let paths = &self.config.paths;
        let template_path = self.root().join(&paths.template);
        let template =
            fs::read_to_string(&template_path).map_err(|e| BuildError::read(&template_path, e))?;

        let files = self.index_links.resolve(self.root())?;
        let source_prefix = format!("{}/", paths.source_root.trim_end_matches('/'));

        let link = self
            .templates
            .get_template(LINK_TEMPLATE)
            .map_err(|e| BuildError::Setup(e.to_string()))?;

        let mut lines = Vec::with_capacity(files.len());
        for file in files.iter().filter(|f| f.relative.ends_with(".html")) {
            let path = file
                .relative
                .strip_prefix(&source_prefix)
                .unwrap_or(&file.relative);
            let name = Path::new(path)
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or(path);

            let line = link
                .render(context! { path => path, name => name })
                .map_err(|e| BuildError::Transform {
                    path: template_path.clone(),
                    line: None,
                    message: format!("link template failed: {}", e),
                })?;
            lines.push(line);
        }

        let html = inject_lines(&template, &self.config.index.markers, &lines).map_err(|e| {
            BuildError::Transform {
                path: template_path.clone(),
                line: None,
                message: e.to_string(),
            }
        })?;

        let relative = Path::new(&paths.template)
            .strip_prefix(&paths.source_root)
            .unwrap_or(Path::new(&paths.template));
        let out = self.dest(&paths.markup_dest).join(relative);
        write_atomic(&out, html.as_bytes())?;

        tracing::debug!("Injected {} links into {}", lines.len(), out.display());
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;

    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    use crate::config::BuildConfig;
    use crate::error::BuildError;
    use crate::paths::TaskKind;
    use crate::pipeline::Pipeline;

    const TEMPLATE: &str = "<ul>\n  <!-- inject:html -->\n  <!-- endinject -->\n</ul>\n";

    fn write(root: &Path, rel: &str, contents: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    #[test]
    fn links_pages_in_order() {
        let temp = tempdir().unwrap();
        write(temp.path(), "src/index.html", TEMPLATE);
        write(temp.path(), "src/contact.html", "");
        write(temp.path(), "src/about.html", "");
        write(temp.path(), "src/layouts/header.html", "");
        write(temp.path(), "src/legacy.php", "");

        let report = Pipeline::new(BuildConfig::new(temp.path()))
            .unwrap()
            .run_task(TaskKind::Index);

        assert!(report.is_ok(), "{:?}", report.errors);
        assert_eq!(
            fs::read_to_string(temp.path().join("build/index.html")).unwrap(),
            "<ul>\n  <!-- inject:html -->\n  \
             <li><a href=\"about.html\" target=\"_blank\">about.html</a></li>\n  \
             <li><a href=\"contact.html\" target=\"_blank\">contact.html</a></li>\n  \
             <!-- endinject -->\n</ul>\n"
        );
    }

    #[test]
    fn custom_template_gets_name() {
        let temp = tempdir().unwrap();
        write(temp.path(), "src/index.html", TEMPLATE);
        write(temp.path(), "src/blog/post.html", "");
        let mut config = BuildConfig::new(temp.path());
        config.index.link_template = "<a href=\"{{ path }}\">{{ name }}</a>".to_string();

        let report = Pipeline::new(config).unwrap().run_task(TaskKind::Index);

        assert!(report.is_ok(), "{:?}", report.errors);
        let html = fs::read_to_string(temp.path().join("build/index.html")).unwrap();
        assert!(html.contains("<a href=\"blog/post.html\">post</a>"));
    }

    #[test]
    fn missing_markers_is_an_error() {
        let temp = tempdir().unwrap();
        write(temp.path(), "src/index.html", "<ul></ul>\n");
        write(temp.path(), "src/about.html", "");

        let report = Pipeline::new(BuildConfig::new(temp.path()))
            .unwrap()
            .run_task(TaskKind::Index);

        assert_eq!(report.errors.len(), 1);
        assert!(matches!(
            &report.errors[0],
            BuildError::Transform { path, .. } if path.ends_with("src/index.html")
        ));
        assert!(!temp.path().join("build/index.html").exists());
    }

    #[test]
    fn missing_template_is_read_error() {
        let temp = tempdir().unwrap();
        fs::create_dir_all(temp.path().join("src")).unwrap();

        let report = Pipeline::new(BuildConfig::new(temp.path()))
            .unwrap()
            .run_task(TaskKind::Index);

        assert!(matches!(report.errors[..], [BuildError::Read { .. }]));
    }
}
