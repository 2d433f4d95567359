//! Include directive expansion.
//!
//! A line consisting of `//= relative/path.html` is replaced by the contents
//! of that file, resolved relative to the including file. Included files are
//! expanded recursively, and every spliced line is indented like the
//! directive line.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

static DIRECTIVE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^([ \t]*)//=[ \t]*["']?([^"'\s]+)["']?[ \t]*$"#)
        .expect("Invalid include directive regex")
});

/// Source of file contents for include expansion.
pub trait SourceLoader {
    /// Load the file at `path` as UTF-8 text.
    fn load(&self, path: &Path) -> io::Result<String>;
}

/// Loads includes straight from disk.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsLoader;

impl SourceLoader for FsLoader {
    fn load(&self, path: &Path) -> io::Result<String> {
        fs::read_to_string(path)
    }
}

/// In-memory sources, keyed by normalized path.
impl SourceLoader for HashMap<PathBuf, String> {
    fn load(&self, path: &Path) -> io::Result<String> {
        self.get(path)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, path.display().to_string()))
    }
}

/// Errors that can occur while expanding includes.
#[derive(Debug, thiserror::Error)]
pub enum IncludeError {
    #[error("Include cycle: {}", format_chain(.chain))]
    Cycle { chain: Vec<PathBuf> },

    #[error("{}:{line}: included file not found: {}", .file.display(), .target.display())]
    Missing {
        file: PathBuf,
        line: usize,
        target: PathBuf,
    },

    #[error("Failed to read {}: {source}", .path.display())]
    Read { path: PathBuf, source: io::Error },
}

impl IncludeError {
    /// Line of the offending directive, when known.
    pub fn line(&self) -> Option<usize> {
        match self {
            IncludeError::Missing { line, .. } => Some(*line),
            _ => None,
        }
    }
}

fn format_chain(chain: &[PathBuf]) -> String {
    chain
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// Load `path` and expand all include directives in it.
pub fn expand_includes<L: SourceLoader>(path: &Path, loader: &L) -> Result<String, IncludeError> {
    let path = normalize(path);
    let source = loader.load(&path).map_err(|source| IncludeError::Read {
        path: path.clone(),
        source,
    })?;
    expand_source(&path, &source, loader)
}

/// Expand include directives in `source`, which was loaded from `path`.
pub fn expand_source<L: SourceLoader>(
    path: &Path,
    source: &str,
    loader: &L,
) -> Result<String, IncludeError> {
    let path = normalize(path);
    let mut stack = vec![path.clone()];
    expand(&path, source, loader, &mut stack)
}

fn expand<L: SourceLoader>(
    path: &Path,
    source: &str,
    loader: &L,
    stack: &mut Vec<PathBuf>,
) -> Result<String, IncludeError> {
    let dir = path.parent().unwrap_or(Path::new(""));
    let mut output = String::with_capacity(source.len());

    for (index, line) in source.split_inclusive('\n').enumerate() {
        let body = line.trim_end_matches(['\n', '\r']);

        let Some(caps) = DIRECTIVE_RE.captures(body) else {
            output.push_str(line);
            continue;
        };

        let indent = &caps[1];
        let target = normalize(&dir.join(&caps[2]));

        if stack.contains(&target) {
            let mut chain = stack.clone();
            chain.push(target);
            return Err(IncludeError::Cycle { chain });
        }

        let included = match loader.load(&target) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(IncludeError::Missing {
                    file: path.to_path_buf(),
                    line: index + 1,
                    target,
                });
            }
            Err(source) => return Err(IncludeError::Read { path: target, source }),
        };

        stack.push(target.clone());
        let expanded = expand(&target, &included, loader, stack)?;
        stack.pop();

        for piece in expanded.split_inclusive('\n') {
            if !piece.trim().is_empty() {
                output.push_str(indent);
            }
            output.push_str(piece);
        }

        if !expanded.ends_with('\n') && line.ends_with('\n') {
            output.push('\n');
        }
    }

    Ok(output)
}

/// Lexically normalize a path, folding `.` and `..` components.
fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    normalized.push("..");
                }
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sources(files: &[(&str, &str)]) -> HashMap<PathBuf, String> {
        files
            .iter()
            .map(|(p, s)| (PathBuf::from(p), s.to_string()))
            .collect()
    }

    #[test]
    fn splices_included_file() {
        let loader = sources(&[
            ("src/about.html", "<body>\n//= layouts/header.html\n<p>About</p>\n</body>\n"),
            ("src/layouts/header.html", "<header>Site</header>\n"),
        ]);

        let html = expand_includes(Path::new("src/about.html"), &loader).unwrap();

        assert_eq!(html, "<body>\n<header>Site</header>\n<p>About</p>\n</body>\n");
    }

    #[test]
    fn applies_directive_indentation() {
        let loader = sources(&[
            ("src/index.html", "<nav>\n    //= parts/menu.html\n</nav>\n"),
            ("src/parts/menu.html", "<ul>\n\n<li>Home</li>\n</ul>"),
        ]);

        let html = expand_includes(Path::new("src/index.html"), &loader).unwrap();

        assert_eq!(
            html,
            "<nav>\n    <ul>\n\n    <li>Home</li>\n    </ul>\n</nav>\n"
        );
    }

    #[test]
    fn expands_nested_includes_relative_to_each_file() {
        let loader = sources(&[
            ("src/page.html", "//= layouts/base.html\n"),
            ("src/layouts/base.html", "<main>\n//= ../partials/footer.html\n</main>\n"),
            ("src/partials/footer.html", "<footer/>\n"),
        ]);

        let html = expand_includes(Path::new("src/page.html"), &loader).unwrap();

        assert_eq!(html, "<main>\n<footer/>\n</main>\n");
    }

    #[test]
    fn leaves_non_directive_comments_alone() {
        let loader = sources(&[("a.html", "<script>\n  // = not a directive\n  x //= y\n</script>\n")]);

        let html = expand_includes(Path::new("a.html"), &loader).unwrap();

        assert_eq!(html, "<script>\n  // = not a directive\n  x //= y\n</script>\n");
    }

    #[test]
    fn detects_self_include() {
        let loader = sources(&[("src/x.html", "<p>\n//= x.html\n</p>\n")]);

        let err = expand_includes(Path::new("src/x.html"), &loader).unwrap_err();

        match err {
            IncludeError::Cycle { chain } => {
                assert_eq!(chain, vec![PathBuf::from("src/x.html"), PathBuf::from("src/x.html")]);
            }
            other => panic!("expected cycle, got {other:?}"),
        }
    }

    #[test]
    fn detects_transitive_cycle() {
        let loader = sources(&[
            ("src/x.html", "//= a.html\n"),
            ("src/a.html", "//= sub/b.html\n"),
            ("src/sub/b.html", "//= ../x.html\n"),
        ]);

        let err = expand_includes(Path::new("src/x.html"), &loader).unwrap_err();

        assert!(matches!(err, IncludeError::Cycle { ref chain } if chain.len() == 4));
        assert!(err.to_string().contains("src/x.html -> src/a.html"));
    }

    #[test]
    fn same_partial_twice_is_not_a_cycle() {
        let loader = sources(&[
            ("p.html", "//= hr.html\n//= hr.html\n"),
            ("hr.html", "<hr>\n"),
        ]);

        let html = expand_includes(Path::new("p.html"), &loader).unwrap();

        assert_eq!(html, "<hr>\n<hr>\n");
    }

    #[test]
    fn reports_missing_include_with_line() {
        let loader = sources(&[("src/a.html", "<p>\n\n//= nope.html\n")]);

        let err = expand_includes(Path::new("src/a.html"), &loader).unwrap_err();

        assert_eq!(err.line(), Some(3));
        assert!(err.to_string().contains("src/nope.html"));
    }

    #[test]
    fn reads_from_disk() {
        let temp = tempfile::tempdir().unwrap();
        fs::create_dir_all(temp.path().join("layouts")).unwrap();
        fs::write(temp.path().join("layouts/head.html"), "<head></head>\n").unwrap();
        fs::write(temp.path().join("page.html"), "//= layouts/head.html\n<body></body>\n").unwrap();

        let html = expand_includes(&temp.path().join("page.html"), &FsLoader).unwrap();

        assert_eq!(html, "<head></head>\n<body></body>\n");
    }
}
