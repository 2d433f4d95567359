//! Glob-based file discovery.
//!
//! A [`FileSet`] is an ordered list of patterns relative to the project root.
//! Patterns prefixed with `!` exclude paths matched by earlier patterns.
//! Supported syntax: `*` within one segment, `**` across segments, `{a,b}`
//! alternatives, and `?`/`[...]` classes.
//!
//! Matching ([`FileSet::matches`]) is a pure function over root-relative
//! `/`-separated paths. [`FileSet::resolve`] walks only the literal base
//! directories of the positive patterns and returns matches in lexical order.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use globset::{GlobBuilder, GlobMatcher};
use walkdir::WalkDir;

use crate::error::BuildError;

#[derive(Clone)]
struct Rule {
    negated: bool,
    matcher: GlobMatcher,
}

/// A file matched by a [`FileSet`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Full path (project root joined with `relative`)
    pub path: PathBuf,

    /// Path relative to the project root, `/`-separated
    pub relative: String,

    /// Path relative to the set's glob base; output paths are built from this
    pub base_relative: PathBuf,
}

/// Compiled, ordered include/exclude patterns.
#[derive(Clone)]
pub struct FileSet {
    patterns: Vec<String>,
    rules: Vec<Rule>,
    base: PathBuf,
}

impl fmt::Debug for FileSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileSet")
            .field("patterns", &self.patterns)
            .field("base", &self.base)
            .finish_non_exhaustive()
    }
}

impl FileSet {
    /// Compile `patterns`. Fails on invalid glob syntax.
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self, BuildError> {
        let mut rules = Vec::with_capacity(patterns.len());
        let mut base = None;

        for raw in patterns {
            let raw = raw.as_ref();
            let (negated, pattern) = match raw.strip_prefix('!') {
                Some(rest) => (true, rest),
                None => (false, raw),
            };
            let pattern = pattern.trim_start_matches("./");

            let matcher = GlobBuilder::new(pattern)
                .literal_separator(true)
                .build()
                .map_err(|e| BuildError::Setup(format!("Invalid pattern `{}`: {}", raw, e)))?
                .compile_matcher();

            if !negated && base.is_none() {
                base = Some(literal_base(pattern));
            }

            rules.push(Rule { negated, matcher });
        }

        Ok(Self {
            patterns: patterns.iter().map(|p| p.as_ref().to_string()).collect(),
            rules,
            base: base.unwrap_or_default(),
        })
    }

    /// Literal directory prefix of the first positive pattern.
    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Whether the root-relative path `rel` is in the set.
    ///
    /// Patterns are evaluated in order; the last one that matches decides.
    pub fn matches(&self, rel: &str) -> bool {
        let rel = rel.trim_start_matches("./");
        let mut included = false;
        for rule in &self.rules {
            if rule.negated {
                if included && rule.matcher.is_match(rel) {
                    included = false;
                }
            } else if !included && rule.matcher.is_match(rel) {
                included = true;
            }
        }
        included
    }

    /// Resolve the set against the filesystem under `root`.
    pub fn resolve(&self, root: &Path) -> Result<Vec<SourceFile>, BuildError> {
        fs::read_dir(root).map_err(|e| {
            BuildError::Setup(format!("Cannot read project root {}: {}", root.display(), e))
        })?;

        let mut found: BTreeMap<String, PathBuf> = BTreeMap::new();

        for dir in self.walk_roots() {
            let start = root.join(&dir);
            if !start.is_dir() {
                continue;
            }

            for entry in WalkDir::new(&start)
                .follow_links(true)
                .into_iter()
                .filter_map(|e| e.ok())
            {
                if !entry.file_type().is_file() {
                    continue;
                }

                let Ok(relative) = entry.path().strip_prefix(root) else {
                    continue;
                };
                let relative = to_slash(relative);

                if self.matches(&relative) {
                    found.insert(relative, entry.path().to_path_buf());
                }
            }
        }

        Ok(found
            .into_iter()
            .map(|(relative, path)| {
                let base_relative = Path::new(&relative)
                    .strip_prefix(&self.base)
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|_| PathBuf::from(&relative));
                SourceFile {
                    path,
                    relative,
                    base_relative,
                }
            })
            .collect())
    }

    /// Distinct base directories of the positive patterns, with nested ones
    /// folded into their ancestors.
    fn walk_roots(&self) -> Vec<PathBuf> {
        let bases: BTreeSet<PathBuf> = self
            .patterns
            .iter()
            .filter(|p| !p.starts_with('!'))
            .map(|p| literal_base(p.trim_start_matches("./")))
            .collect();

        let mut roots: Vec<PathBuf> = Vec::new();
        for base in bases {
            if !roots.iter().any(|r| base.starts_with(r)) {
                roots.push(base);
            }
        }
        roots
    }
}

/// The leading directory segments of `pattern` that contain no glob syntax.
fn literal_base(pattern: &str) -> PathBuf {
    let segments: Vec<&str> = pattern.split('/').collect();
    let mut base = PathBuf::new();

    for (i, segment) in segments.iter().enumerate() {
        let is_last = i + 1 == segments.len();
        if is_last || segment.contains(['*', '?', '[', '{']) {
            break;
        }
        base.push(segment);
    }

    base
}

fn to_slash(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use tempfile::tempdir;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, rel).unwrap();
    }

    fn relatives(files: &[SourceFile]) -> Vec<&str> {
        files.iter().map(|f| f.relative.as_str()).collect()
    }

    #[test]
    fn single_star_stays_in_segment() {
        let set = FileSet::new(&["src/*.html"]).unwrap();

        assert!(set.matches("src/about.html"));
        assert!(!set.matches("src/blog/post.html"));
    }

    #[test]
    fn double_star_crosses_segments() {
        let set = FileSet::new(&["src/**/*.html"]).unwrap();

        assert!(set.matches("src/about.html"));
        assert!(set.matches("src/blog/2024/post.html"));
        assert!(!set.matches("other/about.html"));
    }

    #[test]
    fn braces_expand_alternatives() {
        let set = FileSet::new(&["src/**/*.{scss,sass}"]).unwrap();

        assert!(set.matches("src/scss/main.scss"));
        assert!(set.matches("src/scss/old.sass"));
        assert!(!set.matches("src/scss/main.css"));
    }

    #[test]
    fn negation_excludes_earlier_matches() {
        let set = FileSet::new(&[
            "src/**/*.{html,php}",
            "!src/layouts/**/*.html",
            "!src/index.html",
        ])
        .unwrap();

        assert!(set.matches("src/about.html"));
        assert!(set.matches("src/layouts/legacy.php"));
        assert!(!set.matches("src/layouts/header.html"));
        assert!(!set.matches("src/index.html"));
    }

    #[test]
    fn later_positive_can_reinclude() {
        let set = FileSet::new(&["src/**/*.js", "!src/vendor/**", "src/vendor/keep.js"]).unwrap();

        assert!(!set.matches("src/vendor/drop.js"));
        assert!(set.matches("src/vendor/keep.js"));
    }

    #[test]
    fn invalid_pattern_is_setup_error() {
        let err = FileSet::new(&["src/[.html"]).unwrap_err();

        assert!(matches!(err, BuildError::Setup(_)));
    }

    #[test]
    fn base_is_literal_prefix() {
        assert_eq!(FileSet::new(&["src/scss/**/*.scss"]).unwrap().base(), Path::new("src/scss"));
        assert_eq!(FileSet::new(&["src/index.html"]).unwrap().base(), Path::new("src"));
        assert_eq!(FileSet::new(&["!x", "*.js"]).unwrap().base(), Path::new(""));
    }

    #[test]
    fn resolves_in_lexical_order() {
        let temp = tempdir().unwrap();
        for rel in ["src/js/b.js", "src/js/a.js", "src/js/lib/z.js", "src/js/readme.md"] {
            touch(temp.path(), rel);
        }

        let files = FileSet::new(&["src/js/**/*.js"]).unwrap().resolve(temp.path()).unwrap();

        assert_eq!(relatives(&files), vec!["src/js/a.js", "src/js/b.js", "src/js/lib/z.js"]);
        assert_eq!(files[2].base_relative, PathBuf::from("lib/z.js"));
        assert_eq!(files[0].path, temp.path().join("src/js/a.js"));
    }

    #[test]
    fn resolve_honors_negation() {
        let temp = tempdir().unwrap();
        for rel in ["src/index.html", "src/about.html", "src/layouts/header.html"] {
            touch(temp.path(), rel);
        }

        let set = FileSet::new(&["src/**/*.html", "!src/layouts/**/*.html", "!src/index.html"]).unwrap();
        let files = set.resolve(temp.path()).unwrap();

        assert_eq!(relatives(&files), vec!["src/about.html"]);
    }

    #[test]
    fn no_matches_is_empty_not_error() {
        let temp = tempdir().unwrap();

        let files = FileSet::new(&["src/images/**/*.*"]).unwrap().resolve(temp.path()).unwrap();

        assert!(files.is_empty());
    }

    #[test]
    fn missing_root_is_setup_error() {
        let temp = tempdir().unwrap();
        let set = FileSet::new(&["src/**/*.html"]).unwrap();

        let err = set.resolve(&temp.path().join("nope")).unwrap_err();

        assert!(matches!(err, BuildError::Setup(_)));
    }

    #[test]
    fn resolves_fresh_each_time() {
        let temp = tempdir().unwrap();
        let set = FileSet::new(&["src/*.html"]).unwrap();
        touch(temp.path(), "src/a.html");
        assert_eq!(set.resolve(temp.path()).unwrap().len(), 1);

        touch(temp.path(), "src/b.html");
        assert_eq!(set.resolve(temp.path()).unwrap().len(), 2);
    }

    fn segment() -> impl Strategy<Value = String> {
        prop::sample::select(vec!["src", "layouts", "js", "a", "b"]).prop_map(str::to_string)
    }

    fn rel_path() -> impl Strategy<Value = String> {
        (
            prop::collection::vec(segment(), 0..4),
            prop::sample::select(vec!["index", "about", "main", "x"]),
            prop::sample::select(vec!["html", "php", "js", "scss"]),
        )
            .prop_map(|(dirs, stem, ext)| {
                let mut parts = dirs;
                parts.push(format!("{}.{}", stem, ext));
                parts.join("/")
            })
    }

    fn negation() -> impl Strategy<Value = String> {
        prop::sample::select(vec![
            "src/layouts/**/*.html",
            "src/index.html",
            "**/*.php",
            "src/*/a/**",
            "**/js/*.{js,scss}",
        ])
        .prop_map(str::to_string)
    }

    proptest! {
        #[test]
        fn negated_paths_never_match(
            path in rel_path(),
            negations in prop::collection::vec(negation(), 1..4),
        ) {
            let mut patterns = vec!["**/*".to_string(), "src/**/*.{html,php}".to_string()];
            patterns.extend(negations.iter().map(|n| format!("!{}", n)));
            let set = FileSet::new(&patterns).unwrap();

            let excluded = FileSet::new(&negations).unwrap();
            if excluded.matches(&path) {
                prop_assert!(!set.matches(&path));
            }
        }
    }
}
