//! Source and destination layout.

use std::fmt;

use serde::Deserialize;

/// A unit of build work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TaskKind {
    Styles,
    Scripts,
    Images,
    Markup,
    Index,
}

impl TaskKind {
    pub const ALL: [TaskKind; 5] = [
        TaskKind::Styles,
        TaskKind::Scripts,
        TaskKind::Images,
        TaskKind::Markup,
        TaskKind::Index,
    ];
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TaskKind::Styles => "scss",
            TaskKind::Scripts => "scripts",
            TaskKind::Images => "images",
            TaskKind::Markup => "html",
            TaskKind::Index => "html-index",
        };
        f.write_str(name)
    }
}

/// A watched source category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    Styles,
    Scripts,
    Images,
    Markup,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Styles,
        Category::Scripts,
        Category::Images,
        Category::Markup,
    ];

    /// Tasks to rerun, in order, when a file in this category changes.
    pub fn jobs(self) -> &'static [TaskKind] {
        match self {
            Category::Styles => &[TaskKind::Styles],
            Category::Scripts => &[TaskKind::Scripts],
            Category::Images => &[TaskKind::Images],
            Category::Markup => &[TaskKind::Markup, TaskKind::Index],
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Category::Styles => "styles",
            Category::Scripts => "scripts",
            Category::Images => "images",
            Category::Markup => "markup",
        };
        f.write_str(name)
    }
}

/// Where each category's sources live and where its output goes.
///
/// Patterns are relative to the project root; a leading `!` excludes paths
/// matched by earlier patterns.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PathMap {
    /// Source root, stripped from index link paths
    pub source_root: String,

    /// Output root, removed by `clean` and served by the dev server
    pub output_root: String,

    /// Markup pages
    pub markup: Vec<String>,

    /// Include-only partials, never output or linked directly
    pub layouts: Vec<String>,

    /// Index template receiving the generated link list
    pub template: String,

    pub scripts: Vec<String>,
    pub styles: Vec<String>,
    pub images: Vec<String>,

    pub markup_dest: String,
    pub scripts_dest: String,
    pub styles_dest: String,
    pub images_dest: String,
}

impl Default for PathMap {
    fn default() -> Self {
        Self {
            source_root: "src".to_string(),
            output_root: "build".to_string(),
            markup: vec![
                "src/**/*.{html,php}".to_string(),
                "!src/layouts/**/*.html".to_string(),
                "!src/index.html".to_string(),
            ],
            layouts: vec!["src/layouts/**/*.html".to_string()],
            template: "src/index.html".to_string(),
            scripts: vec!["src/js/**/*.js".to_string()],
            styles: vec!["src/scss/**/*.{scss,sass}".to_string()],
            images: vec!["src/images/**/*.*".to_string()],
            markup_dest: "build".to_string(),
            scripts_dest: "build/js".to_string(),
            styles_dest: "build/css".to_string(),
            images_dest: "build/images".to_string(),
        }
    }
}

impl PathMap {
    /// Patterns for the pages listed by the index: markup minus partials and
    /// minus the template itself.
    pub fn index_links(&self) -> Vec<String> {
        let mut patterns = self.markup.clone();
        patterns.extend(self.layouts.iter().map(|p| negate(p)));
        patterns.push(negate(&self.template));
        patterns
    }

    /// Patterns that trigger the markup job: every markup file, including
    /// partials and the template, since either can change the output.
    pub fn markup_watch(&self) -> Vec<String> {
        let mut patterns: Vec<String> = self
            .markup
            .iter()
            .filter(|p| !p.starts_with('!'))
            .cloned()
            .collect();
        patterns.extend(self.layouts.iter().cloned());
        patterns.push(self.template.clone());
        patterns
    }
}

fn negate(pattern: &str) -> String {
    if pattern.starts_with('!') {
        pattern.to_string()
    } else {
        format!("!{}", pattern)
    }
}
