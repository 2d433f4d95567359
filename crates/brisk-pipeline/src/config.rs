//! Build configuration.

use std::path::PathBuf;

use serde::Deserialize;

use brisk_markup::Markers;
use brisk_transforms::OutputStyle;

use crate::paths::PathMap;

/// Style task options.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StyleOptions {
    /// Final CSS layout
    pub output_style: OutputStyle,

    /// Browserslist queries used for vendor prefixing
    pub browsers: Vec<String>,
}

impl Default for StyleOptions {
    fn default() -> Self {
        Self {
            output_style: OutputStyle::Compressed,
            browsers: vec!["last 2 versions".to_string()],
        }
    }
}

/// Script task options.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScriptOptions {
    /// File name of the concatenated bundle
    pub bundle: String,

    /// Minify the bundle
    pub minify: bool,
}

impl Default for ScriptOptions {
    fn default() -> Self {
        Self {
            bundle: "scripts.js".to_string(),
            minify: true,
        }
    }
}

/// Image task options.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ImageOptions {
    pub jpeg_quality: u8,
    pub png_level: u8,
}

impl Default for ImageOptions {
    fn default() -> Self {
        Self {
            jpeg_quality: 90,
            png_level: 5,
        }
    }
}

/// Index injector options.
#[derive(Debug, Clone)]
pub struct IndexOptions {
    pub markers: Markers,

    /// minijinja template for one link line; receives `path` and `name`
    pub link_template: String,
}

impl Default for IndexOptions {
    fn default() -> Self {
        Self {
            markers: Markers::default(),
            link_template: r#"<li><a href="{{ path }}" target="_blank">{{ path }}</a></li>"#
                .to_string(),
        }
    }
}

/// Configuration for a pipeline.
#[derive(Debug, Clone, Default)]
pub struct BuildConfig {
    /// Project root all patterns are relative to
    pub root: PathBuf,

    pub paths: PathMap,
    pub styles: StyleOptions,
    pub scripts: ScriptOptions,
    pub images: ImageOptions,
    pub index: IndexOptions,
}

impl BuildConfig {
    /// Default layout rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Default::default()
        }
    }
}
