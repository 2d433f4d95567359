//! Style-sheet compilation and vendor prefixing.

use std::sync::LazyLock;

use lightningcss::stylesheet::{MinifyOptions, ParserOptions, PrinterOptions, StyleSheet};
use lightningcss::targets::{Browsers, Targets};
use regex::Regex;
use serde::Deserialize;

use crate::traits::{Asset, Transform, TransformError};

/// The `./file:line:col` trailer of a rendered grass error.
static GRASS_LOCATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^\./(.+):(\d+):\d+\s*$").expect("Invalid grass location regex")
});

/// Name grass gives a stylesheet compiled from a string.
const GRASS_ENTRY_NAME: &str = "stdin";

/// How compiled CSS is printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputStyle {
    Expanded,
    #[default]
    Compressed,
}

/// Compiles SCSS (or indented Sass) to CSS with grass.
#[derive(Debug, Default)]
pub struct ScssCompiler;

impl ScssCompiler {
    pub fn new() -> Self {
        Self
    }
}

impl Transform for ScssCompiler {
    fn name(&self) -> &'static str {
        "scss"
    }

    fn apply(&self, mut asset: Asset) -> Result<Asset, TransformError> {
        let syntax = if asset.extension() == "sass" {
            grass::InputSyntax::Sass
        } else {
            grass::InputSyntax::Scss
        };

        // Always expanded here; the prefixer decides the final layout.
        let options = grass::Options::default()
            .style(grass::OutputStyle::Expanded)
            .input_syntax(syntax)
            .load_path(asset.origin_dir());

        let css = grass::from_string(asset.text()?.to_string(), &options)
            .map_err(|e| grass_error(&e.to_string()))?;

        asset.contents = css.into_bytes();
        asset.relative.set_extension("css");
        Ok(asset)
    }
}

fn grass_error(rendered: &str) -> TransformError {
    let message = rendered
        .lines()
        .next()
        .unwrap_or(rendered)
        .trim_start_matches("Error: ")
        .to_string();

    let Some(caps) = GRASS_LOCATION_RE.captures(rendered) else {
        return TransformError::Syntax {
            line: None,
            message,
        };
    };
    let line = caps[2].parse().ok();

    // Errors inside an imported partial carry the partial's line, not ours.
    if &caps[1] == GRASS_ENTRY_NAME {
        TransformError::Syntax { line, message }
    } else {
        TransformError::Syntax {
            line: None,
            message: format!("{}:{}: {}", &caps[1], &caps[2], message),
        }
    }
}

/// Adds vendor prefixes for a browserslist target and prints the final CSS.
pub struct Autoprefixer {
    targets: Targets,
    minify: bool,
}

impl Autoprefixer {
    /// Build a prefixer from browserslist queries such as `"last 2 versions"`.
    pub fn new(browsers: &[String], style: OutputStyle) -> Result<Self, TransformError> {
        let browsers = if browsers.is_empty() {
            None
        } else {
            Browsers::from_browserslist(browsers.iter())
                .map_err(|e| TransformError::InvalidOption(format!("browsers: {}", e)))?
        };

        Ok(Self {
            targets: Targets::from(browsers.unwrap_or_default()),
            minify: style == OutputStyle::Compressed,
        })
    }
}

impl Transform for Autoprefixer {
    fn name(&self) -> &'static str {
        "autoprefixer"
    }

    fn apply(&self, mut asset: Asset) -> Result<Asset, TransformError> {
        let filename = asset.origin.display().to_string();

        let code = {
            let css = asset.text()?;
            let mut stylesheet = StyleSheet::parse(
                css,
                ParserOptions {
                    filename,
                    ..ParserOptions::default()
                },
            )
            .map_err(|e| TransformError::Syntax {
                line: e.loc.as_ref().map(|loc| loc.line as usize + 1),
                message: e.kind.to_string(),
            })?;

            stylesheet
                .minify(MinifyOptions {
                    targets: self.targets,
                    ..MinifyOptions::default()
                })
                .map_err(|e| TransformError::Syntax {
                    line: e.loc.as_ref().map(|loc| loc.line as usize + 1),
                    message: e.kind.to_string(),
                })?;

            stylesheet
                .to_css(PrinterOptions {
                    minify: self.minify,
                    targets: self.targets,
                    ..PrinterOptions::default()
                })
                .map_err(|e| TransformError::Encode(format!("CSS print error: {}", e)))?
                .code
        };

        asset.contents = code.into_bytes();
        Ok(asset)
    }
}
