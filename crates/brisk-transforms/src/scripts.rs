//! Script bundling and minification with oxc.

use std::path::PathBuf;

use oxc_allocator::Allocator;
use oxc_codegen::{Codegen, CodegenOptions};
use oxc_minifier::{Minifier, MinifierOptions};
use oxc_parser::Parser;
use oxc_span::SourceType;

use crate::traits::{Asset, Transform, TransformError};

/// Separator placed between concatenated inputs.
const JOIN: &[u8] = b"\n";

/// Browser scripts are classic scripts, not modules.
fn source_type() -> SourceType {
    SourceType::default().with_script(true)
}

/// Concatenate `assets`, in order, into one asset named `bundle_name`.
pub fn concat(assets: &[Asset], bundle_name: &str) -> Asset {
    let origin = assets
        .first()
        .map(|a| a.origin_dir().join(bundle_name))
        .unwrap_or_else(|| PathBuf::from(bundle_name));

    let contents = assets
        .iter()
        .map(|a| a.contents.as_slice())
        .collect::<Vec<_>>()
        .join(JOIN);

    Asset::new(bundle_name, origin, contents)
}

/// Parse `source` and report the first syntax error, if any.
pub fn check_syntax(source: &str) -> Result<(), TransformError> {
    let allocator = Allocator::default();
    let ret = Parser::new(&allocator, source, source_type()).parse();

    match ret.errors.first() {
        Some(error) => {
            let offset = error
                .labels
                .as_ref()
                .and_then(|labels| labels.first())
                .map(|label| label.offset());
            Err(syntax_error(source, offset, error.to_string()))
        }
        None => Ok(()),
    }
}

fn syntax_error(source: &str, offset: Option<usize>, message: String) -> TransformError {
    TransformError::Syntax {
        line: offset.map(|offset| line_of(source, offset)),
        message,
    }
}

fn line_of(source: &str, offset: usize) -> usize {
    let end = offset.min(source.len());
    source.as_bytes()[..end].iter().filter(|b| **b == b'\n').count() + 1
}

/// Minifies a script: compress, mangle, then print without whitespace.
#[derive(Debug, Default)]
pub struct JsMinifier;

impl JsMinifier {
    pub fn new() -> Self {
        Self
    }

    /// Minify `source`, failing on any syntax error.
    pub fn minify(&self, source: &str) -> Result<String, TransformError> {
        let allocator = Allocator::default();
        check_syntax(source)?;
        let ret = Parser::new(&allocator, source, source_type()).parse();

        let mut program = ret.program;
        let minified = Minifier::new(MinifierOptions::default()).build(&allocator, &mut program);

        let code = Codegen::new()
            .with_options(CodegenOptions {
                minify: true,
                ..CodegenOptions::default()
            })
            .with_scoping(minified.scoping)
            .build(&program)
            .code;

        Ok(code)
    }
}

impl Transform for JsMinifier {
    fn name(&self) -> &'static str {
        "minify"
    }

    fn apply(&self, mut asset: Asset) -> Result<Asset, TransformError> {
        let code = self.minify(asset.text()?)?;
        asset.contents = code.into_bytes();
        Ok(asset)
    }
}
