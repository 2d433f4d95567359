//! Trait definitions for content transforms.

use std::path::{Path, PathBuf};

/// A file moving through a transform chain.
#[derive(Debug, Clone)]
pub struct Asset {
    /// Output path, relative to the category's destination directory
    pub relative: PathBuf,

    /// Source file this asset came from (used to resolve imports)
    pub origin: PathBuf,

    /// Current contents
    pub contents: Vec<u8>,
}

impl Asset {
    pub fn new(relative: impl Into<PathBuf>, origin: impl Into<PathBuf>, contents: Vec<u8>) -> Self {
        Self {
            relative: relative.into(),
            origin: origin.into(),
            contents,
        }
    }

    /// Lowercased extension of the output name.
    pub fn extension(&self) -> String {
        self.relative
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase()
    }

    /// Contents as UTF-8 text.
    pub fn text(&self) -> Result<&str, TransformError> {
        std::str::from_utf8(&self.contents)
            .map_err(|e| TransformError::Encoding(format!("{}: {}", self.origin.display(), e)))
    }

    pub fn origin_dir(&self) -> &Path {
        self.origin.parent().unwrap_or(Path::new("."))
    }
}

/// Errors that can occur during transformation.
#[derive(Debug, thiserror::Error)]
pub enum TransformError {
    #[error("{message}")]
    Syntax { line: Option<usize>, message: String },

    #[error("Invalid input encoding: {0}")]
    Encoding(String),

    #[error("Invalid option: {0}")]
    InvalidOption(String),

    #[error("Encode error: {0}")]
    Encode(String),
}

impl TransformError {
    /// 1-based source line, when the transform could point at one.
    pub fn line(&self) -> Option<usize> {
        match self {
            TransformError::Syntax { line, .. } => *line,
            _ => None,
        }
    }
}

/// A single content-to-content step.
pub trait Transform: Send + Sync {
    /// Transform identifier used in logs (e.g., "scss", "minify")
    fn name(&self) -> &'static str;

    /// Transform one asset.
    fn apply(&self, asset: Asset) -> Result<Asset, TransformError>;
}

/// Run `asset` through every transform in order.
pub fn apply_chain(chain: &[Box<dyn Transform>], asset: Asset) -> Result<Asset, TransformError> {
    chain.iter().try_fold(asset, |asset, transform| transform.apply(asset))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    struct Upper;

    impl Transform for Upper {
        fn name(&self) -> &'static str {
            "upper"
        }

        fn apply(&self, mut asset: Asset) -> Result<Asset, TransformError> {
            asset.contents = asset.text()?.to_uppercase().into_bytes();
            Ok(asset)
        }
    }

    struct Rename;

    impl Transform for Rename {
        fn name(&self) -> &'static str {
            "rename"
        }

        fn apply(&self, mut asset: Asset) -> Result<Asset, TransformError> {
            asset.relative.set_extension("out");
            Ok(asset)
        }
    }

    #[test]
    fn applies_chain_in_order() {
        let chain: Vec<Box<dyn Transform>> = vec![Box::new(Upper), Box::new(Rename)];
        let asset = Asset::new("a.txt", "src/a.txt", b"hi".to_vec());

        let out = apply_chain(&chain, asset).unwrap();

        assert_eq!(out.contents, b"HI");
        assert_eq!(out.relative, PathBuf::from("a.out"));
        assert_eq!(out.origin, PathBuf::from("src/a.txt"));
    }

    #[test]
    fn stops_at_first_error() {
        let chain: Vec<Box<dyn Transform>> = vec![Box::new(Upper), Box::new(Rename)];
        let asset = Asset::new("a.txt", "src/a.txt", vec![0xff, 0xfe]);

        let err = apply_chain(&chain, asset).unwrap_err();

        assert!(matches!(err, TransformError::Encoding(_)));
        assert_eq!(err.line(), None);
    }
}
