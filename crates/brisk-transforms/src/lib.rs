//! Content transforms for the brisk asset pipeline.
//!
//! Every transform takes an [`Asset`] (bytes plus an output-relative name) and
//! returns a new one. Tasks in `brisk-pipeline` chain them per category.

pub mod images;
pub mod scripts;
pub mod styles;
pub mod traits;

pub use images::ImageOptimizer;
pub use scripts::{check_syntax, concat, JsMinifier};
pub use styles::{Autoprefixer, OutputStyle, ScssCompiler};
pub use traits::{apply_chain, Asset, Transform, TransformError};
