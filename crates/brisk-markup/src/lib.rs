//! Markup assembly for brisk.
//!
//! This crate provides the two text-level operations the markup tasks need:
//! expanding `//= path` include directives (with cycle detection) and
//! replacing the marker region of an index template with generated lines.

pub mod include;
pub mod inject;

pub use include::{expand_includes, expand_source, FsLoader, IncludeError, SourceLoader};
pub use inject::{inject_lines, InjectError, Markers};
