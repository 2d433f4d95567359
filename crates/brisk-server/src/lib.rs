//! Dev server and watch mode for brisk.
//!
//! Serves the build output with live reload, watches the source tree, and
//! reruns the matching pipeline tasks on every change.

pub mod orchestrator;
pub mod reload;
pub mod server;
pub mod watcher;

pub use orchestrator::WatchOrchestrator;
pub use reload::{client_script, ReloadHub, ReloadMessage};
pub use server::{DevServer, DevServerConfig, ServerError};
pub use watcher::{FileWatcher, WatchEvent};
