//! `brisk.toml` loading.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use brisk_pipeline::{
    BuildConfig, ImageOptions, IndexOptions, PathMap, ScriptOptions, StyleOptions,
};
use brisk_server::DevServerConfig;

/// Configuration file structure (brisk.toml).
#[derive(Debug, Deserialize, Default)]
struct ConfigFile {
    #[serde(default)]
    paths: PathMap,
    #[serde(default)]
    styles: StyleOptions,
    #[serde(default)]
    scripts: ScriptOptions,
    #[serde(default)]
    images: ImageOptions,
    #[serde(default)]
    index: IndexSection,
    #[serde(default)]
    server: ServerSection,
}

#[derive(Debug, Deserialize)]
struct IndexSection {
    #[serde(default = "default_start_marker")]
    start_marker: String,
    #[serde(default = "default_end_marker")]
    end_marker: String,
    #[serde(default = "default_link_template")]
    link_template: String,
}

impl Default for IndexSection {
    fn default() -> Self {
        Self {
            start_marker: default_start_marker(),
            end_marker: default_end_marker(),
            link_template: default_link_template(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ServerSection {
    #[serde(default = "default_host")]
    host: String,
    #[serde(default = "default_port")]
    port: u16,
    #[serde(default = "default_open")]
    open: bool,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            open: default_open(),
        }
    }
}

fn default_start_marker() -> String {
    IndexOptions::default().markers.start
}
fn default_end_marker() -> String {
    IndexOptions::default().markers.end
}
fn default_link_template() -> String {
    IndexOptions::default().link_template
}
fn default_host() -> String {
    DevServerConfig::default().host
}
fn default_port() -> u16 {
    DevServerConfig::default().port
}
fn default_open() -> bool {
    DevServerConfig::default().open
}

/// Everything a command needs, with paths resolved against the project root.
#[derive(Debug, Clone)]
pub struct Settings {
    pub build: BuildConfig,
    pub server: DevServerConfig,
}

impl ConfigFile {
    fn into_settings(self, root: PathBuf) -> Settings {
        let mut index = IndexOptions::default();
        index.markers.start = self.index.start_marker;
        index.markers.end = self.index.end_marker;
        index.link_template = self.index.link_template;

        let server = DevServerConfig {
            serve_dir: root.join(&self.paths.output_root),
            host: self.server.host,
            port: self.server.port,
            open: self.server.open,
        };

        Settings {
            build: BuildConfig {
                root,
                paths: self.paths,
                styles: self.styles,
                scripts: self.scripts,
                images: self.images,
                index,
            },
            server,
        }
    }
}

/// Load `config_path` if it exists, defaults otherwise.
///
/// The project root is the directory holding the config file. Returns an
/// error if the file exists but is malformed.
pub fn load(config_path: &Path) -> Result<Settings> {
    let cwd = std::env::current_dir().context("Failed to read current directory")?;
    let config_path = cwd.join(config_path);
    let root = config_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| cwd.clone());

    let file = if config_path.exists() {
        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read {}", config_path.display()))?;
        let file = parse(&content)
            .with_context(|| format!("Failed to parse {}", config_path.display()))?;
        tracing::info!("Loaded config from {}", config_path.display());
        file
    } else {
        tracing::debug!("No {} found, using defaults", config_path.display());
        ConfigFile::default()
    };

    Ok(file.into_settings(root))
}

fn parse(content: &str) -> Result<ConfigFile, toml::de::Error> {
    toml::from_str(content)
}
