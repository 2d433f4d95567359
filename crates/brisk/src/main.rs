//! brisk CLI - front-end asset pipeline with a live-reload dev server.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

use brisk_pipeline::TaskKind;

mod commands;
mod config;

#[derive(Parser)]
#[command(name = "brisk")]
#[command(about = "Compile styles, bundle scripts, optimize images and serve with live reload")]
#[command(version)]
pub struct Cli {
    /// Defaults to `watch`
    #[command(subcommand)]
    command: Option<Commands>,

    /// Path to brisk.toml config file
    #[arg(short, long, default_value = "brisk.toml", global = true)]
    config: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run every task once
    Build {
        /// Skip script minification
        #[arg(long)]
        no_minify: bool,
    },

    /// Build, then serve the output and rebuild on change
    Watch {
        /// Port to listen on (defaults to config or 9000)
        #[arg(short, long)]
        port: Option<u16>,

        /// Do not open browser
        #[arg(long)]
        no_open: bool,
    },

    /// Delete the build output
    Clean,

    /// Compile stylesheets
    Scss,

    /// Bundle and minify scripts
    Scripts,

    /// Optimize images
    Images,

    /// Scaffold a starter project in the current directory
    Init {
        /// Overwrite existing files
        #[arg(short, long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    fmt().with_env_filter(filter).with_target(false).init();

    match cli.command.unwrap_or(Commands::Watch {
        port: None,
        no_open: false,
    }) {
        Commands::Init { yes } => {
            let root = std::env::current_dir()?;
            commands::init::run(&root, yes).await?;
        }
        Commands::Build { no_minify } => {
            let mut settings = config::load(&cli.config)?;
            if no_minify {
                settings.build.scripts.minify = false;
            }
            commands::build::run(settings.build).await?;
        }
        Commands::Watch { port, no_open } => {
            let mut settings = config::load(&cli.config)?;
            if let Some(port) = port {
                settings.server.port = port;
            }
            if no_open {
                settings.server.open = false;
            }
            commands::watch::run(settings).await?;
        }
        Commands::Clean => {
            commands::clean::run(config::load(&cli.config)?.build)?;
        }
        Commands::Scss => {
            commands::task::run(config::load(&cli.config)?.build, TaskKind::Styles).await?;
        }
        Commands::Scripts => {
            commands::task::run(config::load(&cli.config)?.build, TaskKind::Scripts).await?;
        }
        Commands::Images => {
            commands::task::run(config::load(&cli.config)?.build, TaskKind::Images).await?;
        }
    }

    Ok(())
}
