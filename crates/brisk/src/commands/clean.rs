//! Output cleanup command.

use anyhow::Result;
use brisk_pipeline::{BuildConfig, Pipeline};

pub fn run(config: BuildConfig) -> Result<()> {
    Pipeline::new(config)?.clean()?;
    Ok(())
}
