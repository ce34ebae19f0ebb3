pub mod address;
pub mod baudrate;
pub mod crc32;
pub mod frames;
pub mod info;

use std::path::Path;

use anyhow::Context;

use crate::util::config::{Config, OutputFormat};

/// Output options shared by all commands printing frames.
#[derive(clap::Parser, Debug)]
pub struct OutputOptions {
    /// How frames are printed. Defaults to the `output.format` config value.
    #[arg(long, short, value_enum, help_heading = "OUTPUT CONFIGURATION")]
    format: Option<OutputFormat>,
    /// Prefix frames with the H4 command packet indicator.
    #[arg(long, help_heading = "OUTPUT CONFIGURATION")]
    h4: bool,
}

impl OutputOptions {
    /// Command line flags win over the config file.
    pub fn resolve(&self, config: &Config) -> (OutputFormat, bool) {
        (
            self.format.unwrap_or(config.output.format),
            self.h4 || config.output.h4,
        )
    }
}

fn read_blob(path: &Path) -> anyhow::Result<Vec<u8>> {
    let blob = std::fs::read(path)
        .with_context(|| format!("Failed to read patch blob {}", path.display()))?;
    tracing::debug!("Read {} bytes from {}", blob.len(), path.display());
    Ok(blob)
}
