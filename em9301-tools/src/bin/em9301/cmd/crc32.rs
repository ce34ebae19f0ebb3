use std::path::PathBuf;

use anyhow::Context;

/// Print the CRC32 of a file, as the controller computes it
#[derive(clap::Parser)]
pub struct Cmd {
    /// The file to checksum
    path: PathBuf,
}

impl Cmd {
    pub fn run(self) -> anyhow::Result<()> {
        let data = std::fs::read(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))?;

        println!("{:#010x}  {}", em9301::crc::crc32(&data), self.path.display());
        Ok(())
    }
}
