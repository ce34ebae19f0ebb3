use std::path::PathBuf;

use em9301::{ContainerHeader, Containers};

use crate::cmd::read_blob;

/// List the containers of a patch blob
#[derive(clap::Parser)]
pub struct Cmd {
    /// The patch blob
    path: PathBuf,
}

impl Cmd {
    pub fn run(self) -> anyhow::Result<()> {
        let blob = read_blob(&self.path)?;

        println!(
            "{:>5}  {:>10}  {:>10}  {:>10}  {:>8}",
            "#", "offset", "size", "end", "commands"
        );

        let mut commands = 0;
        for (index, container) in Containers::new(&blob).enumerate() {
            let header: ContainerHeader = container.map_err(|(offset, error)| {
                anyhow::Error::new(error)
                    .context(format!("Container {index} at offset {offset:#x} is malformed"))
            })?;

            println!(
                "{:>5}  {:#010x}  {:>10}  {:#010x}  {:>8}",
                index,
                header.offset,
                header.size,
                header.end(),
                header.command_count()
            );
            commands += header.command_count();
        }

        println!();
        println!("Blob size:     {} bytes", blob.len());
        println!("Blob CRC32:    {:#010x}", em9301::crc::crc32(&blob));
        // Every upload ends with a CPU reset.
        println!("Upload frames: {}", commands + 1);

        Ok(())
    }
}
