use em9301::{BdAddr, Chipset, CommandFrame, Em9301};

use crate::cmd::OutputOptions;
use crate::util::config::Config;
use crate::util::output::FrameWriter;

/// Print the vendor command setting the public device address
#[derive(clap::Parser)]
pub struct Cmd {
    /// The address, most significant octet first (AA:BB:CC:DD:EE:FF)
    address: BdAddr,

    #[clap(flatten)]
    output: OutputOptions,
}

impl Cmd {
    pub fn run(self, config: &Config) -> anyhow::Result<()> {
        let mut frame = CommandFrame::new();
        Em9301::new().set_bd_addr_command(self.address, &mut frame)?;

        let (format, h4) = self.output.resolve(config);
        let mut writer = FrameWriter::new(std::io::stdout().lock(), format, h4);
        writer.write_frame(&frame)?;
        writer.finish()?;
        Ok(())
    }
}
