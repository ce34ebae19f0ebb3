use em9301::{Chipset, CommandFrame, Em9301};

use crate::cmd::OutputOptions;
use crate::util::config::Config;
use crate::util::output::FrameWriter;
use crate::util::parse_u32;

/// Print the vendor command switching the controller UART speed
///
/// e.g. em9301 baudrate 921600
///      07 fc 01 0d
///
/// The controller takes an index into its table of supported speeds,
/// any other speed is rejected.
#[derive(clap::Parser)]
#[clap(verbatim_doc_comment)]
pub struct Cmd {
    /// The new speed in baud
    #[clap(value_parser = parse_u32)]
    baudrate: u32,

    #[clap(flatten)]
    output: OutputOptions,
}

impl Cmd {
    pub fn run(self, config: &Config) -> anyhow::Result<()> {
        let mut frame = CommandFrame::new();
        Em9301::new().set_baudrate_command(self.baudrate, &mut frame)?;

        let (format, h4) = self.output.resolve(config);
        let mut writer = FrameWriter::new(std::io::stdout().lock(), format, h4);
        writer.write_frame(&frame)?;
        writer.finish()?;
        Ok(())
    }
}
