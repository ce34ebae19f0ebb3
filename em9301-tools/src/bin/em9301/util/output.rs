use std::io::Write;

use em9301::{CommandFrame, Opcode};
use serde::Serialize;

use crate::util::config::OutputFormat;

/// Writes command frames to `writer` in the configured format.
pub struct FrameWriter<W: Write> {
    writer: W,
    format: OutputFormat,
    h4: bool,
    written: usize,
}

/// A frame as printed with [`OutputFormat::Json`].
#[derive(Debug, Serialize)]
struct FrameRecord {
    index: usize,
    opcode: Option<Opcode>,
    raw_opcode: u16,
    parameter_len: usize,
    bytes: String,
}

fn hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|byte| format!("{byte:02x}"))
        .collect::<Vec<_>>()
        .join(" ")
}

impl<W: Write> FrameWriter<W> {
    pub fn new(writer: W, format: OutputFormat, h4: bool) -> Self {
        Self {
            writer,
            format,
            h4,
            written: 0,
        }
    }

    pub fn write_frame(&mut self, frame: &CommandFrame) -> anyhow::Result<()> {
        let bytes = if self.h4 {
            frame.to_h4()
        } else {
            frame.as_bytes().to_vec()
        };

        match self.format {
            OutputFormat::Hex => writeln!(self.writer, "{}", hex(&bytes))?,
            OutputFormat::Json => {
                let record = FrameRecord {
                    index: self.written,
                    opcode: frame.opcode(),
                    raw_opcode: frame.raw_opcode(),
                    parameter_len: frame.parameter_len(),
                    bytes: hex(&bytes),
                };
                serde_json::to_writer(&mut self.writer, &record)?;
                writeln!(self.writer)?;
            }
            OutputFormat::Binary => self.writer.write_all(&bytes)?,
        }

        self.written += 1;
        Ok(())
    }

    /// Number of frames written so far.
    pub fn written(&self) -> usize {
        self.written
    }

    /// Flush and hand back the underlying writer.
    pub fn finish(mut self) -> anyhow::Result<W> {
        self.writer.flush()?;
        Ok(self.writer)
    }
}
