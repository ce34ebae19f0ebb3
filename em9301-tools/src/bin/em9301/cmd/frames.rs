use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use anyhow::Context;
use em9301::{PatchUpload, ProgressEvent, UploadProgress};

use crate::cmd::{read_blob, OutputOptions};
use crate::util::config::Config;
use crate::util::output::FrameWriter;

/// Generate the HCI commands uploading a patch blob
///
/// Frames are written in the order they have to be sent to the controller.
/// The sequence ends with a CPU reset, which activates the patch.
///
/// A malformed container stops the generation with an error. The frames
/// already written are still valid, but the reset is never produced.
#[derive(clap::Parser)]
#[clap(verbatim_doc_comment)]
pub struct Cmd {
    /// The patch blob
    path: PathBuf,
    /// Write the frames to this file instead of stdout
    #[arg(long, short)]
    output: Option<PathBuf>,

    #[clap(flatten)]
    output_options: OutputOptions,
}

fn log_progress(event: ProgressEvent) {
    match event {
        ProgressEvent::ContainerStarted {
            index,
            offset,
            size,
        } => tracing::info!("Container {index}: {size} bytes at offset {offset:#x}"),
        ProgressEvent::ChunkWritten { size } => tracing::trace!("Chunk of {size} bytes"),
        ProgressEvent::ContainerFinished { index } => tracing::debug!("Container {index} done"),
        ProgressEvent::ResetRequested => tracing::info!("All containers written, resetting CPU"),
        ProgressEvent::Finished => tracing::info!("Upload sequence complete"),
        ProgressEvent::Failed(error) => tracing::error!("Upload halted: {error}"),
    }
}

impl Cmd {
    pub fn run(self, config: &Config) -> anyhow::Result<()> {
        let blob = read_blob(&self.path)?;
        let (format, h4) = self.output_options.resolve(config);

        let sink: Box<dyn Write> = match &self.output {
            Some(path) => Box::new(BufWriter::new(File::create(path).with_context(|| {
                format!("Failed to create output file {}", path.display())
            })?)),
            None => Box::new(std::io::stdout().lock()),
        };
        let mut writer = FrameWriter::new(sink, format, h4);

        let upload = PatchUpload::new(&blob).with_progress(UploadProgress::new(log_progress));
        for frame in upload {
            let frame = match frame {
                Ok(frame) => frame,
                Err(error) => {
                    // Keep what was generated so far, it shows where the blob broke.
                    writer.finish()?;
                    return Err(error).context("Patch blob is malformed");
                }
            };
            writer.write_frame(&frame)?;
        }

        tracing::info!("Wrote {} frames", writer.written());
        writer.finish()?;

        Ok(())
    }
}
