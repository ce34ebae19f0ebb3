//! The patch upload state machine.
//!
//! The controller accepts a patch as a series of `Write Patch Start` / `Write Patch Continue`
//! commands, one series per container, followed by a single `CPU Reset` once the whole blob
//! was transferred. [`UploadSession`] keeps track of where in the blob the upload is and
//! produces these commands one at a time.
//!
//! The session performs no I/O. The caller sends every produced command and waits for the
//! controller to confirm it before asking for the next one.

use crate::command::CommandFrame;
use crate::commands::{CpuReset, WritePatchContinue, WritePatchStart};
use crate::container::ContainerHeader;
use crate::error::UploadError;
use crate::progress::UploadProgress;

/// Where in the upload a session currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UploadPhase {
    /// At a container boundary, the next command starts a container or requests the reset.
    #[default]
    BetweenContainers,
    /// Inside a container, the next command continues it.
    InContainer,
    /// The reset command was produced, the next request reports completion.
    ResetPending,
    /// The upload is complete.
    Done,
    /// The upload was halted by a malformed container.
    Error(UploadError),
}

/// Result of asking a session for the next command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextCommand {
    /// The frame holds a command which has to be sent to the controller.
    Command,
    /// The upload is complete, there are no more commands.
    Done,
}

/// Progress of one patch upload.
///
/// A session is created once per upload and always starts at the beginning of the blob.
/// It must be driven with the same blob for its whole lifetime; [`PatchUpload`] binds the
/// two together.
#[derive(Debug, Clone, Default)]
pub struct UploadSession {
    cursor: usize,
    container_end: usize,
    sequence_number: u16,
    containers: usize,
    phase: UploadPhase,
}

impl UploadSession {
    /// Create a session positioned at the start of a blob.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rewind the session to the start of the blob, forgetting all progress.
    pub fn initialize(&mut self) {
        *self = Self::new();
    }

    /// Offset of the next byte of the blob to upload.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// End of the container currently being uploaded.
    pub fn container_end(&self) -> usize {
        self.container_end
    }

    /// Sequence number of the next `Write Patch Continue` command.
    pub fn sequence_number(&self) -> u16 {
        self.sequence_number
    }

    /// Number of containers uploaded completely.
    pub fn containers_done(&self) -> usize {
        self.containers
    }

    /// The current phase of the upload.
    pub fn phase(&self) -> UploadPhase {
        self.phase
    }

    /// `true` once no further commands will be produced.
    pub fn is_finished(&self) -> bool {
        matches!(self.phase, UploadPhase::Done | UploadPhase::Error(_))
    }

    /// Write the next command of the upload of `blob` into `frame`.
    ///
    /// Returns [`NextCommand::Command`] when `frame` holds a command to send, and
    /// [`NextCommand::Done`] once the upload is complete. A malformed container halts the
    /// upload: the error is returned for this and every following call and `frame` is
    /// not written.
    pub fn produce_next_command(
        &mut self,
        blob: &[u8],
        frame: &mut CommandFrame,
    ) -> Result<NextCommand, UploadError> {
        self.step(blob, frame, &UploadProgress::silent())
    }

    pub(crate) fn step(
        &mut self,
        blob: &[u8],
        frame: &mut CommandFrame,
        progress: &UploadProgress,
    ) -> Result<NextCommand, UploadError> {
        tracing::debug!(
            "pos {:#x}, container end {:#x}, blob size {:#x}",
            self.cursor,
            self.container_end,
            blob.len()
        );

        match self.phase {
            UploadPhase::Done => Ok(NextCommand::Done),
            UploadPhase::Error(error) => Err(error),
            UploadPhase::ResetPending => {
                self.phase = UploadPhase::Done;
                progress.finished();
                Ok(NextCommand::Done)
            }
            UploadPhase::BetweenContainers if self.cursor >= blob.len() => {
                self.request_reset(frame, progress)
            }
            UploadPhase::BetweenContainers => self.start_container(blob, frame, progress),
            UploadPhase::InContainer => self.continue_container(blob, frame, progress),
        }
    }

    fn request_reset(
        &mut self,
        frame: &mut CommandFrame,
        progress: &UploadProgress,
    ) -> Result<NextCommand, UploadError> {
        if let Err(error) = frame.encode(&CpuReset) {
            return Err(self.fail(error.into(), progress));
        }

        tracing::info!("Patch transferred, resetting controller CPU");
        self.phase = UploadPhase::ResetPending;
        progress.reset_requested();

        Ok(NextCommand::Command)
    }

    fn start_container(
        &mut self,
        blob: &[u8],
        frame: &mut CommandFrame,
        progress: &UploadProgress,
    ) -> Result<NextCommand, UploadError> {
        let header = match ContainerHeader::parse(blob, self.cursor) {
            Ok(header) => header,
            Err(source) => {
                tracing::error!("Malformed patch container at {:#x}: {}", self.cursor, source);
                let error = UploadError::MalformedContainer {
                    offset: self.cursor,
                    source,
                };
                return Err(self.fail(error, progress));
            }
        };

        tracing::info!(
            "Uploading container {} at {:#x} ({} bytes)",
            self.containers,
            header.offset,
            header.size
        );
        self.container_end = header.end();
        self.sequence_number = 1;
        progress.container_started(self.containers, header);

        let command = WritePatchStart::first_chunk(&blob[self.cursor..self.container_end]);
        if let Err(error) = frame.encode(&command) {
            return Err(self.fail(error.into(), progress));
        }
        self.advance(command.data.len(), progress);

        if self.cursor < self.container_end {
            self.phase = UploadPhase::InContainer;
        } else {
            self.finish_container(progress);
        }

        Ok(NextCommand::Command)
    }

    fn continue_container(
        &mut self,
        blob: &[u8],
        frame: &mut CommandFrame,
        progress: &UploadProgress,
    ) -> Result<NextCommand, UploadError> {
        let command = WritePatchContinue::next_chunk(
            self.sequence_number,
            &blob[self.cursor..self.container_end],
        );
        if let Err(error) = frame.encode(&command) {
            return Err(self.fail(error.into(), progress));
        }
        self.sequence_number = self.sequence_number.wrapping_add(1);
        self.advance(command.data.len(), progress);

        if self.cursor >= self.container_end {
            self.finish_container(progress);
        }

        Ok(NextCommand::Command)
    }

    fn advance(&mut self, chunk: usize, progress: &UploadProgress) {
        self.cursor += chunk;
        progress.chunk_written(chunk);
    }

    fn finish_container(&mut self, progress: &UploadProgress) {
        tracing::info!("Container {} done", self.containers);
        progress.container_finished(self.containers);

        self.containers += 1;
        self.phase = UploadPhase::BetweenContainers;
    }

    fn fail(&mut self, error: UploadError, progress: &UploadProgress) -> UploadError {
        self.phase = UploadPhase::Error(error);
        progress.failed(error);
        error
    }
}

/// An upload session bound to the blob it uploads.
///
/// Besides [`PatchUpload::next_command`], which mirrors [`UploadSession::produce_next_command`],
/// the upload can be consumed as an iterator of frames:
///
/// ```
/// use em9301::PatchUpload;
///
/// # let blob: &[u8] = &[];
/// for frame in PatchUpload::new(blob) {
///     let frame = frame?;
///     // Send `frame.as_bytes()` and wait for the command complete event.
/// #   let _ = frame;
/// }
/// # Ok::<(), em9301::UploadError>(())
/// ```
#[derive(Debug)]
pub struct PatchUpload<'a> {
    blob: &'a [u8],
    session: UploadSession,
    progress: UploadProgress,
    halted: bool,
}

impl<'a> PatchUpload<'a> {
    /// Prepare the upload of `blob`.
    pub fn new(blob: &'a [u8]) -> Self {
        Self {
            blob,
            session: UploadSession::new(),
            progress: UploadProgress::silent(),
            halted: false,
        }
    }

    /// Report progress events to `progress`.
    pub fn with_progress(mut self, progress: UploadProgress) -> Self {
        self.progress = progress;
        self
    }

    /// The blob being uploaded.
    pub fn blob(&self) -> &'a [u8] {
        self.blob
    }

    /// The underlying session.
    pub fn session(&self) -> &UploadSession {
        &self.session
    }

    /// Start over from the beginning of the blob.
    pub fn restart(&mut self) {
        self.session.initialize();
        self.halted = false;
    }

    /// Write the next command into `frame`, see [`UploadSession::produce_next_command`].
    pub fn next_command(&mut self, frame: &mut CommandFrame) -> Result<NextCommand, UploadError> {
        self.session.step(self.blob, frame, &self.progress)
    }
}

impl Iterator for PatchUpload<'_> {
    type Item = Result<CommandFrame, UploadError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.halted {
            return None;
        }

        let mut frame = CommandFrame::new();
        match self.next_command(&mut frame) {
            Ok(NextCommand::Command) => Some(Ok(frame)),
            Ok(NextCommand::Done) => None,
            Err(error) => {
                self.halted = true;
                Some(Err(error))
            }
        }
    }
}

impl std::iter::FusedIterator for PatchUpload<'_> {}
