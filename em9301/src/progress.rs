use crate::container::ContainerHeader;
use crate::error::UploadError;

/// A structure to manage the patch upload progress reporting.
///
/// This struct stores a handler closure which will be called every time an event happens
/// during the upload.
///
/// # Example
///
/// ```
/// use em9301::UploadProgress;
///
/// // Print events
/// let progress = UploadProgress::new(|event| println!("Event: {:#?}", event));
/// ```
pub struct UploadProgress {
    handler: Option<Box<dyn Fn(ProgressEvent)>>,
}

impl UploadProgress {
    /// Create a new `UploadProgress` structure with a given `handler` to be called on events.
    pub fn new(handler: impl Fn(ProgressEvent) + 'static) -> Self {
        Self {
            handler: Some(Box::new(handler)),
        }
    }

    /// Create an `UploadProgress` that drops all events.
    pub fn silent() -> Self {
        Self { handler: None }
    }

    /// Emit an upload progress event.
    fn emit(&self, event: ProgressEvent) {
        if let Some(handler) = &self.handler {
            handler(event);
        }
    }

    pub(crate) fn container_started(&self, index: usize, header: ContainerHeader) {
        self.emit(ProgressEvent::ContainerStarted {
            index,
            offset: header.offset,
            size: header.size,
        });
    }

    pub(crate) fn chunk_written(&self, size: usize) {
        self.emit(ProgressEvent::ChunkWritten { size });
    }

    pub(crate) fn container_finished(&self, index: usize) {
        self.emit(ProgressEvent::ContainerFinished { index });
    }

    pub(crate) fn reset_requested(&self) {
        self.emit(ProgressEvent::ResetRequested);
    }

    pub(crate) fn finished(&self) {
        self.emit(ProgressEvent::Finished);
    }

    pub(crate) fn failed(&self, error: UploadError) {
        self.emit(ProgressEvent::Failed(error));
    }
}

impl Default for UploadProgress {
    fn default() -> Self {
        Self::silent()
    }
}

impl std::fmt::Debug for UploadProgress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadProgress")
            .field("handler", &self.handler.is_some())
            .finish()
    }
}

/// Possible events during a patch upload.
///
/// For a blob that uploads without problems, the events arrive in the following order:
///
/// * for every container:
///   * `ContainerStarted`
///   * `ChunkWritten` for every command carrying patch data
///   * `ContainerFinished`
/// * `ResetRequested`
/// * `Finished`
///
/// A malformed container produces `Failed`, and no further events are emitted.
///
/// Events are emitted when a command is produced, the caller is still responsible
/// for actually sending it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressEvent {
    /// A new container was validated and its first chunk is being sent.
    ContainerStarted {
        /// Zero based position of the container in the blob.
        index: usize,
        /// Offset of the container in the blob.
        offset: usize,
        /// Total size of the container.
        size: u32,
    },
    /// A command carrying `size` bytes of patch data was produced.
    ChunkWritten {
        /// Number of patch bytes in the command.
        size: usize,
    },
    /// The last chunk of a container was produced.
    ContainerFinished {
        /// Zero based position of the container in the blob.
        index: usize,
    },
    /// The whole blob was consumed and the CPU reset command was produced.
    ResetRequested,
    /// The upload is complete.
    Finished,
    /// The upload was halted.
    Failed(UploadError),
}
