//! Chipset adapter for HCI host stacks.
//!
//! Host stacks drive controller specific setup through a small chipset interface: an
//! optional init sequence producing commands one by one, plus builders for the commands
//! changing the UART speed and the public device address.

use crate::command::CommandFrame;
use crate::commands::{build_set_address_command, build_set_baudrate_command, BdAddr};
use crate::error::{UploadError, VendorCommandError};
use crate::progress::UploadProgress;
use crate::upload::{NextCommand, PatchUpload};

/// Outcome of [`Chipset::next_command`] in the two-valued form host stacks expect.
///
/// This conflates a completed upload with a halted one. Use the `Result` returned by
/// [`Chipset::next_command`] directly to tell the two apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChipsetResult {
    /// The frame holds a command to send.
    ValidCommand,
    /// No more commands, either because the sequence completed or because it was halted.
    Done,
}

impl From<Result<NextCommand, UploadError>> for ChipsetResult {
    fn from(result: Result<NextCommand, UploadError>) -> Self {
        match result {
            Ok(NextCommand::Command) => ChipsetResult::ValidCommand,
            Ok(NextCommand::Done) | Err(_) => ChipsetResult::Done,
        }
    }
}

/// Controller specific behavior needed by a host stack.
pub trait Chipset {
    /// Human readable name of the chipset.
    fn name(&self) -> &'static str;

    /// Prepare the init sequence, rewinding it if it already ran.
    fn init(&mut self) {}

    /// Produce the next command of the init sequence.
    fn next_command(&mut self, _frame: &mut CommandFrame) -> Result<NextCommand, UploadError> {
        Ok(NextCommand::Done)
    }

    /// Build the command switching the UART to `baudrate`.
    fn set_baudrate_command(
        &self,
        baudrate: u32,
        frame: &mut CommandFrame,
    ) -> Result<(), VendorCommandError>;

    /// Build the command setting the public device address.
    fn set_bd_addr_command(
        &self,
        address: BdAddr,
        frame: &mut CommandFrame,
    ) -> Result<(), VendorCommandError>;
}

/// The EM9301 and its successor EM9304.
///
/// Without a patch the init sequence is empty. With a patch, the init sequence uploads it
/// and resets the controller.
#[derive(Debug, Default)]
pub struct Em9301<'a> {
    patch: Option<PatchUpload<'a>>,
}

impl<'a> Em9301<'a> {
    /// A controller without a patch to upload.
    pub fn new() -> Self {
        Self { patch: None }
    }

    /// A controller which gets `blob` uploaded during init.
    pub fn with_patch(blob: &'a [u8]) -> Self {
        Self {
            patch: Some(PatchUpload::new(blob)),
        }
    }

    /// Report patch upload progress to `progress`.
    pub fn with_progress(mut self, progress: UploadProgress) -> Self {
        self.patch = self.patch.map(|upload| upload.with_progress(progress));
        self
    }

    /// The patch upload, if a patch was given.
    pub fn patch(&self) -> Option<&PatchUpload<'a>> {
        self.patch.as_ref()
    }
}

impl Chipset for Em9301<'_> {
    fn name(&self) -> &'static str {
        "EM9301"
    }

    fn init(&mut self) {
        if let Some(upload) = &mut self.patch {
            upload.restart();
        }
    }

    fn next_command(&mut self, frame: &mut CommandFrame) -> Result<NextCommand, UploadError> {
        match &mut self.patch {
            Some(upload) => upload.next_command(frame),
            None => Ok(NextCommand::Done),
        }
    }

    fn set_baudrate_command(
        &self,
        baudrate: u32,
        frame: &mut CommandFrame,
    ) -> Result<(), VendorCommandError> {
        build_set_baudrate_command(baudrate, frame)
    }

    fn set_bd_addr_command(
        &self,
        address: BdAddr,
        frame: &mut CommandFrame,
    ) -> Result<(), VendorCommandError> {
        build_set_address_command(address, frame)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::command::Opcode;
    use crate::container::test::container;
    use pretty_assertions::assert_eq;

    #[test]
    fn without_patch_init_is_empty() {
        let mut chipset = Em9301::new();
        let mut frame = CommandFrame::new();

        chipset.init();

        assert_eq!(chipset.next_command(&mut frame), Ok(NextCommand::Done));
        assert!(frame.is_empty());
        assert_eq!(chipset.name(), "EM9301");
    }

    #[test]
    fn with_patch_init_uploads() {
        let blob = container(10, 0);
        let mut chipset = Em9301::with_patch(&blob);
        let mut frame = CommandFrame::new();

        chipset.init();

        assert_eq!(
            ChipsetResult::from(chipset.next_command(&mut frame)),
            ChipsetResult::ValidCommand
        );
        assert_eq!(frame.opcode(), Some(Opcode::WritePatchStart));
        assert_eq!(
            ChipsetResult::from(chipset.next_command(&mut frame)),
            ChipsetResult::ValidCommand
        );
        assert_eq!(frame.opcode(), Some(Opcode::CpuReset));
        assert_eq!(
            ChipsetResult::from(chipset.next_command(&mut frame)),
            ChipsetResult::Done
        );

        // A second init runs the upload again.
        chipset.init();
        chipset.next_command(&mut frame).unwrap();
        assert_eq!(frame.opcode(), Some(Opcode::WritePatchStart));
    }

    #[test]
    fn legacy_result_conflates_errors() {
        let mut chipset = Em9301::with_patch(b"broken");
        let mut frame = CommandFrame::new();

        let result = chipset.next_command(&mut frame);

        assert!(result.is_err());
        assert_eq!(ChipsetResult::from(result), ChipsetResult::Done);
    }

    #[test]
    fn auxiliary_builders() {
        let chipset = Em9301::new();
        let mut frame = CommandFrame::new();

        chipset.set_baudrate_command(115200, &mut frame).unwrap();
        assert_eq!(frame.as_bytes(), &[0x07, 0xFC, 0x01, 10]);

        chipset
            .set_bd_addr_command(BdAddr([1, 2, 3, 4, 5, 6]), &mut frame)
            .unwrap();
        assert_eq!(frame.as_bytes(), &[0x02, 0xFC, 0x06, 6, 5, 4, 3, 2, 1]);

        assert_eq!(
            chipset.set_baudrate_command(300, &mut frame),
            Err(VendorCommandError::UnsupportedBaudrate(300))
        );
    }
}
