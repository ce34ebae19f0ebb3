//! HCI command frames.
//!
//! Every command sent to the controller has the same layout:
//!
//! ```text
//! +--------+--------+--------+-----------------------+
//! | opcode (LE u16) | length | parameters (length B) |
//! +--------+--------+--------+-----------------------+
//! ```
//!
//! The opcode is split into a 6 bit opcode group (OGF) and a 10 bit command field (OCF).
//! All commands in this crate live in the vendor specific group `0x3F`.

use scroll::{Pwrite, LE};

use crate::error::EncodeError;

/// Opcode group reserved for vendor specific commands.
pub const OGF_VENDOR: u8 = 0x3f;

/// Size of the opcode and length fields in front of the parameters.
pub const COMMAND_HEADER_LEN: usize = 3;

/// Largest parameter block any command of this crate produces.
pub const MAX_PARAMETER_LEN: usize = 64;

/// Capacity of a [`CommandFrame`].
pub const COMMAND_FRAME_CAPACITY: usize = COMMAND_HEADER_LEN + MAX_PARAMETER_LEN;

/// HCI packet indicator for commands on a UART (H4) transport.
pub const H4_COMMAND_INDICATOR: u8 = 0x01;

/// Combine an opcode group and a command field into an HCI opcode.
pub const fn opcode(ogf: u8, ocf: u16) -> u16 {
    ocf | (ogf as u16) << 10
}

/// Vendor commands understood by the EM9301 and EM9304.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[repr(u16)]
pub enum Opcode {
    SetPublicAddress = opcode(OGF_VENDOR, 0x02),
    SetUartSpeed = opcode(OGF_VENDOR, 0x07),
    WritePatchStart = opcode(OGF_VENDOR, 0x27),
    WritePatchContinue = opcode(OGF_VENDOR, 0x28),
    /// Reserved, never emitted by the uploader.
    WritePatchAbort = opcode(OGF_VENDOR, 0x29),
    CpuReset = opcode(OGF_VENDOR, 0x32),
    /// Reserved, never emitted by the uploader.
    PatchQuery = opcode(OGF_VENDOR, 0x34),
}

impl Opcode {
    /// Look up a known opcode from its raw value.
    pub fn from_u16(value: u16) -> Option<Self> {
        [
            Opcode::SetPublicAddress,
            Opcode::SetUartSpeed,
            Opcode::WritePatchStart,
            Opcode::WritePatchContinue,
            Opcode::WritePatchAbort,
            Opcode::CpuReset,
            Opcode::PatchQuery,
        ]
        .into_iter()
        .find(|opcode| *opcode as u16 == value)
    }
}

/// A command that can be serialized into a [`CommandFrame`].
pub trait Command {
    const OPCODE: Opcode;

    /// Number of parameter bytes [`Command::to_bytes`] writes.
    fn parameter_len(&self) -> usize;

    /// Write the command parameters to `buffer`.
    /// Returns the amount of bytes written to the buffer.
    fn to_bytes(&self, buffer: &mut [u8]) -> Result<usize, EncodeError>;
}

/// Maps a failed write into `buffer` to an [`EncodeError`].
pub(crate) fn parameters_too_long(
    required: usize,
    buffer: &[u8],
) -> impl FnOnce(scroll::Error) -> EncodeError {
    let available = buffer.len();
    move |_| EncodeError::ParametersTooLong {
        required,
        available,
    }
}

/// Buffer holding exactly one outgoing HCI command.
///
/// The buffer is sized for the largest command this crate builds, so none of the
/// builders can overrun it. A fresh frame is empty until a command is encoded into it.
#[derive(Clone, PartialEq, Eq)]
pub struct CommandFrame {
    buffer: [u8; COMMAND_FRAME_CAPACITY],
}

impl CommandFrame {
    /// Create an empty frame.
    pub const fn new() -> Self {
        Self {
            buffer: [0; COMMAND_FRAME_CAPACITY],
        }
    }

    /// Serialize `command` into this frame, replacing the previous content.
    ///
    /// On error the frame is left unmodified.
    pub fn encode<C: Command>(&mut self, command: &C) -> Result<(), EncodeError> {
        let required = command.parameter_len();
        if required > MAX_PARAMETER_LEN {
            return Err(EncodeError::ParametersTooLong {
                required,
                available: MAX_PARAMETER_LEN,
            });
        }

        let mut parameters = [0u8; MAX_PARAMETER_LEN];
        let written = command.to_bytes(&mut parameters[..required])?;
        debug_assert_eq!(written, required);

        self.buffer[COMMAND_HEADER_LEN..COMMAND_HEADER_LEN + written]
            .copy_from_slice(&parameters[..written]);
        self.buffer[..2].copy_from_slice(&(C::OPCODE as u16).to_le_bytes());
        self.buffer[2] = written as u8;

        tracing::trace!("Encoded {:?}: {:02X?}", C::OPCODE, self.as_bytes());

        Ok(())
    }

    /// Raw opcode of the command in the frame.
    pub fn raw_opcode(&self) -> u16 {
        u16::from_le_bytes([self.buffer[0], self.buffer[1]])
    }

    /// Opcode of the command in the frame, `None` if the frame is empty.
    pub fn opcode(&self) -> Option<Opcode> {
        Opcode::from_u16(self.raw_opcode())
    }

    /// The parameter length byte.
    pub fn parameter_len(&self) -> usize {
        self.buffer[2] as usize
    }

    /// The command parameters.
    pub fn parameters(&self) -> &[u8] {
        &self.buffer[COMMAND_HEADER_LEN..COMMAND_HEADER_LEN + self.parameter_len()]
    }

    /// Total length of the encoded command, header included.
    pub fn len(&self) -> usize {
        if self.is_empty() {
            0
        } else {
            COMMAND_HEADER_LEN + self.parameter_len()
        }
    }

    /// `true` until a command has been encoded.
    pub fn is_empty(&self) -> bool {
        self.raw_opcode() == 0
    }

    /// The encoded command, header included.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer[..self.len()]
    }

    /// The encoded command prefixed with the H4 command packet indicator.
    pub fn to_h4(&self) -> Vec<u8> {
        let mut packet = Vec::with_capacity(self.len() + 1);
        packet.push(H4_COMMAND_INDICATOR);
        packet.extend_from_slice(self.as_bytes());
        packet
    }
}

impl Default for CommandFrame {
    fn default() -> Self {
        Self::new()
    }
}

impl AsRef<[u8]> for CommandFrame {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl std::fmt::Debug for CommandFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandFrame")
            .field("opcode", &format_args!("{:#06x}", self.raw_opcode()))
            .field("parameters", &format_args!("{:02X?}", self.parameters()))
            .finish()
    }
}

/// Write a little endian `u16` at `offset`.
pub(crate) fn write_u16(buffer: &mut [u8], offset: usize, value: u16) -> Result<(), EncodeError> {
    buffer
        .pwrite_with(value, offset, LE)
        .map_err(parameters_too_long(offset + 2, buffer))?;
    Ok(())
}

/// Write a little endian `u32` at `offset`.
pub(crate) fn write_u32(buffer: &mut [u8], offset: usize, value: u32) -> Result<(), EncodeError> {
    buffer
        .pwrite_with(value, offset, LE)
        .map_err(parameters_too_long(offset + 4, buffer))?;
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    struct Raw(&'static [u8]);

    impl Command for Raw {
        const OPCODE: Opcode = Opcode::PatchQuery;

        fn parameter_len(&self) -> usize {
            self.0.len()
        }

        fn to_bytes(&self, buffer: &mut [u8]) -> Result<usize, EncodeError> {
            buffer[..self.0.len()].copy_from_slice(self.0);
            Ok(self.0.len())
        }
    }

    #[test]
    fn vendor_opcodes() {
        assert_eq!(opcode(OGF_VENDOR, 0x02), 0xFC02);
        assert_eq!(opcode(OGF_VENDOR, 0x07), 0xFC07);
        assert_eq!(Opcode::WritePatchStart as u16, 0xFC27);
        assert_eq!(Opcode::WritePatchContinue as u16, 0xFC28);
        assert_eq!(Opcode::WritePatchAbort as u16, 0xFC29);
        assert_eq!(Opcode::CpuReset as u16, 0xFC32);
        assert_eq!(Opcode::PatchQuery as u16, 0xFC34);
    }

    #[test]
    fn opcode_lookup() {
        assert_eq!(Opcode::from_u16(0xFC32), Some(Opcode::CpuReset));
        assert_eq!(Opcode::from_u16(0x0C03), None);
    }

    #[test]
    fn new_frame_is_empty() {
        let frame = CommandFrame::new();

        assert!(frame.is_empty());
        assert_eq!(frame.len(), 0);
        assert_eq!(frame.as_bytes(), &[] as &[u8]);
        assert_eq!(frame.opcode(), None);
    }

    #[test]
    fn encode_writes_header() {
        let mut frame = CommandFrame::new();

        frame.encode(&Raw(&[0xaa, 0xbb])).unwrap();

        assert_eq!(frame.as_bytes(), &[0x34, 0xFC, 0x02, 0xaa, 0xbb]);
        assert_eq!(frame.opcode(), Some(Opcode::PatchQuery));
        assert_eq!(frame.parameters(), &[0xaa, 0xbb]);
        assert_eq!(frame.to_h4(), vec![0x01, 0x34, 0xFC, 0x02, 0xaa, 0xbb]);
    }

    #[test]
    fn oversized_parameters_leave_frame_untouched() {
        static TOO_LONG: [u8; MAX_PARAMETER_LEN + 1] = [0; MAX_PARAMETER_LEN + 1];

        let mut frame = CommandFrame::new();
        frame.encode(&Raw(&[1])).unwrap();
        let before = frame.clone();

        assert_eq!(
            frame.encode(&Raw(&TOO_LONG)),
            Err(EncodeError::ParametersTooLong {
                required: MAX_PARAMETER_LEN + 1,
                available: MAX_PARAMETER_LEN,
            })
        );
        assert_eq!(frame, before);
    }

    #[test]
    fn little_endian_helpers() {
        let mut buffer = [0u8; 6];

        write_u16(&mut buffer, 0, 0x1234).unwrap();
        write_u32(&mut buffer, 2, 0xdeadbeef).unwrap();

        assert_eq!(buffer, [0x34, 0x12, 0xef, 0xbe, 0xad, 0xde]);
        assert_eq!(
            write_u32(&mut buffer, 4, 0),
            Err(EncodeError::ParametersTooLong {
                required: 8,
                available: 6,
            })
        );
    }
}
