use crate::command::{write_u16, write_u32, Command, Opcode, MAX_PARAMETER_LEN};
use crate::crc::crc32;
use crate::error::EncodeError;

/// Parameter bytes in front of the data of a [`WritePatchStart`] command.
const START_OVERHEAD: usize = 1 + 4;

/// Parameter bytes in front of the data of a [`WritePatchContinue`] command.
const CONTINUE_OVERHEAD: usize = 2 + 4;

/// Maximum number of patch bytes carried by a [`WritePatchStart`] command.
pub const START_CHUNK_MAX: usize = MAX_PARAMETER_LEN - START_OVERHEAD;

/// Maximum number of patch bytes carried by a [`WritePatchContinue`] command.
pub const CONTINUE_CHUNK_MAX: usize = MAX_PARAMETER_LEN - CONTINUE_OVERHEAD;

/// Memory region a patch is written to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum PatchDestination {
    /// Instruction RAM 1, the primary internal memory of the controller.
    #[default]
    IRam1 = 0x00,
}

/// First chunk of a patch container.
///
/// Parameters: destination (1), CRC-32 of `data` (4), `data` (at most 59).
#[derive(Debug, Clone, Copy)]
pub struct WritePatchStart<'a> {
    pub destination: PatchDestination,
    pub data: &'a [u8],
}

impl<'a> WritePatchStart<'a> {
    /// Take the first chunk of `container`, as much as fits into one command.
    pub fn first_chunk(container: &'a [u8]) -> Self {
        let len = container.len().min(START_CHUNK_MAX);
        Self {
            destination: PatchDestination::IRam1,
            data: &container[..len],
        }
    }
}

impl Command for WritePatchStart<'_> {
    const OPCODE: Opcode = Opcode::WritePatchStart;

    fn parameter_len(&self) -> usize {
        START_OVERHEAD + self.data.len()
    }

    fn to_bytes(&self, buffer: &mut [u8]) -> Result<usize, EncodeError> {
        let len = self.parameter_len();
        if buffer.len() < len {
            return Err(EncodeError::ParametersTooLong {
                required: len,
                available: buffer.len(),
            });
        }

        buffer[0] = self.destination as u8;
        write_u32(buffer, 1, crc32(self.data))?;
        buffer[START_OVERHEAD..len].copy_from_slice(self.data);

        Ok(len)
    }
}

/// Any further chunk of a patch container.
///
/// Parameters: sequence number (2), CRC-32 of `data` (4), `data` (at most 58).
#[derive(Debug, Clone, Copy)]
pub struct WritePatchContinue<'a> {
    pub sequence_number: u16,
    pub data: &'a [u8],
}

impl<'a> WritePatchContinue<'a> {
    /// Take the next chunk from `remaining`, as much as fits into one command.
    pub fn next_chunk(sequence_number: u16, remaining: &'a [u8]) -> Self {
        let len = remaining.len().min(CONTINUE_CHUNK_MAX);
        Self {
            sequence_number,
            data: &remaining[..len],
        }
    }
}

impl Command for WritePatchContinue<'_> {
    const OPCODE: Opcode = Opcode::WritePatchContinue;

    fn parameter_len(&self) -> usize {
        CONTINUE_OVERHEAD + self.data.len()
    }

    fn to_bytes(&self, buffer: &mut [u8]) -> Result<usize, EncodeError> {
        let len = self.parameter_len();
        if buffer.len() < len {
            return Err(EncodeError::ParametersTooLong {
                required: len,
                available: buffer.len(),
            });
        }

        write_u16(buffer, 0, self.sequence_number)?;
        write_u32(buffer, 2, crc32(self.data))?;
        buffer[CONTINUE_OVERHEAD..len].copy_from_slice(self.data);

        Ok(len)
    }
}
