use crate::command::{Command, Opcode};
use crate::error::EncodeError;

/// Reset the controller CPU so it starts executing the uploaded patch.
#[derive(Debug, Clone, Copy, Default)]
pub struct CpuReset;

impl Command for CpuReset {
    const OPCODE: Opcode = Opcode::CpuReset;

    fn parameter_len(&self) -> usize {
        0
    }

    fn to_bytes(&self, _buffer: &mut [u8]) -> Result<usize, EncodeError> {
        Ok(0)
    }
}
