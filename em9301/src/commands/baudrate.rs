use crate::command::{Command, CommandFrame, Opcode};
use crate::error::{EncodeError, VendorCommandError};

/// UART speeds of the controller, indexed by the value of [`SetUartSpeed`].
///
/// The first three slots are reserved and do not correspond to a usable speed.
pub const BAUDRATES: [u32; 15] = [
    0, 0, 0, 9600, 14400, 19200, 28800, 38400, 57600, 76800, 115200, 230400, 460800, 921600,
    1843200,
];

/// Change the UART speed of the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetUartSpeed {
    index: u8,
}

impl SetUartSpeed {
    /// Look up the table entry for `baudrate`.
    pub fn new(baudrate: u32) -> Result<Self, VendorCommandError> {
        BAUDRATES
            .iter()
            .position(|&rate| rate != 0 && rate == baudrate)
            .map(|index| Self { index: index as u8 })
            .ok_or(VendorCommandError::UnsupportedBaudrate(baudrate))
    }

    /// Index into [`BAUDRATES`] sent to the controller.
    pub fn index(&self) -> u8 {
        self.index
    }

    /// The speed in baud.
    pub fn baudrate(&self) -> u32 {
        BAUDRATES[self.index as usize]
    }
}

impl Command for SetUartSpeed {
    const OPCODE: Opcode = Opcode::SetUartSpeed;

    fn parameter_len(&self) -> usize {
        1
    }

    fn to_bytes(&self, buffer: &mut [u8]) -> Result<usize, EncodeError> {
        let Some(slot) = buffer.first_mut() else {
            return Err(EncodeError::ParametersTooLong {
                required: 1,
                available: 0,
            });
        };
        *slot = self.index;
        Ok(1)
    }
}

/// Write the command switching the UART to `baudrate` into `frame`.
///
/// Fails with [`VendorCommandError::UnsupportedBaudrate`] if the controller does not
/// support `baudrate`. The frame is not touched in that case.
pub fn build_set_baudrate_command(
    baudrate: u32,
    frame: &mut CommandFrame,
) -> Result<(), VendorCommandError> {
    let command = SetUartSpeed::new(baudrate).inspect_err(|_| {
        tracing::error!("Baudrate {} not found in table", baudrate);
    })?;

    frame.encode(&command)?;
    Ok(())
}
