//! The vendor commands of the EM9301 / EM9304.

pub mod address;
pub mod baudrate;
pub mod patch;
pub mod reset;

pub use address::{build_set_address_command, BdAddr, SetPublicAddress};
pub use baudrate::{build_set_baudrate_command, SetUartSpeed, BAUDRATES};
pub use patch::{
    PatchDestination, WritePatchContinue, WritePatchStart, CONTINUE_CHUNK_MAX, START_CHUNK_MAX,
};
pub use reset::CpuReset;
