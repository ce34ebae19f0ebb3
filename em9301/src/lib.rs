//! # Vendor commands and patch upload for EM9301 / EM9304 Bluetooth controllers
//!
//! The EM9304 receives firmware patches over HCI as a series of vendor specific
//! commands. This crate turns a patch blob into these commands, one frame at a time,
//! and leaves sending them to the caller.
//!
//! # Examples
//!
//! ## Uploading a patch
//!
//! ```no_run
//! use em9301::{CommandFrame, NextCommand, UploadSession};
//!
//! # fn send_and_wait_for_complete(_: &[u8]) {}
//! let blob = std::fs::read("em9304_patch.bin")?;
//!
//! let mut session = UploadSession::new();
//! let mut frame = CommandFrame::new();
//!
//! while session.produce_next_command(&blob, &mut frame)? == NextCommand::Command {
//!     // Only one command may be in flight, wait for the command complete event.
//!     send_and_wait_for_complete(frame.as_bytes());
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Changing the UART speed
//!
//! ```
//! use em9301::{commands::build_set_baudrate_command, CommandFrame};
//!
//! let mut frame = CommandFrame::new();
//! build_set_baudrate_command(115_200, &mut frame)?;
//!
//! assert_eq!(frame.as_bytes(), &[0x07, 0xFC, 0x01, 10]);
//! # Ok::<(), em9301::VendorCommandError>(())
//! ```

#[warn(missing_docs)]
pub mod chipset;
pub mod command;
pub mod commands;
pub mod container;
pub mod crc;
mod error;
#[warn(missing_docs)]
mod progress;
#[warn(missing_docs)]
pub mod upload;

pub use crate::chipset::{Chipset, ChipsetResult, Em9301};
pub use crate::command::{Command, CommandFrame, Opcode};
pub use crate::commands::BdAddr;
pub use crate::container::{ContainerHeader, Containers, CONTAINER_MAGIC};
pub use crate::error::{
    AddressParseError, ContainerError, EncodeError, UploadError, VendorCommandError,
};
pub use crate::progress::{ProgressEvent, UploadProgress};
pub use crate::upload::{NextCommand, PatchUpload, UploadPhase, UploadSession};
