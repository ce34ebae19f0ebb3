use crate::container::CONTAINER_HEADER_LEN;

/// Reasons a patch container header is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error, docsplay::Display)]
pub enum ContainerError {
    /// Expected the container magic {expected:#010x} but found {found:#010x}.
    BadMagic { expected: u32, found: u32 },

    /// Only {available} bytes are left in the blob, but a container header needs 8.
    Truncated { available: usize },

    /// The container claims a size of {size} bytes, which is less than its own header.
    InvalidSize { size: u32 },

    /// The container ends at {end:#x}, past the end of the {blob_len} byte blob.
    Overrun { end: usize, blob_len: usize },
}

impl ContainerError {
    pub(crate) fn check_size(size: u32) -> Result<(), Self> {
        if (size as usize) < CONTAINER_HEADER_LEN {
            Err(ContainerError::InvalidSize { size })
        } else {
            Ok(())
        }
    }
}

/// The upload of a patch blob was halted.
///
/// Once returned, the session stays in its error state and every further
/// request for a command reports the same error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error, docsplay::Display)]
pub enum UploadError {
    /// The patch container at offset {offset:#x} is malformed.
    MalformedContainer {
        offset: usize,
        #[source]
        source: ContainerError,
    },

    /// Failed to encode a patch command.
    Encode(#[from] EncodeError),
}

/// A command could not be serialized into a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error, docsplay::Display)]
pub enum EncodeError {
    /// The command parameters need {required} bytes, but only {available} fit into the frame.
    ParametersTooLong { required: usize, available: usize },
}

/// Errors of the stateless vendor command builders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error, docsplay::Display)]
pub enum VendorCommandError {
    /// Baud rate {0} is not supported by the controller.
    UnsupportedBaudrate(u32),

    /// Failed to encode the command.
    Encode(#[from] EncodeError),
}

/// A Bluetooth device address could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, docsplay::Display)]
pub enum AddressParseError {
    /// Expected six colon separated octets, found {0}.
    WrongLength(usize),

    /// '{0}' is not a hexadecimal octet.
    InvalidOctet(String),
}
