//! Patch container parsing.
//!
//! A patch blob is a sequence of containers packed back to back. Each container starts with
//! an eight byte header:
//!
//! | Offset | Size | Content                                         |
//! |--------|------|-------------------------------------------------|
//! | 0      | 4    | magic `0x656d3933`, little endian               |
//! | 4      | 4    | total container size including this header, LE |
//!
//! The header is uploaded together with the payload, the controller uses it to validate
//! the patch on its side.

use scroll::{Pread, LE};

use crate::commands::{CONTINUE_CHUNK_MAX, START_CHUNK_MAX};
use crate::error::ContainerError;

/// Magic tag at the start of every patch container.
pub const CONTAINER_MAGIC: u32 = 0x656d_3933;

/// Size of the container header.
pub const CONTAINER_HEADER_LEN: usize = 8;

/// Location and size of a single container inside a patch blob.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContainerHeader {
    /// Offset of the first header byte inside the blob.
    pub offset: usize,
    /// Total size of the container, header included.
    pub size: u32,
}

impl ContainerHeader {
    /// Parse and validate the container header at `offset`.
    pub fn parse(blob: &[u8], offset: usize) -> Result<Self, ContainerError> {
        let available = blob.len().saturating_sub(offset);
        if available < CONTAINER_HEADER_LEN {
            return Err(ContainerError::Truncated { available });
        }

        let header = &blob[offset..offset + CONTAINER_HEADER_LEN];

        let magic: u32 = header
            .pread_with(0, LE)
            .map_err(|_| ContainerError::Truncated { available })?;
        if magic != CONTAINER_MAGIC {
            return Err(ContainerError::BadMagic {
                expected: CONTAINER_MAGIC,
                found: magic,
            });
        }

        let size: u32 = header
            .pread_with(4, LE)
            .map_err(|_| ContainerError::Truncated { available })?;
        ContainerError::check_size(size)?;

        let container = Self { offset, size };
        if container.end() > blob.len() {
            return Err(ContainerError::Overrun {
                end: container.end(),
                blob_len: blob.len(),
            });
        }

        Ok(container)
    }

    /// Offset of the first byte after this container.
    pub fn end(&self) -> usize {
        self.offset + self.size as usize
    }

    /// Number of payload bytes following the header.
    pub fn payload_len(&self) -> usize {
        self.size as usize - CONTAINER_HEADER_LEN
    }

    /// Number of patch commands needed to upload this container.
    pub fn command_count(&self) -> usize {
        let remaining = (self.size as usize).saturating_sub(START_CHUNK_MAX);
        1 + remaining.div_ceil(CONTINUE_CHUNK_MAX)
    }

    /// The complete container, header included.
    pub fn bytes<'a>(&self, blob: &'a [u8]) -> &'a [u8] {
        &blob[self.offset..self.end()]
    }
}

/// Iterator over all container headers of a blob.
///
/// Stops after the last container, or after yielding the first error.
#[derive(Debug, Clone)]
pub struct Containers<'a> {
    blob: &'a [u8],
    offset: usize,
    failed: bool,
}

impl<'a> Containers<'a> {
    /// Walk the containers of `blob`, starting at offset 0.
    pub fn new(blob: &'a [u8]) -> Self {
        Self {
            blob,
            offset: 0,
            failed: false,
        }
    }
}

impl Iterator for Containers<'_> {
    type Item = Result<ContainerHeader, (usize, ContainerError)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.offset >= self.blob.len() {
            return None;
        }

        match ContainerHeader::parse(self.blob, self.offset) {
            Ok(header) => {
                self.offset = header.end();
                Some(Ok(header))
            }
            Err(error) => {
                self.failed = true;
                Some(Err((self.offset, error)))
            }
        }
    }
}

impl std::iter::FusedIterator for Containers<'_> {}
