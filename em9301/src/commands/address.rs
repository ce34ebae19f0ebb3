use std::fmt;
use std::str::FromStr;

use crate::command::{Command, CommandFrame, Opcode};
use crate::error::{AddressParseError, EncodeError, VendorCommandError};

/// A Bluetooth device address.
///
/// Stored in the order it is written, `00:1A:7D:DA:71:13` is `[0x00, 0x1A, 0x7D, 0xDA, 0x71, 0x13]`.
/// HCI transmits addresses least significant octet first, so the octets are reversed on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct BdAddr(pub [u8; 6]);

impl BdAddr {
    /// The address in HCI byte order.
    pub fn to_wire(self) -> [u8; 6] {
        let mut octets = self.0;
        octets.reverse();
        octets
    }
}

impl fmt::Display for BdAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02X}:{b:02X}:{c:02X}:{d:02X}:{e:02X}:{g:02X}")
    }
}

impl FromStr for BdAddr {
    type Err = AddressParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.trim().split([':', '-']).collect();
        if parts.len() != 6 {
            return Err(AddressParseError::WrongLength(parts.len()));
        }

        let mut octets = [0u8; 6];
        for (octet, part) in octets.iter_mut().zip(parts) {
            if part.len() != 2 {
                return Err(AddressParseError::InvalidOctet(part.to_string()));
            }
            *octet = u8::from_str_radix(part, 16)
                .map_err(|_| AddressParseError::InvalidOctet(part.to_string()))?;
        }

        Ok(BdAddr(octets))
    }
}

impl serde::Serialize for BdAddr {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> serde::Deserialize<'de> for BdAddr {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Set the public device address of the controller.
#[derive(Debug, Clone, Copy)]
pub struct SetPublicAddress(pub BdAddr);

impl Command for SetPublicAddress {
    const OPCODE: Opcode = Opcode::SetPublicAddress;

    fn parameter_len(&self) -> usize {
        6
    }

    fn to_bytes(&self, buffer: &mut [u8]) -> Result<usize, EncodeError> {
        let Some(target) = buffer.get_mut(..6) else {
            return Err(EncodeError::ParametersTooLong {
                required: 6,
                available: buffer.len(),
            });
        };
        target.copy_from_slice(&self.0.to_wire());
        Ok(6)
    }
}

/// Write the command setting the public device address to `address` into `frame`.
pub fn build_set_address_command(
    address: BdAddr,
    frame: &mut CommandFrame,
) -> Result<(), VendorCommandError> {
    frame.encode(&SetPublicAddress(address))?;
    Ok(())
}
