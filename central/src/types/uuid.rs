//! UUID types.

use crate::Error;

/// A 16-bit, 32-bit or 128-bit UUID.
///
/// Bytes are stored in the little-endian order they have on air.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Uuid {
    /// 16-bit UUID
    Uuid16([u8; 2]),
    /// 32-bit UUID
    Uuid32([u8; 4]),
    /// 128-bit UUID
    Uuid128([u8; 16]),
}

impl From<u128> for Uuid {
    fn from(data: u128) -> Self {
        Uuid::Uuid128(data.to_le_bytes())
    }
}

impl From<[u8; 16]> for Uuid {
    fn from(data: [u8; 16]) -> Self {
        Uuid::Uuid128(data)
    }
}

impl From<u32> for Uuid {
    fn from(data: u32) -> Self {
        Uuid::Uuid32(data.to_le_bytes())
    }
}

impl From<u16> for Uuid {
    fn from(data: u16) -> Self {
        Uuid::Uuid16(data.to_le_bytes())
    }
}

impl TryFrom<&[u8]> for Uuid {
    type Error = Error;

    fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
        match value.len() {
            2 => Ok(Uuid::Uuid16([value[0], value[1]])),
            4 => Ok(Uuid::Uuid32([value[0], value[1], value[2], value[3]])),
            16 => {
                let mut bytes = [0; 16];
                bytes.copy_from_slice(value);
                Ok(Uuid::Uuid128(bytes))
            }
            len => Err(Error::InvalidUuidLength(len)),
        }
    }
}

impl Uuid {
    /// Create a new 16-bit UUID.
    pub const fn new_short(val: u16) -> Self {
        Self::Uuid16(val.to_le_bytes())
    }

    /// Create a new 128-bit UUID from its little-endian bytes.
    pub const fn new_long(val: [u8; 16]) -> Self {
        Self::Uuid128(val)
    }

    /// Create a new 128-bit UUID from the integer form, as written in
    /// `86b50001-7ff7-496e-aa9c-05fc11855eb3` notation.
    pub const fn from_u128(val: u128) -> Self {
        Self::Uuid128(val.to_le_bytes())
    }

    /// Raw little-endian bytes of the UUID.
    pub fn as_raw(&self) -> &[u8] {
        match self {
            Uuid::Uuid16(uuid) => uuid,
            Uuid::Uuid32(uuid) => uuid,
            Uuid::Uuid128(uuid) => uuid,
        }
    }

    /// Width of the UUID in bytes.
    pub fn size(&self) -> usize {
        self.as_raw().len()
    }

    /// Get the 16-bit UUID value, if this is a short UUID.
    pub fn as_short(&self) -> Option<u16> {
        match self {
            Uuid::Uuid16(data) => Some(u16::from_le_bytes(*data)),
            _ => None,
        }
    }
}
