//! Advertisement data structures.
use crate::{Error, Uuid};

pub const LE_GENERAL_DISCOVERABLE: u8 = 0b00000010;
pub const BR_EDR_NOT_SUPPORTED: u8 = 0b00000100;

const AD_TYPE_FLAGS: u8 = 0x01;
const AD_TYPE_UUID16_INCOMPLETE: u8 = 0x02;
const AD_TYPE_UUID16_COMPLETE: u8 = 0x03;
const AD_TYPE_UUID32_INCOMPLETE: u8 = 0x04;
const AD_TYPE_UUID32_COMPLETE: u8 = 0x05;
const AD_TYPE_UUID128_INCOMPLETE: u8 = 0x06;
const AD_TYPE_UUID128_COMPLETE: u8 = 0x07;
const AD_TYPE_SHORTENED_NAME: u8 = 0x08;
const AD_TYPE_COMPLETE_NAME: u8 = 0x09;
const AD_TYPE_SERVICE_DATA16: u8 = 0x16;
const AD_TYPE_MANUFACTURER_DATA: u8 = 0xff;

/// One AD structure of an advertising or scan response payload.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum AdStructure<'a> {
    /// Device flags and baseband capabilities.
    Flags(u8),

    /// List of 16-bit service UUIDs, 2 little-endian bytes each.
    ServiceUuids16(&'a [u8]),
    /// List of 32-bit service UUIDs, 4 little-endian bytes each.
    ServiceUuids32(&'a [u8]),
    /// List of 128-bit service UUIDs, 16 little-endian bytes each.
    ServiceUuids128(&'a [u8]),

    /// Service data with 16-bit service UUID.
    ServiceData16 {
        /// The 16-bit service UUID.
        uuid: u16,
        /// The associated service data. May be empty.
        data: &'a [u8],
    },

    /// The full (unabbreviated) device name.
    CompleteLocalName(&'a [u8]),

    /// The shortened device name.
    ShortenedLocalName(&'a [u8]),

    /// Manufacturer specific data
    ManufacturerSpecificData {
        /// Bluetooth SIG company identifier.
        company_identifier: u16,
        /// Payload following the identifier.
        payload: &'a [u8],
    },

    /// An unknown or unimplemented AD structure stored as raw bytes.
    Unknown {
        /// Type byte.
        ty: u8,
        /// Raw data transmitted after the type.
        data: &'a [u8],
    },
}

impl<'a> AdStructure<'a> {
    /// Iterate over the AD structures of a payload.
    pub fn decode(data: &'a [u8]) -> AdStructureIter<'a> {
        AdStructureIter { data, offset: 0 }
    }

    /// Iterate over the service UUIDs carried by this structure, if it is a UUID list.
    pub fn service_uuids(&self) -> impl Iterator<Item = Uuid> + 'a {
        let (data, width): (&'a [u8], usize) = match *self {
            AdStructure::ServiceUuids16(d) => (d, 2),
            AdStructure::ServiceUuids32(d) => (d, 4),
            AdStructure::ServiceUuids128(d) => (d, 16),
            _ => (&[][..], 2),
        };
        data.chunks_exact(width).filter_map(|c| Uuid::try_from(c).ok())
    }

    /// Encode a list of AD structures into `dest`, returning the number of bytes written.
    pub fn encode_slice(items: &[AdStructure<'_>], dest: &mut [u8]) -> Result<usize, Error> {
        let mut pos = 0;
        for item in items {
            let (ty, head, body): (u8, &[u8], &[u8]) = match item {
                AdStructure::Flags(flags) => (AD_TYPE_FLAGS, core::slice::from_ref(flags), &[][..]),
                AdStructure::ServiceUuids16(uuids) => (AD_TYPE_UUID16_COMPLETE, &[][..], *uuids),
                AdStructure::ServiceUuids32(uuids) => (AD_TYPE_UUID32_COMPLETE, &[][..], *uuids),
                AdStructure::ServiceUuids128(uuids) => (AD_TYPE_UUID128_COMPLETE, &[][..], *uuids),
                AdStructure::ShortenedLocalName(name) => (AD_TYPE_SHORTENED_NAME, &[][..], *name),
                AdStructure::CompleteLocalName(name) => (AD_TYPE_COMPLETE_NAME, &[][..], *name),
                AdStructure::ServiceData16 { uuid, data } => {
                    let len = write_header(dest, pos, AD_TYPE_SERVICE_DATA16, 2 + data.len())?;
                    dest[pos + 2..pos + 4].copy_from_slice(&uuid.to_le_bytes());
                    dest[pos + 4..pos + len].copy_from_slice(data);
                    pos += len;
                    continue;
                }
                AdStructure::ManufacturerSpecificData {
                    company_identifier,
                    payload,
                } => {
                    let len = write_header(dest, pos, AD_TYPE_MANUFACTURER_DATA, 2 + payload.len())?;
                    dest[pos + 2..pos + 4].copy_from_slice(&company_identifier.to_le_bytes());
                    dest[pos + 4..pos + len].copy_from_slice(payload);
                    pos += len;
                    continue;
                }
                AdStructure::Unknown { ty, data } => (*ty, &[][..], *data),
            };
            let len = write_header(dest, pos, ty, head.len() + body.len())?;
            dest[pos + 2..pos + 2 + head.len()].copy_from_slice(head);
            dest[pos + 2 + head.len()..pos + len].copy_from_slice(body);
            pos += len;
        }
        Ok(pos)
    }
}

// Writes length and type bytes, returns the total size of the structure.
fn write_header(dest: &mut [u8], pos: usize, ty: u8, body: usize) -> Result<usize, Error> {
    let total = body + 2;
    if body + 1 > u8::MAX as usize || pos + total > dest.len() {
        return Err(Error::InsufficientSpace);
    }
    dest[pos] = (body + 1) as u8;
    dest[pos + 1] = ty;
    Ok(total)
}

/// Iterator over the AD structures of a payload.
pub struct AdStructureIter<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> AdStructureIter<'a> {
    fn read(&mut self) -> Result<Option<AdStructure<'a>>, Error> {
        let data = self.data;
        let remaining = &data[self.offset..];
        let Some(&len) = remaining.first() else {
            return Ok(None);
        };
        // A zero length field marks the start of padding.
        if len == 0 {
            self.offset = self.data.len();
            return Ok(None);
        }
        let len = len as usize;
        if remaining.len() < len + 1 {
            return Err(Error::InvalidValue);
        }
        let ty = remaining[1];
        let data = &remaining[2..len + 1];
        self.offset += len + 1;

        Ok(Some(match ty {
            AD_TYPE_FLAGS => AdStructure::Flags(*data.first().ok_or(Error::InvalidValue)?),
            AD_TYPE_UUID16_INCOMPLETE | AD_TYPE_UUID16_COMPLETE => AdStructure::ServiceUuids16(uuid_list(data, 2)?),
            AD_TYPE_UUID32_INCOMPLETE | AD_TYPE_UUID32_COMPLETE => AdStructure::ServiceUuids32(uuid_list(data, 4)?),
            AD_TYPE_UUID128_INCOMPLETE | AD_TYPE_UUID128_COMPLETE => {
                AdStructure::ServiceUuids128(uuid_list(data, 16)?)
            }
            AD_TYPE_SHORTENED_NAME => AdStructure::ShortenedLocalName(data),
            AD_TYPE_COMPLETE_NAME => AdStructure::CompleteLocalName(data),
            AD_TYPE_SERVICE_DATA16 => {
                if data.len() < 2 {
                    return Err(Error::InvalidValue);
                }
                AdStructure::ServiceData16 {
                    uuid: u16::from_le_bytes([data[0], data[1]]),
                    data: &data[2..],
                }
            }
            AD_TYPE_MANUFACTURER_DATA => {
                if data.len() < 2 {
                    return Err(Error::InvalidValue);
                }
                AdStructure::ManufacturerSpecificData {
                    company_identifier: u16::from_le_bytes([data[0], data[1]]),
                    payload: &data[2..],
                }
            }
            ty => AdStructure::Unknown { ty, data },
        }))
    }
}

fn uuid_list(data: &[u8], width: usize) -> Result<&[u8], Error> {
    if data.len() % width != 0 {
        return Err(Error::InvalidValue);
    }
    Ok(data)
}

impl<'a> Iterator for AdStructureIter<'a> {
    type Item = Result<AdStructure<'a>, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.read() {
            Ok(Some(ad)) => Some(Ok(ad)),
            Ok(None) => None,
            Err(e) => {
                // Stop after the first malformed structure.
                self.offset = self.data.len();
                Some(Err(e))
            }
        }
    }
}
