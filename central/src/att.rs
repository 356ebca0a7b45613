use core::fmt::Display;

/// Attribute Error Code
///
/// Error code carried by an `ATT_ERROR_RSP`, as reported by the transport when a write,
/// subscription or discovery request is rejected by the peer.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct AttErrorCode {
    value: u8,
}

impl AttErrorCode {
    /// Attempted to use a handle that isn't valid on this server
    pub const INVALID_HANDLE: Self = Self { value: 0x01 };
    /// The attribute cannot be read
    pub const READ_NOT_PERMITTED: Self = Self { value: 0x02 };
    /// The attribute cannot be written
    pub const WRITE_NOT_PERMITTED: Self = Self { value: 0x03 };
    /// The attribute PDU was invalid
    pub const INVALID_PDU: Self = Self { value: 0x04 };
    /// The attribute requires authentication before it can be read or written
    pub const INSUFFICIENT_AUTHENTICATION: Self = Self { value: 0x05 };
    /// ATT Server does not support the request received from the client
    pub const REQUEST_NOT_SUPPORTED: Self = Self { value: 0x06 };
    /// Offset specified was past the end of the attribute
    pub const INVALID_OFFSET: Self = Self { value: 0x07 };
    /// The attribute requires authorisation before it can be read or written
    pub const INSUFFICIENT_AUTHORISATION: Self = Self { value: 0x08 };
    /// Too many prepare writes have been queued
    pub const PREPARE_QUEUE_FULL: Self = Self { value: 0x09 };
    /// No attribute found within the given attribute handle range
    pub const ATTRIBUTE_NOT_FOUND: Self = Self { value: 0x0a };
    /// The attribute value length is invalid for the operation
    pub const INVALID_ATTRIBUTE_VALUE_LENGTH: Self = Self { value: 0x0d };
    /// The request could not be completed due to an unlikely error
    pub const UNLIKELY_ERROR: Self = Self { value: 0x0e };
    /// The attribute requires encryption before it can be read or written
    pub const INSUFFICIENT_ENCRYPTION: Self = Self { value: 0x0f };
    /// Insufficient Resources to complete the request
    pub const INSUFFICIENT_RESOURCES: Self = Self { value: 0x11 };
    /// The server requests the client to rediscover the database
    pub const DATABASE_OUT_OF_SYNC: Self = Self { value: 0x12 };
    /// The attribute parameter value was not allowed
    pub const VALUE_NOT_ALLOWED: Self = Self { value: 0x13 };

    /// Wrap a raw error code.
    pub const fn new(value: u8) -> Self {
        Self { value }
    }

    /// Raw error code.
    pub const fn value(&self) -> u8 {
        self.value
    }
}

impl From<u8> for AttErrorCode {
    fn from(value: u8) -> Self {
        Self { value }
    }
}

impl Display for AttErrorCode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match *self {
            Self::INVALID_HANDLE => f.write_str("invalid handle"),
            Self::READ_NOT_PERMITTED => f.write_str("read not permitted"),
            Self::WRITE_NOT_PERMITTED => f.write_str("write not permitted"),
            Self::INVALID_PDU => f.write_str("invalid pdu"),
            Self::INSUFFICIENT_AUTHENTICATION => f.write_str("insufficient authentication"),
            Self::REQUEST_NOT_SUPPORTED => f.write_str("request not supported"),
            Self::INVALID_OFFSET => f.write_str("invalid offset"),
            Self::INSUFFICIENT_AUTHORISATION => f.write_str("insufficient authorisation"),
            Self::PREPARE_QUEUE_FULL => f.write_str("prepare queue full"),
            Self::ATTRIBUTE_NOT_FOUND => f.write_str("attribute not found"),
            Self::INVALID_ATTRIBUTE_VALUE_LENGTH => f.write_str("invalid attribute value length"),
            Self::UNLIKELY_ERROR => f.write_str("unlikely error"),
            Self::INSUFFICIENT_ENCRYPTION => f.write_str("insufficient encryption"),
            Self::INSUFFICIENT_RESOURCES => f.write_str("insufficient resources"),
            Self::DATABASE_OUT_OF_SYNC => f.write_str("database out of sync"),
            Self::VALUE_NOT_ALLOWED => f.write_str("value not allowed"),
            other => write!(f, "att error {:#04x}", other.value),
        }
    }
}
