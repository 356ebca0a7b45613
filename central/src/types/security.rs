//! Link security and pairing types.
use core::fmt::{Display, Formatter};

use crate::Error;

/// Security level of a link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SecurityLevel {
    /// No encryption and no authentication.
    NoEncryption,
    /// Encrypted, keys exchanged without MITM protection.
    Encrypted,
    /// Encrypted and authenticated, e.g. by passkey entry.
    EncryptedAuthenticated,
}

impl SecurityLevel {
    /// The link is encrypted.
    pub fn encrypted(&self) -> bool {
        !matches!(self, SecurityLevel::NoEncryption)
    }

    /// The link keys were exchanged with MITM protection.
    pub fn authenticated(&self) -> bool {
        matches!(self, SecurityLevel::EncryptedAuthenticated)
    }
}

/// Pairing Failed Reason
// ([Vol 3] Part H, Section 3.5.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reason {
    /// The user input of passkey failed, for example, the user cancelled the operation.
    PasskeyEntryFailed,
    /// The OOB data is not available.
    OobNotAvailable,
    /// Authentication requirements cannot be met due to IO capabilities of one or both devices.
    AuthenticationRequirements,
    /// The confirm value does not match the calculated compare value.
    ConfirmValueFailed,
    /// Pairing is not supported by the device.
    PairingNotSupported,
    /// The resultant encryption key size is not long enough.
    EncryptionKeySize,
    /// The SMP command received is not supported on this device.
    CommandNotSupported,
    /// Pairing failed due to an unspecified reason.
    UnspecifiedReason,
    /// Too little time has elapsed since the last pairing or security request.
    RepeatedAttempts,
    /// The command length is invalid or a parameter is outside of the specified range.
    InvalidParameters,
    /// The received DHKey Check value doesn't match the one calculated locally.
    DHKeyCheckFailed,
    /// The confirm values in the numeric comparison protocol do not match.
    NumericComparisonFailed,
    /// A pairing request over BR/EDR is in progress.
    BrEdrPairingInProgress,
    /// Cross-transport key derivation is not allowed.
    GenerationNotAllowed,
    /// The device chose not to accept a distributed key.
    KeyRejected,
    /// The device is not ready to perform a pairing procedure.
    Busy,
}

impl TryFrom<u8> for Reason {
    type Error = Error;
    fn try_from(val: u8) -> Result<Self, Error> {
        Ok(match val {
            0x01 => Self::PasskeyEntryFailed,
            0x02 => Self::OobNotAvailable,
            0x03 => Self::AuthenticationRequirements,
            0x04 => Self::ConfirmValueFailed,
            0x05 => Self::PairingNotSupported,
            0x06 => Self::EncryptionKeySize,
            0x07 => Self::CommandNotSupported,
            0x08 => Self::UnspecifiedReason,
            0x09 => Self::RepeatedAttempts,
            0x0a => Self::InvalidParameters,
            0x0b => Self::DHKeyCheckFailed,
            0x0c => Self::NumericComparisonFailed,
            0x0d => Self::BrEdrPairingInProgress,
            0x0e => Self::GenerationNotAllowed,
            0x0f => Self::KeyRejected,
            0x10 => Self::Busy,
            _ => return Err(Error::InvalidValue),
        })
    }
}

impl From<Reason> for u8 {
    fn from(val: Reason) -> u8 {
        match val {
            Reason::PasskeyEntryFailed => 0x01,
            Reason::OobNotAvailable => 0x02,
            Reason::AuthenticationRequirements => 0x03,
            Reason::ConfirmValueFailed => 0x04,
            Reason::PairingNotSupported => 0x05,
            Reason::EncryptionKeySize => 0x06,
            Reason::CommandNotSupported => 0x07,
            Reason::UnspecifiedReason => 0x08,
            Reason::RepeatedAttempts => 0x09,
            Reason::InvalidParameters => 0x0a,
            Reason::DHKeyCheckFailed => 0x0b,
            Reason::NumericComparisonFailed => 0x0c,
            Reason::BrEdrPairingInProgress => 0x0d,
            Reason::GenerationNotAllowed => 0x0e,
            Reason::KeyRejected => 0x0f,
            Reason::Busy => 0x10,
        }
    }
}

impl AsRef<str> for Reason {
    fn as_ref(&self) -> &str {
        match self {
            Reason::PasskeyEntryFailed => "Passkey entry canceled or failed",
            Reason::OobNotAvailable => "Out-of-band data not available",
            Reason::AuthenticationRequirements => "Authentication requirements not met",
            Reason::ConfirmValueFailed => "Confirm value does not match",
            Reason::PairingNotSupported => "Device do not support pairing",
            Reason::EncryptionKeySize => "Encryption key size is not long enough",
            Reason::CommandNotSupported => "Security manager protocol command not supported",
            Reason::UnspecifiedReason => "Pairing failed due to an unspecified reason",
            Reason::RepeatedAttempts => "Pairing failed due to repeated attempts",
            Reason::InvalidParameters => "Command and/or parameter invalid",
            Reason::DHKeyCheckFailed => "DH key check value does not match",
            Reason::NumericComparisonFailed => "Numeric comparison values do not match",
            Reason::BrEdrPairingInProgress => "Pairing in progress over BR/EDR",
            Reason::GenerationNotAllowed => "Link key generation failed",
            Reason::KeyRejected => "Device rejected distributed key",
            Reason::Busy => "Device is not ready to perform pairing",
        }
    }
}

impl Display for Reason {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.as_ref())
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Reason {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "{}", self.as_ref())
    }
}

/// A six digit pairing passkey.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PassKey(u32);

impl PassKey {
    /// Largest value a passkey can hold.
    pub const MAX: u32 = 999_999;

    /// Create a passkey, rejecting values with more than six digits.
    pub fn new(value: u32) -> Result<Self, Error> {
        if value > Self::MAX {
            return Err(Error::InvalidValue);
        }
        Ok(Self(value))
    }

    /// Get the underlying value as an integer.
    pub fn value(&self) -> u32 {
        self.0
    }
}

impl Default for PassKey {
    fn default() -> Self {
        Self(crate::config::DEFAULT_PASSKEY)
    }
}

impl Display for PassKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        write!(f, "{:06}", self.0)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for PassKey {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "{=u32:06}", self.0)
    }
}
