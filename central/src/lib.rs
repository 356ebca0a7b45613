//! A BLE GATT central-role client.
//!
//! The client scans for a peripheral advertising a target service, connects, escalates link
//! security with a fixed passkey, discovers and validates the service, subscribes to its
//! notifiable characteristics and offers a guarded single-outstanding write.
//!
//! Radio, link layer and ATT transactions are performed by a [`Transport`](transport::Transport)
//! implementation. The transport reports completions back as [`Event`](event::Event)s, which are
//! fed serially into [`CentralClient::process`].
#![cfg_attr(not(test), no_std)]

use core::fmt::{Display, Formatter};

mod fmt;

pub mod ad_structure;
mod att;
mod central;
pub mod config;
pub mod connection;
pub mod event;
pub mod gatt;
mod runner;
pub mod scan;
pub mod security_manager;
pub mod transport;
pub(crate) mod types;

pub use att::AttErrorCode;
pub use central::{CentralClient, ClientConfig};
pub use runner::{EventQueue, Runner, SharedCentral};
pub use types::address::Address;
pub use types::security::{PassKey, Reason, SecurityLevel};
pub use types::uuid::Uuid;

/// Re-exports of the types most applications need.
pub mod prelude {
    pub use bt_hci::param::{AddrKind, BdAddr, ConnHandle, DisconnectReason};

    pub use crate::ad_structure::AdStructure;
    pub use crate::connection::{Connection, ConnectionState};
    pub use crate::event::{ErrorCode, Event, EventHandler, NotifyAction};
    pub use crate::gatt::{
        CharacteristicHandles, CharacteristicKind, CharacteristicProp, CharacteristicProps, CharacteristicSpec,
        DiscoveredCharacteristic, DiscoveredDescriptor, DiscoveredService, ServiceHandles, ServiceProfile,
        SubscriptionState,
    };
    pub use crate::scan::{AdvReport, FilterMatch, ScanConfig};
    pub use crate::security_manager::PairingStatus;
    pub use crate::transport::Transport;
    pub use crate::{
        Address, AttErrorCode, CentralClient, ClientConfig, ClientError, Error, ErrorKind, EventQueue, PassKey,
        Reason, Runner, SecurityLevel, SharedCentral, Uuid,
    };
}

/// Errors raised by the client itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// Scanning was already running.
    AlreadyScanning,
    /// No connection in the ready state.
    NotConnected,
    /// Attribute handles have not been discovered on this connection.
    NotResolved,
    /// The characteristic is not part of the service profile.
    UnknownCharacteristic,
    /// The characteristic does not support notifications.
    NotNotifiable,
    /// Notifications are already enabled or being enabled.
    AlreadySubscribed,
    /// Notifications are not enabled.
    NotSubscribed,
    /// A write is already in flight.
    WriteAlreadyPending,
    /// Payload exceeds the configured write buffer.
    PayloadTooLarge,
    /// Discovered service does not match the profile.
    ServiceValidation,
    /// A characteristic of the profile is missing on the peer.
    CharacteristicNotFound,
    /// A notifiable characteristic has no client characteristic configuration descriptor.
    CccdNotFound,
    /// The peer does not expose the service, or discovery failed.
    DiscoveryFailed,
    /// Pairing failed.
    Security(Reason),
    /// The peer answered with an ATT error.
    Att(AttErrorCode),
    /// A value was outside its valid range.
    InvalidValue,
    /// A UUID of unsupported width.
    InvalidUuidLength(usize),
    /// Not enough space in the destination buffer.
    InsufficientSpace,
}

/// Error classes, determining how the client recovers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ErrorKind {
    /// The transport failed. Recovered locally by restarting the scan.
    Transport,
    /// The peer does not implement the expected service. The link is dropped.
    ProtocolViolation,
    /// Pairing was cancelled or failed. The link is dropped.
    Security,
    /// A guarded operation was already in progress. Returned to the caller only.
    GuardViolation,
    /// No ready connection. Returned to the caller only.
    Unconnected,
    /// The caller passed an argument the client cannot use. Returned to the caller only.
    InvalidArgument,
}

impl Error {
    /// Error class of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::NotConnected | Error::NotResolved => ErrorKind::Unconnected,
            Error::AlreadyScanning | Error::AlreadySubscribed | Error::NotSubscribed | Error::WriteAlreadyPending => {
                ErrorKind::GuardViolation
            }
            Error::ServiceValidation | Error::CharacteristicNotFound | Error::CccdNotFound | Error::DiscoveryFailed => {
                ErrorKind::ProtocolViolation
            }
            Error::Security(_) => ErrorKind::Security,
            Error::Att(_) => ErrorKind::Transport,
            Error::UnknownCharacteristic
            | Error::NotNotifiable
            | Error::PayloadTooLarge
            | Error::InvalidValue
            | Error::InvalidUuidLength(_)
            | Error::InsufficientSpace => ErrorKind::InvalidArgument,
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::AlreadyScanning => f.write_str("scanning already started"),
            Error::NotConnected => f.write_str("not connected"),
            Error::NotResolved => f.write_str("attribute handles not discovered"),
            Error::UnknownCharacteristic => f.write_str("characteristic not in service profile"),
            Error::NotNotifiable => f.write_str("characteristic is not notifiable"),
            Error::AlreadySubscribed => f.write_str("already subscribed"),
            Error::NotSubscribed => f.write_str("not subscribed"),
            Error::WriteAlreadyPending => f.write_str("write already pending"),
            Error::PayloadTooLarge => f.write_str("payload too large"),
            Error::ServiceValidation => f.write_str("invalid service"),
            Error::CharacteristicNotFound => f.write_str("characteristic not found"),
            Error::CccdNotFound => f.write_str("missing client characteristic configuration"),
            Error::DiscoveryFailed => f.write_str("service discovery failed"),
            Error::Security(reason) => write!(f, "pairing failed: {}", reason),
            Error::Att(code) => write!(f, "att error: {}", code),
            Error::InvalidValue => f.write_str("invalid value"),
            Error::InvalidUuidLength(len) => write!(f, "invalid uuid length {}", len),
            Error::InsufficientSpace => f.write_str("insufficient space"),
        }
    }
}

/// Error returned by client operations that reach the transport.
#[derive(Debug, PartialEq)]
pub enum ClientError<E> {
    /// Error from the client.
    Client(Error),
    /// Error from the transport.
    Transport(E),
}

impl<E> ClientError<E> {
    /// Error class of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ClientError::Client(e) => e.kind(),
            ClientError::Transport(_) => ErrorKind::Transport,
        }
    }
}

impl<E> From<Error> for ClientError<E> {
    fn from(value: Error) -> Self {
        Self::Client(value)
    }
}

#[cfg(feature = "defmt")]
impl<E> defmt::Format for ClientError<E>
where
    E: defmt::Format,
{
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            ClientError::Client(e) => {
                defmt::write!(fmt, "Client({})", e)
            }
            ClientError::Transport(e) => {
                defmt::write!(fmt, "Transport({})", e)
            }
        }
    }
}
