//! Events reported by the transport and the application upcalls they lead to.
use bt_hci::param::ConnHandle;
use heapless::Vec;

use crate::config::NOTIFICATION_PAYLOAD_MAX;
use crate::connection::Connection;
use crate::gatt::{DiscoveredService, ServiceHandles};
use crate::scan::AdvReport;
use crate::{Address, AttErrorCode, Error, PassKey, Reason, SecurityLevel, Uuid};

/// HCI status of a connection or disconnection.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    Okay = 0x00,
    UnknownConnectionIdentifier = 0x02,
    PageTimeout = 0x04,
    AuthenticationFailure = 0x05,
    PinOrKeyMissing = 0x06,
    MemoryCapacityExceeded = 0x07,
    ConnectionTimeout = 0x08,
    ConnectionLimitExceeded = 0x09,
    AclConnectionAlreadyExists = 0x0b,
    CommandDisallowed = 0x0c,
    RemoteUserTerminatedConnection = 0x13,
    RemoteDeviceTerminatedLowResources = 0x14,
    RemoteDeviceTerminatedPowerOff = 0x15,
    ConnectionTerminatedByLocalHost = 0x16,
    UnacceptableConnectionParameters = 0x3b,
    ConnectionFailedToBeEstablished = 0x3e,
    // see Error Codes Description in the core specification
    Unknown = 0xff,
}

impl ErrorCode {
    pub fn from_u8(value: u8) -> ErrorCode {
        match value {
            0x00 => ErrorCode::Okay,
            0x02 => ErrorCode::UnknownConnectionIdentifier,
            0x04 => ErrorCode::PageTimeout,
            0x05 => ErrorCode::AuthenticationFailure,
            0x06 => ErrorCode::PinOrKeyMissing,
            0x07 => ErrorCode::MemoryCapacityExceeded,
            0x08 => ErrorCode::ConnectionTimeout,
            0x09 => ErrorCode::ConnectionLimitExceeded,
            0x0b => ErrorCode::AclConnectionAlreadyExists,
            0x0c => ErrorCode::CommandDisallowed,
            0x13 => ErrorCode::RemoteUserTerminatedConnection,
            0x14 => ErrorCode::RemoteDeviceTerminatedLowResources,
            0x15 => ErrorCode::RemoteDeviceTerminatedPowerOff,
            0x16 => ErrorCode::ConnectionTerminatedByLocalHost,
            0x3b => ErrorCode::UnacceptableConnectionParameters,
            0x3e => ErrorCode::ConnectionFailedToBeEstablished,
            _ => ErrorCode::Unknown,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ErrorCode::Okay)
    }
}

/// Something the transport observed.
///
/// Events are delivered serially into [`CentralClient::process`](crate::CentralClient::process).
/// Every event tied to a connection carries its handle; events for a connection other than the
/// current one are ignored.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// An advertisement was received while scanning.
    AdvReport(AdvReport),
    /// A connection attempt finished.
    Connected {
        handle: ConnHandle,
        peer: Address,
        status: ErrorCode,
    },
    /// A link was terminated.
    Disconnected { handle: ConnHandle, reason: ErrorCode },
    /// The link security changed, or a security request failed.
    SecurityChanged {
        handle: ConnHandle,
        level: SecurityLevel,
        result: Result<(), Reason>,
    },
    /// The peer displays a passkey and expects it to be entered.
    PasskeyEntry { handle: ConnHandle },
    /// Both sides display `passkey` and confirmation is requested.
    PasskeyConfirm { handle: ConnHandle, passkey: PassKey },
    /// The peer cancelled pairing.
    PairingCancelled { handle: ConnHandle },
    /// Pairing finished.
    PairingComplete { handle: ConnHandle, bonded: bool },
    /// Pairing failed.
    PairingFailed { handle: ConnHandle, reason: Reason },
    /// Service discovery finished.
    DiscoveryComplete {
        handle: ConnHandle,
        service: DiscoveredService,
    },
    /// The peer does not have the requested service.
    ServiceNotFound { handle: ConnHandle },
    /// Service discovery failed.
    DiscoveryError { handle: ConnHandle, code: AttErrorCode },
    /// A CCC write finished.
    SubscribeComplete {
        handle: ConnHandle,
        value_handle: u16,
        result: Result<(), AttErrorCode>,
    },
    /// A characteristic write finished.
    WriteComplete {
        handle: ConnHandle,
        result: Result<(), AttErrorCode>,
    },
    /// A notification was received.
    ///
    /// `data` is `None` when the transport reports that notifications were turned off by the
    /// peer, as opposed to an empty notification payload.
    Notification {
        handle: ConnHandle,
        value_handle: u16,
        data: Option<Vec<u8, NOTIFICATION_PAYLOAD_MAX>>,
    },
}

impl Event {
    /// Connection the event refers to.
    pub fn conn(&self) -> Option<ConnHandle> {
        match self {
            Event::AdvReport(_) => None,
            Event::Connected { handle, .. }
            | Event::Disconnected { handle, .. }
            | Event::SecurityChanged { handle, .. }
            | Event::PasskeyEntry { handle }
            | Event::PasskeyConfirm { handle, .. }
            | Event::PairingCancelled { handle }
            | Event::PairingComplete { handle, .. }
            | Event::PairingFailed { handle, .. }
            | Event::DiscoveryComplete { handle, .. }
            | Event::ServiceNotFound { handle }
            | Event::DiscoveryError { handle, .. }
            | Event::SubscribeComplete { handle, .. }
            | Event::WriteComplete { handle, .. }
            | Event::Notification { handle, .. } => Some(*handle),
        }
    }

    /// A notification carrying `data`, truncated to the notification buffer.
    pub fn notification(handle: ConnHandle, value_handle: u16, data: &[u8]) -> Self {
        let len = data.len().min(NOTIFICATION_PAYLOAD_MAX);
        let mut buf = Vec::new();
        // Cannot fail, length is bounded above.
        let _ = buf.extend_from_slice(&data[..len]);
        Event::Notification {
            handle,
            value_handle,
            data: Some(buf),
        }
    }
}

/// What to do with a subscription after a notification was handled.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyAction {
    /// Keep receiving notifications.
    Continue,
    /// Turn notifications off.
    Stop,
}

/// Application upcalls.
///
/// Called from [`CentralClient::process`](crate::CentralClient::process), after the client has
/// updated its own state. All methods default to doing nothing.
#[allow(unused_variables)]
pub trait EventHandler {
    /// An advertisement carried the filter UUID.
    fn on_filter_match(&mut self, report: &AdvReport) {}

    /// An advertisement did not carry the filter UUID.
    fn on_filter_no_match(&mut self, report: &AdvReport) {}

    /// Connecting to `peer` failed. Scanning has been restarted.
    fn on_connect_failed(&mut self, peer: &Address) {}

    /// A connection was established.
    fn on_connected(&mut self, conn: &Connection) {}

    /// The connection was lost. Handles and subscriptions are gone and scanning has been restarted.
    fn on_disconnected(&mut self, conn: &Connection, reason: ErrorCode) {}

    /// Security changed, or a security request failed.
    fn on_security_changed(&mut self, conn: &Connection, result: Result<SecurityLevel, Reason>) {}

    /// Pairing finished.
    fn on_pairing_complete(&mut self, conn: &Connection, bonded: bool) {}

    /// Pairing failed. The link is being dropped.
    fn on_pairing_failed(&mut self, conn: &Connection, reason: Reason) {}

    /// All handles of the profile were resolved.
    fn on_discovery_complete(&mut self, handles: &ServiceHandles) {}

    /// Discovery failed. The link is being dropped.
    fn on_discovery_failed(&mut self, error: Error) {}

    /// Notifications for `characteristic` are on.
    fn on_subscribed(&mut self, characteristic: &Uuid) {}

    /// The peer refused to turn notifications on.
    fn on_subscribe_failed(&mut self, characteristic: &Uuid, code: AttErrorCode) {}

    /// A notification arrived.
    fn on_notification(&mut self, characteristic: &Uuid, data: &[u8]) -> NotifyAction {
        NotifyAction::Continue
    }

    /// Notifications for `characteristic` are off.
    fn on_unsubscribed(&mut self, characteristic: &Uuid) {}

    /// A write finished. `data` is the payload that was written.
    fn on_write_complete(&mut self, characteristic: &Uuid, result: Result<(), AttErrorCode>, data: &[u8]) {}
}
