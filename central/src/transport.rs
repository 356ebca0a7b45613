//! The seam between the client and the BLE stack that performs the radio work.
use bt_hci::param::{ConnHandle, DisconnectReason};

use crate::scan::ScanConfig;
use crate::{Address, PassKey, SecurityLevel, Uuid};

/// Requests the client issues to the BLE stack.
///
/// Every method starts a procedure and returns without waiting for it to finish. Outcomes are
/// reported back as [`Event`](crate::event::Event)s. An `Err` means the request could not be
/// submitted at all, in which case no completion event follows.
pub trait Transport {
    /// Error type of the underlying stack.
    type Error;

    /// Start scanning with the given parameters.
    fn start_scan(&mut self, config: &ScanConfig) -> Result<(), Self::Error>;

    /// Stop scanning.
    fn stop_scan(&mut self) -> Result<(), Self::Error>;

    /// Initiate a connection to `peer`.
    ///
    /// Completes with [`Event::Connected`](crate::event::Event::Connected).
    fn connect(&mut self, peer: &Address) -> Result<(), Self::Error>;

    /// Terminate a connection.
    ///
    /// Completes with [`Event::Disconnected`](crate::event::Event::Disconnected).
    fn disconnect(&mut self, conn: ConnHandle, reason: DisconnectReason) -> Result<(), Self::Error>;

    /// Request the link to be raised to `level`, pairing if needed.
    fn set_security(&mut self, conn: ConnHandle, level: SecurityLevel) -> Result<(), Self::Error>;

    /// Answer a passkey entry request.
    fn passkey_entry(&mut self, conn: ConnHandle, passkey: PassKey) -> Result<(), Self::Error>;

    /// Answer a passkey confirmation request.
    fn passkey_confirm(&mut self, conn: ConnHandle, accept: bool) -> Result<(), Self::Error>;

    /// Discover the primary service `service` with its characteristics and descriptors.
    fn discover(&mut self, conn: ConnHandle, service: &Uuid) -> Result<(), Self::Error>;

    /// Enable notifications by writing the client characteristic configuration.
    fn subscribe(&mut self, conn: ConnHandle, value_handle: u16, cccd_handle: u16) -> Result<(), Self::Error>;

    /// Disable notifications by clearing the client characteristic configuration.
    fn unsubscribe(&mut self, conn: ConnHandle, value_handle: u16, cccd_handle: u16) -> Result<(), Self::Error>;

    /// Write `data` to the attribute at `handle`, with response.
    fn write(&mut self, conn: ConnHandle, handle: u16, data: &[u8]) -> Result<(), Self::Error>;
}

impl<T: Transport> Transport for &mut T {
    type Error = T::Error;

    fn start_scan(&mut self, config: &ScanConfig) -> Result<(), Self::Error> {
        T::start_scan(self, config)
    }

    fn stop_scan(&mut self) -> Result<(), Self::Error> {
        T::stop_scan(self)
    }

    fn connect(&mut self, peer: &Address) -> Result<(), Self::Error> {
        T::connect(self, peer)
    }

    fn disconnect(&mut self, conn: ConnHandle, reason: DisconnectReason) -> Result<(), Self::Error> {
        T::disconnect(self, conn, reason)
    }

    fn set_security(&mut self, conn: ConnHandle, level: SecurityLevel) -> Result<(), Self::Error> {
        T::set_security(self, conn, level)
    }

    fn passkey_entry(&mut self, conn: ConnHandle, passkey: PassKey) -> Result<(), Self::Error> {
        T::passkey_entry(self, conn, passkey)
    }

    fn passkey_confirm(&mut self, conn: ConnHandle, accept: bool) -> Result<(), Self::Error> {
        T::passkey_confirm(self, conn, accept)
    }

    fn discover(&mut self, conn: ConnHandle, service: &Uuid) -> Result<(), Self::Error> {
        T::discover(self, conn, service)
    }

    fn subscribe(&mut self, conn: ConnHandle, value_handle: u16, cccd_handle: u16) -> Result<(), Self::Error> {
        T::subscribe(self, conn, value_handle, cccd_handle)
    }

    fn unsubscribe(&mut self, conn: ConnHandle, value_handle: u16, cccd_handle: u16) -> Result<(), Self::Error> {
        T::unsubscribe(self, conn, value_handle, cccd_handle)
    }

    fn write(&mut self, conn: ConnHandle, handle: u16, data: &[u8]) -> Result<(), Self::Error> {
        T::write(self, conn, handle, data)
    }
}
