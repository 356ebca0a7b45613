//! BLE connection.
use bt_hci::param::ConnHandle;

use crate::{Address, SecurityLevel};

/// Lifecycle state of the client's connection slot.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No connection and no connection attempt.
    Idle,
    /// A connection attempt is outstanding.
    Connecting,
    /// Link established, security not yet requested.
    Connected,
    /// Waiting for the requested security level.
    SecurityPending,
    /// Security settled. Discovery runs and GATT operations are accepted.
    Ready,
    /// The client asked the transport to drop the link.
    Disconnecting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Discovery {
    NotStarted,
    Running,
    Done,
}

/// The client's single active connection.
#[derive(Debug, Clone)]
pub struct Connection {
    handle: ConnHandle,
    peer: Address,
    pub(crate) state: ConnectionState,
    pub(crate) security: SecurityLevel,
    pub(crate) discovery: Discovery,
}

impl Connection {
    pub(crate) fn new(handle: ConnHandle, peer: Address) -> Self {
        Self {
            handle,
            peer,
            state: ConnectionState::Connected,
            security: SecurityLevel::NoEncryption,
            discovery: Discovery::NotStarted,
        }
    }

    /// Connection handle.
    pub fn handle(&self) -> ConnHandle {
        self.handle
    }

    /// Address of the peripheral.
    pub fn peer_address(&self) -> &Address {
        &self.peer
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Security level of the link.
    pub fn security_level(&self) -> SecurityLevel {
        self.security
    }

    /// GATT operations are accepted.
    pub fn is_ready(&self) -> bool {
        self.state == ConnectionState::Ready
    }
}

/// The single connection slot of the client.
#[derive(Debug)]
pub(crate) enum Slot {
    Empty,
    Connecting { peer: Address },
    Active(Connection),
}

impl Slot {
    pub(crate) fn state(&self) -> ConnectionState {
        match self {
            Slot::Empty => ConnectionState::Idle,
            Slot::Connecting { .. } => ConnectionState::Connecting,
            Slot::Active(conn) => conn.state,
        }
    }

    /// The active connection, if `handle` identifies it.
    pub(crate) fn current(&mut self, handle: ConnHandle) -> Option<&mut Connection> {
        match self {
            Slot::Active(conn) if conn.handle == handle => Some(conn),
            _ => None,
        }
    }

    pub(crate) fn active(&self) -> Option<&Connection> {
        match self {
            Slot::Active(conn) => Some(conn),
            _ => None,
        }
    }

    pub(crate) fn ready(&self) -> Option<&Connection> {
        self.active().filter(|c| c.is_ready())
    }
}
