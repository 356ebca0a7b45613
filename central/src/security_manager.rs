//! Pairing with a fixed passkey.
//!
//! The client takes the keyboard role: it answers passkey entry requests with the configured
//! passkey and accepts every passkey confirmation. Failures are reported to the client, which
//! drops the link.
use bt_hci::param::ConnHandle;

use crate::transport::Transport;
use crate::{PassKey, Reason};

/// Progress of the pairing procedure on the current connection.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairingStatus {
    /// No pairing since the connection was established.
    Idle,
    /// The peer asked for the passkey.
    InProgress,
    /// Pairing finished.
    Complete {
        /// Keys were stored for later reconnection.
        bonded: bool,
    },
    /// The peer cancelled.
    Cancelled,
    /// Pairing failed.
    Failed(Reason),
}

/// Answers pairing challenges.
pub(crate) struct Authenticator {
    passkey: PassKey,
    status: PairingStatus,
}

impl Authenticator {
    pub(crate) fn new(passkey: PassKey) -> Self {
        Self {
            passkey,
            status: PairingStatus::Idle,
        }
    }

    pub(crate) fn passkey_entry<T: Transport>(&mut self, conn: ConnHandle, transport: &mut T) -> Result<(), T::Error> {
        self.status = PairingStatus::InProgress;
        info!("[security] passkey entry on {:?}, replying {}", conn, self.passkey);
        transport.passkey_entry(conn, self.passkey)
    }

    pub(crate) fn passkey_confirm<T: Transport>(
        &mut self,
        conn: ConnHandle,
        passkey: PassKey,
        transport: &mut T,
    ) -> Result<(), T::Error> {
        self.status = PairingStatus::InProgress;
        info!("[security] confirming passkey {} on {:?}", passkey, conn);
        transport.passkey_confirm(conn, true)
    }

    pub(crate) fn cancel(&mut self, conn: ConnHandle) {
        info!("[security] pairing cancelled on {:?}", conn);
        self.status = PairingStatus::Cancelled;
    }

    pub(crate) fn complete(&mut self, conn: ConnHandle, bonded: bool) {
        info!("[security] pairing completed on {:?}, bonded: {}", conn, bonded);
        self.status = PairingStatus::Complete { bonded };
    }

    pub(crate) fn failed(&mut self, conn: ConnHandle, reason: Reason) {
        warn!("[security] pairing failed on {:?}: {}", conn, reason);
        self.status = PairingStatus::Failed(reason);
    }

    pub(crate) fn reset(&mut self) {
        self.status = PairingStatus::Idle;
    }

    pub(crate) fn status(&self) -> PairingStatus {
        self.status
    }
}
