use bt_hci::param::ConnHandle;
use heapless::Vec;

use crate::config::MAX_CHARACTERISTICS;
use crate::{Error, Uuid};

/// Resolved handles of one characteristic.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CharacteristicHandles {
    /// Characteristic UUID.
    pub uuid: Uuid,
    /// Value handle.
    pub value: u16,
    /// Client characteristic configuration handle, for notifiable characteristics.
    pub cccd: Option<u16>,
}

/// Resolved handles of the profile service on one connection.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceHandles {
    conn: ConnHandle,
    service: Uuid,
    characteristics: Vec<CharacteristicHandles, MAX_CHARACTERISTICS>,
}

impl ServiceHandles {
    pub(crate) fn new(conn: ConnHandle, service: Uuid) -> Self {
        Self {
            conn,
            service,
            characteristics: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, handles: CharacteristicHandles) -> Result<(), Error> {
        self.characteristics.push(handles).map_err(|_| Error::InsufficientSpace)
    }

    /// Connection the handles were discovered on.
    pub fn conn(&self) -> ConnHandle {
        self.conn
    }

    /// Service UUID.
    pub fn service(&self) -> &Uuid {
        &self.service
    }

    /// Handles of the characteristic identified by `uuid`.
    pub fn get(&self, uuid: &Uuid) -> Option<&CharacteristicHandles> {
        self.characteristics.iter().find(|c| &c.uuid == uuid)
    }

    /// All resolved characteristics, in profile order.
    pub fn iter(&self) -> impl Iterator<Item = &CharacteristicHandles> {
        self.characteristics.iter()
    }
}

/// Handle cache of the current connection.
///
/// Unresolved until a discovery pass succeeds, then holds every handle of the profile at once.
/// Dropped back to unresolved when the connection goes away.
pub(crate) struct HandleCache {
    resolved: Option<ServiceHandles>,
}

impl HandleCache {
    pub(crate) const fn new() -> Self {
        Self { resolved: None }
    }

    pub(crate) fn populate(&mut self, handles: ServiceHandles) {
        self.resolved.replace(handles);
    }

    pub(crate) fn invalidate(&mut self) {
        self.resolved.take();
    }

    pub(crate) fn get(&self) -> Option<&ServiceHandles> {
        self.resolved.as_ref()
    }

    /// Handles for `uuid` on `conn`.
    pub(crate) fn characteristic(&self, conn: ConnHandle, uuid: &Uuid) -> Result<&CharacteristicHandles, Error> {
        let handles = self
            .resolved
            .as_ref()
            .filter(|h| h.conn == conn)
            .ok_or(Error::NotResolved)?;
        handles.get(uuid).ok_or(Error::UnknownCharacteristic)
    }
}
