//! GATT client side: service profiles, discovery, subscriptions and writes.
mod discovery;
mod handles;
mod subscription;
mod write;

pub use discovery::{DiscoveredCharacteristic, DiscoveredDescriptor, DiscoveredService};
pub use handles::{CharacteristicHandles, ServiceHandles};
pub use subscription::SubscriptionState;

pub(crate) use discovery::{log_service, resolve};
pub(crate) use handles::HandleCache;
pub(crate) use subscription::Subscriptions;
pub(crate) use write::WriteGuard;

use crate::Uuid;

/// Client Characteristic Configuration descriptor.
pub const CHARACTERISTIC_CCCD_UUID16: Uuid = Uuid::new_short(0x2902);

/// How the client uses a characteristic of the profile.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharacteristicKind {
    /// Written by the client.
    Write,
    /// Read by the client.
    Read,
    /// Notifies the client. Its CCC descriptor is resolved during discovery.
    Notify,
}

/// A characteristic the client expects on the peer.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CharacteristicSpec {
    /// Characteristic UUID.
    pub uuid: Uuid,
    /// Usage.
    pub kind: CharacteristicKind,
}

impl CharacteristicSpec {
    /// A characteristic written by the client.
    pub const fn write(uuid: Uuid) -> Self {
        Self {
            uuid,
            kind: CharacteristicKind::Write,
        }
    }

    /// A characteristic read by the client.
    pub const fn read(uuid: Uuid) -> Self {
        Self {
            uuid,
            kind: CharacteristicKind::Read,
        }
    }

    /// A characteristic notifying the client.
    pub const fn notify(uuid: Uuid) -> Self {
        Self {
            uuid,
            kind: CharacteristicKind::Notify,
        }
    }

    pub(crate) fn notifiable(&self) -> bool {
        self.kind == CharacteristicKind::Notify
    }
}

/// The service the client looks for and validates on the peer.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceProfile {
    /// Primary service UUID.
    pub service: Uuid,
    /// Characteristics that must be present.
    pub characteristics: &'static [CharacteristicSpec],
}

/// Characteristic properties
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CharacteristicProp {
    /// Broadcast
    Broadcast = 0x01,
    /// Read
    Read = 0x02,
    /// Write without response
    WriteWithoutResponse = 0x04,
    /// Write
    Write = 0x08,
    /// Notify
    Notify = 0x10,
    /// Indicate
    Indicate = 0x20,
    /// Authenticated writes
    AuthenticatedWrite = 0x40,
    /// Extended properties
    Extended = 0x80,
}

/// Property bits of a characteristic declaration.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CharacteristicProps(u8);

impl<'a> From<&'a [CharacteristicProp]> for CharacteristicProps {
    fn from(props: &'a [CharacteristicProp]) -> Self {
        let mut val: u8 = 0;
        for prop in props {
            val |= *prop as u8;
        }
        CharacteristicProps(val)
    }
}

impl<const T: usize> From<[CharacteristicProp; T]> for CharacteristicProps {
    fn from(props: [CharacteristicProp; T]) -> Self {
        Self::from(&props[..])
    }
}

impl From<u8> for CharacteristicProps {
    fn from(value: u8) -> Self {
        Self(value)
    }
}

impl CharacteristicProps {
    /// Check if any of the properties are set.
    pub fn any(&self, props: &[CharacteristicProp]) -> bool {
        props.iter().any(|p| (*p as u8) & self.0 != 0)
    }

    /// Raw property bits.
    pub fn raw(&self) -> u8 {
        self.0
    }
}
