use bt_hci::param::ConnHandle;
use heapless::Vec;

use super::handles::{CharacteristicHandles, ServiceHandles};
use super::{CharacteristicProps, ServiceProfile, CHARACTERISTIC_CCCD_UUID16};
use crate::config::{MAX_CHARACTERISTICS, MAX_DESCRIPTORS};
use crate::{Error, Uuid};

/// A descriptor found during discovery.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiscoveredDescriptor {
    /// Descriptor type.
    pub uuid: Uuid,
    /// Attribute handle.
    pub handle: u16,
}

/// A characteristic found during discovery.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredCharacteristic {
    /// Characteristic UUID.
    pub uuid: Uuid,
    /// Handle of the characteristic declaration.
    pub declaration_handle: u16,
    /// Handle of the characteristic value.
    pub value_handle: u16,
    /// Declared properties.
    pub props: CharacteristicProps,
    /// Descriptors following the value.
    pub descriptors: Vec<DiscoveredDescriptor, MAX_DESCRIPTORS>,
}

impl DiscoveredCharacteristic {
    /// Handle of the descriptor of type `uuid`, if present.
    pub fn descriptor(&self, uuid: &Uuid) -> Option<u16> {
        self.descriptors.iter().find(|d| &d.uuid == uuid).map(|d| d.handle)
    }
}

/// The attribute tree of one service, as reported by the transport after discovery.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredService {
    /// Service UUID.
    pub uuid: Uuid,
    /// First handle of the service.
    pub start: u16,
    /// Last handle of the service.
    pub end: u16,
    /// Characteristics in handle order.
    pub characteristics: Vec<DiscoveredCharacteristic, MAX_CHARACTERISTICS>,
}

impl DiscoveredService {
    /// Characteristic with the given UUID, if present.
    pub fn characteristic(&self, uuid: &Uuid) -> Option<&DiscoveredCharacteristic> {
        self.characteristics.iter().find(|c| &c.uuid == uuid)
    }
}

/// Validate a discovered service against the profile and collect its handles.
///
/// Either every characteristic of the profile resolves, or nothing is returned.
pub(crate) fn resolve(
    conn: ConnHandle,
    profile: &ServiceProfile,
    service: &DiscoveredService,
) -> Result<ServiceHandles, Error> {
    if service.uuid != profile.service {
        warn!("[gatt] discovered service {:?} does not match profile", service.uuid);
        return Err(Error::ServiceValidation);
    }

    let mut handles = ServiceHandles::new(conn, profile.service);
    for spec in profile.characteristics {
        let Some(c) = service.characteristic(&spec.uuid) else {
            warn!("[gatt] missing characteristic {:?}", spec.uuid);
            return Err(Error::CharacteristicNotFound);
        };
        let cccd = if spec.notifiable() {
            let Some(cccd) = c.descriptor(&CHARACTERISTIC_CCCD_UUID16) else {
                warn!("[gatt] missing CCC descriptor for {:?}", spec.uuid);
                return Err(Error::CccdNotFound);
            };
            Some(cccd)
        } else {
            None
        };
        handles.push(CharacteristicHandles {
            uuid: spec.uuid,
            value: c.value_handle,
            cccd,
        })?;
    }
    Ok(handles)
}

/// Dump the discovered attribute tree at debug level.
pub(crate) fn log_service(service: &DiscoveredService) {
    debug!(
        "[gatt] service {:?} handles {}..{}",
        service.uuid, service.start, service.end
    );
    for c in service.characteristics.iter() {
        debug!(
            "[gatt]   characteristic {:?} decl {} value {} props {:?}",
            c.uuid, c.declaration_handle, c.value_handle, c.props
        );
        for d in c.descriptors.iter() {
            debug!("[gatt]     descriptor {:?} handle {}", d.uuid, d.handle);
        }
    }
}
