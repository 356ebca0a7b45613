use heapless::Vec;

use super::handles::ServiceHandles;
use crate::config::MAX_CHARACTERISTICS;
use crate::{Error, Uuid};

/// Notification state of a characteristic.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionState {
    /// Notifications are off.
    Disabled,
    /// The CCC write is in flight.
    Pending,
    /// The peer acknowledged the CCC write.
    Enabled,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct Subscription {
    pub(crate) uuid: Uuid,
    pub(crate) value_handle: u16,
    pub(crate) cccd_handle: u16,
    pub(crate) state: SubscriptionState,
}

/// Notification state of every notifiable characteristic on the current connection.
pub(crate) struct Subscriptions {
    entries: Vec<Subscription, MAX_CHARACTERISTICS>,
}

impl Subscriptions {
    pub(crate) const fn new() -> Self {
        Self { entries: Vec::new() }
    }

    /// One disabled entry per characteristic with a CCC descriptor.
    pub(crate) fn populate(&mut self, handles: &ServiceHandles) {
        self.entries.clear();
        for c in handles.iter() {
            if let Some(cccd) = c.cccd {
                // Bounded by the same capacity as the handles.
                let _ = self.entries.push(Subscription {
                    uuid: c.uuid,
                    value_handle: c.value,
                    cccd_handle: cccd,
                    state: SubscriptionState::Disabled,
                });
            }
        }
    }

    pub(crate) fn reset(&mut self) {
        self.entries.clear();
    }

    /// Move `uuid` from disabled to pending in one step.
    pub(crate) fn begin(&mut self, uuid: &Uuid) -> Result<Subscription, Error> {
        let entry = self
            .entries
            .iter_mut()
            .find(|s| &s.uuid == uuid)
            .ok_or(Error::NotNotifiable)?;
        if entry.state != SubscriptionState::Disabled {
            return Err(Error::AlreadySubscribed);
        }
        entry.state = SubscriptionState::Pending;
        Ok(*entry)
    }

    /// Pending back to disabled, after the CCC write was refused.
    pub(crate) fn rollback(&mut self, value_handle: u16) -> Option<Uuid> {
        let entry = self.by_handle_mut(value_handle)?;
        if entry.state != SubscriptionState::Pending {
            return None;
        }
        entry.state = SubscriptionState::Disabled;
        Some(entry.uuid)
    }

    /// Pending to enabled, after the peer acknowledged the CCC write.
    pub(crate) fn confirm(&mut self, value_handle: u16) -> Option<Uuid> {
        let entry = self.by_handle_mut(value_handle)?;
        if entry.state != SubscriptionState::Pending {
            return None;
        }
        entry.state = SubscriptionState::Enabled;
        Some(entry.uuid)
    }

    /// Back to disabled from any active state.
    pub(crate) fn revoke(&mut self, value_handle: u16) -> Option<Uuid> {
        let entry = self.by_handle_mut(value_handle)?;
        if entry.state == SubscriptionState::Disabled {
            return None;
        }
        entry.state = SubscriptionState::Disabled;
        Some(entry.uuid)
    }

    pub(crate) fn get(&self, uuid: &Uuid) -> Option<&Subscription> {
        self.entries.iter().find(|s| &s.uuid == uuid)
    }

    pub(crate) fn by_handle(&self, value_handle: u16) -> Option<&Subscription> {
        self.entries.iter().find(|s| s.value_handle == value_handle)
    }

    fn by_handle_mut(&mut self, value_handle: u16) -> Option<&mut Subscription> {
        self.entries.iter_mut().find(|s| s.value_handle == value_handle)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Subscription> {
        self.entries.iter()
    }
}
