use bt_hci::param::{AddrKind, BdAddr};

/// Address of a BLE device.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Address {
    /// Address type.
    pub kind: AddrKind,
    /// Address value.
    pub addr: BdAddr,
}

impl Address {
    /// Create a new random address.
    pub fn random(val: [u8; 6]) -> Self {
        Self {
            kind: AddrKind::RANDOM,
            addr: BdAddr::new(val),
        }
    }

    /// Create a new public address.
    pub fn public(val: [u8; 6]) -> Self {
        Self {
            kind: AddrKind::PUBLIC,
            addr: BdAddr::new(val),
        }
    }
}
