//! Compile-time configuration.
//!
//! These bound the fixed-capacity buffers the client keeps per connection. Run-time settings
//! live in [`ClientConfig`](crate::ClientConfig) and [`ScanConfig`](crate::scan::ScanConfig).

/// Characteristics per service
///
/// Upper bound on characteristics in a service profile and in a discovered service.
///
/// Default: 8.
pub const MAX_CHARACTERISTICS: usize = 8;

/// Descriptors per characteristic
///
/// Descriptors beyond this bound are dropped by the transport when reporting discovery.
///
/// Default: 4.
pub const MAX_DESCRIPTORS: usize = 4;

/// Write payload size
///
/// A write copies its payload so it can be handed back on completion. This is the largest
/// payload accepted, an ATT MTU of 247 minus the 3 byte write request header.
///
/// Default: 244.
pub const WRITE_PAYLOAD_MAX: usize = 244;

/// Notification payload size
///
/// Default: 244.
pub const NOTIFICATION_PAYLOAD_MAX: usize = 244;

/// Advertising data length
///
/// Large enough for legacy and extended advertising reports.
///
/// Default: 255.
pub const ADV_DATA_MAX: usize = 255;

/// Event queue depth
///
/// Suggested depth of an [`EventQueue`](crate::EventQueue).
///
/// Default: 4.
pub const EVENT_QUEUE_SIZE: usize = 4;

/// Fixed passkey used when none is configured.
pub const DEFAULT_PASSKEY: u32 = 123456;
