//! Scanning and advertisement filtering.
use embassy_time::Duration;
use heapless::Vec;

use crate::ad_structure::AdStructure;
use crate::config::ADV_DATA_MAX;
use crate::transport::Transport;
use crate::{Address, ClientError, Error, Uuid};

/// Scanner configuration.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Active scanning.
    pub active: bool,
    /// Scan interval.
    pub interval: Duration,
    /// Scan window.
    pub window: Duration,
    /// Connect to the first connectable advertiser that matches the filter.
    pub connect_if_match: bool,
    /// Service UUID to look for. Defaults to the service of the client profile.
    pub filter_uuid: Option<Uuid>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            active: true,
            interval: Duration::from_millis(60),
            window: Duration::from_millis(30),
            connect_if_match: true,
            filter_uuid: None,
        }
    }
}

/// An advertising report as delivered by the transport.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, PartialEq)]
pub struct AdvReport {
    /// Advertiser address.
    pub addr: Address,
    /// Received signal strength.
    pub rssi: i8,
    /// The advertiser accepts connections.
    pub connectable: bool,
    /// Advertising data, concatenated with scan response data if any.
    pub data: Vec<u8, ADV_DATA_MAX>,
}

impl AdvReport {
    /// Build a report, truncating data that does not fit.
    pub fn new(addr: Address, rssi: i8, connectable: bool, data: &[u8]) -> Self {
        let len = data.len().min(ADV_DATA_MAX);
        let mut buf = Vec::new();
        // Cannot fail, length is bounded above.
        let _ = buf.extend_from_slice(&data[..len]);
        Self {
            addr,
            rssi,
            connectable,
            data: buf,
        }
    }

    /// Whether the report advertises `uuid` in one of its service UUID lists.
    pub fn advertises(&self, uuid: &Uuid) -> bool {
        AdStructure::decode(&self.data)
            .take_while(|ad| ad.is_ok())
            .flatten()
            .any(|ad| ad.service_uuids().any(|u| &u == uuid))
    }
}

/// Result of matching an advertisement against the scan filter.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterMatch {
    /// The advertisement carries the filter UUID.
    Match,
    /// The advertisement does not carry the filter UUID.
    NoMatch,
}

/// Scan state and UUID filter.
pub(crate) struct Scanner {
    config: ScanConfig,
    filter: Uuid,
    scanning: bool,
}

impl Scanner {
    pub(crate) fn new(config: ScanConfig, service: Uuid) -> Self {
        let filter = config.filter_uuid.unwrap_or(service);
        Self {
            config,
            filter,
            scanning: false,
        }
    }

    pub(crate) fn start<T: Transport>(&mut self, transport: &mut T) -> Result<(), ClientError<T::Error>> {
        if self.scanning {
            return Err(Error::AlreadyScanning.into());
        }
        transport.start_scan(&self.config).map_err(ClientError::Transport)?;
        self.scanning = true;
        info!("[scan] scanning started");
        Ok(())
    }

    pub(crate) fn stop<T: Transport>(&mut self, transport: &mut T) -> Result<(), ClientError<T::Error>> {
        if !self.scanning {
            return Ok(());
        }
        transport.stop_scan().map_err(ClientError::Transport)?;
        self.scanning = false;
        debug!("[scan] scanning stopped");
        Ok(())
    }

    pub(crate) fn matches(&self, report: &AdvReport) -> FilterMatch {
        if report.advertises(&self.filter) {
            FilterMatch::Match
        } else {
            FilterMatch::NoMatch
        }
    }

    pub(crate) fn is_scanning(&self) -> bool {
        self.scanning
    }

    pub(crate) fn connect_if_match(&self) -> bool {
        self.config.connect_if_match
    }
}
