//! Connection lifecycle and event dispatch.
use bt_hci::param::{ConnHandle, DisconnectReason};
use heapless::Vec;

use crate::config::MAX_CHARACTERISTICS;
use crate::connection::{Connection, ConnectionState, Discovery, Slot};
use crate::event::{ErrorCode, Event, EventHandler, NotifyAction};
use crate::fmt::Bytes;
use crate::gatt::{
    self, DiscoveredService, HandleCache, ServiceHandles, ServiceProfile, SubscriptionState, Subscriptions, WriteGuard,
};
use crate::scan::{AdvReport, FilterMatch, ScanConfig, Scanner};
use crate::security_manager::{Authenticator, PairingStatus};
use crate::transport::Transport;
use crate::{Address, AttErrorCode, ClientError, Error, PassKey, Reason, SecurityLevel, Uuid};

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// The service to look for, validate and use.
    pub profile: ServiceProfile,
    /// Scan parameters.
    pub scan: ScanConfig,
    /// Security level requested right after connecting. `None` skips the request.
    pub security: Option<SecurityLevel>,
    /// Passkey entered when the peer asks for one.
    pub passkey: PassKey,
    /// Subscribe to every notifiable characteristic once discovery completes.
    pub subscribe_on_discovery: bool,
}

impl ClientConfig {
    /// Configuration for `profile` with authenticated security and the default passkey.
    pub fn new(profile: ServiceProfile) -> Self {
        Self {
            profile,
            scan: ScanConfig::default(),
            security: Some(SecurityLevel::EncryptedAuthenticated),
            passkey: PassKey::default(),
            subscribe_on_discovery: true,
        }
    }
}

/// A GATT client in the central role.
///
/// Holds the single connection slot together with everything tied to it: resolved handles,
/// subscriptions and the pending write. All state changes happen either in an application call
/// or in [`process`](Self::process), never concurrently.
pub struct CentralClient<T: Transport> {
    transport: T,
    profile: ServiceProfile,
    security: Option<SecurityLevel>,
    subscribe_on_discovery: bool,
    scanner: Scanner,
    auth: Authenticator,
    slot: Slot,
    handles: HandleCache,
    subscriptions: Subscriptions,
    writes: WriteGuard,
}

impl<T: Transport> CentralClient<T> {
    /// Create a client. Nothing happens on air until [`start_scan`](Self::start_scan).
    pub fn new(transport: T, config: ClientConfig) -> Self {
        Self {
            transport,
            scanner: Scanner::new(config.scan, config.profile.service),
            profile: config.profile,
            security: config.security,
            subscribe_on_discovery: config.subscribe_on_discovery,
            auth: Authenticator::new(config.passkey),
            slot: Slot::Empty,
            handles: HandleCache::new(),
            subscriptions: Subscriptions::new(),
            writes: WriteGuard::new(),
        }
    }

    /// The transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// The transport, mutably.
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Start scanning for the profile service.
    pub fn start_scan(&mut self) -> Result<(), ClientError<T::Error>> {
        self.scanner.start(&mut self.transport)
    }

    /// Stop scanning. Does nothing if not scanning.
    pub fn stop_scan(&mut self) -> Result<(), ClientError<T::Error>> {
        self.scanner.stop(&mut self.transport)
    }

    /// Lifecycle state of the connection slot.
    pub fn state(&self) -> ConnectionState {
        self.slot.state()
    }

    /// The current connection, once established.
    pub fn connection(&self) -> Option<&Connection> {
        self.slot.active()
    }

    pub fn is_scanning(&self) -> bool {
        self.scanner.is_scanning()
    }

    /// Handles resolved on the current connection.
    pub fn handles(&self) -> Option<&ServiceHandles> {
        self.handles.get()
    }

    pub fn subscription_state(&self, characteristic: &Uuid) -> Option<SubscriptionState> {
        self.subscriptions.get(characteristic).map(|s| s.state)
    }

    pub fn write_pending(&self) -> bool {
        self.writes.is_pending()
    }

    pub fn security_level(&self) -> Option<SecurityLevel> {
        self.slot.active().map(|c| c.security_level())
    }

    pub fn pairing_status(&self) -> PairingStatus {
        self.auth.status()
    }

    /// Write `payload` to `characteristic`.
    ///
    /// Only one write may be in flight. The outcome is reported through
    /// [`EventHandler::on_write_complete`].
    pub fn write(&mut self, characteristic: &Uuid, payload: &[u8]) -> Result<(), ClientError<T::Error>> {
        let conn = self.slot.ready().ok_or(Error::NotConnected)?.handle();
        self.writes.check()?;
        let handle = self.handles.characteristic(conn, characteristic)?.value;
        let pending = self.writes.begin(*characteristic, handle, payload)?;
        let result = self.transport.write(conn, handle, &pending.data);
        if let Err(e) = result {
            self.writes.complete();
            warn!("[write] write to {:?} could not be submitted", characteristic);
            return Err(ClientError::Transport(e));
        }
        debug!("[write] {} bytes to handle {}", payload.len(), handle);
        Ok(())
    }

    /// Turn notifications on for `characteristic`.
    ///
    /// The outcome is reported through [`EventHandler::on_subscribed`] or
    /// [`EventHandler::on_subscribe_failed`].
    pub fn subscribe(&mut self, characteristic: &Uuid) -> Result<(), ClientError<T::Error>> {
        let conn = self.slot.ready().ok_or(Error::NotConnected)?.handle();
        self.handles.characteristic(conn, characteristic)?;
        let sub = self.subscriptions.begin(characteristic)?;
        if let Err(e) = self.transport.subscribe(conn, sub.value_handle, sub.cccd_handle) {
            self.subscriptions.rollback(sub.value_handle);
            warn!("[gatt] subscribe to {:?} could not be submitted", characteristic);
            return Err(ClientError::Transport(e));
        }
        debug!("[gatt] subscribing to {:?}", characteristic);
        Ok(())
    }

    /// Turn notifications off for `characteristic`.
    pub fn unsubscribe(&mut self, characteristic: &Uuid) -> Result<(), ClientError<T::Error>> {
        let conn = self.slot.ready().ok_or(Error::NotConnected)?.handle();
        self.handles.characteristic(conn, characteristic)?;
        let sub = *self.subscriptions.get(characteristic).ok_or(Error::NotNotifiable)?;
        if sub.state == SubscriptionState::Disabled {
            return Err(Error::NotSubscribed.into());
        }
        self.transport
            .unsubscribe(conn, sub.value_handle, sub.cccd_handle)
            .map_err(ClientError::Transport)?;
        self.subscriptions.revoke(sub.value_handle);
        info!("[gatt] unsubscribed from {:?}", characteristic);
        Ok(())
    }

    /// Drop the current connection.
    ///
    /// Outstanding discovery, subscriptions and writes are abandoned once the transport reports
    /// the disconnection. Calling again while disconnecting repeats the request. A refused request
    /// leaves the connection untouched.
    pub fn disconnect(&mut self) -> Result<(), ClientError<T::Error>> {
        let Slot::Active(conn) = &mut self.slot else {
            return Err(Error::NotConnected.into());
        };
        self.transport
            .disconnect(conn.handle(), DisconnectReason::RemoteUserTerminatedConn)
            .map_err(ClientError::Transport)?;
        conn.state = ConnectionState::Disconnecting;
        Ok(())
    }

    /// Apply one transport event and run the application upcalls it leads to.
    pub fn process<H: EventHandler>(&mut self, event: Event, handler: &mut H) {
        match event {
            Event::AdvReport(report) => self.on_adv_report(report, handler),
            Event::Connected { handle, peer, status } => self.on_connected(handle, peer, status, handler),
            Event::Disconnected { handle, reason } => self.on_disconnected(handle, reason, handler),
            Event::SecurityChanged { handle, level, result } => {
                self.on_security_changed(handle, level, result, handler)
            }
            Event::PasskeyEntry { handle } => {
                if self.slot.current(handle).is_some() && self.auth.passkey_entry(handle, &mut self.transport).is_err() {
                    error!("[security] failed to answer passkey entry on {:?}", handle);
                }
            }
            Event::PasskeyConfirm { handle, passkey } => {
                if self.slot.current(handle).is_some()
                    && self.auth.passkey_confirm(handle, passkey, &mut self.transport).is_err()
                {
                    error!("[security] failed to confirm passkey on {:?}", handle);
                }
            }
            Event::PairingCancelled { handle } => {
                if self.slot.current(handle).is_some() {
                    self.auth.cancel(handle);
                }
            }
            Event::PairingComplete { handle, bonded } => {
                if let Some(conn) = self.slot.current(handle) {
                    self.auth.complete(handle, bonded);
                    handler.on_pairing_complete(conn, bonded);
                }
            }
            Event::PairingFailed { handle, reason } => self.on_pairing_failed(handle, reason, handler),
            Event::DiscoveryComplete { handle, service } => self.on_discovery_complete(handle, service, handler),
            Event::ServiceNotFound { handle } => {
                warn!("[gatt] service {:?} not found on {:?}", self.profile.service, handle);
                self.discovery_failed(handle, Error::DiscoveryFailed, handler);
            }
            Event::DiscoveryError { handle, code } => {
                warn!("[gatt] discovery on {:?} failed: {:?}", handle, code);
                self.discovery_failed(handle, Error::DiscoveryFailed, handler);
            }
            Event::SubscribeComplete {
                handle,
                value_handle,
                result,
            } => self.on_subscribe_complete(handle, value_handle, result, handler),
            Event::WriteComplete { handle, result } => self.on_write_complete(handle, result, handler),
            Event::Notification {
                handle,
                value_handle,
                data,
            } => self.on_notification(handle, value_handle, data.as_deref(), handler),
        }
    }

    fn on_adv_report<H: EventHandler>(&mut self, report: AdvReport, handler: &mut H) {
        if !self.scanner.is_scanning() {
            trace!("[scan] report from {:?} while not scanning", report.addr);
            return;
        }
        match self.scanner.matches(&report) {
            FilterMatch::NoMatch => handler.on_filter_no_match(&report),
            FilterMatch::Match => {
                info!("[scan] filter match {:?} rssi {}", report.addr, report.rssi);
                handler.on_filter_match(&report);
                if !self.scanner.connect_if_match() || !report.connectable {
                    return;
                }
                if !matches!(self.slot, Slot::Empty) {
                    debug!("[scan] link busy, not connecting to {:?}", report.addr);
                    return;
                }
                self.connect(report.addr, handler);
            }
        }
    }

    fn connect<H: EventHandler>(&mut self, peer: Address, handler: &mut H) {
        if self.scanner.stop(&mut self.transport).is_err() {
            warn!("[scan] failed to stop scanning before connecting");
        }
        match self.transport.connect(&peer) {
            Ok(()) => {
                info!("[link] connecting to {:?}", peer);
                self.slot = Slot::Connecting { peer };
            }
            Err(_) => {
                warn!("[link] connecting to {:?} failed", peer);
                handler.on_connect_failed(&peer);
                self.restart_scan();
            }
        }
    }

    fn on_connected<H: EventHandler>(&mut self, handle: ConnHandle, peer: Address, status: ErrorCode, handler: &mut H) {
        let ours = match &self.slot {
            Slot::Empty => true,
            Slot::Connecting { peer: expected } => *expected == peer,
            Slot::Active(conn) => {
                if conn.handle() == handle {
                    debug!("[link] duplicate connection event for {:?}", handle);
                    return;
                }
                false
            }
        };

        if !status.is_success() {
            if ours && matches!(self.slot, Slot::Connecting { .. }) {
                warn!("[link] failed to connect to {:?}: {:?}", peer, status);
                self.slot = Slot::Empty;
                handler.on_connect_failed(&peer);
                self.restart_scan();
            } else {
                debug!("[link] ignoring failed connection to {:?}", peer);
            }
            return;
        }

        if !ours {
            // The first link to complete keeps the slot.
            warn!("[link] rejecting second link {:?} to {:?}", handle, peer);
            if self
                .transport
                .disconnect(handle, DisconnectReason::RemoteUserTerminatedConn)
                .is_err()
            {
                error!("[link] failed to disconnect {:?}", handle);
            }
            return;
        }

        info!("[link] connected to {:?} as {:?}", peer, handle);
        if self.scanner.stop(&mut self.transport).is_err() {
            warn!("[scan] failed to stop scanning");
        }
        let conn = Connection::new(handle, peer);
        self.auth.reset();
        handler.on_connected(&conn);
        self.slot = Slot::Active(conn);
        self.escalate_security(handle, handler);
    }

    fn escalate_security<H: EventHandler>(&mut self, handle: ConnHandle, handler: &mut H) {
        let Some(conn) = self.slot.current(handle) else {
            return;
        };
        match self.security {
            Some(level) => match self.transport.set_security(handle, level) {
                Ok(()) => {
                    debug!("[security] requesting {:?} on {:?}", level, handle);
                    conn.state = ConnectionState::SecurityPending;
                }
                Err(_) => {
                    warn!("[security] failed to request {:?} on {:?}, continuing", level, handle);
                    conn.state = ConnectionState::Ready;
                    self.start_discovery(handle, handler);
                }
            },
            None => {
                conn.state = ConnectionState::Ready;
                self.start_discovery(handle, handler);
            }
        }
    }

    fn on_security_changed<H: EventHandler>(
        &mut self,
        handle: ConnHandle,
        level: SecurityLevel,
        result: Result<(), Reason>,
        handler: &mut H,
    ) {
        let Some(conn) = self.slot.current(handle) else {
            debug!("[security] ignoring security change on {:?}", handle);
            return;
        };
        match result {
            Ok(()) => {
                info!("[security] {:?} security changed to {:?}", handle, level);
                conn.security = level;
            }
            Err(reason) => warn!("[security] security on {:?} failed: {}", handle, reason),
        }
        handler.on_security_changed(conn, result.map(|_| level));
        if conn.state == ConnectionState::SecurityPending {
            conn.state = ConnectionState::Ready;
            self.start_discovery(handle, handler);
        }
    }

    fn on_pairing_failed<H: EventHandler>(&mut self, handle: ConnHandle, reason: Reason, handler: &mut H) {
        let Some(conn) = self.slot.current(handle) else {
            return;
        };
        self.auth.failed(handle, reason);
        handler.on_pairing_failed(conn, reason);
        self.teardown(handle, DisconnectReason::AuthenticationFailure, handler);
    }

    fn start_discovery<H: EventHandler>(&mut self, handle: ConnHandle, handler: &mut H) {
        let Some(conn) = self.slot.current(handle) else {
            return;
        };
        if conn.discovery != Discovery::NotStarted {
            return;
        }
        conn.discovery = Discovery::Running;
        info!("[gatt] discovering {:?} on {:?}", self.profile.service, handle);
        if self.transport.discover(handle, &self.profile.service).is_err() {
            error!("[gatt] could not start discovery on {:?}", handle);
            self.discovery_failed(handle, Error::DiscoveryFailed, handler);
        }
    }

    fn on_discovery_complete<H: EventHandler>(&mut self, handle: ConnHandle, service: DiscoveredService, handler: &mut H) {
        let Some(conn) = self.slot.current(handle) else {
            debug!("[gatt] ignoring discovery result for {:?}", handle);
            return;
        };
        if conn.discovery != Discovery::Running || conn.state != ConnectionState::Ready {
            debug!("[gatt] unexpected discovery result on {:?}", handle);
            return;
        }
        gatt::log_service(&service);

        match gatt::resolve(handle, &self.profile, &service) {
            Ok(handles) => {
                conn.discovery = Discovery::Done;
                info!("[gatt] discovery complete on {:?}", handle);
                self.subscriptions.populate(&handles);
                self.handles.populate(handles);
                if let Some(handles) = self.handles.get() {
                    handler.on_discovery_complete(handles);
                }
                if self.subscribe_on_discovery {
                    self.subscribe_all();
                }
            }
            Err(e) => self.discovery_failed(handle, e, handler),
        }
    }

    fn discovery_failed<H: EventHandler>(&mut self, handle: ConnHandle, error: Error, handler: &mut H) {
        let Some(conn) = self.slot.current(handle) else {
            return;
        };
        if conn.discovery != Discovery::Running {
            debug!("[gatt] ignoring discovery failure on {:?}: {:?}", handle, error);
            return;
        }
        conn.discovery = Discovery::Done;
        warn!("[gatt] discovery on {:?} failed: {:?}", handle, error);
        handler.on_discovery_failed(error);
        self.teardown(handle, DisconnectReason::RemoteUserTerminatedConn, handler);
    }

    fn subscribe_all(&mut self) {
        let disabled: Vec<Uuid, MAX_CHARACTERISTICS> = self
            .subscriptions
            .iter()
            .filter(|s| s.state == SubscriptionState::Disabled)
            .map(|s| s.uuid)
            .collect();
        for uuid in disabled.iter() {
            if self.subscribe(uuid).is_err() {
                warn!("[gatt] failed to subscribe to {:?}", uuid);
            }
        }
    }

    fn on_subscribe_complete<H: EventHandler>(
        &mut self,
        handle: ConnHandle,
        value_handle: u16,
        result: Result<(), AttErrorCode>,
        handler: &mut H,
    ) {
        if self.slot.current(handle).is_none() {
            debug!("[gatt] ignoring subscribe completion for {:?}", handle);
            return;
        }
        match result {
            Ok(()) => match self.subscriptions.confirm(value_handle) {
                Some(uuid) => {
                    info!("[gatt] subscribed to {:?}", uuid);
                    handler.on_subscribed(&uuid);
                }
                None => debug!("[gatt] no pending subscription for handle {}", value_handle),
            },
            Err(code) => match self.subscriptions.rollback(value_handle) {
                Some(uuid) => {
                    warn!("[gatt] subscribe to {:?} refused: {:?}", uuid, code);
                    handler.on_subscribe_failed(&uuid, code);
                }
                None => debug!("[gatt] no pending subscription for handle {}", value_handle),
            },
        }
    }

    fn on_write_complete<H: EventHandler>(
        &mut self,
        handle: ConnHandle,
        result: Result<(), AttErrorCode>,
        handler: &mut H,
    ) {
        if self.slot.current(handle).is_none() {
            debug!("[write] ignoring completion for {:?}", handle);
            return;
        }
        let Some(write) = self.writes.complete() else {
            warn!("[write] completion without a pending write");
            return;
        };
        match result {
            Ok(()) => debug!("[write] write to {:?} (handle {}) done", write.uuid, write.handle),
            Err(code) => warn!(
                "[write] write to {:?} (handle {}) failed: {:?}",
                write.uuid, write.handle, code
            ),
        }
        handler.on_write_complete(&write.uuid, result, &write.data);
    }

    fn on_notification<H: EventHandler>(
        &mut self,
        handle: ConnHandle,
        value_handle: u16,
        data: Option<&[u8]>,
        handler: &mut H,
    ) {
        if self.slot.current(handle).is_none() {
            trace!("[gatt] notification on stale {:?}", handle);
            return;
        }
        let Some(sub) = self.subscriptions.by_handle(value_handle).copied() else {
            trace!("[gatt] notification for unknown handle {}", value_handle);
            return;
        };
        if sub.state == SubscriptionState::Disabled {
            trace!("[gatt] notification for {:?} while unsubscribed", sub.uuid);
            return;
        }
        let Some(data) = data else {
            info!("[gatt] notifications for {:?} turned off by peer", sub.uuid);
            self.subscriptions.revoke(value_handle);
            handler.on_unsubscribed(&sub.uuid);
            return;
        };

        trace!("[gatt] notification {:?}: {:?}", sub.uuid, Bytes(data));
        if handler.on_notification(&sub.uuid, data) == NotifyAction::Stop {
            if self
                .transport
                .unsubscribe(handle, sub.value_handle, sub.cccd_handle)
                .is_err()
            {
                warn!("[gatt] failed to turn off notifications for {:?}", sub.uuid);
            }
            self.subscriptions.revoke(value_handle);
            handler.on_unsubscribed(&sub.uuid);
        }
    }

    fn on_disconnected<H: EventHandler>(&mut self, handle: ConnHandle, reason: ErrorCode, handler: &mut H) {
        if self.slot.current(handle).is_none() {
            debug!("[link] ignoring disconnect of {:?}", handle);
            return;
        }
        self.release(reason, handler);
    }

    /// Forget the active link, drop everything tied to it and resume scanning.
    fn release<H: EventHandler>(&mut self, reason: ErrorCode, handler: &mut H) {
        let Slot::Active(conn) = core::mem::replace(&mut self.slot, Slot::Empty) else {
            return;
        };
        info!("[link] disconnected from {:?}: {:?}", conn.peer_address(), reason);
        self.handles.invalidate();
        self.subscriptions.reset();
        if self.writes.complete().is_some() {
            debug!("[write] pending write abandoned");
        }
        self.auth.reset();
        self.restart_scan();
        handler.on_disconnected(&conn, reason);
    }

    /// Ask the transport to drop the link. No event follows a refused request, so the link is
    /// released locally instead.
    fn teardown<H: EventHandler>(&mut self, handle: ConnHandle, reason: DisconnectReason, handler: &mut H) {
        let Some(conn) = self.slot.current(handle) else {
            return;
        };
        if conn.state == ConnectionState::Disconnecting {
            return;
        }
        match self.transport.disconnect(handle, reason) {
            Ok(()) => conn.state = ConnectionState::Disconnecting,
            Err(_) => {
                error!("[link] failed to disconnect {:?}, releasing it", handle);
                self.release(ErrorCode::ConnectionTerminatedByLocalHost, handler);
            }
        }
    }

    fn restart_scan(&mut self) {
        match self.scanner.start(&mut self.transport) {
            Ok(()) | Err(ClientError::Client(Error::AlreadyScanning)) => {}
            Err(_) => error!("[scan] scanning failed to restart"),
        }
    }
}
