#![allow(dead_code)]

use heapless::Vec as HVec;
use trouble_central::ad_structure::{BR_EDR_NOT_SUPPORTED, LE_GENERAL_DISCOVERABLE};
use trouble_central::prelude::*;

pub const SERVICE: Uuid = Uuid::from_u128(0x86b50001_7ff7_496e_aa9c_05fc11855eb3);
pub const LED: Uuid = Uuid::from_u128(0x86b50002_7ff7_496e_aa9c_05fc11855eb3);
pub const BUTTON: Uuid = Uuid::from_u128(0x86b50003_7ff7_496e_aa9c_05fc11855eb3);

pub const PROFILE: ServiceProfile = ServiceProfile {
    service: SERVICE,
    characteristics: &[CharacteristicSpec::write(LED), CharacteristicSpec::notify(BUTTON)],
};

pub const LED_VALUE: u16 = 0x0012;
pub const BUTTON_VALUE: u16 = 0x0015;
pub const BUTTON_CCCD: u16 = 0x0016;

pub fn peer() -> Address {
    Address::random([0xc0, 0x11, 0x22, 0x33, 0x44, 0x55])
}

pub fn other_peer() -> Address {
    Address::random([0xc0, 0x66, 0x77, 0x88, 0x99, 0xaa])
}

pub fn conn() -> ConnHandle {
    ConnHandle::new(0x40)
}

#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    StartScan,
    StopScan,
    Connect(Address),
    Disconnect(ConnHandle, DisconnectReason),
    SetSecurity(ConnHandle, SecurityLevel),
    PasskeyEntry(ConnHandle, PassKey),
    PasskeyConfirm(ConnHandle, bool),
    Discover(ConnHandle, Uuid),
    Subscribe(ConnHandle, u16, u16),
    Unsubscribe(ConnHandle, u16, u16),
    Write(ConnHandle, u16, Vec<u8>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Refused;

/// Records requests and refuses the ones it is told to.
#[derive(Default)]
pub struct MockTransport {
    pub requests: Vec<Request>,
    pub refuse_scan: bool,
    pub refuse_connect: bool,
    pub refuse_disconnect: bool,
    pub refuse_security: bool,
    pub refuse_subscribe: bool,
    pub refuse_write: bool,
}

impl MockTransport {
    fn record(&mut self, request: Request, refuse: bool) -> Result<(), Refused> {
        if refuse {
            return Err(Refused);
        }
        self.requests.push(request);
        Ok(())
    }
}

impl Transport for MockTransport {
    type Error = Refused;

    fn start_scan(&mut self, _config: &ScanConfig) -> Result<(), Refused> {
        let refuse = self.refuse_scan;
        self.record(Request::StartScan, refuse)
    }

    fn stop_scan(&mut self) -> Result<(), Refused> {
        self.record(Request::StopScan, false)
    }

    fn connect(&mut self, peer: &Address) -> Result<(), Refused> {
        let refuse = self.refuse_connect;
        self.record(Request::Connect(*peer), refuse)
    }

    fn disconnect(&mut self, conn: ConnHandle, reason: DisconnectReason) -> Result<(), Refused> {
        let refuse = self.refuse_disconnect;
        self.record(Request::Disconnect(conn, reason), refuse)
    }

    fn set_security(&mut self, conn: ConnHandle, level: SecurityLevel) -> Result<(), Refused> {
        let refuse = self.refuse_security;
        self.record(Request::SetSecurity(conn, level), refuse)
    }

    fn passkey_entry(&mut self, conn: ConnHandle, passkey: PassKey) -> Result<(), Refused> {
        self.record(Request::PasskeyEntry(conn, passkey), false)
    }

    fn passkey_confirm(&mut self, conn: ConnHandle, accept: bool) -> Result<(), Refused> {
        self.record(Request::PasskeyConfirm(conn, accept), false)
    }

    fn discover(&mut self, conn: ConnHandle, service: &Uuid) -> Result<(), Refused> {
        self.record(Request::Discover(conn, *service), false)
    }

    fn subscribe(&mut self, conn: ConnHandle, value_handle: u16, cccd_handle: u16) -> Result<(), Refused> {
        let refuse = self.refuse_subscribe;
        self.record(Request::Subscribe(conn, value_handle, cccd_handle), refuse)
    }

    fn unsubscribe(&mut self, conn: ConnHandle, value_handle: u16, cccd_handle: u16) -> Result<(), Refused> {
        self.record(Request::Unsubscribe(conn, value_handle, cccd_handle), false)
    }

    fn write(&mut self, conn: ConnHandle, handle: u16, data: &[u8]) -> Result<(), Refused> {
        let refuse = self.refuse_write;
        self.record(Request::Write(conn, handle, data.to_vec()), refuse)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Upcall {
    FilterMatch(Address),
    FilterNoMatch(Address),
    ConnectFailed(Address),
    Connected(ConnHandle),
    Disconnected(ConnHandle, ErrorCode),
    SecurityChanged(Result<SecurityLevel, Reason>),
    PairingComplete(bool),
    PairingFailed(Reason),
    DiscoveryComplete,
    DiscoveryFailed(Error),
    Subscribed(Uuid),
    SubscribeFailed(Uuid, AttErrorCode),
    Notification(Uuid, Vec<u8>),
    Unsubscribed(Uuid),
    WriteComplete(Uuid, Result<(), AttErrorCode>, Vec<u8>),
}

/// Records upcalls. Answers notifications with `Stop` once `stop_after` have been seen.
#[derive(Default)]
pub struct Recorder {
    pub upcalls: Vec<Upcall>,
    pub stop_after: Option<usize>,
    pub notifications: usize,
}

impl Recorder {
    pub fn take(&mut self) -> Vec<Upcall> {
        std::mem::take(&mut self.upcalls)
    }
}

impl EventHandler for Recorder {
    fn on_filter_match(&mut self, report: &AdvReport) {
        self.upcalls.push(Upcall::FilterMatch(report.addr));
    }

    fn on_filter_no_match(&mut self, report: &AdvReport) {
        self.upcalls.push(Upcall::FilterNoMatch(report.addr));
    }

    fn on_connect_failed(&mut self, peer: &Address) {
        self.upcalls.push(Upcall::ConnectFailed(*peer));
    }

    fn on_connected(&mut self, conn: &Connection) {
        self.upcalls.push(Upcall::Connected(conn.handle()));
    }

    fn on_disconnected(&mut self, conn: &Connection, reason: ErrorCode) {
        self.upcalls.push(Upcall::Disconnected(conn.handle(), reason));
    }

    fn on_security_changed(&mut self, _conn: &Connection, result: Result<SecurityLevel, Reason>) {
        self.upcalls.push(Upcall::SecurityChanged(result));
    }

    fn on_pairing_complete(&mut self, _conn: &Connection, bonded: bool) {
        self.upcalls.push(Upcall::PairingComplete(bonded));
    }

    fn on_pairing_failed(&mut self, _conn: &Connection, reason: Reason) {
        self.upcalls.push(Upcall::PairingFailed(reason));
    }

    fn on_discovery_complete(&mut self, _handles: &ServiceHandles) {
        self.upcalls.push(Upcall::DiscoveryComplete);
    }

    fn on_discovery_failed(&mut self, error: Error) {
        self.upcalls.push(Upcall::DiscoveryFailed(error));
    }

    fn on_subscribed(&mut self, characteristic: &Uuid) {
        self.upcalls.push(Upcall::Subscribed(*characteristic));
    }

    fn on_subscribe_failed(&mut self, characteristic: &Uuid, code: AttErrorCode) {
        self.upcalls.push(Upcall::SubscribeFailed(*characteristic, code));
    }

    fn on_notification(&mut self, characteristic: &Uuid, data: &[u8]) -> NotifyAction {
        self.upcalls.push(Upcall::Notification(*characteristic, data.to_vec()));
        self.notifications += 1;
        match self.stop_after {
            Some(n) if self.notifications >= n => NotifyAction::Stop,
            _ => NotifyAction::Continue,
        }
    }

    fn on_unsubscribed(&mut self, characteristic: &Uuid) {
        self.upcalls.push(Upcall::Unsubscribed(*characteristic));
    }

    fn on_write_complete(&mut self, characteristic: &Uuid, result: Result<(), AttErrorCode>, data: &[u8]) {
        self.upcalls
            .push(Upcall::WriteComplete(*characteristic, result, data.to_vec()));
    }
}

pub fn client() -> CentralClient<MockTransport> {
    client_with(ClientConfig::new(PROFILE), MockTransport::default())
}

pub fn client_with(config: ClientConfig, transport: MockTransport) -> CentralClient<MockTransport> {
    let _ = env_logger::try_init();
    CentralClient::new(transport, config)
}

pub fn requests(client: &mut CentralClient<MockTransport>) -> Vec<Request> {
    std::mem::take(&mut client.transport_mut().requests)
}

pub fn advertisement(addr: Address, uuid: &Uuid) -> Event {
    let mut data = [0u8; 31];
    let len = AdStructure::encode_slice(
        &[AdStructure::Flags(LE_GENERAL_DISCOVERABLE | BR_EDR_NOT_SUPPORTED), AdStructure::ServiceUuids128(uuid.as_raw())],
        &mut data,
    )
    .unwrap();
    Event::AdvReport(AdvReport::new(addr, -45, true, &data[..len]))
}

pub fn discovered(with_led: bool, with_cccd: bool) -> DiscoveredService {
    let mut characteristics = HVec::new();
    if with_led {
        characteristics
            .push(DiscoveredCharacteristic {
                uuid: LED,
                declaration_handle: LED_VALUE - 1,
                value_handle: LED_VALUE,
                props: [CharacteristicProp::Read, CharacteristicProp::Write].into(),
                descriptors: HVec::new(),
            })
            .unwrap();
    }
    let mut descriptors = HVec::new();
    if with_cccd {
        descriptors
            .push(DiscoveredDescriptor {
                uuid: Uuid::new_short(0x2902),
                handle: BUTTON_CCCD,
            })
            .unwrap();
    }
    characteristics
        .push(DiscoveredCharacteristic {
            uuid: BUTTON,
            declaration_handle: BUTTON_VALUE - 1,
            value_handle: BUTTON_VALUE,
            props: [CharacteristicProp::Read, CharacteristicProp::Notify].into(),
            descriptors,
        })
        .unwrap();
    DiscoveredService {
        uuid: SERVICE,
        start: 0x0010,
        end: 0x0016,
        characteristics,
    }
}

/// Scan, connect and settle security. Leaves discovery running.
pub fn connect(client: &mut CentralClient<MockTransport>, handler: &mut Recorder) {
    client.start_scan().unwrap();
    client.process(advertisement(peer(), &SERVICE), handler);
    client.process(
        Event::Connected {
            handle: conn(),
            peer: peer(),
            status: ErrorCode::Okay,
        },
        handler,
    );
    client.process(
        Event::SecurityChanged {
            handle: conn(),
            level: SecurityLevel::EncryptedAuthenticated,
            result: Ok(()),
        },
        handler,
    );
    assert_eq!(client.state(), ConnectionState::Ready);
}

/// Connect, discover and acknowledge the button subscription.
pub fn connect_and_subscribe(client: &mut CentralClient<MockTransport>, handler: &mut Recorder) {
    connect(client, handler);
    client.process(
        Event::DiscoveryComplete {
            handle: conn(),
            service: discovered(true, true),
        },
        handler,
    );
    client.process(
        Event::SubscribeComplete {
            handle: conn(),
            value_handle: BUTTON_VALUE,
            result: Ok(()),
        },
        handler,
    );
    assert_eq!(client.subscription_state(&BUTTON), Some(SubscriptionState::Enabled));
    requests(client);
    handler.take();
}
