mod common;

use common::*;
use trouble_central::prelude::*;

fn discovery_result(client: &mut CentralClient<MockTransport>, handler: &mut Recorder, service: DiscoveredService) {
    connect(client, handler);
    requests(client);
    handler.take();
    client.process(
        Event::DiscoveryComplete {
            handle: conn(),
            service,
        },
        handler,
    );
}

#[test]
fn missing_characteristic_drops_the_link() {
    let mut client = client();
    let mut handler = Recorder::default();
    discovery_result(&mut client, &mut handler, discovered(false, true));

    assert_eq!(
        handler.take(),
        vec![Upcall::DiscoveryFailed(Error::CharacteristicNotFound)]
    );
    assert!(client.handles().is_none());
    assert_eq!(
        requests(&mut client),
        vec![Request::Disconnect(conn(), DisconnectReason::RemoteUserTerminatedConn)]
    );
    assert_eq!(client.state(), ConnectionState::Disconnecting);
    assert_eq!(
        client.write(&LED, &[0x01]),
        Err(ClientError::Client(Error::NotConnected))
    );

    client.process(
        Event::Disconnected {
            handle: conn(),
            reason: ErrorCode::ConnectionTerminatedByLocalHost,
        },
        &mut handler,
    );
    assert_eq!(requests(&mut client), vec![Request::StartScan]);
    assert!(client.is_scanning());
}

#[test]
fn missing_cccd_drops_the_link() {
    let mut client = client();
    let mut handler = Recorder::default();
    discovery_result(&mut client, &mut handler, discovered(true, false));

    assert_eq!(handler.take(), vec![Upcall::DiscoveryFailed(Error::CccdNotFound)]);
    assert_eq!(Error::CccdNotFound.kind(), ErrorKind::ProtocolViolation);
    assert!(client.handles().is_none());
    assert!(client.subscription_state(&BUTTON).is_none());
}

#[test]
fn wrong_service_drops_the_link() {
    let mut client = client();
    let mut handler = Recorder::default();
    let mut service = discovered(true, true);
    service.uuid = Uuid::new_short(0x180f);
    discovery_result(&mut client, &mut handler, service);

    assert_eq!(handler.take(), vec![Upcall::DiscoveryFailed(Error::ServiceValidation)]);
    assert_eq!(
        requests(&mut client),
        vec![Request::Disconnect(conn(), DisconnectReason::RemoteUserTerminatedConn)]
    );
}

#[test]
fn service_not_found_drops_the_link() {
    let mut client = client();
    let mut handler = Recorder::default();
    connect(&mut client, &mut handler);
    requests(&mut client);
    handler.take();

    client.process(Event::ServiceNotFound { handle: conn() }, &mut handler);
    assert_eq!(handler.take(), vec![Upcall::DiscoveryFailed(Error::DiscoveryFailed)]);
    assert_eq!(
        requests(&mut client),
        vec![Request::Disconnect(conn(), DisconnectReason::RemoteUserTerminatedConn)]
    );
}

#[test]
fn discovery_result_is_applied_once() {
    let mut client = client();
    let mut handler = Recorder::default();
    connect_and_subscribe(&mut client, &mut handler);

    client.process(
        Event::DiscoveryComplete {
            handle: conn(),
            service: discovered(true, true),
        },
        &mut handler,
    );
    assert!(handler.take().is_empty());
    assert!(requests(&mut client).is_empty());
    assert_eq!(client.subscription_state(&BUTTON), Some(SubscriptionState::Enabled));
}

#[test]
fn write_before_discovery_is_unresolved() {
    let mut client = client();
    let mut handler = Recorder::default();
    connect(&mut client, &mut handler);

    let err = client.write(&LED, &[0x01]).unwrap_err();
    assert_eq!(err, ClientError::Client(Error::NotResolved));
    assert_eq!(err.kind(), ErrorKind::Unconnected);
    assert!(!client.write_pending());
}

#[test]
fn write_guard_allows_one_write() {
    let mut client = client();
    let mut handler = Recorder::default();
    connect_and_subscribe(&mut client, &mut handler);

    client.write(&LED, &[0x01]).unwrap();
    assert!(client.write_pending());
    assert_eq!(
        client.write(&LED, &[0x00]),
        Err(ClientError::Client(Error::WriteAlreadyPending))
    );
    assert_eq!(requests(&mut client), vec![Request::Write(conn(), LED_VALUE, vec![0x01])]);

    client.process(
        Event::WriteComplete {
            handle: conn(),
            result: Ok(()),
        },
        &mut handler,
    );
    assert_eq!(handler.take(), vec![Upcall::WriteComplete(LED, Ok(()), vec![0x01])]);
    assert!(!client.write_pending());

    client.write(&LED, &[0x00]).unwrap();
    client.process(
        Event::WriteComplete {
            handle: conn(),
            result: Err(AttErrorCode::WRITE_NOT_PERMITTED),
        },
        &mut handler,
    );
    assert_eq!(
        handler.take(),
        vec![Upcall::WriteComplete(
            LED,
            Err(AttErrorCode::WRITE_NOT_PERMITTED),
            vec![0x00]
        )]
    );
    assert!(!client.write_pending());
    client.write(&LED, &[0x01]).unwrap();
}

#[test]
fn completion_without_write_is_ignored() {
    let mut client = client();
    let mut handler = Recorder::default();
    connect_and_subscribe(&mut client, &mut handler);

    client.process(
        Event::WriteComplete {
            handle: conn(),
            result: Ok(()),
        },
        &mut handler,
    );
    assert!(handler.take().is_empty());
}

#[test]
fn refused_write_releases_the_guard() {
    let mut client = client();
    let mut handler = Recorder::default();
    connect_and_subscribe(&mut client, &mut handler);

    client.transport_mut().refuse_write = true;
    let err = client.write(&LED, &[0x01]).unwrap_err();
    assert_eq!(err, ClientError::Transport(Refused));
    assert_eq!(err.kind(), ErrorKind::Transport);
    assert!(!client.write_pending());

    client.transport_mut().refuse_write = false;
    client.write(&LED, &[0x01]).unwrap();
    assert!(client.write_pending());
}

#[test]
fn write_argument_errors() {
    let mut client = client();
    let mut handler = Recorder::default();
    connect_and_subscribe(&mut client, &mut handler);

    assert_eq!(
        client.write(&Uuid::new_short(0x2a00), &[0x01]),
        Err(ClientError::Client(Error::UnknownCharacteristic))
    );
    assert_eq!(
        client.write(&LED, &[0u8; 245]),
        Err(ClientError::Client(Error::PayloadTooLarge))
    );
    assert!(!client.write_pending());
    assert!(requests(&mut client).is_empty());
}

#[test]
fn subscribing_twice_is_a_guard_violation() {
    let mut client = client();
    let mut handler = Recorder::default();
    discovery_result(&mut client, &mut handler, discovered(true, true));
    assert_eq!(client.subscription_state(&BUTTON), Some(SubscriptionState::Pending));

    assert_eq!(
        client.subscribe(&BUTTON),
        Err(ClientError::Client(Error::AlreadySubscribed))
    );
    assert_eq!(client.subscription_state(&BUTTON), Some(SubscriptionState::Pending));
    assert_eq!(
        requests(&mut client),
        vec![Request::Subscribe(conn(), BUTTON_VALUE, BUTTON_CCCD)]
    );
}

#[test]
fn refused_subscription_can_be_retried() {
    let mut client = client();
    let mut handler = Recorder::default();
    discovery_result(&mut client, &mut handler, discovered(true, true));
    requests(&mut client);
    handler.take();

    client.process(
        Event::SubscribeComplete {
            handle: conn(),
            value_handle: BUTTON_VALUE,
            result: Err(AttErrorCode::INSUFFICIENT_AUTHENTICATION),
        },
        &mut handler,
    );
    assert_eq!(
        handler.take(),
        vec![Upcall::SubscribeFailed(BUTTON, AttErrorCode::INSUFFICIENT_AUTHENTICATION)]
    );
    assert_eq!(client.subscription_state(&BUTTON), Some(SubscriptionState::Disabled));

    client.subscribe(&BUTTON).unwrap();
    assert_eq!(
        requests(&mut client),
        vec![Request::Subscribe(conn(), BUTTON_VALUE, BUTTON_CCCD)]
    );
    assert_eq!(client.subscription_state(&BUTTON), Some(SubscriptionState::Pending));
}

#[test]
fn transport_refusing_subscription_rolls_back() {
    let transport = MockTransport {
        refuse_subscribe: true,
        ..Default::default()
    };
    let mut client = client_with(ClientConfig::new(PROFILE), transport);
    let mut handler = Recorder::default();
    discovery_result(&mut client, &mut handler, discovered(true, true));

    assert_eq!(client.subscription_state(&BUTTON), Some(SubscriptionState::Disabled));
    assert_eq!(client.subscribe(&BUTTON), Err(ClientError::Transport(Refused)));
    assert_eq!(client.subscription_state(&BUTTON), Some(SubscriptionState::Disabled));
}

#[test]
fn subscribe_on_discovery_can_be_turned_off() {
    let mut config = ClientConfig::new(PROFILE);
    config.subscribe_on_discovery = false;
    let mut client = client_with(config, MockTransport::default());
    let mut handler = Recorder::default();
    discovery_result(&mut client, &mut handler, discovered(true, true));

    assert_eq!(handler.take(), vec![Upcall::DiscoveryComplete]);
    assert!(requests(&mut client).is_empty());
    assert_eq!(client.subscription_state(&BUTTON), Some(SubscriptionState::Disabled));

    assert_eq!(
        client.subscribe(&LED),
        Err(ClientError::Client(Error::NotNotifiable))
    );
    client.subscribe(&BUTTON).unwrap();
    assert_eq!(
        requests(&mut client),
        vec![Request::Subscribe(conn(), BUTTON_VALUE, BUTTON_CCCD)]
    );
}

#[test]
fn notifications_are_delivered_in_order() {
    let mut client = client();
    let mut handler = Recorder::default();
    connect_and_subscribe(&mut client, &mut handler);

    client.process(Event::notification(conn(), BUTTON_VALUE, &[0x01]), &mut handler);
    client.process(Event::notification(conn(), BUTTON_VALUE, &[]), &mut handler);
    client.process(Event::notification(conn(), BUTTON_VALUE, &[0x00]), &mut handler);
    // Not a subscribed characteristic.
    client.process(Event::notification(conn(), LED_VALUE, &[0x07]), &mut handler);

    assert_eq!(
        handler.take(),
        vec![
            Upcall::Notification(BUTTON, vec![0x01]),
            Upcall::Notification(BUTTON, vec![]),
            Upcall::Notification(BUTTON, vec![0x00]),
        ]
    );
}

#[test]
fn peer_turning_notifications_off() {
    let mut client = client();
    let mut handler = Recorder::default();
    connect_and_subscribe(&mut client, &mut handler);

    client.process(
        Event::Notification {
            handle: conn(),
            value_handle: BUTTON_VALUE,
            data: None,
        },
        &mut handler,
    );
    assert_eq!(handler.take(), vec![Upcall::Unsubscribed(BUTTON)]);
    assert_eq!(client.subscription_state(&BUTTON), Some(SubscriptionState::Disabled));
    assert!(requests(&mut client).is_empty());

    client.process(Event::notification(conn(), BUTTON_VALUE, &[0x01]), &mut handler);
    assert!(handler.take().is_empty());
}

#[test]
fn handler_can_stop_notifications() {
    let mut client = client();
    let mut handler = Recorder {
        stop_after: Some(2),
        ..Default::default()
    };
    connect_and_subscribe(&mut client, &mut handler);

    client.process(Event::notification(conn(), BUTTON_VALUE, &[0x01]), &mut handler);
    assert!(requests(&mut client).is_empty());
    client.process(Event::notification(conn(), BUTTON_VALUE, &[0x00]), &mut handler);
    assert_eq!(
        handler.take(),
        vec![
            Upcall::Notification(BUTTON, vec![0x01]),
            Upcall::Notification(BUTTON, vec![0x00]),
            Upcall::Unsubscribed(BUTTON),
        ]
    );
    assert_eq!(
        requests(&mut client),
        vec![Request::Unsubscribe(conn(), BUTTON_VALUE, BUTTON_CCCD)]
    );
    assert_eq!(client.subscription_state(&BUTTON), Some(SubscriptionState::Disabled));
}

#[test]
fn explicit_unsubscribe() {
    let mut client = client();
    let mut handler = Recorder::default();
    connect_and_subscribe(&mut client, &mut handler);

    client.unsubscribe(&BUTTON).unwrap();
    assert_eq!(
        requests(&mut client),
        vec![Request::Unsubscribe(conn(), BUTTON_VALUE, BUTTON_CCCD)]
    );
    assert_eq!(client.subscription_state(&BUTTON), Some(SubscriptionState::Disabled));
    assert_eq!(
        client.unsubscribe(&BUTTON),
        Err(ClientError::Client(Error::NotSubscribed))
    );
    assert!(handler.take().is_empty());

    client.subscribe(&BUTTON).unwrap();
    assert_eq!(client.subscription_state(&BUTTON), Some(SubscriptionState::Pending));
}

#[test]
fn discovery_error_drops_the_link() {
    let mut client = client();
    let mut handler = Recorder::default();
    connect(&mut client, &mut handler);
    requests(&mut client);
    handler.take();

    client.process(
        Event::DiscoveryError {
            handle: conn(),
            code: AttErrorCode::UNLIKELY_ERROR,
        },
        &mut handler,
    );
    assert_eq!(handler.take(), vec![Upcall::DiscoveryFailed(Error::DiscoveryFailed)]);
    assert_eq!(
        requests(&mut client),
        vec![Request::Disconnect(conn(), DisconnectReason::RemoteUserTerminatedConn)]
    );
    assert_eq!(client.state(), ConnectionState::Disconnecting);
}

#[test]
fn late_discovery_failure_keeps_the_link() {
    let mut client = client();
    let mut handler = Recorder::default();
    connect_and_subscribe(&mut client, &mut handler);

    client.process(
        Event::DiscoveryError {
            handle: conn(),
            code: AttErrorCode::UNLIKELY_ERROR,
        },
        &mut handler,
    );
    client.process(Event::ServiceNotFound { handle: conn() }, &mut handler);

    assert!(handler.take().is_empty());
    assert!(requests(&mut client).is_empty());
    assert_eq!(client.state(), ConnectionState::Ready);
    assert!(client.handles().is_some());
    assert_eq!(client.subscription_state(&BUTTON), Some(SubscriptionState::Enabled));
}

#[test]
fn discovery_failure_before_discovery_is_ignored() {
    let mut client = client();
    let mut handler = Recorder::default();
    client.start_scan().unwrap();
    client.process(advertisement(peer(), &SERVICE), &mut handler);
    client.process(
        Event::Connected {
            handle: conn(),
            peer: peer(),
            status: ErrorCode::Okay,
        },
        &mut handler,
    );
    requests(&mut client);
    handler.take();

    client.process(Event::ServiceNotFound { handle: conn() }, &mut handler);
    assert!(handler.take().is_empty());
    assert!(requests(&mut client).is_empty());
    assert_eq!(client.state(), ConnectionState::SecurityPending);

    // Discovery still starts once security settles.
    client.process(
        Event::SecurityChanged {
            handle: conn(),
            level: SecurityLevel::EncryptedAuthenticated,
            result: Ok(()),
        },
        &mut handler,
    );
    assert_eq!(requests(&mut client), vec![Request::Discover(conn(), SERVICE)]);
}

#[test]
fn refused_teardown_after_failed_validation_releases_the_link() {
    let mut client = client();
    let mut handler = Recorder::default();
    connect(&mut client, &mut handler);
    requests(&mut client);
    handler.take();

    client.transport_mut().refuse_disconnect = true;
    client.process(
        Event::DiscoveryComplete {
            handle: conn(),
            service: discovered(false, true),
        },
        &mut handler,
    );
    assert_eq!(
        handler.take(),
        vec![
            Upcall::DiscoveryFailed(Error::CharacteristicNotFound),
            Upcall::Disconnected(conn(), ErrorCode::ConnectionTerminatedByLocalHost),
        ]
    );
    assert_eq!(client.state(), ConnectionState::Idle);
    assert!(client.handles().is_none());
    assert!(client.is_scanning());
    assert_eq!(requests(&mut client), vec![Request::StartScan]);
    assert_eq!(client.disconnect(), Err(ClientError::Client(Error::NotConnected)));
}
