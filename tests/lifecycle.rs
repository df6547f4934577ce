//! 完整上下文生命周期的端到端测试：创建、打开、关闭、销毁与停机。
//! End-to-end tests of the full context lifecycle: create, open, close,
//! destroy and shutdown.

pub mod common;

use common::harness::{RecordingSink, assert_quiet, init_tracing, next_event};
use connline::bearer::{Bearer, BearerSet};
use connline::config::Config;
use connline::error::{Error, ErrorKind};
use connline::event::{
    Event, NopSink, PROPERTY_ADDRESS, PROPERTY_BEARER, PROPERTY_INTERFACE, Properties,
};
use connline::manager::{Connline, ContextState};
use connline::transport::{SimConnector, SimOutcome};
use std::sync::Arc;

#[tokio::test(start_paused = true)]
async fn open_with_no_eligible_transport_fails_and_closes() {
    init_tracing();

    let (cellular, _control) = SimConnector::new(Bearer::Cellular);
    let manager = Connline::start(Config::default(), vec![cellular]).unwrap();

    // ethernet|wifi 的原始掩码。
    // The raw mask for ethernet|wifi.
    let bearers = BearerSet::from_bits(0b0110).unwrap();
    let ctx = manager.context(bearers).await.unwrap();
    let (sink, mut events) = RecordingSink::new();
    ctx.set_sink(sink).await.unwrap();

    let err = ctx.open().await.unwrap_err();
    assert!(matches!(err, Error::NoTransportAvailable));

    // Exactly one error callback, carrying the no-transport class.
    let (id, event) = next_event(&mut events).await;
    assert_eq!(id, ctx.id());
    assert_eq!(event, Event::Error(ErrorKind::NoTransport));
    assert_quiet(&mut events).await;

    assert_eq!(ctx.state().await.unwrap(), ContextState::Closed);
}

#[tokio::test(start_paused = true)]
async fn connect_properties_close_sequence() {
    init_tracing();

    let (wifi, mut control) = SimConnector::new(Bearer::Wifi);
    let manager = Connline::start(Config::default(), vec![wifi]).unwrap();

    let ctx = manager
        .context(Bearer::Ethernet | Bearer::Wifi)
        .await
        .unwrap();
    let (sink, mut events) = RecordingSink::new();
    ctx.set_sink(sink).await.unwrap();

    control.enqueue(SimOutcome::Connect).await;
    ctx.open().await.unwrap();

    // Connected arrives first, before any property event.
    assert_eq!(next_event(&mut events).await.1, Event::Connected);
    assert!(ctx.is_online().await.unwrap());
    assert_eq!(ctx.bearer().await.unwrap(), Some(Bearer::Wifi));

    let mut link = control.next_link().await.unwrap();
    let mut update = Properties::new();
    update.insert(PROPERTY_INTERFACE, "wlan0");
    update.insert(PROPERTY_ADDRESS, "192.0.2.5");
    link.update(update);

    let (_, event) = next_event(&mut events).await;
    let Event::PropertyChanged(props) = event else {
        panic!("expected a property event, got {event:?}");
    };
    let pairs: Vec<(&str, &str)> = props.iter().collect();
    assert_eq!(
        pairs,
        vec![
            (PROPERTY_BEARER, "wifi"),
            (PROPERTY_INTERFACE, "wlan0"),
            (PROPERTY_ADDRESS, "192.0.2.5"),
        ]
    );

    ctx.close().await.unwrap();
    assert_eq!(next_event(&mut events).await.1, Event::Disconnected);
    assert_quiet(&mut events).await;

    // The manager tore the link down on close.
    link.closed().await;
    assert_eq!(ctx.state().await.unwrap(), ContextState::Closed);
}

#[tokio::test(start_paused = true)]
async fn repeated_property_keys_merge_with_commas() {
    init_tracing();

    let (wifi, mut control) = SimConnector::new(Bearer::Wifi);
    let manager = Connline::start(Config::default(), vec![wifi]).unwrap();
    let ctx = manager.context(BearerSet::ANY).await.unwrap();
    let (sink, mut events) = RecordingSink::new();
    ctx.set_sink(sink).await.unwrap();

    control.enqueue(SimOutcome::Connect).await;
    ctx.open().await.unwrap();
    assert_eq!(next_event(&mut events).await.1, Event::Connected);

    let link = control.next_link().await.unwrap();
    let mut update = Properties::new();
    update.insert(PROPERTY_ADDRESS, "192.0.2.5");
    update.insert(PROPERTY_ADDRESS, "2001:db8::1");
    link.update(update);

    let (_, event) = next_event(&mut events).await;
    let Event::PropertyChanged(props) = event else {
        panic!("expected a property event, got {event:?}");
    };
    assert_eq!(props.get(PROPERTY_BEARER), Some("wifi"));
    assert_eq!(props.get(PROPERTY_ADDRESS), Some("192.0.2.5,2001:db8::1"));

    ctx.close().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn close_is_idempotent() {
    init_tracing();

    let (wifi, control) = SimConnector::new(Bearer::Wifi);
    let manager = Connline::start(Config::default(), vec![wifi]).unwrap();
    let ctx = manager.context(BearerSet::ANY).await.unwrap();
    let (sink, mut events) = RecordingSink::new();
    ctx.set_sink(sink).await.unwrap();

    control.enqueue(SimOutcome::Connect).await;
    ctx.open().await.unwrap();
    assert_eq!(next_event(&mut events).await.1, Event::Connected);

    ctx.close().await.unwrap();
    ctx.close().await.unwrap();

    // 两次关闭最多产生一次断开事件。
    // Two closes produce at most one disconnected event.
    assert_eq!(next_event(&mut events).await.1, Event::Disconnected);
    assert_quiet(&mut events).await;
}

#[tokio::test(start_paused = true)]
async fn close_before_any_open_is_a_quiet_success() {
    init_tracing();

    let (wifi, _control) = SimConnector::new(Bearer::Wifi);
    let manager = Connline::start(Config::default(), vec![wifi]).unwrap();
    let ctx = manager.context(BearerSet::ANY).await.unwrap();
    let (sink, mut events) = RecordingSink::new();
    ctx.set_sink(sink).await.unwrap();

    ctx.close().await.unwrap();
    assert_eq!(ctx.state().await.unwrap(), ContextState::Created);
    assert_quiet(&mut events).await;
}

#[tokio::test(start_paused = true)]
async fn lost_connection_reports_error_then_disconnected() {
    init_tracing();

    let (wifi, mut control) = SimConnector::new(Bearer::Wifi);
    let manager = Connline::start(Config::default(), vec![wifi]).unwrap();
    let ctx = manager.context(BearerSet::ANY).await.unwrap();
    let (sink, mut events) = RecordingSink::new();
    ctx.set_sink(sink).await.unwrap();

    control.enqueue(SimOutcome::Connect).await;
    ctx.open().await.unwrap();
    assert_eq!(next_event(&mut events).await.1, Event::Connected);
    let link = control.next_link().await.unwrap();

    link.lose(ErrorKind::TransportLost);

    assert_eq!(
        next_event(&mut events).await.1,
        Event::Error(ErrorKind::TransportLost)
    );
    assert_eq!(next_event(&mut events).await.1, Event::Disconnected);
    assert_eq!(ctx.state().await.unwrap(), ContextState::Closed);

    // A lost context can be opened again.
    control.enqueue(SimOutcome::Connect).await;
    ctx.open().await.unwrap();
    assert_eq!(next_event(&mut events).await.1, Event::Connected);
    ctx.close().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn failed_context_can_reopen() {
    init_tracing();

    let (wifi, control) = SimConnector::new(Bearer::Wifi);
    let manager = Connline::start(Config::default(), vec![wifi]).unwrap();
    let ctx = manager.context(BearerSet::ANY).await.unwrap();
    let (sink, mut events) = RecordingSink::new();
    ctx.set_sink(sink).await.unwrap();

    control
        .enqueue(SimOutcome::Refuse(ErrorKind::AuthFailure))
        .await;
    assert!(matches!(
        ctx.open().await,
        Err(Error::TransportAuthFailure)
    ));
    assert_eq!(
        next_event(&mut events).await.1,
        Event::Error(ErrorKind::AuthFailure)
    );

    control.enqueue(SimOutcome::Connect).await;
    ctx.open().await.unwrap();
    assert_eq!(next_event(&mut events).await.1, Event::Connected);
    ctx.close().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn destroy_and_shutdown_require_closed_contexts() {
    init_tracing();

    let (wifi, control) = SimConnector::new(Bearer::Wifi);
    let manager = Connline::start(Config::default(), vec![wifi]).unwrap();
    let ctx = manager.context(BearerSet::ANY).await.unwrap();
    ctx.set_sink(Arc::new(NopSink)).await.unwrap();

    control.enqueue(SimOutcome::Connect).await;
    ctx.open().await.unwrap();

    assert!(matches!(ctx.destroy().await, Err(Error::ContextStillOpen)));
    assert!(matches!(
        manager.shutdown().await,
        Err(Error::ContextStillOpen)
    ));

    ctx.close().await.unwrap();
    ctx.destroy().await.unwrap();

    // Every clone of a destroyed handle reports UnknownContext.
    let clone = ctx.clone();
    assert!(matches!(clone.open().await, Err(Error::UnknownContext)));
    assert!(matches!(clone.status().await, Err(Error::UnknownContext)));

    manager.shutdown().await.unwrap();
    assert!(matches!(
        manager.context(BearerSet::ANY).await,
        Err(Error::ChannelClosed)
    ));
}

#[tokio::test(start_paused = true)]
async fn dropping_every_handle_tears_the_manager_down() {
    init_tracing();

    let (wifi, mut control) = SimConnector::new(Bearer::Wifi);
    let manager = Connline::start(Config::default(), vec![wifi]).unwrap();
    let ctx = manager.context(BearerSet::ANY).await.unwrap();

    control.enqueue(SimOutcome::Connect).await;
    ctx.open().await.unwrap();
    let mut link = control.next_link().await.unwrap();

    drop(ctx);
    drop(manager);

    // With no handles left the event loop stops and releases the link.
    link.closed().await;
}
