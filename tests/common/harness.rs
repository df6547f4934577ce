//! Shared test helpers: tracing setup, a recording sink and event waiters.
//! 共享测试辅助：tracing 初始化、记录接收器与事件等待函数。

use async_trait::async_trait;
use connline::error::ErrorKind;
use connline::event::{Event, EventSink, Properties};
use connline::manager::{Context, ContextId};
use std::sync::{Arc, Once};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing_subscriber::fmt::format::FmtSpan;

/// Initializes tracing for tests, ensuring it's only done once.
pub fn init_tracing() {
    static TRACING_INIT: Once = Once::new();
    TRACING_INIT.call_once(|| {
        let filter =
            std::env::var("RUST_LOG").unwrap_or_else(|_| "connline=debug".to_string());
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_span_events(FmtSpan::FULL)
            .with_test_writer()
            .init();
    });
}

/// A sink that forwards every callback, tagged with the id of the handle it
/// was invoked with, into a channel the test reads from.
pub struct RecordingSink {
    events: mpsc::UnboundedSender<(ContextId, Event)>,
}

impl RecordingSink {
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<(ContextId, Event)>) {
        let (events, rx) = mpsc::unbounded_channel();
        (Arc::new(Self { events }), rx)
    }
}

#[async_trait]
impl EventSink for RecordingSink {
    async fn on_error(&self, context: Context, kind: ErrorKind) {
        let _ = self.events.send((context.id(), Event::Error(kind)));
    }

    async fn on_connected(&self, context: Context) {
        let _ = self.events.send((context.id(), Event::Connected));
    }

    async fn on_disconnected(&self, context: Context) {
        let _ = self.events.send((context.id(), Event::Disconnected));
    }

    async fn on_property(&self, context: Context, properties: Properties) {
        let _ = self
            .events
            .send((context.id(), Event::PropertyChanged(properties)));
    }
}

/// Waits for the next recorded event.
pub async fn next_event(
    rx: &mut mpsc::UnboundedReceiver<(ContextId, Event)>,
) -> (ContextId, Event) {
    timeout(Duration::from_secs(1), rx.recv())
        .await
        .expect("timed out waiting for an event")
        .expect("event channel closed")
}

/// Asserts that no further event reaches the sink.
pub async fn assert_quiet(rx: &mut mpsc::UnboundedReceiver<(ContextId, Event)>) {
    match timeout(Duration::from_millis(100), rx.recv()).await {
        Err(_) | Ok(None) => {}
        Ok(Some(event)) => panic!("unexpected event: {event:?}"),
    }
}
