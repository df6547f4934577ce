//! Events delivered to a context's sink, and the sink trait itself.
//!
//! 传递给上下文事件接收器的事件，以及接收器 trait 本身。

use crate::error::ErrorKind;
use crate::manager::Context;
use async_trait::async_trait;
use std::fmt;

/// Property key carrying the bearer name of the established connection.
pub const PROPERTY_BEARER: &str = "bearer";
/// Property key carrying the network interface name (`eth0`, `wlan0`, ...).
pub const PROPERTY_INTERFACE: &str = "interface";
/// Property key carrying the address list of the connection.
pub const PROPERTY_ADDRESS: &str = "address";

/// An ordered list of key/value properties describing a live connection.
///
/// Keys keep their first-insertion position. Inserting an existing key
/// appends the new value to the old one, separated by a comma, so an IPv4
/// address followed by an IPv6 address on the same key reads
/// `"192.0.2.5,2001:db8::1"`.
///
/// 描述活动连接的有序键值属性列表。
///
/// 键保持首次插入时的位置。插入已存在的键会将新值以逗号追加到旧值之后。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Properties {
    entries: Vec<(String, String)>,
}

impl Properties {
    /// Creates an empty property list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a property, merging into an existing key with a comma.
    /// Empty values are ignored.
    ///
    /// 插入属性，已存在的键以逗号合并。空值会被忽略。
    pub fn insert(&mut self, key: &str, value: &str) {
        if value.is_empty() {
            return;
        }
        if let Some((_, existing)) = self.entries.iter_mut().find(|(k, _)| k == key) {
            existing.push(',');
            existing.push_str(value);
        } else {
            self.entries.push((key.to_string(), value.to_string()));
        }
    }

    /// The value stored under `key`, if any.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Iterates over the properties in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// The number of distinct keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the list holds no properties.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A state transition or update reported to a context's event sink.
///
/// 报告给上下文事件接收器的状态转换或更新。
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// The context failed to connect, or its connection failed.
    /// 上下文连接失败，或其连接出现故障。
    Error(ErrorKind),
    /// The context reached the connected state.
    /// 上下文进入已连接状态。
    Connected,
    /// The context left the connected state.
    /// 上下文离开已连接状态。
    Disconnected,
    /// Properties of the established connection changed.
    /// 已建立连接的属性发生了变化。
    PropertyChanged(Properties),
}

impl Event {
    /// The numeric class of this event.
    pub fn kind(&self) -> EventKind {
        match self {
            Event::Error(ErrorKind::NoTransport) => EventKind::NoTransport,
            Event::Error(_) => EventKind::Error,
            Event::Disconnected => EventKind::Disconnected,
            Event::Connected => EventKind::Connected,
            Event::PropertyChanged(_) => EventKind::Property,
        }
    }
}

/// Numeric event classes, stable for logging and interop.
///
/// `NoTransport` is its own class rather than a plain error, so callers can
/// tell "nothing to try" apart from a transport that tried and failed.
///
/// 数值型事件类别，用于日志与互操作，取值保持稳定。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum EventKind {
    Error = 0,
    NoTransport = 1,
    Disconnected = 2,
    Connected = 3,
    Property = 4,
}

impl EventKind {
    /// The stable numeric code of this class.
    pub const fn code(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EventKind::Error => "error",
            EventKind::NoTransport => "no-transport",
            EventKind::Disconnected => "disconnected",
            EventKind::Connected => "connected",
            EventKind::Property => "property",
        };
        f.write_str(name)
    }
}

/// Receives a context's lifecycle events.
///
/// One sink is registered per context with [`Context::set_sink`]; methods
/// default to doing nothing, so implementors override only what they need.
/// Invocations for one context are strictly ordered and never overlap, and
/// the sink is free to call back into the API (`open`, `close`, ...) on the
/// handle it receives.
///
/// 接收上下文的生命周期事件。
///
/// 每个上下文通过 [`Context::set_sink`] 注册一个接收器；各方法默认不做任何
/// 事情，实现者只需覆盖所需的方法。同一上下文的调用严格有序且不会重叠，
/// 接收器可以在收到的句柄上自由地回调API（`open`、`close` 等）。
#[async_trait]
pub trait EventSink: Send + Sync + 'static {
    /// The context failed to connect, or an established connection failed.
    /// 上下文连接失败，或已建立的连接出现故障。
    async fn on_error(&self, _context: Context, _kind: ErrorKind) {}

    /// The context is connected.
    /// 上下文已连接。
    async fn on_connected(&self, _context: Context) {}

    /// The context is no longer connected.
    /// 上下文不再处于连接状态。
    async fn on_disconnected(&self, _context: Context) {}

    /// The connection's properties changed. The first entry is always the
    /// `bearer` carrying the connection.
    /// 连接属性发生变化。第一个条目始终是承载该连接的 `bearer`。
    async fn on_property(&self, _context: Context, _properties: Properties) {}
}

/// A sink that ignores every event.
/// 忽略所有事件的接收器。
#[derive(Debug, Default, Clone, Copy)]
pub struct NopSink;

#[async_trait]
impl EventSink for NopSink {}
