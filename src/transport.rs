//! Transport seam between the lifecycle core and connectivity backends.
//!
//! This module defines the connector and link traits the manager drives.
//! The crate ships no OS-level backend: real backends implement these
//! traits, and the bundled [`sim`] backend provides a scriptable in-process
//! implementation for tests and demos.
//!
//! 生命周期核心与连接后端之间的传输接缝。
//!
//! 此模块定义由管理器驱动的连接器和链路 trait。本库不附带操作系统级后端：
//! 真实后端实现这些 trait，内置的 [`sim`] 后端则提供可脚本化的进程内实现，
//! 用于测试和演示。

pub(crate) mod registry;
pub mod sim;

use crate::bearer::Bearer;
use crate::error::{ErrorKind, Result};
use crate::event::Properties;
use async_trait::async_trait;
use std::fmt::Debug;

pub use sim::{SimConnector, SimControl, SimLinkHandle, SimOutcome};

/// A connectivity backend for one bearer technology.
///
/// Connectors are registered when the manager starts; each open tries the
/// eligible connectors in registration order until one produces a link.
///
/// 单一承载技术的连接后端。
///
/// 连接器在管理器启动时注册；每次打开都会按注册顺序尝试符合条件的连接器，
/// 直到其中之一产出链路。
#[async_trait]
pub trait Connector: Send + Sync + Debug + 'static {
    /// The bearer this connector provides.
    /// 此连接器提供的承载。
    fn bearer(&self) -> Bearer;

    /// A short name for logs.
    fn name(&self) -> &str;

    /// Attempts to establish a connection.
    ///
    /// Resolves to a live [`Link`] on success. Errors are classified with
    /// [`ErrorKind::classify`] before they reach the context's sink.
    ///
    /// 尝试建立连接。成功时解析为一个活动的 [`Link`]。错误在到达上下文的
    /// 接收器之前会经 [`ErrorKind::classify`] 分类。
    async fn connect(&self) -> Result<Box<dyn Link>>;
}

/// An established connection produced by a [`Connector`].
///
/// The manager monitors each link from a dedicated task and turns its
/// updates into context events.
///
/// 由 [`Connector`] 产出的已建立连接。
///
/// 管理器在专用任务中监视每条链路，并将其更新转化为上下文事件。
#[async_trait]
pub trait Link: Send + Debug + 'static {
    /// Waits for the next update from the transport.
    /// 等待来自传输层的下一个更新。
    async fn next_update(&mut self) -> LinkUpdate;

    /// Tears the connection down.
    /// 拆除该连接。
    async fn shutdown(&mut self);
}

/// An update reported by a live [`Link`].
/// 活动 [`Link`] 报告的更新。
#[derive(Debug, Clone)]
pub enum LinkUpdate {
    /// The connection's properties changed.
    /// 连接属性发生了变化。
    Properties(Properties),
    /// The connection was lost.
    /// 连接已丢失。
    Lost(ErrorKind),
}
