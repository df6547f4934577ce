//! The user-facing manager API.

use super::command::ManagerCommand;
use super::context::Context;
use super::event_loop::ManagerEventLoop;
use crate::bearer::BearerSet;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::transport::Connector;
use crate::transport::registry::ConnectorRegistry;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::info;

/// A handle to a running connection manager.
///
/// `Connline` owns the registered connectors and every context created from
/// it. Handles are cheap clones sharing one manager; the manager stops when
/// [`Connline::shutdown`] succeeds, or when every handle (including every
/// [`Context`]) has been dropped.
///
/// 指向运行中连接管理器的句柄。
///
/// `Connline` 拥有已注册的连接器以及由它创建的所有上下文。句柄是共享同一
/// 管理器的廉价克隆；当 [`Connline::shutdown`] 成功，或所有句柄（包括所有
/// [`Context`]）都被丢弃时，管理器停止。
#[derive(Debug, Clone)]
pub struct Connline {
    command_tx: mpsc::Sender<ManagerCommand>,
}

impl Connline {
    /// Starts a manager with the given configuration and connectors.
    ///
    /// Connector order is priority order: an open tries the eligible
    /// connectors in the order given here. Fails with `Error::Init` on an
    /// invalid configuration or an empty connector list. Must be called
    /// from within a Tokio runtime.
    ///
    /// 以给定的配置和连接器启动一个管理器。
    ///
    /// 连接器的顺序即优先级顺序：每次打开都按此顺序尝试符合条件的连接器。
    /// 配置无效或连接器列表为空时以 `Error::Init` 失败。必须在 Tokio
    /// 运行时内调用。
    pub fn start(config: Config, connectors: Vec<Arc<dyn Connector>>) -> Result<Self> {
        config.validate()?;
        let registry = ConnectorRegistry::new(connectors);
        if registry.is_empty() {
            return Err(Error::Init("at least one connector is required"));
        }

        let (command_tx, command_rx) = mpsc::channel(config.command_channel_capacity);
        let event_loop =
            ManagerEventLoop::new(config, registry, command_rx, command_tx.downgrade());

        info!("Connection manager created and running");
        tokio::spawn(event_loop.run());

        Ok(Self { command_tx })
    }

    /// Creates a new context restricted to `bearers`.
    ///
    /// The context starts in the `Created` state with no sink and no
    /// transport activity. Fails with `AllocationFailure` once
    /// `max_contexts` contexts are live.
    ///
    /// 创建一个仅限于 `bearers` 的新上下文。
    ///
    /// 上下文以 `Created` 状态开始，没有接收器，也没有传输活动。存活上下文
    /// 达到 `max_contexts` 后以 `AllocationFailure` 失败。
    pub async fn context(&self, bearers: BearerSet) -> Result<Context> {
        let (response_tx, response_rx) = oneshot::channel();
        let cmd = ManagerCommand::NewContext {
            bearers,
            response_tx,
        };
        self.command_tx
            .send(cmd)
            .await
            .map_err(|_| Error::ChannelClosed)?;
        let id = response_rx.await.map_err(|_| Error::ChannelClosed)??;
        Ok(Context {
            id,
            command_tx: self.command_tx.clone(),
        })
    }

    /// Stops the manager.
    ///
    /// Fails with `ContextStillOpen` while any context is connecting or
    /// connected; close them first. On success every remaining context is
    /// released and later operations on any handle report `ChannelClosed`.
    ///
    /// 停止管理器。
    ///
    /// 只要有上下文正在连接或已连接，就以 `ContextStillOpen` 失败；请先
    /// 关闭它们。成功后所有剩余上下文被释放，此后任何句柄上的操作都会报告
    /// `ChannelClosed`。
    pub async fn shutdown(&self) -> Result<()> {
        let (response_tx, response_rx) = oneshot::channel();
        self.command_tx
            .send(ManagerCommand::Shutdown { response_tx })
            .await
            .map_err(|_| Error::ChannelClosed)?;
        response_rx.await.map_err(|_| Error::ChannelClosed)?
    }
}
