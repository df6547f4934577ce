//! Context handles and their lifecycle states.
//!
//! 上下文句柄及其生命周期状态。

use super::command::ManagerCommand;
use crate::bearer::Bearer;
use crate::error::{Error, Result};
use crate::event::EventSink;
use std::fmt;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

/// Identifies one context within its manager. Random and non-zero.
///
/// 在所属管理器内标识一个上下文。随机且非零。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContextId(pub(crate) u32);

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The lifecycle states of a context.
///
/// 上下文的生命周期状态。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextState {
    /// Created and never opened. No transport activity yet.
    /// 已创建且从未打开。尚无任何传输活动。
    Created,
    /// A connection attempt is in flight.
    /// 一次连接尝试正在进行。
    Connecting,
    /// A connection is established and being monitored.
    /// 连接已建立并处于监视之中。
    Connected,
    /// Not connected: the attempt failed, the connection was lost, or the
    /// context was closed. A closed context can be opened again.
    ///
    /// 未连接：尝试失败、连接丢失或上下文已被关闭。关闭的上下文可以再次打开。
    Closed,
}

impl ContextState {
    /// Whether this state counts as open (attempting or established).
    /// 该状态是否视为打开（正在尝试或已建立）。
    pub const fn is_open(self) -> bool {
        matches!(self, ContextState::Connecting | ContextState::Connected)
    }

    /// The lower-case name of this state.
    pub const fn as_str(self) -> &'static str {
        match self {
            ContextState::Created => "created",
            ContextState::Connecting => "connecting",
            ContextState::Connected => "connected",
            ContextState::Closed => "closed",
        }
    }
}

impl fmt::Display for ContextState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A snapshot of a context's observable state.
///
/// 上下文可观测状态的快照。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextStatus {
    /// The lifecycle state at the time of the snapshot.
    /// 快照时刻的生命周期状态。
    pub state: ContextState,
    /// The bearer carrying the connection, while connected.
    /// 连接期间承载该连接的bearer。
    pub bearer: Option<Bearer>,
    /// Whether the context is currently connected.
    /// 上下文当前是否已连接。
    pub online: bool,
}

/// A handle to one managed connection context.
///
/// Handles are cheap clones; all state lives in the manager actor. Event
/// sinks receive a clone of this handle with every callback and may call
/// any method on it, including from inside the callback itself.
///
/// 指向一个受管连接上下文的句柄。
///
/// 句柄是廉价的克隆体；所有状态都保存在管理器 actor 中。事件接收器在每次
/// 回调时都会收到此句柄的克隆，并且可以在回调内部调用它的任何方法。
#[derive(Debug, Clone)]
pub struct Context {
    pub(crate) id: ContextId,
    pub(crate) command_tx: mpsc::Sender<ManagerCommand>,
}

impl Context {
    /// The identifier of this context.
    pub fn id(&self) -> ContextId {
        self.id
    }

    /// Registers `sink` for this context, replacing any previous sink.
    ///
    /// Replacement is ordered with event delivery: events queued before the
    /// replacement reach the old sink, later ones the new sink.
    ///
    /// 为此上下文注册 `sink`，替换之前的接收器。替换与事件投递保持有序：
    /// 在替换之前排队的事件送达旧接收器，之后的事件送达新接收器。
    pub async fn set_sink(&self, sink: Arc<dyn EventSink>) -> Result<()> {
        let (response_tx, response_rx) = oneshot::channel();
        let cmd = ManagerCommand::SetSink {
            id: self.id,
            sink,
            response_tx,
        };
        self.command_tx
            .send(cmd)
            .await
            .map_err(|_| Error::ChannelClosed)?;
        response_rx.await.map_err(|_| Error::ChannelClosed)?
    }

    /// Opens the context and waits for the outcome.
    ///
    /// Resolves with `Ok(())` once the context is connected. On failure the
    /// error carries the same class the sink sees, and a concurrent `close`
    /// resolves it with `AttemptCanceled`. Valid from the `Created` and
    /// `Closed` states; otherwise fails with `ContextStillOpen`.
    ///
    /// 打开上下文并等待结果。
    ///
    /// 上下文连接成功后以 `Ok(())` 完成。失败时错误携带与接收器所见相同的
    /// 类别；并发的 `close` 会使其以 `AttemptCanceled` 完成。仅在
    /// `Created` 和 `Closed` 状态下有效，否则以 `ContextStillOpen` 失败。
    pub async fn open(&self) -> Result<()> {
        self.open_inner(true).await
    }

    /// Opens the context in the background.
    ///
    /// Returns as soon as the attempt is scheduled; the outcome arrives
    /// through the sink.
    ///
    /// 在后台打开上下文。尝试被调度后立即返回；结果通过接收器送达。
    pub async fn open_background(&self) -> Result<()> {
        self.open_inner(false).await
    }

    async fn open_inner(&self, blocking: bool) -> Result<()> {
        let (response_tx, response_rx) = oneshot::channel();
        let cmd = ManagerCommand::Open {
            id: self.id,
            blocking,
            response_tx,
        };
        self.command_tx
            .send(cmd)
            .await
            .map_err(|_| Error::ChannelClosed)?;
        response_rx.await.map_err(|_| Error::ChannelClosed)?
    }

    /// Closes the context.
    ///
    /// An in-flight attempt is canceled and its events are suppressed; an
    /// established connection is torn down and the sink sees exactly one
    /// `disconnected` event. Closing a context that is not open does
    /// nothing and succeeds.
    ///
    /// 关闭上下文。
    ///
    /// 进行中的尝试会被取消且其事件被抑制；已建立的连接会被拆除，接收器
    /// 恰好收到一次 `disconnected` 事件。关闭未打开的上下文不做任何事并
    /// 返回成功。
    pub async fn close(&self) -> Result<()> {
        let (response_tx, response_rx) = oneshot::channel();
        let cmd = ManagerCommand::Close {
            id: self.id,
            response_tx,
        };
        self.command_tx
            .send(cmd)
            .await
            .map_err(|_| Error::ChannelClosed)?;
        response_rx.await.map_err(|_| Error::ChannelClosed)?
    }

    /// Destroys the context.
    ///
    /// The context must not be open, otherwise this fails with
    /// `ContextStillOpen`. Events already queued still drain to the sink;
    /// afterwards every clone of this handle reports `UnknownContext`.
    ///
    /// 销毁上下文。
    ///
    /// 上下文必须未处于打开状态，否则以 `ContextStillOpen` 失败。已排队的
    /// 事件仍会送达接收器；此后该句柄的所有克隆都会报告 `UnknownContext`。
    pub async fn destroy(&self) -> Result<()> {
        let (response_tx, response_rx) = oneshot::channel();
        let cmd = ManagerCommand::Destroy {
            id: self.id,
            response_tx,
        };
        self.command_tx
            .send(cmd)
            .await
            .map_err(|_| Error::ChannelClosed)?;
        response_rx.await.map_err(|_| Error::ChannelClosed)?
    }

    /// A snapshot of the context's state, bearer and online flag.
    /// 上下文状态、承载与在线标志的快照。
    pub async fn status(&self) -> Result<ContextStatus> {
        let (response_tx, response_rx) = oneshot::channel();
        let cmd = ManagerCommand::Status {
            id: self.id,
            response_tx,
        };
        self.command_tx
            .send(cmd)
            .await
            .map_err(|_| Error::ChannelClosed)?;
        response_rx.await.map_err(|_| Error::ChannelClosed)?
    }

    /// The current lifecycle state.
    pub async fn state(&self) -> Result<ContextState> {
        Ok(self.status().await?.state)
    }

    /// Whether the context is currently connected.
    pub async fn is_online(&self) -> Result<bool> {
        Ok(self.status().await?.online)
    }

    /// The bearer carrying the connection, while connected.
    pub async fn bearer(&self) -> Result<Option<Bearer>> {
        Ok(self.status().await?.bearer)
    }
}
