//! Commands used by the manager actor.

use super::context::{ContextId, ContextStatus};
use crate::bearer::{Bearer, BearerSet};
use crate::error::Result;
use crate::event::EventSink;
use crate::transport::{Link, LinkUpdate};
use std::fmt;
use std::sync::Arc;
use tokio::sync::oneshot;

/// A link delivered by a successful connection attempt, together with the
/// bearer that carried it.
///
/// 成功的连接尝试所交付的链路，以及承载它的bearer。
#[derive(Debug)]
pub(crate) struct ConnectedLink {
    pub(crate) bearer: Bearer,
    pub(crate) link: Box<dyn Link>,
}

/// Commands sent to the manager actor.
///
/// This enum encapsulates all operations on the manager: API calls coming
/// from the `Connline` and `Context` handles, and internal notifications
/// from the attempt and monitor tasks the actor spawns.
///
/// 发送到管理器 actor 的命令。
///
/// 此枚举封装了对管理器的所有操作：来自 `Connline` 和 `Context` 句柄的
/// API调用，以及 actor 所派生的尝试任务与监视任务的内部通知。
pub(crate) enum ManagerCommand {
    /// Command from the public API to create a new context.
    /// 来自公共API的命令，用于创建一个新上下文。
    NewContext {
        bearers: BearerSet,
        response_tx: oneshot::Sender<Result<ContextId>>,
    },
    /// Command from the public API to register or replace a context's sink.
    /// 来自公共API的命令，用于注册或替换上下文的事件接收器。
    SetSink {
        id: ContextId,
        sink: Arc<dyn EventSink>,
        response_tx: oneshot::Sender<Result<()>>,
    },
    /// Command from the public API to start a connection attempt. For a
    /// blocking open the response resolves with the attempt's outcome; for a
    /// background open it resolves once the attempt is scheduled.
    ///
    /// 来自公共API的命令，用于发起连接尝试。阻塞式打开的响应在尝试得出
    /// 结果时完成；后台打开的响应在尝试被调度后立即完成。
    Open {
        id: ContextId,
        blocking: bool,
        response_tx: oneshot::Sender<Result<()>>,
    },
    /// Command from the public API to close a context.
    /// 来自公共API的命令，用于关闭上下文。
    Close {
        id: ContextId,
        response_tx: oneshot::Sender<Result<()>>,
    },
    /// Command from the public API to destroy a context that is not open.
    /// 来自公共API的命令，用于销毁未打开的上下文。
    Destroy {
        id: ContextId,
        response_tx: oneshot::Sender<Result<()>>,
    },
    /// Command from the public API to snapshot a context's state.
    /// 来自公共API的命令，用于获取上下文状态的快照。
    Status {
        id: ContextId,
        response_tx: oneshot::Sender<Result<ContextStatus>>,
    },
    /// Command from the public API to stop the manager.
    /// 来自公共API的命令，用于停止管理器。
    Shutdown {
        response_tx: oneshot::Sender<Result<()>>,
    },
    /// Internal notification from an attempt task with the outcome of a
    /// connection attempt.
    /// 来自尝试任务的内部通知，携带连接尝试的结果。
    AttemptFinished {
        id: ContextId,
        seq: u64,
        outcome: Result<ConnectedLink>,
    },
    /// Internal notification from a monitor task with an update from an
    /// established link.
    /// 来自监视任务的内部通知，携带已建立链路的更新。
    LinkEvent {
        id: ContextId,
        seq: u64,
        update: LinkUpdate,
    },
}

// Hand-rolled because `Arc<dyn EventSink>` carries no `Debug` bound.
impl fmt::Debug for ManagerCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ManagerCommand::NewContext { bearers, .. } => f
                .debug_struct("NewContext")
                .field("bearers", bearers)
                .finish_non_exhaustive(),
            ManagerCommand::SetSink { id, .. } => f
                .debug_struct("SetSink")
                .field("id", id)
                .finish_non_exhaustive(),
            ManagerCommand::Open { id, blocking, .. } => f
                .debug_struct("Open")
                .field("id", id)
                .field("blocking", blocking)
                .finish_non_exhaustive(),
            ManagerCommand::Close { id, .. } => {
                f.debug_struct("Close").field("id", id).finish_non_exhaustive()
            }
            ManagerCommand::Destroy { id, .. } => f
                .debug_struct("Destroy")
                .field("id", id)
                .finish_non_exhaustive(),
            ManagerCommand::Status { id, .. } => f
                .debug_struct("Status")
                .field("id", id)
                .finish_non_exhaustive(),
            ManagerCommand::Shutdown { .. } => {
                f.debug_struct("Shutdown").finish_non_exhaustive()
            }
            ManagerCommand::AttemptFinished { id, seq, outcome } => f
                .debug_struct("AttemptFinished")
                .field("id", id)
                .field("seq", seq)
                .field("ok", &outcome.is_ok())
                .finish(),
            ManagerCommand::LinkEvent { id, seq, update } => f
                .debug_struct("LinkEvent")
                .field("id", id)
                .field("seq", seq)
                .field("update", update)
                .finish(),
        }
    }
}
