//! The implementation of the manager actor.
//!
//! 管理器 actor 的实现。

use super::command::{ConnectedLink, ManagerCommand};
use super::context::{ContextId, ContextState, ContextStatus};
use super::dispatch::{self, DispatchItem};
use crate::bearer::{Bearer, BearerSet};
use crate::config::Config;
use crate::error::{Error, ErrorKind, Result};
use crate::event::{Event, PROPERTY_BEARER, Properties};
use crate::transport::registry::ConnectorRegistry;
use crate::transport::{Connector, Link, LinkUpdate};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

/// State the actor keeps for one live context.
///
/// actor 为每个存活上下文保存的状态。
struct ContextEntry {
    bearers: BearerSet,
    state: ContextState,
    /// Feeds the context's dispatcher task.
    /// 馈送该上下文的分发器任务。
    dispatch_tx: mpsc::UnboundedSender<DispatchItem>,
    /// Bumped on every open and on every close of an open context.
    /// Notifications carrying an older value are discarded as stale.
    ///
    /// 在每次打开以及每次关闭打开的上下文时递增。携带旧值的通知会被视为
    /// 过期而丢弃。
    attempt_seq: u64,
    /// Cancels the in-flight attempt, if any.
    /// 取消进行中的尝试（如有）。
    attempt_cancel: Option<oneshot::Sender<()>>,
    /// Resolved with the attempt's outcome for a pending blocking open.
    /// 为挂起的阻塞式打开保存的、以尝试结果完成的应答端。
    open_waiter: Option<oneshot::Sender<Result<()>>>,
    /// Stops the monitor of the established link, if any.
    /// 停止已建立链路的监视任务（如有）。
    monitor_cancel: Option<oneshot::Sender<()>>,
    /// The bearer carrying the current connection.
    /// 承载当前连接的bearer。
    bearer: Option<Bearer>,
}

impl ContextEntry {
    /// Queues an event for delivery. Never blocks.
    fn enqueue(&self, event: Event) {
        // A failed send only happens while the dispatcher is already gone,
        // which means the whole manager is tearing down.
        let _ = self.dispatch_tx.send(DispatchItem::Deliver(event));
    }
}

/// The actor that owns every context and drives all state transitions.
///
/// It runs in a dedicated task and processes commands from the public
/// handles and from the attempt and monitor tasks it spawns, strictly in
/// arrival order. Command handling never awaits a sink or a connector, so
/// nothing outside the actor can stall it.
///
/// 拥有所有上下文并驱动全部状态转换的 actor。
///
/// 它运行在专用任务中，严格按到达顺序处理来自公共句柄以及自身派生的尝试
/// 任务和监视任务的命令。命令处理从不等待接收器或连接器，因此外部无法使
/// 其停顿。
pub(crate) struct ManagerEventLoop {
    config: Config,
    registry: ConnectorRegistry,
    contexts: HashMap<ContextId, ContextEntry>,
    command_rx: mpsc::Receiver<ManagerCommand>,
    /// Internal tasks hold downgraded clones of the command sender, so the
    /// loop still stops once every public handle is gone.
    ///
    /// 内部任务只持有命令发送端的降级克隆，因此当所有公共句柄消失后，
    /// 事件循环仍然能够停止。
    command_weak: mpsc::WeakSender<ManagerCommand>,
}

impl ManagerEventLoop {
    pub(crate) fn new(
        config: Config,
        registry: ConnectorRegistry,
        command_rx: mpsc::Receiver<ManagerCommand>,
        command_weak: mpsc::WeakSender<ManagerCommand>,
    ) -> Self {
        Self {
            config,
            registry,
            contexts: HashMap::new(),
            command_rx,
            command_weak,
        }
    }

    /// Runs the actor's main event loop.
    ///
    /// 运行 actor 的主事件循环。
    pub(crate) async fn run(mut self) {
        debug!(
            max_contexts = self.config.max_contexts,
            "Manager event loop running"
        );
        while let Some(command) = self.command_rx.recv().await {
            if !self.handle_command(command) {
                break;
            }
        }
        // Dropping the entries aborts attempt and monitor tasks and lets
        // every dispatcher drain its queue and stop.
        // 丢弃条目会中止尝试任务和监视任务，并让每个分发器清空队列后停止。
        let released = self.contexts.len();
        self.contexts.clear();
        debug!(released, "Manager event loop stopped");
    }

    /// Handles one command. Returns `false` when the loop should stop.
    ///
    /// 处理一条命令。返回 `false` 表示事件循环应当停止。
    fn handle_command(&mut self, command: ManagerCommand) -> bool {
        match command {
            ManagerCommand::NewContext {
                bearers,
                response_tx,
            } => {
                let _ = response_tx.send(self.handle_new_context(bearers));
            }
            ManagerCommand::SetSink {
                id,
                sink,
                response_tx,
            } => {
                let result = match self.contexts.get(&id) {
                    Some(entry) => {
                        debug!(ctx = %id, "Event sink replaced");
                        entry
                            .dispatch_tx
                            .send(DispatchItem::ReplaceSink(sink))
                            .map_err(|_| Error::ChannelClosed)
                    }
                    None => Err(Error::UnknownContext),
                };
                let _ = response_tx.send(result);
            }
            ManagerCommand::Open {
                id,
                blocking,
                response_tx,
            } => self.handle_open(id, blocking, response_tx),
            ManagerCommand::Close { id, response_tx } => {
                let _ = response_tx.send(self.handle_close(id));
            }
            ManagerCommand::Destroy { id, response_tx } => {
                let _ = response_tx.send(self.handle_destroy(id));
            }
            ManagerCommand::Status { id, response_tx } => {
                let result = match self.contexts.get(&id) {
                    Some(entry) => Ok(ContextStatus {
                        state: entry.state,
                        bearer: entry.bearer,
                        online: entry.state == ContextState::Connected,
                    }),
                    None => Err(Error::UnknownContext),
                };
                let _ = response_tx.send(result);
            }
            ManagerCommand::Shutdown { response_tx } => {
                if self.contexts.values().any(|entry| entry.state.is_open()) {
                    let _ = response_tx.send(Err(Error::ContextStillOpen));
                } else {
                    info!("Manager shut down");
                    let _ = response_tx.send(Ok(()));
                    return false;
                }
            }
            ManagerCommand::AttemptFinished { id, seq, outcome } => {
                self.handle_attempt_finished(id, seq, outcome);
            }
            ManagerCommand::LinkEvent { id, seq, update } => {
                self.handle_link_event(id, seq, update);
            }
        }
        true
    }

    fn handle_new_context(&mut self, bearers: BearerSet) -> Result<ContextId> {
        if self.contexts.len() >= self.config.max_contexts {
            return Err(Error::AllocationFailure);
        }

        let mut id = ContextId(rand::random());
        while id.0 == 0 || self.contexts.contains_key(&id) {
            id = ContextId(rand::random());
        }

        let dispatch_tx = dispatch::spawn_dispatcher(id, self.command_weak.clone());
        self.contexts.insert(
            id,
            ContextEntry {
                bearers,
                state: ContextState::Created,
                dispatch_tx,
                attempt_seq: 0,
                attempt_cancel: None,
                open_waiter: None,
                monitor_cancel: None,
                bearer: None,
            },
        );
        info!(ctx = %id, bearers = %bearers, "Context created");
        Ok(id)
    }

    fn handle_open(
        &mut self,
        id: ContextId,
        blocking: bool,
        response_tx: oneshot::Sender<Result<()>>,
    ) {
        let Some(entry) = self.contexts.get_mut(&id) else {
            let _ = response_tx.send(Err(Error::UnknownContext));
            return;
        };
        if entry.state.is_open() {
            let _ = response_tx.send(Err(Error::ContextStillOpen));
            return;
        }

        entry.attempt_seq += 1;
        entry.state = ContextState::Connecting;
        let (cancel_tx, cancel_rx) = oneshot::channel();
        entry.attempt_cancel = Some(cancel_tx);

        let eligible = self.registry.eligible(entry.bearers);
        info!(
            ctx = %id,
            bearers = %entry.bearers,
            eligible = eligible.len(),
            blocking,
            "Opening context"
        );

        if blocking {
            entry.open_waiter = Some(response_tx);
        } else {
            let _ = response_tx.send(Ok(()));
        }

        tokio::spawn(run_attempt(
            id,
            entry.attempt_seq,
            eligible,
            self.config.attempt_timeout,
            cancel_rx,
            self.command_weak.clone(),
        ));
    }

    fn handle_close(&mut self, id: ContextId) -> Result<()> {
        let Some(entry) = self.contexts.get_mut(&id) else {
            return Err(Error::UnknownContext);
        };
        match entry.state {
            ContextState::Connecting => {
                // The superseded attempt must produce no events, so the
                // sequence number is bumped before anything can arrive.
                // 被取代的尝试不得产生任何事件，因此先递增序号，使后续
                // 到达的通知全部过期。
                entry.attempt_seq += 1;
                if let Some(cancel) = entry.attempt_cancel.take() {
                    let _ = cancel.send(());
                }
                if let Some(waiter) = entry.open_waiter.take() {
                    let _ = waiter.send(Err(Error::AttemptCanceled));
                }
                entry.state = ContextState::Closed;
                info!(ctx = %id, "Open attempt canceled by close");
            }
            ContextState::Connected => {
                entry.attempt_seq += 1;
                if let Some(cancel) = entry.monitor_cancel.take() {
                    let _ = cancel.send(());
                }
                entry.state = ContextState::Closed;
                entry.bearer = None;
                entry.enqueue(Event::Disconnected);
                info!(ctx = %id, "Context closed");
            }
            ContextState::Created | ContextState::Closed => {
                debug!(ctx = %id, state = %entry.state, "Close on a context that is not open");
            }
        }
        Ok(())
    }

    fn handle_destroy(&mut self, id: ContextId) -> Result<()> {
        let Some(entry) = self.contexts.get(&id) else {
            return Err(Error::UnknownContext);
        };
        if entry.state.is_open() {
            return Err(Error::ContextStillOpen);
        }
        // Dropping the entry closes the dispatch queue; the dispatcher
        // drains what is already queued and stops.
        // 丢弃条目会关闭分发队列；分发器清空已排队的事件后停止。
        self.contexts.remove(&id);
        info!(ctx = %id, "Context destroyed");
        Ok(())
    }

    fn handle_attempt_finished(
        &mut self,
        id: ContextId,
        seq: u64,
        outcome: Result<ConnectedLink>,
    ) {
        let Some(entry) = self.contexts.get_mut(&id) else {
            discard_link(outcome);
            return;
        };
        if entry.attempt_seq != seq {
            debug!(ctx = %id, seq, "Stale attempt result discarded");
            discard_link(outcome);
            return;
        }

        entry.attempt_cancel = None;
        match outcome {
            Ok(connected) => {
                entry.state = ContextState::Connected;
                entry.bearer = Some(connected.bearer);
                entry.enqueue(Event::Connected);
                if let Some(waiter) = entry.open_waiter.take() {
                    let _ = waiter.send(Ok(()));
                }
                let (cancel_tx, cancel_rx) = oneshot::channel();
                entry.monitor_cancel = Some(cancel_tx);
                info!(ctx = %id, bearer = %connected.bearer, "Context connected");
                tokio::spawn(run_monitor(
                    id,
                    seq,
                    connected.link,
                    cancel_rx,
                    self.command_weak.clone(),
                ));
            }
            Err(err) => {
                let kind = ErrorKind::classify(&err);
                entry.state = ContextState::Closed;
                entry.enqueue(Event::Error(kind));
                if let Some(waiter) = entry.open_waiter.take() {
                    let _ = waiter.send(Err(err));
                }
                warn!(ctx = %id, kind = ?kind, "Connection attempt failed");
            }
        }
    }

    fn handle_link_event(&mut self, id: ContextId, seq: u64, update: LinkUpdate) {
        let Some(entry) = self.contexts.get_mut(&id) else {
            return;
        };
        if entry.attempt_seq != seq {
            debug!(ctx = %id, seq, "Stale link event discarded");
            return;
        }
        match update {
            LinkUpdate::Properties(properties) => {
                // Every property event starts with the carrying bearer.
                // 每个属性事件都以承载该连接的bearer开头。
                let mut merged = Properties::new();
                if let Some(bearer) = entry.bearer {
                    merged.insert(PROPERTY_BEARER, bearer.as_str());
                }
                for (key, value) in properties.iter() {
                    merged.insert(key, value);
                }
                debug!(ctx = %id, properties = merged.len(), "Connection properties updated");
                entry.enqueue(Event::PropertyChanged(merged));
            }
            LinkUpdate::Lost(kind) => {
                entry.state = ContextState::Closed;
                entry.bearer = None;
                entry.monitor_cancel = None;
                entry.enqueue(Event::Error(kind));
                entry.enqueue(Event::Disconnected);
                warn!(ctx = %id, kind = ?kind, "Connection lost");
            }
        }
    }
}

/// Tears down a link that arrived for a superseded attempt.
/// 拆除为已被取代的尝试而到达的链路。
fn discard_link(outcome: Result<ConnectedLink>) {
    if let Ok(mut connected) = outcome {
        tokio::spawn(async move {
            connected.link.shutdown().await;
        });
    }
}

/// Drives one connection attempt outside the actor, so command processing
/// never waits on a connector.
///
/// 在 actor 之外驱动一次连接尝试，使命令处理永远不必等待连接器。
async fn run_attempt(
    id: ContextId,
    seq: u64,
    connectors: Vec<Arc<dyn Connector>>,
    attempt_timeout: Duration,
    mut cancel_rx: oneshot::Receiver<()>,
    command_weak: mpsc::WeakSender<ManagerCommand>,
) {
    let outcome = tokio::select! {
        _ = &mut cancel_rx => {
            debug!(ctx = %id, seq, "Connection attempt canceled");
            return;
        }
        outcome = try_connectors(id, &connectors, attempt_timeout) => outcome,
    };

    let Some(command_tx) = command_weak.upgrade() else {
        discard_link(outcome);
        return;
    };
    if let Err(send_err) = command_tx
        .send(ManagerCommand::AttemptFinished { id, seq, outcome })
        .await
    {
        // The actor stopped between the upgrade and the send.
        // actor 在升级与发送之间停止了。
        if let ManagerCommand::AttemptFinished { outcome, .. } = send_err.0 {
            discard_link(outcome);
        }
    }
}

/// Tries each eligible connector in priority order until one yields a link.
///
/// With nothing eligible the attempt resolves through the same path with
/// `NoTransportAvailable`, so blocking and background opens always see one
/// uniform outcome.
///
/// 按优先级顺序逐一尝试符合条件的连接器，直到其中之一产出链路。
///
/// 没有符合条件的连接器时，尝试同样经由此路径以 `NoTransportAvailable`
/// 结束，使阻塞式与后台打开看到统一的结果。
async fn try_connectors(
    id: ContextId,
    connectors: &[Arc<dyn Connector>],
    attempt_timeout: Duration,
) -> Result<ConnectedLink> {
    let mut last_err = Error::NoTransportAvailable;
    for connector in connectors {
        debug!(
            ctx = %id,
            connector = connector.name(),
            bearer = %connector.bearer(),
            "Trying connector"
        );
        match tokio::time::timeout(attempt_timeout, connector.connect()).await {
            Ok(Ok(link)) => {
                return Ok(ConnectedLink {
                    bearer: connector.bearer(),
                    link,
                });
            }
            Ok(Err(err)) => {
                debug!(ctx = %id, connector = connector.name(), error = %err, "Connector failed");
                last_err = err;
            }
            Err(_) => {
                debug!(ctx = %id, connector = connector.name(), "Connector timed out");
                last_err = Error::TransportTimeout;
            }
        }
    }
    Err(last_err)
}

/// Watches an established link and forwards its updates to the actor.
///
/// 监视已建立的链路，并将其更新转发给 actor。
async fn run_monitor(
    id: ContextId,
    seq: u64,
    mut link: Box<dyn Link>,
    mut cancel_rx: oneshot::Receiver<()>,
    command_weak: mpsc::WeakSender<ManagerCommand>,
) {
    loop {
        tokio::select! {
            _ = &mut cancel_rx => {
                link.shutdown().await;
                debug!(ctx = %id, "Link shut down");
                return;
            }
            update = link.next_update() => {
                let lost = matches!(update, LinkUpdate::Lost(_));
                let Some(command_tx) = command_weak.upgrade() else {
                    link.shutdown().await;
                    return;
                };
                if command_tx
                    .send(ManagerCommand::LinkEvent { id, seq, update })
                    .await
                    .is_err()
                {
                    link.shutdown().await;
                    return;
                }
                if lost {
                    return;
                }
            }
        }
    }
}
