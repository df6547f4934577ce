//! Per-context event dispatch.
//!
//! Each context owns a dispatcher task that delivers sink callbacks one at
//! a time, in queue order. The queue is unbounded and the actor enqueues
//! without awaiting, so a slow or re-entrant sink can never stall the
//! manager, and no accepted event is ever dropped.
//!
//! 按上下文进行的事件分发。
//!
//! 每个上下文拥有一个分发器任务，按队列顺序逐一投递接收器回调。队列无界
//! 且 actor 入队时从不等待，因此缓慢或重入的接收器永远无法阻塞管理器，
//! 已接受的事件也不会丢失。

use super::command::ManagerCommand;
use super::context::{Context, ContextId};
use crate::event::{Event, EventSink};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::trace;

/// Work items for a context's dispatcher task.
pub(crate) enum DispatchItem {
    /// Deliver an event to the current sink, if one is registered.
    Deliver(Event),
    /// Replace the sink. Items queued earlier still run against the old one.
    ReplaceSink(Arc<dyn EventSink>),
}

/// Spawns the dispatcher task for one context and returns its queue.
pub(crate) fn spawn_dispatcher(
    id: ContextId,
    command_weak: mpsc::WeakSender<ManagerCommand>,
) -> mpsc::UnboundedSender<DispatchItem> {
    let (dispatch_tx, dispatch_rx) = mpsc::unbounded_channel();
    tokio::spawn(run_dispatcher(id, command_weak, dispatch_rx));
    dispatch_tx
}

async fn run_dispatcher(
    id: ContextId,
    command_weak: mpsc::WeakSender<ManagerCommand>,
    mut dispatch_rx: mpsc::UnboundedReceiver<DispatchItem>,
) {
    let mut sink: Option<Arc<dyn EventSink>> = None;
    while let Some(item) = dispatch_rx.recv().await {
        match item {
            DispatchItem::ReplaceSink(new_sink) => sink = Some(new_sink),
            DispatchItem::Deliver(event) => {
                let Some(sink) = sink.as_ref() else {
                    trace!(ctx = %id, kind = %event.kind(), "No sink registered, event dropped");
                    continue;
                };
                // The sink gets a handle with a live command sender. Once
                // the manager is gone there is nothing left to deliver for.
                let Some(command_tx) = command_weak.upgrade() else {
                    break;
                };
                let context = Context { id, command_tx };
                trace!(ctx = %id, kind = %event.kind(), "Delivering event");
                match event {
                    Event::Error(kind) => sink.on_error(context, kind).await,
                    Event::Connected => sink.on_connected(context).await,
                    Event::Disconnected => sink.on_disconnected(context).await,
                    Event::PropertyChanged(properties) => {
                        sink.on_property(context, properties).await
                    }
                }
            }
        }
    }
    trace!(ctx = %id, "Dispatcher stopped");
}
