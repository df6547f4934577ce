//! An in-process simulated backend.
//!
//! [`SimConnector`] implements [`Connector`] without touching any OS
//! networking: the outcome of every connection attempt is scripted through
//! a [`SimControl`], and established links are driven by hand through
//! [`SimLinkHandle`]s. Tests and demos build whole bearer topologies from
//! these pieces.
//!
//! 进程内的模拟后端。
//!
//! [`SimConnector`] 在不接触任何操作系统网络的情况下实现 [`Connector`]：
//! 每次连接尝试的结果都通过 [`SimControl`] 脚本化，已建立的链路则通过
//! [`SimLinkHandle`] 手动驱动。测试和演示用这些组件搭建完整的承载拓扑。

use super::{Connector, Link, LinkUpdate};
use crate::bearer::Bearer;
use crate::error::{Error, ErrorKind, Result};
use crate::event::Properties;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc, watch};
use tracing::debug;

/// The scripted outcome of one `connect` call.
/// 单次 `connect` 调用的脚本化结果。
#[derive(Debug)]
pub enum SimOutcome {
    /// Succeed and hand the controller a [`SimLinkHandle`] for the new link.
    /// 成功，并将新链路的 [`SimLinkHandle`] 交给控制端。
    Connect,
    /// Fail with the given class.
    /// 以给定的类别失败。
    Refuse(ErrorKind),
    /// Never resolve, so the attempt runs into its timeout.
    /// 永不完成，使该尝试触发超时。
    Stall,
}

/// A [`Connector`] whose behavior is scripted from the outside.
///
/// Each `connect` call consumes the next scripted [`SimOutcome`]; with an
/// empty script the connector refuses with [`ErrorKind::NoTransport`].
///
/// 行为完全由外部脚本决定的 [`Connector`]。
///
/// 每次 `connect` 调用消耗下一个脚本化的 [`SimOutcome`]；脚本为空时，
/// 连接器以 [`ErrorKind::NoTransport`] 拒绝。
#[derive(Debug)]
pub struct SimConnector {
    bearer: Bearer,
    name: String,
    script: Arc<Mutex<VecDeque<SimOutcome>>>,
    links_tx: mpsc::UnboundedSender<SimLinkHandle>,
}

impl SimConnector {
    /// Creates a connector for `bearer` plus the control half that scripts it.
    ///
    /// 为 `bearer` 创建连接器及对其进行脚本控制的另一半。
    pub fn new(bearer: Bearer) -> (Arc<Self>, SimControl) {
        let script = Arc::new(Mutex::new(VecDeque::new()));
        let (links_tx, links_rx) = mpsc::unbounded_channel();
        let connector = Arc::new(Self {
            bearer,
            name: format!("sim-{bearer}"),
            script: script.clone(),
            links_tx,
        });
        (connector, SimControl { script, links_rx })
    }
}

#[async_trait]
impl Connector for SimConnector {
    fn bearer(&self) -> Bearer {
        self.bearer
    }

    fn name(&self) -> &str {
        &self.name
    }

    async fn connect(&self) -> Result<Box<dyn Link>> {
        let outcome = self.script.lock().await.pop_front();
        debug!(connector = %self.name, ?outcome, "Scripted connect");
        match outcome {
            Some(SimOutcome::Connect) => {
                let (update_tx, update_rx) = mpsc::unbounded_channel();
                let (closed_tx, closed_rx) = watch::channel(false);
                let handle = SimLinkHandle {
                    update_tx,
                    closed_rx,
                };
                // The controller may already be gone; the link still works.
                // 控制端可能已经不在了；链路仍然可用。
                let _ = self.links_tx.send(handle);
                Ok(Box::new(SimLink {
                    update_rx,
                    closed_tx,
                }))
            }
            Some(SimOutcome::Refuse(kind)) => Err(Error::from(kind)),
            Some(SimOutcome::Stall) => std::future::pending().await,
            None => Err(Error::NoTransportAvailable),
        }
    }
}

/// The scripting half of a [`SimConnector`].
/// [`SimConnector`] 的脚本控制端。
#[derive(Debug)]
pub struct SimControl {
    script: Arc<Mutex<VecDeque<SimOutcome>>>,
    links_rx: mpsc::UnboundedReceiver<SimLinkHandle>,
}

impl SimControl {
    /// Scripts the outcome of the next unscripted `connect` call.
    /// 为下一次尚未脚本化的 `connect` 调用设定结果。
    pub async fn enqueue(&self, outcome: SimOutcome) {
        self.script.lock().await.push_back(outcome);
    }

    /// Receives the handle of the next link the connector produced.
    ///
    /// Returns `None` once the connector has been dropped.
    ///
    /// 接收连接器产出的下一条链路的句柄。连接器被丢弃后返回 `None`。
    pub async fn next_link(&mut self) -> Option<SimLinkHandle> {
        self.links_rx.recv().await
    }
}

/// Drives one simulated link from the controlling side.
/// 从控制端驱动一条模拟链路。
#[derive(Debug)]
pub struct SimLinkHandle {
    update_tx: mpsc::UnboundedSender<LinkUpdate>,
    closed_rx: watch::Receiver<bool>,
}

impl SimLinkHandle {
    /// Pushes a property update through the link.
    /// 通过链路推送一次属性更新。
    pub fn update(&self, properties: Properties) {
        let _ = self.update_tx.send(LinkUpdate::Properties(properties));
    }

    /// Drops the link from the transport side.
    /// 从传输侧断开该链路。
    pub fn lose(&self, kind: ErrorKind) {
        let _ = self.update_tx.send(LinkUpdate::Lost(kind));
    }

    /// Waits until the manager has shut the link down.
    /// 等待管理器将该链路关闭。
    pub async fn closed(&mut self) {
        let _ = self.closed_rx.wait_for(|closed| *closed).await;
    }

    /// Whether the manager has shut the link down.
    pub fn is_closed(&self) -> bool {
        *self.closed_rx.borrow()
    }
}

#[derive(Debug)]
struct SimLink {
    update_rx: mpsc::UnboundedReceiver<LinkUpdate>,
    closed_tx: watch::Sender<bool>,
}

#[async_trait]
impl Link for SimLink {
    async fn next_update(&mut self) -> LinkUpdate {
        match self.update_rx.recv().await {
            Some(update) => update,
            // The controlling handle is gone; the link just stays quiet.
            // 控制句柄已不在；链路保持安静。
            None => std::future::pending().await,
        }
    }

    async fn shutdown(&mut self) {
        let _ = self.closed_tx.send(true);
    }
}
