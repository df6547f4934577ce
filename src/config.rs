//! 定义了管理器的可配置参数。
//! Defines configurable parameters for the manager.

use crate::error::{Error, Result};
use std::time::Duration;

/// A structure containing all configurable parameters for a manager.
///
/// 包含管理器所有可配置参数的结构体。
#[derive(Debug, Clone)]
pub struct Config {
    /// The maximum number of contexts the manager holds at once. Context
    /// creation beyond it fails with `AllocationFailure`.
    ///
    /// 管理器同时持有的上下文的最大数量。超过后创建上下文将以
    /// `AllocationFailure` 失败。
    pub max_contexts: usize,

    /// The time budget for a single connector's connection attempt. An
    /// attempt exceeding it is abandoned and counted as a timeout.
    ///
    /// 单个连接器连接尝试的时间预算。超过该预算的尝试将被放弃并计为超时。
    pub attempt_timeout: Duration,

    /// The capacity of the manager's command channel.
    /// 管理器命令通道的容量。
    pub command_channel_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_contexts: 16,
            attempt_timeout: Duration::from_secs(10),
            command_channel_capacity: 128,
        }
    }
}

impl Config {
    /// Checks the configuration for values the manager cannot run with.
    ///
    /// 检查配置中是否存在管理器无法运行的值。
    pub fn validate(&self) -> Result<()> {
        if self.max_contexts == 0 {
            return Err(Error::Init("max_contexts must be at least 1"));
        }
        if self.attempt_timeout.is_zero() {
            return Err(Error::Init("attempt_timeout must be non-zero"));
        }
        if self.command_channel_capacity == 0 {
            return Err(Error::Init("command_channel_capacity must be at least 1"));
        }
        Ok(())
    }
}
