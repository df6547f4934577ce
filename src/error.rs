//! 定义了库中所有可能的错误类型。
//! Defines all possible error types in the library.

use thiserror::Error;

/// The primary error type for the connection manager library.
/// 连接管理库的主要错误类型。
#[derive(Debug, Error)]
pub enum Error {
    /// An underlying I/O error occurred inside a connector.
    /// 连接器内部发生了底层的I/O错误。
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The manager could not be started with the given configuration.
    /// 无法使用给定的配置启动管理器。
    #[error("Initialization failed: {0}")]
    Init(&'static str),

    /// A bearer bitmask was empty or carried undefined bits.
    /// 承载位掩码为空或包含未定义的位。
    #[error("Invalid bearer bitmask")]
    InvalidBearerMask,

    /// No more contexts can be created; the configured capacity is exhausted.
    /// 无法再创建上下文；配置的容量已用尽。
    #[error("Context capacity exhausted")]
    AllocationFailure,

    /// No registered connector serves the requested bearers, or none of
    /// them could establish a connection.
    ///
    /// 没有已注册的连接器服务于所请求的承载，或它们都无法建立连接。
    #[error("No transport available")]
    NoTransportAvailable,

    /// The transport refused the connection attempt.
    /// 传输层拒绝了连接尝试。
    #[error("Transport refused the connection")]
    TransportAuthFailure,

    /// The connection attempt did not complete within the configured timeout.
    /// 连接尝试未在配置的超时时间内完成。
    #[error("Connection attempt timed out")]
    TransportTimeout,

    /// An established connection was lost underneath the context.
    /// 已建立的连接在上下文底层丢失。
    #[error("Transport connection lost")]
    TransportLost,

    /// A blocking open was superseded by `close` before it resolved.
    /// 阻塞式打开在完成之前被 `close` 取代。
    #[error("Connection attempt canceled")]
    AttemptCanceled,

    /// The operation referenced a context that no longer exists.
    /// 操作引用了一个已不存在的上下文。
    #[error("Unknown or destroyed context")]
    UnknownContext,

    /// The context, or one of the manager's contexts, is still open.
    /// 该上下文（或管理器的某个上下文）仍处于打开状态。
    #[error("Context is still open")]
    ContextStillOpen,

    /// An internal channel for communication between tasks was closed unexpectedly.
    /// 用于任务间通信的内部通道意外关闭。
    #[error("Internal channel is broken")]
    ChannelClosed,
}

/// A specialized `Result` type for this library.
/// 本库专用的 `Result` 类型。
pub type Result<T> = std::result::Result<T, Error>;

/// The failure classes a context reports through its event sink.
///
/// Richer [`Error`] values collapse onto these classes when they cross the
/// callback boundary.
///
/// 上下文通过其事件接收器报告的失败类别。
/// 更丰富的 [`Error`] 值在跨越回调边界时会折叠为这些类别。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// No transport was usable: none registered for the context's bearers,
    /// or none of them reachable.
    /// 没有可用的传输。
    NoTransport,
    /// The transport refused the attempt.
    /// 传输拒绝了该尝试。
    AuthFailure,
    /// The attempt timed out.
    /// 尝试超时。
    Timeout,
    /// An established connection was lost.
    /// 已建立的连接丢失。
    TransportLost,
}

impl ErrorKind {
    /// Classifies an [`Error`] for delivery through the error callback.
    ///
    /// 为通过错误回调投递而对 [`Error`] 进行分类。
    pub fn classify(err: &Error) -> Self {
        match err {
            Error::TransportAuthFailure => ErrorKind::AuthFailure,
            Error::TransportTimeout => ErrorKind::Timeout,
            Error::TransportLost => ErrorKind::TransportLost,
            _ => ErrorKind::NoTransport,
        }
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::NoTransport => Error::NoTransportAvailable,
            ErrorKind::AuthFailure => Error::TransportAuthFailure,
            ErrorKind::Timeout => Error::TransportTimeout,
            ErrorKind::TransportLost => Error::TransportLost,
        }
    }
}
