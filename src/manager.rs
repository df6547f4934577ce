//! The manager-level API, including the main actor, commands, and handles.
//! 管理器层级的API，包括主 actor、命令与句柄。

pub mod context;
pub mod handle;

mod command;
mod dispatch;
mod event_loop;

pub use context::{Context, ContextId, ContextState, ContextStatus};
pub use handle::Connline;
