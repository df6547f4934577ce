#![deny(clippy::expect_used, clippy::unwrap_used)]

//! 连接生命周期管理库的根。
//! The root of the connection lifecycle management library.

pub mod bearer;
pub mod config;
pub mod error;
pub mod event;
pub mod manager;
pub mod transport;
