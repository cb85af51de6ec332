//! Tunnel Lifecycle Controller Library
//!
//! Starts, stops and queries one long-running tunnel worker on behalf of
//! either a foreign host (C ABI, see [`ffi`]) or a service manager (see
//! [`service`]). Both control sources share the same [`lifecycle::Controller`].

pub mod config;
pub mod endpoint;
pub mod ffi;
pub mod lifecycle;
pub mod observability;
pub mod service;
pub mod worker;

pub use config::ControllerConfig;
pub use lifecycle::{Controller, ShutdownObserver};
pub use worker::{Worker, WorkerError, WorkerLaunch, WorkerResult};

/// Static build identifier.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
