//! Service control subsystem.
//!
//! # Data Flow
//! ```text
//! service manager
//!     → ControlRequest (mpsc stream; signals.rs on POSIX hosts)
//!     → session.rs (select over control stream and worker completion)
//!     → Controller (same lifecycle state as the foreign surface)
//!     → ServiceStatus → StatusReporter → service manager / event log
//! ```
//!
//! # Design Decisions
//! - Platform glue only produces `ControlRequest`s and consumes
//!   `ServiceStatus`es; the state machine is platform independent
//! - Installation and recovery configuration are left to the host

pub mod control;
pub mod session;

pub use control::{
    AcceptedControls, ControlRequest, LogReporter, ServiceError, ServiceExit, ServiceState,
    ServiceStatus, StatusReporter,
};
pub use session::ServiceSession;

use tokio::sync::mpsc;

use crate::config::ControllerConfig;
use crate::lifecycle::signals::spawn_signal_bridge;
use crate::lifecycle::Controller;
use crate::worker::args::service_args;

/// Run one service session driven by process signals, narrating status to the log.
///
/// `start_args` are the arguments delivered with the start request.
pub async fn run_with_signals(
    controller: &Controller,
    config: &ControllerConfig,
    start_args: Vec<String>,
) -> std::io::Result<ServiceExit> {
    let (control_tx, control_rx) = mpsc::unbounded_channel();
    let bridge = spawn_signal_bridge(control_tx)?;

    let args = service_args(start_args, &config.worker.default_args);
    let reporter = LogReporter::new(config.service.name.clone());
    let session = ServiceSession::new(config.service.name.clone(), reporter, control_rx);
    let exit = session.run(controller, args).await;

    bridge.abort();
    Ok(exit)
}
