//! OS signal handling.
//!
//! Translates process signals into service control requests so a POSIX
//! service manager (systemd, launchd, a container runtime) drives the same
//! control loop as any other manager.
//!
//! - SIGTERM → Stop
//! - SIGINT → Shutdown
//! - SIGHUP → Interrogate
//!
//! Must be started from within a Tokio runtime.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::service::ControlRequest;

/// Forward signals to `tx` until the receiving side goes away.
#[cfg(unix)]
pub fn spawn_signal_bridge(
    tx: mpsc::UnboundedSender<ControlRequest>,
) -> std::io::Result<JoinHandle<()>> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = signal(SignalKind::terminate())?;
    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut hangup = signal(SignalKind::hangup())?;

    Ok(tokio::spawn(async move {
        loop {
            let request = tokio::select! {
                Some(()) = terminate.recv() => ControlRequest::Stop,
                Some(()) = interrupt.recv() => ControlRequest::Shutdown,
                Some(()) = hangup.recv() => ControlRequest::Interrogate,
                else => break,
            };
            tracing::info!(?request, "Signal received");
            if tx.send(request).is_err() {
                break;
            }
        }
        tracing::debug!("Signal bridge exiting");
    }))
}

/// Forward Ctrl-C as a shutdown request until the receiving side goes away.
#[cfg(not(unix))]
pub fn spawn_signal_bridge(
    tx: mpsc::UnboundedSender<ControlRequest>,
) -> std::io::Result<JoinHandle<()>> {
    Ok(tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Ctrl-C received");
            if tx.send(ControlRequest::Shutdown).is_err() {
                break;
            }
        }
    }))
}
