//! Service control vocabulary and status reporting.

use tokio::sync::mpsc;

use crate::lifecycle::RunError;

/// A control request delivered by the service manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlRequest {
    /// Re-report the current status.
    Interrogate,
    Stop,
    /// System shutdown; handled like `Stop`.
    Shutdown,
    /// Any code this adapter does not accept.
    Other(u32),
}

/// Service state reported to the manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceState {
    StartPending,
    Running,
    StopPending,
    Stopped,
}

impl ServiceState {
    pub fn as_str(self) -> &'static str {
        match self {
            ServiceState::StartPending => "start_pending",
            ServiceState::Running => "running",
            ServiceState::StopPending => "stop_pending",
            ServiceState::Stopped => "stopped",
        }
    }
}

impl std::fmt::Display for ServiceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Control requests the service advertises as accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AcceptedControls {
    pub stop: bool,
    pub shutdown: bool,
}

impl AcceptedControls {
    pub const NONE: Self = Self {
        stop: false,
        shutdown: false,
    };

    pub const STOP_AND_SHUTDOWN: Self = Self {
        stop: true,
        shutdown: true,
    };
}

/// Exit indicator carried by the final status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ServiceExit {
    #[default]
    Success,
    /// Service-specific failure code.
    ServiceSpecific(u32),
}

impl ServiceExit {
    /// Exit code used when the worker returned an error.
    pub const WORKER_FAILED: Self = ServiceExit::ServiceSpecific(1);

    pub fn is_success(self) -> bool {
        matches!(self, ServiceExit::Success)
    }

    /// Process exit code for the host binary.
    pub fn code(self) -> u32 {
        match self {
            ServiceExit::Success => 0,
            ServiceExit::ServiceSpecific(code) => code,
        }
    }
}

/// One status report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceStatus {
    pub state: ServiceState,
    pub accepts: AcceptedControls,
    pub exit: ServiceExit,
}

impl ServiceStatus {
    pub fn new(state: ServiceState) -> Self {
        Self {
            state,
            accepts: AcceptedControls::NONE,
            exit: ServiceExit::Success,
        }
    }

    pub fn with_accepts(mut self, accepts: AcceptedControls) -> Self {
        self.accepts = accepts;
        self
    }

    pub fn with_exit(mut self, exit: ServiceExit) -> Self {
        self.exit = exit;
        self
    }
}

/// Error type for the service adapter.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("status reporter is closed")]
    ReporterClosed,

    #[error("failed to launch worker: {0}")]
    Launch(#[from] RunError),
}

/// Sink for status reports sent back to the service manager.
pub trait StatusReporter: Send {
    fn report(&mut self, status: ServiceStatus) -> Result<(), ServiceError>;
}

impl StatusReporter for mpsc::UnboundedSender<ServiceStatus> {
    fn report(&mut self, status: ServiceStatus) -> Result<(), ServiceError> {
        self.send(status).map_err(|_| ServiceError::ReporterClosed)
    }
}

/// Narrates status changes to the log.
#[derive(Debug, Clone)]
pub struct LogReporter {
    service: String,
}

impl LogReporter {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }
}

impl StatusReporter for LogReporter {
    fn report(&mut self, status: ServiceStatus) -> Result<(), ServiceError> {
        tracing::info!(
            service = %self.service,
            state = %status.state,
            accepts_stop = status.accepts.stop,
            accepts_shutdown = status.accepts.shutdown,
            exit_code = status.exit.code(),
            "Service status"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_builder() {
        let status = ServiceStatus::new(ServiceState::Running)
            .with_accepts(AcceptedControls::STOP_AND_SHUTDOWN);
        assert!(status.accepts.stop && status.accepts.shutdown);
        assert!(status.exit.is_success());

        let stopped = ServiceStatus::new(ServiceState::Stopped).with_exit(ServiceExit::WORKER_FAILED);
        assert_eq!(stopped.exit.code(), 1);
        assert_eq!(stopped.state.to_string(), "stopped");
    }

    #[test]
    fn channel_reporter_fails_when_closed() {
        let (mut tx, rx) = mpsc::unbounded_channel();
        assert!(tx.report(ServiceStatus::new(ServiceState::StartPending)).is_ok());
        drop(rx);
        assert!(matches!(
            tx.report(ServiceStatus::new(ServiceState::Running)),
            Err(ServiceError::ReporterClosed)
        ));
    }
}
