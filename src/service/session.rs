//! Service session: the control loop run once per service start.
//!
//! # States
//! ```text
//! StartPending → Running: worker launched
//! Running → StopPending: Stop/Shutdown with a shutdown handle attached
//! StopPending → Stopped: worker returned
//! Running/StopPending → Stopped: Stop/Shutdown with no handle left (immediate)
//! Running → Stopped: worker returned on its own
//! ```
//!
//! # Design Decisions
//! - Stop is acknowledged at once (StopPending) but Stopped is only reported
//!   once the worker has unwound, or on a repeated stop request
//! - The shutdown handle is taken on first use, so it is closed at most once
//! - Stopped is reported exactly once, from `run`

use tokio::sync::mpsc;

use crate::lifecycle::{Controller, InitOutcome, ShutdownHandle};
use crate::observability::metrics;
use crate::service::control::{
    AcceptedControls, ControlRequest, ServiceError, ServiceExit, ServiceState, ServiceStatus,
    StatusReporter,
};

/// One run of the service control loop.
pub struct ServiceSession<R> {
    name: String,
    reporter: R,
    controls: mpsc::UnboundedReceiver<ControlRequest>,
    shutdown: Option<ShutdownHandle>,
    current: ServiceStatus,
}

impl<R: StatusReporter> ServiceSession<R> {
    pub fn new(
        name: impl Into<String>,
        reporter: R,
        controls: mpsc::UnboundedReceiver<ControlRequest>,
    ) -> Self {
        Self {
            name: name.into(),
            reporter,
            controls,
            shutdown: None,
            current: ServiceStatus::new(ServiceState::Stopped),
        }
    }

    /// Drive the session to completion and return its exit indicator.
    pub async fn run(mut self, controller: &Controller, args: Vec<String>) -> ServiceExit {
        tracing::info!(service = %self.name, args = ?args, "Service starting");

        let exit = match self.execute(controller, args).await {
            Ok(exit) => exit,
            Err(e) => {
                tracing::error!(service = %self.name, error = %e, "Service failed");
                ServiceExit::WORKER_FAILED
            }
        };

        if let Some(handle) = self.shutdown.take() {
            handle.close();
        }
        if let Err(e) = self.report(ServiceStatus::new(ServiceState::Stopped).with_exit(exit)) {
            tracing::warn!(service = %self.name, error = %e, "Failed to report final status");
        }

        tracing::info!(service = %self.name, exit_code = exit.code(), "Service stopped");
        exit
    }

    async fn execute(
        &mut self,
        controller: &Controller,
        args: Vec<String>,
    ) -> Result<ServiceExit, ServiceError> {
        self.report(ServiceStatus::new(ServiceState::StartPending))?;

        if controller.init() == InitOutcome::AlreadyInitialized {
            tracing::warn!(
                service = %self.name,
                "Controller already initialized by another host, second worker shares its signal"
            );
        }
        self.shutdown = Some(controller.shutdown_handle());
        let mut worker = controller.run_async(args)?;

        self.report(
            ServiceStatus::new(ServiceState::Running)
                .with_accepts(AcceptedControls::STOP_AND_SHUTDOWN),
        )?;

        let mut controls_open = true;
        loop {
            tokio::select! {
                request = self.controls.recv(), if controls_open => match request {
                    Some(request) => {
                        if let Some(exit) = self.handle_control(request)? {
                            return Ok(exit);
                        }
                    }
                    None => {
                        tracing::debug!(service = %self.name, "Control stream closed, waiting for worker");
                        controls_open = false;
                    }
                },
                result = &mut worker => {
                    return Ok(match result {
                        Ok(()) => {
                            tracing::info!(service = %self.name, "Worker terminated without error");
                            ServiceExit::Success
                        }
                        Err(e) => {
                            tracing::error!(service = %self.name, error = %e, "Worker terminated with error");
                            ServiceExit::WORKER_FAILED
                        }
                    });
                }
            }
        }
    }

    /// Returns `Some` when the loop must terminate.
    fn handle_control(
        &mut self,
        request: ControlRequest,
    ) -> Result<Option<ServiceExit>, ServiceError> {
        match request {
            ControlRequest::Interrogate => {
                let current = self.current;
                self.report(current)?;
                Ok(None)
            }
            ControlRequest::Stop | ControlRequest::Shutdown => match self.shutdown.take() {
                Some(handle) => {
                    tracing::info!(service = %self.name, ?request, "Starting graceful shutdown");
                    handle.close();
                    self.report(ServiceStatus::new(ServiceState::StopPending))?;
                    Ok(None)
                }
                None => {
                    tracing::info!(service = %self.name, ?request, "Terminating immediately");
                    self.report(ServiceStatus::new(ServiceState::StopPending))?;
                    Ok(Some(ServiceExit::Success))
                }
            },
            ControlRequest::Other(code) => {
                tracing::error!(service = %self.name, code, "Unexpected control request");
                Ok(None)
            }
        }
    }

    fn report(&mut self, status: ServiceStatus) -> Result<(), ServiceError> {
        self.current = status;
        metrics::record_service_status(status.state.as_str());
        self.reporter.report(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::TunnelStatus;
    use crate::worker::{WorkerError, WorkerLaunch, WorkerResult};
    use std::time::Duration;

    fn states(rx: &mut mpsc::UnboundedReceiver<ServiceStatus>) -> Vec<ServiceState> {
        let mut out = Vec::new();
        while let Ok(status) = rx.try_recv() {
            out.push(status.state);
        }
        out
    }

    #[tokio::test]
    async fn worker_error_reports_failure() {
        let controller = Controller::new(
            |_launch: WorkerLaunch| -> WorkerResult { Err(WorkerError::Failed("no route".into())) },
            "w",
        );
        let (status_tx, mut status_rx) = mpsc::unbounded_channel();
        let (_control_tx, control_rx) = mpsc::unbounded_channel();

        let session = ServiceSession::new("test", status_tx, control_rx);
        let exit = session.run(&controller, Vec::new()).await;

        assert_eq!(exit, ServiceExit::WORKER_FAILED);
        assert_eq!(
            states(&mut status_rx),
            vec![ServiceState::StartPending, ServiceState::Running, ServiceState::Stopped]
        );
        assert_eq!(controller.state().status(), TunnelStatus::NotStarted);
    }

    #[tokio::test]
    async fn interrogate_and_unknown_codes_keep_running() {
        let controller = Controller::new(
            |mut launch: WorkerLaunch| -> WorkerResult {
                launch.shutdown.blocking_wait();
                Ok(())
            },
            "w",
        );
        let (status_tx, mut status_rx) = mpsc::unbounded_channel();
        let (control_tx, control_rx) = mpsc::unbounded_channel();

        control_tx.send(ControlRequest::Interrogate).unwrap();
        control_tx.send(ControlRequest::Other(128)).unwrap();
        control_tx.send(ControlRequest::Stop).unwrap();

        let session = ServiceSession::new("test", status_tx, control_rx);
        let exit = tokio::time::timeout(
            Duration::from_secs(5),
            session.run(&controller, Vec::new()),
        )
        .await
        .expect("session should finish");

        assert!(exit.is_success());
        assert_eq!(
            states(&mut status_rx),
            vec![
                ServiceState::StartPending,
                ServiceState::Running,
                ServiceState::Running,
                ServiceState::StopPending,
                ServiceState::Stopped,
            ]
        );
    }

    #[tokio::test]
    async fn attaches_to_an_already_initialized_controller() {
        let controller = Controller::new(
            |mut launch: WorkerLaunch| -> WorkerResult {
                launch.shutdown.blocking_wait();
                Ok(())
            },
            "w",
        );
        assert_eq!(controller.init(), InitOutcome::Initialized);
        let foreign = controller.state().generation();

        let (status_tx, mut status_rx) = mpsc::unbounded_channel();
        let (control_tx, control_rx) = mpsc::unbounded_channel();
        control_tx.send(ControlRequest::Stop).unwrap();

        let session = ServiceSession::new("test", status_tx, control_rx);
        let exit = tokio::time::timeout(
            Duration::from_secs(5),
            session.run(&controller, Vec::new()),
        )
        .await
        .expect("session should finish");

        // The session reused the existing generation and stopped it.
        assert!(foreign.is_some());
        assert!(exit.is_success());
        assert_eq!(
            states(&mut status_rx),
            vec![
                ServiceState::StartPending,
                ServiceState::Running,
                ServiceState::StopPending,
                ServiceState::Stopped,
            ]
        );
        assert_eq!(controller.state().status(), TunnelStatus::NotStarted);
    }
}
