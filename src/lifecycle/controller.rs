//! Controller: one lifecycle state paired with one worker invoker.

use std::sync::Arc;

use crate::config::ControllerConfig;
use crate::endpoint::EndpointReporter;
use crate::lifecycle::state::{InitOutcome, LifecycleState, StopOutcome};
use crate::worker::args::split_args;
use crate::worker::{InvokeError, ProcessWorker, Worker, WorkerHandle, WorkerInvoker, WorkerResult};

/// Error returned when a run request cannot be honoured.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("controller is not initialized")]
    NotInitialized,

    #[error(transparent)]
    Launch(#[from] InvokeError),
}

/// Entry point shared by the foreign surface and the service adapter.
#[derive(Debug)]
pub struct Controller {
    state: Arc<LifecycleState>,
    invoker: WorkerInvoker,
}

impl Controller {
    /// Create a controller around an arbitrary worker.
    pub fn new(worker: impl Worker, program: impl Into<String>) -> Self {
        Self {
            state: Arc::new(LifecycleState::new()),
            invoker: WorkerInvoker::new(worker, program),
        }
    }

    /// Create a controller running the configured tunnel executable.
    pub fn from_config(config: &ControllerConfig) -> Result<Self, regex::Error> {
        let worker = ProcessWorker::new(&config.worker)?;
        let controller = Self::new(worker, config.worker.program.clone());
        controller.state.set_silent_mode(config.worker.silent);
        Ok(controller)
    }

    pub fn state(&self) -> &Arc<LifecycleState> {
        &self.state
    }

    pub fn program(&self) -> &str {
        self.invoker.program()
    }

    pub fn init(&self) -> InitOutcome {
        self.state.init()
    }

    pub fn stop(&self) -> StopOutcome {
        self.state.stop()
    }

    /// Launch the worker on its own thread.
    pub fn run_async(&self, args: Vec<String>) -> Result<WorkerHandle, RunError> {
        let snapshot = self
            .state
            .snapshot_for_launch()
            .ok_or(RunError::NotInitialized)?;
        let handle = self.invoker.launch_async(args, snapshot, self.reporter())?;
        Ok(handle)
    }

    /// Run the worker on the calling thread until it returns.
    pub fn run_sync(&self, args: Vec<String>) -> Result<WorkerResult, RunError> {
        let snapshot = self
            .state
            .snapshot_for_launch()
            .ok_or(RunError::NotInitialized)?;
        Ok(self.invoker.run_sync(args, snapshot, self.reporter()))
    }

    /// [`Controller::run_async`] with a whitespace-delimited argument string.
    pub fn run_async_str(&self, raw: &str) -> Result<WorkerHandle, RunError> {
        self.run_async(split_args(raw))
    }

    /// [`Controller::run_sync`] with a whitespace-delimited argument string.
    pub fn run_sync_str(&self, raw: &str) -> Result<WorkerResult, RunError> {
        self.run_sync(split_args(raw))
    }

    /// Capability to stop the generation that is active right now.
    ///
    /// Taken before init, the handle closes nothing.
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            state: Arc::clone(&self.state),
            generation: self.state.generation(),
        }
    }

    fn reporter(&self) -> EndpointReporter {
        EndpointReporter::new(Arc::clone(&self.state))
    }
}

/// Stop capability held by a service session.
///
/// Consumed on use, so a session can trigger at most one stop through it.
/// Bound to one init generation: once that signal is stopped and replaced,
/// closing the handle leaves the new signal open.
#[derive(Debug)]
pub struct ShutdownHandle {
    state: Arc<LifecycleState>,
    generation: Option<u64>,
}

impl ShutdownHandle {
    pub fn close(self) -> StopOutcome {
        match self.generation {
            Some(generation) => self.state.stop_generation(generation),
            None => StopOutcome::NotRunning,
        }
    }
}
