//! Worker invocation.
//!
//! # Responsibilities
//! - Guarantee a non-empty argument vector
//! - Run the worker on its own thread (async) or the caller's thread (sync)
//! - Contain panics so nothing unwinds into the caller

use std::any::Any;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::thread;

use tokio::sync::oneshot;

use crate::endpoint::EndpointReporter;
use crate::lifecycle::LaunchSnapshot;
use crate::observability::metrics;
use crate::worker::args::with_default_program;
use crate::worker::{Worker, WorkerError, WorkerLaunch, WorkerResult};

const WORKER_THREAD_NAME: &str = "tunnel-worker";

/// Error raised when a worker could not be scheduled.
#[derive(Debug, thiserror::Error)]
pub enum InvokeError {
    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Completion of an asynchronously launched worker.
///
/// Can be awaited, or joined from blocking code with [`WorkerHandle::wait`].
#[derive(Debug)]
pub struct WorkerHandle {
    rx: oneshot::Receiver<WorkerResult>,
}

impl WorkerHandle {
    /// Block until the worker returns. Must not be called from async code.
    pub fn wait(self) -> WorkerResult {
        self.rx.blocking_recv().unwrap_or(Err(WorkerError::Lost))
    }
}

impl Future for WorkerHandle {
    type Output = WorkerResult;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|res| res.unwrap_or(Err(WorkerError::Lost)))
    }
}

/// Launches the worker entry point.
#[derive(Clone)]
pub struct WorkerInvoker {
    worker: Arc<dyn Worker>,
    program: String,
}

impl std::fmt::Debug for WorkerInvoker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerInvoker")
            .field("program", &self.program)
            .finish_non_exhaustive()
    }
}

impl WorkerInvoker {
    /// `program` is the argv[0] used when a launch has no arguments.
    pub fn new(worker: impl Worker, program: impl Into<String>) -> Self {
        Self {
            worker: Arc::new(worker),
            program: program.into(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Schedule the worker on an independent thread and return immediately.
    pub fn launch_async(
        &self,
        args: Vec<String>,
        snapshot: LaunchSnapshot,
        endpoint: EndpointReporter,
    ) -> Result<WorkerHandle, InvokeError> {
        let launch = self.prepare(args, snapshot, endpoint);
        let worker = Arc::clone(&self.worker);
        let (tx, rx) = oneshot::channel();

        thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_string())
            .spawn(move || {
                let result = run_contained(worker.as_ref(), launch);
                let _ = tx.send(result);
            })?;

        metrics::record_worker_launch("async");
        Ok(WorkerHandle { rx })
    }

    /// Run the worker on the calling thread until it returns.
    pub fn run_sync(
        &self,
        args: Vec<String>,
        snapshot: LaunchSnapshot,
        endpoint: EndpointReporter,
    ) -> WorkerResult {
        let launch = self.prepare(args, snapshot, endpoint);
        metrics::record_worker_launch("sync");
        run_contained(self.worker.as_ref(), launch)
    }

    fn prepare(
        &self,
        args: Vec<String>,
        snapshot: LaunchSnapshot,
        endpoint: EndpointReporter,
    ) -> WorkerLaunch {
        WorkerLaunch {
            args: with_default_program(args, &self.program),
            shutdown: snapshot.shutdown,
            silent: snapshot.silent,
            endpoint,
        }
    }
}

fn run_contained(worker: &dyn Worker, launch: WorkerLaunch) -> WorkerResult {
    tracing::info!(args = ?launch.args, silent = launch.silent, "Worker starting");

    let result = match panic::catch_unwind(AssertUnwindSafe(|| worker.run(launch))) {
        Ok(result) => result,
        Err(payload) => Err(WorkerError::Panicked(panic_message(payload.as_ref()))),
    };

    match &result {
        Ok(()) => {
            metrics::record_worker_exit("ok");
            tracing::info!("Worker finished");
        }
        Err(e) => {
            metrics::record_worker_exit("error");
            tracing::error!(error = %e, "Worker terminated with error");
        }
    }
    result
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
