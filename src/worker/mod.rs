//! Worker subsystem.
//!
//! # Data Flow
//! ```text
//! Controller::run_async / run_sync
//!     → args.rs (split argument string, default argv)
//!     → invoker.rs (thread or calling thread, panic containment)
//!     → Worker::run(WorkerLaunch)
//!         → observes ShutdownObserver
//!         → reports endpoint through EndpointReporter
//! ```
//!
//! # Design Decisions
//! - The worker owns its own control flow; the invoker only guarantees the
//!   call happens with the right arguments and observer
//! - Worker errors never cross the foreign boundary, only the service status
//! - `process.rs` is the default worker: a supervised child process

pub mod args;
pub mod invoker;
pub mod process;

pub use invoker::{InvokeError, WorkerHandle, WorkerInvoker};
pub use process::ProcessWorker;

use crate::endpoint::EndpointReporter;
use crate::lifecycle::ShutdownObserver;

/// Error returned by a worker run.
#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    #[error("worker failed: {0}")]
    Failed(String),

    #[error("worker exited with {0}")]
    Exited(String),

    #[error("worker panicked: {0}")]
    Panicked(String),

    #[error("worker completion was lost")]
    Lost,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type WorkerResult = Result<(), WorkerError>;

/// Everything handed to a worker when it is launched.
#[derive(Debug)]
pub struct WorkerLaunch {
    /// Non-empty argument vector; `args[0]` is the program name.
    pub args: Vec<String>,
    /// Read-only view of the controller's shutdown signal.
    pub shutdown: ShutdownObserver,
    /// Suppress worker output narration.
    pub silent: bool,
    /// Side channel for publishing the tunnel endpoint.
    pub endpoint: EndpointReporter,
}

/// The long-running task started and stopped by the controller.
pub trait Worker: Send + Sync + 'static {
    /// Run until finished or until `launch.shutdown` fires.
    fn run(&self, launch: WorkerLaunch) -> WorkerResult;
}

impl<F> Worker for F
where
    F: Fn(WorkerLaunch) -> WorkerResult + Send + Sync + 'static,
{
    fn run(&self, launch: WorkerLaunch) -> WorkerResult {
        self(launch)
    }
}
