//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Init (state.rs):
//!     init() → allocate ShutdownSignal → Starting
//!
//! Run (controller.rs):
//!     snapshot under lock → release lock → WorkerInvoker (async or sync)
//!
//! Stop (state.rs / shutdown.rs):
//!     stop() → take signal under lock → close → NotStarted
//!
//! Signals (signals.rs):
//!     SIGTERM → Stop, SIGINT → Shutdown, SIGHUP → Interrogate
//! ```
//!
//! # Design Decisions
//! - One lock for all lifecycle fields; never held while a worker runs
//! - The shutdown signal is closed by value, so a second close cannot happen
//! - Workers only ever see a read-only observer

pub mod controller;
pub mod shutdown;
pub mod signals;
pub mod state;

pub use controller::{Controller, RunError, ShutdownHandle};
pub use shutdown::{ShutdownObserver, ShutdownSignal};
pub use state::{
    InitOutcome, InvariantViolation, LaunchSnapshot, LifecycleState, StopOutcome, TunnelStatus,
};
