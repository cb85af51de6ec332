//! Lifecycle state machine shared by every control source.
//!
//! # States
//! - NotStarted: no shutdown signal allocated
//! - Starting: initialized, tunnel endpoint not yet reported
//! - Ready: initialized and the worker reported its endpoint
//!
//! # State Transitions
//! ```text
//! NotStarted → Starting: init()
//! Starting → Ready: set_tunnel_endpoint()
//! Starting/Ready → NotStarted: stop()
//! ```
//!
//! Every transition happens under one lock. The lock is never held while a
//! worker runs, only while fields are read or written.

use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use crate::lifecycle::shutdown::{ShutdownObserver, ShutdownSignal};
use crate::observability::metrics;

/// Result of [`LifecycleState::init`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitOutcome {
    /// A fresh shutdown signal was allocated.
    Initialized,
    /// Nothing changed; the controller was already initialized.
    AlreadyInitialized,
}

/// Result of [`LifecycleState::stop`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    /// The shutdown signal was closed.
    Stopped,
    /// Nothing to stop.
    NotRunning,
}

/// Externally visible tunnel status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum TunnelStatus {
    NotStarted = 0,
    Starting = 1,
    Ready = 2,
}

impl TunnelStatus {
    /// Numeric code used across the foreign boundary.
    pub fn code(self) -> i32 {
        self as i32
    }
}

/// A broken state invariant, reported by [`LifecycleState::check_invariants`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum InvariantViolation {
    #[error("shutdown signal present while not initialized")]
    SignalWithoutInit,
    #[error("initialized without a shutdown signal")]
    InitWithoutSignal,
    #[error("stopped controller still holds a shutdown signal")]
    SignalAfterStop,
}

/// Everything a worker launch needs, captured under the lock.
#[derive(Debug)]
pub struct LaunchSnapshot {
    pub shutdown: ShutdownObserver,
    pub silent: bool,
}

#[derive(Debug, Default)]
struct Inner {
    initialized: bool,
    stopped: bool,
    shutdown: Option<ShutdownSignal>,
    tunnel_url: Option<String>,
    tunnel_ready: bool,
    silent_mode: bool,
    /// Bumped by every fresh init.
    generation: u64,
}

/// Lock-protected lifecycle state.
#[derive(Debug, Default)]
pub struct LifecycleState {
    inner: Mutex<Inner>,
    /// Woken whenever readiness changes or the controller stops.
    endpoint_changed: Condvar,
}

impl LifecycleState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a shutdown signal unless one is already active.
    pub fn init(&self) -> InitOutcome {
        let mut inner = self.inner.lock();
        if inner.initialized {
            metrics::record_init("already_initialized");
            return InitOutcome::AlreadyInitialized;
        }

        inner.shutdown = Some(ShutdownSignal::new());
        inner.generation = inner.generation.wrapping_add(1);
        inner.initialized = true;
        inner.stopped = false;
        inner.tunnel_url = None;
        inner.tunnel_ready = false;

        metrics::record_init("initialized");
        tracing::info!("Lifecycle initialized");
        InitOutcome::Initialized
    }

    /// Close the active shutdown signal, if any.
    pub fn stop(&self) -> StopOutcome {
        let mut inner = self.inner.lock();
        self.stop_locked(&mut inner)
    }

    /// Close the active signal only if it belongs to `generation`.
    ///
    /// A signal allocated by a later init is left alone.
    pub fn stop_generation(&self, generation: u64) -> StopOutcome {
        let mut inner = self.inner.lock();
        if inner.initialized && inner.generation != generation {
            tracing::debug!(
                held = generation,
                current = inner.generation,
                "Ignoring stop for a replaced generation"
            );
            metrics::record_stop("stale_generation");
            return StopOutcome::NotRunning;
        }
        self.stop_locked(&mut inner)
    }

    /// Generation of the active signal, or `None` before init.
    pub fn generation(&self) -> Option<u64> {
        let inner = self.inner.lock();
        inner.initialized.then_some(inner.generation)
    }

    fn stop_locked(&self, inner: &mut Inner) -> StopOutcome {
        if !inner.initialized || inner.stopped {
            metrics::record_stop("not_running");
            return StopOutcome::NotRunning;
        }
        let Some(signal) = inner.shutdown.take() else {
            metrics::record_stop("not_running");
            return StopOutcome::NotRunning;
        };

        signal.close();
        inner.initialized = false;
        inner.stopped = true;
        self.endpoint_changed.notify_all();

        metrics::record_stop("stopped");
        tracing::info!(generation = inner.generation, "Lifecycle stopped");
        StopOutcome::Stopped
    }

    /// Observer of the current signal plus launch flags, or `None` before init.
    pub fn snapshot_for_launch(&self) -> Option<LaunchSnapshot> {
        let inner = self.inner.lock();
        if !inner.initialized {
            return None;
        }
        let signal = inner.shutdown.as_ref()?;
        Some(LaunchSnapshot {
            shutdown: signal.subscribe(),
            silent: inner.silent_mode,
        })
    }

    /// Record the endpoint reported by the worker and mark the tunnel ready.
    pub fn set_tunnel_endpoint(&self, url: impl Into<String>) {
        let url = url.into();
        let mut inner = self.inner.lock();
        tracing::info!(url = %url, "Tunnel endpoint reported");
        inner.tunnel_url = if url.is_empty() { None } else { Some(url) };
        inner.tunnel_ready = true;
        self.endpoint_changed.notify_all();
    }

    /// Last reported endpoint.
    pub fn tunnel_endpoint(&self) -> Option<String> {
        self.inner.lock().tunnel_url.clone()
    }

    pub fn status(&self) -> TunnelStatus {
        let inner = self.inner.lock();
        if !inner.initialized {
            TunnelStatus::NotStarted
        } else if inner.tunnel_ready {
            TunnelStatus::Ready
        } else {
            TunnelStatus::Starting
        }
    }

    /// Block until the endpoint is ready, the controller stops, or `timeout` elapses.
    pub fn wait_for_endpoint(&self, timeout: Duration) -> Option<String> {
        let deadline = Instant::now() + timeout;
        let mut inner = self.inner.lock();
        loop {
            if !inner.initialized {
                return None;
            }
            if inner.tunnel_ready {
                return inner.tunnel_url.clone();
            }
            if self
                .endpoint_changed
                .wait_until(&mut inner, deadline)
                .timed_out()
            {
                return None;
            }
        }
    }

    pub fn set_silent_mode(&self, silent: bool) {
        self.inner.lock().silent_mode = silent;
    }

    pub fn silent_mode(&self) -> bool {
        self.inner.lock().silent_mode
    }

    pub fn is_initialized(&self) -> bool {
        self.inner.lock().initialized
    }

    /// Verify the state invariants under the lock.
    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        let inner = self.inner.lock();
        match (inner.initialized, inner.shutdown.is_some()) {
            (false, true) => return Err(InvariantViolation::SignalWithoutInit),
            (true, false) => return Err(InvariantViolation::InitWithoutSignal),
            _ => {}
        }
        if inner.stopped && inner.shutdown.is_some() {
            return Err(InvariantViolation::SignalAfterStop);
        }
        Ok(())
    }
}
