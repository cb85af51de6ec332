//! Status-code surface over a [`Controller`].
//!
//! These are the semantics of the C exports, expressed over safe Rust types
//! so they can be driven against any controller instance.

use std::ffi::c_int;
use std::time::Duration;

use crate::lifecycle::{Controller, InitOutcome, RunError, StopOutcome};

pub const OK: c_int = 0;
pub const ALREADY_INITIALIZED: c_int = 1;
pub const NOT_INITIALIZED: c_int = -1;
pub const NOTHING_TO_STOP: c_int = -1;
pub const LAUNCH_FAILED: c_int = -2;

/// 0 on fresh init, 1 if already initialized.
pub fn init(controller: &Controller) -> c_int {
    match controller.init() {
        InitOutcome::Initialized => OK,
        InitOutcome::AlreadyInitialized => ALREADY_INITIALIZED,
    }
}

/// 0 once the worker is scheduled, -1 before init, -2 if no thread could be spawned.
pub fn run_async(controller: &Controller, args: &str) -> c_int {
    match controller.run_async_str(args) {
        // The worker keeps running detached; its result goes to the log.
        Ok(_handle) => OK,
        Err(e) => run_error_code(&e),
    }
}

/// 0 after the worker returns, -1 before init.
pub fn run_sync(controller: &Controller, args: &str) -> c_int {
    match controller.run_sync_str(args) {
        Ok(_result) => OK,
        Err(e) => run_error_code(&e),
    }
}

/// 0 if the signal was closed, -1 if there was nothing to stop.
pub fn stop(controller: &Controller) -> c_int {
    match controller.stop() {
        StopOutcome::Stopped => OK,
        StopOutcome::NotRunning => NOTHING_TO_STOP,
    }
}

/// 0 not started, 1 starting, 2 ready.
pub fn tunnel_status(controller: &Controller) -> c_int {
    controller.state().status().code()
}

pub fn tunnel_url(controller: &Controller) -> Option<String> {
    controller.state().tunnel_endpoint()
}

pub fn set_tunnel_url(controller: &Controller, url: &str) {
    controller.state().set_tunnel_endpoint(url);
}

pub fn set_silent_mode(controller: &Controller, silent: bool) {
    controller.state().set_silent_mode(silent);
}

pub fn wait_for_url(controller: &Controller, timeout: Duration) -> Option<String> {
    controller.state().wait_for_endpoint(timeout)
}

fn run_error_code(error: &RunError) -> c_int {
    match error {
        RunError::NotInitialized => {
            tracing::warn!("Run requested before init");
            NOT_INITIALIZED
        }
        RunError::Launch(e) => {
            tracing::error!(error = %e, "Worker launch failed");
            LAUNCH_FAILED
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::worker::{WorkerLaunch, WorkerResult};

    fn controller() -> Controller {
        Controller::new(
            |mut launch: WorkerLaunch| -> WorkerResult {
                launch.shutdown.blocking_wait();
                Ok(())
            },
            "test-worker",
        )
    }

    #[test]
    fn codes_follow_the_state_machine() {
        let ctl = controller();
        assert_eq!(stop(&ctl), NOTHING_TO_STOP);
        assert_eq!(run_async(&ctl, "a"), NOT_INITIALIZED);
        assert_eq!(run_sync(&ctl, "a"), NOT_INITIALIZED);
        assert_eq!(tunnel_status(&ctl), 0);

        assert_eq!(init(&ctl), OK);
        assert_eq!(init(&ctl), ALREADY_INITIALIZED);
        assert_eq!(tunnel_status(&ctl), 1);
        assert_eq!(run_async(&ctl, ""), OK);

        set_tunnel_url(&ctl, "https://x.example");
        assert_eq!(tunnel_status(&ctl), 2);
        assert_eq!(tunnel_url(&ctl).as_deref(), Some("https://x.example"));

        assert_eq!(stop(&ctl), OK);
        assert_eq!(stop(&ctl), NOTHING_TO_STOP);
        assert_eq!(tunnel_status(&ctl), 0);
    }

    #[test]
    fn silent_mode_reaches_the_state() {
        let ctl = controller();
        set_silent_mode(&ctl, true);
        assert!(ctl.state().silent_mode());
        set_silent_mode(&ctl, false);
        assert!(!ctl.state().silent_mode());
    }

    #[test]
    fn wait_for_url_times_out_before_report() {
        let ctl = controller();
        init(&ctl);
        assert!(wait_for_url(&ctl, Duration::from_millis(10)).is_none());
        set_tunnel_url(&ctl, "https://x.example");
        assert_eq!(
            wait_for_url(&ctl, Duration::from_millis(10)).as_deref(),
            Some("https://x.example")
        );
        stop(&ctl);
    }
}
