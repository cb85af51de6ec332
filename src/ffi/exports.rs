//! C exports over the process-global controller.
//!
//! Every export runs inside a panic guard; a fault is logged and turned into
//! the export's failure value instead of unwinding into the caller.

use std::ffi::{c_char, c_int};
use std::panic::{self, AssertUnwindSafe};
use std::ptr;
use std::sync::OnceLock;
use std::time::Duration;

use crate::config::{load_from_env, ControllerConfig};
use crate::ffi::{strings, surface};
use crate::lifecycle::Controller;
use crate::observability::logging;
use crate::worker::ProcessWorker;

static CONTROLLER: OnceLock<Controller> = OnceLock::new();

/// Reported by `tunnel_init` if it faults; init only ever answers 0 or 1.
const INIT_FAULT: c_int = surface::ALREADY_INITIALIZED;

/// Install the controller used by the exports.
///
/// Only the first call wins, and only if no export has run yet; otherwise
/// the controller is handed back.
pub fn install(controller: Controller) -> Result<(), Controller> {
    CONTROLLER.set(controller)
}

/// The process-global controller, built from configuration on first use.
pub fn controller() -> &'static Controller {
    CONTROLLER.get_or_init(default_controller)
}

fn default_controller() -> Controller {
    let loaded = load_from_env();
    let config = loaded.as_ref().cloned().unwrap_or_default();
    // A host-installed subscriber takes precedence.
    let _ = logging::init_logging(&config.observability);
    if let Err(e) = &loaded {
        tracing::error!(error = %e, "Invalid configuration, using defaults");
    }

    Controller::from_config(&config).unwrap_or_else(|e| {
        tracing::error!(error = %e, "Invalid endpoint pattern, using default");
        let defaults = ControllerConfig::default();
        Controller::new(ProcessWorker::default(), defaults.worker.program)
    })
}

fn guard<T>(fallback: T, op: impl FnOnce() -> T) -> T {
    panic::catch_unwind(AssertUnwindSafe(op)).unwrap_or_else(|_| {
        tracing::error!("Panic intercepted at foreign boundary");
        fallback
    })
}

/// Returns 0 on fresh init, 1 if already initialized or on an internal fault.
#[no_mangle]
pub extern "C" fn tunnel_init() -> c_int {
    guard(INIT_FAULT, || surface::init(controller()))
}

/// Launch the worker in the background. 0 launched, -1 not initialized,
/// -2 launch failed.
///
/// # Safety
/// `args` must be null or a valid NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn tunnel_run(args: *const c_char) -> c_int {
    let args = strings::read(args);
    guard(surface::NOT_INITIALIZED, || surface::run_async(controller(), &args))
}

/// Run the worker on the calling thread. 0 completed, -1 not initialized.
///
/// # Safety
/// `args` must be null or a valid NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn tunnel_run_sync(args: *const c_char) -> c_int {
    let args = strings::read(args);
    guard(surface::NOT_INITIALIZED, || surface::run_sync(controller(), &args))
}

/// 0 stopped, -1 nothing to stop.
#[no_mangle]
pub extern "C" fn tunnel_stop() -> c_int {
    guard(surface::NOTHING_TO_STOP, || surface::stop(controller()))
}

/// Release a string returned by this library.
///
/// # Safety
/// `s` must be null or a pointer returned by this library and not yet freed.
#[no_mangle]
pub unsafe extern "C" fn tunnel_free_string(s: *mut c_char) {
    strings::free(s)
}

/// Static build identifier. Free with `tunnel_free_string`.
#[no_mangle]
pub extern "C" fn tunnel_version() -> *mut c_char {
    guard(ptr::null_mut(), || strings::into_raw(crate::VERSION))
}

/// Last reported endpoint, or null. Free with `tunnel_free_string`.
#[no_mangle]
pub extern "C" fn tunnel_get_url() -> *mut c_char {
    guard(ptr::null_mut(), || {
        strings::optional_into_raw(surface::tunnel_url(controller()).as_deref())
    })
}

/// Publish the endpoint and mark the tunnel ready.
///
/// # Safety
/// `url` must be null or a valid NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn tunnel_set_url(url: *const c_char) {
    let url = strings::read(url);
    guard((), || surface::set_tunnel_url(controller(), &url))
}

/// 0 not started, 1 starting, 2 ready.
#[no_mangle]
pub extern "C" fn tunnel_get_status() -> c_int {
    guard(0, || surface::tunnel_status(controller()))
}

/// Non-zero enables silent mode for subsequent launches.
#[no_mangle]
pub extern "C" fn tunnel_set_silent_mode(silent: c_int) {
    guard((), || surface::set_silent_mode(controller(), silent != 0))
}

/// Block until the endpoint is known, the controller stops, or the timeout
/// elapses. Returns the endpoint or null. Free with `tunnel_free_string`.
#[no_mangle]
pub extern "C" fn tunnel_wait_for_url(timeout_ms: u64) -> *mut c_char {
    guard(ptr::null_mut(), || {
        let url = surface::wait_for_url(controller(), Duration::from_millis(timeout_ms));
        strings::optional_into_raw(url.as_deref())
    })
}
