//! Shared mock workers for integration tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use tunnel_lifecycle::{Controller, WorkerError, WorkerLaunch, WorkerResult};

/// A controller whose worker waits for shutdown, then lingers briefly.
///
/// Returns the controller and a counter of worker launches.
#[allow(dead_code)]
pub fn cooperative_controller(linger: Duration) -> (Controller, Arc<AtomicUsize>) {
    let launches = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&launches);
    let controller = Controller::new(
        move |mut launch: WorkerLaunch| -> WorkerResult {
            counter.fetch_add(1, Ordering::SeqCst);
            launch.shutdown.blocking_wait();
            thread::sleep(linger);
            Ok(())
        },
        "mock-tunnel",
    );
    (controller, launches)
}

/// A controller whose worker ignores shutdown until `release` is set.
#[allow(dead_code)]
pub fn stubborn_controller(release: Arc<AtomicBool>) -> Controller {
    Controller::new(
        move |_launch: WorkerLaunch| -> WorkerResult {
            while !release.load(Ordering::SeqCst) {
                thread::sleep(Duration::from_millis(5));
            }
            Ok(())
        },
        "mock-tunnel",
    )
}

/// A controller whose worker fails straight away.
#[allow(dead_code)]
pub fn failing_controller(message: &'static str) -> Controller {
    Controller::new(
        move |_launch: WorkerLaunch| -> WorkerResult { Err(WorkerError::Failed(message.to_string())) },
        "mock-tunnel",
    )
}

/// Poll `condition` until it holds or `timeout` elapses.
#[allow(dead_code)]
pub fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    condition()
}
