//! Concurrent use of one controller from many threads.

use std::sync::atomic::Ordering;
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

use rand::Rng;
use tunnel_lifecycle::lifecycle::{InitOutcome, StopOutcome, TunnelStatus};

mod common;

const THREADS: usize = 8;

#[test]
fn concurrent_init_allocates_one_signal() {
    let (controller, _) = common::cooperative_controller(Duration::ZERO);
    let controller = Arc::new(controller);
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let controller = Arc::clone(&controller);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                controller.init()
            })
        })
        .collect();

    let outcomes: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let fresh = outcomes
        .iter()
        .filter(|o| **o == InitOutcome::Initialized)
        .count();
    assert_eq!(fresh, 1);
    controller.state().check_invariants().unwrap();
}

#[test]
fn concurrent_stop_closes_once() {
    let (controller, launches) = common::cooperative_controller(Duration::ZERO);
    let controller = Arc::new(controller);
    controller.init();
    let worker = controller.run_async(Vec::new()).unwrap();
    assert!(common::wait_until(Duration::from_secs(2), || {
        launches.load(Ordering::SeqCst) == 1
    }));

    let barrier = Arc::new(Barrier::new(THREADS));
    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let controller = Arc::clone(&controller);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                controller.stop()
            })
        })
        .collect();

    let stopped = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|o| *o == StopOutcome::Stopped)
        .count();
    assert_eq!(stopped, 1);
    assert!(worker.wait().is_ok());
    assert_eq!(controller.state().status(), TunnelStatus::NotStarted);
    controller.state().check_invariants().unwrap();
}

#[test]
fn randomized_sequences_keep_invariants() {
    let (controller, _) = common::cooperative_controller(Duration::ZERO);
    let controller = Arc::new(controller);

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let controller = Arc::clone(&controller);
            thread::spawn(move || {
                let mut rng = rand::thread_rng();
                for _ in 0..200 {
                    match rng.gen_range(0..6) {
                        0 => {
                            controller.init();
                        }
                        1 => {
                            controller.stop();
                        }
                        2 => {
                            // Detached: the worker unwinds on the next stop.
                            let _ = controller.run_async(Vec::new());
                        }
                        3 => {
                            controller
                                .state()
                                .set_tunnel_endpoint("https://x.example");
                        }
                        4 => {
                            let _ = controller.state().status();
                        }
                        _ => {
                            let _ = controller.state().snapshot_for_launch();
                        }
                    }
                    controller.state().check_invariants().unwrap();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    controller.stop();
    assert_eq!(controller.state().status(), TunnelStatus::NotStarted);
    controller.state().check_invariants().unwrap();
}

#[test]
fn stop_before_init_and_run_before_init_are_not_faults() {
    let (controller, launches) = common::cooperative_controller(Duration::ZERO);
    assert_eq!(controller.stop(), StopOutcome::NotRunning);
    assert!(controller.run_async(Vec::new()).is_err());
    assert!(controller.run_sync(Vec::new()).is_err());
    assert_eq!(launches.load(Ordering::SeqCst), 0);
    controller.state().check_invariants().unwrap();
}
