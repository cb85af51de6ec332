//! Child-process worker.
//!
//! # Responsibilities
//! - Spawn `args[0]` with the remaining arguments
//! - Stream child output to the log and scan it for the tunnel endpoint
//! - Stop the child when the shutdown observer fires
//!
//! # Design Decisions
//! - Polls the child and the observer on a fixed interval
//! - Graceful stop first (SIGTERM on unix), hard kill after the grace period
//! - A stop requested by the controller is a successful run whatever the
//!   child's exit status

use std::io::{BufRead, BufReader, Read};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::config::WorkerConfig;
use crate::endpoint::{EndpointReporter, EndpointScanner};
use crate::worker::{Worker, WorkerError, WorkerLaunch, WorkerResult};

/// Runs the tunnel executable as a supervised child process.
#[derive(Debug, Clone)]
pub struct ProcessWorker {
    scanner: EndpointScanner,
    poll_interval: Duration,
    stop_grace: Duration,
}

impl ProcessWorker {
    pub fn new(config: &WorkerConfig) -> Result<Self, regex::Error> {
        Ok(Self {
            scanner: EndpointScanner::new(&config.endpoint_pattern)?,
            poll_interval: Duration::from_millis(config.poll_interval_ms),
            stop_grace: Duration::from_secs(config.stop_grace_secs),
        })
    }

    /// Ask the child to exit, then kill it once the grace period is over.
    fn terminate(&self, child: &mut ChildGuard) -> std::io::Result<ExitStatus> {
        #[cfg(unix)]
        {
            use nix::sys::signal::{kill, Signal};
            use nix::unistd::Pid;

            let pid = Pid::from_raw(child.id() as i32);
            match kill(pid, Signal::SIGTERM) {
                Ok(()) => {
                    let deadline = Instant::now() + self.stop_grace;
                    while Instant::now() < deadline {
                        if let Some(status) = child.try_wait()? {
                            return Ok(status);
                        }
                        thread::sleep(self.poll_interval);
                    }
                    tracing::warn!(pid = child.id(), "Child ignored SIGTERM, killing");
                }
                Err(e) => {
                    tracing::warn!(pid = child.id(), error = %e, "Failed to send SIGTERM");
                }
            }
        }

        if let Some(status) = child.try_wait()? {
            return Ok(status);
        }
        child.kill_and_reap()
    }
}

/// A spawned child that is killed and reaped on drop unless it already exited.
///
/// Every early return after spawn goes through this, so the tunnel
/// executable never outlives the worker.
#[derive(Debug)]
struct ChildGuard {
    child: Child,
    reaped: bool,
}

impl ChildGuard {
    fn new(child: Child) -> Self {
        Self {
            child,
            reaped: false,
        }
    }

    fn id(&self) -> u32 {
        self.child.id()
    }

    fn try_wait(&mut self) -> std::io::Result<Option<ExitStatus>> {
        let status = self.child.try_wait()?;
        self.reaped |= status.is_some();
        Ok(status)
    }

    fn kill_and_reap(&mut self) -> std::io::Result<ExitStatus> {
        self.child.kill()?;
        let status = self.child.wait()?;
        self.reaped = true;
        Ok(status)
    }
}

impl Drop for ChildGuard {
    fn drop(&mut self) {
        if self.reaped {
            return;
        }
        tracing::warn!(pid = self.child.id(), "Worker unwinding, killing child");
        if let Err(e) = self.child.kill() {
            tracing::warn!(pid = self.child.id(), error = %e, "Failed to kill child");
        }
        if let Err(e) = self.child.wait() {
            tracing::warn!(pid = self.child.id(), error = %e, "Failed to reap child");
        }
    }
}

impl Default for ProcessWorker {
    fn default() -> Self {
        let config = WorkerConfig::default();
        Self {
            scanner: EndpointScanner::default(),
            poll_interval: Duration::from_millis(config.poll_interval_ms),
            stop_grace: Duration::from_secs(config.stop_grace_secs),
        }
    }
}

impl Worker for ProcessWorker {
    fn run(&self, launch: WorkerLaunch) -> WorkerResult {
        let WorkerLaunch {
            args,
            mut shutdown,
            silent,
            endpoint,
        } = launch;
        let (program, rest) = args
            .split_first()
            .ok_or_else(|| WorkerError::Failed("empty argument vector".to_string()))?;

        let mut spawned = Command::new(program)
            .args(rest)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;
        tracing::info!(pid = spawned.id(), program = %program, "Child process spawned");
        let stdout = spawned.stdout.take();
        let stderr = spawned.stderr.take();
        let mut child = ChildGuard::new(spawned);

        let scanner = Arc::new(Mutex::new(self.scanner.clone()));
        let mut readers = Vec::new();
        if let Some(stdout) = stdout {
            readers.push(spawn_reader("stdout", stdout, &scanner, &endpoint, silent)?);
        }
        if let Some(stderr) = stderr {
            readers.push(spawn_reader("stderr", stderr, &scanner, &endpoint, silent)?);
        }

        let outcome = loop {
            if let Some(status) = child.try_wait()? {
                break if status.success() {
                    Ok(())
                } else {
                    Err(WorkerError::Exited(status.to_string()))
                };
            }
            if shutdown.is_shutdown() {
                tracing::info!(pid = child.id(), "Shutdown requested, stopping child");
                let status = self.terminate(&mut child)?;
                tracing::info!(status = %status, "Child stopped");
                break Ok(());
            }
            thread::sleep(self.poll_interval);
        };

        for reader in readers {
            let _ = reader.join();
        }
        outcome
    }
}

fn spawn_reader<R>(
    stream: &'static str,
    source: R,
    scanner: &Arc<Mutex<EndpointScanner>>,
    endpoint: &EndpointReporter,
    silent: bool,
) -> std::io::Result<JoinHandle<()>>
where
    R: Read + Send + 'static,
{
    let scanner = Arc::clone(scanner);
    let endpoint = endpoint.clone();
    thread::Builder::new()
        .name(format!("tunnel-worker-{stream}"))
        .spawn(move || {
            for line in BufReader::new(source).lines().map_while(Result::ok) {
                if !silent {
                    tracing::info!(stream, "{}", line);
                }
                let found = scanner.lock().scan(&line);
                if let Some(url) = found {
                    endpoint.report(&url);
                }
            }
        })
}
