//! Shutdown signalling between the controller and the worker.

use tokio::sync::broadcast;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};

/// One-shot shutdown signal.
///
/// Holds the only sender of a broadcast channel. Closing consumes the signal,
/// which drops the sender, so every observer sees the channel as closed no
/// matter when it subscribed. There is no way to close the same signal twice.
#[derive(Debug)]
pub struct ShutdownSignal {
    /// Broadcast channel sender.
    tx: broadcast::Sender<()>,
}

impl ShutdownSignal {
    /// Create a new, open shutdown signal.
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    /// Hand out a read-only observer of this signal.
    pub fn subscribe(&self) -> ShutdownObserver {
        ShutdownObserver {
            rx: self.tx.subscribe(),
            fired: false,
        }
    }

    /// Broadcast shutdown and close the channel.
    pub fn close(self) {
        let _ = self.tx.send(());
        tracing::debug!(observers = self.tx.receiver_count(), "Shutdown signal closed");
    }

    /// Number of observers still attached.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}

/// Read-only view of a [`ShutdownSignal`] held by workers.
#[derive(Debug)]
pub struct ShutdownObserver {
    rx: broadcast::Receiver<()>,
    fired: bool,
}

impl ShutdownObserver {
    /// Non-blocking check. Once this returns `true` it keeps returning `true`.
    pub fn is_shutdown(&mut self) -> bool {
        if self.fired {
            return true;
        }
        match self.rx.try_recv() {
            Ok(()) | Err(TryRecvError::Closed) | Err(TryRecvError::Lagged(_)) => {
                self.fired = true;
            }
            Err(TryRecvError::Empty) => {}
        }
        self.fired
    }

    /// Wait until shutdown is signalled.
    pub async fn recv(&mut self) {
        if self.fired {
            return;
        }
        match self.rx.recv().await {
            Ok(()) | Err(RecvError::Closed) | Err(RecvError::Lagged(_)) => self.fired = true,
        }
    }

    /// Block the current thread until shutdown is signalled.
    ///
    /// Must not be called from within an async execution context.
    pub fn blocking_wait(&mut self) {
        if self.fired {
            return;
        }
        let _ = self.rx.blocking_recv();
        self.fired = true;
    }
}

impl Clone for ShutdownObserver {
    fn clone(&self) -> Self {
        Self {
            rx: self.rx.resubscribe(),
            fired: self.fired,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn observer_sees_close() {
        let signal = ShutdownSignal::new();
        let mut observer = signal.subscribe();
        assert!(!observer.is_shutdown());

        signal.close();
        assert!(observer.is_shutdown());
        assert!(observer.is_shutdown());
    }

    #[test]
    fn clone_after_close_is_shut_down() {
        let signal = ShutdownSignal::new();
        let observer = signal.subscribe();
        signal.close();

        let mut late = observer.clone();
        assert!(late.is_shutdown());
    }

    #[test]
    fn blocking_wait_returns_after_close() {
        let signal = ShutdownSignal::new();
        let mut observer = signal.subscribe();

        let waiter = std::thread::spawn(move || {
            observer.blocking_wait();
            observer.is_shutdown()
        });

        signal.close();
        assert!(waiter.join().unwrap());
    }

    #[tokio::test]
    async fn recv_returns_after_close() {
        let signal = ShutdownSignal::new();
        let mut observer = signal.subscribe();
        assert_eq!(signal.receiver_count(), 1);

        let task = tokio::spawn(async move {
            observer.recv().await;
        });

        signal.close();
        tokio::time::timeout(std::time::Duration::from_secs(1), task)
            .await
            .expect("observer should wake")
            .unwrap();
    }
}
