//! Cooperative shutdown signalling between the process and the runner.

use tokio::sync::watch;

/// Owns the shutdown flag. Typically wired to SIGINT/SIGTERM by the binary.
///
/// Dropping the controller counts as shutdown: signals observe the closed
/// channel and stop waiting.
pub struct ShutdownController {
    tx: watch::Sender<bool>,
}

impl ShutdownController {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx }
    }

    /// A signal handle that observers can poll or await.
    pub fn signal(&self) -> ShutdownSignal {
        ShutdownSignal {
            rx: self.tx.subscribe(),
        }
    }

    /// Flips the flag. Idempotent.
    pub fn shutdown(&self) {
        let _ = self.tx.send(true);
    }
}

impl Default for ShutdownController {
    fn default() -> Self {
        Self::new()
    }
}

/// Read side of the shutdown flag.
#[derive(Clone)]
pub struct ShutdownSignal {
    rx: watch::Receiver<bool>,
}

impl ShutdownSignal {
    pub fn is_shutdown(&self) -> bool {
        *self.rx.borrow()
    }

    /// Completes once shutdown has been requested or the controller is gone.
    pub async fn wait(&self) {
        let mut rx = self.rx.clone();
        let _ = rx.wait_for(|stop| *stop).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::timeout;

    #[tokio::test]
    async fn signal_observes_shutdown() {
        let controller = ShutdownController::new();
        let signal = controller.signal();
        assert!(!signal.is_shutdown());

        controller.shutdown();

        assert!(signal.is_shutdown());
        timeout(Duration::from_millis(50), signal.wait())
            .await
            .expect("wait should return after shutdown");
    }

    #[tokio::test]
    async fn wait_wakes_pending_waiters() {
        let controller = ShutdownController::new();
        let signal = controller.signal();

        let waiter = tokio::spawn(async move { signal.wait().await });
        tokio::time::sleep(Duration::from_millis(20)).await;
        controller.shutdown();

        timeout(Duration::from_millis(100), waiter)
            .await
            .expect("waiter should wake")
            .expect("waiter should not panic");
    }

    #[tokio::test]
    async fn dropping_the_controller_counts_as_shutdown() {
        let controller = ShutdownController::new();
        let signal = controller.signal();

        drop(controller);

        timeout(Duration::from_millis(50), signal.wait())
            .await
            .expect("wait should return once the controller is gone");
    }
}
