//! Cooperative cancellation for dispatched requests.
//!
//! The dispatcher hands a [`CancellationHandle`] to every business callback and
//! never interprets it itself: a callback that observes cancellation returns its
//! own error, which propagates to the dispatcher caller unchanged.

use std::future::Future;

use tokio::sync::watch;

/// Clone-friendly cancellation signal backed by a `watch` channel
/// Cooperative cancellation signal shared by a caller and a running handler
#[derive(Clone, Debug)]
pub struct CancellationHandle {
    tx: watch::Sender<bool>,
    rx: watch::Receiver<bool>,
}

impl CancellationHandle {
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(false);
        Self { tx, rx }
    }

    /// Idempotent
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    /// Non-blocking check
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once cancellation is requested; immediately if it already was
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        // wait_for checks the current value first
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }

    /// Drive `future` unless cancelled first. `None` means it was cancelled.
    pub async fn run<F>(&self, future: F) -> Option<F::Output>
    where
        F: Future,
    {
        if self.is_cancelled() {
            return None;
        }
        tokio::select! {
            biased;
            _ = self.cancelled() => None,
            output = future => Some(output),
        }
    }
}

impl Default for CancellationHandle {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_new_handle_not_cancelled() {
        let handle = CancellationHandle::new();
        assert!(!handle.is_cancelled());
        assert_eq!(handle.run(async { 5 }).await, Some(5));
    }

    #[tokio::test]
    async fn test_cancel_is_shared_between_clones() {
        let handle = CancellationHandle::new();
        let observer = handle.clone();
        handle.cancel();
        handle.cancel();
        assert!(observer.is_cancelled());
        observer.cancelled().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_stops_pending_work_on_cancel() {
        let handle = CancellationHandle::new();
        let canceller = handle.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            canceller.cancel();
        });

        let outcome = handle
            .run(async {
                tokio::time::sleep(Duration::from_secs(60)).await;
                "finished"
            })
            .await;
        assert_eq!(outcome, None);
    }
}
