//! Caller-side cancellation and deadlines for pipeline sub-tasks.

use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use tokio::time::Instant;

/// Why a sub-task stopped before finishing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Interrupted {
    #[error("request cancelled")]
    Cancelled,
    #[error("request timed out")]
    TimedOut,
}

/// Caller half: signals cancellation to every clone of the paired token.
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    /// Cancel all in-flight sub-tasks guarded by the paired token.
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }
}

/// Pipeline half: guards each external call.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    rx: Option<watch::Receiver<bool>>,
    deadline: Option<Instant>,
}

impl CancelToken {
    /// Create a linked handle/token pair.
    pub fn pair() -> (CancelHandle, CancelToken) {
        let (tx, rx) = watch::channel(false);
        (
            CancelHandle { tx },
            CancelToken {
                rx: Some(rx),
                deadline: None,
            },
        )
    }

    /// A token that is never cancelled and has no deadline.
    pub fn none() -> Self {
        Self::default()
    }

    /// Add a deadline `timeout` from now. An earlier existing deadline wins.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Add an absolute deadline. An earlier existing deadline wins.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(existing) => existing.min(deadline),
            None => deadline,
        });
        self
    }

    pub fn is_cancelled(&self) -> bool {
        self.rx.as_ref().map(|rx| *rx.borrow()).unwrap_or(false)
    }

    /// Resolves once cancellation is signalled. Never resolves if the
    /// handle is dropped without cancelling.
    async fn cancelled(&self) {
        match self.rx.clone() {
            Some(mut rx) => {
                if rx.wait_for(|cancelled| *cancelled).await.is_err() {
                    std::future::pending::<()>().await;
                }
            }
            None => std::future::pending::<()>().await,
        }
    }

    async fn expired(&self) {
        match self.deadline {
            Some(deadline) => tokio::time::sleep_until(deadline).await,
            None => std::future::pending::<()>().await,
        }
    }

    /// Run `fut` unless cancellation or the deadline comes first.
    ///
    /// An interrupted future is dropped, which abandons its in-flight request.
    pub async fn guard<F: Future>(&self, fut: F) -> Result<F::Output, Interrupted> {
        if self.is_cancelled() {
            return Err(Interrupted::Cancelled);
        }

        tokio::select! {
            biased;
            _ = self.cancelled() => Err(Interrupted::Cancelled),
            _ = self.expired() => Err(Interrupted::TimedOut),
            out = fut => Ok(out),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_none_token_passes_through() {
        let token = CancelToken::none();
        assert_eq!(token.guard(async { 7 }).await, Ok(7));
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let (handle, token) = CancelToken::pair();
        handle.cancel();
        assert!(token.is_cancelled());
        assert_eq!(token.guard(async { 1 }).await, Err(Interrupted::Cancelled));
    }

    #[tokio::test]
    async fn test_cancel_interrupts_in_flight() {
        let (handle, token) = CancelToken::pair();
        let slow = token.guard(tokio::time::sleep(Duration::from_secs(30)));
        let cancel = async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            handle.cancel();
        };
        let (result, _) = tokio::join!(slow, cancel);
        assert_eq!(result, Err(Interrupted::Cancelled));
    }

    #[tokio::test]
    async fn test_deadline_interrupts() {
        let token = CancelToken::none().with_timeout(Duration::from_millis(20));
        let result = token.guard(tokio::time::sleep(Duration::from_secs(30))).await;
        assert_eq!(result, Err(Interrupted::TimedOut));
    }

    #[tokio::test]
    async fn test_dropped_handle_does_not_cancel() {
        let (handle, token) = CancelToken::pair();
        drop(handle);
        let result = token
            .with_timeout(Duration::from_millis(50))
            .guard(async { "done" })
            .await;
        assert_eq!(result, Ok("done"));
    }

    #[test]
    fn test_earlier_deadline_wins() {
        let now = Instant::now();
        let token = CancelToken::none()
            .with_deadline(now + Duration::from_secs(1))
            .with_deadline(now + Duration::from_secs(10));
        assert_eq!(token.deadline, Some(now + Duration::from_secs(1)));
    }
}
