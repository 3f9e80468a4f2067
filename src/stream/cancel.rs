//! Cooperative cancellation shared by the decoder, the renderer and the transport.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use thiserror::Error;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CancelReason {
    #[error("operation cancelled")]
    Interrupted,
    #[error("deadline exceeded")]
    DeadlineExceeded,
}

/// Cancellation token plus the reason recorded by whoever cancelled first.
///
/// Clones observe the same signal.
#[derive(Debug, Clone, Default)]
pub struct CancelSignal {
    token: CancellationToken,
    reason: Arc<OnceLock<CancelReason>>,
}

impl CancelSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancel_with(CancelReason::Interrupted);
    }

    /// Records `reason` unless another reason was recorded first, then cancels.
    pub fn cancel_with(&self, reason: CancelReason) {
        let _ = self.reason.set(reason);
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn reason(&self) -> Option<CancelReason> {
        if !self.token.is_cancelled() {
            return None;
        }
        Some(
            self.reason
                .get()
                .copied()
                .unwrap_or(CancelReason::Interrupted),
        )
    }

    /// Resolves once the signal fires.
    pub async fn cancelled(&self) -> CancelReason {
        self.token.cancelled().await;
        self.reason().unwrap_or(CancelReason::Interrupted)
    }

    /// Underlying token, for collaborators that race their own I/O against the signal.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Cancels with [`CancelReason::DeadlineExceeded`] once `timeout` elapses. The timer task
    /// exits early if the signal fires for any other reason.
    pub fn arm_deadline(&self, timeout: Duration) -> JoinHandle<()> {
        let signal = self.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep(timeout) => {
                    signal.cancel_with(CancelReason::DeadlineExceeded);
                }
                _ = signal.token.cancelled() => {}
            }
        })
    }
}
