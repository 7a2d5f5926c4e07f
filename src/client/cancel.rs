//! Cooperative request cancellation.

use std::sync::Arc;

use tokio::sync::watch;

/// Cancellation token shared between a caller and its in-flight request.
///
/// Cloning is cheap; every clone observes the same signal. Cancelling is
/// idempotent and cannot be undone.
#[derive(Debug, Clone)]
pub struct CancelToken {
    sender: Arc<watch::Sender<bool>>,
}

impl CancelToken {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(false);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Signal cancellation to every holder of this token.
    pub fn cancel(&self) {
        let _ = self.sender.send(true);
    }

    /// Whether the token has fired.
    pub fn is_cancelled(&self) -> bool {
        *self.sender.borrow()
    }

    /// Resolve once the token fires; immediately if it already has.
    pub async fn cancelled(&self) {
        let mut receiver = self.sender.subscribe();
        let _ = receiver.wait_for(|cancelled| *cancelled).await;
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}
