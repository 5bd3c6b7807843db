//! Run-scoped cooperative cancellation.
//!
//! Built on `tokio::sync::watch`: the source holds the sender, every token
//! holds a receiver. Dropping the source without cancelling means "never".

use tokio::sync::watch;

/// Owner side of a cancellation scope.
#[derive(Debug)]
pub struct CancelSource {
    tx: watch::Sender<bool>,
}

impl CancelSource {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx }
    }

    pub fn token(&self) -> CancelToken {
        CancelToken {
            rx: self.tx.subscribe(),
        }
    }

    /// Signal cancellation to every token. Idempotent.
    pub fn cancel(&self) {
        // send_replace never fails, even with no live receivers
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }
}

impl Default for CancelSource {
    fn default() -> Self {
        Self::new()
    }
}

/// Observer side, handed to the pipeline and through it to every step.
#[derive(Debug, Clone)]
pub struct CancelToken {
    rx: watch::Receiver<bool>,
}

impl CancelToken {
    /// A token that can never be cancelled.
    pub fn never() -> Self {
        let (_tx, rx) = watch::channel(false);
        Self { rx }
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once cancellation is signalled; pending forever otherwise.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        if rx.wait_for(|cancelled| *cancelled).await.is_err() {
            // sender dropped without cancelling
            std::future::pending::<()>().await;
        }
    }
}
