//! Shutdown coordination.
//!
//! Shutdown is a latch: once triggered it stays triggered, so a listener
//! created after the trigger resolves immediately instead of waiting forever.

use std::sync::Arc;

use tokio::sync::watch;

/// Handle that requests shutdown. Clones share one latch.
#[derive(Debug, Clone)]
pub struct Shutdown {
    latch: Arc<watch::Sender<bool>>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (latch, _) = watch::channel(false);
        Self {
            latch: Arc::new(latch),
        }
    }

    /// A future-producing listener for the server or a background task.
    pub fn listener(&self) -> ShutdownListener {
        ShutdownListener {
            rx: self.latch.subscribe(),
        }
    }

    /// Close the latch. Returns `true` only for the call that closed it.
    pub fn trigger(&self) -> bool {
        let first = !self.latch.send_replace(true);
        if first {
            tracing::info!(listeners = self.latch.receiver_count(), "Shutdown triggered");
        }
        first
    }

    pub fn is_triggered(&self) -> bool {
        *self.latch.borrow()
    }

    /// Listeners that have not yet been dropped.
    pub fn listener_count(&self) -> usize {
        self.latch.receiver_count()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Receiving side of a [`Shutdown`].
#[derive(Debug)]
pub struct ShutdownListener {
    rx: watch::Receiver<bool>,
}

impl ShutdownListener {
    /// Resolve once shutdown is triggered or every [`Shutdown`] handle is gone.
    pub async fn wait(mut self) {
        // An error means the sender was dropped, which also ends the server.
        let _ = self.rx.wait_for(|triggered| *triggered).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_trigger_reaches_listeners() {
        let shutdown = Shutdown::new();
        let a = shutdown.listener();
        let b = shutdown.listener();
        assert_eq!(shutdown.listener_count(), 2);
        assert!(!shutdown.is_triggered());

        assert!(shutdown.trigger());
        assert!(!shutdown.clone().trigger());
        assert!(shutdown.is_triggered());

        tokio::time::timeout(Duration::from_secs(1), a.wait()).await.unwrap();
        tokio::time::timeout(Duration::from_secs(1), b.wait()).await.unwrap();
    }

    #[tokio::test]
    async fn test_late_listener_sees_trigger() {
        let shutdown = Shutdown::new();
        shutdown.trigger();
        let late = shutdown.listener();
        tokio::time::timeout(Duration::from_secs(1), late.wait()).await.unwrap();
    }

    #[tokio::test]
    async fn test_untriggered_listener_waits() {
        let shutdown = Shutdown::new();
        let pending = tokio::time::timeout(Duration::from_millis(20), shutdown.listener().wait()).await;
        assert!(pending.is_err());
    }

    #[tokio::test]
    async fn test_dropped_handle_releases_listeners() {
        let shutdown = Shutdown::new();
        let listener = shutdown.listener();
        drop(shutdown);
        tokio::time::timeout(Duration::from_secs(1), listener.wait()).await.unwrap();
    }
}
