//! User-visible status line
//!
//! Every failed bridge operation and every long-running step reports a short
//! status string here. Subscribers (the shell rendering the overlay) watch
//! for changes; the last message always wins.

use tokio::sync::watch;
use tracing::debug;

/// Handle for publishing status messages
#[derive(Clone)]
pub(crate) struct StatusLine {
    tx: watch::Sender<String>,
}

impl StatusLine {
    /// Create a status line and the receiver half for display
    pub(crate) fn new() -> (Self, watch::Receiver<String>) {
        let (tx, rx) = watch::channel(String::new());
        (Self { tx }, rx)
    }

    /// Publish a new status message, replacing the previous one
    pub(crate) fn set(&self, message: impl Into<String>) {
        let message = message.into();
        debug!("Status: {}", message);
        self.tx.send_replace(message);
    }

    /// Clear the status line
    pub(crate) fn clear(&self) {
        self.tx.send_replace(String::new());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_last_message_wins() {
        let (status, rx) = StatusLine::new();
        status.set("Listening...");
        status.set("Thinking...");
        assert_eq!(*rx.borrow(), "Thinking...");
    }

    #[test]
    fn test_status_clear() {
        let (status, rx) = StatusLine::new();
        status.set("Error: something failed");
        status.clear();
        assert!(rx.borrow().is_empty());
    }
}
