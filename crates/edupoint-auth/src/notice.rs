//! Transient user-facing notices.
//!
//! Sign-in and sign-out outcomes are announced through a [`NoticeCenter`]:
//! a watch channel holding at most one current notice, cleared automatically
//! after a short display window. Consumers subscribe and render however they
//! like (status line, desktop toast, nothing at all).

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::watch;

/// How long a notice stays current before it is cleared.
const DEFAULT_TTL: Duration = Duration::from_secs(3);

/// Severity of a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    /// Confirmation of a completed action.
    Info,
    /// Something went wrong but auth state is consistent.
    Warning,
}

/// A transient message for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    /// Message severity.
    pub kind: NoticeKind,
    /// Human-readable message text.
    pub message: String,
}

impl Notice {
    /// Creates an informational notice.
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Info,
            message: message.into(),
        }
    }

    /// Creates a warning notice.
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Warning,
            message: message.into(),
        }
    }
}

/// Publisher for transient notices with automatic expiry.
#[derive(Debug)]
pub struct NoticeCenter {
    tx: watch::Sender<Option<Notice>>,
    ttl: Duration,
    // Generation counter so an expiry task only clears its own notice.
    seq: Arc<AtomicU64>,
}

impl NoticeCenter {
    /// Creates a notice center with the default display window.
    pub fn new() -> Self {
        Self::with_ttl(DEFAULT_TTL)
    }

    /// Creates a notice center with a custom display window.
    pub fn with_ttl(ttl: Duration) -> Self {
        let (tx, _rx) = watch::channel(None);
        Self {
            tx,
            ttl,
            seq: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Publishes a notice, replacing any current one.
    ///
    /// The notice is cleared after the display window elapses unless a newer
    /// notice has replaced it in the meantime.
    pub fn publish(&self, notice: Notice) {
        let generation = self.seq.fetch_add(1, Ordering::SeqCst) + 1;
        self.tx.send_replace(Some(notice));

        let tx = self.tx.clone();
        let seq = Arc::clone(&self.seq);
        let ttl = self.ttl;
        tokio::spawn(async move {
            tokio::time::sleep(ttl).await;
            if seq.load(Ordering::SeqCst) == generation {
                tx.send_replace(None);
            }
        });
    }

    /// Subscribes to notice changes.
    pub fn subscribe(&self) -> watch::Receiver<Option<Notice>> {
        self.tx.subscribe()
    }

    /// Returns the currently displayed notice, if any.
    pub fn current(&self) -> Option<Notice> {
        self.tx.borrow().clone()
    }
}

impl Default for NoticeCenter {
    fn default() -> Self {
        Self::new()
    }
}
