//! User-visible notifications.
//!
//! The cache reports mutation outcomes through a [`Notifier`]. What a
//! notification looks like to the user (a toast, a log line, a test
//! assertion) is up to the implementation.

use std::fmt;

use parking_lot::Mutex;
use tracing::{error, info, warn};

/// Severity of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationKind {
    Default,
    Success,
    Error,
    Warning,
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Default => "default",
            Self::Success => "success",
            Self::Error => "error",
            Self::Warning => "warning",
        };
        f.write_str(label)
    }
}

/// A message for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub title: String,
    pub detail: Option<String>,
}

impl Notification {
    pub fn new(kind: NotificationKind, title: impl Into<String>, detail: Option<String>) -> Self {
        Self {
            kind,
            title: title.into(),
            detail,
        }
    }

    pub fn success(title: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::new(NotificationKind::Success, title, Some(detail.into()))
    }

    pub fn error(title: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::new(NotificationKind::Error, title, Some(detail.into()))
    }

    pub fn warning(title: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::new(NotificationKind::Warning, title, Some(detail.into()))
    }
}

/// Sink for user-visible notifications.
///
/// `notify` is called synchronously from the cache and must not block.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Emits every notification as a tracing event.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notification: Notification) {
        let detail = notification.detail.as_deref().unwrap_or_default();
        match notification.kind {
            NotificationKind::Error => error!(title = %notification.title, detail, "notification"),
            NotificationKind::Warning => warn!(title = %notification.title, detail, "notification"),
            NotificationKind::Success | NotificationKind::Default => {
                info!(kind = %notification.kind, title = %notification.title, detail, "notification")
            },
        }
    }
}

/// Keeps every notification in memory.
#[derive(Debug, Default)]
pub struct MemoryNotifier {
    received: Mutex<Vec<Notification>>,
}

impl MemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of everything received so far, oldest first.
    pub fn notifications(&self) -> Vec<Notification> {
        self.received.lock().clone()
    }

    /// Returns how many notifications of `kind` were received.
    pub fn count_of(&self, kind: NotificationKind) -> usize {
        self.received.lock().iter().filter(|n| n.kind == kind).count()
    }

    pub fn clear(&self) {
        self.received.lock().clear();
    }
}

impl Notifier for MemoryNotifier {
    fn notify(&self, notification: Notification) {
        self.received.lock().push(notification);
    }
}
