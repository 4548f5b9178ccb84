//! Transient UI notifications.

use futures::channel::mpsc;
use thiserror::Error;

/// Severity of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Success,
    Error,
}

/// A toast-style message for the UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub title: String,
    pub text: String,
}

impl Notification {
    pub fn success(title: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Success,
            title: title.into(),
            text: text.into(),
        }
    }

    pub fn error(title: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            title: title.into(),
            text: text.into(),
        }
    }
}

/// The notification subsystem could not deliver a message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NotifyError {
    /// The receiving side has gone away.
    #[error("notification channel closed")]
    Closed,

    /// The notifier is not available.
    #[error("notifier unavailable: {0}")]
    Unavailable(String),
}

/// Sink for transient UI notifications.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification) -> Result<(), NotifyError>;
}

/// Delivers notifications over an unbounded channel to the UI loop.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    tx: mpsc::UnboundedSender<Notification>,
}

impl ChannelNotifier {
    /// Create a notifier and the receiver the UI drains.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (tx, rx) = mpsc::unbounded();
        (Self { tx }, rx)
    }
}

impl Notifier for ChannelNotifier {
    fn notify(&self, notification: Notification) -> Result<(), NotifyError> {
        self.tx
            .unbounded_send(notification)
            .map_err(|_| NotifyError::Closed)
    }
}

/// Writes notifications to the log. Used by headless front ends.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notification: Notification) -> Result<(), NotifyError> {
        match notification.level {
            NotificationLevel::Success => {
                tracing::info!(title = %notification.title, "{}", notification.text)
            }
            NotificationLevel::Error => {
                tracing::warn!(title = %notification.title, "{}", notification.text)
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_notifier_delivers() {
        let (notifier, mut rx) = ChannelNotifier::new();
        notifier
            .notify(Notification::success("Added to cart!", "Hat"))
            .unwrap();

        let received = rx.try_next().unwrap().unwrap();
        assert_eq!(received.level, NotificationLevel::Success);
        assert_eq!(received.title, "Added to cart!");
    }

    #[test]
    fn test_channel_notifier_closed() {
        let (notifier, rx) = ChannelNotifier::new();
        drop(rx);
        let err = notifier
            .notify(Notification::error("Oops...", "failed"))
            .unwrap_err();
        assert_eq!(err, NotifyError::Closed);
    }
}
