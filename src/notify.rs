use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
#[error("notification to {recipient} failed: {reason}")]
pub struct NotifyError {
    pub recipient: String,
    pub reason: String,
}

/// Outbound message channel (mail, SMS, push). Only success or failure
/// matters to the booking lifecycle.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, recipient: &str, subject: &str, body: &str) -> Result<(), NotifyError>;
}

/// Writes notifications to the log instead of delivering them.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, recipient: &str, subject: &str, body: &str) -> Result<(), NotifyError> {
        info!(recipient, subject, body, "notification sent");
        Ok(())
    }
}

/// What happened to the notification attached to a lifecycle transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationOutcome {
    Sent,
    Skipped,
    Failed(String),
}

pub async fn deliver(
    notifier: &dyn Notifier,
    recipient: Option<&str>,
    subject: &str,
    body: &str,
) -> NotificationOutcome {
    let Some(recipient) = recipient else {
        return NotificationOutcome::Skipped;
    };

    match notifier.send(recipient, subject, body).await {
        Ok(()) => NotificationOutcome::Sent,
        Err(err) => {
            warn!(error = %err, "notification failed; state change kept");
            NotificationOutcome::Failed(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::{deliver, LogNotifier, NotificationOutcome, Notifier, NotifyError};

    struct Unreachable;

    #[async_trait]
    impl Notifier for Unreachable {
        async fn send(&self, recipient: &str, _subject: &str, _body: &str) -> Result<(), NotifyError> {
            Err(NotifyError {
                recipient: recipient.to_string(),
                reason: "connection refused".to_string(),
            })
        }
    }

    #[tokio::test]
    async fn missing_recipient_is_skipped() {
        let outcome = deliver(&LogNotifier, None, "subject", "body").await;
        assert_eq!(outcome, NotificationOutcome::Skipped);
    }

    #[tokio::test]
    async fn failure_is_reported_not_propagated() {
        let outcome = deliver(&Unreachable, Some("a@example.com"), "subject", "body").await;
        assert!(matches!(outcome, NotificationOutcome::Failed(msg) if msg.contains("connection refused")));
    }

    #[tokio::test]
    async fn log_notifier_always_succeeds() {
        let outcome = deliver(&LogNotifier, Some("a@example.com"), "subject", "body").await;
        assert_eq!(outcome, NotificationOutcome::Sent);
    }
}
