//! Outbound chat notifications.
//!
//! Delivery is best-effort and at-most-once. Callers go through
//! [`Notifier`], which bounds every send with a timeout and turns failures
//! into log lines and a metric instead of errors. Deliveries triggered by a
//! request run on detached tasks so the request never waits on the transport.

use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;
use metrics::counter;
use thiserror::Error;
use tokio_util::task::TaskTracker;

/// Destination of an outbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recipient {
    /// A numeric chat or user identifier on the chat platform.
    Chat(String),
    /// A public handle, resolved by the transport if it can.
    Handle(String),
}

impl fmt::Display for Recipient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Recipient::Chat(id) => write!(f, "{}", id),
            Recipient::Handle(handle) => write!(f, "@{}", handle.trim_start_matches('@')),
        }
    }
}

/// Why a message could not be delivered.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NotificationError {
    #[error("Recipient could not be resolved: {0}")]
    UnresolvedRecipient(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Notification timed out")]
    Timeout,
}

/// Capability to send a text message to an external recipient.
#[async_trait]
pub trait NotificationGateway: Send + Sync {
    async fn send_text(&self, recipient: &Recipient, text: &str) -> Result<(), NotificationError>;

    /// Sends `text` and pins it in the destination chat. Transports that
    /// cannot pin only send.
    async fn send_pinned(&self, recipient: &Recipient, text: &str) -> Result<(), NotificationError> {
        self.send_text(recipient, text).await
    }
}

/// Gateway wrapper that bounds sends and swallows failures.
#[derive(Clone)]
pub struct Notifier {
    gateway: Arc<dyn NotificationGateway>,
    timeout: Duration,
    deliveries: TaskTracker,
}

impl Notifier {
    pub fn new(gateway: Arc<dyn NotificationGateway>, timeout: Duration) -> Self {
        Self {
            gateway,
            timeout,
            deliveries: TaskTracker::new(),
        }
    }

    /// Sends with a timeout and returns the outcome.
    pub async fn send(&self, recipient: &Recipient, text: &str) -> Result<(), NotificationError> {
        match tokio::time::timeout(self.timeout, self.gateway.send_text(recipient, text)).await {
            Ok(result) => result,
            Err(_) => Err(NotificationError::Timeout),
        }
    }

    /// Sends and pins with a timeout.
    pub async fn send_pinned(&self, recipient: &Recipient, text: &str) -> Result<(), NotificationError> {
        match tokio::time::timeout(self.timeout, self.gateway.send_pinned(recipient, text)).await {
            Ok(result) => result,
            Err(_) => Err(NotificationError::Timeout),
        }
    }

    /// Sends and logs any failure under `kind`. Returns whether delivery succeeded.
    pub async fn send_best_effort(&self, recipient: &Recipient, text: &str, kind: &'static str) -> bool {
        match self.send(recipient, text).await {
            Ok(()) => true,
            Err(err) => {
                counter!("notifications_failed_total", "kind" => kind).increment(1);
                tracing::warn!(
                    recipient = %recipient,
                    kind = kind,
                    error = %err,
                    "Notification delivery failed"
                );
                false
            }
        }
    }

    /// Sends `text` to every recipient concurrently. Returns the number of
    /// successful deliveries.
    pub async fn broadcast(&self, recipients: &[Recipient], text: &str, kind: &'static str) -> usize {
        join_all(
            recipients
                .iter()
                .map(|recipient| self.send_best_effort(recipient, text, kind)),
        )
        .await
        .into_iter()
        .filter(|delivered| *delivered)
        .count()
    }

    /// Runs `delivery` on a detached task tracked by this notifier.
    pub fn spawn<F>(&self, delivery: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.deliveries.spawn(delivery);
    }

    /// Waits until every delivery spawned so far has finished.
    pub async fn flush(&self) {
        self.deliveries.close();
        self.deliveries.wait().await;
        self.deliveries.reopen();
    }
}

/// A message captured by [`MockNotificationGateway`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub recipient: Recipient,
    pub text: String,
}

/// Mock gateway for development and testing.
///
/// Records every message it is asked to send. Handles listed in
/// `unresolvable` fail with `UnresolvedRecipient`; `simulate_failure` fails
/// every send with a transport error. A non-zero `delay` stalls each send
/// after it is recorded.
#[derive(Debug, Default)]
pub struct MockNotificationGateway {
    pub simulate_failure: bool,
    pub unresolvable: Vec<String>,
    pub delay: Duration,
    sent: Mutex<Vec<SentMessage>>,
    pinned: Mutex<Vec<SentMessage>>,
}

impl MockNotificationGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// A gateway where every send fails.
    pub fn failing() -> Self {
        Self {
            simulate_failure: true,
            ..Self::default()
        }
    }

    /// A gateway that cannot resolve the given handles.
    pub fn with_unresolvable(handles: &[&str]) -> Self {
        Self {
            unresolvable: handles.iter().map(|h| h.to_string()).collect(),
            ..Self::default()
        }
    }

    /// A gateway that stalls every send for `delay`.
    pub fn slow(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::default()
        }
    }

    /// Messages attempted so far, including failed ones.
    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }

    /// Messages that were sent and pinned.
    pub fn pinned(&self) -> Vec<SentMessage> {
        self.pinned.lock().map(|p| p.clone()).unwrap_or_default()
    }

    pub fn sent_to(&self, recipient: &Recipient) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter(|m| &m.recipient == recipient)
            .map(|m| m.text)
            .collect()
    }
}

#[async_trait]
impl NotificationGateway for MockNotificationGateway {
    async fn send_text(&self, recipient: &Recipient, text: &str) -> Result<(), NotificationError> {
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(SentMessage {
                recipient: recipient.clone(),
                text: text.to_string(),
            });
        }

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        if self.simulate_failure {
            tracing::warn!(recipient = %recipient, "Mock gateway simulating failure");
            return Err(NotificationError::Transport("Simulated failure".to_string()));
        }

        if let Recipient::Handle(handle) = recipient {
            if self.unresolvable.iter().any(|h| h == handle) {
                return Err(NotificationError::UnresolvedRecipient(recipient.to_string()));
            }
        }

        tracing::info!(recipient = %recipient, "Mock: Would send chat message");
        Ok(())
    }

    async fn send_pinned(&self, recipient: &Recipient, text: &str) -> Result<(), NotificationError> {
        self.send_text(recipient, text).await?;
        if let Ok(mut pinned) = self.pinned.lock() {
            pinned.push(SentMessage {
                recipient: recipient.clone(),
                text: text.to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recipient_display() {
        assert_eq!(Recipient::Chat("555".to_string()).to_string(), "555");
        assert_eq!(Recipient::Handle("alice".to_string()).to_string(), "@alice");
        assert_eq!(Recipient::Handle("@alice".to_string()).to_string(), "@alice");
    }

    #[tokio::test]
    async fn test_mock_records_messages() {
        let gateway = MockNotificationGateway::new();
        let to = Recipient::Chat("1".to_string());

        gateway.send_text(&to, "hello").await.unwrap();

        assert_eq!(gateway.sent_to(&to), vec!["hello".to_string()]);
    }

    #[tokio::test]
    async fn test_mock_unresolvable_handle() {
        let gateway = MockNotificationGateway::with_unresolvable(&["ghost"]);
        let result = gateway
            .send_text(&Recipient::Handle("ghost".to_string()), "hi")
            .await;
        assert!(matches!(result, Err(NotificationError::UnresolvedRecipient(_))));

        let ok = gateway
            .send_text(&Recipient::Handle("alice".to_string()), "hi")
            .await;
        assert!(ok.is_ok());
    }

    #[tokio::test]
    async fn test_notifier_times_out_slow_gateway() {
        let notifier = Notifier::new(
            Arc::new(MockNotificationGateway::slow(Duration::from_secs(5))),
            Duration::from_millis(20),
        );
        let result = notifier.send(&Recipient::Chat("1".to_string()), "hi").await;
        assert_eq!(result, Err(NotificationError::Timeout));
    }

    #[tokio::test]
    async fn test_send_best_effort_reports_failure() {
        let notifier = Notifier::new(
            Arc::new(MockNotificationGateway::failing()),
            Duration::from_secs(1),
        );
        let delivered = notifier
            .send_best_effort(&Recipient::Chat("1".to_string()), "hi", "test")
            .await;
        assert!(!delivered);
    }

    #[tokio::test]
    async fn test_broadcast_sends_concurrently() {
        let gateway = Arc::new(MockNotificationGateway::slow(Duration::from_secs(3600)));
        let notifier = Notifier::new(gateway.clone(), Duration::from_millis(200));
        let admins: Vec<Recipient> = ["1", "2", "3"]
            .iter()
            .map(|id| Recipient::Chat(id.to_string()))
            .collect();

        let started = std::time::Instant::now();
        let delivered = notifier.broadcast(&admins, "hi", "test").await;

        assert_eq!(delivered, 0);
        assert_eq!(gateway.sent().len(), 3);
        assert!(started.elapsed() < Duration::from_millis(500));
    }

    #[tokio::test]
    async fn test_spawned_delivery_does_not_block_caller() {
        let gateway = Arc::new(MockNotificationGateway::slow(Duration::from_millis(100)));
        let notifier = Notifier::new(gateway.clone(), Duration::from_secs(1));
        let to = Recipient::Chat("1".to_string());

        let task_notifier = notifier.clone();
        let task_to = to.clone();
        notifier.spawn(async move {
            task_notifier.send_best_effort(&task_to, "later", "test").await;
        });
        assert!(gateway.sent().is_empty());

        notifier.flush().await;
        assert_eq!(gateway.sent_to(&to), vec!["later".to_string()]);

        // The tracker accepts new deliveries after a flush.
        let again = notifier.clone();
        let again_to = to.clone();
        notifier.spawn(async move {
            again.send_best_effort(&again_to, "again", "test").await;
        });
        notifier.flush().await;
        assert_eq!(gateway.sent_to(&to).len(), 2);
    }
}
