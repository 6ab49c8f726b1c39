//! Post-commit notification events
//!
//! The engine never renders or delivers notifications. After a financial
//! commit it publishes one event per settled/locked/failed operation onto
//! an outbound channel; delivery is a collaborator reading the other end.
//! Publishing is best-effort and never affects the committed result.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Email,
    Sms,
    Push,
    InApp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    DepositSettled,
    DepositFailed,
    WithdrawalInitiated,
    WithdrawalFailed,
    TransferSent,
    TransferReceived,
    WalletLocked,
    BalanceAdjusted,
}

impl EventType {
    pub fn category(&self) -> &'static str {
        match self {
            EventType::DepositSettled | EventType::DepositFailed => "deposit",
            EventType::WithdrawalInitiated | EventType::WithdrawalFailed => "withdrawal",
            EventType::TransferSent | EventType::TransferReceived => "transfer",
            EventType::WalletLocked => "security",
            EventType::BalanceAdjusted => "adjustment",
        }
    }

    /// Default delivery channels per event class. Security events go wide.
    pub fn default_channels(&self) -> Vec<Channel> {
        match self {
            EventType::WalletLocked => vec![Channel::Email, Channel::Sms, Channel::Push],
            EventType::WithdrawalFailed | EventType::DepositFailed => {
                vec![Channel::Email, Channel::Push]
            }
            _ => vec![Channel::Push, Channel::InApp],
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NotificationEvent {
    pub user_id: i64,
    pub event_type: EventType,
    pub category: &'static str,
    pub channels: Vec<Channel>,
    pub data: serde_json::Value,
}

impl NotificationEvent {
    pub fn new(user_id: i64, event_type: EventType, data: serde_json::Value) -> Self {
        Self {
            user_id,
            event_type,
            category: event_type.category(),
            channels: event_type.default_channels(),
            data,
        }
    }
}

/// Sender half of the outbound event queue.
#[derive(Clone)]
pub struct EventPublisher {
    tx: mpsc::UnboundedSender<NotificationEvent>,
}

impl EventPublisher {
    /// Create a publisher and the receiver the notification collaborator
    /// will drain.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<NotificationEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Fire-and-forget publish. A closed channel is logged and dropped.
    pub fn publish(&self, event: NotificationEvent) {
        if let Err(e) = self.tx.send(event) {
            warn!(
                user_id = e.0.user_id,
                event_type = ?e.0.event_type,
                "notification channel closed, event dropped"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_publish_and_drain() {
        let (publisher, mut rx) = EventPublisher::channel();
        publisher.publish(NotificationEvent::new(
            42,
            EventType::DepositSettled,
            serde_json::json!({"amount": "1000"}),
        ));

        let event = rx.recv().await.unwrap();
        assert_eq!(event.user_id, 42);
        assert_eq!(event.category, "deposit");
        assert!(!event.channels.is_empty());
    }

    #[tokio::test]
    async fn test_closed_channel_does_not_panic() {
        let (publisher, rx) = EventPublisher::channel();
        drop(rx);
        publisher.publish(NotificationEvent::new(
            1,
            EventType::WalletLocked,
            serde_json::Value::Null,
        ));
    }

    #[test]
    fn test_lock_events_go_wide() {
        let channels = EventType::WalletLocked.default_channels();
        assert!(channels.contains(&Channel::Sms));
    }
}
