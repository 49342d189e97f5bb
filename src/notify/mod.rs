//! Operator notifications: the channel capability, its Telegram implementation,
//! and the notices the orchestrator sends through it.

mod messages;
mod telegram;

use async_trait::async_trait;

pub use messages::{render_template, InstanceSummary, MessageTemplates, Notifier};
pub use telegram::TelegramChannel;

/// A chat channel the hunter can post to.
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    /// Posts `text`; `false` when the message could not be delivered.
    async fn send_message(&self, text: &str) -> bool;

    /// Checks that the channel is reachable and authorised.
    async fn test_connection(&self) -> bool;
}
