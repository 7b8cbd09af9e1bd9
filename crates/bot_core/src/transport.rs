use anyhow::Result;
use async_trait::async_trait;
use shared::{
    domain::{MessageId, UserId},
    protocol::{DisplayPayload, TextFormat},
};

/// Outbound side of the messaging platform. Each call either succeeds or fails
/// as a whole.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send_text(&self, to: UserId, text: &str, format: TextFormat) -> Result<MessageId>;

    /// Sends a new card or replaces the media of an existing one. Returns the
    /// id of the message now showing the card.
    async fn display(&self, payload: &DisplayPayload) -> Result<MessageId>;

    async fn edit_caption(&self, chat: UserId, message_id: MessageId, caption: &str) -> Result<()>;

    async fn delete_message(&self, chat: UserId, message_id: MessageId) -> Result<()>;

    async fn forward_message(
        &self,
        to: UserId,
        from: UserId,
        message_id: MessageId,
    ) -> Result<MessageId>;
}
