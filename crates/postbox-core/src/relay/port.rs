use async_trait::async_trait;

use crate::{
    domain::{ChatId, MessageId, MessageRef},
    relay::types::OutboundPayload,
    Result,
};

/// Platform port.
///
/// Telegram is the first implementation; the shape is small enough that a
/// future adapter only needs these four operations. None of them retry:
/// failures are surfaced to the caller, which decides whether to tell the
/// admin or just log.
#[async_trait]
pub trait RelayPort: Send + Sync {
    /// Send plain text to a chat.
    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<MessageRef>;

    /// True platform forward of an existing message into another chat.
    async fn forward(
        &self,
        to: ChatId,
        from: ChatId,
        message_id: MessageId,
    ) -> Result<MessageRef>;

    /// Re-emit a message preserving its attachment variant, caption,
    /// formatting and reply keyboard.
    async fn deliver(&self, chat_id: ChatId, payload: &OutboundPayload) -> Result<MessageRef>;

    /// Register the inbound webhook with the platform.
    async fn register_webhook(&self, url: &str, secret: &str) -> Result<()>;
}
