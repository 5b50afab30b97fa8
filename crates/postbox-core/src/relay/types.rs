use crate::domain::{ChatId, MessageId};

/// Attachment payload of a message, as a closed tagged union.
///
/// Each recognized kind maps to a distinct platform send operation; anything
/// else degrades to a plain-text placeholder rather than failing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Attachment {
    Text,
    Photo { file_id: String },
    Video { file_id: String },
    Document { file_id: String },
    Audio { file_id: String },
    Voice { file_id: String },
    Sticker { file_id: String },
    Animation { file_id: String },
    Other,
}

impl Attachment {
    pub fn kind(&self) -> &'static str {
        match self {
            Attachment::Text => "text",
            Attachment::Photo { .. } => "photo",
            Attachment::Video { .. } => "video",
            Attachment::Document { .. } => "document",
            Attachment::Audio { .. } => "audio",
            Attachment::Voice { .. } => "voice",
            Attachment::Sticker { .. } => "sticker",
            Attachment::Animation { .. } => "animation",
            Attachment::Other => "other",
        }
    }
}

/// One inbound platform message, normalized for routing decisions.
///
/// The reply keyboard is kept opaque (platform JSON) so the core never
/// depends on Telegram types; the adapter round-trips it on delivery.
#[derive(Clone, Debug)]
pub struct InboundMessage {
    pub chat_id: ChatId,
    pub message_id: MessageId,
    pub text: Option<String>,
    pub caption: Option<String>,
    pub reply_to: Option<MessageId>,
    pub attachment: Attachment,
    pub reply_markup: Option<serde_json::Value>,
}

impl InboundMessage {
    /// Message text or media caption, whichever is present.
    pub fn body_text(&self) -> Option<&str> {
        self.text.as_deref().or(self.caption.as_deref())
    }
}

/// A message to re-emit to a user, preserving the attachment variant,
/// caption and any reply keyboard of the admin's original.
#[derive(Clone, Debug)]
pub struct OutboundPayload {
    pub attachment: Attachment,
    pub text: Option<String>,
    pub reply_markup: Option<serde_json::Value>,
}

impl From<&InboundMessage> for OutboundPayload {
    fn from(msg: &InboundMessage) -> Self {
        Self {
            attachment: msg.attachment.clone(),
            text: msg.body_text().map(|s| s.to_string()),
            reply_markup: msg.reply_markup.clone(),
        }
    }
}
