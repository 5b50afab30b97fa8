//! Mapping from Telegram update payloads to the platform-neutral inbound
//! message used by the router.

use teloxide::types::{Message, Update, UpdateKind};

use postbox_core::{
    domain::{ChatId, MessageId},
    relay::types::{Attachment, InboundMessage},
};

/// Extract the routable message from an update, if it carries one.
/// Edited messages are treated like fresh ones; every other update kind
/// is acknowledged without action.
pub fn inbound_from_update(update: &Update) -> Option<InboundMessage> {
    match &update.kind {
        UpdateKind::Message(msg) | UpdateKind::EditedMessage(msg) => {
            Some(inbound_from_message(msg))
        }
        _ => None,
    }
}

pub fn inbound_from_message(msg: &Message) -> InboundMessage {
    InboundMessage {
        chat_id: ChatId(msg.chat.id.0),
        message_id: MessageId(msg.id.0),
        text: msg.text().map(|s| s.to_string()),
        caption: msg.caption().map(|s| s.to_string()),
        reply_to: msg.reply_to_message().map(|replied| MessageId(replied.id.0)),
        attachment: attachment_of(msg),
        reply_markup: msg
            .reply_markup()
            .and_then(|kb| serde_json::to_value(kb).ok()),
    }
}

fn attachment_of(msg: &Message) -> Attachment {
    // Largest photo size comes last in the Bot API array.
    if let Some(photo) = msg.photo().and_then(|sizes| sizes.last()) {
        return Attachment::Photo {
            file_id: photo.file.id.clone(),
        };
    }
    if let Some(video) = msg.video() {
        return Attachment::Video {
            file_id: video.file.id.clone(),
        };
    }
    // Animations also carry a document field; check them first.
    if let Some(animation) = msg.animation() {
        return Attachment::Animation {
            file_id: animation.file.id.clone(),
        };
    }
    if let Some(document) = msg.document() {
        return Attachment::Document {
            file_id: document.file.id.clone(),
        };
    }
    if let Some(audio) = msg.audio() {
        return Attachment::Audio {
            file_id: audio.file.id.clone(),
        };
    }
    if let Some(voice) = msg.voice() {
        return Attachment::Voice {
            file_id: voice.file.id.clone(),
        };
    }
    if let Some(sticker) = msg.sticker() {
        return Attachment::Sticker {
            file_id: sticker.file.id.clone(),
        };
    }
    if msg.text().is_some() {
        return Attachment::Text;
    }
    Attachment::Other
}
