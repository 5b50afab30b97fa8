//! Telegram adapter: implements the relay port with teloxide and converts
//! webhook updates into the core's inbound message type.

pub mod convert;

use async_trait::async_trait;
use teloxide::{
    payloads::setters::*,
    requests::Requester,
    types::{InlineKeyboardMarkup, InputFile, ParseMode, ReplyMarkup},
    Bot,
};
use tracing::debug;
use url::Url;

use postbox_core::{
    domain::{ChatId, MessageId, MessageRef},
    relay::{port::RelayPort, types::Attachment, types::OutboundPayload},
    Error, Result,
};

const UNSUPPORTED_PLACEHOLDER: &str =
    "[unsupported message type: the original could not be re-sent]";

/// Thin wrapper around a teloxide bot. Calls are never retried; the caller
/// decides what a failure means.
pub struct TelegramRelay {
    bot: Bot,
}

impl TelegramRelay {
    pub fn new(token: &str) -> Self {
        Self {
            bot: Bot::new(token),
        }
    }

    fn markup(payload: &OutboundPayload) -> Option<ReplyMarkup> {
        // The keyboard travels through the core as opaque JSON; anything
        // that fails to parse back is dropped rather than failing the send.
        let value = payload.reply_markup.clone()?;
        serde_json::from_value::<InlineKeyboardMarkup>(value)
            .ok()
            .map(ReplyMarkup::InlineKeyboard)
    }
}

fn api_err(e: teloxide::RequestError) -> Error {
    Error::Platform(e.to_string())
}

fn message_ref(msg: &teloxide::types::Message) -> MessageRef {
    MessageRef {
        chat_id: ChatId(msg.chat.id.0),
        message_id: MessageId(msg.id.0),
    }
}

#[async_trait]
impl RelayPort for TelegramRelay {
    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<MessageRef> {
        let msg = self
            .bot
            .send_message(teloxide::types::ChatId(chat_id.0), text)
            .await
            .map_err(api_err)?;
        Ok(message_ref(&msg))
    }

    async fn forward(&self, to: ChatId, from: ChatId, message_id: MessageId) -> Result<MessageRef> {
        let msg = self
            .bot
            .forward_message(
                teloxide::types::ChatId(to.0),
                teloxide::types::ChatId(from.0),
                teloxide::types::MessageId(message_id.0),
            )
            .await
            .map_err(api_err)?;
        Ok(message_ref(&msg))
    }

    async fn deliver(&self, chat_id: ChatId, payload: &OutboundPayload) -> Result<MessageRef> {
        let chat = teloxide::types::ChatId(chat_id.0);
        let caption = payload.text.clone();
        let markup = Self::markup(payload);

        debug!(chat = chat_id.0, kind = payload.attachment.kind(), "delivering");

        let msg = match &payload.attachment {
            Attachment::Text => {
                let text = payload.text.as_deref().unwrap_or_default();
                let mut req = self
                    .bot
                    .send_message(chat, text)
                    .parse_mode(ParseMode::Html);
                if let Some(markup) = markup {
                    req = req.reply_markup(markup);
                }
                req.await.map_err(api_err)?
            }
            Attachment::Photo { file_id } => {
                let mut req = self.bot.send_photo(chat, InputFile::file_id(file_id));
                if let Some(caption) = caption {
                    req = req.caption(caption).parse_mode(ParseMode::Html);
                }
                if let Some(markup) = markup {
                    req = req.reply_markup(markup);
                }
                req.await.map_err(api_err)?
            }
            Attachment::Video { file_id } => {
                let mut req = self.bot.send_video(chat, InputFile::file_id(file_id));
                if let Some(caption) = caption {
                    req = req.caption(caption).parse_mode(ParseMode::Html);
                }
                if let Some(markup) = markup {
                    req = req.reply_markup(markup);
                }
                req.await.map_err(api_err)?
            }
            Attachment::Document { file_id } => {
                let mut req = self.bot.send_document(chat, InputFile::file_id(file_id));
                if let Some(caption) = caption {
                    req = req.caption(caption).parse_mode(ParseMode::Html);
                }
                if let Some(markup) = markup {
                    req = req.reply_markup(markup);
                }
                req.await.map_err(api_err)?
            }
            Attachment::Audio { file_id } => {
                let mut req = self.bot.send_audio(chat, InputFile::file_id(file_id));
                if let Some(caption) = caption {
                    req = req.caption(caption).parse_mode(ParseMode::Html);
                }
                if let Some(markup) = markup {
                    req = req.reply_markup(markup);
                }
                req.await.map_err(api_err)?
            }
            Attachment::Voice { file_id } => {
                let mut req = self.bot.send_voice(chat, InputFile::file_id(file_id));
                if let Some(caption) = caption {
                    req = req.caption(caption).parse_mode(ParseMode::Html);
                }
                if let Some(markup) = markup {
                    req = req.reply_markup(markup);
                }
                req.await.map_err(api_err)?
            }
            // Stickers carry no caption in the Bot API.
            Attachment::Sticker { file_id } => {
                let mut req = self.bot.send_sticker(chat, InputFile::file_id(file_id));
                if let Some(markup) = markup {
                    req = req.reply_markup(markup);
                }
                req.await.map_err(api_err)?
            }
            Attachment::Animation { file_id } => {
                let mut req = self.bot.send_animation(chat, InputFile::file_id(file_id));
                if let Some(caption) = caption {
                    req = req.caption(caption).parse_mode(ParseMode::Html);
                }
                if let Some(markup) = markup {
                    req = req.reply_markup(markup);
                }
                req.await.map_err(api_err)?
            }
            Attachment::Other => self
                .bot
                .send_message(chat, UNSUPPORTED_PLACEHOLDER)
                .await
                .map_err(api_err)?,
        };
        Ok(message_ref(&msg))
    }

    async fn register_webhook(&self, url: &str, secret: &str) -> Result<()> {
        let url = Url::parse(url).map_err(|e| Error::Platform(format!("bad webhook url: {e}")))?;
        self.bot
            .set_webhook(url)
            .secret_token(secret.to_string())
            .await
            .map_err(api_err)?;
        Ok(())
    }
}
