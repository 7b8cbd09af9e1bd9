//! Telegram adapter: turns updates into [`InboundEvent`]s and implements
//! [`Transport`] over the Bot API.

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use bot_core::{Controller, Transport};
use shared::{
    domain::{FileId, MessageId, UserId},
    error::classify,
    protocol::{BotCommand, Button, Content, DisplayPayload, InboundEvent, Sender, TextFormat},
};
use teloxide::{
    dispatching::UpdateFilterExt,
    payloads::setters::*,
    prelude::*,
    types::{
        CallbackQuery, ChatId, InlineKeyboardButton, InlineKeyboardMarkup, InputFile, InputMedia,
        InputMediaPhoto, Message, MessageId as TgMessageId, ParseMode, Update, User as TgUser,
    },
    ApiError, RequestError,
};
use tracing::{debug, error, warn};

pub type BotController = Controller<TelegramTransport>;

pub struct TelegramTransport {
    bot: Bot,
}

impl TelegramTransport {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl Transport for TelegramTransport {
    async fn send_text(&self, to: UserId, text: &str, format: TextFormat) -> Result<MessageId> {
        let mut request = self.bot.send_message(chat(to), text);
        if format == TextFormat::MarkdownV2 {
            request = request.parse_mode(ParseMode::MarkdownV2);
        }
        let sent = request.await?;
        Ok(sent_id(&sent))
    }

    async fn display(&self, payload: &DisplayPayload) -> Result<MessageId> {
        match payload {
            DisplayPayload::SendNew { page } => {
                let sent = self
                    .bot
                    .send_photo(chat(page.user_id), InputFile::file_id(page.photo.as_str()))
                    .caption(page.caption.as_str())
                    .reply_markup(keyboard(&page.buttons))
                    .await?;
                Ok(sent_id(&sent))
            }
            DisplayPayload::EditExisting { message_id, page } => {
                let media = InputMedia::Photo(
                    InputMediaPhoto::new(InputFile::file_id(page.photo.as_str()))
                        .caption(page.caption.as_str()),
                );
                let result = self
                    .bot
                    .edit_message_media(chat(page.user_id), tg_message_id(*message_id)?, media)
                    .reply_markup(keyboard(&page.buttons))
                    .await;
                ignore_not_modified(result.map(|_| ()))?;
                Ok(*message_id)
            }
        }
    }

    async fn edit_caption(&self, chat_id: UserId, message_id: MessageId, caption: &str) -> Result<()> {
        let result = self
            .bot
            .edit_message_caption(chat(chat_id), tg_message_id(message_id)?)
            .caption(caption)
            .await;
        ignore_not_modified(result.map(|_| ()))
    }

    async fn delete_message(&self, chat_id: UserId, message_id: MessageId) -> Result<()> {
        self.bot
            .delete_message(chat(chat_id), tg_message_id(message_id)?)
            .await?;
        Ok(())
    }

    async fn forward_message(
        &self,
        to: UserId,
        from: UserId,
        message_id: MessageId,
    ) -> Result<MessageId> {
        let forwarded = self
            .bot
            .forward_message(chat(to), chat(from), tg_message_id(message_id)?)
            .await?;
        Ok(sent_id(&forwarded))
    }
}

/// Polls for updates until interrupted, one controller turn per update.
/// Updates queued while the bot was offline are dropped.
pub async fn run(bot: Bot, controller: Arc<BotController>) {
    if let Err(error) = bot.delete_webhook().drop_pending_updates(true).await {
        warn!(%error, "could not drop pending updates");
    }

    let handler = dptree::entry()
        .branch(Update::filter_message().endpoint(on_message))
        .branch(Update::filter_callback_query().endpoint(on_callback));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![controller])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
}

async fn on_message(msg: Message, controller: Arc<BotController>) -> Result<()> {
    match message_event(&msg) {
        Some(event) => run_turn(&controller, event).await,
        None => debug!(chat_id = msg.chat.id.0, "ignoring message without sender"),
    }
    Ok(())
}

async fn on_callback(
    bot: Bot,
    query: CallbackQuery,
    controller: Arc<BotController>,
) -> Result<()> {
    let ack = bot.answer_callback_query(query.id.clone()).await.map(|_| ());
    press_button(&*controller, &query, ack).await;
    Ok(())
}

/// Runs the turn for a button press whether or not the platform took the
/// acknowledgement; stale queries are rejected but their presses still count.
pub async fn press_button<T: Transport>(
    controller: &Controller<T>,
    query: &CallbackQuery,
    ack: Result<(), RequestError>,
) {
    if let Err(error) = ack {
        warn!(user_id = query.from.id.0, %error, "callback acknowledgement failed");
    }
    match callback_event(query) {
        Some(event) => run_turn(controller, event).await,
        None => debug!(user_id = query.from.id.0, "ignoring button without payload"),
    }
}

/// A failed turn is logged and produces no reply.
async fn run_turn<T: Transport>(controller: &Controller<T>, event: InboundEvent) {
    let user_id = event.user_id();
    if let Err(error) = controller.handle(event).await {
        error!(%user_id, code = ?classify(&*error), "turn failed: {error:#}");
    }
}

pub fn message_event(msg: &Message) -> Option<InboundEvent> {
    let sender = sender(msg.from()?);
    let message_id = sent_id(msg);

    if let Some(text) = msg.text() {
        if let Some(command) = BotCommand::parse(text) {
            return Some(InboundEvent::Command {
                sender,
                message_id,
                command,
            });
        }
        return Some(InboundEvent::Message {
            sender,
            message_id,
            content: Content::Text(text.to_string()),
        });
    }

    // Telegram lists photo sizes smallest first.
    let content = match msg.photo().and_then(|sizes| sizes.last()) {
        Some(largest) => Content::Image(FileId::new(largest.file.id.clone())),
        None => Content::Other,
    };
    Some(InboundEvent::Message {
        sender,
        message_id,
        content,
    })
}

pub fn callback_event(query: &CallbackQuery) -> Option<InboundEvent> {
    let payload = query.data.clone()?;
    Some(InboundEvent::ButtonPress {
        sender: sender(&query.from),
        message_id: query.message.as_ref().map(sent_id),
        payload,
    })
}

pub fn keyboard(buttons: &[Button]) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(buttons.iter().map(|button| {
        vec![InlineKeyboardButton::callback(
            button.label.clone(),
            button.action.payload(),
        )]
    }))
}

fn sender(user: &TgUser) -> Sender {
    Sender {
        user_id: UserId(user.id.0 as i64),
        username: user.username.clone(),
        first_name: user.first_name.clone(),
    }
}

fn chat(user_id: UserId) -> ChatId {
    ChatId(user_id.0)
}

fn sent_id(msg: &Message) -> MessageId {
    MessageId(i64::from(msg.id.0))
}

fn tg_message_id(message_id: MessageId) -> Result<TgMessageId> {
    let raw = i32::try_from(message_id.0)
        .with_context(|| format!("message id {message_id} is out of range"))?;
    Ok(TgMessageId(raw))
}

fn ignore_not_modified(result: Result<(), RequestError>) -> Result<()> {
    match result {
        Err(RequestError::Api(ApiError::MessageNotModified)) => Ok(()),
        other => Ok(other?),
    }
}

#[cfg(test)]
#[path = "tests/telegram_tests.rs"]
mod tests;
