use anyhow::{Context, Result};
use shared::{
    domain::{FileId, MessageId, NewProfile, ProfileField, User, UserId, UserUpdate},
    error::BotError,
    protocol::{BotCommand, CallbackAction, Content, InboundEvent, Sender, TextFormat},
};
use storage::Storage;
use tracing::{debug, info};

use crate::{
    dialogue::{DialogueState, Draft, Registration, Sessions},
    pages::render,
    texts,
    transport::Transport,
};

/// Routes inbound events through the registration and edit dialogues.
///
/// State only advances once every side effect of a turn has succeeded, so a
/// failed turn leaves the identity where it was.
pub struct Controller<T> {
    storage: Storage,
    transport: T,
    sessions: Sessions,
    operator: Option<UserId>,
}

impl<T: Transport> Controller<T> {
    pub fn new(storage: Storage, transport: T) -> Self {
        Self {
            storage,
            transport,
            sessions: Sessions::new(),
            operator: None,
        }
    }

    pub fn with_operator(mut self, operator: Option<UserId>) -> Self {
        self.operator = operator;
        self
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub async fn state(&self, user_id: UserId) -> DialogueState {
        self.sessions.get(user_id).await
    }

    pub async fn handle(&self, event: InboundEvent) -> Result<()> {
        match event {
            InboundEvent::Command {
                sender,
                message_id,
                command,
            } => self.on_command(&sender, message_id, command).await,
            InboundEvent::Message {
                sender,
                message_id,
                content,
            } => self.on_message(&sender, message_id, content).await,
            InboundEvent::ButtonPress {
                sender,
                message_id,
                payload,
            } => self.on_button(&sender, message_id, &payload).await,
        }
    }

    async fn on_command(
        &self,
        sender: &Sender,
        message_id: MessageId,
        command: BotCommand,
    ) -> Result<()> {
        let user_id = sender.user_id;
        match command {
            BotCommand::Start => self.show_profile_card(user_id).await,
            BotCommand::Register => {
                self.transport
                    .send_text(user_id, texts::ASK_NAME, TextFormat::Plain)
                    .await?;
                self.transition(user_id, DialogueState::Registration(Registration::Name))
                    .await;
                Ok(())
            }
            BotCommand::Link => self.link(sender, message_id).await,
            BotCommand::Stats if self.operator == Some(user_id) => {
                let counts = self.storage.count_profiles().await?;
                let active = self.sessions.active().await;
                self.transport
                    .send_text(
                        user_id,
                        &texts::stats(counts.total, counts.complete, active),
                        TextFormat::Plain,
                    )
                    .await?;
                Ok(())
            }
            BotCommand::Stats | BotCommand::Unknown(_) => self.fallback(user_id).await,
        }
    }

    async fn show_profile_card(&self, user_id: UserId) -> Result<()> {
        if !self.storage.user_exists(user_id).await? {
            self.storage
                .add_user(user_id, &UserUpdate::default())
                .await?;
        }
        let user = self.load_user(user_id).await?;

        self.transport
            .send_text(user_id, texts::GREETING, TextFormat::Plain)
            .await?;
        let card = self.transport.display(&render(&user, None)).await?;
        self.storage
            .update_user(user_id, &UserUpdate::message_id(card))
            .await?;
        self.transition(user_id, DialogueState::Idle).await;
        Ok(())
    }

    async fn link(&self, sender: &Sender, message_id: MessageId) -> Result<()> {
        let user_id = sender.user_id;
        if let Some(username) = &sender.username {
            self.transport
                .send_text(user_id, &texts::hello_username(username), TextFormat::Plain)
                .await?;
        }
        self.transport
            .send_text(
                user_id,
                &texts::mention(&sender.first_name, user_id.0),
                TextFormat::MarkdownV2,
            )
            .await?;
        self.transport
            .forward_message(user_id, user_id, message_id)
            .await?;
        Ok(())
    }

    async fn on_message(
        &self,
        sender: &Sender,
        message_id: MessageId,
        content: Content,
    ) -> Result<()> {
        let user_id = sender.user_id;
        match (self.sessions.get(user_id).await, content) {
            (DialogueState::Registration(step), content) => {
                self.on_registration(user_id, step, content).await
            }
            (DialogueState::EditPhoto { card }, Content::Image(file_id)) => {
                self.finish_photo_edit(user_id, message_id, card, file_id)
                    .await
            }
            (DialogueState::EditPhoto { card }, _) => {
                debug!(%user_id, "expected an image for photo edit");
                self.transport
                    .edit_caption(user_id, card, &texts::edit_photo_retry())
                    .await
            }
            (DialogueState::EditText { field, card }, Content::Text(text)) => {
                self.finish_text_edit(user_id, message_id, card, field, text)
                    .await
            }
            (DialogueState::EditText { card, .. }, _) => {
                debug!(%user_id, "expected text for field edit");
                self.transport
                    .edit_caption(user_id, card, &texts::edit_text_retry())
                    .await
            }
            (DialogueState::Idle, _) => self.fallback(user_id).await,
        }
    }

    async fn on_registration(
        &self,
        user_id: UserId,
        step: Registration,
        content: Content,
    ) -> Result<()> {
        let next = match (step, content) {
            (Registration::Name, Content::Text(name)) => {
                self.ask(user_id, texts::ASK_PRONOUNS).await?;
                Registration::Pronouns { name }
            }
            (Registration::Pronouns { name }, Content::Text(pronouns)) => {
                self.ask(user_id, texts::ASK_DESCRIPTION).await?;
                Registration::Description { name, pronouns }
            }
            (Registration::Description { name, pronouns }, Content::Text(description)) => {
                self.ask(user_id, texts::ASK_PHOTO).await?;
                Registration::Photo(Draft {
                    name,
                    pronouns,
                    description,
                })
            }
            (Registration::Photo(draft), Content::Image(file_id)) => {
                return self.finish_registration(user_id, draft, file_id).await;
            }
            (Registration::Photo(_), _) => {
                debug!(%user_id, "expected an image to finish registration");
                return self.ask(user_id, texts::PHOTO_REQUIRED).await;
            }
            (_, _) => return self.fallback(user_id).await,
        };
        self.transition(user_id, DialogueState::Registration(next))
            .await;
        Ok(())
    }

    async fn finish_registration(
        &self,
        user_id: UserId,
        draft: Draft,
        file_id: FileId,
    ) -> Result<()> {
        let user = self
            .storage
            .replace_profile(
                user_id,
                NewProfile {
                    name: draft.name,
                    pronouns: draft.pronouns,
                    description: draft.description,
                    file_id,
                },
            )
            .await?;

        let card = self.transport.display(&render(&user, None)).await?;
        self.storage
            .update_user(user_id, &UserUpdate::message_id(card))
            .await?;
        info!(%user_id, card = %card, "registration complete");
        self.transition(user_id, DialogueState::Idle).await;
        Ok(())
    }

    async fn on_button(
        &self,
        sender: &Sender,
        message_id: Option<MessageId>,
        payload: &str,
    ) -> Result<()> {
        let user_id = sender.user_id;
        let field = match CallbackAction::parse(payload) {
            Some(CallbackAction::EditPhoto) => None,
            Some(CallbackAction::EditText(field)) => Some(field),
            Some(CallbackAction::Browse) | None => {
                debug!(%user_id, payload, "unhandled button");
                return self.fallback(user_id).await;
            }
        };

        if let DialogueState::Registration(step) = self.sessions.get(user_id).await {
            debug!(%user_id, step = ?step, "edit button discards registration draft");
        }

        let card = match message_id {
            Some(card) => card,
            None => self
                .load_user(user_id)
                .await?
                .message_id
                .ok_or(BotError::MissingProfileCard(user_id))?,
        };

        match field {
            None => {
                self.storage
                    .update_user(user_id, &UserUpdate::message_id(card))
                    .await?;
                self.transport
                    .edit_caption(user_id, card, texts::EDIT_PHOTO_PROMPT)
                    .await?;
                self.transition(user_id, DialogueState::EditPhoto { card })
                    .await;
            }
            Some(field) => {
                let update = UserUpdate {
                    message_id: Some(card),
                    bot_metadata: Some(field.tag().to_string()),
                    ..UserUpdate::default()
                };
                self.storage.update_user(user_id, &update).await?;
                self.transport
                    .edit_caption(user_id, card, texts::EDIT_TEXT_PROMPT)
                    .await?;
                self.transition(user_id, DialogueState::EditText { field, card })
                    .await;
            }
        }
        Ok(())
    }

    async fn finish_photo_edit(
        &self,
        user_id: UserId,
        input: MessageId,
        card: MessageId,
        file_id: FileId,
    ) -> Result<()> {
        self.storage
            .update_user(user_id, &UserUpdate::file_id(file_id))
            .await?;
        self.rerender_after_edit(user_id, input, card).await
    }

    async fn finish_text_edit(
        &self,
        user_id: UserId,
        input: MessageId,
        card: MessageId,
        field: ProfileField,
        text: String,
    ) -> Result<()> {
        self.storage
            .update_user(user_id, &UserUpdate::field(field, text))
            .await?;
        self.rerender_after_edit(user_id, input, card).await
    }

    async fn rerender_after_edit(
        &self,
        user_id: UserId,
        input: MessageId,
        card: MessageId,
    ) -> Result<()> {
        self.transport.delete_message(user_id, input).await?;
        let user = self.load_user(user_id).await?;
        self.transport.display(&render(&user, Some(card))).await?;
        self.transition(user_id, DialogueState::Idle).await;
        Ok(())
    }

    async fn ask(&self, user_id: UserId, question: &str) -> Result<()> {
        self.transport
            .send_text(user_id, question, TextFormat::Plain)
            .await?;
        Ok(())
    }

    async fn fallback(&self, user_id: UserId) -> Result<()> {
        self.ask(user_id, texts::FALLBACK).await
    }

    async fn load_user(&self, user_id: UserId) -> Result<User> {
        self.storage
            .get_user(user_id)
            .await
            .with_context(|| format!("failed to load user {user_id}"))?
            .ok_or_else(|| BotError::UserNotFound(user_id).into())
    }

    async fn transition(&self, user_id: UserId, next: DialogueState) {
        debug!(%user_id, state = ?next, "dialogue transition");
        self.sessions.set(user_id, next).await;
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
