use serde::{Deserialize, Serialize};

use crate::domain::{FileId, MessageId, ProfileField, UserId};

/// Who sent an inbound event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sender {
    pub user_id: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    pub first_name: String,
}

impl Sender {
    pub fn new(user_id: UserId, first_name: impl Into<String>) -> Self {
        Self {
            user_id,
            username: None,
            first_name: first_name.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BotCommand {
    /// `/start`: show the profile card, creating an empty profile if needed.
    Start,
    /// `/register` or `/login`: restart the registration dialogue.
    Register,
    /// `/link`: echo back a mention of the sender.
    Link,
    /// `/stats`: operator-only counters.
    Stats,
    Unknown(String),
}

impl BotCommand {
    /// Parses `/name` or `/name@botname`, ignoring any trailing arguments.
    pub fn parse(text: &str) -> Option<Self> {
        let head = text.split_whitespace().next()?;
        let name = head.strip_prefix('/')?;
        let name = name.split('@').next().unwrap_or_default();
        if name.is_empty() {
            return None;
        }
        let command = match name.to_ascii_lowercase().as_str() {
            "start" => BotCommand::Start,
            "register" | "login" => BotCommand::Register,
            "link" => BotCommand::Link,
            "stats" => BotCommand::Stats,
            other => BotCommand::Unknown(other.to_string()),
        };
        Some(command)
    }
}

/// Transport-classified kind of an inbound message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Content {
    Text(String),
    Image(FileId),
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum InboundEvent {
    Command {
        sender: Sender,
        message_id: MessageId,
        command: BotCommand,
    },
    Message {
        sender: Sender,
        message_id: MessageId,
        content: Content,
    },
    ButtonPress {
        sender: Sender,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message_id: Option<MessageId>,
        payload: String,
    },
}

impl InboundEvent {
    pub fn sender(&self) -> &Sender {
        match self {
            InboundEvent::Command { sender, .. }
            | InboundEvent::Message { sender, .. }
            | InboundEvent::ButtonPress { sender, .. } => sender,
        }
    }

    pub fn user_id(&self) -> UserId {
        self.sender().user_id
    }
}

/// Decoded button payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallbackAction {
    EditPhoto,
    EditText(ProfileField),
    /// Back to the profile carousel, which this bot does not serve.
    Browse,
}

impl CallbackAction {
    pub fn parse(payload: &str) -> Option<Self> {
        if payload == "find/" {
            return Some(CallbackAction::Browse);
        }
        let field = payload.strip_prefix("edit/")?;
        if field == "image" {
            return Some(CallbackAction::EditPhoto);
        }
        ProfileField::from_tag(field).map(CallbackAction::EditText)
    }

    pub fn payload(self) -> String {
        match self {
            CallbackAction::EditPhoto => "edit/image".to_string(),
            CallbackAction::EditText(field) => format!("edit/{}", field.tag()),
            CallbackAction::Browse => "find/".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Button {
    pub label: String,
    pub action: CallbackAction,
}

impl Button {
    pub fn new(label: impl Into<String>, action: CallbackAction) -> Self {
        Self {
            label: label.into(),
            action,
        }
    }
}

/// Image, caption and menu making up a rendered profile card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfilePage {
    pub user_id: UserId,
    pub photo: FileId,
    pub caption: String,
    /// One button per row.
    pub buttons: Vec<Button>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DisplayPayload {
    SendNew {
        page: ProfilePage,
    },
    EditExisting {
        message_id: MessageId,
        page: ProfilePage,
    },
}

impl DisplayPayload {
    pub fn page(&self) -> &ProfilePage {
        match self {
            DisplayPayload::SendNew { page } | DisplayPayload::EditExisting { page, .. } => page,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextFormat {
    #[default]
    Plain,
    MarkdownV2,
}
