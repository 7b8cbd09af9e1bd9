use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

id_newtype!(UserId);
id_newtype!(MessageId);

/// Opaque platform reference to an uploaded image.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileId(pub String);

impl FileId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Text field of a profile that can be edited on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileField {
    Name,
    Pronouns,
    Description,
}

impl ProfileField {
    /// Tag used in button payloads and in the `bot_metadata` scratch column.
    pub fn tag(self) -> &'static str {
        match self {
            ProfileField::Name => "name",
            ProfileField::Pronouns => "pronouns",
            ProfileField::Description => "info",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "name" => Some(ProfileField::Name),
            "pronouns" => Some(ProfileField::Pronouns),
            "info" => Some(ProfileField::Description),
            _ => None,
        }
    }
}

/// One row of the `users` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub user_id: UserId,
    pub message_id: Option<MessageId>,
    pub name: Option<String>,
    pub pronouns: Option<String>,
    pub description: Option<String>,
    pub file_id: Option<FileId>,
    pub bot_metadata: Option<String>,
}

impl User {
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            message_id: None,
            name: None,
            pronouns: None,
            description: None,
            file_id: None,
            bot_metadata: None,
        }
    }

    /// A profile is complete once every displayed field has been filled.
    pub fn is_complete(&self) -> bool {
        self.name.is_some()
            && self.pronouns.is_some()
            && self.description.is_some()
            && self.file_id.is_some()
    }
}

/// Partial update of a user row. `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserUpdate {
    pub message_id: Option<MessageId>,
    pub name: Option<String>,
    pub pronouns: Option<String>,
    pub description: Option<String>,
    pub file_id: Option<FileId>,
    pub bot_metadata: Option<String>,
}

impl UserUpdate {
    pub fn message_id(message_id: MessageId) -> Self {
        Self {
            message_id: Some(message_id),
            ..Self::default()
        }
    }

    pub fn file_id(file_id: FileId) -> Self {
        Self {
            file_id: Some(file_id),
            ..Self::default()
        }
    }

    pub fn field(field: ProfileField, value: impl Into<String>) -> Self {
        let value = Some(value.into());
        match field {
            ProfileField::Name => Self {
                name: value,
                ..Self::default()
            },
            ProfileField::Pronouns => Self {
                pronouns: value,
                ..Self::default()
            },
            ProfileField::Description => Self {
                description: value,
                ..Self::default()
            },
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Completed registration data, written in one go.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProfile {
    pub name: String,
    pub pronouns: String,
    pub description: String,
    pub file_id: FileId,
}
