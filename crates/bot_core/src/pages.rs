//! Profile card rendering.

use shared::{
    domain::{FileId, MessageId, ProfileField, User},
    protocol::{Button, CallbackAction, DisplayPayload, ProfilePage},
};

pub const DEFAULT_PROFILE_IMAGE: &str =
    "AgACAgIAAxkBAAIeCGTD4fKDSi4S6-7Iz8g3_4Jg4SwlAAJKyzEbUTcgSlIiOnPYXL7LAQADAgADcwADLwQ";
pub const DEFAULT_PROFILE_NAME: &str = "<ваше имя/никнейм>";
pub const DEFAULT_PROFILE_PRONOUNS: &str = "<ваши местоимения>";
pub const DEFAULT_PROFILE_DESCRIPTION: &str = "<тут ваше прекрасное био>";

/// Renders a user's card. With `message_id` the payload edits that message in
/// place, otherwise it is sent as a new message.
pub fn render(user: &User, message_id: Option<MessageId>) -> DisplayPayload {
    let page = ProfilePage {
        user_id: user.user_id,
        photo: user
            .file_id
            .clone()
            .unwrap_or_else(|| FileId::new(DEFAULT_PROFILE_IMAGE)),
        caption: caption(user),
        buttons: profile_buttons(),
    };

    match message_id {
        Some(message_id) => DisplayPayload::EditExisting { message_id, page },
        None => DisplayPayload::SendNew { page },
    }
}

pub fn caption(user: &User) -> String {
    let name = user.name.as_deref().unwrap_or(DEFAULT_PROFILE_NAME);
    let pronouns = user.pronouns.as_deref().unwrap_or(DEFAULT_PROFILE_PRONOUNS);
    let description = user
        .description
        .as_deref()
        .unwrap_or(DEFAULT_PROFILE_DESCRIPTION);
    format!("{name} | {pronouns}\n\n{description}")
}

pub fn profile_buttons() -> Vec<Button> {
    vec![
        Button::new("Изменить фото", CallbackAction::EditPhoto),
        Button::new("Изменить имя", CallbackAction::EditText(ProfileField::Name)),
        Button::new(
            "Изменить местоимения",
            CallbackAction::EditText(ProfileField::Pronouns),
        ),
        Button::new(
            "Изменить описание",
            CallbackAction::EditText(ProfileField::Description),
        ),
        Button::new("« К карусели", CallbackAction::Browse),
    ]
}

#[cfg(test)]
#[path = "tests/pages_tests.rs"]
mod tests;
