use super::*;
use shared::domain::UserId;

fn filled_user() -> User {
    User {
        user_id: UserId(11),
        message_id: Some(MessageId(3)),
        name: Some("Robin".into()),
        pronouns: Some("they/them".into()),
        description: Some("plays cello".into()),
        file_id: Some(FileId::new("photo-robin")),
        bot_metadata: None,
    }
}

#[test]
fn empty_profile_renders_placeholders() {
    let payload = render(&User::new(UserId(1)), None);
    let DisplayPayload::SendNew { page } = payload else {
        panic!("expected a new message payload");
    };
    assert_eq!(page.user_id, UserId(1));
    assert_eq!(page.photo, FileId::new(DEFAULT_PROFILE_IMAGE));
    assert_eq!(
        page.caption,
        format!(
            "{DEFAULT_PROFILE_NAME} | {DEFAULT_PROFILE_PRONOUNS}\n\n{DEFAULT_PROFILE_DESCRIPTION}"
        )
    );
}

#[test]
fn filled_profile_renders_its_own_values() {
    let payload = render(&filled_user(), None);
    let page = payload.page();
    assert_eq!(page.caption, "Robin | they/them\n\nplays cello");
    assert_eq!(page.photo, FileId::new("photo-robin"));
}

#[test]
fn each_missing_field_falls_back_independently() {
    let mut user = filled_user();
    user.pronouns = None;
    user.file_id = None;
    let page = render(&user, None).page().clone();
    assert_eq!(
        page.caption,
        format!("Robin | {DEFAULT_PROFILE_PRONOUNS}\n\nplays cello")
    );
    assert_eq!(page.photo.as_str(), DEFAULT_PROFILE_IMAGE);
}

#[test]
fn target_message_selects_edit_payload() {
    let payload = render(&filled_user(), Some(MessageId(99)));
    match payload {
        DisplayPayload::EditExisting { message_id, page } => {
            assert_eq!(message_id, MessageId(99));
            assert_eq!(page.caption, "Robin | they/them\n\nplays cello");
        }
        other => panic!("unexpected payload {other:?}"),
    }
}

#[test]
fn placeholder_markers_in_user_text_are_not_expanded() {
    let mut user = filled_user();
    user.name = Some("%pronouns%".into());
    assert_eq!(caption(&user), "%pronouns% | they/them\n\nplays cello");
}

#[test]
fn menu_has_five_buttons_in_fixed_order() {
    let payloads: Vec<String> = profile_buttons()
        .into_iter()
        .map(|b| b.action.payload())
        .collect();
    assert_eq!(
        payloads,
        vec!["edit/image", "edit/name", "edit/pronouns", "edit/info", "find/"]
    );
}
