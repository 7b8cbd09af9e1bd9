use super::*;
use shared::domain::ProfileField;

fn profile(name: &str, file_id: &str) -> NewProfile {
    NewProfile {
        name: name.into(),
        pronouns: "she/her".into(),
        description: "likes tea".into(),
        file_id: FileId::new(file_id),
    }
}

#[tokio::test]
async fn health_check_succeeds_for_live_pool() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    storage.health_check().await.expect("health check");
}

#[tokio::test]
async fn creates_database_file_when_missing() {
    let suffix = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    let temp_root = std::env::temp_dir().join(format!("profile_bot_storage_test_{suffix}"));
    let db_path = temp_root.join("nested").join("storage.db");
    let database_url = format!("sqlite://{}", db_path.to_string_lossy().replace('\\', "/"));

    let storage = Storage::new(&database_url).await.expect("db");
    storage.add_user(UserId(1), &UserUpdate::default()).await.expect("add");
    drop(storage);

    assert!(
        db_path.exists(),
        "database file should exist: {}",
        db_path.display()
    );

    let reopened = Storage::new(&database_url).await.expect("reopen");
    assert!(reopened.user_exists(UserId(1)).await.expect("exists"));
    drop(reopened);

    std::fs::remove_dir_all(temp_root).expect("cleanup");
}

#[tokio::test]
async fn exists_flips_after_add() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    assert!(!storage.user_exists(UserId(100)).await.expect("exists"));
    storage
        .add_user(UserId(100), &UserUpdate::default())
        .await
        .expect("add");
    assert!(storage.user_exists(UserId(100)).await.expect("exists"));
    assert!(!storage.user_exists(UserId(101)).await.expect("exists"));
}

#[tokio::test]
async fn added_user_defaults_to_nulls() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    storage
        .add_user(UserId(5), &UserUpdate::default())
        .await
        .expect("add");
    let user = storage.get_user(UserId(5)).await.expect("get").expect("row");
    assert_eq!(user, User::new(UserId(5)));
    assert!(!user.is_complete());
}

#[tokio::test]
async fn add_with_fields_stores_them() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let fields = UserUpdate {
        name: Some("Ann".into()),
        message_id: Some(MessageId(12)),
        ..UserUpdate::default()
    };
    storage.add_user(UserId(5), &fields).await.expect("add");
    let user = storage.get_user(UserId(5)).await.expect("get").expect("row");
    assert_eq!(user.name.as_deref(), Some("Ann"));
    assert_eq!(user.message_id, Some(MessageId(12)));
    assert!(user.pronouns.is_none());
}

#[tokio::test]
async fn adding_same_user_twice_fails() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    storage
        .add_user(UserId(5), &UserUpdate::default())
        .await
        .expect("add");
    storage
        .add_user(UserId(5), &UserUpdate::default())
        .await
        .expect_err("primary key conflict");
}

#[tokio::test]
async fn get_missing_user_is_none() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    assert!(storage.get_user(UserId(404)).await.expect("get").is_none());
}

#[tokio::test]
async fn update_leaves_unset_fields_untouched() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    storage
        .replace_profile(UserId(9), profile("Ann", "photo-1"))
        .await
        .expect("register");
    storage
        .update_user(UserId(9), &UserUpdate::message_id(MessageId(77)))
        .await
        .expect("message id");
    let before = storage.get_user(UserId(9)).await.expect("get").expect("row");

    storage
        .update_user(UserId(9), &UserUpdate::field(ProfileField::Pronouns, "they/them"))
        .await
        .expect("update");

    let after = storage.get_user(UserId(9)).await.expect("get").expect("row");
    assert_eq!(after.pronouns.as_deref(), Some("they/them"));
    assert_eq!(after.name, before.name);
    assert_eq!(after.description, before.description);
    assert_eq!(after.file_id, before.file_id);
    assert_eq!(after.message_id, Some(MessageId(77)));
    assert_eq!(after.bot_metadata, before.bot_metadata);
}

#[tokio::test]
async fn empty_update_changes_nothing() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    storage
        .replace_profile(UserId(9), profile("Ann", "photo-1"))
        .await
        .expect("register");
    let before = storage.get_user(UserId(9)).await.expect("get").expect("row");
    storage
        .update_user(UserId(9), &UserUpdate::default())
        .await
        .expect("update");
    let after = storage.get_user(UserId(9)).await.expect("get").expect("row");
    assert_eq!(before, after);
}

#[tokio::test]
async fn update_of_missing_user_reports_not_found() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let err = storage
        .update_user(UserId(3), &UserUpdate::field(ProfileField::Name, "x"))
        .await
        .expect_err("missing");
    assert!(matches!(
        err.downcast_ref::<BotError>(),
        Some(BotError::UserNotFound(UserId(3)))
    ));
}

#[tokio::test]
async fn delete_removes_row_and_fails_when_absent() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    storage
        .add_user(UserId(8), &UserUpdate::default())
        .await
        .expect("add");
    storage.delete_user(UserId(8)).await.expect("delete");
    assert!(!storage.user_exists(UserId(8)).await.expect("exists"));

    let err = storage.delete_user(UserId(8)).await.expect_err("absent");
    assert!(matches!(
        err.downcast_ref::<BotError>(),
        Some(BotError::UserNotFound(_))
    ));
}

#[tokio::test]
async fn replace_profile_overwrites_previous_row() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    storage
        .replace_profile(UserId(2), profile("Old", "old-photo"))
        .await
        .expect("first");
    storage
        .update_user(
            UserId(2),
            &UserUpdate {
                message_id: Some(MessageId(50)),
                bot_metadata: Some("name".into()),
                ..UserUpdate::default()
            },
        )
        .await
        .expect("update");

    let returned = storage
        .replace_profile(UserId(2), profile("New", "new-photo"))
        .await
        .expect("second");

    let stored = storage.get_user(UserId(2)).await.expect("get").expect("row");
    assert_eq!(stored, returned);
    assert_eq!(stored.name.as_deref(), Some("New"));
    assert_eq!(stored.file_id, Some(FileId::new("new-photo")));
    assert!(stored.message_id.is_none());
    assert!(stored.bot_metadata.is_none());
    assert!(stored.is_complete());
    assert_eq!(storage.list_users().await.expect("list").len(), 1);
}

#[tokio::test]
async fn counts_total_and_complete_profiles() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    assert_eq!(
        storage.count_profiles().await.expect("count"),
        ProfileCounts::default()
    );
    storage
        .add_user(UserId(1), &UserUpdate::default())
        .await
        .expect("add");
    storage
        .replace_profile(UserId(2), profile("B", "b"))
        .await
        .expect("register");
    storage
        .replace_profile(UserId(3), profile("C", "c"))
        .await
        .expect("register");

    let counts = storage.count_profiles().await.expect("count");
    assert_eq!(counts.total, 3);
    assert_eq!(counts.complete, 2);
}

#[tokio::test]
async fn lists_users_in_id_order() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    for id in [30, 10, 20] {
        storage
            .add_user(UserId(id), &UserUpdate::default())
            .await
            .expect("add");
    }
    let ids: Vec<i64> = storage
        .list_users()
        .await
        .expect("list")
        .into_iter()
        .map(|u| u.user_id.0)
        .collect();
    assert_eq!(ids, vec![10, 20, 30]);
}

#[test]
fn memory_urls_have_no_file_path() {
    assert_eq!(sqlite_path("sqlite::memory:"), None);
    assert_eq!(sqlite_path("sqlite://file:x?mode=memory"), None);
    assert_eq!(
        sqlite_path("sqlite://./data/bot.db?mode=rwc"),
        Some(PathBuf::from("./data/bot.db"))
    );
    assert_eq!(sqlite_path("postgres://localhost/db"), None);
}

#[tokio::test]
async fn empty_update_still_requires_the_user() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    storage
        .update_user(UserId(77), &UserUpdate::default())
        .await
        .expect_err("missing user");
}

#[tokio::test]
async fn opens_plain_nested_path_without_scheme() {
    let suffix = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    let temp_root = std::env::temp_dir().join(format!("profile_bot_plain_path_{suffix}"));
    let db_path = temp_root.join("nested").join("bot.db");

    let storage = Storage::new(db_path.to_string_lossy().as_ref())
        .await
        .expect("open plain path");
    storage.add_user(UserId(3), &UserUpdate::default()).await.expect("add");
    drop(storage);

    assert!(db_path.exists(), "missing {}", db_path.display());
    std::fs::remove_dir_all(temp_root).expect("cleanup");
}

#[test]
fn normalizes_connection_strings() {
    assert_eq!(normalize_database_url("./data/test.db"), "sqlite://./data/test.db");
    assert_eq!(normalize_database_url("sqlite:./data/test.db"), "sqlite://./data/test.db");
    assert_eq!(normalize_database_url("data\\profiles.db"), "sqlite://data/profiles.db");
    assert_eq!(normalize_database_url("sqlite::memory:"), "sqlite::memory:");
    assert_eq!(
        normalize_database_url(" sqlite:///var/lib/bot.db?mode=rwc "),
        "sqlite:///var/lib/bot.db?mode=rwc"
    );
}
