use anyhow::{Context, Result};
use serde::Serialize;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow},
    Pool, Row, Sqlite,
};
use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};
use tracing::info;

use shared::{
    domain::{FileId, MessageId, NewProfile, User, UserId, UserUpdate},
    error::BotError,
};

const SELECT_USER: &str = "SELECT user_id, message_id, name, pronouns, description, file_id, bot_metadata
     FROM users WHERE user_id = ?";
const SELECT_ALL_USERS: &str = "SELECT user_id, message_id, name, pronouns, description, file_id, bot_metadata
     FROM users ORDER BY user_id";

/// Profile store over the `users` table. Every call runs in its own transaction.
#[derive(Clone)]
pub struct Storage {
    pool: Pool<Sqlite>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ProfileCounts {
    pub total: u64,
    pub complete: u64,
}

impl Storage {
    /// Opens (creating if needed) the database. Plain file paths are accepted.
    pub async fn new(database_url: &str) -> Result<Self> {
        let database_url = normalize_database_url(database_url);
        let database_url = database_url.as_str();
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        // Each in-memory connection is its own database, so keep exactly one alive.
        let pool_options = if is_memory_url(database_url) {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };
        let pool = pool_options
            .connect_with(connect_options)
            .await
            .with_context(|| format!("failed to open database '{database_url}'"))?;
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("failed to run users migrations")?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }

    pub async fn user_exists(&self, user_id: UserId) -> Result<bool> {
        let found: Option<i64> = sqlx::query_scalar("SELECT 1 FROM users WHERE user_id = ?")
            .bind(user_id.0)
            .fetch_optional(&self.pool)
            .await?;
        Ok(found.is_some())
    }

    pub async fn get_user(&self, user_id: UserId) -> Result<Option<User>> {
        let row = sqlx::query(SELECT_USER)
            .bind(user_id.0)
            .fetch_optional(&self.pool)
            .await?;
        row.map(|r| user_from_row(&r)).transpose()
    }

    pub async fn list_users(&self) -> Result<Vec<User>> {
        let rows = sqlx::query(SELECT_ALL_USERS)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(user_from_row).collect()
    }

    /// Inserts a new row. Fields left `None` in `fields` are stored as NULL.
    pub async fn add_user(&self, user_id: UserId, fields: &UserUpdate) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        insert_user(&mut tx, user_id, fields)
            .await
            .with_context(|| format!("failed to add user {user_id}"))?;
        tx.commit().await?;
        info!(%user_id, "added user");
        Ok(())
    }

    /// Overwrites only the fields that are `Some`; there is no way to clear a column.
    pub async fn update_user(&self, user_id: UserId, update: &UserUpdate) -> Result<()> {
        if update.is_empty() {
            return match self.user_exists(user_id).await? {
                true => Ok(()),
                false => Err(BotError::UserNotFound(user_id).into()),
            };
        }
        let mut tx = self.pool.begin().await?;
        let updated = sqlx::query(
            "UPDATE users SET
                message_id   = COALESCE(?, message_id),
                name         = COALESCE(?, name),
                pronouns     = COALESCE(?, pronouns),
                description  = COALESCE(?, description),
                file_id      = COALESCE(?, file_id),
                bot_metadata = COALESCE(?, bot_metadata)
             WHERE user_id = ?",
        )
        .bind(update.message_id.map(|m| m.0))
        .bind(update.name.as_deref())
        .bind(update.pronouns.as_deref())
        .bind(update.description.as_deref())
        .bind(update.file_id.as_ref().map(FileId::as_str))
        .bind(update.bot_metadata.as_deref())
        .bind(user_id.0)
        .execute(&mut *tx)
        .await?
        .rows_affected();
        if updated == 0 {
            return Err(BotError::UserNotFound(user_id).into());
        }
        tx.commit().await?;
        info!(%user_id, ?update, "updated user");
        Ok(())
    }

    /// Removes the row; fails when the user does not exist.
    pub async fn delete_user(&self, user_id: UserId) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        let deleted = sqlx::query("DELETE FROM users WHERE user_id = ?")
            .bind(user_id.0)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        if deleted == 0 {
            return Err(BotError::UserNotFound(user_id).into());
        }
        tx.commit().await?;
        info!(%user_id, "deleted user");
        Ok(())
    }

    /// Drops any existing row and writes a fresh, complete profile in one transaction.
    pub async fn replace_profile(&self, user_id: UserId, profile: NewProfile) -> Result<User> {
        let mut tx = self.pool.begin().await?;
        let replaced = sqlx::query("DELETE FROM users WHERE user_id = ?")
            .bind(user_id.0)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        let fields = UserUpdate {
            name: Some(profile.name),
            pronouns: Some(profile.pronouns),
            description: Some(profile.description),
            file_id: Some(profile.file_id),
            ..UserUpdate::default()
        };
        insert_user(&mut tx, user_id, &fields)
            .await
            .with_context(|| format!("failed to register user {user_id}"))?;
        tx.commit().await?;
        info!(%user_id, replaced = replaced > 0, "registered profile");

        Ok(User {
            user_id,
            message_id: None,
            name: fields.name,
            pronouns: fields.pronouns,
            description: fields.description,
            file_id: fields.file_id,
            bot_metadata: None,
        })
    }

    pub async fn count_profiles(&self) -> Result<ProfileCounts> {
        let row = sqlx::query(
            "SELECT
                COUNT(*),
                COALESCE(SUM(CASE WHEN name IS NOT NULL AND pronouns IS NOT NULL
                                   AND description IS NOT NULL AND file_id IS NOT NULL
                              THEN 1 ELSE 0 END), 0)
             FROM users",
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(ProfileCounts {
            total: row.get::<i64, _>(0) as u64,
            complete: row.get::<i64, _>(1) as u64,
        })
    }
}

async fn insert_user(
    tx: &mut sqlx::Transaction<'_, Sqlite>,
    user_id: UserId,
    fields: &UserUpdate,
) -> Result<()> {
    sqlx::query(
        "INSERT INTO users (user_id, message_id, name, pronouns, description, file_id, bot_metadata)
         VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(user_id.0)
    .bind(fields.message_id.map(|m| m.0))
    .bind(fields.name.as_deref())
    .bind(fields.pronouns.as_deref())
    .bind(fields.description.as_deref())
    .bind(fields.file_id.as_ref().map(FileId::as_str))
    .bind(fields.bot_metadata.as_deref())
    .execute(&mut **tx)
    .await?;
    Ok(())
}

fn user_from_row(row: &SqliteRow) -> Result<User> {
    Ok(User {
        user_id: UserId(row.try_get::<i64, _>("user_id")?),
        message_id: row.try_get::<Option<i64>, _>("message_id")?.map(MessageId),
        name: row.try_get("name")?,
        pronouns: row.try_get("pronouns")?,
        description: row.try_get("description")?,
        file_id: row.try_get::<Option<String>, _>("file_id")?.map(FileId),
        bot_metadata: row.try_get("bot_metadata")?,
    })
}

/// Turns a connection string into a sqlx SQLite URL: `sqlite:` and bare paths
/// become `sqlite://<path>`, anything carrying a scheme is kept.
pub fn normalize_database_url(raw_database_url: &str) -> String {
    let raw_database_url = raw_database_url.trim();

    if raw_database_url.is_empty()
        || raw_database_url.contains("://")
        || raw_database_url.starts_with("sqlite::memory:")
    {
        return raw_database_url.to_string();
    }

    let path = raw_database_url
        .strip_prefix("sqlite:")
        .unwrap_or(raw_database_url)
        .replace('\\', "/");
    format!("sqlite://{path}")
}

fn is_memory_url(database_url: &str) -> bool {
    database_url.starts_with("sqlite::memory:") || database_url.contains("mode=memory")
}

fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if is_memory_url(database_url) || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
