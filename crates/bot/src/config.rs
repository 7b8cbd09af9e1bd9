use std::{collections::HashMap, fs};

use shared::domain::UserId;

pub const CONFIG_FILE: &str = "bot.toml";
pub const DEFAULT_DATABASE_URL: &str = "sqlite://./data/bot.db";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    pub bot_token: Option<String>,
    pub admin_id: Option<UserId>,
    pub connection_string: Option<String>,
}

impl Settings {
    /// Names of the settings that are absent, in the order they are reported.
    pub fn missing(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.bot_token.is_none() {
            missing.push("BOT_TOKEN");
        }
        if self.connection_string.is_none() {
            missing.push("CONNECTION_STRING");
        }
        if self.admin_id.is_none() {
            missing.push("ADMIN_ID");
        }
        missing
    }

    pub fn database_url(&self) -> &str {
        self.connection_string
            .as_deref()
            .unwrap_or(DEFAULT_DATABASE_URL)
    }
}

pub fn load_settings() -> Settings {
    let file = fs::read_to_string(CONFIG_FILE).ok();
    load_settings_with(file.as_deref(), |key| std::env::var(key).ok())
}

/// Layers `bot.toml` under the environment; `APP__` keys win over plain ones.
pub fn load_settings_with(
    file: Option<&str>,
    env: impl Fn(&str) -> Option<String>,
) -> Settings {
    let mut bot_token = None;
    let mut admin_id = None;
    let mut connection_string = None;

    if let Some(raw) = file {
        match toml::from_str::<HashMap<String, String>>(raw) {
            Ok(file_cfg) => {
                bot_token = file_cfg.get("bot_token").cloned();
                admin_id = file_cfg.get("admin_id").cloned();
                connection_string = file_cfg.get("connection_string").cloned();
            }
            Err(error) => tracing::warn!(%error, "ignoring unreadable {CONFIG_FILE}"),
        }
    }

    for key in ["BOT_TOKEN", "APP__BOT_TOKEN"] {
        if let Some(v) = env(key) {
            bot_token = Some(v);
        }
    }
    for key in ["ADMIN_ID", "APP__ADMIN_ID"] {
        if let Some(v) = env(key) {
            admin_id = Some(v);
        }
    }
    for key in ["CONNECTION_STRING", "APP__CONNECTION_STRING"] {
        if let Some(v) = env(key) {
            connection_string = Some(v);
        }
    }

    Settings {
        bot_token: bot_token.filter(|v| !v.trim().is_empty()),
        admin_id: admin_id.and_then(|raw| match raw.trim().parse::<i64>() {
            Ok(id) => Some(UserId(id)),
            Err(_) => {
                tracing::warn!(value = %raw, "ADMIN_ID is not a numeric identity");
                None
            }
        }),
        connection_string: connection_string.filter(|v| !v.trim().is_empty()),
    }
}

/// Falls back to the default database when no connection string is set.
pub fn prepare_database_url(raw_database_url: &str) -> String {
    if raw_database_url.trim().is_empty() {
        return DEFAULT_DATABASE_URL.to_string();
    }
    storage::normalize_database_url(raw_database_url)
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
