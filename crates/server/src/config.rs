use std::env;

use anyhow::Context;
use ::config::{Config, Environment, File};
use serde::Deserialize;

use crate::auth::AuthConfig;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub bind_addr: String,
    pub database_url: String,
    pub jwt: JwtSettings,
    /// Account created at startup when missing; development only.
    pub dev_user: Option<DevUserSettings>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".into(),
            database_url: "sqlite://./data/admin.db".into(),
            jwt: JwtSettings::default(),
            dev_user: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct JwtSettings {
    pub secret: String,
    pub cookie_name: String,
    pub ttl_seconds: i64,
}

impl Default for JwtSettings {
    fn default() -> Self {
        Self {
            secret: "dev-secret-change-me".into(),
            cookie_name: "jwt".into(),
            ttl_seconds: 60 * 60 * 24,
        }
    }
}

impl JwtSettings {
    pub fn auth_config(&self) -> AuthConfig {
        AuthConfig {
            secret: self.secret.clone(),
            cookie_name: self.cookie_name.clone(),
            ttl_seconds: self.ttl_seconds,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DevUserSettings {
    pub username: String,
    pub password: String,
    pub email: String,
}

/// Defaults, then `server.toml` in the working directory, then `APP__*`
/// environment variables (`APP__JWT__SECRET`, `APP__DEV_USER__USERNAME`, ...).
pub fn load_settings() -> anyhow::Result<Settings> {
    let mut settings = load_settings_from("server")?;

    if let Ok(v) = env::var("SERVER_BIND") {
        settings.bind_addr = v;
    }
    if let Ok(v) = env::var("DATABASE_URL") {
        settings.database_url = v;
    }

    Ok(settings)
}

pub fn load_settings_from(file: &str) -> anyhow::Result<Settings> {
    Config::builder()
        .add_source(File::with_name(file).required(false))
        .add_source(
            Environment::with_prefix("APP")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .context("failed to read server configuration")?
        .try_deserialize()
        .context("invalid server configuration")
}

/// Plain file paths become `sqlite://` URLs; anything with a scheme is kept.
pub fn normalize_database_url(raw_database_url: &str) -> String {
    let raw_database_url = raw_database_url.trim();

    if raw_database_url.is_empty() {
        return Settings::default().database_url;
    }
    if raw_database_url.starts_with("sqlite::memory:") || raw_database_url.contains("://") {
        return raw_database_url.to_string();
    }
    let path = raw_database_url
        .strip_prefix("sqlite:")
        .unwrap_or(raw_database_url)
        .replace('\\', "/");
    format!("sqlite://{path}")
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
