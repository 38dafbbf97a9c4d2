//! Global application configuration manager.
//!
//! `AppConfig` is a lazily initialized, globally accessible singleton containing
//! runtime configuration values loaded from environment variables. It provides
//! thread-safe access and mutation for testing or overrides in runtime environments.
//!
//! Only the binary reads it. Everything below the HTTP layer receives its
//! settings through `AppState` and `WsServerOptions`.

use std::env;
use std::str::FromStr;
use std::sync::{OnceLock, RwLock};

/// Represents the complete application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: String,
    pub project_name: String,
    pub log_level: String,
    pub log_file: String,
    pub log_to_stdout: bool,
    pub database_path: String,
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub jwt_duration_minutes: u64,
    pub session_ttl_minutes: i64,
    pub ws_heartbeat_secs: u64,
    pub shutdown_grace_secs: u64,
}

/// Lazily-initialized, thread-safe singleton instance of `AppConfig`.
static CONFIG_INSTANCE: OnceLock<RwLock<AppConfig>> = OnceLock::new();

fn var_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl AppConfig {
    /// Loads the configuration from `.env` and environment variables.
    ///
    /// Missing or unparsable values fall back to their defaults. A missing
    /// `JWT_SECRET` leaves the secret empty; the binary refuses to start with it.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            env: env::var("APP_ENV").unwrap_or_else(|_| "development".into()),
            project_name: env::var("PROJECT_NAME").unwrap_or_else(|_| "rollcall".into()),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "api=info,util=info".into()),
            log_file: env::var("LOG_FILE").unwrap_or_else(|_| "api.log".into()),
            log_to_stdout: env::var("LOG_TO_STDOUT").unwrap_or_else(|_| "false".into()) == "true",
            database_path: env::var("DATABASE_PATH").unwrap_or_else(|_| "data/rollcall.db".into()),
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".into()),
            port: var_or("PORT", 4000),
            jwt_secret: env::var("JWT_SECRET").unwrap_or_default(),
            jwt_duration_minutes: var_or("JWT_DURATION_MINUTES", 60),
            session_ttl_minutes: var_or("SESSION_TTL_MINUTES", 10),
            ws_heartbeat_secs: var_or("WS_HEARTBEAT_SECS", 30),
            shutdown_grace_secs: var_or("SHUTDOWN_GRACE_SECS", 5),
        }
    }

    /// Returns a snapshot of the global configuration.
    pub fn global() -> AppConfig {
        let lock = CONFIG_INSTANCE.get_or_init(|| RwLock::new(AppConfig::from_env()));
        match lock.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Resets the configuration by reloading from environment variables.
    ///
    /// Useful in tests to clear overrides.
    pub fn reset() {
        if let Some(lock) = CONFIG_INSTANCE.get() {
            if let Ok(mut guard) = lock.write() {
                *guard = AppConfig::from_env();
            }
        }
    }

    /// Generic internal setter for any field in the config.
    fn set_field<F>(setter: F)
    where
        F: FnOnce(&mut AppConfig),
    {
        let lock = CONFIG_INSTANCE.get_or_init(|| RwLock::new(AppConfig::from_env()));
        if let Ok(mut guard) = lock.write() {
            setter(&mut guard);
        }
    }

    // --- Per-field setters below ---

    pub fn set_env(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.env = value.into());
    }

    pub fn set_log_level(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.log_level = value.into());
    }

    pub fn set_database_path(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.database_path = value.into());
    }

    pub fn set_port(value: u16) {
        AppConfig::set_field(|cfg| cfg.port = value);
    }

    pub fn set_jwt_secret(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.jwt_secret = value.into());
    }

    pub fn set_jwt_duration_minutes(value: u64) {
        AppConfig::set_field(|cfg| cfg.jwt_duration_minutes = value);
    }

    pub fn set_session_ttl_minutes(value: i64) {
        AppConfig::set_field(|cfg| cfg.session_ttl_minutes = value);
    }

    pub fn set_ws_heartbeat_secs(value: u64) {
        AppConfig::set_field(|cfg| cfg.ws_heartbeat_secs = value);
    }

    pub fn set_shutdown_grace_secs(value: u64) {
        AppConfig::set_field(|cfg| cfg.shutdown_grace_secs = value);
    }

    pub fn is_production(&self) -> bool {
        self.env == "production"
    }

    /// `SESSION_TTL_MINUTES` as a duration.
    ///
    /// `None` when the value is not positive or an expiry computed from it would not fit in a timestamp.
    pub fn session_ttl(&self) -> Option<chrono::Duration> {
        bounded_minutes(self.session_ttl_minutes)
    }

    /// `JWT_DURATION_MINUTES`, with the same bounds as [`AppConfig::session_ttl`].
    pub fn jwt_duration(&self) -> Option<i64> {
        let minutes = i64::try_from(self.jwt_duration_minutes).ok()?;
        bounded_minutes(minutes).map(|_| minutes)
    }
}

fn bounded_minutes(minutes: i64) -> Option<chrono::Duration> {
    if minutes <= 0 {
        return None;
    }
    let duration = chrono::Duration::try_minutes(minutes)?;
    chrono::Utc::now().checked_add_signed(duration)?;
    Some(duration)
}
