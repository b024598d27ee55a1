//! Settings from process environment.

use super::types::*;
use crate::error::ConfigError;
use rand::RngCore;
use std::path::PathBuf;
use std::str::FromStr;

/// Read settings from the environment. Call `dotenvy::dotenv()` first to pick up a `.env` file.
pub fn from_env() -> Result<Settings, ConfigError> {
    from_lookup(|name| std::env::var(name).ok())
}

/// Read settings through `lookup`; blank values count as unset.
pub fn from_lookup<F>(lookup: F) -> Result<Settings, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

    let database = match get("DATABASE_URL") {
        Some(url) => DatabaseSettings::Url(url),
        None => DatabaseSettings::Parts {
            host: get("RDS_HOSTNAME").unwrap_or_else(|| "localhost".into()),
            port: parse_or("RDS_PORT", get("RDS_PORT"), 5432)?,
            username: get("RDS_USERNAME").unwrap_or_else(|| "postgres".into()),
            password: lookup("RDS_PASSWORD").unwrap_or_default(),
            database: get("RDS_DB_NAME").unwrap_or_else(|| "foodpantry".into()),
            require_ssl: get("RDS_SSL").is_some_and(|v| v.eq_ignore_ascii_case("require")),
        },
    };

    let session_secret = match get("SESSION_SECRET") {
        Some(secret) => secret.into_bytes(),
        None if cfg!(debug_assertions) => {
            tracing::warn!("SESSION_SECRET not set; using a random key, sessions will not survive a restart");
            let mut key = vec![0u8; 64];
            rand::rngs::OsRng.fill_bytes(&mut key);
            key
        }
        None => return Err(ConfigError::Missing("SESSION_SECRET")),
    };

    let ttl_minutes: i64 = parse_or("SESSION_TTL_MINUTES", get("SESSION_TTL_MINUTES"), DEFAULT_SESSION_TTL_MINUTES)?;
    if ttl_minutes <= 0 {
        return Err(ConfigError::Invalid {
            name: "SESSION_TTL_MINUTES",
            value: ttl_minutes.to_string(),
        });
    }

    let bootstrap_admin = match (get("BOOTSTRAP_ADMIN_USERNAME"), get("BOOTSTRAP_ADMIN_PASSWORD")) {
        (Some(username), Some(password)) => Some(BootstrapAdmin { username, password }),
        (None, None) => None,
        (Some(_), None) => return Err(ConfigError::Missing("BOOTSTRAP_ADMIN_PASSWORD")),
        (None, Some(_)) => return Err(ConfigError::Missing("BOOTSTRAP_ADMIN_USERNAME")),
    };

    Ok(Settings {
        database,
        max_connections: parse_or("DB_MAX_CONNECTIONS", get("DB_MAX_CONNECTIONS"), DEFAULT_MAX_CONNECTIONS)?,
        session_secret,
        session_ttl: time::Duration::minutes(ttl_minutes),
        secure_cookies: parse_flag("SESSION_COOKIE_SECURE", get("SESSION_COOKIE_SECURE"))?,
        port: parse_or("PORT", get("PORT"), DEFAULT_PORT)?,
        static_dir: get("STATIC_DIR").map(PathBuf::from).unwrap_or_else(|| PathBuf::from(".")),
        run_migrations: parse_flag("RUN_MIGRATIONS", get("RUN_MIGRATIONS"))?,
        bootstrap_admin,
    })
}

fn parse_or<T: FromStr>(name: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(v) => v.trim().parse().map_err(|_| ConfigError::Invalid { name, value: v }),
    }
}

fn parse_flag(name: &'static str, raw: Option<String>) -> Result<bool, ConfigError> {
    match raw.as_deref().map(|v| v.trim().to_ascii_lowercase()) {
        None => Ok(false),
        Some(v) => match v.as_str() {
            "true" | "1" | "yes" => Ok(true),
            "false" | "0" | "no" => Ok(false),
            _ => Err(ConfigError::Invalid { name, value: v }),
        },
    }
}
