use crate::error::ConfigError;
use sqlx::postgres::{PgConnectOptions, PgSslMode};
use std::path::PathBuf;
use std::str::FromStr;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_SESSION_TTL_MINUTES: i64 = 480;
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Where the PostgreSQL store lives.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DatabaseSettings {
    Url(String),
    Parts {
        host: String,
        port: u16,
        username: String,
        password: String,
        database: String,
        require_ssl: bool,
    },
}

impl DatabaseSettings {
    pub fn connect_options(&self) -> Result<PgConnectOptions, ConfigError> {
        match self {
            DatabaseSettings::Url(url) => PgConnectOptions::from_str(url).map_err(|e| ConfigError::Invalid {
                name: "DATABASE_URL",
                value: e.to_string(),
            }),
            DatabaseSettings::Parts {
                host,
                port,
                username,
                password,
                database,
                require_ssl,
            } => {
                let ssl_mode = if *require_ssl { PgSslMode::Require } else { PgSslMode::Prefer };
                Ok(PgConnectOptions::new()
                    .host(host)
                    .port(*port)
                    .username(username)
                    .password(password)
                    .database(database)
                    .ssl_mode(ssl_mode))
            }
        }
    }

    /// Connection target without credentials, for logs.
    pub fn describe(&self) -> String {
        match self {
            DatabaseSettings::Url(url) => match url.rsplit_once('@') {
                Some((_, host)) => format!("postgres://***@{}", host),
                None => url.clone(),
            },
            DatabaseSettings::Parts { host, port, database, .. } => format!("{}:{}/{}", host, port, database),
        }
    }
}

/// Administrator seeded into an empty `employees` table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BootstrapAdmin {
    pub username: String,
    pub password: String,
}

#[derive(Clone, Debug)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub max_connections: u32,
    pub session_secret: Vec<u8>,
    pub session_ttl: time::Duration,
    pub secure_cookies: bool,
    pub port: u16,
    pub static_dir: PathBuf,
    pub run_migrations: bool,
    pub bootstrap_admin: Option<BootstrapAdmin>,
}
