use std::env;

use log::{log, Level};
use sqlx::postgres::PgConnectOptions;
use thiserror::Error;

pub const DEFAULT_PORT: u16 = 4000;
pub const DEFAULT_FRONTEND_ORIGIN: &str = "http://localhost:5173";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error(
        "Database configuration is missing. Provide DATABASE_URL or DB_HOST/DB_PORT/DB_NAME/DB_USER/DB_PASSWORD"
    )]
    MissingDatabase,
    #[error("DB_PASSWORD is required and must be a non-empty string")]
    MissingPassword,
    #[error("{key} is not a valid port: {value}")]
    InvalidPort { key: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseConfig {
    Url(String),
    Discrete {
        host: String,
        port: u16,
        database: String,
        user: String,
        password: String,
    },
}

impl DatabaseConfig {
    pub fn connect_options(&self) -> Result<PgConnectOptions, sqlx::Error> {
        match self {
            DatabaseConfig::Url(url) => url.parse(),
            DatabaseConfig::Discrete {
                host,
                port,
                database,
                user,
                password,
            } => Ok(PgConnectOptions::new()
                .host(host)
                .port(*port)
                .database(database)
                .username(user)
                .password(password)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    pub bind_address: String,
    pub port: u16,
    pub frontend_origin: String,
}

fn looks_like_url(url: &str) -> bool {
    let url = url.trim();
    url.starts_with("postgres://") || url.starts_with("postgresql://")
}

fn parse_port(key: &'static str, value: Option<String>, default: u16) -> Result<u16, ConfigError> {
    match value {
        None => Ok(default),
        Some(v) => v
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidPort { key, value: v }),
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Reads configuration through `lookup`, which maps a variable name to
    /// its value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let first = |keys: &[&str]| keys.iter().find_map(|k| lookup(*k));

        let database = match lookup("DATABASE_URL").filter(|u| looks_like_url(u)) {
            Some(url) => {
                log!(Level::Info, "Using DATABASE_URL connection");
                DatabaseConfig::Url(url.trim().to_string())
            }
            None => {
                let host = lookup("DB_HOST").unwrap_or_else(|| "localhost".to_string());
                let port = parse_port("DB_PORT", lookup("DB_PORT"), 5432)?;
                let (Some(database), Some(user)) = (
                    first(&["DB_NAME", "POSTGRES_DB"]),
                    first(&["DB_USER", "POSTGRES_USER"]),
                ) else {
                    return Err(ConfigError::MissingDatabase);
                };
                let password = first(&["DB_PASSWORD", "POSTGRES_PASSWORD"])
                    .filter(|p| !p.is_empty())
                    .ok_or(ConfigError::MissingPassword)?;
                log!(
                    Level::Info,
                    "Using discrete env vars: host={host}, port={port}, db={database}, user={user}"
                );
                DatabaseConfig::Discrete {
                    host,
                    port,
                    database,
                    user,
                    password,
                }
            }
        };

        Ok(Self {
            database,
            bind_address: lookup("BIND_ADDRESS").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_port("PORT", lookup("PORT"), DEFAULT_PORT)?,
            frontend_origin: lookup("FRONTEND_ORIGIN")
                .unwrap_or_else(|| DEFAULT_FRONTEND_ORIGIN.to_string()),
        })
    }
}
