// src/config.rs
use serde::Deserialize;
use sqlx::postgres::{PgConnectOptions, PgSslMode};
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read configuration from environment: {0}")]
    Env(#[from] envy::Error),
    #[error("invalid database ssl mode `{0}`")]
    SslMode(String),
}

#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    #[serde(default = "default_server_address")]
    pub server_address: String,
    #[serde(default = "default_database_host")]
    pub database_host: String,
    #[serde(default = "default_database_port")]
    pub database_port: u16,
    #[serde(default = "default_database_user")]
    pub database_user: String,
    #[serde(default = "default_database_password")]
    pub database_password: String,
    #[serde(default = "default_database_name")]
    pub database_name: String,
    #[serde(default = "default_database_sslmode")]
    pub database_sslmode: String,
    #[serde(default = "default_max_connections")]
    pub database_max_connections: u32,
    /// Server-side deadline for a single statement, in milliseconds. Zero disables it.
    #[serde(default = "default_statement_timeout_ms")]
    pub database_statement_timeout_ms: u64,
    #[serde(default = "default_bcrypt_cost")]
    pub bcrypt_cost: u32,
}

fn default_server_address() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_database_host() -> String {
    "localhost".to_string()
}

fn default_database_port() -> u16 {
    5432
}

fn default_database_user() -> String {
    "postgres".to_string()
}

fn default_database_password() -> String {
    "password".to_string()
}

fn default_database_name() -> String {
    "users_db".to_string()
}

fn default_database_sslmode() -> String {
    "disable".to_string()
}

fn default_max_connections() -> u32 {
    10
}

fn default_statement_timeout_ms() -> u64 {
    5000
}

fn default_bcrypt_cost() -> u32 {
    bcrypt::DEFAULT_COST
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_address: default_server_address(),
            database_host: default_database_host(),
            database_port: default_database_port(),
            database_user: default_database_user(),
            database_password: default_database_password(),
            database_name: default_database_name(),
            database_sslmode: default_database_sslmode(),
            database_max_connections: default_max_connections(),
            database_statement_timeout_ms: default_statement_timeout_ms(),
            bcrypt_cost: default_bcrypt_cost(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(envy::from_env()?)
    }

    /// Assembles Postgres connection options from the individual settings.
    pub fn connect_options(&self) -> Result<PgConnectOptions, ConfigError> {
        let ssl_mode = PgSslMode::from_str(&self.database_sslmode)
            .map_err(|_| ConfigError::SslMode(self.database_sslmode.clone()))?;

        let mut options = PgConnectOptions::new()
            .host(&self.database_host)
            .port(self.database_port)
            .username(&self.database_user)
            .password(&self.database_password)
            .database(&self.database_name)
            .ssl_mode(ssl_mode);

        if self.database_statement_timeout_ms > 0 {
            options = options.options([(
                "statement_timeout",
                self.database_statement_timeout_ms.to_string(),
            )]);
        }

        Ok(options)
    }
}
