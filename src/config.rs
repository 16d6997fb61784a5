// src/config.rs

use std::{env, fmt, str::FromStr};

use dotenvy::dotenv;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    pub jwt_secret: String,
    pub rust_log: String,
    pub port: u16,
    pub log_dir: String,
}

/// Raised when a required variable is missing or a value does not parse.
#[derive(Debug)]
pub struct ConfigError {
    pub variable: &'static str,
    pub reason: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.variable, self.reason)
    }
}

impl std::error::Error for ConfigError {}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv().ok();

        let database_url = required("DATABASE_URL")?;
        let jwt_secret = required("JWT_SECRET")?;

        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
        let log_dir = env::var("LOG_DIR").unwrap_or_else(|_| "logs".to_string());

        let port = parsed_or("PORT", 3000)?;
        let database_max_connections = parsed_or("DATABASE_MAX_CONNECTIONS", 5)?;

        Ok(Self {
            database_url,
            database_max_connections,
            jwt_secret,
            rust_log,
            port,
            log_dir,
        })
    }
}

fn required(variable: &'static str) -> Result<String, ConfigError> {
    env::var(variable).map_err(|_| ConfigError {
        variable,
        reason: "must be set".to_string(),
    })
}

fn parsed_or<T>(variable: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    match env::var(variable) {
        Ok(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError {
            variable,
            reason: format!("invalid value '{}': {}", raw, e),
        }),
        Err(_) => Ok(default),
    }
}
