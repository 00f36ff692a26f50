use crate::domain::policy::DEFAULT_TIMEZONE;
use crate::orchestration::DEFAULT_FANOUT_CONCURRENCY;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_path: String,
    pub cex_address_book_path: Option<String>,
    pub cex_builtin_table: bool,
    pub default_timezone: String,
    pub fanout_concurrency: usize,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnv(String),
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_map(std::env::vars().collect())
    }

    pub fn from_env_map(env_map: HashMap<String, String>) -> Result<Self, ConfigError> {
        let database_path = env_map
            .get("DATABASE_PATH")
            .cloned()
            .ok_or_else(|| ConfigError::MissingEnv("DATABASE_PATH".to_string()))?;

        let cex_address_book_path = env_map
            .get("CEX_ADDRESS_BOOK_PATH")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        let cex_builtin_table = match env_map
            .get("CEX_BUILTIN_TABLE")
            .map(|s| s.trim().to_ascii_lowercase())
            .as_deref()
            .unwrap_or("true")
        {
            "true" | "1" | "yes" => true,
            "false" | "0" | "no" => false,
            other => {
                return Err(ConfigError::InvalidValue(
                    "CEX_BUILTIN_TABLE".to_string(),
                    format!("must be true or false, got {}", other),
                ))
            }
        };

        let default_timezone = env_map
            .get("DEFAULT_TIMEZONE")
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_TIMEZONE)
            .to_string();
        if default_timezone.parse::<chrono_tz::Tz>().is_err() {
            return Err(ConfigError::InvalidValue(
                "DEFAULT_TIMEZONE".to_string(),
                format!("unknown IANA timezone {}", default_timezone),
            ));
        }

        let fanout_concurrency = match env_map.get("FANOUT_CONCURRENCY") {
            Some(raw) => raw
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| {
                    ConfigError::InvalidValue(
                        "FANOUT_CONCURRENCY".to_string(),
                        "must be a positive integer".to_string(),
                    )
                })?,
            None => DEFAULT_FANOUT_CONCURRENCY,
        };

        Ok(Config {
            database_path,
            cex_address_book_path,
            cex_builtin_table,
            default_timezone,
            fanout_concurrency,
        })
    }
}
