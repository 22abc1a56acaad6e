use crate::error::{AppError, Result};

/// Channel capacity for import batches queued to the DB writer.
pub const CHANNEL_CAPACITY: usize = 256;

/// Default bind port for the HTTP API.
pub const DEFAULT_API_PORT: u16 = 3000;

#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: String,
    pub db_path: String,
    pub api_port: u16,
    /// Replaces the embedded permanent-pool allow-list (PERMANENT_POOL_PATH).
    pub permanent_pool_path: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            db_path: std::env::var("DB_PATH").unwrap_or_else(|_| "gacha.db".to_string()),
            api_port: std::env::var("API_PORT")
                .unwrap_or_else(|_| DEFAULT_API_PORT.to_string())
                .parse::<u16>()
                .map_err(|_| AppError::Config("API_PORT must be a valid port number".to_string()))?,
            permanent_pool_path: std::env::var("PERMANENT_POOL_PATH")
                .ok()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
        })
    }
}
