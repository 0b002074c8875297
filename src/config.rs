use std::env;

use crate::store::DEFAULT_CHANGE_FEED_CAPACITY;
use crate::utils::error::{AppError, AppResult};

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub secret_key: String,
    pub change_feed_capacity: usize,
}

impl Config {
    pub fn from_env() -> AppResult<Self> {
        Ok(Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3001),
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://dealroom.db?mode=rwc".into()),
            secret_key: env::var("SECRET_KEY")
                .map_err(|_| AppError::Internal("SECRET_KEY not set".to_string()))?,
            change_feed_capacity: env::var("CHANGE_FEED_CAPACITY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_CHANGE_FEED_CAPACITY),
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
