//! Environment-variable configuration.
//!
//! Every setting has a documented default so the worker runs out of the box;
//! only the database password defaults to empty, which earns a warning rather
//! than a hard failure.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct Config {
    /// `PG_HOST`, default `localhost`.
    pub pg_host: String,
    /// `PG_DB`, default `Photos`.
    pub pg_db: String,
    /// `PG_USER`, default `postgres`.
    pub pg_user: String,
    /// `PG_PASS`, default empty.
    pub pg_pass: String,
    /// `PG_PORT`, default `5432`.
    pub pg_port: u16,
    /// `PG_POOL_SIZE`, default `4`.
    pub pool_size: u32,
    /// `INBOX_DIR`, default `uploads`.
    pub inbox_dir: PathBuf,
    /// `PHOTOS_ROOT`, default `Photos`.
    pub photos_root: PathBuf,
    /// `BIND_ADDR`, default `0.0.0.0:8081`.
    pub bind_addr: String,
    /// `POLL_INTERVAL_SECS`, default `2`.
    pub poll_interval_secs: u64,
}

impl Config {
    pub fn from_env() -> Self {
        let pg_pass = env_or("PG_PASS", "");
        if pg_pass.is_empty() {
            warn!("PG_PASS is not set; connecting with an empty password");
        }

        Self {
            pg_host: env_or("PG_HOST", "localhost"),
            pg_db: env_or("PG_DB", "Photos"),
            pg_user: env_or("PG_USER", "postgres"),
            pg_pass,
            pg_port: env_parsed("PG_PORT", 5432),
            pool_size: env_parsed("PG_POOL_SIZE", 4),
            inbox_dir: PathBuf::from(env_or("INBOX_DIR", "uploads")),
            photos_root: PathBuf::from(env_or("PHOTOS_ROOT", "Photos")),
            bind_addr: env_or("BIND_ADDR", "0.0.0.0:8081"),
            poll_interval_secs: env_parsed("POLL_INTERVAL_SECS", 2),
        }
    }

    pub fn pg_config(&self) -> postgres::Config {
        let mut pg = postgres::Config::new();
        pg.host(&self.pg_host)
            .port(self.pg_port)
            .dbname(&self.pg_db)
            .user(&self.pg_user)
            .password(&self.pg_pass);
        pg
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parsed<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}
