use anyhow::{anyhow, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub http_addr: String,
    pub database_url: String,
    pub db_max_connections: u32,
    pub db_connect_timeout_seconds: u64,
    pub redis_url: Option<String>,
    pub media_root: PathBuf,
    pub upload_max_bytes: usize,
    pub session_key: [u8; 32],
    pub session_ttl_minutes: u64,
    pub index_cache_ttl_seconds: u64,
    pub admin_token: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let http_addr = env_or("HTTP_ADDR", "0.0.0.0:8080");
        let _parsed_http_addr = SocketAddr::from_str(&http_addr)
            .map_err(|err| anyhow!("invalid HTTP_ADDR: {}", err))?;

        Ok(Self {
            http_addr,
            database_url: env_or("DATABASE_URL", "sqlite://scribe.db?mode=rwc"),
            db_max_connections: env_or_parse("DB_MAX_CONNECTIONS", "10")?,
            db_connect_timeout_seconds: env_or_parse("DB_CONNECT_TIMEOUT_SECONDS", "5")?,
            redis_url: env_opt("REDIS_URL"),
            media_root: PathBuf::from(env_or("MEDIA_ROOT", "media")),
            upload_max_bytes: env_or_parse("UPLOAD_MAX_BYTES", "5242880")?,
            session_key: env_key_32("SESSION_KEY")?,
            session_ttl_minutes: env_or_parse("SESSION_TTL_MINUTES", "20160")?,
            index_cache_ttl_seconds: env_or_parse("INDEX_CACHE_TTL_SECONDS", "20")?,
            admin_token: env_opt("ADMIN_TOKEN"),
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .filter(|value| !value.trim().is_empty())
}

fn env_or_err(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| anyhow!("missing required env var: {}", key))
}

fn env_or_parse<T>(key: &str, default: &str) -> Result<T>
where
    T: FromStr,
    <T as FromStr>::Err: std::fmt::Display,
{
    let value = std::env::var(key).unwrap_or_else(|_| default.to_string());
    value
        .parse::<T>()
        .map_err(|err| anyhow!("invalid {}: {}", key, err))
}

fn env_key_32(key: &str) -> Result<[u8; 32]> {
    let value = env_or_err(key)?;
    decode_key_32(&value).map_err(|err| anyhow!("invalid {}: {}", key, err))
}

/// Decodes a base64 string that must hold exactly 32 bytes.
pub fn decode_key_32(value: &str) -> Result<[u8; 32]> {
    let decoded = STANDARD.decode(value.trim().as_bytes())?;
    if decoded.len() != 32 {
        return Err(anyhow!("expected 32 bytes, got {}", decoded.len()));
    }
    let mut key_bytes = [0u8; 32];
    key_bytes.copy_from_slice(&decoded);
    Ok(key_bytes)
}
