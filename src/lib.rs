pub mod app;
pub mod config;
pub mod domain;
pub mod http;
pub mod infra;

use anyhow::Result;

use crate::config::AppConfig;
use crate::infra::{cache::PageCache, db::Db, storage::MediaStorage};

#[derive(Clone)]
pub struct AppState {
    pub db: Db,
    pub cache: PageCache,
    pub storage: MediaStorage,
    pub session_key: [u8; 32],
    pub session_ttl_minutes: u64,
    pub index_cache_ttl_seconds: u64,
    pub upload_max_bytes: usize,
    pub admin_token: Option<String>,
}

impl AppState {
    /// Connects every backend named in `config`.
    pub async fn from_config(config: &AppConfig) -> Result<Self> {
        let db = Db::connect(config).await?;
        let cache = PageCache::connect(config.redis_url.as_deref()).await?;
        let storage = MediaStorage::new(config.media_root.clone()).await?;

        Ok(Self {
            db,
            cache,
            storage,
            session_key: config.session_key,
            session_ttl_minutes: config.session_ttl_minutes,
            index_cache_ttl_seconds: config.index_cache_ttl_seconds,
            upload_max_bytes: config.upload_max_bytes,
            admin_token: config.admin_token.clone(),
        })
    }
}
