use anyhow::{anyhow, Result};
use redis::{AsyncCommands, Client};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

const KEY_NAMESPACE: &str = "scribe:cache:";
const CLEAR_BATCH_SIZE: usize = 500;

/// Full-response page cache.
///
/// Entries are only ever removed by expiry or by [`PageCache::clear_all`];
/// writes to posts do not touch it.
#[derive(Clone)]
pub enum PageCache {
    Redis(RedisCache),
    Memory(MemoryCache),
}

impl PageCache {
    pub async fn connect(redis_url: Option<&str>) -> Result<Self> {
        match redis_url {
            Some(url) => Ok(Self::Redis(RedisCache::connect(url).await?)),
            None => Ok(Self::Memory(MemoryCache::new())),
        }
    }

    pub fn memory() -> Self {
        Self::Memory(MemoryCache::new())
    }

    pub async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        match self {
            Self::Redis(cache) => cache.get(key).await,
            Self::Memory(cache) => cache.get(key),
        }
    }

    pub async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<()> {
        match self {
            Self::Redis(cache) => cache.set(key, value, ttl).await,
            Self::Memory(cache) => cache.set(key, value, ttl),
        }
    }

    pub async fn clear_all(&self) -> Result<usize> {
        match self {
            Self::Redis(cache) => cache.clear_all().await,
            Self::Memory(cache) => cache.clear_all(),
        }
    }

    pub async fn ping(&self) -> Result<()> {
        match self {
            Self::Redis(cache) => cache.ping().await,
            Self::Memory(_) => Ok(()),
        }
    }
}

#[derive(Clone)]
pub struct RedisCache {
    client: Client,
}

impl RedisCache {
    pub async fn connect(redis_url: &str) -> Result<Self> {
        let client = Client::open(redis_url)?;
        let mut conn = client.get_multiplexed_async_connection().await?;
        redis::cmd("PING")
            .query_async::<_, String>(&mut conn)
            .await?;
        Ok(Self { client })
    }

    pub async fn ping(&self) -> Result<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        redis::cmd("PING")
            .query_async::<_, String>(&mut conn)
            .await?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let value = conn.get::<_, Option<Vec<u8>>>(namespaced(key)).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let seconds = ttl.as_secs().max(1);
        conn.set_ex::<_, _, ()>(namespaced(key), value, seconds)
            .await?;
        Ok(())
    }

    /// Walks the namespace with `SCAN` and deletes matches in batches.
    async fn clear_all(&self) -> Result<usize> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let mut keys = Vec::new();
        {
            let mut iter = conn
                .scan_match::<_, String>(format!("{}*", KEY_NAMESPACE))
                .await?;
            while let Some(key) = iter.next_item().await {
                keys.push(key);
            }
        }

        let mut removed = 0;
        for batch in keys.chunks(CLEAR_BATCH_SIZE) {
            removed += conn.del::<_, usize>(batch).await?;
        }
        tracing::debug!(removed, "cleared redis page cache");
        Ok(removed)
    }
}

fn namespaced(key: &str) -> String {
    format!("{}{}", KEY_NAMESPACE, key)
}

#[derive(Debug, Clone)]
struct CacheEntry {
    value: Vec<u8>,
    expires_at: Instant,
}

/// In-process TTL map, used when no Redis URL is configured.
#[derive(Clone, Default)]
pub struct MemoryCache {
    entries: Arc<RwLock<HashMap<String, CacheEntry>>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let now = Instant::now();
        {
            let entries = self
                .entries
                .read()
                .map_err(|_| anyhow!("page cache lock poisoned"))?;
            match entries.get(key) {
                Some(entry) if entry.expires_at > now => return Ok(Some(entry.value.clone())),
                Some(_) => {}
                None => return Ok(None),
            }
        }

        // expired: drop it under the write lock
        let mut entries = self
            .entries
            .write()
            .map_err(|_| anyhow!("page cache lock poisoned"))?;
        if entries
            .get(key)
            .map(|entry| entry.expires_at <= now)
            .unwrap_or(false)
        {
            entries.remove(key);
        }
        Ok(None)
    }

    fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| anyhow!("page cache lock poisoned"))?;
        let now = Instant::now();
        entries.retain(|_, entry| entry.expires_at > now);
        entries.insert(
            key.to_string(),
            CacheEntry {
                value,
                expires_at: now + ttl,
            },
        );
        Ok(())
    }

    fn clear_all(&self) -> Result<usize> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| anyhow!("page cache lock poisoned"))?;
        let removed = entries.len();
        entries.clear();
        Ok(removed)
    }
}
