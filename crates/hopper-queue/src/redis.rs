use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client, ConnectionAddr, ConnectionInfo, RedisConnectionInfo};
use tracing::debug;

use hopper_core::config::QueueConfig;

use crate::error::Result;
use crate::store::{KvCache, QueueStore};

/// Durable store backed by a Redis list.
///
/// The default handle multiplexes over one auto-reconnecting connection.
/// `BLPOP` parks whatever connection it runs on, so blocking consumers go
/// through [`dedicated`](QueueStore::dedicated) instead of sharing it.
pub struct RedisStore {
    client: Client,
    conn: ConnectionManager,
    key: String,
}

impl RedisStore {
    /// Open a connection to the configured server.
    ///
    /// Fails fast when the server is unreachable so startup errors are
    /// visible immediately instead of on the first operation.
    pub async fn connect(config: &QueueConfig) -> Result<Self> {
        let info = ConnectionInfo {
            addr: ConnectionAddr::Tcp(config.host.clone(), config.port),
            redis: RedisConnectionInfo {
                db: config.db,
                username: config.username.clone(),
                password: config.password.clone(),
                ..Default::default()
            },
        };
        let client = Client::open(info)?;
        let conn = ConnectionManager::new(client.clone()).await?;
        debug!(host = %config.host, port = config.port, key = %config.key, "connected to redis");
        Ok(Self {
            client,
            conn,
            key: config.key.clone(),
        })
    }
}

#[async_trait]
impl QueueStore for RedisStore {
    fn name(&self) -> &'static str {
        "redis"
    }

    async fn enqueue(&self, entry: &str) -> Result<u64> {
        let mut conn = self.conn.clone();
        let len: u64 = conn.rpush(&self.key, entry).await?;
        Ok(len)
    }

    async fn dequeue(&self) -> Result<Option<String>> {
        let mut conn = self.conn.clone();
        let entry: Option<String> = conn.lpop(&self.key, None).await?;
        Ok(entry)
    }

    async fn dequeue_blocking(&self, timeout: Duration) -> Result<Option<String>> {
        let mut conn = self.conn.clone();
        // BLPOP takes seconds; zero blocks until an entry arrives.
        let reply: Option<(String, String)> =
            conn.blpop(&self.key, timeout.as_secs_f64()).await?;
        Ok(reply.map(|(_, entry)| entry))
    }

    async fn len(&self) -> Result<u64> {
        let mut conn = self.conn.clone();
        let len: u64 = conn.llen(&self.key).await?;
        Ok(len)
    }

    async fn peek_range(&self, start: isize, stop: isize) -> Result<Vec<String>> {
        let mut conn = self.conn.clone();
        let entries: Vec<String> = conn.lrange(&self.key, start, stop).await?;
        Ok(entries)
    }

    async fn clear(&self) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: () = conn.del(&self.key).await?;
        Ok(())
    }

    async fn dedicated(&self) -> Result<Box<dyn QueueStore>> {
        let conn = ConnectionManager::new(self.client.clone()).await?;
        Ok(Box::new(Self {
            client: self.client.clone(),
            conn,
            key: self.key.clone(),
        }))
    }
}

#[async_trait]
impl KvCache for RedisStore {
    async fn kv_set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<()> {
        let mut conn = self.conn.clone();
        match ttl {
            Some(ttl) => {
                let _: () = conn.set_ex(key, value, ttl.as_secs()).await?;
            }
            None => {
                let _: () = conn.set(key, value).await?;
            }
        }
        Ok(())
    }

    async fn kv_get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }
}
