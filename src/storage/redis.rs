use super::backend::{KeyTtl, KeyValueBackend};
use crate::config::StorageConfig;
use crate::error::BackendError;
use log::debug;
use redis::{Client, Connection};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

/// Redis backend over a single blocking connection.
pub struct RedisBackend {
    conn: Mutex<Connection>,
}

impl RedisBackend {
    pub fn new(conn: Connection) -> Self {
        RedisBackend {
            conn: Mutex::new(conn),
        }
    }

    /// Opens a connection to `redis_url` (e.g. `redis://127.0.0.1/`).
    pub fn connect(redis_url: &str) -> Result<Self, BackendError> {
        let client = Client::open(redis_url)?;
        let conn = client.get_connection()?;
        debug!("Connected to Redis at {}", redis_url);
        Ok(RedisBackend::new(conn))
    }

    pub fn from_config(config: &StorageConfig) -> Result<Self, BackendError> {
        RedisBackend::connect(&config.redis_url)
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, BackendError> {
        self.conn
            .lock()
            .map_err(|_| BackendError::Unavailable("Redis connection lock poisoned".to_string()))
    }
}

impl KeyValueBackend for RedisBackend {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, BackendError> {
        let mut conn = self.conn()?;
        let value: Option<Vec<u8>> = redis::cmd("GET").arg(key).query(&mut *conn)?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<(), BackendError> {
        let mut conn = self.conn()?;
        if ttl.is_zero() {
            redis::cmd("SET")
                .arg(key)
                .arg(value)
                .query::<()>(&mut *conn)?;
        } else {
            let millis =
                u64::try_from(ttl.as_millis()).map_err(|_| BackendError::InvalidTtl(ttl))?;
            // PSETEX keeps sub-second lifetimes from collapsing to "no expiry"
            redis::cmd("PSETEX")
                .arg(key)
                .arg(millis)
                .arg(value)
                .query::<()>(&mut *conn)?;
        }
        Ok(())
    }

    fn del(&self, key: &str) -> Result<(), BackendError> {
        let mut conn = self.conn()?;
        redis::cmd("DEL").arg(key).query::<i64>(&mut *conn)?;
        Ok(())
    }

    fn ttl(&self, key: &str) -> Result<KeyTtl, BackendError> {
        let mut conn = self.conn()?;
        let millis: i64 = redis::cmd("PTTL").arg(key).query(&mut *conn)?;
        Ok(match millis {
            -2 => KeyTtl::Missing,
            -1 => KeyTtl::Persistent,
            left if left < 0 => KeyTtl::Missing,
            left => KeyTtl::Expires(Duration::from_millis(left as u64)),
        })
    }
}
