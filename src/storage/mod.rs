pub mod access;
pub mod authorization;
pub mod backend;
pub mod client;
pub mod memory;
pub mod mock;
pub mod redis;

use crate::config::StorageConfig;
use crate::core::codec::{PayloadCodec, Persisted};
use crate::core::keys::{KeyNamer, Namespace};
use crate::core::types::{AccessData, AuthorizeData, Client};
use crate::error::StorageError;
use backend::KeyValueBackend;
use log::debug;
use std::sync::Arc;
use std::time::Duration;

pub use self::memory::MemoryBackend;
pub use self::mock::MockBackend;
pub use self::redis::RedisBackend;

/// The storage contract an OAuth2 authorization server calls into.
///
/// Lookups return `Ok(None)` for a miss and removals of unknown keys succeed,
/// so callers can tell "not there" apart from a failing backend.
pub trait Storage: Send + Sync {
    fn create_client(&self, client: &Client) -> Result<(), StorageError>;
    fn get_client(&self, id: &str) -> Result<Option<Client>, StorageError>;
    fn update_client(&self, client: &Client) -> Result<(), StorageError>;
    fn delete_client(&self, client: &Client) -> Result<(), StorageError>;

    fn save_authorize(&self, data: &AuthorizeData) -> Result<(), StorageError>;
    fn load_authorize(&self, code: &str) -> Result<Option<AuthorizeData>, StorageError>;
    fn remove_authorize(&self, code: &str) -> Result<(), StorageError>;

    fn save_access(&self, data: &AccessData) -> Result<(), StorageError>;
    fn load_access(&self, token: &str) -> Result<Option<AccessData>, StorageError>;
    fn remove_access(&self, token: &str) -> Result<(), StorageError>;
    fn load_refresh(&self, token: &str) -> Result<Option<AccessData>, StorageError>;
    fn remove_refresh(&self, token: &str) -> Result<(), StorageError>;
}

/// OAuth2 storage on top of any [`KeyValueBackend`].
///
/// Cloning is cheap: clones share the same backend.
pub struct KvStorage<B: KeyValueBackend> {
    backend: Arc<B>,
    keys: KeyNamer,
    codec: PayloadCodec,
}

impl<B: KeyValueBackend> Clone for KvStorage<B> {
    fn clone(&self) -> Self {
        KvStorage {
            backend: Arc::clone(&self.backend),
            keys: self.keys.clone(),
            codec: self.codec.clone(),
        }
    }
}

impl<B: KeyValueBackend> KvStorage<B> {
    pub fn new(backend: Arc<B>, key_prefix: &str) -> Self {
        KvStorage {
            backend,
            keys: KeyNamer::new(key_prefix),
            codec: PayloadCodec::default(),
        }
    }

    pub fn with_codec(mut self, codec: PayloadCodec) -> Self {
        self.codec = codec;
        self
    }

    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    pub fn keys(&self) -> &KeyNamer {
        &self.keys
    }

    fn key(&self, namespace: Namespace, id: &str) -> String {
        self.keys.make_key(namespace, id)
    }

    // Empty values count as absent.
    fn read(&self, key: &str, context: &'static str) -> Result<Option<Vec<u8>>, StorageError> {
        let raw = self
            .backend
            .get(key)
            .map_err(StorageError::backend(context))?;
        Ok(raw.filter(|bytes| !bytes.is_empty()))
    }

    fn read_record<T: Persisted>(
        &self,
        key: &str,
        read_context: &'static str,
        decode_context: &'static str,
    ) -> Result<Option<T>, StorageError> {
        match self.read(key, read_context)? {
            Some(bytes) => self
                .codec
                .decode(&bytes)
                .map(Some)
                .map_err(StorageError::codec(decode_context)),
            None => Ok(None),
        }
    }

    fn encode<T: Persisted>(&self, record: &T, context: &'static str) -> Result<Vec<u8>, StorageError> {
        self.codec.encode(record).map_err(StorageError::codec(context))
    }

    fn write(
        &self,
        key: &str,
        value: &[u8],
        expires_in: u64,
        context: &'static str,
    ) -> Result<(), StorageError> {
        debug!("SET {} (ttl {}s)", key, expires_in);
        self.backend
            .set(key, value, Duration::from_secs(expires_in))
            .map_err(StorageError::backend(context))
    }

    fn delete(&self, key: &str, context: &'static str) -> Result<(), StorageError> {
        debug!("DEL {}", key);
        self.backend.del(key).map_err(StorageError::backend(context))
    }
}

impl KvStorage<RedisBackend> {
    /// Connects to the Redis instance named in `config`.
    pub fn connect(config: &StorageConfig) -> Result<Self, StorageError> {
        let backend = RedisBackend::from_config(config)
            .map_err(StorageError::backend("failed to connect to Redis"))?;
        Ok(KvStorage::new(Arc::new(backend), &config.key_prefix))
    }
}

impl<B: KeyValueBackend> Storage for KvStorage<B> {
    fn create_client(&self, client: &Client) -> Result<(), StorageError> {
        KvStorage::create_client(self, client)
    }

    fn get_client(&self, id: &str) -> Result<Option<Client>, StorageError> {
        KvStorage::get_client(self, id)
    }

    fn update_client(&self, client: &Client) -> Result<(), StorageError> {
        KvStorage::update_client(self, client)
    }

    fn delete_client(&self, client: &Client) -> Result<(), StorageError> {
        KvStorage::delete_client(self, client)
    }

    fn save_authorize(&self, data: &AuthorizeData) -> Result<(), StorageError> {
        KvStorage::save_authorize(self, data)
    }

    fn load_authorize(&self, code: &str) -> Result<Option<AuthorizeData>, StorageError> {
        KvStorage::load_authorize(self, code)
    }

    fn remove_authorize(&self, code: &str) -> Result<(), StorageError> {
        KvStorage::remove_authorize(self, code)
    }

    fn save_access(&self, data: &AccessData) -> Result<(), StorageError> {
        KvStorage::save_access(self, data).map(|_| ())
    }

    fn load_access(&self, token: &str) -> Result<Option<AccessData>, StorageError> {
        KvStorage::load_access(self, token)
    }

    fn remove_access(&self, token: &str) -> Result<(), StorageError> {
        KvStorage::remove_access(self, token)
    }

    fn load_refresh(&self, token: &str) -> Result<Option<AccessData>, StorageError> {
        KvStorage::load_refresh(self, token)
    }

    fn remove_refresh(&self, token: &str) -> Result<(), StorageError> {
        KvStorage::remove_refresh(self, token)
    }
}
