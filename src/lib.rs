// Storage for OAuth2 clients, authorization codes and access/refresh tokens
// on top of a key-value backend with per-key expiry (Redis, or in-memory).
pub mod config;
pub mod core;
pub mod error;
pub mod storage;

pub use crate::config::StorageConfig;
pub use crate::core::types::{AccessData, AuthorizeData, Client};
pub use crate::error::{BackendError, CodecError, ConfigError, StorageError};
pub use crate::storage::backend::{KeyTtl, KeyValueBackend};
pub use crate::storage::{KvStorage, MemoryBackend, MockBackend, RedisBackend, Storage};
