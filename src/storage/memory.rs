use super::backend::{KeyTtl, KeyValueBackend};
use crate::error::BackendError;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

struct Entry {
    value: Vec<u8>,
    expires_at: Option<Instant>,
}

struct State {
    entries: HashMap<String, Entry>,
    // Added to the wall clock; lets tests move time forward.
    offset: Duration,
}

impl State {
    fn now(&self) -> Instant {
        Instant::now() + self.offset
    }

    // Expired entries are dropped lazily, the same way Redis hides them.
    fn live(&mut self, key: &str) -> Option<&Entry> {
        let now = self.now();
        let expired = matches!(
            self.entries.get(key),
            Some(Entry { expires_at: Some(at), .. }) if *at <= now
        );
        if expired {
            self.entries.remove(key);
        }
        self.entries.get(key)
    }

    fn sweep(&mut self) {
        let now = self.now();
        self.entries
            .retain(|_, entry| entry.expires_at.map_or(true, |at| at > now));
    }
}

/// In-process backend with per-key expiry.
pub struct MemoryBackend {
    state: Mutex<State>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        MemoryBackend {
            state: Mutex::new(State {
                entries: HashMap::new(),
                offset: Duration::ZERO,
            }),
        }
    }

    /// Moves this backend's clock forward by `by`.
    pub fn advance(&self, by: Duration) {
        if let Ok(mut state) = self.state.lock() {
            state.offset += by;
        }
    }

    /// Drops `key` as if the backend had evicted it.
    pub fn evict(&self, key: &str) {
        if let Ok(mut state) = self.state.lock() {
            state.entries.remove(key);
        }
    }

    /// Live keys, sorted.
    pub fn keys(&self) -> Vec<String> {
        let Ok(mut state) = self.state.lock() else {
            return Vec::new();
        };
        state.sweep();
        let mut keys: Vec<String> = state.entries.keys().cloned().collect();
        keys.sort();
        keys
    }

    fn state(&self) -> Result<MutexGuard<'_, State>, BackendError> {
        self.state
            .lock()
            .map_err(|_| BackendError::Unavailable("memory backend lock poisoned".to_string()))
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        MemoryBackend::new()
    }
}

impl KeyValueBackend for MemoryBackend {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, BackendError> {
        let mut state = self.state()?;
        Ok(state.live(key).map(|entry| entry.value.clone()))
    }

    fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<(), BackendError> {
        let mut state = self.state()?;
        let expires_at = if ttl.is_zero() {
            None
        } else {
            Some(
                state
                    .now()
                    .checked_add(ttl)
                    .ok_or(BackendError::InvalidTtl(ttl))?,
            )
        };
        // Entries nobody reads again would otherwise stay forever.
        state.sweep();
        state.entries.insert(
            key.to_string(),
            Entry {
                value: value.to_vec(),
                expires_at,
            },
        );
        Ok(())
    }

    fn del(&self, key: &str) -> Result<(), BackendError> {
        self.state()?.entries.remove(key);
        Ok(())
    }

    fn ttl(&self, key: &str) -> Result<KeyTtl, BackendError> {
        let mut state = self.state()?;
        let now = state.now();
        Ok(match state.live(key) {
            None => KeyTtl::Missing,
            Some(Entry {
                expires_at: None, ..
            }) => KeyTtl::Persistent,
            Some(Entry {
                expires_at: Some(at),
                ..
            }) => KeyTtl::Expires(at.saturating_duration_since(now)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_and_delete() {
        let backend = MemoryBackend::new();
        backend.set("k", b"v", Duration::ZERO).unwrap();
        assert_eq!(backend.get("k").unwrap(), Some(b"v".to_vec()));
        assert_eq!(backend.ttl("k").unwrap(), KeyTtl::Persistent);

        backend.del("k").unwrap();
        backend.del("k").unwrap(); // idempotent
        assert_eq!(backend.get("k").unwrap(), None);
        assert_eq!(backend.ttl("k").unwrap(), KeyTtl::Missing);
    }

    #[test]
    fn test_keys_expire_when_clock_advances() {
        let backend = MemoryBackend::new();
        backend.set("short", b"1", Duration::from_secs(5)).unwrap();
        backend.set("long", b"2", Duration::from_secs(60)).unwrap();

        match backend.ttl("short").unwrap() {
            KeyTtl::Expires(left) => assert!(left <= Duration::from_secs(5)),
            other => panic!("unexpected ttl: {:?}", other),
        }

        backend.advance(Duration::from_secs(6));
        assert_eq!(backend.get("short").unwrap(), None);
        assert_eq!(backend.ttl("short").unwrap(), KeyTtl::Missing);
        assert_eq!(backend.keys(), vec!["long".to_string()]);
    }

    #[test]
    fn test_writes_drop_expired_entries() {
        let backend = MemoryBackend::new();
        for i in 0..1000 {
            backend
                .set(&format!("code:{}", i), b"x", Duration::from_secs(1))
                .unwrap();
        }
        backend.advance(Duration::from_secs(10));
        backend.set("fresh", b"y", Duration::from_secs(60)).unwrap();

        let state = backend.state.lock().unwrap();
        assert_eq!(state.entries.len(), 1);
        assert!(state.entries.contains_key("fresh"));
    }

    #[test]
    fn test_out_of_range_ttl_is_an_error() {
        let backend = MemoryBackend::new();
        let ttl = Duration::from_secs(u64::MAX);
        assert!(matches!(
            backend.set("k", b"v", ttl),
            Err(BackendError::InvalidTtl(d)) if d == ttl
        ));
        assert_eq!(backend.get("k").unwrap(), None);
    }

    #[test]
    fn test_evict_removes_key() {
        let backend = MemoryBackend::new();
        backend.set("k", b"v", Duration::from_secs(60)).unwrap();
        backend.evict("k");
        assert!(backend.keys().is_empty());
    }
}
