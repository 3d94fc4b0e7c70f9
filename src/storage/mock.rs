use super::backend::{KeyTtl, KeyValueBackend};
use super::memory::MemoryBackend;
use crate::error::BackendError;
use std::sync::Mutex;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Get,
    Set,
    Del,
    Ttl,
}

/// A `MemoryBackend` that can be told to fail specific calls, for testing
/// how the store reports half-finished multi-key operations.
pub struct MockBackend {
    inner: MemoryBackend,
    failures: Mutex<Vec<(Operation, String)>>,
}

impl MockBackend {
    pub fn new() -> Self {
        MockBackend {
            inner: MemoryBackend::new(),
            failures: Mutex::new(Vec::new()),
        }
    }

    /// Makes every `operation` on a key containing `fragment` fail.
    pub fn fail_on(&self, operation: Operation, fragment: &str) {
        if let Ok(mut failures) = self.failures.lock() {
            failures.push((operation, fragment.to_string()));
        }
    }

    pub fn clear_failures(&self) {
        if let Ok(mut failures) = self.failures.lock() {
            failures.clear();
        }
    }

    /// The wrapped backend, for clock control and key inspection.
    pub fn memory(&self) -> &MemoryBackend {
        &self.inner
    }

    fn check(&self, operation: Operation, key: &str) -> Result<(), BackendError> {
        let failures = self
            .failures
            .lock()
            .map_err(|_| BackendError::Unavailable("mock failure list poisoned".to_string()))?;
        let forced = failures
            .iter()
            .any(|(op, fragment)| *op == operation && key.contains(fragment.as_str()));
        if forced {
            Err(BackendError::Unavailable(format!(
                "forced {:?} failure on {}",
                operation, key
            )))
        } else {
            Ok(())
        }
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        MockBackend::new()
    }
}

impl KeyValueBackend for MockBackend {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, BackendError> {
        self.check(Operation::Get, key)?;
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<(), BackendError> {
        self.check(Operation::Set, key)?;
        self.inner.set(key, value, ttl)
    }

    fn del(&self, key: &str) -> Result<(), BackendError> {
        self.check(Operation::Del, key)?;
        self.inner.del(key)
    }

    fn ttl(&self, key: &str) -> Result<KeyTtl, BackendError> {
        self.check(Operation::Ttl, key)?;
        self.inner.ttl(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forced_failure_only_hits_matching_keys() {
        let backend = MockBackend::new();
        backend.fail_on(Operation::Del, ":refresh_token:");

        backend.set("p:access:1", b"x", Duration::ZERO).unwrap();
        backend.set("p:refresh_token:t", b"1", Duration::ZERO).unwrap();

        assert!(backend.del("p:access:1").is_ok());
        assert!(matches!(
            backend.del("p:refresh_token:t"),
            Err(BackendError::Unavailable(_))
        ));
        assert_eq!(backend.memory().keys(), vec!["p:refresh_token:t".to_string()]);

        backend.clear_failures();
        assert!(backend.del("p:refresh_token:t").is_ok());
    }
}
