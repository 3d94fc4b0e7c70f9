use crate::error::BackendError;
use std::time::Duration;

/// Remaining lifetime of a key as reported by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyTtl {
    Missing,
    Persistent,
    Expires(Duration),
}

impl KeyTtl {
    /// Whole seconds left, rounded up so a live key never reports zero.
    /// Keys without an expiry report 0, the same value that asks for one.
    pub fn as_secs(&self) -> Option<u64> {
        match self {
            KeyTtl::Missing => None,
            KeyTtl::Persistent => Some(0),
            KeyTtl::Expires(left) => {
                let secs = left.as_secs();
                if left.subsec_nanos() > 0 || secs == 0 {
                    Some(secs + 1)
                } else {
                    Some(secs)
                }
            }
        }
    }
}

/// The key-value operations the storage layer needs from its backend.
///
/// Implementations must be safe to share between threads; every call is a
/// single blocking request and errors are returned as-is, without retrying.
pub trait KeyValueBackend: Send + Sync {
    /// `None` when the key is absent or has expired.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, BackendError>;

    /// Writes `value`, expiring it after `ttl`. A zero `ttl` keeps the key
    /// until it is deleted.
    fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<(), BackendError>;

    /// Deleting an absent key is not an error.
    fn del(&self, key: &str) -> Result<(), BackendError>;

    fn ttl(&self, key: &str) -> Result<KeyTtl, BackendError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ttl_seconds_round_up() {
        assert_eq!(KeyTtl::Missing.as_secs(), None);
        assert_eq!(KeyTtl::Persistent.as_secs(), Some(0));
        assert_eq!(KeyTtl::Expires(Duration::from_secs(3600)).as_secs(), Some(3600));
        assert_eq!(
            KeyTtl::Expires(Duration::from_millis(3_599_400)).as_secs(),
            Some(3600)
        );
        assert_eq!(KeyTtl::Expires(Duration::ZERO).as_secs(), Some(1));
    }
}
