use crate::core::codec::RecordKind;
use std::time::Duration;
use thiserror::Error;

/// Failures reported by a key-value backend (connection, timeout, protocol).
#[derive(Debug, Error)]
pub enum BackendError {
    #[error(transparent)]
    Redis(#[from] redis::RedisError),

    #[error("backend unavailable: {0}")]
    Unavailable(String),

    #[error("expiry of {0:?} is out of range for this backend")]
    InvalidTtl(Duration),
}

/// Failures while turning records into bytes and back.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("malformed payload: {0}")]
    Json(#[from] serde_json::Error),

    #[error("token pointer is not valid UTF-8")]
    Pointer(#[from] std::string::FromUtf8Error),

    #[error("record kind {0:?} is not registered with this codec")]
    Unregistered(RecordKind),

    #[error("expected a {expected:?} record, found {found:?}")]
    UnexpectedKind {
        expected: RecordKind,
        found: RecordKind,
    },
}

/// Errors returned by the storage contract.
///
/// A missing key is never an error: loads return `Ok(None)` and removals
/// return `Ok(())`. Every variant names the step that failed and keeps the
/// underlying cause as its source.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("{context}")]
    Backend {
        context: &'static str,
        #[source]
        source: BackendError,
    },

    #[error("{context}")]
    Codec {
        context: &'static str,
        #[source]
        source: CodecError,
    },

    // An earlier write or delete of the same logical record already went
    // through; the backend is left holding whatever those steps produced.
    #[error("{context} ({completed} earlier step(s) already applied)")]
    PartialCascade {
        context: &'static str,
        completed: usize,
        #[source]
        source: BackendError,
    },
}

impl StorageError {
    pub(crate) fn backend(context: &'static str) -> impl FnOnce(BackendError) -> Self {
        move |source| StorageError::Backend { context, source }
    }

    pub(crate) fn codec(context: &'static str) -> impl FnOnce(CodecError) -> Self {
        move |source| StorageError::Codec { context, source }
    }

    /// The failing step's description.
    pub fn context(&self) -> &'static str {
        match self {
            StorageError::Backend { context, .. }
            | StorageError::Codec { context, .. }
            | StorageError::PartialCascade { context, .. } => context,
        }
    }

    pub fn is_partial(&self) -> bool {
        matches!(self, StorageError::PartialCascade { .. })
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("environment variable {0} must be set")]
    Missing(&'static str),

    #[error("environment variable {name} is invalid: {reason}")]
    Invalid { name: &'static str, reason: String },
}
