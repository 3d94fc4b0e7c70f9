//! Payload encoding for everything the store persists.
//!
//! Records are written as tagged JSON (`{"kind": ..., "data": ...}`) so a
//! payload can never be decoded as the wrong shape. The set of shapes a codec
//! accepts is fixed when it is built.

use crate::core::types::{AccessData, AuthorizeData, Client};
use crate::error::CodecError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Client,
    Authorize,
    Access,
}

use wire::{Record, RecordRef};

mod wire {
    use super::RecordKind;
    use crate::core::types::{AccessData, AuthorizeData, Client};
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Deserialize)]
    #[serde(tag = "kind", content = "data", rename_all = "snake_case")]
    pub enum Record {
        Client(Client),
        Authorize(AuthorizeData),
        Access(AccessData),
    }

    impl Record {
        pub fn kind(&self) -> RecordKind {
            match self {
                Record::Client(_) => RecordKind::Client,
                Record::Authorize(_) => RecordKind::Authorize,
                Record::Access(_) => RecordKind::Access,
            }
        }
    }

    // Borrowed twin of `Record` so encoding never clones the record.
    #[derive(Serialize)]
    #[serde(tag = "kind", content = "data", rename_all = "snake_case")]
    pub enum RecordRef<'a> {
        Client(&'a Client),
        Authorize(&'a AuthorizeData),
        Access(&'a AccessData),
    }
}

/// A record shape the codec knows how to persist.
pub trait Persisted: Sized {
    const KIND: RecordKind;

    #[doc(hidden)]
    fn as_record(&self) -> RecordRef<'_>;

    #[doc(hidden)]
    fn from_record(record: Record) -> Result<Self, CodecError>;
}

macro_rules! persisted {
    ($ty:ty, $variant:ident) => {
        impl Persisted for $ty {
            const KIND: RecordKind = RecordKind::$variant;

            fn as_record(&self) -> RecordRef<'_> {
                RecordRef::$variant(self)
            }

            fn from_record(record: Record) -> Result<Self, CodecError> {
                match record {
                    Record::$variant(value) => Ok(value),
                    other => Err(CodecError::UnexpectedKind {
                        expected: Self::KIND,
                        found: other.kind(),
                    }),
                }
            }
        }
    };
}

persisted!(Client, Client);
persisted!(AuthorizeData, Authorize);
persisted!(AccessData, Access);

/// The finite set of record kinds a codec will encode or decode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registry {
    kinds: Vec<RecordKind>,
}

impl Registry {
    pub fn new(kinds: &[RecordKind]) -> Self {
        let mut registry = Registry { kinds: Vec::new() };
        for kind in kinds {
            if !registry.kinds.contains(kind) {
                registry.kinds.push(*kind);
            }
        }
        registry
    }

    /// Every shape the storage layer writes.
    pub fn standard() -> Self {
        Registry::new(&[RecordKind::Client, RecordKind::Authorize, RecordKind::Access])
    }

    pub fn contains(&self, kind: RecordKind) -> bool {
        self.kinds.contains(&kind)
    }
}

impl Default for Registry {
    fn default() -> Self {
        Registry::standard()
    }
}

#[derive(Debug, Clone, Default)]
pub struct PayloadCodec {
    registry: Registry,
}

impl PayloadCodec {
    pub fn new(registry: Registry) -> Self {
        PayloadCodec { registry }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn encode<T: Persisted>(&self, value: &T) -> Result<Vec<u8>, CodecError> {
        self.check(T::KIND)?;
        Ok(serde_json::to_vec(&value.as_record())?)
    }

    pub fn decode<T: Persisted>(&self, payload: &[u8]) -> Result<T, CodecError> {
        self.check(T::KIND)?;
        let record: Record = serde_json::from_slice(payload)?;
        self.check(record.kind())?;
        T::from_record(record)
    }

    fn check(&self, kind: RecordKind) -> Result<(), CodecError> {
        if self.registry.contains(kind) {
            Ok(())
        } else {
            Err(CodecError::Unregistered(kind))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn access_with_authorize() -> AccessData {
        let client = Client::new("c1", "secret", "https://app/cb");
        let mut access = AccessData::new(client.clone(), "tok", "ref", 3600);
        access.authorize_data = Some(Box::new(AuthorizeData::new(client, "code", 60)));
        access.user_data = json!({"sub": "alice", "roles": ["admin"]});
        access
    }

    #[test]
    fn test_nested_access_record_survives_encoding() {
        let codec = PayloadCodec::default();
        let access = access_with_authorize();

        let bytes = codec.encode(&access).unwrap();
        let decoded: AccessData = codec.decode(&bytes).unwrap();
        assert_eq!(decoded, access);
        assert_eq!(
            decoded.authorize_data.unwrap().client_id(),
            Some("c1")
        );
    }

    #[test]
    fn test_payload_is_tagged_with_kind() {
        let codec = PayloadCodec::default();
        let bytes = codec.encode(&Client::new("c1", "s", "u")).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value["kind"], "client");
        assert_eq!(value["data"]["id"], "c1");
    }

    #[test]
    fn test_decoding_wrong_kind_fails() {
        let codec = PayloadCodec::default();
        let bytes = codec.encode(&Client::new("c1", "s", "u")).unwrap();

        match codec.decode::<AccessData>(&bytes) {
            Err(CodecError::UnexpectedKind { expected, found }) => {
                assert_eq!(expected, RecordKind::Access);
                assert_eq!(found, RecordKind::Client);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_unregistered_kind_is_rejected() {
        let full = PayloadCodec::default();
        let clients_only = PayloadCodec::new(Registry::new(&[RecordKind::Client]));
        let access = access_with_authorize();

        assert!(matches!(
            clients_only.encode(&access),
            Err(CodecError::Unregistered(RecordKind::Access))
        ));

        let bytes = full.encode(&access).unwrap();
        assert!(matches!(
            clients_only.decode::<AccessData>(&bytes),
            Err(CodecError::Unregistered(RecordKind::Access))
        ));
    }

    #[test]
    fn test_corrupt_payload_is_a_json_error() {
        let codec = PayloadCodec::default();
        assert!(matches!(
            codec.decode::<Client>(b"\x00\x01not json"),
            Err(CodecError::Json(_))
        ));
    }

    #[test]
    fn test_registry_ignores_duplicates() {
        let registry = Registry::new(&[RecordKind::Client, RecordKind::Client]);
        assert_eq!(registry, Registry::new(&[RecordKind::Client]));
        assert!(!registry.contains(RecordKind::Access));
    }
}
