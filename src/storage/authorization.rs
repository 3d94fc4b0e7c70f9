use super::backend::KeyValueBackend;
use super::KvStorage;
use crate::core::keys::Namespace;
use crate::core::types::AuthorizeData;
use crate::error::StorageError;
use log::debug;

impl<B: KeyValueBackend> KvStorage<B> {
    /// Stores an authorization code; the backend drops it after
    /// `data.expires_in` seconds (never, if zero).
    pub fn save_authorize(&self, data: &AuthorizeData) -> Result<(), StorageError> {
        let payload = self.encode(data, "failed to encode data")?;
        debug!(
            "Storing authorization code for client {:?}, expires in {}s",
            data.client_id(),
            data.expires_in
        );
        self.write(
            &self.key(Namespace::Auth, &data.code),
            &payload,
            data.expires_in,
            "failed to save auth",
        )
    }

    // The embedded client is returned as it was when the code was issued;
    // only access lookups refresh it.
    pub fn load_authorize(&self, code: &str) -> Result<Option<AuthorizeData>, StorageError> {
        self.read_record(
            &self.key(Namespace::Auth, code),
            "unable to GET auth",
            "failed to decode auth",
        )
    }

    pub fn remove_authorize(&self, code: &str) -> Result<(), StorageError> {
        self.delete(&self.key(Namespace::Auth, code), "failed to delete auth")
    }
}
