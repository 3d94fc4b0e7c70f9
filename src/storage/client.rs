use super::backend::KeyValueBackend;
use super::KvStorage;
use crate::core::keys::Namespace;
use crate::core::types::Client;
use crate::error::StorageError;
use log::debug;

impl<B: KeyValueBackend> KvStorage<B> {
    /// Stores `client` under its id with no expiry, replacing any previous
    /// record.
    pub fn create_client(&self, client: &Client) -> Result<(), StorageError> {
        self.put_client(client, "failed to save client")
    }

    pub fn get_client(&self, id: &str) -> Result<Option<Client>, StorageError> {
        self.read_record(
            &self.key(Namespace::Client, id),
            "unable to GET client",
            "failed to decode client",
        )
    }

    /// Full overwrite; fields missing from `client` are not kept.
    pub fn update_client(&self, client: &Client) -> Result<(), StorageError> {
        self.put_client(client, "failed to update client")
    }

    pub fn delete_client(&self, client: &Client) -> Result<(), StorageError> {
        self.delete(
            &self.key(Namespace::Client, &client.id),
            "failed to delete client",
        )
    }

    fn put_client(&self, client: &Client, context: &'static str) -> Result<(), StorageError> {
        let payload = self.encode(client, "failed to encode client")?;
        debug!("Storing client {}", client.id);
        self.write(&self.key(Namespace::Client, &client.id), &payload, 0, context)
    }
}
