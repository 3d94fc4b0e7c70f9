//! Access tokens and the two pointers that lead to them.
//!
//! Each issued token pair is written once, under `access:<id>` where `id` is a
//! random UUID unrelated to either token. `access_token:<token>` and
//! `refresh_token:<token>` hold that id. All three keys carry the same expiry.
//!
//! The keys are written and deleted one at a time. If a call fails halfway the
//! earlier keys stay behind; a pointer whose record is gone reads as a miss,
//! and a surviving pointer resolves until it expires on its own.

use super::backend::KeyValueBackend;
use super::KvStorage;
use crate::core::keys::Namespace;
use crate::core::types::{AccessData, Client};
use crate::error::{BackendError, CodecError, StorageError};
use log::{debug, error, warn};
use std::time::Duration;
use uuid::Uuid;

// Tracks a multi-key write or delete so a failure after the first step is
// reported as partial.
struct Cascade {
    operation: &'static str,
    completed: usize,
}

impl Cascade {
    fn new(operation: &'static str) -> Self {
        Cascade {
            operation,
            completed: 0,
        }
    }

    fn step(
        &mut self,
        context: &'static str,
        result: Result<(), BackendError>,
    ) -> Result<(), StorageError> {
        match result {
            Ok(()) => {
                self.completed += 1;
                Ok(())
            }
            Err(source) if self.completed == 0 => Err(StorageError::Backend { context, source }),
            Err(source) => {
                error!(
                    "{} stopped after {} of 3 keys: {}: {}",
                    self.operation, self.completed, context, source
                );
                Err(StorageError::PartialCascade {
                    context,
                    completed: self.completed,
                    source,
                })
            }
        }
    }
}

impl<B: KeyValueBackend> KvStorage<B> {
    /// Stores `data` and registers both lookup pointers. Returns the opaque
    /// id the record was stored under.
    ///
    /// The refresh pointer is keyed by `data.access_token`, so refresh lookups
    /// take the access token string.
    pub fn save_access(&self, data: &AccessData) -> Result<String, StorageError> {
        let payload = self.encode(data, "failed to encode access")?;
        let access_id = Uuid::new_v4().to_string();
        let ttl = Duration::from_secs(data.expires_in);

        debug!(
            "Storing access {} for client {:?}, expires in {}s",
            access_id,
            data.client_id(),
            data.expires_in
        );

        let mut cascade = Cascade::new("save access");
        cascade.step(
            "failed to save access",
            self.backend
                .set(&self.key(Namespace::Access, &access_id), &payload, ttl),
        )?;
        cascade.step(
            "failed to register access token",
            self.backend.set(
                &self.key(Namespace::AccessToken, &data.access_token),
                access_id.as_bytes(),
                ttl,
            ),
        )?;
        cascade.step(
            "failed to register refresh token",
            self.backend.set(
                &self.key(Namespace::RefreshToken, &data.access_token),
                access_id.as_bytes(),
                ttl,
            ),
        )?;

        Ok(access_id)
    }

    pub fn load_access(&self, token: &str) -> Result<Option<AccessData>, StorageError> {
        self.load_access_by_key(&self.key(Namespace::AccessToken, token))
    }

    pub fn load_refresh(&self, token: &str) -> Result<Option<AccessData>, StorageError> {
        self.load_access_by_key(&self.key(Namespace::RefreshToken, token))
    }

    pub fn remove_access(&self, token: &str) -> Result<(), StorageError> {
        self.remove_access_by_key(&self.key(Namespace::AccessToken, token))
    }

    pub fn remove_refresh(&self, token: &str) -> Result<(), StorageError> {
        self.remove_access_by_key(&self.key(Namespace::RefreshToken, token))
    }

    fn load_access_by_key(&self, pointer: &str) -> Result<Option<AccessData>, StorageError> {
        Ok(self.resolve_access(pointer)?.map(|(_, access)| access))
    }

    /// Deletes the record behind `pointer` and both of its pointers. Unknown
    /// or already expired tokens are a no-op.
    fn remove_access_by_key(&self, pointer: &str) -> Result<(), StorageError> {
        let Some((access_id, access)) = self.resolve_access(pointer)? else {
            debug!("Nothing to remove behind {}", pointer);
            return Ok(());
        };

        let mut cascade = Cascade::new("remove access");
        cascade.step(
            "failed to delete access",
            self.backend.del(&self.key(Namespace::Access, &access_id)),
        )?;
        cascade.step(
            "failed to deregister access token",
            self.backend
                .del(&self.key(Namespace::AccessToken, &access.access_token)),
        )?;
        cascade.step(
            "failed to deregister refresh token",
            self.backend
                .del(&self.key(Namespace::RefreshToken, &access.access_token)),
        )?;

        debug!("Removed access {}", access_id);
        Ok(())
    }

    // Follows a pointer to its record, reports the live remaining lifetime
    // and swaps in current client records.
    fn resolve_access(&self, pointer: &str) -> Result<Option<(String, AccessData)>, StorageError> {
        let Some(raw_id) = self.read(pointer, "unable to get access ID")? else {
            return Ok(None);
        };
        let access_id = String::from_utf8(raw_id)
            .map_err(|e| StorageError::codec("failed to decode access ID")(CodecError::from(e)))?;

        let access_key = self.key(Namespace::Access, &access_id);
        let Some(mut access) = self.read_record::<AccessData>(
            &access_key,
            "unable to get access record",
            "failed to decode access record",
        )?
        else {
            warn!("Dangling token pointer: access {} no longer exists", access_id);
            return Ok(None);
        };

        let ttl = self
            .backend
            .ttl(&access_key)
            .map_err(StorageError::backend("unable to get access TTL"))?;
        match ttl.as_secs() {
            Some(secs) => access.expires_in = secs,
            None => {
                debug!("Access {} expired while it was being read", access_id);
                return Ok(None);
            }
        }

        self.hydrate_access(&mut access)?;
        Ok(Some((access_id, access)))
    }

    fn hydrate_access(&self, access: &mut AccessData) -> Result<(), StorageError> {
        if let Some(client_id) = access.client_id().map(str::to_owned) {
            access.client = self.fetch_client(
                &client_id,
                "unable to get client for access",
                "failed to decode client for access",
            )?;
        }

        if let Some(authorize) = access.authorize_data.as_mut() {
            if let Some(client_id) = authorize.client_id().map(str::to_owned) {
                authorize.client = self.fetch_client(
                    &client_id,
                    "unable to get client for access authorize data",
                    "failed to decode client for access authorize data",
                )?;
            }
        }
        Ok(())
    }

    fn fetch_client(
        &self,
        id: &str,
        read_context: &'static str,
        decode_context: &'static str,
    ) -> Result<Option<Client>, StorageError> {
        let client = self.read_record(&self.key(Namespace::Client, id), read_context, decode_context)?;
        if client.is_none() {
            debug!("Client {} referenced by access no longer exists", id);
        }
        Ok(client)
    }
}
