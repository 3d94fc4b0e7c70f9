use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A registered OAuth2 client. This layer treats it as one blob keyed by `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
    pub id: String,
    pub secret: String,
    pub redirect_uri: String,
    #[serde(default)]
    pub user_data: Value,
}

impl Client {
    pub fn new(id: &str, secret: &str, redirect_uri: &str) -> Self {
        Client {
            id: id.to_string(),
            secret: secret.to_string(),
            redirect_uri: redirect_uri.to_string(),
            user_data: Value::Null,
        }
    }
}

// An authorization grant waiting to be exchanged at the token endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthorizeData {
    pub client: Option<Client>,
    pub code: String,
    pub expires_in: u64, // seconds, 0 = never
    pub scope: String,
    pub redirect_uri: String,
    pub state: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub user_data: Value,
    pub code_challenge: Option<String>,
    pub code_challenge_method: Option<String>,
}

impl AuthorizeData {
    pub fn new(client: Client, code: &str, expires_in: u64) -> Self {
        AuthorizeData {
            redirect_uri: client.redirect_uri.clone(),
            client: Some(client),
            code: code.to_string(),
            expires_in,
            scope: String::new(),
            state: String::new(),
            created_at: Utc::now(),
            user_data: Value::Null,
            code_challenge: None,
            code_challenge_method: None,
        }
    }

    pub fn client_id(&self) -> Option<&str> {
        self.client.as_ref().map(|c| c.id.as_str())
    }

    /// `None` when the grant never expires.
    pub fn expire_at(&self) -> Option<DateTime<Utc>> {
        expire_at(self.created_at, self.expires_in)
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expire_at().map_or(false, |at| at < now)
    }
}

/// An issued access/refresh token pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessData {
    pub client: Option<Client>,
    pub authorize_data: Option<Box<AuthorizeData>>,
    // The record a refresh grant replaced. Kept as issued, never hydrated.
    pub previous: Option<Box<AccessData>>,
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: u64,
    pub scope: String,
    pub redirect_uri: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub user_data: Value,
}

impl AccessData {
    pub fn new(client: Client, access_token: &str, refresh_token: &str, expires_in: u64) -> Self {
        AccessData {
            redirect_uri: client.redirect_uri.clone(),
            client: Some(client),
            authorize_data: None,
            previous: None,
            access_token: access_token.to_string(),
            refresh_token: refresh_token.to_string(),
            expires_in,
            scope: String::new(),
            created_at: Utc::now(),
            user_data: Value::Null,
        }
    }

    pub fn client_id(&self) -> Option<&str> {
        self.client.as_ref().map(|c| c.id.as_str())
    }

    pub fn expire_at(&self) -> Option<DateTime<Utc>> {
        expire_at(self.created_at, self.expires_in)
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expire_at().map_or(false, |at| at < now)
    }
}

fn expire_at(created_at: DateTime<Utc>, expires_in: u64) -> Option<DateTime<Utc>> {
    if expires_in == 0 {
        return None;
    }
    let secs = i64::try_from(expires_in).ok()?;
    created_at.checked_add_signed(Duration::try_seconds(secs)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_lifetime_never_expires() {
        let data = AuthorizeData::new(Client::new("c1", "s", "https://a/cb"), "code", 0);
        assert_eq!(data.expire_at(), None);
        assert!(!data.is_expired_at(Utc::now() + Duration::days(365)));
    }

    #[test]
    fn test_access_expiry_is_relative_to_creation() {
        let mut access = AccessData::new(Client::new("c1", "s", "https://a/cb"), "tok", "ref", 60);
        access.created_at = Utc::now() - Duration::seconds(120);

        assert!(access.is_expired_at(Utc::now()));
        assert_eq!(
            access.expire_at(),
            Some(access.created_at + Duration::seconds(60))
        );
    }

    #[test]
    fn test_new_records_inherit_client_redirect_uri() {
        let client = Client::new("c1", "s", "https://a/cb");
        let access = AccessData::new(client.clone(), "tok", "ref", 60);
        assert_eq!(access.redirect_uri, "https://a/cb");
        assert_eq!(access.client_id(), Some("c1"));
    }
}
