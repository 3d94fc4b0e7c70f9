use std::fmt;

/// The key categories the store writes. Their textual form is part of the
/// on-backend layout and must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    Client,
    Auth,
    Access,
    AccessToken,
    RefreshToken,
}

impl Namespace {
    pub fn as_str(&self) -> &'static str {
        match self {
            Namespace::Client => "client",
            Namespace::Auth => "auth",
            Namespace::Access => "access",
            Namespace::AccessToken => "access_token",
            Namespace::RefreshToken => "refresh_token",
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Builds `<prefix>:<namespace>:<id>` keys so several logical stores can share
/// one physical backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyNamer {
    prefix: String,
}

impl KeyNamer {
    pub fn new(prefix: &str) -> Self {
        KeyNamer {
            prefix: prefix.to_string(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn make_key(&self, namespace: Namespace, id: &str) -> String {
        format!("{}:{}:{}", self.prefix, namespace, id)
    }
}
