// src/config.rs
use crate::error::ConfigError;
use std::env;

pub const DEFAULT_KEY_PREFIX: &str = "oauth";

#[derive(Debug, Clone, PartialEq)]
pub struct StorageConfig {
    pub redis_url: String,
    pub key_prefix: String, // shared by every key this store writes
}

impl StorageConfig {
    /// Reads `REDIS_URL` and `STORAGE_KEY_PREFIX`, after loading a `.env`
    /// file if one is present.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_vars(|name| env::var(name).ok())
    }

    fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let redis_url = lookup("REDIS_URL")
            .filter(|url| !url.trim().is_empty())
            .ok_or(ConfigError::Missing("REDIS_URL"))?;
        if !redis_url.starts_with("redis://")
            && !redis_url.starts_with("rediss://")
            && !redis_url.starts_with("redis+unix://")
            && !redis_url.starts_with("unix://")
        {
            return Err(ConfigError::Invalid {
                name: "REDIS_URL",
                reason: format!("unsupported scheme in {}", redis_url),
            });
        }

        let key_prefix = lookup("STORAGE_KEY_PREFIX").unwrap_or_else(|| DEFAULT_KEY_PREFIX.to_string());
        if key_prefix.is_empty() {
            return Err(ConfigError::Invalid {
                name: "STORAGE_KEY_PREFIX",
                reason: "must not be empty".to_string(),
            });
        }

        Ok(StorageConfig {
            redis_url,
            key_prefix,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults_key_prefix() {
        let config = StorageConfig::from_vars(vars(&[("REDIS_URL", "redis://127.0.0.1/")])).unwrap();
        assert_eq!(config.redis_url, "redis://127.0.0.1/");
        assert_eq!(config.key_prefix, DEFAULT_KEY_PREFIX);
    }

    #[test]
    fn test_custom_key_prefix() {
        let config = StorageConfig::from_vars(vars(&[
            ("REDIS_URL", "redis://cache:6379/2"),
            ("STORAGE_KEY_PREFIX", "tenant-a"),
        ]))
        .unwrap();
        assert_eq!(config.key_prefix, "tenant-a");
    }

    #[test]
    fn test_missing_redis_url() {
        assert_eq!(
            StorageConfig::from_vars(vars(&[])),
            Err(ConfigError::Missing("REDIS_URL"))
        );
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(matches!(
            StorageConfig::from_vars(vars(&[("REDIS_URL", "http://localhost")])),
            Err(ConfigError::Invalid { name: "REDIS_URL", .. })
        ));
        assert!(matches!(
            StorageConfig::from_vars(vars(&[
                ("REDIS_URL", "redis://localhost"),
                ("STORAGE_KEY_PREFIX", "")
            ])),
            Err(ConfigError::Invalid {
                name: "STORAGE_KEY_PREFIX",
                ..
            })
        ));
    }
}
