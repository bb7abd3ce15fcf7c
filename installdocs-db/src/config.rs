use std::env;
use std::time::Duration;

use crate::error::{DbError, DbResult};

const DEFAULT_POOL_SIZE: u32 = 5;
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5000;

/// Where the database lives and how connections to it are opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbConfig {
    pub database_url: String,
    pub pool_size: u32,
    pub busy_timeout: Duration,
}

impl DbConfig {
    pub fn new(database_url: impl Into<String>) -> Self {
        DbConfig {
            database_url: database_url.into(),
            pool_size: DEFAULT_POOL_SIZE,
            busy_timeout: Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS),
        }
    }

    /// Reads `DATABASE_URL` (required), `DATABASE_POOL_SIZE` and
    /// `DATABASE_BUSY_TIMEOUT_MS`, after loading a `.env` file if present.
    pub fn from_env() -> DbResult<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> DbResult<Self> {
        let database_url = lookup("DATABASE_URL")
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| DbError::Config("DATABASE_URL must be set".to_string()))?;

        let mut config = DbConfig::new(database_url);

        if let Some(raw) = lookup("DATABASE_POOL_SIZE") {
            config.pool_size = raw
                .parse::<u32>()
                .ok()
                .filter(|size| *size > 0)
                .ok_or_else(|| {
                    DbError::Config(format!("DATABASE_POOL_SIZE must be a positive integer, got '{}'", raw))
                })?;
        }

        if let Some(raw) = lookup("DATABASE_BUSY_TIMEOUT_MS") {
            let millis = raw.parse::<u64>().map_err(|_| {
                DbError::Config(format!("DATABASE_BUSY_TIMEOUT_MS must be an integer, got '{}'", raw))
            })?;
            config.busy_timeout = Duration::from_millis(millis);
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_apply_when_only_url_is_set() {
        let config = DbConfig::from_lookup(lookup_from(&[("DATABASE_URL", "installdocs.sqlite")]))
            .expect("config should load");

        assert_eq!(config.database_url, "installdocs.sqlite");
        assert_eq!(config.pool_size, 5);
        assert_eq!(config.busy_timeout, Duration::from_millis(5000));
    }

    #[test]
    fn test_overrides_are_parsed() {
        let config = DbConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "db.sqlite"),
            ("DATABASE_POOL_SIZE", "12"),
            ("DATABASE_BUSY_TIMEOUT_MS", "250"),
        ]))
        .unwrap();

        assert_eq!(config.pool_size, 12);
        assert_eq!(config.busy_timeout, Duration::from_millis(250));
    }

    #[test]
    fn test_missing_url_is_a_config_error() {
        let err = DbConfig::from_lookup(lookup_from(&[])).unwrap_err();
        assert!(matches!(err, DbError::Config(_)));
    }

    #[test]
    fn test_zero_pool_size_is_rejected() {
        let err = DbConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "db.sqlite"),
            ("DATABASE_POOL_SIZE", "0"),
        ]))
        .unwrap_err();
        assert!(matches!(err, DbError::Config(_)));
    }
}
