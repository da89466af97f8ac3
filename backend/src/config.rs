//! Runtime configuration read from `CATALOG_*` environment variables.

use crate::store::MAX_BATCH_OPERATIONS;
use std::collections::HashMap;
use thiserror::Error;

const DEFAULT_PROBE_SECTIONS: &[&str] = &[
    "flashSale",
    "bestSellers",
    "popular",
    "newArrivals",
    "recommended",
    "seasonal",
];

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?} ({reason})")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub db_path: String,
    /// Items deleted per batch during cascade deletion.
    pub delete_batch_size: usize,
    /// Section ids probed when a caller does not name any.
    pub probe_sections: Vec<String>,
    pub json_limit: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            db_path: "home_catalog.sqlite".to_string(),
            delete_batch_size: 450,
            probe_sections: DEFAULT_PROBE_SECTIONS.iter().map(|s| s.to_string()).collect(),
            json_limit: 10 * 1024 * 1024,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&std::env::vars().collect())
    }

    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let mut config = AppConfig::default();

        if let Some(host) = vars.get("CATALOG_HOST") {
            config.host = host.trim().to_string();
        }
        if let Some(port) = vars.get("CATALOG_PORT") {
            config.port = parse("CATALOG_PORT", port)?;
        }
        if let Some(path) = vars.get("CATALOG_DB_PATH") {
            config.db_path = path.trim().to_string();
        }
        if let Some(size) = vars.get("CATALOG_DELETE_BATCH_SIZE") {
            let size: usize = parse("CATALOG_DELETE_BATCH_SIZE", size)?;
            // One slot stays free for the descriptor removal that rides along
            // with the final chunk.
            config.delete_batch_size = size.clamp(1, MAX_BATCH_OPERATIONS - 1);
        }
        if let Some(list) = vars.get("CATALOG_PROBE_SECTIONS") {
            config.probe_sections = list
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Some(limit) = vars.get("CATALOG_JSON_LIMIT") {
            config.json_limit = parse("CATALOG_JSON_LIMIT", limit)?;
        }

        Ok(config)
    }
}

fn parse<T>(key: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
        key,
        value: raw.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn defaults_without_environment() {
        let config = AppConfig::from_vars(&HashMap::new()).unwrap();
        assert_eq!(config, AppConfig::default());
        assert!(config.probe_sections.contains(&"flashSale".to_string()));
    }

    #[test]
    fn overrides_are_applied() {
        let config = AppConfig::from_vars(&vars(&[
            ("CATALOG_PORT", "9090"),
            ("CATALOG_DB_PATH", "/tmp/catalog.sqlite"),
            ("CATALOG_PROBE_SECTIONS", "deals, trending,"),
        ]))
        .unwrap();

        assert_eq!(config.port, 9090);
        assert_eq!(config.db_path, "/tmp/catalog.sqlite");
        assert_eq!(config.probe_sections, vec!["deals", "trending"]);
    }

    #[test]
    fn batch_size_is_clamped_below_store_ceiling() {
        let big = AppConfig::from_vars(&vars(&[("CATALOG_DELETE_BATCH_SIZE", "10000")])).unwrap();
        assert_eq!(big.delete_batch_size, MAX_BATCH_OPERATIONS - 1);

        let zero = AppConfig::from_vars(&vars(&[("CATALOG_DELETE_BATCH_SIZE", "0")])).unwrap();
        assert_eq!(zero.delete_batch_size, 1);
    }

    #[test]
    fn malformed_number_is_reported() {
        let err = AppConfig::from_vars(&vars(&[("CATALOG_PORT", "eighty")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "CATALOG_PORT", .. }));
    }
}
