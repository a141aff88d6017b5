use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

/// Composition-root configuration for a [`Library`].
///
/// [`Library`]: crate::Library
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LibraryConfig {
    /// Origin serving `/translations/<id>.json` documents, no trailing slash.
    pub base_url: String,
    /// Directory for the embedded durable store.
    pub data_dir: PathBuf,
    /// Working-set capacity in entries.
    pub cache_capacity: usize,
    /// Working-set entry time-to-live, in seconds.
    pub cache_ttl_secs: u64,
    /// Cadence of the background expiry sweep, in seconds.
    pub sweep_period_secs: u64,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            data_dir: PathBuf::from("lectern-data"),
            cache_capacity: 50,
            cache_ttl_secs: 30 * 60,
            sweep_period_secs: 5 * 60,
        }
    }
}

impl LibraryConfig {
    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn sweep_period(&self) -> Duration {
        Duration::from_secs(self.sweep_period_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = LibraryConfig::default();
        assert_eq!(config.cache_capacity, 50);
        assert_eq!(config.cache_ttl(), Duration::from_secs(1800));
        assert_eq!(config.sweep_period(), Duration::from_secs(300));
    }

    #[test]
    fn test_from_toml_overrides_defaults() {
        let config = LibraryConfig::from_toml(
            r#"
            base_url = "https://texts.example.org"
            cache_capacity = 8
            "#,
        )
        .unwrap();
        assert_eq!(config.base_url, "https://texts.example.org");
        assert_eq!(config.cache_capacity, 8);
        assert_eq!(config.cache_ttl_secs, 1800);
    }

    #[test]
    fn test_from_toml_rejects_unknown_fields() {
        assert!(LibraryConfig::from_toml("cache_sizes = 3").is_err());
    }
}
