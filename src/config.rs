//! TOML configuration.
//!
//! ```toml
//! [db]
//! path = "./data/mlp.sqlite"
//!
//! [server]
//! bind = "127.0.0.1:7340"
//!
//! [discovery]
//! page_size = 6
//! fuzzy_threshold = 0.3
//!
//! [analytics]
//! path = "./data/search-analytics.json"
//! ```
//!
//! Only `[db]` and `[server]` are required; every other section falls back
//! to defaults.

use anyhow::{Context, Result};
use mlp_reviews_core::discovery::DiscoveryOptions;
use mlp_reviews_core::fuzzy::FuzzyOptions;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    pub server: ServerConfig,
    #[serde(default)]
    pub discovery: DiscoveryConfig,
    #[serde(default)]
    pub analytics: AnalyticsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub bind: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DiscoveryConfig {
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    /// 0.0 matches exactly, 1.0 matches anything.
    #[serde(default = "default_fuzzy_threshold")]
    pub fuzzy_threshold: f64,
    #[serde(default = "default_min_match_char_length")]
    pub min_match_char_length: usize,
    #[serde(default = "default_search_debounce_ms")]
    pub search_debounce_ms: u64,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            fuzzy_threshold: default_fuzzy_threshold(),
            min_match_char_length: default_min_match_char_length(),
            search_debounce_ms: default_search_debounce_ms(),
        }
    }
}

fn default_page_size() -> usize {
    6
}
fn default_fuzzy_threshold() -> f64 {
    0.3
}
fn default_min_match_char_length() -> usize {
    2
}
fn default_search_debounce_ms() -> u64 {
    300
}

#[derive(Debug, Deserialize, Clone)]
pub struct AnalyticsConfig {
    #[serde(default = "default_analytics_enabled")]
    pub enabled: bool,
    #[serde(default = "default_analytics_path")]
    pub path: PathBuf,
    #[serde(default = "default_max_events")]
    pub max_events: usize,
    #[serde(default = "default_analytics_debounce_ms")]
    pub debounce_ms: u64,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            enabled: default_analytics_enabled(),
            path: default_analytics_path(),
            max_events: default_max_events(),
            debounce_ms: default_analytics_debounce_ms(),
        }
    }
}

fn default_analytics_enabled() -> bool {
    true
}
fn default_analytics_path() -> PathBuf {
    PathBuf::from("./data/search-analytics.json")
}
fn default_max_events() -> usize {
    mlp_reviews_core::analytics::DEFAULT_MAX_EVENTS
}
fn default_analytics_debounce_ms() -> u64 {
    1000
}

impl Config {
    /// All-defaults configuration for commands that can run without a file.
    pub fn minimal() -> Self {
        Self {
            db: DbConfig {
                path: PathBuf::from("./data/mlp.sqlite"),
            },
            server: ServerConfig {
                bind: "127.0.0.1:7340".to_string(),
            },
            discovery: DiscoveryConfig::default(),
            analytics: AnalyticsConfig::default(),
        }
    }

    /// Controller options derived from `[discovery]` and `[analytics]`.
    pub fn discovery_options(&self) -> DiscoveryOptions {
        DiscoveryOptions {
            page_size: self.discovery.page_size,
            fuzzy: FuzzyOptions {
                threshold: self.discovery.fuzzy_threshold,
                min_match_char_length: self.discovery.min_match_char_length,
                ..FuzzyOptions::default()
            },
            search_debounce_ms: self.discovery.search_debounce_ms,
            analytics_debounce_ms: self.analytics.debounce_ms,
            html_highlights: false,
        }
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    if config.discovery.page_size == 0 {
        anyhow::bail!("discovery.page_size must be >= 1");
    }

    if !(0.0..=1.0).contains(&config.discovery.fuzzy_threshold) {
        anyhow::bail!("discovery.fuzzy_threshold must be in [0.0, 1.0]");
    }

    if config.discovery.min_match_char_length == 0 {
        anyhow::bail!("discovery.min_match_char_length must be >= 1");
    }

    if config.analytics.max_events == 0 {
        anyhow::bail!("analytics.max_events must be >= 1");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(toml_str: &str) -> Result<Config> {
        let config: Config = toml::from_str(toml_str)?;
        validate(&config)?;
        Ok(config)
    }

    const BASE: &str = r#"
[db]
path = "./data/mlp.sqlite"

[server]
bind = "127.0.0.1:7340"
"#;

    #[test]
    fn test_defaults_fill_optional_sections() {
        let config = parse(BASE).unwrap();
        assert_eq!(config.discovery.page_size, 6);
        assert_eq!(config.discovery.fuzzy_threshold, 0.3);
        assert!(config.analytics.enabled);
        assert_eq!(config.analytics.max_events, 100);
        assert_eq!(config.analytics.debounce_ms, 1000);
    }

    #[test]
    fn test_rejects_zero_page_size() {
        let toml_str = format!("{}\n[discovery]\npage_size = 0\n", BASE);
        let err = parse(&toml_str).unwrap_err();
        assert!(err.to_string().contains("page_size"));
    }

    #[test]
    fn test_rejects_threshold_out_of_range() {
        let toml_str = format!("{}\n[discovery]\nfuzzy_threshold = 1.5\n", BASE);
        assert!(parse(&toml_str).is_err());
    }

    #[test]
    fn test_rejects_zero_max_events() {
        let toml_str = format!("{}\n[analytics]\nmax_events = 0\n", BASE);
        assert!(parse(&toml_str).is_err());
    }

    #[test]
    fn test_discovery_options_mapping() {
        let toml_str = format!(
            "{}\n[discovery]\npage_size = 10\nfuzzy_threshold = 0.1\n\n[analytics]\ndebounce_ms = 50\n",
            BASE
        );
        let options = parse(&toml_str).unwrap().discovery_options();
        assert_eq!(options.page_size, 10);
        assert_eq!(options.fuzzy.threshold, 0.1);
        assert_eq!(options.analytics_debounce_ms, 50);
    }

    #[test]
    fn test_minimal_is_valid() {
        assert!(validate(&Config::minimal()).is_ok());
    }
}
