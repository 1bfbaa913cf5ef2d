//! Configuration file parser for ~/.config/tnews/config.toml.
//!
//! The config file is optional. A missing or empty file yields
//! `Config::default()`; unknown keys are accepted but logged, since they are
//! usually typos.
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::api::PAGE_SIZE_RANGE;
use crate::theme::ThemeVariant;

pub const DEFAULT_API_URL: &str = "https://tn.thinkingdbx.com";
pub const DEFAULT_SITE_NAME: &str = "ThinkingNews";

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Config file too large: {0}")]
    TooLarge(String),
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// Top-level application configuration.
///
/// All fields use `#[serde(default)]` so any subset of keys can be specified.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the REST API (`/api/v1` is appended).
    pub api_url: String,

    /// Public site used for links in RSS, sitemap, JSON-LD and share URLs.
    pub site_url: String,

    pub site_name: String,

    /// "dark" or "light". Used only when no theme has been chosen in-app;
    /// unset means detect from the terminal.
    pub theme: Option<String>,

    /// Articles per page. Clamped to 1..=100 on read.
    pub page_size: u32,

    pub search_debounce_ms: u64,

    pub trending_limit: u32,

    pub request_timeout_secs: u64,

    /// Custom keybinding overrides. Keys are action names, values are key strings.
    pub keybindings: HashMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            site_url: DEFAULT_API_URL.to_string(),
            site_name: DEFAULT_SITE_NAME.to_string(),
            theme: None,
            page_size: 20,
            search_debounce_ms: 300,
            trending_limit: 5,
            request_timeout_secs: 30,
            keybindings: HashMap::new(),
        }
    }
}

impl Config {
    const MAX_FILE_SIZE: u64 = 1_048_576;

    const KNOWN_KEYS: [&'static str; 9] = [
        "api_url",
        "site_url",
        "site_name",
        "theme",
        "page_size",
        "search_debounce_ms",
        "trending_limit",
        "request_timeout_secs",
        "keybindings",
    ];

    /// Load configuration from a TOML file.
    ///
    /// - Missing file → `Ok(Config::default())`
    /// - Empty file → `Ok(Config::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)` with line number info
    /// - Unknown keys → accepted, logged as warning
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "Config file is {} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
            Ok(_) => {}
        }

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "Config file disappeared, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        Self::parse(&content)
    }

    /// Parses config text. Blank input yields the defaults.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        if let Ok(raw) = content.parse::<toml::Table>() {
            for key in raw.keys() {
                if !Self::KNOWN_KEYS.contains(&key.as_str()) {
                    tracing::warn!(key = %key, "Unknown key in config file, ignoring");
                }
            }
        }

        let config: Config = toml::from_str(content)?;
        tracing::info!(
            api_url = %config.api_url,
            page_size = config.page_size(),
            "Loaded configuration"
        );
        Ok(config)
    }

    /// `page_size` clamped to what the backend accepts.
    pub fn page_size(&self) -> u32 {
        self.page_size
            .clamp(*PAGE_SIZE_RANGE.start(), *PAGE_SIZE_RANGE.end())
    }

    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    /// The configured theme, if it names a known variant.
    pub fn theme_variant(&self) -> Option<ThemeVariant> {
        let name = self.theme.as_deref()?;
        let variant = ThemeVariant::from_str_name(name);
        if variant.is_none() {
            tracing::warn!(theme = %name, "Unknown theme in config, ignoring");
        }
        variant
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_config(name: &str, content: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("tnews_config_test_{name}"));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, content).unwrap();
        path
    }

    fn cleanup(path: &Path) {
        if let Some(dir) = path.parent() {
            std::fs::remove_dir_all(dir).ok();
        }
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.api_url, "https://tn.thinkingdbx.com");
        assert_eq!(config.site_name, "ThinkingNews");
        assert_eq!(config.page_size(), 20);
        assert_eq!(config.search_debounce(), Duration::from_millis(300));
        assert_eq!(config.trending_limit, 5);
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert!(config.theme.is_none());
        assert!(config.keybindings.is_empty());
    }

    #[test]
    fn test_missing_file_returns_default() {
        let path = Path::new("/tmp/tnews_test_nonexistent_config.toml");
        let config = Config::load(path).unwrap();
        assert_eq!(config.page_size, 20);
    }

    #[test]
    fn test_whitespace_only_returns_default() {
        let config = Config::parse("   \n  \n  ").unwrap();
        assert_eq!(config.api_url, DEFAULT_API_URL);
    }

    #[test]
    fn test_partial_config_uses_defaults_for_missing() {
        let path = temp_config("partial", "theme = \"light\"\n");
        let config = Config::load(&path).unwrap();
        assert_eq!(config.theme_variant(), Some(ThemeVariant::Light));
        assert_eq!(config.page_size, 20);
        cleanup(&path);
    }

    #[test]
    fn test_full_config() {
        let content = r#"
api_url = "http://localhost:8000"
site_url = "https://news.example.com"
site_name = "Example News"
theme = "dark"
page_size = 50
search_debounce_ms = 150
trending_limit = 10
request_timeout_secs = 5

[keybindings]
quit = "Ctrl+q"
refresh = "F5"
"#;
        let config = Config::parse(content).unwrap();
        assert_eq!(config.api_url, "http://localhost:8000");
        assert_eq!(config.site_url, "https://news.example.com");
        assert_eq!(config.site_name, "Example News");
        assert_eq!(config.page_size(), 50);
        assert_eq!(config.search_debounce(), Duration::from_millis(150));
        assert_eq!(config.trending_limit, 10);
        assert_eq!(config.request_timeout(), Duration::from_secs(5));
        assert_eq!(
            config.keybindings.get("quit").map(String::as_str),
            Some("Ctrl+q")
        );
    }

    #[test]
    fn test_page_size_is_clamped() {
        assert_eq!(Config::parse("page_size = 0").unwrap().page_size(), 1);
        assert_eq!(Config::parse("page_size = 500").unwrap().page_size(), 100);
    }

    #[test]
    fn test_unknown_theme_is_ignored() {
        let config = Config::parse("theme = \"solarized\"").unwrap();
        assert_eq!(config.theme_variant(), None);
    }

    #[test]
    fn test_invalid_toml_returns_error() {
        let err = Config::parse("this is not [valid toml").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
        assert!(err.to_string().contains("Invalid TOML"));
    }

    #[test]
    fn test_unknown_keys_accepted() {
        let config = Config::parse("page_size = 10\ntotally_fake_key = 1\n").unwrap();
        assert_eq!(config.page_size(), 10);
    }

    #[test]
    fn test_wrong_type_returns_error() {
        assert!(Config::parse("page_size = \"twenty\"\n").is_err());
    }

    #[test]
    fn test_too_large_file_rejected() {
        let path = temp_config("too_large", &"a".repeat(1_048_577));
        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::TooLarge(_)));
        assert!(err.to_string().contains("too large"));
        cleanup(&path);
    }
}
