use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the storefront API (default: "http://localhost:8080")
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Per-request timeout in seconds. Unset means no timeout.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    /// Where the session is persisted
    #[serde(default)]
    pub session: SessionConfig,
    /// Listing behaviour
    #[serde(default)]
    pub search: SearchConfig,
}

fn default_api_url() -> String {
    "http://localhost:8080".to_string()
}

/// Session persistence backend
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SessionConfig {
    File { path: PathBuf },
    Memory,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig::File {
            path: PathBuf::from(".storefront/session.json"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Quiet period before typed input becomes the search term
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    #[serde(default = "default_product_page_size")]
    pub product_page_size: u32,
    #[serde(default = "default_user_page_size")]
    pub user_page_size: u32,
}

fn default_debounce_ms() -> u64 {
    500
}

fn default_product_page_size() -> u32 {
    12
}

fn default_user_page_size() -> u32 {
    10
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            product_page_size: default_product_page_size(),
            user_page_size: default_user_page_size(),
        }
    }
}

impl SearchConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            timeout_secs: None,
            session: SessionConfig::default(),
            search: SearchConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from file, environment, and CLI arguments
    pub fn load(
        config_path: Option<&PathBuf>,
        cli_api_url: Option<&str>,
        cli_session_path: Option<&PathBuf>,
    ) -> Result<Self> {
        // Start with default config
        let mut config = if let Some(path) = config_path {
            let content = std::fs::read_to_string(path)?;
            Self::parse(&content)?
        } else {
            // Try default config file
            if let Ok(content) = std::fs::read_to_string("storefront.toml") {
                Self::parse(&content)?
            } else {
                Config::default()
            }
        };

        // Override with environment variables
        if let Ok(url) = std::env::var("STOREFRONT_API_URL") {
            config.api_url = url;
        }
        if let Ok(secs) = std::env::var("STOREFRONT_TIMEOUT_SECS") {
            if let Ok(s) = secs.parse() {
                config.timeout_secs = Some(s);
            }
        }
        if let Ok(path) = std::env::var("STOREFRONT_SESSION_PATH") {
            config.session = SessionConfig::File {
                path: PathBuf::from(path),
            };
        }
        if let Ok(ms) = std::env::var("STOREFRONT_DEBOUNCE_MS") {
            if let Ok(ms) = ms.parse() {
                config.search.debounce_ms = ms;
            }
        }

        // Override with CLI arguments
        if let Some(url) = cli_api_url {
            config.api_url = url.to_string();
        }
        if let Some(path) = cli_session_path {
            config.session = SessionConfig::File { path: path.clone() };
        }

        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(e.to_string()))
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.api_url, "http://localhost:8080");
        assert_eq!(config.search.debounce_ms, 500);
        assert_eq!(config.search.product_page_size, 12);
        assert_eq!(config.search.user_page_size, 10);
        assert!(config.timeout().is_none());
        assert!(matches!(config.session, SessionConfig::File { .. }));
    }

    #[test]
    fn parses_full_file() {
        let config = Config::parse(
            r#"
            api_url = "https://shop.example.com"
            timeout_secs = 30

            [session]
            type = "memory"

            [search]
            debounce_ms = 250
            product_page_size = 24
            "#,
        )
        .unwrap();
        assert_eq!(config.api_url, "https://shop.example.com");
        assert_eq!(config.timeout(), Some(Duration::from_secs(30)));
        assert!(matches!(config.session, SessionConfig::Memory));
        assert_eq!(config.search.debounce(), Duration::from_millis(250));
        assert_eq!(config.search.product_page_size, 24);
        assert_eq!(config.search.user_page_size, 10);
    }

    #[test]
    fn rejects_unknown_session_backend() {
        let err = Config::parse("[session]\ntype = \"redis\"\n").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
