//! Service configuration loading
//!
//! Resolution follows a fixed priority order:
//! 1. Environment variable (highest priority)
//! 2. TOML config file (`<config_dir>/chopd/config.toml`)
//! 3. Compiled default (fallback)

use serde::Deserialize;
use std::path::PathBuf;

/// Default listen port, matching the original deployment
pub const DEFAULT_PORT: u16 = 3000;

/// Default OpenAI-compatible API base URL
pub const DEFAULT_API_BASE_URL: &str = "https://api.openai.com/v1";

/// Default vision model identifier
pub const DEFAULT_VISION_MODEL: &str = "gpt-4-vision-preview";

/// Runtime configuration for the chopd API service
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Bind address for the HTTP listener
    pub host: String,
    /// Bind port for the HTTP listener
    pub port: u16,
    /// API key for the external vision model; when absent the service
    /// serves mock analyses instead of calling out
    pub api_key: Option<String>,
    /// Vision model identifier sent in chat-completion requests
    pub vision_model: String,
    /// Base URL of the OpenAI-compatible API
    pub api_base_url: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            api_key: None,
            vision_model: DEFAULT_VISION_MODEL.to_string(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
        }
    }
}

/// Optional overrides read from the TOML config file
#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    host: Option<String>,
    port: Option<u16>,
    api_key: Option<String>,
    vision_model: Option<String>,
    api_base_url: Option<String>,
}

impl ServiceConfig {
    /// Load configuration with env > TOML file > default priority
    pub fn load() -> Self {
        let mut config = Self::default();

        // Priority 3 -> 2: overlay TOML file values onto compiled defaults
        if let Some(file) = load_config_file() {
            if let Some(host) = file.host {
                config.host = host;
            }
            if let Some(port) = file.port {
                config.port = port;
            }
            if let Some(key) = file.api_key {
                config.api_key = Some(key);
            }
            if let Some(model) = file.vision_model {
                config.vision_model = model;
            }
            if let Some(url) = file.api_base_url {
                config.api_base_url = url;
            }
        }

        // Priority 1: environment variables win over everything
        if let Ok(host) = std::env::var("CHOPD_HOST") {
            config.host = host;
        }
        if let Ok(port) = std::env::var("CHOPD_PORT") {
            match port.parse() {
                Ok(port) => config.port = port,
                Err(_) => tracing::warn!("Ignoring unparseable CHOPD_PORT: {}", port),
            }
        }
        if let Ok(key) = std::env::var("OPENAI_API_KEY") {
            if !key.trim().is_empty() {
                config.api_key = Some(key);
            }
        }
        if let Ok(model) = std::env::var("CHOPD_VISION_MODEL") {
            config.vision_model = model;
        }
        if let Ok(url) = std::env::var("CHOPD_API_BASE_URL") {
            config.api_base_url = url;
        }

        config
    }
}

/// Locate and parse the platform config file, if present
fn load_config_file() -> Option<FileConfig> {
    let path = config_file_path()?;
    let contents = std::fs::read_to_string(&path).ok()?;
    match toml::from_str(&contents) {
        Ok(file) => {
            tracing::debug!("Loaded config file: {}", path.display());
            Some(file)
        }
        Err(e) => {
            tracing::warn!("Ignoring malformed config file {}: {}", path.display(), e);
            None
        }
    }
}

/// Platform config file path: `<config_dir>/chopd/config.toml`
fn config_file_path() -> Option<PathBuf> {
    let path = dirs::config_dir()?.join("chopd").join("config.toml");
    path.exists().then_some(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServiceConfig::default();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, DEFAULT_PORT);
        assert!(config.api_key.is_none());
        assert_eq!(config.vision_model, DEFAULT_VISION_MODEL);
        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
    }

    #[test]
    fn test_file_config_partial_overlay() {
        let file: FileConfig = toml::from_str("port = 8080\napi_key = \"sk-test\"").unwrap();
        assert_eq!(file.port, Some(8080));
        assert_eq!(file.api_key.as_deref(), Some("sk-test"));
        assert!(file.host.is_none());
    }
}
