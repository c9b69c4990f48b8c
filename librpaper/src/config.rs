//! Configuration management for rpaper

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, Result};
use crate::http::{DEFAULT_CSRF_COOKIE, DEFAULT_CSRF_HEADER};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Origin the `/api/...` paths are resolved against
    pub base_url: String,

    /// Cookie holding the CSRF token
    #[serde(default = "default_csrf_cookie")]
    pub csrf_cookie: String,

    /// Header the CSRF token is echoed back in
    #[serde(default = "default_csrf_header")]
    pub csrf_header: String,

    /// Token to seed the cookie jar with before the server has set one
    #[serde(default)]
    pub csrf_token: Option<String>,

    /// Requests leave the API's origin; no CSRF header is attached
    #[serde(default)]
    pub cross_origin: bool,
}

fn default_csrf_cookie() -> String {
    DEFAULT_CSRF_COOKIE.to_string()
}

fn default_csrf_header() -> String {
    DEFAULT_CSRF_HEADER.to_string()
}

impl Config {
    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        let config_path = resolve_config_path()?;
        Self::load_from_path(&config_path)
    }

    /// Load configuration from the default location, falling back to
    /// `default_config()` when no file exists there
    pub fn load_or_default() -> Result<Self> {
        let config_path = resolve_config_path()?;
        if !config_path.exists() {
            tracing::debug!(
                "No config file at {}, using defaults",
                config_path.display()
            );
            return Ok(Self::default_config());
        }
        Self::load_from_path(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadError)?;
        let config: Config = toml::from_str(&content).map_err(ConfigError::ParseError)?;
        config.validate()?;
        Ok(config)
    }

    /// Create a default configuration
    pub fn default_config() -> Self {
        Self {
            api: ApiConfig {
                base_url: "http://localhost:8000".to_string(),
                csrf_cookie: default_csrf_cookie(),
                csrf_header: default_csrf_header(),
                csrf_token: None,
                cross_origin: false,
            },
        }
    }

    fn validate(&self) -> Result<()> {
        let base_url = self.api.base_url.trim();
        if base_url.is_empty() {
            return Err(ConfigError::MissingField("api.base_url".to_string()).into());
        }
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ConfigError::InvalidUrl(self.api.base_url.clone()).into());
        }
        Ok(())
    }
}

/// Resolve the configuration file path following the XDG Base Directory layout
pub fn resolve_config_path() -> Result<PathBuf> {
    if let Ok(path) = std::env::var("RPAPER_CONFIG") {
        return Ok(PathBuf::from(shellexpand::tilde(&path).to_string()));
    }

    let config_dir = dirs::config_dir()
        .ok_or_else(|| ConfigError::MissingField("config directory".to_string()))?;

    Ok(config_dir.join("rpaper").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RpaperError;
    use serial_test::serial;
    use tempfile::TempDir;

    fn write_config(dir: &TempDir, content: &str) -> PathBuf {
        let path = dir.path().join("config.toml");
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_load_minimal_config_fills_defaults() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "[api]\nbase_url = \"https://rpaper.example.com\"\n");

        let config = Config::load_from_path(&path).unwrap();
        assert_eq!(config.api.base_url, "https://rpaper.example.com");
        assert_eq!(config.api.csrf_cookie, "csrftoken");
        assert_eq!(config.api.csrf_header, "X-CSRFToken");
        assert_eq!(config.api.csrf_token, None);
        assert!(!config.api.cross_origin);
    }

    #[test]
    fn test_load_full_config() {
        let dir = TempDir::new().unwrap();
        let path = write_config(
            &dir,
            r#"
[api]
base_url = "http://localhost:8000"
csrf_cookie = "xsrf"
csrf_header = "X-XSRF-Token"
csrf_token = "abc"
cross_origin = true
"#,
        );

        let config = Config::load_from_path(&path).unwrap();
        assert_eq!(config.api.csrf_cookie, "xsrf");
        assert_eq!(config.api.csrf_header, "X-XSRF-Token");
        assert_eq!(config.api.csrf_token.as_deref(), Some("abc"));
        assert!(config.api.cross_origin);
    }

    #[test]
    fn test_load_rejects_bad_base_url() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "[api]\nbase_url = \"ftp://example.com\"\n");

        let err = Config::load_from_path(&path).unwrap_err();
        assert!(matches!(err, RpaperError::Config(ConfigError::InvalidUrl(_))));
    }

    #[test]
    fn test_load_reports_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "[api\nbase_url = ");

        let err = Config::load_from_path(&path).unwrap_err();
        assert!(matches!(err, RpaperError::Config(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = Config::load_from_path(&dir.path().join("nope.toml")).unwrap_err();
        assert!(matches!(err, RpaperError::Config(ConfigError::ReadError(_))));
    }

    #[test]
    #[serial]
    fn test_resolve_config_path_from_env() {
        std::env::set_var("RPAPER_CONFIG", "/tmp/rpaper-test/config.toml");
        let path = resolve_config_path().unwrap();
        std::env::remove_var("RPAPER_CONFIG");

        assert_eq!(path, PathBuf::from("/tmp/rpaper-test/config.toml"));
    }

    #[test]
    #[serial]
    fn test_load_or_default_without_file() {
        let dir = TempDir::new().unwrap();
        std::env::set_var("RPAPER_CONFIG", dir.path().join("absent.toml"));
        let config = Config::load_or_default();
        std::env::remove_var("RPAPER_CONFIG");

        assert_eq!(config.unwrap().api.base_url, "http://localhost:8000");
    }

    #[test]
    #[serial]
    fn test_load_uses_env_path() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "[api]\nbase_url = \"http://127.0.0.1:9000\"\n");
        std::env::set_var("RPAPER_CONFIG", &path);
        let config = Config::load();
        std::env::remove_var("RPAPER_CONFIG");

        assert_eq!(config.unwrap().api.base_url, "http://127.0.0.1:9000");
    }
}
