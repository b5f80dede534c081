//! # Client Configuration
//!
//! Configuration management for the Shopfront client.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     SHOPFRONT_API_BASE=https://fakestoreapi.com                        │
//! │     SHOPFRONT_APP_URL=http://localhost:3000                            │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/shopfront/shopfront.toml (Linux)                         │
//! │     ~/Library/Application Support/com.shopfront.client/... (macOS)     │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     base_url = "/api" resolved against http://localhost:3000           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # shopfront.toml
//! [api]
//! base_url = "https://fakestoreapi.com"
//! app_url = "http://localhost:3000"
//! timeout_secs = 30
//!
//! [app]
//! environment = "local"
//! version = "0.0.0"
//!
//! [session]
//! path = "/var/lib/shopfront/user_data.json"
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{ClientError, ClientResult};
use crate::session::FileSessionStore;

// =============================================================================
// Environment
// =============================================================================

/// Deployment environment the client runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Environment {
    #[default]
    Local,
    Staging,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Local => write!(f, "local"),
            Environment::Staging => write!(f, "staging"),
            Environment::Production => write!(f, "production"),
        }
    }
}

impl std::str::FromStr for Environment {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "local" | "dev" | "development" => Ok(Environment::Local),
            "staging" => Ok(Environment::Staging),
            "production" | "prod" => Ok(Environment::Production),
            other => Err(ClientError::InvalidConfig(format!(
                "Unknown environment: '{}'. Valid options: local, staging, production",
                other
            ))),
        }
    }
}

// =============================================================================
// API Settings
// =============================================================================

/// Where and how to reach the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiSettings {
    /// Backend base URL. A relative value (`/api`) is resolved against
    /// `app_url`.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Public URL of the app itself.
    #[serde(default = "default_app_url")]
    pub app_url: String,

    /// Per-request timeout (seconds).
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// `User-Agent` header sent with every request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_base_url() -> String {
    "/api".to_string()
}

fn default_app_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_user_agent() -> String {
    concat!("shopfront/", env!("CARGO_PKG_VERSION")).to_string()
}

impl Default for ApiSettings {
    fn default() -> Self {
        ApiSettings {
            base_url: default_base_url(),
            app_url: default_app_url(),
            timeout_secs: default_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

impl ApiSettings {
    /// Absolute backend URL, without a trailing slash.
    ///
    /// ## Resolution
    /// - `https://fakestoreapi.com/` → `https://fakestoreapi.com`
    /// - `/api` with app `http://localhost:3000` → `http://localhost:3000/api`
    pub fn resolved_base_url(&self) -> ClientResult<String> {
        let resolved = match Url::parse(&self.base_url) {
            Ok(url) => url,
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                let app = Url::parse(&self.app_url)?;
                let mut path = app.path().trim_end_matches('/').to_string();
                path.push('/');
                path.push_str(self.base_url.trim_start_matches('/'));
                let mut joined = app;
                joined.set_path(&path);
                joined
            }
            Err(e) => return Err(e.into()),
        };

        if !matches!(resolved.scheme(), "http" | "https") {
            return Err(ClientError::InvalidUrl(format!(
                "Base URL must use http:// or https://, got: {}",
                resolved
            )));
        }

        Ok(resolved.as_str().trim_end_matches('/').to_string())
    }
}

// =============================================================================
// App Settings
// =============================================================================

/// Metadata about the running client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    #[serde(default)]
    pub environment: Environment,

    #[serde(default = "default_version")]
    pub version: String,
}

fn default_version() -> String {
    "0.0.0".to_string()
}

impl Default for AppSettings {
    fn default() -> Self {
        AppSettings {
            environment: Environment::default(),
            version: default_version(),
        }
    }
}

// =============================================================================
// Session Settings
// =============================================================================

/// Where the login session is persisted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionSettings {
    /// Explicit session file. Defaults to `user_data.json` in the platform
    /// data directory.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

// =============================================================================
// Main Client Configuration
// =============================================================================

/// Complete client configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default)]
    pub api: ApiSettings,

    #[serde(default)]
    pub app: AppSettings,

    #[serde(default)]
    pub session: SessionSettings,
}

impl ClientConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (shopfront.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> ClientResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading client config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load client config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> ClientResult<PathBuf> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| ClientError::ConfigSaveFailed("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| ClientError::ConfigSaveFailed(e.to_string()))?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents).map_err(|e| ClientError::ConfigSaveFailed(e.to_string()))?;

        info!(?path, "Client config saved");
        Ok(path)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> ClientResult<()> {
        if self.api.base_url.trim().is_empty() {
            return Err(ClientError::InvalidConfig("api.base_url must not be empty".into()));
        }

        self.api.resolved_base_url()?;

        if self.api.timeout_secs == 0 {
            return Err(ClientError::InvalidConfig(
                "api.timeout_secs must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    /// Applies environment variable overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("SHOPFRONT_API_BASE") {
            debug!(url = %url, "Overriding API base URL from environment");
            self.api.base_url = url;
        }

        if let Ok(url) = std::env::var("SHOPFRONT_APP_URL") {
            self.api.app_url = url;
        }

        if let Ok(timeout) = std::env::var("SHOPFRONT_TIMEOUT_SECS") {
            match timeout.parse::<u64>() {
                Ok(t) => self.api.timeout_secs = t,
                Err(_) => warn!(timeout = %timeout, "Ignoring non-numeric timeout in environment"),
            }
        }

        if let Ok(env) = std::env::var("SHOPFRONT_ENVIRONMENT") {
            match env.parse() {
                Ok(parsed) => self.app.environment = parsed,
                Err(e) => warn!(error = %e, "Ignoring environment override"),
            }
        }

        if let Ok(path) = std::env::var("SHOPFRONT_SESSION_PATH") {
            self.session.path = Some(PathBuf::from(path));
        }
    }

    /// Returns the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "shopfront", "client")
            .map(|dirs| dirs.config_dir().join("shopfront.toml"))
    }

    /// Session store for `[session].path`, or the platform default location.
    pub fn session_store(&self) -> ClientResult<FileSessionStore> {
        match &self.session.path {
            Some(path) => Ok(FileSessionStore::new(path)),
            None => FileSessionStore::default_location(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_environment_parsing() {
        assert_eq!("local".parse::<Environment>().unwrap(), Environment::Local);
        assert_eq!("PROD".parse::<Environment>().unwrap(), Environment::Production);
        assert_eq!("staging".parse::<Environment>().unwrap(), Environment::Staging);
        assert!("moon".parse::<Environment>().is_err());
    }

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.api.base_url, "/api");
        assert_eq!(config.api.timeout_secs, 30);
        assert_eq!(config.app.environment, Environment::Local);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_relative_base_url_resolves_against_app_url() {
        let api = ApiSettings::default();
        assert_eq!(api.resolved_base_url().unwrap(), "http://localhost:3000/api");

        let api = ApiSettings {
            app_url: "https://shop.example.com/store/".into(),
            base_url: "api/v1".into(),
            ..ApiSettings::default()
        };
        assert_eq!(
            api.resolved_base_url().unwrap(),
            "https://shop.example.com/store/api/v1"
        );
    }

    #[test]
    fn test_absolute_base_url_kept() {
        let api = ApiSettings {
            base_url: "https://fakestoreapi.com/".into(),
            ..ApiSettings::default()
        };
        assert_eq!(api.resolved_base_url().unwrap(), "https://fakestoreapi.com");
    }

    #[test]
    fn test_config_validation() {
        let mut config = ClientConfig::default();

        config.api.timeout_secs = 0;
        assert!(config.validate().is_err());

        config.api.timeout_secs = 5;
        config.api.base_url = "ftp://files.example.com".into();
        assert!(config.validate().is_err());

        config.api.base_url = "   ".into();
        assert!(config.validate().is_err());

        config.api.base_url = "https://fakestoreapi.com".into();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_toml_round_trip_sections() {
        let config = ClientConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[api]"));
        assert!(toml_str.contains("[app]"));

        let parsed: ClientConfig = toml::from_str("[api]\nbase_url = \"https://x.io\"\n").unwrap();
        assert_eq!(parsed.api.base_url, "https://x.io");
        assert_eq!(parsed.api.timeout_secs, 30);
    }

    #[test]
    fn test_session_store_prefers_configured_path() {
        let mut config = ClientConfig::default();
        config.session.path = Some(PathBuf::from("/tmp/shopfront/session.json"));

        let store = config.session_store().unwrap();
        assert_eq!(store.path(), Path::new("/tmp/shopfront/session.json"));
    }

    // Environment variables are process-wide; tests touching them hold this.
    static ENV_LOCK: parking_lot::Mutex<()> = parking_lot::const_mutex(());

    const ENV_VARS: [&str; 5] = [
        "SHOPFRONT_API_BASE",
        "SHOPFRONT_APP_URL",
        "SHOPFRONT_TIMEOUT_SECS",
        "SHOPFRONT_ENVIRONMENT",
        "SHOPFRONT_SESSION_PATH",
    ];

    fn clear_env() {
        for var in ENV_VARS {
            std::env::remove_var(var);
        }
    }

    fn write_config(name: &str, contents: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("shopfront-config-{}-{}", name, std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("shopfront.toml");
        std::fs::write(&path, contents).unwrap();
        path
    }

    const FILE_CONFIG: &str = r#"
[api]
base_url = "https://file.example.com/api"
app_url = "https://file.example.com"
timeout_secs = 12

[app]
environment = "staging"
"#;

    #[test]
    fn test_load_file_over_defaults() {
        let _guard = ENV_LOCK.lock();
        clear_env();
        let path = write_config("file", FILE_CONFIG);

        let config = ClientConfig::load(Some(path.clone())).unwrap();
        assert_eq!(config.api.base_url, "https://file.example.com/api");
        assert_eq!(config.api.timeout_secs, 12);
        assert_eq!(config.app.environment, Environment::Staging);
        assert_eq!(config.app.version, "0.0.0");
        assert!(config.session.path.is_none());

        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_env_overrides_file() {
        let _guard = ENV_LOCK.lock();
        clear_env();
        let path = write_config("env", FILE_CONFIG);

        std::env::set_var("SHOPFRONT_API_BASE", "/v2");
        std::env::set_var("SHOPFRONT_APP_URL", "https://env.example.com");
        std::env::set_var("SHOPFRONT_TIMEOUT_SECS", "7");
        std::env::set_var("SHOPFRONT_ENVIRONMENT", "production");
        std::env::set_var("SHOPFRONT_SESSION_PATH", "/tmp/shopfront-env/user_data.json");
        let config = ClientConfig::load(Some(path.clone()));
        clear_env();

        let config = config.unwrap();
        assert_eq!(config.api.base_url, "/v2");
        assert_eq!(config.api.resolved_base_url().unwrap(), "https://env.example.com/v2");
        assert_eq!(config.api.timeout_secs, 7);
        assert_eq!(config.app.environment, Environment::Production);
        assert_eq!(
            config.session.path,
            Some(PathBuf::from("/tmp/shopfront-env/user_data.json"))
        );

        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_unparsable_env_values_are_ignored() {
        let _guard = ENV_LOCK.lock();
        clear_env();
        let path = write_config("bad-env", FILE_CONFIG);

        std::env::set_var("SHOPFRONT_TIMEOUT_SECS", "soon");
        std::env::set_var("SHOPFRONT_ENVIRONMENT", "moon");
        let config = ClientConfig::load(Some(path.clone()));
        clear_env();

        let config = config.unwrap();
        assert_eq!(config.api.timeout_secs, 12);
        assert_eq!(config.app.environment, Environment::Staging);

        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let _guard = ENV_LOCK.lock();
        clear_env();
        let path = std::env::temp_dir().join("shopfront-config-missing/none.toml");

        let config = ClientConfig::load(Some(path)).unwrap();
        assert_eq!(config.api.base_url, "/api");
        assert_eq!(config.api.timeout_secs, 30);
    }
}
