//! Client configuration for connecting to a Lyceum backend.
//!
//! Implements a kubeconfig-style configuration with named contexts:
//!
//! ```yaml
//! api-version: v1
//! kind: ClientConfig
//!
//! current-context: local
//!
//! contexts:
//!   - name: local
//!     server: http://localhost:4943
//!   - name: staging
//!     server: https://api.lyceum.example
//!     timeout: 60
//!     return-base-url: https://lyceum.example
//!
//! defaults:
//!   cache:
//!     max-entries: 512
//!     stale-after-secs: 300
//!   payment:
//!     confirm-timeout-secs: 90
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{ConfigError, Result};

// ─────────────────────────────────────────────────────────────────────────────
// Client Config
// ─────────────────────────────────────────────────────────────────────────────

/// API version for the client config file format.
pub const API_VERSION: &str = "v1";

/// Kind identifier for client config files.
pub const KIND: &str = "ClientConfig";

/// Server used when no context is configured.
pub const DEFAULT_SERVER: &str = "http://localhost:4943";

/// Default config filename.
const CLIENT_CONFIG_FILE: &str = "client.yaml";

/// Root client configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ClientConfig {
    /// API version (always "v1" currently).
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Config kind (always "ClientConfig").
    #[serde(default = "default_kind")]
    pub kind: String,

    /// Name of the current/default context.
    #[serde(default)]
    pub current_context: Option<String>,

    /// Named connection contexts.
    #[serde(default)]
    pub contexts: Vec<Context>,

    /// Default settings applied to all contexts.
    #[serde(default)]
    pub defaults: ClientDefaults,
}

fn default_api_version() -> String {
    API_VERSION.to_string()
}

fn default_kind() -> String {
    KIND.to_string()
}

impl ClientConfig {
    /// Create an empty client config.
    pub fn new() -> Self {
        Self {
            api_version: API_VERSION.to_string(),
            kind: KIND.to_string(),
            ..Default::default()
        }
    }

    /// Parse from a YAML string.
    pub fn from_yaml(yaml_str: &str) -> Result<Self> {
        serde_yaml::from_str(yaml_str).map_err(|e| ConfigError::ParseYaml(e.to_string()))
    }

    /// Serialize to a YAML string.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(|e| ConfigError::ParseYaml(e.to_string()))
    }

    /// Get the current context, if set and valid.
    pub fn current(&self) -> Option<&Context> {
        self.current_context
            .as_ref()
            .and_then(|name| self.get_context(name))
    }

    /// Get a context by name.
    pub fn get_context(&self, name: &str) -> Option<&Context> {
        self.contexts.iter().find(|c| c.name == name)
    }

    /// Add or update a context.
    pub fn set_context(&mut self, context: Context) {
        match self.contexts.iter_mut().find(|c| c.name == context.name) {
            Some(existing) => *existing = context,
            None => self.contexts.push(context),
        }
    }

    /// Remove a context by name. Clears `current-context` if it pointed there.
    pub fn remove_context(&mut self, name: &str) -> Option<Context> {
        let pos = self.contexts.iter().position(|c| c.name == name)?;
        if self.current_context.as_deref() == Some(name) {
            self.current_context = None;
        }
        Some(self.contexts.remove(pos))
    }

    /// Set the current context by name.
    ///
    /// Returns an error if the context doesn't exist.
    pub fn use_context(&mut self, name: &str) -> Result<()> {
        if self.get_context(name).is_some() {
            self.current_context = Some(name.to_string());
            Ok(())
        } else {
            Err(ConfigError::ContextNotFound(name.to_string()))
        }
    }

    /// List all context names.
    pub fn context_names(&self) -> Vec<&str> {
        self.contexts.iter().map(|c| c.name.as_str()).collect()
    }

    /// Fold a context over the defaults.
    ///
    /// `context` selects a named context (falling back to the current one);
    /// `server_override` wins over whatever the context says. Without any
    /// context the defaults point at [`DEFAULT_SERVER`].
    pub fn resolve(&self, context: Option<&str>, server_override: Option<&str>) -> Result<Settings> {
        let ctx = match context {
            Some(name) => Some(
                self.get_context(name)
                    .ok_or_else(|| ConfigError::ContextNotFound(name.to_string()))?,
            ),
            None => self.current(),
        };

        let server = server_override
            .map(str::to_string)
            .or_else(|| ctx.map(|c| c.server.clone()))
            .unwrap_or_else(|| DEFAULT_SERVER.to_string());
        if server.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "server".to_string(),
                reason: "must not be empty".to_string(),
            });
        }

        let timeout = ctx.and_then(|c| c.timeout).unwrap_or(self.defaults.timeout);
        let return_base_url = ctx
            .and_then(|c| c.return_base_url.clone())
            .or_else(|| self.defaults.payment.return_base_url.clone())
            .unwrap_or_else(|| server.clone());

        let currency = self.defaults.payment.currency.trim().to_ascii_uppercase();
        if currency.is_empty() {
            return Err(ConfigError::Invalid {
                field: "defaults.payment.currency".to_string(),
                reason: "must not be empty".to_string(),
            });
        }

        Ok(Settings {
            context: ctx.map(|c| c.name.clone()),
            server,
            timeout: Duration::from_secs(timeout),
            return_base_url,
            cache_max_entries: self.defaults.cache.max_entries,
            cache_stale_after: self.defaults.cache.stale_after_secs.map(Duration::from_secs),
            confirm_timeout: Duration::from_secs(self.defaults.payment.confirm_timeout_secs),
            redirect_delay: Duration::from_millis(self.defaults.payment.redirect_delay_ms),
            currency,
            login_retry_delay: Duration::from_millis(self.defaults.identity.retry_delay_ms),
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Context
// ─────────────────────────────────────────────────────────────────────────────

/// A named connection context.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Context {
    /// Unique name for this context.
    pub name: String,

    /// Backend gateway URL (e.g., "http://localhost:4943").
    pub server: String,

    /// Request timeout override (seconds).
    #[serde(default)]
    pub timeout: Option<u64>,

    /// Base URL the payment provider redirects back to.
    #[serde(default)]
    pub return_base_url: Option<String>,
}

impl Context {
    /// Create a new context with just a name and server URL.
    pub fn new(name: impl Into<String>, server: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            server: server.into(),
            timeout: None,
            return_base_url: None,
        }
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout: u64) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the payment return base URL.
    pub fn with_return_base_url(mut self, url: impl Into<String>) -> Self {
        self.return_base_url = Some(url.into());
        self
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Defaults
// ─────────────────────────────────────────────────────────────────────────────

/// Default settings applied to all contexts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ClientDefaults {
    /// Default request timeout in seconds.
    pub timeout: u64,
    pub cache: CacheDefaults,
    pub payment: PaymentDefaults,
    pub identity: IdentityDefaults,
}

impl Default for ClientDefaults {
    fn default() -> Self {
        Self {
            timeout: 30,
            cache: CacheDefaults::default(),
            payment: PaymentDefaults::default(),
            identity: IdentityDefaults::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CacheDefaults {
    /// Maximum number of cached queries.
    pub max_entries: usize,
    /// Refetch successful reads older than this. Unset means never.
    pub stale_after_secs: Option<u64>,
}

impl Default for CacheDefaults {
    fn default() -> Self {
        Self {
            max_entries: 1024,
            stale_after_secs: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct PaymentDefaults {
    /// Base URL the payment provider redirects back to, for every context.
    pub return_base_url: Option<String>,
    /// Give up on a hung payment confirmation after this long.
    pub confirm_timeout_secs: u64,
    /// Pause between a confirmed payment and the dashboard.
    pub redirect_delay_ms: u64,
    pub currency: String,
}

impl Default for PaymentDefaults {
    fn default() -> Self {
        Self {
            return_base_url: None,
            confirm_timeout_secs: 120,
            redirect_delay_ms: 3000,
            currency: "USD".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct IdentityDefaults {
    /// Delay before retrying a login that hit a stale session.
    pub retry_delay_ms: u64,
}

impl Default for IdentityDefaults {
    fn default() -> Self {
        Self { retry_delay_ms: 300 }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Resolved settings
// ─────────────────────────────────────────────────────────────────────────────

/// Effective settings after applying a context to the defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Name of the context used, if any.
    pub context: Option<String>,
    pub server: String,
    pub timeout: Duration,
    pub return_base_url: String,
    pub cache_max_entries: usize,
    pub cache_stale_after: Option<Duration>,
    pub confirm_timeout: Duration,
    pub redirect_delay: Duration,
    pub currency: String,
    pub login_retry_delay: Duration,
}

// ─────────────────────────────────────────────────────────────────────────────
// Loading / Saving
// ─────────────────────────────────────────────────────────────────────────────

/// Get the path to the client config file.
pub fn client_config_path() -> Option<PathBuf> {
    crate::xdg_config_dir().map(|d| d.join(CLIENT_CONFIG_FILE))
}

/// Load the client configuration.
///
/// Returns a default config if the file doesn't exist.
pub fn load_client_config() -> Result<ClientConfig> {
    load_client_config_from(client_config_path().as_deref())
}

/// Load client config from a specific path.
pub fn load_client_config_from(path: Option<&Path>) -> Result<ClientConfig> {
    let Some(path) = path else {
        return Ok(ClientConfig::new());
    };

    if !path.exists() {
        return Ok(ClientConfig::new());
    }

    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.display().to_string(),
        source: e,
    })?;

    ClientConfig::from_yaml(&contents)
}

/// Save the client configuration.
pub fn save_client_config(config: &ClientConfig) -> Result<()> {
    let path = client_config_path()
        .ok_or_else(|| ConfigError::Other("Could not determine config directory".to_string()))?;
    save_client_config_to(config, &path)
}

/// Save client config to a specific path.
pub fn save_client_config_to(config: &ClientConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| ConfigError::WriteFile {
            path: parent.display().to_string(),
            source: e,
        })?;
    }

    let contents = config.to_yaml()?;
    std::fs::write(path, contents).map_err(|e| ConfigError::WriteFile {
        path: path.display().to_string(),
        source: e,
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_empty_config_resolves_to_defaults() {
        let config = ClientConfig::new();
        let settings = config.resolve(None, None).unwrap();

        assert_eq!(settings.context, None);
        assert_eq!(settings.server, DEFAULT_SERVER);
        assert_eq!(settings.return_base_url, DEFAULT_SERVER);
        assert_eq!(settings.timeout, Duration::from_secs(30));
        assert_eq!(settings.cache_max_entries, 1024);
        assert_eq!(settings.cache_stale_after, None);
        assert_eq!(settings.confirm_timeout, Duration::from_secs(120));
        assert_eq!(settings.redirect_delay, Duration::from_secs(3));
        assert_eq!(settings.currency, "USD");
        assert_eq!(settings.login_retry_delay, Duration::from_millis(300));
    }

    #[test]
    fn test_parse_full_yaml() {
        let yaml = r#"
api-version: v1
kind: ClientConfig
current-context: staging

contexts:
  - name: local
    server: http://localhost:4943

  - name: staging
    server: https://api.lyceum.example
    timeout: 60
    return-base-url: https://lyceum.example

defaults:
  cache:
    max-entries: 512
    stale-after-secs: 300
  payment:
    confirm-timeout-secs: 90
    currency: eur
"#;
        let config = ClientConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.context_names(), vec!["local", "staging"]);

        let settings = config.resolve(None, None).unwrap();
        assert_eq!(settings.context.as_deref(), Some("staging"));
        assert_eq!(settings.server, "https://api.lyceum.example");
        assert_eq!(settings.timeout, Duration::from_secs(60));
        assert_eq!(settings.return_base_url, "https://lyceum.example");
        assert_eq!(settings.cache_max_entries, 512);
        assert_eq!(settings.cache_stale_after, Some(Duration::from_secs(300)));
        assert_eq!(settings.confirm_timeout, Duration::from_secs(90));
        // Unset fields keep their defaults.
        assert_eq!(settings.redirect_delay, Duration::from_millis(3000));
        assert_eq!(settings.currency, "EUR");

        let local = config.resolve(Some("local"), None).unwrap();
        assert_eq!(local.timeout, Duration::from_secs(30));
        assert_eq!(local.return_base_url, "http://localhost:4943");
    }

    #[test]
    fn test_server_override_wins() {
        let mut config = ClientConfig::new();
        config.set_context(Context::new("local", "http://localhost:4943"));
        config.use_context("local").unwrap();

        let settings = config.resolve(None, Some("http://10.0.0.5:8000")).unwrap();
        assert_eq!(settings.server, "http://10.0.0.5:8000");
        assert_eq!(settings.context.as_deref(), Some("local"));
    }

    #[test]
    fn test_unknown_context() {
        let config = ClientConfig::new();
        assert!(matches!(
            config.resolve(Some("nope"), None),
            Err(ConfigError::ContextNotFound(_))
        ));

        let mut config = ClientConfig::new();
        assert!(config.use_context("nope").is_err());
    }

    #[test]
    fn test_empty_currency_is_invalid() {
        let yaml = r#"
defaults:
  payment:
    currency: "  "
"#;
        let config = ClientConfig::from_yaml(yaml).unwrap();
        assert!(matches!(
            config.resolve(None, None),
            Err(ConfigError::Invalid { .. })
        ));
    }

    #[test]
    fn test_remove_current_context() {
        let mut config = ClientConfig::new();
        config.set_context(Context::new("local", "http://localhost:4943"));
        config.set_context(Context::new("local", "http://localhost:9000"));
        assert_eq!(config.contexts.len(), 1);

        config.use_context("local").unwrap();
        assert_eq!(config.remove_context("local").unwrap().server, "http://localhost:9000");
        assert!(config.current_context.is_none());
        assert!(config.remove_context("local").is_none());
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("client.yaml");

        let mut config = ClientConfig::new();
        config.set_context(
            Context::new("staging", "https://api.lyceum.example")
                .with_timeout(45)
                .with_return_base_url("https://lyceum.example"),
        );
        config.use_context("staging").unwrap();
        save_client_config_to(&config, &path).unwrap();

        let loaded = load_client_config_from(Some(&path)).unwrap();
        assert_eq!(loaded.current_context.as_deref(), Some("staging"));
        let ctx = loaded.current().unwrap();
        assert_eq!(ctx.timeout, Some(45));
        assert_eq!(ctx.return_base_url.as_deref(), Some("https://lyceum.example"));
    }

    #[test]
    fn test_missing_file_is_empty_config() {
        let dir = TempDir::new().unwrap();
        let config = load_client_config_from(Some(&dir.path().join("absent.yaml"))).unwrap();
        assert!(config.contexts.is_empty());
    }
}
