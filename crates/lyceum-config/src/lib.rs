//! Client configuration for Lyceum.
//!
//! Provides a kubeconfig-style YAML file with:
//! - Named connection contexts (backend server, timeout, payment return URL)
//! - `current-context` for default selection
//! - Defaults for the query cache, payment flow and identity retry
//!
//! [`ClientConfig::resolve`] folds a context over the defaults into the
//! flat [`Settings`] the rest of the workspace consumes.

pub mod client;
pub mod error;
pub mod paths;

pub use client::{
    CacheDefaults, ClientConfig, ClientDefaults, Context, DEFAULT_SERVER, IdentityDefaults,
    PaymentDefaults, Settings, client_config_path, load_client_config, load_client_config_from,
    save_client_config, save_client_config_to,
};
pub use error::{ConfigError, Result};
pub use paths::{data_dir, log_dir, xdg_config_dir};
