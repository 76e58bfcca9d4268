//! Identity session management for Lyceum.
//!
//! The [`SessionManager`] owns the single active session of a process. It
//! drives an [`IdentityProvider`] through login and logout, persists the
//! resulting principal through a [`SessionStore`], and publishes status
//! changes so the remote client and query cache can follow along.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use lyceum_session::{FileSessionStore, LocalKeyIdentity, SessionManager};
//!
//! # async fn example() -> lyceum_session::Result<()> {
//! let data_dir = std::path::Path::new("/tmp/lyceum");
//! let manager = SessionManager::new(
//!     Arc::new(LocalKeyIdentity::new(data_dir)),
//!     Arc::new(FileSessionStore::new(data_dir)),
//! );
//!
//! manager.restore().await?;
//! if manager.principal().is_none() {
//!     let principal = manager.login_with_recovery().await?;
//!     println!("logged in as {}", principal.short());
//! }
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod manager;
pub mod provider;
pub mod store;

pub use error::{Result, SessionError};
pub use manager::{DEFAULT_RETRY_DELAY, SessionEvent, SessionManager, SessionStatus};
#[cfg(any(test, feature = "testing"))]
pub use provider::ScriptedIdentity;
pub use provider::{IdentityProvider, LocalKeyIdentity};
pub use store::{FileSessionStore, InMemorySessionStore, SessionStore, StoredSession};
