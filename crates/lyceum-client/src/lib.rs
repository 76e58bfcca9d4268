//! Typed remote-call client for the Lyceum course marketplace backend.
//!
//! The backend is an actor exposing named operations. This crate issues
//! those operations over a pluggable [`Transport`] (HTTP by default) and
//! gates every call on the client's [`Readiness`]: until an identity
//! session is established, or the caller explicitly opts into anonymous
//! access, calls fail with [`Error::TransportUnavailable`].
//!
//! # Example
//!
//! ```no_run
//! use lyceum_client::{LyceumClient, Readiness, Result};
//!
//! # async fn example() -> Result<()> {
//! let client = LyceumClient::builder()
//!     .base_url("http://localhost:4943")
//!     .build()?;
//!
//! // Browse the catalog without logging in.
//! client.set_readiness(Readiness::Anonymous);
//!
//! for course in client.courses().all().await? {
//!     println!("{} - {}", course.title, course.price_label());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # API Coverage
//!
//! - **Courses**: catalog, filters, enrollment, course creation
//! - **Reviews**: list, average rating, submit
//! - **Instructors** and **Live classes**
//! - **Profile**: caller profile and role
//! - **Payments**: provider configuration, checkout sessions, confirmation
//! - **Admin**: admin-key verification
//! - **Progress**: video completion and progress

pub mod api;
pub mod client;
pub mod error;
pub mod operation;
pub mod transport;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use client::{ClientBuilder, LyceumClient, Readiness};
pub use error::{Error, Result};
pub use operation::Operation;
pub use transport::{HttpTransport, Transport};

pub use lyceum_types as types;
