//! Domain layer for Lyceum.
//!
//! This crate sits between a front-end (the CLI) and the infrastructure
//! crates, providing:
//!
//! - **Cached reads**: typed catalog, enrollment and profile queries over the
//!   query cache ([`Queries`])
//! - **Writes**: every remote write as a [`Mutation`], with local validation,
//!   a static invalidation map and exactly one notification per outcome
//!   ([`MutationOrchestrator`])
//! - **Payments**: hosted-checkout redirects and idempotent confirmation of
//!   returning payments ([`PaymentFlow`]), guarded across processes by a
//!   [`PaymentLedger`]
//! - **Admin**: console access and key-gated writes ([`AdminGate`])
//!
//! [`AppContext`] wires them to a session manager so that any change of
//! identity purges every cached read.
//!
//! # Example
//!
//! ```ignore
//! use lyceum_domain::{AppContext, TracingNotifier};
//!
//! let ctx = AppContext::from_settings(&settings, client, session, Arc::new(TracingNotifier));
//! ctx.start().await?;
//!
//! let courses = ctx.queries().courses().await?.unwrap_or_default();
//! ```

pub mod admin;
pub mod catalog;
pub mod context;
mod error;
pub mod keys;
pub mod ledger;
pub mod mutation;
pub mod notify;
pub mod payment;
pub mod queries;

pub use admin::{AdminGate, KeyStatus};
pub use catalog::{CatalogFilter, PriceFilter};
pub use context::{AppContext, EnrollOutcome};
pub use error::{DomainError, Result};
pub use ledger::{
    FilePaymentLedger, InMemoryPaymentLedger, LedgerEntry, LedgerState, PaymentLedger,
};
pub use mutation::{
    Mutation, MutationKind, MutationOrchestrator, MutationOutput, MutationRecord, MutationStatus,
};
pub use notify::{ChannelNotifier, Level, MemoryNotifier, Notification, Notifier, TracingNotifier};
pub use payment::{
    CheckoutRedirect, ConfirmOutcome, PaymentConfig, PaymentFlow, PaymentIntent, PaymentReturn,
    PaymentStatus, ReturnKind, classify_return,
};
pub use queries::Queries;
