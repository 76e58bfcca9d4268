//! CLI command handlers.

pub mod admin;
pub mod auth;
pub mod config;
pub mod courses;
pub mod enroll;
pub mod instructors;
pub mod live_classes;
pub mod payment;
pub mod profile;
pub mod review;
pub mod status;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context as _, Result};
use console::{Style, style};
use serde::Serialize;

use lyceum_client::LyceumClient;
use lyceum_config::Settings;
use lyceum_domain::{AppContext, FilePaymentLedger, Level, Notification, Notifier};
use lyceum_session::{FileSessionStore, LocalKeyIdentity, SessionManager};
use lyceum_types::Time;

/// Shared context for all commands.
#[derive(Debug, Clone)]
pub struct Context {
    /// `--server` / `LYCEUM_SERVER_URL`.
    pub server_override: Option<String>,
    /// `--context`, else the config's current context.
    pub context_name: Option<String>,
    /// Output as JSON for scripting.
    pub json_output: bool,
    /// Verbose output enabled.
    pub verbose: bool,
    pub notifier: Arc<ConsoleNotifier>,
}

impl Context {
    /// Resolve the effective settings from the client config and flags.
    pub fn settings(&self) -> Result<Settings> {
        let config = lyceum_config::load_client_config()?;
        Ok(config.resolve(self.context_name.as_deref(), self.server_override.as_deref())?)
    }

    /// Build the application context and restore any stored session.
    pub async fn connect(&self) -> Result<AppContext> {
        let settings = self.settings()?;
        if self.verbose {
            let dim = Style::new().dim();
            eprintln!("{}", dim.apply_to(format!("Server: {}", settings.server)));
        }

        let client = LyceumClient::builder()
            .base_url(settings.server.clone())
            .timeout(settings.timeout)
            .build()?;

        let data_dir =
            lyceum_config::data_dir().context("could not determine the data directory")?;
        let session = SessionManager::new(
            Arc::new(LocalKeyIdentity::new(&data_dir)),
            Arc::new(FileSessionStore::new(&data_dir)),
        )
        .with_retry_delay(settings.login_retry_delay);

        let app = AppContext::from_settings(&settings, client, session, self.notifier.clone())
            .with_payment_ledger(Arc::new(FilePaymentLedger::new(&data_dir)));
        // The followers run until the process exits.
        let _followers = app.start().await?;
        Ok(app)
    }
}

/// Prints notifications to the terminal.
///
/// Errors always go to stderr. Successes are suppressed in JSON mode so
/// stdout stays machine-readable.
#[derive(Debug)]
pub struct ConsoleNotifier {
    json: bool,
    errored: AtomicBool,
}

impl ConsoleNotifier {
    pub fn new(json: bool) -> Self {
        Self {
            json,
            errored: AtomicBool::new(false),
        }
    }

    /// Whether an error notification has been shown.
    pub fn reported_error(&self) -> bool {
        self.errored.load(Ordering::SeqCst)
    }
}

impl Notifier for ConsoleNotifier {
    fn notify(&self, n: Notification) {
        tracing::debug!(level = ?n.level, message = %n.message, "notification");
        match n.level {
            Level::Success if self.json => {}
            Level::Success => {
                let green = Style::new().green();
                println!("{} {}", green.apply_to("✓"), n.message);
            }
            Level::Error => {
                self.errored.store(true, Ordering::SeqCst);
                let red = Style::new().red();
                eprintln!("{} {}", red.apply_to("✗"), n.message);
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Output helpers
// ─────────────────────────────────────────────────────────────────────────────

pub(crate) fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub(crate) fn print_header(title: &str) {
    let dim = Style::new().dim();
    println!("{}", style(title).bold());
    println!("{}", dim.apply_to("─".repeat(50)));
}

/// Shown when a read is inert: the client is not ready yet.
pub(crate) fn not_ready() -> anyhow::Error {
    anyhow::anyhow!("Backend not available yet; try `lyceum auth login`")
}

pub(crate) fn truncate(s: &str, max_len: usize) -> String {
    let s = s.replace('\n', " ");
    if s.chars().count() <= max_len {
        s
    } else {
        let cut: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}

/// Backend nanoseconds as local date and time.
pub(crate) fn format_time(nanos: Time) -> String {
    let secs = nanos.div_euclid(1_000_000_000);
    let sub = nanos.rem_euclid(1_000_000_000) as u32;
    match chrono::DateTime::from_timestamp(secs, sub) {
        Some(t) => t
            .with_timezone(&chrono::Local)
            .format("%Y-%m-%d %H:%M")
            .to_string(),
        None => nanos.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("line one\nline two", 40), "line one line two");
        assert_eq!(truncate("abcdefghijkl", 8), "abcde...");
    }

    #[test]
    fn test_format_time_epoch() {
        // Only the shape is stable across time zones.
        let s = format_time(0);
        assert_eq!(s.len(), "1970-01-01 00:00".len());
    }

    #[test]
    fn test_notifier_tracks_errors() {
        let n = ConsoleNotifier::new(true);
        n.notify(Notification::success("ok"));
        assert!(!n.reported_error());
        n.notify(Notification::error("boom"));
        assert!(n.reported_error());
    }
}
