//! Persistent record of payment confirmations.
//!
//! Each CLI command runs in its own process, so the guard against confirming
//! one checkout session twice has to outlive the process. The ledger maps a
//! checkout session id to the last known confirmation state.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, Result};

/// Default ledger file name within the data directory.
pub const PAYMENTS_FILE: &str = "payments.json";

/// Confirmation state of one checkout session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerState {
    /// A confirmation call was sent and has not been answered.
    Pending,
    /// The backend confirmed the payment.
    Confirmed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub course_id: String,
    pub state: LedgerState,
    pub updated_at: DateTime<Utc>,
}

impl LedgerEntry {
    pub fn pending(course_id: impl Into<String>) -> Self {
        Self::new(course_id, LedgerState::Pending)
    }

    pub fn confirmed(course_id: impl Into<String>) -> Self {
        Self::new(course_id, LedgerState::Confirmed)
    }

    fn new(course_id: impl Into<String>, state: LedgerState) -> Self {
        Self {
            course_id: course_id.into(),
            state,
            updated_at: Utc::now(),
        }
    }

    /// A pending entry nobody can still be waiting on: whoever sent the
    /// call gave up after `window`.
    pub fn is_abandoned(&self, window: Duration) -> bool {
        let window = TimeDelta::from_std(window).unwrap_or(TimeDelta::MAX);
        self.state == LedgerState::Pending && Utc::now() - self.updated_at > window
    }
}

/// Trait for confirmation ledgers.
#[async_trait]
pub trait PaymentLedger: Send + Sync + std::fmt::Debug {
    /// Look up a checkout session.
    async fn get(&self, session_id: &str) -> Result<Option<LedgerEntry>>;

    /// Insert or replace the entry for a checkout session.
    async fn record(&self, session_id: &str, entry: LedgerEntry) -> Result<()>;

    /// Drop a checkout session. Succeeds when nothing is stored.
    async fn forget(&self, session_id: &str) -> Result<()>;
}

// ─────────────────────────────────────────────────────────────────────────────
// FilePaymentLedger
// ─────────────────────────────────────────────────────────────────────────────

/// File-based ledger, a JSON object keyed by checkout session id.
#[derive(Debug)]
pub struct FilePaymentLedger {
    path: PathBuf,
    /// Serializes read-modify-write cycles within this process.
    write: tokio::sync::Mutex<()>,
}

impl FilePaymentLedger {
    /// Create a ledger keeping its file in `data_dir`.
    pub fn new(data_dir: &Path) -> Self {
        Self::with_path(data_dir.join(PAYMENTS_FILE))
    }

    /// Create with a custom file path.
    pub fn with_path(path: PathBuf) -> Self {
        Self {
            path,
            write: tokio::sync::Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<BTreeMap<String, LedgerEntry>> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(self.io_error(e)),
        };

        serde_json::from_str(&content).map_err(|e| {
            DomainError::Ledger(format!(
                "Failed to parse payment ledger {}: {}",
                self.path.display(),
                e
            ))
        })
    }

    async fn save(&self, entries: &BTreeMap<String, LedgerEntry>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| self.io_error(e))?;
        }

        let json = serde_json::to_string_pretty(entries)
            .map_err(|e| DomainError::Ledger(e.to_string()))?;
        tokio::fs::write(&self.path, json)
            .await
            .map_err(|e| self.io_error(e))?;

        tracing::debug!("Payment ledger saved to {}", self.path.display());
        Ok(())
    }

    fn io_error(&self, e: std::io::Error) -> DomainError {
        DomainError::Ledger(format!("{}: {}", self.path.display(), e))
    }
}

#[async_trait]
impl PaymentLedger for FilePaymentLedger {
    async fn get(&self, session_id: &str) -> Result<Option<LedgerEntry>> {
        Ok(self.load().await?.remove(session_id))
    }

    async fn record(&self, session_id: &str, entry: LedgerEntry) -> Result<()> {
        let _guard = self.write.lock().await;
        let mut entries = self.load().await?;
        entries.insert(session_id.to_string(), entry);
        self.save(&entries).await
    }

    async fn forget(&self, session_id: &str) -> Result<()> {
        let _guard = self.write.lock().await;
        let mut entries = self.load().await?;
        if entries.remove(session_id).is_some() {
            self.save(&entries).await?;
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// InMemoryPaymentLedger
// ─────────────────────────────────────────────────────────────────────────────

/// In-memory ledger: the guard lives as long as the process.
#[derive(Debug, Default)]
pub struct InMemoryPaymentLedger {
    entries: Mutex<HashMap<String, LedgerEntry>>,
}

impl InMemoryPaymentLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PaymentLedger for InMemoryPaymentLedger {
    async fn get(&self, session_id: &str) -> Result<Option<LedgerEntry>> {
        Ok(self.entries.lock().get(session_id).cloned())
    }

    async fn record(&self, session_id: &str, entry: LedgerEntry) -> Result<()> {
        self.entries.lock().insert(session_id.to_string(), entry);
        Ok(())
    }

    async fn forget(&self, session_id: &str) -> Result<()> {
        self.entries.lock().remove(session_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_file_ledger_persists() {
        let dir = TempDir::new().unwrap();
        let ledger = FilePaymentLedger::new(dir.path());

        assert_eq!(ledger.get("cs_1").await.unwrap(), None);
        ledger.record("cs_1", LedgerEntry::pending("c1")).await.unwrap();
        ledger.record("cs_2", LedgerEntry::confirmed("c2")).await.unwrap();

        let reopened = FilePaymentLedger::new(dir.path());
        assert_eq!(
            reopened.get("cs_1").await.unwrap().map(|e| e.state),
            Some(LedgerState::Pending)
        );
        let confirmed = reopened.get("cs_2").await.unwrap().unwrap();
        assert_eq!(confirmed.course_id, "c2");
        assert_eq!(confirmed.state, LedgerState::Confirmed);

        reopened.forget("cs_1").await.unwrap();
        assert_eq!(ledger.get("cs_1").await.unwrap(), None);
        // Forgetting twice is fine.
        reopened.forget("cs_1").await.unwrap();
        assert!(ledger.get("cs_2").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_file_ledger_rejects_garbage() {
        let dir = TempDir::new().unwrap();
        let ledger = FilePaymentLedger::new(dir.path());
        std::fs::write(ledger.path(), "not json").unwrap();

        assert!(matches!(
            ledger.get("cs_1").await.unwrap_err(),
            DomainError::Ledger(_)
        ));
    }

    #[test]
    fn test_abandoned_pending_entries() {
        let mut entry = LedgerEntry::pending("c1");
        assert!(!entry.is_abandoned(Duration::from_secs(120)));

        entry.updated_at = Utc::now() - TimeDelta::seconds(300);
        assert!(entry.is_abandoned(Duration::from_secs(120)));

        entry.state = LedgerState::Confirmed;
        assert!(!entry.is_abandoned(Duration::from_secs(120)));
    }
}
