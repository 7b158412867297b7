use crate::error::AuditError;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Mutex;
use std::time::SystemTime;
use tiered_server::store::{Snapshot, snapshot};

const AUDIT_KEY_PREFIX: &str = "aud/";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: String,
    /// Milliseconds since the unix epoch.
    pub timestamp: u64,
    pub phone: String,
    pub action: AuditAction,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AuditAction {
    Confirm,
    Edit {
        old_name: String,
        new_name: String,
        old_tshirt: String,
        new_tshirt: String,
    },
}

impl AuditEntry {
    pub fn new(phone: &str, action: AuditAction) -> Self {
        let timestamp = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .map(|it| it.as_millis() as u64)
            .unwrap_or(0);
        Self {
            id: format!("{timestamp:016}_{:08x}", fastrand::u32(..)),
            timestamp,
            phone: phone.to_string(),
            action,
        }
    }
}

/// Append-only log of confirm and edit actions.
pub trait AuditLog: Send + Sync {
    fn append(&self, entry: AuditEntry) -> impl Future<Output = Result<(), AuditError>> + Send;

    fn entries(&self) -> impl Future<Output = Vec<AuditEntry>> + Send;
}

/// Audit log kept in the server store.
#[derive(Debug, Default)]
pub struct StoreAuditLog;

impl AuditLog for StoreAuditLog {
    async fn append(&self, entry: AuditEntry) -> Result<(), AuditError> {
        let key = format!("{AUDIT_KEY_PREFIX}{}", entry.id);
        Snapshot::set_and_wait_for_update(key.as_str(), &entry)
            .await
            .map(|_| ())
            .ok_or_else(|| AuditError::AuditWriteFailure(format!("failed to store {key}")))
    }

    async fn entries(&self) -> Vec<AuditEntry> {
        let snapshot = snapshot();
        let mut entries = snapshot
            .list::<AuditEntry>(AUDIT_KEY_PREFIX)
            .map(|(_, it)| it)
            .collect::<Vec<_>>();
        entries.sort_by(|a, b| a.id.cmp(&b.id));
        entries
    }
}

#[derive(Debug, Default)]
pub struct MemoryAuditLog {
    entries: Mutex<Vec<AuditEntry>>,
    failing: bool,
}

impl MemoryAuditLog {
    /// A log whose writes always fail.
    pub fn failing() -> Self {
        Self {
            entries: Mutex::default(),
            failing: true,
        }
    }
}

impl AuditLog for MemoryAuditLog {
    async fn append(&self, entry: AuditEntry) -> Result<(), AuditError> {
        if self.failing {
            return Err(AuditError::AuditWriteFailure("audit log unavailable".to_string()));
        }
        self.entries
            .lock()
            .unwrap_or_else(|it| it.into_inner())
            .push(entry);
        Ok(())
    }

    async fn entries(&self) -> Vec<AuditEntry> {
        self.entries
            .lock()
            .unwrap_or_else(|it| it.into_inner())
            .clone()
    }
}
