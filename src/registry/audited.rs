use crate::audit::{AuditAction, AuditEntry, AuditLog};
use crate::error::RegistryError;
use crate::registry::{FieldChanges, Registry};
use crate::runner::Runner;
use tracing::warn;

/// Appends an audit entry after every successful confirm and edit write.
///
/// Audit failures, including a failed read of the values before an edit, are logged
/// and never prevent the write.
pub struct AuditedRegistry<R, A> {
    inner: R,
    audit: A,
}

impl<R: Registry, A: AuditLog> AuditedRegistry<R, A> {
    pub fn new(inner: R, audit: A) -> Self {
        Self { inner, audit }
    }

    pub fn audit_log(&self) -> &A {
        &self.audit
    }

    async fn record(&self, entry: AuditEntry) {
        if let Err(err) = self.audit.append(entry).await {
            warn!("{err}");
        }
    }
}

impl<R: Registry, A: AuditLog> Registry for AuditedRegistry<R, A> {
    async fn find_runner(&self, query: &str) -> Result<Runner, RegistryError> {
        self.inner.find_runner(query).await
    }

    async fn list_runners(&self) -> Result<Vec<Runner>, RegistryError> {
        self.inner.list_runners().await
    }

    async fn set_confirmed(&self, phone: &str) -> Result<(), RegistryError> {
        self.inner.set_confirmed(phone).await?;
        self.record(AuditEntry::new(phone, AuditAction::Confirm)).await;
        Ok(())
    }

    async fn update_fields(&self, phone: &str, changes: &FieldChanges) -> Result<(), RegistryError> {
        let before = match self.inner.find_runner(phone).await {
            Ok(it) => Some(it),
            Err(err) => {
                warn!("previous values of {phone} unavailable for audit: {err}");
                None
            }
        };
        self.inner.update_fields(phone, changes).await?;
        let Some(before) = before else {
            return Ok(());
        };
        let mut after = before.clone();
        changes.apply(&mut after);
        self.record(AuditEntry::new(
            phone,
            AuditAction::Edit {
                old_name: before.full_name,
                new_name: after.full_name,
                old_tshirt: before.tshirt_size,
                new_tshirt: after.tshirt_size,
            },
        ))
        .await;
        Ok(())
    }
}
