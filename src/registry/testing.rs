use crate::error::RegistryError;
use crate::registry::{FieldChanges, InMemoryRegistry, Registry};
use crate::runner::Runner;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Counts writes and fails every call with a timeout.
#[derive(Debug, Default)]
pub(crate) struct Unreachable {
    writes: AtomicUsize,
}

impl Unreachable {
    pub(crate) fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

impl Registry for Unreachable {
    async fn find_runner(&self, _query: &str) -> Result<Runner, RegistryError> {
        Err(RegistryError::Timeout)
    }

    async fn list_runners(&self) -> Result<Vec<Runner>, RegistryError> {
        Err(RegistryError::Timeout)
    }

    async fn set_confirmed(&self, _phone: &str) -> Result<(), RegistryError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        Err(RegistryError::Timeout)
    }

    async fn update_fields(
        &self,
        _phone: &str,
        _changes: &FieldChanges,
    ) -> Result<(), RegistryError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        Err(RegistryError::Timeout)
    }
}

/// Reads time out, writes go through to the wrapped registry.
#[derive(Debug, Default)]
pub(crate) struct ReadTimeouts(pub(crate) InMemoryRegistry);

impl Registry for ReadTimeouts {
    async fn find_runner(&self, _query: &str) -> Result<Runner, RegistryError> {
        Err(RegistryError::Timeout)
    }

    async fn list_runners(&self) -> Result<Vec<Runner>, RegistryError> {
        Err(RegistryError::Timeout)
    }

    async fn set_confirmed(&self, phone: &str) -> Result<(), RegistryError> {
        self.0.set_confirmed(phone).await
    }

    async fn update_fields(&self, phone: &str, changes: &FieldChanges) -> Result<(), RegistryError> {
        self.0.update_fields(phone, changes).await
    }
}
