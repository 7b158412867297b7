mod audited;
mod http;
mod memory;
#[cfg(test)]
pub(crate) mod testing;

pub use audited::AuditedRegistry;
pub use http::HttpRegistry;
pub use memory::InMemoryRegistry;

use crate::error::RegistryError;
use crate::runner::{Runner, TShirtSize};
use serde::Serialize;
use std::future::Future;

/// The external store of registrant records.
pub trait Registry: Send + Sync {
    /// First record whose phone (with or without the country prefix) or transaction id
    /// matches the query.
    fn find_runner(
        &self,
        query: &str,
    ) -> impl Future<Output = Result<Runner, RegistryError>> + Send;

    fn list_runners(&self) -> impl Future<Output = Result<Vec<Runner>, RegistryError>> + Send;

    /// Marks the runner as confirmed; confirming twice is not an error.
    fn set_confirmed(&self, phone: &str) -> impl Future<Output = Result<(), RegistryError>> + Send;

    /// Partial update, fields left as `None` are untouched.
    fn update_fields(
        &self,
        phone: &str,
        changes: &FieldChanges,
    ) -> impl Future<Output = Result<(), RegistryError>> + Send;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct FieldChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tshirt_size: Option<TShirtSize>,
}

impl FieldChanges {
    pub fn is_empty(&self) -> bool {
        self.full_name.is_none() && self.tshirt_size.is_none()
    }

    pub fn apply(&self, runner: &mut Runner) {
        if let Some(ref full_name) = self.full_name {
            runner.full_name = full_name.clone();
        }
        if let Some(tshirt_size) = self.tshirt_size {
            runner.tshirt_size = tshirt_size.as_str().to_string();
        }
    }
}
