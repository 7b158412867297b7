use crate::error::WorkflowError;
use crate::messages::{EDITING, EMPTY_NAME, LOCKED, NOT_EDITING};
use crate::registry::{FieldChanges, Registry};
use crate::runner::{Confirmed, Runner, TShirtSize};
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Draft {
    pub full_name: String,
    pub tshirt_size: Option<TShirtSize>,
}

/// Review, edit and confirmation of a found registration.
///
/// Confirmation is one way: once confirmed, the record can no longer be edited or
/// confirmed again from here. Writes are last-writer-wins.
#[derive(Debug)]
pub struct ConfirmationWorkflow {
    runner: Runner,
    draft: Option<Draft>,
    locked: bool,
}

impl ConfirmationWorkflow {
    pub fn new(runner: Runner) -> Self {
        let locked = runner.is_confirmed();
        Self {
            runner,
            draft: None,
            locked,
        }
    }

    pub fn runner(&self) -> &Runner {
        &self.runner
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn is_editing(&self) -> bool {
        self.draft.is_some()
    }

    pub fn can_confirm(&self) -> bool {
        !self.locked && self.draft.is_none() && !self.runner.is_confirmed()
    }

    pub fn start_edit(&mut self) -> Result<&mut Draft, WorkflowError> {
        if self.locked {
            return Err(WorkflowError::Unavailable(LOCKED));
        }
        let runner = &self.runner;
        Ok(self.draft.get_or_insert_with(|| Draft {
            full_name: runner.full_name.clone(),
            tshirt_size: runner.tshirt_size(),
        }))
    }

    /// Drops the draft without contacting the registry.
    pub fn cancel_edit(&mut self) {
        self.draft = None;
    }

    fn changes(&self, draft: &Draft) -> FieldChanges {
        let full_name = draft.full_name.trim();
        FieldChanges {
            full_name: if full_name != self.runner.full_name {
                Some(full_name.to_string())
            } else {
                None
            },
            tshirt_size: draft
                .tshirt_size
                .filter(|it| it.as_str() != self.runner.tshirt_size),
        }
    }

    pub async fn save<R: Registry>(&mut self, registry: &R) -> Result<(), WorkflowError> {
        if self.locked {
            return Err(WorkflowError::Unavailable(LOCKED));
        }
        let draft = self
            .draft
            .as_ref()
            .ok_or(WorkflowError::Unavailable(NOT_EDITING))?;
        if draft.full_name.trim().is_empty() {
            return Err(WorkflowError::Validation(EMPTY_NAME));
        }
        let changes = self.changes(draft);
        if !changes.is_empty() {
            registry
                .update_fields(&self.runner.phone, &changes)
                .await?;
            info!("updated {}", self.runner.phone);
            changes.apply(&mut self.runner);
        }
        self.draft = None;
        Ok(())
    }

    pub async fn confirm<R: Registry>(&mut self, registry: &R) -> Result<(), WorkflowError> {
        if self.draft.is_some() {
            return Err(WorkflowError::Unavailable(EDITING));
        }
        if !self.can_confirm() {
            return Err(WorkflowError::Unavailable(LOCKED));
        }
        registry.set_confirmed(&self.runner.phone).await?;
        info!("confirmed {}", self.runner.phone);
        self.runner.confirmed = Confirmed::Yes;
        self.locked = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RegistryError;
    use crate::registry::InMemoryRegistry;
    use crate::registry::testing::Unreachable;
    use crate::runner::DEFAULT_PHONE_PREFIX;

    async fn found(registry: &InMemoryRegistry, query: &str) -> ConfirmationWorkflow {
        ConfirmationWorkflow::new(registry.find_runner(query).await.unwrap())
    }

    #[tokio::test]
    async fn test_confirm_locks() {
        let registry = InMemoryRegistry::demo(DEFAULT_PHONE_PREFIX);
        let mut workflow = found(&registry, "+8801712345678").await;
        assert!(workflow.can_confirm());
        workflow.confirm(&registry).await.unwrap();
        assert_eq!(Confirmed::Yes, workflow.runner().confirmed);
        assert!(workflow.is_locked());
        assert!(matches!(
            workflow.confirm(&registry).await,
            Err(WorkflowError::Unavailable(_))
        ));
        assert!(workflow.start_edit().is_err());
        let runner = registry.find_runner("+8801712345678").await.unwrap();
        assert_eq!(Confirmed::Yes, runner.confirmed);
    }

    #[tokio::test]
    async fn test_already_confirmed_starts_locked() {
        let registry = InMemoryRegistry::demo(DEFAULT_PHONE_PREFIX);
        let workflow = found(&registry, "TX456789123").await;
        assert!(workflow.is_locked());
        assert!(!workflow.can_confirm());
    }

    #[tokio::test]
    async fn test_save_name_only() {
        let registry = InMemoryRegistry::demo(DEFAULT_PHONE_PREFIX);
        let mut workflow = found(&registry, "TX987654321").await;
        workflow.start_edit().unwrap().full_name = " ফাতিমা বেগম ".to_string();
        workflow.save(&registry).await.unwrap();
        assert!(!workflow.is_editing());
        assert_eq!("ফাতিমা বেগম", workflow.runner().full_name);
        let runner = registry.find_runner("TX987654321").await.unwrap();
        assert_eq!("ফাতিমা বেগম", runner.full_name);
        assert_eq!("M", runner.tshirt_size);
    }

    #[tokio::test]
    async fn test_save_size_only() {
        let registry = InMemoryRegistry::demo(DEFAULT_PHONE_PREFIX);
        let mut workflow = found(&registry, "TX789123456").await;
        workflow.start_edit().unwrap().tshirt_size = Some(TShirtSize::MKids);
        workflow.save(&registry).await.unwrap();
        let runner = registry.find_runner("TX789123456").await.unwrap();
        assert_eq!("সারা বেগম", runner.full_name);
        assert_eq!("M Kids'", runner.tshirt_size);
    }

    #[tokio::test]
    async fn test_cancel_discards_draft() {
        let registry = Unreachable::default();
        let runner = Runner {
            full_name: "আহমেদ করিম".to_string(),
            phone: "+8801712345678".to_string(),
            ..Default::default()
        };
        let mut workflow = ConfirmationWorkflow::new(runner.clone());
        workflow.start_edit().unwrap().full_name = "Someone Else".to_string();
        workflow.cancel_edit();
        assert!(!workflow.is_editing());
        assert_eq!(&runner, workflow.runner());
        assert_eq!(0, registry.writes());
    }

    #[tokio::test]
    async fn test_unchanged_save_skips_registry() {
        let registry = Unreachable::default();
        let mut workflow = ConfirmationWorkflow::new(Runner {
            full_name: "আহমেদ করিম".to_string(),
            tshirt_size: "L".to_string(),
            ..Default::default()
        });
        workflow.start_edit().unwrap();
        workflow.save(&registry).await.unwrap();
        assert_eq!(0, registry.writes());
    }

    #[tokio::test]
    async fn test_blank_name_is_rejected() {
        let registry = InMemoryRegistry::demo(DEFAULT_PHONE_PREFIX);
        let mut workflow = found(&registry, "TX123456789").await;
        workflow.start_edit().unwrap().full_name = "  ".to_string();
        assert!(matches!(
            workflow.save(&registry).await,
            Err(WorkflowError::Validation(EMPTY_NAME))
        ));
        assert!(workflow.is_editing());
    }

    #[tokio::test]
    async fn test_failed_writes_keep_local_state() {
        let registry = Unreachable::default();
        let runner = Runner {
            full_name: "আহমেদ করিম".to_string(),
            phone: "+8801712345678".to_string(),
            ..Default::default()
        };
        let mut workflow = ConfirmationWorkflow::new(runner.clone());
        assert!(matches!(
            workflow.confirm(&registry).await,
            Err(WorkflowError::Registry(RegistryError::Timeout))
        ));
        assert_eq!(Confirmed::No, workflow.runner().confirmed);
        assert!(workflow.can_confirm());
        workflow.start_edit().unwrap().full_name = "আহমেদ করিম খান".to_string();
        assert!(workflow.save(&registry).await.is_err());
        assert!(workflow.is_editing());
        assert_eq!(&runner, workflow.runner());
        assert!(matches!(
            workflow.confirm(&registry).await,
            Err(WorkflowError::Unavailable(EDITING))
        ));
        assert_eq!(2, registry.writes());
    }
}
