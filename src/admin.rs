use crate::error::RegistryError;
use crate::registry::Registry;
use crate::runner::{Category, Runner};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use tiered_server::session::SessionState;
use tracing::info;

/// An authenticated operator, passed explicitly to everything that needs one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdminSession {
    pub operator_id: String,
    pub operator_name: String,
}

impl AdminSession {
    pub fn new(operator_id: impl Into<String>, operator_name: impl Into<String>) -> Self {
        Self {
            operator_id: operator_id.into(),
            operator_name: operator_name.into(),
        }
    }

    /// Only valid sessions of admin users qualify.
    pub fn from_session_state(state: SessionState) -> Option<Self> {
        match state {
            SessionState::Valid { user, .. } if user.admin => Some(Self::new(
                user.id.to_string(),
                format!("{} {}", user.first_name, user.last_name),
            )),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum AdminFilter {
    #[default]
    All,
    Confirmed,
    Pending,
    HalfMarathon,
    LongRun,
    Student,
    Kids,
}

impl AdminFilter {
    pub fn category(&self) -> Option<Category> {
        match self {
            Self::HalfMarathon => Some(Category::HalfMarathon),
            Self::LongRun => Some(Category::LongRun),
            Self::Student => Some(Category::Student),
            Self::Kids => Some(Category::KidsFunRun),
            _ => None,
        }
    }

    pub fn accepts(&self, runner: &Runner) -> bool {
        match self {
            Self::All => true,
            Self::Confirmed => runner.is_confirmed(),
            Self::Pending => !runner.is_confirmed(),
            _ => self
                .category()
                .is_some_and(|it| runner.category == it.as_str()),
        }
    }
}

impl TryFrom<&str> for AdminFilter {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "" | "all" => Ok(Self::All),
            "confirmed" => Ok(Self::Confirmed),
            "pending" => Ok(Self::Pending),
            "half-marathon" => Ok(Self::HalfMarathon),
            "long-run" => Ok(Self::LongRun),
            "student" => Ok(Self::Student),
            "kids" => Ok(Self::Kids),
            other => Category::try_from(other)
                .map(|category| match category {
                    Category::HalfMarathon => Self::HalfMarathon,
                    Category::LongRun => Self::LongRun,
                    Category::Student => Self::Student,
                    Category::KidsFunRun => Self::Kids,
                })
                .map_err(|_| format!("unknown filter: {other}")),
        }
    }
}

fn matches_text(runner: &Runner, needle: &str) -> bool {
    runner.full_name.to_lowercase().contains(needle)
        || runner.email.to_lowercase().contains(needle)
        || runner.phone.to_lowercase().contains(needle)
        || runner.transaction_id.to_lowercase().contains(needle)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AdminStats {
    pub total: usize,
    pub confirmed: usize,
    pub pending: usize,
}

/// The registrant list as loaded at the start of an admin session.
#[derive(Debug)]
pub struct AdminView {
    session: AdminSession,
    runners: Vec<Runner>,
}

impl AdminView {
    pub async fn load<R: Registry>(
        session: AdminSession,
        registry: &R,
    ) -> Result<Self, RegistryError> {
        let runners = registry.list_runners().await?;
        info!(
            "loaded {} runners for {}",
            runners.len(),
            session.operator_name
        );
        Ok(Self { session, runners })
    }

    pub fn session(&self) -> &AdminSession {
        &self.session
    }

    pub fn runners(&self) -> &[Runner] {
        &self.runners
    }

    pub fn stats(&self) -> AdminStats {
        let confirmed = self.runners.iter().filter(|it| it.is_confirmed()).count();
        AdminStats {
            total: self.runners.len(),
            confirmed,
            pending: self.runners.len() - confirmed,
        }
    }

    /// Text search (case-insensitive, over name, email, phone and transaction id)
    /// intersected with the category/status filter.
    pub fn filtered(&self, search: &str, filter: AdminFilter) -> Vec<&Runner> {
        let needle = search.trim().to_lowercase();
        self.runners
            .iter()
            .filter(|it| needle.is_empty() || matches_text(it, &needle))
            .filter(|it| filter.accepts(it))
            .collect()
    }
}

/// Loaded views by operator id, from login until logout.
#[derive(Debug, Default)]
pub struct AdminSessions {
    views: Mutex<BTreeMap<String, Arc<AdminView>>>,
}

impl AdminSessions {
    /// Loads (or reloads) the registrant list for this operator.
    pub async fn login<R: Registry>(
        &self,
        session: AdminSession,
        registry: &R,
    ) -> Result<Arc<AdminView>, RegistryError> {
        let operator_id = session.operator_id.clone();
        let view = Arc::new(AdminView::load(session, registry).await?);
        self.views
            .lock()
            .unwrap_or_else(|it| it.into_inner())
            .insert(operator_id, view.clone());
        Ok(view)
    }

    pub fn logout(&self, session: &AdminSession) -> bool {
        let removed = self
            .views
            .lock()
            .unwrap_or_else(|it| it.into_inner())
            .remove(&session.operator_id)
            .is_some();
        if removed {
            info!("admin session closed for {}", session.operator_name);
        }
        removed
    }

    pub fn view(&self, session: &AdminSession) -> Option<Arc<AdminView>> {
        self.views
            .lock()
            .unwrap_or_else(|it| it.into_inner())
            .get(&session.operator_id)
            .cloned()
    }

    /// The view loaded at login, loading it now if this operator has none yet.
    pub async fn view_or_login<R: Registry>(
        &self,
        session: AdminSession,
        registry: &R,
    ) -> Result<Arc<AdminView>, RegistryError> {
        match self.view(&session) {
            Some(view) => Ok(view),
            None => self.login(session, registry).await,
        }
    }
}
