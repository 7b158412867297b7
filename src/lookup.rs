//! Registration lookup by phone number or transaction id.
//!
//! ```text
//! Idle -> Searching -> Found | NotFound | Error -> Idle
//! ```
//!
//! Each search gets a generation number, and a result is only applied when it belongs to
//! the latest search, so a slow response never overwrites a newer one.

use crate::error::{RegistryError, WorkflowError};
use crate::messages::{EMPTY_SEARCH, LOOKUP_FAILED, SupportContact, not_found};
use crate::registry::Registry;
use crate::runner::Runner;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupState {
    Idle,
    Searching { generation: u64 },
    Found(Runner),
    NotFound { message: String },
    Error { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchTicket {
    generation: u64,
    query: String,
}

impl SearchTicket {
    pub fn query(&self) -> &str {
        &self.query
    }
}

#[derive(Debug)]
pub struct LookupWorkflow {
    state: LookupState,
    generation: u64,
    validation_error: Option<&'static str>,
    support: SupportContact,
}

impl LookupWorkflow {
    pub fn new(support: SupportContact) -> Self {
        Self {
            state: LookupState::Idle,
            generation: 0,
            validation_error: None,
            support,
        }
    }

    pub fn state(&self) -> &LookupState {
        &self.state
    }

    /// Message to show under the search box, if any.
    pub fn message(&self) -> Option<&str> {
        match &self.state {
            LookupState::NotFound { message } | LookupState::Error { message } => {
                Some(message.as_str())
            }
            _ => self.validation_error,
        }
    }

    pub fn is_searching(&self) -> bool {
        matches!(self.state, LookupState::Searching { .. })
    }

    /// Starts a search, superseding any search still in flight.
    ///
    /// Blank input is rejected without touching the registry.
    pub fn begin(&mut self, input: &str) -> Result<SearchTicket, WorkflowError> {
        let query = input.trim();
        if query.is_empty() {
            self.validation_error = Some(EMPTY_SEARCH);
            return Err(WorkflowError::Validation(EMPTY_SEARCH));
        }
        self.validation_error = None;
        self.generation += 1;
        self.state = LookupState::Searching {
            generation: self.generation,
        };
        Ok(SearchTicket {
            generation: self.generation,
            query: query.to_string(),
        })
    }

    /// Applies a registry result, returns false when the ticket is stale.
    pub fn complete(
        &mut self,
        ticket: SearchTicket,
        result: Result<Runner, RegistryError>,
    ) -> bool {
        if ticket.generation != self.generation || !self.is_searching() {
            debug!(
                "ignoring stale lookup result for {} (generation {})",
                ticket.query, ticket.generation
            );
            return false;
        }
        self.state = match result {
            Ok(runner) => LookupState::Found(runner),
            Err(RegistryError::NotFound) => LookupState::NotFound {
                message: not_found(&self.support),
            },
            Err(err) => {
                warn!("lookup failed for {}: {err}", ticket.query);
                LookupState::Error {
                    message: LOOKUP_FAILED.to_string(),
                }
            }
        };
        true
    }

    pub async fn submit<R: Registry>(
        &mut self,
        registry: &R,
        input: &str,
    ) -> Result<&LookupState, WorkflowError> {
        let ticket = self.begin(input)?;
        let result = registry.find_runner(ticket.query()).await;
        self.complete(ticket, result);
        Ok(&self.state)
    }

    /// Hands over the found record and goes back to idle.
    pub fn take_found(&mut self) -> Option<Runner> {
        match std::mem::replace(&mut self.state, LookupState::Idle) {
            LookupState::Found(runner) => Some(runner),
            other => {
                self.state = other;
                None
            }
        }
    }

    pub fn reset(&mut self) {
        self.state = LookupState::Idle;
        self.validation_error = None;
    }
}
