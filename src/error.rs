use serde::Serialize;
use thiserror::Error;

/// Error kinds reported to API clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    NotFound,
    Transport,
    Unavailable,
    Forbidden,
}

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("runner not found")]
    NotFound,

    #[error("registry request timed out")]
    Timeout,

    #[error("registry request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("invalid registry response: {0}")]
    Parse(String),

    #[error("registry rejected the request: {0}")]
    Remote(String),
}

impl RegistryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound => ErrorKind::NotFound,
            _ => ErrorKind::Transport,
        }
    }
}

impl From<reqwest::Error> for RegistryError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_decode() {
            Self::Parse(err.to_string())
        } else {
            Self::Transport(err)
        }
    }
}

#[derive(Error, Debug)]
pub enum WorkflowError {
    #[error("{0}")]
    Validation(&'static str),

    #[error("{0}")]
    Unavailable(&'static str),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

impl WorkflowError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::Unavailable(_) => ErrorKind::Unavailable,
            Self::Registry(err) => err.kind(),
        }
    }
}

#[derive(Error, Debug)]
pub enum AuditError {
    #[error("audit write failed: {0}")]
    AuditWriteFailure(String),
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),

    #[error("invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds() {
        assert_eq!(ErrorKind::NotFound, RegistryError::NotFound.kind());
        assert_eq!(ErrorKind::Transport, RegistryError::Timeout.kind());
        assert_eq!(
            ErrorKind::Transport,
            RegistryError::Remote("Required columns not found".to_string()).kind()
        );
        assert_eq!(
            ErrorKind::NotFound,
            WorkflowError::from(RegistryError::NotFound).kind()
        );
        assert_eq!(
            ErrorKind::Validation,
            WorkflowError::Validation("empty").kind()
        );
    }

    #[test]
    fn test_kind_wire_names() {
        assert_eq!(
            "\"not_found\"",
            serde_json::to_string(&ErrorKind::NotFound).unwrap()
        );
        assert_eq!(
            "\"unavailable\"",
            serde_json::to_string(&ErrorKind::Unavailable).unwrap()
        );
    }
}
