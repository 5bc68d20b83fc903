use thiserror::Error;

use crate::backend::BackendError;
use crate::notify::Severity;

/// Failures of a user-triggered action. All of them end at the request
/// boundary as an error envelope plus a notification.
#[derive(Debug, Clone, Error)]
pub enum CoreError {
    /// Malformed request parameters; a caller bug, not a user mistake.
    #[error("{0}")]
    BadParams(String),
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Authorization(String),
    #[error("invalid credentials")]
    Authentication,
    #[error("{what} not found")]
    NotFound { what: &'static str, id: String },
    #[error("select a workspace first")]
    NoWorkspace,
    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl CoreError {
    pub fn validation(message: impl Into<String>) -> Self {
        CoreError::Validation(message.into())
    }

    pub fn bad_params(message: impl Into<String>) -> Self {
        CoreError::BadParams(message.into())
    }

    pub fn forbidden() -> Self {
        CoreError::Authorization("access denied: administrator role required".into())
    }

    pub fn not_found(what: &'static str, id: impl Into<String>) -> Self {
        CoreError::NotFound {
            what,
            id: id.into(),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            CoreError::BadParams(_) => "bad_params",
            CoreError::Validation(_) => "validation_failed",
            CoreError::Authorization(_) => "forbidden",
            CoreError::Authentication => "auth_failed",
            CoreError::NotFound { .. } => "not_found",
            CoreError::NoWorkspace => "no_workspace",
            CoreError::Backend(_) => "backend_failed",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            CoreError::BadParams(_) | CoreError::Validation(_) => Severity::Warning,
            _ => Severity::Error,
        }
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
