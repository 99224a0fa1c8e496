use thiserror::Error;

/// Errors surfaced by the operations layer to its caller.
///
/// `Dependency` keeps the underlying cause for logging, but its user-facing
/// message never includes it.
#[derive(Debug, Error)]
pub(crate) enum ServiceError {
    #[error("{field}: {message}")]
    Validation {
        field: &'static str,
        message: String,
    },
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },
    #[error("Failed to {action}")]
    Dependency {
        action: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

pub(crate) type ServiceResult<T> = std::result::Result<T, ServiceError>;

impl ServiceError {
    pub(crate) fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    /// HTTP-equivalent status class.
    pub(crate) fn status(&self) -> u16 {
        match self {
            Self::Validation { .. } => 400,
            Self::NotFound { .. } => 404,
            Self::Dependency { .. } => 500,
        }
    }

    /// Message safe to show a caller. Display already omits the source chain.
    pub(crate) fn user_message(&self) -> String {
        self.to_string()
    }
}

/// Wrap a storage failure, logging the full cause chain before it is hidden.
pub(crate) fn dependency(action: &'static str) -> impl FnOnce(anyhow::Error) -> ServiceError {
    move |source| {
        tracing::error!(action, error = ?source, "datastore operation failed");
        ServiceError::Dependency { action, source }
    }
}
