use gameshelf_catalog::CatalogError;
use gameshelf_core::ValidationError;
use gameshelf_db::OperationError;
use thiserror::Error;

/// Errors surfaced by [`crate::LibraryService`]. Each variant maps to one
/// class of response at the HTTP boundary.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// One or more input fields failed validation. Nothing was written.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    /// Bad credentials or an inactive account.
    #[error("{0}")]
    Unauthorized(String),

    /// The catalog provider failed or timed out. Safe to retry.
    #[error("{0}")]
    UpstreamUnavailable(String),

    /// Unexpected failure. The message is for logs, not callers.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::UpstreamUnavailable(_))
    }
}

/// "library entry" -> "Library entry not found"
fn not_found_message(entity_type: &str) -> String {
    let mut chars = entity_type.chars();
    match chars.next() {
        Some(first) => format!("{}{} not found", first.to_uppercase(), chars.as_str()),
        None => "Not found".to_string(),
    }
}

impl From<OperationError> for ServiceError {
    fn from(err: OperationError) -> Self {
        match err {
            OperationError::NotFound { entity_type, .. } => {
                Self::NotFound(not_found_message(&entity_type))
            }
            OperationError::Conflict { reason, .. } => Self::Conflict(reason),
            OperationError::Validation(v) => Self::Validation(v),
            other => {
                log::error!("Store operation failed: {}", other);
                Self::Internal(other.to_string())
            }
        }
    }
}

impl From<CatalogError> for ServiceError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::NotFound(id) => {
                log::debug!("Catalog has no game {}", id);
                Self::NotFound("Game not found".to_string())
            }
            CatalogError::Config(msg) => {
                log::error!("Catalog misconfigured: {}", msg);
                Self::Internal(msg)
            }
            other => {
                log::warn!("Catalog request failed: {}", other);
                Self::UpstreamUnavailable(
                    "Game catalog is temporarily unavailable, please try again".to_string(),
                )
            }
        }
    }
}

impl From<tokio::task::JoinError> for ServiceError {
    fn from(err: tokio::task::JoinError) -> Self {
        log::error!("Blocking task failed: {}", err);
        Self::Internal(err.to_string())
    }
}

#[cfg(test)]
#[path = "tests/error_tests.rs"]
mod tests;
