use crate::domain::validation::RejectionReason;
use crate::event_sourcing::store::StoreError;

// ============================================================================
// Batch Business Rule Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    #[error("Rejected by validation: {0}")]
    ValidationRejected(RejectionReason),

    #[error("Batch not found: {0}")]
    NotFound(String),

    #[error("Malformed input: {0}")]
    MalformedInput(String),

    #[error("Batch already collected: {0}")]
    AlreadyCollected(String),

    #[error("Aggregate not initialized")]
    NotInitialized,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Coarse error category, stable for callers and metrics labels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    ValidationRejected,
    NotFound,
    MalformedInput,
    AlreadyCollected,
    NotInitialized,
    Store,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::ValidationRejected => "rejected",
            ErrorKind::NotFound => "not_found",
            ErrorKind::MalformedInput => "malformed",
            ErrorKind::AlreadyCollected => "already_collected",
            ErrorKind::NotInitialized => "not_initialized",
            ErrorKind::Store => "store",
        }
    }
}

impl BatchError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            BatchError::ValidationRejected(_) => ErrorKind::ValidationRejected,
            BatchError::NotFound(_) => ErrorKind::NotFound,
            BatchError::MalformedInput(_) => ErrorKind::MalformedInput,
            BatchError::AlreadyCollected(_) => ErrorKind::AlreadyCollected,
            BatchError::NotInitialized => ErrorKind::NotInitialized,
            BatchError::Store(_) => ErrorKind::Store,
        }
    }

    pub(crate) fn malformed(detail: impl Into<String>) -> Self {
        BatchError::MalformedInput(detail.into())
    }
}
