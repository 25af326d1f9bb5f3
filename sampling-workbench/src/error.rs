// sampling-workbench/src/error.rs
use sampling_protocol::RequestStatus;
use thiserror::Error;

/// Errors surfaced synchronously to callers of the workbench.
///
/// Backend failures are not in here: they settle the request into `error`
/// instead of failing the call.
#[derive(Debug, Error)]
pub enum WorkbenchError {
    #[error("Sampling request not found: {0}")]
    RequestNotFound(String),

    #[error("Replay template not found: {0}")]
    TemplateNotFound(String),

    #[error("Cannot {action} request {id} in state {status}")]
    InvalidTransition {
        id: String,
        status: RequestStatus,
        action: &'static str,
    },

    #[error("Rejection reason must not be empty")]
    EmptyRejectionReason,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("No active LLM provider configured")]
    CapabilityUnavailable,

    #[error("Resolution of request {0} was cancelled")]
    Cancelled(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for workbench operations
pub type WorkbenchResult<T> = Result<T, WorkbenchError>;

impl WorkbenchError {
    pub(crate) fn invalid_transition(id: &str, status: RequestStatus, action: &'static str) -> Self {
        WorkbenchError::InvalidTransition {
            id: id.to_string(),
            status,
            action,
        }
    }
}
