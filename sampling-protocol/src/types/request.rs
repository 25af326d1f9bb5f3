// sampling-protocol/src/types/request.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::capability::CostEstimate;
use super::error::ProviderError;
use super::sampling::{CreateMessageParams, CreateMessageResult};

/// Lifecycle state of a sampling request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
    Completed,
    Error,
}

impl RequestStatus {
    /// No transition may leave a terminal state
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            RequestStatus::Rejected | RequestStatus::Completed | RequestStatus::Error
        )
    }
}

impl std::fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Approved => "approved",
            RequestStatus::Rejected => "rejected",
            RequestStatus::Completed => "completed",
            RequestStatus::Error => "error",
        };
        f.write_str(label)
    }
}

/// A server-originated request for an LLM completion, with its review state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SamplingRequest {
    pub id: String,
    pub server_id: String,
    pub server_name: String,
    pub created_at: DateTime<Utc>,

    /// Opaque link into the protocol message log
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocol_message_id: Option<String>,

    /// Conversation and generation parameters; replaced when approved with edits
    pub params: CreateMessageParams,

    pub status: RequestStatus,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<CreateMessageResult>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ProviderError>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,

    /// Cost estimate computed from the outbound messages
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimate: Option<CostEstimate>,

    /// Wall-clock milliseconds between approval and resolution
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,

    /// Recorded monetary cost of the resolution
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub approved_at: Option<DateTime<Utc>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<DateTime<Utc>>,
}

impl SamplingRequest {
    /// A fresh pending request
    pub fn new(
        id: String,
        server_id: String,
        server_name: String,
        params: CreateMessageParams,
    ) -> Self {
        Self {
            id,
            server_id,
            server_name,
            created_at: Utc::now(),
            protocol_message_id: None,
            params,
            status: RequestStatus::Pending,
            response: None,
            error: None,
            rejection_reason: None,
            estimate: None,
            duration_ms: None,
            cost: None,
            approved_at: None,
            resolved_at: None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == RequestStatus::Pending
    }
}

/// A captured response that can be replayed onto new pending requests
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayTemplate {
    pub id: String,
    pub name: String,
    pub response: CreateMessageResult,
    pub source_request_id: String,
    pub use_count: u64,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_used: Option<DateTime<Utc>>,
}
