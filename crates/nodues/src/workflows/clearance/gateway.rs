use serde::{Deserialize, Serialize};

use super::domain::{Department, StageId, StageStatus};
use super::routing::RouteScope;

/// Departmental decision verb accepted by the approvals service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionAction {
    Approve,
    Reject,
}

impl DecisionAction {
    pub const fn verb(self) -> &'static str {
        match self {
            Self::Approve => "approve",
            Self::Reject => "reject",
        }
    }

    /// Stage status the approvals service applies on success.
    pub const fn applied_status(self) -> StageStatus {
        match self {
            Self::Approve => StageStatus::Approved,
            Self::Reject => StageStatus::Rejected,
        }
    }
}

/// Wire payload for one stage decision. Exactly one request is issued per
/// decision, scoped to the stage and carrying the caller's department.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionRequest {
    pub stage_id: StageId,
    pub department: Department,
    pub action: DecisionAction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remark: Option<String>,
}

/// Abstraction over the external approvals service so the workflow core can
/// be exercised against in-memory doubles. Feed fetchers return raw bodies;
/// parse failures are the reconciler's concern, not the gateway's.
pub trait ApprovalsGateway: Send + Sync {
    fn fetch_enriched(&self, scope: &RouteScope) -> Result<String, GatewayError>;
    fn fetch_full(&self, scope: &RouteScope) -> Result<String, GatewayError>;
    fn submit_decision(&self, request: &DecisionRequest) -> Result<(), GatewayError>;
    fn fetch_action_history(&self) -> Result<String, GatewayError>;
}

/// Error enumeration for approvals-service failures. `Rejected` carries the
/// server-provided message; `Transport` means the request never completed
/// and is the only case a caller may retry.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("approvals service unreachable: {0}")]
    Transport(String),
    #[error("{0}")]
    Rejected(String),
}
