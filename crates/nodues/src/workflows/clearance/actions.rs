use chrono::{DateTime, Utc};

use super::domain::{ApplicationId, ClearanceRecord, Department, StageId, StageStatus};
use super::gateway::{ApprovalsGateway, DecisionAction, DecisionRequest, GatewayError};

/// Local precondition failures. These never reach the approvals service and
/// their messages are shown to the caller verbatim.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("remark required")]
    RemarkRequired,
    #[error("missing stage")]
    MissingStage,
}

/// Error raised while validating or submitting a stage decision.
#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("{0}")]
    Submission(String),
}

const GENERIC_SUBMISSION_FAILURE: &str = "decision could not be submitted";

/// Result of a successful submission, carrying everything the optimistic
/// updater needs to patch the in-memory record set.
#[derive(Debug, Clone, PartialEq)]
pub struct AppliedDecision {
    pub application_id: ApplicationId,
    pub stage_id: StageId,
    pub status: StageStatus,
    pub remark: Option<String>,
    pub actioned_by: String,
    pub actioned_at: DateTime<Utc>,
}

/// Validate and submit one departmental decision against a record's active
/// stage.
///
/// Preconditions are checked before any network effect: a rejection needs a
/// non-empty remark, and the record must expose a resolvable stage. On
/// failure nothing is mutated locally; on success exactly one request was
/// issued and the applied status is returned.
pub fn submit_decision<G>(
    gateway: &G,
    record: &ClearanceRecord,
    action: DecisionAction,
    remark: &str,
    department: Department,
    actor: &str,
) -> Result<AppliedDecision, ActionError>
where
    G: ApprovalsGateway + ?Sized,
{
    let remark = remark.trim();
    if action == DecisionAction::Reject && remark.is_empty() {
        return Err(ValidationError::RemarkRequired.into());
    }

    let stage = record
        .active_stage
        .as_ref()
        .ok_or(ValidationError::MissingStage)?;

    let request = DecisionRequest {
        stage_id: stage.stage_id.clone(),
        department,
        action,
        remark: (!remark.is_empty()).then(|| remark.to_string()),
    };

    gateway.submit_decision(&request).map_err(|err| match err {
        GatewayError::Rejected(message) => ActionError::Submission(message),
        GatewayError::Transport(_) => {
            ActionError::Submission(GENERIC_SUBMISSION_FAILURE.to_string())
        }
    })?;

    Ok(AppliedDecision {
        application_id: record.application_id.clone(),
        stage_id: stage.stage_id.clone(),
        status: action.applied_status(),
        remark: request.remark,
        actioned_by: actor.to_string(),
        actioned_at: Utc::now(),
    })
}
