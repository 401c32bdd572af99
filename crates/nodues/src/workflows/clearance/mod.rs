//! Multi-stage no-dues clearance workflow.
//!
//! A student's application is cleared department by department. This module
//! owns the rules around that: classifying free-form status labels,
//! reconciling the two approvals-service feeds into one record set,
//! validating and submitting departmental decisions, patching the set
//! optimistically after a decision, resolving role scopes, and narrowing the
//! set for display.

pub mod actions;
pub mod audit;
pub mod domain;
pub mod gateway;
pub mod reconcile;
pub mod roster;
pub mod router;
pub mod routing;
pub mod service;
pub mod status;

pub use actions::{submit_decision, ActionError, AppliedDecision, ValidationError};
pub use audit::{export_csv, parse_history};
pub use domain::{
    aggregate_status, ActionRecord, ApplicationId, ClearanceRecord, ClearanceRecordView,
    ClearanceStage, Department, StageId, StageStatus, StageView, StudentProfile,
};
pub use gateway::{ApprovalsGateway, DecisionAction, DecisionRequest, GatewayError};
pub use reconcile::{reconcile_feeds, FeedKind, Reconciliation};
pub use roster::ClearanceRoster;
pub use router::clearance_router;
pub use routing::{resolve_role, RouteScope};
pub use service::{ClearanceService, ClearanceServiceError, RefreshSummary};
pub use status::{classify, StatusCategory, StatusFilter};
