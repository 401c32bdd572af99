use std::sync::{Arc, Mutex};

use tracing::{info, warn};

use crate::session::{SessionContext, SessionError};

use super::actions::{submit_decision, ActionError, AppliedDecision};
use super::audit::parse_history;
use super::domain::{ActionRecord, ApplicationId, ClearanceRecord};
use super::gateway::{ApprovalsGateway, DecisionAction, GatewayError};
use super::reconcile::{reconcile_feeds, FeedKind};
use super::roster::ClearanceRoster;
use super::routing::{resolve_role, RouteScope};
use super::status::StatusFilter;

/// Facade composing the session context, the approvals gateway, and the
/// in-memory roster for one department actor's view.
pub struct ClearanceService<G> {
    gateway: Arc<G>,
    session: Arc<SessionContext>,
    scope: RouteScope,
    roster: Mutex<ClearanceRoster>,
}

/// Result of one reconciliation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshSummary {
    pub total: usize,
    pub degraded: Vec<FeedKind>,
}

impl<G> ClearanceService<G>
where
    G: ApprovalsGateway + 'static,
{
    pub fn new(gateway: Arc<G>, session: Arc<SessionContext>) -> Self {
        let scope = resolve_role(&session.actor().role);
        Self {
            gateway,
            session,
            scope,
            roster: Mutex::new(ClearanceRoster::new()),
        }
    }

    pub fn scope(&self) -> &RouteScope {
        &self.scope
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    /// Re-run reconciliation and replace the in-memory set wholesale. A feed
    /// that cannot be fetched degrades to an empty collection the same way a
    /// feed that cannot be parsed does.
    pub fn refresh(&self) -> Result<RefreshSummary, ClearanceServiceError> {
        self.session.ensure_active()?;

        let mut degraded = Vec::new();
        let enriched = match self.gateway.fetch_enriched(&self.scope) {
            Ok(body) => body,
            Err(err) => {
                warn!(%err, feed = FeedKind::Enriched.label(), "feed unavailable");
                degraded.push(FeedKind::Enriched);
                "[]".to_string()
            }
        };
        let full = match self.gateway.fetch_full(&self.scope) {
            Ok(body) => body,
            Err(err) => {
                warn!(%err, feed = FeedKind::Full.label(), "feed unavailable");
                degraded.push(FeedKind::Full);
                "[]".to_string()
            }
        };

        let mut outcome = reconcile_feeds(&enriched, &full, self.scope.department());
        degraded.append(&mut outcome.degraded);

        let total = outcome.records.len();
        self.roster
            .lock()
            .expect("roster mutex poisoned")
            .replace_all(outcome.records);

        info!(
            scope = self.scope.name(),
            total,
            degraded = degraded.len(),
            "clearance roster refreshed"
        );

        Ok(RefreshSummary { total, degraded })
    }

    /// Current reconciled set, narrowed by query and status filter.
    pub fn records(&self, query: &str, filter: &StatusFilter) -> Vec<ClearanceRecord> {
        self.roster
            .lock()
            .expect("roster mutex poisoned")
            .filter(query, filter)
    }

    pub fn find(&self, application_id: &ApplicationId) -> Option<ClearanceRecord> {
        self.roster
            .lock()
            .expect("roster mutex poisoned")
            .find(application_id)
            .cloned()
    }

    /// Validate and submit a decision for the given application, then patch
    /// the roster optimistically. The caller must await this result before
    /// reflecting any status change; a failed submission leaves the
    /// displayed status untouched.
    pub fn decide(
        &self,
        application_id: &ApplicationId,
        action: DecisionAction,
        remark: &str,
    ) -> Result<AppliedDecision, ClearanceServiceError> {
        self.session.ensure_active()?;

        let department = self
            .scope
            .department()
            .ok_or(ClearanceServiceError::ScopeNotActionable)?;
        let record = self
            .find(application_id)
            .ok_or(ClearanceServiceError::UnknownApplication)?;

        let applied = submit_decision(
            self.gateway.as_ref(),
            &record,
            action,
            remark,
            department,
            &self.session.actor().name,
        )?;

        self.roster
            .lock()
            .expect("roster mutex poisoned")
            .apply_decision(&applied);

        Ok(applied)
    }

    /// Chronological audit trail from the approvals service.
    pub fn history(&self) -> Result<Vec<ActionRecord>, ClearanceServiceError> {
        self.session.ensure_active()?;
        let body = self.gateway.fetch_action_history()?;
        parse_history(&body).map_err(|err| ClearanceServiceError::History(err.to_string()))
    }
}

/// Error raised by the clearance service facade.
#[derive(Debug, thiserror::Error)]
pub enum ClearanceServiceError {
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Action(#[from] ActionError),
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    #[error("application not found in the current roster")]
    UnknownApplication,
    #[error("scope cannot act on clearance stages")]
    ScopeNotActionable,
    #[error("action history unreadable: {0}")]
    History(String),
}
