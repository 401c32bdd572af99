use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;

use super::actions::ActionError;
use super::audit::export_csv;
use super::domain::{ApplicationId, Department};
use super::gateway::{ApprovalsGateway, DecisionAction};
use super::reconcile::FeedKind;
use super::service::{ClearanceService, ClearanceServiceError};
use super::status::StatusFilter;

/// Router builder exposing the clearance endpoints for one session's
/// service instance.
pub fn clearance_router<G>(service: Arc<ClearanceService<G>>) -> Router
where
    G: ApprovalsGateway + 'static,
{
    Router::new()
        .route(
            "/api/v1/clearance/applications/search",
            post(search_handler::<G>),
        )
        .route(
            "/api/v1/clearance/applications/:application_id/decision",
            post(decision_handler::<G>),
        )
        .route("/api/v1/clearance/history", get(history_handler::<G>))
        .route(
            "/api/v1/clearance/history/export",
            get(history_export_handler::<G>),
        )
        .with_state(service)
}

#[derive(Debug, Deserialize)]
pub(crate) struct SearchRequest {
    #[serde(default)]
    pub(crate) query: String,
    #[serde(default)]
    pub(crate) status: Option<String>,
    #[serde(default = "default_refresh")]
    pub(crate) refresh: bool,
}

fn default_refresh() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub(crate) struct DecisionBody {
    pub(crate) action: DecisionAction,
    #[serde(default)]
    pub(crate) remark: String,
}

pub(crate) async fn search_handler<G>(
    State(service): State<Arc<ClearanceService<G>>>,
    axum::Json(request): axum::Json<SearchRequest>,
) -> Response
where
    G: ApprovalsGateway + 'static,
{
    let degraded: Vec<&'static str> = if request.refresh {
        match service.refresh() {
            Ok(summary) => summary.degraded.iter().copied().map(FeedKind::label).collect(),
            Err(error) => return error_response(error),
        }
    } else {
        Vec::new()
    };

    let filter = request
        .status
        .as_deref()
        .map(StatusFilter::parse)
        .unwrap_or(StatusFilter::All);
    let include_overall = service.scope().department() == Some(Department::Admin);
    let records: Vec<_> = service
        .records(&request.query, &filter)
        .iter()
        .map(|record| record.view(include_overall))
        .collect();

    let payload = json!({
        "scope": service.scope().name(),
        "total": records.len(),
        "degraded": degraded,
        "records": records,
    });
    (StatusCode::OK, axum::Json(payload)).into_response()
}

pub(crate) async fn decision_handler<G>(
    State(service): State<Arc<ClearanceService<G>>>,
    Path(application_id): Path<String>,
    axum::Json(body): axum::Json<DecisionBody>,
) -> Response
where
    G: ApprovalsGateway + 'static,
{
    let id = ApplicationId(application_id);
    match service.decide(&id, body.action, &body.remark) {
        Ok(applied) => {
            let payload = json!({
                "application_id": applied.application_id.0,
                "stage_id": applied.stage_id.0,
                "status": applied.status.label(),
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn history_handler<G>(
    State(service): State<Arc<ClearanceService<G>>>,
) -> Response
where
    G: ApprovalsGateway + 'static,
{
    match service.history() {
        Ok(records) => (StatusCode::OK, axum::Json(records)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn history_export_handler<G>(
    State(service): State<Arc<ClearanceService<G>>>,
) -> Response
where
    G: ApprovalsGateway + 'static,
{
    let records = match service.history() {
        Ok(records) => records,
        Err(error) => return error_response(error),
    };

    let mut buffer = Vec::new();
    if let Err(error) = export_csv(&records, &mut buffer) {
        let payload = json!({ "error": error.to_string() });
        return (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response();
    }

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/csv")],
        buffer,
    )
        .into_response()
}

fn error_response(error: ClearanceServiceError) -> Response {
    let status = match &error {
        ClearanceServiceError::Session(_) => StatusCode::UNAUTHORIZED,
        ClearanceServiceError::Action(ActionError::Validation(_)) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        ClearanceServiceError::Action(ActionError::Submission(_)) => StatusCode::BAD_GATEWAY,
        ClearanceServiceError::Gateway(_) | ClearanceServiceError::History(_) => {
            StatusCode::BAD_GATEWAY
        }
        ClearanceServiceError::UnknownApplication => StatusCode::NOT_FOUND,
        ClearanceServiceError::ScopeNotActionable => StatusCode::FORBIDDEN,
    };

    let payload = json!({ "error": error.to_string() });
    (status, axum::Json(payload)).into_response()
}
