use chrono::Utc;
use metrics_exporter_prometheus::PrometheusHandle;
use nodues::workflows::clearance::{
    aggregate_status, ApprovalsGateway, ClearanceStage, Department, DecisionRequest, GatewayError,
    RouteScope, StageId, StageStatus,
};
use serde_json::{json, Value};
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

struct SeedApplication {
    id: String,
    name: String,
    roll_number: String,
    enrollment_number: String,
    course: String,
    email: String,
    mobile: String,
    status_label: String,
    submitted_at: String,
    stages: Vec<ClearanceStage>,
}

impl SeedApplication {
    fn enriched_row(&self) -> Value {
        json!({
            "application_id": self.id,
            "name": self.name,
            "roll_number": self.roll_number,
            "enrollment_number": self.enrollment_number,
            "course": self.course,
            "email": self.email,
            "mobile": self.mobile,
            "status": self.status_label,
            "submitted_at": self.submitted_at,
        })
    }

    fn full_row(&self) -> Value {
        let stages: Vec<Value> = self
            .stages
            .iter()
            .map(|stage| {
                json!({
                    "stage_id": stage.stage_id.0,
                    "department": stage.department.code(),
                    "status": stage.status.label(),
                    "remark": stage.remark,
                    "actioned_by": stage.actioned_by,
                    "actioned_at": stage.actioned_at.map(|at| at.to_rfc3339()),
                })
            })
            .collect();

        json!({
            "application_id": self.id,
            "name": self.name,
            "roll_number": self.roll_number,
            "enrollment_number": self.enrollment_number,
            "course": self.course,
            "stages": stages,
        })
    }
}

/// Stand-in for the external approvals service. Holds the authoritative
/// stage state, refuses transitions out of a terminal stage, and appends an
/// audit entry per accepted decision.
pub(crate) struct InMemoryApprovalsGateway {
    applications: Mutex<Vec<SeedApplication>>,
    history: Mutex<Vec<Value>>,
}

impl InMemoryApprovalsGateway {
    pub(crate) fn seeded() -> Self {
        Self {
            applications: Mutex::new(seed_applications()),
            history: Mutex::new(Vec::new()),
        }
    }
}

impl ApprovalsGateway for InMemoryApprovalsGateway {
    fn fetch_enriched(&self, _scope: &RouteScope) -> Result<String, GatewayError> {
        let guard = self.applications.lock().expect("gateway mutex poisoned");
        let rows: Vec<Value> = guard.iter().map(SeedApplication::enriched_row).collect();
        Ok(Value::Array(rows).to_string())
    }

    fn fetch_full(&self, _scope: &RouteScope) -> Result<String, GatewayError> {
        let guard = self.applications.lock().expect("gateway mutex poisoned");
        let rows: Vec<Value> = guard.iter().map(SeedApplication::full_row).collect();
        Ok(Value::Array(rows).to_string())
    }

    fn submit_decision(&self, request: &DecisionRequest) -> Result<(), GatewayError> {
        let mut guard = self.applications.lock().expect("gateway mutex poisoned");

        let (application, stage) = guard
            .iter_mut()
            .find_map(|application| {
                let identity = (
                    application.id.clone(),
                    application.name.clone(),
                    application.roll_number.clone(),
                );
                application
                    .stages
                    .iter_mut()
                    .find(|stage| stage.stage_id == request.stage_id)
                    .map(|stage| (identity, stage))
            })
            .ok_or_else(|| GatewayError::Rejected("unknown stage".to_string()))?;

        if stage.status.is_terminal() {
            return Err(GatewayError::Rejected("stage already finalized".to_string()));
        }

        stage.status = request.action.applied_status();
        stage.remark = request.remark.clone();
        stage.actioned_by = Some(request.department.code().to_string());
        stage.actioned_at = Some(Utc::now());

        let (id, name, roll_number) = application;
        self.history.lock().expect("gateway mutex poisoned").push(json!({
            "student_name": name,
            "display_id": id,
            "roll_number": roll_number,
            "action": request.action.verb(),
            "remarks": request.remark,
            "timestamp": Utc::now().to_rfc3339(),
        }));

        // Keep the denormalized listing consistent with the stage set.
        let application = guard
            .iter_mut()
            .find(|application| application.id == id)
            .expect("application present");
        application.status_label = aggregate_status(&application.stages).label().to_string();

        Ok(())
    }

    fn fetch_action_history(&self) -> Result<String, GatewayError> {
        let guard = self.history.lock().expect("gateway mutex poisoned");
        Ok(Value::Array(guard.clone()).to_string())
    }
}

fn stage(id: &str, department: Department, status: StageStatus) -> ClearanceStage {
    ClearanceStage {
        stage_id: StageId(id.to_string()),
        department,
        status,
        remark: None,
        actioned_by: None,
        actioned_at: None,
    }
}

fn seed_applications() -> Vec<SeedApplication> {
    vec![
        SeedApplication {
            id: "A-7".to_string(),
            name: "Asha Verma".to_string(),
            roll_number: "23ICS014".to_string(),
            enrollment_number: "EN-2301".to_string(),
            course: "B.Tech ICS".to_string(),
            email: "asha.verma@example.edu".to_string(),
            mobile: "9876500014".to_string(),
            status_label: "In Progress".to_string(),
            submitted_at: "2026-07-01T09:30:00Z".to_string(),
            stages: vec![
                stage("S-100", Department::Library, StageStatus::Pending),
                stage("S-101", Department::Accounts, StageStatus::Approved),
                stage("S-102", Department::Hostels, StageStatus::Pending),
            ],
        },
        SeedApplication {
            id: "A-8".to_string(),
            name: "Rahul Nair".to_string(),
            roll_number: "23MEC002".to_string(),
            enrollment_number: "EN-2302".to_string(),
            course: "B.Tech ME".to_string(),
            email: "rahul.nair@example.edu".to_string(),
            mobile: "9876500002".to_string(),
            status_label: "Cleared".to_string(),
            submitted_at: "2026-06-28T14:05:00Z".to_string(),
            stages: vec![
                stage("S-110", Department::Library, StageStatus::Approved),
                stage("S-111", Department::Accounts, StageStatus::Approved),
                stage("S-112", Department::Hostels, StageStatus::Approved),
            ],
        },
        SeedApplication {
            id: "A-9".to_string(),
            name: "Meera Iyer".to_string(),
            roll_number: "23ICS021".to_string(),
            enrollment_number: "EN-2303".to_string(),
            course: "B.Tech ICS".to_string(),
            email: "meera.iyer@example.edu".to_string(),
            mobile: "9876500021".to_string(),
            status_label: "In Progress".to_string(),
            submitted_at: "2026-07-02T08:10:00Z".to_string(),
            stages: vec![
                stage("S-120", Department::Library, StageStatus::Pending),
                stage("S-121", Department::Accounts, StageStatus::Pending),
                stage("S-122", Department::Sports, StageStatus::Pending),
            ],
        },
    ]
}
