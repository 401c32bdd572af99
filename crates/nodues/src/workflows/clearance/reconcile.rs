use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use super::domain::{
    ApplicationId, ClearanceRecord, ClearanceStage, Department, StageId, StageStatus,
    StudentProfile,
};

/// Source feeds the reconciler (and the audit view) consume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedKind {
    Enriched,
    Full,
    History,
}

impl FeedKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Enriched => "enriched",
            Self::Full => "full",
            Self::History => "history",
        }
    }
}

/// Outcome of merging both feeds. `degraded` lists feeds that failed to
/// parse and were substituted with an empty collection; the listing still
/// renders from whatever survived.
#[derive(Debug)]
pub struct Reconciliation {
    pub records: Vec<ClearanceRecord>,
    pub degraded: Vec<FeedKind>,
}

/// Join the enriched and full feeds into one canonical record per
/// application.
///
/// Enriched records keep their feed order; full-feed records with no
/// enriched counterpart are appended after them so nothing carrying a valid
/// identifier is silently dropped. Records without any resolvable
/// identifier are dropped, since they cannot be acted upon safely.
pub fn reconcile_feeds(
    enriched_body: &str,
    full_body: &str,
    scope: Option<Department>,
) -> Reconciliation {
    let mut degraded = Vec::new();

    let enriched: Vec<EnrichedRow> = match serde_json::from_str(enriched_body) {
        Ok(rows) => rows,
        Err(err) => {
            warn!(%err, feed = FeedKind::Enriched.label(), "feed failed to parse, substituting empty listing");
            degraded.push(FeedKind::Enriched);
            Vec::new()
        }
    };
    let full: Vec<FullRow> = match serde_json::from_str(full_body) {
        Ok(rows) => rows,
        Err(err) => {
            warn!(%err, feed = FeedKind::Full.label(), "feed failed to parse, stage enrichment degraded");
            degraded.push(FeedKind::Full);
            Vec::new()
        }
    };

    let mut full_slots: Vec<Option<FullRow>> = full.into_iter().map(Some).collect();
    let mut records = Vec::new();

    for row in enriched {
        let Some(id) = row.identity.resolve() else {
            continue;
        };

        let matched = full_slots
            .iter_mut()
            .find(|slot| {
                slot.as_ref()
                    .and_then(|full_row| full_row.identity.resolve())
                    .as_deref()
                    == Some(id.as_str())
            })
            .and_then(Option::take);

        let (active_stage, stages) = match matched {
            Some(full_row) => full_row.stage_detail(scope),
            None => (None, Vec::new()),
        };

        records.push(ClearanceRecord {
            application_id: ApplicationId(id),
            student: row.student(),
            submitted_at: row.submitted_at.as_deref().and_then(parse_datetime),
            status_label: row.status.unwrap_or_default(),
            active_stage,
            stages,
        });
    }

    for slot in full_slots {
        let Some(full_row) = slot else { continue };
        let Some(id) = full_row.identity.resolve() else {
            continue;
        };
        records.push(full_row.into_record(ApplicationId(id), scope));
    }

    Reconciliation { records, degraded }
}

/// Application identifier spread across the legacy key names the feeds have
/// used over time. Resolution precedence is fixed here so the fallback list
/// can change without touching merge semantics.
#[derive(Debug, Default, Deserialize)]
struct IdentityKeys {
    #[serde(default)]
    application_id: Option<Value>,
    #[serde(default)]
    id: Option<Value>,
    #[serde(rename = "_id", default)]
    legacy_id: Option<Value>,
}

impl IdentityKeys {
    fn resolve(&self) -> Option<String> {
        [&self.application_id, &self.id, &self.legacy_id]
            .into_iter()
            .find_map(|value| value.as_ref().and_then(normalize_identifier))
    }
}

fn normalize_identifier(value: &Value) -> Option<String> {
    match value {
        Value::String(raw) => {
            let trimmed = raw.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

#[derive(Debug, Deserialize)]
struct EnrichedRow {
    #[serde(flatten)]
    identity: IdentityKeys,
    #[serde(default)]
    name: String,
    #[serde(default)]
    roll_number: String,
    #[serde(default)]
    enrollment_number: String,
    #[serde(default)]
    course: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    mobile: String,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    submitted_at: Option<String>,
}

impl EnrichedRow {
    fn student(&self) -> StudentProfile {
        StudentProfile {
            name: self.name.clone(),
            roll_number: self.roll_number.clone(),
            enrollment_number: self.enrollment_number.clone(),
            course: self.course.clone(),
            email: self.email.clone(),
            mobile: self.mobile.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct FullRow {
    #[serde(flatten)]
    identity: IdentityKeys,
    #[serde(default)]
    name: String,
    #[serde(default)]
    roll_number: String,
    #[serde(default)]
    enrollment_number: String,
    #[serde(default)]
    course: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    mobile: String,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    submitted_at: Option<String>,
    #[serde(default)]
    active_stage: Option<StageRow>,
    #[serde(default)]
    stages: Vec<StageRow>,
}

impl FullRow {
    /// Pick the active stage: an explicit one from the feed wins, else the
    /// caller's department stage, else the first pending stage.
    fn stage_detail(self, scope: Option<Department>) -> (Option<ClearanceStage>, Vec<ClearanceStage>) {
        let stages: Vec<ClearanceStage> = self
            .stages
            .into_iter()
            .filter_map(StageRow::into_stage)
            .collect();

        let active = self
            .active_stage
            .and_then(StageRow::into_stage)
            .or_else(|| {
                scope.and_then(|department| {
                    stages
                        .iter()
                        .find(|stage| stage.department == department)
                        .cloned()
                })
            })
            .or_else(|| {
                stages
                    .iter()
                    .find(|stage| stage.status == StageStatus::Pending)
                    .cloned()
            });

        (active, stages)
    }

    fn into_record(self, application_id: ApplicationId, scope: Option<Department>) -> ClearanceRecord {
        let student = StudentProfile {
            name: self.name.clone(),
            roll_number: self.roll_number.clone(),
            enrollment_number: self.enrollment_number.clone(),
            course: self.course.clone(),
            email: self.email.clone(),
            mobile: self.mobile.clone(),
        };
        let submitted_at = self.submitted_at.as_deref().and_then(parse_datetime);
        let status = self.status.clone();
        let (active_stage, stages) = self.stage_detail(scope);
        let status_label = status.unwrap_or_else(|| {
            active_stage
                .as_ref()
                .map(|stage| stage.status.label().to_string())
                .unwrap_or_default()
        });

        ClearanceRecord {
            application_id,
            student,
            submitted_at,
            status_label,
            active_stage,
            stages,
        }
    }
}

#[derive(Debug, Deserialize)]
struct StageRow {
    #[serde(default)]
    stage_id: Option<Value>,
    #[serde(default)]
    id: Option<Value>,
    #[serde(rename = "_id", default)]
    legacy_id: Option<Value>,
    #[serde(default)]
    department: String,
    #[serde(default)]
    status: String,
    #[serde(default)]
    remark: Option<String>,
    #[serde(default)]
    actioned_by: Option<String>,
    #[serde(default)]
    actioned_at: Option<String>,
}

impl StageRow {
    /// A stage row is only usable when its identifier, department code, and
    /// status all resolve; anything less cannot be acted on safely.
    fn into_stage(self) -> Option<ClearanceStage> {
        let stage_id = [&self.stage_id, &self.id, &self.legacy_id]
            .into_iter()
            .find_map(|value| value.as_ref().and_then(normalize_identifier))?;
        let department = Department::from_code(&self.department)?;
        let status = StageStatus::from_label(&self.status)?;

        Some(ClearanceStage {
            stage_id: StageId(stage_id),
            department,
            status,
            remark: self.remark.filter(|remark| !remark.trim().is_empty()),
            actioned_by: self.actioned_by,
            actioned_at: self.actioned_at.as_deref().and_then(parse_datetime),
        })
    }
}

/// Lenient timestamp parsing: RFC 3339 first, then a bare date.
pub(crate) fn parse_datetime(value: &str) -> Option<DateTime<Utc>> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn enriched_body() -> String {
        json!([
            {
                "application_id": "A-7",
                "name": "Asha Verma",
                "roll_number": "23ICS014",
                "enrollment_number": "EN-2301",
                "course": "B.Tech ICS",
                "status": "In Progress",
                "submitted_at": "2026-07-01T09:30:00Z"
            },
            {
                "id": 42,
                "name": "Rahul Nair",
                "roll_number": "23MEC002",
                "enrollment_number": "EN-2302",
                "course": "B.Tech ME",
                "status": "Cleared"
            },
            {
                "name": "No Identifier",
                "roll_number": "23ICS999",
                "status": "pending"
            }
        ])
        .to_string()
    }

    fn full_body() -> String {
        json!([
            {
                "_id": "A-7",
                "active_stage": {
                    "stage_id": "S-100",
                    "department": "library",
                    "status": "pending"
                },
                "stages": [
                    { "stage_id": "S-100", "department": "library", "status": "pending" },
                    { "stage_id": "S-101", "department": "accounts", "status": "approved" }
                ]
            }
        ])
        .to_string()
    }

    #[test]
    fn identifier_fallback_accepts_legacy_keys_and_numbers() {
        let outcome = reconcile_feeds(&enriched_body(), &full_body(), None);
        assert!(outcome.degraded.is_empty());

        let ids: Vec<&str> = outcome
            .records
            .iter()
            .map(|record| record.application_id.0.as_str())
            .collect();
        assert_eq!(ids, vec!["A-7", "42"]);
    }

    #[test]
    fn unresolvable_identifier_drops_the_record() {
        let outcome = reconcile_feeds(&enriched_body(), "[]", None);
        assert_eq!(outcome.records.len(), 2);
        assert!(outcome
            .records
            .iter()
            .all(|record| record.student.name != "No Identifier"));
    }

    #[test]
    fn missing_full_record_yields_null_stage_not_a_drop() {
        let outcome = reconcile_feeds(&enriched_body(), &full_body(), None);
        let unmatched = &outcome.records[1];
        assert_eq!(unmatched.application_id.0, "42");
        assert!(unmatched.active_stage.is_none());
        assert!(!unmatched.is_actionable());
    }

    #[test]
    fn matched_record_carries_stage_detail_and_raw_label() {
        let outcome = reconcile_feeds(&enriched_body(), &full_body(), None);
        let matched = &outcome.records[0];
        assert_eq!(matched.status_label, "In Progress");
        let stage = matched.active_stage.as_ref().expect("active stage");
        assert_eq!(stage.stage_id.0, "S-100");
        assert_eq!(stage.department, Department::Library);
        assert_eq!(matched.stages.len(), 2);
    }

    #[test]
    fn unparseable_full_feed_degrades_without_dropping_the_listing() {
        let outcome = reconcile_feeds(&enriched_body(), "<html>502</html>", None);
        assert_eq!(outcome.degraded, vec![FeedKind::Full]);
        assert_eq!(outcome.records.len(), 2);
        assert!(outcome.records.iter().all(|r| r.active_stage.is_none()));
    }

    #[test]
    fn unparseable_enriched_feed_still_surfaces_full_records() {
        let outcome = reconcile_feeds("not json", &full_body(), None);
        assert_eq!(outcome.degraded, vec![FeedKind::Enriched]);
        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.records[0].application_id.0, "A-7");
    }

    #[test]
    fn scope_selects_the_department_stage_when_no_explicit_active() {
        let body = json!([
            {
                "application_id": "A-9",
                "stages": [
                    { "stage_id": "S-200", "department": "library", "status": "approved" },
                    { "stage_id": "S-201", "department": "account", "status": "pending" }
                ]
            }
        ])
        .to_string();

        let outcome = reconcile_feeds("[]", &body, Some(Department::Accounts));
        let stage = outcome.records[0].active_stage.as_ref().expect("stage");
        assert_eq!(stage.stage_id.0, "S-201");
        assert_eq!(stage.department, Department::Accounts);
    }

    #[test]
    fn stage_rows_with_unusable_detail_are_skipped() {
        let body = json!([
            {
                "application_id": "A-10",
                "stages": [
                    { "department": "library", "status": "pending" },
                    { "stage_id": "S-300", "department": "cafeteria", "status": "pending" },
                    { "stage_id": "S-301", "department": "sports", "status": "escalated" }
                ]
            }
        ])
        .to_string();

        let outcome = reconcile_feeds("[]", &body, None);
        assert!(outcome.records[0].stages.is_empty());
        assert!(outcome.records[0].active_stage.is_none());
    }

    #[test]
    fn parse_datetime_accepts_rfc3339_and_bare_dates() {
        assert!(parse_datetime("2026-07-01T09:30:00Z").is_some());
        assert!(parse_datetime("2026-07-01").is_some());
        assert!(parse_datetime("  ").is_none());
        assert!(parse_datetime("yesterday").is_none());
    }
}
