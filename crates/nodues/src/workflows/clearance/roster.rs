use super::actions::AppliedDecision;
use super::domain::{ApplicationId, ClearanceRecord};
use super::status::StatusFilter;

/// In-memory record set backing a department session's view.
///
/// Two mutation paths exist: `apply_decision` patches one record in place
/// after a successful submission, and `replace_all` swaps the whole set in
/// from a fresh reconciliation. The reconciliation always wins: an
/// optimistic value that disagrees with a later refresh is overwritten
/// silently.
#[derive(Debug, Default)]
pub struct ClearanceRoster {
    records: Vec<ClearanceRecord>,
}

impl ClearanceRoster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[ClearanceRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn find(&self, application_id: &ApplicationId) -> Option<&ClearanceRecord> {
        self.records
            .iter()
            .find(|record| &record.application_id == application_id)
    }

    /// Wholesale replacement from a reconciliation run.
    pub fn replace_all(&mut self, records: Vec<ClearanceRecord>) {
        self.records = records;
    }

    /// Speculative local patch after a successful submission, matched by
    /// application identifier. Returns false when the record is no longer in
    /// the set (a refresh may have narrowed the scope meanwhile).
    pub fn apply_decision(&mut self, applied: &AppliedDecision) -> bool {
        let Some(record) = self
            .records
            .iter_mut()
            .find(|record| record.application_id == applied.application_id)
        else {
            return false;
        };

        record.status_label = applied.status.label().to_string();

        for stage in record
            .active_stage
            .iter_mut()
            .chain(record.stages.iter_mut())
        {
            if stage.stage_id == applied.stage_id {
                stage.status = applied.status;
                stage.remark = applied.remark.clone();
                stage.actioned_by = Some(applied.actioned_by.clone());
                stage.actioned_at = Some(applied.actioned_at);
            }
        }

        true
    }

    /// Narrow the set for display: the concatenated identity fields must
    /// contain the query case-insensitively and the classified status must
    /// pass the filter. Matching records keep their reconciled order.
    pub fn filter(&self, query: &str, filter: &StatusFilter) -> Vec<ClearanceRecord> {
        let needle = query.trim().to_lowercase();
        self.records
            .iter()
            .filter(|record| needle.is_empty() || record.search_haystack().contains(&needle))
            .filter(|record| filter.matches(record.category()))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::clearance::domain::{
        ClearanceStage, Department, StageId, StageStatus, StudentProfile,
    };
    use crate::workflows::clearance::status::StatusCategory;
    use chrono::Utc;

    fn record(id: &str, roll: &str, status_label: &str, stage_id: Option<&str>) -> ClearanceRecord {
        ClearanceRecord {
            application_id: ApplicationId(id.to_string()),
            student: StudentProfile {
                name: format!("Student {id}"),
                roll_number: roll.to_string(),
                enrollment_number: format!("EN-{id}"),
                course: "B.Tech ICS".to_string(),
                email: String::new(),
                mobile: String::new(),
            },
            submitted_at: None,
            status_label: status_label.to_string(),
            active_stage: stage_id.map(|stage_id| ClearanceStage {
                stage_id: StageId(stage_id.to_string()),
                department: Department::Library,
                status: StageStatus::Pending,
                remark: None,
                actioned_by: None,
                actioned_at: None,
            }),
            stages: Vec::new(),
        }
    }

    fn applied(id: &str, stage_id: &str, status: StageStatus) -> AppliedDecision {
        AppliedDecision {
            application_id: ApplicationId(id.to_string()),
            stage_id: StageId(stage_id.to_string()),
            status,
            remark: Some("verified".to_string()),
            actioned_by: "lib-officer".to_string(),
            actioned_at: Utc::now(),
        }
    }

    #[test]
    fn optimistic_patch_rewrites_status_without_refetch() {
        let mut roster = ClearanceRoster::new();
        roster.replace_all(vec![record("A-7", "23ICS014", "In Progress", Some("S-100"))]);

        assert!(roster.apply_decision(&applied("A-7", "S-100", StageStatus::Approved)));

        let patched = roster.find(&ApplicationId("A-7".to_string())).expect("record");
        assert_eq!(patched.category(), StatusCategory::Approved);
        let stage = patched.active_stage.as_ref().expect("stage");
        assert_eq!(stage.status, StageStatus::Approved);
        assert_eq!(stage.actioned_by.as_deref(), Some("lib-officer"));
        assert!(stage.actioned_at.is_some());
    }

    #[test]
    fn later_reconciliation_overwrites_the_optimistic_value_silently() {
        let mut roster = ClearanceRoster::new();
        roster.replace_all(vec![record("A-7", "23ICS014", "In Progress", Some("S-100"))]);
        roster.apply_decision(&applied("A-7", "S-100", StageStatus::Approved));

        // A later authoritative refresh disagrees; the server view wins.
        roster.replace_all(vec![record("A-7", "23ICS014", "Rejected", Some("S-100"))]);

        let refreshed = roster.find(&ApplicationId("A-7".to_string())).expect("record");
        assert_eq!(refreshed.category(), StatusCategory::Rejected);
    }

    #[test]
    fn patch_for_an_absent_record_reports_false() {
        let mut roster = ClearanceRoster::new();
        roster.replace_all(vec![record("A-1", "23ICS001", "pending", None)]);
        assert!(!roster.apply_decision(&applied("A-9", "S-9", StageStatus::Approved)));
    }

    #[test]
    fn filter_combines_text_match_and_status() {
        let mut roster = ClearanceRoster::new();
        roster.replace_all(vec![
            record("A-1", "23ICS014", "In Progress", None),
            record("A-2", "23MEC002", "pending", None),
            record("A-3", "23ICS015", "Cleared", None),
            record("A-4", "23ICS016", "On Hold", None),
        ]);

        let matches = roster.filter("23ICS", &StatusFilter::parse("pending"));
        let ids: Vec<&str> = matches
            .iter()
            .map(|record| record.application_id.0.as_str())
            .collect();
        assert_eq!(ids, vec!["A-1"]);
    }

    #[test]
    fn filter_preserves_reconciled_order() {
        let mut roster = ClearanceRoster::new();
        roster.replace_all(vec![
            record("A-3", "23ICS015", "pending", None),
            record("A-1", "23ICS014", "pending", None),
            record("A-2", "23ICS013", "pending", None),
        ]);

        let matches = roster.filter("23ics", &StatusFilter::All);
        let ids: Vec<&str> = matches
            .iter()
            .map(|record| record.application_id.0.as_str())
            .collect();
        assert_eq!(ids, vec!["A-3", "A-1", "A-2"]);
    }

    #[test]
    fn unknown_status_matches_only_an_unknown_filter() {
        let mut roster = ClearanceRoster::new();
        roster.replace_all(vec![record("A-4", "23ICS016", "On Hold", None)]);

        assert!(roster
            .filter("", &StatusFilter::parse("pending"))
            .is_empty());
        assert_eq!(roster.filter("", &StatusFilter::parse("on hold")).len(), 1);
    }
}
