use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::status::{classify, StatusCategory};

/// Identifier wrapper for no-dues applications.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ApplicationId(pub String);

/// Identifier wrapper for a single department's clearance checkpoint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StageId(pub String);

/// Departments that must each sign off before an application is fully cleared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Department {
    Library,
    Hostels,
    Accounts,
    Laboratories,
    Sports,
    Crc,
    Hod,
    School,
    Office,
    Admin,
}

impl Department {
    pub const fn ordered() -> [Self; 10] {
        [
            Self::Library,
            Self::Hostels,
            Self::Accounts,
            Self::Laboratories,
            Self::Sports,
            Self::Crc,
            Self::Hod,
            Self::School,
            Self::Office,
            Self::Admin,
        ]
    }

    /// Resolve a department code, folding historical alias codes onto the
    /// canonical department.
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_ascii_lowercase().as_str() {
            "library" => Some(Self::Library),
            "hostels" | "hostel" => Some(Self::Hostels),
            "accounts" | "account" => Some(Self::Accounts),
            "laboratories" | "laboratory" | "lab" => Some(Self::Laboratories),
            "sports" => Some(Self::Sports),
            "crc" => Some(Self::Crc),
            "hod" => Some(Self::Hod),
            "school" | "dean" => Some(Self::School),
            "office" => Some(Self::Office),
            "admin" => Some(Self::Admin),
            _ => None,
        }
    }

    pub const fn code(self) -> &'static str {
        match self {
            Self::Library => "library",
            Self::Hostels => "hostels",
            Self::Accounts => "accounts",
            Self::Laboratories => "laboratories",
            Self::Sports => "sports",
            Self::Crc => "crc",
            Self::Hod => "hod",
            Self::School => "school",
            Self::Office => "office",
            Self::Admin => "admin",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Library => "Library",
            Self::Hostels => "Hostels",
            Self::Accounts => "Accounts",
            Self::Laboratories => "Laboratories",
            Self::Sports => "Sports",
            Self::Crc => "CRC",
            Self::Hod => "HOD",
            Self::School => "School Dean",
            Self::Office => "Office",
            Self::Admin => "Admin",
        }
    }
}

/// The only values a stage itself may hold. Transitions are one-way: a stage
/// leaves `Pending` exactly once and never leaves a terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    Pending,
    Approved,
    Rejected,
}

impl StageStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }

    /// Map a raw status label onto a stage status using the shared
    /// classification rules. Labels outside the taxonomy yield `None`.
    pub fn from_label(raw: &str) -> Option<Self> {
        match classify(raw) {
            StatusCategory::Pending => Some(Self::Pending),
            StatusCategory::Approved => Some(Self::Approved),
            StatusCategory::Rejected => Some(Self::Rejected),
            StatusCategory::Unknown => None,
        }
    }
}

/// Denormalized student identity carried by the enriched feed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentProfile {
    pub name: String,
    pub roll_number: String,
    pub enrollment_number: String,
    pub course: String,
    pub email: String,
    pub mobile: String,
}

/// One department's clearance checkpoint for one application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClearanceStage {
    pub stage_id: StageId,
    pub department: Department,
    pub status: StageStatus,
    pub remark: Option<String>,
    pub actioned_by: Option<String>,
    pub actioned_at: Option<DateTime<Utc>>,
}

/// Immutable audit entry created exactly once per stage decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionRecord {
    pub student_name: String,
    pub display_id: String,
    pub roll_number: String,
    pub action: String,
    pub remarks: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
}

/// Canonical per-application view produced by reconciling the enriched and
/// full feeds. The raw status label is kept verbatim so labels outside the
/// taxonomy still render exactly as the approvals service sent them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClearanceRecord {
    pub application_id: ApplicationId,
    pub student: StudentProfile,
    pub submitted_at: Option<DateTime<Utc>>,
    pub status_label: String,
    pub active_stage: Option<ClearanceStage>,
    pub stages: Vec<ClearanceStage>,
}

impl ClearanceRecord {
    pub fn category(&self) -> StatusCategory {
        classify(&self.status_label)
    }

    /// A record without a resolvable stage is still shown but cannot be
    /// acted upon.
    pub fn is_actionable(&self) -> bool {
        self.active_stage.is_some()
    }

    /// Whole-application aggregate over the stage list, when the full feed
    /// supplied one.
    pub fn overall_status(&self) -> Option<StageStatus> {
        if self.stages.is_empty() {
            return None;
        }
        Some(aggregate_status(&self.stages))
    }

    pub(crate) fn search_haystack(&self) -> String {
        format!(
            "{} {} {} {}",
            self.student.name,
            self.student.roll_number,
            self.student.enrollment_number,
            self.student.course
        )
        .to_lowercase()
    }

    pub fn view(&self, include_overall: bool) -> ClearanceRecordView {
        ClearanceRecordView {
            application_id: self.application_id.0.clone(),
            name: self.student.name.clone(),
            roll_number: self.student.roll_number.clone(),
            enrollment_number: self.student.enrollment_number.clone(),
            course: self.student.course.clone(),
            submitted_at: self.submitted_at,
            status: self.status_label.clone(),
            category: self.category().label(),
            actionable: self.is_actionable(),
            active_stage: self.active_stage.as_ref().map(StageView::from_stage),
            overall_status: if include_overall {
                self.overall_status().map(StageStatus::label)
            } else {
                None
            },
        }
    }
}

/// Aggregate status across a set of stages: rejected if any stage is
/// rejected, approved only when every stage is approved, pending otherwise.
pub fn aggregate_status(stages: &[ClearanceStage]) -> StageStatus {
    if stages
        .iter()
        .any(|stage| stage.status == StageStatus::Rejected)
    {
        return StageStatus::Rejected;
    }
    if !stages.is_empty()
        && stages
            .iter()
            .all(|stage| stage.status == StageStatus::Approved)
    {
        return StageStatus::Approved;
    }
    StageStatus::Pending
}

/// Sanitized representation of a reconciled record for API responses.
#[derive(Debug, Clone, Serialize)]
pub struct ClearanceRecordView {
    pub application_id: String,
    pub name: String,
    pub roll_number: String,
    pub enrollment_number: String,
    pub course: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submitted_at: Option<DateTime<Utc>>,
    pub status: String,
    pub category: &'static str,
    pub actionable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_stage: Option<StageView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overall_status: Option<&'static str>,
}

/// Stage detail rendered alongside a record.
#[derive(Debug, Clone, Serialize)]
pub struct StageView {
    pub stage_id: String,
    pub department: &'static str,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remark: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actioned_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actioned_at: Option<DateTime<Utc>>,
}

impl StageView {
    fn from_stage(stage: &ClearanceStage) -> Self {
        Self {
            stage_id: stage.stage_id.0.clone(),
            department: stage.department.code(),
            status: stage.status.label(),
            remark: stage.remark.clone(),
            actioned_by: stage.actioned_by.clone(),
            actioned_at: stage.actioned_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stage(department: Department, status: StageStatus) -> ClearanceStage {
        ClearanceStage {
            stage_id: StageId(format!("S-{}", department.code())),
            department,
            status,
            remark: None,
            actioned_by: None,
            actioned_at: None,
        }
    }

    #[test]
    fn alias_codes_fold_onto_canonical_departments() {
        assert_eq!(Department::from_code("account"), Some(Department::Accounts));
        assert_eq!(Department::from_code("hostel"), Some(Department::Hostels));
        assert_eq!(Department::from_code("lab"), Some(Department::Laboratories));
        assert_eq!(
            Department::from_code("laboratory"),
            Some(Department::Laboratories)
        );
        assert_eq!(Department::from_code("dean"), Some(Department::School));
        assert_eq!(Department::from_code("  Library "), Some(Department::Library));
        assert_eq!(Department::from_code("registrar"), None);
    }

    #[test]
    fn aggregate_rejected_dominates() {
        let stages = vec![
            stage(Department::Library, StageStatus::Approved),
            stage(Department::Accounts, StageStatus::Rejected),
            stage(Department::Sports, StageStatus::Pending),
        ];
        assert_eq!(aggregate_status(&stages), StageStatus::Rejected);
    }

    #[test]
    fn aggregate_approved_requires_every_stage() {
        let all_approved = vec![
            stage(Department::Library, StageStatus::Approved),
            stage(Department::Accounts, StageStatus::Approved),
        ];
        assert_eq!(aggregate_status(&all_approved), StageStatus::Approved);

        let one_pending = vec![
            stage(Department::Library, StageStatus::Approved),
            stage(Department::Accounts, StageStatus::Pending),
        ];
        assert_eq!(aggregate_status(&one_pending), StageStatus::Pending);
    }

    #[test]
    fn record_without_stage_detail_is_not_actionable() {
        let record = ClearanceRecord {
            application_id: ApplicationId("A-1".to_string()),
            student: StudentProfile::default(),
            submitted_at: None,
            status_label: "In Progress".to_string(),
            active_stage: None,
            stages: Vec::new(),
        };
        assert!(!record.is_actionable());
        assert!(record.overall_status().is_none());
    }
}
