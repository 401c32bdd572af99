/// Closed taxonomy a raw status label is classified into. Labels outside
/// every synonym set stay `Unknown`; callers keep the original label for
/// display rather than coercing it to pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusCategory {
    Pending,
    Approved,
    Rejected,
    Unknown,
}

impl StatusCategory {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Unknown => "unknown",
        }
    }
}

/// Classify a free-form status label. Pure and idempotent: feeding a
/// canonical label back in returns the same category.
pub fn classify(raw: &str) -> StatusCategory {
    match normalize_label(raw).as_str() {
        "cleared" | "approved" => StatusCategory::Approved,
        "inprogress" | "pending" => StatusCategory::Pending,
        "rejected" | "denied" => StatusCategory::Rejected,
        _ => StatusCategory::Unknown,
    }
}

fn normalize_label(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace() && *c != '-' && *c != '_')
        .collect::<String>()
        .to_lowercase()
}

/// Status predicate used when narrowing the reconciled set for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusFilter {
    All,
    Matching(StatusCategory),
}

impl StatusFilter {
    /// Parse a filter label; "all" (any casing) disables status filtering,
    /// anything else is classified with the same rules as record labels.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("all") {
            return Self::All;
        }
        Self::Matching(classify(trimmed))
    }

    pub fn matches(&self, category: StatusCategory) -> bool {
        match self {
            Self::All => true,
            Self::Matching(wanted) => *wanted == category,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn synonyms_are_case_and_separator_insensitive() {
        for raw in ["In Progress", "in-progress", "IN_PROGRESS", " pending "] {
            assert_eq!(classify(raw), StatusCategory::Pending, "label {raw:?}");
        }
        for raw in ["Cleared", "cleared", "APPROVED", "ap-proved"] {
            assert_eq!(classify(raw), StatusCategory::Approved, "label {raw:?}");
        }
        for raw in ["Rejected", "DENIED", "de_nied"] {
            assert_eq!(classify(raw), StatusCategory::Rejected, "label {raw:?}");
        }
    }

    #[test]
    fn classification_is_idempotent_over_canonical_labels() {
        for category in [
            StatusCategory::Pending,
            StatusCategory::Approved,
            StatusCategory::Rejected,
        ] {
            assert_eq!(classify(category.label()), category);
        }
    }

    #[test]
    fn unexpected_labels_stay_unknown() {
        assert_eq!(classify("On Hold"), StatusCategory::Unknown);
        assert_eq!(classify(""), StatusCategory::Unknown);
        assert_eq!(classify("escalated"), StatusCategory::Unknown);
    }

    #[test]
    fn filter_all_matches_everything() {
        let filter = StatusFilter::parse("ALL");
        assert!(filter.matches(StatusCategory::Unknown));
        assert!(filter.matches(StatusCategory::Rejected));
    }

    #[test]
    fn filter_labels_share_record_normalization() {
        let filter = StatusFilter::parse("In-Progress");
        assert!(filter.matches(classify("pending")));
        assert!(!filter.matches(classify("cleared")));
    }
}
