pub mod extract;
pub mod lines;
pub mod table;

use serde::Serialize;

use extract::capacity::CapacityFields;
use extract::ofo::OfoFields;

/// Closed set of notice categories. Classification is total: every raw
/// label maps to exactly one category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NoticeCategory {
    OperationalFlowOrder,
    CapacityConstraint,
    Other,
}

impl NoticeCategory {
    /// Case- and whitespace-insensitive substring match on the raw label
    /// from the notice listing. "capacity constraint" is tested first.
    pub fn classify(raw_label: &str) -> Self {
        let raw = raw_label.trim().to_lowercase();
        if raw.contains("capacity constraint") {
            NoticeCategory::CapacityConstraint
        } else if raw.contains("operational flow order") || raw.contains("ofo") {
            NoticeCategory::OperationalFlowOrder
        } else {
            NoticeCategory::Other
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NoticeCategory::OperationalFlowOrder => "Operational Flow Order",
            NoticeCategory::CapacityConstraint => "Capacity Constraint",
            NoticeCategory::Other => "Other",
        }
    }
}

/// Category-shaped extraction result. Fields irrelevant to a notice's
/// category cannot exist on its variant, so "legitimately absent" is a
/// property of the type rather than a convention over nullable columns.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum NoticeFacts {
    Ofo(OfoFields),
    Capacity(CapacityFields),
    Other,
}

impl NoticeFacts {
    pub fn category(&self) -> NoticeCategory {
        match self {
            NoticeFacts::Ofo(_) => NoticeCategory::OperationalFlowOrder,
            NoticeFacts::Capacity(_) => NoticeCategory::CapacityConstraint,
            NoticeFacts::Other => NoticeCategory::Other,
        }
    }
}

/// Interpret one notice body. Never fails: empty text yields the category's
/// variant with every optional field absent and no restriction rows.
pub fn interpret(text: &str, category: NoticeCategory, notice_date: Option<&str>) -> NoticeFacts {
    if text.trim().is_empty() {
        return match category {
            NoticeCategory::OperationalFlowOrder => NoticeFacts::Ofo(OfoFields::default()),
            NoticeCategory::CapacityConstraint => NoticeFacts::Capacity(CapacityFields::default()),
            NoticeCategory::Other => NoticeFacts::Other,
        };
    }

    match category {
        NoticeCategory::OperationalFlowOrder => {
            NoticeFacts::Ofo(extract::ofo::extract(text, notice_date))
        }
        NoticeCategory::CapacityConstraint => {
            NoticeFacts::Capacity(extract::capacity::extract(text))
        }
        NoticeCategory::Other => NoticeFacts::Other,
    }
}

/// Convenience entry point for callers holding the raw listing label.
pub fn interpret_raw(text: &str, raw_label: &str, notice_date: Option<&str>) -> NoticeFacts {
    interpret(text, NoticeCategory::classify(raw_label), notice_date)
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_is_case_and_whitespace_insensitive() {
        assert_eq!(
            NoticeCategory::classify("  Capacity Constraint Notice"),
            NoticeCategory::classify("CAPACITY CONSTRAINT")
        );
        assert_eq!(
            NoticeCategory::classify("OFO Issued"),
            NoticeCategory::OperationalFlowOrder
        );
        assert_eq!(
            NoticeCategory::classify("Operational Flow Order - Lifted"),
            NoticeCategory::OperationalFlowOrder
        );
        assert_eq!(
            NoticeCategory::classify("Maintenance Advisory"),
            NoticeCategory::Other
        );
        assert_eq!(NoticeCategory::classify(""), NoticeCategory::Other);
    }

    #[test]
    fn capacity_wins_over_ofo_keywords() {
        // Priority order: "capacity constraint" is tested first
        assert_eq!(
            NoticeCategory::classify("Capacity Constraint due to OFO"),
            NoticeCategory::CapacityConstraint
        );
    }

    #[test]
    fn empty_text_yields_all_absent() {
        let facts = interpret("", NoticeCategory::CapacityConstraint, Some("07/04/2024"));
        match facts {
            NoticeFacts::Capacity(f) => {
                assert!(f.gas_day.is_none());
                assert!(f.no_notice_pct.is_none());
                assert!(f.restrictions.is_empty());
            }
            other => panic!("wrong variant: {:?}", other),
        }

        let facts = interpret("   ", NoticeCategory::OperationalFlowOrder, None);
        assert_eq!(facts, NoticeFacts::Ofo(Default::default()));
    }

    #[test]
    fn other_category_extracts_nothing() {
        let facts = interpret("For Gas Day July 4, 2024", NoticeCategory::Other, None);
        assert_eq!(facts, NoticeFacts::Other);
    }

    #[test]
    fn dispatch_by_raw_label() {
        let facts = interpret_raw(
            "For Gas Day July 4, 2024, deliveries are limited to approximately 85% of their no-notice entitlements.",
            "Capacity Constraint",
            None,
        );
        match facts {
            NoticeFacts::Capacity(f) => assert_eq!(f.no_notice_pct.as_deref(), Some("85%")),
            other => panic!("wrong variant: {:?}", other),
        }
    }
}
