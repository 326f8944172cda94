use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

static GAS_DAY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"Gas Day (?:January|February|March|April|May|June|July|August|September|October|November|December) ?\d{1,2}(?: - (?:January|February|March|April|May|June|July|August|September|October|November|December)? ?\d{1,2})?",
    )
    .unwrap()
});
static OFO_START_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)effective (\d{1,2}:\d{2} (?:AM|PM) CCT, .*?\d{4})").unwrap()
});
static OFO_END_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)remain in effect until (\d{1,2}:\d{2} (?:AM|PM) CCT, .*?\d{4})").unwrap()
});
static LIFT_ISSUED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"issued on (\w+ \d{1,2}, \d{4})").unwrap());
static LIFT_EFFECTIVE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)effective (?:immediately |on )?(?:at )?(\w+ \d{1,2}, \d{4})").unwrap()
});

/// Lifecycle fields extracted from an Operational Flow Order notice.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OfoFields {
    pub gas_day: Option<String>,
    pub ofo_start: Option<String>,
    pub ofo_end: Option<String>,
    pub is_lifted: bool,
    pub lift_reference_date: Option<String>,
}

/// `notice_date` is the listing date of the notice itself; a lift notice
/// that says only "effective immediately" falls back to it for `ofo_end`.
pub fn extract(text: &str, notice_date: Option<&str>) -> OfoFields {
    let lower = text.to_lowercase();

    let spans: Vec<&str> = GAS_DAY_RE.find_iter(text).map(|m| m.as_str()).collect();
    let gas_day = if spans.is_empty() {
        None
    } else {
        let mut joined = spans.join("; ");
        if lower.contains("until further notice") {
            joined.push_str(" (Until Further Notice)");
        }
        Some(joined)
    };

    let ofo_start = OFO_START_RE
        .captures(text)
        .map(|c| c[1].trim().to_string());
    let mut ofo_end = OFO_END_RE.captures(text).map(|c| c[1].trim().to_string());

    let mut is_lifted = false;
    let mut lift_reference_date = None;

    if lower.contains("lifting the operational flow order") {
        is_lifted = true;
        lift_reference_date = LIFT_ISSUED_RE
            .captures(text)
            .map(|c| c[1].trim().to_string());

        // The lift notice's own effective date supersedes the end date
        // carried over from the original order text.
        if let Some(caps) = LIFT_EFFECTIVE_RE.captures(text) {
            ofo_end = Some(caps[1].trim().to_string());
        } else if lower.contains("effective immediately") {
            if let Some(date) = notice_date {
                ofo_end = Some(date.to_string());
            }
        }
    }

    OfoFields {
        gas_day,
        ofo_start,
        ofo_end,
        is_lifted,
        lift_reference_date,
    }
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_and_end_timestamps() {
        let text = "The OFO is effective 9:00 AM CCT, July 1, 2024 and will \
                    remain in effect until 9:00 AM CCT, July 5, 2024.";
        let f = extract(text, None);
        assert_eq!(f.ofo_start.as_deref(), Some("9:00 AM CCT, July 1, 2024"));
        assert_eq!(f.ofo_end.as_deref(), Some("9:00 AM CCT, July 5, 2024"));
        assert!(!f.is_lifted);
    }

    #[test]
    fn gas_day_spans_joined() {
        let text = "OFO for Gas Day July 1 and Gas Day July 3 - July 5.";
        let f = extract(text, None);
        assert_eq!(
            f.gas_day.as_deref(),
            Some("Gas Day July 1; Gas Day July 3 - July 5")
        );
    }

    #[test]
    fn until_further_notice_qualifier() {
        let text = "OFO for Gas Day July 1 and until further notice.";
        let f = extract(text, None);
        assert_eq!(
            f.gas_day.as_deref(),
            Some("Gas Day July 1 (Until Further Notice)")
        );
    }

    #[test]
    fn lift_without_effective_date_keeps_end_absent() {
        let text = "AGT is lifting the Operational Flow Order issued on June 30, 2024 \
                    for all receipt points.";
        let f = extract(text, Some("07/06/2024"));
        assert!(f.is_lifted);
        assert_eq!(f.lift_reference_date.as_deref(), Some("June 30, 2024"));
        assert!(f.ofo_end.is_none());
    }

    #[test]
    fn lift_effective_date_overrides_end() {
        let text = "AGT issued an OFO that will remain in effect until 9:00 AM CCT, July 5, 2024. \
                    AGT is lifting the Operational Flow Order issued on June 30, 2024. \
                    Effective July 6, 2024, all restrictions are removed.";
        let f = extract(text, None);
        assert!(f.is_lifted);
        assert_eq!(f.ofo_end.as_deref(), Some("July 6, 2024"));
    }

    #[test]
    fn lift_effective_immediately_falls_back_to_notice_date() {
        let text = "AGT is lifting the Operational Flow Order issued on June 30, 2024, \
                    effective immediately.";
        let f = extract(text, Some("07/06/2024"));
        assert!(f.is_lifted);
        assert_eq!(f.ofo_end.as_deref(), Some("07/06/2024"));
    }

    #[test]
    fn empty_text_extracts_nothing() {
        assert_eq!(extract("", None), OfoFields::default());
    }

    #[test]
    fn ofo_fixture() {
        let text = std::fs::read_to_string("tests/fixtures/ofo.txt").unwrap();
        let f = extract(&text, Some("06/30/2024"));
        assert_eq!(f.ofo_start.as_deref(), Some("9:00 AM CCT, July 1, 2024"));
        assert_eq!(f.ofo_end.as_deref(), Some("9:00 AM CCT, July 5, 2024"));
        assert!(f.gas_day.as_deref().unwrap().contains("Gas Day July 1"));
        assert!(!f.is_lifted);
    }

    #[test]
    fn ofo_lift_fixture() {
        let text = std::fs::read_to_string("tests/fixtures/ofo_lift.txt").unwrap();
        let f = extract(&text, Some("07/06/2024"));
        assert!(f.is_lifted);
        assert_eq!(f.lift_reference_date.as_deref(), Some("June 30, 2024"));
        assert_eq!(f.ofo_end.as_deref(), Some("July 6, 2024"));
    }
}
