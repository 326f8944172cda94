use std::sync::LazyLock;

use regex::Regex;

// A line that is nothing but percentage tokens: "50%", "(25%)", "50%, 40% 30%".
// Trailing separators ("50%, 40%,") occur when a row wraps mid-list.
static PERCENT_LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\(?\d+%\)?(?:[,\s]+\(?\d+%\)?)*[,\s]*$").unwrap());

/// Structural role of one trimmed line inside a restriction block.
///
/// The source table has no column delimiters, so the shape of each line is
/// the only signal: pure percentages vs. a bare Yes/No vs. a leading word.
/// Rules are evaluated in a fixed order and the first match wins; "starts
/// with a letter" is the catch-all, evaluated last, because location names
/// would otherwise shadow the header and status shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineRole {
    /// Blank line, "No-Notice …", or FERC/systemwide boilerplate: ends the table.
    Separator,
    /// The "Restricted Locations …" column-header line.
    Header,
    /// A location name, opens a new restriction row.
    LocationRow,
    /// Bare "Yes" / "No" scheduled-and-sealed flag.
    ScheduledRow,
    /// One or more percentage tokens.
    PercentRow,
    /// Anything else; skipped by the table parser.
    Unknown,
}

pub fn classify_line(line: &str) -> LineRole {
    let line = line.trim();
    let lower = line.to_lowercase();

    if line.is_empty()
        || lower.starts_with("no-notice")
        || lower.contains("ferc")
        || lower.contains("systemwide")
    {
        return LineRole::Separator;
    }
    if lower.starts_with("restricted locations") {
        return LineRole::Header;
    }
    if lower == "yes" || lower == "no" {
        return LineRole::ScheduledRow;
    }
    if PERCENT_LINE_RE.is_match(line) {
        return LineRole::PercentRow;
    }
    if line.chars().next().is_some_and(|c| c.is_alphabetic()) {
        return LineRole::LocationRow;
    }
    LineRole::Unknown
}

/// Split a PercentRow line into its percentage tokens, in order.
pub fn percent_tokens(line: &str) -> Vec<String> {
    line.split([',', ' ', '\t'])
        .filter(|t| !t.is_empty())
        .map(|t| t.to_string())
        .collect()
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_is_separator() {
        assert_eq!(classify_line(""), LineRole::Separator);
        assert_eq!(classify_line("   "), LineRole::Separator);
    }

    #[test]
    fn separator_keywords() {
        assert_eq!(classify_line("No-Notice Restrictions apply"), LineRole::Separator);
        assert_eq!(classify_line("no-notice restrictions"), LineRole::Separator);
        assert_eq!(classify_line("Pursuant to FERC Order 636"), LineRole::Separator);
        assert_eq!(classify_line("Systemwide restrictions remain"), LineRole::Separator);
    }

    #[test]
    fn header_line() {
        assert_eq!(
            classify_line("Restricted Locations Scheduled and Sealed Priority % Restricted Notes"),
            LineRole::Header
        );
        assert_eq!(classify_line("RESTRICTED LOCATIONS"), LineRole::Header);
    }

    #[test]
    fn scheduled_beats_location() {
        // "Yes" starts with a letter but must classify as the status flag
        assert_eq!(classify_line("Yes"), LineRole::ScheduledRow);
        assert_eq!(classify_line("no"), LineRole::ScheduledRow);
        assert_eq!(classify_line("NO"), LineRole::ScheduledRow);
    }

    #[test]
    fn percent_lines() {
        assert_eq!(classify_line("50%"), LineRole::PercentRow);
        assert_eq!(classify_line("50%, 40%, 30%"), LineRole::PercentRow);
        assert_eq!(classify_line("100% (25%)"), LineRole::PercentRow);
        // Percentages mixed with words are not a percent row
        assert_eq!(classify_line("roughly 50% restricted"), LineRole::LocationRow);
    }

    #[test]
    fn percent_line_with_trailing_comma() {
        assert_eq!(classify_line("50%, 40%,"), LineRole::PercentRow);
        assert_eq!(classify_line("100%, "), LineRole::PercentRow);
        assert_eq!(percent_tokens("50%, 40%,"), vec!["50%", "40%"]);
    }

    #[test]
    fn location_lines() {
        assert_eq!(classify_line("Algonquin Citygate"), LineRole::LocationRow);
        assert_eq!(classify_line("Cromwell Lateral (CT)"), LineRole::LocationRow);
        // "Yesterday" begins with yes but is not exactly the flag token
        assert_eq!(classify_line("Yesterday Junction"), LineRole::LocationRow);
    }

    #[test]
    fn unknown_lines() {
        assert_eq!(classify_line("123"), LineRole::Unknown);
        assert_eq!(classify_line("--- 42"), LineRole::Unknown);
        assert_eq!(classify_line("(see note 3)"), LineRole::Unknown);
    }

    #[test]
    fn token_split() {
        assert_eq!(percent_tokens("50%, 40%, 30%"), vec!["50%", "40%", "30%"]);
        assert_eq!(percent_tokens("100% (25%)"), vec!["100%", "(25%)"]);
        assert_eq!(percent_tokens("85%"), vec!["85%"]);
    }
}
