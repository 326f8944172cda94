use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::parser::table::{parse_table, restriction_block, RestrictionRow};

// The phrase runs to a comma, newline, or end-of-text, except the comma
// inside a "<month> <day>, <year>" date, which belongs to the phrase.
static GAS_DAY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"For Gas Day ([^,\n]+(?:,\s*\d{4})?)").unwrap());
static NO_NOTICE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"limited to approximately (\d+%) of their no-notice").unwrap());

/// Fields extracted from a Capacity Constraint notice. Every field that did
/// not match is explicitly absent; `restrictions` empty means the notice had
/// no parseable table, never a parse failure.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CapacityFields {
    pub gas_day: Option<String>,
    pub no_notice_pct: Option<String>,
    pub restrictions: Vec<RestrictionRow>,
}

pub fn extract(text: &str) -> CapacityFields {
    let gas_day = GAS_DAY_RE
        .captures(text)
        .map(|c| c[1].trim().to_string());
    let no_notice_pct = NO_NOTICE_RE.captures(text).map(|c| c[1].to_string());

    let block = restriction_block(text);
    let restrictions = parse_table(&block);

    CapacityFields {
        gas_day,
        no_notice_pct,
        restrictions,
    }
}

// ── Tests ──
