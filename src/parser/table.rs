use serde::Serialize;

use super::lines::{classify_line, percent_tokens, LineRole};

/// Priority tier labels, in the column order the notices print them.
pub const TIER_SCHEMA: [&str; 8] = ["AO", "IT", "3B", "3A", "2C", "2B", "2A", "1"];

/// One location's restriction entry. `priorities` is positionally aligned to
/// [`TIER_SCHEMA`]: always exactly 8 slots, missing values as empty strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RestrictionRow {
    pub location: String,
    pub scheduled: Option<String>,
    pub priorities: [String; 8],
}

/// Locate the restriction block inside the full notice text.
///
/// The block starts at the first line containing "restricted locations" and
/// ends (exclusive) at the first later line containing "no-notice
/// restrictions". With a start but no end, the block runs to end-of-text.
/// With no start at all there is no table: the block is empty, so downstream
/// callers see the same absence signal as a notice with an empty table.
pub fn restriction_block(text: &str) -> Vec<&str> {
    let lines: Vec<&str> = text.lines().collect();

    let start = lines
        .iter()
        .position(|l| l.to_lowercase().contains("restricted locations"));
    let Some(start) = start else {
        return Vec::new();
    };

    let end = lines[start + 1..]
        .iter()
        .position(|l| l.to_lowercase().contains("no-notice restrictions"))
        .map(|i| start + 1 + i)
        .unwrap_or(lines.len());

    lines[start..end].to_vec()
}

/// Reconstruct restriction rows from a restriction block.
///
/// State machine over classified lines: a LocationRow opens a record (flushing
/// any open one), ScheduledRow sets the flag, PercentRow appends tier values,
/// Separator flushes and stops, Header and Unknown are skipped. A location
/// with no percentage data still yields a row with all-empty priorities.
pub fn parse_table(lines: &[&str]) -> Vec<RestrictionRow> {
    let mut rows = Vec::new();
    let mut current_location: Option<String> = None;
    let mut current_scheduled: Option<String> = None;
    let mut current_priorities: Vec<String> = Vec::new();

    let flush = |location: &mut Option<String>,
                 scheduled: &mut Option<String>,
                 priorities: &mut Vec<String>,
                 rows: &mut Vec<RestrictionRow>| {
        if let Some(loc) = location.take() {
            rows.push(RestrictionRow {
                location: loc,
                scheduled: scheduled.take(),
                priorities: align_to_schema(std::mem::take(priorities)),
            });
        } else {
            scheduled.take();
            priorities.clear();
        }
    };

    for raw in lines {
        let line = raw.trim();
        match classify_line(line) {
            LineRole::Separator => {
                flush(
                    &mut current_location,
                    &mut current_scheduled,
                    &mut current_priorities,
                    &mut rows,
                );
                break;
            }
            LineRole::Header | LineRole::Unknown => {}
            LineRole::LocationRow => {
                flush(
                    &mut current_location,
                    &mut current_scheduled,
                    &mut current_priorities,
                    &mut rows,
                );
                current_location = Some(line.to_string());
            }
            LineRole::ScheduledRow => {
                current_scheduled = Some(line.to_string());
            }
            LineRole::PercentRow => {
                current_priorities.extend(percent_tokens(line));
            }
        }
    }

    flush(
        &mut current_location,
        &mut current_scheduled,
        &mut current_priorities,
        &mut rows,
    );

    rows
}

/// Pad or truncate encountered tokens to exactly one slot per tier label.
fn align_to_schema(values: Vec<String>) -> [String; 8] {
    let mut slots: [String; 8] = Default::default();
    for (slot, value) in slots.iter_mut().zip(values) {
        *slot = value;
    }
    slots
}

// ── Tests ──
