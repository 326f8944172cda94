//! HTML parsing for the infopost notices list and notice detail pages.
//!
//! The infopost pages are legacy ASP output, not well-formed XML, so this
//! module scans them with case-insensitive string helpers instead of a DOM.

/// One row of the notices list table.
#[derive(Debug, Clone)]
pub struct NoticeRef {
    pub raw_type: String,
    pub date: String,
    pub number: String,
    pub subject: String,
    pub detail_link: Option<String>,
}

/// Parse the notices list table. The header row is skipped, as is any row
/// with fewer than 6 cells. Columns: type, date, number, _, _, subject
/// (which carries the detail-page link).
pub fn parse_notice_list(html: &str, base_url: &str) -> Vec<NoticeRef> {
    let Some(table) = slice_between_ci(html, "<table", "</table>") else {
        return Vec::new();
    };

    let mut refs = Vec::new();
    let mut pos = 0;
    let mut first_row = true;

    while let Some((start, end)) = next_tag_block_ci(table, "<tr", "</tr>", pos) {
        let row = &table[start..end];
        pos = end;

        if first_row {
            first_row = false;
            continue;
        }

        let cells = collect_cells(row);
        if cells.len() < 6 {
            continue;
        }

        let detail_link = find_href(&cells[5].0).map(|href| {
            if href.starts_with("http") {
                href
            } else {
                format!("{}{}", base_url, href)
            }
        });

        refs.push(NoticeRef {
            raw_type: cells[0].1.clone(),
            date: cells[1].1.clone(),
            number: cells[2].1.clone(),
            subject: cells[5].1.clone(),
            detail_link,
        });
    }

    refs
}

/// Extract the notice body from a detail page as newline-separated text
/// segments, one per HTML text node. The line structure is what the
/// restriction table parser operates on. Prefers the `id="content"` div,
/// falls back to `class="main"`, then to the whole document.
pub fn notice_body_text(html: &str) -> Option<String> {
    let scope = div_inner_by_marker(html, "id=\"content\"")
        .or_else(|| div_inner_by_marker(html, "class=\"main\""))
        .unwrap_or(html);

    let text = html_to_lines(scope);
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

// ── String-scanning helpers ──

/// Inner HTML between an opening tag pattern and its closing tag,
/// case-insensitive on the patterns.
fn slice_between_ci<'a>(s: &'a str, open_pat: &str, close_pat: &str) -> Option<&'a str> {
    let lc = s.to_ascii_lowercase();
    let open_idx = lc.find(&open_pat.to_ascii_lowercase())?;
    let after_open = s[open_idx..].find('>')? + open_idx + 1;
    let close_rel = lc[after_open..].find(&close_pat.to_ascii_lowercase())?;
    Some(&s[after_open..after_open + close_rel])
}

/// Next complete `<open ...> ... </close>` block from `from` onwards.
/// Returns (start of inner HTML, end past the closing tag).
fn next_tag_block_ci(s: &str, open_tag: &str, close_tag: &str, from: usize) -> Option<(usize, usize)> {
    let lc = s.to_ascii_lowercase();
    let start = lc.get(from..)?.find(&open_tag.to_ascii_lowercase())? + from;
    let open_end = s[start..].find('>')? + start + 1;
    let end_rel = lc[open_end..].find(&close_tag.to_ascii_lowercase())?;
    Some((open_end, open_end + end_rel))
}

/// All `<td>` cells of a row as (raw inner HTML, stripped text) pairs.
fn collect_cells(row: &str) -> Vec<(String, String)> {
    let mut cells = Vec::new();
    let mut pos = 0;
    while let Some((start, end)) = next_tag_block_ci(row, "<td", "</td>", pos) {
        let raw = row[start..end].to_string();
        let text = collapse_ws(&strip_tags(&decode_entities(&raw)));
        cells.push((raw, text));
        pos = end + "</td>".len();
    }
    cells
}

/// First href attribute value in a chunk of HTML, quoted or bare.
fn find_href(html: &str) -> Option<String> {
    let lc = html.to_ascii_lowercase();
    let idx = lc.find("href=")? + "href=".len();
    let rest = &html[idx..];
    let href = match rest.chars().next()? {
        '"' => rest[1..].split('"').next()?,
        '\'' => rest[1..].split('\'').next()?,
        _ => rest.split([' ', '>']).next()?,
    };
    let href = href.trim();
    if href.is_empty() {
        None
    } else {
        Some(decode_entities(href))
    }
}

/// Inner HTML of the div whose opening tag contains `marker`, tracking
/// nested div depth to find the matching close.
fn div_inner_by_marker<'a>(html: &'a str, marker: &str) -> Option<&'a str> {
    let lc = html.to_ascii_lowercase();
    let marker_idx = lc.find(&marker.to_ascii_lowercase())?;
    let inner_start = html[marker_idx..].find('>')? + marker_idx + 1;

    let mut depth = 1usize;
    let mut pos = inner_start;
    while depth > 0 {
        let open = lc[pos..].find("<div");
        let close = lc[pos..].find("</div")?;
        match open {
            Some(o) if o < close => {
                depth += 1;
                pos += o + "<div".len();
            }
            _ => {
                depth -= 1;
                if depth == 0 {
                    return Some(&html[inner_start..pos + close]);
                }
                pos += close + "</div".len();
            }
        }
    }
    None
}

/// Text nodes of an HTML fragment, trimmed, empties dropped, joined with
/// newlines. Script and style contents are skipped.
fn html_to_lines(html: &str) -> String {
    let lc = html.to_ascii_lowercase();
    let mut lines: Vec<String> = Vec::new();
    let mut pos = 0;

    while pos < html.len() {
        match html[pos..].find('<') {
            Some(tag_start) => {
                let seg = &html[pos..pos + tag_start];
                push_segment(&mut lines, seg);

                let abs = pos + tag_start;
                // Skip script/style blocks wholesale
                let skip_to = if lc[abs..].starts_with("<script") {
                    lc[abs..].find("</script").map(|i| abs + i)
                } else if lc[abs..].starts_with("<style") {
                    lc[abs..].find("</style").map(|i| abs + i)
                } else {
                    None
                };
                if let Some(skip) = skip_to {
                    pos = match html[skip..].find('>') {
                        Some(i) => skip + i + 1,
                        None => html.len(),
                    };
                    continue;
                }
                pos = match html[abs..].find('>') {
                    Some(i) => abs + i + 1,
                    None => html.len(),
                };
            }
            None => {
                let seg = &html[pos..];
                push_segment(&mut lines, seg);
                break;
            }
        }
    }

    lines.join("\n")
}

fn push_segment(lines: &mut Vec<String>, seg: &str) {
    let text = collapse_ws(&decode_entities(seg));
    if !text.is_empty() {
        lines.push(text);
    }
}

fn strip_tags(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_tag = false;
    for ch in s.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => out.push(ch),
            _ => {}
        }
    }
    out
}

fn decode_entities(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
}

fn collapse_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

// ── Tests ──
