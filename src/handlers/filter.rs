//! Row filtering, by numeric condition or by free-text terms.

use analyst_types::Dataset;
use regex::Regex;
use tracing::debug;

use super::{compose, Analysis, SAMPLE_CAP};
use crate::columns::row_label;
use crate::conditions::NumericCondition;

/// Keep rows satisfying an extracted numeric condition. Sheets without the
/// condition's column are skipped; unparseable cells never match.
pub fn by_condition(condition: &NumericCondition, dataset: &Dataset) -> Option<Analysis> {
    let mut sections = Vec::new();
    for sheet in &dataset.sheets {
        if sheet.is_empty() || !sheet.columns.contains(&condition.column) {
            debug!(sheet = %sheet.name, "condition filter skipping sheet");
            continue;
        }

        let kept: Vec<usize> = sheet
            .rows
            .iter()
            .enumerate()
            .filter(|(_, row)| {
                row.get(&condition.column)
                    .is_some_and(|cell| condition.matches(cell))
            })
            .map(|(i, _)| i)
            .collect();

        let mut lines = vec![format!(
            "Sheet \"{}\": {} of {} rows match {}",
            sheet.name,
            kept.len(),
            sheet.row_count(),
            condition,
        )];
        for &index in kept.iter().take(SAMPLE_CAP) {
            let value = sheet
                .cell(index, &condition.column)
                .map(|c| c.as_text())
                .unwrap_or_default();
            lines.push(format!("  - {}: {}", row_label(sheet, index), value));
        }
        if kept.len() > SAMPLE_CAP {
            lines.push(format!("  ... and {} more", kept.len() - SAMPLE_CAP));
        }
        sections.push(lines.join("\n"));
    }
    compose(sections, None)
}

/// Keep rows whose cells contain any extracted search term. Terms come
/// from quoted substrings first, then from the token following a filter
/// keyword. No terms means the handler does not apply.
pub fn by_terms(question: &str, dataset: &Dataset) -> Option<Analysis> {
    let terms = search_terms(question);
    if terms.is_empty() {
        return None;
    }

    let mut sections = Vec::new();
    for sheet in &dataset.sheets {
        if sheet.is_empty() {
            continue;
        }

        let kept: Vec<usize> = sheet
            .rows
            .iter()
            .enumerate()
            .filter(|(_, row)| {
                row.values().any(|cell| {
                    let text = cell.as_text().to_lowercase();
                    !text.is_empty() && terms.iter().any(|t| text.contains(t))
                })
            })
            .map(|(i, _)| i)
            .collect();

        let quoted: Vec<String> = terms.iter().map(|t| format!("\"{}\"", t)).collect();
        let mut lines = vec![format!(
            "Sheet \"{}\": {} of {} rows contain {}",
            sheet.name,
            kept.len(),
            sheet.row_count(),
            quoted.join(" or "),
        )];
        for &index in kept.iter().take(SAMPLE_CAP) {
            lines.push(format!("  - {}", row_label(sheet, index)));
        }
        if kept.len() > SAMPLE_CAP {
            lines.push(format!("  ... and {} more", kept.len() - SAMPLE_CAP));
        }
        sections.push(lines.join("\n"));
    }
    compose(sections, None)
}

/// Search terms for free-text filtering, lower-cased:
/// double- or single-quoted substrings when present, otherwise the single
/// token following "filter by", "show all", "containing", "where", or
/// "only".
fn search_terms(question: &str) -> Vec<String> {
    let mut terms = Vec::new();
    for pattern in [r#""([^"]+)""#, r"'([^']+)'"] {
        let Ok(re) = Regex::new(pattern) else { continue };
        for captures in re.captures_iter(question) {
            if let Some(m) = captures.get(1) {
                let term = m.as_str().trim().to_lowercase();
                if !term.is_empty() {
                    terms.push(term);
                }
            }
        }
    }
    if !terms.is_empty() {
        return terms;
    }

    let Ok(re) = Regex::new(r"(?i)\b(?:filter by|show all|containing|where|only)\s+([\w-]+)")
    else {
        return terms;
    };
    if let Some(captures) = re.captures(question) {
        if let Some(m) = captures.get(1) {
            terms.push(m.as_str().to_lowercase());
        }
    }
    terms
}
