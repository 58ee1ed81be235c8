//! Full ordering of rows by a resolved column.

use std::cmp::Ordering;

use analyst_types::{CellValue, Dataset};
use tracing::debug;

use super::{compose, Analysis, SAMPLE_CAP};
use crate::columns::{contains_word, resolve_metric_column, row_label};

/// Direction words that flip the default descending order.
const ASCENDING_KEYWORDS: &[&str] = &["ascending", "asc", "lowest", "smallest", "increasing"];

/// Sort all rows by the resolved column. Rows with a missing or empty cell
/// in that column are excluded. Numeric comparison when both sides parse,
/// otherwise case-insensitive text with numbers ordered before text; the
/// sort is stable either way.
pub fn run(question: &str, dataset: &Dataset) -> Option<Analysis> {
    let ascending = wants_ascending(question);

    let mut sections = Vec::new();
    for sheet in &dataset.sheets {
        if sheet.is_empty() {
            continue;
        }
        let Some(column) = resolve_metric_column(question, sheet) else {
            continue;
        };

        let mut items: Vec<(usize, &CellValue)> = sheet
            .rows
            .iter()
            .enumerate()
            .filter_map(|(i, row)| {
                row.get(&column)
                    .filter(|cell| !cell.is_empty())
                    .map(|cell| (i, cell))
            })
            .collect();
        if items.is_empty() {
            debug!(sheet = %sheet.name, column = %column, "sort found no usable cells");
            continue;
        }
        items.sort_by(|a, b| {
            let ord = cell_order(a.1, b.1);
            if ascending {
                ord
            } else {
                ord.reverse()
            }
        });

        let direction = if ascending { "ascending" } else { "descending" };
        let mut lines = vec![format!(
            "Sheet \"{}\": sorted by {} ({}), {} rows",
            sheet.name,
            column,
            direction,
            items.len(),
        )];
        for (rank, &(index, cell)) in items.iter().take(SAMPLE_CAP).enumerate() {
            lines.push(format!(
                "  {}. {}: {}",
                rank + 1,
                row_label(sheet, index),
                cell.as_text(),
            ));
        }
        if items.len() > SAMPLE_CAP {
            lines.push(format!("  ... and {} more", items.len() - SAMPLE_CAP));
        }
        sections.push(lines.join("\n"));
    }
    compose(sections, None)
}

fn wants_ascending(question: &str) -> bool {
    let question_lower = question.to_lowercase();
    ASCENDING_KEYWORDS
        .iter()
        .any(|k| contains_word(&question_lower, k))
}

/// Ascending comparator: numbers by value and before any text, text
/// case-insensitively.
fn cell_order(a: &CellValue, b: &CellValue) -> Ordering {
    match (a.as_number(), b.as_number()) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a
            .as_text()
            .to_lowercase()
            .cmp(&b.as_text().to_lowercase()),
    }
}
