//! Per-column numeric aggregation.

use analyst_types::Dataset;
use tracing::debug;

use super::{compose, format_number, Analysis};

/// Count, sum, mean, min, and max for every numeric column of every sheet.
/// Only parseable values enter the statistics; a cell that fails the
/// permissive parse is excluded, never treated as zero.
pub fn run(_question: &str, dataset: &Dataset) -> Option<Analysis> {
    let mut sections = Vec::new();
    for sheet in &dataset.sheets {
        if sheet.is_empty() {
            continue;
        }

        let mut lines = Vec::new();
        for column in &sheet.columns {
            let values: Vec<f64> = sheet
                .rows
                .iter()
                .filter_map(|row| row.get(column).and_then(|cell| cell.as_number()))
                .collect();
            if values.is_empty() {
                continue;
            }
            let count = values.len();
            let sum: f64 = values.iter().sum();
            let mean = sum / count as f64;
            let min = values.iter().copied().fold(f64::INFINITY, f64::min);
            let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            lines.push(format!(
                "  {}: count {}, sum {}, mean {}, min {}, max {}",
                column,
                count,
                format_number(sum),
                format_number(mean),
                format_number(min),
                format_number(max),
            ));
        }
        if lines.is_empty() {
            debug!(sheet = %sheet.name, "aggregate found no numeric columns");
            continue;
        }
        lines.insert(0, format!("Sheet \"{}\": numeric summary", sheet.name));
        sections.push(lines.join("\n"));
    }
    compose(sections, None)
}
