//! A metric ordered along a date column.

use analyst_types::Dataset;
use chrono::NaiveDate;
use tracing::debug;

use super::{compose, format_number, Analysis, SAMPLE_CAP};
use crate::columns::{cell_date, first_date_column, is_numeric_column, resolve_metric_column};

/// Chronological view of a metric: rows where both the sheet's date column
/// and the metric parse, sorted ascending by date. The date column itself
/// never doubles as the metric.
pub fn run(question: &str, dataset: &Dataset) -> Option<Analysis> {
    let mut sections = Vec::new();
    for sheet in &dataset.sheets {
        if sheet.is_empty() {
            continue;
        }
        let Some(date_column) = first_date_column(sheet) else {
            debug!(sheet = %sheet.name, "no date column for trend");
            continue;
        };
        let metric = resolve_metric_column(question, sheet)
            .filter(|m| *m != date_column && is_numeric_column(sheet, m))
            .or_else(|| {
                sheet
                    .columns
                    .iter()
                    .find(|c| **c != date_column && is_numeric_column(sheet, c))
                    .cloned()
            });
        let Some(metric) = metric else {
            continue;
        };

        let mut points: Vec<(NaiveDate, f64)> = sheet
            .rows
            .iter()
            .filter_map(|row| {
                let date = row.get(&date_column).and_then(cell_date)?;
                let value = row.get(&metric).and_then(|cell| cell.as_number())?;
                Some((date, value))
            })
            .collect();
        if points.is_empty() {
            continue;
        }
        points.sort_by_key(|(date, _)| *date);

        let mut lines = vec![format!(
            "Sheet \"{}\": {} over {} ({} points)",
            sheet.name,
            metric,
            date_column,
            points.len(),
        )];
        for (date, value) in points.iter().take(SAMPLE_CAP) {
            lines.push(format!("  {}: {}", date, format_number(*value)));
        }
        if points.len() > SAMPLE_CAP {
            lines.push(format!("  ... and {} more", points.len() - SAMPLE_CAP));
        }
        sections.push(lines.join("\n"));
    }
    compose(sections, None)
}
