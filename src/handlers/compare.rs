//! A metric grouped by a categorical column.

use std::collections::{BTreeMap, HashSet};

use analyst_types::{Dataset, Sheet};
use tracing::debug;

use super::{compose, format_number, Analysis};
use crate::columns::{first_numeric_column, is_numeric_column, named_metric_column};

/// Group a numeric column by the sheet's categorical column and report
/// per-category count, sum, and average. The metric is the column the
/// question names when it names one, otherwise the first numeric column.
pub fn run(question: &str, dataset: &Dataset) -> Option<Analysis> {
    let mut sections = Vec::new();
    for sheet in &dataset.sheets {
        if sheet.is_empty() {
            continue;
        }
        let Some(category) = categorical_column(sheet) else {
            debug!(sheet = %sheet.name, "no categorical column to compare by");
            continue;
        };
        let metric = named_metric_column(question, sheet)
            .filter(|m| *m != category && is_numeric_column(sheet, m))
            .or_else(|| first_numeric_column(sheet));
        let Some(metric) = metric else {
            continue;
        };

        // BTreeMap keeps category order deterministic.
        let mut groups: BTreeMap<String, Vec<f64>> = BTreeMap::new();
        for row in &sheet.rows {
            let Some(value) = row.get(&metric).and_then(|cell| cell.as_number()) else {
                continue;
            };
            let label = row
                .get(&category)
                .map(|cell| cell.as_text())
                .filter(|text| !text.trim().is_empty())
                .unwrap_or_else(|| "(blank)".to_string());
            groups.entry(label).or_default().push(value);
        }
        if groups.is_empty() {
            continue;
        }

        let mut lines = vec![format!(
            "Sheet \"{}\": {} by {}",
            sheet.name, metric, category
        )];
        for (label, values) in &groups {
            let count = values.len();
            let sum: f64 = values.iter().sum();
            lines.push(format!(
                "  {}: count {}, sum {}, average {}",
                label,
                count,
                format_number(sum),
                format_number(sum / count as f64),
            ));
        }
        sections.push(lines.join("\n"));
    }
    compose(sections, None)
}

/// First non-numeric column with at least two distinct values occurring in
/// fewer than half the rows. The half-the-rows bound keeps near-unique
/// identifier columns from being treated as categories.
fn categorical_column(sheet: &Sheet) -> Option<String> {
    for column in &sheet.columns {
        if is_numeric_column(sheet, column) {
            continue;
        }
        let distinct: HashSet<String> = sheet
            .rows
            .iter()
            .filter_map(|row| row.get(column))
            .filter(|cell| !cell.is_empty())
            .map(|cell| cell.as_text().to_lowercase())
            .collect();
        if distinct.len() >= 2 && distinct.len() * 2 < sheet.row_count() {
            return Some(column.clone());
        }
    }
    None
}
