//! Top-N / bottom-N ranking over a metric column.

use std::cmp::Ordering;

use analyst_types::{ChartPayload, ChartType, Dataset};
use regex::Regex;
use tracing::debug;

use super::{compose, format_number, row_record, Analysis};
use crate::columns::{identifier_column, resolve_metric_column, row_label};

/// Ranking direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Top,
    Bottom,
}

impl Direction {
    fn keyword(&self) -> &'static str {
        match self {
            Direction::Top => "top",
            Direction::Bottom => "bottom",
        }
    }

    fn title_word(&self) -> &'static str {
        match self {
            Direction::Top => "Top",
            Direction::Bottom => "Bottom",
        }
    }
}

/// Explicit row count from "top N" / "bottom N", clamped to 1..=50.
/// `None` without a digit count; a bare "top" is not a ranking request.
pub fn requested_count(question: &str, direction: Direction) -> Option<usize> {
    let pattern = format!(r"(?i)\b{}\s+(\d+)\b", direction.keyword());
    let Ok(re) = Regex::new(&pattern) else {
        return None;
    };
    let n: usize = re.captures(question)?.get(1)?.as_str().parse().ok()?;
    Some(n.clamp(1, 50))
}

/// Rank rows by the resolved metric column and keep the requested count.
/// Rows without a parseable value are excluded; ties keep input order.
pub fn run(question: &str, dataset: &Dataset, direction: Direction) -> Option<Analysis> {
    let count = requested_count(question, direction)?;

    let mut sections = Vec::new();
    let mut chart = None;
    for sheet in &dataset.sheets {
        if sheet.is_empty() {
            continue;
        }
        let Some(metric) = resolve_metric_column(question, sheet) else {
            continue;
        };

        let mut scored: Vec<(usize, f64)> = sheet
            .rows
            .iter()
            .enumerate()
            .filter_map(|(i, row)| {
                row.get(&metric)
                    .and_then(|cell| cell.as_number())
                    .map(|value| (i, value))
            })
            .collect();
        if scored.is_empty() {
            debug!(sheet = %sheet.name, column = %metric, "ranking found no numeric values");
            continue;
        }

        // Stable sort: equal values keep their input order.
        match direction {
            Direction::Top => {
                scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal))
            }
            Direction::Bottom => {
                scored.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal))
            }
        }
        scored.truncate(count);

        let mut lines = vec![format!(
            "Sheet \"{}\": {} {} by {}",
            sheet.name,
            direction.keyword(),
            count,
            metric,
        )];
        for (rank, &(index, value)) in scored.iter().enumerate() {
            lines.push(format!(
                "  {}. {}: {}",
                rank + 1,
                row_label(sheet, index),
                format_number(value),
            ));
        }
        sections.push(lines.join("\n"));

        if chart.is_none() {
            let identifier = identifier_column(sheet);
            let mut data = Vec::new();
            for &(index, _) in &scored {
                let mut record = row_record(sheet, &sheet.rows[index]);
                if identifier.is_none() {
                    record.insert(
                        "Label".to_string(),
                        serde_json::Value::String(row_label(sheet, index)),
                    );
                }
                data.push(record);
            }
            let x_key = identifier.unwrap_or_else(|| "Label".to_string());
            chart = Some(
                ChartPayload::new(
                    ChartType::Bar,
                    format!("{} {} by {}", direction.title_word(), count, metric),
                )
                .with_axis_keys(x_key, metric)
                .with_data(data),
            );
        }
    }
    compose(sections, chart)
}
