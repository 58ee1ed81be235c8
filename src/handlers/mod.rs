//! Deterministic Analysis Handlers
//!
//! Each handler is a pure function `(question, dataset) -> Option<Analysis>`
//! computing one kind of result directly over the tabular data:
//!
//! - [`filter`] - rows matching a numeric condition or free-text terms
//! - [`ranking`] - top-N / bottom-N rows by a metric column
//! - [`aggregate`] - sum / mean / min / max / count per numeric column
//! - [`compare`] - a metric grouped by a categorical column
//! - [`trend`] - a metric ordered along a date column
//! - [`sort`] - full ordering by a column
//! - [`extremum`] - the single best or worst row
//!
//! Handlers iterate every sheet independently and skip sheets missing the
//! rows or columns they need; `None` means "not applicable to this dataset",
//! never an error. Summaries are bounded: sample listings are capped at
//! [`SAMPLE_CAP`] lines per sheet.

use analyst_types::{CellValue, ChartPayload, Row, Sheet};
use serde_json::{json, Map, Value};

pub mod aggregate;
pub mod compare;
pub mod extremum;
pub mod filter;
pub mod ranking;
pub mod sort;
pub mod trend;

/// One deterministic computation result: a summary the model presents
/// instead of recomputing, plus an optional precomputed chart.
#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    /// Per-sheet report blocks, one blank line between sheets
    pub summary: String,

    /// Precomputed chart from the first applicable sheet, where the
    /// handler produces one
    pub chart: Option<ChartPayload>,
}

/// Sample listings in summaries stop after this many rows per sheet.
pub(crate) const SAMPLE_CAP: usize = 10;

/// Assemble per-sheet sections into one analysis. Empty sections mean the
/// handler did not apply anywhere.
pub(crate) fn compose(sections: Vec<String>, chart: Option<ChartPayload>) -> Option<Analysis> {
    if sections.is_empty() {
        None
    } else {
        Some(Analysis {
            summary: sections.join("\n\n"),
            chart,
        })
    }
}

/// Flatten a row into a JSON record for chart data. Missing cells become
/// explicit nulls so every record carries every column key.
pub(crate) fn row_record(sheet: &Sheet, row: &Row) -> Map<String, Value> {
    let mut record = Map::new();
    for column in &sheet.columns {
        let value = match row.get(column) {
            Some(CellValue::Number(n)) => json!(n),
            Some(CellValue::Bool(b)) => json!(b),
            Some(CellValue::Text(t)) => json!(t),
            Some(CellValue::Empty) | None => Value::Null,
        };
        record.insert(column.clone(), value);
    }
    record
}

/// Render a number for summaries: integers bare, fractions to two places.
pub(crate) fn format_number(n: f64) -> String {
    if n.fract() == 0.0 {
        format!("{:.0}", n)
    } else {
        let rounded = format!("{:.2}", n);
        rounded
            .trim_end_matches('0')
            .trim_end_matches('.')
            .to_string()
    }
}
