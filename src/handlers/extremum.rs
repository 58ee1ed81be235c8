//! The single best or worst row for a metric.

use analyst_types::{ChartPayload, ChartType, Dataset, Sheet};
use regex::Regex;
use tracing::debug;

use super::{compose, format_number, row_record, Analysis};
use crate::columns::{contains_word, identifier_column, resolve_metric_column, row_label};

const MAX_KEYWORDS: &[&str] = &[
    "most", "highest", "maximum", "greatest", "largest", "best", "top",
];
const MIN_KEYWORDS: &[&str] = &["least", "lowest", "minimum", "smallest", "worst", "bottom"];

/// Which end of the scale a superlative asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extreme {
    Max,
    Min,
}

impl Extreme {
    fn word(&self) -> &'static str {
        match self {
            Extreme::Max => "highest",
            Extreme::Min => "lowest",
        }
    }

    fn title_word(&self) -> &'static str {
        match self {
            Extreme::Max => "Highest",
            Extreme::Min => "Lowest",
        }
    }

    fn better(&self, candidate: f64, current: f64) -> bool {
        match self {
            Extreme::Max => candidate > current,
            Extreme::Min => candidate < current,
        }
    }
}

/// Superlative direction of a question, max keywords checked first.
/// `None` when no superlative is present.
pub fn direction(question: &str) -> Option<Extreme> {
    let question_lower = question.to_lowercase();
    if MAX_KEYWORDS.iter().any(|k| contains_word(&question_lower, k)) {
        return Some(Extreme::Max);
    }
    if MIN_KEYWORDS.iter().any(|k| contains_word(&question_lower, k)) {
        return Some(Extreme::Min);
    }
    None
}

/// Find the single row with the extreme value of the resolved metric,
/// optionally narrowed to rows matching an entity phrase from the
/// question. Ties keep the first row in input order.
pub fn run(question: &str, dataset: &Dataset) -> Option<Analysis> {
    let extreme = direction(question)?;
    let phrase = entity_phrase(question);

    let mut sections = Vec::new();
    let mut chart = None;
    for sheet in &dataset.sheets {
        if sheet.is_empty() {
            continue;
        }
        let Some(metric) = resolve_metric_column(question, sheet) else {
            continue;
        };

        // Narrow to rows mentioning the entity phrase; when nothing
        // matches the phrase is ignored rather than producing no answer.
        let all_rows: Vec<usize> = (0..sheet.row_count()).collect();
        let (candidates, narrowed) = match &phrase {
            Some(p) => {
                let matching: Vec<usize> = all_rows
                    .iter()
                    .copied()
                    .filter(|&i| row_mentions(sheet, i, p))
                    .collect();
                if matching.is_empty() {
                    (all_rows, None)
                } else {
                    (matching, Some(p.clone()))
                }
            }
            None => (all_rows, None),
        };

        let mut best: Option<(usize, f64)> = None;
        for index in candidates {
            let Some(value) = sheet
                .rows[index]
                .get(&metric)
                .and_then(|cell| cell.as_number())
            else {
                continue;
            };
            match best {
                Some((_, current)) if !extreme.better(value, current) => {}
                _ => best = Some((index, value)),
            }
        }
        let Some((index, value)) = best else {
            debug!(sheet = %sheet.name, column = %metric, "no numeric values for extremum");
            continue;
        };

        let scope = narrowed
            .as_deref()
            .map(|p| format!(" among \"{}\"", p))
            .unwrap_or_default();
        let label = row_label(sheet, index);
        let identifier = identifier_column(sheet);
        let details = row_details(sheet, index, &metric, identifier.as_deref());
        let mut lines = vec![format!(
            "Sheet \"{}\": {} {}{}",
            sheet.name,
            extreme.word(),
            metric,
            scope,
        )];
        let mut line = format!("  {}: {}", label, format_number(value));
        if !details.is_empty() {
            line.push_str(&format!(" ({})", details));
        }
        lines.push(line);
        sections.push(lines.join("\n"));

        if chart.is_none() {
            let mut record = row_record(sheet, &sheet.rows[index]);
            if identifier.is_none() {
                record.insert("Label".to_string(), serde_json::Value::String(label));
            }
            let x_key = identifier.unwrap_or_else(|| "Label".to_string());
            chart = Some(
                ChartPayload::new(
                    ChartType::Bar,
                    format!("{} {}", extreme.title_word(), metric),
                )
                .with_axis_keys(x_key, metric)
                .with_data(vec![record]),
            );
        }
    }
    compose(sections, chart)
}

/// Entity phrase after the last "of" / "for" / "in" / "by", with the
/// leading article and trailing punctuation removed.
fn entity_phrase(question: &str) -> Option<String> {
    let Ok(re) = Regex::new(r"(?i)^.*\b(?:of|for|in|by)\s+(.+)$") else {
        return None;
    };
    let captures = re.captures(question)?;
    let mut phrase = captures
        .get(1)?
        .as_str()
        .trim()
        .trim_end_matches(['?', '.', '!'])
        .trim()
        .to_lowercase();
    for article in ["the ", "a ", "an "] {
        if let Some(rest) = phrase.strip_prefix(article) {
            phrase = rest.trim().to_string();
            break;
        }
    }
    if phrase.is_empty() {
        None
    } else {
        Some(phrase)
    }
}

/// A row mentions the phrase when any textual cell overlaps it: the whole
/// phrase inside the cell, or the cell as a whole word of the phrase
/// ("red" matches "red faction").
fn row_mentions(sheet: &Sheet, index: usize, phrase: &str) -> bool {
    sheet.rows[index].values().any(|cell| {
        if let analyst_types::CellValue::Text(text) = cell {
            let text = text.trim().to_lowercase();
            !text.is_empty() && (text.contains(phrase) || contains_word(phrase, &text))
        } else {
            false
        }
    })
}

/// The row's remaining fields, excluding the metric and identifier.
fn row_details(sheet: &Sheet, index: usize, metric: &str, identifier: Option<&str>) -> String {
    let mut parts = Vec::new();
    for column in &sheet.columns {
        if column == metric || Some(column.as_str()) == identifier {
            continue;
        }
        if let Some(cell) = sheet.cell(index, column) {
            if !cell.is_empty() {
                parts.push(format!("{}: {}", column, cell.as_text()));
            }
        }
    }
    parts.join(", ")
}
