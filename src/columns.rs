//! Column Resolution - deterministic, total, no model calls
//!
//! Maps a free-text question onto concrete sheet columns:
//!
//! 1. **Direct mention** - column name appears as a substring of the question
//! 2. **Synonym table** - "cost" → a column containing "price", etc.
//! 3. **First numeric column** - any column with at least one parseable value
//! 4. **First column** - last resort so resolution never dangles
//!
//! The same module owns row-identifier resolution (for row labels in
//! summaries and charts) and the numeric/date column probes. Everything
//! here is a pure function of `(question, sheet)`; identical inputs always
//! resolve identically.

use analyst_types::{CellValue, Sheet};
use chrono::NaiveDate;

// ============================================================================
// Synonym And Fragment Tables
// ============================================================================

/// Question phrasings mapped to the canonical column term they imply.
/// Scanned in order; the first entry whose phrasing occurs in the question
/// and whose canonical term occurs in a column name wins.
const METRIC_SYNONYMS: &[(&str, &[&str])] = &[
    ("attack", &["attack", "atk"]),
    ("defense", &["defense", "defence", "def"]),
    ("sales", &["sales", "sold"]),
    ("revenue", &["revenue"]),
    ("price", &["price", "cost"]),
    ("profit", &["profit"]),
    ("score", &["score", "points"]),
    ("amount", &["amount", "quantity", "qty"]),
    ("age", &["age"]),
    ("salary", &["salary", "wage", "pay"]),
    ("rating", &["rating", "stars"]),
    ("total", &["total"]),
];

/// Name fragments that mark a column as a row identifier, in priority order.
const IDENTIFIER_FRAGMENTS: &[&str] = &["name", "id", "title", "label", "key"];

/// Date formats tried in order after RFC 3339.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%d-%m-%Y",
    "%b %d, %Y",
    "%B %d, %Y",
];

/// Four-digit values outside this range are numbers, not years.
const YEAR_RANGE: std::ops::RangeInclusive<i32> = 1900..=2100;

// ============================================================================
// Metric Column Resolution
// ============================================================================

/// Resolve the column a question is asking about. Total: returns `None`
/// only for a sheet with zero columns.
pub fn resolve_metric_column(question: &str, sheet: &Sheet) -> Option<String> {
    if let Some(column) = named_metric_column(question, sheet) {
        return Some(column);
    }

    // ── Strategy 3: first numeric column ────────────────────────────────
    if let Some(column) = first_numeric_column(sheet) {
        return Some(column);
    }

    // ── Strategy 4: first column ────────────────────────────────────────
    sheet.columns.first().cloned()
}

/// Resolve only when the question actually names a column, directly or via
/// a synonym. Used where "the question mentions a metric" is the signal
/// itself, e.g. picking the value column of a comparison.
pub fn named_metric_column(question: &str, sheet: &Sheet) -> Option<String> {
    let question_lower = question.to_lowercase();

    // ── Strategy 1: direct mention ──────────────────────────────────────
    for column in &sheet.columns {
        if !column.is_empty() && question_lower.contains(&column.to_lowercase()) {
            return Some(column.clone());
        }
    }

    // ── Strategy 2: synonym table ───────────────────────────────────────
    for (canonical, phrasings) in METRIC_SYNONYMS {
        if !phrasings.iter().any(|p| contains_word(&question_lower, p)) {
            continue;
        }
        for column in &sheet.columns {
            if column.to_lowercase().contains(canonical) {
                return Some(column.clone());
            }
        }
    }

    None
}

// ============================================================================
// Column Probes
// ============================================================================

/// A column is numeric when at least one of its cells parses as a number.
pub fn is_numeric_column(sheet: &Sheet, column: &str) -> bool {
    sheet
        .rows
        .iter()
        .filter_map(|row| row.get(column))
        .any(|cell| cell.as_number().is_some())
}

/// First numeric column in sheet order.
pub fn first_numeric_column(sheet: &Sheet) -> Option<String> {
    sheet
        .columns
        .iter()
        .find(|c| is_numeric_column(sheet, c))
        .cloned()
}

/// A column holds dates when more than half of its non-empty cells parse
/// as one. Four-digit integers in a plausible year range count; the probe
/// is a heuristic and treated as such by callers.
pub fn is_date_column(sheet: &Sheet, column: &str) -> bool {
    let mut non_empty = 0usize;
    let mut parsed = 0usize;
    for row in &sheet.rows {
        let Some(cell) = row.get(column) else { continue };
        if cell.is_empty() {
            continue;
        }
        non_empty += 1;
        if cell_date(cell).is_some() {
            parsed += 1;
        }
    }
    non_empty > 0 && parsed * 2 > non_empty
}

/// First date-like column in sheet order.
pub fn first_date_column(sheet: &Sheet) -> Option<String> {
    sheet
        .columns
        .iter()
        .find(|c| is_date_column(sheet, c))
        .cloned()
}

// ============================================================================
// Row Identifiers
// ============================================================================

/// Column used to label rows in summaries and charts: first column whose
/// name contains an identifier fragment, else the first non-numeric column.
pub fn identifier_column(sheet: &Sheet) -> Option<String> {
    for fragment in IDENTIFIER_FRAGMENTS {
        for column in &sheet.columns {
            if column.to_lowercase().contains(fragment) {
                return Some(column.clone());
            }
        }
    }
    sheet
        .columns
        .iter()
        .find(|c| !is_numeric_column(sheet, c))
        .cloned()
}

/// Human-readable label for a row. Never fails: falls back to a positional
/// `Row N` placeholder when no identifier column or value exists.
pub fn row_label(sheet: &Sheet, row_index: usize) -> String {
    if let Some(column) = identifier_column(sheet) {
        if let Some(cell) = sheet.cell(row_index, &column) {
            let text = cell.as_text();
            if !text.trim().is_empty() {
                return text;
            }
        }
    }
    format!("Row {}", row_index + 1)
}

// ============================================================================
// Date Parsing
// ============================================================================

/// Parse a date from cell text against the fixed format list.
/// First format that parses wins.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let text = raw.trim();
    if text.is_empty() {
        return None;
    }
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(text) {
        return Some(dt.date_naive());
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            return Some(date);
        }
    }
    parse_year_month(text).or_else(|| parse_bare_year(text))
}

/// Date view of a cell. Integral numbers in the year range are treated as
/// bare years so "Year" columns chart chronologically.
pub fn cell_date(cell: &CellValue) -> Option<NaiveDate> {
    match cell {
        CellValue::Text(t) => parse_date(t),
        CellValue::Number(n) if n.fract() == 0.0 && YEAR_RANGE.contains(&(*n as i32)) => {
            NaiveDate::from_ymd_opt(*n as i32, 1, 1)
        }
        _ => None,
    }
}

/// `YYYY-MM` month stamps, pinned to the first of the month.
fn parse_year_month(text: &str) -> Option<NaiveDate> {
    let (year, month) = text.split_once('-')?;
    if year.len() != 4 || month.is_empty() || month.len() > 2 {
        return None;
    }
    if !year.chars().all(|c| c.is_ascii_digit()) || !month.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, 1)
}

/// Bare four-digit years within [`YEAR_RANGE`], pinned to January 1.
fn parse_bare_year(text: &str) -> Option<NaiveDate> {
    if text.len() != 4 || !text.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let year: i32 = text.parse().ok()?;
    if !YEAR_RANGE.contains(&year) {
        return None;
    }
    NaiveDate::from_ymd_opt(year, 1, 1)
}

// ============================================================================
// Word Matching
// ============================================================================

/// Whole-word containment: `needle` occurs in `haystack` with no adjacent
/// alphanumeric characters. Keeps "age" from firing inside "average".
/// Both arguments are expected lower-cased by the caller.
pub(crate) fn contains_word(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return false;
    }
    // Retry offset must stay on a char boundary; the needle can start
    // with a multi-byte character when it comes from cell text.
    let step = needle.chars().next().map_or(1, char::len_utf8);
    let mut start = 0;
    while let Some(pos) = haystack[start..].find(needle) {
        let abs = start + pos;
        let end = abs + needle.len();
        let before_ok = !haystack[..abs]
            .chars()
            .next_back()
            .is_some_and(|c| c.is_alphanumeric());
        let after_ok = !haystack[end..]
            .chars()
            .next()
            .is_some_and(|c| c.is_alphanumeric());
        if before_ok && after_ok {
            return true;
        }
        start = abs + step;
    }
    false
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use analyst_types::Row;

    fn row(pairs: &[(&str, CellValue)]) -> Row {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn units_sheet() -> Sheet {
        Sheet::new(
            "Units",
            vec![
                "Name".to_string(),
                "Attack".to_string(),
                "Defense".to_string(),
            ],
        )
        .with_row(row(&[
            ("Name", CellValue::from("A")),
            ("Attack", CellValue::Number(10.0)),
            ("Defense", CellValue::Number(5.0)),
        ]))
        .with_row(row(&[
            ("Name", CellValue::from("B")),
            ("Attack", CellValue::Number(50.0)),
            ("Defense", CellValue::Number(8.0)),
        ]))
    }

    // ── resolve_metric_column ───────────────────────────────────────────

    #[test]
    fn test_resolve_direct_mention() {
        let sheet = units_sheet();
        assert_eq!(
            resolve_metric_column("top 3 by attack", &sheet),
            Some("Attack".to_string())
        );
        assert_eq!(
            resolve_metric_column("sort by Defense descending", &sheet),
            Some("Defense".to_string())
        );
    }

    #[test]
    fn test_resolve_first_direct_mention_wins() {
        // Both columns appear; column order decides, not question order.
        let sheet = units_sheet();
        assert_eq!(
            resolve_metric_column("compare defense and attack", &sheet),
            Some("Attack".to_string())
        );
    }

    #[test]
    fn test_resolve_synonym() {
        let sheet = units_sheet();
        assert_eq!(
            resolve_metric_column("which unit has the best atk", &sheet),
            Some("Attack".to_string())
        );

        let prices = Sheet::new(
            "Products",
            vec!["Product Name".to_string(), "Price".to_string()],
        )
        .with_row(row(&[
            ("Product Name", CellValue::from("Widget")),
            ("Price", CellValue::Number(9.5)),
        ]));
        assert_eq!(
            resolve_metric_column("what is the average cost", &prices),
            Some("Price".to_string())
        );
    }

    #[test]
    fn test_resolve_synonym_respects_word_boundaries() {
        let sheet = Sheet::new(
            "People",
            vec![
                "Person".to_string(),
                "Mileage".to_string(),
                "Salary".to_string(),
            ],
        )
        .with_row(row(&[
            ("Person", CellValue::from("X")),
            ("Mileage", CellValue::Number(1200.0)),
            ("Salary", CellValue::Number(30000.0)),
        ]));
        // "average" must not trigger the "age" synonym (which would land
        // on Mileage); "pay" routes to Salary.
        assert_eq!(
            resolve_metric_column("what is the average pay", &sheet),
            Some("Salary".to_string())
        );
    }

    #[test]
    fn test_resolve_numeric_fallback() {
        let sheet = units_sheet();
        // Nothing named: first numeric column.
        assert_eq!(
            resolve_metric_column("give me the rundown", &sheet),
            Some("Attack".to_string())
        );
    }

    #[test]
    fn test_resolve_first_column_fallback_and_empty() {
        let text_only = Sheet::new(
            "Notes",
            vec!["Comment".to_string(), "Author".to_string()],
        )
        .with_row(row(&[
            ("Comment", CellValue::from("hello")),
            ("Author", CellValue::from("ann")),
        ]));
        assert_eq!(
            resolve_metric_column("anything at all", &text_only),
            Some("Comment".to_string())
        );

        let bare = Sheet::new("Empty", vec![]);
        assert_eq!(resolve_metric_column("anything", &bare), None);
    }

    #[test]
    fn test_named_metric_column_is_strict() {
        let sheet = units_sheet();
        assert_eq!(named_metric_column("whatever really", &sheet), None);
        assert_eq!(
            named_metric_column("attack stats", &sheet),
            Some("Attack".to_string())
        );
    }

    // ── probes ──────────────────────────────────────────────────────────

    #[test]
    fn test_numeric_probe() {
        let sheet = units_sheet();
        assert!(is_numeric_column(&sheet, "Attack"));
        assert!(!is_numeric_column(&sheet, "Name"));
        assert_eq!(first_numeric_column(&sheet), Some("Attack".to_string()));
    }

    #[test]
    fn test_numeric_probe_formatted_text() {
        let sheet = Sheet::new("S", vec!["Cost".to_string()])
            .with_row(row(&[("Cost", CellValue::from("$1,200"))]))
            .with_row(row(&[("Cost", CellValue::from("n/a"))]));
        assert!(is_numeric_column(&sheet, "Cost"));
    }

    #[test]
    fn test_date_probe() {
        let sheet = Sheet::new("S", vec!["Month".to_string(), "Sales".to_string()])
            .with_row(row(&[
                ("Month", CellValue::from("2024-01")),
                ("Sales", CellValue::Number(100.0)),
            ]))
            .with_row(row(&[
                ("Month", CellValue::from("2024-02")),
                ("Sales", CellValue::Number(120.0)),
            ]))
            .with_row(row(&[
                ("Month", CellValue::from("n/a")),
                ("Sales", CellValue::Number(90.0)),
            ]));
        assert!(is_date_column(&sheet, "Month"));
        // 100/120/90 are outside the year range.
        assert!(!is_date_column(&sheet, "Sales"));
        assert_eq!(first_date_column(&sheet), Some("Month".to_string()));
    }

    // ── identifiers ─────────────────────────────────────────────────────

    #[test]
    fn test_identifier_fragment_priority() {
        let sheet = Sheet::new(
            "S",
            vec!["Key".to_string(), "Title".to_string()],
        );
        // "title" outranks "key" in fragment order.
        assert_eq!(identifier_column(&sheet), Some("Title".to_string()));
    }

    #[test]
    fn test_identifier_falls_back_to_non_numeric() {
        let sheet = Sheet::new(
            "S",
            vec!["Attack".to_string(), "Faction".to_string()],
        )
        .with_row(row(&[
            ("Attack", CellValue::Number(10.0)),
            ("Faction", CellValue::from("red")),
        ]));
        assert_eq!(identifier_column(&sheet), Some("Faction".to_string()));
    }

    #[test]
    fn test_row_label_placeholder() {
        let sheet = Sheet::new("S", vec!["Attack".to_string()])
            .with_row(row(&[("Attack", CellValue::Number(10.0))]));
        assert_eq!(row_label(&sheet, 0), "Row 1");

        let named = units_sheet();
        assert_eq!(row_label(&named, 1), "B");
        assert_eq!(row_label(&named, 99), "Row 100");
    }

    // ── dates ───────────────────────────────────────────────────────────

    #[test]
    fn test_parse_date_formats() {
        let expect = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        assert_eq!(parse_date("2024-03-15"), Some(expect));
        assert_eq!(parse_date("2024/03/15"), Some(expect));
        assert_eq!(parse_date("03/15/2024"), Some(expect));
        assert_eq!(parse_date("15-03-2024"), Some(expect));
        assert_eq!(parse_date("Mar 15, 2024"), Some(expect));
        assert_eq!(parse_date("March 15, 2024"), Some(expect));
        assert_eq!(parse_date("2024-03-15T08:30:00Z"), Some(expect));

        assert_eq!(
            parse_date("2024-03"),
            NaiveDate::from_ymd_opt(2024, 3, 1)
        );
        assert_eq!(parse_date("2024"), NaiveDate::from_ymd_opt(2024, 1, 1));
        assert_eq!(parse_date("1234"), None);
        assert_eq!(parse_date("not a date"), None);
        assert_eq!(parse_date(""), None);
    }

    #[test]
    fn test_cell_date_numeric_years() {
        assert!(cell_date(&CellValue::Number(2021.0)).is_some());
        assert!(cell_date(&CellValue::Number(2021.5)).is_none());
        assert!(cell_date(&CellValue::Number(250.0)).is_none());
        assert!(cell_date(&CellValue::from("2021-06-01")).is_some());
    }

    // ── contains_word ───────────────────────────────────────────────────

    #[test]
    fn test_contains_word() {
        assert!(contains_word("average age of players", "age"));
        assert!(!contains_word("average rating", "age"));
        assert!(contains_word("top atk units", "atk"));
        assert!(!contains_word("attacking now", "atk"));
        assert!(contains_word("age", "age"));
        assert!(!contains_word("", "age"));
    }

    #[test]
    fn test_contains_word_multibyte_needle() {
        // Needles taken from cell text can start with a multi-byte
        // character; the mid-word retry must step over it, not into it.
        assert!(!contains_word("xémile", "émile"));
        assert!(contains_word("xémile émile", "émile"));
        assert!(contains_word("for émile", "émile"));
    }
}
