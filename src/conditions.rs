//! Numeric Condition Extraction
//!
//! Turns phrasings like "Attack above 20" or "price <= 100" into a
//! structured `(column, operator, threshold)` triple. The scan is purely
//! structural, first match wins, with a fixed nesting order:
//!
//! 1. headers, in the order supplied
//! 2. operators: `>=`, `<=`, `>`, `<`, `==` (compound before simple so
//!    `>=` is never shadowed by `>`)
//! 3. synonyms, in table order
//! 4. word orders: `<header> <op> <number>`, then `<op> <number> <header>`
//!
//! Word-form synonyms match on word boundaries; symbol forms match
//! literally with optional whitespace. Identical `(question, headers)`
//! inputs always yield the identical result.

use std::fmt;

use analyst_types::CellValue;
use regex::Regex;

// ============================================================================
// Comparison Operators
// ============================================================================

/// A numeric comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Ge,
    Le,
    Gt,
    Lt,
    Eq,
}

impl CompareOp {
    /// Apply the operator to `lhs <op> rhs`.
    pub fn evaluate(&self, lhs: f64, rhs: f64) -> bool {
        match self {
            CompareOp::Ge => lhs >= rhs,
            CompareOp::Le => lhs <= rhs,
            CompareOp::Gt => lhs > rhs,
            CompareOp::Lt => lhs < rhs,
            CompareOp::Eq => lhs == rhs,
        }
    }

    /// Symbolic form, used in summaries.
    pub fn as_str(&self) -> &'static str {
        match self {
            CompareOp::Ge => ">=",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Lt => "<",
            CompareOp::Eq => "==",
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Phrasings for each operator. Compound operators come first so their
/// symbol forms are tried before the bare `>` / `<` / `=` they contain.
const OPERATOR_SYNONYMS: &[(CompareOp, &[&str])] = &[
    (
        CompareOp::Ge,
        &["at least", "no less than", "greater than or equal to", ">="],
    ),
    (
        CompareOp::Le,
        &["at most", "no more than", "less than or equal to", "<="],
    ),
    (
        CompareOp::Gt,
        &["greater than", "more than", "above", "over", "exceeding", ">"],
    ),
    (
        CompareOp::Lt,
        &["less than", "fewer than", "below", "under", "<"],
    ),
    (CompareOp::Eq, &["equal to", "equals", "exactly", "==", "="]),
];

// ============================================================================
// Numeric Conditions
// ============================================================================

/// A filter predicate over one column: `column <op> value`.
#[derive(Debug, Clone, PartialEq)]
pub struct NumericCondition {
    pub column: String,
    pub op: CompareOp,
    pub value: f64,
}

impl NumericCondition {
    /// True when the cell parses as a number satisfying the condition.
    /// Unparseable cells never match.
    pub fn matches(&self, cell: &CellValue) -> bool {
        cell.as_number()
            .is_some_and(|n| self.op.evaluate(n, self.value))
    }
}

impl fmt::Display for NumericCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.column, self.op, self.value)
    }
}

// ============================================================================
// Extraction
// ============================================================================

/// Scan a question for a numeric condition against any of the given
/// headers. Returns the first structural match in the documented scan
/// order, or `None` when no header/operator/number triple is present.
pub fn extract_condition(question: &str, headers: &[String]) -> Option<NumericCondition> {
    for header in headers {
        if header.is_empty() {
            continue;
        }
        for (op, synonyms) in OPERATOR_SYNONYMS {
            for synonym in *synonyms {
                let value = match_header_first(question, header, synonym)
                    .or_else(|| match_value_first(question, header, synonym));
                if let Some(value) = value {
                    return Some(NumericCondition {
                        column: header.clone(),
                        op: *op,
                        value,
                    });
                }
            }
        }
    }
    None
}

/// `<header> <op> <number>`, e.g. "Attack above 20", "price <= 100".
fn match_header_first(question: &str, header: &str, synonym: &str) -> Option<f64> {
    let pattern = if is_symbolic(synonym) {
        format!(
            r"(?i){}\s*{}\s*\$?(-?\d+(?:\.\d+)?)",
            word_pattern(header),
            regex::escape(synonym),
        )
    } else {
        format!(
            r"(?i){}\s+(?:(?:is|are|was|were)\s+)?{}\s+\$?(-?\d+(?:\.\d+)?)",
            word_pattern(header),
            word_pattern(synonym),
        )
    };
    capture_number(question, &pattern)
}

/// `<op> <number> <header>`, e.g. "at least 50 sales", "over $100 in price".
fn match_value_first(question: &str, header: &str, synonym: &str) -> Option<f64> {
    let synonym_pattern = if is_symbolic(synonym) {
        regex::escape(synonym)
    } else {
        word_pattern(synonym)
    };
    let pattern = format!(
        r"(?i){}\s*\$?(-?\d+(?:\.\d+)?)\s+(?:(?:in|on|for|of)\s+)?{}",
        synonym_pattern,
        word_pattern(header),
    );
    capture_number(question, &pattern)
}

fn capture_number(question: &str, pattern: &str) -> Option<f64> {
    let Ok(re) = Regex::new(pattern) else {
        return None;
    };
    re.captures(question)?.get(1)?.as_str().parse().ok()
}

/// Escape text for use in a pattern, adding `\b` guards only where the
/// text starts/ends with a word character (a `\b` next to punctuation
/// like `>` would never match).
fn word_pattern(text: &str) -> String {
    let mut pattern = String::new();
    if text.chars().next().is_some_and(|c| c.is_alphanumeric()) {
        pattern.push_str(r"\b");
    }
    pattern.push_str(&regex::escape(text));
    if text.chars().next_back().is_some_and(|c| c.is_alphanumeric()) {
        pattern.push_str(r"\b");
    }
    pattern
}

fn is_symbolic(synonym: &str) -> bool {
    !synonym.chars().any(|c| c.is_alphabetic())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    // ── extract_condition ───────────────────────────────────────────────

    #[test]
    fn test_extract_word_operator() {
        let cond = extract_condition(
            "show units with Attack above 20",
            &headers(&["Name", "Attack"]),
        )
        .unwrap();
        assert_eq!(cond.column, "Attack");
        assert_eq!(cond.op, CompareOp::Gt);
        assert_eq!(cond.value, 20.0);
    }

    #[test]
    fn test_extract_symbol_operator() {
        let cond = extract_condition("price <= 100", &headers(&["price"])).unwrap();
        assert_eq!(cond.op, CompareOp::Le);
        assert_eq!(cond.value, 100.0);

        let tight = extract_condition("price<=100", &headers(&["price"])).unwrap();
        assert_eq!(tight.op, CompareOp::Le);
    }

    #[test]
    fn test_compound_not_shadowed_by_simple() {
        let cond = extract_condition("defense >= 30", &headers(&["defense"])).unwrap();
        assert_eq!(cond.op, CompareOp::Ge);

        let cond = extract_condition("defense > 30", &headers(&["defense"])).unwrap();
        assert_eq!(cond.op, CompareOp::Gt);
    }

    #[test]
    fn test_extract_value_before_header() {
        let cond = extract_condition(
            "anything with at least 50 sales",
            &headers(&["Sales"]),
        )
        .unwrap();
        assert_eq!(cond.column, "Sales");
        assert_eq!(cond.op, CompareOp::Ge);
        assert_eq!(cond.value, 50.0);

        let cond = extract_condition("over $100 in price", &headers(&["Price"])).unwrap();
        assert_eq!(cond.op, CompareOp::Gt);
        assert_eq!(cond.value, 100.0);
    }

    #[test]
    fn test_extract_linking_verb_and_decimal() {
        let cond = extract_condition(
            "rows where Cost is exactly 19.99",
            &headers(&["Cost"]),
        )
        .unwrap();
        assert_eq!(cond.op, CompareOp::Eq);
        assert_eq!(cond.value, 19.99);
    }

    #[test]
    fn test_extract_header_scan_order() {
        let cond = extract_condition(
            "defense above 20 and attack above 10",
            &headers(&["Attack", "Defense"]),
        )
        .unwrap();
        // Headers are scanned in input order, so Attack wins even though
        // defense appears first in the sentence.
        assert_eq!(cond.column, "Attack");
        assert_eq!(cond.value, 10.0);
    }

    #[test]
    fn test_extract_none_without_operator() {
        assert_eq!(
            extract_condition("top 5 by attack", &headers(&["Attack"])),
            None
        );
        assert_eq!(
            extract_condition("show everything", &headers(&["Attack"])),
            None
        );
        assert_eq!(extract_condition("attack above 20", &[]), None);
    }

    #[test]
    fn test_extract_is_pure() {
        let hs = headers(&["Attack"]);
        let a = extract_condition("attack under 15", &hs);
        let b = extract_condition("attack under 15", &hs);
        assert_eq!(a, b);
        assert_eq!(a.unwrap().op, CompareOp::Lt);
    }

    // ── NumericCondition ────────────────────────────────────────────────

    #[test]
    fn test_condition_matches_cells() {
        let cond = NumericCondition {
            column: "Attack".to_string(),
            op: CompareOp::Gt,
            value: 20.0,
        };
        assert!(cond.matches(&CellValue::Number(25.0)));
        assert!(!cond.matches(&CellValue::Number(20.0)));
        assert!(cond.matches(&CellValue::from("$25")));
        assert!(!cond.matches(&CellValue::from("n/a")));
        assert!(!cond.matches(&CellValue::Empty));
    }

    #[test]
    fn test_condition_display() {
        let cond = NumericCondition {
            column: "Attack".to_string(),
            op: CompareOp::Gt,
            value: 20.0,
        };
        assert_eq!(cond.to_string(), "Attack > 20");
    }

    #[test]
    fn test_compare_op_evaluate() {
        assert!(CompareOp::Ge.evaluate(5.0, 5.0));
        assert!(CompareOp::Le.evaluate(4.0, 5.0));
        assert!(CompareOp::Gt.evaluate(6.0, 5.0));
        assert!(!CompareOp::Gt.evaluate(5.0, 5.0));
        assert!(CompareOp::Lt.evaluate(4.0, 5.0));
        assert!(CompareOp::Eq.evaluate(5.0, 5.0));
    }
}
