//! Intent Routing
//!
//! Classifies a question into an analytical intent and runs the matching
//! deterministic handler. Routing is an ordered rule table scanned top to
//! bottom; the first rule whose predicate holds and whose handler applies
//! to the dataset wins. The order is part of the contract:
//!
//! 1. **Condition filter** - an explicit comparison ("Attack above 20") is
//!    the strongest structural signal and outranks everything else
//! 2. **Top-N / Bottom-N** - explicit ranked subsets with a digit count
//! 3. **Extremum** - superlatives without a count
//! 4. **Filter** - filter keyword family
//! 5. **Aggregate / Compare / Trend / Sort** - keyword families
//! 6. **NoPreprocess** - nothing matched; the model answers from the raw
//!    context preview alone
//!
//! A matched rule whose handler finds nothing applicable in the dataset
//! falls through to the remaining rules rather than ending the scan.
//!
//! One request shape bypasses the table: a chart-only request ("make a
//! pie chart") with no analytical phrasing routes straight to
//! `NoPreprocess`, leaving chart construction entirely to the model.

use analyst_types::Dataset;
use tracing::debug;

use crate::conditions::extract_condition;
use crate::handlers::{aggregate, compare, extremum, filter, ranking, sort, trend, Analysis};

// ============================================================================
// Intents
// ============================================================================

/// Analytical intents the router distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    ConditionFilter,
    TopN,
    BottomN,
    Extremum,
    Filter,
    Aggregate,
    Compare,
    Trend,
    Sort,
    NoPreprocess,
}

/// Routing outcome: the winning intent plus its handler result.
/// `analysis` is `None` exactly when the intent is `NoPreprocess`.
#[derive(Debug, Clone, PartialEq)]
pub struct Routed {
    pub intent: Intent,
    pub analysis: Option<Analysis>,
}

// ============================================================================
// Keyword Families
// ============================================================================

const CHART_KEYWORDS: &[&str] = &[
    "chart", "graph", "plot", "visualize", "visualise", "diagram",
];
const FILTER_KEYWORDS: &[&str] = &["filter", "where", "only", "show all", "containing"];
const AGGREGATE_KEYWORDS: &[&str] = &["sum", "total", "average", "mean", "aggregate", "statistics"];
const COMPARE_KEYWORDS: &[&str] = &["compare", "vs", "versus", "between", "by category", "by group"];
const TREND_KEYWORDS: &[&str] = &["trend", "over time", "growth", "change", "timeline"];
const SORT_KEYWORDS: &[&str] = &["sort", "order", "rank", "arrange"];

// ============================================================================
// Rule Table
// ============================================================================

type Predicate = fn(&str, &Dataset) -> bool;
type Handler = fn(&str, &Dataset) -> Option<Analysis>;

/// The routing contract, scanned top to bottom.
const RULES: &[(Intent, Predicate, Handler)] = &[
    (Intent::ConditionFilter, has_condition, handle_condition),
    (Intent::TopN, wants_top_n, handle_top_n),
    (Intent::BottomN, wants_bottom_n, handle_bottom_n),
    (Intent::Extremum, wants_extremum, extremum::run),
    (Intent::Filter, wants_filter, filter::by_terms),
    (Intent::Aggregate, wants_aggregate, aggregate::run),
    (Intent::Compare, wants_compare, compare::run),
    (Intent::Trend, wants_trend, trend::run),
    (Intent::Sort, wants_sort, sort::run),
];

/// Classify and preprocess a question. Pure and synchronous; identical
/// inputs always route identically.
pub fn route(question: &str, dataset: &Dataset) -> Routed {
    if chart_only_request(question, dataset) {
        debug!("chart-only request, leaving analysis to the model");
        return Routed {
            intent: Intent::NoPreprocess,
            analysis: None,
        };
    }

    for (intent, predicate, handler) in RULES {
        if !predicate(question, dataset) {
            continue;
        }
        if let Some(analysis) = handler(question, dataset) {
            debug!(intent = ?intent, "routed question");
            return Routed {
                intent: *intent,
                analysis: Some(analysis),
            };
        }
        debug!(intent = ?intent, "rule matched but handler was inapplicable");
    }

    Routed {
        intent: Intent::NoPreprocess,
        analysis: None,
    }
}

// ============================================================================
// Predicates And Handler Shims
// ============================================================================

/// Union of all sheet headers in input order, de-duplicated.
fn all_headers(dataset: &Dataset) -> Vec<String> {
    let mut headers = Vec::new();
    for sheet in &dataset.sheets {
        for column in &sheet.columns {
            if !headers.contains(column) {
                headers.push(column.clone());
            }
        }
    }
    headers
}

fn has_condition(question: &str, dataset: &Dataset) -> bool {
    extract_condition(question, &all_headers(dataset)).is_some()
}

fn handle_condition(question: &str, dataset: &Dataset) -> Option<Analysis> {
    let condition = extract_condition(question, &all_headers(dataset))?;
    filter::by_condition(&condition, dataset)
}

fn wants_top_n(question: &str, _dataset: &Dataset) -> bool {
    ranking::requested_count(question, ranking::Direction::Top).is_some()
}

fn handle_top_n(question: &str, dataset: &Dataset) -> Option<Analysis> {
    ranking::run(question, dataset, ranking::Direction::Top)
}

fn wants_bottom_n(question: &str, _dataset: &Dataset) -> bool {
    ranking::requested_count(question, ranking::Direction::Bottom).is_some()
}

fn handle_bottom_n(question: &str, dataset: &Dataset) -> Option<Analysis> {
    ranking::run(question, dataset, ranking::Direction::Bottom)
}

/// Superlatives only count when no explicit top/bottom count is present;
/// a failed "top 3" request must not degrade into a single-row answer.
fn wants_extremum(question: &str, _dataset: &Dataset) -> bool {
    extremum::direction(question).is_some()
        && ranking::requested_count(question, ranking::Direction::Top).is_none()
        && ranking::requested_count(question, ranking::Direction::Bottom).is_none()
}

fn wants_filter(question: &str, _dataset: &Dataset) -> bool {
    contains_any(question, FILTER_KEYWORDS)
}

fn wants_aggregate(question: &str, _dataset: &Dataset) -> bool {
    contains_any(question, AGGREGATE_KEYWORDS)
}

fn wants_compare(question: &str, _dataset: &Dataset) -> bool {
    contains_any(question, COMPARE_KEYWORDS)
}

fn wants_trend(question: &str, _dataset: &Dataset) -> bool {
    contains_any(question, TREND_KEYWORDS)
}

fn wants_sort(question: &str, _dataset: &Dataset) -> bool {
    contains_any(question, SORT_KEYWORDS)
}

/// Chart keyword present with no analytical phrasing at all.
fn chart_only_request(question: &str, dataset: &Dataset) -> bool {
    if !contains_any(question, CHART_KEYWORDS) {
        return false;
    }
    let analytic = has_condition(question, dataset)
        || wants_top_n(question, dataset)
        || wants_bottom_n(question, dataset)
        || extremum::direction(question).is_some()
        || contains_any(question, FILTER_KEYWORDS)
        || contains_any(question, AGGREGATE_KEYWORDS)
        || contains_any(question, COMPARE_KEYWORDS)
        || contains_any(question, TREND_KEYWORDS)
        || contains_any(question, SORT_KEYWORDS);
    !analytic
}

fn contains_any(question: &str, keywords: &[&str]) -> bool {
    let question_lower = question.to_lowercase();
    keywords.iter().any(|k| question_lower.contains(k))
}

// ============================================================================
// Tests
// ============================================================================
