//! Analyst Types - Level 1 Foundation Types
//!
//! This crate contains the pure data structures shared by the tabular analysis
//! engine: the in-memory dataset model, chart payloads, conversation messages,
//! and the model-service configuration and error types.
//!
//! ## Architecture Level: LEVEL 1 (Foundation)
//!
//! This is the bottom layer of the dependency hierarchy. Every other crate in
//! the system depends on this crate; this crate depends on nothing else in the
//! workspace.
//!
//! ## Critical Rules
//!
//! 1. **NO BUSINESS LOGIC** - Only data structures, constructors, and accessors
//! 2. **NO WORKSPACE DEPENDENCIES** - Cannot depend on other workspace crates
//! 3. **SERIALIZABLE** - All types must support serde
//! 4. **THREAD SAFE** - All types should be Send + Sync when possible

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

// ============================================================================
// TABULAR DATA MODEL
// ============================================================================

/// A single cell in a sheet.
///
/// Untagged so that plain JSON scalars deserialize directly: numbers become
/// `Number`, booleans `Bool`, strings `Text`, and `null` becomes `Empty`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    /// Numeric cell (already a JSON number at ingestion time)
    Number(f64),
    /// Boolean cell
    Bool(bool),
    /// Textual cell (may still hold a formatted number, see [`parse_number`])
    Text(String),
    /// Missing or null cell
    Empty,
}

impl CellValue {
    /// Numeric view of the cell, applying the permissive parse to text.
    ///
    /// Booleans and empty cells are not numeric. Cells that fail to parse are
    /// excluded from numeric computations rather than coerced to zero.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) if n.is_finite() => Some(*n),
            CellValue::Number(_) => None,
            CellValue::Text(t) => parse_number(t),
            CellValue::Bool(_) | CellValue::Empty => None,
        }
    }

    /// Display form of the cell.
    pub fn as_text(&self) -> String {
        match self {
            CellValue::Number(n) => n.to_string(),
            CellValue::Bool(b) => b.to_string(),
            CellValue::Text(t) => t.clone(),
            CellValue::Empty => String::new(),
        }
    }

    /// True for missing cells and whitespace-only text.
    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(t) => t.trim().is_empty(),
            _ => false,
        }
    }
}

impl Default for CellValue {
    fn default() -> Self {
        CellValue::Empty
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

/// Permissive numeric parse for formatted cell text.
///
/// Strips currency symbols, percent signs, and thousands-separator commas,
/// then accepts the longest leading `-?digits[.digits]` prefix so values like
/// `"$1,234.50"` and `"42 pts"` still yield a number. Returns `None` when no
/// digits are present or the result is not finite.
pub fn parse_number(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| !matches!(c, '$' | '€' | '£' | '%' | ','))
        .collect();
    let text = cleaned.trim();
    let bytes = text.as_bytes();

    let mut end = 0;
    if matches!(bytes.first(), Some(&b'+') | Some(&b'-')) {
        end = 1;
    }
    let mut digits = 0;
    let mut seen_dot = false;
    while end < bytes.len() {
        match bytes[end] {
            b'0'..=b'9' => digits += 1,
            b'.' if !seen_dot => seen_dot = true,
            _ => break,
        }
        end += 1;
    }
    if digits == 0 {
        return None;
    }
    text[..end].parse::<f64>().ok().filter(|n| n.is_finite())
}

/// A row: column name to cell value.
pub type Row = HashMap<String, CellValue>;

/// One sheet of tabular data.
///
/// `columns` carries the authoritative column order; every "first column"
/// fallback rule in the engine reads it. Rows are uniform by convention but
/// not enforced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sheet {
    /// Sheet name as supplied by the dataset provider
    pub name: String,

    /// Column names in original order
    pub columns: Vec<String>,

    /// Data rows keyed by column name
    #[serde(default)]
    pub rows: Vec<Row>,
}

impl Sheet {
    /// Create an empty sheet with the given column order.
    pub fn new(name: impl Into<String>, columns: Vec<String>) -> Self {
        Self {
            name: name.into(),
            columns,
            rows: Vec::new(),
        }
    }

    /// Append a row.
    pub fn push_row(&mut self, row: Row) {
        self.rows.push(row);
    }

    /// Builder-style row append.
    pub fn with_row(mut self, row: Row) -> Self {
        self.rows.push(row);
        self
    }

    /// Number of data rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// True when the sheet has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Cell at `(row_index, column)`, if present.
    pub fn cell(&self, row_index: usize, column: &str) -> Option<&CellValue> {
        self.rows.get(row_index).and_then(|row| row.get(column))
    }
}

/// The full in-memory dataset: one uploaded file, one or more sheets.
///
/// Sheet order is preserved as supplied by the provider. Loading a new
/// dataset replaces the previous one wholesale; the dataset is an immutable
/// snapshot for the duration of a question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    /// Original file name, used in prompts for context
    pub file_name: String,

    /// Sheets in original workbook order
    pub sheets: Vec<Sheet>,
}

impl Dataset {
    /// Create an empty dataset for the given file name.
    pub fn new(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            sheets: Vec::new(),
        }
    }

    /// Builder-style sheet append.
    pub fn with_sheet(mut self, sheet: Sheet) -> Self {
        self.sheets.push(sheet);
        self
    }

    /// Look up a sheet by name.
    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    /// True when no sheet carries any rows.
    pub fn is_empty(&self) -> bool {
        self.sheets.iter().all(|s| s.is_empty())
    }

    /// Total row count across all sheets.
    pub fn total_rows(&self) -> usize {
        self.sheets.iter().map(|s| s.row_count()).sum()
    }
}

// ============================================================================
// CHART TYPES
// ============================================================================

/// Chart kinds the downstream renderer understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    Bar,
    Line,
    Pie,
    Area,
}

impl ChartType {
    /// Get string representation (matches the wire form)
    pub fn as_str(&self) -> &'static str {
        match self {
            ChartType::Bar => "bar",
            ChartType::Line => "line",
            ChartType::Pie => "pie",
            ChartType::Area => "area",
        }
    }

    /// Get all chart types
    pub fn all() -> Vec<Self> {
        vec![
            ChartType::Bar,
            ChartType::Line,
            ChartType::Pie,
            ChartType::Area,
        ]
    }
}

impl std::fmt::Display for ChartType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A renderable chart specification.
///
/// Field names on the wire follow the renderer's contract: `type`, `title`,
/// `data`, and either `xKey`/`yKey` (axis charts) or `nameKey`/`dataKey`
/// (pie charts).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPayload {
    /// Chart kind
    #[serde(rename = "type")]
    pub chart_type: ChartType,

    /// Human-readable chart title
    #[serde(default)]
    pub title: String,

    /// Flat data records, one per chart point
    #[serde(default)]
    pub data: Vec<serde_json::Map<String, serde_json::Value>>,

    /// Category axis key (bar/line/area)
    #[serde(rename = "xKey", skip_serializing_if = "Option::is_none")]
    pub x_key: Option<String>,

    /// Value axis key (bar/line/area)
    #[serde(rename = "yKey", skip_serializing_if = "Option::is_none")]
    pub y_key: Option<String>,

    /// Slice label key (pie)
    #[serde(rename = "nameKey", skip_serializing_if = "Option::is_none")]
    pub name_key: Option<String>,

    /// Slice value key (pie)
    #[serde(rename = "dataKey", skip_serializing_if = "Option::is_none")]
    pub data_key: Option<String>,
}

impl ChartPayload {
    /// Create an empty chart of the given kind.
    pub fn new(chart_type: ChartType, title: impl Into<String>) -> Self {
        Self {
            chart_type,
            title: title.into(),
            data: Vec::new(),
            x_key: None,
            y_key: None,
            name_key: None,
            data_key: None,
        }
    }

    /// Set the data records.
    pub fn with_data(mut self, data: Vec<serde_json::Map<String, serde_json::Value>>) -> Self {
        self.data = data;
        self
    }

    /// Set axis keys for bar/line/area charts.
    pub fn with_axis_keys(mut self, x_key: impl Into<String>, y_key: impl Into<String>) -> Self {
        self.x_key = Some(x_key.into());
        self.y_key = Some(y_key.into());
        self
    }

    /// Set label/value keys for pie charts.
    pub fn with_slice_keys(
        mut self,
        name_key: impl Into<String>,
        data_key: impl Into<String>,
    ) -> Self {
        self.name_key = Some(name_key.into());
        self.data_key = Some(data_key.into());
        self
    }
}

// ============================================================================
// CONVERSATION MODEL
// ============================================================================

/// Message role
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    User,
    Assistant,
}

impl MessageRole {
    /// Get human-readable role name
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One conversation entry in a session's message log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Stable id, used to address messages from the presentation layer
    pub id: Uuid,

    pub role: MessageRole,

    pub content: String,

    /// Parsed chart spec attached to an assistant reply
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chart: Option<ChartPayload>,

    /// Hidden entries are part of the model conversation but not displayed
    #[serde(default = "default_visible")]
    pub visible: bool,

    /// Presentation-layer override of the chart kind, set after the fact
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chart_type_override: Option<ChartType>,

    pub timestamp: DateTime<Utc>,
}

fn default_visible() -> bool {
    true
}

impl Message {
    /// Create a user message
    pub fn user(content: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role: MessageRole::User,
            content: content.into(),
            chart: None,
            visible: true,
            chart_type_override: None,
            timestamp,
        }
    }

    /// Create an assistant message
    pub fn assistant(content: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role: MessageRole::Assistant,
            content: content.into(),
            chart: None,
            visible: true,
            chart_type_override: None,
            timestamp,
        }
    }

    /// Attach a chart payload
    pub fn with_chart(mut self, chart: ChartPayload) -> Self {
        self.chart = Some(chart);
        self
    }

    /// Mark the message as hidden from display
    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }
}

/// A model reply split into its answer text and optional chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    /// Prose answer shown to the user
    pub text: String,

    /// Chart spec, when the reply carried a valid one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chart: Option<ChartPayload>,
}

impl Answer {
    /// Create a text-only answer
    pub fn text_only(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            chart: None,
        }
    }

    /// Create an answer carrying a chart
    pub fn with_chart(text: impl Into<String>, chart: ChartPayload) -> Self {
        Self {
            text: text.into(),
            chart: Some(chart),
        }
    }
}

// ============================================================================
// MODEL SERVICE CONFIGURATION
// ============================================================================

/// Model service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// API key for the model service
    pub api_key: String,

    /// Model name/version to use
    pub model: String,

    /// Maximum tokens in response
    pub max_tokens: Option<u32>,

    /// Temperature for response generation (0.0 - 1.0)
    pub temperature: Option<f32>,

    /// Request timeout in seconds
    pub timeout_seconds: u64,
}

impl ModelConfig {
    /// Default model id when `GEMINI_MODEL` is unset
    pub const DEFAULT_MODEL: &'static str = "gemini-2.0-flash";
    /// Low temperature keeps replies stable across identical prompts
    pub const DEFAULT_TEMPERATURE: f32 = 0.2;
    /// Output token cap for analysis replies
    pub const DEFAULT_MAX_TOKENS: u32 = 1024;

    /// Create new model configuration
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            max_tokens: Some(Self::DEFAULT_MAX_TOKENS),
            temperature: Some(Self::DEFAULT_TEMPERATURE),
            timeout_seconds: 30,
        }
    }

    /// Read configuration from `GEMINI_API_KEY` / `GEMINI_MODEL`
    pub fn from_env() -> Self {
        Self::default()
    }

    /// Set maximum tokens
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Set temperature
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set timeout
    pub fn with_timeout(mut self, timeout_seconds: u64) -> Self {
        self.timeout_seconds = timeout_seconds;
        self
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            api_key: std::env::var("GEMINI_API_KEY").unwrap_or_default(),
            model: std::env::var("GEMINI_MODEL")
                .unwrap_or_else(|_| Self::DEFAULT_MODEL.to_string()),
            max_tokens: Some(Self::DEFAULT_MAX_TOKENS),
            temperature: Some(Self::DEFAULT_TEMPERATURE),
            timeout_seconds: 30,
        }
    }
}

// ============================================================================
// MODEL SERVICE ERRORS
// ============================================================================

/// Errors that can occur talking to the model service
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("HTTP request failed: {0}")]
    HttpError(String),

    #[error("JSON parsing error: {0}")]
    JsonError(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Authentication error: missing or invalid API key")]
    AuthenticationError,

    #[error("Rate limit exceeded")]
    RateLimitError,

    #[error("Model service timeout")]
    TimeoutError,

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Network error: {0}")]
    NetworkError(String),
}

impl ModelError {
    /// Create HTTP error
    pub fn http(message: impl Into<String>) -> Self {
        Self::HttpError(message.into())
    }

    /// Create JSON error
    pub fn json(message: impl Into<String>) -> Self {
        Self::JsonError(message.into())
    }

    /// Create API error
    pub fn api(message: impl Into<String>) -> Self {
        Self::ApiError(message.into())
    }

    /// Create invalid response error
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::InvalidResponse(message.into())
    }

    /// Create configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::ConfigurationError(message.into())
    }

    /// Create network error
    pub fn network(message: impl Into<String>) -> Self {
        Self::NetworkError(message.into())
    }
}

/// Result type for model service operations
pub type ModelResult<T> = Result<T, ModelError>;

// ============================================================================
// TESTS
// ============================================================================
