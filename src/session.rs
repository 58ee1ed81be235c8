//! Analysis Session
//!
//! Owns the loaded dataset, the conversation log, and the model handle,
//! and runs the full question pipeline: route, preprocess, prompt, one
//! model call, parse, append. `ask` takes `&mut self`, so a second
//! question cannot start while one is in flight.
//!
//! Upstream model failures are converted into visible assistant-style
//! error messages rather than propagated; the only hard error a caller
//! sees from `ask` is asking before any dataset was loaded.

use std::sync::Arc;

use analyst_types::{ChartPayload, ChartType, Dataset, Message};
use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::ai::AnalysisModel;
use crate::error::{AnalystError, AnalystResult};
use crate::prompt::{build_analysis_prompt, build_suggestions_prompt};
use crate::response::parse_reply;
use crate::router::route;

/// Starter questions returned by [`AnalysisSession::suggest_questions`]
/// are capped at this many entries.
const MAX_SUGGESTIONS: usize = 5;

/// Hidden question sent on behalf of the user for the dataset overview.
const DESCRIBE_QUESTION: &str = "Describe this dataset briefly: what each sheet holds, \
    its columns, and anything notable. Answer in prose without a chart.";

/// One user's analysis conversation over one dataset.
pub struct AnalysisSession {
    model: Arc<dyn AnalysisModel>,
    dataset: Option<Dataset>,
    messages: Vec<Message>,
}

impl AnalysisSession {
    /// Create a session with no dataset loaded yet.
    pub fn new(model: Arc<dyn AnalysisModel>) -> Self {
        Self {
            model,
            dataset: None,
            messages: Vec::new(),
        }
    }

    /// Replace the loaded dataset wholesale. The conversation log is kept;
    /// the provider decides when a new upload should also reset it.
    pub fn load_dataset(&mut self, dataset: Dataset) {
        info!(
            file = %dataset.file_name,
            sheets = dataset.sheets.len(),
            rows = dataset.total_rows(),
            "dataset loaded"
        );
        self.dataset = Some(dataset);
    }

    /// Load a dataset from its JSON wire form, as handed over by the
    /// dataset provider.
    pub fn load_dataset_json(&mut self, json: &str) -> AnalystResult<()> {
        let dataset: Dataset = serde_json::from_str(json)?;
        self.load_dataset(dataset);
        Ok(())
    }

    /// Currently loaded dataset, if any.
    pub fn dataset(&self) -> Option<&Dataset> {
        self.dataset.as_ref()
    }

    /// Full conversation log, hidden entries included.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Conversation entries meant for display.
    pub fn visible_messages(&self) -> Vec<&Message> {
        self.messages.iter().filter(|m| m.visible).collect()
    }

    /// Drop the conversation log. The dataset stays loaded.
    pub fn clear_messages(&mut self) {
        self.messages.clear();
    }

    /// Ask one question about the loaded dataset.
    ///
    /// Appends the user message and the assistant reply to the log and
    /// returns the assistant message. When the reply carries no chart of
    /// its own, a chart precomputed by the routed handler is attached
    /// instead.
    pub async fn ask(&mut self, question: impl Into<String>) -> AnalystResult<Message> {
        let question = question.into();
        let Some(dataset) = self.dataset.as_ref() else {
            return Err(AnalystError::DatasetMissing);
        };

        let routed = route(&question, dataset);
        info!(intent = ?routed.intent, "question routed");
        let prompt = build_analysis_prompt(dataset, routed.analysis.as_ref(), &question);
        self.messages.push(Message::user(question, Utc::now()));

        let handler_chart = routed.analysis.and_then(|analysis| analysis.chart);
        self.finish_turn(prompt, handler_chart).await
    }

    /// Ask for a structural overview of the dataset on the user's behalf.
    ///
    /// The generated question is appended hidden, so the log shows only
    /// the assistant's overview. Used right after an upload.
    pub async fn describe_dataset(&mut self) -> AnalystResult<Message> {
        let Some(dataset) = self.dataset.as_ref() else {
            return Err(AnalystError::DatasetMissing);
        };

        // Preview-only prompt: the overview never needs preprocessing.
        let prompt = build_analysis_prompt(dataset, None, DESCRIBE_QUESTION);
        self.messages
            .push(Message::user(DESCRIBE_QUESTION, Utc::now()).hidden());
        self.finish_turn(prompt, None).await
    }

    /// One model call suggesting up to [`MAX_SUGGESTIONS`] starter
    /// questions. The conversation log is not touched.
    pub async fn suggest_questions(&self) -> AnalystResult<Vec<String>> {
        let Some(dataset) = self.dataset.as_ref() else {
            return Err(AnalystError::DatasetMissing);
        };

        let prompt = build_suggestions_prompt(dataset);
        let reply = self.model.complete(&prompt).await?;
        let questions = parse_list_items(&reply);
        debug!(count = questions.len(), "parsed question suggestions");
        Ok(questions)
    }

    /// Record a presentation-layer chart-kind switch on a logged message.
    /// Returns `false` when no message has the given id.
    pub fn set_chart_type_override(&mut self, message_id: Uuid, chart_type: ChartType) -> bool {
        match self.messages.iter_mut().find(|m| m.id == message_id) {
            Some(message) => {
                message.chart_type_override = Some(chart_type);
                true
            }
            None => {
                debug!(%message_id, "chart type override for unknown message");
                false
            }
        }
    }

    /// Complete the prompt, parse the reply, and append the assistant
    /// message. Model errors become a visible error message, not an `Err`.
    async fn finish_turn(
        &mut self,
        prompt: String,
        handler_chart: Option<ChartPayload>,
    ) -> AnalystResult<Message> {
        let message = match self.model.complete(&prompt).await {
            Ok(reply) => {
                let answer = parse_reply(&reply);
                // A chart in the reply wins over the precomputed one.
                let chart = answer.chart.or(handler_chart);
                let mut message = Message::assistant(answer.text, Utc::now());
                if let Some(chart) = chart {
                    message = message.with_chart(chart);
                }
                message
            }
            Err(error) => {
                warn!(%error, "model call failed");
                Message::assistant(
                    format!("Sorry, the analysis service returned an error: {}", error),
                    Utc::now(),
                )
            }
        };

        self.messages.push(message.clone());
        Ok(message)
    }
}

/// Pull list items out of a numbered or bulleted reply, one per line,
/// capped at [`MAX_SUGGESTIONS`]. Lines that are not list items are
/// skipped.
fn parse_list_items(reply: &str) -> Vec<String> {
    let mut items = Vec::new();
    for line in reply.lines() {
        let Some(item) = list_item(line.trim()) else {
            continue;
        };
        if !item.is_empty() {
            items.push(item.to_string());
        }
        if items.len() == MAX_SUGGESTIONS {
            break;
        }
    }
    items
}

/// `1. item`, `1) item`, `- item`, or `* item`.
fn list_item(line: &str) -> Option<&str> {
    let numbered = line.trim_start_matches(|c: char| c.is_ascii_digit());
    if numbered.len() < line.len() {
        let rest = numbered
            .strip_prefix('.')
            .or_else(|| numbered.strip_prefix(')'))?;
        return Some(rest.trim());
    }
    line.strip_prefix('-')
        .or_else(|| line.strip_prefix('*'))
        .map(str::trim)
}
