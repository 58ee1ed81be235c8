//! Reply Parsing
//!
//! Splits a model reply into prose and an optional chart on the literal
//! [`CHART_SENTINEL`] marker. Everything before the first sentinel is the
//! answer text; everything after it is expected to be one JSON chart spec,
//! possibly wrapped in a markdown code fence.
//!
//! The sentinel is a plain-text convention, not a structured protocol: a
//! model that rephrases it, lowercases it, or splits it across lines will
//! not be detected, and its whole reply passes through as prose. That is
//! the intended failure mode. Parsing never errors; a malformed spec is
//! logged and the entire raw reply is returned as text so nothing the
//! model said is lost.

use analyst_types::{Answer, ChartPayload};
use tracing::warn;

/// Literal marker separating prose from the chart spec in model replies.
/// Case-sensitive by design; the prompt instructs the model to emit it
/// exactly.
pub const CHART_SENTINEL: &str = "CHART_SPEC:";

/// Parse one model reply into an [`Answer`].
pub fn parse_reply(raw: &str) -> Answer {
    let Some((text, spec)) = raw.split_once(CHART_SENTINEL) else {
        return Answer::text_only(raw.trim());
    };

    match parse_chart_spec(spec) {
        Some(chart) => Answer::with_chart(text.trim(), chart),
        None => {
            warn!("malformed chart spec, returning whole reply as plain text");
            Answer::text_only(raw)
        }
    }
}

/// Extract and parse the JSON object after the sentinel.
///
/// Strips code-fence markers, then brackets the payload between the first
/// `{` and the last `}` so trailing prose or punctuation does not break
/// the parse. Unknown chart types and structurally invalid JSON both
/// yield `None`.
fn parse_chart_spec(spec: &str) -> Option<ChartPayload> {
    let cleaned = spec.trim().replace("```json", "").replace("```", "");
    let cleaned = cleaned.trim();

    let start = cleaned.find('{')?;
    let end = cleaned.rfind('}')?;
    if end < start {
        return None;
    }

    match serde_json::from_str(&cleaned[start..=end]) {
        Ok(chart) => Some(chart),
        Err(error) => {
            warn!(%error, "chart spec is not valid chart JSON");
            None
        }
    }
}
