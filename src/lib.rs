//! Sheet Analyst - Deterministic Tabular Q&A
//!
//! Answers free-text questions over an in-memory spreadsheet dataset by
//! routing each question to a deterministic analysis handler, packing the
//! computed results into one bounded prompt, and making a single
//! low-temperature model call. Chart specs come back over a plain-text
//! sentinel and are parsed into typed payloads.
//!
//! ## Pipeline
//! Question -> Intent Router -> Handler -> Prompt -> Model -> Reply Parser
//!
//! Handlers cover filtering, top-N/bottom-N ranking, aggregation, group
//! comparison, date trends, sorting, and single-extremum lookups. A
//! question matching none of them goes to the model with the dataset
//! preview alone.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use sheet_analyst::{AnalysisSession, Dataset, GeminiClient, Sheet};
//!
//! # async fn demo() -> anyhow::Result<()> {
//! let model = Arc::new(GeminiClient::from_env()?);
//! let mut session = AnalysisSession::new(model);
//!
//! let sheet = Sheet::new("Units", vec!["Name".into(), "Attack".into()]);
//! session.load_dataset(Dataset::new("units.xlsx").with_sheet(sheet));
//!
//! let reply = session.ask("top 3 by attack").await?;
//! println!("{}", reply.content);
//! # Ok(())
//! # }
//! ```

// Core error handling
pub mod error;

// Column resolution and numeric condition extraction
pub mod columns;
pub mod conditions;

// Deterministic analysis handlers and intent routing
pub mod handlers;
pub mod router;

// Prompt assembly and model reply parsing
pub mod prompt;
pub mod response;

// Model service integration
pub mod ai;

// Conversation state and the ask pipeline
pub mod session;

// Foundation data structures
pub use analyst_types::{
    Answer, CellValue, ChartPayload, ChartType, Dataset, Message, MessageRole, ModelConfig,
    ModelError, ModelResult, Row, Sheet,
};

// Public surface of the pipeline
pub use ai::{AnalysisModel, GeminiClient};
pub use error::{AnalystError, AnalystResult};
pub use handlers::Analysis;
pub use response::CHART_SENTINEL;
pub use router::{route, Intent, Routed};
pub use session::AnalysisSession;

/// Install the default tracing subscriber. Respects `RUST_LOG`, with an
/// `info` floor when unset. Safe to call more than once; later calls are
/// no-ops.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .try_init()
        .ok();
}
