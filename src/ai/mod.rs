//! Model Integration
//!
//! The single seam between session logic and the external language model.
//! [`AnalysisModel`] is object-safe so a session holds `Arc<dyn
//! AnalysisModel>` and tests substitute a scripted implementation;
//! [`GeminiClient`] is the production one.

use analyst_types::{ModelConfig, ModelResult};
use async_trait::async_trait;

pub mod gemini;

pub use gemini::GeminiClient;

/// A non-streaming completion model: one prompt in, one reply out.
#[async_trait]
pub trait AnalysisModel: Send + Sync {
    /// Send one prompt and return the raw reply text.
    async fn complete(&self, prompt: &str) -> ModelResult<String>;

    /// Configuration the model was built with.
    fn config(&self) -> &ModelConfig;
}
