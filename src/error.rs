//! Error handling for the analysis engine
//!
//! This module provides idiomatic Rust error types using thiserror for
//! better error messages and proper error chain handling. Upstream model
//! failures arrive as [`ModelError`] and are wrapped here; the session
//! converts them into visible conversation entries rather than letting
//! them escape a question turn.

use analyst_types::ModelError;
use thiserror::Error;

/// Main error type for the analysis engine
#[derive(Error, Debug)]
pub enum AnalystError {
    #[error("Model service error: {0}")]
    Model(#[from] ModelError),

    #[error("No dataset loaded")]
    DatasetMissing,

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for engine operations
pub type AnalystResult<T> = Result<T, AnalystError>;
