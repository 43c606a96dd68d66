//! Error type shared by every pipeline stage.
//!
//! Stage errors are fatal to the run that produced them. Nothing in the
//! pipeline logs-and-continues: a silently corrupted signal column is worse
//! than no result.

use crate::domain::Column;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum PipelineError {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("degenerate range for column {column}: reference span is zero or undefined")]
    DegenerateRange { column: Column },

    #[error("precondition violated: {0}")]
    PreconditionViolation(String),

    #[error("missing column: {0}")]
    MissingColumn(Column),

    #[error("column {0} already computed for this series")]
    DuplicateColumn(Column),

    #[error("length mismatch for {what}: expected {expected}, got {actual}")]
    LengthMismatch {
        what: String,
        expected: usize,
        actual: usize,
    },

    #[error("insufficient data: need more than {required} bars, have {available}")]
    InsufficientData { required: usize, available: usize },

    #[error("classifier '{name}' failed: {reason}")]
    Classifier { name: String, reason: String },
}

pub type Result<T> = std::result::Result<T, PipelineError>;
