//! Error types for the framenodes library.

use thiserror::Error;

/// Main error type for table, codec and node operations.
#[derive(Debug, Error)]
pub enum FrameError {
    /// Row or column counts disagree on construction.
    #[error("Shape mismatch: {0}")]
    Shape(String),

    /// A row label, column name, group or sheet does not exist.
    #[error("Lookup error: {0}")]
    Lookup(String),

    /// A row has a different number of values than the table has columns.
    #[error("Arity mismatch: expected {expected} values, got {actual}")]
    Arity { expected: usize, actual: usize },

    /// A value has the wrong type for where it is used.
    #[error("Type error: {0}")]
    Type(String),

    /// An expression could not be parsed or evaluated.
    #[error("Expression error: {0}")]
    Expression(String),

    /// Invalid codec option.
    #[error("Invalid option: {0}")]
    InvalidOption(String),

    /// An interchange value does not have the expected structure.
    #[error("Interchange error: {0}")]
    Interchange(String),

    /// Node registration or port wiring error.
    #[error("Registration error: {0}")]
    Registration(String),

    /// Error from the CSV library.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Error reading a spreadsheet.
    #[error("Spreadsheet read error: {0}")]
    SheetRead(#[from] calamine::XlsxError),

    /// Error writing a spreadsheet.
    #[error("Spreadsheet write error: {0}")]
    SheetWrite(#[from] rust_xlsxwriter::XlsxError),
}

impl FrameError {
    pub(crate) fn missing_column(name: &str) -> Self {
        FrameError::Lookup(format!("column '{}' not found", name))
    }
}

/// Result type alias for framenodes operations.
pub type Result<T> = std::result::Result<T, FrameError>;

/// A node invocation failure, carrying the originating node id.
#[derive(Debug, Error)]
#[error("node '{node_id}' failed: {source}")]
pub struct InvocationError {
    /// Id of the node whose invocation failed.
    pub node_id: String,
    /// The underlying cause.
    #[source]
    pub source: FrameError,
}
