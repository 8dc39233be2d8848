//! Error types for the Stockcheck pipeline.
//!
//! - [`ParseError`] - reading CSV / workbook bytes
//! - [`StoreError`] - upload persistence
//! - [`PipelineError`] - parse + validate + persist orchestration
//! - [`ServerError`] - HTTP layer
//!
//! Missing columns and unparseable numeric cells are not errors: rules
//! degrade to a passing "skip" result instead, so they never show up here.
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.

use thiserror::Error;

// =============================================================================
// Parsing Errors
// =============================================================================

/// Errors while turning raw file bytes into a table.
#[derive(Debug, Error)]
pub enum ParseError {
    /// Failed to read file.
    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),

    /// Content declared UTF-8 (BOM) but is not valid UTF-8.
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// The CSV reader rejected the content.
    #[error("Invalid CSV content: {0}")]
    Csv(String),

    /// Corrupt or unsupported workbook container.
    #[error("Invalid workbook: {0}")]
    Workbook(String),

    /// Workbook without any worksheet.
    #[error("Workbook contains no sheets")]
    NoSheets,
}

impl From<csv::Error> for ParseError {
    fn from(err: csv::Error) -> Self {
        ParseError::Csv(err.to_string())
    }
}

impl From<calamine::Error> for ParseError {
    fn from(err: calamine::Error) -> Self {
        ParseError::Workbook(err.to_string())
    }
}

// =============================================================================
// Store Errors
// =============================================================================

/// Errors from the upload store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// IO error.
    #[error("Store IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error.
    #[error("Store JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Upload does not exist.
    #[error("Upload not found: {0}")]
    NotFound(u64),

    /// A writer panicked while holding the lock.
    #[error("Store lock poisoned")]
    Poisoned,
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level pipeline errors, returned by [`crate::pipeline::submit_upload`].
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Parsing error.
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// Store error.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

// =============================================================================
// Server Errors
// =============================================================================

/// HTTP server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Pipeline error.
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// Invalid request.
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Unknown resource.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Missing or wrong bearer token.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Upload over the configured size limit.
    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    /// Server internal error.
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<StoreError> for ServerError {
    fn from(err: StoreError) -> Self {
        ServerError::Pipeline(PipelineError::Store(err))
    }
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for parsing operations.
pub type ParseResult<T> = Result<T, ParseError>;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;
