//! # Stockcheck - inventory spreadsheet validation
//!
//! Stockcheck ingests inventory exports (CSV or Excel) uploaded by clients,
//! finds the real header row, normalizes the records and runs a fixed set of
//! business rules over them. Each upload is recorded with a pass/fail outcome
//! and one result per rule.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │ CSV / XLSX  │────▶│   Parser    │────▶│  Validation │────▶│    Store    │
//! │   upload    │     │ (header loc)│     │  (4 rules)  │     │ (registry)  │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use stockcheck::check_bytes;
//!
//! let csv = b"status,cost,price\nPOLICE HOLD,10,20\n";
//! let report = check_bytes(csv, "text/csv").unwrap();
//! assert_eq!(report.status, "FAILED");
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`models`] - Cell values, rows and parsed files
//! - [`parser`] - CSV/workbook reading, header location, normalization
//! - [`validation`] - Business rules and the rule set
//! - [`pipeline`] - Parse, validate, decide, persist
//! - [`store`] - Upload registry
//! - [`config`] - Runtime configuration
//! - [`api`] - HTTP API server

// Core modules
pub mod config;
pub mod error;
pub mod models;

// Parsing
pub mod parser;

// Validation
pub mod validation;

// Orchestration
pub mod pipeline;

// Persistence
pub mod store;

// HTTP API
pub mod api;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{ParseError, PipelineError, ServerError, StoreError};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{
    CellValue, FileKind, NormalizedRow, ParsedFile, RawCell, RawTable, REQUIRED_COLUMNS,
};

// =============================================================================
// Re-exports - Parsing
// =============================================================================

pub use parser::{
    decode_content,
    detect_delimiter,
    detect_encoding,
    locate_header_row,
    normalize_rows,
    parse_file,
    parse_file_path,
    read_csv,
    read_spreadsheet,
};

// =============================================================================
// Re-exports - Validation
// =============================================================================

pub use validation::{
    overall_pass,
    run_validations,
    Rule,
    RuleSet,
    ValidationResult,
    STANDARD_RULES,
};

// =============================================================================
// Re-exports - Pipeline & store
// =============================================================================

pub use pipeline::{check_bytes, check_file, submit_upload, CheckReport, UploadInput, UploadOutcome};
pub use store::{ClientRecord, UploadRecord, UploadRegistry, UploadStore, ValidationRecord};

pub use config::AppConfig;

// Server
pub mod server {
    pub use crate::api::server::start_server;
}
