//! High-level pipeline: parse, validate, decide, persist.
//!
//! # Example
//!
//! ```
//! use stockcheck::pipeline::{submit_upload, UploadInput};
//! use stockcheck::store::{UploadRegistry, UploadStore};
//!
//! let store = UploadRegistry::in_memory();
//! let outcome = submit_upload(
//!     &store,
//!     UploadInput {
//!         bytes: b"status,cost,price\nINVENTORY,150,100\n",
//!         filename: "stock.csv",
//!         mime_type: "text/csv",
//!         client_name: "Pawn Co",
//!     },
//! )
//! .unwrap();
//!
//! assert_eq!(outcome.status, "SUCCESS");
//! let (_, validations) = store.get_upload(outcome.upload_id).unwrap().unwrap();
//! assert_eq!(validations.len(), 4);
//! ```

use serde::Serialize;
use std::path::Path;
use tracing::{debug, info};

use crate::error::{ParseError, PipelineResult};
use crate::parser::{mime_for_path, parse_file};
use crate::store::{NewUpload, UploadStore};
use crate::validation::{overall_pass, run_validations, ValidationResult};

pub const STATUS_SUCCESS: &str = "SUCCESS";
pub const STATUS_FAILED: &str = "FAILED";

/// Status string for an overall outcome.
pub fn status_for(passed: bool) -> &'static str {
    if passed {
        STATUS_SUCCESS
    } else {
        STATUS_FAILED
    }
}

/// Result of checking one file, without persistence.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckReport {
    pub headers: Vec<String>,
    pub row_count: usize,
    pub results: Vec<ValidationResult>,
    pub overall_pass: bool,
    pub status: &'static str,
}

/// Parse and validate uploaded bytes.
pub fn check_bytes(bytes: &[u8], mime_type: &str) -> Result<CheckReport, ParseError> {
    let parsed = parse_file(bytes, mime_type)?;
    let results = run_validations(&parsed);
    let passed = overall_pass(&results);

    debug!(
        headers = ?parsed.headers,
        rows = parsed.rows.len(),
        passed,
        "validated file"
    );

    Ok(CheckReport {
        headers: parsed.headers,
        row_count: parsed.rows.len(),
        results,
        overall_pass: passed,
        status: status_for(passed),
    })
}

/// Parse and validate a file on disk.
pub fn check_file<P: AsRef<Path>>(path: P) -> Result<CheckReport, ParseError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)?;
    check_bytes(&bytes, mime_for_path(path))
}

/// An upload as received from a client.
#[derive(Debug, Clone, Copy)]
pub struct UploadInput<'a> {
    pub bytes: &'a [u8],
    pub filename: &'a str,
    pub mime_type: &'a str,
    pub client_name: &'a str,
}

/// Identifiers and outcome of a stored upload.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadOutcome {
    #[serde(rename = "id")]
    pub upload_id: u64,
    pub overall_pass: bool,
    pub status: &'static str,
}

/// `csv` when the name ends with `.csv`, otherwise `xlsx`.
pub fn file_type_for(filename: &str) -> &'static str {
    if filename.ends_with(".csv") {
        "csv"
    } else {
        "xlsx"
    }
}

/// Check an upload and record it with one validation row per rule.
pub fn submit_upload(
    store: &dyn UploadStore,
    input: UploadInput<'_>,
) -> PipelineResult<UploadOutcome> {
    let report = check_bytes(input.bytes, input.mime_type)?;

    let client_id = store.find_or_create_client(input.client_name)?;
    let upload_id = store.insert_upload(NewUpload {
        client_id,
        filename: input.filename,
        file_type: file_type_for(input.filename),
        overall_pass: report.overall_pass,
        status: report.status,
    })?;

    for result in &report.results {
        store.insert_validation_result(upload_id, &result.rule, result.passed, &result.details)?;
    }

    info!(
        upload_id,
        client = input.client_name.trim(),
        filename = input.filename,
        rows = report.row_count,
        status = report.status,
        "upload recorded"
    );

    Ok(UploadOutcome {
        upload_id,
        overall_pass: report.overall_pass,
        status: report.status,
    })
}
