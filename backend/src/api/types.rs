//! REST API types.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::ServerError;
use crate::parser::{CSV_MIME_TYPES, XLSX_MIME_TYPE};
use crate::store::{UploadRecord, ValidationRecord};

/// Query string of `GET /api/uploads`.
#[derive(Debug, Default, Deserialize)]
pub struct ListUploadsQuery {
    #[serde(rename = "clientId")]
    pub client_id: Option<u64>,
}

/// Body of `GET /api/uploads/{id}`.
#[derive(Debug, Clone, Serialize)]
pub struct UploadDetail {
    pub upload: UploadRecord,
    pub validations: Vec<ValidationRecord>,
}

/// True when the file name or MIME type identifies a CSV or XLSX upload.
pub fn is_accepted_upload(filename: &str, mime_type: &str) -> bool {
    let lower = filename.to_ascii_lowercase();
    let accepted_mime = CSV_MIME_TYPES.contains(&mime_type) || mime_type == XLSX_MIME_TYPE;
    accepted_mime || lower.ends_with(".csv") || lower.ends_with(".xlsx")
}

/// Create an error response body.
pub fn error_response(error: &str) -> Value {
    json!({ "error": error })
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ServerError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ServerError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ServerError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ServerError::PayloadTooLarge(msg) => (StatusCode::PAYLOAD_TOO_LARGE, msg),
            ServerError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            ServerError::Pipeline(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to process upload".to_string(),
            ),
        };
        (status, Json(error_response(&message))).into_response()
    }
}
