//! HTTP server for the Stockcheck API.
//!
//! Every `/api` route requires `Authorization: Bearer <API_TOKEN>`; the
//! health check is open. Request bodies are capped at the configured upload
//! size plus [`MULTIPART_OVERHEAD_BYTES`] of form framing.
//!
//! # API Endpoints
//!
//! | Method | Path                  | Description                              |
//! |--------|-----------------------|------------------------------------------|
//! | GET    | `/health`             | Health check                             |
//! | POST   | `/api/uploads`        | Upload a CSV/XLSX file (`file`, `clientName`) |
//! | GET    | `/api/uploads`        | List uploads (optional `clientId`)       |
//! | GET    | `/api/uploads/{id}`   | Upload with its validation results       |
//! | GET    | `/api/clients`        | List clients                             |

use axum::{
    extract::{multipart::MultipartError, DefaultBodyLimit, Multipart, Path, Query, Request, State},
    http::{header, Method, StatusCode},
    middleware::{self, Next},
    response::{Json, Response},
    routing::get,
    Router,
};
use serde_json::{json, Value};
use std::{net::SocketAddr, sync::Arc};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};

use super::types::{is_accepted_upload, ListUploadsQuery, UploadDetail};
use crate::config::{AppConfig, DEFAULT_API_TOKEN};
use crate::error::{ServerError, ServerResult};
use crate::pipeline::{submit_upload, UploadInput, UploadOutcome};
use crate::store::{ClientRecord, UploadRecord, UploadRegistry, UploadStore};

/// Room left in the body limit for multipart boundaries, part headers and
/// the `clientName` field.
pub const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

const MISSING_TOKEN: &str = "Unauthorized: Missing or invalid Authorization header";
const INVALID_TOKEN: &str = "Unauthorized: Invalid token";
const FILE_TOO_LARGE: &str = "File exceeds the upload size limit";

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn UploadStore>,
    pub api_token: Arc<str>,
    /// Largest accepted file, in bytes.
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(store: Arc<dyn UploadStore>, api_token: &str, max_upload_bytes: usize) -> Self {
        Self {
            store,
            api_token: Arc::from(api_token),
            max_upload_bytes,
        }
    }
}

/// Build the router.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT, header::AUTHORIZATION])
        .expose_headers([header::CONTENT_TYPE]);

    let api = Router::new()
        .route("/api/uploads", get(list_uploads).post(upload_file))
        .route("/api/uploads/{id}", get(get_upload))
        .route("/api/clients", get(list_clients))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_bearer));

    let body_limit = state.max_upload_bytes.saturating_add(MULTIPART_OVERHEAD_BYTES);

    Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .merge(api)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Reject requests without `Authorization: Bearer <token>` matching the
/// configured token.
async fn require_bearer(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, ServerError> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or_else(|| ServerError::Unauthorized(MISSING_TOKEN.into()))?;

    if token != state.api_token.as_ref() {
        warn!(path = %req.uri().path(), "rejected request with invalid token");
        return Err(ServerError::Unauthorized(INVALID_TOKEN.into()));
    }

    Ok(next.run(req).await)
}

/// Start the HTTP server.
pub async fn start_server(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let store: Arc<dyn UploadStore> = match &config.data_dir {
        Some(dir) => Arc::new(UploadRegistry::with_dir(dir)?),
        None => Arc::new(UploadRegistry::in_memory()),
    };
    if config.api_token == DEFAULT_API_TOKEN {
        warn!("API_TOKEN is not set; accepting the development token");
    }
    let app = router(AppState::new(store, &config.api_token, config.max_upload_bytes));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!(
        %addr,
        data_dir = ?config.data_dir,
        max_upload_bytes = config.max_upload_bytes,
        "stockcheck server listening"
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Health check endpoint
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "stockcheck",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Upload endpoint: parse, validate and record the file.
async fn upload_file(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ServerResult<(StatusCode, Json<UploadOutcome>)> {
    let mut file: Option<(Vec<u8>, String, String)> = None;
    let mut client_name: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error("Multipart error", e))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "file" => {
                let filename = field.file_name().unwrap_or("").to_string();
                let mime_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| multipart_error("Read error", e))?;
                if bytes.len() > state.max_upload_bytes {
                    warn!(%filename, size = bytes.len(), "rejected oversized upload");
                    return Err(ServerError::PayloadTooLarge(FILE_TOO_LARGE.into()));
                }
                file = Some((bytes.to_vec(), filename, mime_type));
            }
            "clientName" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| multipart_error("Read error", e))?;
                client_name = Some(text);
            }
            _ => {}
        }
    }

    let (bytes, filename, mime_type) =
        file.ok_or_else(|| ServerError::BadRequest("No file provided".into()))?;

    let client_name = client_name
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .ok_or_else(|| ServerError::BadRequest("clientName is required".into()))?;

    if !is_accepted_upload(&filename, &mime_type) {
        warn!(%filename, %mime_type, "rejected upload type");
        return Err(ServerError::BadRequest("File must be CSV or XLSX".into()));
    }

    let store = Arc::clone(&state.store);
    let outcome = tokio::task::spawn_blocking(move || {
        submit_upload(
            store.as_ref(),
            UploadInput {
                bytes: &bytes,
                filename: &filename,
                mime_type: &mime_type,
                client_name: &client_name,
            },
        )
    })
    .await
    .map_err(|e| ServerError::Internal(format!("Upload task failed: {}", e)))?
    .map_err(|e| {
        warn!(error = %e, "upload failed");
        ServerError::from(e)
    })?;

    Ok((StatusCode::CREATED, Json(outcome)))
}

/// Body-limit failures become 413; anything else is a malformed form.
fn multipart_error(context: &str, err: MultipartError) -> ServerError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        warn!(error = %err, "upload body over limit");
        return ServerError::PayloadTooLarge(FILE_TOO_LARGE.into());
    }
    ServerError::BadRequest(format!("{}: {}", context, err))
}

async fn list_uploads(
    State(state): State<AppState>,
    Query(query): Query<ListUploadsQuery>,
) -> ServerResult<Json<Vec<UploadRecord>>> {
    let uploads = state.store.list_uploads(query.client_id).map_err(|e| {
        warn!(error = %e, "list uploads failed");
        ServerError::Internal("Failed to list uploads".into())
    })?;
    Ok(Json(uploads))
}

async fn get_upload(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ServerResult<Json<UploadDetail>> {
    let id: u64 = id
        .parse()
        .map_err(|_| ServerError::BadRequest("Invalid upload ID".into()))?;

    let found = state.store.get_upload(id).map_err(|e| {
        warn!(error = %e, upload_id = id, "get upload failed");
        ServerError::Internal("Failed to get upload".into())
    })?;

    match found {
        Some((upload, validations)) => Ok(Json(UploadDetail { upload, validations })),
        None => Err(ServerError::NotFound("Upload not found".into())),
    }
}

async fn list_clients(State(state): State<AppState>) -> ServerResult<Json<Vec<ClientRecord>>> {
    let clients = state.store.list_clients().map_err(|e| {
        warn!(error = %e, "list clients failed");
        ServerError::Internal("Failed to list clients".into())
    })?;
    Ok(Json(clients))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::request::Builder;
    use axum::http::Request;
    use tower::ServiceExt;

    const BOUNDARY: &str = "stockcheck-test-boundary";
    const TOKEN: &str = "test-token";

    struct Part<'a> {
        name: &'a str,
        filename: Option<&'a str>,
        content_type: Option<&'a str>,
        data: &'a [u8],
    }

    fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
        let mut body = Vec::new();
        for part in parts {
            body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
            let mut disposition = format!("Content-Disposition: form-data; name=\"{}\"", part.name);
            if let Some(filename) = part.filename {
                disposition.push_str(&format!("; filename=\"{}\"", filename));
            }
            body.extend_from_slice(disposition.as_bytes());
            body.extend_from_slice(b"\r\n");
            if let Some(ct) = part.content_type {
                body.extend_from_slice(format!("Content-Type: {}\r\n", ct).as_bytes());
            }
            body.extend_from_slice(b"\r\n");
            body.extend_from_slice(part.data);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
        body
    }

    fn authed(builder: Builder) -> Builder {
        builder.header(header::AUTHORIZATION, format!("Bearer {}", TOKEN))
    }

    fn get(uri: &str) -> Request<Body> {
        authed(Request::get(uri)).body(Body::empty()).unwrap()
    }

    fn upload_request(parts: &[Part<'_>]) -> Request<Body> {
        authed(Request::builder())
            .method("POST")
            .uri("/api/uploads")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(multipart_body(parts)))
            .unwrap()
    }

    fn csv_parts<'a>(filename: &'a str, data: &'a [u8], client: &'a str) -> Vec<Part<'a>> {
        vec![
            Part {
                name: "clientName",
                filename: None,
                content_type: None,
                data: client.as_bytes(),
            },
            Part {
                name: "file",
                filename: Some(filename),
                content_type: Some("text/csv"),
                data,
            },
        ]
    }

    fn app_with_limit(max_upload_bytes: usize) -> (Router, Arc<UploadRegistry>) {
        let store = Arc::new(UploadRegistry::in_memory());
        let app = router(AppState::new(store.clone(), TOKEN, max_upload_bytes));
        (app, store)
    }

    fn app() -> (Router, Arc<UploadRegistry>) {
        app_with_limit(10 * 1024 * 1024)
    }

    async fn json_body(resp: axum::response::Response) -> Value {
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let (app, _) = app();
        let resp = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(json_body(resp).await["status"], "ok");
    }

    #[tokio::test]
    async fn test_api_requires_bearer_header() {
        let (app, _) = app();
        let resp = app
            .clone()
            .oneshot(Request::get("/api/clients").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(json_body(resp).await["error"], MISSING_TOKEN);

        let resp = app
            .oneshot(
                Request::get("/api/clients")
                    .header(header::AUTHORIZATION, TOKEN)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(json_body(resp).await["error"], MISSING_TOKEN);
    }

    #[tokio::test]
    async fn test_api_rejects_wrong_token() {
        let (app, store) = app();
        let req = Request::builder()
            .method("POST")
            .uri("/api/uploads")
            .header(header::AUTHORIZATION, "Bearer dev-token")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(multipart_body(&csv_parts(
                "stock.csv",
                b"status,cost,price\nINVENTORY,2,1\n",
                "Pawn Co",
            ))))
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(json_body(resp).await["error"], INVALID_TOKEN);
        assert!(store.list_uploads(None).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_api_accepts_configured_token() {
        let (app, _) = app();
        let resp = app.oneshot(get("/api/clients")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(json_body(resp).await, json!([]));
    }

    #[tokio::test]
    async fn test_upload_then_fetch() {
        let (app, store) = app();
        let csv = b"Store,Status,Cost,Price\nA,POLICE INVENTORY HOLD,10,20\n";
        let resp = app
            .clone()
            .oneshot(upload_request(&csv_parts("stock.csv", csv, "Pawn Co")))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::CREATED);
        let body = json_body(resp).await;
        assert_eq!(body["overallPass"], false);
        assert_eq!(body["status"], "FAILED");
        let id = body["id"].as_u64().unwrap();
        assert_eq!(store.list_uploads(None).unwrap().len(), 1);

        let resp = app
            .oneshot(get(&format!("/api/uploads/{}", id)))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let detail = json_body(resp).await;
        assert_eq!(detail["upload"]["client_name"], "Pawn Co");
        assert_eq!(detail["validations"].as_array().unwrap().len(), 4);
        assert_eq!(detail["validations"][1]["rule_name"], "police_hold");
        assert_eq!(detail["validations"][1]["details"]["count"], 1);
    }

    #[tokio::test]
    async fn test_upload_without_file() {
        let (app, _) = app();
        let parts = [Part {
            name: "clientName",
            filename: None,
            content_type: None,
            data: b"Pawn Co",
        }];
        let resp = app.oneshot(upload_request(&parts)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(resp).await["error"], "No file provided");
    }

    #[tokio::test]
    async fn test_upload_without_client_name() {
        let (app, _) = app();
        let resp = app
            .oneshot(upload_request(&csv_parts("stock.csv", b"status\nA\n", "   ")))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(resp).await["error"], "clientName is required");
    }

    #[tokio::test]
    async fn test_upload_rejects_other_types() {
        let (app, _) = app();
        let parts = vec![
            Part {
                name: "clientName",
                filename: None,
                content_type: None,
                data: b"Pawn Co",
            },
            Part {
                name: "file",
                filename: Some("stock.pdf"),
                content_type: Some("application/pdf"),
                data: b"%PDF-1.4",
            },
        ];
        let resp = app.oneshot(upload_request(&parts)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(resp).await["error"], "File must be CSV or XLSX");
    }

    #[tokio::test]
    async fn test_file_at_limit_is_accepted() {
        let mut csv = b"status,cost,price\n".to_vec();
        while csv.len() + 18 <= 1024 {
            csv.extend_from_slice(b"INVENTORY,20,10\n");
        }
        let (app, _) = app_with_limit(1024);
        let resp = app
            .oneshot(upload_request(&csv_parts("stock.csv", &csv, "Pawn Co")))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);
    }

    #[tokio::test]
    async fn test_file_over_limit_is_rejected() {
        let mut csv = b"status,cost,price\n".to_vec();
        while csv.len() <= 1024 {
            csv.extend_from_slice(b"INVENTORY,20,10\n");
        }
        let (app, store) = app_with_limit(1024);
        let resp = app
            .oneshot(upload_request(&csv_parts("stock.csv", &csv, "Pawn Co")))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(json_body(resp).await["error"], FILE_TOO_LARGE);
        assert!(store.list_uploads(None).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_body_over_limit_is_payload_too_large() {
        let csv = vec![b'x'; 1024 + MULTIPART_OVERHEAD_BYTES];
        let (app, store) = app_with_limit(1024);
        let resp = app
            .oneshot(upload_request(&csv_parts("stock.csv", &csv, "Pawn Co")))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert!(store.list_uploads(None).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_workbook_is_server_error() {
        let (app, store) = app();
        let parts = vec![
            Part {
                name: "clientName",
                filename: None,
                content_type: None,
                data: b"Pawn Co",
            },
            Part {
                name: "file",
                filename: Some("stock.xlsx"),
                content_type: Some("application/octet-stream"),
                data: b"not a workbook",
            },
        ];
        let resp = app.oneshot(upload_request(&parts)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json_body(resp).await["error"], "Failed to process upload");
        assert!(store.list_uploads(None).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_get_upload_errors() {
        let (app, _) = app();
        let resp = app.clone().oneshot(get("/api/uploads/abc")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = app.oneshot(get("/api/uploads/99")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_list_uploads_by_client() {
        let (app, store) = app();
        for client in ["Pawn Co", "Acme", "Pawn Co"] {
            let resp = app
                .clone()
                .oneshot(upload_request(&csv_parts(
                    "stock.csv",
                    b"status,cost,price\nINVENTORY,2,1\n",
                    client,
                )))
                .await
                .unwrap();
            assert_eq!(resp.status(), StatusCode::CREATED);
        }
        let pawn = store.find_or_create_client("Pawn Co").unwrap();

        let resp = app
            .clone()
            .oneshot(get(&format!("/api/uploads?clientId={}", pawn)))
            .await
            .unwrap();
        let uploads = json_body(resp).await;
        assert_eq!(uploads.as_array().unwrap().len(), 2);
        assert_eq!(uploads[0]["status"], "SUCCESS");

        let resp = app.oneshot(get("/api/clients")).await.unwrap();
        let clients = json_body(resp).await;
        assert_eq!(clients[0]["name"], "Acme");
        assert_eq!(clients[1]["name"], "Pawn Co");
    }
}
