//! Upload registry - records uploads and their validation results.
//!
//! [`UploadStore`] is the interface the pipeline writes through.
//! [`UploadRegistry`] implements it in memory, optionally persisting each
//! upload (with its validation rows) to `<dir>/upload-<id>.json` and loading
//! them back on startup.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::warn;

use crate::error::{StoreError, StoreResult};

// =============================================================================
// Records
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientRecord {
    pub id: u64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadRecord {
    pub id: u64,
    pub client_id: u64,
    pub client_name: String,
    pub filename: String,
    /// `csv` or `xlsx`.
    pub file_type: String,
    pub uploaded_at: DateTime<Utc>,
    pub overall_pass: bool,
    /// `SUCCESS` or `FAILED`.
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationRecord {
    pub id: u64,
    pub upload_id: u64,
    pub rule_name: String,
    pub passed: bool,
    pub details: Value,
}

/// Fields supplied when creating an upload.
#[derive(Debug, Clone)]
pub struct NewUpload<'a> {
    pub client_id: u64,
    pub filename: &'a str,
    pub file_type: &'a str,
    pub overall_pass: bool,
    pub status: &'a str,
}

/// Persistence interface consumed by the pipeline and the HTTP layer.
pub trait UploadStore: Send + Sync {
    /// Id of the client with this (trimmed) name, creating it if needed.
    fn find_or_create_client(&self, name: &str) -> StoreResult<u64>;

    fn insert_upload(&self, upload: NewUpload<'_>) -> StoreResult<u64>;

    fn insert_validation_result(
        &self,
        upload_id: u64,
        rule_name: &str,
        passed: bool,
        details: &Value,
    ) -> StoreResult<()>;

    /// Uploads, newest first, optionally for one client.
    fn list_uploads(&self, client_id: Option<u64>) -> StoreResult<Vec<UploadRecord>>;

    fn get_upload(&self, id: u64) -> StoreResult<Option<(UploadRecord, Vec<ValidationRecord>)>>;

    /// Clients sorted by name.
    fn list_clients(&self) -> StoreResult<Vec<ClientRecord>>;
}

// =============================================================================
// Registry
// =============================================================================

/// An upload as written to disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredUpload {
    upload: UploadRecord,
    validations: Vec<ValidationRecord>,
}

#[derive(Debug, Default)]
struct RegistryState {
    clients: Vec<ClientRecord>,
    uploads: Vec<StoredUpload>,
    next_validation_id: u64,
}

impl RegistryState {
    fn next_client_id(&self) -> u64 {
        self.clients.iter().map(|c| c.id).max().unwrap_or(0) + 1
    }

    fn next_upload_id(&self) -> u64 {
        self.uploads.iter().map(|u| u.upload.id).max().unwrap_or(0) + 1
    }

    fn upload_mut(&mut self, id: u64) -> Option<&mut StoredUpload> {
        self.uploads.iter_mut().find(|u| u.upload.id == id)
    }
}

/// Thread-safe upload registry.
#[derive(Debug)]
pub struct UploadRegistry {
    /// Directory where uploads are persisted, if any.
    registry_dir: Option<PathBuf>,
    state: RwLock<RegistryState>,
}

impl UploadRegistry {
    /// A registry that keeps everything in memory.
    pub fn in_memory() -> Self {
        Self {
            registry_dir: None,
            state: RwLock::new(RegistryState {
                next_validation_id: 1,
                ..RegistryState::default()
            }),
        }
    }

    /// A registry persisted under `dir`, loading existing uploads.
    pub fn with_dir(dir: impl AsRef<Path>) -> StoreResult<Self> {
        let registry_dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&registry_dir)?;

        let mut state = RegistryState::default();
        for entry in fs::read_dir(&registry_dir)?.flatten() {
            let path = entry.path();
            if !path.extension().is_some_and(|e| e == "json") {
                continue;
            }
            match fs::read_to_string(&path)
                .map_err(StoreError::from)
                .and_then(|content| Ok(serde_json::from_str::<StoredUpload>(&content)?))
            {
                Ok(stored) => state.uploads.push(stored),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "skipping unreadable upload file")
                }
            }
        }

        for stored in &state.uploads {
            let upload = &stored.upload;
            if !state.clients.iter().any(|c| c.id == upload.client_id) {
                state.clients.push(ClientRecord {
                    id: upload.client_id,
                    name: upload.client_name.clone(),
                });
            }
        }
        state.next_validation_id = state
            .uploads
            .iter()
            .flat_map(|u| u.validations.iter().map(|v| v.id))
            .max()
            .unwrap_or(0)
            + 1;

        Ok(Self {
            registry_dir: Some(registry_dir),
            state: RwLock::new(state),
        })
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, RegistryState>> {
        self.state.read().map_err(|_| StoreError::Poisoned)
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, RegistryState>> {
        self.state.write().map_err(|_| StoreError::Poisoned)
    }

    fn persist(&self, stored: &StoredUpload) -> StoreResult<()> {
        let Some(dir) = &self.registry_dir else {
            return Ok(());
        };
        let path = dir.join(format!("upload-{}.json", stored.upload.id));
        let content = serde_json::to_string_pretty(stored)?;
        fs::write(path, content)?;
        Ok(())
    }
}

impl Default for UploadRegistry {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl UploadStore for UploadRegistry {
    fn find_or_create_client(&self, name: &str) -> StoreResult<u64> {
        let name = name.trim();
        let mut state = self.write()?;

        if let Some(client) = state.clients.iter().find(|c| c.name == name) {
            return Ok(client.id);
        }

        let id = state.next_client_id();
        state.clients.push(ClientRecord {
            id,
            name: name.to_string(),
        });
        Ok(id)
    }

    fn insert_upload(&self, upload: NewUpload<'_>) -> StoreResult<u64> {
        let mut state = self.write()?;

        let client_name = state
            .clients
            .iter()
            .find(|c| c.id == upload.client_id)
            .map(|c| c.name.clone())
            .unwrap_or_default();

        let id = state.next_upload_id();
        let stored = StoredUpload {
            upload: UploadRecord {
                id,
                client_id: upload.client_id,
                client_name,
                filename: upload.filename.to_string(),
                file_type: upload.file_type.to_string(),
                uploaded_at: Utc::now(),
                overall_pass: upload.overall_pass,
                status: upload.status.to_string(),
            },
            validations: Vec::new(),
        };

        self.persist(&stored)?;
        state.uploads.push(stored);
        Ok(id)
    }

    fn insert_validation_result(
        &self,
        upload_id: u64,
        rule_name: &str,
        passed: bool,
        details: &Value,
    ) -> StoreResult<()> {
        let mut state = self.write()?;
        // Ids are consumed even when the write fails, so none is reused.
        let id = state.next_validation_id;
        state.next_validation_id += 1;

        let stored = state
            .upload_mut(upload_id)
            .ok_or(StoreError::NotFound(upload_id))?;
        stored.validations.push(ValidationRecord {
            id,
            upload_id,
            rule_name: rule_name.to_string(),
            passed,
            details: details.clone(),
        });
        if let Err(e) = self.persist(stored) {
            stored.validations.pop();
            return Err(e);
        }
        Ok(())
    }

    fn list_uploads(&self, client_id: Option<u64>) -> StoreResult<Vec<UploadRecord>> {
        let state = self.read()?;
        let mut uploads: Vec<UploadRecord> = state
            .uploads
            .iter()
            .map(|u| &u.upload)
            .filter(|u| client_id.map_or(true, |id| u.client_id == id))
            .cloned()
            .collect();

        uploads.sort_by(|a, b| b.uploaded_at.cmp(&a.uploaded_at).then(b.id.cmp(&a.id)));
        Ok(uploads)
    }

    fn get_upload(&self, id: u64) -> StoreResult<Option<(UploadRecord, Vec<ValidationRecord>)>> {
        let state = self.read()?;
        Ok(state
            .uploads
            .iter()
            .find(|u| u.upload.id == id)
            .map(|u| (u.upload.clone(), u.validations.clone())))
    }

    fn list_clients(&self) -> StoreResult<Vec<ClientRecord>> {
        let state = self.read()?;
        let mut clients = state.clients.clone();
        clients.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(clients)
    }
}
