//! Drive upload orchestration.
//!
//! Uploads are multipart (one JSON metadata part naming the file and its
//! destination folder, one binary part with the content) against the Drive
//! v3 `uploadType=multipart` endpoint.
//!
//! The orchestrator's contract is outcome, not exception: [`DriveUploader::upload`]
//! always returns an [`UploadOutcome`], never an `Err` and never a panic.
//! Missing configuration, credential failures, and transport errors all
//! collapse into `Failed` outcomes so a batch can keep walking. Batches are
//! strictly sequential and continue past per-item failures.
//!
//! The wire is behind the [`UploadTransport`] trait; tests drive the
//! orchestrator with a recording fake.

use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

use crate::auth::{AuthorizationServer, resolve_credentials};
use crate::store::{CredentialStore, Identity};

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("upload rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },
    #[error("network error during upload: {0}")]
    Network(String),
    #[error("malformed upload response: {0}")]
    MalformedResponse(String),
}

/// One file to be uploaded.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub name: String,
    pub folder_id: String,
    pub bytes: Vec<u8>,
    pub mime: String,
}

/// Result of one upload attempt. `Failed` carries a human-readable reason;
/// the batch report prints it verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    Uploaded { name: String, file_id: String },
    Failed { name: String, reason: String },
}

impl UploadOutcome {
    pub fn name(&self) -> &str {
        match self {
            Self::Uploaded { name, .. } | Self::Failed { name, .. } => name,
        }
    }

    pub fn is_uploaded(&self) -> bool {
        matches!(self, Self::Uploaded { .. })
    }
}

/// Aggregated result of a sequential batch.
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub outcomes: Vec<UploadOutcome>,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_uploaded()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed() == 0
    }
}

/// The wire half of an upload: send one request, get back the remote file id.
pub trait UploadTransport {
    fn send(&self, request: &UploadRequest, access_token: &str) -> Result<String, TransportError>;
}

/// Sequential upload orchestrator for one destination folder.
pub struct DriveUploader<'a, T: UploadTransport, S: AuthorizationServer> {
    store: &'a CredentialStore,
    server: &'a S,
    transport: &'a T,
    folder_id: String,
}

impl<'a, T: UploadTransport, S: AuthorizationServer> DriveUploader<'a, T, S> {
    pub fn new(
        store: &'a CredentialStore,
        server: &'a S,
        transport: &'a T,
        folder_id: impl Into<String>,
    ) -> Self {
        Self {
            store,
            server,
            transport,
            folder_id: folder_id.into(),
        }
    }

    /// Upload one file. Always returns an outcome.
    ///
    /// An unset destination folder fails before any network traffic,
    /// credential resolution included.
    pub fn upload(&self, identity: &Identity, name: &str, bytes: &[u8]) -> UploadOutcome {
        if self.folder_id.is_empty() {
            return UploadOutcome::Failed {
                name: name.to_string(),
                reason: "no destination folder configured (set drive.folder_id)".to_string(),
            };
        }

        let credentials = match resolve_credentials(self.store, self.server, identity) {
            Ok(credentials) => credentials,
            Err(e) => {
                return UploadOutcome::Failed {
                    name: name.to_string(),
                    reason: e.to_string(),
                };
            }
        };

        let request = UploadRequest {
            name: name.to_string(),
            folder_id: self.folder_id.clone(),
            bytes: bytes.to_vec(),
            mime: sniff_mime(bytes).to_string(),
        };
        match self.transport.send(&request, &credentials.access_token) {
            Ok(file_id) => {
                log::info!("uploaded {name} as {file_id}");
                UploadOutcome::Uploaded {
                    name: name.to_string(),
                    file_id,
                }
            }
            Err(e) => {
                log::warn!("upload of {name} failed: {e}");
                UploadOutcome::Failed {
                    name: name.to_string(),
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Upload a batch strictly in order, continuing past failures. The
    /// report holds one outcome per item, in input order.
    pub fn upload_batch(&self, identity: &Identity, items: &[(String, Vec<u8>)]) -> BatchReport {
        let mut report = BatchReport::default();
        for (name, bytes) in items {
            report.outcomes.push(self.upload(identity, name, bytes));
        }
        log::info!(
            "batch done: {} uploaded, {} failed",
            report.succeeded(),
            report.failed()
        );
        report
    }
}

/// Content-sniffed MIME type, defaulting to PNG for unrecognized bytes.
fn sniff_mime(bytes: &[u8]) -> &'static str {
    infer::get(bytes)
        .map(|kind| kind.mime_type())
        .unwrap_or("image/png")
}

// =========================================================================
// HTTP implementation
// =========================================================================

#[derive(Debug, Deserialize)]
struct DriveFileResponse {
    id: Option<String>,
}

/// [`UploadTransport`] over HTTP multipart.
pub struct HttpTransport {
    client: reqwest::blocking::Client,
    upload_url: String,
}

impl HttpTransport {
    pub fn new(upload_url: impl Into<String>, timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Network(e.to_string()))?;
        Ok(Self {
            client,
            upload_url: upload_url.into(),
        })
    }
}

impl UploadTransport for HttpTransport {
    fn send(&self, request: &UploadRequest, access_token: &str) -> Result<String, TransportError> {
        let metadata = serde_json::json!({
            "name": request.name,
            "parents": [request.folder_id],
        });
        let metadata_part = reqwest::blocking::multipart::Part::text(metadata.to_string())
            .mime_str("application/json")
            .map_err(|e| TransportError::Network(e.to_string()))?;
        let file_part = reqwest::blocking::multipart::Part::bytes(request.bytes.clone())
            .file_name(request.name.clone())
            .mime_str(&request.mime)
            .map_err(|e| TransportError::Network(e.to_string()))?;
        let form = reqwest::blocking::multipart::Form::new()
            .part("data", metadata_part)
            .part("file", file_part);

        let response = self
            .client
            .post(&self.upload_url)
            .bearer_auth(access_token)
            .multipart(form)
            .send()
            .map_err(|e| TransportError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(TransportError::Rejected {
                status: status.as_u16(),
                body,
            });
        }
        let body: DriveFileResponse = response
            .json()
            .map_err(|e| TransportError::MalformedResponse(e.to_string()))?;
        body.id.ok_or_else(|| {
            TransportError::MalformedResponse("upload response lacks a file id".to_string())
        })
    }
}
