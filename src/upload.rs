//! Uploads the plug-in archive to the deployment endpoint.
//!
//! The [`Uploader`] trait keeps the dispatcher agnostic of transport details
//! and is mockable for tests. [`HttpUploader`] is the `reqwest` implementation:
//! a single POST carrying the raw archive bytes, no retry.

use async_trait::async_trait;
use mockall::automock;
use reqwest::header::CONTENT_TYPE;
use sha2::{Digest, Sha256};
use tracing::{error, info};

use crate::config::DeployConfig;
use crate::error::DeployError;
use crate::package::ArchiveArtifact;

pub const API_KEY_HEADER: &str = "Appian-API-Key";
pub const DOCUMENT_NAME_HEADER: &str = "Appian-Document-Name";
pub const ARCHIVE_CONTENT_TYPE: &str = "application/octet-stream";

/// Outcome of a deployment request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployReport {
    /// Status line returned by the endpoint, e.g. `200 OK`.
    pub status: String,
    pub bytes: usize,
    /// Hex SHA-256 of the uploaded archive.
    pub sha256: String,
}

#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait Uploader: Send + Sync {
    /// Sends the archive to the endpoint.
    async fn upload(&self, artifact: &ArchiveArtifact) -> Result<DeployReport, DeployError>;
}

pub struct HttpUploader {
    client: reqwest::Client,
    url: String,
    api_key: String,
}

impl HttpUploader {
    pub fn new(deploy: &DeployConfig) -> Self {
        info!(
            url = %deploy.url,
            api_key_set = !deploy.api_key.is_empty(),
            "Initialized deployment client"
        );
        Self {
            client: reqwest::Client::new(),
            url: deploy.url.clone(),
            api_key: deploy.api_key.clone(),
        }
    }
}

#[async_trait]
impl Uploader for HttpUploader {
    async fn upload(&self, artifact: &ArchiveArtifact) -> Result<DeployReport, DeployError> {
        if self.api_key.is_empty() {
            error!(url = %self.url, "No deploy API key configured");
            return Err(DeployError::MissingApiKey);
        }
        let body = std::fs::read(&artifact.path).map_err(|e| {
            error!(error = ?e, path = %artifact.path.display(), "Failed to read archive");
            DeployError::ReadArchive {
                path: artifact.path.clone(),
                source: e,
            }
        })?;
        let bytes = body.len();
        let sha256 = format!("{:x}", Sha256::digest(&body));
        let document_name = artifact.document_name();

        info!(
            url = %self.url,
            document = %document_name,
            bytes,
            sha256 = %sha256,
            "Uploading plugin archive"
        );

        let response = self
            .client
            .post(&self.url)
            .header(CONTENT_TYPE, ARCHIVE_CONTENT_TYPE)
            .header(API_KEY_HEADER, &self.api_key)
            .header(DOCUMENT_NAME_HEADER, &document_name)
            .body(body)
            .send()
            .await
            .map_err(|e| {
                error!(error = ?e, url = %self.url, "Deployment request failed");
                DeployError::Request {
                    url: self.url.clone(),
                    source: e,
                }
            })?;

        let status = response.status();
        let status_line = status.to_string();
        if !status.is_success() {
            error!(url = %self.url, status = %status_line, "Deployment rejected");
            return Err(DeployError::Rejected {
                url: self.url.clone(),
                status: status_line,
            });
        }

        info!(status = %status_line, "Deployment response received");
        Ok(DeployReport {
            status: status_line,
            bytes,
            sha256,
        })
    }
}
