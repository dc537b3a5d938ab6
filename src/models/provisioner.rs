//! Model artifact provisioning.
//!
//! The classifier is cached at a fixed local path. When the file is
//! missing it is fetched once from a fixed URL and the response body is
//! written to disk as-is. There is no retry and no checksum.

use crate::config::ModelConfig;
use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Shown when the model is ready
pub const PROVISION_OK: &str = "Model downloaded successfully.";
/// Shown when the model could not be fetched; the form is suppressed
pub const PROVISION_FAILED: &str = "Model download failed, please email the author.";

/// How the model file became available
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provisioned {
    /// File was already cached
    Cached,
    /// File was downloaded now
    Downloaded { bytes: usize },
}

/// Ensures the model file exists locally
pub struct ModelProvisioner {
    path: PathBuf,
    url: String,
    client: reqwest::Client,
}

impl ModelProvisioner {
    pub fn new<P: Into<PathBuf>>(path: P, url: &str) -> Self {
        Self {
            path: path.into(),
            url: url.to_string(),
            client: reqwest::Client::new(),
        }
    }

    pub fn from_config(config: &ModelConfig) -> Self {
        Self::new(config.path.clone(), &config.url)
    }

    /// Local path of the model file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Return immediately if the file exists, otherwise download it
    pub async fn ensure(&self) -> Result<Provisioned> {
        if self.path.exists() {
            debug!(path = %self.path.display(), "Model file already cached");
            return Ok(Provisioned::Cached);
        }

        info!(url = %self.url, path = %self.path.display(), "Downloading model");

        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .with_context(|| format!("Failed to fetch model from {}", self.url))?;

        let status = response.status();
        if !status.is_success() {
            bail!("Model download from {} returned HTTP {}", self.url, status);
        }

        let body = response
            .bytes()
            .await
            .context("Failed to read model download body")?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
        }

        tokio::fs::write(&self.path, &body)
            .await
            .with_context(|| format!("Failed to write model to {}", self.path.display()))?;

        info!(bytes = body.len(), path = %self.path.display(), "Model downloaded");

        Ok(Provisioned::Downloaded { bytes: body.len() })
    }
}
