//! `GenerateWorkflow`: asks the service for a fresh certificate and key.
//!
//! A successful run unlocks the two download controls. The manual download
//! is a separate path that fetches the archive directly.

use super::configured_controller;
use crate::adapters::remote::client::HttpTransport;
use crate::adapters::transport::Transport;
use crate::domain::context::Control;
use crate::domain::outcome::RenderedResult;
use crate::domain::types::OperationKind;
use crate::infra::config::ClientConfiguration;
use crate::infra::error::ClientResult;
use crate::infra::progress::ProgressReporter;
use crate::services::controller::{OperationController, Submission};
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub const DOWNLOAD_CERTIFICATE: &str = "download-certificate";
pub const DOWNLOAD_KEY: &str = "download-key";

pub struct GenerateWorkflow<T> {
    controller: OperationController<T>,
    download_certificate: Control,
    download_key: Control,
    credentials_file_name: String,
}

impl GenerateWorkflow<HttpTransport> {
    /// # Errors
    /// `ConfigurationError` for an invalid service URL, `TransportError` if
    /// the HTTP client cannot be built.
    pub fn from_config(config: &ClientConfiguration) -> ClientResult<Self> {
        let transport = HttpTransport::new(config.remote_service()?)?;
        Ok(Self::with_config(transport, config))
    }

    /// Fetch the credentials archive into `dir` without going through the
    /// controller. Usable whether or not a generate run succeeded.
    ///
    /// # Errors
    /// Transport, service or I/O errors from the download.
    pub async fn download(&self, dir: &Path) -> ClientResult<PathBuf> {
        self.controller
            .transport()
            .download_credentials(dir, &self.credentials_file_name)
            .await
    }
}

impl<T: Transport> GenerateWorkflow<T> {
    pub fn new(transport: T) -> Self {
        Self::with_config(transport, &ClientConfiguration::default())
    }

    pub fn with_config(transport: T, config: &ClientConfiguration) -> Self {
        let download_certificate = Control::disabled(DOWNLOAD_CERTIFICATE);
        let download_key = Control::disabled(DOWNLOAD_KEY);
        let controller = configured_controller(OperationKind::Generate, transport, config)
            .with_success_controls(vec![download_certificate.clone(), download_key.clone()]);
        Self {
            controller,
            download_certificate,
            download_key,
            credentials_file_name: config.credentials_file_name.clone(),
        }
    }

    #[must_use]
    pub fn with_progress(mut self, progress: Arc<dyn ProgressReporter>) -> Self {
        self.controller = self.controller.with_progress(progress);
        self
    }

    /// # Errors
    /// `SubmissionInProgress` if a generate request is already running.
    pub async fn generate(&self) -> ClientResult<RenderedResult> {
        self.controller.submit(&Submission::new()).await
    }

    pub fn download_certificate(&self) -> &Control {
        &self.download_certificate
    }

    pub fn download_key(&self) -> &Control {
        &self.download_key
    }

    pub fn controller(&self) -> &OperationController<T> {
        &self.controller
    }
}
