//! `VerifyWorkflow`: checks a detached signature against data and a
//! certificate.

use super::configured_controller;
use crate::adapters::remote::client::HttpTransport;
use crate::adapters::transport::Transport;
use crate::domain::outcome::RenderedResult;
use crate::domain::types::{FileHandle, OperationKind, PartName};
use crate::infra::config::ClientConfiguration;
use crate::infra::error::ClientResult;
use crate::infra::progress::ProgressReporter;
use crate::services::controller::{OperationController, Submission};
use std::sync::Arc;

pub struct VerifyWorkflow<T> {
    controller: OperationController<T>,
}

impl VerifyWorkflow<HttpTransport> {
    /// # Errors
    /// `ConfigurationError` for an invalid service URL, `TransportError` if
    /// the HTTP client cannot be built.
    pub fn from_config(config: &ClientConfiguration) -> ClientResult<Self> {
        let transport = HttpTransport::new(config.remote_service()?)?;
        Ok(Self::with_config(transport, config))
    }
}

impl<T: Transport> VerifyWorkflow<T> {
    pub fn new(transport: T) -> Self {
        Self::with_config(transport, &ClientConfiguration::default())
    }

    pub fn with_config(transport: T, config: &ClientConfiguration) -> Self {
        Self {
            controller: configured_controller(OperationKind::Verify, transport, config),
        }
    }

    #[must_use]
    pub fn with_progress(mut self, progress: Arc<dyn ProgressReporter>) -> Self {
        self.controller = self.controller.with_progress(progress);
        self
    }

    /// Ask the service whether `signature` over `data` is valid for `cert`.
    /// A rejected signature is a negative result, not an error.
    ///
    /// # Errors
    /// `SubmissionInProgress` if a verify request is already running.
    pub async fn verify(
        &self,
        data: impl Into<FileHandle>,
        signature: impl Into<FileHandle>,
        cert: impl Into<FileHandle>,
    ) -> ClientResult<RenderedResult> {
        let submission = Submission::new()
            .with(PartName::Data, data)
            .with(PartName::Signature, signature)
            .with(PartName::Certificate, cert);
        self.controller.submit(&submission).await
    }

    pub fn controller(&self) -> &OperationController<T> {
        &self.controller
    }
}
