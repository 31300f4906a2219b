//! `SignWorkflow`: detached signing of one data file with a text key.

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

pub struct SignWorkflow<T> {
    controller: OperationController<T>,
}

impl SignWorkflow<HttpTransport> {
    /// Workflow talking to the service described by `config`.
    ///
    /// # Errors
    /// `ConfigurationError` for an invalid service URL, `TransportError` if
    /// the HTTP client cannot be built.
    pub fn from_config(config: &ClientConfiguration) -> ClientResult<Self> {
        let transport = HttpTransport::new(config.remote_service()?)?;
        Ok(Self::with_config(transport, config))
    }
}

impl<T: Transport> SignWorkflow<T> {
    pub fn new(transport: T) -> Self {
        Self::with_config(transport, &ClientConfiguration::default())
    }

    pub fn with_config(transport: T, config: &ClientConfiguration) -> Self {
        Self {
            controller: configured_controller(OperationKind::Sign, transport, config),
        }
    }

    #[must_use]
    pub fn with_progress(mut self, progress: Arc<dyn ProgressReporter>) -> Self {
        self.controller = self.controller.with_progress(progress);
        self
    }

    /// Sign `data` with the PEM `key`. The signature, when produced, is the
    /// artifact of the returned result.
    ///
    /// # Errors
    /// `SubmissionInProgress` if a sign request is already running.
    pub async fn sign(
        &self,
        data: impl Into<FileHandle>,
        key: impl Into<FileHandle>,
    ) -> ClientResult<RenderedResult> {
        let submission = Submission::new()
            .with(PartName::Data, data)
            .with(PartName::Key, key);
        self.controller.submit(&submission).await
    }

    pub fn controller(&self) -> &OperationController<T> {
        &self.controller
    }
}
