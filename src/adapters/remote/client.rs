//! HTTP client for the remote signing service.
//!
//! Turns assembled requests into multipart POSTs and hands back the raw
//! response for the workflow controller to interpret.

use super::protocol::{
    endpoints, error_from_response, RawResponse, OCTET_STREAM_MEDIA_TYPE, ZIP_MEDIA_TYPE,
};
use crate::adapters::download::save_artifact;
use crate::adapters::transport::Transport;
use crate::domain::outcome::Artifact;
use crate::domain::request::{OperationRequest, PartBody};
use crate::domain::types::{OperationKind, ServiceUrl};
use crate::infra::error::{ClientError, ClientResult};
use reqwest::header::{HeaderName, CONTENT_DISPOSITION, CONTENT_TYPE};
use reqwest::multipart::{Form, Part};
use std::path::{Path, PathBuf};

/// Configuration for connecting to the signing service.
#[derive(Debug, Clone)]
pub struct RemoteServiceConfig {
    /// Base URL of the service (e.g., `http://localhost:8080`).
    pub base_url: ServiceUrl,
    pub generate_path: String,
    pub sign_path: String,
    pub verify_path: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// Whether to verify TLS certificates (should be true in production).
    pub verify_tls: bool,
}

impl RemoteServiceConfig {
    /// Configuration with the default endpoint paths and a 30 second
    /// timeout.
    #[must_use]
    pub fn new(base_url: ServiceUrl) -> Self {
        Self {
            base_url,
            generate_path: endpoints::GENERATE.to_string(),
            sign_path: endpoints::SIGN.to_string(),
            verify_path: endpoints::VERIFY.to_string(),
            timeout_secs: 30,
            verify_tls: true,
        }
    }

    /// Set the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Override the path of one operation's endpoint.
    #[must_use]
    pub fn with_endpoint(mut self, kind: OperationKind, path: impl Into<String>) -> Self {
        let path = path.into();
        match kind {
            OperationKind::Generate => self.generate_path = path,
            OperationKind::Sign => self.sign_path = path,
            OperationKind::Verify => self.verify_path = path,
        }
        self
    }

    /// Disable TLS verification (for testing only!).
    #[must_use]
    pub fn with_insecure_tls(mut self) -> Self {
        self.verify_tls = false;
        self
    }

    /// Full URL of an operation's endpoint.
    #[must_use]
    pub fn endpoint_url(&self, kind: OperationKind) -> String {
        let path = match kind {
            OperationKind::Generate => &self.generate_path,
            OperationKind::Sign => &self.sign_path,
            OperationKind::Verify => &self.verify_path,
        };
        self.base_url.join(path)
    }
}

/// reqwest-backed transport.
pub struct HttpTransport {
    config: RemoteServiceConfig,
    client: reqwest::Client,
}

impl HttpTransport {
    /// Create a new HTTP transport.
    ///
    /// # Errors
    /// Returns error if HTTP client creation fails.
    pub fn new(config: RemoteServiceConfig) -> ClientResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .danger_accept_invalid_certs(!config.verify_tls)
            .build()
            .map_err(|e| {
                ClientError::TransportError(format!("Failed to create HTTP client: {e}"))
            })?;

        Ok(Self { config, client })
    }

    pub fn config(&self) -> &RemoteServiceConfig {
        &self.config
    }

    /// Fetch the credentials archive with a plain GET on the generate
    /// endpoint and save it into `dir`. This bypasses the workflow
    /// controller entirely.
    ///
    /// # Errors
    /// `TransportError` if the service is unreachable, `ServiceError` for a
    /// non-success status, `IoError` if the archive cannot be written.
    pub async fn download_credentials(
        &self,
        dir: &Path,
        fallback_name: &str,
    ) -> ClientResult<PathBuf> {
        let url = self.config.endpoint_url(OperationKind::Generate);
        log::info!("Downloading credentials from {url}");

        let response = self.client.get(&url).send().await.map_err(|e| {
            ClientError::TransportError(format!("Failed to connect to {url}: {e}"))
        })?;
        let raw = read_response(response).await?;

        if !raw.is_success() {
            return Err(error_from_response(&raw));
        }

        let name = raw
            .suggested_file_name()
            .unwrap_or_else(|| fallback_name.to_string());
        let media_type = raw
            .content_type
            .clone()
            .unwrap_or_else(|| ZIP_MEDIA_TYPE.to_string());
        save_artifact(&Artifact::new(name, media_type, raw.body), dir).await
    }

    fn build_form(request: &OperationRequest) -> ClientResult<Form> {
        let mut form = Form::new();
        for part in &request.parts {
            let field = part.name.field_name();
            form = match &part.body {
                PartBody::Binary { file_name, bytes } => {
                    let file_part = Part::bytes(bytes.clone())
                        .file_name(file_name.clone())
                        .mime_str(OCTET_STREAM_MEDIA_TYPE)
                        .map_err(|e| {
                            ClientError::TransportError(format!(
                                "Failed to frame `{field}` part: {e}"
                            ))
                        })?;
                    form.part(field, file_part)
                }
                PartBody::Text(text) => form.text(field, text.clone()),
            };
        }
        Ok(form)
    }
}

impl Transport for HttpTransport {
    async fn dispatch(&self, request: &OperationRequest) -> ClientResult<RawResponse> {
        let url = self.config.endpoint_url(request.kind);
        log::debug!(
            "POST {url}: {} part(s), {} bytes",
            request.parts.len(),
            request.payload_len()
        );

        let mut builder = self.client.post(&url);
        if !request.parts.is_empty() {
            builder = builder.multipart(Self::build_form(request)?);
        }

        let response = builder.send().await.map_err(|e| {
            ClientError::TransportError(format!("Failed to connect to {url}: {e}"))
        })?;

        read_response(response).await
    }
}

async fn read_response(response: reqwest::Response) -> ClientResult<RawResponse> {
    let status = response.status().as_u16();
    let header = |name: HeaderName| {
        response
            .headers()
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
    };
    let content_type = header(CONTENT_TYPE);
    let content_disposition = header(CONTENT_DISPOSITION);

    let body = response.bytes().await.map_err(|e| {
        ClientError::TransportError(format!("Failed to read response body: {e}"))
    })?;

    log::debug!("Response {status}: {} bytes", body.len());
    Ok(RawResponse {
        status,
        content_type,
        content_disposition,
        body: body.to_vec(),
    })
}
