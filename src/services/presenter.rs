//! Result presentation service.
//!
//! Renders an already resolved outcome. Knows nothing about transport; the
//! only inputs are the outcome and the names the user picked.

use crate::adapters::remote::protocol::OCTET_STREAM_MEDIA_TYPE;
use crate::domain::outcome::{Artifact, OperationOutcome, Payload, RenderedResult};

pub const DEFAULT_SIGNATURE_SUFFIX: &str = ".sig";
pub const DEFAULT_VERIFIED_MESSAGE: &str = "Signature is valid";
pub const DEFAULT_GENERATED_MESSAGE: &str = "Certificate and key generated successfully";

/// Name used for a signature when the data file name is unknown.
const FALLBACK_SIGNATURE_STEM: &str = "signature";

/// What the presenter needs to know about the submission.
#[derive(Debug, Clone, Default)]
pub struct PresentContext {
    /// Name of the file that was signed or verified.
    pub source_name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ResultPresenter {
    signature_suffix: String,
}

impl Default for ResultPresenter {
    fn default() -> Self {
        Self::new(DEFAULT_SIGNATURE_SUFFIX)
    }
}

impl ResultPresenter {
    pub fn new(signature_suffix: impl Into<String>) -> Self {
        Self {
            signature_suffix: signature_suffix.into(),
        }
    }

    /// Signature artifact name for a given data file, e.g. `report.pdf` →
    /// `report.pdf.sig`.
    #[must_use]
    pub fn signature_name(&self, source_name: Option<&str>) -> String {
        let stem = source_name
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(FALLBACK_SIGNATURE_STEM);
        format!("{stem}{}", self.signature_suffix)
    }

    #[must_use]
    pub fn present(&self, outcome: &OperationOutcome, context: &PresentContext) -> RenderedResult {
        match outcome {
            OperationOutcome::Success { payload } => self.present_success(payload, context),
            OperationOutcome::Failure { error } => RenderedResult::negative(error.user_message()),
        }
    }

    fn present_success(&self, payload: &Payload, context: &PresentContext) -> RenderedResult {
        match payload {
            Payload::Signature(signature) => {
                let artifact = Artifact::new(
                    self.signature_name(context.source_name.as_deref()),
                    OCTET_STREAM_MEDIA_TYPE,
                    signature.as_bytes().to_vec(),
                );
                if let Some(raw) = signature.decoded_len() {
                    log::debug!("Signature decodes to {raw} raw bytes");
                }
                RenderedResult::positive(format!(
                    "File signed successfully. Signature size: {} bytes",
                    artifact.len()
                ))
                .with_artifact(Some(artifact))
            }
            Payload::Verified { message } => RenderedResult::positive(
                message
                    .clone()
                    .unwrap_or_else(|| DEFAULT_VERIFIED_MESSAGE.to_string()),
            ),
            Payload::Generated { archive, message } => RenderedResult::positive(
                message
                    .clone()
                    .unwrap_or_else(|| DEFAULT_GENERATED_MESSAGE.to_string()),
            )
            .with_artifact(archive.clone()),
        }
    }
}
