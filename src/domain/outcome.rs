//! Outcomes and lifecycle state of a workflow instance.

use crate::infra::error::ClientError;
use base64::Engine;

/// A downloadable byte payload produced by a successful operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub name: String,
    pub media_type: String,
    pub bytes: Vec<u8>,
}

impl Artifact {
    pub fn new(name: impl Into<String>, media_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            media_type: media_type.into(),
            bytes,
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Detached signature exactly as returned by the service.
///
/// The service encodes signatures as base64 text and expects the same text
/// back on verification, so the blob is kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureBlob(Vec<u8>);

impl SignatureBlob {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        SignatureBlob(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Length of the raw signature when the blob is base64 text.
    #[must_use]
    pub fn decoded_len(&self) -> Option<usize> {
        let text = std::str::from_utf8(&self.0).ok()?;
        base64::engine::general_purpose::STANDARD
            .decode(text.trim())
            .ok()
            .map(|raw| raw.len())
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }
}

/// Parsed payload of a successful response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// Key and certificate were generated. The service may hand back the
    /// credentials archive directly.
    Generated {
        archive: Option<Artifact>,
        message: Option<String>,
    },
    Signature(SignatureBlob),
    Verified { message: Option<String> },
}

/// Result of a dispatched (or locally rejected) submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationOutcome {
    Success { payload: Payload },
    Failure { error: ClientError },
}

impl OperationOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, OperationOutcome::Success { .. })
    }
}

impl From<Result<Payload, ClientError>> for OperationOutcome {
    fn from(result: Result<Payload, ClientError>) -> Self {
        match result {
            Ok(payload) => OperationOutcome::Success { payload },
            Err(error) => OperationOutcome::Failure { error },
        }
    }
}

/// Whether a rendered result reads as good or bad news.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Positive,
    Negative,
}

/// What the user sees once a submission resolves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedResult {
    pub tone: Tone,
    pub message: String,
    pub artifact: Option<Artifact>,
}

impl RenderedResult {
    pub fn positive(message: impl Into<String>) -> Self {
        Self {
            tone: Tone::Positive,
            message: message.into(),
            artifact: None,
        }
    }

    pub fn negative(message: impl Into<String>) -> Self {
        Self {
            tone: Tone::Negative,
            message: message.into(),
            artifact: None,
        }
    }

    #[must_use]
    pub fn with_artifact(mut self, artifact: Option<Artifact>) -> Self {
        self.artifact = artifact;
        self
    }

    pub fn is_positive(&self) -> bool {
        self.tone == Tone::Positive
    }
}

/// Lifecycle state of one workflow instance.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum OperationState {
    #[default]
    Idle,
    Submitting,
    Succeeded(Payload),
    Failed(ClientError),
}

impl OperationState {
    /// Whether a new submission may start from this state.
    pub fn accepts_submission(&self) -> bool {
        !matches!(self, OperationState::Submitting)
    }

    pub fn name(&self) -> &'static str {
        match self {
            OperationState::Idle => "idle",
            OperationState::Submitting => "submitting",
            OperationState::Succeeded(_) => "succeeded",
            OperationState::Failed(_) => "failed",
        }
    }
}

impl From<OperationOutcome> for OperationState {
    fn from(outcome: OperationOutcome) -> Self {
        match outcome {
            OperationOutcome::Success { payload } => OperationState::Succeeded(payload),
            OperationOutcome::Failure { error } => OperationState::Failed(error),
        }
    }
}
