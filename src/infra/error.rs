//! Error types for client workflows.
//! Every submission failure maps onto one of these variants before it is
//! stored in the workflow state and rendered.

use crate::domain::types::OperationKind;
use thiserror::Error;

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;

/// Error taxonomy for workflow submissions and supporting infrastructure
#[derive(Error, Debug, Clone, PartialEq, Eq, miette::Diagnostic)]
pub enum ClientError {
    /// A required input was not selected or is empty. Raised before any
    /// network call.
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// A local input file could not be read or decoded.
    #[error("Read error: {0}")]
    ReadError(String),

    /// The request never produced a response.
    #[error("Network error: {0}")]
    TransportError(String),

    /// The service answered with a non-success status.
    #[error("Service error ({status}): {}", render_service_message(.message, .details.as_deref()))]
    ServiceError {
        status: u16,
        message: String,
        details: Option<String>,
    },

    /// The service answered with success but the body could not be parsed.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("A {0} submission is already in progress")]
    #[diagnostic(help("wait for the running submission to resolve, then resubmit"))]
    SubmissionInProgress(OperationKind),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("IO error: {0}")]
    IoError(String),
}

impl ClientError {
    /// Message suitable for a status line, without the variant label.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            ClientError::ValidationError(msg)
            | ClientError::ReadError(msg)
            | ClientError::MalformedResponse(msg)
            | ClientError::ConfigurationError(msg)
            | ClientError::IoError(msg) => msg.clone(),
            ClientError::TransportError(msg) => format!("Network error: {msg}"),
            ClientError::ServiceError {
                message, details, ..
            } => render_service_message(message, details.as_deref()),
            ClientError::SubmissionInProgress(_) => self.to_string(),
        }
    }
}

fn render_service_message(message: &str, details: Option<&str>) -> String {
    match details {
        Some(details) if !details.is_empty() && details != message => {
            format!("{message} ({details})")
        }
        _ => message.to_string(),
    }
}
