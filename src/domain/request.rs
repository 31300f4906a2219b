//! Transport-agnostic request model produced by the request builder.

use super::types::{OperationKind, PartName};

/// Framing of a single request part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartBody {
    /// Raw bytes sent as a file part.
    Binary { file_name: String, bytes: Vec<u8> },
    /// Text sent verbatim as a plain form field.
    Text(String),
}

impl PartBody {
    pub fn len(&self) -> usize {
        match self {
            PartBody::Binary { bytes, .. } => bytes.len(),
            PartBody::Text(text) => text.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestPart {
    pub name: PartName,
    pub body: PartBody,
}

/// An operation ready for dispatch. Parts appear in the operation's
/// required order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationRequest {
    pub kind: OperationKind,
    pub parts: Vec<RequestPart>,
}

impl OperationRequest {
    pub fn part(&self, name: PartName) -> Option<&RequestPart> {
        self.parts.iter().find(|part| part.name == name)
    }

    /// Total payload size in bytes, used for logging.
    pub fn payload_len(&self) -> usize {
        self.parts.iter().map(|part| part.body.len()).sum()
    }
}
