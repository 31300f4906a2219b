//! Protocol definitions for the remote signing service.
//!
//! Defines the JSON bodies returned by the service and how a raw HTTP
//! response is turned into a payload or an error for each operation.

use crate::domain::outcome::{Artifact, Payload, SignatureBlob};
use crate::domain::types::OperationKind;
use crate::infra::error::{ClientError, ClientResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default endpoint paths of the service.
pub mod endpoints {
    pub const GENERATE: &str = "/api/generate";
    pub const SIGN: &str = "/api/sign";
    pub const VERIFY: &str = "/api/verify";
}

/// Media type used for archives and opaque downloads.
pub const ZIP_MEDIA_TYPE: &str = "application/zip";
pub const OCTET_STREAM_MEDIA_TYPE: &str = "application/octet-stream";

/// Successful sign response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignResponse {
    /// Signature as text (base64 on the reference service).
    pub signature: String,
}

/// Successful verify response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VerifyResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Informational generate response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerateResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Error body returned with a non-success status.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Response as received from the transport, before interpretation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub content_disposition: Option<String>,
    pub body: Vec<u8>,
}

impl RawResponse {
    /// JSON response with the given status.
    pub fn json(status: u16, body: &serde_json::Value) -> Self {
        Self {
            status,
            content_type: Some("application/json".to_string()),
            content_disposition: None,
            body: body.to_string().into_bytes(),
        }
    }

    /// Plain-text response with the given status.
    pub fn text(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            content_type: Some("text/plain; charset=utf-8".to_string()),
            content_disposition: None,
            body: body.into().into_bytes(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    fn media_type(&self) -> Option<String> {
        self.content_type.as_deref().map(|value| {
            value
                .split(';')
                .next()
                .unwrap_or_default()
                .trim()
                .to_ascii_lowercase()
        })
    }

    fn is_attachment(&self) -> bool {
        self.content_disposition
            .as_deref()
            .is_some_and(|value| value.trim_start().to_ascii_lowercase().starts_with("attachment"))
    }

    /// File name suggested by `Content-Disposition`, reduced to its last
    /// path component.
    #[must_use]
    pub fn suggested_file_name(&self) -> Option<String> {
        let header = self.content_disposition.as_deref()?;
        let raw = disposition_params(header)
            .into_iter()
            .find_map(|(key, value)| key.eq_ignore_ascii_case("filename").then_some(value))?;

        Path::new(&raw)
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .filter(|name| !name.is_empty())
    }
}

/// Split `Content-Disposition` parameters into key/value pairs. Quoted
/// values may contain `;` and backslash escapes.
fn disposition_params(header: &str) -> Vec<(String, String)> {
    let mut params = Vec::new();
    let mut chars = header.chars().peekable();

    // disposition type
    for c in chars.by_ref() {
        if c == ';' {
            break;
        }
    }

    while chars.peek().is_some() {
        let key: String = chars.by_ref().take_while(|&c| c != '=').collect();
        while chars.next_if(|c| c.is_whitespace()).is_some() {}

        let mut value = String::new();
        if chars.next_if_eq(&'"').is_some() {
            while let Some(c) = chars.next() {
                match c {
                    '"' => break,
                    '\\' => value.extend(chars.next()),
                    _ => value.push(c),
                }
            }
            for c in chars.by_ref() {
                if c == ';' {
                    break;
                }
            }
        } else {
            value = chars.by_ref().take_while(|&c| c != ';').collect();
        }

        let key = key.trim();
        if !key.is_empty() {
            params.push((key.to_string(), value.trim().to_string()));
        }
    }
    params
}

/// Interprets raw responses per operation kind.
#[derive(Debug, Clone)]
pub struct ResponseParser {
    credentials_file_name: String,
}

impl ResponseParser {
    /// `credentials_file_name` names a returned credentials archive when
    /// the service does not suggest a name itself.
    pub fn new(credentials_file_name: impl Into<String>) -> Self {
        Self {
            credentials_file_name: credentials_file_name.into(),
        }
    }

    /// Turn a response into a payload.
    ///
    /// # Errors
    /// `ServiceError` for non-success statuses, `MalformedResponse` when a
    /// success body does not have the expected shape.
    pub fn parse(&self, kind: OperationKind, response: RawResponse) -> ClientResult<Payload> {
        if !response.is_success() {
            return Err(error_from_response(&response));
        }

        match kind {
            OperationKind::Generate => Ok(self.parse_generate(response)),
            OperationKind::Sign => {
                let body: SignResponse = serde_json::from_slice(&response.body).map_err(|e| {
                    ClientError::MalformedResponse(format!("Invalid sign response: {e}"))
                })?;
                Ok(Payload::Signature(SignatureBlob::new(body.signature)))
            }
            OperationKind::Verify => {
                let body: VerifyResponse = serde_json::from_slice(&response.body).map_err(|e| {
                    ClientError::MalformedResponse(format!("Invalid verify response: {e}"))
                })?;
                Ok(Payload::Verified {
                    message: body.message.filter(|m| !m.trim().is_empty()),
                })
            }
        }
    }

    fn parse_generate(&self, response: RawResponse) -> Payload {
        if response.body.is_empty() {
            return Payload::Generated {
                archive: None,
                message: None,
            };
        }

        let media_type = response.media_type();
        let is_archive = response.is_attachment()
            || matches!(
                media_type.as_deref(),
                Some(ZIP_MEDIA_TYPE | OCTET_STREAM_MEDIA_TYPE)
            );

        if is_archive {
            let name = response
                .suggested_file_name()
                .unwrap_or_else(|| self.credentials_file_name.clone());
            let media_type = media_type.unwrap_or_else(|| ZIP_MEDIA_TYPE.to_string());
            return Payload::Generated {
                archive: Some(Artifact::new(name, media_type, response.body)),
                message: None,
            };
        }

        // informational body: JSON status/message or plain text
        let message = match serde_json::from_slice::<GenerateResponse>(&response.body) {
            Ok(body) => body.message.or(body.status),
            Err(_) => Some(String::from_utf8_lossy(&response.body).trim().to_string()),
        };
        Payload::Generated {
            archive: None,
            message: message.filter(|m| !m.is_empty()),
        }
    }
}

/// Build the most specific error available from a non-success response:
/// the structured `error`/`details` body, then a plain-text body, then a
/// generic status message.
#[must_use]
pub fn error_from_response(response: &RawResponse) -> ClientError {
    let status = response.status;

    if let Ok(body) = serde_json::from_slice::<ErrorResponse>(&response.body) {
        let details = body.details.filter(|d| !d.trim().is_empty());
        match body.error.filter(|e| !e.trim().is_empty()) {
            Some(message) => {
                return ClientError::ServiceError {
                    status,
                    message,
                    details,
                }
            }
            None => {
                if let Some(message) = details {
                    return ClientError::ServiceError {
                        status,
                        message,
                        details: None,
                    };
                }
            }
        }
    } else {
        let text = String::from_utf8_lossy(&response.body).trim().to_string();
        if !text.is_empty() {
            return ClientError::ServiceError {
                status,
                message: text,
                details: None,
            };
        }
    }

    ClientError::ServiceError {
        status,
        message: format!("Request failed with status {status}"),
        details: None,
    }
}
