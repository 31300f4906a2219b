//! Type-safe wrappers for workflow inputs.
//!
//! Operation kinds, part names and input files are modelled as distinct
//! types so a request can only be assembled from parts the operation knows.

use crate::infra::error::{ClientError, ClientResult};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// The three operations offered by the remote service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Generate,
    Sign,
    Verify,
}

impl OperationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Generate => "generate",
            OperationKind::Sign => "sign",
            OperationKind::Verify => "verify",
        }
    }

    /// Parts that must be present and non-empty before dispatch, in
    /// transmission order, together with the mode each one is read in.
    #[must_use]
    pub fn required_parts(&self) -> &'static [(PartName, ReadMode)] {
        match self {
            OperationKind::Generate => &[],
            OperationKind::Sign => &[
                (PartName::Data, ReadMode::Binary),
                (PartName::Key, ReadMode::Text),
            ],
            OperationKind::Verify => &[
                (PartName::Data, ReadMode::Binary),
                (PartName::Signature, ReadMode::Text),
                (PartName::Certificate, ReadMode::Text),
            ],
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OperationKind {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "generate" => Ok(OperationKind::Generate),
            "sign" => Ok(OperationKind::Sign),
            "verify" => Ok(OperationKind::Verify),
            other => Err(ClientError::ValidationError(format!(
                "Unknown operation: {other}"
            ))),
        }
    }
}

/// Named multipart field of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PartName {
    Data,
    Key,
    Signature,
    Certificate,
}

impl PartName {
    /// Field name on the wire.
    pub fn field_name(&self) -> &'static str {
        match self {
            PartName::Data => "data",
            PartName::Key => "key",
            PartName::Signature => "signature",
            PartName::Certificate => "cert",
        }
    }
}

impl fmt::Display for PartName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.field_name())
    }
}

/// How a selected file is read into memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadMode {
    Binary,
    Text,
}

/// A user selection that has not been read yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHandle(PathBuf);

impl FileHandle {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileHandle(path.into())
    }

    pub fn path(&self) -> &Path {
        &self.0
    }

    /// File name shown to the user and sent as the multipart file name.
    #[must_use]
    pub fn display_name(&self) -> String {
        self.0
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.0.display().to_string())
    }
}

impl From<&Path> for FileHandle {
    fn from(path: &Path) -> Self {
        FileHandle::new(path)
    }
}

impl From<&PathBuf> for FileHandle {
    fn from(path: &PathBuf) -> Self {
        FileHandle(path.clone())
    }
}

impl From<PathBuf> for FileHandle {
    fn from(path: PathBuf) -> Self {
        FileHandle(path)
    }
}

impl From<&str> for FileHandle {
    fn from(path: &str) -> Self {
        FileHandle(PathBuf::from(path))
    }
}

/// In-memory contents of an ingested file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileContent {
    Binary(Vec<u8>),
    Text(String),
}

impl FileContent {
    pub fn len(&self) -> usize {
        match self {
            FileContent::Binary(bytes) => bytes.len(),
            FileContent::Text(text) => text.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            FileContent::Binary(bytes) => bytes,
            FileContent::Text(text) => text.as_bytes(),
        }
    }

    /// Content as bytes regardless of how it was read.
    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            FileContent::Binary(bytes) => bytes,
            FileContent::Text(text) => text.into_bytes(),
        }
    }

    /// Content as text. Binary content must be valid UTF-8.
    pub fn into_text(self) -> ClientResult<String> {
        match self {
            FileContent::Text(text) => Ok(text),
            FileContent::Binary(bytes) => String::from_utf8(bytes).map_err(|e| {
                ClientError::ReadError(format!("content is not valid UTF-8 text: {e}"))
            }),
        }
    }
}

/// A named file read into memory for one submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputFile {
    pub name: String,
    pub content: FileContent,
    pub kind: PartName,
}

impl InputFile {
    pub fn binary(name: impl Into<String>, kind: PartName, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            content: FileContent::Binary(bytes.into()),
            kind,
        }
    }

    pub fn text(name: impl Into<String>, kind: PartName, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: FileContent::Text(text.into()),
            kind,
        }
    }
}

/// Validated base URL of the remote service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceUrl(String);

impl ServiceUrl {
    /// Create a new `ServiceUrl` after validation. A trailing slash is
    /// dropped so endpoint paths can be appended directly.
    pub fn new(url: impl AsRef<str>) -> ClientResult<Self> {
        let url = url.as_ref().trim();
        Self::validate_url(url)?;
        Ok(ServiceUrl(url.trim_end_matches('/').to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Join an endpoint path such as `/api/sign`.
    #[must_use]
    pub fn join(&self, path: &str) -> String {
        format!("{}/{}", self.0, path.trim_start_matches('/'))
    }

    fn validate_url(url: &str) -> ClientResult<()> {
        let Some(rest) = url
            .strip_prefix("https://")
            .or_else(|| url.strip_prefix("http://"))
        else {
            return Err(ClientError::ValidationError(format!(
                "Service URL must start with http:// or https://, got: {url}"
            )));
        };

        let host = rest.split(['/', '?', '#']).next().unwrap_or_default();
        if host.is_empty() || host.starts_with(':') {
            return Err(ClientError::ValidationError(format!(
                "Service URL must contain a host: {url}"
            )));
        }

        if url.chars().any(char::is_whitespace) {
            return Err(ClientError::ValidationError(format!(
                "Service URL must not contain whitespace: {url}"
            )));
        }

        Ok(())
    }
}

impl FromStr for ServiceUrl {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl fmt::Display for ServiceUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
