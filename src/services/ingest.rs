//! File ingestion service.
//!
//! Reads selected files fully into memory before a request is assembled.
//! Each read is a suspension point; several files for one submission are
//! read concurrently and the caller resumes once all of them resolved.

use crate::domain::types::{FileContent, FileHandle, InputFile, PartName, ReadMode};
use crate::infra::error::{ClientError, ClientResult};
use futures::future::try_join_all;

/// A selected file together with the part it fills and how it is read.
#[derive(Debug, Clone)]
pub struct Selection {
    pub handle: FileHandle,
    pub part: PartName,
    pub mode: ReadMode,
}

/// Stateless file reader.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileIngestor;

impl FileIngestor {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Read one file. Text mode requires valid UTF-8. An empty file yields
    /// an empty buffer; emptiness is judged later by the request builder.
    ///
    /// # Errors
    /// Returns `ReadError` if the file cannot be opened, read or decoded.
    pub async fn ingest(
        &self,
        handle: &FileHandle,
        mode: ReadMode,
        part: PartName,
    ) -> ClientResult<InputFile> {
        let name = handle.display_name();
        let bytes = tokio::fs::read(handle.path()).await.map_err(|e| {
            ClientError::ReadError(format!(
                "Failed to read {part} file {}: {e}",
                handle.path().display()
            ))
        })?;

        let content = match mode {
            ReadMode::Binary => FileContent::Binary(bytes),
            ReadMode::Text => FileContent::Text(String::from_utf8(bytes).map_err(|_| {
                ClientError::ReadError(format!("{part} file {name} is not valid UTF-8 text"))
            })?),
        };

        log::debug!("Ingested {part} file {name}: {} bytes", content.len());
        Ok(InputFile {
            name,
            content,
            kind: part,
        })
    }

    /// Read all selections concurrently, preserving selection order.
    ///
    /// # Errors
    /// Fails with the first `ReadError` encountered; no partial result is
    /// returned.
    pub async fn ingest_all(&self, selections: &[Selection]) -> ClientResult<Vec<InputFile>> {
        try_join_all(
            selections
                .iter()
                .map(|selection| self.ingest(&selection.handle, selection.mode, selection.part)),
        )
        .await
    }
}
