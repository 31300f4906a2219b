//! Request assembly service.
//!
//! Pure step between ingestion and transport: checks the required-parts
//! invariant and frames each part, without looking at file contents.

use crate::domain::request::{OperationRequest, PartBody, RequestPart};
use crate::domain::types::{InputFile, OperationKind, PartName, ReadMode};
use crate::infra::error::{ClientError, ClientResult};
use std::collections::BTreeMap;

#[derive(Debug, Default, Clone, Copy)]
pub struct RequestBuilder;

impl RequestBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Build a request for `kind` from the ingested parts.
    ///
    /// Binary parts keep their source file name; text parts are passed
    /// through verbatim. Parts the operation does not use are ignored.
    ///
    /// # Errors
    /// Returns `ValidationError` naming the first required part that is
    /// missing or empty.
    pub fn build(
        &self,
        kind: OperationKind,
        mut parts: BTreeMap<PartName, InputFile>,
    ) -> ClientResult<OperationRequest> {
        let mut framed = Vec::with_capacity(kind.required_parts().len());

        for &(name, mode) in kind.required_parts() {
            let file = parts.remove(&name).ok_or_else(|| {
                ClientError::ValidationError(format!(
                    "Missing required `{name}` file for {kind}"
                ))
            })?;

            if file.content.is_empty() {
                return Err(ClientError::ValidationError(format!(
                    "Required `{name}` file {} is empty",
                    file.name
                )));
            }

            let body = match mode {
                ReadMode::Binary => PartBody::Binary {
                    file_name: file.name,
                    bytes: file.content.into_bytes(),
                },
                ReadMode::Text => PartBody::Text(file.content.into_text()?),
            };
            framed.push(RequestPart { name, body });
        }

        if !parts.is_empty() {
            log::debug!(
                "Ignoring {} part(s) not used by {kind}: {:?}",
                parts.len(),
                parts.keys().collect::<Vec<_>>()
            );
        }

        Ok(OperationRequest {
            kind,
            parts: framed,
        })
    }
}
