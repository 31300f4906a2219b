//! Transport seam between the workflow controller and the remote service.

use crate::adapters::remote::protocol::RawResponse;
use crate::domain::request::OperationRequest;
use crate::infra::error::ClientResult;
use std::future::Future;
use std::sync::Arc;

/// Something that can carry an `OperationRequest` to the service and bring
/// back whatever it answered.
///
/// Implementations return `Err(TransportError)` only when no response was
/// received; any HTTP status, including errors, is a `RawResponse`.
pub trait Transport {
    fn dispatch(&self, request: &OperationRequest)
        -> impl Future<Output = ClientResult<RawResponse>>;
}

impl<T: Transport> Transport for Arc<T> {
    fn dispatch(
        &self,
        request: &OperationRequest,
    ) -> impl Future<Output = ClientResult<RawResponse>> {
        (**self).dispatch(request)
    }
}

impl<T: Transport> Transport for &T {
    fn dispatch(
        &self,
        request: &OperationRequest,
    ) -> impl Future<Output = ClientResult<RawResponse>> {
        (**self).dispatch(request)
    }
}
