//! Service layer: reading inputs, assembling requests, driving a
//! submission and rendering its result.

pub mod controller;
pub mod ingest;
pub mod presenter;
pub mod request_builder;

pub use controller::{OperationController, Submission};
pub use ingest::{FileIngestor, Selection};
pub use presenter::{PresentContext, ResultPresenter};
pub use request_builder::RequestBuilder;
