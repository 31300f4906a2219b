//! Digisign client library
//!
//! Client side of a remote signing service: generate a certificate and key,
//! produce detached signatures and verify them. Every operation runs
//! through one `OperationController` that reads the selected files, builds
//! the multipart request, sends it and renders the answer.
//!
//! Layered layout:
//! - `domain`: plain data types, request/outcome models, per-workflow state
//! - `services`: ingestion, request building, the controller, presentation
//! - `adapters`: HTTP transport and local artifact storage
//! - `pipelines`: typed facades for the three operations
//! - `infra`: errors, configuration, progress display

pub mod adapters;
pub mod domain;
pub mod infra;
pub mod pipelines;
pub mod services;

pub use adapters::download::save_artifact;
pub use adapters::remote::client::{HttpTransport, RemoteServiceConfig};
pub use adapters::transport::Transport;
pub use domain::context::{Control, WorkflowContext};
pub use domain::outcome::{
    Artifact, OperationOutcome, OperationState, Payload, RenderedResult, SignatureBlob, Tone,
};
pub use domain::types::{FileHandle, InputFile, OperationKind, PartName, ReadMode, ServiceUrl};
pub use infra::config::{ClientConfiguration, ConfigManager, ExportFormat};
pub use infra::error::{ClientError, ClientResult};
pub use pipelines::{GenerateWorkflow, SignWorkflow, VerifyWorkflow};
pub use services::controller::{OperationController, Submission};
