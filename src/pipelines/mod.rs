//! Per-operation workflows built on the shared `OperationController`.

pub mod generate;
pub mod sign;
pub mod verify;

pub use generate::GenerateWorkflow;
pub use sign::SignWorkflow;
pub use verify::VerifyWorkflow;

use crate::adapters::remote::protocol::ResponseParser;
use crate::adapters::transport::Transport;
use crate::domain::types::OperationKind;
use crate::infra::config::ClientConfiguration;
use crate::services::controller::OperationController;
use crate::services::presenter::ResultPresenter;

/// Controller for `kind` using the naming preferences from `config`.
fn configured_controller<T: Transport>(
    kind: OperationKind,
    transport: T,
    config: &ClientConfiguration,
) -> OperationController<T> {
    OperationController::new(kind, transport)
        .with_parser(ResponseParser::new(config.credentials_file_name.clone()))
        .with_presenter(ResultPresenter::new(config.signature_suffix.clone()))
}
