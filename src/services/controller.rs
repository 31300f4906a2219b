//! Workflow controller.
//!
//! One parameterised state machine drives every operation kind:
//!
//! ```text
//! Idle ──submit──▶ Submitting ──▶ Succeeded ─┐
//!   ▲                   │                     │ submit
//!   │                   └──────▶ Failed ──────┤
//!   └─────────────────────────────────────────┘
//! ```
//!
//! A submission checks the selections, ingests every file concurrently,
//! builds the request, dispatches it and interprets the answer. Anything
//! that goes wrong on the way ends in `Failed`; nothing is retried. The
//! trigger control is disabled for the whole of `Submitting` and re-enabled
//! by a guard, whatever the outcome.

use crate::adapters::remote::protocol::ResponseParser;
use crate::adapters::transport::Transport;
use crate::domain::context::{Control, WorkflowContext};
use crate::domain::outcome::{OperationOutcome, OperationState, Payload, RenderedResult};
use crate::domain::types::{FileHandle, OperationKind, PartName};
use crate::infra::error::{ClientError, ClientResult};
use crate::infra::progress::{NullProgress, ProgressReporter};
use crate::services::ingest::{FileIngestor, Selection};
use crate::services::presenter::{PresentContext, ResultPresenter};
use crate::services::request_builder::RequestBuilder;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Files the user selected for one submission, keyed by part.
#[derive(Debug, Clone, Default)]
pub struct Submission {
    selections: BTreeMap<PartName, FileHandle>,
}

impl Submission {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Select a file for `part`, replacing any previous selection.
    #[must_use]
    pub fn with(mut self, part: PartName, handle: impl Into<FileHandle>) -> Self {
        self.select(part, handle);
        self
    }

    pub fn select(&mut self, part: PartName, handle: impl Into<FileHandle>) {
        self.selections.insert(part, handle.into());
    }

    pub fn get(&self, part: PartName) -> Option<&FileHandle> {
        self.selections.get(&part)
    }
}

pub struct OperationController<T> {
    kind: OperationKind,
    transport: T,
    context: WorkflowContext,
    state: Mutex<OperationState>,
    success_controls: Vec<Control>,
    ingestor: FileIngestor,
    builder: RequestBuilder,
    parser: ResponseParser,
    presenter: ResultPresenter,
    progress: Arc<dyn ProgressReporter>,
}

impl<T: Transport> OperationController<T> {
    /// Controller for `kind` with default presentation settings and no
    /// loader output.
    pub fn new(kind: OperationKind, transport: T) -> Self {
        Self {
            kind,
            transport,
            context: WorkflowContext::new(Control::enabled(kind.as_str())),
            state: Mutex::new(OperationState::Idle),
            success_controls: Vec::new(),
            ingestor: FileIngestor::new(),
            builder: RequestBuilder::new(),
            parser: ResponseParser::new(crate::infra::config::DEFAULT_CREDENTIALS_FILE_NAME),
            presenter: ResultPresenter::default(),
            progress: Arc::new(NullProgress),
        }
    }

    /// Use a control owned by the caller as the trigger.
    #[must_use]
    pub fn with_trigger(mut self, trigger: Control) -> Self {
        self.context = WorkflowContext::new(trigger);
        self
    }

    #[must_use]
    pub fn with_parser(mut self, parser: ResponseParser) -> Self {
        self.parser = parser;
        self
    }

    #[must_use]
    pub fn with_presenter(mut self, presenter: ResultPresenter) -> Self {
        self.presenter = presenter;
        self
    }

    #[must_use]
    pub fn with_progress(mut self, progress: Arc<dyn ProgressReporter>) -> Self {
        self.progress = progress;
        self
    }

    /// Controls enabled as a side effect of a successful submission. They
    /// are left untouched on failure.
    #[must_use]
    pub fn with_success_controls(mut self, controls: Vec<Control>) -> Self {
        self.success_controls = controls;
        self
    }

    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    pub fn context(&self) -> &WorkflowContext {
        &self.context
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Snapshot of the current lifecycle state.
    pub fn state(&self) -> OperationState {
        self.lock_state().clone()
    }

    /// Run one submission to completion.
    ///
    /// Validation, read, transport and service failures are not returned as
    /// errors: they resolve the submission into `Failed` and come back as a
    /// negative `RenderedResult`.
    ///
    /// # Errors
    /// Returns `SubmissionInProgress` without dispatching anything if this
    /// instance is already submitting.
    pub async fn submit(&self, submission: &Submission) -> ClientResult<RenderedResult> {
        self.begin()?;
        let guard = SubmittingGuard::engage(&self.context, &self.state);

        self.context.clear_result();
        self.progress.start(&format!("Submitting {} request", self.kind));

        let outcome = OperationOutcome::from(self.execute(submission).await);
        match &outcome {
            OperationOutcome::Success { .. } => {
                for control in &self.success_controls {
                    control.enable();
                }
                self.progress.finish();
                log::info!("{} request succeeded", self.kind);
            }
            OperationOutcome::Failure { error } => {
                self.progress.finish_with_error(&error.user_message());
                log::info!("{} request failed: {error}", self.kind);
            }
        }

        let context = PresentContext {
            source_name: submission.get(PartName::Data).map(FileHandle::display_name),
        };
        let rendered = self.presenter.present(&outcome, &context);

        *self.lock_state() = outcome.into();
        self.context.set_result(rendered.clone());
        drop(guard);

        Ok(rendered)
    }

    fn begin(&self) -> ClientResult<()> {
        let mut state = self.lock_state();
        if !state.accepts_submission() {
            log::warn!("Rejected {} submission: one is already in flight", self.kind);
            return Err(ClientError::SubmissionInProgress(self.kind));
        }
        log::debug!("{} workflow: {} -> submitting", self.kind, state.name());
        *state = OperationState::Submitting;
        Ok(())
    }

    async fn execute(&self, submission: &Submission) -> ClientResult<Payload> {
        let selections = self.selections(submission)?;
        let files = self.ingestor.ingest_all(&selections).await?;

        let parts = files.into_iter().map(|file| (file.kind, file)).collect();
        let request = self.builder.build(self.kind, parts)?;

        let response = self.transport.dispatch(&request).await?;
        self.parser.parse(self.kind, response)
    }

    /// Check that every required part has a selection before anything is
    /// read.
    fn selections(&self, submission: &Submission) -> ClientResult<Vec<Selection>> {
        self.kind
            .required_parts()
            .iter()
            .map(|&(part, mode)| {
                submission
                    .get(part)
                    .map(|handle| Selection {
                        handle: handle.clone(),
                        part,
                        mode,
                    })
                    .ok_or_else(|| {
                        ClientError::ValidationError(format!(
                            "Please select a `{part}` file before submitting"
                        ))
                    })
            })
            .collect()
    }

    fn lock_state(&self) -> MutexGuard<'_, OperationState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Holds the trigger disabled for the duration of a submission.
///
/// Dropping the guard re-enables the trigger. If the submission never
/// reached a terminal state (its future was dropped, or it unwound), the
/// state is moved to `Failed` so the instance accepts new submissions.
struct SubmittingGuard<'a> {
    trigger: &'a Control,
    state: &'a Mutex<OperationState>,
}

impl<'a> SubmittingGuard<'a> {
    fn engage(context: &'a WorkflowContext, state: &'a Mutex<OperationState>) -> Self {
        context.trigger().disable();
        Self {
            trigger: context.trigger(),
            state,
        }
    }
}

impl Drop for SubmittingGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if *state == OperationState::Submitting {
            *state = OperationState::Failed(ClientError::TransportError(
                "submission abandoned before a response was handled".to_string(),
            ));
        }
        drop(state);
        self.trigger.enable();
    }
}
