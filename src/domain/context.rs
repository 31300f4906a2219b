//! Per-workflow UI state: control enablement and the last rendered result.
//!
//! Controls stand in for the buttons of an interactive front end. They are
//! cheap to clone and every clone observes the same flag, so a front end can
//! hold on to a control while the controller toggles it.

use super::outcome::RenderedResult;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

#[derive(Debug, Clone)]
pub struct Control {
    name: &'static str,
    enabled: Arc<AtomicBool>,
}

impl Control {
    #[must_use]
    pub fn enabled(name: &'static str) -> Self {
        Self {
            name,
            enabled: Arc::new(AtomicBool::new(true)),
        }
    }

    #[must_use]
    pub fn disabled(name: &'static str) -> Self {
        Self {
            name,
            enabled: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    pub fn enable(&self) {
        self.enabled.store(true, Ordering::SeqCst);
    }

    pub fn disable(&self) {
        self.enabled.store(false, Ordering::SeqCst);
    }
}

/// State owned by exactly one workflow instance.
#[derive(Debug)]
pub struct WorkflowContext {
    trigger: Control,
    result: Mutex<Option<RenderedResult>>,
}

impl WorkflowContext {
    #[must_use]
    pub fn new(trigger: Control) -> Self {
        Self {
            trigger,
            result: Mutex::new(None),
        }
    }

    /// The control that starts a submission.
    pub fn trigger(&self) -> &Control {
        &self.trigger
    }

    /// Most recent rendered result, if any.
    pub fn result(&self) -> Option<RenderedResult> {
        self.result
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub(crate) fn clear_result(&self) {
        *self.result.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }

    pub(crate) fn set_result(&self, rendered: RenderedResult) {
        *self.result.lock().unwrap_or_else(PoisonError::into_inner) = Some(rendered);
    }
}
