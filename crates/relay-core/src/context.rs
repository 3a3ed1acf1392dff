//! Invocation context shared by every stage of one command
//!
//! The pipeline consumes only the failure signal. Cancellation is owned by
//! the context; stages that care about it ask [`InvocationContext::is_cancelled`]
//! and fail on their own.

use crate::command::Command;
use relay_core_types::{RequestContext, RequestId, TraceId};
use relay_errors::ExError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// Capabilities a command's context offers to the pipeline and its stages
pub trait InvocationContext: Send + Sync {
    /// Mark `command` as failed because of `error`
    fn fail(&self, command: &Command, error: ExError);

    /// Whether the caller has cancelled this command
    fn is_cancelled(&self) -> bool {
        false
    }

    /// Trace the command belongs to, attached to its logs and failures
    fn trace_id(&self) -> Option<&TraceId> {
        None
    }
}

/// A failure recorded by [`CommandContext`]
#[derive(Debug, Clone)]
pub struct RecordedFailure {
    pub command_id: RequestId,
    pub command_type: String,
    pub error: ExError,
}

/// Default in-memory context for one top-level command
///
/// Failures are recorded in signal order. Cancellation is a one-way flag.
#[derive(Debug, Default)]
pub struct CommandContext {
    request: RequestContext,
    cancelled: AtomicBool,
    failures: Mutex<Vec<RecordedFailure>>,
}

impl CommandContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind the context to an existing correlation (e.g. the command token)
    pub fn with_request(request: RequestContext) -> Self {
        Self {
            request,
            ..Self::default()
        }
    }

    pub fn request(&self) -> &RequestContext {
        &self.request
    }

    /// Request cancellation; stages observe it through `is_cancelled`
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_failed(&self) -> bool {
        self.failures.lock().map(|f| !f.is_empty()).unwrap_or(true)
    }

    /// Snapshot of all recorded failures
    pub fn failures(&self) -> Vec<RecordedFailure> {
        self.failures.lock().map(|f| f.clone()).unwrap_or_default()
    }
}

impl InvocationContext for CommandContext {
    fn fail(&self, command: &Command, error: ExError) {
        let failure = RecordedFailure {
            command_id: command.token().clone(),
            command_type: command.command_type().to_string(),
            error,
        };
        match self.failures.lock() {
            Ok(mut failures) => failures.push(failure),
            Err(poisoned) => poisoned.into_inner().push(failure),
        }
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    fn trace_id(&self) -> Option<&TraceId> {
        self.request.trace_id.as_ref()
    }
}
