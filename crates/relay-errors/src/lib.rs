//! Error facility for Relay
//!
//! Two layers, mirroring how failures travel through a node:
//!
//! - [`RelayError`] is what interceptors, handlers and the config loader
//!   return. It is a plain `thiserror` enum that names what went wrong.
//! - [`ExError`] is the structured, classified form handed to a context's
//!   failure signal and written to logs. Every [`ExErrorKind`] maps to a
//!   stable code suitable for assertions and external reporting.

use relay_core_types::{RequestId, TraceId};
use thiserror::Error;

/// Result type alias using RelayError
pub type Result<T> = std::result::Result<T, RelayError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// The dispatch boundary only distinguishes processing failures; the other
/// kinds classify errors raised outside a running pipeline (configuration,
/// payload parsing) or annotate why a stage gave up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExErrorKind {
    /// An interceptor or terminal handler failed (including panics)
    ProcessingFailed,
    /// A stage observed cancellation and stopped the command
    Cancelled,
    /// A node address failed validation
    InvalidAddress,
    /// Malformed caller input (payload, CLI arguments)
    InvalidInput,
    Io,
    Serialization,
    Internal,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::ProcessingFailed => "ERR_PROCESSING_FAILED",
            ExErrorKind::Cancelled => "ERR_CANCELLED",
            ExErrorKind::InvalidAddress => "ERR_INVALID_ADDRESS",
            ExErrorKind::InvalidInput => "ERR_INVALID_INPUT",
            ExErrorKind::Io => "ERR_IO",
            ExErrorKind::Serialization => "ERR_SERIALIZATION",
            ExErrorKind::Internal => "ERR_INTERNAL",
        }
    }
}

/// Canonical structured error type
///
/// Carries the classification plus whatever correlation the raising site
/// knew about. Built with the `with_*` methods.
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    node: Option<String>,
    stage: Option<String>,
    command_id: Option<RequestId>,
    trace_id: Option<TraceId>,
    message: String,
}

impl ExError {
    /// Create a new error with the specified kind
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            node: None,
            stage: None,
            command_id: None,
            trace_id: None,
            message: String::new(),
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add the address of the node that observed the failure
    pub fn with_node(mut self, node: impl Into<String>) -> Self {
        self.node = Some(node.into());
        self
    }

    /// Add the diagnostic name of the failing stage
    pub fn with_stage(mut self, stage: impl Into<String>) -> Self {
        self.stage = Some(stage.into());
        self
    }

    /// Add the token of the command being processed
    pub fn with_command_id(mut self, command_id: RequestId) -> Self {
        self.command_id = Some(command_id);
        self
    }

    /// Add trace ID context
    pub fn with_trace_id(mut self, trace_id: TraceId) -> Self {
        self.trace_id = Some(trace_id);
        self
    }

    /// Add custom message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    pub fn node(&self) -> Option<&str> {
        self.node.as_deref()
    }

    pub fn stage(&self) -> Option<&str> {
        self.stage.as_deref()
    }

    pub fn command_id(&self) -> Option<&RequestId> {
        self.command_id.as_ref()
    }

    pub fn trace_id(&self) -> Option<&TraceId> {
        self.trace_id.as_ref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(node) = &self.node {
            write!(f, " (node: {})", node)?;
        }
        if let Some(stage) = &self.stage {
            write!(f, " (stage: {})", stage)?;
        }
        if let Some(command_id) = &self.command_id {
            write!(f, " (command: {})", command_id)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {}

// ========== End Error Facility ==========

/// Errors raised by pipeline stages and node setup
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RelayError {
    /// An interceptor refused or failed to process the command
    #[error("Interceptor '{stage}' failed: {reason}")]
    InterceptorFailed { stage: String, reason: String },

    /// The terminal handler failed
    #[error("Handler on node {node} failed: {reason}")]
    HandlerFailed { node: String, reason: String },

    /// A stage observed cancellation of the command
    #[error("Command {command_id} was cancelled")]
    Cancelled { command_id: String },

    /// A stage panicked while the pipeline was running
    #[error("Pipeline on node {node} panicked: {message}")]
    Panicked { node: String, message: String },

    /// A node address is malformed
    #[error("Invalid node address '{address}': {reason}")]
    InvalidAddress { address: String, reason: String },

    /// A command payload could not be parsed
    #[error("Invalid payload: {reason}")]
    InvalidPayload { reason: String },

    /// Node configuration could not be read from disk
    #[error("Cannot read config {path}: {reason}")]
    ConfigRead { path: String, reason: String },

    /// Node configuration is not valid TOML or misses required keys
    #[error("Invalid config: {reason}")]
    ConfigParse { reason: String },
}

impl From<serde_json::Error> for RelayError {
    fn from(err: serde_json::Error) -> Self {
        RelayError::InvalidPayload {
            reason: err.to_string(),
        }
    }
}

impl From<RelayError> for ExError {
    fn from(err: RelayError) -> Self {
        let message = err.to_string();
        match err {
            RelayError::InterceptorFailed { stage, .. } => {
                ExError::new(ExErrorKind::ProcessingFailed).with_stage(stage)
            }
            RelayError::HandlerFailed { node, .. } => {
                ExError::new(ExErrorKind::ProcessingFailed).with_node(node)
            }
            RelayError::Panicked { node, .. } => {
                ExError::new(ExErrorKind::ProcessingFailed).with_node(node)
            }
            RelayError::Cancelled { command_id } => ExError::new(ExErrorKind::Cancelled)
                .with_command_id(RequestId::from_string(command_id)),
            RelayError::InvalidAddress { .. } => ExError::new(ExErrorKind::InvalidAddress),
            RelayError::InvalidPayload { .. } => ExError::new(ExErrorKind::InvalidInput),
            RelayError::ConfigRead { .. } => ExError::new(ExErrorKind::Io),
            RelayError::ConfigParse { .. } => ExError::new(ExErrorKind::Serialization),
        }
        .with_message(message)
    }
}
