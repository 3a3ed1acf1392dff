//! Canonical schema constants for structured logging and events
//!
//! These constants keep dispatch logs, stamps and error reports joinable.

// Canonical field keys for structured logging
pub const FIELD_COMPONENT: &str = "component";
pub const FIELD_OP: &str = "op";
pub const FIELD_EVENT: &str = "event";
pub const FIELD_REQUEST_ID: &str = "request_id";
pub const FIELD_TRACE_ID: &str = "trace_id";

// Pipeline identifiers
pub const FIELD_NODE: &str = "node";
pub const FIELD_PIPELINE: &str = "pipeline";

// Error fields
pub const FIELD_ERR_CODE: &str = "err.code";

// Canonical event names
pub const EVENT_START: &str = "start";
pub const EVENT_END: &str = "end";
pub const EVENT_END_ERROR: &str = "end_error";

// Canonical operation names
pub const OP_DISPATCH: &str = "dispatch";
pub const OP_COMPILE: &str = "compile";
pub const OP_REGISTER: &str = "register";
