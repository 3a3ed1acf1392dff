//! Dispatch owns exactly one start and one end (or end_error) log event

#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::{pipeline_with, Mode, Recorder, RecordingHandler, Trace};
use relay_core::{Command, CommandContext, RequestContext, TraceId};
use relay_core_types::schema::{
    EVENT_END, EVENT_END_ERROR, EVENT_START, FIELD_ERR_CODE, FIELD_NODE, FIELD_PIPELINE,
    FIELD_REQUEST_ID, FIELD_TRACE_ID, OP_DISPATCH,
};
use relay_logging::test_capture::init_test_capture;
use relay_logging::{CapturedEvent, TestCapture};

fn dispatch_events(capture: &TestCapture, command: &Command) -> Vec<CapturedEvent> {
    capture
        .events_with_field(FIELD_REQUEST_ID, command.token().as_str())
        .into_iter()
        .filter(|e| e.op.as_deref() == Some(OP_DISPATCH))
        .collect()
}

fn event_names(events: &[CapturedEvent]) -> Vec<&str> {
    events.iter().filter_map(|e| e.event.as_deref()).collect()
}

#[tokio::test]
async fn test_successful_dispatch_logs_start_and_end() {
    let capture = init_test_capture();
    let trace = Trace::default();
    let pipeline = pipeline_with(RecordingHandler::ok(&trace));
    pipeline.register(Recorder::new("A", &trace, Mode::Wrap), "A");

    let mut command = Command::new("SubmitCode", serde_json::json!({}));
    pipeline.dispatch(&mut command, &CommandContext::new()).await;

    let events = dispatch_events(&capture, &command);
    assert_eq!(event_names(&events), vec![EVENT_START, EVENT_END]);

    let start = &events[0];
    assert_eq!(start.field(FIELD_NODE), Some("kernel://test/csharp"));
    assert_eq!(start.field("command_type"), Some("SubmitCode"));
    assert_eq!(start.field(FIELD_PIPELINE), Some("A->handle(csharp)"));
    // No trace is bound to a default context.
    assert_eq!(start.field(FIELD_TRACE_ID), None);
}

#[tokio::test]
async fn test_failed_dispatch_logs_end_error_with_code() {
    let capture = init_test_capture();
    let trace = Trace::default();
    let pipeline = pipeline_with(RecordingHandler::failing(&trace));

    let mut command = Command::new("RequestValue", serde_json::json!({}));
    pipeline.dispatch(&mut command, &CommandContext::new()).await;

    let events = dispatch_events(&capture, &command);
    assert_eq!(event_names(&events), vec![EVENT_START, EVENT_END_ERROR]);

    let error = &events[1];
    assert_eq!(error.field(FIELD_ERR_CODE), Some("ERR_PROCESSING_FAILED"));
    assert_eq!(error.level, tracing::Level::ERROR);
}

#[tokio::test]
async fn test_context_trace_id_reaches_logs_and_failure() {
    let capture = init_test_capture();
    let trace = Trace::default();
    let pipeline = pipeline_with(RecordingHandler::failing(&trace));

    let trace_id = TraceId::new();
    let context =
        CommandContext::with_request(RequestContext::new().with_trace_id(trace_id.clone()));
    let mut command = Command::new("SubmitCode", serde_json::json!({}));
    pipeline.dispatch(&mut command, &context).await;

    let events = dispatch_events(&capture, &command);
    assert_eq!(events[0].field(FIELD_TRACE_ID), Some(trace_id.as_str()));

    let failures = context.failures();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].error.trace_id(), Some(&trace_id));
    assert_eq!(failures[0].error.command_id(), Some(command.token()));
}
