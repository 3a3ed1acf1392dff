//! Failures never escape dispatch and never leave the routing slip open

#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::{node_address, pipeline_with, submit_code, Mode, Recorder, RecordingHandler, Trace};
use futures::FutureExt;
use relay_core::interceptors::CancellationInterceptor;
use relay_core::{
    Command, CommandContext, DispatchOutcome, ExError, ExErrorKind, InvocationContext,
    StampPhase,
};
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

fn assert_slip_closed(command: &Command) {
    let slip = command.routing_slip();
    assert_eq!(slip.count(&node_address(), StampPhase::Arrived), 1);
    assert_eq!(slip.count(&node_address(), StampPhase::Departed), 1);
    assert_eq!(slip.entries().last().unwrap().phase, StampPhase::Departed);
}

#[tokio::test]
async fn test_scenario_first_interceptor_fails_before_continue() {
    // Given: [A, B] with A raising before it calls continue
    let trace = Trace::default();
    let pipeline = pipeline_with(RecordingHandler::ok(&trace));
    let b = Recorder::new("B", &trace, Mode::Wrap);
    pipeline.register(Recorder::new("A", &trace, Mode::FailBefore), "A");
    pipeline.register(b.clone(), "B");

    let mut command = submit_code();
    let context = CommandContext::new();
    let outcome = pipeline.dispatch(&mut command, &context).await;

    // Then: only A ran, the context is marked failed, the slip is closed
    assert_eq!(outcome, DispatchOutcome::Failed);
    assert_eq!(trace.events(), vec!["A-before"]);
    assert!(b.slip_lens().is_empty());
    assert_slip_closed(&command);

    let failures = context.failures();
    assert_eq!(failures.len(), 1);
    assert_eq!(&failures[0].command_id, command.token());
    let err = &failures[0].error;
    assert_eq!(err.kind(), ExErrorKind::ProcessingFailed);
    assert_eq!(err.code(), "ERR_PROCESSING_FAILED");
    assert_eq!(err.op(), Some("dispatch"));
    assert_eq!(err.node(), Some("kernel://test/csharp"));
    assert_eq!(err.stage(), Some("A"));
    assert!(err.message().contains("refused"));
}

#[tokio::test]
async fn test_handler_failure_is_contained_after_unwinding() {
    let trace = Trace::default();
    let pipeline = pipeline_with(RecordingHandler::failing(&trace));
    pipeline.register(Recorder::new("A", &trace, Mode::Wrap), "A");

    let mut command = submit_code();
    let context = CommandContext::new();
    let outcome = pipeline.dispatch(&mut command, &context).await;

    assert_eq!(outcome, DispatchOutcome::Failed);
    // A propagates the error with `?`, so its post-work is skipped.
    assert_eq!(trace.events(), vec!["A-before", "H"]);
    assert_eq!(context.failures().len(), 1);
    assert_slip_closed(&command);
}

#[tokio::test]
async fn test_failure_after_continue_keeps_downstream_effects() {
    let trace = Trace::default();
    let pipeline = pipeline_with(RecordingHandler::ok(&trace));
    pipeline.register(Recorder::new("A", &trace, Mode::FailAfter), "A");

    let mut command = submit_code();
    let context = CommandContext::new();
    let outcome = pipeline.dispatch(&mut command, &context).await;

    assert_eq!(outcome, DispatchOutcome::Failed);
    assert_eq!(trace.events(), vec!["A-before", "H", "A-after"]);
    assert_eq!(context.failures().len(), 1);
    assert_slip_closed(&command);
}

#[tokio::test]
async fn test_panicking_interceptor_is_contained() {
    let trace = Trace::default();
    let pipeline = pipeline_with(RecordingHandler::ok(&trace));
    pipeline.register(Recorder::new("A", &trace, Mode::PanicBefore), "A");

    let mut command = submit_code();
    let context = CommandContext::new();
    let outcome = pipeline.dispatch(&mut command, &context).await;

    assert_eq!(outcome, DispatchOutcome::Failed);
    assert_eq!(trace.events(), vec!["A-before"]);
    assert_slip_closed(&command);

    let failures = context.failures();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].error.kind(), ExErrorKind::ProcessingFailed);
    assert!(failures[0].error.message().contains("A exploded"));

    // The pipeline stays usable after a contained panic.
    let mut second = submit_code();
    let outcome = pipeline.dispatch(&mut second, &CommandContext::new()).await;
    assert_eq!(outcome, DispatchOutcome::Failed);
    assert_slip_closed(&second);
}

#[tokio::test]
async fn test_cancelled_context_fails_with_cancelled_kind() {
    let trace = Trace::default();
    let pipeline = pipeline_with(RecordingHandler::ok(&trace));
    pipeline.register(std::sync::Arc::new(CancellationInterceptor), "cancellation");
    pipeline.register(Recorder::new("A", &trace, Mode::Wrap), "A");

    let mut command = submit_code();
    let context = CommandContext::new();
    context.cancel();
    let outcome = pipeline.dispatch(&mut command, &context).await;

    assert_eq!(outcome, DispatchOutcome::Failed);
    assert!(trace.events().is_empty());
    assert_slip_closed(&command);

    let failures = context.failures();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].error.kind(), ExErrorKind::Cancelled);
    assert_eq!(failures[0].error.command_id(), Some(command.token()));
}

/// Context that only counts failure signals
#[derive(Default)]
struct CountingContext {
    calls: AtomicUsize,
    last: Mutex<Option<ExError>>,
}

impl InvocationContext for CountingContext {
    fn fail(&self, _command: &Command, error: ExError) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last.lock().unwrap() = Some(error);
    }
}

#[tokio::test]
async fn test_failure_signal_invoked_exactly_once_per_dispatch() {
    let trace = Trace::default();
    let pipeline = pipeline_with(RecordingHandler::failing(&trace));
    pipeline.register(Recorder::new("A", &trace, Mode::Wrap), "A");
    pipeline.register(Recorder::new("B", &trace, Mode::Wrap), "B");

    let context = CountingContext::default();
    let mut command = submit_code();
    pipeline.dispatch(&mut command, &context).await;

    assert_eq!(context.calls.load(Ordering::SeqCst), 1);
    let last = context.last.lock().unwrap().clone().unwrap();
    assert_eq!(last.node(), Some("kernel://test/csharp"));
}

#[tokio::test]
async fn test_successful_dispatch_never_signals_failure() {
    let trace = Trace::default();
    let pipeline = pipeline_with(RecordingHandler::ok(&trace));
    pipeline.register(Recorder::new("A", &trace, Mode::Wrap), "A");

    let context = CountingContext::default();
    let mut command = submit_code();
    let outcome = pipeline.dispatch(&mut command, &context).await;

    assert!(outcome.is_completed());
    assert_eq!(context.calls.load(Ordering::SeqCst), 0);
}

/// Context whose failure signal itself panics
struct PanickingContext;

impl InvocationContext for PanickingContext {
    fn fail(&self, _command: &Command, _error: ExError) {
        panic!("failure sink unavailable");
    }
}

#[tokio::test]
async fn test_panicking_failure_signal_still_closes_slip() {
    let trace = Trace::default();
    let pipeline = pipeline_with(RecordingHandler::failing(&trace));
    pipeline.register(Recorder::new("A", &trace, Mode::Wrap), "A");

    let mut command = submit_code();
    let outcome = AssertUnwindSafe(pipeline.dispatch(&mut command, &PanickingContext))
        .catch_unwind()
        .await;

    // The panic stays inside dispatch and the command is still reported failed.
    assert_eq!(outcome.ok(), Some(DispatchOutcome::Failed));
    assert_slip_closed(&command);

    // The pipeline keeps serving commands afterwards.
    let mut second = submit_code();
    let outcome = pipeline.dispatch(&mut second, &CommandContext::new()).await;
    assert_eq!(outcome, DispatchOutcome::Failed);
    assert_slip_closed(&second);
}
