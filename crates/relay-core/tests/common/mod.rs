use async_trait::async_trait;
use relay_core::{
    Command, CommandHandler, CommandPipeline, InvocationContext, Interceptor, NodeAddress, Next,
    RelayError, Result,
};
use std::sync::{Arc, Mutex};

/// Shared, ordered log of what each stage did
#[derive(Clone, Default)]
pub struct Trace(Arc<Mutex<Vec<String>>>);

impl Trace {
    pub fn push(&self, event: impl Into<String>) {
        self.0.lock().unwrap().push(event.into());
    }

    pub fn events(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

/// What a recording interceptor does around `next`
#[allow(dead_code)]
#[derive(Clone, Copy, Debug)]
pub enum Mode {
    /// before, next, after
    Wrap,
    /// before, then stop without calling next
    Stop,
    /// before, then return an error without calling next
    FailBefore,
    /// before, next, then return an error
    FailAfter,
    /// before, then panic
    PanicBefore,
}

pub struct Recorder {
    label: String,
    trace: Trace,
    mode: Mode,
    slip_lens: Mutex<Vec<usize>>,
}

#[allow(dead_code)]
impl Recorder {
    pub fn new(label: &str, trace: &Trace, mode: Mode) -> Arc<Self> {
        Arc::new(Self {
            label: label.to_string(),
            trace: trace.clone(),
            mode,
            slip_lens: Mutex::new(Vec::new()),
        })
    }

    /// Routing-slip length seen on each entry to this stage
    pub fn slip_lens(&self) -> Vec<usize> {
        self.slip_lens.lock().unwrap().clone()
    }
}

#[async_trait]
impl Interceptor for Recorder {
    async fn intercept(
        &self,
        command: &mut Command,
        context: &dyn InvocationContext,
        next: Next<'_>,
    ) -> Result<()> {
        self.slip_lens
            .lock()
            .unwrap()
            .push(command.routing_slip().len());
        self.trace.push(format!("{}-before", self.label));

        match self.mode {
            Mode::Wrap => {
                next.run(command, context).await?;
                self.trace.push(format!("{}-after", self.label));
                Ok(())
            }
            Mode::Stop => Ok(()),
            Mode::FailBefore => Err(RelayError::InterceptorFailed {
                stage: self.label.clone(),
                reason: "refused".to_string(),
            }),
            Mode::FailAfter => {
                next.run(command, context).await?;
                self.trace.push(format!("{}-after", self.label));
                Err(RelayError::InterceptorFailed {
                    stage: self.label.clone(),
                    reason: "post-processing failed".to_string(),
                })
            }
            Mode::PanicBefore => panic!("{} exploded", self.label),
        }
    }
}

/// Terminal handler that records `H`, optionally failing
pub struct RecordingHandler {
    trace: Trace,
    fail: bool,
}

#[allow(dead_code)]
impl RecordingHandler {
    pub fn ok(trace: &Trace) -> Arc<Self> {
        Arc::new(Self {
            trace: trace.clone(),
            fail: false,
        })
    }

    pub fn failing(trace: &Trace) -> Arc<Self> {
        Arc::new(Self {
            trace: trace.clone(),
            fail: true,
        })
    }
}

#[async_trait]
impl CommandHandler for RecordingHandler {
    async fn handle(&self, command: &mut Command, _context: &dyn InvocationContext) -> Result<()> {
        self.trace.push("H");
        if self.fail {
            return Err(RelayError::HandlerFailed {
                node: "test".to_string(),
                reason: format!("cannot handle {}", command.command_type()),
            });
        }
        Ok(())
    }
}

#[allow(dead_code)]
pub fn node_address() -> NodeAddress {
    NodeAddress::parse("kernel://test/csharp").unwrap()
}

#[allow(dead_code)]
pub fn pipeline_with(handler: Arc<dyn CommandHandler>) -> CommandPipeline {
    CommandPipeline::new("csharp", node_address(), handler)
}

#[allow(dead_code)]
pub fn submit_code() -> Command {
    Command::new("SubmitCode", serde_json::json!({ "code": "1 + 1" }))
}
