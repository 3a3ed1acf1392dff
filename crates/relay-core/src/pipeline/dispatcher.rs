//! Dispatch entry point and compiled-chain cache
//!
//! The cache is a two-state value published through an [`ArcSwap`]:
//! dispatches read it without locking, while registration and compilation
//! both run under the registry mutex. A compile re-checks the cache under
//! that mutex and publishes the finished chain with one atomic store, so a
//! dispatch never sees a half-built chain and a registration is never lost
//! behind a stale compile.

use super::composer::CompiledPipeline;
use super::registry::MiddlewareRegistry;
use super::{CommandHandler, Interceptor};
use crate::address::NodeAddress;
use crate::command::Command;
use crate::config::NodeConfig;
use crate::context::InvocationContext;
use arc_swap::ArcSwap;
use futures::FutureExt;
use relay_core_types::schema::{OP_COMPILE, OP_DISPATCH, OP_REGISTER};
use relay_core_types::TraceId;
use relay_errors::{ExError, ExErrorKind, RelayError};
use relay_logging::{log_op_end, log_op_error, log_op_start};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

/// What the caller of [`CommandPipeline::dispatch`] observes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Every stage that ran returned normally (including a short-circuit)
    Completed,
    /// A stage failed; the context's failure signal has been invoked
    Failed,
}

impl DispatchOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, DispatchOutcome::Completed)
    }
}

enum CacheState {
    Unbuilt,
    Built(Arc<CompiledPipeline>),
}

/// A node's interceptor chain plus its terminal handler
pub struct CommandPipeline {
    node_name: String,
    address: NodeAddress,
    handler: Arc<dyn CommandHandler>,
    registry: Mutex<MiddlewareRegistry>,
    cache: ArcSwap<CacheState>,
}

impl CommandPipeline {
    pub fn new(
        node_name: impl Into<String>,
        address: NodeAddress,
        handler: Arc<dyn CommandHandler>,
    ) -> Self {
        Self {
            node_name: node_name.into(),
            address,
            handler,
            registry: Mutex::new(MiddlewareRegistry::new()),
            cache: ArcSwap::from_pointee(CacheState::Unbuilt),
        }
    }

    /// Build a pipeline for the node described by `config`
    pub fn from_config(config: &NodeConfig, handler: Arc<dyn CommandHandler>) -> Self {
        Self::new(config.name.clone(), config.address.clone(), handler)
    }

    pub fn node_name(&self) -> &str {
        &self.node_name
    }

    pub fn address(&self) -> &NodeAddress {
        &self.address
    }

    /// Append an interceptor; the chain is rebuilt on the next dispatch
    pub fn register(&self, interceptor: Arc<dyn Interceptor>, name: impl Into<String>) {
        let name = name.into();
        let mut registry = self.lock_registry();
        registry.push(interceptor, name.clone());
        self.cache.store(Arc::new(CacheState::Unbuilt));

        tracing::debug!(
            op = OP_REGISTER,
            node = %self.address,
            stage = %name,
            stage_count = registry.len(),
            "interceptor registered"
        );
    }

    /// Registered interceptor names in execution order
    pub fn middleware_names(&self) -> Vec<String> {
        self.lock_registry().names()
    }

    /// Whether a compiled chain is currently cached
    pub fn is_compiled(&self) -> bool {
        matches!(**self.cache.load(), CacheState::Built(_))
    }

    /// The current compiled chain, compiling it first if needed
    pub fn compiled(&self) -> Arc<CompiledPipeline> {
        if let CacheState::Built(pipeline) = &**self.cache.load() {
            return Arc::clone(pipeline);
        }

        let registry = self.lock_registry();
        // Another dispatch may have compiled while we waited for the lock.
        if let CacheState::Built(pipeline) = &**self.cache.load() {
            return Arc::clone(pipeline);
        }

        let pipeline = Arc::new(CompiledPipeline::compile(
            registry.entries(),
            Arc::clone(&self.handler),
            format!("handle({})", self.node_name),
        ));
        self.cache
            .store(Arc::new(CacheState::Built(Arc::clone(&pipeline))));

        tracing::debug!(
            op = OP_COMPILE,
            node = %self.address,
            pipeline = pipeline.name(),
            stage_count = pipeline.stage_count(),
            "pipeline compiled"
        );
        pipeline
    }

    /// Run `command` through the chain
    ///
    /// Stamps `arrived` before anything else and `departed` before returning.
    /// Errors and panics from any stage are sent to `context.fail` and never
    /// reach the caller.
    pub async fn dispatch(
        &self,
        command: &mut Command,
        context: &dyn InvocationContext,
    ) -> DispatchOutcome {
        let started = Instant::now();
        command.routing_slip_mut().stamp_arrived(&self.address);

        let pipeline = self.compiled();
        log_op_start!(
            OP_DISPATCH,
            node = %self.address,
            command_type = command.command_type(),
            request_id = %command.token(),
            trace_id = context.trace_id().map(TraceId::as_str),
            pipeline = pipeline.name()
        );

        let result = AssertUnwindSafe(pipeline.invoke(command, context))
            .catch_unwind()
            .await;
        let failure = match result {
            Ok(Ok(())) => None,
            Ok(Err(err)) => Some(err),
            Err(panic) => Some(RelayError::Panicked {
                node: self.address.to_string(),
                message: panic_message(panic.as_ref()),
            }),
        };

        let duration_ms = started.elapsed().as_millis() as u64;
        let outcome = match failure {
            None => {
                log_op_end!(
                    OP_DISPATCH,
                    duration_ms = duration_ms,
                    node = %self.address,
                    request_id = %command.token()
                );
                DispatchOutcome::Completed
            }
            Some(err) => {
                let mut ex_err = ExError::from(err)
                    .with_op(OP_DISPATCH)
                    .with_node(self.address.as_str())
                    .with_command_id(command.token().clone());
                if let Some(trace_id) = context.trace_id() {
                    ex_err = ex_err.with_trace_id(trace_id.clone());
                }
                log_op_error!(
                    OP_DISPATCH,
                    ex_err.clone(),
                    duration_ms = duration_ms,
                    node = %self.address,
                    request_id = %command.token(),
                    reason = ex_err.message()
                );
                self.signal_failure(command, context, ex_err);
                DispatchOutcome::Failed
            }
        };

        command.routing_slip_mut().stamp(&self.address);
        outcome
    }

    // A panicking failure signal must not skip the departure stamp.
    fn signal_failure(&self, command: &Command, context: &dyn InvocationContext, error: ExError) {
        let signalled = panic::catch_unwind(AssertUnwindSafe(|| context.fail(command, error)));
        if let Err(payload) = signalled {
            let internal = ExError::new(ExErrorKind::Internal)
                .with_op(OP_DISPATCH)
                .with_node(self.address.as_str())
                .with_command_id(command.token().clone())
                .with_message(format!(
                    "failure signal panicked: {}",
                    panic_message(payload.as_ref())
                ));
            tracing::error!(
                op = OP_DISPATCH,
                node = %self.address,
                request_id = %command.token(),
                err.kind = ?internal.kind(),
                err.code = internal.code(),
                reason = internal.message(),
                "failure signal panicked"
            );
        }
    }

    // The registry is only ever pushed to, so a poisoned lock still guards
    // a consistent sequence.
    fn lock_registry(&self) -> MutexGuard<'_, MiddlewareRegistry> {
        self.registry
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for CommandPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandPipeline")
            .field("node_name", &self.node_name)
            .field("address", &self.address)
            .field("compiled", &self.is_compiled())
            .finish_non_exhaustive()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
