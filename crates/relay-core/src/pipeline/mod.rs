//! Per-node command pipeline
//!
//! A node owns one [`CommandPipeline`]. Interceptors are registered in order
//! and lazily compiled, together with the node's terminal
//! [`CommandHandler`], into a linked chain of stages. Each interceptor
//! receives a [`Next`] that runs the rest of the chain; dropping it without
//! calling [`Next::run`] short-circuits everything downstream.
//!
//! ```text
//! dispatch ─ stamp arrived ─ A ─ B ─ ... ─ handler ─ ... ─ B ─ A ─ stamp departed
//! ```

mod composer;
mod dispatcher;
mod registry;

pub use composer::CompiledPipeline;
pub use dispatcher::{CommandPipeline, DispatchOutcome};
pub use registry::{MiddlewareEntry, MiddlewareRegistry};

use crate::command::Command;
use crate::context::InvocationContext;
use async_trait::async_trait;
use composer::Link;
use futures::future::BoxFuture;
use relay_errors::Result;

/// A stage that runs before the terminal handler
///
/// Implementations may work before and/or after calling `next.run`, or
/// never call it at all to stop the command here.
#[async_trait]
pub trait Interceptor: Send + Sync {
    async fn intercept(
        &self,
        command: &mut Command,
        context: &dyn InvocationContext,
        next: Next<'_>,
    ) -> Result<()>;
}

/// The node's own processing, run as the last stage of the chain
#[async_trait]
pub trait CommandHandler: Send + Sync {
    async fn handle(&self, command: &mut Command, context: &dyn InvocationContext) -> Result<()>;
}

/// Continuation handed to an interceptor
///
/// Consumed by [`Next::run`], so the rest of the chain runs at most once per
/// stage.
pub struct Next<'a> {
    link: &'a Link,
}

impl<'a> Next<'a> {
    pub(crate) fn new(link: &'a Link) -> Self {
        Self { link }
    }

    /// Run the remaining stages
    pub fn run<'b>(
        self,
        command: &'b mut Command,
        context: &'b dyn InvocationContext,
    ) -> BoxFuture<'b, Result<()>>
    where
        'a: 'b,
    {
        self.link.invoke(command, context)
    }

    /// Diagnostic name of the stage this continuation leads to
    pub fn stage_name(&self) -> &'a str {
        self.link.name()
    }
}
