//! Pipeline composition
//!
//! Folds the registered interceptors and the terminal handler into an
//! explicit linked chain. Compilation does no command-specific work; it only
//! allocates the links and computes the diagnostic name.

use super::registry::MiddlewareEntry;
use super::{CommandHandler, Interceptor, Next};
use crate::command::Command;
use crate::context::InvocationContext;
use futures::future::BoxFuture;
use relay_errors::Result;
use std::sync::Arc;

/// Separator between stage names in a pipeline's diagnostic name
pub const STAGE_SEPARATOR: &str = "->";

/// One link of a compiled chain
pub(crate) enum Link {
    Stage {
        name: String,
        interceptor: Arc<dyn Interceptor>,
        next: Box<Link>,
    },
    Terminal {
        name: String,
        handler: Arc<dyn CommandHandler>,
    },
}

impl Link {
    pub(crate) fn name(&self) -> &str {
        match self {
            Link::Stage { name, .. } | Link::Terminal { name, .. } => name,
        }
    }

    /// Run this link; a stage decides itself whether the rest runs
    pub(crate) fn invoke<'b>(
        &'b self,
        command: &'b mut Command,
        context: &'b dyn InvocationContext,
    ) -> BoxFuture<'b, Result<()>> {
        match self {
            Link::Stage {
                interceptor, next, ..
            } => interceptor.intercept(command, context, Next::new(next)),
            Link::Terminal { handler, .. } => handler.handle(command, context),
        }
    }
}

/// Immutable, fully composed chain for one registry snapshot
pub struct CompiledPipeline {
    head: Link,
    name: String,
    stage_count: usize,
}

impl CompiledPipeline {
    /// Compose `entries` in registration order with `handler` last
    ///
    /// `handler_name` names the terminal stage in the diagnostic name.
    pub(crate) fn compile(
        entries: &[MiddlewareEntry],
        handler: Arc<dyn CommandHandler>,
        handler_name: String,
    ) -> Self {
        let name = entries
            .iter()
            .map(|e| e.name.as_str())
            .chain(std::iter::once(handler_name.as_str()))
            .collect::<Vec<_>>()
            .join(STAGE_SEPARATOR);

        // Build back to front so each stage owns its successor.
        let terminal = Link::Terminal {
            name: handler_name,
            handler,
        };
        let head = entries.iter().rev().fold(terminal, |next, entry| Link::Stage {
            name: entry.name.clone(),
            interceptor: Arc::clone(&entry.interceptor),
            next: Box::new(next),
        });

        Self {
            head,
            name,
            stage_count: entries.len() + 1,
        }
    }

    /// Run the chain from its first stage
    pub fn invoke<'b>(
        &'b self,
        command: &'b mut Command,
        context: &'b dyn InvocationContext,
    ) -> BoxFuture<'b, Result<()>> {
        self.head.invoke(command, context)
    }

    /// Stage names joined by `->`, for tracing only
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of stages including the terminal handler
    pub fn stage_count(&self) -> usize {
        self.stage_count
    }
}

impl std::fmt::Debug for CompiledPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledPipeline")
            .field("name", &self.name)
            .field("stage_count", &self.stage_count)
            .finish()
    }
}
