//! Relay Core - per-node command dispatch pipeline
//!
//! This crate provides:
//! - Commands carrying an append-only routing slip of node visits
//! - The invocation context contract (failure signal, cancellation)
//! - Interceptor and terminal handler traits
//! - A lazily compiled, order-preserving interceptor chain with
//!   short-circuit support and failure containment at dispatch
//! - Node configuration loaded from TOML
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use async_trait::async_trait;
//! use relay_core::{Command, CommandContext, CommandHandler, CommandPipeline, InvocationContext, NodeAddress};
//! use relay_core::interceptors::TimingInterceptor;
//!
//! struct Echo;
//!
//! #[async_trait]
//! impl CommandHandler for Echo {
//!     async fn handle(&self, _command: &mut Command, _context: &dyn InvocationContext) -> relay_core::Result<()> {
//!         Ok(())
//!     }
//! }
//!
//! let address = NodeAddress::parse("kernel://local/echo").unwrap();
//! let pipeline = CommandPipeline::new("echo", address.clone(), Arc::new(Echo));
//! pipeline.register(Arc::new(TimingInterceptor::new()), "timing");
//!
//! let mut command = Command::new("SubmitCode", serde_json::json!({ "code": "1" }));
//! let context = CommandContext::new();
//! let outcome = futures::executor::block_on(pipeline.dispatch(&mut command, &context));
//!
//! assert!(outcome.is_completed());
//! assert_eq!(command.routing_slip().len(), 2);
//! ```

pub mod address;
pub mod command;
pub mod config;
pub mod context;
pub mod interceptors;
pub mod pipeline;
pub mod routing_slip;

pub use address::NodeAddress;
pub use command::Command;
pub use config::NodeConfig;
pub use context::{CommandContext, InvocationContext, RecordedFailure};
pub use pipeline::{
    CommandHandler, CommandPipeline, CompiledPipeline, DispatchOutcome, Interceptor, Next,
};
pub use relay_core_types::{RequestContext, RequestId, TraceId};
pub use relay_errors::{ExError, ExErrorKind, RelayError, Result};
pub use routing_slip::{RoutingSlip, SlipEntry, StampPhase};
