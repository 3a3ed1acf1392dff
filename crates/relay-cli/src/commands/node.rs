//! Node arguments shared by every subcommand

use async_trait::async_trait;
use clap::{Args, ValueEnum};
use relay_core::interceptors::{
    CancellationInterceptor, LoggingInterceptor, ShortCircuitInterceptor, TimingInterceptor,
};
use relay_core::{
    Command, CommandHandler, CommandPipeline, InvocationContext, NodeAddress, NodeConfig,
    RelayError, Result,
};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Args)]
pub struct NodeArgs {
    /// Node config file (TOML with `name`, `address` and `log_profile`)
    #[arg(long, conflicts_with_all = ["node", "address"])]
    pub config: Option<PathBuf>,

    /// Node name, used with --address instead of --config
    #[arg(long, requires = "address")]
    pub node: Option<String>,

    /// Node address, e.g. kernel://local/csharp
    #[arg(long, requires = "node")]
    pub address: Option<String>,

    /// Interceptor to register, in order (repeatable)
    #[arg(long = "interceptor", value_enum)]
    pub interceptors: Vec<InterceptorKind>,

    /// Register a final interceptor that never reaches the handler
    #[arg(long)]
    pub short_circuit: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum InterceptorKind {
    Logging,
    Timing,
    Cancellation,
}

impl InterceptorKind {
    fn name(self) -> &'static str {
        match self {
            InterceptorKind::Logging => "logging",
            InterceptorKind::Timing => "timing",
            InterceptorKind::Cancellation => "cancellation",
        }
    }
}

/// A pipeline built from the command line, with handles on its stateful stages
pub struct Node {
    pub pipeline: CommandPipeline,
    pub timing: Option<Arc<TimingInterceptor>>,
}

impl NodeArgs {
    fn node_config(&self) -> Result<NodeConfig> {
        if let Some(path) = &self.config {
            return NodeConfig::load(path);
        }
        match (&self.node, &self.address) {
            (Some(name), Some(address)) => {
                Ok(NodeConfig::new(name.clone(), NodeAddress::parse(address.clone())?))
            }
            _ => Err(RelayError::ConfigParse {
                reason: "either --config or both --node and --address are required".to_string(),
            }),
        }
    }

    /// Resolve the node config, start logging and register the requested stages
    pub fn build(&self) -> Result<Node> {
        let config = self.node_config()?;
        relay_logging::init(config.log_profile);

        let pipeline = CommandPipeline::from_config(&config, Arc::new(EchoHandler));
        let mut timing = None;
        for kind in &self.interceptors {
            match kind {
                InterceptorKind::Logging => {
                    pipeline.register(Arc::new(LoggingInterceptor), kind.name())
                }
                InterceptorKind::Timing => {
                    let interceptor = Arc::new(TimingInterceptor::new());
                    timing = Some(Arc::clone(&interceptor));
                    pipeline.register(interceptor, kind.name());
                }
                InterceptorKind::Cancellation => {
                    pipeline.register(Arc::new(CancellationInterceptor), kind.name())
                }
            }
        }
        if self.short_circuit {
            pipeline.register(Arc::new(ShortCircuitInterceptor), "short-circuit");
        }

        Ok(Node { pipeline, timing })
    }
}

/// Terminal handler of CLI nodes
///
/// Accepts every command except those whose payload carries `"fail": true`;
/// an optional `"reason"` string becomes the failure reason.
struct EchoHandler;

#[async_trait]
impl CommandHandler for EchoHandler {
    async fn handle(&self, command: &mut Command, _context: &dyn InvocationContext) -> Result<()> {
        let payload = command.payload();
        if payload["fail"] == serde_json::Value::Bool(true) {
            let reason = payload["reason"].as_str().unwrap_or("rejected by payload");
            return Err(RelayError::HandlerFailed {
                node: command
                    .target()
                    .map(|t| t.to_string())
                    .unwrap_or_else(|| "local".to_string()),
                reason: reason.to_string(),
            });
        }
        tracing::info!(
            command_type = command.command_type(),
            request_id = %command.token(),
            "handled"
        );
        Ok(())
    }
}
