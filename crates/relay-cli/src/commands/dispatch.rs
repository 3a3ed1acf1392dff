//! Dispatch command
//!
//! Usage: relay dispatch (--config <FILE> | --node <NAME> --address <URI>)
//!        --command-type <TYPE> [--payload <JSON>] [--interceptor <KIND>]... [--short-circuit] [--json]

use super::node::NodeArgs;
use clap::Args;
use relay_core::{
    Command, CommandContext, DispatchOutcome, InvocationContext, RelayError, RequestContext,
    TraceId,
};

#[derive(Debug, Args)]
pub struct DispatchArgs {
    #[command(flatten)]
    pub node: NodeArgs,

    /// Command type, e.g. SubmitCode
    #[arg(long)]
    pub command_type: String,

    /// Command payload as JSON
    #[arg(long, default_value = "{}")]
    pub payload: String,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Execute dispatch command
///
/// Prints the outcome and the routing slip, then fails when the command failed.
pub fn execute(args: DispatchArgs) -> Result<(), Box<dyn std::error::Error>> {
    let payload: serde_json::Value =
        serde_json::from_str(&args.payload).map_err(RelayError::from)?;
    let node = args.node.build()?;

    let mut command = Command::new(args.command_type, payload)
        .with_target(node.pipeline.address().clone());
    let context = CommandContext::with_request(
        RequestContext::with_request_id(command.token().clone()).with_trace_id(TraceId::new()),
    );

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let outcome = runtime.block_on(node.pipeline.dispatch(&mut command, &context));

    let pipeline_name = node.pipeline.compiled().name().to_string();
    let slip = command.routing_slip().to_uris();
    let failures = context.failures();
    let downstream = node.timing.as_ref().and_then(|t| t.last_duration());

    if args.json {
        let output = serde_json::json!({
            "command_id": command.token().as_str(),
            "trace_id": context.trace_id().map(TraceId::as_str),
            "outcome": outcome_label(outcome),
            "pipeline": pipeline_name,
            "slip": slip,
            "downstream_ms": downstream.map(|d| d.as_secs_f64() * 1000.0),
            "failures": failures
                .iter()
                .map(|f| serde_json::json!({
                    "code": f.error.code(),
                    "message": f.error.message(),
                    "trace_id": f.error.trace_id().map(TraceId::as_str),
                }))
                .collect::<Vec<_>>(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("command: {} ({})", command.command_type(), command.token());
        if let Some(trace_id) = context.trace_id() {
            println!("trace: {}", trace_id);
        }
        println!("outcome: {}", outcome_label(outcome));
        println!("pipeline: {}", pipeline_name);
        if let Some(d) = downstream {
            println!("downstream: {:?}", d);
        }
        println!("slip:");
        for uri in &slip {
            println!("  {}", uri);
        }
        for failure in &failures {
            println!("failure: {}", failure.error);
        }
    }

    match outcome {
        DispatchOutcome::Completed => Ok(()),
        DispatchOutcome::Failed => Err(format!(
            "command {} failed on {}",
            command.token(),
            node.pipeline.node_name()
        )
        .into()),
    }
}

fn outcome_label(outcome: DispatchOutcome) -> &'static str {
    match outcome {
        DispatchOutcome::Completed => "completed",
        DispatchOutcome::Failed => "failed",
    }
}
