//! Describe command
//!
//! Usage: relay describe (--config <FILE> | --node <NAME> --address <URI>) [--interceptor <KIND>]...

use super::node::NodeArgs;
use clap::Args;

#[derive(Debug, Args)]
pub struct DescribeArgs {
    #[command(flatten)]
    pub node: NodeArgs,
}

/// Execute describe command
pub fn execute(args: DescribeArgs) -> Result<(), Box<dyn std::error::Error>> {
    let node = args.node.build()?;
    let compiled = node.pipeline.compiled();

    println!("node: {} ({})", node.pipeline.node_name(), node.pipeline.address());
    println!("stages: {}", compiled.stage_count());
    println!("pipeline: {}", compiled.name());

    Ok(())
}
