//! Building a node's pipeline from a config file

#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::{RecordingHandler, Trace};
use relay_core::{CommandContext, CommandPipeline, NodeConfig, RelayError};
use relay_logging::Profile;
use std::fs;
use tempfile::TempDir;

#[tokio::test]
async fn test_pipeline_from_config_file_stamps_configured_address() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("node.toml");
    fs::write(
        &path,
        "name = \"python\"\naddress = \"kernel://remote/python\"\nlog_profile = \"test\"\n",
    )
    .unwrap();

    let config = NodeConfig::load(&path).unwrap();
    assert_eq!(config.log_profile, Profile::Test);

    let trace = Trace::default();
    let pipeline = CommandPipeline::from_config(&config, RecordingHandler::ok(&trace));
    assert_eq!(pipeline.node_name(), "python");

    let mut command = common::submit_code();
    pipeline.dispatch(&mut command, &CommandContext::new()).await;

    assert_eq!(
        command.routing_slip().to_uris(),
        vec![
            "kernel://remote/python?tag=arrived",
            "kernel://remote/python?tag=departed"
        ]
    );
    assert_eq!(pipeline.compiled().name(), "handle(python)");
}

#[test]
fn test_malformed_toml_is_parse_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("node.toml");
    fs::write(&path, "name = [unterminated").unwrap();

    let err = NodeConfig::load(&path).unwrap_err();
    assert!(matches!(err, RelayError::ConfigParse { .. }));
}
