//! Commands submitted to a node
//!
//! The pipeline treats the payload as opaque. It only reads the command's
//! identity for logging and stamps its routing slip.

use crate::address::NodeAddress;
use crate::routing_slip::RoutingSlip;
use relay_core_types::RequestId;
use serde::{Deserialize, Serialize};

/// A unit of work addressed to a node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Command {
    token: RequestId,
    command_type: String,
    target: Option<NodeAddress>,
    payload: serde_json::Value,
    routing_slip: RoutingSlip,
}

impl Command {
    /// Create a command with a fresh token and an empty routing slip
    pub fn new(command_type: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            token: RequestId::new(),
            command_type: command_type.into(),
            target: None,
            payload,
            routing_slip: RoutingSlip::new(),
        }
    }

    /// Address the command to a specific node
    pub fn with_target(mut self, target: NodeAddress) -> Self {
        self.target = Some(target);
        self
    }

    /// Reuse an existing token, e.g. when forwarding a command between nodes
    pub fn with_token(mut self, token: RequestId) -> Self {
        self.token = token;
        self
    }

    pub fn token(&self) -> &RequestId {
        &self.token
    }

    pub fn command_type(&self) -> &str {
        &self.command_type
    }

    pub fn target(&self) -> Option<&NodeAddress> {
        self.target.as_ref()
    }

    pub fn payload(&self) -> &serde_json::Value {
        &self.payload
    }

    pub fn routing_slip(&self) -> &RoutingSlip {
        &self.routing_slip
    }

    /// Mutable access for stamping; entries themselves stay append-only
    pub fn routing_slip_mut(&mut self) -> &mut RoutingSlip {
        &mut self.routing_slip
    }
}
