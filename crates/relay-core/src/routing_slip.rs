//! Routing slip: the append-only audit trail of node visits
//!
//! Every node a command passes through stamps the slip twice: `arrived`
//! before any processing and `departed` once control returns to the
//! dispatcher. Stamps are only ever appended; there is no API that removes
//! or reorders an entry, and nothing is deduplicated. A command that
//! re-enters a node simply accumulates another arrived/departed pair.

use crate::address::NodeAddress;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which side of a visit a stamp records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StampPhase {
    Arrived,
    Departed,
}

impl StampPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            StampPhase::Arrived => "arrived",
            StampPhase::Departed => "departed",
        }
    }
}

impl fmt::Display for StampPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One stamp on a routing slip
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlipEntry {
    pub address: NodeAddress,
    pub phase: StampPhase,
    pub stamped_at: DateTime<Utc>,
}

impl SlipEntry {
    /// Render as `<address>?tag=<phase>`
    pub fn to_uri(&self) -> String {
        format!("{}?tag={}", self.address, self.phase)
    }
}

/// Ordered, append-only sequence of stamps for one command
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingSlip {
    entries: Vec<SlipEntry>,
}

impl RoutingSlip {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that the command arrived at `address`
    pub fn stamp_arrived(&mut self, address: &NodeAddress) {
        self.push(address, StampPhase::Arrived);
    }

    /// Record that the command departed from `address`
    pub fn stamp(&mut self, address: &NodeAddress) {
        self.push(address, StampPhase::Departed);
    }

    fn push(&mut self, address: &NodeAddress, phase: StampPhase) {
        self.entries.push(SlipEntry {
            address: address.clone(),
            phase,
            stamped_at: Utc::now(),
        });
    }

    /// All stamps in the order they were appended
    pub fn entries(&self) -> &[SlipEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether `address` has been stamped in any phase
    pub fn contains(&self, address: &NodeAddress) -> bool {
        self.entries.iter().any(|e| &e.address == address)
    }

    /// Number of stamps for `address` in the given phase
    pub fn count(&self, address: &NodeAddress, phase: StampPhase) -> usize {
        self.entries
            .iter()
            .filter(|e| &e.address == address && e.phase == phase)
            .count()
    }

    /// Whether `other` is a prefix of this slip, comparing address and phase
    ///
    /// Timestamps are ignored so that a slip copied from an upstream node
    /// can be compared against the local one.
    pub fn starts_with(&self, other: &RoutingSlip) -> bool {
        other.len() <= self.len()
            && self
                .entries
                .iter()
                .zip(other.entries.iter())
                .all(|(a, b)| a.address == b.address && a.phase == b.phase)
    }

    /// Each stamp rendered as `<address>?tag=<phase>`
    pub fn to_uris(&self) -> Vec<String> {
        self.entries.iter().map(SlipEntry::to_uri).collect()
    }
}
