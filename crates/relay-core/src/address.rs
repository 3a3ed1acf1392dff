//! Node addresses
//!
//! A node is identified by a URI-like address such as
//! `kernel://local/csharp`. Addresses are validated once, when a node is
//! configured, and are then copied into every routing-slip stamp.

use relay_errors::{RelayError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Validated address of a processing node
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NodeAddress(String);

impl NodeAddress {
    /// Parse and validate an address
    ///
    /// The address must have a non-empty `scheme://` prefix followed by a
    /// non-empty remainder, and must not contain whitespace or `?` (the query
    /// part is reserved for routing-slip tags).
    pub fn parse(address: impl Into<String>) -> Result<Self> {
        let address = address.into();
        let invalid = |reason: &str| RelayError::InvalidAddress {
            address: address.clone(),
            reason: reason.to_string(),
        };

        let (scheme, rest) = address
            .split_once("://")
            .ok_or_else(|| invalid("missing scheme separator '://'"))?;
        let scheme_ok = !scheme.is_empty()
            && scheme
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
        if !scheme_ok {
            return Err(invalid("scheme must be non-empty and alphanumeric"));
        }
        if rest.is_empty() {
            return Err(invalid("missing authority/path after scheme"));
        }
        if address.chars().any(char::is_whitespace) {
            return Err(invalid("must not contain whitespace"));
        }
        if address.contains('?') {
            return Err(invalid("must not contain a query part"));
        }

        Ok(Self(address))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The scheme part, e.g. `kernel` for `kernel://local/csharp`
    pub fn scheme(&self) -> &str {
        self.0.split_once("://").map(|(s, _)| s).unwrap_or_default()
    }
}

impl fmt::Display for NodeAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for NodeAddress {
    type Error = RelayError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(value)
    }
}

impl From<NodeAddress> for String {
    fn from(address: NodeAddress) -> Self {
        address.0
    }
}

impl std::str::FromStr for NodeAddress {
    type Err = RelayError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
