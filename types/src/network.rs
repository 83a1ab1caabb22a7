//! Network identifier.

use serde::{Deserialize, Serialize};

/// Identifies which Ember network a node participates in.
///
/// Networks differ in genesis block, work thresholds and consensus timing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NetworkId {
    /// The production network: full work parameters, secret genesis key.
    Live,
    /// The public beta network.
    Beta,
    /// Local test network: trivial work parameters, published genesis key.
    Test,
}

impl NetworkId {
    /// Default peering port for this network.
    pub fn default_port(&self) -> u16 {
        match self {
            Self::Live => 7075,
            Self::Beta | Self::Test => 54000,
        }
    }

    /// Human-readable name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Live => "live",
            Self::Beta => "beta",
            Self::Test => "test",
        }
    }
}
