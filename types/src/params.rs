//! Consensus parameters.
//!
//! Election timing and quorum policy, tunable per network. Settling-time
//! confirmation (accepting an uncontested winner after a fixed number of
//! announcement rounds, even below quorum) is a policy knob rather than a
//! hard-coded constant: its safety margin depends on network-wide weight
//! distribution assumptions that cannot be verified locally.

use crate::network::NetworkId;
use serde::{Deserialize, Serialize};

/// Quorum fraction denominator: fractions are expressed in basis points.
const BPS_DENOMINATOR: u128 = 10_000;

/// Election and announcement policy for one network.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConsensusParams {
    /// Fraction of the delegated supply required for quorum, in basis
    /// points. 5000 = half of all delegated weight.
    pub quorum_bps: u32,

    /// Number of contiguous uncontested announcement rounds after which an
    /// election settles without reaching quorum.
    pub settling_rounds: u32,

    /// Maximum number of unconfirmed roots announced per sweep, lowest
    /// root first. Bounds memory and network load per interval.
    pub announcements_per_sweep: usize,

    /// Milliseconds between announcement sweeps.
    pub announce_interval_ms: u64,
}

impl ConsensusParams {
    /// Production parameters.
    pub fn live() -> Self {
        Self {
            quorum_bps: 5000,
            settling_rounds: 4,
            announcements_per_sweep: 32,
            announce_interval_ms: 16_000,
        }
    }

    /// Beta parameters: production quorum, production timing.
    pub fn beta() -> Self {
        Self::live()
    }

    /// Test parameters: fast announcement rounds so elections settle in
    /// milliseconds.
    pub fn test() -> Self {
        Self {
            announce_interval_ms: 10,
            ..Self::live()
        }
    }

    pub fn for_network(network: NetworkId) -> Self {
        match network {
            NetworkId::Live => Self::live(),
            NetworkId::Beta => Self::beta(),
            NetworkId::Test => Self::test(),
        }
    }

    /// Weight required to confirm an election given the total delegated
    /// supply.
    pub fn quorum_threshold(&self, supply: u128) -> u128 {
        supply.saturating_mul(self.quorum_bps as u128) / BPS_DENOMINATOR
    }
}

impl Default for ConsensusParams {
    fn default() -> Self {
        Self::live()
    }
}
