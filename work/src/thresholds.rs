//! Per-network publish thresholds.

use ember_types::NetworkId;

/// The live-network publish threshold: a few seconds of commodity CPU work.
const PUBLISH_FULL_THRESHOLD: u64 = 0xFFFF_FFC0_0000_0000;
/// The test-network publish threshold: near-instant generation.
const PUBLISH_TEST_THRESHOLD: u64 = 0xFF00_0000_0000_0000;

/// Work thresholds for one network.
#[derive(Clone, Copy, Debug)]
pub struct WorkThresholds {
    /// Minimum work value for a block to be published or accepted.
    pub publish: u64,
}

impl WorkThresholds {
    /// Production threshold.
    pub fn live() -> Self {
        Self {
            publish: PUBLISH_FULL_THRESHOLD,
        }
    }

    /// Test threshold, trivially low so fixtures can brute-force nonces.
    pub fn test() -> Self {
        Self {
            publish: PUBLISH_TEST_THRESHOLD,
        }
    }

    /// Disabled work checking (unit tests that exercise other rules).
    pub fn none() -> Self {
        Self { publish: 0 }
    }

    pub fn for_network(network: NetworkId) -> Self {
        match network {
            NetworkId::Live | NetworkId::Beta => Self::live(),
            NetworkId::Test => Self::test(),
        }
    }

    /// Validate a nonce against this network's publish threshold.
    pub fn validate(&self, root: &ember_types::BlockHash, nonce: u64) -> bool {
        crate::validator::work_validate(root, nonce, self.publish)
    }
}
