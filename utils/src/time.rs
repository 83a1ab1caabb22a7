//! Time helpers.

use std::time::{SystemTime, UNIX_EPOCH};

/// Seconds passed since the Unix epoch.
pub fn seconds_since_epoch() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
