//! Command implementations for the Terra CLI.

pub mod country;
pub mod listing;

use anyhow::anyhow;
use terra_abstraction::GraphqlError;

/// Converts a request failure into a user-facing error.
///
/// Throttling gets its own message, since retrying immediately will not help.
pub fn report(error: GraphqlError, endpoint: &str) -> anyhow::Error {
    if error.is_rate_limited() {
        anyhow!("Rate limited by {}. Wait a moment before trying again. ({})", endpoint, error)
    } else {
        anyhow::Error::new(error).context(format!("Request to {} failed", endpoint))
    }
}
