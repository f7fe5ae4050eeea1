//! Tracing subscriber setup shared by binaries.

use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt};

/// Install a JSON subscriber filtered by `RUST_LOG`.
///
/// A second call is harmless; the failure is logged through the subscriber
/// that is already installed.
pub fn init_tracing() {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }
}
