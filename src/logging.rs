//! Tracing subscriber setup for hosts embedding the library.

use anyhow::{Result, anyhow};
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "warn";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Install a global fmt subscriber filtered by `RUST_LOG`, defaulting to
/// `warn`.
///
/// # Errors
/// Returns an error if a global subscriber is already installed.
pub fn try_init() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_target(false)
        .try_init()
        .map_err(|err| anyhow!("failed to install tracing subscriber: {err}"))
}

/// Like [`try_init`], but ignores an already installed subscriber.
pub fn init() {
    if let Err(err) = try_init() {
        tracing::debug!(%err, "tracing subscriber already installed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_is_reported() {
        init();
        assert!(try_init().is_err());
    }
}
