//! `tracing` subscriber setup.

use tracing_subscriber::{fmt, EnvFilter};

/// Environment variable that overrides the configured filter.
pub const LOG_ENV: &str = "RECOVERY_LOG";

/// Install a fmt subscriber filtered by `RECOVERY_LOG`, falling back to
/// `default_filter`.
///
/// Returns `false` when a global subscriber was already installed, so it is
/// safe to call from every entry point.
pub fn init(default_filter: &str) -> bool {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        init("debug");
        assert!(!init("debug"));
        tracing::debug!("subscriber installed");
    }

    #[test]
    fn test_bad_filter_does_not_panic() {
        init("not a [valid filter");
    }
}
