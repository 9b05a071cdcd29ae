//! Ambient environment-driven configuration.
//!
//! Grounded on `octopilot-secret-manager-controller`'s hot-reloadable
//! `SharedControllerConfig`, simplified to a one-shot read at startup since
//! nothing in the spec calls for runtime reconfiguration.

use std::time::Duration;

/// Tunables §6 names as "configurable via one environment variable or flag".
#[derive(Debug, Clone)]
pub struct Config {
    /// Cadence of the Periodic Reconciler (§4.E). Default 300s.
    pub reconcile_period: Duration,
    /// Per-API-call timeout (§5 "Cancellation and timeouts"). Default 30s.
    pub api_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            reconcile_period: Duration::from_secs(300),
            api_timeout: Duration::from_secs(30),
        }
    }
}

impl Config {
    /// Reads overrides from the environment, falling back to the documented
    /// defaults on absence or parse failure.
    pub fn from_env() -> Self {
        let mut config = Config::default();

        if let Some(secs) = env_u64("KSS_RECONCILE_PERIOD_SECS") {
            config.reconcile_period = Duration::from_secs(secs);
        }
        if let Some(secs) = env_u64("KSS_API_TIMEOUT_SECS") {
            config.api_timeout = Duration::from_secs(secs);
        }

        config
    }
}

fn env_u64(key: &str) -> Option<u64> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec() {
        let config = Config::default();
        assert_eq!(config.reconcile_period, Duration::from_secs(300));
        assert_eq!(config.api_timeout, Duration::from_secs(30));
    }
}
