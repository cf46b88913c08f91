//! Draw pipeline settings.

use serde::Deserialize;
use std::time::Duration;

#[derive(Clone, Debug, Deserialize)]
pub struct DrawConfig {
    /// Upper bound on the wait for the randomness oracle, in milliseconds.
    /// Includes the wait for the target beacon round to be emitted.
    #[serde(default = "default_oracle_timeout")]
    pub oracle_timeout_ms: u64,

    /// Attempts at the final write before giving up with `StorageWriteFailed`.
    #[serde(default = "default_commit_attempts")]
    pub commit_attempts: u32,

    /// Backoff before the second write attempt; doubles on each retry.
    #[serde(default = "default_commit_backoff")]
    pub commit_backoff_ms: u64,
}

fn default_oracle_timeout() -> u64 {
    30_000
}

fn default_commit_attempts() -> u32 {
    3
}

fn default_commit_backoff() -> u64 {
    100
}

impl DrawConfig {
    pub fn oracle_timeout(&self) -> Duration {
        Duration::from_millis(self.oracle_timeout_ms)
    }

    pub fn commit_backoff(&self) -> Duration {
        Duration::from_millis(self.commit_backoff_ms)
    }
}

impl Default for DrawConfig {
    fn default() -> Self {
        Self {
            oracle_timeout_ms: default_oracle_timeout(),
            commit_attempts: default_commit_attempts(),
            commit_backoff_ms: default_commit_backoff(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_uses_defaults() {
        let cfg: DrawConfig = toml::from_str("").unwrap();
        assert_eq!(cfg.oracle_timeout(), Duration::from_secs(30));
        assert_eq!(cfg.commit_attempts, 3);
    }

    #[test]
    fn partial_toml_overrides() {
        let cfg: DrawConfig = toml::from_str("commit_attempts = 5").unwrap();
        assert_eq!(cfg.commit_attempts, 5);
        assert_eq!(cfg.commit_backoff(), Duration::from_millis(100));
    }
}
