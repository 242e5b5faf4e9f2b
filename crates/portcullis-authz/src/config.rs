use anyhow::{Context, Result};
use std::time::Duration;

/// Bounded staleness window for cached decisions. A revoked rule can keep
/// producing Allow for at most this long when the mutation bypasses the
/// engine; mutations through the engine invalidate immediately.
pub const DEFAULT_DECISION_TTL: Duration = Duration::from_secs(5);

pub const DEFAULT_CACHE_CAPACITY: usize = 8192;

// Engine tuning sourced from environment variables.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub decision_ttl: Duration,
    pub cache_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            decision_ttl: DEFAULT_DECISION_TTL,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        if let Ok(value) = std::env::var("PORTCULLIS_DECISION_TTL_MS") {
            let millis: u64 = value
                .parse()
                .with_context(|| "parse PORTCULLIS_DECISION_TTL_MS")?;
            config.decision_ttl = Duration::from_millis(millis);
        }
        if let Ok(value) = std::env::var("PORTCULLIS_CACHE_CAPACITY") {
            config.cache_capacity = value
                .parse()
                .with_context(|| "parse PORTCULLIS_CACHE_CAPACITY")?;
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_carry_the_documented_staleness_window() {
        let config = EngineConfig::default();
        assert_eq!(config.decision_ttl, Duration::from_secs(5));
        assert_eq!(config.cache_capacity, DEFAULT_CACHE_CAPACITY);
    }
}
