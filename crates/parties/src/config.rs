//! Resolver settings.

use serde::{Deserialize, Serialize};

use ledgerbridge_core::{DomainError, DomainResult};

use crate::resolver::CONFIDENT_MATCH_THRESHOLD;

/// Environment variable overriding [`ResolverConfig::weak_threshold`].
pub const WEAK_THRESHOLD_ENV: &str = "LEDGERBRIDGE_WEAK_MATCH_THRESHOLD";

const DEFAULT_WEAK_THRESHOLD: f64 = 0.5;

/// Tunable part of supplier resolution.
///
/// The confident threshold and the fixed score tiers are not configurable;
/// only the lower bound for surfacing "weak candidate" hints is a product
/// decision.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Candidates scoring in `[weak_threshold, 0.8)` are returned as hints
    /// alongside `NoMatch`.
    pub weak_threshold: f64,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            weak_threshold: DEFAULT_WEAK_THRESHOLD,
        }
    }
}

impl ResolverConfig {
    /// Build a config, rejecting a weak threshold outside `[0, 0.8]`.
    pub fn validated(weak_threshold: f64) -> DomainResult<Self> {
        if !(0.0..=CONFIDENT_MATCH_THRESHOLD).contains(&weak_threshold) {
            return Err(DomainError::validation(format!(
                "weak_threshold must be within [0, {}], got {}",
                CONFIDENT_MATCH_THRESHOLD, weak_threshold
            )));
        }
        Ok(Self { weak_threshold })
    }

    /// Read the config from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read the config through `lookup`, falling back to defaults for missing
    /// or invalid values.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let Some(raw) = lookup(WEAK_THRESHOLD_ENV) else {
            return Self::default();
        };

        match raw.trim().parse::<f64>() {
            Ok(value) => Self::validated(value).unwrap_or_else(|err| {
                tracing::warn!("{} rejected ({}); using default", WEAK_THRESHOLD_ENV, err);
                Self::default()
            }),
            Err(err) => {
                tracing::warn!(
                    "{}={:?} is not a number ({}); using default",
                    WEAK_THRESHOLD_ENV,
                    raw,
                    err
                );
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_unset() {
        let config = ResolverConfig::from_lookup(|_| None);
        assert_eq!(config, ResolverConfig::default());
        assert_eq!(config.weak_threshold, 0.5);
    }

    #[test]
    fn reads_override() {
        let config = ResolverConfig::from_lookup(|key| {
            (key == WEAK_THRESHOLD_ENV).then(|| " 0.6 ".to_string())
        });
        assert_eq!(config.weak_threshold, 0.6);
    }

    #[test]
    fn invalid_values_fall_back_to_default() {
        let garbage = ResolverConfig::from_lookup(|_| Some("lots".to_string()));
        assert_eq!(garbage, ResolverConfig::default());

        let too_high = ResolverConfig::from_lookup(|_| Some("0.9".to_string()));
        assert_eq!(too_high, ResolverConfig::default());
    }

    #[test]
    fn validated_rejects_out_of_range() {
        match ResolverConfig::validated(-0.1).unwrap_err() {
            DomainError::Validation(_) => {}
            _ => panic!("Expected Validation error"),
        }
        assert!(ResolverConfig::validated(0.8).is_ok());
        assert!(ResolverConfig::validated(f64::NAN).is_err());
    }
}
