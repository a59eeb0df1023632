//! Configuration for the book index.

use serde::{Deserialize, Serialize};

use crate::{BookDbError, Result, constants};

/// Tuning for a `BookIndex`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Rebuild on `update` only when the new ledger's sequence is at least
    /// this far from the indexed one. Must be >= 1.
    pub min_rebuild_gap: u32,
    /// Remove listener entries whose subscriber is gone while publishing.
    pub prune_dead_on_publish: bool,
    /// Starting capacity of the side maps when rebuilding.
    pub initial_bucket_capacity: usize,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            min_rebuild_gap: constants::DEFAULT_MIN_REBUILD_GAP,
            prune_dead_on_publish: true,
            initial_bucket_capacity: constants::DEFAULT_BUCKET_CAPACITY,
        }
    }
}

impl IndexConfig {
    /// Parse from JSON; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let cfg: Self = serde_json::from_str(json)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.min_rebuild_gap == 0 {
            return Err(BookDbError::Configuration(
                "min_rebuild_gap must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = IndexConfig::default();
        assert_eq!(cfg.min_rebuild_gap, 1);
        assert!(cfg.prune_dead_on_publish);
        assert_eq!(cfg.initial_bucket_capacity, 256);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn partial_json_uses_defaults() {
        let cfg = IndexConfig::from_json(r#"{ "min_rebuild_gap": 4 }"#).unwrap();
        assert_eq!(cfg.min_rebuild_gap, 4);
        assert!(cfg.prune_dead_on_publish);
    }

    #[test]
    fn zero_gap_rejected() {
        let err = IndexConfig::from_json(r#"{ "min_rebuild_gap": 0 }"#).unwrap_err();
        assert!(matches!(err, BookDbError::Configuration(_)));
    }

    #[test]
    fn garbage_rejected() {
        assert!(IndexConfig::from_json("not json").is_err());
    }
}
