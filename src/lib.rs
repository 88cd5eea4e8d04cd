pub mod bio;
pub mod cluster;
pub mod core;
pub mod index;
pub mod matching;
pub mod utils;

pub use crate::bio::{Alphabet, SeqId, SequenceTable, UniqueSequence};
pub use crate::cluster::{Cluster, ClusterAlgorithm, ClusterAssignment};
pub use crate::core::{
    config::{ClusterConfig, Metric, SearchMode},
    pipeline::{cluster, Pipeline, RunSummary},
};
pub use crate::matching::{MatchEngine, MatchGraph, MatchRecord};

use thiserror::Error;

/// Largest supported edit distance. DP bands and stack depth are sized from it.
pub const MAX_TAU: u8 = 8;

#[derive(Error, Debug)]
pub enum StarlingError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Resource exhausted: {0}")]
    Resource(String),

    #[error("Internal invariant violated: {0}")]
    InvariantViolation(String),
}

impl From<std::collections::TryReserveError> for StarlingError {
    fn from(err: std::collections::TryReserveError) -> Self {
        StarlingError::Resource(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, StarlingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = StarlingError::Config("tau 9 exceeds maximum 8".to_string());
        assert_eq!(
            format!("{}", err),
            "Invalid configuration: tau 9 exceeds maximum 8"
        );

        let err = StarlingError::Resource("out of memory".to_string());
        assert_eq!(format!("{}", err), "Resource exhausted: out of memory");

        let err = StarlingError::InvariantViolation("cycle".to_string());
        assert!(format!("{}", err).contains("invariant"));
    }

    #[test]
    fn test_try_reserve_error_is_resource() {
        let mut v: Vec<u64> = Vec::new();
        let err: StarlingError = v.try_reserve(usize::MAX).unwrap_err().into();
        assert!(matches!(err, StarlingError::Resource(_)));
    }
}
