//! Graph clustering of the match graph
//!
//! Each strategy turns neighbor queries into a flat parent array (every
//! sequence pointing at its canonical representative), which
//! [`ClusterAssignment::from_parents`] then groups and orders. Ties are
//! always broken by rank order: higher count first, then lower `SeqId`.
pub mod assignment;
pub mod components;
pub mod message_passing;
pub mod spheres;

pub use assignment::{Cluster, ClusterAssignment, ClusterCenter};

use crate::bio::SequenceTable;
use crate::matching::NeighborSource;
use crate::StarlingError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ClusterAlgorithm {
    /// Absorb into a neighbor only when it outweighs by the merge ratio.
    #[default]
    #[serde(alias = "mp")]
    MessagePassing,
    /// Greedy balls of radius tau around the heaviest unabsorbed sequence.
    #[serde(alias = "sphere")]
    Spheres,
    /// Connected components of the match graph.
    #[serde(alias = "connected-components")]
    Components,
}

impl ClusterAlgorithm {
    pub fn name(&self) -> &'static str {
        match self {
            ClusterAlgorithm::MessagePassing => "message-passing",
            ClusterAlgorithm::Spheres => "spheres",
            ClusterAlgorithm::Components => "components",
        }
    }

    /// Spheres only ever queries sequences that are still unabsorbed, so it
    /// searches lazily on the calling thread through one tower instead of
    /// building the match graph on the pool. `performance.threads` and the
    /// search progress bar do not apply to it.
    pub fn searches_on_demand(&self) -> bool {
        matches!(self, ClusterAlgorithm::Spheres)
    }
}

impl std::fmt::Display for ClusterAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ClusterAlgorithm {
    type Err = StarlingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('_', "-").as_str() {
            "message-passing" | "mp" | "mp-cluster" => Ok(ClusterAlgorithm::MessagePassing),
            "spheres" | "sphere" | "spheres-cluster" => Ok(ClusterAlgorithm::Spheres),
            "components" | "connected-components" | "components-cluster" => {
                Ok(ClusterAlgorithm::Components)
            }
            other => Err(StarlingError::Config(format!(
                "unknown clustering algorithm '{}'",
                other
            ))),
        }
    }
}

pub struct ClusterEngine<'a> {
    table: &'a SequenceTable,
    algorithm: ClusterAlgorithm,
    parent_to_child: f64,
}

impl<'a> ClusterEngine<'a> {
    pub fn new(table: &'a SequenceTable, algorithm: ClusterAlgorithm, parent_to_child: f64) -> Self {
        Self {
            table,
            algorithm,
            parent_to_child,
        }
    }

    pub fn algorithm(&self) -> ClusterAlgorithm {
        self.algorithm
    }

    pub fn run<S: NeighborSource>(&self, source: S) -> crate::Result<ClusterAssignment> {
        let start = Instant::now();
        let parent = match self.algorithm {
            ClusterAlgorithm::MessagePassing => {
                message_passing::assign(self.table, source, self.parent_to_child)?
            }
            ClusterAlgorithm::Spheres => spheres::assign(self.table, source)?,
            ClusterAlgorithm::Components => components::assign(self.table, source)?,
        };

        let assignment = ClusterAssignment::from_parents(self.table, parent)?;
        assignment.validate(self.table)?;

        tracing::info!(
            "{} clustering: {} sequences in {} clusters ({:.2}s)",
            self.algorithm,
            self.table.len(),
            assignment.len(),
            start.elapsed().as_secs_f64()
        );
        Ok(assignment)
    }
}
