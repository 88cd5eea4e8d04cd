pub mod config;
pub mod pipeline;

pub use config::{ClusterConfig, Metric, SearchMode};
pub use pipeline::{cluster, Pipeline, RunSummary};
