/// Clustering pipeline: config → trie → match search → cluster assignment

use crate::bio::SequenceTable;
use crate::cluster::{ClusterAssignment, ClusterEngine};
use crate::core::config::ClusterConfig;
use crate::index::SearchTrie;
use crate::matching::{LiveSearch, MatchEngine, MatchGraph};
use crate::utils::parallel::resolve_threads;
use crate::utils::progress::progress_bar;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Numbers describing one pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub tau: u8,
    pub sequences: usize,
    pub trie_nodes: usize,
    /// Worker threads used for the match search.
    pub search_threads: usize,
    /// Directed match records; zero when the algorithm searched on demand.
    pub records: usize,
    /// Trie walks run by on-demand search.
    pub live_queries: usize,
    pub clusters: usize,
    pub elapsed: Duration,
}

pub struct Pipeline {
    config: ClusterConfig,
    progress_callback: Option<Box<dyn Fn(&str, f64) + Send + Sync>>,
    silent: bool,
}

impl Pipeline {
    pub fn new(config: ClusterConfig) -> Self {
        Self {
            config,
            progress_callback: None,
            silent: false,
        }
    }

    pub fn with_silent(mut self, silent: bool) -> Self {
        self.silent = silent;
        self
    }

    pub fn with_progress_callback<F>(mut self, callback: F) -> Self
    where
        F: Fn(&str, f64) + Send + Sync + 'static,
    {
        self.progress_callback = Some(Box::new(callback));
        self
    }

    pub fn config(&self) -> &ClusterConfig {
        &self.config
    }

    fn report(&self, phase: &str, fraction: f64) {
        if let Some(ref callback) = self.progress_callback {
            callback(phase, fraction);
        }
    }

    pub fn run(&self, table: &SequenceTable) -> crate::Result<(ClusterAssignment, RunSummary)> {
        let start = Instant::now();
        self.config.validate()?;
        let tau = self.config.resolve_tau(table)?;
        let search = &self.config.search;
        let clustering = &self.config.clustering;

        tracing::info!(
            "Clustering {} unique sequences ({} reads) with tau={}, {} metric, {}",
            table.len(),
            table.total_count(),
            tau,
            search.metric,
            clustering.algorithm
        );

        self.report("Building trie", 0.0);
        let trie_start = Instant::now();
        let trie = SearchTrie::build(table, &search.alphabet, search.metric)?;
        tracing::info!(
            "Trie built: {} nodes, depth {} ({:.2}s)",
            trie.len(),
            trie.max_depth(),
            trie_start.elapsed().as_secs_f64()
        );

        let engine = MatchEngine::new(table, &trie, tau, search.mode)?;
        let clusters = ClusterEngine::new(table, clustering.algorithm, clustering.parent_to_child);

        let mut summary = RunSummary {
            tau,
            sequences: table.len(),
            trie_nodes: trie.len(),
            ..RunSummary::default()
        };

        let assignment = if clustering.algorithm.searches_on_demand() {
            self.report("Clustering", 0.5);
            if self.config.performance.threads != 1 {
                tracing::debug!(
                    "{} searches on demand on the calling thread; ignoring thread hint {}",
                    clustering.algorithm,
                    self.config.performance.threads
                );
            }
            summary.search_threads = 1;
            let mut live = LiveSearch::new(&engine);
            let assignment = clusters.run(&mut live)?;
            summary.live_queries = live.queries();
            assignment
        } else {
            self.report("Finding matches", 0.1);
            let threads = resolve_threads(self.config.performance.threads);
            summary.search_threads = threads;
            let verbose = self.config.output.verbose && !self.silent;
            let pb = progress_bar(table.len() as u64, "sequences searched", verbose);
            let match_start = Instant::now();
            let records = engine.find_all(threads, &pb)?;
            pb.finish_and_clear();
            tracing::info!(
                "Found {} match records ({:.2}s)",
                records.len(),
                match_start.elapsed().as_secs_f64()
            );

            summary.records = records.len();
            let graph = MatchGraph::from_records(table.len(), &records)?;
            drop(records);

            self.report("Clustering", 0.5);
            clusters.run(&graph)?
        };

        self.report("Done", 1.0);

        summary.clusters = assignment.len();
        summary.elapsed = start.elapsed();
        tracing::info!(
            "Formed {} clusters from {} sequences in {:.2}s",
            summary.clusters,
            summary.sequences,
            summary.elapsed.as_secs_f64()
        );
        Ok((assignment, summary))
    }
}

/// Cluster `table` with `config`, inferring tau when it is not set.
pub fn cluster(table: &SequenceTable, config: &ClusterConfig) -> crate::Result<ClusterAssignment> {
    let (assignment, _) = Pipeline::new(config.clone()).with_silent(true).run(table)?;
    Ok(assignment)
}
