use crate::bio::{Alphabet, SequenceTable};
use crate::cluster::ClusterAlgorithm;
use crate::{StarlingError, MAX_TAU};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Metric {
    /// Unit-cost insertions, deletions and substitutions.
    #[default]
    Levenshtein,
    /// Substitutions only; all sequences must share one length.
    Hamming,
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Metric::Levenshtein => write!(f, "levenshtein"),
            Metric::Hamming => write!(f, "hamming"),
        }
    }
}

impl FromStr for Metric {
    type Err = StarlingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "levenshtein" | "edit" => Ok(Metric::Levenshtein),
            "hamming" => Ok(Metric::Hamming),
            other => Err(StarlingError::Config(format!(
                "unknown distance metric '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SearchMode {
    /// Skip subtrees the DP row or height bound rule out.
    #[default]
    Pruned,
    /// Visit every trie node. Only useful for checking the pruned search.
    Exhaustive,
}

impl FromStr for SearchMode {
    type Err = StarlingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pruned" => Ok(SearchMode::Pruned),
            "exhaustive" => Ok(SearchMode::Exhaustive),
            other => Err(StarlingError::Config(format!(
                "unknown search mode '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClusterConfig {
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub clustering: ClusteringConfig,
    #[serde(default)]
    pub performance: PerformanceConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Maximum distance; `None` picks one from the median sequence length.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tau: Option<u8>,
    #[serde(default)]
    pub metric: Metric,
    #[serde(default)]
    pub mode: SearchMode,
    #[serde(default)]
    pub alphabet: Alphabet,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusteringConfig {
    #[serde(default)]
    pub algorithm: ClusterAlgorithm,
    /// Minimum parent/child count ratio for message passing.
    #[serde(default = "default_parent_to_child")]
    pub parent_to_child: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceConfig {
    /// Worker threads for the match phase (0 = all cores)
    #[serde(default)]
    pub threads: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub verbose: bool,
}

fn default_parent_to_child() -> f64 { 5.0 }

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            tau: None,
            metric: Metric::default(),
            mode: SearchMode::default(),
            alphabet: Alphabet::default(),
        }
    }
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            algorithm: ClusterAlgorithm::default(),
            parent_to_child: default_parent_to_child(),
        }
    }
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self { threads: 0 }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { verbose: false }
    }
}

impl ClusterConfig {
    pub fn with_tau(mut self, tau: u8) -> Self {
        self.search.tau = Some(tau);
        self
    }

    pub fn with_metric(mut self, metric: Metric) -> Self {
        self.search.metric = metric;
        self
    }

    pub fn with_mode(mut self, mode: SearchMode) -> Self {
        self.search.mode = mode;
        self
    }

    pub fn with_alphabet(mut self, alphabet: Alphabet) -> Self {
        self.search.alphabet = alphabet;
        self
    }

    pub fn with_algorithm(mut self, algorithm: ClusterAlgorithm) -> Self {
        self.clustering.algorithm = algorithm;
        self
    }

    pub fn with_parent_to_child(mut self, ratio: f64) -> Self {
        self.clustering.parent_to_child = ratio;
        self
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.performance.threads = threads;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.output.verbose = verbose;
        self
    }

    /// Reject settings the search and clustering phases cannot honour.
    pub fn validate(&self) -> crate::Result<()> {
        if let Some(tau) = self.search.tau {
            check_tau(tau)?;
        }
        let ratio = self.clustering.parent_to_child;
        if !ratio.is_finite() || ratio <= 0.0 {
            return Err(StarlingError::Config(format!(
                "parent_to_child ratio must be a positive number, got {}",
                ratio
            )));
        }
        Ok(())
    }

    /// The configured tau, or `min(MAX_TAU, 2 + median_len / 30)`.
    pub fn resolve_tau(&self, table: &SequenceTable) -> crate::Result<u8> {
        match self.search.tau {
            Some(tau) => check_tau(tau).map(|_| tau),
            None => Ok(auto_tau(table.median_len())),
        }
    }
}

pub fn check_tau(tau: u8) -> crate::Result<()> {
    if tau > MAX_TAU {
        return Err(StarlingError::Config(format!(
            "tau {} exceeds the maximum of {}",
            tau, MAX_TAU
        )));
    }
    Ok(())
}

pub fn auto_tau(median_len: usize) -> u8 {
    (2 + median_len / 30).min(MAX_TAU as usize) as u8
}

pub fn default_config() -> ClusterConfig {
    ClusterConfig::default()
}

pub fn load_config<P: AsRef<Path>>(path: P) -> crate::Result<ClusterConfig> {
    let contents = std::fs::read_to_string(path)?;
    let config: ClusterConfig = toml::from_str(&contents)
        .map_err(|e| StarlingError::Parse(format!("Failed to parse config: {}", e)))?;
    config.validate()?;
    Ok(config)
}

pub fn save_config<P: AsRef<Path>>(path: P, config: &ClusterConfig) -> crate::Result<()> {
    let contents = toml::to_string_pretty(config)
        .map_err(|e| StarlingError::Parse(format!("Failed to serialize config: {}", e)))?;
    std::fs::write(path, contents)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = default_config();
        assert_eq!(config.search.tau, None);
        assert_eq!(config.search.metric, Metric::Levenshtein);
        assert_eq!(config.clustering.algorithm, ClusterAlgorithm::MessagePassing);
        assert_eq!(config.clustering.parent_to_child, 5.0);
        assert_eq!(config.performance.threads, 0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_tau_above_maximum_rejected() {
        let config = ClusterConfig::default().with_tau(MAX_TAU + 1);
        assert!(matches!(config.validate(), Err(StarlingError::Config(_))));
        assert!(ClusterConfig::default().with_tau(MAX_TAU).validate().is_ok());
    }

    #[test]
    fn test_bad_ratio_rejected() {
        for ratio in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let config = ClusterConfig::default().with_parent_to_child(ratio);
            assert!(config.validate().is_err(), "ratio {} accepted", ratio);
        }
    }

    #[test]
    fn test_auto_tau() {
        assert_eq!(auto_tau(0), 2);
        assert_eq!(auto_tau(29), 2);
        assert_eq!(auto_tau(30), 3);
        assert_eq!(auto_tau(100), 5);
        assert_eq!(auto_tau(500), MAX_TAU);
    }

    #[test]
    fn test_partial_toml() {
        let config: ClusterConfig = toml::from_str(
            r#"
[search]
tau = 1
metric = "hamming"

[clustering]
algorithm = "spheres"
"#,
        )
        .unwrap();
        assert_eq!(config.search.tau, Some(1));
        assert_eq!(config.search.metric, Metric::Hamming);
        assert_eq!(config.clustering.algorithm, ClusterAlgorithm::Spheres);
        assert_eq!(config.clustering.parent_to_child, 5.0);
        assert_eq!(config.search.alphabet, Alphabet::nucleotide());
    }

    #[test]
    fn test_metric_from_str() {
        assert_eq!("Hamming".parse::<Metric>().unwrap(), Metric::Hamming);
        assert!("manhattan".parse::<Metric>().is_err());
        assert_eq!(
            "exhaustive".parse::<SearchMode>().unwrap(),
            SearchMode::Exhaustive
        );
    }
}
