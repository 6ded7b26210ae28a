//! Pipeline configuration.
//!
//! Passed explicitly into the orchestrator on every call; no hidden global
//! state. Thresholds the system treats as tunable (redundancy overlap,
//! confidence floor, RRF k, MMR λ, timeouts, fusion weights) live here
//! rather than as literals at call sites.

use serde::{Deserialize, Serialize};

use crate::candidate::Source;
use crate::constants;
use crate::errors::ConfigError;

/// Per-source RRF fusion weights.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceWeights {
    pub vector: f64,
    pub fulltext: f64,
    pub graph: f64,
    pub hyde: f64,
}

impl Default for SourceWeights {
    fn default() -> Self {
        Self {
            vector: 1.0,
            fulltext: 0.8,
            graph: 0.5,
            hyde: 0.9,
        }
    }
}

impl SourceWeights {
    pub fn weight(&self, source: Source) -> f64 {
        match source {
            Source::Vector => self.vector,
            Source::Fulltext => self.fulltext,
            Source::Graph => self.graph,
            Source::Hyde => self.hyde,
        }
    }
}

/// Explicit flag struct controlling the adaptive pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Final number of contexts returned.
    pub top_k: usize,
    /// Each source fetches `top_k * fetch_multiplier` candidates.
    pub fetch_multiplier: usize,

    pub use_reranking: bool,
    pub use_query_enhancement: bool,
    pub use_mmr: bool,
    pub use_compression: bool,
    pub use_hyde: bool,
    pub use_multi_query: bool,
    /// Use the LLM paraphrase path inside compression (falls back to
    /// sentence extraction on any failure).
    pub use_llm_compression: bool,
    pub remove_redundancy: bool,

    /// Token ceiling for the compressed context set.
    pub max_context_tokens: usize,
    /// RRF smoothing constant.
    pub rrf_k: u32,
    /// MMR relevance/diversity balance in [0, 1].
    pub mmr_lambda: f64,
    /// Trigram-Jaccard overlap above which a context is dropped as redundant.
    pub redundancy_threshold: f64,
    /// Best-score floor triggering sub-question decomposition for complex
    /// queries.
    pub confidence_floor: f64,
    /// Candidates scoring below this after reranking are dropped.
    pub rerank_score_threshold: Option<f64>,

    pub retriever_timeout_ms: u64,
    pub enhancement_timeout_ms: u64,

    pub source_weights: SourceWeights,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            top_k: 5,
            fetch_multiplier: 3,
            use_reranking: true,
            use_query_enhancement: true,
            use_mmr: true,
            use_compression: true,
            use_hyde: false,
            use_multi_query: false,
            use_llm_compression: false,
            remove_redundancy: true,
            max_context_tokens: 2_000,
            rrf_k: constants::DEFAULT_RRF_K,
            mmr_lambda: constants::DEFAULT_MMR_LAMBDA,
            redundancy_threshold: constants::DEFAULT_REDUNDANCY_THRESHOLD,
            confidence_floor: constants::DEFAULT_CONFIDENCE_FLOOR,
            rerank_score_threshold: None,
            retriever_timeout_ms: constants::DEFAULT_RETRIEVER_TIMEOUT_MS,
            enhancement_timeout_ms: constants::DEFAULT_ENHANCEMENT_TIMEOUT_MS,
            source_weights: SourceWeights::default(),
        }
    }
}

impl PipelineConfig {
    /// Parse from a TOML document. Missing fields take their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text).map_err(|e| ConfigError::Parse {
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject nonsensical values. This is the only hard-error class the
    /// pipeline surfaces besides a missing tenant scope.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.top_k == 0 {
            return Err(ConfigError::InvalidTopK);
        }
        if self.fetch_multiplier == 0 {
            return Err(ConfigError::InvalidFetchMultiplier);
        }
        if !(0.0..=1.0).contains(&self.mmr_lambda) {
            return Err(ConfigError::InvalidLambda {
                value: self.mmr_lambda,
            });
        }
        if !(0.0..=1.0).contains(&self.redundancy_threshold) {
            return Err(ConfigError::InvalidRedundancyThreshold {
                value: self.redundancy_threshold,
            });
        }
        if self.max_context_tokens == 0 {
            return Err(ConfigError::InvalidTokenBudget);
        }
        Ok(())
    }

    /// Candidates fetched per source before fusion.
    pub fn fetch_k(&self) -> usize {
        self.top_k * self.fetch_multiplier
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        PipelineConfig::default().validate().unwrap();
    }

    #[test]
    fn zero_top_k_is_rejected() {
        let config = PipelineConfig {
            top_k: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidTopK)));
    }

    #[test]
    fn lambda_out_of_range_is_rejected() {
        let config = PipelineConfig {
            mmr_lambda: 1.5,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidLambda { .. })
        ));
    }

    #[test]
    fn toml_round_trip_with_partial_fields() {
        let config = PipelineConfig::from_toml_str(
            r#"
            top_k = 8
            use_hyde = true
            mmr_lambda = 0.5

            [source_weights]
            graph = 0.25
            "#,
        )
        .unwrap();
        assert_eq!(config.top_k, 8);
        assert!(config.use_hyde);
        assert!((config.mmr_lambda - 0.5).abs() < 1e-12);
        assert!((config.source_weights.graph - 0.25).abs() < 1e-12);
        // Unset fields keep their defaults.
        assert_eq!(config.rrf_k, constants::DEFAULT_RRF_K);
    }

    #[test]
    fn bad_toml_surfaces_parse_error() {
        assert!(matches!(
            PipelineConfig::from_toml_str("top_k = \"many\""),
            Err(ConfigError::Parse { .. })
        ));
    }
}
