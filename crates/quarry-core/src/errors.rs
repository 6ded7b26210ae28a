//! Error taxonomy for the retrieval pipeline.
//!
//! Only `ConfigError` and `ScopeError` surface to callers as hard errors;
//! every other variant is a stage error that the orchestrator maps to the
//! stage's defined fallback value.

/// Invalid pipeline configuration. Caller bug, surfaced as a hard error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("top_k must be at least 1")]
    InvalidTopK,

    #[error("fetch_multiplier must be at least 1")]
    InvalidFetchMultiplier,

    #[error("mmr_lambda must be within [0, 1], got {value}")]
    InvalidLambda { value: f64 },

    #[error("redundancy_threshold must be within [0, 1], got {value}")]
    InvalidRedundancyThreshold { value: f64 },

    #[error("max_context_tokens must be at least 1")]
    InvalidTokenBudget,

    #[error("failed to parse config: {reason}")]
    Parse { reason: String },
}

/// Missing or malformed tenant scope. Caller bug, surfaced as a hard error.
#[derive(Debug, thiserror::Error)]
pub enum ScopeError {
    #[error("tenant_id must not be empty")]
    MissingTenant,
}

/// Query enhancement stage errors. Always degraded to no-enhancement.
#[derive(Debug, thiserror::Error)]
pub enum EnhancementError {
    #[error("enhancement call `{operation}` timed out")]
    Timeout { operation: &'static str },

    #[error("language model call failed: {reason}")]
    Llm { reason: String },

    #[error("no language model configured")]
    NoModel,
}

/// Source retrieval stage errors. Degraded to an empty list per source.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("{retriever} search failed: {reason}")]
    Backend {
        retriever: &'static str,
        reason: String,
    },

    #[error("{retriever} search timed out")]
    Timeout { retriever: &'static str },

    #[error("query embedding failed: {reason}")]
    Embedding { reason: String },
}

/// Reranking / diversity stage errors. Degraded to input order.
#[derive(Debug, thiserror::Error)]
pub enum RankingError {
    #[error("pairwise scorer failed: {reason}")]
    Scorer { reason: String },

    #[error("candidate embedding failed: {reason}")]
    Embedding { reason: String },
}

/// Compression stage errors. Degraded to sentence extraction or truncation.
#[derive(Debug, thiserror::Error)]
pub enum CompressionError {
    #[error("llm compression failed: {reason}")]
    Llm { reason: String },
}

/// Unified error type for the Quarry workspace.
#[derive(Debug, thiserror::Error)]
pub enum QuarryError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Scope(#[from] ScopeError),

    #[error(transparent)]
    Enhancement(#[from] EnhancementError),

    #[error(transparent)]
    Search(#[from] SearchError),

    #[error(transparent)]
    Ranking(#[from] RankingError),

    #[error(transparent)]
    Compression(#[from] CompressionError),
}

impl QuarryError {
    /// Whether this error must surface to the caller rather than degrade.
    pub fn is_hard(&self) -> bool {
        matches!(self, QuarryError::Config(_) | QuarryError::Scope(_))
    }
}

pub type QuarryResult<T> = Result<T, QuarryError>;
