//! Request-scoped output models: pipeline result, degradation ledger,
//! stage statistics.

use serde::{Deserialize, Serialize};

use crate::analysis::QueryAnalysis;
use crate::candidate::CompressedContext;

/// Pipeline stage names used in degradation events and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Enhancement,
    VectorSearch,
    FulltextSearch,
    GraphSearch,
    HydeSearch,
    Rerank,
    Mmr,
    Compression,
    Pipeline,
}

/// One recorded degradation: a stage that fell back to simpler behavior.
/// Degradations never change the success/failure contract; they are
/// surfaced here (and logged) so callers can observe quality loss.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DegradationEvent {
    pub stage: Stage,
    pub reason: String,
}

impl DegradationEvent {
    pub fn new(stage: Stage, reason: impl Into<String>) -> Self {
        Self {
            stage,
            reason: reason.into(),
        }
    }
}

/// Candidate counts and timing across the pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineStats {
    /// Raw candidates across all sources and variants, pre-fusion.
    pub fetched: usize,
    /// Distinct candidates after RRF fusion.
    pub fused: usize,
    /// Candidates scored by the reranker (0 when skipped).
    pub reranked: usize,
    /// Final selection size before compression.
    pub selected: usize,
    pub total_ms: u64,
}

/// Result of a full `Retrieve` call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalOutput {
    pub contexts: Vec<CompressedContext>,
    /// Deterministic source-attributed block for direct prompt inclusion.
    pub formatted_prompt: String,
    pub analysis: QueryAnalysis,
    pub degradations: Vec<DegradationEvent>,
    pub stats: PipelineStats,
}
