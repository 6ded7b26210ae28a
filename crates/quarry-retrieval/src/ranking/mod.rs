//! Ranking: pairwise reranking and MMR diversity selection.

pub mod mmr;
pub mod rerank;

pub use mmr::select;
pub use rerank::{rerank, RerankOutcome};
