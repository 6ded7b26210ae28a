//! Collaborator traits: the external stores and models the pipeline
//! composes. All are object-safe async seams held behind `Arc<dyn …>`.

mod inference;
mod stores;

pub use inference::{EmbeddingProvider, LanguageModel, PairwiseScorer};
pub use stores::{FulltextSearch, GraphHit, GraphSearch, TextHit, VectorHit, VectorSearch};
