//! # quarry-retrieval
//!
//! Hybrid retrieval-and-ranking engine: query analysis → optional
//! enhancement → parallel source fan-out → RRF fusion → optional
//! reranking → MMR diversity selection → budgeted compression →
//! formatted, source-attributed context.
//!
//! Every optional stage degrades to its next-simpler behavior on failure;
//! only invalid config/scope surface as hard errors.

pub mod analyze;
pub mod engine;
pub mod enhance;
pub mod prompt;
pub mod ranking;
pub mod search;

pub use engine::RetrievalEngine;
