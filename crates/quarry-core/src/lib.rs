//! # quarry-core
//!
//! Foundation crate for the Quarry retrieval engine.
//! Defines the candidate data model, query analysis types, pipeline
//! configuration, error taxonomy, collaborator traits, and constants.
//! Every other crate in the workspace depends on this.

pub mod analysis;
pub mod candidate;
pub mod config;
pub mod constants;
pub mod context;
pub mod errors;
pub mod models;
pub mod scope;
pub mod telemetry;
pub mod traits;

// Re-export the most commonly used types at the crate root.
pub use analysis::{Complexity, Entity, Intent, QueryAnalysis};
pub use candidate::{
    Candidate, CompressedContext, FusedCandidate, Metadata, RankedCandidate, SelectedCandidate,
    Source,
};
pub use config::PipelineConfig;
pub use context::ProcessContext;
pub use errors::{QuarryError, QuarryResult};
pub use models::{DegradationEvent, PipelineStats, RetrievalOutput, Stage};
pub use scope::TenantScope;
