use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::candidate::Metadata;
use crate::errors::QuarryResult;
use crate::scope::TenantScope;

/// A nearest-neighbor hit from the dense vector index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorHit {
    pub id: String,
    pub content: String,
    /// Cosine / inner-product similarity. Source-local.
    pub score: f64,
    #[serde(default)]
    pub metadata: Metadata,
}

/// A lexical hit from the full-text index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextHit {
    pub id: String,
    pub content: String,
    /// Relevance per the underlying text index (BM25-like). Source-local.
    pub score: f64,
    #[serde(default)]
    pub metadata: Metadata,
}

/// A chunk reached through the graph store by entity match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphHit {
    pub entity_name: String,
    pub entity_label: String,
    pub chunk_id: String,
    pub chunk_content: String,
    /// Count of co-occurring related entities; the relevance proxy.
    pub related_entity_count: usize,
    #[serde(default)]
    pub metadata: Metadata,
}

/// Tenant-scoped nearest-neighbor query interface.
#[async_trait]
pub trait VectorSearch: Send + Sync {
    async fn search(
        &self,
        embedding: &[f32],
        scope: &TenantScope,
        top_k: usize,
    ) -> QuarryResult<Vec<VectorHit>>;
}

/// Tenant-scoped lexical search interface.
#[async_trait]
pub trait FulltextSearch: Send + Sync {
    async fn search(
        &self,
        query: &str,
        scope: &TenantScope,
        top_k: usize,
    ) -> QuarryResult<Vec<TextHit>>;
}

/// Graph query interface: entity names to associated text chunks.
/// Node matching is case-insensitive substring matching.
#[async_trait]
pub trait GraphSearch: Send + Sync {
    async fn related_chunks(
        &self,
        entity_names: &[String],
        scope: &TenantScope,
        top_k: usize,
    ) -> QuarryResult<Vec<GraphHit>>;
}
