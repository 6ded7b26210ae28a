//! Graph retrieval: entity names → case-insensitive node match →
//! associated chunks, ranked by co-occurring related-entity count.

use std::sync::Arc;

use quarry_core::candidate::{Candidate, Source};
use quarry_core::constants::GRAPH_RELATED_SATURATION;
use quarry_core::errors::QuarryResult;
use quarry_core::scope::TenantScope;
use quarry_core::traits::GraphSearch;

pub struct GraphRetriever {
    store: Arc<dyn GraphSearch>,
}

impl GraphRetriever {
    pub fn new(store: Arc<dyn GraphSearch>) -> Self {
        Self { store }
    }

    pub async fn retrieve(
        &self,
        entity_names: &[String],
        scope: &TenantScope,
        top_k: usize,
    ) -> QuarryResult<Vec<Candidate>> {
        if entity_names.is_empty() {
            return Ok(Vec::new());
        }
        let hits = self.store.related_chunks(entity_names, scope, top_k).await?;
        let mut candidates: Vec<Candidate> = hits
            .into_iter()
            .map(|h| {
                let mut metadata = h.metadata;
                metadata
                    .extra
                    .insert("entity".into(), h.entity_name.clone());
                metadata
                    .extra
                    .insert("entity_label".into(), h.entity_label.clone());
                Candidate {
                    id: h.chunk_id,
                    content: h.chunk_content,
                    score: graph_score(h.related_entity_count),
                    source: Source::Graph,
                    metadata,
                }
            })
            .collect();
        candidates.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        candidates.truncate(top_k);
        Ok(candidates)
    }
}

/// Relevance proxy: related-entity count saturated at
/// `GRAPH_RELATED_SATURATION`, normalized onto a small fixed [0, 0.5]
/// scale so it never rivals raw similarity scores.
pub fn graph_score(related_entity_count: usize) -> f64 {
    let saturated = related_entity_count.min(GRAPH_RELATED_SATURATION) as f64;
    saturated / GRAPH_RELATED_SATURATION as f64 * 0.5
}
