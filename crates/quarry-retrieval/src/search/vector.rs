//! Dense retrieval: embed the query, nearest-neighbor search the store.
//! Also serves the HyDE path by embedding the hypothetical document
//! instead of the query.

use std::sync::Arc;

use quarry_core::candidate::{Candidate, Source};
use quarry_core::errors::QuarryResult;
use quarry_core::scope::TenantScope;
use quarry_core::traits::{EmbeddingProvider, VectorSearch};

pub struct VectorRetriever {
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorSearch>,
}

impl VectorRetriever {
    pub fn new(embedder: Arc<dyn EmbeddingProvider>, store: Arc<dyn VectorSearch>) -> Self {
        Self { embedder, store }
    }

    /// Embed `text` and retrieve its nearest neighbors, tagged with
    /// `source` (`Vector` for the query itself, `Hyde` for a
    /// hypothetical document).
    pub async fn retrieve(
        &self,
        text: &str,
        source: Source,
        scope: &TenantScope,
        top_k: usize,
    ) -> QuarryResult<Vec<Candidate>> {
        let embedding = self.embedder.embed(text).await?;
        let hits = self.store.search(&embedding, scope, top_k).await?;
        Ok(hits
            .into_iter()
            .map(|h| Candidate {
                id: h.id,
                content: h.content,
                score: h.score,
                source,
                metadata: h.metadata,
            })
            .collect())
    }
}
