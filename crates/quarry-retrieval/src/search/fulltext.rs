//! Lexical retrieval over the full-text index (BM25-style scores).

use std::sync::Arc;

use quarry_core::candidate::{Candidate, Source};
use quarry_core::errors::QuarryResult;
use quarry_core::scope::TenantScope;
use quarry_core::traits::FulltextSearch;

pub struct FulltextRetriever {
    store: Arc<dyn FulltextSearch>,
}

impl FulltextRetriever {
    pub fn new(store: Arc<dyn FulltextSearch>) -> Self {
        Self { store }
    }

    pub async fn retrieve(
        &self,
        query: &str,
        scope: &TenantScope,
        top_k: usize,
    ) -> QuarryResult<Vec<Candidate>> {
        let hits = self.store.search(query, scope, top_k).await?;
        Ok(hits
            .into_iter()
            .map(|h| Candidate {
                id: h.id,
                content: h.content,
                score: h.score,
                source: Source::Fulltext,
                metadata: h.metadata,
            })
            .collect())
    }
}
