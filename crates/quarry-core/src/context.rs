//! ProcessContext: collaborator handles plus the bounded analysis cache.
//!
//! Constructed once at service startup and passed by reference. Replaces
//! ambient globals and lazily-loaded module-level model handles.

use std::sync::Arc;

use moka::sync::Cache;

use crate::analysis::QueryAnalysis;
use crate::constants::ANALYSIS_CACHE_CAPACITY;
use crate::traits::{
    EmbeddingProvider, FulltextSearch, GraphSearch, LanguageModel, PairwiseScorer, VectorSearch,
};

/// Shared, read-mostly process state. Safe for concurrent use; nothing in
/// here carries per-request candidate data.
pub struct ProcessContext {
    pub vector: Arc<dyn VectorSearch>,
    pub fulltext: Arc<dyn FulltextSearch>,
    pub graph: Arc<dyn GraphSearch>,
    pub embedder: Arc<dyn EmbeddingProvider>,
    /// Optional: enhancement and LLM compression are skipped without it.
    pub llm: Option<Arc<dyn LanguageModel>>,
    /// Optional: reranking degrades to a no-op without it.
    pub scorer: Option<Arc<dyn PairwiseScorer>>,
    analysis_cache: Cache<String, QueryAnalysis>,
}

impl ProcessContext {
    pub fn new(
        vector: Arc<dyn VectorSearch>,
        fulltext: Arc<dyn FulltextSearch>,
        graph: Arc<dyn GraphSearch>,
        embedder: Arc<dyn EmbeddingProvider>,
    ) -> Self {
        Self {
            vector,
            fulltext,
            graph,
            embedder,
            llm: None,
            scorer: None,
            analysis_cache: Cache::new(ANALYSIS_CACHE_CAPACITY),
        }
    }

    pub fn with_llm(mut self, llm: Arc<dyn LanguageModel>) -> Self {
        self.llm = Some(llm);
        self
    }

    pub fn with_scorer(mut self, scorer: Arc<dyn PairwiseScorer>) -> Self {
        self.scorer = Some(scorer);
        self
    }

    /// Memoize a query analysis keyed by the exact query string.
    /// `compute` must be pure; the cache is bounded, so eviction only
    /// costs recomputation.
    pub fn cached_analysis<F>(&self, query: &str, compute: F) -> QueryAnalysis
    where
        F: FnOnce(&str) -> QueryAnalysis,
    {
        self.analysis_cache
            .get_with_by_ref(query, || compute(query))
    }

    /// Number of cached analyses (test observability).
    pub fn analysis_cache_len(&self) -> u64 {
        self.analysis_cache.run_pending_tasks();
        self.analysis_cache.entry_count()
    }
}
