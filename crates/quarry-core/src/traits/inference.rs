use async_trait::async_trait;

use crate::errors::QuarryResult;

/// Embedding generation provider. Used identically for query embeddings,
/// HyDE-document embeddings, and per-candidate embeddings for MMR.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a single text, returning a vector of floats.
    async fn embed(&self, text: &str) -> QuarryResult<Vec<f32>>;

    /// Embed a batch of texts. Batching is the natural place to bound
    /// model-side parallelism.
    async fn embed_batch(&self, texts: &[String]) -> QuarryResult<Vec<Vec<f32>>>;

    /// The dimensionality of embeddings produced by this provider.
    fn dimensions(&self) -> usize;

    /// Human-readable provider name.
    fn name(&self) -> &str;
}

/// LLM text-generation interface used by query enhancement and the
/// optional compression paraphrase path.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn complete(
        &self,
        prompt: &str,
        system: Option<&str>,
        temperature: f32,
        max_tokens: usize,
    ) -> QuarryResult<String>;
}

/// Pairwise (query, passage) relevance scorer: the cross-encoder seam.
#[async_trait]
pub trait PairwiseScorer: Send + Sync {
    async fn score(&self, query: &str, passage: &str) -> QuarryResult<f64>;

    /// Score a batch of passages against one query. Default implementation
    /// loops; batching implementations should override.
    async fn score_batch(&self, query: &str, passages: &[String]) -> QuarryResult<Vec<f64>> {
        let mut scores = Vec::with_capacity(passages.len());
        for passage in passages {
            scores.push(self.score(query, passage).await?);
        }
        Ok(scores)
    }

    /// Whether the scorer is currently usable. A `false` here degrades
    /// reranking to a no-op.
    fn is_available(&self) -> bool {
        true
    }
}
