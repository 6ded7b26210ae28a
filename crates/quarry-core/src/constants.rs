/// Quarry system version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Number of leading characters (case-folded, whitespace-collapsed) used as
/// the content dedup key across fusion and redundancy removal.
pub const DEDUP_KEY_LEN: usize = 100;

/// RRF smoothing constant from the original SIGIR 2009 paper.
pub const DEFAULT_RRF_K: u32 = 60;

/// MMR relevance/diversity balance. 1.0 = pure relevance.
pub const DEFAULT_MMR_LAMBDA: f64 = 0.7;

/// Character-trigram Jaccard overlap above which two contexts count as
/// near-duplicates.
pub const DEFAULT_REDUNDANCY_THRESHOLD: f64 = 0.8;

/// Best-effective-score floor below which a complex query is decomposed
/// into sub-questions and retried.
pub const DEFAULT_CONFIDENCE_FLOOR: f64 = 0.3;

/// Rough tokens per extracted sentence, used to size the fast compression path.
pub const TOKENS_PER_SENTENCE: usize = 30;

/// Passages are truncated to this many characters before pairwise scoring.
pub const RERANK_PASSAGE_MAX_CHARS: usize = 1000;

/// Bounded capacity of the per-process query-analysis cache.
pub const ANALYSIS_CACHE_CAPACITY: u64 = 1024;

/// Top-k used on the simple-query fast path.
pub const SIMPLE_TOP_K: usize = 3;

/// Maximum keyword tokens handed to the graph retriever when no named
/// entities were extracted.
pub const GRAPH_KEYWORD_LIMIT: usize = 5;

/// Related-entity count at which the graph relevance proxy saturates.
pub const GRAPH_RELATED_SATURATION: usize = 5;

/// Maximum multi-query variants fanned out per request.
pub const MAX_QUERY_VARIANTS: usize = 3;

/// Maximum sub-questions retried on the low-confidence decomposition path.
pub const MAX_SUB_QUESTIONS: usize = 3;

/// Default per-retriever fan-out timeout in milliseconds.
pub const DEFAULT_RETRIEVER_TIMEOUT_MS: u64 = 3_000;

/// Default per-call timeout for enhancement LLM calls in milliseconds.
pub const DEFAULT_ENHANCEMENT_TIMEOUT_MS: u64 = 10_000;

/// Prompt returned when the pipeline produced no contexts at all.
pub const EMPTY_CONTEXT_PROMPT: &str = "No relevant context found.";
