//! Mock collaborators for integration and property tests: in-memory
//! tenant-scoped stores, a deterministic hash embedder, a scripted LLM,
//! and a scripted pairwise scorer. All record call counts and can be
//! switched into failure mode to exercise degradation paths.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use quarry_core::candidate::Metadata;
use quarry_core::context::ProcessContext;
use quarry_core::errors::{QuarryResult, SearchError};
use quarry_core::scope::TenantScope;
use quarry_core::traits::{
    EmbeddingProvider, FulltextSearch, GraphHit, GraphSearch, LanguageModel, PairwiseScorer,
    TextHit, VectorHit, VectorSearch,
};

pub const EMBED_DIMS: usize = 16;

/// Deterministic bag-of-words embedding: each token hashes to a
/// dimension and a sign. Similar texts share dimensions, so cosine
/// similarity behaves plausibly in tests.
pub fn hash_embed(text: &str) -> Vec<f32> {
    let mut v = vec![0.0f32; EMBED_DIMS];
    for token in text.to_lowercase().split_whitespace() {
        let mut h: u64 = 0xcbf2_9ce4_8422_2325;
        for b in token.bytes() {
            h ^= b as u64;
            h = h.wrapping_mul(0x0000_0100_0000_01b3);
        }
        let dim = (h % EMBED_DIMS as u64) as usize;
        let sign = if (h >> 32) & 1 == 0 { 1.0 } else { -1.0 };
        v[dim] += sign;
    }
    v
}

pub fn cosine(a: &[f32], b: &[f32]) -> f64 {
    let dot: f64 = a.iter().zip(b).map(|(x, y)| *x as f64 * *y as f64).sum();
    let na: f64 = a.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();
    let nb: f64 = b.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();
    if na == 0.0 || nb == 0.0 {
        return 0.0;
    }
    dot / (na * nb)
}

/// One seeded document visible to the vector and fulltext stores.
#[derive(Debug, Clone)]
pub struct SeedDoc {
    pub id: String,
    pub tenant_id: String,
    pub scope_id: String,
    pub content: String,
    pub filename: Option<String>,
}

impl SeedDoc {
    pub fn new(id: &str, tenant_id: &str, scope_id: &str, content: &str) -> Self {
        Self {
            id: id.into(),
            tenant_id: tenant_id.into(),
            scope_id: scope_id.into(),
            content: content.into(),
            filename: None,
        }
    }

    pub fn with_filename(mut self, filename: &str) -> Self {
        self.filename = Some(filename.into());
        self
    }

    fn metadata(&self) -> Metadata {
        Metadata {
            filename: self.filename.clone(),
            ..Default::default()
        }
    }

    fn in_scope(&self, scope: &TenantScope) -> bool {
        self.tenant_id == scope.tenant_id
            && (scope.scope_id.is_empty() || self.scope_id == scope.scope_id)
    }
}

fn backend_err(retriever: &'static str) -> quarry_core::errors::QuarryError {
    SearchError::Backend {
        retriever,
        reason: "mock failure".into(),
    }
    .into()
}

// ── Vector store ────────────────────────────────────────────────────────

pub struct MockVectorStore {
    docs: Vec<(SeedDoc, Vec<f32>)>,
    fail: AtomicBool,
    calls: AtomicUsize,
}

impl MockVectorStore {
    pub fn new(docs: Vec<SeedDoc>) -> Self {
        let docs = docs
            .into_iter()
            .map(|d| {
                let embedding = hash_embed(&d.content);
                (d, embedding)
            })
            .collect();
        Self {
            docs,
            fail: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VectorSearch for MockVectorStore {
    async fn search(
        &self,
        embedding: &[f32],
        scope: &TenantScope,
        top_k: usize,
    ) -> QuarryResult<Vec<VectorHit>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(backend_err("vector"));
        }
        let mut hits: Vec<VectorHit> = self
            .docs
            .iter()
            .filter(|(d, _)| d.in_scope(scope))
            .map(|(d, e)| VectorHit {
                id: d.id.clone(),
                content: d.content.clone(),
                score: cosine(embedding, e),
                metadata: d.metadata(),
            })
            .collect();
        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        hits.truncate(top_k);
        Ok(hits)
    }
}

// ── Fulltext store ──────────────────────────────────────────────────────

pub struct MockTextStore {
    docs: Vec<SeedDoc>,
    fail: AtomicBool,
    calls: AtomicUsize,
}

impl MockTextStore {
    pub fn new(docs: Vec<SeedDoc>) -> Self {
        Self {
            docs,
            fail: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FulltextSearch for MockTextStore {
    async fn search(
        &self,
        query: &str,
        scope: &TenantScope,
        top_k: usize,
    ) -> QuarryResult<Vec<TextHit>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(backend_err("fulltext"));
        }
        let terms: Vec<String> = query
            .to_lowercase()
            .split_whitespace()
            .filter(|t| t.len() > 2)
            .map(String::from)
            .collect();
        let mut hits: Vec<TextHit> = self
            .docs
            .iter()
            .filter(|d| d.in_scope(scope))
            .filter_map(|d| {
                let haystack = d.content.to_lowercase();
                let matched = terms.iter().filter(|t| haystack.contains(*t)).count();
                if matched == 0 {
                    return None;
                }
                Some(TextHit {
                    id: d.id.clone(),
                    content: d.content.clone(),
                    // BM25-like: term hits scaled past 1.0 to look
                    // nothing like a cosine score.
                    score: matched as f64 * 2.7,
                    metadata: d.metadata(),
                })
            })
            .collect();
        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        hits.truncate(top_k);
        Ok(hits)
    }
}

// ── Graph store ─────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct GraphSeed {
    pub entity_name: String,
    pub entity_label: String,
    pub tenant_id: String,
    pub scope_id: String,
    pub chunk_id: String,
    pub chunk_content: String,
    pub related_count: usize,
}

pub struct MockGraphStore {
    nodes: Vec<GraphSeed>,
    fail: AtomicBool,
    calls: AtomicUsize,
}

impl MockGraphStore {
    pub fn new(nodes: Vec<GraphSeed>) -> Self {
        Self {
            nodes,
            fail: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GraphSearch for MockGraphStore {
    async fn related_chunks(
        &self,
        entity_names: &[String],
        scope: &TenantScope,
        top_k: usize,
    ) -> QuarryResult<Vec<GraphHit>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(backend_err("graph"));
        }
        let wanted: Vec<String> = entity_names.iter().map(|e| e.to_lowercase()).collect();
        let mut hits: Vec<GraphHit> = self
            .nodes
            .iter()
            .filter(|n| {
                n.tenant_id == scope.tenant_id
                    && (scope.scope_id.is_empty() || n.scope_id == scope.scope_id)
            })
            .filter(|n| {
                let name = n.entity_name.to_lowercase();
                wanted.iter().any(|w| name.contains(w) || w.contains(&name))
            })
            .map(|n| GraphHit {
                entity_name: n.entity_name.clone(),
                entity_label: n.entity_label.clone(),
                chunk_id: n.chunk_id.clone(),
                chunk_content: n.chunk_content.clone(),
                related_entity_count: n.related_count,
                metadata: Metadata::default(),
            })
            .collect();
        hits.truncate(top_k);
        Ok(hits)
    }
}

// ── Embedder ────────────────────────────────────────────────────────────

pub struct MockEmbedder {
    fail: AtomicBool,
    calls: AtomicUsize,
}

impl MockEmbedder {
    pub fn new() -> Self {
        Self {
            fail: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for MockEmbedder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EmbeddingProvider for MockEmbedder {
    async fn embed(&self, text: &str) -> QuarryResult<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(SearchError::Embedding {
                reason: "mock embedder failure".into(),
            }
            .into());
        }
        Ok(hash_embed(text))
    }

    async fn embed_batch(&self, texts: &[String]) -> QuarryResult<Vec<Vec<f32>>> {
        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            out.push(self.embed(text).await?);
        }
        Ok(out)
    }

    fn dimensions(&self) -> usize {
        EMBED_DIMS
    }

    fn name(&self) -> &str {
        "mock-hash-embedder"
    }
}

// ── Language model ──────────────────────────────────────────────────────

/// Scripted LLM keyed on system-prompt content. Canned responses can be
/// layered on top; by default it produces plausible deterministic output
/// for each enhancement operation.
pub struct ScriptedLlm {
    canned: Mutex<Vec<(String, String)>>,
    fail: AtomicBool,
    calls: AtomicUsize,
}

impl ScriptedLlm {
    pub fn new() -> Self {
        Self {
            canned: Mutex::new(Vec::new()),
            fail: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
        }
    }

    /// Respond with `response` whenever the prompt or system prompt
    /// contains `needle`.
    pub fn respond_when(&self, needle: &str, response: &str) {
        self.canned
            .lock()
            .unwrap()
            .push((needle.into(), response.into()));
    }

    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for ScriptedLlm {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LanguageModel for ScriptedLlm {
    async fn complete(
        &self,
        prompt: &str,
        system: Option<&str>,
        _temperature: f32,
        _max_tokens: usize,
    ) -> QuarryResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(quarry_core::errors::EnhancementError::Llm {
                reason: "mock llm failure".into(),
            }
            .into());
        }

        let system = system.unwrap_or_default();
        for (needle, response) in self.canned.lock().unwrap().iter() {
            if prompt.contains(needle) || system.contains(needle) {
                return Ok(response.clone());
            }
        }

        // Deterministic defaults per operation.
        let last_line = prompt.lines().last().unwrap_or_default().trim();
        if system.contains("rewrite") {
            Ok(last_line.to_string())
        } else if system.contains("alternative phrasings") {
            Ok(format!("{last_line} explained\ndetails about {last_line}"))
        } else if system.contains("hypothetical") {
            Ok(format!("A helpful passage answering: {last_line}."))
        } else if system.contains("sub-questions") {
            Ok(last_line.to_string())
        } else {
            Ok(last_line.to_string())
        }
    }
}

// ── Pairwise scorer ─────────────────────────────────────────────────────

/// Deterministic lexical-overlap scorer in [0, 1].
pub struct ScriptedScorer {
    fail: AtomicBool,
    calls: AtomicUsize,
}

impl ScriptedScorer {
    pub fn new() -> Self {
        Self {
            fail: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for ScriptedScorer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PairwiseScorer for ScriptedScorer {
    async fn score(&self, query: &str, passage: &str) -> QuarryResult<f64> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(quarry_core::errors::RankingError::Scorer {
                reason: "mock scorer failure".into(),
            }
            .into());
        }
        let haystack = passage.to_lowercase();
        let terms: Vec<&str> = query.split_whitespace().collect();
        if terms.is_empty() {
            return Ok(0.0);
        }
        let matched = terms
            .iter()
            .filter(|t| {
                let t = t.to_lowercase();
                t.len() > 2 && haystack.contains(&t)
            })
            .count();
        Ok(matched as f64 / terms.len() as f64)
    }
}

// ── Assembly helpers ────────────────────────────────────────────────────

/// Everything a pipeline test needs, with handles kept for call-count
/// and failure-mode assertions.
pub struct Fixture {
    pub ctx: Arc<ProcessContext>,
    pub vector: Arc<MockVectorStore>,
    pub fulltext: Arc<MockTextStore>,
    pub graph: Arc<MockGraphStore>,
    pub embedder: Arc<MockEmbedder>,
    pub llm: Arc<ScriptedLlm>,
    pub scorer: Arc<ScriptedScorer>,
}

/// Build a full fixture (LLM and scorer wired in) over the given seeds.
pub fn fixture(docs: Vec<SeedDoc>, nodes: Vec<GraphSeed>) -> Fixture {
    let vector = Arc::new(MockVectorStore::new(docs.clone()));
    let fulltext = Arc::new(MockTextStore::new(docs));
    let graph = Arc::new(MockGraphStore::new(nodes));
    let embedder = Arc::new(MockEmbedder::new());
    let llm = Arc::new(ScriptedLlm::new());
    let scorer = Arc::new(ScriptedScorer::new());

    let ctx = ProcessContext::new(
        vector.clone(),
        fulltext.clone(),
        graph.clone(),
        embedder.clone(),
    )
    .with_llm(llm.clone())
    .with_scorer(scorer.clone());

    Fixture {
        ctx: Arc::new(ctx),
        vector,
        fulltext,
        graph,
        embedder,
        llm,
        scorer,
    }
}
