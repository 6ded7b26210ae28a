//! RetrievalEngine: the adaptive pipeline orchestrator.
//!
//! analyze → enhance? → retrieve (parallel) → fuse → rerank? →
//! diversify? → compress? → format. Stages marked `?` are skipped per
//! config and complexity tier. Any unexpected error inside the adaptive
//! path falls back to the minimal path (fan-out + weighted fusion only),
//! which itself cannot fail: hard errors are reserved for invalid config
//! or a missing tenant scope.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use quarry_compression::{CompressionOptions, ContextCompressor};
use quarry_core::analysis::{Complexity, QueryAnalysis};
use quarry_core::candidate::{
    CompressedContext, FusedCandidate, RankedCandidate, SelectedCandidate,
};
use quarry_core::config::PipelineConfig;
use quarry_core::constants::{GRAPH_KEYWORD_LIMIT, SIMPLE_TOP_K};
use quarry_core::context::ProcessContext;
use quarry_core::errors::{QuarryResult, RankingError};
use quarry_core::models::{DegradationEvent, PipelineStats, RetrievalOutput, Stage};
use quarry_core::scope::TenantScope;

use crate::analyze;
use crate::enhance::{EnhancedQuery, QueryEnhancer};
use crate::prompt;
use crate::ranking;
use crate::search::{self, FanoutRequest};

/// The single entry point exposed to collaborators.
pub struct RetrievalEngine {
    ctx: Arc<ProcessContext>,
    compressor: ContextCompressor,
}

impl RetrievalEngine {
    pub fn new(ctx: Arc<ProcessContext>) -> Self {
        let compressor = match &ctx.llm {
            Some(llm) => ContextCompressor::new().with_llm(llm.clone()),
            None => ContextCompressor::new(),
        };
        Self { ctx, compressor }
    }

    /// Run the full adaptive pipeline for one query.
    ///
    /// Never returns a hard error for upstream failures; `Err` is
    /// reserved for invalid config or scope.
    pub async fn retrieve(
        &self,
        query: &str,
        scope: &TenantScope,
        config: &PipelineConfig,
    ) -> QuarryResult<RetrievalOutput> {
        config.validate()?;
        scope.validate()?;

        let started = Instant::now();
        let analysis = analyze::analyze_cached(&self.ctx, query);
        let effective = adapt_config(config, analysis.complexity);
        debug!(
            complexity = ?analysis.complexity,
            intent = ?analysis.intent,
            top_k = effective.top_k,
            "pipeline configured"
        );

        let mut output = match self
            .run_adaptive(query, scope, &effective, &analysis)
            .await
        {
            Ok(output) => output,
            Err(e) => {
                warn!(error = %e, "adaptive pipeline failed, running minimal fallback");
                self.minimal_fallback(query, scope, &effective, &analysis, e.to_string())
                    .await
            }
        };

        output.stats.total_ms = started.elapsed().as_millis() as u64;
        info!(
            contexts = output.contexts.len(),
            degradations = output.degradations.len(),
            total_ms = output.stats.total_ms,
            "retrieval complete"
        );
        Ok(output)
    }

    async fn run_adaptive(
        &self,
        query: &str,
        scope: &TenantScope,
        config: &PipelineConfig,
        analysis: &QueryAnalysis,
    ) -> QuarryResult<RetrievalOutput> {
        let mut degradations: Vec<DegradationEvent> = Vec::new();
        let mut stats = PipelineStats::default();

        let enhancer = QueryEnhancer::new(
            self.ctx.llm.clone(),
            Duration::from_millis(config.enhancement_timeout_ms),
        );

        // Stage: enhance?
        let enhanced = if config.use_query_enhancement {
            let (enhanced, events) = enhancer.enhance(query, analysis, config).await;
            degradations.extend(events);
            enhanced
        } else {
            EnhancedQuery::default()
        };

        let search_query = enhanced.search_query(query).to_string();
        let mut queries = vec![search_query.clone()];
        for variant in &enhanced.variants {
            if !queries.contains(variant) {
                queries.push(variant.clone());
            }
        }
        // Generation is already gated (use_hyde, or factual/definition
        // intent); any document produced feeds the extra vector call.
        let hyde_document = enhanced.hyde_document.as_deref();
        let entities = analysis.entity_names(GRAPH_KEYWORD_LIMIT);

        // Stage: retrieve (parallel) + fuse.
        let fused = self
            .fan_out_and_fuse(
                &queries,
                &entities,
                hyde_document,
                scope,
                config,
                &mut stats,
                &mut degradations,
            )
            .await;

        if fused.is_empty() {
            debug!("no candidates after fusion");
            return Ok(self.empty_output(analysis.clone(), degradations, stats));
        }

        // Stage: rerank?
        let mut ranked = self
            .rerank_stage(&search_query, fused, config, &mut stats, &mut degradations)
            .await;

        // Low-confidence path: decompose complex queries into
        // sub-questions and retry at smaller depth.
        if analysis.complexity == Complexity::Complex {
            let best = ranked
                .first()
                .map(|r| r.effective_score())
                .unwrap_or_default();
            if best < config.confidence_floor {
                debug!(best, floor = config.confidence_floor, "decomposing query");
                ranked = self
                    .sub_question_pass(
                        query,
                        scope,
                        config,
                        &enhancer,
                        ranked,
                        &mut degradations,
                    )
                    .await;
            }
        }

        // Stage: diversify?
        let selected = self
            .diversify_stage(&search_query, ranked, config, &mut stats, &mut degradations)
            .await;

        // Stage: compress?
        let contexts = if config.use_compression {
            let opts = CompressionOptions {
                max_tokens: config.max_context_tokens,
                remove_redundancy: config.remove_redundancy,
                redundancy_threshold: config.redundancy_threshold,
                use_llm: config.use_llm_compression,
            };
            let (contexts, events) = self
                .compressor
                .compress(&analysis.keywords, selected, &opts)
                .await;
            degradations.extend(events);
            contexts
        } else {
            selected
                .into_iter()
                .map(CompressedContext::unchanged)
                .collect()
        };

        let formatted_prompt = prompt::format_contexts(&contexts);
        Ok(RetrievalOutput {
            contexts,
            formatted_prompt,
            analysis: analysis.clone(),
            degradations,
            stats,
        })
    }

    #[allow(clippy::too_many_arguments)]
    async fn fan_out_and_fuse(
        &self,
        queries: &[String],
        entities: &[String],
        hyde_document: Option<&str>,
        scope: &TenantScope,
        config: &PipelineConfig,
        stats: &mut PipelineStats,
        degradations: &mut Vec<DegradationEvent>,
    ) -> Vec<FusedCandidate> {
        let outcome = search::run_fanout(
            &self.ctx,
            FanoutRequest {
                queries,
                entities,
                hyde_document,
                scope,
                fetch_k: config.fetch_k(),
                timeout: Duration::from_millis(config.retriever_timeout_ms),
            },
            &config.source_weights,
        )
        .await;

        stats.fetched += outcome.fetched;
        degradations.extend(outcome.degradations);

        let fused = search::rrf::fuse(&outcome.lists, &outcome.weights, config.rrf_k);
        stats.fused += fused.len();
        fused
    }

    async fn rerank_stage(
        &self,
        query: &str,
        fused: Vec<FusedCandidate>,
        config: &PipelineConfig,
        stats: &mut PipelineStats,
        degradations: &mut Vec<DegradationEvent>,
    ) -> Vec<RankedCandidate> {
        if !config.use_reranking {
            return fused.into_iter().map(RankedCandidate::from).collect();
        }
        let outcome = ranking::rerank(
            self.ctx.scorer.as_ref(),
            query,
            fused,
            config.top_k,
            config.rerank_score_threshold,
        )
        .await;
        stats.reranked += outcome.scored;
        if let Some(event) = outcome.degraded {
            degradations.push(event);
        }
        outcome.candidates
    }

    /// MMR when enabled and the set overflows `top_k`; plain truncation
    /// otherwise (and when candidate embedding fails).
    async fn diversify_stage(
        &self,
        query: &str,
        ranked: Vec<RankedCandidate>,
        config: &PipelineConfig,
        stats: &mut PipelineStats,
        degradations: &mut Vec<DegradationEvent>,
    ) -> Vec<SelectedCandidate> {
        let selected = if config.use_mmr && ranked.len() > config.top_k {
            match self.embed_for_mmr(query, &ranked).await {
                Ok((query_embedding, embeddings)) => ranking::select(
                    &query_embedding,
                    ranked,
                    &embeddings,
                    config.top_k,
                    config.mmr_lambda,
                ),
                Err(e) => {
                    warn!(error = %e, "mmr degraded to rank-order truncation");
                    degradations.push(DegradationEvent::new(Stage::Mmr, e.to_string()));
                    truncate_selection(ranked, config.top_k)
                }
            }
        } else {
            truncate_selection(ranked, config.top_k)
        };
        stats.selected = selected.len();
        selected
    }

    async fn embed_for_mmr(
        &self,
        query: &str,
        ranked: &[RankedCandidate],
    ) -> QuarryResult<(Vec<f32>, Vec<Vec<f32>>)> {
        let query_embedding =
            self.ctx
                .embedder
                .embed(query)
                .await
                .map_err(|e| RankingError::Embedding {
                    reason: e.to_string(),
                })?;
        let contents: Vec<String> = ranked.iter().map(|r| r.content().to_string()).collect();
        let embeddings = self
            .ctx
            .embedder
            .embed_batch(&contents)
            .await
            .map_err(|e| RankingError::Embedding {
                reason: e.to_string(),
            })?;
        Ok((query_embedding, embeddings))
    }

    /// Retrieve and rerank each sub-question independently at smaller
    /// depth, merge, deduplicate, and rerank the merged set once more.
    /// Keeps the original ranking when decomposition yields nothing new.
    async fn sub_question_pass(
        &self,
        query: &str,
        scope: &TenantScope,
        config: &PipelineConfig,
        enhancer: &QueryEnhancer,
        original: Vec<RankedCandidate>,
        degradations: &mut Vec<DegradationEvent>,
    ) -> Vec<RankedCandidate> {
        let sub_questions = enhancer.decompose(query).await;
        if sub_questions.len() <= 1 {
            return original;
        }

        let sub_top_k = (config.top_k / 2).max(2);
        let sub_config = PipelineConfig {
            top_k: sub_top_k,
            ..config.clone()
        };
        let mut stats = PipelineStats::default();

        let mut merged: Vec<RankedCandidate> = original;
        for sub in &sub_questions {
            let sub_analysis = analyze::analyze(sub);
            let entities = sub_analysis.entity_names(GRAPH_KEYWORD_LIMIT);
            let fused = self
                .fan_out_and_fuse(
                    std::slice::from_ref(sub),
                    &entities,
                    None,
                    scope,
                    &sub_config,
                    &mut stats,
                    degradations,
                )
                .await;
            let ranked = self
                .rerank_stage(sub, fused, &sub_config, &mut stats, degradations)
                .await;
            merged.extend(ranked);
        }

        // Deduplicate by content key, keeping the higher effective score.
        let mut by_key: std::collections::HashMap<String, RankedCandidate> =
            std::collections::HashMap::new();
        let mut order: Vec<String> = Vec::new();
        for candidate in merged {
            let key = candidate.fused.dedup_key.clone();
            match by_key.get_mut(&key) {
                Some(existing) => {
                    if candidate.effective_score() > existing.effective_score() {
                        *existing = candidate;
                    }
                }
                None => {
                    order.push(key.clone());
                    by_key.insert(key, candidate);
                }
            }
        }
        let deduped: Vec<FusedCandidate> = order
            .into_iter()
            .filter_map(|key| by_key.remove(&key))
            .map(|r| r.fused)
            .collect();

        // One final rerank over the merged set at full depth.
        self.rerank_stage(query, deduped, config, &mut stats, degradations)
            .await
    }

    /// Minimal path: raw fan-out + weighted fusion, truncated to top_k.
    /// Must not fail on empty input; returns whatever it can.
    async fn minimal_fallback(
        &self,
        query: &str,
        scope: &TenantScope,
        config: &PipelineConfig,
        analysis: &QueryAnalysis,
        reason: String,
    ) -> RetrievalOutput {
        let mut degradations = vec![DegradationEvent::new(Stage::Pipeline, reason)];
        let mut stats = PipelineStats::default();

        let entities = analysis.entity_names(GRAPH_KEYWORD_LIMIT);
        let fused = self
            .fan_out_and_fuse(
                std::slice::from_ref(&query.to_string()),
                &entities,
                None,
                scope,
                config,
                &mut stats,
                &mut degradations,
            )
            .await;

        let ranked: Vec<RankedCandidate> =
            fused.into_iter().map(RankedCandidate::from).collect();
        let selected = truncate_selection(ranked, config.top_k);
        stats.selected = selected.len();

        let contexts: Vec<CompressedContext> = selected
            .into_iter()
            .map(CompressedContext::unchanged)
            .collect();
        let formatted_prompt = prompt::format_contexts(&contexts);

        RetrievalOutput {
            contexts,
            formatted_prompt,
            analysis: analysis.clone(),
            degradations,
            stats,
        }
    }

    fn empty_output(
        &self,
        analysis: QueryAnalysis,
        degradations: Vec<DegradationEvent>,
        stats: PipelineStats,
    ) -> RetrievalOutput {
        RetrievalOutput {
            contexts: Vec::new(),
            formatted_prompt: prompt::format_contexts(&[]),
            analysis,
            degradations,
            stats,
        }
    }
}

/// Apply the per-tier adaptive policy on top of the caller's config.
fn adapt_config(config: &PipelineConfig, complexity: Complexity) -> PipelineConfig {
    let mut effective = config.clone();
    match complexity {
        Complexity::Simple => {
            // Fast path: small depth, no optional stages.
            effective.top_k = effective.top_k.min(SIMPLE_TOP_K);
            effective.use_query_enhancement = false;
            effective.use_reranking = false;
            effective.use_mmr = false;
            effective.use_compression = false;
            effective.use_hyde = false;
            effective.use_multi_query = false;
        }
        Complexity::Medium => {}
        Complexity::Complex => {
            effective.use_hyde = true;
            effective.use_multi_query = true;
        }
    }
    effective
}

fn truncate_selection(ranked: Vec<RankedCandidate>, top_k: usize) -> Vec<SelectedCandidate> {
    ranked
        .into_iter()
        .take(top_k)
        .enumerate()
        .map(|(i, ranked)| SelectedCandidate {
            ranked,
            mmr_rank: i,
        })
        .collect()
}
