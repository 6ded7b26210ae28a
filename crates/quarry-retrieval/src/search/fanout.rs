//! Parallel retrieval fan-out with isolated failure domains.
//!
//! One task per (source × query variant), plus one graph task and an
//! optional HyDE task. Each task is timeout-bounded; an error or timeout
//! degrades that slot to an empty list and never aborts siblings. Slot
//! ordering is fixed so fusion input is deterministic.

use std::time::Duration;

use tokio::task::JoinSet;
use tokio::time::timeout;
use tracing::{debug, warn};

use quarry_core::candidate::{Candidate, Source};
use quarry_core::config::SourceWeights;
use quarry_core::context::ProcessContext;
use quarry_core::errors::{QuarryError, SearchError};
use quarry_core::models::{DegradationEvent, Stage};
use quarry_core::scope::TenantScope;

use super::{FulltextRetriever, GraphRetriever, VectorRetriever};

/// Inputs for one fan-out round.
pub struct FanoutRequest<'a> {
    /// Query variants; the first entry is the primary search query.
    pub queries: &'a [String],
    /// Entity names for the graph retriever.
    pub entities: &'a [String],
    /// Hypothetical document for the optional HyDE vector call.
    pub hyde_document: Option<&'a str>,
    pub scope: &'a TenantScope,
    pub fetch_k: usize,
    pub timeout: Duration,
}

/// Per-source fused-ready lists plus matching weights.
pub struct FanoutOutcome {
    pub lists: Vec<Vec<Candidate>>,
    pub weights: Vec<f64>,
    /// Total candidates across lists after within-source dedup.
    pub fetched: usize,
    pub degradations: Vec<DegradationEvent>,
}

fn stage_for(source: Source) -> Stage {
    match source {
        Source::Vector => Stage::VectorSearch,
        Source::Fulltext => Stage::FulltextSearch,
        Source::Graph => Stage::GraphSearch,
        Source::Hyde => Stage::HydeSearch,
    }
}

/// Run the full fan-out and regroup results per source, concatenating
/// variant results in variant order and removing within-source
/// duplicates before fusion.
pub async fn run_fanout(
    ctx: &ProcessContext,
    req: FanoutRequest<'_>,
    weights: &SourceWeights,
) -> FanoutOutcome {
    let n = req.queries.len();
    let graph_slot = 2 * n;
    let hyde_slot = graph_slot + 1;
    let slot_count = hyde_slot + 1;

    let mut set: JoinSet<(usize, Source, Result<Vec<Candidate>, QuarryError>)> = JoinSet::new();

    for (i, query) in req.queries.iter().enumerate() {
        let retriever = VectorRetriever::new(ctx.embedder.clone(), ctx.vector.clone());
        let query = query.clone();
        let scope = req.scope.clone();
        let (k, dur) = (req.fetch_k, req.timeout);
        set.spawn(async move {
            let result = bounded(dur, Source::Vector, async move {
                retriever.retrieve(&query, Source::Vector, &scope, k).await
            })
            .await;
            (i, Source::Vector, result)
        });

        let retriever = FulltextRetriever::new(ctx.fulltext.clone());
        let query = req.queries[i].clone();
        let scope = req.scope.clone();
        set.spawn(async move {
            let result = bounded(dur, Source::Fulltext, async move {
                retriever.retrieve(&query, &scope, k).await
            })
            .await;
            (n + i, Source::Fulltext, result)
        });
    }

    {
        let retriever = GraphRetriever::new(ctx.graph.clone());
        let entities = req.entities.to_vec();
        let scope = req.scope.clone();
        let (k, dur) = (req.fetch_k, req.timeout);
        set.spawn(async move {
            let result = bounded(dur, Source::Graph, async move {
                retriever.retrieve(&entities, &scope, k).await
            })
            .await;
            (graph_slot, Source::Graph, result)
        });
    }

    if let Some(document) = req.hyde_document {
        let retriever = VectorRetriever::new(ctx.embedder.clone(), ctx.vector.clone());
        let document = document.to_string();
        let scope = req.scope.clone();
        let (k, dur) = (req.fetch_k, req.timeout);
        set.spawn(async move {
            let result = bounded(dur, Source::Hyde, async move {
                retriever.retrieve(&document, Source::Hyde, &scope, k).await
            })
            .await;
            (hyde_slot, Source::Hyde, result)
        });
    }

    let mut slots: Vec<Vec<Candidate>> = vec![Vec::new(); slot_count];
    let mut degradations = Vec::new();

    while let Some(joined) = set.join_next().await {
        match joined {
            Ok((slot, _, Ok(candidates))) => slots[slot] = candidates,
            Ok((slot, source, Err(e))) => {
                warn!(source = source.label(), slot, error = %e, "retriever degraded to empty");
                degradations.push(DegradationEvent::new(stage_for(source), e.to_string()));
            }
            Err(join_error) => {
                warn!(error = %join_error, "retrieval task failed to join");
                degradations.push(DegradationEvent::new(
                    Stage::Pipeline,
                    format!("retrieval task panicked: {join_error}"),
                ));
            }
        }
    }

    // Regroup: variant results concatenate in variant order per source.
    let vector: Vec<Candidate> = slots[..n].iter().flatten().cloned().collect();
    let fulltext: Vec<Candidate> = slots[n..2 * n].iter().flatten().cloned().collect();
    let graph = std::mem::take(&mut slots[graph_slot]);
    let hyde = std::mem::take(&mut slots[hyde_slot]);

    let mut lists = vec![
        dedup_within_source(vector),
        dedup_within_source(fulltext),
        dedup_within_source(graph),
    ];
    let mut list_weights = vec![weights.vector, weights.fulltext, weights.graph];
    if req.hyde_document.is_some() {
        lists.push(dedup_within_source(hyde));
        list_weights.push(weights.hyde);
    }

    let fetched = lists.iter().map(Vec::len).sum();
    debug!(
        fetched,
        variants = n,
        hyde = req.hyde_document.is_some(),
        "fan-out complete"
    );

    FanoutOutcome {
        lists,
        weights: list_weights,
        fetched,
        degradations,
    }
}

async fn bounded<F>(
    dur: Duration,
    source: Source,
    fut: F,
) -> Result<Vec<Candidate>, QuarryError>
where
    F: std::future::Future<Output = Result<Vec<Candidate>, QuarryError>>,
{
    match timeout(dur, fut).await {
        Ok(result) => result,
        Err(_) => Err(SearchError::Timeout {
            retriever: source.label(),
        }
        .into()),
    }
}

/// Remove within-source duplicates by id, then by content-prefix key,
/// keeping the first (highest-ranked variant) occurrence.
pub fn dedup_within_source(candidates: Vec<Candidate>) -> Vec<Candidate> {
    let mut seen_ids = std::collections::HashSet::new();
    let mut seen_keys = std::collections::HashSet::new();
    candidates
        .into_iter()
        .filter(|c| seen_ids.insert(c.id.clone()) && seen_keys.insert(c.dedup_key()))
        .collect()
}
