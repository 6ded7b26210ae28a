//! Cross-encoder reranking over the fused top-N.
//!
//! Scores each (query, passage) pair with the pairwise scorer and
//! reorders by that score. On scorer absence or failure the stage is a
//! no-op: input order, capped to `top_k`.

use std::sync::Arc;

use tracing::{debug, warn};

use quarry_core::candidate::{FusedCandidate, RankedCandidate};
use quarry_core::constants::RERANK_PASSAGE_MAX_CHARS;
use quarry_core::models::{DegradationEvent, Stage};
use quarry_core::traits::PairwiseScorer;

pub struct RerankOutcome {
    pub candidates: Vec<RankedCandidate>,
    /// Set when the stage degraded to a no-op.
    pub degraded: Option<DegradationEvent>,
    /// How many pairs were actually scored.
    pub scored: usize,
}

/// Rerank `fused` down to `top_k`. Candidates below `score_threshold`
/// (when set) are dropped after scoring.
pub async fn rerank(
    scorer: Option<&Arc<dyn PairwiseScorer>>,
    query: &str,
    fused: Vec<FusedCandidate>,
    top_k: usize,
    score_threshold: Option<f64>,
) -> RerankOutcome {
    // Nothing to reorder; reranking is only worth a model call when the
    // fused set overflows the final budget.
    if fused.len() <= top_k {
        return RerankOutcome {
            candidates: fused.into_iter().map(RankedCandidate::from).collect(),
            degraded: None,
            scored: 0,
        };
    }

    let available = scorer.filter(|s| s.is_available());
    let Some(scorer) = available else {
        return passthrough(fused, top_k, "no pairwise scorer available");
    };

    let passages: Vec<String> = fused
        .iter()
        .map(|f| f.candidate.content.chars().take(RERANK_PASSAGE_MAX_CHARS).collect())
        .collect();

    let scores = match scorer.score_batch(query, &passages).await {
        Ok(scores) if scores.len() == fused.len() => scores,
        Ok(_) => return passthrough(fused, top_k, "scorer returned wrong batch size"),
        Err(e) => return passthrough(fused, top_k, e.to_string()),
    };

    let scored = scores.len();
    let mut ranked: Vec<(usize, RankedCandidate)> = fused
        .into_iter()
        .zip(scores)
        .enumerate()
        .map(|(i, (fused, score))| {
            (
                i,
                RankedCandidate {
                    fused,
                    rerank_score: Some(score),
                },
            )
        })
        .filter(|(_, r)| match score_threshold {
            Some(min) => r.rerank_score.unwrap_or(f64::MIN) >= min,
            None => true,
        })
        .collect();

    // Sort by rerank score descending, stable on prior fused order.
    ranked.sort_by(|a, b| {
        b.1.rerank_score
            .partial_cmp(&a.1.rerank_score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.0.cmp(&b.0))
    });
    ranked.truncate(top_k);

    debug!(scored, kept = ranked.len(), "rerank complete");
    RerankOutcome {
        candidates: ranked.into_iter().map(|(_, r)| r).collect(),
        degraded: None,
        scored,
    }
}

fn passthrough(fused: Vec<FusedCandidate>, top_k: usize, reason: impl Into<String>) -> RerankOutcome {
    let reason = reason.into();
    warn!(%reason, "rerank degraded to fused order");
    let mut candidates: Vec<RankedCandidate> =
        fused.into_iter().map(RankedCandidate::from).collect();
    candidates.truncate(top_k);
    RerankOutcome {
        candidates,
        degraded: Some(DegradationEvent::new(Stage::Rerank, reason)),
        scored: 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quarry_core::candidate::{dedup_key, Candidate, Metadata, Source};

    fn fused(id: &str, content: &str, fused_score: f64) -> FusedCandidate {
        FusedCandidate {
            candidate: Candidate {
                id: id.into(),
                content: content.into(),
                score: 0.1,
                source: Source::Vector,
                metadata: Metadata::default(),
            },
            fused_score,
            dedup_key: dedup_key(content),
        }
    }

    #[tokio::test]
    async fn small_input_passes_through_unscored() {
        let input = vec![fused("a", "alpha", 0.5), fused("b", "beta", 0.4)];
        let out = rerank(None, "query", input, 5, None).await;
        assert_eq!(out.candidates.len(), 2);
        assert_eq!(out.scored, 0);
        assert!(out.degraded.is_none());
        assert!(out.candidates.iter().all(|c| c.rerank_score.is_none()));
    }

    #[tokio::test]
    async fn missing_scorer_degrades_to_capped_fused_order() {
        let input = vec![
            fused("a", "alpha", 0.5),
            fused("b", "beta", 0.4),
            fused("c", "gamma", 0.3),
        ];
        let out = rerank(None, "query", input, 2, None).await;
        assert_eq!(out.candidates.len(), 2);
        assert_eq!(out.candidates[0].fused.candidate.id, "a");
        assert_eq!(out.candidates[1].fused.candidate.id, "b");
        assert!(out.degraded.is_some());
    }
}
