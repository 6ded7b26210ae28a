//! Maximal Marginal Relevance selection.
//!
//! Greedy: at each step pick the candidate maximizing
//! `λ·sim(candidate, query) − (1−λ)·max_selected sim(candidate, s)`,
//! with cosine similarity over L2-normalized embeddings so every
//! similarity stays in [-1, 1]. Ties break toward the earlier
//! fused/rerank position.

use tracing::debug;

use quarry_core::candidate::{RankedCandidate, SelectedCandidate};

/// L2-normalize a vector. Zero vectors are returned unchanged.
pub fn l2_normalize(v: &[f32]) -> Vec<f32> {
    let norm = v.iter().map(|x| (*x as f64) * (*x as f64)).sum::<f64>().sqrt();
    if norm <= f64::EPSILON {
        return v.to_vec();
    }
    v.iter().map(|x| (*x as f64 / norm) as f32).collect()
}

fn dot(a: &[f32], b: &[f32]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| *x as f64 * *y as f64)
        .sum()
}

/// Select a diverse `top_k` from `candidates`. `embeddings[i]` is the
/// embedding of `candidates[i]`; both are normalized here. No-op (input
/// truncated, ranks assigned by position) when the input already fits.
pub fn select(
    query_embedding: &[f32],
    candidates: Vec<RankedCandidate>,
    embeddings: &[Vec<f32>],
    top_k: usize,
    lambda: f64,
) -> Vec<SelectedCandidate> {
    if candidates.len() <= top_k {
        return candidates
            .into_iter()
            .enumerate()
            .map(|(i, ranked)| SelectedCandidate {
                ranked,
                mmr_rank: i,
            })
            .collect();
    }
    debug_assert_eq!(candidates.len(), embeddings.len());

    let query = l2_normalize(query_embedding);
    let normalized: Vec<Vec<f32>> = embeddings.iter().map(|e| l2_normalize(e)).collect();
    let relevance: Vec<f64> = normalized.iter().map(|e| dot(&query, e)).collect();

    let mut selected: Vec<usize> = Vec::with_capacity(top_k);
    let mut remaining: Vec<usize> = (0..candidates.len()).collect();

    while selected.len() < top_k && !remaining.is_empty() {
        let mut best: Option<(usize, f64)> = None;

        for (slot, &i) in remaining.iter().enumerate() {
            let diversity = if selected.is_empty() {
                0.0
            } else {
                selected
                    .iter()
                    .map(|&s| dot(&normalized[i], &normalized[s]))
                    .fold(f64::MIN, f64::max)
            };
            let score = lambda * relevance[i] - (1.0 - lambda) * diversity;

            let better = match best {
                None => true,
                // Strict > keeps the earlier input position on ties.
                Some((_, best_score)) => score > best_score,
            };
            if better {
                best = Some((slot, score));
            }
        }

        let (slot, _) = best.expect("remaining is non-empty");
        selected.push(remaining.remove(slot));
    }

    debug!(selected = selected.len(), lambda, "mmr selection complete");

    let mut picked: Vec<Option<RankedCandidate>> = candidates.into_iter().map(Some).collect();
    selected
        .into_iter()
        .enumerate()
        .map(|(rank, i)| SelectedCandidate {
            ranked: picked[i].take().expect("each index selected once"),
            mmr_rank: rank,
        })
        .collect()
}
