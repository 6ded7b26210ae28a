//! Weighted Reciprocal Rank Fusion: score = Σ weight / (k + rank).
//!
//! The cross-source normalization layer. Source-local scores are never
//! compared directly outside this module; only the fused score is
//! comparable across sources. Deduplication is keyed by the content
//! prefix, with the highest source-local score as the representative.

use std::collections::HashMap;

use quarry_core::candidate::{Candidate, FusedCandidate};

struct Accum {
    representative: Candidate,
    best_source_score: f64,
    fused_score: f64,
    first_seen: usize,
}

/// Fuse N ranked lists into one ranking. `weights[i]` applies to
/// `lists[i]`; `k` is the RRF smoothing constant. Ranks are 1-based
/// positions within each list. Ties break stably by first-seen order,
/// so fusion is deterministic for fixed input.
pub fn fuse(lists: &[Vec<Candidate>], weights: &[f64], k: u32) -> Vec<FusedCandidate> {
    debug_assert_eq!(lists.len(), weights.len());

    let mut index: HashMap<String, usize> = HashMap::new();
    let mut accums: Vec<Accum> = Vec::new();
    let mut seen = 0usize;

    for (list, &weight) in lists.iter().zip(weights) {
        for (pos, candidate) in list.iter().enumerate() {
            let rank = pos + 1;
            let contribution = weight / (k as f64 + rank as f64);
            let key = candidate.dedup_key();

            match index.get(&key) {
                Some(&i) => {
                    let accum = &mut accums[i];
                    accum.fused_score += contribution;
                    if candidate.score > accum.best_source_score {
                        accum.best_source_score = candidate.score;
                        accum.representative = candidate.clone();
                    }
                }
                None => {
                    index.insert(key, accums.len());
                    accums.push(Accum {
                        representative: candidate.clone(),
                        best_source_score: candidate.score,
                        fused_score: contribution,
                        first_seen: seen,
                    });
                    seen += 1;
                }
            }
        }
    }

    accums.sort_by(|a, b| {
        b.fused_score
            .partial_cmp(&a.fused_score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.first_seen.cmp(&b.first_seen))
    });

    accums
        .into_iter()
        .map(|a| {
            let dedup_key = a.representative.dedup_key();
            FusedCandidate {
                candidate: a.representative,
                fused_score: a.fused_score,
                dedup_key,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use quarry_core::candidate::{Metadata, Source};

    fn candidate(id: &str, content: &str, score: f64, source: Source) -> Candidate {
        Candidate {
            id: id.into(),
            content: content.into(),
            score,
            source,
            metadata: Metadata::default(),
        }
    }

    #[test]
    fn worked_example_matches_hand_computation() {
        // Doc X at rank 1 in source A and rank 2 in source B, weights 1.0:
        // 1/(60+1) + 1/(60+2) = 0.032522...
        let a = vec![
            candidate("x", "doc x content", 0.9, Source::Vector),
            candidate("y", "doc y content", 0.8, Source::Vector),
        ];
        let b = vec![
            candidate("z", "doc z content", 11.0, Source::Fulltext),
            candidate("x", "doc x content", 9.0, Source::Fulltext),
        ];

        let fused = fuse(&[a, b], &[1.0, 1.0], 60);
        let x = fused
            .iter()
            .find(|f| f.candidate.id == "x")
            .expect("doc x fused");
        assert!((x.fused_score - 0.032522).abs() < 1e-5);
    }

    #[test]
    fn representative_keeps_highest_source_local_score() {
        let a = vec![candidate("v1", "same passage text", 0.4, Source::Vector)];
        let b = vec![candidate("f1", "same passage text", 7.5, Source::Fulltext)];

        let fused = fuse(&[a, b], &[1.0, 1.0], 60);
        assert_eq!(fused.len(), 1);
        assert_eq!(fused[0].candidate.id, "f1");
        assert_eq!(fused[0].candidate.source, Source::Fulltext);
    }

    #[test]
    fn zero_weight_list_contributes_nothing() {
        let a = vec![candidate("a", "alpha content", 0.9, Source::Vector)];
        let b = vec![candidate("b", "beta content", 5.0, Source::Fulltext)];

        let fused = fuse(&[a, b], &[1.0, 0.0], 60);
        let beta = fused.iter().find(|f| f.candidate.id == "b").unwrap();
        assert_eq!(beta.fused_score, 0.0);
        assert_eq!(fused[0].candidate.id, "a");
    }

    #[test]
    fn ties_break_by_first_seen_order() {
        // Two distinct docs at the same rank in different equally-weighted
        // lists have identical fused scores.
        let a = vec![candidate("first", "alpha content", 0.9, Source::Vector)];
        let b = vec![candidate("second", "beta content", 4.0, Source::Fulltext)];

        let fused = fuse(&[a, b], &[1.0, 1.0], 60);
        assert_eq!(fused[0].candidate.id, "first");
        assert_eq!(fused[1].candidate.id, "second");
    }

    #[test]
    fn empty_input_fuses_to_empty() {
        assert!(fuse(&[], &[], 60).is_empty());
        assert!(fuse(&[Vec::new()], &[1.0], 60).is_empty());
    }
}
