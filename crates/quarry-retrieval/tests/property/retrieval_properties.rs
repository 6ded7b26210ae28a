use std::time::Duration;

use proptest::prelude::*;

use quarry_core::candidate::{
    dedup_key, Candidate, FusedCandidate, Metadata, RankedCandidate, Source,
};
use quarry_core::config::SourceWeights;
use quarry_core::scope::TenantScope;
use quarry_retrieval::ranking;
use quarry_retrieval::search::{rrf, run_fanout, FanoutRequest};
use test_fixtures::{fixture, SeedDoc};

fn candidate(id: usize, score: f64, source: Source) -> Candidate {
    Candidate {
        id: format!("doc-{id}"),
        content: format!("distinct passage body for document number {id}"),
        score,
        source,
        metadata: Metadata::default(),
    }
}

fn source_for(list: usize) -> Source {
    match list % 3 {
        0 => Source::Vector,
        1 => Source::Fulltext,
        _ => Source::Graph,
    }
}

fn arb_lists() -> impl Strategy<Value = Vec<Vec<Candidate>>> {
    prop::collection::vec(
        prop::collection::vec((0usize..12, 0.0f64..1.0), 0..8),
        1..4,
    )
    .prop_map(|raw| {
        raw.into_iter()
            .enumerate()
            .map(|(i, list)| {
                list.into_iter()
                    .map(|(id, score)| candidate(id, score, source_for(i)))
                    .collect()
            })
            .collect()
    })
}

// ── Fusion: deterministic, sorted, deduplicated ─────────────────────────

proptest! {
    #[test]
    fn fusion_is_deterministic(lists in arb_lists()) {
        let weights = vec![1.0; lists.len()];
        let first = rrf::fuse(&lists, &weights, 60);
        let second = rrf::fuse(&lists, &weights, 60);

        prop_assert_eq!(first.len(), second.len());
        for (a, b) in first.iter().zip(&second) {
            prop_assert_eq!(&a.candidate.id, &b.candidate.id);
            prop_assert_eq!(a.fused_score, b.fused_score);
        }
    }

    #[test]
    fn fused_output_is_sorted_descending(lists in arb_lists()) {
        let weights = vec![1.0; lists.len()];
        let fused = rrf::fuse(&lists, &weights, 60);
        prop_assert!(fused
            .windows(2)
            .all(|w| w[0].fused_score >= w[1].fused_score));
    }

    #[test]
    fn fused_keys_are_unique(lists in arb_lists()) {
        let weights = vec![1.0; lists.len()];
        let fused = rrf::fuse(&lists, &weights, 60);
        let keys: std::collections::HashSet<&str> =
            fused.iter().map(|f| f.dedup_key.as_str()).collect();
        prop_assert_eq!(keys.len(), fused.len());
    }

    // Appearing in an additional list never lowers a document's fused score.
    #[test]
    fn extra_source_never_lowers_a_fused_score(lists in arb_lists()) {
        let target = candidate(0, 0.5, Source::Vector);
        let key = dedup_key(&target.content);

        let score_of = |fused: &[FusedCandidate]| {
            fused
                .iter()
                .find(|f| f.dedup_key == key)
                .map(|f| f.fused_score)
                .unwrap_or(0.0)
        };

        let weights = vec![1.0; lists.len()];
        let before = score_of(&rrf::fuse(&lists, &weights, 60));

        let mut extended = lists.clone();
        extended.push(vec![target]);
        let mut extended_weights = weights;
        extended_weights.push(1.0);
        let after = score_of(&rrf::fuse(&extended, &extended_weights, 60));

        prop_assert!(after >= before);
    }
}

// ── Fusion: rank monotonicity within a single weighted list ─────────────

proptest! {
    #[test]
    fn earlier_rank_contributes_at_least_as_much(
        ids in prop::collection::hash_set(0usize..50, 2..10),
        weight in 0.01f64..2.0,
    ) {
        let list: Vec<Candidate> = ids
            .iter()
            .map(|&id| candidate(id, 0.5, Source::Vector))
            .collect();

        let fused = rrf::fuse(&[list.clone()], &[weight], 60);

        // A single list of unique documents fuses back in rank order,
        // with non-increasing contributions.
        prop_assert_eq!(fused.len(), list.len());
        for (rank, f) in fused.iter().enumerate() {
            prop_assert_eq!(&f.candidate.id, &list[rank].id);
        }
        prop_assert!(fused
            .windows(2)
            .all(|w| w[0].fused_score >= w[1].fused_score));
    }
}

// ── Fan-out: tenant isolation over disjoint per-tenant seeds ────────────

proptest! {
    #[test]
    fn fanout_never_crosses_tenant_boundaries(
        a_docs in prop::collection::vec("[a-z]{4,12}( [a-z]{4,12}){3,8}", 1..5),
        b_docs in prop::collection::vec("[a-z]{4,12}( [a-z]{4,12}){3,8}", 1..5),
    ) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();

        let mut docs = Vec::new();
        for (i, content) in a_docs.iter().enumerate() {
            docs.push(SeedDoc::new(&format!("a{i}"), "tenant-a", "kb", content));
        }
        for (i, content) in b_docs.iter().enumerate() {
            docs.push(SeedDoc::new(&format!("b{i}"), "tenant-b", "kb", content));
        }
        let f = fixture(docs, Vec::new());

        let queries = vec![a_docs[0].clone()];
        let scope = TenantScope::new("tenant-a", "kb");
        let outcome = runtime.block_on(run_fanout(
            &f.ctx,
            FanoutRequest {
                queries: &queries,
                entities: &[],
                hyde_document: None,
                scope: &scope,
                fetch_k: 10,
                timeout: Duration::from_secs(1),
            },
            &SourceWeights::default(),
        ));

        for c in outcome.lists.iter().flatten() {
            prop_assert!(
                c.id.starts_with('a'),
                "candidate {} leaked across the tenant boundary",
                c.id
            );
        }
    }
}

// ── MMR: selection size and rank assignment ─────────────────────────────

fn ranked(id: usize) -> RankedCandidate {
    let content = format!("distinct passage body for document number {id}");
    RankedCandidate {
        fused: FusedCandidate {
            candidate: Candidate {
                id: format!("doc-{id}"),
                content: content.clone(),
                score: 0.5,
                source: Source::Vector,
                metadata: Metadata::default(),
            },
            fused_score: 0.02,
            dedup_key: dedup_key(&content),
        },
        rerank_score: None,
    }
}

fn arb_embedding() -> impl Strategy<Value = Vec<f32>> {
    prop::collection::vec(-1.0f32..1.0, 8)
}

proptest! {
    #[test]
    fn mmr_selects_exactly_min_of_n_and_top_k(
        embeddings in prop::collection::vec(arb_embedding(), 1..20),
        query in arb_embedding(),
        top_k in 1usize..10,
    ) {
        let candidates: Vec<RankedCandidate> =
            (0..embeddings.len()).map(ranked).collect();
        let expected = candidates.len().min(top_k);

        let out = ranking::select(&query, candidates, &embeddings, top_k, 0.7);

        prop_assert_eq!(out.len(), expected);
        for (i, selection) in out.iter().enumerate() {
            prop_assert_eq!(selection.mmr_rank, i);
        }
        // No candidate is selected twice.
        let ids: std::collections::HashSet<&str> = out
            .iter()
            .map(|s| s.ranked.fused.candidate.id.as_str())
            .collect();
        prop_assert_eq!(ids.len(), out.len());
    }
}
