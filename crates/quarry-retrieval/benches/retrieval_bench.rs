use criterion::{criterion_group, criterion_main, Criterion};

use quarry_core::candidate::{
    dedup_key, Candidate, FusedCandidate, Metadata, RankedCandidate, Source,
};
use quarry_retrieval::ranking;
use quarry_retrieval::search::rrf;

fn candidate(id: usize, score: f64, source: Source) -> Candidate {
    Candidate {
        id: format!("doc-{id}"),
        content: format!("passage body for benchmark document number {id}"),
        score,
        source,
        metadata: Metadata::default(),
    }
}

/// Three overlapping ranked lists of 100 candidates each, drawn from a
/// 150-document pool so roughly half the documents appear in more than
/// one source.
fn build_lists() -> Vec<Vec<Candidate>> {
    let sources = [Source::Vector, Source::Fulltext, Source::Graph];
    sources
        .iter()
        .enumerate()
        .map(|(s, &source)| {
            (0..100)
                .map(|i| candidate((i * 7 + s * 13) % 150, 1.0 / (i + 1) as f64, source))
                .collect()
        })
        .collect()
}

fn bench_rrf_fusion(c: &mut Criterion) {
    let lists = build_lists();
    let weights = vec![1.0, 0.8, 0.5];

    c.bench_function("rrf_fuse_3x100", |b| {
        b.iter(|| {
            rrf::fuse(&lists, &weights, 60);
        });
    });
}

/// Deterministic pseudo-random 16-dim embeddings via an LCG.
fn embedding(seed: usize) -> Vec<f32> {
    let mut state = (seed as u64)
        .wrapping_mul(6_364_136_223_846_793_005)
        .wrapping_add(1_442_695_040_888_963_407);
    (0..16)
        .map(|_| {
            state = state.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1);
            ((state >> 33) as f32 / u32::MAX as f32) * 2.0 - 1.0
        })
        .collect()
}

fn bench_mmr_selection(c: &mut Criterion) {
    let candidates: Vec<RankedCandidate> = (0..100)
        .map(|i| {
            let content = format!("passage body for benchmark document number {i}");
            RankedCandidate {
                fused: FusedCandidate {
                    candidate: candidate(i, 0.5, Source::Vector),
                    fused_score: 1.0 / (i + 1) as f64,
                    dedup_key: dedup_key(&content),
                },
                rerank_score: None,
            }
        })
        .collect();
    let embeddings: Vec<Vec<f32>> = (0..100).map(embedding).collect();
    let query = embedding(10_007);

    c.bench_function("mmr_select_100_to_10", |b| {
        b.iter(|| {
            ranking::select(&query, candidates.clone(), &embeddings, 10, 0.7);
        });
    });
}

criterion_group!(benches, bench_rrf_fusion, bench_mmr_selection);
criterion_main!(benches);
