use proptest::prelude::*;

use quarry_compression::redundancy::filter_redundant;
use quarry_compression::{estimate_tokens, CompressionOptions, ContextCompressor};
use quarry_core::candidate::{
    dedup_key, Candidate, FusedCandidate, Metadata, RankedCandidate, SelectedCandidate, Source,
};

fn selected(id: usize, content: &str) -> SelectedCandidate {
    SelectedCandidate {
        ranked: RankedCandidate {
            fused: FusedCandidate {
                candidate: Candidate {
                    id: format!("doc-{id}"),
                    content: content.to_string(),
                    score: 0.5,
                    source: Source::Vector,
                    metadata: Metadata::default(),
                },
                fused_score: 0.02,
                dedup_key: dedup_key(content),
            },
            rerank_score: None,
        },
        mmr_rank: id,
    }
}

fn arb_contents() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[a-z]{2,8}( [a-z]{2,8}){0,40}", 1..8)
}

// ── Dedup idempotence: filtering its own output changes nothing ─────────

proptest! {
    #[test]
    fn redundancy_filter_is_idempotent(
        contents in arb_contents(),
        threshold in 0.1f64..0.95
    ) {
        let refs: Vec<&str> = contents.iter().map(String::as_str).collect();
        let kept = filter_redundant(&refs, threshold);
        let survivors: Vec<&str> = kept.iter().map(|&i| refs[i]).collect();
        let kept_again = filter_redundant(&survivors, threshold);
        prop_assert_eq!(kept_again, (0..survivors.len()).collect::<Vec<_>>());
    }

    #[test]
    fn kept_indices_are_sorted_and_start_with_first(contents in arb_contents()) {
        let refs: Vec<&str> = contents.iter().map(String::as_str).collect();
        let kept = filter_redundant(&refs, 0.8);
        prop_assert!(!kept.is_empty());
        prop_assert_eq!(kept[0], 0);
        prop_assert!(kept.windows(2).all(|w| w[0] < w[1]));
    }
}

// ── Budget invariant: output estimate ≤ budget, or input already fit ────

proptest! {
    #[test]
    fn compressed_output_fits_budget(
        contents in arb_contents(),
        budget in 1usize..2_000
    ) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();

        let candidates: Vec<SelectedCandidate> = contents
            .iter()
            .enumerate()
            .map(|(i, c)| selected(i, c))
            .collect();
        let input_total: usize = candidates
            .iter()
            .map(|c| estimate_tokens(c.content()))
            .sum();

        let opts = CompressionOptions {
            max_tokens: budget,
            remove_redundancy: false,
            redundancy_threshold: 0.8,
            use_llm: false,
        };
        let (out, _) = runtime
            .block_on(ContextCompressor::new().compress(&[], candidates, &opts));

        let output_total: usize = out.iter().map(|c| estimate_tokens(&c.content)).sum();
        if input_total <= budget {
            prop_assert_eq!(output_total, input_total);
            prop_assert!(out.iter().all(|c| !c.compressed));
        } else {
            prop_assert!(
                output_total <= budget,
                "output {} exceeds budget {}",
                output_total,
                budget
            );
        }
    }

    #[test]
    fn attribution_metadata_survives_compression(budget in 50usize..200) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();

        let long = vec!["tokens"; 400].join(" ");
        let mut candidate = selected(0, &long);
        candidate.ranked.fused.candidate.metadata.filename = Some("handbook.pdf".into());

        let opts = CompressionOptions {
            max_tokens: budget,
            remove_redundancy: true,
            redundancy_threshold: 0.8,
            use_llm: false,
        };
        let (out, _) = runtime
            .block_on(ContextCompressor::new().compress(&[], vec![candidate], &opts));

        prop_assert_eq!(out.len(), 1);
        prop_assert!(out[0].compressed);
        prop_assert_eq!(
            out[0].metadata().filename.as_deref(),
            Some("handbook.pdf")
        );
    }
}

// ── Budget invariant holds even when the allowance rounds to zero ───────

#[test]
fn tiny_budget_drops_contexts_rather_than_overflow() {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();

    let candidates: Vec<SelectedCandidate> = (0..5)
        .map(|i| {
            let content = vec![format!("word{i}"); 40].join(" ");
            selected(i, &content)
        })
        .collect();

    let opts = CompressionOptions {
        max_tokens: 5,
        remove_redundancy: false,
        redundancy_threshold: 0.8,
        use_llm: false,
    };
    let (out, degradations) = runtime
        .block_on(ContextCompressor::new().compress(&[], candidates, &opts));

    let total: usize = out.iter().map(|c| estimate_tokens(&c.content)).sum();
    assert!(total <= 5, "total {total} tokens exceeds budget 5");
    assert!(degradations
        .iter()
        .any(|d| d.stage == quarry_core::models::Stage::Compression));
}
