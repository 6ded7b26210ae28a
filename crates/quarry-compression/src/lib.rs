//! # quarry-compression
//!
//! Shrinks a selected candidate set to a token budget while preserving
//! source attribution. Two sub-stages: near-duplicate removal
//! (character-trigram Jaccard) and budget enforcement (sentence
//! extraction, optionally LLM paraphrase with extraction fallback).

pub mod budget;
pub mod redundancy;
pub mod tokens;

use std::sync::Arc;

use tracing::{debug, warn};

use quarry_core::candidate::{CompressedContext, SelectedCandidate};
use quarry_core::models::{DegradationEvent, Stage};
use quarry_core::traits::LanguageModel;

pub use tokens::estimate_tokens;

/// Options for one compression pass. Thresholds come from
/// `PipelineConfig`, not literals.
#[derive(Debug, Clone)]
pub struct CompressionOptions {
    pub max_tokens: usize,
    pub remove_redundancy: bool,
    pub redundancy_threshold: f64,
    pub use_llm: bool,
}

/// The compression engine. Pure except for the optional LLM paraphrase
/// path, which degrades to sentence extraction on any failure.
pub struct ContextCompressor {
    llm: Option<Arc<dyn LanguageModel>>,
}

impl ContextCompressor {
    pub fn new() -> Self {
        Self { llm: None }
    }

    pub fn with_llm(mut self, llm: Arc<dyn LanguageModel>) -> Self {
        self.llm = Some(llm);
        self
    }

    /// Compress `candidates` to fit `opts.max_tokens`.
    ///
    /// Returns the compressed contexts plus any degradation events
    /// (currently only LLM-path fallbacks). Attribution metadata is
    /// carried through unchanged even when content is shortened.
    pub async fn compress(
        &self,
        query_keywords: &[String],
        candidates: Vec<SelectedCandidate>,
        opts: &CompressionOptions,
    ) -> (Vec<CompressedContext>, Vec<DegradationEvent>) {
        let mut degradations = Vec::new();

        // Stage (a): near-duplicate removal, first occurrence wins.
        let kept: Vec<SelectedCandidate> = if opts.remove_redundancy {
            let keep = {
                let contents: Vec<&str> = candidates.iter().map(|c| c.content()).collect();
                redundancy::filter_redundant(&contents, opts.redundancy_threshold)
            };
            let mut keep_iter = keep.iter().copied().peekable();
            candidates
                .into_iter()
                .enumerate()
                .filter_map(|(i, c)| {
                    if keep_iter.peek() == Some(&i) {
                        keep_iter.next();
                        Some(c)
                    } else {
                        None
                    }
                })
                .collect()
        } else {
            candidates
        };

        if kept.is_empty() {
            return (Vec::new(), degradations);
        }

        // Stage (b): budget enforcement.
        let total: usize = kept.iter().map(|c| estimate_tokens(c.content())).sum();
        if total <= opts.max_tokens {
            debug!(total, budget = opts.max_tokens, "context under budget");
            let out = kept.into_iter().map(CompressedContext::unchanged).collect();
            return (out, degradations);
        }

        debug!(
            total,
            budget = opts.max_tokens,
            contexts = kept.len(),
            "over budget, compressing"
        );

        // Allowances are computed against the remaining budget, so a
        // context that comes in under its share donates the slack to the
        // ones after it. The running subtraction keeps the summed
        // estimate within the budget for any input.
        let mut out = Vec::with_capacity(kept.len());
        let mut remaining = opts.max_tokens;
        let mut left = kept.len();
        let mut dropped = 0usize;
        for candidate in kept {
            let allowance = remaining / left;
            left -= 1;
            if allowance == 0 {
                dropped += 1;
                continue;
            }

            let original = candidate.content().to_string();
            let original_tokens = estimate_tokens(&original);
            if original_tokens <= allowance {
                remaining -= original_tokens;
                out.push(CompressedContext::unchanged(candidate));
                continue;
            }

            let content = if opts.use_llm {
                match self
                    .llm_compress(query_keywords, &original, allowance)
                    .await
                {
                    Ok(text) => text,
                    Err(reason) => {
                        warn!(%reason, "llm compression failed, extracting sentences");
                        degradations.push(DegradationEvent::new(Stage::Compression, reason));
                        budget::extract_relevant(&original, query_keywords, allowance)
                    }
                }
            } else {
                budget::extract_relevant(&original, query_keywords, allowance)
            };

            if content.is_empty() {
                dropped += 1;
                continue;
            }
            remaining -= estimate_tokens(&content);
            out.push(CompressedContext {
                selected: candidate,
                content,
                compressed: true,
            });
        }

        if dropped > 0 {
            warn!(dropped, budget = opts.max_tokens, "token budget exhausted");
            degradations.push(DegradationEvent::new(
                Stage::Compression,
                format!("token budget exhausted, dropped {dropped} contexts"),
            ));
        }

        (out, degradations)
    }

    /// Ask the LLM for a paraphrase within the allowance. Any failure,
    /// empty output, or over-allowance output is an error so the caller
    /// falls back to extraction.
    async fn llm_compress(
        &self,
        query_keywords: &[String],
        content: &str,
        allowance: usize,
    ) -> Result<String, String> {
        let llm = self.llm.as_ref().ok_or("no language model configured")?;
        let prompt = format!(
            "Compress the following passage to at most {allowance} tokens, \
             keeping only information relevant to: {}.\n\n{content}",
            query_keywords.join(", ")
        );
        let text = llm
            .complete(&prompt, None, 0.0, allowance)
            .await
            .map_err(|e| e.to_string())?;
        let text = text.trim().to_string();
        if text.is_empty() {
            return Err("llm returned empty compression".into());
        }
        if estimate_tokens(&text) > allowance {
            return Err("llm compression exceeded allowance".into());
        }
        Ok(text)
    }
}

impl Default for ContextCompressor {
    fn default() -> Self {
        Self::new()
    }
}
