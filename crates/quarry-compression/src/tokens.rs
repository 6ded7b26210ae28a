//! Token estimation. The budget contract is defined over this estimate,
//! not over any model-specific tokenizer.
//!
//! The ratio is 1.3 tokens per word; computed as 13/10 in integer
//! arithmetic so estimates are exact and order-stable.

/// Estimate token count as `word_count × 1.3`, rounded up.
pub fn estimate_tokens(text: &str) -> usize {
    let words = text.split_whitespace().count();
    (words * 13).div_ceil(10)
}

/// Maximum whole words that fit a token allowance under the estimate.
pub fn words_for_tokens(tokens: usize) -> usize {
    tokens * 10 / 13
}
