//! Budget enforcement: sentence extraction by query-keyword overlap,
//! with a hard word-level clamp so the per-candidate allowance holds.

use quarry_core::constants::TOKENS_PER_SENTENCE;

use crate::tokens::{estimate_tokens, words_for_tokens};

/// Split text into sentences on `.`, `!`, `?` boundaries.
/// Keeps the terminator with the sentence.
pub fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();

    for ch in text.chars() {
        current.push(ch);
        if matches!(ch, '.' | '!' | '?') {
            let trimmed = current.trim();
            if !trimmed.is_empty() {
                sentences.push(trimmed.to_string());
            }
            current.clear();
        }
    }
    let trimmed = current.trim();
    if !trimmed.is_empty() {
        sentences.push(trimmed.to_string());
    }

    sentences
}

/// Count of query keywords appearing in the sentence (case-insensitive).
fn keyword_overlap(sentence: &str, keywords: &[String]) -> usize {
    let lower = sentence.to_lowercase();
    keywords
        .iter()
        .filter(|k| lower.contains(&k.to_lowercase()))
        .count()
}

/// Extract the subset of sentences most relevant to the query, targeting
/// `allowance / TOKENS_PER_SENTENCE` sentences (at least 1, at most the
/// original count), preserving original sentence order. A final word-level
/// clamp guarantees the result fits the allowance.
pub fn extract_relevant(content: &str, keywords: &[String], allowance: usize) -> String {
    let sentences = split_sentences(content);
    if sentences.is_empty() {
        return truncate_to_tokens(content, allowance);
    }

    let target = (allowance / TOKENS_PER_SENTENCE).max(1).min(sentences.len());

    // Rank sentence indices by overlap descending, position ascending.
    let mut ranked: Vec<(usize, usize)> = sentences
        .iter()
        .enumerate()
        .map(|(i, s)| (i, keyword_overlap(s, keywords)))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

    let mut picked: Vec<usize> = ranked.into_iter().take(target).map(|(i, _)| i).collect();
    picked.sort_unstable();

    let extracted = picked
        .into_iter()
        .map(|i| sentences[i].as_str())
        .collect::<Vec<_>>()
        .join(" ");

    truncate_to_tokens(&extracted, allowance)
}

/// Clamp text to the allowance by whole words. No-op when already under;
/// empty when not even one word fits.
pub fn truncate_to_tokens(text: &str, allowance: usize) -> String {
    if estimate_tokens(text) <= allowance {
        return text.to_string();
    }
    let max_words = words_for_tokens(allowance);
    text.split_whitespace()
        .take(max_words)
        .collect::<Vec<_>>()
        .join(" ")
}
