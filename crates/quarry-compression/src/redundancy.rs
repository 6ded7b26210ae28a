//! Pairwise near-duplicate detection using character trigram Jaccard
//! overlap over lower-cased content.

use std::collections::HashSet;

/// Character trigrams of the lower-cased input.
fn trigrams(text: &str) -> HashSet<[char; 3]> {
    let chars: Vec<char> = text.to_lowercase().chars().collect();
    chars.windows(3).map(|w| [w[0], w[1], w[2]]).collect()
}

/// Jaccard overlap between two trigram sets. Two empty sets count as
/// identical (overlap 1.0) so empty duplicates still collapse.
fn jaccard(a: &HashSet<[char; 3]>, b: &HashSet<[char; 3]>) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    let intersection = a.intersection(b).count();
    let union = a.len() + b.len() - intersection;
    if union == 0 {
        return 1.0;
    }
    intersection as f64 / union as f64
}

/// Trigram-Jaccard similarity of two content strings.
pub fn similarity(a: &str, b: &str) -> f64 {
    jaccard(&trigrams(a), &trigrams(b))
}

/// Indices of contents to keep, in input order. A content whose overlap
/// with any already-kept content exceeds `threshold` is dropped; the
/// first occurrence always wins.
pub fn filter_redundant(contents: &[&str], threshold: f64) -> Vec<usize> {
    let mut kept: Vec<(usize, HashSet<[char; 3]>)> = Vec::new();

    for (i, content) in contents.iter().enumerate() {
        let grams = trigrams(content);
        let redundant = kept.iter().any(|(_, k)| jaccard(&grams, k) > threshold);
        if !redundant {
            kept.push((i, grams));
        }
    }

    kept.into_iter().map(|(i, _)| i).collect()
}
