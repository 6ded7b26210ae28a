//! Query analysis: intent, complexity, entities, keywords.
//!
//! Pure and deterministic over the query text; memoized through the
//! bounded `ProcessContext` cache keyed by the exact query string.
//! Never fails: keyword extraction falls back to stop-word filtering
//! over alphabetic tokens, and entity extraction is a lightweight
//! heuristic that may simply return nothing.

use quarry_core::analysis::{Complexity, Entity, EntityKind, Intent, QueryAnalysis};
use quarry_core::context::ProcessContext;

/// Common English stop words filtered out of keywords.
const STOP_WORDS: &[&str] = &[
    "the", "and", "are", "was", "were", "been", "have", "has", "had", "does", "did", "but", "for",
    "nor", "not", "you", "your", "our", "their", "them", "they", "this", "that", "these", "those",
    "with", "from", "into", "over", "under", "about", "what", "when", "where", "which", "who",
    "whom", "why", "how", "can", "could", "would", "should", "will", "shall", "may", "might",
    "must", "its", "his", "her", "him", "she", "out", "any", "all", "some", "there", "here",
    "than", "then", "too", "very", "just", "also", "more", "most", "such", "own", "same", "each",
];

/// Coordinating conjunctions used by the complexity classifier and
/// the sub-question decomposer.
const CONJUNCTIONS: &[&str] = &["and", "or", "but", "nor", "yet", "so"];

const QUESTION_STARTERS: &[&str] = &[
    "what", "who", "when", "where", "why", "how", "is", "are", "can", "do", "does", "should",
    "could", "would", "which",
];

/// Ordered lexical trigger table; the first matching category wins.
const INTENT_TRIGGERS: &[(Intent, &[&str])] = &[
    (
        Intent::Factual,
        &["what is", "what are", "when did", "when was", "where is", "who is", "how many", "how much"],
    ),
    (
        Intent::Procedural,
        &["how to", "how do i", "how can i", "steps to", "guide", "walk me through", "set up", "install"],
    ),
    (
        Intent::Comparative,
        &["compare", "comparison", "versus", " vs ", "difference between", "better than", "pros and cons"],
    ),
    (
        Intent::Troubleshooting,
        &["error", "not working", "doesn't work", "does not work", "failed", "failing", "fix", "broken", "issue", "problem", "crash"],
    ),
    (
        Intent::Definition,
        &["define", "definition of", "meaning of", "what does", "mean by", "stands for"],
    ),
    (
        Intent::Opinion,
        &["best", "worst", "should i", "recommend", "opinion", "worth it", "do you think"],
    ),
];

/// Analyze a raw query. Pure function; see module docs.
pub fn analyze(query: &str) -> QueryAnalysis {
    let lower = query.to_lowercase();
    let words: Vec<&str> = query.split_whitespace().collect();

    let intent = classify_intent(&lower);
    let complexity = classify_complexity(&lower, words.len());
    let keywords = extract_keywords(&lower);
    let entities = extract_entities(query, &words);
    let is_question = query.contains('?')
        || words
            .first()
            .is_some_and(|w| QUESTION_STARTERS.contains(&w.to_lowercase().as_str()));
    let requires_reasoning = complexity == Complexity::Complex
        || matches!(intent, Intent::Comparative | Intent::Troubleshooting);

    QueryAnalysis {
        intent,
        complexity,
        entities,
        keywords,
        is_question,
        requires_reasoning,
    }
}

/// Memoized analysis through the process-wide bounded cache.
pub fn analyze_cached(ctx: &ProcessContext, query: &str) -> QueryAnalysis {
    ctx.cached_analysis(query, analyze)
}

fn classify_intent(lower: &str) -> Intent {
    for (intent, triggers) in INTENT_TRIGGERS {
        if triggers.iter().any(|t| lower.contains(t)) {
            return *intent;
        }
    }
    Intent::General
}

fn classify_complexity(lower: &str, word_count: usize) -> Complexity {
    let question_marks = lower.matches('?').count();
    let has_conjunction = lower
        .split_whitespace()
        .any(|w| CONJUNCTIONS.contains(&w.trim_matches(|c: char| !c.is_alphanumeric())));

    if word_count > 20 || question_marks > 1 || (has_conjunction && word_count > 10) {
        Complexity::Complex
    } else if word_count > 8 || has_conjunction {
        Complexity::Medium
    } else {
        Complexity::Simple
    }
}

/// Stop-word-filtered alphabetic tokens longer than 2 characters,
/// first-seen order, capped.
fn extract_keywords(lower: &str) -> Vec<String> {
    let mut keywords: Vec<String> = Vec::new();
    for raw in lower.split_whitespace() {
        let token: String = raw.chars().filter(|c| c.is_alphabetic()).collect();
        if token.len() <= 2 || STOP_WORDS.contains(&token.as_str()) {
            continue;
        }
        if !keywords.contains(&token) {
            keywords.push(token);
        }
    }
    keywords.truncate(12);
    keywords
}

/// Heuristic entity extraction: quoted spans, all-caps acronyms, and runs
/// of capitalized tokens (a single capitalized token at the start of the
/// query is ignored as sentence case).
fn extract_entities(query: &str, words: &[&str]) -> Vec<Entity> {
    let mut entities: Vec<Entity> = Vec::new();

    // Quoted spans.
    let mut parts = query.split('"');
    parts.next();
    while let (Some(quoted), next) = (parts.next(), parts.next()) {
        let text = quoted.trim();
        if !text.is_empty() {
            push_unique(&mut entities, text.to_string(), EntityKind::Quoted);
        }
        if next.is_none() {
            break;
        }
    }

    // Acronyms and capitalized runs.
    let mut run: Vec<&str> = Vec::new();
    let mut run_start = 0usize;
    for (i, raw) in words.iter().enumerate() {
        let token = raw.trim_matches(|c: char| !c.is_alphanumeric());
        if token.len() >= 2 && token.chars().all(|c| c.is_ascii_uppercase()) {
            flush_run(&mut entities, &mut run, run_start);
            push_unique(&mut entities, token.to_string(), EntityKind::Acronym);
            continue;
        }
        let capitalized = token.chars().next().is_some_and(|c| c.is_uppercase()) && token.len() > 1;
        if capitalized {
            if run.is_empty() {
                run_start = i;
            }
            run.push(token);
        } else {
            flush_run(&mut entities, &mut run, run_start);
        }
    }
    flush_run(&mut entities, &mut run, run_start);

    entities
}

fn flush_run(entities: &mut Vec<Entity>, run: &mut Vec<&str>, run_start: usize) {
    if run.is_empty() {
        return;
    }
    // A lone sentence-case word at position 0 is not an entity.
    if !(run.len() == 1 && run_start == 0) {
        push_unique(entities, run.join(" "), EntityKind::Proper);
    }
    run.clear();
}

fn push_unique(entities: &mut Vec<Entity>, text: String, kind: EntityKind) {
    if !entities.iter().any(|e| e.text == text) {
        entities.push(Entity { text, kind });
    }
}

/// Split a query into sub-questions on question marks and coordinating
/// conjunctions. Used by the low-confidence decomposition path.
pub fn decompose(query: &str) -> Vec<String> {
    let mut parts: Vec<String> = Vec::new();

    for piece in query.split('?') {
        let piece = piece.trim();
        if piece.is_empty() {
            continue;
        }
        // Further split on conjunction tokens.
        let mut current: Vec<&str> = Vec::new();
        for word in piece.split_whitespace() {
            let bare = word.trim_matches(|c: char| !c.is_alphanumeric());
            if CONJUNCTIONS.contains(&bare.to_lowercase().as_str()) && current.len() >= 3 {
                parts.push(current.join(" "));
                current = Vec::new();
            } else {
                current.push(word);
            }
        }
        if current.len() >= 2 {
            parts.push(current.join(" "));
        } else if let (Some(last), false) = (parts.last_mut(), current.is_empty()) {
            last.push(' ');
            last.push_str(&current.join(" "));
        }
    }

    if parts.is_empty() {
        parts.push(query.trim().to_string());
    }
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_query_is_simple() {
        let analysis = analyze("Hi");
        assert_eq!(analysis.complexity, Complexity::Simple);
        assert_eq!(analysis.intent, Intent::General);
        assert!(!analysis.is_question);
    }

    #[test]
    fn long_query_is_complex() {
        // 24 words, safely past the > 20 threshold.
        let query = "please explain in detail the full history of the database \
                     migration process that we used across all regional deployments \
                     during the last fiscal year";
        assert_eq!(analyze(query).complexity, Complexity::Complex);
    }

    #[test]
    fn twenty_words_is_not_complex() {
        let query = "please explain in detail the full history of the database \
                     migration process we used across all regional deployments last year";
        assert_eq!(query.split_whitespace().count(), 20);
        assert_eq!(analyze(query).complexity, Complexity::Medium);
    }

    #[test]
    fn double_question_is_complex() {
        let analysis = analyze("What is RRF? How does it work?");
        assert_eq!(analysis.complexity, Complexity::Complex);
        assert!(analysis.is_question);
    }

    #[test]
    fn conjunction_with_eleven_words_is_complex() {
        let query = "explain the caching layer and describe the eviction policy rules used";
        assert_eq!(analyze(query).complexity, Complexity::Complex);
    }

    #[test]
    fn conjunction_with_few_words_is_medium() {
        assert_eq!(analyze("caching and eviction").complexity, Complexity::Medium);
    }

    #[test]
    fn nine_words_is_medium() {
        let query = "tell me more about the billing export file format";
        assert_eq!(analyze(query).complexity, Complexity::Medium);
    }

    #[test]
    fn intent_table_is_ordered_first_match_wins() {
        // "what is" (factual) appears before "definition" triggers.
        assert_eq!(analyze("what is the definition of churn").intent, Intent::Factual);
        assert_eq!(analyze("define churn").intent, Intent::Definition);
        assert_eq!(analyze("how to reset a password").intent, Intent::Procedural);
        assert_eq!(analyze("postgres versus mysql").intent, Intent::Comparative);
        assert_eq!(analyze("login page is broken").intent, Intent::Troubleshooting);
        assert_eq!(analyze("should i upgrade").intent, Intent::Opinion);
        assert_eq!(analyze("tell me about pricing").intent, Intent::General);
    }

    #[test]
    fn keywords_filter_stop_words_and_short_tokens() {
        let analysis = analyze("What is the best wine pairing for grilled salmon?");
        assert!(analysis.keywords.contains(&"wine".to_string()));
        assert!(analysis.keywords.contains(&"salmon".to_string()));
        assert!(!analysis.keywords.iter().any(|k| k == "the" || k == "is"));
        assert!(analysis.keywords.iter().all(|k| k.len() > 2));
    }

    #[test]
    fn entities_pick_up_proper_runs_and_acronyms() {
        let analysis = analyze("How does Mont Blanc relate to the GDPR export?");
        let texts: Vec<&str> = analysis.entities.iter().map(|e| e.text.as_str()).collect();
        assert!(texts.contains(&"Mont Blanc"));
        assert!(texts.contains(&"GDPR"));
    }

    #[test]
    fn leading_sentence_case_word_is_not_an_entity() {
        let analysis = analyze("Explain the billing rules");
        assert!(analysis.entities.is_empty());
    }

    #[test]
    fn quoted_span_is_an_entity() {
        let analysis = analyze("find mentions of \"terroir effect\" in the notes");
        assert!(analysis
            .entities
            .iter()
            .any(|e| e.text == "terroir effect" && e.kind == EntityKind::Quoted));
    }

    #[test]
    fn analysis_is_deterministic() {
        let q = "compare oak versus steel fermentation for chardonnay";
        assert_eq!(analyze(q), analyze(q));
    }

    #[test]
    fn decompose_splits_on_conjunctions_and_question_marks() {
        let parts = decompose("how do we store embeddings and how do we rank results?");
        assert_eq!(parts.len(), 2);
        assert!(parts[0].contains("store embeddings"));
        assert!(parts[1].contains("rank results"));
    }

    #[test]
    fn decompose_returns_whole_query_when_atomic() {
        assert_eq!(decompose("pricing tiers"), vec!["pricing tiers".to_string()]);
    }
}
