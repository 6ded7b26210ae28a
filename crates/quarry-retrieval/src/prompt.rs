//! Deterministic, source-attributed prompt block formatting.

use quarry_core::candidate::CompressedContext;
use quarry_core::constants::EMPTY_CONTEXT_PROMPT;

/// Format contexts for direct inclusion in an LLM prompt. Each context is
/// preceded by a bracketed source label; the filename is appended when
/// attribution metadata carries one.
pub fn format_contexts(contexts: &[CompressedContext]) -> String {
    if contexts.is_empty() {
        return EMPTY_CONTEXT_PROMPT.to_string();
    }

    let mut out = String::new();
    for context in contexts {
        let label = match &context.metadata().filename {
            Some(filename) => format!("{} | {}", context.source().label(), filename),
            None => context.source().label().to_string(),
        };
        out.push_str("[source: ");
        out.push_str(&label);
        out.push_str("]\n");
        out.push_str(&context.content);
        out.push_str("\n\n");
    }
    out.trim_end().to_string()
}
