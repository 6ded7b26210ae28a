//! Query analysis types. Derived deterministically from query text and
//! cacheable keyed by the exact query string.

use serde::{Deserialize, Serialize};

/// What the query is asking for, from an ordered lexical trigger table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Factual,
    Procedural,
    Comparative,
    Troubleshooting,
    Definition,
    Opinion,
    General,
}

/// Query complexity tier driving the adaptive pipeline policy.
/// Exhaustively matched in the orchestrator, so adding a tier is a
/// compile-time-checked change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Complexity {
    Simple,
    Medium,
    Complex,
}

/// How an entity was recognized in the query text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// Run of capitalized tokens.
    Proper,
    /// Quoted span.
    Quoted,
    /// All-caps acronym.
    Acronym,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub text: String,
    pub kind: EntityKind,
}

/// Deterministic analysis of a raw query string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryAnalysis {
    pub intent: Intent,
    pub complexity: Complexity,
    pub entities: Vec<Entity>,
    pub keywords: Vec<String>,
    pub is_question: bool,
    pub requires_reasoning: bool,
}

impl QueryAnalysis {
    /// Entity texts, falling back to the first keyword tokens when no
    /// entities were recognized. Used by the graph retriever.
    pub fn entity_names(&self, keyword_limit: usize) -> Vec<String> {
        if !self.entities.is_empty() {
            return self.entities.iter().map(|e| e.text.clone()).collect();
        }
        self.keywords.iter().take(keyword_limit).cloned().collect()
    }
}
