//! Candidate data model across pipeline stages.
//!
//! Each stage wraps the previous stage's type rather than mutating it:
//! Candidate → FusedCandidate → RankedCandidate → SelectedCandidate →
//! CompressedContext. Source-local scores are never comparable across
//! sources; only `fused_score` and `rerank_score` are.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::constants::DEDUP_KEY_LEN;

/// Which retrieval path produced a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    Vector,
    Fulltext,
    Graph,
    Hyde,
}

impl Source {
    /// Human-readable label used in prompt attribution and logs.
    pub fn label(&self) -> &'static str {
        match self {
            Source::Vector => "vector",
            Source::Fulltext => "fulltext",
            Source::Graph => "graph",
            Source::Hyde => "hyde",
        }
    }
}

/// Typed attribution metadata, with a small open map for
/// provider-specific payload fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk_index: Option<u32>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, String>,
}

/// A raw passage returned by one source retriever.
/// Immutable once produced; `score` is source-local.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: String,
    pub content: String,
    pub score: f64,
    pub source: Source,
    #[serde(default)]
    pub metadata: Metadata,
}

impl Candidate {
    /// Content-prefix dedup key: first `DEDUP_KEY_LEN` characters,
    /// case-folded, whitespace-collapsed.
    pub fn dedup_key(&self) -> String {
        dedup_key(&self.content)
    }
}

/// Compute the dedup key for an arbitrary content string.
pub fn dedup_key(content: &str) -> String {
    content
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
        .chars()
        .take(DEDUP_KEY_LEN)
        .collect()
}

/// A candidate after RRF fusion. `fused_score` is comparable across sources.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FusedCandidate {
    pub candidate: Candidate,
    pub fused_score: f64,
    pub dedup_key: String,
}

/// A fused candidate after pairwise reranking. `rerank_score` is `None`
/// when the candidate never went through the reranker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedCandidate {
    pub fused: FusedCandidate,
    pub rerank_score: Option<f64>,
}

impl RankedCandidate {
    /// Single place encoding score precedence:
    /// rerank score, else fused score, else the source-local score.
    pub fn effective_score(&self) -> f64 {
        if let Some(score) = self.rerank_score {
            return score;
        }
        if self.fused.fused_score > 0.0 {
            return self.fused.fused_score;
        }
        self.fused.candidate.score
    }

    pub fn content(&self) -> &str {
        &self.fused.candidate.content
    }
}

impl From<FusedCandidate> for RankedCandidate {
    fn from(fused: FusedCandidate) -> Self {
        Self {
            fused,
            rerank_score: None,
        }
    }
}

/// A candidate picked by the diversity selector. Order is final unless
/// compression later shortens content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectedCandidate {
    pub ranked: RankedCandidate,
    /// 0-based position in the final MMR selection order.
    pub mmr_rank: usize,
}

impl SelectedCandidate {
    pub fn content(&self) -> &str {
        self.ranked.content()
    }

    pub fn metadata(&self) -> &Metadata {
        &self.ranked.fused.candidate.metadata
    }

    pub fn source(&self) -> Source {
        self.ranked.fused.candidate.source
    }
}

/// Final pipeline output unit. `content` may be shorter than the original
/// passage; attribution metadata always survives unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompressedContext {
    pub selected: SelectedCandidate,
    pub content: String,
    pub compressed: bool,
}

impl CompressedContext {
    /// Wrap a selection without altering its content.
    pub fn unchanged(selected: SelectedCandidate) -> Self {
        let content = selected.content().to_string();
        Self {
            selected,
            content,
            compressed: false,
        }
    }

    pub fn metadata(&self) -> &Metadata {
        self.selected.metadata()
    }

    pub fn source(&self) -> Source {
        self.selected.source()
    }
}
