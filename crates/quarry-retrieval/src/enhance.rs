//! Query enhancement: rewrite, multi-query variants, HyDE.
//!
//! Each sub-operation is an independent, timeout-bounded LLM call and
//! degrades to "no enhancement" on any error. Enhancement failure never
//! fails the pipeline.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;
use tracing::{debug, warn};

use quarry_core::analysis::{Complexity, Intent, QueryAnalysis};
use quarry_core::config::PipelineConfig;
use quarry_core::constants::{MAX_QUERY_VARIANTS, MAX_SUB_QUESTIONS};
use quarry_core::errors::EnhancementError;
use quarry_core::models::{DegradationEvent, Stage};
use quarry_core::traits::LanguageModel;

use crate::analyze;

/// Result of the enhancement stage. Empty fields mean "no enhancement".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnhancedQuery {
    /// Cleaned-up rewrite of the original query, if any.
    pub rewritten: Option<String>,
    /// Alternative phrasings fanned out in multi-query mode.
    pub variants: Vec<String>,
    /// Hypothetical answer document whose embedding seeds an extra
    /// vector retrieval.
    pub hyde_document: Option<String>,
}

impl EnhancedQuery {
    /// The query the retrievers should run: the rewrite when present,
    /// otherwise the original.
    pub fn search_query<'a>(&'a self, original: &'a str) -> &'a str {
        self.rewritten.as_deref().unwrap_or(original)
    }
}

const REWRITE_SYSTEM: &str = "You rewrite search queries. Reply with a single \
    improved query only, no explanations.";
const VARIANTS_SYSTEM: &str = "You generate alternative phrasings of a search \
    query. Reply with one variant per line, nothing else.";
const HYDE_SYSTEM: &str = "You write a short hypothetical passage that would \
    perfectly answer the question. Reply with the passage only.";
const DECOMPOSE_SYSTEM: &str = "You split a compound question into standalone \
    sub-questions. Reply with one sub-question per line, nothing else.";

/// Runs the enhancement sub-operations against the configured LLM.
pub struct QueryEnhancer {
    llm: Option<Arc<dyn LanguageModel>>,
    call_timeout: Duration,
}

impl QueryEnhancer {
    pub fn new(llm: Option<Arc<dyn LanguageModel>>, call_timeout: Duration) -> Self {
        Self { llm, call_timeout }
    }

    /// Run the applicable sub-operations concurrently. Failures are
    /// recorded as degradation events and leave the corresponding field
    /// empty; the pipeline continues with the original query.
    pub async fn enhance(
        &self,
        query: &str,
        analysis: &QueryAnalysis,
        config: &PipelineConfig,
    ) -> (EnhancedQuery, Vec<DegradationEvent>) {
        if self.llm.is_none() {
            return (EnhancedQuery::default(), Vec::new());
        }

        let want_variants =
            config.use_multi_query || analysis.complexity == Complexity::Complex;
        let want_hyde = config.use_hyde
            || matches!(analysis.intent, Intent::Factual | Intent::Definition);

        let rewrite_fut = self.rewrite(query);
        let variants_fut = async {
            if want_variants {
                Some(self.variants(query).await)
            } else {
                None
            }
        };
        let hyde_fut = async {
            if want_hyde {
                Some(self.hyde(query).await)
            } else {
                None
            }
        };

        let (rewrite, variants, hyde) = tokio::join!(rewrite_fut, variants_fut, hyde_fut);

        let mut enhanced = EnhancedQuery::default();
        let mut degradations = Vec::new();

        match rewrite {
            Ok(text) => enhanced.rewritten = Some(text),
            Err(e) => {
                warn!(error = %e, "query rewrite degraded");
                degradations.push(DegradationEvent::new(Stage::Enhancement, e.to_string()));
            }
        }
        match variants {
            Some(Ok(list)) => enhanced.variants = list,
            Some(Err(e)) => {
                warn!(error = %e, "multi-query generation degraded");
                degradations.push(DegradationEvent::new(Stage::Enhancement, e.to_string()));
            }
            None => {}
        }
        match hyde {
            Some(Ok(doc)) => enhanced.hyde_document = Some(doc),
            Some(Err(e)) => {
                warn!(error = %e, "hyde generation degraded");
                degradations.push(DegradationEvent::new(Stage::Enhancement, e.to_string()));
            }
            None => {}
        }

        debug!(
            rewritten = enhanced.rewritten.is_some(),
            variants = enhanced.variants.len(),
            hyde = enhanced.hyde_document.is_some(),
            "enhancement complete"
        );
        (enhanced, degradations)
    }

    /// Decompose a compound query into sub-questions. Tries the LLM first;
    /// falls back to the lexical conjunction split on any failure or when
    /// the model yields fewer than two sub-questions (a single line is no
    /// decomposition at all).
    pub async fn decompose(&self, query: &str) -> Vec<String> {
        if self.llm.is_some() {
            let prompt = format!("Split into standalone sub-questions:\n\n{query}");
            match self.call("decompose", &prompt, DECOMPOSE_SYSTEM, 0.2, 200).await {
                Ok(text) => {
                    let subs = parse_lines(&text, MAX_SUB_QUESTIONS);
                    if subs.len() > 1 {
                        return subs;
                    }
                }
                Err(e) => warn!(error = %e, "llm decomposition degraded to lexical split"),
            }
        }
        let mut subs = analyze::decompose(query);
        subs.truncate(MAX_SUB_QUESTIONS);
        subs
    }

    async fn rewrite(&self, query: &str) -> Result<String, EnhancementError> {
        let prompt = format!("Rewrite this search query for retrieval:\n\n{query}");
        let text = self.call("rewrite", &prompt, REWRITE_SYSTEM, 0.0, 100).await?;
        let line = text.lines().next().unwrap_or_default().trim().to_string();
        if line.is_empty() {
            return Err(EnhancementError::Llm {
                reason: "empty rewrite".into(),
            });
        }
        Ok(line)
    }

    async fn variants(&self, query: &str) -> Result<Vec<String>, EnhancementError> {
        let prompt = format!(
            "Generate {MAX_QUERY_VARIANTS} alternative phrasings:\n\n{query}"
        );
        let text = self.call("variants", &prompt, VARIANTS_SYSTEM, 0.7, 200).await?;
        Ok(parse_lines(&text, MAX_QUERY_VARIANTS))
    }

    async fn hyde(&self, query: &str) -> Result<String, EnhancementError> {
        let prompt = format!("Question:\n\n{query}\n\nHypothetical answer passage:");
        let text = self.call("hyde", &prompt, HYDE_SYSTEM, 0.5, 300).await?;
        let doc = text.trim().to_string();
        if doc.is_empty() {
            return Err(EnhancementError::Llm {
                reason: "empty hyde document".into(),
            });
        }
        Ok(doc)
    }

    async fn call(
        &self,
        operation: &'static str,
        prompt: &str,
        system: &str,
        temperature: f32,
        max_tokens: usize,
    ) -> Result<String, EnhancementError> {
        let llm = self.llm.as_ref().ok_or(EnhancementError::NoModel)?;
        match timeout(
            self.call_timeout,
            llm.complete(prompt, Some(system), temperature, max_tokens),
        )
        .await
        {
            Ok(Ok(text)) => Ok(text),
            Ok(Err(e)) => Err(EnhancementError::Llm {
                reason: e.to_string(),
            }),
            Err(_) => Err(EnhancementError::Timeout { operation }),
        }
    }
}

/// Non-empty trimmed lines, numbering stripped, capped at `max`.
fn parse_lines(text: &str, max: usize) -> Vec<String> {
    text.lines()
        .map(|l| {
            l.trim()
                .trim_start_matches(|c: char| c.is_ascii_digit() || c == '.' || c == ')' || c == '-')
                .trim()
                .to_string()
        })
        .filter(|l| !l.is_empty())
        .take(max)
        .collect()
}
