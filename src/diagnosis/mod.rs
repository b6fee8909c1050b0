use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

mod budget;
mod input;

pub use budget::QueryBudget;
pub use input::{decode_lossy, tail, ErrorInput};

use crate::ai::Analyzer;
use crate::cache::{digest, ResponseCache};
use crate::catalog::{ErrorSignature, ReferenceCatalog};
use crate::config::DiagnosisConfig;
use crate::matcher;

pub const DEFAULT_TAIL_LINES: usize = 30;
pub const LIMIT_REACHED_MESSAGE: &str =
    "You've reached the free usage limit. Please subscribe for unlimited access.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Cache,
    Catalog,
    Remote,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Answered,
    BudgetExceeded,
    RemoteFailed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisResult {
    pub source: Source,
    pub outcome: Outcome,
    pub text: String,
    pub signature: Option<ErrorSignature>,
    /// Every catalog signature whose pattern occurs in the analysed text.
    pub known_errors: Vec<ErrorSignature>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DiagnosisError {
    EmptyInput,
}

impl fmt::Display for DiagnosisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyInput => write!(f, "Please paste an error message or upload a file."),
        }
    }
}

impl std::error::Error for DiagnosisError {}

/// Text shown for a catalog hit.
pub fn render_signature(signature: &ErrorSignature) -> String {
    format!(
        "Explanation: {}\nFix: {}\nWhy this works: {}\nResource: {}",
        signature.explanation, signature.fix, signature.rationale, signature.resource_url
    )
}

/// Runs cache, catalog and remote lookups in that order, stopping at the first answer.
pub struct Orchestrator<A: Analyzer> {
    catalog: Arc<ReferenceCatalog>,
    cache: ResponseCache,
    analyzer: A,
    settings: DiagnosisConfig,
}

impl<A: Analyzer> Orchestrator<A> {
    pub fn new(
        catalog: Arc<ReferenceCatalog>,
        cache: ResponseCache,
        analyzer: A,
        settings: DiagnosisConfig,
    ) -> Self {
        Self {
            catalog,
            cache,
            analyzer,
            settings,
        }
    }

    pub fn catalog(&self) -> &ReferenceCatalog {
        &self.catalog
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    pub fn analyzer(&self) -> &A {
        &self.analyzer
    }

    pub async fn analyze(
        &mut self,
        input: &ErrorInput,
        budget: Option<&mut QueryBudget>,
    ) -> Result<AnalysisResult, DiagnosisError> {
        let text = input
            .normalize(self.settings.tail_lines)
            .ok_or(DiagnosisError::EmptyInput)?;

        let known_errors: Vec<ErrorSignature> = if self.settings.enable_catalog {
            matcher::find_all(&text, self.catalog.signatures())
                .into_iter()
                .cloned()
                .collect()
        } else {
            Vec::new()
        };

        let hash = digest(&text);
        if self.settings.enable_cache {
            if let Some(entry) = self.cache.lookup(&hash) {
                debug!(hash = %hash, "cache hit");
                return Ok(AnalysisResult {
                    source: Source::Cache,
                    outcome: Outcome::Answered,
                    text: entry.answer.clone(),
                    signature: None,
                    known_errors,
                });
            }
        }

        if self.settings.enable_catalog {
            if let Some(signature) = matcher::best_match(
                &text,
                self.catalog.signatures(),
                self.settings.match_threshold,
            ) {
                debug!(pattern = %signature.pattern, "catalog match");
                return Ok(AnalysisResult {
                    source: Source::Catalog,
                    outcome: Outcome::Answered,
                    text: render_signature(signature),
                    signature: Some(signature.clone()),
                    known_errors,
                });
            }
        }

        let budget = budget.filter(|_| self.settings.enable_budget);
        if let Some(budget) = budget.as_deref() {
            if budget.is_exhausted() {
                info!(identity = %budget.identity, used = budget.used, "query budget exhausted");
                return Ok(AnalysisResult {
                    source: Source::Remote,
                    outcome: Outcome::BudgetExceeded,
                    text: LIMIT_REACHED_MESSAGE.to_string(),
                    signature: None,
                    known_errors,
                });
            }
        }

        info!("no cached or catalog answer, asking remote model");
        match self.analyzer.analyze(&text).await {
            Ok(answer) => {
                if self.settings.enable_cache {
                    let last_line = text.lines().last().unwrap_or_default();
                    if let Err(e) = self.cache.insert(&hash, last_line, &answer) {
                        warn!("Failed to persist remote answer: {}", e);
                    }
                }
                if let Some(budget) = budget {
                    budget.record_call();
                }
                Ok(AnalysisResult {
                    source: Source::Remote,
                    outcome: Outcome::Answered,
                    text: answer,
                    signature: None,
                    known_errors,
                })
            }
            Err(e) => {
                warn!("{}", e);
                Ok(AnalysisResult {
                    source: Source::Remote,
                    outcome: Outcome::RemoteFailed,
                    text: e.to_string(),
                    signature: None,
                    known_errors,
                })
            }
        }
    }
}
