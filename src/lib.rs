pub mod ai;
pub mod cache;
pub mod catalog;
pub mod config;
pub mod diagnosis;
pub mod matcher;
pub mod theme;

#[cfg(test)]
mod tests;

// Re-export commonly used types
pub use ai::{AIError, Analyzer, ChatCompletionClient};
pub use cache::{digest, CacheEntry, ResponseCache};
pub use catalog::{ErrorSignature, ReferenceCatalog};
pub use config::Config;
pub use diagnosis::{
    AnalysisResult, DiagnosisError, ErrorInput, Orchestrator, Outcome, QueryBudget, Source,
};
