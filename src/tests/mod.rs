use crate::ai::{AIError, Analyzer};
use crate::cache::ResponseCache;
use crate::catalog::{ErrorSignature, ReferenceCatalog};
use crate::config::DiagnosisConfig;
use crate::diagnosis::Orchestrator;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;


/// Analyzer double that returns a canned outcome and counts calls.
pub(crate) struct FakeAnalyzer {
    reply: Result<String, AIError>,
    calls: AtomicUsize,
}

impl FakeAnalyzer {
    pub fn answering(answer: &str) -> Self {
        Self {
            reply: Ok(answer.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(error: AIError) -> Self {
        Self {
            reply: Err(error),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Analyzer for FakeAnalyzer {
    async fn analyze(&self, _error_text: &str) -> Result<String, AIError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.reply.clone()
    }
}

// Test utilities and helpers
pub(crate) struct TestUtils;

impl TestUtils {
    pub fn signature(pattern: &str, explanation: &str) -> ErrorSignature {
        ErrorSignature {
            pattern: pattern.to_string(),
            explanation: explanation.to_string(),
            fix: "Inspect the link that failed just above this line.".to_string(),
            rationale: "Lnk1e only reports that some link exited abnormally.".to_string(),
            resource_url: "https://gaussian.com/techsupport/".to_string(),
        }
    }

    pub fn catalog() -> Arc<ReferenceCatalog> {
        Arc::new(ReferenceCatalog::new(vec![
            Self::signature("Error termination via Lnk1e", "A Gaussian link exited abnormally."),
            Self::signature(
                "Galloc: could not allocate memory.",
                "%mem asks for more memory than the node can give.",
            ),
        ]))
    }

    pub fn orchestrator(analyzer: FakeAnalyzer) -> Orchestrator<FakeAnalyzer> {
        Orchestrator::new(
            Self::catalog(),
            ResponseCache::in_memory(),
            analyzer,
            DiagnosisConfig::default(),
        )
    }

    /// An unremarkable Gaussian log line.
    pub fn leave_link_line(link: usize) -> String {
        format!(
            " Leave Link  {:>3} at Tue Jun  4 09:00:00 2024, MaxMem= 268435456 cpu: 0.1\n",
            link
        )
    }

    /// A 40-line Gaussian log whose line 35 carries the Lnk1e failure.
    pub fn forty_line_log() -> Vec<u8> {
        (1..=40)
            .map(|i| {
                if i == 35 {
                    concat!(
                        " Error termination via Lnk1e in /opt/g16/l9999.exe",
                        " at Tue Jun  4 09:00:00 2024.\n"
                    )
                    .to_string()
                } else {
                    Self::leave_link_line(i)
                }
            })
            .collect::<String>()
            .into_bytes()
    }
}
