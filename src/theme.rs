use colored::{Color, ColoredString, Colorize};

use crate::diagnosis::{AnalysisResult, Outcome, QueryBudget, Source};

#[derive(Debug, Clone, Default)]
pub struct ColorScheme {
    pub foreground: Option<Color>,
    pub bold: bool,
    pub underline: bool,
}

#[derive(Debug, Clone)]
pub struct Theme {
    pub header: ColorScheme,
    pub success: ColorScheme,
    pub info: ColorScheme,
    pub warning: ColorScheme,
    pub known_error: ColorScheme,
}

fn fg(color: Color, bold: bool) -> ColorScheme {
    ColorScheme {
        foreground: Some(color),
        bold,
        underline: false,
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            header: fg(Color::Blue, true),
            success: fg(Color::Green, true),
            info: fg(Color::Cyan, false),
            warning: fg(Color::Red, true),
            known_error: fg(Color::Yellow, false),
        }
    }
}

impl Theme {
    pub fn for_display(color_output: bool) -> Self {
        if color_output {
            Self::default()
        } else {
            Self::monochrome()
        }
    }

    pub fn monochrome() -> Self {
        let plain = ColorScheme::default();
        let emphasis = ColorScheme {
            bold: true,
            ..ColorScheme::default()
        };
        Self {
            header: ColorScheme {
                underline: true,
                ..emphasis.clone()
            },
            success: emphasis.clone(),
            info: plain.clone(),
            warning: emphasis,
            known_error: plain,
        }
    }

    /// Turns one analysis into the lines printed for the user.
    pub fn render(&self, result: &AnalysisResult, budget: Option<&QueryBudget>) -> String {
        let mut out = Vec::new();

        let heading = match (result.source, result.outcome) {
            (Source::Cache, _) => self.success.apply("Found in memory (previously solved):"),
            (Source::Catalog, _) => {
                self.success.apply("Known error found in the reference catalog:")
            }
            (Source::Remote, Outcome::Answered) => self.success.apply("AI suggestion:"),
            (Source::Remote, Outcome::BudgetExceeded) => self.warning.apply("Usage limit reached"),
            (Source::Remote, Outcome::RemoteFailed) => self.warning.apply("AI analysis failed"),
        };
        out.push(heading.to_string());

        if let Some(signature) = &result.signature {
            out.push(self.header.apply(&signature.pattern).to_string());
        }
        out.push(result.text.clone());

        let others: Vec<&str> = result
            .known_errors
            .iter()
            .filter(|known| Some(*known) != result.signature.as_ref())
            .map(|known| known.pattern.as_str())
            .collect();
        if !others.is_empty() {
            out.push(String::new());
            out.push(self.info.apply("Other known errors in this text:").to_string());
            for pattern in others {
                out.push(format!("  - {}", self.known_error.apply(pattern)));
            }
        }

        if let (Source::Remote, Outcome::Answered, Some(budget)) =
            (result.source, result.outcome, budget)
        {
            out.push(
                self.info
                    .apply(&format!("Remaining free AI queries: {}", budget.remaining()))
                    .to_string(),
            );
        }

        out.join("\n")
    }
}

impl ColorScheme {
    pub fn apply(&self, text: &str) -> ColoredString {
        let mut colored_text: ColoredString = text.into();

        if let Some(color) = self.foreground {
            colored_text = colored_text.color(color);
        }
        if self.bold {
            colored_text = colored_text.bold();
        }
        if self.underline {
            colored_text = colored_text.underline();
        }

        colored_text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ErrorSignature;

    fn signature(pattern: &str) -> ErrorSignature {
        ErrorSignature {
            pattern: pattern.to_string(),
            explanation: "e".to_string(),
            fix: "f".to_string(),
            rationale: "r".to_string(),
            resource_url: "u".to_string(),
        }
    }

    #[test]
    fn test_remote_answer_shows_remaining_queries() {
        colored::control::set_override(false);
        let result = AnalysisResult {
            source: Source::Remote,
            outcome: Outcome::Answered,
            text: "Increase MaxCycle.".to_string(),
            signature: None,
            known_errors: vec![],
        };
        let mut budget = QueryBudget::new("session", 5);
        budget.used = 2;

        let rendered = Theme::monochrome().render(&result, Some(&budget));
        assert!(rendered.starts_with("AI suggestion:"));
        assert!(rendered.contains("Increase MaxCycle."));
        assert!(rendered.ends_with("Remaining free AI queries: 3"));
    }

    #[test]
    fn test_catalog_hit_lists_other_known_errors_only() {
        colored::control::set_override(false);
        let matched = signature("Error termination via Lnk1e");
        let result = AnalysisResult {
            source: Source::Catalog,
            outcome: Outcome::Answered,
            text: "Explanation: e".to_string(),
            signature: Some(matched.clone()),
            known_errors: vec![matched, signature("Galloc: could not allocate memory.")],
        };

        let rendered = Theme::monochrome().render(&result, None);
        assert!(rendered.contains("  - Galloc: could not allocate memory."));
        assert!(!rendered.contains("  - Error termination via Lnk1e"));
    }
}
