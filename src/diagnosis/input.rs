/// Where the error text came from.
#[derive(Debug, Clone)]
pub enum ErrorInput {
    /// Text pasted by the user.
    Pasted(String),
    /// Raw bytes of an uploaded `.log`/`.out` file.
    Upload(Vec<u8>),
}

impl ErrorInput {
    /// Text handed to the rest of the pipeline; `None` when nothing is left after trimming.
    pub fn normalize(&self, tail_lines: usize) -> Option<String> {
        let text = match self {
            Self::Pasted(text) => text.trim().to_string(),
            Self::Upload(bytes) => tail(&decode_lossy(bytes), tail_lines).trim().to_string(),
        };
        (!text.is_empty()).then_some(text)
    }
}

/// Decodes as UTF-8, dropping invalid byte sequences.
pub fn decode_lossy(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes)
        .chars()
        .filter(|c| *c != char::REPLACEMENT_CHARACTER)
        .collect()
}

/// The last `n` lines of `text`, newline-joined.
pub fn tail(text: &str, n: usize) -> String {
    let lines: Vec<&str> = text.lines().collect();
    let start = lines.len().saturating_sub(n);
    lines[start..].join("\n")
}
