use serde::Deserialize;
use std::fmt;
use std::path::Path;
use tracing::{info, warn};

const REQUIRED_COLUMNS: [&str; 5] = ["Error", "Explanation", "Fix", "Why This Works", "Resource"];

/// A known error pattern with its stored explanation and fix.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorSignature {
    pub pattern: String,
    pub explanation: String,
    pub fix: String,
    pub rationale: String,
    pub resource_url: String,
}

#[derive(Debug)]
pub enum CatalogError {
    SourceUnavailable(String),
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SourceUnavailable(msg) => write!(f, "Reference data unavailable: {}", msg),
        }
    }
}

impl std::error::Error for CatalogError {}

impl From<csv::Error> for CatalogError {
    fn from(error: csv::Error) -> Self {
        CatalogError::SourceUnavailable(format!("CSV error: {}", error))
    }
}

impl From<std::io::Error> for CatalogError {
    fn from(error: std::io::Error) -> Self {
        CatalogError::SourceUnavailable(error.to_string())
    }
}

impl From<reqwest::Error> for CatalogError {
    fn from(error: reqwest::Error) -> Self {
        CatalogError::SourceUnavailable(error.to_string())
    }
}

#[derive(Debug, Deserialize)]
struct CatalogRow {
    #[serde(rename = "Error")]
    error: Option<String>,
    #[serde(rename = "Explanation")]
    explanation: Option<String>,
    #[serde(rename = "Fix")]
    fix: Option<String>,
    #[serde(rename = "Why This Works")]
    why: Option<String>,
    #[serde(rename = "Resource")]
    resource: Option<String>,
}

impl CatalogRow {
    fn into_signature(self) -> Option<ErrorSignature> {
        fn field(value: Option<String>) -> Option<String> {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        }

        Some(ErrorSignature {
            pattern: field(self.error)?,
            explanation: field(self.explanation)?,
            fix: field(self.fix)?,
            rationale: field(self.why)?,
            resource_url: field(self.resource)?,
        })
    }
}

/// Known error signatures, loaded once and shared read-only for the rest of the process.
#[derive(Debug, Clone, Default)]
pub struct ReferenceCatalog {
    signatures: Vec<ErrorSignature>,
}

impl ReferenceCatalog {
    pub fn new(signatures: Vec<ErrorSignature>) -> Self {
        Self { signatures }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Loads from a local path or an `http(s)` URL.
    pub async fn load(source: &str) -> Result<Self, CatalogError> {
        let content = if source.starts_with("http://") || source.starts_with("https://") {
            let response = reqwest::get(source).await?;
            if !response.status().is_success() {
                return Err(CatalogError::SourceUnavailable(format!(
                    "{} returned status {}",
                    source,
                    response.status()
                )));
            }
            response.text().await?
        } else {
            tokio::fs::read_to_string(Path::new(source)).await?
        };

        let catalog = Self::from_csv(content.as_bytes())?;
        info!(source, signatures = catalog.len(), "loaded reference catalog");
        Ok(catalog)
    }

    /// Like [`load`](Self::load), but an unavailable source yields an empty catalog.
    pub async fn load_or_empty(source: Option<&str>) -> Self {
        let Some(source) = source else {
            return Self::empty();
        };
        match Self::load(source).await {
            Ok(catalog) => catalog,
            Err(e) => {
                warn!("{}; continuing without known signatures", e);
                Self::empty()
            }
        }
    }

    /// Parses CSV with the required header row. Rows missing any field are skipped.
    pub fn from_csv<R: std::io::Read>(reader: R) -> Result<Self, CatalogError> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::Headers)
            .flexible(true)
            .from_reader(reader);

        let headers = reader.headers()?.clone();
        for column in REQUIRED_COLUMNS {
            if !headers.iter().any(|h| h == column) {
                return Err(CatalogError::SourceUnavailable(format!(
                    "missing required column '{}'",
                    column
                )));
            }
        }

        let mut signatures = Vec::new();
        let mut skipped = 0usize;
        for row in reader.deserialize::<CatalogRow>() {
            match row.ok().and_then(CatalogRow::into_signature) {
                Some(signature) => signatures.push(signature),
                None => skipped += 1,
            }
        }
        if skipped > 0 {
            warn!(skipped, "skipped incomplete reference rows");
        }

        Ok(Self { signatures })
    }

    pub fn signatures(&self) -> &[ErrorSignature] {
        &self.signatures
    }

    pub fn len(&self) -> usize {
        self.signatures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signatures.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SAMPLE: &str = "\
Error,Explanation,Fix,Why This Works,Resource
Error termination via Lnk1e,Generic abnormal exit,Read the preceding lines,The real cause is printed just above,https://gaussian.com/techsupport/
Convergence failure -- run terminated,SCF did not converge,Use SCF=QC or raise MaxCycle,QC is more robust for difficult cases,https://gaussian.com/scf/
Galloc: could not allocate memory,Not enough memory,,,
";

    #[test]
    fn test_incomplete_rows_are_skipped() {
        let catalog = ReferenceCatalog::from_csv(SAMPLE.as_bytes()).unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.signatures()[0].pattern, "Error termination via Lnk1e");
        assert_eq!(catalog.signatures()[1].rationale, "QC is more robust for difficult cases");
    }

    #[test]
    fn test_missing_column_is_source_unavailable() {
        let csv = "Error,Explanation,Fix\nfoo,bar,baz\n";
        let result = ReferenceCatalog::from_csv(csv.as_bytes());
        assert!(matches!(result, Err(CatalogError::SourceUnavailable(_))));
    }

    #[test]
    fn test_headers_with_padding_are_accepted() {
        let csv = "Error , Explanation,Fix,Why This Works , Resource\na,b,c,d,e\n";
        let catalog = ReferenceCatalog::from_csv(csv.as_bytes()).unwrap();
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("errors.csv");
        std::fs::write(&path, SAMPLE).unwrap();

        let catalog =
            tokio_test::block_on(ReferenceCatalog::load(path.to_str().unwrap())).unwrap();
        assert_eq!(catalog.len(), 2);
    }

    #[test]
    fn test_unreadable_source_degrades_to_empty() {
        let catalog = tokio_test::block_on(ReferenceCatalog::load_or_empty(Some(
            "/definitely/not/here/errors.csv",
        )));
        assert!(catalog.is_empty());

        let catalog = tokio_test::block_on(ReferenceCatalog::load_or_empty(None));
        assert!(catalog.is_empty());
    }

    #[tokio::test]
    async fn test_load_from_url() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/sheet.csv")
            .with_status(200)
            .with_body(SAMPLE)
            .create_async()
            .await;

        let url = format!("{}/sheet.csv", server.url());
        let catalog = ReferenceCatalog::load(&url).await.unwrap();
        assert_eq!(catalog.len(), 2);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_url_error_status_is_source_unavailable() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/sheet.csv")
            .with_status(404)
            .create_async()
            .await;

        let url = format!("{}/sheet.csv", server.url());
        let result = ReferenceCatalog::load(&url).await;
        assert!(matches!(result, Err(CatalogError::SourceUnavailable(_))));
    }
}
