//! YAML-backed catalog source.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use edubot_types::errors::BotError;
use edubot_types::{CatalogSnapshot, CatalogSource};

/// Loads a [`CatalogSnapshot`] from a YAML file with `courses` and `faqs` lists.
#[derive(Debug, Clone)]
pub struct FileCatalog {
    path: PathBuf,
}

impl FileCatalog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Parse and validate a catalog from YAML text.
    pub fn parse(contents: &str) -> Result<CatalogSnapshot, BotError> {
        let snapshot: CatalogSnapshot = serde_yaml::from_str(contents)
            .map_err(|e| BotError::Catalog(format!("failed to parse catalog: {e}")))?;
        snapshot.validate()?;
        Ok(snapshot)
    }
}

#[async_trait]
impl CatalogSource for FileCatalog {
    async fn load(&self) -> Result<CatalogSnapshot, BotError> {
        let contents = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            BotError::Catalog(format!(
                "failed to read catalog file {}: {e}",
                self.path.display()
            ))
        })?;
        Self::parse(&contents)
    }

    async fn ping(&self) -> bool {
        tokio::fs::metadata(&self.path).await.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn test_load_shipped_seed_catalog() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../config/catalog.yaml");
        let snapshot = FileCatalog::new(path).load().await.unwrap();

        assert_eq!(snapshot.courses.len(), 5);
        assert_eq!(snapshot.faqs.len(), 11);
        assert_eq!(snapshot.courses[0].price, Decimal::new(29999, 2));
        assert_eq!(snapshot.faqs[5].course_id, Some(1));
        assert_eq!(snapshot.faqs[0].course_id, None);
    }

    #[tokio::test]
    async fn test_load_minimal_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
courses:
  - id: 7
    title: Rust Basics
    description: Ownership and borrowing.
    price: "120.00"
    duration_weeks: 4
    instructor: Ferris
"#
        )
        .unwrap();

        let catalog = FileCatalog::new(file.path());
        let snapshot = catalog.load().await.unwrap();
        assert_eq!(snapshot.courses.len(), 1);
        assert!(snapshot.faqs.is_empty());
        assert_eq!(snapshot.courses[0].price.to_string(), "120.00");
        assert!(catalog.ping().await);
    }

    #[tokio::test]
    async fn test_missing_file_is_catalog_error() {
        let catalog = FileCatalog::new("/nonexistent/catalog.yaml");
        let result = catalog.load().await;
        assert!(matches!(result, Err(BotError::Catalog(_))));
        assert!(!catalog.ping().await);
    }

    #[test]
    fn test_duplicate_faq_ids_rejected() {
        let yaml = r#"
faqs:
  - id: 1
    question: A?
    answer: a
  - id: 1
    question: B?
    answer: b
"#;
        let err = FileCatalog::parse(yaml).unwrap_err();
        assert!(err.to_string().contains("duplicate FAQ id 1"), "{err}");
    }

    #[test]
    fn test_malformed_yaml_rejected() {
        let result = FileCatalog::parse("courses: [ {id: not-a-number} ]");
        assert!(matches!(result, Err(BotError::Catalog(_))));
    }
}
