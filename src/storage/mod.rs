//! Object storage access for the company-name list.

pub mod local;
pub mod s3;

pub use local::LocalStore;
pub use s3::S3Store;

use crate::config::SourceConfig;
use crate::error::{EnrichError, Result};
use async_trait::async_trait;
use log::info;

/// Blocking-style fetch of a whole object by key.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Returns the object's bytes, or `NotFound` / a transport error.
    async fn fetch(&self, key: &str) -> Result<Vec<u8>>;
}

pub fn store_from_config(source: &SourceConfig) -> Box<dyn ObjectStore> {
    match source {
        SourceConfig::S3(s3) => Box::new(S3Store::new(s3.clone())),
        SourceConfig::Local { root } => Box::new(LocalStore::new(root.clone())),
    }
}

/// Fetches `key` and splits it into company names, one per line, in file order.
pub async fn load_company_names(store: &dyn ObjectStore, key: &str) -> Result<Vec<String>> {
    let bytes = store.fetch(key).await?;
    let companies = split_company_names(bytes)?;
    info!("Loaded {} company names from '{}'", companies.len(), key);
    Ok(companies)
}

pub fn split_company_names(bytes: Vec<u8>) -> Result<Vec<String>> {
    let text = String::from_utf8(bytes)
        .map_err(|e| EnrichError::Format(format!("Company list is not valid UTF-8: {}", e)))?;
    Ok(text.lines().map(str::to_string).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct MemoryStore(HashMap<String, Vec<u8>>);

    #[async_trait]
    impl ObjectStore for MemoryStore {
        async fn fetch(&self, key: &str) -> Result<Vec<u8>> {
            self.0
                .get(key)
                .cloned()
                .ok_or_else(|| EnrichError::NotFound(key.to_string()))
        }
    }

    #[test]
    fn test_split_preserves_order_and_duplicates() {
        let names = split_company_names(b"Acme Corp\r\nGlobex\nAcme Corp\n".to_vec()).unwrap();
        assert_eq!(names, vec!["Acme Corp", "Globex", "Acme Corp"]);
    }

    #[test]
    fn test_split_empty_object() {
        assert!(split_company_names(Vec::new()).unwrap().is_empty());
    }

    #[test]
    fn test_split_keeps_untrimmed_lines() {
        let names = split_company_names(b" Initech \n\nUmbrella".to_vec()).unwrap();
        assert_eq!(names, vec![" Initech ", "", "Umbrella"]);
    }

    #[test]
    fn test_invalid_utf8_is_format_error() {
        let err = split_company_names(vec![0xff, 0xfe, b'\n']).unwrap_err();
        assert!(matches!(err, EnrichError::Format(_)));
    }

    #[tokio::test]
    async fn test_load_company_names_missing_key() {
        let store = MemoryStore(HashMap::new());
        let err = load_company_names(&store, "companies.txt").await.unwrap_err();
        assert!(matches!(err, EnrichError::NotFound(key) if key == "companies.txt"));
    }

    #[tokio::test]
    async fn test_load_company_names() {
        let mut objects = HashMap::new();
        objects.insert("companies.txt".to_string(), b"Acme Corp\nGlobex".to_vec());
        let store = MemoryStore(objects);
        let names = load_company_names(&store, "companies.txt").await.unwrap();
        assert_eq!(names, vec!["Acme Corp", "Globex"]);
    }
}
