use crate::error::{EnrichError, Result};
use crate::storage::ObjectStore;
use async_trait::async_trait;
use log::debug;
use std::io::ErrorKind;
use std::path::PathBuf;
use tokio::fs;

/// Serves objects from a directory, the key being a path relative to `root`.
#[derive(Debug, Clone)]
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl ObjectStore for LocalStore {
    async fn fetch(&self, key: &str) -> Result<Vec<u8>> {
        let path = self.root.join(key);
        debug!("Reading object '{}' from {}", key, path.display());
        match fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(EnrichError::NotFound(key.to_string())),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fetch_existing_and_missing() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("companies.txt"), "Acme Corp\n").unwrap();
        let store = LocalStore::new(dir.path());

        assert_eq!(store.fetch("companies.txt").await.unwrap(), b"Acme Corp\n");
        assert!(matches!(
            store.fetch("missing.txt").await,
            Err(EnrichError::NotFound(_))
        ));
    }
}
