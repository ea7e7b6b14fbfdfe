use crate::error::Result;
use crate::schema::CompanyRecord;
use log::debug;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Accumulated results, mirrored in full to a JSON snapshot file.
#[derive(Debug)]
pub struct ResultStore {
    path: PathBuf,
    records: BTreeMap<String, CompanyRecord>,
}

impl ResultStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            records: BTreeMap::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stores `record`, replacing any earlier record for the same company.
    pub fn insert(&mut self, company: impl Into<String>, record: CompanyRecord) {
        self.records.insert(company.into(), record);
    }

    pub fn get(&self, company: &str) -> Option<&CompanyRecord> {
        self.records.get(company)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &BTreeMap<String, CompanyRecord> {
        &self.records
    }

    pub fn into_records(self) -> BTreeMap<String, CompanyRecord> {
        self.records
    }

    /// Overwrites the snapshot file with every record held so far. Not atomic.
    pub async fn persist(&self) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.records)?;
        fs::write(&self.path, json).await?;
        debug!(
            "Wrote {} records to {}",
            self.records.len(),
            self.path.display()
        );
        Ok(())
    }
}
