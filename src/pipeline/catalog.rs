//! Named input tables.
//!
//! A `Load` step starts a pipeline from one of these. The catalog is filled
//! before a run (by the caller or the binary) and is read-only during it.

use crate::error::{Result, ResultExt, TidyError};
use crate::table::Table;
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Datasets {
    tables: BTreeMap<String, Table>,
}

impl Datasets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a dataset.
    pub fn insert(&mut self, name: impl Into<String>, table: Table) {
        let name = name.into();
        if self.tables.insert(name.clone(), table).is_some() {
            tracing::debug!("Replaced dataset '{}'", name);
        }
    }

    pub fn with(mut self, name: impl Into<String>, table: Table) -> Self {
        self.insert(name, table);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Table> {
        self.tables.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Read a JSON array of records from `path` and register it as `name`.
    pub fn load_json_file(&mut self, name: &str, path: &Path) -> Result<()> {
        let content = std::fs::read_to_string(path)
            .map_err(TidyError::from)
            .with_context(|| format!("Failed to read dataset {}", path.display()))?;
        let table: Table = serde_json::from_str(&content)
            .map_err(TidyError::from)
            .with_context(|| format!("Failed to parse dataset {}", path.display()))?;
        tracing::info!(
            "Loaded dataset '{}' ({} rows, {} columns) from {}",
            name,
            table.row_count(),
            table.columns().len(),
            path.display()
        );
        self.insert(name, table);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_insert_and_get() {
        let table: Table = serde_json::from_str(r#"[{"a": 1}]"#).unwrap();
        let datasets = Datasets::new().with("nums", table.clone());
        assert_eq!(datasets.get("nums"), Some(&table));
        assert!(datasets.get("other").is_none());
        assert_eq!(datasets.names().collect::<Vec<_>>(), vec!["nums"]);
    }

    #[test]
    fn test_load_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"[{{"k": "a", "v": 1}}, {{"k": "b", "v": 2}}]"#).unwrap();

        let mut datasets = Datasets::new();
        datasets.load_json_file("kv", file.path()).unwrap();
        assert_eq!(datasets.get("kv").unwrap().row_count(), 2);
    }

    #[test]
    fn test_load_json_file_reports_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();

        let mut datasets = Datasets::new();
        let err = datasets.load_json_file("bad", file.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse dataset"));
        assert!(datasets.is_empty());
    }
}
