//! Column lookups used to draft metadata from a CSV header.
//!
//! A lookup file is a CSV with `variable_name` and `type` columns and an
//! optional `description` column. Columns it does not list are drafted as
//! `character` with the placeholder description.

use std::{collections::BTreeMap, fs::File, io::Read, path::Path, str::FromStr};

use anyhow::{Context, anyhow};

use crate::{
    error::{ConformanceError, Result},
    types::ColumnType,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupEntry {
    pub column_type: ColumnType,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnLookup {
    entries: BTreeMap<String, LookupEntry>,
}

impl ColumnLookup {
    pub fn new() -> Self {
        ColumnLookup::default()
    }

    pub fn from_reader<R: Read>(reader: R) -> anyhow::Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);
        let headers = reader.headers()?.clone();
        let position = |name: &str| headers.iter().position(|h| h.eq_ignore_ascii_case(name));
        let name_idx = position("variable_name")
            .ok_or_else(|| anyhow!("Column lookup must have a 'variable_name' column"))?;
        let type_idx =
            position("type").ok_or_else(|| anyhow!("Column lookup must have a 'type' column"))?;
        let description_idx = position("description");

        let mut lookup = ColumnLookup::new();
        for (idx, record) in reader.records().enumerate() {
            let row = idx + 2;
            let record = record.with_context(|| format!("Reading column lookup row {row}"))?;
            let name = record.get(name_idx).unwrap_or_default();
            if name.is_empty() {
                continue;
            }
            let column_type = record.get(type_idx).unwrap_or_default();
            let description = description_idx
                .and_then(|i| record.get(i))
                .filter(|d| !d.is_empty());
            if lookup.entries.contains_key(name) {
                return Err(ConformanceError::duplicates("column lookup", vec![name.to_string()]))
                    .with_context(|| format!("Column lookup row {row}"));
            }
            lookup
                .insert(name, column_type, description)
                .with_context(|| format!("Column lookup row {row}"))?;
        }
        Ok(lookup)
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let file = File::open(path).with_context(|| format!("Opening column lookup {path:?}"))?;
        ColumnLookup::from_reader(file).with_context(|| format!("Parsing column lookup {path:?}"))
    }

    /// Adds or replaces the entry for `name`.
    pub fn insert(
        &mut self,
        name: &str,
        column_type: &str,
        description: Option<&str>,
    ) -> Result<()> {
        let column_type = ColumnType::from_str(column_type)?;
        self.entries.insert(
            name.to_string(),
            LookupEntry {
                column_type,
                description: description.map(str::to_string),
            },
        );
        Ok(())
    }

    /// Overrides the type for `name`, keeping any description already listed.
    pub fn override_type(&mut self, name: &str, column_type: &str) -> Result<()> {
        let column_type = ColumnType::from_str(column_type)?;
        self.entries
            .entry(name.to_string())
            .and_modify(|entry| entry.column_type = column_type)
            .or_insert(LookupEntry {
                column_type,
                description: None,
            });
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&LookupEntry> {
        self.entries.get(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    const LOOKUP: &str = "variable_name,type,description\n\
                          id,long,Row identifier\n\
                          joined,date,\n";

    #[test]
    fn lookup_reads_types_and_optional_descriptions() {
        let lookup = ColumnLookup::from_reader(LOOKUP.as_bytes()).unwrap();
        assert_eq!(lookup.len(), 2);
        let id = lookup.get("id").unwrap();
        assert_eq!(id.column_type, ColumnType::Long);
        assert_eq!(id.description.as_deref(), Some("Row identifier"));
        assert_eq!(lookup.get("joined").unwrap().description, None);
        assert!(lookup.get("name").is_none());
    }

    #[test]
    fn lookup_rejects_unknown_types_with_row_number() {
        let err = ColumnLookup::from_reader("variable_name,type\nid,varchar\n".as_bytes())
            .unwrap_err();
        let message = format!("{err:#}");
        assert!(message.contains("row 2"), "{message}");
        assert!(message.contains("varchar"), "{message}");
    }

    #[test]
    fn lookup_requires_name_and_type_columns() {
        let err = ColumnLookup::from_reader("name,kind\nid,int\n".as_bytes()).unwrap_err();
        assert!(err.to_string().contains("variable_name"));
    }

    #[test]
    fn override_keeps_listed_description() {
        let mut lookup = ColumnLookup::from_reader(LOOKUP.as_bytes()).unwrap();
        lookup.override_type("id", "int").unwrap();
        lookup.override_type("score", "float").unwrap();
        let id = lookup.get("id").unwrap();
        assert_eq!(id.column_type, ColumnType::Int);
        assert_eq!(id.description.as_deref(), Some("Row identifier"));
        assert_eq!(lookup.get("score").unwrap().column_type, ColumnType::Float);

        let err = lookup.override_type("id", "text").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidColumnType);
    }
}
