//! Table metadata: the declarative description a dataset is conformed to.
//!
//! [`TableMetadata`] owns an ordered list of [`ColumnMeta`] (the order is the
//! canonical column order), an optional list of partition keys, the storage
//! [`DataFormat`] and a location that always ends in `/`. Construction and
//! every mutator validate their input, so a loaded instance never carries
//! duplicate column names or partition keys that name undeclared columns.
//!
//! Metadata files are JSON by default; `.yml`/`.yaml` paths use YAML.

use std::{
    fmt,
    fs::File,
    io::{BufReader, BufWriter, Write},
    path::Path,
    str::FromStr,
};

use anyhow::Context;
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::{
    error::{ConformanceError, Result},
    lookup::ColumnLookup,
    types::ColumnType,
};

pub const DEFAULT_COLUMN_DESCRIPTION: &str = "column description not yet set";

fn default_description() -> String {
    DEFAULT_COLUMN_DESCRIPTION.to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataFormat {
    Avro,
    Csv,
    CsvQuotedNodate,
    Regex,
    Orc,
    Par,
    Parquet,
}

impl DataFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataFormat::Avro => "avro",
            DataFormat::Csv => "csv",
            DataFormat::CsvQuotedNodate => "csv_quoted_nodate",
            DataFormat::Regex => "regex",
            DataFormat::Orc => "orc",
            DataFormat::Par => "par",
            DataFormat::Parquet => "parquet",
        }
    }

    pub fn variants() -> &'static [&'static str] {
        &[
            "avro",
            "csv",
            "csv_quoted_nodate",
            "regex",
            "orc",
            "par",
            "parquet",
        ]
    }
}

impl fmt::Display for DataFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataFormat {
    type Err = ConformanceError;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "avro" => Ok(DataFormat::Avro),
            "csv" => Ok(DataFormat::Csv),
            "csv_quoted_nodate" => Ok(DataFormat::CsvQuotedNodate),
            "regex" => Ok(DataFormat::Regex),
            "orc" => Ok(DataFormat::Orc),
            "par" => Ok(DataFormat::Par),
            "parquet" => Ok(DataFormat::Parquet),
            _ => Err(ConformanceError::InvalidDataFormat(
                value.to_string(),
                DataFormat::variants().join(", "),
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMeta {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    #[serde(default = "default_description")]
    pub description: String,
}

impl ColumnMeta {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        ColumnMeta {
            name: name.into(),
            column_type,
            description: default_description(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// A column stored as a physical partition rather than as data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionKey {
    pub name: String,
    pub column_type: ColumnType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawTableMetadata", into = "RawTableMetadata")]
pub struct TableMetadata {
    id: Option<String>,
    table_name: String,
    table_description: String,
    data_format: DataFormat,
    location: String,
    columns: Vec<ColumnMeta>,
    partitions: Option<Vec<PartitionKey>>,
}

/// On-disk shape of [`TableMetadata`].
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawTableMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    table_name: String,
    #[serde(default, rename = "table_desc", alias = "table_description")]
    table_description: String,
    data_format: DataFormat,
    location: String,
    columns: Vec<ColumnMeta>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    partitions: Option<Vec<String>>,
}

impl TryFrom<RawTableMetadata> for TableMetadata {
    type Error = ConformanceError;

    fn try_from(raw: RawTableMetadata) -> Result<Self> {
        let duplicates: Vec<String> = raw
            .columns
            .iter()
            .map(|c| c.name.clone())
            .duplicates()
            .collect();
        if !duplicates.is_empty() {
            return Err(ConformanceError::duplicates("metadata", duplicates));
        }
        for column in &raw.columns {
            check_description(&column.name, &column.description)?;
        }
        let mut metadata = TableMetadata {
            id: raw.id,
            table_name: raw.table_name,
            table_description: raw.table_description,
            data_format: raw.data_format,
            location: normalize_location(&raw.location)?,
            columns: raw.columns,
            partitions: None,
        };
        if let Some(names) = raw.partitions {
            let names: Vec<&str> = names.iter().map(String::as_str).collect();
            metadata.set_partition_columns(Some(names.as_slice()))?;
        }
        Ok(metadata)
    }
}

impl From<TableMetadata> for RawTableMetadata {
    fn from(metadata: TableMetadata) -> Self {
        RawTableMetadata {
            id: metadata.id,
            table_name: metadata.table_name,
            table_description: metadata.table_description,
            data_format: metadata.data_format,
            location: metadata.location,
            columns: metadata.columns,
            partitions: metadata
                .partitions
                .map(|keys| keys.into_iter().map(|k| k.name).collect()),
        }
    }
}

fn normalize_location(location: &str) -> Result<String> {
    let trimmed = location.trim();
    if trimmed.is_empty() {
        return Err(ConformanceError::InvalidLocation);
    }
    if trimmed.ends_with('/') {
        Ok(trimmed.to_string())
    } else {
        Ok(format!("{trimmed}/"))
    }
}

fn check_description(column: &str, description: &str) -> Result<()> {
    if description
        .chars()
        .any(|c| c.is_control() && !c.is_whitespace())
    {
        return Err(ConformanceError::InvalidColumnDescription(
            column.to_string(),
        ));
    }
    Ok(())
}

impl TableMetadata {
    pub fn new(
        table_name: impl Into<String>,
        data_format: DataFormat,
        location: &str,
    ) -> Result<Self> {
        Ok(TableMetadata {
            id: None,
            table_name: table_name.into(),
            table_description: String::new(),
            data_format,
            location: normalize_location(location)?,
            columns: Vec::new(),
            partitions: None,
        })
    }

    /// Drafts metadata for a header row. Types and descriptions come from
    /// `lookup`; unlisted columns become `character` with the placeholder
    /// description.
    pub fn from_header<S: AsRef<str>>(
        table_name: impl Into<String>,
        data_format: DataFormat,
        location: &str,
        header: &[S],
        lookup: &ColumnLookup,
    ) -> Result<Self> {
        let names: Vec<&str> = header.iter().map(|name| name.as_ref().trim()).collect();
        let duplicates: Vec<String> = names
            .iter()
            .duplicates()
            .map(|name| name.to_string())
            .collect();
        if !duplicates.is_empty() {
            return Err(ConformanceError::duplicates("header", duplicates));
        }
        let mut metadata = TableMetadata::new(table_name, data_format, location)?;
        for name in names {
            let column = match lookup.get(name) {
                Some(entry) => {
                    let column = ColumnMeta::new(name, entry.column_type);
                    match &entry.description {
                        Some(description) => column.with_description(description.as_str()),
                        None => column,
                    }
                }
                None => ColumnMeta::new(name, ColumnType::Character),
            };
            metadata.push_column(column)?;
        }
        Ok(metadata)
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn set_id(&mut self, id: Option<String>) {
        self.id = id;
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn set_table_name(&mut self, name: impl Into<String>) {
        self.table_name = name.into();
    }

    pub fn table_description(&self) -> &str {
        &self.table_description
    }

    pub fn set_table_description(&mut self, description: impl Into<String>) {
        self.table_description = description.into();
    }

    pub fn data_format(&self) -> DataFormat {
        self.data_format
    }

    pub fn set_data_format(&mut self, data_format: DataFormat) {
        self.data_format = data_format;
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    /// Sets the location, appending a trailing `/` when absent.
    pub fn set_location(&mut self, location: &str) -> Result<()> {
        self.location = normalize_location(location)?;
        Ok(())
    }

    pub fn columns(&self) -> &[ColumnMeta] {
        &self.columns
    }

    pub fn partitions(&self) -> Option<&[PartitionKey]> {
        self.partitions.as_deref()
    }

    pub fn is_partition(&self, name: &str) -> bool {
        self.partitions
            .as_ref()
            .is_some_and(|keys| keys.iter().any(|k| k.name == name))
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn find_column(&self, name: &str) -> Option<&ColumnMeta> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Columns in canonical order, minus partition keys when requested.
    pub fn effective_columns(&self, exclude_partitions: bool) -> Vec<&ColumnMeta> {
        self.columns
            .iter()
            .filter(|c| !(exclude_partitions && self.is_partition(&c.name)))
            .collect()
    }

    pub fn column_names(&self, exclude_partitions: bool) -> Vec<String> {
        self.effective_columns(exclude_partitions)
            .into_iter()
            .map(|c| c.name.clone())
            .collect()
    }

    pub fn date_column_names(&self, exclude_partitions: bool) -> Vec<String> {
        self.effective_columns(exclude_partitions)
            .into_iter()
            .filter(|c| c.column_type.is_date_like())
            .map(|c| c.name.clone())
            .collect()
    }

    /// A copy with partition columns removed and no partition keys.
    pub fn without_partitions(&self) -> TableMetadata {
        let mut copy = self.clone();
        copy.columns = self
            .effective_columns(true)
            .into_iter()
            .cloned()
            .collect();
        copy.partitions = None;
        copy
    }

    pub fn push_column(&mut self, column: ColumnMeta) -> Result<()> {
        if self.find_column(&column.name).is_some() {
            return Err(ConformanceError::ColumnExists(column.name));
        }
        check_description(&column.name, &column.description)?;
        self.columns.push(column);
        Ok(())
    }

    /// Updates an existing column, or appends a new one (typed `character`
    /// with the placeholder description unless given).
    pub fn update_column(
        &mut self,
        name: &str,
        column_type: Option<&str>,
        description: Option<&str>,
    ) -> Result<()> {
        let column_type = column_type.map(ColumnType::from_str).transpose()?;
        if let Some(description) = description {
            check_description(name, description)?;
        }

        match self.columns.iter_mut().find(|c| c.name == name) {
            Some(column) => {
                if let Some(ty) = column_type {
                    column.column_type = ty;
                }
                if let Some(description) = description {
                    column.description = description.to_string();
                }
                if let (Some(ty), Some(keys)) = (column_type, self.partitions.as_mut()) {
                    for key in keys.iter_mut().filter(|k| k.name == name) {
                        key.column_type = ty;
                    }
                }
            }
            None => {
                let mut column =
                    ColumnMeta::new(name, column_type.unwrap_or(ColumnType::Character));
                if let Some(description) = description {
                    column.description = description.to_string();
                }
                self.columns.push(column);
            }
        }
        Ok(())
    }

    pub fn remove_column(&mut self, name: &str) -> Result<ColumnMeta> {
        let idx = self
            .column_index(name)
            .ok_or_else(|| ConformanceError::ColumnNotFound(name.to_string()))?;
        let removed = self.columns.remove(idx);
        if let Some(keys) = self.partitions.as_mut() {
            keys.retain(|k| k.name != name);
            if keys.is_empty() {
                self.partitions = None;
            }
        }
        Ok(removed)
    }

    pub fn rename_column(&mut self, old_name: &str, new_name: &str) -> Result<()> {
        let idx = self
            .column_index(old_name)
            .ok_or_else(|| ConformanceError::ColumnNotFound(old_name.to_string()))?;
        if self.find_column(new_name).is_some() {
            return Err(ConformanceError::ColumnExists(new_name.to_string()));
        }
        self.columns[idx].name = new_name.to_string();
        if let Some(keys) = self.partitions.as_mut() {
            for key in keys.iter_mut().filter(|k| k.name == old_name) {
                key.name = new_name.to_string();
            }
        }
        Ok(())
    }

    /// Marks columns as partition keys; `None` clears partition metadata.
    /// Every name is validated before anything changes.
    pub fn set_partition_columns(&mut self, columns: Option<&[&str]>) -> Result<()> {
        let Some(names) = columns else {
            self.partitions = None;
            return Ok(());
        };
        let duplicates: Vec<String> = names
            .iter()
            .duplicates()
            .map(|name| name.to_string())
            .collect();
        if !duplicates.is_empty() {
            return Err(ConformanceError::duplicates("partitions", duplicates));
        }
        let keys = names
            .iter()
            .map(|name| {
                self.find_column(name)
                    .map(|column| PartitionKey {
                        name: column.name.clone(),
                        column_type: column.column_type,
                    })
                    .ok_or_else(|| ConformanceError::ColumnNotFound(name.to_string()))
            })
            .collect::<Result<Vec<_>>>()?;
        self.partitions = if keys.is_empty() { None } else { Some(keys) };
        Ok(())
    }

    pub fn from_json_str(input: &str) -> anyhow::Result<Self> {
        serde_json::from_str(input).context("Parsing table metadata JSON")
    }

    pub fn to_json_string(&self) -> anyhow::Result<String> {
        serde_json::to_string_pretty(self).context("Serializing table metadata JSON")
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let file = File::open(path).with_context(|| format!("Opening metadata file {path:?}"))?;
        let reader = BufReader::new(file);
        if is_yaml_path(path) {
            serde_yaml::from_reader(reader).context("Parsing table metadata YAML")
        } else {
            serde_json::from_reader(reader).context("Parsing table metadata JSON")
        }
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let file =
            File::create(path).with_context(|| format!("Creating metadata file {path:?}"))?;
        let mut writer = BufWriter::new(file);
        if is_yaml_path(path) {
            serde_yaml::to_writer(&mut writer, self).context("Writing table metadata YAML")?;
        } else {
            serde_json::to_writer_pretty(&mut writer, self)
                .context("Writing table metadata JSON")?;
        }
        writer.flush().context("Flushing metadata file")
    }
}

pub(crate) fn is_yaml_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("yml") || ext.eq_ignore_ascii_case("yaml"))
}
