//! Catalog payloads built from metadata, and the client seam that sends them.
//!
//! [`TableDefinition`] mirrors the Glue `TableInput` shape. Partition columns
//! are taken out of the storage descriptor's column list and re-emitted as
//! `PartitionKeys`. Registration goes through an injected [`CatalogClient`];
//! [`InMemoryCatalog`] is the local implementation.

use std::{
    collections::BTreeMap,
    ffi::OsStr,
    fs::{self, File},
    io::BufReader,
    path::Path,
};

use anyhow::{Context, Result, anyhow, bail};
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::{
    metadata::{DataFormat, TableMetadata},
    types::TypeTranslationTable,
};

pub const DEFAULT_DIALECT: &str = "glue";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CatalogColumn {
    pub name: String,
    #[serde(rename = "Type")]
    pub column_type: String,
    pub comment: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PartitionKeySpec {
    pub name: String,
    #[serde(rename = "Type")]
    pub column_type: String,
}

/// Column specs in metadata order, typed for `dialect`.
pub fn catalog_columns(
    metadata: &TableMetadata,
    types: &TypeTranslationTable,
    dialect: &str,
    exclude_partitions: bool,
) -> crate::error::Result<Vec<CatalogColumn>> {
    metadata
        .effective_columns(exclude_partitions)
        .into_iter()
        .map(|column| -> crate::error::Result<CatalogColumn> {
            Ok(CatalogColumn {
                name: column.name.clone(),
                column_type: types.catalog_type(column.column_type, dialect)?.to_string(),
                comment: column.description.clone(),
            })
        })
        .collect()
}

pub fn partition_keys(
    metadata: &TableMetadata,
    types: &TypeTranslationTable,
    dialect: &str,
) -> crate::error::Result<Vec<PartitionKeySpec>> {
    metadata
        .partitions()
        .unwrap_or_default()
        .iter()
        .map(|key| -> crate::error::Result<PartitionKeySpec> {
            Ok(PartitionKeySpec {
                name: key.name.clone(),
                column_type: types.catalog_type(key.column_type, dialect)?.to_string(),
            })
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SerDeInfo {
    pub serialization_library: String,
    pub parameters: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct StorageDescriptor {
    pub columns: Vec<CatalogColumn>,
    pub location: String,
    pub input_format: String,
    pub output_format: String,
    pub compressed: bool,
    pub number_of_buckets: i32,
    pub serde_info: SerDeInfo,
    pub stored_as_sub_directories: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct TableDefinition {
    pub name: String,
    pub description: String,
    pub table_type: String,
    pub parameters: BTreeMap<String, String>,
    pub storage_descriptor: StorageDescriptor,
    pub partition_keys: Vec<PartitionKeySpec>,
}

struct StorageTemplate {
    classification: &'static str,
    input_format: &'static str,
    output_format: &'static str,
    serde: &'static str,
    serde_parameters: &'static [(&'static str, &'static str)],
}

const TEXT_INPUT: &str = "org.apache.hadoop.mapred.TextInputFormat";
const TEXT_OUTPUT: &str = "org.apache.hadoop.hive.ql.io.HiveIgnoreKeyTextOutputFormat";

fn storage_template(format: DataFormat) -> StorageTemplate {
    match format {
        DataFormat::Csv => StorageTemplate {
            classification: "csv",
            input_format: TEXT_INPUT,
            output_format: TEXT_OUTPUT,
            serde: "org.apache.hadoop.hive.serde2.lazy.LazySimpleSerDe",
            serde_parameters: &[("field.delim", ","), ("serialization.format", ",")],
        },
        DataFormat::CsvQuotedNodate => StorageTemplate {
            classification: "csv",
            input_format: TEXT_INPUT,
            output_format: TEXT_OUTPUT,
            serde: "org.apache.hadoop.hive.serde2.OpenCSVSerde",
            serde_parameters: &[
                ("escapeChar", "\\"),
                ("quoteChar", "\""),
                ("separatorChar", ","),
            ],
        },
        DataFormat::Regex => StorageTemplate {
            classification: "regex",
            input_format: TEXT_INPUT,
            output_format: TEXT_OUTPUT,
            serde: "org.apache.hadoop.hive.serde2.RegexSerDe",
            serde_parameters: &[],
        },
        DataFormat::Avro => StorageTemplate {
            classification: "avro",
            input_format: "org.apache.hadoop.hive.ql.io.avro.AvroContainerInputFormat",
            output_format: "org.apache.hadoop.hive.ql.io.avro.AvroContainerOutputFormat",
            serde: "org.apache.hadoop.hive.serde2.avro.AvroSerDe",
            serde_parameters: &[],
        },
        DataFormat::Orc => StorageTemplate {
            classification: "orc",
            input_format: "org.apache.hadoop.hive.ql.io.orc.OrcInputFormat",
            output_format: "org.apache.hadoop.hive.ql.io.orc.OrcOutputFormat",
            serde: "org.apache.hadoop.hive.ql.io.orc.OrcSerde",
            serde_parameters: &[],
        },
        DataFormat::Par | DataFormat::Parquet => StorageTemplate {
            classification: "parquet",
            input_format: "org.apache.hadoop.hive.ql.io.parquet.MapredParquetInputFormat",
            output_format: "org.apache.hadoop.hive.ql.io.parquet.MapredParquetOutputFormat",
            serde: "org.apache.hadoop.hive.ql.io.parquet.serde.ParquetHiveSerDe",
            serde_parameters: &[("serialization.format", "1")],
        },
    }
}

fn string_map(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Joins a table location onto a database location. Absolute table locations
/// (a leading `/` or a URL scheme) are used as they are.
pub fn join_location(base: &str, relative: &str) -> String {
    if relative.starts_with('/') || relative.contains("://") || base.is_empty() {
        return relative.to_string();
    }
    format!("{}/{relative}", base.trim_end_matches('/'))
}

impl TableDefinition {
    pub fn from_metadata(
        table: &TableMetadata,
        database: &DatabaseMetadata,
        types: &TypeTranslationTable,
    ) -> crate::error::Result<Self> {
        Self::for_dialect(table, database, types, DEFAULT_DIALECT)
    }

    /// Like [`Self::from_metadata`] with column types resolved for `dialect`.
    pub fn for_dialect(
        table: &TableMetadata,
        database: &DatabaseMetadata,
        types: &TypeTranslationTable,
        dialect: &str,
    ) -> crate::error::Result<Self> {
        let template = storage_template(table.data_format());
        let columns = catalog_columns(table, types, dialect, true)?;
        let partition_keys = partition_keys(table, types, dialect)?;
        Ok(TableDefinition {
            name: table.table_name().to_string(),
            description: table.table_description().to_string(),
            table_type: "EXTERNAL_TABLE".to_string(),
            parameters: string_map(&[("classification", template.classification)]),
            storage_descriptor: StorageDescriptor {
                columns,
                location: join_location(&database.location, table.location()),
                input_format: template.input_format.to_string(),
                output_format: template.output_format.to_string(),
                compressed: false,
                number_of_buckets: -1,
                serde_info: SerDeInfo {
                    serialization_library: template.serde.to_string(),
                    parameters: string_map(template.serde_parameters),
                },
                stored_as_sub_directories: false,
            },
            partition_keys,
        })
    }

    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Serializing table definition")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseMetadata {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub location: String,
}

impl DatabaseMetadata {
    pub fn load(path: &Path) -> Result<Self> {
        let file =
            File::open(path).with_context(|| format!("Opening database metadata {path:?}"))?;
        serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("Parsing database metadata {path:?}"))
    }

    /// Appends `_<suffix>` to the database name and location.
    pub fn with_suffix(&self, suffix: &str) -> Self {
        let addition = format!("_{suffix}");
        DatabaseMetadata {
            name: format!("{}{addition}", self.name),
            description: self.description.clone(),
            location: format!("{}{addition}", self.location.trim_end_matches('/')),
        }
    }
}

/// A folder holding `database.json` and one metadata JSON per table.
#[derive(Debug, Clone, PartialEq)]
pub struct DatabaseBundle {
    pub database: DatabaseMetadata,
    pub tables: Vec<TableMetadata>,
}

impl DatabaseBundle {
    pub fn load_dir(folder: &Path, suffix: Option<&str>) -> Result<Self> {
        let database_path = folder.join("database.json");
        if !database_path.is_file() {
            bail!("database.json not found in metadata folder {folder:?}");
        }
        let mut database = DatabaseMetadata::load(&database_path)?;
        if let Some(suffix) = suffix.filter(|s| !s.is_empty()) {
            database = database.with_suffix(suffix);
        }

        let mut table_paths = Vec::new();
        for entry in
            fs::read_dir(folder).with_context(|| format!("Listing metadata folder {folder:?}"))?
        {
            let path = entry?.path();
            let is_json = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
            if is_json && path.file_name() != Some(OsStr::new("database.json")) {
                table_paths.push(path);
            }
        }
        table_paths.sort();

        let tables = table_paths
            .iter()
            .map(|path| {
                TableMetadata::load(path).with_context(|| format!("Loading table metadata {path:?}"))
            })
            .collect::<Result<Vec<_>>>()?;
        debug!(
            "Loaded {} table(s) for database '{}'",
            tables.len(),
            database.name
        );
        Ok(DatabaseBundle { database, tables })
    }
}

/// Remote catalog operations the registration helpers depend on.
pub trait CatalogClient {
    /// Creates the database, or recreates it empty when `replace` is set.
    /// An existing database is kept as is otherwise.
    fn ensure_database(&mut self, database: &DatabaseMetadata, replace: bool) -> Result<()>;

    /// Removes the table if present; returns whether anything was removed.
    fn ensure_table_absent(&mut self, database: &str, table: &str) -> Result<bool>;

    fn create_table(&mut self, database: &str, definition: &TableDefinition) -> Result<()>;
}

/// Registers one table, replacing any previous definition.
pub fn register_table(
    client: &mut dyn CatalogClient,
    table: &TableMetadata,
    database: &DatabaseMetadata,
    types: &TypeTranslationTable,
) -> Result<TableDefinition> {
    let definition = TableDefinition::from_metadata(table, database, types)?;
    client.ensure_database(database, false)?;
    if client.ensure_table_absent(&database.name, &definition.name)? {
        debug!("Replaced existing table {}.{}", database.name, definition.name);
    }
    client.create_table(&database.name, &definition)?;
    info!("Registered table {}.{}", database.name, definition.name);
    Ok(definition)
}

/// Recreates the database and registers every table in the bundle.
pub fn register_database(
    client: &mut dyn CatalogClient,
    bundle: &DatabaseBundle,
    types: &TypeTranslationTable,
) -> Result<Vec<TableDefinition>> {
    let definitions = bundle
        .tables
        .iter()
        .map(|table| TableDefinition::from_metadata(table, &bundle.database, types))
        .collect::<crate::error::Result<Vec<_>>>()?;
    client.ensure_database(&bundle.database, true)?;
    for definition in &definitions {
        client.create_table(&bundle.database.name, definition)?;
    }
    info!(
        "Registered database '{}' with {} table(s)",
        bundle.database.name,
        definitions.len()
    );
    Ok(definitions)
}

#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    databases: BTreeMap<String, (DatabaseMetadata, BTreeMap<String, TableDefinition>)>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        InMemoryCatalog::default()
    }

    pub fn database(&self, name: &str) -> Option<&DatabaseMetadata> {
        self.databases.get(name).map(|(db, _)| db)
    }

    pub fn table(&self, database: &str, table: &str) -> Option<&TableDefinition> {
        self.databases
            .get(database)
            .and_then(|(_, tables)| tables.get(table))
    }

    pub fn table_names(&self, database: &str) -> Vec<&str> {
        self.databases
            .get(database)
            .map(|(_, tables)| tables.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }
}

impl CatalogClient for InMemoryCatalog {
    fn ensure_database(&mut self, database: &DatabaseMetadata, replace: bool) -> Result<()> {
        if replace || !self.databases.contains_key(&database.name) {
            self.databases
                .insert(database.name.clone(), (database.clone(), BTreeMap::new()));
        }
        Ok(())
    }

    fn ensure_table_absent(&mut self, database: &str, table: &str) -> Result<bool> {
        Ok(self
            .databases
            .get_mut(database)
            .is_some_and(|(_, tables)| tables.remove(table).is_some()))
    }

    fn create_table(&mut self, database: &str, definition: &TableDefinition) -> Result<()> {
        let (_, tables) = self
            .databases
            .get_mut(database)
            .ok_or_else(|| anyhow!("Database '{database}' does not exist"))?;
        if tables.contains_key(&definition.name) {
            bail!("Table '{database}.{}' already exists", definition.name);
        }
        tables.insert(definition.name.clone(), definition.clone());
        Ok(())
    }
}
