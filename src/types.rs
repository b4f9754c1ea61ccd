//! Abstract column types and their translation into runtime and catalog types.
//!
//! Metadata declares columns with a storage-agnostic [`ColumnType`]. The
//! [`TypeTranslationTable`] resolves each abstract type to a concrete token for
//! a target system: `value` for in-memory [`ValueType`]s, or a catalog dialect
//! such as `glue` or `spark`. Lookups never fall back to a default; a missing
//! row or target is an [`ConformanceError::UnknownType`] error.
//!
//! The built-in table is static data shared by every caller. Custom tables load
//! from CSV with a `metadata,value,<dialect>...` header.

use std::{
    collections::BTreeMap,
    fmt,
    fs::File,
    io::{BufReader, Read},
    path::Path,
    str::FromStr,
    sync::OnceLock,
};

use anyhow::{Context, anyhow, bail, ensure};
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

use crate::error::{ConformanceError, Result};

/// Target name for the in-memory value system.
pub const VALUE_TARGET: &str = "value";

const BUILTIN_TARGETS: &[&str] = &[VALUE_TARGET, "glue", "spark"];

const BUILTIN_ROWS: &[(ColumnType, [&str; 3])] = &[
    (ColumnType::Int, ["int64", "int", "IntegerType"]),
    (ColumnType::Character, ["string", "string", "StringType"]),
    (ColumnType::Float, ["float64", "double", "DoubleType"]),
    (ColumnType::Date, ["string", "date", "DateType"]),
    (ColumnType::DateTime, ["datetime64", "timestamp", "TimestampType"]),
    (ColumnType::Boolean, ["bool", "boolean", "BooleanType"]),
    (ColumnType::Long, ["int64", "bigint", "LongType"]),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ColumnType {
    Int,
    Character,
    Float,
    Date,
    DateTime,
    Boolean,
    Long,
}

impl ColumnType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnType::Int => "int",
            ColumnType::Character => "character",
            ColumnType::Float => "float",
            ColumnType::Date => "date",
            ColumnType::DateTime => "datetime",
            ColumnType::Boolean => "boolean",
            ColumnType::Long => "long",
        }
    }

    pub fn variants() -> &'static [&'static str] {
        &[
            "int",
            "character",
            "float",
            "date",
            "datetime",
            "boolean",
            "long",
        ]
    }

    pub fn all() -> &'static [ColumnType] {
        &[
            ColumnType::Int,
            ColumnType::Character,
            ColumnType::Float,
            ColumnType::Date,
            ColumnType::DateTime,
            ColumnType::Boolean,
            ColumnType::Long,
        ]
    }

    /// Date and datetime columns share one runtime representation.
    pub fn is_date_like(&self) -> bool {
        matches!(self, ColumnType::Date | ColumnType::DateTime)
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ColumnType {
    type Err = ConformanceError;

    fn from_str(value: &str) -> Result<Self> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "int" | "integer" => Ok(ColumnType::Int),
            "character" | "string" | "str" => Ok(ColumnType::Character),
            "float" | "double" => Ok(ColumnType::Float),
            "date" => Ok(ColumnType::Date),
            "datetime" | "timestamp" => Ok(ColumnType::DateTime),
            "boolean" | "bool" => Ok(ColumnType::Boolean),
            "long" | "bigint" => Ok(ColumnType::Long),
            _ => Err(ConformanceError::InvalidColumnType(
                value.to_string(),
                ColumnType::variants().join(", "),
            )),
        }
    }
}

impl Serialize for ColumnType {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ColumnType {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let token = String::deserialize(deserializer)?;
        ColumnType::from_str(&token).map_err(de::Error::custom)
    }
}

/// Runtime type of a dataset column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    Int64,
    Float64,
    String,
    Boolean,
    DateTime,
}

impl ValueType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueType::Int64 => "int64",
            ValueType::Float64 => "float64",
            ValueType::String => "string",
            ValueType::Boolean => "bool",
            ValueType::DateTime => "datetime64",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ValueType {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> anyhow::Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "int64" => Ok(ValueType::Int64),
            "float64" => Ok(ValueType::Float64),
            "string" | "object" => Ok(ValueType::String),
            "bool" | "boolean" => Ok(ValueType::Boolean),
            "datetime64" | "datetime" => Ok(ValueType::DateTime),
            other => Err(anyhow!("Unknown value type '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeTranslationTable {
    targets: Vec<String>,
    rows: BTreeMap<ColumnType, Vec<String>>,
}

static BUILTIN: OnceLock<TypeTranslationTable> = OnceLock::new();

impl TypeTranslationTable {
    /// The bundled table covering every [`ColumnType`].
    pub fn builtin() -> &'static TypeTranslationTable {
        BUILTIN.get_or_init(|| {
            let targets = BUILTIN_TARGETS.iter().map(|t| t.to_string()).collect();
            let rows = BUILTIN_ROWS
                .iter()
                .map(|(ty, concrete)| (*ty, concrete.iter().map(|c| c.to_string()).collect()))
                .collect();
            TypeTranslationTable { targets, rows }
        })
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let file =
            File::open(path).with_context(|| format!("Opening type table {path:?}"))?;
        Self::from_reader(BufReader::new(file))
            .with_context(|| format!("Parsing type table {path:?}"))
    }

    pub fn from_reader<R: Read>(reader: R) -> anyhow::Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);
        let headers = reader.headers()?.clone();
        ensure!(
            headers.get(0) == Some("metadata"),
            "Type table must start with a 'metadata' column"
        );
        let targets: Vec<String> = headers.iter().skip(1).map(|h| h.to_string()).collect();
        ensure!(!targets.is_empty(), "Type table defines no targets");
        let value_idx = targets.iter().position(|t| t == VALUE_TARGET);

        let mut rows = BTreeMap::new();
        for (idx, record) in reader.records().enumerate() {
            let record = record.with_context(|| format!("Reading type table row {}", idx + 2))?;
            let token = record.get(0).unwrap_or_default();
            let ty = ColumnType::from_str(token)
                .with_context(|| format!("Type table row {}", idx + 2))?;
            let concrete: Vec<String> = record.iter().skip(1).map(|v| v.to_string()).collect();
            ensure!(
                concrete.len() == targets.len(),
                "Type table row {} has {} value(s) but {} target(s)",
                idx + 2,
                concrete.len(),
                targets.len()
            );
            if let Some(value_idx) = value_idx {
                ValueType::from_str(&concrete[value_idx])
                    .with_context(|| format!("Type table row {} for '{ty}'", idx + 2))?;
            }
            if rows.insert(ty, concrete).is_some() {
                bail!("Type table lists '{ty}' more than once");
            }
        }
        Ok(TypeTranslationTable { targets, rows })
    }

    pub fn targets(&self) -> &[String] {
        &self.targets
    }

    /// Catalog dialects, i.e. every target except the value system.
    pub fn dialects(&self) -> impl Iterator<Item = &str> {
        self.targets
            .iter()
            .map(String::as_str)
            .filter(|t| *t != VALUE_TARGET)
    }

    pub fn resolve(&self, abstract_type: &str, target: &str) -> Result<&str> {
        let unknown = || ConformanceError::UnknownType {
            abstract_type: abstract_type.to_string(),
            target: target.to_string(),
        };
        let ty = ColumnType::from_str(abstract_type).map_err(|_| unknown())?;
        self.resolve_type(ty, target)
    }

    pub fn resolve_type(&self, ty: ColumnType, target: &str) -> Result<&str> {
        let idx = self
            .targets
            .iter()
            .position(|t| t == target)
            .ok_or_else(|| ConformanceError::UnknownTarget(target.to_string()))?;
        self.rows
            .get(&ty)
            .and_then(|row| row.get(idx))
            .map(String::as_str)
            .ok_or_else(|| ConformanceError::UnknownType {
                abstract_type: ty.to_string(),
                target: target.to_string(),
            })
    }

    /// Runtime type listed for `ty` in the value system.
    pub fn value_type(&self, ty: ColumnType) -> Result<ValueType> {
        let token = self.resolve_type(ty, VALUE_TARGET)?;
        ValueType::from_str(token).map_err(|_| ConformanceError::UnknownType {
            abstract_type: ty.to_string(),
            target: format!("{VALUE_TARGET} ({token})"),
        })
    }

    /// Runtime type a conformant dataset holds for `ty`. Date-like columns
    /// always expect datetimes whatever the value system lists for them.
    pub fn expected_value_type(&self, ty: ColumnType) -> Result<ValueType> {
        let listed = self.value_type(ty)?;
        if ty.is_date_like() {
            Ok(ValueType::DateTime)
        } else {
            Ok(listed)
        }
    }

    pub fn catalog_type(&self, ty: ColumnType, dialect: &str) -> Result<&str> {
        self.resolve_type(ty, dialect)
    }
}
