//! Typed reading and writing of datasets.
//!
//! The conformance engine never touches files. Commands go through a
//! [`TabularIo`] provider, handing it a [`ReadSpec`] derived from metadata so
//! the provider knows which runtime type each column should be read as.

use std::{collections::BTreeMap, path::Path};

use anyhow::{Context, Result};
use encoding_rs::{Encoding, UTF_8};
use log::debug;

use crate::{
    dataset::{ColumnData, Dataset, parse_cell},
    io_utils,
    metadata::TableMetadata,
    types::{TypeTranslationTable, ValueType},
};

/// Runtime types to read columns as. Unlisted columns are read as text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadSpec {
    column_types: BTreeMap<String, ValueType>,
    date_columns: Vec<String>,
}

impl ReadSpec {
    /// Everything as text.
    pub fn raw() -> Self {
        ReadSpec::default()
    }

    pub fn from_metadata(
        metadata: &TableMetadata,
        types: &TypeTranslationTable,
        exclude_partitions: bool,
    ) -> crate::error::Result<Self> {
        let mut spec = ReadSpec::default();
        for column in metadata.effective_columns(exclude_partitions) {
            if column.column_type.is_date_like() {
                spec.date_columns.push(column.name.clone());
            }
            let value_type = types.expected_value_type(column.column_type)?;
            spec.column_types.insert(column.name.clone(), value_type);
        }
        Ok(spec)
    }

    pub fn with_column(mut self, name: impl Into<String>, value_type: ValueType) -> Self {
        self.column_types.insert(name.into(), value_type);
        self
    }

    pub fn column_type(&self, name: &str) -> ValueType {
        self.column_types
            .get(name)
            .copied()
            .unwrap_or(ValueType::String)
    }

    pub fn date_columns(&self) -> &[String] {
        &self.date_columns
    }
}

pub trait TabularIo {
    fn read_typed(&self, source: &Path, spec: &ReadSpec) -> Result<Dataset>;

    fn write(&self, dataset: &Dataset, destination: &Path) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct CsvIo {
    delimiter: Option<u8>,
    output_delimiter: Option<u8>,
    has_headers: bool,
    input_encoding: &'static Encoding,
    output_encoding: &'static Encoding,
}

impl Default for CsvIo {
    fn default() -> Self {
        CsvIo {
            delimiter: None,
            output_delimiter: None,
            has_headers: true,
            input_encoding: UTF_8,
            output_encoding: UTF_8,
        }
    }
}

impl CsvIo {
    pub fn new() -> Self {
        CsvIo::default()
    }

    pub fn with_delimiter(mut self, delimiter: Option<u8>) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Output delimiter; falls back to the input delimiter, then the extension.
    pub fn with_output_delimiter(mut self, delimiter: Option<u8>) -> Self {
        self.output_delimiter = delimiter;
        self
    }

    pub fn with_headers(mut self, has_headers: bool) -> Self {
        self.has_headers = has_headers;
        self
    }

    pub fn with_input_encoding(mut self, encoding: &'static Encoding) -> Self {
        self.input_encoding = encoding;
        self
    }

    pub fn with_output_encoding(mut self, encoding: &'static Encoding) -> Self {
        self.output_encoding = encoding;
        self
    }
}

impl TabularIo for CsvIo {
    fn read_typed(&self, source: &Path, spec: &ReadSpec) -> Result<Dataset> {
        let delimiter = io_utils::resolve_input_delimiter(source, self.delimiter);
        let mut reader = io_utils::open_csv_reader_from_path(source, delimiter, self.has_headers)?;
        let mut headers = if self.has_headers {
            let record = reader
                .byte_headers()
                .with_context(|| format!("Reading headers from {source:?}"))?
                .clone();
            io_utils::decode_record(&record, self.input_encoding)?
        } else {
            Vec::new()
        };

        let mut cells: Vec<Vec<String>> = vec![Vec::new(); headers.len()];
        let mut rows = 0usize;
        for (row_idx, record) in reader.byte_records().enumerate() {
            let record =
                record.with_context(|| format!("Reading row {} in {source:?}", row_idx + 1))?;
            let decoded = io_utils::decode_record(&record, self.input_encoding)
                .with_context(|| format!("Decoding row {} in {source:?}", row_idx + 1))?;
            if !self.has_headers && headers.is_empty() {
                headers = (1..=decoded.len()).map(|n| format!("column_{n}")).collect();
                cells = vec![Vec::new(); headers.len()];
            }
            for (column, value) in cells.iter_mut().zip(decoded) {
                column.push(value);
            }
            rows += 1;
        }

        let mut dataset = Dataset::new(rows);
        for (name, raw) in headers.into_iter().zip(cells) {
            let value_type = spec.column_type(&name);
            let values = raw
                .iter()
                .enumerate()
                .map(|(row_idx, value)| {
                    parse_cell(value, value_type)
                        .with_context(|| format!("Row {} column '{name}'", row_idx + 1))
                })
                .collect::<Result<Vec<_>>>()
                .with_context(|| format!("Reading {source:?}"))?;
            let data = ColumnData::from_values(value_type, values)?;
            dataset.push_column(name, data)?;
        }
        debug!(
            "Read {} row(s) and {} column(s) from {source:?}",
            dataset.row_count(),
            dataset.column_count()
        );
        Ok(dataset)
    }

    fn write(&self, dataset: &Dataset, destination: &Path) -> Result<()> {
        let input_delimiter = self.delimiter.unwrap_or(io_utils::DEFAULT_CSV_DELIMITER);
        let delimiter =
            io_utils::resolve_output_delimiter(destination, self.output_delimiter, input_delimiter);
        let mut writer = io_utils::open_csv_writer(destination, delimiter, self.output_encoding)?;
        if self.has_headers {
            writer
                .write_record(dataset.column_names())
                .with_context(|| format!("Writing headers to {destination:?}"))?;
        }
        for idx in 0..dataset.row_count() {
            let record: Vec<String> = dataset
                .row(idx)
                .into_iter()
                .map(|value| value.map(|v| v.as_display()).unwrap_or_default())
                .collect();
            writer
                .write_record(&record)
                .with_context(|| format!("Writing row {} to {destination:?}", idx + 1))?;
        }
        writer
            .flush()
            .with_context(|| format!("Flushing {destination:?}"))
    }
}
