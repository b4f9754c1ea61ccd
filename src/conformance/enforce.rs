//! In-place transforms that bring a dataset into conformance.
//!
//! An error leaves the dataset in an unspecified state; discard it and reread.

use itertools::Itertools;
use log::{debug, info, warn};

use super::{CoercionSummary, ColumnPolicy, Conformance, OnError};
use crate::{
    dataset::{ColumnData, Dataset},
    error::{ConformanceError, Result},
    metadata::TableMetadata,
    types::ValueType,
};

impl Conformance<'_> {
    /// Reconciles the column set and reorders to the metadata order.
    ///
    /// Both policies are evaluated before the dataset is touched. Columns
    /// created under `create_missing` are null-filled with the runtime type
    /// their metadata type resolves to.
    pub fn impose_column_order(
        &self,
        dataset: &mut Dataset,
        metadata: &TableMetadata,
        policy: ColumnPolicy,
    ) -> Result<()> {
        let expected = self.expected_names(metadata);
        let actual = dataset.column_names();

        let duplicated: Vec<String> = expected.iter().duplicates().cloned().collect();
        if !duplicated.is_empty() {
            return Err(ConformanceError::duplicates("metadata", duplicated));
        }
        let duplicated: Vec<String> = actual.iter().duplicates().cloned().collect();
        if !duplicated.is_empty() {
            return Err(ConformanceError::duplicates("dataset", duplicated));
        }

        let extra: Vec<String> = actual
            .iter()
            .filter(|name| !expected.contains(name))
            .cloned()
            .collect();
        let missing: Vec<String> = expected
            .iter()
            .filter(|name| !actual.contains(name))
            .cloned()
            .collect();
        if !extra.is_empty() && !policy.drop_extra {
            return Err(ConformanceError::ExtraColumns(extra));
        }
        if !missing.is_empty() && !policy.create_missing {
            return Err(ConformanceError::MissingColumns(missing));
        }

        let created = missing
            .iter()
            .map(|name| -> Result<(&String, ValueType)> {
                let meta = metadata
                    .find_column(name)
                    .ok_or_else(|| ConformanceError::ColumnNotFound(name.clone()))?;
                let value_type = self.types.expected_value_type(meta.column_type)?;
                Ok((name, value_type))
            })
            .collect::<Result<Vec<_>>>()?;

        if !extra.is_empty() {
            info!("Dropping {} unexpected column(s): {}", extra.len(), extra.join(", "));
        }
        for (name, value_type) in created {
            debug!("Creating missing column '{name}' as {value_type}");
            dataset.push_column(name.clone(), ColumnData::nulls(value_type, dataset.row_count()))?;
        }
        dataset.select(&expected)
    }

    /// Coerces every column shared by dataset and metadata to its expected
    /// runtime type.
    ///
    /// Date-like columns are parsed cell by cell; under [`OnError::BestEffort`]
    /// unparseable cells become missing. Other columns are cast as a whole; under
    /// [`OnError::BestEffort`] a failed cast leaves the column as it was.
    pub fn impose_data_types(
        &self,
        dataset: &mut Dataset,
        metadata: &TableMetadata,
        on_error: OnError,
    ) -> Result<CoercionSummary> {
        let lenient = on_error == OnError::BestEffort;
        let mut summary = CoercionSummary::default();

        for meta in metadata.effective_columns(self.ignore_partitions) {
            let expected = self.types.expected_value_type(meta.column_type)?;
            let Some(column) = dataset.column(&meta.name) else {
                continue;
            };
            if column.value_type() == expected {
                continue;
            }
            let actual = column.value_type();

            let coerced = if meta.column_type.is_date_like() {
                column.data.to_datetimes(lenient).map(|(data, failures)| {
                    if failures > 0 {
                        warn!(
                            "Column '{}': {failures} value(s) could not be parsed as dates and were cleared",
                            meta.name
                        );
                        summary.unparsed_dates.push((meta.name.clone(), failures));
                    }
                    data
                })
            } else {
                column.data.cast(expected)
            };

            match coerced {
                Ok(data) => {
                    debug!("Column '{}' converted from {actual} to {expected}", meta.name);
                    dataset.replace_column(&meta.name, data)?;
                    summary.converted.push(meta.name.clone());
                }
                Err(err) if lenient => {
                    warn!(
                        "Column '{}' left as {actual}; cast to {expected} failed: {err:#}",
                        meta.name
                    );
                    summary.skipped.push(meta.name.clone());
                }
                Err(err) => {
                    return Err(ConformanceError::CoercionFailure {
                        column: meta.name.clone(),
                        target: expected.to_string(),
                        reason: format!("{err:#}"),
                    });
                }
            }
        }
        Ok(summary)
    }

    /// Drops extras, refuses missing columns, then casts strictly.
    pub fn impose_exact_conformance(
        &self,
        dataset: &mut Dataset,
        metadata: &TableMetadata,
    ) -> Result<CoercionSummary> {
        self.impose_column_order(dataset, metadata, ColumnPolicy::exact())?;
        self.impose_data_types(dataset, metadata, OnError::Raise)
    }
}
