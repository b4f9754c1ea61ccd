//! Read-only conformance predicates.
//!
//! Every `check_*` function returns the failing invariant as an error; its
//! boolean twin reports a mismatch as `false` and only errors when the
//! metadata itself cannot be resolved.

use std::collections::BTreeSet;

use itertools::Itertools;
use log::debug;

use super::Conformance;
use crate::{
    dataset::Dataset,
    error::{ConformanceError, ErrorKind, Result},
    metadata::TableMetadata,
};

fn is_mismatch(err: &ConformanceError) -> bool {
    matches!(
        err.kind(),
        ErrorKind::DuplicateColumn
            | ErrorKind::ColumnSetMismatch
            | ErrorKind::ColumnOrderMismatch
            | ErrorKind::TypeMismatch
    )
}

fn mismatch_as_false(outcome: Result<()>) -> Result<bool> {
    match outcome {
        Ok(()) => Ok(true),
        Err(err) if is_mismatch(&err) => {
            debug!("{err}");
            Ok(false)
        }
        Err(err) => Err(err),
    }
}

impl Conformance<'_> {
    pub fn columns_match(&self, dataset: &Dataset, metadata: &TableMetadata) -> bool {
        self.check_columns_match(dataset, metadata).is_ok()
    }

    /// Order-independent comparison of column names. A column name repeated in
    /// the dataset is reported as a duplicate.
    pub fn check_columns_match(&self, dataset: &Dataset, metadata: &TableMetadata) -> Result<()> {
        let expected = self.expected_names(metadata);
        let observed = self.observed_names(dataset, metadata);
        let duplicated: Vec<String> = observed.iter().duplicates().cloned().collect();
        if !duplicated.is_empty() {
            return Err(ConformanceError::duplicates("dataset", duplicated));
        }
        let expected_set: BTreeSet<&str> = expected.iter().map(String::as_str).collect();
        let observed_set: BTreeSet<&str> = observed.iter().map(String::as_str).collect();

        let missing: Vec<String> = expected
            .iter()
            .filter(|name| !observed_set.contains(name.as_str()))
            .cloned()
            .collect();
        let mut seen = BTreeSet::new();
        let extra: Vec<String> = observed
            .iter()
            .filter(|name| !expected_set.contains(name.as_str()) && seen.insert(name.as_str()))
            .cloned()
            .collect();

        if missing.is_empty() && extra.is_empty() {
            Ok(())
        } else {
            Err(ConformanceError::ColumnSetMismatch { missing, extra })
        }
    }

    pub fn columns_match_ordered(&self, dataset: &Dataset, metadata: &TableMetadata) -> bool {
        self.check_columns_match_ordered(dataset, metadata).is_ok()
    }

    /// Exact sequence comparison; implies [`Self::check_columns_match`].
    pub fn check_columns_match_ordered(
        &self,
        dataset: &Dataset,
        metadata: &TableMetadata,
    ) -> Result<()> {
        let expected = self.expected_names(metadata);
        let actual = self.observed_names(dataset, metadata);
        if expected == actual {
            Ok(())
        } else {
            Err(ConformanceError::ColumnOrderMismatch { expected, actual })
        }
    }

    pub fn types_match(&self, dataset: &Dataset, metadata: &TableMetadata) -> Result<bool> {
        mismatch_as_false(self.check_types_match(dataset, metadata))
    }

    /// Compares runtime types for effective columns present in the dataset.
    /// Set differences are not reported here. Every declared type must resolve,
    /// even for columns the dataset lacks.
    pub fn check_types_match(&self, dataset: &Dataset, metadata: &TableMetadata) -> Result<()> {
        let resolved = metadata
            .effective_columns(self.ignore_partitions)
            .into_iter()
            .map(|meta| -> Result<_> {
                Ok((meta, self.types.expected_value_type(meta.column_type)?))
            })
            .collect::<Result<Vec<_>>>()?;
        for (meta, expected) in resolved {
            let Some(column) = dataset.column(&meta.name) else {
                continue;
            };
            let actual = column.value_type();
            if actual != expected {
                return Err(ConformanceError::TypeMismatch {
                    column: meta.name.clone(),
                    expected: expected.to_string(),
                    actual: actual.to_string(),
                });
            }
        }
        Ok(())
    }

    pub fn exactly_conforms(&self, dataset: &Dataset, metadata: &TableMetadata) -> Result<bool> {
        mismatch_as_false(self.check_exact_conformance(dataset, metadata))
    }

    /// Column set, then column order, then types; stops at the first failure.
    pub fn check_exact_conformance(
        &self,
        dataset: &Dataset,
        metadata: &TableMetadata,
    ) -> Result<()> {
        self.check_columns_match(dataset, metadata)?;
        self.check_columns_match_ordered(dataset, metadata)?;
        self.check_types_match(dataset, metadata)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        dataset::ColumnData,
        metadata::{ColumnMeta, DataFormat},
        types::ColumnType,
    };

    fn metadata() -> TableMetadata {
        let mut metadata =
            TableMetadata::new("people", DataFormat::Csv, "people").expect("valid metadata");
        for (name, ty) in [
            ("id", ColumnType::Int),
            ("name", ColumnType::Character),
            ("joined", ColumnType::Date),
        ] {
            metadata.push_column(ColumnMeta::new(name, ty)).unwrap();
        }
        metadata
    }

    fn dataset(names: &[&str]) -> Dataset {
        Dataset::from_columns(names.iter().map(|name| {
            let data = match *name {
                "id" => ColumnData::Int64(vec![Some(1)]),
                "joined" => ColumnData::DateTime(vec![None]),
                _ => ColumnData::String(vec![Some("x".to_string())]),
            };
            (name.to_string(), data)
        }))
        .unwrap()
    }

    #[test]
    fn swapped_columns_match_as_set_but_not_in_order() {
        let engine = Conformance::default();
        let metadata = metadata();
        let swapped = dataset(&["name", "id", "joined"]);
        assert!(engine.columns_match(&swapped, &metadata));
        assert!(!engine.columns_match_ordered(&swapped, &metadata));
        let err = engine
            .check_exact_conformance(&swapped, &metadata)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ColumnOrderMismatch);
    }

    #[test]
    fn extra_and_missing_columns_are_named() {
        let engine = Conformance::default();
        let err = engine
            .check_columns_match(&dataset(&["id", "name", "extra"]), &metadata())
            .unwrap_err();
        match err {
            ConformanceError::ColumnSetMismatch { missing, extra } => {
                assert_eq!(missing, vec!["joined"]);
                assert_eq!(extra, vec!["extra"]);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn repeated_dataset_column_is_a_duplicate_not_an_order_mismatch() {
        let engine = Conformance::default();
        let metadata = metadata();
        let repeated = dataset(&["id", "name", "joined", "name"]);
        assert!(!engine.columns_match(&repeated, &metadata));
        let err = engine
            .check_exact_conformance(&repeated, &metadata)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DuplicateColumn);
        assert!(err.to_string().contains("name"));
        assert!(!engine.exactly_conforms(&repeated, &metadata).unwrap());
    }

    #[test]
    fn type_mismatch_names_the_column() {
        let engine = Conformance::default();
        let metadata = metadata();
        let mut data = dataset(&["id", "name", "joined"]);
        data.replace_column("joined", ColumnData::String(vec![Some("2024-01-01".into())]))
            .unwrap();
        assert!(!engine.types_match(&data, &metadata).unwrap());
        let err = engine.check_types_match(&data, &metadata).unwrap_err();
        assert!(matches!(
            err,
            ConformanceError::TypeMismatch { ref column, ref expected, .. }
                if column == "joined" && expected == "datetime64"
        ));
        assert!(!engine.exactly_conforms(&data, &metadata).unwrap());
    }

    #[test]
    fn conforming_dataset_passes_every_check() {
        let engine = Conformance::default();
        let data = dataset(&["id", "name", "joined"]);
        assert!(engine.exactly_conforms(&data, &metadata()).unwrap());
    }

    #[test]
    fn ignored_partitions_are_invisible_on_both_sides() {
        let mut metadata = metadata();
        metadata
            .push_column(ColumnMeta::new("year", ColumnType::Int))
            .unwrap();
        metadata.set_partition_columns(Some(&["year"])).unwrap();
        let engine = Conformance::default().ignore_partitions(true);

        let without = dataset(&["id", "name", "joined"]);
        assert!(engine.exactly_conforms(&without, &metadata).unwrap());

        let mut with = without.clone();
        with.push_column("year", ColumnData::String(vec![Some("2024".into())]))
            .unwrap();
        assert!(engine.exactly_conforms(&with, &metadata).unwrap());

        let strict = Conformance::default();
        assert!(!strict.columns_match(&without, &metadata));
    }
}
