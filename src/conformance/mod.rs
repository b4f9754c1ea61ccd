//! Conformance of a [`Dataset`] to [`TableMetadata`].
//!
//! [`Conformance`] binds a type table and a partition policy. The checking
//! half ([`check`]) only reads the dataset; the enforcing half ([`enforce`])
//! mutates it in place. When partitions are ignored, partition-key columns are
//! removed from the metadata side and, for checks, from the dataset side too.
//!
//! ```no_run
//! use meta_conform::conformance::Conformance;
//! # fn demo(dataset: &mut meta_conform::dataset::Dataset,
//! #         metadata: &meta_conform::metadata::TableMetadata) -> meta_conform::error::Result<()> {
//! let engine = Conformance::default().ignore_partitions(true);
//! engine.impose_exact_conformance(dataset, metadata)?;
//! engine.check_exact_conformance(dataset, metadata)?;
//! # Ok(())
//! # }
//! ```

pub mod check;
pub mod enforce;

use crate::{dataset::Dataset, metadata::TableMetadata, types::TypeTranslationTable};

#[derive(Debug, Clone, Copy)]
pub struct Conformance<'t> {
    types: &'t TypeTranslationTable,
    ignore_partitions: bool,
}

impl Default for Conformance<'static> {
    fn default() -> Self {
        Conformance::new(TypeTranslationTable::builtin())
    }
}

impl<'t> Conformance<'t> {
    pub fn new(types: &'t TypeTranslationTable) -> Self {
        Conformance {
            types,
            ignore_partitions: false,
        }
    }

    pub fn ignore_partitions(mut self, ignore: bool) -> Self {
        self.ignore_partitions = ignore;
        self
    }

    pub fn types(&self) -> &'t TypeTranslationTable {
        self.types
    }

    pub fn ignores_partitions(&self) -> bool {
        self.ignore_partitions
    }

    fn expected_names(&self, metadata: &TableMetadata) -> Vec<String> {
        metadata.column_names(self.ignore_partitions)
    }

    /// Dataset column names as the checker sees them.
    fn observed_names(&self, dataset: &Dataset, metadata: &TableMetadata) -> Vec<String> {
        dataset
            .column_names()
            .into_iter()
            .filter(|name| !(self.ignore_partitions && metadata.is_partition(name)))
            .collect()
    }
}

/// What [`Conformance::impose_column_order`] may do about set differences.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ColumnPolicy {
    pub create_missing: bool,
    pub drop_extra: bool,
}

impl ColumnPolicy {
    /// Never create columns, always drop extras.
    pub fn exact() -> Self {
        ColumnPolicy {
            create_missing: false,
            drop_extra: true,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OnError {
    #[default]
    Raise,
    BestEffort,
}

/// Outcome of [`Conformance::impose_data_types`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoercionSummary {
    /// Columns whose runtime type changed.
    pub converted: Vec<String>,
    /// Columns left unchanged because a best-effort cast failed.
    pub skipped: Vec<String>,
    /// Date columns with cells nulled by best-effort parsing, with counts.
    pub unparsed_dates: Vec<(String, usize)>,
}

impl CoercionSummary {
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty() && self.unparsed_dates.is_empty()
    }
}
