#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use meta_conform::dataset::{ColumnData, Dataset};
use meta_conform::metadata::{ColumnMeta, DataFormat, TableMetadata};
use meta_conform::types::ColumnType;
use tempfile::{TempDir, tempdir};

/// Returns the absolute path to a fixture under `tests/data`.
pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("data")
        .join(name)
}

/// `[id:int, name:character, joined:date]`, stored as CSV under `people/`.
pub fn people_metadata() -> TableMetadata {
    let mut metadata =
        TableMetadata::new("people", DataFormat::Csv, "people").expect("valid metadata");
    for (name, ty) in [
        ("id", ColumnType::Int),
        ("name", ColumnType::Character),
        ("joined", ColumnType::Date),
    ] {
        metadata
            .push_column(ColumnMeta::new(name, ty))
            .expect("unique column");
    }
    metadata
}

pub fn text_column(values: &[&str]) -> ColumnData {
    ColumnData::String(values.iter().map(|v| Some(v.to_string())).collect())
}

/// A dataset of text columns, as a raw CSV read would produce.
pub fn text_dataset(columns: &[(&str, &[&str])]) -> Dataset {
    Dataset::from_columns(
        columns
            .iter()
            .map(|(name, values)| (name.to_string(), text_column(values))),
    )
    .expect("consistent column lengths")
}

/// Scratch directory helper that cleans up files automatically on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes `contents` into a file under the workspace and returns the path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        fs::write(&path, contents).expect("write temp file contents");
        path
    }

    /// Copies a fixture into the workspace so tests may modify it.
    pub fn copy_fixture(&self, name: &str) -> PathBuf {
        let target = self.temp_dir.path().join(name);
        fs::copy(fixture_path(name), &target).expect("copy fixture");
        target
    }

    pub fn read(&self, path: &Path) -> String {
        fs::read_to_string(path).expect("read workspace file")
    }
}
