//! Error taxonomy for metadata handling and dataset conformance.
//!
//! Library operations return [`ConformanceError`]; the command layer wraps these
//! in `anyhow` with file and row context.

use thiserror::Error;

pub type Result<T, E = ConformanceError> = std::result::Result<T, E>;

/// Coarse classification of a [`ConformanceError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    UnknownType,
    InvalidColumnType,
    InvalidColumnDescription,
    DuplicateColumn,
    ColumnSetMismatch,
    ColumnOrderMismatch,
    TypeMismatch,
    CoercionFailure,
    InvalidMetadata,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConformanceError {
    #[error("Unknown type '{abstract_type}' for target '{target}'")]
    UnknownType {
        abstract_type: String,
        target: String,
    },

    #[error("Type table has no target '{0}'")]
    UnknownTarget(String),

    #[error("Column type '{0}' is not supported. Supported types: {1}")]
    InvalidColumnType(String, String),

    #[error("Description for column '{0}' must be plain text")]
    InvalidColumnDescription(String),

    #[error("Data format '{0}' is not supported. Supported formats: {1}")]
    InvalidDataFormat(String, String),

    #[error("Location must not be empty")]
    InvalidLocation,

    #[error("Duplicate column name(s) in {scope}: {}", .names.join(", "))]
    DuplicateColumn { scope: String, names: Vec<String> },

    #[error("Column '{0}' already exists in metadata")]
    ColumnExists(String),

    #[error("Column '{0}' does not exist in metadata")]
    ColumnNotFound(String),

    #[error(
        "Dataset columns differ from metadata (missing: [{}], unexpected: [{}])",
        .missing.join(", "),
        .extra.join(", ")
    )]
    ColumnSetMismatch {
        missing: Vec<String>,
        extra: Vec<String>,
    },

    #[error("Column(s) missing from dataset and creation is disabled: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("Unexpected column(s) in dataset and dropping is disabled: {}", .0.join(", "))]
    ExtraColumns(Vec<String>),

    #[error(
        "Dataset column order differs from metadata (expected [{}], found [{}])",
        .expected.join(", "),
        .actual.join(", ")
    )]
    ColumnOrderMismatch {
        expected: Vec<String>,
        actual: Vec<String>,
    },

    #[error("Column '{column}' holds {actual} values but metadata expects {expected}")]
    TypeMismatch {
        column: String,
        expected: String,
        actual: String,
    },

    #[error("Failed to coerce column '{column}' to {target}: {reason}")]
    CoercionFailure {
        column: String,
        target: String,
        reason: String,
    },

    #[error("Column '{column}' has {actual} row(s) but dataset has {expected}")]
    LengthMismatch {
        column: String,
        expected: usize,
        actual: usize,
    },
}

impl ConformanceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ConformanceError::UnknownType { .. } | ConformanceError::UnknownTarget(_) => {
                ErrorKind::UnknownType
            }
            ConformanceError::InvalidColumnType(..) => ErrorKind::InvalidColumnType,
            ConformanceError::InvalidColumnDescription(_) => ErrorKind::InvalidColumnDescription,
            ConformanceError::DuplicateColumn { .. } | ConformanceError::ColumnExists(_) => {
                ErrorKind::DuplicateColumn
            }
            ConformanceError::ColumnSetMismatch { .. }
            | ConformanceError::MissingColumns(_)
            | ConformanceError::ExtraColumns(_) => ErrorKind::ColumnSetMismatch,
            ConformanceError::ColumnOrderMismatch { .. } => ErrorKind::ColumnOrderMismatch,
            ConformanceError::TypeMismatch { .. } => ErrorKind::TypeMismatch,
            ConformanceError::CoercionFailure { .. } => ErrorKind::CoercionFailure,
            ConformanceError::InvalidDataFormat(..)
            | ConformanceError::InvalidLocation
            | ConformanceError::ColumnNotFound(_)
            | ConformanceError::LengthMismatch { .. } => ErrorKind::InvalidMetadata,
        }
    }

    pub(crate) fn duplicates(scope: &str, names: Vec<String>) -> Self {
        ConformanceError::DuplicateColumn {
            scope: scope.to_string(),
            names,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_policy_errors_share_the_set_mismatch_kind() {
        let missing = ConformanceError::MissingColumns(vec!["id".into()]);
        let extra = ConformanceError::ExtraColumns(vec!["extra".into()]);
        assert_eq!(missing.kind(), ErrorKind::ColumnSetMismatch);
        assert_eq!(extra.kind(), ErrorKind::ColumnSetMismatch);
        assert!(extra.to_string().contains("extra"));
    }

    #[test]
    fn type_mismatch_message_names_column_and_types() {
        let err = ConformanceError::TypeMismatch {
            column: "amount".into(),
            expected: "float64".into(),
            actual: "string".into(),
        };
        let message = err.to_string();
        assert!(message.contains("amount"));
        assert!(message.contains("float64"));
        assert!(message.contains("string"));
    }
}
