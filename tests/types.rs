mod common;

use common::fixture_path;
use meta_conform::{
    error::ErrorKind,
    types::{ColumnType, TypeTranslationTable, VALUE_TARGET, ValueType},
};
use proptest::prelude::*;

#[test]
fn builtin_glue_and_spark_types() {
    let table = TypeTranslationTable::builtin();
    let glue: Vec<&str> = ColumnType::all()
        .iter()
        .map(|ty| table.catalog_type(*ty, "glue").unwrap())
        .collect();
    assert_eq!(
        glue,
        vec!["int", "string", "double", "date", "timestamp", "boolean", "bigint"]
    );
    assert_eq!(
        table.catalog_type(ColumnType::DateTime, "spark").unwrap(),
        "TimestampType"
    );
    assert_eq!(table.value_type(ColumnType::Long).unwrap(), ValueType::Int64);
}

#[test]
fn custom_table_loads_from_csv_file() {
    let table = TypeTranslationTable::load(&fixture_path("type_table.csv")).unwrap();
    assert_eq!(table.dialects().collect::<Vec<_>>(), vec!["glue", "hive"]);
    assert_eq!(table.resolve("long", "hive").unwrap(), "BIGINT");
    let err = table.resolve("long", "spark").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnknownType);
}

#[test]
fn custom_table_requires_metadata_header() {
    let err = TypeTranslationTable::from_reader("kind,value\nint,int64\n".as_bytes()).unwrap_err();
    assert!(err.to_string().contains("metadata"));
}

proptest! {
    #[test]
    fn resolution_is_total_and_deterministic(
        ty in prop::sample::select(ColumnType::all().to_vec()),
        target in prop::sample::select(vec![VALUE_TARGET, "glue", "spark"])
    ) {
        let table = TypeTranslationTable::builtin();
        let first = table.resolve(ty.as_str(), target).expect("builtin covers every type");
        let second = table.resolve(ty.as_str(), target).expect("builtin covers every type");
        prop_assert_eq!(first, second);
    }

    #[test]
    fn unknown_types_fail_for_every_target(
        token in "[a-z]{3,10}",
        target in prop::sample::select(vec![VALUE_TARGET, "glue", "spark"])
    ) {
        prop_assume!(token.parse::<ColumnType>().is_err());
        let err = TypeTranslationTable::builtin().resolve(&token, target).unwrap_err();
        prop_assert_eq!(err.kind(), ErrorKind::UnknownType);
    }
}
