mod common;

use common::{people_metadata, text_dataset};
use meta_conform::{
    conformance::{ColumnPolicy, Conformance, OnError},
    dataset::ColumnData,
    error::{ConformanceError, ErrorKind},
    metadata::{ColumnMeta, TableMetadata},
    types::ColumnType,
};
use proptest::prelude::*;

#[test]
fn extra_column_fails_set_check_and_is_dropped_in_order() {
    let engine = Conformance::default();
    let metadata = people_metadata();
    let mut dataset = text_dataset(&[
        ("name", &["Ann"]),
        ("id", &["1"]),
        ("joined", &["2024-01-02"]),
        ("extra", &["?"]),
    ]);

    assert!(!engine.columns_match(&dataset, &metadata));
    let policy = ColumnPolicy {
        create_missing: false,
        drop_extra: true,
    };
    engine
        .impose_column_order(&mut dataset, &metadata, policy)
        .expect("extras dropped");
    assert_eq!(dataset.column_names(), vec!["id", "name", "joined"]);

    let once = dataset.clone();
    engine
        .impose_column_order(&mut dataset, &metadata, policy)
        .expect("second pass");
    assert_eq!(dataset, once);
}

#[test]
fn float_column_of_strings_is_a_type_mismatch_until_cast() {
    let engine = Conformance::default();
    let mut metadata = people_metadata();
    metadata
        .push_column(ColumnMeta::new("amount", ColumnType::Float))
        .unwrap();
    let mut dataset = text_dataset(&[("amount", &["10", "2.25"])]);

    assert!(!engine.types_match(&dataset, &metadata).unwrap());
    match engine.check_types_match(&dataset, &metadata) {
        Err(ConformanceError::TypeMismatch { column, .. }) => assert_eq!(column, "amount"),
        other => panic!("expected type mismatch, got {other:?}"),
    }

    engine
        .impose_data_types(&mut dataset, &metadata, OnError::Raise)
        .expect("numeric strings cast");
    assert_eq!(
        dataset.column("amount").unwrap().data,
        ColumnData::Float64(vec![Some(10.0), Some(2.25)])
    );

    let mut bad = text_dataset(&[("amount", &["10", "ten"])]);
    let err = engine
        .impose_data_types(&mut bad, &metadata, OnError::Raise)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CoercionFailure);
}

#[test]
fn ignored_partitions_do_not_count_either_way() {
    let mut metadata = people_metadata();
    metadata
        .push_column(ColumnMeta::new("year", ColumnType::Int))
        .unwrap();
    metadata.set_partition_columns(Some(&["year"])).unwrap();
    assert_eq!(metadata.column_names(true), vec!["id", "name", "joined"]);

    let engine = Conformance::default().ignore_partitions(true);
    let without = text_dataset(&[
        ("id", &["1"]),
        ("name", &["Ann"]),
        ("joined", &["2024-01-02"]),
    ]);
    let with = text_dataset(&[
        ("id", &["1"]),
        ("name", &["Ann"]),
        ("joined", &["2024-01-02"]),
        ("year", &["2024"]),
    ]);
    assert!(engine.columns_match_ordered(&without, &metadata));
    assert!(engine.columns_match_ordered(&with, &metadata));
    assert!(!Conformance::default().columns_match(&without, &metadata));
}

#[test]
fn missing_column_is_refused_by_exact_conformance() {
    let engine = Conformance::default();
    let mut dataset = text_dataset(&[("id", &["1"]), ("name", &["Ann"])]);
    let err = engine
        .impose_exact_conformance(&mut dataset, &people_metadata())
        .unwrap_err();
    assert!(matches!(err, ConformanceError::MissingColumns(ref names) if names == &["joined"]));
    assert_eq!(err.kind(), ErrorKind::ColumnSetMismatch);
}

#[test]
fn custom_type_table_without_a_row_fails_resolution() {
    let table = meta_conform::types::TypeTranslationTable::from_reader(
        "metadata,value\nint,int64\ncharacter,string\n".as_bytes(),
    )
    .unwrap();
    let engine = Conformance::new(&table);
    let dataset = text_dataset(&[("id", &["1"]), ("name", &["a"]), ("joined", &["x"])]);
    let err = engine.types_match(&dataset, &people_metadata()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnknownType);
}

fn declared_types() -> impl Strategy<Value = ColumnType> {
    prop::sample::select(ColumnType::all().to_vec())
}

/// A text cell that parses as `ty`.
fn cell_for(ty: ColumnType) -> BoxedStrategy<String> {
    match ty {
        ColumnType::Int | ColumnType::Long => (-1_000i64..1_000).prop_map(|v| v.to_string()).boxed(),
        ColumnType::Float => (-1_000i32..1_000)
            .prop_map(|v| format!("{}.5", v))
            .boxed(),
        ColumnType::Boolean => prop::bool::ANY.prop_map(|b| b.to_string()).boxed(),
        ColumnType::Date => (1u32..=28).prop_map(|d| format!("2024-03-{d:02}")).boxed(),
        ColumnType::DateTime => (0u32..24)
            .prop_map(|h| format!("2024-03-01 {h:02}:15:00"))
            .boxed(),
        ColumnType::Character => "[a-z ]{0,6}".boxed(),
    }
}

fn metadata_for(types: &[ColumnType]) -> TableMetadata {
    let mut metadata = people_metadata();
    for name in metadata.column_names(false) {
        metadata.remove_column(&name).unwrap();
    }
    for (idx, ty) in types.iter().enumerate() {
        metadata
            .push_column(ColumnMeta::new(format!("c{idx}"), *ty))
            .unwrap();
    }
    metadata
}

fn scenario() -> impl Strategy<Value = (Vec<ColumnType>, Vec<Vec<String>>, Vec<usize>, usize)> {
    (prop::collection::vec(declared_types(), 1..6), 1usize..5).prop_flat_map(|(types, rows)| {
        let columns: Vec<_> = types
            .iter()
            .map(|ty| prop::collection::vec(cell_for(*ty), rows))
            .collect();
        let order = Just((0..types.len()).collect::<Vec<_>>()).prop_shuffle();
        (Just(types), columns, order, 0usize..3)
    })
}

proptest! {
    #[test]
    fn enforcing_then_checking_always_conforms(
        (types, cells, order, extras) in scenario()
    ) {
        let metadata = metadata_for(&types);
        let names = metadata.column_names(false);
        let mut columns: Vec<(String, Vec<&str>)> = order
            .iter()
            .map(|&idx| (names[idx].clone(), cells[idx].iter().map(String::as_str).collect()))
            .collect();
        let rows = cells[0].len();
        for extra in 0..extras {
            columns.push((format!("extra{extra}"), vec!["x"; rows]));
        }
        let borrowed: Vec<(&str, &[&str])> = columns
            .iter()
            .map(|(name, values)| (name.as_str(), values.as_slice()))
            .collect();
        let mut dataset = text_dataset(&borrowed);

        let engine = Conformance::default();
        engine.impose_exact_conformance(&mut dataset, &metadata).expect("enforce");
        prop_assert!(engine.exactly_conforms(&dataset, &metadata).expect("check"));

        let once = dataset.clone();
        engine
            .impose_column_order(&mut dataset, &metadata, ColumnPolicy::exact())
            .expect("reorder");
        prop_assert_eq!(dataset, once);
    }

    #[test]
    fn order_equality_implies_set_equality(
        names in prop::collection::hash_set("[a-e]{1,3}", 1..6),
        seed in any::<u64>()
    ) {
        let names: Vec<String> = names.into_iter().collect();
        let mut metadata = metadata_for(&[]);
        for name in &names {
            metadata
                .push_column(ColumnMeta::new(name.clone(), ColumnType::Character))
                .unwrap();
        }
        let mut shuffled = names.clone();
        shuffled.rotate_left((seed as usize) % names.len());
        let columns: Vec<(&str, &[&str])> =
            shuffled.iter().map(|n| (n.as_str(), &["v"][..])).collect();
        let dataset = text_dataset(&columns);

        let engine = Conformance::default();
        prop_assert!(engine.columns_match(&dataset, &metadata));
        prop_assert_eq!(
            engine.columns_match_ordered(&dataset, &metadata),
            shuffled == names
        );
    }
}
