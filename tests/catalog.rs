mod common;

use common::{TestWorkspace, fixture_path, people_metadata};
use meta_conform::{
    catalog::{
        self, DatabaseBundle, DatabaseMetadata, InMemoryCatalog, TableDefinition,
        catalog_columns, partition_keys,
    },
    metadata::TableMetadata,
    types::TypeTranslationTable,
};

fn warehouse() -> DatabaseMetadata {
    DatabaseMetadata::load(&fixture_path("warehouse/database.json")).unwrap()
}

#[test]
fn partition_columns_move_to_partition_keys() {
    let metadata = TableMetadata::load(&fixture_path("people.json")).unwrap();
    let types = TypeTranslationTable::builtin();
    let definition = TableDefinition::from_metadata(&metadata, &warehouse(), types).unwrap();

    let names: Vec<&str> = definition
        .storage_descriptor
        .columns
        .iter()
        .map(|c| c.name.as_str())
        .collect();
    assert_eq!(names, vec!["id", "name", "joined", "score"]);
    assert_eq!(definition.partition_keys.len(), 1);
    assert_eq!(definition.partition_keys[0].name, "year");
    assert_eq!(definition.partition_keys[0].column_type, "int");
    assert_eq!(
        definition.storage_descriptor.location,
        "s3://example-bucket/warehouse/people/"
    );
    assert_eq!(definition.description, "People who joined the programme");

    let json: serde_json::Value =
        serde_json::from_str(&definition.to_json_string().unwrap()).unwrap();
    assert_eq!(json["StorageDescriptor"]["Columns"][2]["Type"], "date");
    assert_eq!(json["StorageDescriptor"]["Columns"][0]["Comment"], "Unique identifier");
    assert_eq!(json["PartitionKeys"][0]["Name"], "year");
    assert_eq!(json["Parameters"]["classification"], "csv");
}

#[test]
fn column_specs_follow_the_requested_dialect() {
    let metadata = people_metadata();
    let types = TypeTranslationTable::builtin();
    let spark = catalog_columns(&metadata, types, "spark", false).unwrap();
    let spark_types: Vec<&str> = spark.iter().map(|c| c.column_type.as_str()).collect();
    assert_eq!(spark_types, vec!["IntegerType", "StringType", "DateType"]);
    assert!(partition_keys(&metadata, types, "glue").unwrap().is_empty());
    assert!(catalog_columns(&metadata, types, "athena", false).is_err());
}

#[test]
fn bundle_loads_tables_and_applies_suffix() {
    let bundle = DatabaseBundle::load_dir(&fixture_path("warehouse"), Some("dev")).unwrap();
    assert_eq!(bundle.database.name, "warehouse_dev");
    assert_eq!(bundle.database.location, "s3://example-bucket/warehouse_dev");
    let names: Vec<&str> = bundle.tables.iter().map(|t| t.table_name()).collect();
    assert_eq!(names, vec!["orders", "people"]);

    let mut client = InMemoryCatalog::new();
    let definitions =
        catalog::register_database(&mut client, &bundle, TypeTranslationTable::builtin()).unwrap();
    assert_eq!(definitions.len(), 2);
    assert_eq!(client.table_names("warehouse_dev"), vec!["orders", "people"]);
    let orders = client.table("warehouse_dev", "orders").unwrap();
    assert_eq!(
        orders.storage_descriptor.location,
        "s3://example-bucket/warehouse_dev/orders/"
    );
    assert!(
        orders
            .storage_descriptor
            .serde_info
            .serialization_library
            .contains("Parquet")
    );
}

#[test]
fn register_table_replaces_previous_definition() {
    let mut client = InMemoryCatalog::new();
    let database = warehouse();
    let types = TypeTranslationTable::builtin();
    let mut metadata = people_metadata();
    catalog::register_table(&mut client, &metadata, &database, types).unwrap();

    metadata.set_table_description("Second version");
    catalog::register_table(&mut client, &metadata, &database, types).unwrap();
    let stored = client.table("warehouse", "people").unwrap();
    assert_eq!(stored.description, "Second version");
    assert_eq!(client.table_names("warehouse"), vec!["people"]);
    assert!(client.database("warehouse").is_some());
}

#[test]
fn folder_without_database_json_is_rejected() {
    let workspace = TestWorkspace::new();
    workspace.write("people.json", "{}");
    let err = DatabaseBundle::load_dir(workspace.path(), None).unwrap_err();
    assert!(err.to_string().contains("database.json"));
}
