//! Column listing for a metadata file.

use anyhow::{Context, Result};
use log::info;

use crate::{cli::ColumnsArgs, load_metadata, table, types::TypeTranslationTable};

pub fn execute(args: &ColumnsArgs, types: &TypeTranslationTable) -> Result<()> {
    let metadata = load_metadata(&args.meta)?;
    if metadata.columns().is_empty() {
        info!("Metadata {:?} does not declare any columns", args.meta);
        return Ok(());
    }

    let rows = metadata
        .columns()
        .iter()
        .enumerate()
        .map(|(idx, column)| -> Result<Vec<String>> {
            let catalog_type = types
                .catalog_type(column.column_type, &args.dialect)
                .with_context(|| format!("Resolving type of column '{}'", column.name))?;
            let partition = if metadata.is_partition(&column.name) {
                "yes"
            } else {
                ""
            };
            Ok(vec![
                (idx + 1).to_string(),
                column.name.clone(),
                column.column_type.to_string(),
                catalog_type.to_string(),
                partition.to_string(),
                column.description.clone(),
            ])
        })
        .collect::<Result<Vec<_>>>()?;

    let headers = [
        "#",
        "name",
        "type",
        args.dialect.as_str(),
        "partition",
        "description",
    ]
    .map(String::from);
    table::print_table(&headers, &rows);
    info!(
        "Listed {} column(s) of table '{}' from {:?}",
        rows.len(),
        metadata.table_name(),
        args.meta
    );
    Ok(())
}
