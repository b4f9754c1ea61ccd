use std::{fs, path::Path};

use anyhow::{Context, Result};
use log::info;

use crate::{
    catalog::{self, DatabaseBundle, DatabaseMetadata, InMemoryCatalog, TableDefinition},
    cli::CatalogArgs,
    io_utils, load_metadata,
    types::TypeTranslationTable,
};

pub fn execute(args: &CatalogArgs, types: &TypeTranslationTable) -> Result<()> {
    let definitions = match (&args.folder, &args.meta, &args.database) {
        (Some(folder), _, _) => {
            let bundle = DatabaseBundle::load_dir(folder, args.suffix.as_deref())?;
            let mut client = InMemoryCatalog::new();
            let definitions = catalog::register_database(&mut client, &bundle, types)?;
            info!(
                "Built {} table definition(s) for database '{}'",
                definitions.len(),
                bundle.database.name
            );
            definitions
        }
        (None, Some(meta), Some(database)) => {
            let table = load_metadata(meta)?;
            let database = DatabaseMetadata::load(database)?;
            let definition =
                TableDefinition::for_dialect(&table, &database, types, &args.dialect)
                    .with_context(|| format!("Building table definition from {meta:?}"))?;
            vec![definition]
        }
        _ => anyhow::bail!("Either --folder or both --meta and --database are required"),
    };

    let json = if definitions.len() == 1 && args.folder.is_none() {
        definitions[0].to_json_string()?
    } else {
        serde_json::to_string_pretty(&definitions).context("Serializing table definitions")?
    };
    match args.output.as_deref() {
        Some(path) if !io_utils::is_dash(path) => write_json(path, &json),
        _ => {
            println!("{json}");
            Ok(())
        }
    }
}

fn write_json(path: &Path, json: &str) -> Result<()> {
    fs::write(path, format!("{json}\n")).with_context(|| format!("Writing {path:?}"))?;
    info!("Table definition(s) written to {path:?}");
    Ok(())
}
