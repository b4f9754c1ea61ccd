use anyhow::{Context, Result, anyhow};
use log::{debug, info};

use crate::{
    cli::InitArgs,
    data::normalize_column_name,
    io_utils,
    lookup::ColumnLookup,
    meta_cmd::split_pair,
    metadata::{DataFormat, TableMetadata},
};

pub fn execute(args: &InitArgs) -> Result<()> {
    let table_name = match &args.table_name {
        Some(name) => name.trim().to_string(),
        None if io_utils::is_dash(&args.input) => {
            return Err(anyhow!("--table-name is required when reading the header from stdin"));
        }
        None => args
            .input
            .file_stem()
            .and_then(|stem| stem.to_str())
            .map(str::to_string)
            .ok_or_else(|| anyhow!("Cannot derive a table name from {:?}", args.input))?,
    };
    let data_format = args.format.parse::<DataFormat>()?;
    let location = args.location.as_deref().unwrap_or(&table_name);

    let mut lookup = match &args.lookup {
        Some(path) => ColumnLookup::load(path)?,
        None => ColumnLookup::new(),
    };
    for spec in &args.types {
        let (name, column_type) = split_pair(spec, ':', "type")?;
        lookup
            .override_type(name, column_type)
            .with_context(|| format!("Overriding type of '{name}'"))?;
    }
    debug!("Column lookup lists {} column(s)", lookup.len());

    let mut header = read_header(args)?;
    if args.normalize_names {
        header = header.iter().map(|name| normalize_column_name(name)).collect();
    }

    let mut metadata = TableMetadata::from_header(
        table_name.as_str(),
        data_format,
        location,
        header.as_slice(),
        &lookup,
    )
    .with_context(|| format!("Drafting metadata from {:?}", args.input))?;
    if let Some(description) = &args.table_description {
        metadata.set_table_description(description.as_str());
    }
    metadata
        .save(&args.output)
        .with_context(|| format!("Writing metadata to {:?}", args.output))?;

    let typed = metadata
        .columns()
        .iter()
        .filter(|column| lookup.get(&column.name).is_some())
        .count();
    info!(
        "Drafted metadata for table '{}' with {} column(s) ({typed} typed from lookup) written to {:?}",
        metadata.table_name(),
        metadata.columns().len(),
        args.output
    );
    Ok(())
}

fn read_header(args: &InitArgs) -> Result<Vec<String>> {
    let encoding = io_utils::resolve_encoding(args.input_encoding.as_deref())?;
    let delimiter = io_utils::resolve_input_delimiter(&args.input, args.delimiter);
    let mut reader = io_utils::open_csv_reader_from_path(&args.input, delimiter, true)?;
    let record = reader
        .byte_headers()
        .with_context(|| format!("Reading headers from {:?}", args.input))?
        .clone();
    let header = io_utils::decode_record(&record, encoding)?;
    if header.iter().all(|name| name.trim().is_empty()) {
        return Err(anyhow!("{:?} has no header row", args.input));
    }
    Ok(header)
}
