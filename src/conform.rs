use std::path::Path;

use anyhow::{Context, Result};
use log::{info, warn};

use crate::{
    cli::ConformArgs,
    conformance::{ColumnPolicy, Conformance, OnError},
    io_utils, load_metadata,
    tabular::{CsvIo, ReadSpec, TabularIo},
    types::TypeTranslationTable,
};

pub fn execute(args: &ConformArgs, types: &TypeTranslationTable) -> Result<()> {
    let metadata = load_metadata(&args.meta)?;
    let engine = Conformance::new(types).ignore_partitions(args.ignore_partitions);
    let io = CsvIo::new()
        .with_delimiter(args.delimiter)
        .with_output_delimiter(args.output_delimiter)
        .with_input_encoding(io_utils::resolve_encoding(args.input_encoding.as_deref())?)
        .with_output_encoding(io_utils::resolve_encoding(args.output_encoding.as_deref())?);

    let mut dataset = io.read_typed(&args.input, &ReadSpec::raw())?;
    if args.normalize_names {
        dataset.normalize_column_names();
    }

    let policy = ColumnPolicy {
        create_missing: args.create_missing,
        drop_extra: !args.keep_extra,
    };
    let on_error = if args.best_effort {
        OnError::BestEffort
    } else {
        OnError::Raise
    };
    engine
        .impose_column_order(&mut dataset, &metadata, policy)
        .with_context(|| format!("Reconciling columns of {:?}", args.input))?;
    let summary = engine
        .impose_data_types(&mut dataset, &metadata, on_error)
        .with_context(|| format!("Converting values of {:?}", args.input))?;
    if !summary.is_clean() {
        warn!(
            "{:?} conformed with {} column(s) left unconverted and {} date column(s) partially cleared",
            args.input,
            summary.skipped.len(),
            summary.unparsed_dates.len()
        );
    }

    let output = args.output.as_deref().unwrap_or(Path::new("-"));
    io.write(&dataset, output)?;
    info!(
        "Wrote {} row(s) across {} column(s) to {output:?}",
        dataset.row_count(),
        dataset.column_count()
    );
    Ok(())
}
