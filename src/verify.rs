use anyhow::{Context, Result};
use log::info;

use crate::{
    cli::VerifyArgs,
    conformance::Conformance,
    io_utils, load_metadata, printable_delimiter,
    tabular::{CsvIo, ReadSpec, TabularIo},
    types::TypeTranslationTable,
};

pub fn execute(args: &VerifyArgs, types: &TypeTranslationTable) -> Result<()> {
    let metadata = load_metadata(&args.meta)?;
    let engine = Conformance::new(types).ignore_partitions(args.ignore_partitions);
    let spec = ReadSpec::from_metadata(&metadata, types, args.ignore_partitions)
        .with_context(|| format!("Resolving column types for {:?}", args.meta))?;
    let io = CsvIo::new()
        .with_delimiter(args.delimiter)
        .with_input_encoding(io_utils::resolve_encoding(args.input_encoding.as_deref())?);

    for input in &args.inputs {
        let delimiter = io_utils::resolve_input_delimiter(input, args.delimiter);
        info!(
            "Verifying {input:?} with delimiter '{}'",
            printable_delimiter(delimiter)
        );
        let dataset = io.read_typed(input, &spec)?;
        engine
            .check_exact_conformance(&dataset, &metadata)
            .with_context(|| format!("Verifying {input:?} against {:?}", args.meta))?;
        info!("✓ {input:?} conforms to {:?}", args.meta);
    }
    Ok(())
}
