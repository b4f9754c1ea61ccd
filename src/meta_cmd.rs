//! Metadata editing through the validated mutators.
//!
//! Edits apply in a fixed order: table attributes, renames, removals, type
//! updates, descriptions, then partitions. Nothing is written if any edit fails.

use anyhow::{Context, Result, anyhow};
use log::info;

use crate::{cli::MetaArgs, load_metadata, metadata::DataFormat};

pub(crate) fn split_pair<'a>(value: &'a str, separator: char, flag: &str) -> Result<(&'a str, &'a str)> {
    value
        .split_once(separator)
        .map(|(left, right)| (left.trim(), right.trim()))
        .filter(|(left, _)| !left.is_empty())
        .ok_or_else(|| anyhow!("--{flag} expects 'name{separator}value' but got '{value}'"))
}

pub fn execute(args: &MetaArgs) -> Result<()> {
    let mut metadata = load_metadata(&args.meta)?;

    if let Some(name) = &args.table_name {
        metadata.set_table_name(name.trim());
    }
    if let Some(description) = &args.table_description {
        metadata.set_table_description(description.as_str());
    }
    if let Some(format) = &args.format {
        metadata.set_data_format(format.parse::<DataFormat>()?);
    }
    if let Some(location) = &args.location {
        metadata.set_location(location)?;
    }
    for spec in &args.rename {
        let (old, new) = split_pair(spec, ':', "rename")?;
        metadata
            .rename_column(old, new)
            .with_context(|| format!("Renaming '{old}' to '{new}'"))?;
    }
    for name in &args.remove {
        metadata
            .remove_column(name.trim())
            .with_context(|| format!("Removing '{name}'"))?;
    }
    for spec in &args.set {
        let (name, column_type) = split_pair(spec, ':', "set")?;
        metadata
            .update_column(name, Some(column_type), None)
            .with_context(|| format!("Updating column '{name}'"))?;
    }
    for spec in &args.describe {
        let (name, description) = split_pair(spec, '=', "describe")?;
        metadata
            .update_column(name, None, Some(description))
            .with_context(|| format!("Describing column '{name}'"))?;
    }
    if args.clear_partitions {
        metadata.set_partition_columns(None)?;
    } else if let Some(partitions) = &args.partitions {
        let names: Vec<&str> = partitions
            .iter()
            .map(|p| p.trim())
            .filter(|p| !p.is_empty())
            .collect();
        metadata
            .set_partition_columns(Some(names.as_slice()))
            .context("Setting partition columns")?;
    }

    let output = args.output.as_deref().unwrap_or(&args.meta);
    metadata.save(output)?;
    info!(
        "Metadata for table '{}' with {} column(s) written to {output:?}",
        metadata.table_name(),
        metadata.columns().len()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_pair_trims_and_validates() {
        assert_eq!(split_pair(" id : long ", ':', "set").unwrap(), ("id", "long"));
        assert_eq!(
            split_pair("note=free: text", '=', "describe").unwrap(),
            ("note", "free: text")
        );
        assert!(split_pair("missing", ':', "set").is_err());
        assert!(split_pair(":long", ':', "set").is_err());
    }
}
