use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Check and enforce table metadata against CSV data",
    long_about = None
)]
pub struct Cli {
    /// CSV type table (`metadata,value,<dialect>...`) replacing the built-in one
    #[arg(long = "type-table", global = true)]
    pub type_table: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Check that CSV files exactly conform to a metadata file
    Verify(VerifyArgs),
    /// Rewrite a CSV file so it conforms to a metadata file
    Conform(ConformArgs),
    /// List the columns declared by a metadata file
    Columns(ColumnsArgs),
    /// Emit catalog table definitions for metadata
    Catalog(CatalogArgs),
    /// Edit a metadata file
    Meta(MetaArgs),
    /// Draft a metadata file from a CSV header
    Init(InitArgs),
}

#[derive(Debug, Args)]
pub struct VerifyArgs {
    /// Metadata file (JSON or YAML)
    #[arg(short, long)]
    pub meta: PathBuf,
    /// One or more CSV files to verify
    #[arg(short = 'i', long = "input", required = true, action = clap::ArgAction::Append)]
    pub inputs: Vec<PathBuf>,
    /// Ignore partition columns on both sides
    #[arg(long = "ignore-partitions")]
    pub ignore_partitions: bool,
    /// CSV delimiter character
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding for input files (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

#[derive(Debug, Args)]
pub struct ConformArgs {
    /// Metadata file (JSON or YAML)
    #[arg(short, long)]
    pub meta: PathBuf,
    /// Input CSV file (`-` for stdin)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Output CSV file (stdout if omitted)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
    /// Add declared columns missing from the input as empty columns
    #[arg(long = "create-missing")]
    pub create_missing: bool,
    /// Fail on undeclared columns instead of dropping them
    #[arg(long = "keep-extra")]
    pub keep_extra: bool,
    /// Keep going when values cannot be converted
    #[arg(long = "best-effort")]
    pub best_effort: bool,
    /// Normalize input headers (lowercase, non-word characters to `_`) first
    #[arg(long = "normalize-names")]
    pub normalize_names: bool,
    /// Leave partition columns out of the output
    #[arg(long = "ignore-partitions")]
    pub ignore_partitions: bool,
    /// CSV delimiter character for reading input
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Delimiter to use for output (defaults to input delimiter)
    #[arg(long = "output-delimiter", value_parser = parse_delimiter)]
    pub output_delimiter: Option<u8>,
    /// Character encoding of the input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
    /// Character encoding for the output file/stdout (defaults to utf-8)
    #[arg(long = "output-encoding")]
    pub output_encoding: Option<String>,
}

#[derive(Debug, Args)]
pub struct ColumnsArgs {
    /// Metadata file (JSON or YAML)
    #[arg(short, long)]
    pub meta: PathBuf,
    /// Catalog dialect for the type column
    #[arg(long, default_value = "glue")]
    pub dialect: String,
}

#[derive(Debug, Args)]
pub struct CatalogArgs {
    /// Table metadata file
    #[arg(short, long, required_unless_present = "folder", requires = "database")]
    pub meta: Option<PathBuf>,
    /// Database metadata file (`name`, `description`, `location`)
    #[arg(short, long)]
    pub database: Option<PathBuf>,
    /// Folder holding database.json and one JSON file per table
    #[arg(long, conflicts_with_all = ["meta", "database"])]
    pub folder: Option<PathBuf>,
    /// Suffix appended to the database name and location (with --folder)
    #[arg(long, requires = "folder")]
    pub suffix: Option<String>,
    /// Catalog dialect for column types
    #[arg(long, default_value = "glue")]
    pub dialect: String,
    /// Output JSON file (stdout if omitted)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct MetaArgs {
    /// Metadata file to edit
    #[arg(short, long)]
    pub meta: PathBuf,
    /// Write the result here instead of overwriting the input
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
    /// Set or add a column type, `name:type`
    #[arg(long = "set", action = clap::ArgAction::Append)]
    pub set: Vec<String>,
    /// Set a column description, `name=text`
    #[arg(long = "describe", action = clap::ArgAction::Append)]
    pub describe: Vec<String>,
    /// Rename a column, `old:new`
    #[arg(long = "rename", action = clap::ArgAction::Append)]
    pub rename: Vec<String>,
    /// Remove a column
    #[arg(long = "remove", action = clap::ArgAction::Append)]
    pub remove: Vec<String>,
    /// Comma-separated partition columns
    #[arg(long, value_delimiter = ',', conflicts_with = "clear_partitions")]
    pub partitions: Option<Vec<String>>,
    /// Remove partition metadata
    #[arg(long = "clear-partitions")]
    pub clear_partitions: bool,
    /// Storage format (avro, csv, csv_quoted_nodate, regex, orc, par, parquet)
    #[arg(long)]
    pub format: Option<String>,
    /// Storage location; a trailing `/` is added when absent
    #[arg(long)]
    pub location: Option<String>,
    #[arg(long = "table-name")]
    pub table_name: Option<String>,
    #[arg(long = "table-description")]
    pub table_description: Option<String>,
}

#[derive(Debug, Args)]
pub struct InitArgs {
    /// CSV file whose header lists the columns (`-` for stdin)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Destination metadata file (JSON, or YAML for .yml/.yaml)
    #[arg(short = 'o', long = "output")]
    pub output: PathBuf,
    /// Column lookup CSV (`variable_name,type[,description]`)
    #[arg(long)]
    pub lookup: Option<PathBuf>,
    /// Column type override, `name:type`; applied after the lookup
    #[arg(long = "type", action = clap::ArgAction::Append)]
    pub types: Vec<String>,
    /// Table name (defaults to the input file stem)
    #[arg(long = "table-name")]
    pub table_name: Option<String>,
    #[arg(long = "table-description")]
    pub table_description: Option<String>,
    /// Storage format (avro, csv, csv_quoted_nodate, regex, orc, par, parquet)
    #[arg(long, default_value = "csv")]
    pub format: String,
    /// Storage location (defaults to the table name)
    #[arg(long)]
    pub location: Option<String>,
    /// Normalize header names (lowercase, non-word characters to `_`) first
    #[arg(long = "normalize-names")]
    pub normalize_names: bool,
    /// CSV delimiter character
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\\t" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "pipe" | "|" => Ok(b'|'),
        "semicolon" | ";" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            match (chars.next(), chars.next()) {
                (None, _) => Err("Delimiter cannot be empty".to_string()),
                (Some(_), Some(_)) => Err("Delimiter must be a single character".to_string()),
                (Some(ch), None) if ch.is_ascii() => Ok(ch as u8),
                (Some(_), None) => Err("Delimiter must be ASCII".to_string()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_delimiter_accepts_names_and_characters() {
        assert_eq!(parse_delimiter("tab"), Ok(b'\t'));
        assert_eq!(parse_delimiter(";"), Ok(b';'));
        assert_eq!(parse_delimiter("#"), Ok(b'#'));
        assert!(parse_delimiter("").is_err());
        assert!(parse_delimiter("ab").is_err());
        assert!(parse_delimiter("é").is_err());
    }

    #[test]
    fn partitions_and_clear_conflict() {
        let parsed = Cli::try_parse_from([
            "meta-conform",
            "meta",
            "-m",
            "t.json",
            "--partitions",
            "a,b",
            "--clear-partitions",
        ]);
        assert!(parsed.is_err());
        let parsed =
            Cli::try_parse_from(["meta-conform", "meta", "-m", "t.json", "--partitions", "a,b"])
                .unwrap();
        match parsed.command {
            Commands::Meta(args) => {
                assert_eq!(args.partitions, Some(vec!["a".to_string(), "b".to_string()]));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
