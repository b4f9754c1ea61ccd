pub mod catalog;
mod catalog_cmd;
pub mod cli;
mod columns;
mod conform;
pub mod conformance;
pub mod data;
pub mod dataset;
pub mod error;
pub mod io_utils;
mod init_cmd;
pub mod lookup;
mod meta_cmd;
pub mod metadata;
pub mod table;
pub mod tabular;
pub mod types;
mod verify;

use std::{borrow::Cow, env, path::Path, sync::OnceLock};

use anyhow::{Context, Result};
use clap::Parser;
use log::{LevelFilter, debug};

use crate::{
    cli::{Cli, Commands},
    metadata::TableMetadata,
    types::TypeTranslationTable,
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("meta_conform", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    let types = load_type_table(cli.type_table.as_deref())?;
    match cli.command {
        Commands::Verify(args) => verify::execute(&args, &types),
        Commands::Conform(args) => conform::execute(&args, &types),
        Commands::Columns(args) => columns::execute(&args, &types),
        Commands::Catalog(args) => catalog_cmd::execute(&args, &types),
        Commands::Meta(args) => meta_cmd::execute(&args),
        Commands::Init(args) => init_cmd::execute(&args),
    }
}

fn load_type_table(path: Option<&Path>) -> Result<Cow<'static, TypeTranslationTable>> {
    match path {
        Some(path) => {
            debug!("Using type table {path:?}");
            Ok(Cow::Owned(TypeTranslationTable::load(path)?))
        }
        None => Ok(Cow::Borrowed(TypeTranslationTable::builtin())),
    }
}

pub(crate) fn load_metadata(path: &Path) -> Result<TableMetadata> {
    TableMetadata::load(path).with_context(|| format!("Loading metadata from {path:?}"))
}

pub(crate) fn printable_delimiter(delimiter: u8) -> String {
    match delimiter {
        b'\t' => "\\t".to_string(),
        other => (other as char).to_string(),
    }
}
