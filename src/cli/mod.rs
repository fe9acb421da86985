pub mod migrate;

use clap::{Parser, Subcommand};
use metaterm::config::DEFAULT_STORE_PATH;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "mtt", version)]
#[command(about = "Migrate meta values to taxonomy terms")]
pub struct Cli {
    /// JSON snapshot holding taxonomies and records
    #[arg(long, global = true, env = "MTT_STORE", default_value = DEFAULT_STORE_PATH)]
    pub store: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

/// Command table: every handler the binary exposes
#[derive(Subcommand)]
pub enum Command {
    /// Migrate meta values to taxonomy terms. Delete meta after import
    #[command(after_help = migrate::EXAMPLES)]
    Migrate(migrate::MigrateArgs),
}
