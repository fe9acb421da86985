mod cli;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Command};

fn main() -> Result<()> {
    metaterm::logging::init();

    let Cli { store, command } = Cli::parse();
    match command {
        Command::Migrate(args) => cli::migrate::run(&store, args),
    }
}
