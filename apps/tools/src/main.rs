use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod prepare;

#[derive(Parser, Debug)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Flatten a raw capture directory into a servable dataset.
    Prepare {
        /// Raw capture root containing raw_images/, raw_results/, raw_keywords/.
        #[arg(long)]
        source: PathBuf,
        /// Output dataset root, created if absent.
        #[arg(long)]
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Prepare { source, output } => {
            let summary = prepare::prepare_dataset(&source, &output)?;
            println!(
                "prepared {} files, {} models, {} keyword documents, {} result documents",
                summary.files, summary.models, summary.keywords_written, summary.results_written
            );
        }
    }

    Ok(())
}
