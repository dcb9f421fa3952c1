mod commands;
mod logging;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use bmecat_core::Settings;
use bmecat_import::{ImportStats, DEFAULT_BATCH_SIZE};
use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "bmecat")]
#[command(about = "BMEcat catalog extraction and Shopware import")]
struct Cli {
    /// Path to the YAML configuration file.
    #[arg(long, global = true, default_value = "config.yml", env = "BMECAT_CONFIG")]
    config: PathBuf,

    /// Working directory for staged input and the record store.
    #[arg(long, global = true, default_value = "./work")]
    workdir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Stage a ZIP or XML catalog as `<workdir>/input.xml`.
    #[command(alias = "bmecat_extract")]
    BmecatExtract { input: PathBuf },
    /// Extract products from the staged catalog into the record store.
    #[command(alias = "bmecat_parse")]
    BmecatParse {
        #[arg(long)]
        input: Option<PathBuf>,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Upload the record store to Shopware.
    #[command(alias = "shopware_import")]
    ShopwareImport {
        #[arg(long)]
        ndjson: Option<PathBuf>,
        #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
        batch_size: usize,
    },
    /// Stage, extract and import in one go.
    #[command(alias = "run_all")]
    RunAll {
        input: PathBuf,
        #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
        batch_size: usize,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    logging::init()?;
    let cli = Cli::parse();

    match cli.command {
        Commands::BmecatExtract { input } => {
            let staged = commands::extract(&input, &cli.workdir).await?;
            println!("{}", staged.display());
        }
        Commands::BmecatParse { input, output } => {
            let settings = load_settings(&cli.config)?;
            let input = input.unwrap_or_else(|| commands::staged_xml(&cli.workdir));
            let output = output.unwrap_or_else(|| commands::products_store(&cli.workdir));
            let written = commands::parse(&settings, input, output).await?;
            println!("{}", written.display());
        }
        Commands::ShopwareImport { ndjson, batch_size } => {
            let settings = load_settings(&cli.config)?;
            let ndjson = ndjson.unwrap_or_else(|| commands::products_store(&cli.workdir));
            let stats = commands::import(&settings, &ndjson, batch_size).await?;
            return Ok(report(stats));
        }
        Commands::RunAll { input, batch_size } => {
            let settings = load_settings(&cli.config)?;
            let staged = commands::extract(&input, &cli.workdir).await?;
            let store =
                commands::parse(&settings, staged, commands::products_store(&cli.workdir)).await?;
            let stats = commands::import(&settings, &store, batch_size).await?;
            return Ok(report(stats));
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn load_settings(path: &std::path::Path) -> anyhow::Result<Settings> {
    Settings::load(path).with_context(|| format!("loading config {}", path.display()))
}

/// Prints the summary line; any record-level error fails the process.
fn report(stats: ImportStats) -> ExitCode {
    println!("{stats}");
    if stats.errors > 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
