// symfeat command line driver: extract features from a MIDI file and print them as JSON

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use symfeat_lib::{Config, FeatureRegistry, Pipeline};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Standard MIDI file to analyse
    #[arg(required_unless_present = "list")]
    input: Option<PathBuf>,

    /// Config file (defaults to the user config directory)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Also extract per-window values
    #[arg(short, long)]
    sequential: bool,

    /// Print the feature catalog and exit
    #[arg(short, long)]
    list: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    if cli.list {
        let registry = FeatureRegistry::with_default_catalog();
        let descriptors: Vec<_> = registry.descriptors().collect();
        println!("{}", serde_json::to_string_pretty(&descriptors)?);
        return Ok(());
    }

    let input = cli.input.context("no input file given")?;

    let mut config = match &cli.config {
        Some(path) => Config::load(path).with_context(|| format!("reading config {}", path.display()))?,
        None => Config::load_or_default(&Config::default_path()),
    };
    if cli.sequential {
        config.windows.sequential = true;
    }

    let pipeline = Pipeline::new(&config)?;
    let table = pipeline
        .extract_file(&input)
        .with_context(|| format!("extracting features from {}", input.display()))?;
    println!("{}", serde_json::to_string_pretty(&table)?);
    Ok(())
}
