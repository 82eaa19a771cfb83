//! bsort: bottle-cap dataset preparation.
//!
//! bsort turns a folder of raw bottle-cap images and YOLO labels into a
//! stratified train/validation layout, then hands training and prediction to
//! an external detector. The cap group of every file is encoded in its name
//! as `_b<digit>_`.
//!
//! # Modules
//!
//! - [`code`]: filename code extraction and the fixed categories
//! - [`relabel`]: class-index rewriting of label files
//! - [`split`]: bucketing and the deterministic train/val split
//! - [`config`]: YAML configuration
//! - [`detect`]: external detector invocation
//! - [`error`]: Error types for bsort operations

pub mod code;
pub mod config;
pub mod detect;
pub mod error;
mod files;
pub mod relabel;
pub mod split;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

pub use error::BsortError;

use config::{BsortConfig, RelabelConfig, SplitConfig};
use detect::{DetectorCommand, DetectorJob};
use relabel::{RelabelReport, Relabeler};
use split::{DatasetSplitter, SplitReport};

/// The bsort CLI application.
#[derive(Parser)]
#[command(name = "bsort")]
#[command(version, about)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Rewrite label class indices from the b-code in each filename.
    Relabel(ReportArgs),
    /// Split images and labels into stratified train/val directories.
    Split(ReportArgs),
    /// Relabel, then split.
    Prepare(ReportArgs),
    /// Train the detector on the prepared dataset.
    Train(TrainArgs),
    /// Run detector inference on an image or directory.
    Infer(InferArgs),
}

/// Arguments shared by the dataset-preparation subcommands.
#[derive(clap::Args)]
struct ReportArgs {
    /// YAML configuration file.
    #[arg(long)]
    config: PathBuf,

    /// Output format for the report ('text' or 'json').
    #[arg(long, default_value = "text")]
    output: String,
}

/// Arguments for the train subcommand.
#[derive(clap::Args)]
struct TrainArgs {
    /// YAML configuration file.
    #[arg(long)]
    config: PathBuf,

    /// Print the detector command instead of running it.
    #[arg(long)]
    dry_run: bool,
}

/// Arguments for the infer subcommand.
#[derive(clap::Args)]
struct InferArgs {
    /// YAML configuration file.
    #[arg(long)]
    config: PathBuf,

    /// Image file or directory to run inference on.
    #[arg(long)]
    image: PathBuf,

    /// Print the detector command instead of running it.
    #[arg(long)]
    dry_run: bool,
}

#[derive(serde::Serialize)]
struct PrepareReport<'a> {
    relabel: &'a RelabelReport,
    split: &'a SplitReport,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    fn parse(raw: &str) -> Result<Self, BsortError> {
        match raw {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            other => Err(BsortError::UnsupportedOutput(format!(
                "'{}' (supported: text, json)",
                other
            ))),
        }
    }
}

/// Run the bsort CLI.
///
/// This is the main entry point for the CLI, called from `main.rs`.
pub fn run() -> Result<(), BsortError> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Relabel(args)) => run_relabel_command(args),
        Some(Commands::Split(args)) => run_split_command(args),
        Some(Commands::Prepare(args)) => run_prepare_command(args),
        Some(Commands::Train(args)) => {
            let config = config::load_config(&args.config)?;
            let job = DetectorJob::train(&config.train);
            run_detector(&config, job, args.dry_run)
        }
        Some(Commands::Infer(args)) => {
            let config = config::load_config(&args.config)?;
            let job = DetectorJob::predict(&config.infer, &args.image);
            run_detector(&config, job, args.dry_run)
        }
        None => {
            println!("bsort {}", env!("CARGO_PKG_VERSION"));
            println!();
            println!("Bottle-cap dataset preparation and detector launcher.");
            println!();
            println!("Run 'bsort --help' for usage information.");
            Ok(())
        }
    }
}

/// Relabel every label file described by `config`.
pub fn relabel_dataset(config: &RelabelConfig) -> Result<RelabelReport, BsortError> {
    Relabeler::new(&config.label_dir, &config.out_dir, config.class_map.clone())?.run()
}

/// Run a full clean/categorize/split pass described by `config`.
pub fn split_dataset(config: &SplitConfig) -> Result<SplitReport, BsortError> {
    DatasetSplitter::new(config.paths(), config.policy()).run()
}

/// Relabel, then split the relabeled labels.
pub fn prepare_dataset(config: &BsortConfig) -> Result<(RelabelReport, SplitReport), BsortError> {
    let relabeled = relabel_dataset(&config.relabel)?;
    if config.split.label_dir != config.relabel.out_dir {
        tracing::warn!(
            relabeled = %config.relabel.out_dir.display(),
            split_labels = %config.split.label_dir.display(),
            "split reads labels from a different directory than relabel writes"
        );
    }
    let split = split_dataset(&config.split)?;
    Ok((relabeled, split))
}

fn load_with_output(path: &Path, output: &str) -> Result<(BsortConfig, OutputFormat), BsortError> {
    // Reject a bad --output before touching the filesystem.
    let format = OutputFormat::parse(output)?;
    Ok((config::load_config(path)?, format))
}

fn run_relabel_command(args: ReportArgs) -> Result<(), BsortError> {
    let (config, format) = load_with_output(&args.config, &args.output)?;
    let report = relabel_dataset(&config.relabel)?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => print!("{}", report),
    }
    Ok(())
}

fn run_split_command(args: ReportArgs) -> Result<(), BsortError> {
    let (config, format) = load_with_output(&args.config, &args.output)?;
    let report = split_dataset(&config.split)?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => print!("{}", report),
    }
    Ok(())
}

fn run_prepare_command(args: ReportArgs) -> Result<(), BsortError> {
    let (config, format) = load_with_output(&args.config, &args.output)?;
    let (relabeled, split) = prepare_dataset(&config)?;

    match format {
        OutputFormat::Json => {
            let combined = PrepareReport {
                relabel: &relabeled,
                split: &split,
            };
            println!("{}", serde_json::to_string_pretty(&combined)?);
        }
        OutputFormat::Text => {
            print!("{}", relabeled);
            println!();
            print!("{}", split);
        }
    }
    Ok(())
}

fn run_detector(config: &BsortConfig, job: DetectorJob, dry_run: bool) -> Result<(), BsortError> {
    let command = DetectorCommand::new(config, job);

    if dry_run {
        println!("{}", command);
        return Ok(());
    }

    command.run()?;
    println!("Results written to {}", command.job.output_dir().display());
    Ok(())
}
