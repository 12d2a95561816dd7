use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    version,
    about = "posescore - batched LK-ball desolvation energies and analytic gradients for stacks of molecular poses.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Set the number of threads for parallel computation.
    /// Defaults to the number of available logical cores.
    #[arg(short = 'j', long, global = true, value_name = "NUM")]
    pub threads: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Score a pose stack and optionally write coordinate and water gradients.
    Score(ScoreArgs),
    /// Score explicit donor-acceptor pairs with the hydrogen bond potential.
    Hbond(HBondArgs),
}

/// Arguments for the `score` subcommand.
#[derive(Args, Debug)]
pub struct ScoreArgs {
    /// Path to the pose stack and block-type tables in JSON format.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub stack: PathBuf,

    /// Path to a TOML file overriding the global potential parameters.
    #[arg(short, long, value_name = "PATH")]
    pub params: Option<PathBuf>,

    /// Run the backward pass and write the gradients to this JSON file.
    #[arg(short, long, value_name = "PATH")]
    pub gradients: Option<PathBuf>,
}

/// Arguments for the `hbond` subcommand.
#[derive(Args, Debug)]
pub struct HBondArgs {
    /// Path to the donor-acceptor pairs and their parameters in JSON format.
    #[arg(long, required = true, value_name = "PATH")]
    pub pairs: PathBuf,

    /// Path to a TOML file overriding the global potential parameters.
    #[arg(short, long, value_name = "PATH")]
    pub params: Option<PathBuf>,

    /// Write the per-pair atom gradients to this JSON file.
    #[arg(short, long, value_name = "PATH")]
    pub gradients: Option<PathBuf>,
}
