//! [Command-line interface](Cli) (CLI) of the main binary.

use crate::prune::PruneArgs;
use crate::run::RunArgs;
use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use strum::Display;


// ----------------------------------------------------------------------------
// CLI Entry Point
// ----------------------------------------------------------------------------

/// The command-line interface (CLI).
/// ---
/// The CLI is intended for parsing user input from the command-line in the main function.
/// ```no_run
/// use clap::Parser;
/// let args = soilmag::Cli::parse();
/// ```
/// Here is a manual example of setting the command-line input:
/// ```rust
/// use clap::Parser;
/// let input = ["soilmag", "prune", "--tree", "tree.nwk", "--labels", "A,B", "--output", "pruned.nwk"];
/// let args = soilmag::Cli::parse_from(input);
/// serde_json::to_string_pretty(&args)?;
/// # Ok::<(), color_eyre::eyre::Report>(())
/// ```
#[derive(Debug, Deserialize, Parser, Serialize)]
#[clap(name = "soilmag", author, version)]
#[clap(about = "soilmag joins, filters and summarizes soil metagenome-assembled genomes.")]
pub struct Cli {
    #[clap(subcommand)]
    #[clap(help = "Set the command.")]
    pub command: Command,

    /// Set the output [Verbosity] level.
    #[clap(short = 'v', long)]
    #[clap(value_enum, default_value_t = Verbosity::default())]
    #[clap(hide_possible_values = false)]
    #[clap(global = true)]
    #[clap(help = "Set the output verbosity level.")]
    pub verbosity: Verbosity,
}

/// CLI [commands](#variants).
#[derive(Debug, Deserialize, Serialize, Subcommand)]
pub enum Command {
    /// Join, filter, prune and summarize the source tables.
    #[clap(about = "Join, filter, prune and summarize the source tables.")]
    Run(RunArgs),
    /// Prune a phylogeny to a set of tip labels.
    #[clap(about = "Prune a phylogeny to a set of tip labels.")]
    Prune(PruneArgs),
}

// ----------------------------------------------------------------------------
// Verbosity
// ----------------------------------------------------------------------------

/// The output verbosity level.
///
/// Displays in lowercase, for use as the `RUST_LOG` filter.
///
/// ```rust
/// use soilmag::Verbosity;
/// assert_eq!(Verbosity::Debug.to_string(), "debug");
/// ```
#[derive(Clone, Copy, Debug, Default, Deserialize, Display, PartialEq, Serialize, ValueEnum)]
#[strum(serialize_all = "lowercase")]
pub enum Verbosity {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}
