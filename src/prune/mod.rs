//! Prune a Newick phylogeny to a set of tip labels.

use clap::Parser;
use color_eyre::eyre::{eyre, Report, Result, WrapErr};
use color_eyre::Help;
use itertools::Itertools;
use log::info;
use serde::{Deserialize, Serialize};
use soilmag_phylo::Phylogeny;
use std::collections::BTreeSet;
use std::path::PathBuf;


/// Keep only the named tips of a phylogeny.
#[derive(Clone, Debug, Default, Deserialize, Parser, Serialize)]
pub struct PruneArgs {
    /// Input Newick phylogeny.
    #[clap(short = 't', long, required = true)]
    pub tree: PathBuf,

    /// Tip labels to keep, comma separated.
    #[clap(short = 'l', long, value_delimiter = ',')]
    pub labels: Vec<String>,

    /// File of tip labels to keep, one per line.
    #[clap(long)]
    pub labels_file: Option<PathBuf>,

    /// Output Newick phylogeny.
    #[clap(short = 'o', long, required = true)]
    pub output: PathBuf,
}

impl PruneArgs {
    /// Returns the labels from the command-line and the labels file.
    pub fn keep(&self) -> Result<BTreeSet<String>, Report> {
        let mut keep = self.labels.iter().map(|l| l.trim().to_string()).collect::<BTreeSet<_>>();
        if let Some(path) = &self.labels_file {
            let text = std::fs::read_to_string(path)
                .wrap_err_with(|| format!("Failed to read labels: {path:?}"))?;
            keep.extend(text.lines().map(str::trim).map(String::from));
        }
        keep.remove("");
        if self.labels.is_empty() && self.labels_file.is_none() {
            return Err(eyre!("No tip labels were given."))
                .suggestion("Please specify --labels and/or --labels-file.");
        }
        Ok(keep)
    }
}

/// Prune a Newick file and write the result.
pub fn prune(args: &PruneArgs) -> Result<Phylogeny, Report> {
    let keep = args.keep()?;
    let phylo = Phylogeny::read(&args.tree)?;
    info!("Pruning {} tips to {} labels.", phylo.get_tip_indices().len(), keep.len());

    let pruned = phylo.prune(&keep);
    info!("Kept tips: {}", pruned.get_tips().iter().join(", "));

    if let Some(parent) = args.output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .wrap_err_with(|| format!("Failed to create output directory: {parent:?}"))?;
    }
    pruned.write(&args.output)?;
    Ok(pruned)
}
