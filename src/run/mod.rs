//! Run the full analysis: load, join, filter, prune and summarize.

use crate::aggregate::{self, Summary};
use crate::config::{Config, FilterArgs, StatsArgs};
use crate::filter::Predicate;
use crate::join::join;
use crate::load::{load_all, FileReader, Sources};
use crate::normalize::Rank;
use crate::record::{RecordSet, Row, Value};
use clap::Parser;
use color_eyre::eyre::{eyre, Report, Result, WrapErr};
use color_eyre::Help;
use itertools::Itertools;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use soilmag_phylo::Phylogeny;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Debug;
use std::path::{Path, PathBuf};

#[cfg(test)]
mod tests;

// ----------------------------------------------------------------------------
// RunArgs

/// Join, filter and summarize soil metagenome records.
#[derive(Clone, Debug, Deserialize, Parser, Serialize)]
pub struct RunArgs {
    /// Assembly (genome bin) metadata, comma-separated.
    #[clap(short = 'a', long, required = true)]
    pub assemblies: PathBuf,

    /// Metagenome annotation metadata, tab-separated.
    #[clap(short = 'm', long, required = true)]
    pub metagenomes: PathBuf,

    /// Soil chemistry metadata, tab-separated.
    #[clap(short = 'c', long, required = true)]
    pub chemistry: PathBuf,

    /// Newick phylogeny of the genome bins, pruned to the filtered genomes.
    #[clap(short = 't', long)]
    pub tree: Option<PathBuf>,

    /// JSON config of the source table layouts.
    #[clap(long)]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub filter: FilterArgs,

    #[command(flatten)]
    pub stats: StatsArgs,

    /// Output directory.
    ///
    /// If the directory does not exist, it will be created.
    #[clap(short = 'o', long, required = true)]
    pub output_dir: PathBuf,
}

impl RunArgs {
    /// Write [`RunArgs`] to a JSON file.
    pub fn write<P>(&self, path: &P) -> Result<(), Report>
    where
        P: AsRef<Path> + Debug,
    {
        let output = serde_json::to_string_pretty(self)
            .wrap_err(format!("Failed to serialize run arguments: {self:?}"))?;
        std::fs::write(path, output)
            .wrap_err(format!("Failed to write run arguments: {path:?}"))?;
        Ok(())
    }
}

// ----------------------------------------------------------------------------
// Analysis

/// All products of one analysis.
#[derive(Clone, Debug, Default)]
pub struct Analysis {
    /// Every joined record.
    pub combined: RecordSet,
    /// Joined records matching the filters.
    pub subset: RecordSet,
    /// The phylogeny pruned to the genomes in the subset.
    pub pruned: Option<Phylogeny>,
    /// Genomes in the subset, counted by the group field.
    pub counts: BTreeMap<Value, usize>,
    /// Genomes in the subset with no name at the novel ranks.
    pub novel: RecordSet,
    /// Genomes in the subset with no name, at each rank.
    pub novelty: BTreeMap<Rank, usize>,
    /// Value statistics of the genomes in the subset, by the group field.
    pub stats: BTreeMap<Value, Summary>,
}

impl Analysis {
    /// Write every product into a directory.
    pub fn write<P>(&self, output_dir: &P, stats: &StatsArgs) -> Result<(), Report>
    where
        P: AsRef<Path> + Debug,
    {
        let output_dir = output_dir.as_ref();
        std::fs::create_dir_all(output_dir)
            .wrap_err_with(|| format!("Failed to create output directory: {output_dir:?}"))?;

        self.combined.write(&output_dir.join("combined.tsv"))?;
        self.subset.write(&output_dir.join("subset.tsv"))?;
        self.novel.write(&output_dir.join("novel.tsv"))?;
        if let Some(pruned) = &self.pruned {
            pruned.write(&output_dir.join("pruned.nwk"))?;
        }

        let tsv = Some(b'\t');
        aggregate::count_table(&stats.group_by, &self.counts)?.write(&output_dir.join("counts.tsv"), tsv)?;
        aggregate::novelty_table(&self.novelty)?.write(&output_dir.join("novelty.tsv"), tsv)?;
        aggregate::stats_table(&stats.group_by, &self.stats)?.write(&output_dir.join("stats.tsv"), tsv)?;

        Ok(())
    }
}

/// Analyze loaded sources, without touching the file system.
pub fn analyze(
    sources: &Sources,
    tree: Option<&Phylogeny>,
    predicate: &Predicate,
    stats: &StatsArgs,
) -> Result<Analysis, Report> {
    let combined = join(&sources.assemblies, &sources.metagenomes, &sources.chemistry)?;

    for field in [&stats.group_by, &stats.value] {
        if combined.resolve(field).is_none() {
            return Err(eyre!("Unknown field for summary statistics: {field:?}"))
                .suggestion(format!("Known fields: {}", combined.headers().join(", ")));
        }
    }

    let subset = combined.filter(predicate);

    // summaries only consider rows with a genome
    let genome_rows = subset.iter().filter(|row| row.get("binId").is_some()).collect::<Vec<Row>>();
    let genomes = subset.select(genome_rows.iter().map(|row| row.index()).collect_vec());
    info!("{} of {} joined records are genomes matching the filters.", genomes.len(), combined.len());

    let pruned = tree.map(|tree| {
        let keep = genome_rows.iter().filter_map(|row| row.get("binId")).collect::<BTreeSet<_>>();
        let pruned = tree.prune(keep);
        if pruned.is_empty() {
            warn!("No tips remain in the pruned phylogeny.");
        }
        pruned
    });
    let counts = aggregate::group_count(&genome_rows, &stats.group_by);
    let novelty = aggregate::novelty_by_rank(&genome_rows);
    let summaries = aggregate::summary_stats(&genome_rows, &stats.value, &stats.group_by);
    let novel = genomes.novel_candidates(&stats.novel_ranks);
    drop(genome_rows);

    Ok(Analysis { combined, subset, pruned, counts, novel, novelty, stats: summaries })
}

/// Run the full analysis on input files and write the results.
pub fn run(args: &RunArgs) -> Result<Analysis, Report> {
    let config = match &args.config {
        Some(path) => Config::read(path)?,
        None => Config::default(),
    };
    let predicate = args.filter.predicate()?;

    let reader = FileReader {
        assemblies: args.assemblies.clone(),
        metagenomes: args.metagenomes.clone(),
        chemistry: args.chemistry.clone(),
    };
    info!("Loading sources.");
    let sources = load_all(&reader, &config)?;

    let tree = args.tree.as_ref().map(Phylogeny::read).transpose()?;

    info!("Analyzing records.");
    let analysis = analyze(&sources, tree.as_ref(), &predicate, &args.stats)?;

    info!("Writing results: {:?}", args.output_dir);
    analysis.write(&args.output_dir, &args.stats)?;
    config.write(&args.output_dir.join("config.json"))?;
    args.write(&args.output_dir.join("run_args.json"))?;

    info!("Done.");
    Ok(analysis)
}
