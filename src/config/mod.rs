//! Configuration of the source schemas, filters and summaries.

use crate::filter::Predicate;
use crate::normalize::{Rank, SampleNameSchema, TaxonomySchema};
use crate::record::{AssemblyType, Source};
use clap::Args;
use color_eyre::eyre::{eyre, Report, Result, WrapErr};
use color_eyre::Help;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::path::Path;


// ----------------------------------------------------------------------------
// Config

/// Layout of the three raw source tables.
///
/// Every field has a default, so a JSON config only needs the keys it
/// overrides.
///
/// ```rust
/// use soilmag::Config;
/// let config: Config = serde_json::from_str(r#"{"combined_label": "Pooled"}"#)?;
/// assert_eq!(config.combined_label, "Pooled");
/// assert_eq!(config.chemistry_suffix, "-COMP");
/// # Ok::<(), color_eyre::eyre::Report>(())
/// ```
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct Config {
    pub taxonomy: TaxonomySchema,
    pub sample_name: SampleNameSchema,
    /// Trailing text removed from chemistry sample ids.
    pub chemistry_suffix: String,
    /// Sample name that marks a combined (pooled) assembly.
    pub combined_label: String,
    /// Metagenome rows whose identifier contains any of these are excluded.
    pub noise_patterns: Vec<String>,
    /// Metagenome columns renamed before validation, `(from, to)`.
    pub metagenome_renames: Vec<(String, String)>,
    pub drop_assembly_columns: Vec<String>,
    pub drop_metagenome_columns: Vec<String>,
    pub drop_chemistry_columns: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            taxonomy: TaxonomySchema::default(),
            sample_name: SampleNameSchema::default(),
            chemistry_suffix: "-COMP".to_string(),
            combined_label: "Combined Assembly".to_string(),
            noise_patterns: vec!["re-annotation".to_string()],
            metagenome_renames: vec![(
                "Genome Name".to_string(),
                crate::load::SAMPLE_NAME_COLUMN.to_string(),
            )],
            drop_assembly_columns: vec!["Bin Methods".to_string(), "Created By".to_string()],
            drop_metagenome_columns: vec!["Sequencing Center".to_string()],
            drop_chemistry_columns: ["uid", "remarks", "dataQF", "publicationDate", "release"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

impl Config {
    /// The irrelevant columns dropped from a source.
    pub fn dropped_columns(&self, source: Source) -> &[String] {
        match source {
            Source::Assembly => &self.drop_assembly_columns,
            Source::Metagenome => &self.drop_metagenome_columns,
            Source::Chemistry => &self.drop_chemistry_columns,
            Source::Key => &[],
        }
    }

    /// Reads a [`Config`] from a JSON file.
    pub fn read<P>(path: &P) -> Result<Config, Report>
    where
        P: AsRef<Path> + Debug,
    {
        let input = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("Failed to read config: {path:?}."))?;
        let config = serde_json::from_str(&input)
            .wrap_err_with(|| format!("Failed to deserialize config: {path:?}"))?;
        Ok(config)
    }

    /// Write a [`Config`] to a JSON file.
    pub fn write<P>(&self, path: &P) -> Result<(), Report>
    where
        P: AsRef<Path> + Debug,
    {
        let output = serde_json::to_string_pretty(self)
            .wrap_err(format!("Failed to serialize config: {self:?}"))?;
        std::fs::write(path, output).wrap_err(format!("Failed to write config: {path:?}"))?;
        Ok(())
    }
}

// ----------------------------------------------------------------------------
// FilterArgs

/// Optional filters, combined with a logical AND.
#[derive(Args, Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct FilterArgs {
    /// Keep genomes whose name at this rank contains --pattern.
    #[arg(long, requires = "pattern")]
    pub rank: Option<Rank>,

    /// Case-sensitive text to search for at --rank.
    #[arg(long, requires = "rank")]
    pub pattern: Option<String>,

    /// Keep genomes whose collection site contains this text.
    #[arg(long)]
    pub site: Option<String>,

    /// Keep genomes from this kind of assembly.
    #[arg(long, value_enum)]
    pub assembly_type: Option<AssemblyType>,
}

impl FilterArgs {
    /// Build the [`Predicate`] for these filters, which matches everything
    /// when no filter is set.
    pub fn predicate(&self) -> Result<Predicate, Report> {
        let mut predicates = Vec::new();
        match (&self.rank, &self.pattern) {
            (Some(rank), Some(pattern)) => predicates.push(Predicate::by_rank(*rank, pattern)),
            (None, None) => (),
            _ => Err::<(), Report>(eyre!("A rank filter needs both a rank and a pattern."))
                .suggestion("Please specify both --rank and --pattern.")?,
        }
        if let Some(site) = &self.site {
            predicates.push(Predicate::by_site(site));
        }
        if let Some(assembly_type) = self.assembly_type {
            predicates.push(Predicate::by_assembly_type(assembly_type));
        }
        Ok(Predicate::All(predicates))
    }
}

// ----------------------------------------------------------------------------
// StatsArgs

/// Options for the grouped summaries.
#[derive(Args, Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct StatsArgs {
    /// Field to group counts and statistics by.
    #[arg(long, default_value_t = StatsArgs::default().group_by)]
    pub group_by: String,

    /// Numeric field to summarize within each group.
    #[arg(long, default_value_t = StatsArgs::default().value)]
    pub value: String,

    /// A genome is a novel candidate if it has no name at any of these ranks.
    #[arg(long, value_enum, value_delimiter = ',', default_values_t = StatsArgs::default().novel_ranks)]
    pub novel_ranks: Vec<Rank>,
}

impl Default for StatsArgs {
    fn default() -> Self {
        StatsArgs {
            group_by: Rank::Class.column().to_string(),
            value: "binCompleteness".to_string(),
            novel_ranks: vec![Rank::Species],
        }
    }
}
