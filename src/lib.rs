//! `soilmag` combines soil **mag**s (metagenome-assembled genomes) with their metagenome
//! annotations and soil chemistry, for taxonomic exploration.
//!
//! ## Why soilmag?
//!
//! Genome bins, the metagenomes they were assembled from and the soil samples those
//! metagenomes were sequenced from are described by three tables, published by different
//! portals with different conventions. `soilmag`:
//!
//! 1. **Normalizes** the identifiers of each source, splitting taxonomy lineages into one
//!    column per rank and sample names into site, plot, layer and collection date.
//! 1. **Joins** the sources into one table with full outer joins, so that nothing is lost.
//! 1. **Filters** the table by taxonomy, site and assembly type.
//! 1. **Prunes** a phylogeny of the genomes down to the filtered genomes.
//! 1. **Summarizes** the genomes, counting by group, finding novel candidates and computing
//!    statistics of a numeric field.
//!
//! ## Example
//!
//! ```rust
//! use soilmag::{filter::Predicate, join::join, load::load_all, normalize::Rank, toy};
//!
//! let sources = load_all(&toy::reader(), &toy::config())?;
//! let combined = join(&sources.assemblies, &sources.metagenomes, &sources.chemistry)?;
//! let subset = combined.filter(&Predicate::by_rank(Rank::Class, "Gammaproteobacteria"));
//! assert_eq!(subset.len(), 2);
//! # Ok::<(), color_eyre::eyre::Report>(())
//! ```

pub mod aggregate;
pub mod cli;
pub mod config;
pub mod error;
pub mod filter;
pub mod join;
pub mod load;
pub mod normalize;
pub mod prune;
pub mod record;
pub mod run;
pub mod toy;

#[doc(inline)]
pub use crate::cli::{Cli, Verbosity};
#[doc(inline)]
pub use crate::config::Config;
#[doc(inline)]
pub use crate::record::RecordSet;
#[doc(inline)]
pub use crate::run::run;
#[doc(inline)]
pub use soilmag_phylo::Phylogeny;
#[doc(inline)]
pub use soilmag_table::Table;
