//! Read the raw source tables into typed records.
//!
//! Each loader validates the required columns, renames and drops columns,
//! excludes noise rows, then normalizes every row. The three sources can be
//! loaded concurrently with [`load_all`].

use crate::config::Config;
use crate::error::LoadError;
use crate::normalize::{normalize_chemistry_key, SampleName};
use crate::record::{
    AssemblyType, ChemistryRecord, GenomeRecord, MetagenomeRecord, Source, Tabular, Value,
};
use color_eyre::eyre::{eyre, Report, Result, WrapErr};
use itertools::Itertools;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use soilmag_table::Table;
use std::path::PathBuf;
use std::str::FromStr;


pub const SAMPLE_NAME_COLUMN: &str = "Genome Name / Sample Name";
pub const BIN_ID_COLUMN: &str = "Bin ID";
pub const LINEAGE_COLUMN: &str = "GTDB Taxonomy Lineage";
pub const COMPLETENESS_COLUMN: &str = "Bin Completeness";
pub const TOTAL_BASES_COLUMN: &str = "Total Number of Bases";
pub const GENE_COUNT_COLUMN: &str = "Gene Count";

const ASSEMBLY_COLUMNS: &[&str] = &[
    SAMPLE_NAME_COLUMN,
    BIN_ID_COLUMN,
    LINEAGE_COLUMN,
    COMPLETENESS_COLUMN,
    TOTAL_BASES_COLUMN,
    GENE_COUNT_COLUMN,
];
const METAGENOME_COLUMNS: &[&str] = &[SAMPLE_NAME_COLUMN];

// ----------------------------------------------------------------------------
// Readers

/// Supplies the raw table of each source.
pub trait TableReader: Sync {
    fn read_table(&self, source: Source) -> Result<Table<String>, Report>;
}

/// Reads each source from a delimited file.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct FileReader {
    pub assemblies: PathBuf,
    pub metagenomes: PathBuf,
    pub chemistry: PathBuf,
}

impl TableReader for FileReader {
    fn read_table(&self, source: Source) -> Result<Table<String>, Report> {
        let path = match source {
            Source::Assembly => &self.assemblies,
            Source::Metagenome => &self.metagenomes,
            Source::Chemistry => &self.chemistry,
            Source::Key => return Err(eyre!("There is no input table for join keys.")),
        };
        Table::read(path, Some(source.delimiter()))
            .wrap_err_with(|| format!("Failed to read the {source} table: {path:?}"))
    }
}

/// Serves each source from in-memory text.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MemoryReader {
    pub assemblies: String,
    pub metagenomes: String,
    pub chemistry: String,
}

impl TableReader for MemoryReader {
    fn read_table(&self, source: Source) -> Result<Table<String>, Report> {
        let text = match source {
            Source::Assembly => &self.assemblies,
            Source::Metagenome => &self.metagenomes,
            Source::Chemistry => &self.chemistry,
            Source::Key => return Err(eyre!("There is no input table for join keys.")),
        };
        Table::from_reader(text.as_bytes(), source.delimiter())
            .wrap_err_with(|| format!("Failed to read the {source} table."))
    }
}

// ----------------------------------------------------------------------------
// Raw rows

/// A validated raw table and the source it was read from.
struct SourceTable {
    table: Table<String>,
    source: Source,
    required: &'static [&'static str],
}

impl SourceTable {
    /// Rename, validate and drop columns of a raw table.
    fn new(
        table: &Table<String>,
        source: Source,
        required: &'static [&'static str],
        config: &Config,
    ) -> Result<Self, Report> {
        let mut table = table.clone();

        if source == Source::Metagenome {
            for (from, to) in &config.metagenome_renames {
                if table.has_header(from) && !table.has_header(to) {
                    table.rename_column(from, to)?;
                }
            }
        }

        if !table.headers.is_empty() {
            if let Some(column) = required.iter().find(|c| !table.has_header(c)) {
                Err(LoadError::SchemaMismatch { input: source, column: column.to_string() })?
            }
        }

        let dropped = config
            .dropped_columns(source)
            .iter()
            .filter(|c| !required.contains(&c.as_str()))
            .collect_vec();
        let table = table.drop_columns(&dropped);

        Ok(SourceTable { table, source, required })
    }

    fn index(&self, column: &str) -> Result<usize, Report> {
        self.table.get_header_index(column)
    }

    fn text(&self, row: &[String], column: &str) -> Result<Value, Report> {
        Ok(Value::new(&row[self.index(column)?]))
    }

    /// Parse a numeric cell, absent cells are [`None`].
    fn number<N: FromStr>(&self, row: &[String], i: usize, column: &str) -> Result<Option<N>, Report> {
        let value = self.text(row, column)?;
        let Some(text) = value.as_str() else { return Ok(None) };
        let n = text.parse::<N>().map_err(|_| LoadError::InvalidNumber {
            input: self.source,
            column: column.to_string(),
            row: i + 1,
            value: text.to_string(),
        })?;
        Ok(Some(n))
    }

    /// Decompose the sample identifier of a row.
    ///
    /// A collection date that is not a calendar date is kept as text.
    fn sample(&self, row: &[String], i: usize, config: &Config) -> Result<SampleName, Report> {
        let raw = &row[self.index(SAMPLE_NAME_COLUMN)?];
        let sample = config.sample_name.decompose(raw).map_err(|e| {
            debug!("{e}");
            LoadError::MalformedIdentifier { input: self.source, row: i + 1, value: raw.clone() }
        })?;
        if let Some(date) = &sample.collection_date {
            if sample.parse_collection_date().is_none() {
                warn!("{} row {}: collection date is not a YYYYMMDD date: {date:?}", self.source, i + 1);
            }
        }
        Ok(sample)
    }

    /// The passthrough columns of a row, in table order.
    fn attributes(&self, row: &[String]) -> Vec<(String, Value)> {
        self.table
            .headers
            .iter()
            .zip(row)
            .filter(|(header, _)| !self.required.contains(&header.as_str()))
            .map(|(header, value)| (header.clone(), Value::new(value)))
            .collect()
    }
}

// ----------------------------------------------------------------------------
// Loaders

/// Load genome (bin) records from the assembly table.
pub fn load_assemblies(table: &Table<String>, config: &Config) -> Result<Vec<GenomeRecord>, Report> {
    let source = SourceTable::new(table, Source::Assembly, ASSEMBLY_COLUMNS, config)?;

    let records = source
        .table
        .rows
        .iter()
        .enumerate()
        .map(|(i, row)| -> Result<GenomeRecord, Report> {
            let sample = source.sample(row, i, config)?;
            let assembly_type = match sample.sample_name == config.combined_label {
                true => AssemblyType::Combined,
                false => AssemblyType::Individual,
            };
            let taxonomy_lineage = source.text(row, LINEAGE_COLUMN)?;
            let lineage = taxonomy_lineage
                .as_str()
                .map(|l| config.taxonomy.decompose(l))
                .unwrap_or_default();

            Ok(GenomeRecord {
                sample,
                assembly_type,
                bin_id: source.text(row, BIN_ID_COLUMN)?,
                taxonomy_lineage,
                lineage,
                bin_completeness: source.number(row, i, COMPLETENESS_COLUMN)?,
                total_bases: source.number(row, i, TOTAL_BASES_COLUMN)?,
                gene_count: source.number(row, i, GENE_COUNT_COLUMN)?,
                attributes: source.attributes(row),
            })
        })
        .collect::<Result<Vec<_>, Report>>()?;

    info!("Loaded {} {} records.", records.len(), GenomeRecord::SOURCE);
    Ok(records)
}

/// Load metagenome records, excluding the rows that match a noise pattern.
pub fn load_metagenomes(
    table: &Table<String>,
    config: &Config,
) -> Result<Vec<MetagenomeRecord>, Report> {
    let source = SourceTable::new(table, Source::Metagenome, METAGENOME_COLUMNS, config)?;

    let mut excluded = 0;
    let mut records = Vec::new();
    for (i, row) in source.table.rows.iter().enumerate() {
        let raw = &row[source.index(SAMPLE_NAME_COLUMN)?];
        if config.noise_patterns.iter().any(|p| raw.contains(p.as_str())) {
            debug!("Excluding metagenome row {}: {raw:?}", i + 1);
            excluded += 1;
            continue;
        }
        records.push(MetagenomeRecord {
            sample: source.sample(row, i, config)?,
            attributes: source.attributes(row),
        });
    }

    info!("Loaded {} {} records ({excluded} excluded).", records.len(), MetagenomeRecord::SOURCE);
    Ok(records)
}

/// Load soil chemistry records, with normalized sample ids.
pub fn load_chemistry(table: &Table<String>, config: &Config) -> Result<Vec<ChemistryRecord>, Report> {
    let source = SourceTable::new(table, Source::Chemistry, ChemistryRecord::COLUMNS, config)?;

    let records = source
        .table
        .rows
        .iter()
        .enumerate()
        .map(|(i, row)| -> Result<ChemistryRecord, Report> {
            let raw = &row[source.index("genomicsSampleID")?];
            let genomics_sample_id = normalize_chemistry_key(raw, &config.chemistry_suffix);
            if genomics_sample_id.is_empty() {
                Err(LoadError::MalformedIdentifier {
                    input: Source::Chemistry,
                    row: i + 1,
                    value: raw.clone(),
                })?
            }

            Ok(ChemistryRecord {
                genomics_sample_id,
                soil_in_water_ph: source.number(row, i, "soilInWaterpH")?,
                soil_in_cacl_ph: source.number(row, i, "soilInCaClpH")?,
                soil_temp: source.number(row, i, "soilTemp")?,
                elevation: source.number(row, i, "elevation")?,
                nlcd_class: source.text(row, "nlcdClass")?,
                ecosystem_subtype: source.text(row, "ecosystemsubtype")?,
                attributes: source.attributes(row),
            })
        })
        .collect::<Result<Vec<_>, Report>>()?;

    info!("Loaded {} {} records.", records.len(), ChemistryRecord::SOURCE);
    Ok(records)
}

/// The typed records of all three sources.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Sources {
    pub assemblies: Vec<GenomeRecord>,
    pub metagenomes: Vec<MetagenomeRecord>,
    pub chemistry: Vec<ChemistryRecord>,
}

/// Read and load the three sources concurrently.
///
/// All three loads run to completion, the first error (in assembly,
/// metagenome, chemistry order) is returned and no partial result is kept.
pub fn load_all<R: TableReader>(reader: &R, config: &Config) -> Result<Sources, Report> {
    let (assemblies, (metagenomes, chemistry)) = rayon::join(
        || reader.read_table(Source::Assembly).and_then(|t| load_assemblies(&t, config)),
        || {
            rayon::join(
                || reader.read_table(Source::Metagenome).and_then(|t| load_metagenomes(&t, config)),
                || reader.read_table(Source::Chemistry).and_then(|t| load_chemistry(&t, config)),
            )
        },
    );

    Ok(Sources { assemblies: assemblies?, metagenomes: metagenomes?, chemistry: chemistry? })
}
