//! Typed source records and the denormalized [`RecordSet`] they are joined into.

use crate::normalize::{Lineage, Rank, SampleName};
use color_eyre::eyre::{eyre, Report, Result};
use color_eyre::Help;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use soilmag_table::Table;
use std::borrow::Cow;
use std::fmt::Debug;
use std::path::Path;
use strum::{AsRefStr, Display, EnumIter};

#[cfg(test)]
mod tests;

/// Sentinel written for an [`Value::Absent`] cell.
pub const ABSENT: &str = "NA";

// ----------------------------------------------------------------------------
// Value

/// A single cell, which is either missing or holds text.
///
/// Empty strings and the `NA` sentinel are both read as [`Value::Absent`].
///
/// ```rust
/// use soilmag::record::Value;
/// assert_eq!(Value::new(""), Value::Absent);
/// assert_eq!(Value::new("NA"), Value::Absent);
/// assert_eq!(Value::new(" Bacteria "), Value::Present("Bacteria".to_string()));
/// assert_eq!(Value::Absent.to_string(), "NA");
/// ```
#[derive(Clone, Debug, Default, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum Value {
    #[default]
    Absent,
    Present(String),
}

impl Value {
    pub fn new(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.is_empty() || raw == ABSENT {
            Value::Absent
        } else {
            Value::Present(raw.to_string())
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Absent => None,
            Value::Present(s) => Some(s.as_str()),
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Value::Absent)
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.as_str().unwrap_or(ABSENT))
    }
}

impl<T: ToString> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Value::new(&v.to_string()),
            None => Value::Absent,
        }
    }
}

// ----------------------------------------------------------------------------
// Source and Column

/// The origin of a column in a [`RecordSet`].
#[derive(
    Clone, Copy, Debug, Deserialize, Display, EnumIter, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize,
)]
#[strum(serialize_all = "lowercase")]
pub enum Source {
    Assembly,
    Metagenome,
    Chemistry,
    /// A join key shared by both sides of a join.
    Key,
}

impl Source {
    /// Field delimiter of the raw source table.
    pub fn delimiter(&self) -> u8 {
        match self {
            Source::Assembly => b',',
            _ => b'\t',
        }
    }
}

/// A named column and the source it came from.
#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct Column {
    pub name: String,
    pub source: Source,
}

impl Column {
    pub fn new(name: &str, source: Source) -> Self {
        Column { name: name.to_string(), source }
    }

    /// The column name without its `.<source>` qualifier, ex. `site` for
    /// `site.assembly`.
    pub fn base_name(&self) -> &str {
        match self.source {
            Source::Key => &self.name,
            source => self.name.strip_suffix(&format!(".{source}")).unwrap_or(&self.name),
        }
    }

    /// The column name qualified by its source, ex. `site.assembly`.
    ///
    /// An already qualified name is returned unchanged.
    pub fn disambiguated(&self) -> String {
        format!("{}.{}", self.base_name(), self.source)
    }
}

// ----------------------------------------------------------------------------
// Record traits

/// Named field access shared by typed records and [`RecordSet`] rows.
///
/// Returns [`None`] when the field is absent or unknown.
pub trait Record {
    fn field(&self, name: &str) -> Option<Cow<'_, str>>;
}

/// A typed record that can be laid out as a row of a [`RecordSet`].
pub trait Tabular: Record {
    const SOURCE: Source;
    /// Normalized columns, in output order, before any passthrough columns.
    const COLUMNS: &'static [&'static str];

    /// Passthrough columns kept from the raw source table.
    fn attributes(&self) -> &[(String, Value)];

    /// Values of [`Tabular::COLUMNS`] followed by the passthrough values.
    fn values(&self) -> Vec<Value>;
}

fn attribute<'a>(attributes: &'a [(String, Value)], name: &str) -> Option<Cow<'a, str>> {
    attributes.iter().find(|(n, _)| n == name).and_then(|(_, v)| v.as_str()).map(Cow::Borrowed)
}

fn number<T: ToString>(value: Option<T>) -> Option<Cow<'static, str>> {
    value.map(|v| Cow::Owned(v.to_string()))
}

// ----------------------------------------------------------------------------
// Typed records

/// Whether a genome was binned from a single sample or pooled samples.
#[derive(
    AsRefStr,
    Clone,
    Copy,
    Debug,
    Default,
    Deserialize,
    Display,
    Eq,
    Hash,
    PartialEq,
    Serialize,
    clap::ValueEnum,
)]
pub enum AssemblyType {
    #[default]
    Individual,
    Combined,
}

/// One metagenome-assembled genome (bin).
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct GenomeRecord {
    pub sample: SampleName,
    pub assembly_type: AssemblyType,
    pub bin_id: Value,
    pub taxonomy_lineage: Value,
    pub lineage: Lineage,
    pub bin_completeness: Option<f64>,
    pub total_bases: Option<u64>,
    pub gene_count: Option<u64>,
    pub attributes: Vec<(String, Value)>,
}

impl Record for GenomeRecord {
    fn field(&self, name: &str) -> Option<Cow<'_, str>> {
        match name {
            "assemblyType" => Some(Cow::Borrowed(self.assembly_type.as_ref())),
            "binId" => self.bin_id.as_str().map(Cow::Borrowed),
            "taxonomyLineage" => self.taxonomy_lineage.as_str().map(Cow::Borrowed),
            "binCompleteness" => number(self.bin_completeness),
            "totalBases" => number(self.total_bases),
            "geneCount" => number(self.gene_count),
            _ => match name.parse::<Rank>() {
                Ok(rank) => self.lineage.get(rank).map(Cow::Borrowed),
                Err(_) => self.sample.field(name).or_else(|| attribute(&self.attributes, name)),
            },
        }
    }
}

impl Tabular for GenomeRecord {
    const SOURCE: Source = Source::Assembly;
    const COLUMNS: &'static [&'static str] = &[
        "site",
        "sampleName",
        "siteId",
        "subplot",
        "layer",
        "collectionDate",
        "assemblyType",
        "binId",
        "taxonomyLineage",
        "domain",
        "phylum",
        "class",
        "order",
        "family",
        "genus",
        "species",
        "binCompleteness",
        "totalBases",
        "geneCount",
    ];

    fn attributes(&self) -> &[(String, Value)] {
        &self.attributes
    }

    fn values(&self) -> Vec<Value> {
        let mut values = self.sample.values();
        values.push(Value::new(self.assembly_type.as_ref()));
        values.push(self.bin_id.clone());
        values.push(self.taxonomy_lineage.clone());
        values.extend(self.lineage.iter().map(|(_, v)| Value::from(v)));
        values.push(Value::from(self.bin_completeness));
        values.push(Value::from(self.total_bases));
        values.push(Value::from(self.gene_count));
        values.extend(self.attributes.iter().map(|(_, v)| v.clone()));
        values
    }
}

/// Annotation metadata of one sequenced metagenome.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct MetagenomeRecord {
    pub sample: SampleName,
    pub attributes: Vec<(String, Value)>,
}

impl Record for MetagenomeRecord {
    fn field(&self, name: &str) -> Option<Cow<'_, str>> {
        self.sample.field(name).or_else(|| attribute(&self.attributes, name))
    }
}

impl Tabular for MetagenomeRecord {
    const SOURCE: Source = Source::Metagenome;
    const COLUMNS: &'static [&'static str] =
        &["site", "sampleName", "siteId", "subplot", "layer", "collectionDate"];

    fn attributes(&self) -> &[(String, Value)] {
        &self.attributes
    }

    fn values(&self) -> Vec<Value> {
        let mut values = self.sample.values();
        values.extend(self.attributes.iter().map(|(_, v)| v.clone()));
        values
    }
}

/// Soil chemistry measured on one genomics sample.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct ChemistryRecord {
    pub genomics_sample_id: String,
    pub soil_in_water_ph: Option<f64>,
    pub soil_in_cacl_ph: Option<f64>,
    pub soil_temp: Option<f64>,
    pub elevation: Option<f64>,
    pub nlcd_class: Value,
    pub ecosystem_subtype: Value,
    pub attributes: Vec<(String, Value)>,
}

impl Record for ChemistryRecord {
    fn field(&self, name: &str) -> Option<Cow<'_, str>> {
        match name {
            "genomicsSampleID" => Some(Cow::Borrowed(self.genomics_sample_id.as_str())),
            "soilInWaterpH" => number(self.soil_in_water_ph),
            "soilInCaClpH" => number(self.soil_in_cacl_ph),
            "soilTemp" => number(self.soil_temp),
            "elevation" => number(self.elevation),
            "nlcdClass" => self.nlcd_class.as_str().map(Cow::Borrowed),
            "ecosystemsubtype" => self.ecosystem_subtype.as_str().map(Cow::Borrowed),
            _ => attribute(&self.attributes, name),
        }
    }
}

impl Tabular for ChemistryRecord {
    const SOURCE: Source = Source::Chemistry;
    const COLUMNS: &'static [&'static str] = &[
        "genomicsSampleID",
        "soilInWaterpH",
        "soilInCaClpH",
        "soilTemp",
        "elevation",
        "nlcdClass",
        "ecosystemsubtype",
    ];

    fn attributes(&self) -> &[(String, Value)] {
        &self.attributes
    }

    fn values(&self) -> Vec<Value> {
        let mut values = vec![
            Value::new(&self.genomics_sample_id),
            Value::from(self.soil_in_water_ph),
            Value::from(self.soil_in_cacl_ph),
            Value::from(self.soil_temp),
            Value::from(self.elevation),
            self.nlcd_class.clone(),
            self.ecosystem_subtype.clone(),
        ];
        values.extend(self.attributes.iter().map(|(_, v)| v.clone()));
        values
    }
}

// ----------------------------------------------------------------------------
// RecordSet

/// A denormalized table of records with source-tagged columns.
///
/// Every operation on a [`RecordSet`] (filter, join) returns a new set.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct RecordSet {
    pub columns: Vec<Column>,
    pub rows: Vec<Vec<Value>>,
}

impl RecordSet {
    pub fn new() -> Self {
        RecordSet { columns: Vec::new(), rows: Vec::new() }
    }

    /// Lay out typed records as a [`RecordSet`].
    ///
    /// The normalized columns are always present, even with no records,
    /// so that an empty source can still take part in a join.
    pub fn from_records<R: Tabular>(records: &[R]) -> Self {
        let mut columns = R::COLUMNS.iter().map(|name| Column::new(name, R::SOURCE)).collect_vec();
        if let Some(first) = records.first() {
            columns.extend(first.attributes().iter().map(|(name, _)| Column::new(name, R::SOURCE)));
        }
        let rows = records.iter().map(|r| r.values()).collect_vec();
        RecordSet { columns, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn headers(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Index of the column with exactly this name.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Indices of the columns a field name can refer to, in preference order.
    ///
    /// An exact column name comes first. Then the disambiguated columns
    /// (`name.assembly`, `name.metagenome`, `name.chemistry`) in that order.
    fn candidates(&self, field: &str) -> Vec<usize> {
        let qualified = [Source::Assembly, Source::Metagenome, Source::Chemistry]
            .map(|source| format!("{field}.{source}"));
        std::iter::once(field)
            .chain(qualified.iter().map(String::as_str))
            .filter_map(|name| self.position(name))
            .collect()
    }

    /// Index of the preferred column a field name refers to.
    ///
    /// This is only the first candidate, [`RecordSet::get`] resolves each row
    /// to its first present candidate.
    pub fn resolve(&self, field: &str) -> Option<usize> {
        self.candidates(field).into_iter().next()
    }

    /// Returns the value of a field in one row, if it is present.
    ///
    /// When the field was disambiguated by a join, the first present column
    /// in source order is used, ex. `site.metagenome` for a metagenome-only row.
    pub fn get(&self, row: usize, field: &str) -> Option<&str> {
        let row = self.rows.get(row)?;
        self.candidates(field).into_iter().find_map(|col| row.get(col)?.as_str())
    }

    /// Returns every value of a field, resolved row by row like [`RecordSet::get`].
    pub fn column(&self, field: &str) -> Result<Vec<&Value>, Report> {
        let candidates = self.candidates(field);
        let Some(first) = candidates.first() else {
            return Err(eyre!("Unknown field: {field:?}"))
                .suggestion(format!("Known columns: {}", self.headers().join(", ")));
        };
        let values = self
            .rows
            .iter()
            .map(|row| candidates.iter().map(|c| &row[*c]).find(|v| !v.is_absent()).unwrap_or(&row[*first]))
            .collect();
        Ok(values)
    }

    pub fn iter(&self) -> impl Iterator<Item = Row<'_>> {
        (0..self.rows.len()).map(|index| Row { set: self, index })
    }

    /// Returns a new set with the same columns and only the given rows.
    pub fn select<I>(&self, rows: I) -> RecordSet
    where
        I: IntoIterator<Item = usize>,
    {
        let rows = rows.into_iter().filter_map(|i| self.rows.get(i).cloned()).collect();
        RecordSet { columns: self.columns.clone(), rows }
    }

    pub fn to_table(&self) -> Table<Value> {
        let mut table = Table::new();
        table.headers = self.columns.iter().map(|c| c.name.clone()).collect();
        table.rows = self.rows.clone();
        table
    }

    /// Write the set as a tab-separated table, absent values as `NA`.
    pub fn write<P>(&self, path: &P) -> Result<(), Report>
    where
        P: AsRef<Path> + Debug,
    {
        self.to_table().write(path, Some(b'\t'))
    }
}

/// A borrowed view of one row of a [`RecordSet`].
#[derive(Clone, Copy, Debug)]
pub struct Row<'r> {
    set: &'r RecordSet,
    index: usize,
}

impl<'r> Row<'r> {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn values(&self) -> &'r [Value] {
        &self.set.rows[self.index]
    }

    pub fn get(&self, field: &str) -> Option<&'r str> {
        self.set.get(self.index, field)
    }
}

impl Record for Row<'_> {
    fn field(&self, name: &str) -> Option<Cow<'_, str>> {
        self.get(name).map(Cow::Borrowed)
    }
}
