//! Decompose composite text fields into atomic, typed fields.
//!
//! Two composite fields are handled:
//!
//! - A GTDB taxonomy lineage, ex. `d__Bacteria;p__Pseudomonadota;...;s__`,
//!   is split into seven positional [`Rank`] slots by a [`TaxonomySchema`].
//! - A sample identifier, ex. `Harvard Forest - HARV_033-M-20180604-COMP`,
//!   is split into a [`SampleName`] by a [`SampleNameSchema`].

use crate::error::NormalizeError;
use crate::record::Value;
use chrono::NaiveDate;
use itertools::Itertools;
use log::debug;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use strum::{Display, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};

#[cfg(test)]
mod tests;

// ----------------------------------------------------------------------------
// Taxonomy

/// The seven taxonomic ranks, from broadest to narrowest.
#[derive(
    Clone,
    Copy,
    Debug,
    Deserialize,
    Display,
    EnumIter,
    EnumString,
    Eq,
    Hash,
    IntoStaticStr,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
    clap::ValueEnum,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Rank {
    Domain,
    Phylum,
    Class,
    Order,
    Family,
    Genus,
    Species,
}

impl Rank {
    /// The GTDB prefix of this rank, ex. `p__`.
    pub fn prefix(&self) -> &'static str {
        match self {
            Rank::Domain => "d__",
            Rank::Phylum => "p__",
            Rank::Class => "c__",
            Rank::Order => "o__",
            Rank::Family => "f__",
            Rank::Genus => "g__",
            Rank::Species => "s__",
        }
    }

    /// The record column holding this rank, ex. `phylum`.
    pub fn column(&self) -> &'static str {
        (*self).into()
    }
}

/// One taxonomy lineage, with an optional name at every [`Rank`].
#[derive(Clone, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct Lineage {
    slots: [Option<String>; 7],
}

impl Lineage {
    pub fn get(&self, rank: Rank) -> Option<&str> {
        self.slots[rank as usize].as_deref()
    }

    pub fn set(&mut self, rank: Rank, name: Option<String>) {
        self.slots[rank as usize] = name;
    }

    /// Iterate over all ranks in order, including the absent ones.
    pub fn iter(&self) -> impl Iterator<Item = (Rank, Option<&str>)> {
        Rank::iter().map(|rank| (rank, self.get(rank)))
    }
}

/// Declarative description of a lineage string: ordered ranks with their
/// prefixes, and the slot delimiter.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct TaxonomySchema {
    pub ranks: Vec<(Rank, String)>,
    pub delimiter: char,
}

impl Default for TaxonomySchema {
    fn default() -> Self {
        TaxonomySchema {
            ranks: Rank::iter().map(|rank| (rank, rank.prefix().to_string())).collect(),
            delimiter: ';',
        }
    }
}

impl TaxonomySchema {
    /// Split a lineage string into positional rank slots.
    ///
    /// The first occurrence of each prefix is removed wherever it appears,
    /// then the remainder is split on the delimiter. Empty or missing
    /// trailing slots are absent.
    ///
    /// ```rust
    /// use soilmag::normalize::{Rank, TaxonomySchema};
    /// let schema = TaxonomySchema::default();
    /// let lineage = schema.decompose("d__Bacteria;p__Pseudomonadota;c__Gammaproteobacteria;o__;f__;g__;s__");
    /// assert_eq!(lineage.get(Rank::Class), Some("Gammaproteobacteria"));
    /// assert_eq!(lineage.get(Rank::Order), None);
    /// ```
    pub fn decompose(&self, lineage: &str) -> Lineage {
        let stripped = self
            .ranks
            .iter()
            .fold(lineage.to_string(), |text, (_, prefix)| text.replacen(prefix.as_str(), "", 1));

        let slots = stripped.split(self.delimiter).collect_vec();
        if slots.len() > self.ranks.len() {
            debug!("Ignoring {} extra lineage slots: {lineage:?}", slots.len() - self.ranks.len());
        }

        let mut result = Lineage::default();
        self.ranks.iter().zip(slots).for_each(|((rank, _), slot)| {
            result.set(*rank, Value::new(slot).as_str().map(String::from));
        });
        result
    }

    /// Rebuild a lineage string, absent slots written as a bare prefix.
    pub fn compose(&self, lineage: &Lineage) -> String {
        self.ranks
            .iter()
            .map(|(rank, prefix)| format!("{prefix}{}", lineage.get(*rank).unwrap_or_default()))
            .join(&self.delimiter.to_string())
    }
}

// ----------------------------------------------------------------------------
// Sample Names

/// The atomic parts of a sample identifier.
///
/// `site` and `sample_name` are always present, the rest are absent when
/// the identifier has too few delimiters.
#[derive(Clone, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct SampleName {
    pub site: String,
    pub sample_name: String,
    pub site_id: Option<String>,
    pub subplot: Option<String>,
    pub layer: Option<String>,
    pub collection_date: Option<String>,
}

impl SampleName {
    /// The collection date as a calendar date, when it is a valid `YYYYMMDD`.
    pub fn parse_collection_date(&self) -> Option<NaiveDate> {
        let date = self.collection_date.as_deref()?;
        NaiveDate::parse_from_str(date, "%Y%m%d").ok()
    }

    pub(crate) fn field(&self, name: &str) -> Option<Cow<'_, str>> {
        let value = match name {
            "site" => Some(self.site.as_str()),
            "sampleName" => Some(self.sample_name.as_str()),
            "siteId" => self.site_id.as_deref(),
            "subplot" => self.subplot.as_deref(),
            "layer" => self.layer.as_deref(),
            "collectionDate" => self.collection_date.as_deref(),
            _ => None,
        };
        value.map(Cow::Borrowed)
    }

    pub(crate) fn values(&self) -> Vec<Value> {
        vec![
            Value::new(&self.site),
            Value::new(&self.sample_name),
            Value::from(self.site_id.as_deref()),
            Value::from(self.subplot.as_deref()),
            Value::from(self.layer.as_deref()),
            Value::from(self.collection_date.as_deref()),
        ]
    }
}

/// The fixed text that frames a sample identifier.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct SampleNameSchema {
    /// Leading text removed before anything else.
    pub boilerplate: String,
    /// Separates the site from the sample name.
    pub separator: String,
    /// Trailing text removed from the sample name.
    pub suffix: String,
    /// Separates the site id from the rest of the sample name.
    pub site_delimiter: char,
    /// Separates subplot, layer and collection date.
    pub part_delimiter: char,
}

impl Default for SampleNameSchema {
    fn default() -> Self {
        SampleNameSchema {
            boilerplate: "Soil microbial communities from ".to_string(),
            separator: " - ".to_string(),
            suffix: "-COMP".to_string(),
            site_delimiter: '_',
            part_delimiter: '-',
        }
    }
}

impl SampleNameSchema {
    /// Decompose a raw sample identifier.
    ///
    /// ```rust
    /// use soilmag::normalize::SampleNameSchema;
    /// let schema = SampleNameSchema::default();
    /// let sample = schema.decompose("Site A - S1_P1-O-20200101")?;
    /// assert_eq!(sample.site, "Site A");
    /// assert_eq!(sample.sample_name, "S1_P1-O-20200101");
    /// assert_eq!(sample.site_id.as_deref(), Some("S1"));
    /// assert_eq!(sample.collection_date.as_deref(), Some("20200101"));
    /// # Ok::<(), soilmag::error::NormalizeError>(())
    /// ```
    pub fn decompose(&self, raw: &str) -> Result<SampleName, NormalizeError> {
        let malformed = |reason: String| NormalizeError::MalformedIdentifier {
            value: raw.to_string(),
            reason,
        };

        let text = raw.trim();
        let text = text.strip_prefix(self.boilerplate.as_str()).unwrap_or(text);

        let (site, sample_name) = text
            .split_once(self.separator.as_str())
            .ok_or_else(|| malformed(format!("missing the {:?} separator", self.separator)))?;
        let site = site.trim();
        let sample_name = sample_name.trim();
        let sample_name = sample_name.strip_suffix(self.suffix.as_str()).unwrap_or(sample_name);

        if site.is_empty() {
            return Err(malformed("the site is empty".to_string()));
        }
        if sample_name.is_empty() {
            return Err(malformed("the sample name is empty".to_string()));
        }

        let (site_id, rest) = match sample_name.split_once(self.site_delimiter) {
            Some((site_id, rest)) => (site_id, Some(rest)),
            None => (sample_name, None),
        };
        let mut parts = rest.into_iter().flat_map(|rest| rest.splitn(3, self.part_delimiter));
        let mut next = || parts.next().filter(|p| !p.is_empty()).map(String::from);

        Ok(SampleName {
            site: site.to_string(),
            sample_name: sample_name.to_string(),
            site_id: (!site_id.is_empty()).then(|| site_id.to_string()),
            subplot: next(),
            layer: next(),
            collection_date: next(),
        })
    }
}

/// Normalize a chemistry sample id by removing a trailing suffix.
///
/// ```rust
/// use soilmag::normalize::normalize_chemistry_key;
/// assert_eq!(normalize_chemistry_key("HARV_033-M-20180604-COMP", "-COMP"), "HARV_033-M-20180604");
/// assert_eq!(normalize_chemistry_key("HARV_033-M-20180604", "-COMP"), "HARV_033-M-20180604");
/// ```
pub fn normalize_chemistry_key(raw: &str, suffix: &str) -> String {
    let raw = raw.trim();
    raw.strip_suffix(suffix).unwrap_or(raw).trim().to_string()
}
