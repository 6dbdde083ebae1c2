//! Grouped counts, novelty and summary statistics over records.

use crate::normalize::Rank;
use crate::record::{Record, RecordSet, Value, ABSENT};
use color_eyre::eyre::{Report, Result};
use log::debug;
use serde::{Deserialize, Serialize};
use soilmag_table::Table;
use std::collections::BTreeMap;
use strum::IntoEnumIterator;


/// Count records by the value of a field, absent values form their own group.
pub fn group_count<R: Record>(records: &[R], field: &str) -> BTreeMap<Value, usize> {
    let mut counts = BTreeMap::new();
    for record in records {
        let key = Value::from(record.field(field));
        *counts.entry(key).or_insert(0) += 1;
    }
    counts
}

/// Returns true if the record has no name at any of the ranks.
pub fn is_novel<R: Record>(record: &R, ranks: &[Rank]) -> bool {
    ranks.iter().any(|rank| record.field(rank.column()).is_none())
}

/// Returns the records with no name at one or more of the ranks.
///
/// These are candidate novel taxa, genomes that could not be placed at
/// that depth of the reference taxonomy.
pub fn novel_candidates<R>(records: &[R], ranks: &[Rank]) -> Vec<R>
where
    R: Clone + Record,
{
    records.iter().filter(|r| is_novel(*r, ranks)).cloned().collect()
}

/// Count the records with no name at each rank.
pub fn novelty_by_rank<R: Record>(records: &[R]) -> BTreeMap<Rank, usize> {
    Rank::iter()
        .map(|rank| (rank, records.iter().filter(|r| is_novel(*r, &[rank])).count()))
        .collect()
}

/// Summary statistics of the numeric values in one group.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct Summary {
    /// Number of numeric values, absent and non-numeric values are skipped.
    pub count: usize,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub mean: Option<f64>,
}

impl Summary {
    pub fn new(values: &[f64]) -> Self {
        if values.is_empty() {
            return Summary::default();
        }
        let sum: f64 = values.iter().sum();
        Summary {
            count: values.len(),
            min: values.iter().copied().reduce(f64::min),
            max: values.iter().copied().reduce(f64::max),
            mean: Some(sum / values.len() as f64),
        }
    }
}

/// Summarize a numeric field within each group of another field.
///
/// ```rust
/// use soilmag::aggregate::summary_stats;
/// use soilmag::load::load_all;
/// use soilmag::record::Value;
/// use soilmag::toy;
/// let sources = load_all(&toy::reader(), &toy::config())?;
/// let stats = summary_stats(&sources.assemblies, "binCompleteness", "class");
/// let gamma = &stats[&Value::new("Gammaproteobacteria")];
/// assert_eq!((gamma.count, gamma.min, gamma.max), (2, Some(64.0), Some(92.5)));
/// # Ok::<(), color_eyre::eyre::Report>(())
/// ```
pub fn summary_stats<R: Record>(
    records: &[R],
    value_field: &str,
    group_field: &str,
) -> BTreeMap<Value, Summary> {
    let mut groups: BTreeMap<Value, Vec<f64>> = BTreeMap::new();
    for record in records {
        let values = groups.entry(Value::from(record.field(group_field))).or_default();
        let Some(value) = record.field(value_field) else { continue };
        match value.parse::<f64>() {
            Ok(v) if v.is_finite() => values.push(v),
            _ => debug!("Skipping non-numeric {value_field} value: {value:?}"),
        }
    }
    groups.into_iter().map(|(group, values)| (group, Summary::new(&values))).collect()
}

// ----------------------------------------------------------------------------
// Tables

/// Lay out group counts as a table, with columns `<field>` and `count`.
pub fn count_table(field: &str, counts: &BTreeMap<Value, usize>) -> Result<Table<String>, Report> {
    let mut table = Table::new();
    table.headers = vec![field.to_string(), "count".to_string()];
    for (group, count) in counts {
        table.add_row([group.to_string(), count.to_string()])?;
    }
    Ok(table)
}

/// Lay out per-rank novelty counts as a table.
pub fn novelty_table(novelty: &BTreeMap<Rank, usize>) -> Result<Table<String>, Report> {
    let mut table = Table::new();
    table.headers = vec!["rank".to_string(), "novel".to_string()];
    for (rank, count) in novelty {
        table.add_row([rank.to_string(), count.to_string()])?;
    }
    Ok(table)
}

/// Lay out grouped statistics as a table, missing statistics as `NA`.
pub fn stats_table(group: &str, stats: &BTreeMap<Value, Summary>) -> Result<Table<String>, Report> {
    let format = |v: Option<f64>| v.map(|v| v.to_string()).unwrap_or(ABSENT.to_string());
    let mut table = Table::new();
    table.headers = [group, "count", "min", "max", "mean"].map(String::from).to_vec();
    for (value, summary) in stats {
        table.add_row([
            value.to_string(),
            summary.count.to_string(),
            format(summary.min),
            format(summary.max),
            format(summary.mean),
        ])?;
    }
    Ok(table)
}

impl RecordSet {
    /// Returns a new set with the rows that have no name at one or more ranks.
    pub fn novel_candidates(&self, ranks: &[Rank]) -> RecordSet {
        let rows = self.iter().filter(|row| is_novel(row, ranks)).map(|row| row.index());
        self.select(rows.collect::<Vec<_>>())
    }
}
