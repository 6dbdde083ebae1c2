//! Full outer joins of record sets on sample keys.

use crate::record::{
    ChemistryRecord, Column, GenomeRecord, MetagenomeRecord, RecordSet, Source, Value,
};
use color_eyre::eyre::{eyre, Report, Result};
use color_eyre::Help;
use itertools::Itertools;
use log::{debug, warn};
use std::collections::{HashMap, HashSet};


/// Join the three sources into one denormalized [`RecordSet`].
///
/// Assemblies and metagenomes are joined on `sampleName`, and the result is
/// joined with chemistry on `sampleName == genomicsSampleID`. Both joins are
/// full outer joins, so no record of any source is lost.
pub fn join(
    assemblies: &[GenomeRecord],
    metagenomes: &[MetagenomeRecord],
    chemistry: &[ChemistryRecord],
) -> Result<RecordSet, Report> {
    let assemblies = RecordSet::from_records(assemblies);
    let metagenomes = RecordSet::from_records(metagenomes);
    let chemistry = RecordSet::from_records(chemistry);

    let combined = assemblies
        .outer_join(&metagenomes, "sampleName", "sampleName")?
        .outer_join(&chemistry, "sampleName", "genomicsSampleID")?;

    if combined.is_empty() {
        warn!("The combined record set is empty.");
    }
    Ok(combined)
}

impl RecordSet {
    /// Full outer join with another set.
    ///
    /// - Rows are emitted in left order, followed by the unmatched right rows
    ///   in right order.
    /// - A key that occurs several times on both sides yields every pairing.
    /// - Absent keys never match.
    /// - The key appears once, as a [`Source::Key`] column named after the
    ///   left key. Right-only rows take their key from the right side.
    /// - Other columns with the same base name on both sides are renamed to
    ///   `name.<source>`. A column qualified by an earlier join collides on
    ///   its base name, ex. `site.assembly` with a right-side `site`.
    ///
    /// ```rust
    /// use soilmag::record::{Column, RecordSet, Source, Value};
    /// let left = RecordSet {
    ///     columns: vec![Column::new("id", Source::Assembly), Column::new("x", Source::Assembly)],
    ///     rows: vec![vec![Value::new("a"), Value::new("1")]],
    /// };
    /// let right = RecordSet {
    ///     columns: vec![Column::new("id", Source::Metagenome), Column::new("x", Source::Metagenome)],
    ///     rows: vec![vec![Value::new("b"), Value::new("2")]],
    /// };
    /// let joined = left.outer_join(&right, "id", "id")?;
    /// assert_eq!(joined.headers(), ["id", "x.assembly", "x.metagenome"]);
    /// assert_eq!(joined.len(), 2);
    /// # Ok::<(), color_eyre::eyre::Report>(())
    /// ```
    pub fn outer_join(
        &self,
        other: &RecordSet,
        left_key: &str,
        right_key: &str,
    ) -> Result<RecordSet, Report> {
        let key_index = |set: &RecordSet, key: &str, side: &str| {
            set.position(key)
                .ok_or_else(|| eyre!("The {side} side of the join has no {key:?} column."))
                .suggestion(format!("Columns: {}", set.headers().join(", ")))
        };
        let li = key_index(self, left_key, "left")?;
        let ri = key_index(other, right_key, "right")?;

        // columns whose base names collide across the two sides, a column
        // qualified by an earlier join still collides on its base name
        let base_names = |set: &RecordSet, key: usize| -> HashSet<String> {
            set.columns
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != key)
                .map(|(_, c)| c.base_name().to_string())
                .collect()
        };
        let left_names = base_names(self, li);
        let right_names = base_names(other, ri);
        let left_key_name = self.columns[li].name.as_str();

        let mut columns = self
            .columns
            .iter()
            .enumerate()
            .map(|(i, c)| match i == li {
                true => Column::new(&c.name, Source::Key),
                false if right_names.contains(c.base_name()) => {
                    Column::new(&c.disambiguated(), c.source)
                }
                false => c.clone(),
            })
            .collect_vec();
        columns.extend(other.columns.iter().enumerate().filter(|(i, _)| *i != ri).map(|(_, c)| {
            match left_names.contains(c.base_name()) || c.base_name() == left_key_name {
                true => Column::new(&c.disambiguated(), c.source),
                false => c.clone(),
            }
        }));

        // right row indices by present key
        let mut lookup: HashMap<&str, Vec<usize>> = HashMap::new();
        other.rows.iter().enumerate().for_each(|(r, row)| {
            if let Some(key) = row[ri].as_str() {
                lookup.entry(key).or_default().push(r);
            }
        });

        let right_values = |row: &[Value]| {
            row.iter().enumerate().filter(|(i, _)| *i != ri).map(|(_, v)| v.clone()).collect_vec()
        };
        let right_width = other.columns.len() - 1;

        let mut matched = vec![false; other.rows.len()];
        let mut rows = Vec::new();
        for left in &self.rows {
            let matches = left[li].as_str().and_then(|key| lookup.get(key));
            match matches {
                Some(matches) => {
                    for r in matches {
                        matched[*r] = true;
                        let mut row = left.clone();
                        row.extend(right_values(&other.rows[*r]));
                        rows.push(row);
                    }
                }
                None => {
                    let mut row = left.clone();
                    row.extend(std::iter::repeat(Value::Absent).take(right_width));
                    rows.push(row);
                }
            }
        }

        let mut unmatched = 0;
        for (_, right) in other.rows.iter().enumerate().filter(|(r, _)| !matched[*r]) {
            let mut row = vec![Value::Absent; self.columns.len()];
            row[li] = right[ri].clone();
            row.extend(right_values(right));
            rows.push(row);
            unmatched += 1;
        }

        debug!(
            "Joined {} left and {} right rows into {} rows ({unmatched} right-only).",
            self.len(),
            other.len(),
            rows.len()
        );

        Ok(RecordSet { columns, rows })
    }
}
