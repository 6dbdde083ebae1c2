//! Select records by taxonomy, collection site and assembly type.

use crate::normalize::Rank;
use crate::record::{AssemblyType, Record, RecordSet};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

#[cfg(test)]
mod tests;

/// A composable test on a [`Record`].
///
/// Pattern matching is a case-sensitive substring search. A record whose
/// field is absent never matches.
///
/// ```rust
/// use soilmag::filter::Predicate;
/// use soilmag::normalize::Rank;
/// use soilmag::record::AssemblyType;
/// let predicate = Predicate::by_rank(Rank::Class, "Gammaproteobacteria")
///     .and(Predicate::by_assembly_type(AssemblyType::Combined));
/// assert!(matches!(predicate, Predicate::All(ref p) if p.len() == 2));
/// ```
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub enum Predicate {
    ByRank { rank: Rank, pattern: String },
    BySite(String),
    ByAssemblyType(AssemblyType),
    /// Every inner predicate must match, an empty list matches everything.
    All(Vec<Predicate>),
}

impl Predicate {
    pub fn by_rank(rank: Rank, pattern: &str) -> Self {
        Predicate::ByRank { rank, pattern: pattern.to_string() }
    }

    pub fn by_site(pattern: &str) -> Self {
        Predicate::BySite(pattern.to_string())
    }

    pub fn by_assembly_type(assembly_type: AssemblyType) -> Self {
        Predicate::ByAssemblyType(assembly_type)
    }

    /// Combine two predicates with a logical AND.
    pub fn and(self, other: Predicate) -> Self {
        match self {
            Predicate::All(mut predicates) => {
                predicates.push(other);
                Predicate::All(predicates)
            }
            predicate => Predicate::All(vec![predicate, other]),
        }
    }

    pub fn matches<R: Record>(&self, record: &R) -> bool {
        let contains = |field: &str, pattern: &str| {
            record.field(field).is_some_and(|value| value.contains(pattern))
        };
        match self {
            Predicate::ByRank { rank, pattern } => contains(rank.column(), pattern),
            Predicate::BySite(pattern) => contains("site", pattern),
            Predicate::ByAssemblyType(assembly_type) => {
                record.field("assemblyType").is_some_and(|value| value == assembly_type.as_ref())
            }
            Predicate::All(predicates) => predicates.iter().all(|p| p.matches(record)),
        }
    }
}

/// Returns the records matching a predicate, in their original order.
pub fn filter<R>(records: &[R], predicate: &Predicate) -> Vec<R>
where
    R: Clone + Record,
{
    let subset: Vec<R> = records.iter().filter(|r| predicate.matches(*r)).cloned().collect();
    log_subset(records.len(), subset.len(), predicate);
    subset
}

impl RecordSet {
    /// Returns a new set with only the rows matching a predicate.
    pub fn filter(&self, predicate: &Predicate) -> RecordSet {
        let rows = self.iter().filter(|row| predicate.matches(row)).map(|row| row.index());
        let subset = self.select(rows.collect::<Vec<_>>());
        log_subset(self.len(), subset.len(), predicate);
        subset
    }
}

fn log_subset(total: usize, kept: usize, predicate: &Predicate) {
    debug!("Kept {kept} of {total} records matching {predicate:?}");
    if kept == 0 {
        warn!("No records match the filter: {predicate:?}");
    }
}
