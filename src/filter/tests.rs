use crate::filter::*;
use crate::join::join;
use crate::load::{load_all, Sources};
use crate::normalize::Rank;
use crate::record::{AssemblyType, GenomeRecord};
use crate::toy;
use color_eyre::eyre::{Report, Result};

fn sources() -> Result<Sources, Report> {
    load_all(&toy::reader(), &toy::config())
}

fn bin_ids(records: &[GenomeRecord]) -> Vec<&str> {
    records.iter().filter_map(|r| r.bin_id.as_str()).collect()
}

#[test]
fn by_rank() -> Result<(), Report> {
    let sources = sources()?;
    let subset = filter(&sources.assemblies, &Predicate::by_rank(Rank::Class, "Gammaproteobacteria"));
    assert_eq!(bin_ids(&subset), ["BART_002.bin.1", "HARV_combined.bin.1"]);

    // substring and case-sensitive
    let subset = filter(&sources.assemblies, &Predicate::by_rank(Rank::Phylum, "ota"));
    assert_eq!(subset.len(), 6);
    let subset = filter(&sources.assemblies, &Predicate::by_rank(Rank::Phylum, "pseudomonadota"));
    assert!(subset.is_empty());
    Ok(())
}

#[test]
fn absent_rank_never_matches() -> Result<(), Report> {
    let sources = sources()?;
    // every genome lacks a species name, except one
    let subset = filter(&sources.assemblies, &Predicate::by_rank(Rank::Species, ""));
    assert_eq!(bin_ids(&subset), ["HARV_033.bin.1"]);
    Ok(())
}

#[test]
fn by_site_and_assembly_type() -> Result<(), Report> {
    let sources = sources()?;
    let harvard = Predicate::by_site("Harvard");
    assert_eq!(filter(&sources.assemblies, &harvard).len(), 3);

    let combined = harvard.clone().and(Predicate::by_assembly_type(AssemblyType::Combined));
    assert_eq!(bin_ids(&filter(&sources.assemblies, &combined)), ["HARV_combined.bin.1"]);

    let individual = harvard.and(Predicate::by_assembly_type(AssemblyType::Individual));
    assert_eq!(bin_ids(&filter(&sources.assemblies, &individual)), ["HARV_033.bin.1", "HARV_033.bin.2"]);
    Ok(())
}

#[test]
fn empty_all_matches_everything() -> Result<(), Report> {
    let sources = sources()?;
    let subset = filter(&sources.assemblies, &Predicate::All(Vec::new()));
    assert_eq!(subset, sources.assemblies);
    Ok(())
}

#[test]
fn subset_is_sound() -> Result<(), Report> {
    let sources = sources()?;
    let predicates = [
        Predicate::by_rank(Rank::Domain, "Bacteria"),
        Predicate::by_rank(Rank::Genus, "Rhodanobacter"),
        Predicate::by_site("Forest"),
        Predicate::by_site("Konza").and(Predicate::by_rank(Rank::Class, "Gamma")),
        Predicate::by_assembly_type(AssemblyType::Individual),
    ];
    for predicate in predicates {
        let subset = filter(&sources.assemblies, &predicate);
        assert!(subset.iter().all(|r| predicate.matches(r)), "{predicate:?}");
        assert!(subset.iter().all(|r| sources.assemblies.contains(r)), "{predicate:?}");
        let missed = sources.assemblies.iter().filter(|r| predicate.matches(*r)).count();
        assert_eq!(missed, subset.len(), "{predicate:?}");
    }
    Ok(())
}

#[test]
fn empty_result_is_not_an_error() -> Result<(), Report> {
    let sources = sources()?;
    let subset = filter(&sources.assemblies, &Predicate::by_site("Mars"));
    assert!(subset.is_empty());
    Ok(())
}

#[test]
fn record_set_filter() -> Result<(), Report> {
    let sources = sources()?;
    let combined = join(&sources.assemblies, &sources.metagenomes, &sources.chemistry)?;

    // bySite reaches the disambiguated site.assembly column
    let harvard = combined.filter(&Predicate::by_site("Harvard"));
    assert_eq!(harvard.len(), 5);
    assert_eq!(harvard.columns, combined.columns);
    assert!(harvard.iter().all(|row| row.get("site").is_some_and(|s| s.contains("Harvard"))));

    // rows without a genome have no assembly type
    let individual = combined.filter(&Predicate::by_assembly_type(AssemblyType::Individual));
    assert_eq!(individual.len(), 7);
    assert!(individual.iter().all(|row| row.get("binId").is_some()));

    let none = combined.filter(&Predicate::by_rank(Rank::Class, "Mammalia"));
    assert!(none.is_empty());
    assert_eq!(none.columns, combined.columns);
    Ok(())
}

fn predicates() -> Vec<Predicate> {
    vec![
        Predicate::by_site("Harvard"),
        Predicate::by_rank(Rank::Class, "Gammaproteobacteria"),
        Predicate::by_rank(Rank::Phylum, "ota"),
        Predicate::by_assembly_type(AssemblyType::Individual),
        Predicate::by_site("Mars"),
    ]
}

#[test]
fn filter_is_idempotent() -> Result<(), Report> {
    let sources = sources()?;
    let combined = join(&sources.assemblies, &sources.metagenomes, &sources.chemistry)?;
    for p in predicates() {
        let once = filter(&sources.assemblies, &p);
        assert_eq!(filter(&once, &p), once, "{p:?}");

        let once = combined.filter(&p);
        assert_eq!(once.filter(&p), once, "{p:?}");
    }
    Ok(())
}

#[test]
fn filter_is_commutative() -> Result<(), Report> {
    let sources = sources()?;
    let combined = join(&sources.assemblies, &sources.metagenomes, &sources.chemistry)?;
    let predicates = predicates();
    for (p1, p2) in predicates.iter().flat_map(|p1| predicates.iter().map(move |p2| (p1, p2))) {
        let forward = filter(&filter(&sources.assemblies, p1), p2);
        let reverse = filter(&filter(&sources.assemblies, p2), p1);
        assert_eq!(forward, reverse, "{p1:?} {p2:?}");
        assert_eq!(forward, filter(&sources.assemblies, &p1.clone().and(p2.clone())), "{p1:?} {p2:?}");

        let forward = combined.filter(p1).filter(p2);
        let reverse = combined.filter(p2).filter(p1);
        assert_eq!(forward, reverse, "{p1:?} {p2:?}");
    }

    // a non-trivial pair that narrows in both orders
    let harvard = Predicate::by_site("Harvard");
    let individual = Predicate::by_assembly_type(AssemblyType::Individual);
    let subset = combined.filter(&harvard).filter(&individual);
    // both HARV_033 genomes, paired with two chemistry rows each
    assert_eq!(subset.len(), 4);
    assert_eq!(subset, combined.filter(&individual).filter(&harvard));
    Ok(())
}
