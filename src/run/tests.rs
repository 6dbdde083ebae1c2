use crate::config::{FilterArgs, StatsArgs};
use crate::filter::Predicate;
use crate::load::{load_all, Sources};
use crate::normalize::Rank;
use crate::record::{AssemblyType, Value};
use crate::run::*;
use crate::toy;
use color_eyre::eyre::{Report, Result};
use soilmag_phylo::{FromNewick, Phylogeny, ToNewick};

fn sources() -> Result<Sources, Report> {
    load_all(&toy::reader(), &toy::config())
}

#[test]
fn analyze_by_class() -> Result<(), Report> {
    let sources = sources()?;
    let tree = Phylogeny::from_newick(toy::TREE)?;
    let predicate = Predicate::by_rank(Rank::Class, "Gammaproteobacteria");
    let analysis = analyze(&sources, Some(&tree), &predicate, &StatsArgs::default())?;

    assert_eq!(analysis.combined.len(), 10);
    assert_eq!(analysis.subset.len(), 2);

    let pruned = analysis.pruned.unwrap_or_default();
    assert_eq!(pruned.get_tips(), ["BART_002.bin.1", "HARV_combined.bin.1"]);
    assert_eq!(pruned.to_newick()?, "(BART_002.bin.1:0.12,HARV_combined.bin.1:0.2)98;");

    assert_eq!(analysis.counts.len(), 1);
    assert_eq!(analysis.counts[&Value::new("Gammaproteobacteria")], 2);
    assert_eq!(analysis.novel.len(), 2);
    assert_eq!(analysis.novelty[&Rank::Genus], 0);
    assert_eq!(analysis.stats[&Value::new("Gammaproteobacteria")].count, 2);
    Ok(())
}

#[test]
fn analyze_pruned_tips_are_subset_genomes() -> Result<(), Report> {
    let sources = sources()?;
    let tree = Phylogeny::from_newick(toy::TREE)?;
    let predicates = [
        Predicate::by_site("Harvard"),
        Predicate::by_site("Harvard").and(Predicate::by_assembly_type(AssemblyType::Individual)),
        Predicate::by_rank(Rank::Phylum, "Pseudomonadota"),
        Predicate::All(Vec::new()),
    ];
    for predicate in predicates {
        let analysis = analyze(&sources, Some(&tree), &predicate, &StatsArgs::default())?;
        let bins = analysis.subset.column("binId")?;
        let pruned = analysis.pruned.unwrap_or_default();
        for tip in pruned.get_tips() {
            assert!(bins.iter().any(|b| b.as_str() == Some(tip)), "{predicate:?}: {tip}");
        }
        assert!(pruned.graph.node_indices().all(|n| pruned.get_children(n).len() != 1));
    }
    Ok(())
}

#[test]
fn analyze_without_matches() -> Result<(), Report> {
    let sources = sources()?;
    let tree = Phylogeny::from_newick(toy::TREE)?;
    let predicate = Predicate::by_site("Mars");
    let analysis = analyze(&sources, Some(&tree), &predicate, &StatsArgs::default())?;

    assert!(analysis.subset.is_empty());
    assert!(analysis.pruned.is_some_and(|p| p.is_empty()));
    assert!(analysis.counts.is_empty());
    assert!(analysis.novelty.values().all(|n| *n == 0));
    Ok(())
}

#[test]
fn analyze_unknown_stats_field() -> Result<(), Report> {
    let sources = sources()?;
    let stats = StatsArgs { group_by: "kingdom".to_string(), ..Default::default() };
    assert!(analyze(&sources, None, &Predicate::All(Vec::new()), &stats).is_err());

    // chemistry fields are available after the join
    let stats = StatsArgs { group_by: "nlcdClass".to_string(), value: "soilTemp".to_string(), ..Default::default() };
    let analysis = analyze(&sources, None, &Predicate::All(Vec::new()), &stats)?;
    let mixed = &analysis.stats[&Value::new("mixedForest")];
    assert_eq!(mixed.count, 4);
    assert!(analysis.pruned.is_none());
    Ok(())
}

#[test]
fn run_writes_outputs() -> Result<(), Report> {
    let dir = tempfile::tempdir()?;
    let input = |name: &str, text: &str| -> Result<std::path::PathBuf, Report> {
        let path = dir.path().join(name);
        std::fs::write(&path, text)?;
        Ok(path)
    };

    let config = dir.path().join("config.json");
    toy::config().write(&config)?;

    let args = RunArgs {
        assemblies: input("assemblies.csv", toy::ASSEMBLIES)?,
        metagenomes: input("metagenomes.tsv", toy::METAGENOMES)?,
        chemistry: input("chemistry.tsv", toy::CHEMISTRY)?,
        tree: Some(input("tree.nwk", toy::TREE)?),
        config: Some(config),
        filter: FilterArgs { site: Some("Harvard".to_string()), ..Default::default() },
        stats: StatsArgs::default(),
        output_dir: dir.path().join("output"),
    };
    let analysis = run(&args)?;
    assert_eq!(analysis.subset.len(), 5);

    let output_dir = &args.output_dir;
    for file in [
        "combined.tsv",
        "subset.tsv",
        "novel.tsv",
        "pruned.nwk",
        "counts.tsv",
        "novelty.tsv",
        "stats.tsv",
        "config.json",
        "run_args.json",
    ] {
        assert!(output_dir.join(file).exists(), "{file}");
    }

    let pruned = Phylogeny::read(&output_dir.join("pruned.nwk"))?;
    assert_eq!(pruned.get_tips(), ["HARV_combined.bin.1", "HARV_033.bin.1"]);

    let subset = std::fs::read_to_string(output_dir.join("subset.tsv"))?;
    assert_eq!(subset.lines().count(), 6);

    let counts = std::fs::read_to_string(output_dir.join("counts.tsv"))?;
    assert!(counts.starts_with("class\tcount\n"));
    Ok(())
}

#[test]
fn run_rejects_incomplete_rank_filter() -> Result<(), Report> {
    let args = RunArgs {
        assemblies: "assemblies.csv".into(),
        metagenomes: "metagenomes.tsv".into(),
        chemistry: "chemistry.tsv".into(),
        tree: None,
        config: None,
        filter: FilterArgs { rank: Some(Rank::Class), ..Default::default() },
        stats: StatsArgs::default(),
        output_dir: "output".into(),
    };
    assert!(run(&args).is_err());
    Ok(())
}
