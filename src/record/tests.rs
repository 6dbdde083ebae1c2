use crate::normalize::{Rank, SampleNameSchema, TaxonomySchema};
use crate::record::*;
use color_eyre::eyre::{Report, Result};

fn genome() -> Result<GenomeRecord, Report> {
    let sample = SampleNameSchema::default().decompose("Site A - S1_P1-O-20200101")?;
    let lineage = "d__Bacteria;p__Pseudomonadota;c__Gammaproteobacteria;o__Burkholderiales;f__;g__;s__";
    Ok(GenomeRecord {
        sample,
        bin_id: Value::new("bin1"),
        taxonomy_lineage: Value::new(lineage),
        lineage: TaxonomySchema::default().decompose(lineage),
        bin_completeness: Some(91.5),
        total_bases: Some(2_500_000),
        gene_count: None,
        attributes: vec![("Bin Contamination".to_string(), Value::new("1.2"))],
        ..Default::default()
    })
}

#[test]
fn value_display() {
    assert_eq!(Value::Absent.to_string(), ABSENT);
    assert_eq!(Value::new("x").to_string(), "x");
    assert_eq!(Value::from(Some(2.5)).to_string(), "2.5");
    assert_eq!(Value::from(None::<u64>), Value::Absent);
    assert!(Value::Absent < Value::new("a"));
}

#[test]
fn genome_fields() -> Result<(), Report> {
    let genome = genome()?;
    assert_eq!(genome.field("site").as_deref(), Some("Site A"));
    assert_eq!(genome.field("siteId").as_deref(), Some("S1"));
    assert_eq!(genome.field("class").as_deref(), Some("Gammaproteobacteria"));
    assert_eq!(genome.field("family"), None);
    assert_eq!(genome.field("assemblyType").as_deref(), Some("Individual"));
    assert_eq!(genome.field("binCompleteness").as_deref(), Some("91.5"));
    assert_eq!(genome.field("geneCount"), None);
    assert_eq!(genome.field("Bin Contamination").as_deref(), Some("1.2"));
    assert_eq!(genome.field("unknown"), None);
    assert_eq!(genome.lineage.get(Rank::Phylum), Some("Pseudomonadota"));
    Ok(())
}

#[test]
fn from_records_layout() -> Result<(), Report> {
    let genome = genome()?;
    let set = RecordSet::from_records(&[genome]);

    assert_eq!(set.columns.len(), GenomeRecord::COLUMNS.len() + 1);
    assert!(set.columns.iter().all(|c| c.source == Source::Assembly));
    assert_eq!(set.headers().last(), Some(&"Bin Contamination"));
    assert_eq!(set.get(0, "order"), Some("Burkholderiales"));
    assert_eq!(set.get(0, "genus"), None);
    assert_eq!(set.get(0, "geneCount"), None);
    assert_eq!(set.get(0, "totalBases"), Some("2500000"));
    Ok(())
}

#[test]
fn from_records_empty_keeps_columns() {
    let set = RecordSet::from_records::<MetagenomeRecord>(&[]);
    assert!(set.is_empty());
    assert_eq!(set.headers(), MetagenomeRecord::COLUMNS);
}

#[test]
fn resolve_prefers_exact_then_source_order() {
    let set = RecordSet {
        columns: vec![
            Column::new("site.metagenome", Source::Metagenome),
            Column::new("site.assembly", Source::Assembly),
            Column::new("layer.chemistry", Source::Chemistry),
            Column::new("sampleName", Source::Key),
        ],
        rows: vec![
            vec![Value::new("m"), Value::new("a"), Value::Absent, Value::new("S1")],
            vec![Value::new("m2"), Value::Absent, Value::Absent, Value::new("S2")],
        ],
    };
    assert_eq!(set.resolve("sampleName"), Some(3));
    assert_eq!(set.resolve("site"), Some(1));
    assert_eq!(set.resolve("site.metagenome"), Some(0));
    assert_eq!(set.resolve("layer"), Some(2));
    assert_eq!(set.resolve("binId"), None);
    assert_eq!(set.get(0, "layer"), None);

    let row = set.iter().next();
    assert_eq!(row.and_then(|r| r.get("site")), Some("a"));
}

#[test]
fn get_falls_back_per_row() -> Result<(), Report> {
    let set = RecordSet {
        columns: vec![
            Column::new("sampleName", Source::Key),
            Column::new("site.assembly", Source::Assembly),
            Column::new("site.metagenome", Source::Metagenome),
        ],
        rows: vec![
            vec![Value::new("S1"), Value::new("Harvard Forest"), Value::new("Harvard")],
            vec![Value::new("S2"), Value::Absent, Value::new("Niwot Ridge")],
            vec![Value::new("S3"), Value::Absent, Value::Absent],
        ],
    };
    assert_eq!(set.get(0, "site"), Some("Harvard Forest"));
    assert_eq!(set.get(1, "site"), Some("Niwot Ridge"));
    assert_eq!(set.get(2, "site"), None);

    let rows = set.iter().collect::<Vec<_>>();
    assert_eq!(rows[1].field("site").as_deref(), Some("Niwot Ridge"));

    let column = set.column("site")?;
    assert_eq!(column, [&Value::new("Harvard Forest"), &Value::new("Niwot Ridge"), &Value::Absent]);
    Ok(())
}

#[test]
fn column_base_name() {
    assert_eq!(Column::new("site.assembly", Source::Assembly).base_name(), "site");
    assert_eq!(Column::new("site", Source::Chemistry).base_name(), "site");
    assert_eq!(Column::new("site.assembly", Source::Chemistry).base_name(), "site.assembly");
    assert_eq!(Column::new("site.assembly", Source::Assembly).disambiguated(), "site.assembly");
    assert_eq!(Column::new("layer", Source::Metagenome).disambiguated(), "layer.metagenome");
}

#[test]
fn column_unknown_field() {
    let set = RecordSet::from_records::<ChemistryRecord>(&[]);
    assert!(set.column("soilTemp").is_ok());
    assert!(set.column("binId").is_err());
}

#[test]
fn write_absent_as_sentinel() -> Result<(), Report> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("records.tsv");
    let set = RecordSet::from_records(&[genome()?]);
    set.write(&path)?;

    let text = std::fs::read_to_string(&path)?;
    let lines = text.lines().collect::<Vec<_>>();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("site\tsampleName\tsiteId"));
    assert!(lines[1].contains("\tNA\t"));
    Ok(())
}
