use crate::error::NormalizeError;
use crate::normalize::*;
use chrono::NaiveDate;
use color_eyre::eyre::{Report, Result};
use strum::IntoEnumIterator;

const LINEAGES: &[&str] = &[
    "d__Bacteria;p__Pseudomonadota;c__Gammaproteobacteria;o__Burkholderiales;f__Burkholderiaceae;g__Paraburkholderia;s__Paraburkholderia sp002",
    "d__Bacteria;p__Pseudomonadota;c__Gammaproteobacteria;o__Burkholderiales;f__;g__;s__",
    "d__Archaea;p__Thermoproteota;c__Nitrososphaeria;o__Nitrososphaerales;f__Nitrososphaeraceae;g__;s__",
    "d__;p__;c__;o__;f__;g__;s__",
];

#[test]
fn lineage_round_trip() {
    let schema = TaxonomySchema::default();
    for lineage in LINEAGES {
        let decomposed = schema.decompose(lineage);
        assert_eq!(schema.compose(&decomposed), *lineage);
    }
}

#[test]
fn lineage_always_has_seven_slots() {
    let schema = TaxonomySchema::default();
    for lineage in ["", "d__Bacteria", "d__Bacteria;p__Acidobacteriota;c__Terriglobia"] {
        let decomposed = schema.decompose(lineage);
        assert_eq!(decomposed.iter().count(), 7);
    }

    let partial = schema.decompose("d__Bacteria;p__Acidobacteriota;c__Terriglobia");
    assert_eq!(partial.get(Rank::Class), Some("Terriglobia"));
    assert_eq!(partial.get(Rank::Order), None);
    assert_eq!(partial.get(Rank::Species), None);
}

#[test]
fn lineage_empty_slots_are_absent() {
    let schema = TaxonomySchema::default();
    let lineage = schema.decompose(LINEAGES[1]);
    let observed = lineage.iter().collect::<Vec<_>>();
    let expected = vec![
        (Rank::Domain, Some("Bacteria")),
        (Rank::Phylum, Some("Pseudomonadota")),
        (Rank::Class, Some("Gammaproteobacteria")),
        (Rank::Order, Some("Burkholderiales")),
        (Rank::Family, None),
        (Rank::Genus, None),
        (Rank::Species, None),
    ];
    assert_eq!(observed, expected);
}

#[test]
fn lineage_keeps_species_spaces() {
    let schema = TaxonomySchema::default();
    let lineage = schema.decompose(LINEAGES[0]);
    assert_eq!(lineage.get(Rank::Species), Some("Paraburkholderia sp002"));
}

#[test]
fn lineage_extra_slots_are_ignored() {
    let schema = TaxonomySchema::default();
    let lineage = schema.decompose("d__A;p__B;c__C;o__D;f__E;g__F;s__G;x__H");
    assert_eq!(lineage.get(Rank::Species), Some("G"));
}

#[test]
fn rank_names() {
    let columns = Rank::iter().map(|r| r.column()).collect::<Vec<_>>();
    assert_eq!(columns, ["domain", "phylum", "class", "order", "family", "genus", "species"]);
    assert_eq!("genus".parse::<Rank>().ok(), Some(Rank::Genus));
    assert!("Genus ".parse::<Rank>().is_err());
    assert!(Rank::Domain < Rank::Species);
}

#[test]
fn sample_name_full() -> Result<(), Report> {
    let schema = SampleNameSchema::default();
    let sample = schema
        .decompose("Soil microbial communities from Harvard Forest - HARV_033-M-20180604-COMP")?;
    let expected = SampleName {
        site: "Harvard Forest".to_string(),
        sample_name: "HARV_033-M-20180604".to_string(),
        site_id: Some("HARV".to_string()),
        subplot: Some("033".to_string()),
        layer: Some("M".to_string()),
        collection_date: Some("20180604".to_string()),
    };
    assert_eq!(sample, expected);
    assert_eq!(sample.parse_collection_date(), NaiveDate::from_ymd_opt(2018, 6, 4));
    Ok(())
}

#[test]
fn sample_name_without_boilerplate() -> Result<(), Report> {
    let schema = SampleNameSchema::default();
    let sample = schema.decompose("Site A - S1_P1-O-20200101")?;
    assert_eq!(sample.site, "Site A");
    assert_eq!(sample.sample_name, "S1_P1-O-20200101");
    assert_eq!(sample.site_id.as_deref(), Some("S1"));
    assert_eq!(sample.subplot.as_deref(), Some("P1"));
    assert_eq!(sample.layer.as_deref(), Some("O"));
    assert_eq!(sample.collection_date.as_deref(), Some("20200101"));
    Ok(())
}

#[test]
fn sample_name_too_few_delimiters() -> Result<(), Report> {
    let schema = SampleNameSchema::default();

    let combined = schema.decompose("Harvard Forest - Combined Assembly")?;
    assert_eq!(combined.sample_name, "Combined Assembly");
    assert_eq!(combined.site_id.as_deref(), Some("Combined Assembly"));
    assert_eq!(combined.subplot, None);
    assert_eq!(combined.layer, None);
    assert_eq!(combined.collection_date, None);

    let short = schema.decompose("Harvard Forest - HARV_033-M")?;
    assert_eq!(short.layer.as_deref(), Some("M"));
    assert_eq!(short.collection_date, None);
    assert_eq!(short.parse_collection_date(), None);
    Ok(())
}

#[test]
fn sample_name_extra_parts_stay_in_date() -> Result<(), Report> {
    let schema = SampleNameSchema::default();
    let sample = schema.decompose("Site - S1_P1-O-20200101-rep2")?;
    assert_eq!(sample.collection_date.as_deref(), Some("20200101-rep2"));
    assert_eq!(sample.parse_collection_date(), None);
    Ok(())
}

#[test]
fn sample_name_missing_separator() {
    let schema = SampleNameSchema::default();
    let result = schema.decompose("Harvard Forest HARV_033-M-20180604");
    assert!(matches!(result, Err(NormalizeError::MalformedIdentifier { .. })));

    let result = schema.decompose(" - HARV_033");
    assert!(matches!(result, Err(NormalizeError::MalformedIdentifier { .. })));
}

#[test]
fn sample_name_custom_schema() -> Result<(), Report> {
    let schema = SampleNameSchema {
        boilerplate: "Permafrost from ".to_string(),
        separator: " | ".to_string(),
        suffix: String::new(),
        ..Default::default()
    };
    let sample = schema.decompose("Permafrost from Toolik | TOOL_043-O-20190715")?;
    assert_eq!(sample.site, "Toolik");
    assert_eq!(sample.sample_name, "TOOL_043-O-20190715");
    Ok(())
}

#[test]
fn chemistry_key() {
    assert_eq!(normalize_chemistry_key(" BART_002-O-20170719-COMP ", "-COMP"), "BART_002-O-20170719");
    assert_eq!(normalize_chemistry_key("BART_002-COMP-O", "-COMP"), "BART_002-COMP-O");
    assert_eq!(normalize_chemistry_key("BART_002", ""), "BART_002");
}
