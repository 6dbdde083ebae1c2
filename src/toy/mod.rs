//! A small in-memory dataset of soil metagenomes, for examples and tests.
//!
//! - Six genomes (bins) from three sites, one of them a combined assembly
//!   and one archaeal genome absent from the bacterial tree.
//! - Four metagenomes, one a re-annotation duplicate and one from the
//!   unrelated `TOOL_043` plot, plus one with no genomes.
//! - Four chemistry rows, two measured on the same Harvard Forest sample
//!   and one for a sample with no metagenome.

use crate::config::Config;
use crate::load::MemoryReader;
use indoc::indoc;

/// Assembly metadata, comma-separated.
pub const ASSEMBLIES: &str = indoc! {r#"
    Genome Name / Sample Name,Bin ID,GTDB Taxonomy Lineage,Bin Completeness,Total Number of Bases,Gene Count,Bin Contamination,Bin Methods
    Soil microbial communities from Bartlett Experimental Forest - BART_002-O-20170719-COMP,BART_002.bin.1,d__Bacteria;p__Pseudomonadota;c__Gammaproteobacteria;o__Burkholderiales;f__Burkholderiaceae;g__Paraburkholderia;s__,92.5,3500000,3200,1.2,metabat
    Soil microbial communities from Bartlett Experimental Forest - BART_002-O-20170719-COMP,BART_002.bin.2,d__Bacteria;p__Acidobacteriota;c__Terriglobia;o__Terriglobales;f__;g__;s__,75,2100000,1900,3.4,metabat
    Soil microbial communities from Harvard Forest - HARV_033-M-20180604-COMP,HARV_033.bin.1,d__Bacteria;p__Pseudomonadota;c__Alphaproteobacteria;o__Rhizobiales;f__Xanthobacteraceae;g__Bradyrhizobium;s__Bradyrhizobium sp003,98.1,7800000,7100,0.4,metabat
    Soil microbial communities from Harvard Forest - HARV_033-M-20180604-COMP,HARV_033.bin.2,d__Archaea;p__Thermoproteota;c__Nitrososphaeria;o__Nitrososphaerales;f__Nitrososphaeraceae;g__;s__,88,1500000,1700,2.0,metabat
    Soil microbial communities from Harvard Forest - Combined Assembly,HARV_combined.bin.1,d__Bacteria;p__Pseudomonadota;c__Gammaproteobacteria;o__Xanthomonadales;f__Rhodanobacteraceae;g__Rhodanobacter;s__,64,2900000,2600,5.1,"metabat,das_tool"
    Soil microbial communities from Konza Prairie - KONZ_001-M-20190520-COMP,KONZ_001.bin.1,d__Bacteria;p__Actinomycetota;c__Thermoleophilia;o__Solirubrobacterales;f__Solirubrobacteraceae;g__;s__,,2500000,2400,NA,metabat
"#};

/// Metagenome annotation metadata, tab-separated.
pub const METAGENOMES: &str = indoc! {"
    Genome Name\tEcosystem Subtype\tSequencing Center\tIMG Genome ID
    Soil microbial communities from Bartlett Experimental Forest - BART_002-O-20170719-COMP\tTemperate forest\tJGI\t3300039974
    Soil microbial communities from Harvard Forest - HARV_033-M-20180604-COMP\tTemperate forest\tJGI\t3300039975
    Soil microbial communities from Harvard Forest - HARV_033-M-20180604-COMP (re-annotation)\tTemperate forest\tJGI\t3300049975
    Soil microbial communities from Niwot Ridge - NIWO_010-O-20200810-COMP\tAlpine tundra\tJGI\t3300039977
    Soil microbial communities from Toolik Lake - TOOL_043-O-20190715-COMP\tArctic tundra\tJGI\t3300039978
"};

/// Soil chemistry, tab-separated.
pub const CHEMISTRY: &str = indoc! {"
    uid\tsiteID\tplotID\tgenomicsSampleID\tsoilInWaterpH\tsoilInCaClpH\tsoilTemp\televation\tnlcdClass\tecosystemsubtype
    u1\tBART\tBART_002\tBART_002-O-20170719-COMP\t4.1\t3.5\t12.3\t272.1\tdeciduousForest\tTemperate forest
    u2\tHARV\tHARV_033\tHARV_033-M-20180604-COMP\t4.5\t3.9\t14\t348\tmixedForest\tTemperate forest
    u3\tHARV\tHARV_033\tHARV_033-M-20180604-COMP\t4.6\tNA\t14.2\t348\tmixedForest\tTemperate forest
    u4\tSRER\tSRER_004\tSRER_004-M-20190311-COMP\t7.9\t7.4\t25.1\t1001\tshrubScrub\tDesert
"};

/// Bacterial phylogeny of the toy genomes, with support values.
pub const TREE: &str = "((BART_002.bin.1:0.12,HARV_combined.bin.1:0.2)98:0.05,(HARV_033.bin.1:0.3,(KONZ_001.bin.1:0.25,BART_002.bin.2:0.4)87:0.1)100:0.07);";

/// A [`MemoryReader`] serving the toy sources.
pub fn reader() -> MemoryReader {
    MemoryReader {
        assemblies: ASSEMBLIES.to_string(),
        metagenomes: METAGENOMES.to_string(),
        chemistry: CHEMISTRY.to_string(),
    }
}

/// The default [`Config`], also excluding the unrelated `TOOL_043` plot.
pub fn config() -> Config {
    let mut config = Config::default();
    config.noise_patterns.push("TOOL_043".to_string());
    config
}
