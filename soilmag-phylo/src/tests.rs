use crate::{Branch, FromNewick, PhyloError, Phylogeny, ToNewick};
use color_eyre::eyre::{Report, Result};
use std::collections::{BTreeSet, HashSet};

const TREE: &str = "((A:1,B:2)95:0.5,(C:3,D:4)80:0.25)root;";

/// Returns true if no node in the phylogeny has exactly one child.
fn is_fully_resolved(phylo: &Phylogeny) -> bool {
    phylo.graph.node_indices().all(|i| phylo.get_children(i).len() != 1)
}

#[test]
fn prune_keeps_two_of_four() -> Result<(), Report> {
    let phylo = Phylogeny::from_newick(TREE)?;
    let pruned = phylo.prune(["A", "C"]);

    assert_eq!(pruned.get_tips(), ["A", "C"]);
    assert!(is_fully_resolved(&pruned));

    // A and C share the root as their only ancestor
    let a = pruned.get_node_index("A")?;
    let c = pruned.get_node_index("C")?;
    assert_eq!(pruned.get_ancestors(a), pruned.get_ancestors(c));
    assert_eq!(pruned.get_root()?.label.as_deref(), Some("root"));

    // collapsed internal branches are merged into the surviving tips
    assert_eq!(pruned.get_branch(a), Some(&Branch::with_length(1.5)));
    assert_eq!(pruned.get_branch(c), Some(&Branch::with_length(3.25)));
    assert_eq!(pruned.to_newick()?, "(A:1.5,C:3.25)root;");
    Ok(())
}

#[test]
fn prune_ignores_unknown_labels() -> Result<(), Report> {
    let phylo = Phylogeny::from_newick(TREE)?;
    let with_unknown = phylo.prune(["A", "C", "Z"]);
    let without = phylo.prune(["A", "C"]);
    assert_eq!(with_unknown.to_newick()?, without.to_newick()?);

    let single_unknown = phylo.prune(["A", "Z"]);
    let single = phylo.prune(["A"]);
    assert_eq!(single_unknown.to_newick()?, single.to_newick()?);
    Ok(())
}

#[test]
fn prune_single_tip() -> Result<(), Report> {
    let phylo = Phylogeny::from_newick(TREE)?;
    let pruned = phylo.prune(["B"]);
    assert_eq!(pruned.get_tips(), ["B"]);
    assert_eq!(pruned.len(), 1);
    // the lone survivor becomes the root, which has no incoming branch
    assert_eq!(pruned.to_newick()?, "B;");
    Ok(())
}

#[test]
fn prune_empty_keep() -> Result<(), Report> {
    let phylo = Phylogeny::from_newick(TREE)?;
    let pruned = phylo.prune(Vec::<String>::new());
    assert!(pruned.is_empty());
    assert_eq!(pruned.to_newick()?, ";");
    assert!(pruned.get_tips().is_empty());
    Ok(())
}

#[test]
fn prune_all_is_identity() -> Result<(), Report> {
    let phylo = Phylogeny::from_newick(TREE)?;
    let pruned = phylo.prune(["A", "B", "C", "D"]);
    assert_eq!(pruned.to_newick()?, TREE);
    Ok(())
}

#[test]
fn prune_cascades_collapses() -> Result<(), Report> {
    // removing E and F leaves (D) and then ((D)) chains to collapse
    let phylo = Phylogeny::from_newick("(A:1,(B:1,(C:1,(D:1,(E:1,F:1)i4:1)i3:1)i2:1)i1:1);")?;
    let pruned = phylo.prune(["A", "D"]);
    assert!(is_fully_resolved(&pruned));
    assert_eq!(pruned.to_newick()?, "(A:1,D:4);");
    Ok(())
}

#[test]
fn prune_is_order_independent() -> Result<(), Report> {
    let phylo = Phylogeny::from_newick("((A,B)x,((C,D)y,(E,F)z)w)r;")?;
    let forward = phylo.prune(["F", "A", "C", "D"]);
    let backward = phylo.prune(["D", "C", "A", "F"]);
    let as_set = phylo.prune(["A", "C", "D", "F"].into_iter().collect::<BTreeSet<_>>());
    let as_hash = phylo.prune(["A", "C", "D", "F"].into_iter().collect::<HashSet<_>>());

    let expected = "(A,((C,D)y,F)w)r;";
    assert_eq!(forward.to_newick()?, expected);
    assert_eq!(backward.to_newick()?, expected);
    assert_eq!(as_set.to_newick()?, expected);
    assert_eq!(as_hash.to_newick()?, expected);
    Ok(())
}

#[test]
fn prune_leaves_source_untouched() -> Result<(), Report> {
    let phylo = Phylogeny::from_newick(TREE)?;
    let _ = phylo.prune(["A"]);
    assert_eq!(phylo.to_newick()?, TREE);
    Ok(())
}

#[test]
fn parse_support_labels_are_not_merged() -> Result<(), Report> {
    // repeated internal labels must stay distinct nodes
    let phylo = Phylogeny::from_newick("((A,B)100,(C,D)100)100;")?;
    assert_eq!(phylo.len(), 7);
    assert_eq!(phylo.to_newick()?, "((A,B)100,(C,D)100)100;");
    Ok(())
}

#[test]
fn parse_whitespace_and_comments() -> Result<(), Report> {
    let phylo = Phylogeny::from_newick("( A : 1 ,\n B[&support=9] : 2 ) ;")?;
    assert_eq!(phylo.to_newick()?, "(A:1,B:2);");
    Ok(())
}

#[test]
fn parse_empty_children() -> Result<(), Report> {
    let phylo = Phylogeny::from_newick("(A,,B);")?;
    assert_eq!(phylo.len(), 4);
    assert_eq!(phylo.get_tips(), ["A", "B"]);
    Ok(())
}

#[test]
fn parse_errors() {
    for newick in ["((A,B);", "(A,B));", "(A,B);C", "A,B;", "(A:x,B);", "(A:-1,B);", "('A,B);"] {
        assert!(Phylogeny::from_newick(newick).is_err(), "{newick}");
    }
}

#[test]
fn parse_duplicate_tip() {
    let result = Phylogeny::from_newick("((A,B),A);");
    let report = result.expect_err("duplicate tip labels should fail");
    assert_eq!(report.downcast_ref::<PhyloError>(), Some(&PhyloError::DuplicateTip("A".to_string())));
}

#[test]
fn parse_deep_ladder() -> Result<(), Report> {
    let depth = 20_000;
    let mut newick = "(".repeat(depth);
    newick.push('A');
    for i in 0..depth {
        newick.push_str(&format!(",B{i}:1)"));
    }
    newick.push(';');

    let phylo = Phylogeny::from_newick(&newick)?;
    assert_eq!(phylo.get_tip_indices().len(), depth + 1);
    assert_eq!(phylo.get_tips()[0], "A");
    assert_eq!(phylo.to_newick()?, newick);

    let pruned = phylo.prune(["A", "B0", "B19999"]);
    assert_eq!(pruned.to_newick()?, "((A,B0:1),B19999:1);");
    assert!(is_fully_resolved(&pruned));
    Ok(())
}

#[test]
fn parse_error_position() {
    // the second ')' is the 7th character, the 6th token
    let report = Phylogeny::from_newick("(A, B));").expect_err("unbalanced newick should fail");
    let error = report.downcast_ref::<PhyloError>();
    assert!(matches!(error, Some(PhyloError::Newick { position: 6, .. })), "{error:?}");
}

#[test]
fn read_write_file() -> Result<(), Report> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("tree.nwk");
    let phylo = Phylogeny::from_newick(TREE)?;
    phylo.write(&path)?;
    let observed = Phylogeny::read(&path)?;
    assert_eq!(observed.to_newick()?, TREE);
    Ok(())
}
