use crate::{newick, Branch, FromNewick, Node, PhyloError, ToNewick};

use color_eyre::eyre::{eyre, Report, Result, WrapErr};
use log::{debug, info};
use petgraph::graph::{EdgeIndex, Graph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt::Debug;
use std::path::Path;

/// A rooted [`Phylogeny`] of labelled [`Node`]s connected by [`Branch`]es.
///
/// - Every node has at most one parent, the root has none.
/// - Tip labels are unique, and correlate tips with bin identifiers.
/// - Children keep the order they were added in (ex. Newick order).
///
/// ```mermaid
/// graph LR;
///   root-->|1|X["90"];
///   root-->|1|Y["80"];
///   X-->|1|A;
///   X-->|1|B;
///   Y-->|1|C;
///   Y-->|1|D;
/// ```
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct Phylogeny {
    /// Directed graph of parents and children.
    pub graph: Graph<Node, Branch>,
}

impl Phylogeny {
    /// Returns a new empty [`Phylogeny`].
    ///
    /// ## Examples
    ///
    /// ```rust
    /// let mut phylo = soilmag_phylo::Phylogeny::new();
    /// let a = phylo.add_node("A");
    /// let b = phylo.add_node("B");
    /// phylo.add_branch(a, b, 1.0)?;
    /// # assert_eq!(phylo.get_tips(), ["B"]);
    /// # Ok::<(), color_eyre::eyre::Report>(())
    /// ```
    pub fn new() -> Self {
        Phylogeny { graph: Graph::new() }
    }

    /// Adds a new labelled node to the [`Phylogeny`] and returns the [`NodeIndex`].
    ///
    /// - An empty label creates an unlabelled node.
    pub fn add_node(&mut self, label: &str) -> NodeIndex {
        match label.is_empty() {
            true => self.graph.add_node(Node::new()),
            false => self.graph.add_node(Node::with_label(label)),
        }
    }

    /// Creates a branch between the parent and child nodes and returns the [`EdgeIndex`].
    ///
    /// - If the child already has a parent, returns an Error.
    /// - If the new branch would create a cycle, returns an Error.
    ///
    /// ## Examples
    ///
    /// ```rust
    /// let mut phylo = soilmag_phylo::Phylogeny::new();
    /// let (a, b, c) = (phylo.add_node("A"), phylo.add_node("B"), phylo.add_node("C"));
    /// phylo.add_branch(a, b, 1.0)?;
    /// phylo.add_branch(b, c, 1.0)?;
    /// assert!(phylo.add_branch(c, a, 1.0).is_err());
    /// assert!(phylo.add_branch(a, c, 1.0).is_err());
    /// # Ok::<(), color_eyre::eyre::Report>(())
    /// ```
    pub fn add_branch(
        &mut self,
        parent: NodeIndex,
        child: NodeIndex,
        length: f64,
    ) -> Result<EdgeIndex, Report> {
        if self.get_parent(child).is_some() {
            Err(PhyloError::MultipleParents(self.get_node(child)?.to_string()))?
        }
        // the child must not already be an ancestor of the parent
        if parent == child || self.get_ancestors(parent).contains(&child) {
            let (p, c) = (self.get_node(parent)?.to_string(), self.get_node(child)?.to_string());
            Err(PhyloError::Cycle(p, c))?
        }
        Ok(self.graph.add_edge(parent, child, Branch::with_length(length)))
    }

    /// Returns the node that corresponds to the [`NodeIndex`].
    pub fn get_node(&self, node_index: NodeIndex) -> Result<&Node, Report> {
        self.graph
            .node_weight(node_index)
            .ok_or_else(|| eyre!("Failed to get node data for node index {node_index:?}"))
    }

    /// Returns the node index of the first node with the label.
    pub fn get_node_index(&self, label: &str) -> Result<NodeIndex, Report> {
        self.graph
            .node_indices()
            .find(|i| self.graph[*i].label.as_deref() == Some(label))
            .ok_or_else(|| eyre!("Failed to get node index of node {label}"))
    }

    /// Returns the branch leading into a node, [`None`] for the root.
    pub fn get_branch(&self, node_index: NodeIndex) -> Option<&Branch> {
        self.get_parent_edge(node_index).and_then(|e| self.graph.edge_weight(e))
    }

    /// Returns the edge leading into a node, [`None`] for the root.
    pub(crate) fn get_parent_edge(&self, node_index: NodeIndex) -> Option<EdgeIndex> {
        self.graph.edges_directed(node_index, Direction::Incoming).next().map(|e| e.id())
    }

    /// Returns the parent of a node, [`None`] for the root.
    pub fn get_parent(&self, node_index: NodeIndex) -> Option<NodeIndex> {
        self.graph.neighbors_directed(node_index, Direction::Incoming).next()
    }

    /// Returns the immediate children of a node, in the order they were added.
    pub fn get_children(&self, node_index: NodeIndex) -> Vec<NodeIndex> {
        let mut children: Vec<_> = self.graph.neighbors(node_index).collect();
        // petgraph yields neighbors last added to first added, reverse this
        children.reverse();
        children
    }

    /// Returns all ancestors of a node, from its parent up to the root.
    ///
    /// ## Examples
    ///
    /// ```rust
    /// use soilmag_phylo::{FromNewick, Phylogeny};
    /// let phylo = Phylogeny::from_newick("((A,B)X,C)R;")?;
    /// let a = phylo.get_node_index("A")?;
    /// let labels: Vec<_> = phylo
    ///     .get_ancestors(a)
    ///     .into_iter()
    ///     .map(|i| phylo.graph[i].to_string())
    ///     .collect();
    /// assert_eq!(labels, ["X", "R"]);
    /// # Ok::<(), color_eyre::eyre::Report>(())
    /// ```
    pub fn get_ancestors(&self, node_index: NodeIndex) -> Vec<NodeIndex> {
        std::iter::successors(self.get_parent(node_index), |n| self.get_parent(*n)).collect()
    }

    /// Returns the node index of the root.
    ///
    /// - If the phylogeny is empty, or multiple roots are found, returns an Error.
    pub fn get_root_index(&self) -> Result<NodeIndex, Report> {
        if self.is_empty() {
            Err(eyre!("Failed to locate root node index in phylogeny as graph is empty."))?
        }
        let root_indices: Vec<_> = self
            .graph
            .node_indices()
            .filter(|i| self.get_parent(*i).is_none())
            .collect();

        match root_indices.len() {
            1 => Ok(root_indices[0]),
            0 => Err(eyre!("Failed to locate root node index in phylogeny.")),
            _ => Err(eyre!("Failed to locate root node index in phylogeny, multiple roots found: {root_indices:?}")),
        }
    }

    /// Returns the node corresponding to the root.
    pub fn get_root(&self) -> Result<&Node, Report> {
        self.get_node(self.get_root_index()?)
    }

    /// Returns the node indices of all tips, in depth-first order from the root.
    pub fn get_tip_indices(&self) -> Vec<NodeIndex> {
        let Ok(root) = self.get_root_index() else {
            return Vec::new();
        };
        // walk the children in order, so that tips come out in newick order
        let mut stack = vec![root];
        let mut tips = Vec::new();
        while let Some(node) = stack.pop() {
            let children = self.get_children(node);
            match children.is_empty() {
                true => tips.push(node),
                false => stack.extend(children.into_iter().rev()),
            }
        }
        tips
    }

    /// Returns the labels of all labelled tips, in depth-first order from the root.
    ///
    /// ## Examples
    ///
    /// ```rust
    /// use soilmag_phylo::{FromNewick, Phylogeny};
    /// let phylo = Phylogeny::from_newick("((A,B)90,(C,D)80);")?;
    /// assert_eq!(phylo.get_tips(), ["A", "B", "C", "D"]);
    /// # Ok::<(), color_eyre::eyre::Report>(())
    /// ```
    pub fn get_tips(&self) -> Vec<&str> {
        self.get_tip_indices().into_iter().filter_map(|i| self.graph[i].label.as_deref()).collect()
    }

    /// Returns the number of nodes, internal and tips.
    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    /// Returns true if the [`Phylogeny`] graph has no data.
    ///
    /// ```rust
    /// use soilmag_phylo::{FromNewick, Phylogeny};
    /// assert!(Phylogeny::new().is_empty());
    /// assert!(!Phylogeny::from_newick("(A,B);")?.is_empty());
    /// # Ok::<(), color_eyre::eyre::Report>(())
    /// ```
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Returns the minimal subtree that contains exactly the tips with a label in `keep`.
    ///
    /// - Tips not in `keep` are removed.
    /// - Internal nodes left without children are removed.
    /// - Internal nodes left with a single child are collapsed, their branch is
    ///   added to the child's branch.
    /// - A root left with a single child is replaced by that child.
    /// - Labels in `keep` that are not tips of the phylogeny are ignored.
    /// - If nothing matches, the result is an empty phylogeny.
    ///
    /// ## Examples
    ///
    /// ```rust
    /// use soilmag_phylo::{FromNewick, Phylogeny, ToNewick};
    ///
    /// let phylo = Phylogeny::from_newick("((A:1,B:1)90:1,(C:1,D:1)80:1);")?;
    ///
    /// let pruned = phylo.prune(["A", "B", "C", "Z"]);
    /// assert_eq!(pruned.to_newick()?, "((A:1,B:1)90:1,C:2);");
    ///
    /// let pruned = phylo.prune(["Z"]);
    /// assert!(pruned.is_empty());
    /// # Ok::<(), color_eyre::eyre::Report>(())
    /// ```
    pub fn prune<I, S>(&self, keep: I) -> Phylogeny
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keep: HashSet<String> = keep.into_iter().map(|s| s.as_ref().to_string()).collect();

        let tips: HashSet<&str> = self.get_tips().into_iter().collect();
        let unknown = keep.iter().filter(|label| !tips.contains(label.as_str())).count();
        if unknown > 0 {
            info!("Ignoring {unknown}/{} labels that are not tips of the phylogeny.", keep.len());
        }

        let mut pruned = Phylogeny::new();
        if let Ok(root) = self.get_root_index() {
            self.prune_from(root, &keep, &mut pruned);
        }
        debug!(
            "Pruned phylogeny from {} to {} tips.",
            self.get_tip_indices().len(),
            pruned.get_tip_indices().len()
        );
        pruned
    }

    /// Copies the surviving part of a subtree into `pruned`.
    ///
    /// Nodes are visited in post-order with an explicit stack, so that deep
    /// (ex. ladder-like) trees do not exhaust the call stack. Each visited
    /// node resolves to the new index of its surviving top node and the
    /// branch that should lead into it, or [`None`] if nothing survives.
    fn prune_from(
        &self,
        top: NodeIndex,
        keep: &HashSet<String>,
        pruned: &mut Phylogeny,
    ) -> Option<(NodeIndex, Branch)> {
        let mut survivors: HashMap<NodeIndex, Option<(NodeIndex, Branch)>> = HashMap::new();
        let mut stack = vec![(top, false)];

        while let Some((node_index, visited)) = stack.pop() {
            let children = self.get_children(node_index);
            if !visited && !children.is_empty() {
                stack.push((node_index, true));
                // pushed in reverse, so children are copied in order
                stack.extend(children.into_iter().rev().map(|c| (c, false)));
                continue;
            }

            let node = &self.graph[node_index];
            let branch = self.get_branch(node_index).copied().unwrap_or_default();

            let survivor = match children.is_empty() {
                true => node
                    .label
                    .as_ref()
                    .filter(|label| keep.contains(*label))
                    .map(|_| (pruned.graph.add_node(node.clone()), branch)),
                false => {
                    let kept: Vec<_> =
                        children.iter().filter_map(|c| survivors.remove(c).flatten()).collect();
                    match kept.len() {
                        0 => None,
                        1 => {
                            let (child, child_branch) = kept[0];
                            Some((child, branch + child_branch))
                        }
                        _ => {
                            let copy = pruned.graph.add_node(node.clone());
                            kept.into_iter().for_each(|(child, child_branch)| {
                                pruned.graph.add_edge(copy, child, child_branch);
                            });
                            Some((copy, branch))
                        }
                    }
                }
            };
            survivors.insert(node_index, survivor);
        }

        survivors.remove(&top).flatten()
    }

    /// Read a [`Phylogeny`] from a Newick file.
    pub fn read<P>(path: &P) -> Result<Phylogeny, Report>
    where
        P: AsRef<Path> + Debug,
    {
        let newick = std::fs::read_to_string(path)
            .wrap_err_with(|| eyre!("Failed to read phylogeny: {path:?}"))?;
        Phylogeny::from_newick(&newick)
            .wrap_err_with(|| eyre!("Failed to parse phylogeny: {path:?}"))
    }

    /// Write a [`Phylogeny`] to a Newick file.
    pub fn write<P>(&self, path: &P) -> Result<(), Report>
    where
        P: AsRef<Path> + Debug,
    {
        let newick = self.to_newick()?;
        std::fs::write(path, format!("{newick}\n"))
            .wrap_err_with(|| eyre!("Failed to write phylogeny: {path:?}"))
    }
}

impl FromNewick for Phylogeny {
    /// Returns a [`Phylogeny`] created from a [Newick](https://en.wikipedia.org/wiki/Newick_format) string.
    ///
    /// ## Examples
    ///
    /// ```rust
    /// use soilmag_phylo::{Phylogeny, FromNewick};
    /// let phylo = Phylogeny::from_newick("(A,B);")?;
    /// assert_eq!(phylo.get_tips(), ["A", "B"]);
    /// assert!(Phylogeny::from_newick("(A,A);").is_err());
    /// # Ok::<(), color_eyre::eyre::Report>(())
    /// ```
    fn from_newick(newick: &str) -> Result<Phylogeny, Report> {
        newick::str_to_phylogeny(newick)
    }
}

impl ToNewick for Phylogeny {
    /// Returns a [Newick](https://en.wikipedia.org/wiki/Newick_format) string created from a [`Phylogeny`].
    fn to_newick(&self) -> Result<String, Report> {
        newick::phylogeny_to_str(self)
    }
}
