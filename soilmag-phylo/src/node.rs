use crate::{newick, FromNewick};
use color_eyre::eyre::{Report, Result};
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::fmt::{Display, Formatter};

/// A [`Node`] in the [`Phylogeny`](crate::Phylogeny) graph.
///
/// Tips carry the identifier used to correlate the tree with tabular records,
/// internal nodes optionally carry a clade name or support value.
#[derive(Clone, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct Node {
    /// [`Node`] label, [`None`] when unlabelled.
    pub label: Option<String>,
}

#[rustfmt::skip]
impl Display for Node { fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result { write!(f, "{}", self.label.as_deref().unwrap_or("")) } }

impl Node {
    /// Returns a new unlabelled [`Node`].
    pub fn new() -> Self {
        Node { label: None }
    }

    /// Returns a new [`Node`] with a label.
    pub fn with_label(label: &str) -> Self {
        Node { label: Some(label.to_string()) }
    }
}

impl FromNewick for Node {
    /// Returns a [`Node`] created from a [Newick](https://en.wikipedia.org/wiki/Newick_format) node [`str`].
    ///
    /// ## Examples
    ///
    /// Just a node name.
    ///
    /// ```rust
    /// use soilmag_phylo::{Node, FromNewick};
    /// let node = Node::from_newick("bin_1")?;
    /// assert_eq!(node, Node::with_label("bin_1"));
    /// # Ok::<(), color_eyre::eyre::Report>(())
    /// ```
    ///
    /// A quoted name and a branch length.
    ///
    /// ```rust
    /// use soilmag_phylo::{Node, FromNewick};
    /// let node = Node::from_newick("'c__Gammaproteobacteria; 98':0.5")?;
    /// assert_eq!(node, Node::with_label("c__Gammaproteobacteria; 98"));
    /// # Ok::<(), color_eyre::eyre::Report>(())
    /// ```
    ///
    /// Only a branch length.
    ///
    /// ```rust
    /// use soilmag_phylo::{Node, FromNewick};
    /// assert_eq!(Node::from_newick(":0.5")?, Node::new());
    /// # Ok::<(), color_eyre::eyre::Report>(())
    /// ```
    fn from_newick(newick: &str) -> Result<Self, Report> {
        let (label, _length) = newick::split_attributes(newick)?;
        Ok(Node { label })
    }
}
