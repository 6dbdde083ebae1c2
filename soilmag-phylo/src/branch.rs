use crate::{newick, FromNewick};

use color_eyre::eyre::{eyre, Report, Result, WrapErr};
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::fmt::{Display, Formatter};
use std::ops::Add;

/// A [`Branch`] in the [`Phylogeny`](crate::Phylogeny), connecting a parent to a child.
#[derive(Copy, Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct Branch {
    /// [`Branch`] length (ex. 0.05), [`None`] if the source did not supply one.
    pub length: Option<f64>,
}

#[rustfmt::skip]
impl Display for Branch { fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result { match self.length { Some(l) => write!(f, "{l}"), None => write!(f, "") } } }

impl Branch {
    /// Returns a new [`Branch`] with no length.
    pub fn new() -> Self {
        Branch { length: None }
    }

    /// Returns a new [`Branch`] with a length.
    pub fn with_length(length: f64) -> Self {
        Branch { length: Some(length) }
    }
}

/// Joins two consecutive branches, as happens when an internal node with a single child is collapsed.
///
/// ```rust
/// use soilmag_phylo::Branch;
/// assert_eq!(Branch::with_length(1.5) + Branch::with_length(0.5), Branch::with_length(2.0));
/// assert_eq!(Branch::with_length(1.5) + Branch::new(), Branch::with_length(1.5));
/// assert_eq!(Branch::new() + Branch::new(), Branch::new());
/// ```
impl Add for Branch {
    type Output = Branch;

    fn add(self, other: Branch) -> Branch {
        let length = match (self.length, other.length) {
            (Some(a), Some(b)) => Some(a + b),
            (Some(l), None) | (None, Some(l)) => Some(l),
            (None, None) => None,
        };
        Branch { length }
    }
}

impl FromNewick for Branch {
    /// Returns a [`Branch`] created from a [Newick](https://en.wikipedia.org/wiki/Newick_format) node [`str`].
    ///
    /// # Examples
    ///
    /// Just a node name.
    ///
    /// ```rust
    /// use soilmag_phylo::{Branch, FromNewick};
    /// assert_eq!(Branch::from_newick("A")?, Branch::new());
    /// # Ok::<(), color_eyre::eyre::Report>(())
    /// ```
    ///
    /// Support label and branch length.
    ///
    /// ```rust
    /// # use soilmag_phylo::{Branch, FromNewick};
    /// assert_eq!(Branch::from_newick("95:0.25")?, Branch::with_length(0.25));
    /// assert!(Branch::from_newick("A:-1").is_err());
    /// assert!(Branch::from_newick("A:x").is_err());
    /// # Ok::<(), color_eyre::eyre::Report>(())
    /// ```
    fn from_newick(newick: &str) -> Result<Branch, Report> {
        let (_label, length) = newick::split_attributes(newick)?;
        let length = match length {
            Some(l) => {
                let l: f64 = l
                    .parse()
                    .wrap_err_with(|| eyre!("Failed to parse branch length from newick: {newick}"))?;
                if l < 0.0 || l.is_nan() {
                    return Err(eyre!("Branch length must be non-negative: {newick}"));
                }
                Some(l)
            }
            None => None,
        };
        Ok(Branch { length })
    }
}
