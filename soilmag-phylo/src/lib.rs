#![doc = include_str!("../README.md")]

use color_eyre::eyre::{Report, Result};

mod branch;
pub mod newick;
mod node;
mod phylogeny;

#[cfg(test)]
mod tests;

#[doc(inline)]
pub use branch::Branch;
#[doc(inline)]
pub use node::Node;
#[doc(inline)]
pub use phylogeny::Phylogeny;

// ----------------------------------------------------------------------------
// Traits
// ----------------------------------------------------------------------------

/// Returns an object created from a [Newick](https://en.wikipedia.org/wiki/Newick_format) [`str`].
pub trait FromNewick {
    fn from_newick(newick: &str) -> Result<Self, Report>
    where
        Self: Sized;
}

/// Returns a [Newick](https://en.wikipedia.org/wiki/Newick_format) [`str`] created from an object.
pub trait ToNewick {
    fn to_newick(&self) -> Result<String, Report>;
}

// ----------------------------------------------------------------------------
// Errors
// ----------------------------------------------------------------------------

/// Structural problems in a [`Phylogeny`].
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum PhyloError {
    #[error("Tip label {0:?} occurs more than once in the phylogeny.")]
    DuplicateTip(String),
    #[error("Node {0} already has a parent, a phylogeny node can only have one.")]
    MultipleParents(String),
    #[error("Branch between {0} and {1} would introduce a cycle.")]
    Cycle(String, String),
    #[error("Malformed newick near position {position}: {reason}")]
    Newick { position: usize, reason: String },
}
