//! Named errors raised while normalizing and loading source tables.
//!
//! These are wrapped into a [`color_eyre::eyre::Report`] at the public
//! boundary and can be recovered with [`Report::downcast_ref`](color_eyre::eyre::Report::downcast_ref).

use crate::record::Source;

/// Errors raised by the field normalizer.
#[derive(Clone, Debug, thiserror::Error, PartialEq)]
pub enum NormalizeError {
    #[error("Malformed identifier {value:?}: {reason}")]
    MalformedIdentifier { value: String, reason: String },
}

/// Errors raised by the record loader.
#[derive(Clone, Debug, thiserror::Error, PartialEq)]
pub enum LoadError {
    #[error("The {input} table is missing the required column {column:?}.")]
    SchemaMismatch { input: Source, column: String },
    #[error("The {input} table has a malformed identifier on row {row}: {value:?}")]
    MalformedIdentifier { input: Source, row: usize, value: String },
    #[error("The {input} table has a non-numeric value in column {column:?} on row {row}: {value:?}")]
    InvalidNumber { input: Source, column: String, row: usize, value: String },
}
