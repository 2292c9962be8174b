use std::{io, path::PathBuf};

use thiserror::Error;

/// Errors raised by the binning/join/view core.
///
/// Every variant is local to one computed artifact (one threshold set, one
/// layer, one view); callers can keep using the table for anything else.
#[derive(Debug, Error)]
pub enum Error {
    /// Division count below the minimum the caller allows.
    #[error("division count {division} is below the minimum of {min}")]
    InvalidDivision { division: usize, min: usize },

    /// Division count above the maximum the caller allows.
    #[error("division count {division} is above the maximum of {max}")]
    ExcessiveDivision { division: usize, max: usize },

    /// Threshold generation over a series with no present values.
    #[error("cannot derive thresholds from an empty series")]
    EmptySeries,

    /// An explicit edge sequence with fewer than two edges.
    #[error("an edge sequence needs at least two edges, got {0}")]
    TooFewEdges(usize),

    /// A requested attribute column does not exist in the table.
    #[error("column {column:?} is missing from the table")]
    MissingColumn { column: String },

    /// A requested column exists but cannot be read as numeric.
    #[error("column {column:?} cannot be read as numeric")]
    NotNumeric { column: String },

    /// An attribute table repeats a join key; the join would multiply rows.
    #[error("attribute table repeats join key {key:?}")]
    DuplicateKey { key: String },

    /// No palette registered under the requested name.
    #[error("unknown palette {name:?}")]
    MissingPalette { name: String },

    #[error(transparent)]
    Polars(#[from] polars::error::PolarsError),
}

/// Errors from loading injectable configuration (patch tables, column schemas).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("failed to read config from {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
