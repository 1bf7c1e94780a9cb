//! Error types for loading, aggregating and colouring commute data.

use crate::modes::TravelMode;

/// Failure reading or decoding one of the two input sources.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to read '{source_name}': {error}")]
    Io {
        source_name: String,
        #[source]
        error: std::io::Error,
    },
    #[error("failed to fetch '{source_name}': {error}")]
    Fetch {
        source_name: String,
        #[source]
        error: anyhow::Error,
    },
    #[error("invalid GeoJSON in '{source_name}': {error}")]
    GeoJson {
        source_name: String,
        #[source]
        error: serde_json::Error,
    },
    #[error("expected a FeatureCollection in '{source_name}', found '{found}'")]
    NotFeatureCollection { source_name: String, found: String },
    #[error("invalid CSV in '{source_name}': {error}")]
    Csv {
        source_name: String,
        #[source]
        error: csv::Error,
    },
}

/// A numeric cell that could not be read as a count.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("invalid count '{value}' in column '{field}' at row {row}")]
    InvalidCount {
        field: String,
        row: usize,
        value: String,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum AggregateError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("required column '{0}' is missing from the table header")]
    MissingColumn(&'static str),
    #[error("community '{comm_code}' appears more than once (rows {first_row} and {row})")]
    DuplicateCommunity {
        comm_code: String,
        first_row: usize,
        row: usize,
    },
    #[error("counts for community '{comm_code}' overflow at column '{mode}'")]
    Overflow { comm_code: String, mode: TravelMode },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ShareError {
    #[error("total for mode '{mode}' is zero; share is undefined")]
    DivisionUndefined { mode: TravelMode },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum StateError {
    #[error("mode '{0}' has no colour palette and cannot be mapped")]
    UnmappableMode(TravelMode),
}
