//! Error type shared by the loader, the reshaping stages and the store backends.

use thiserror::Error;

/// Every way reading or reshaping a T-Walk store can fail.
///
/// Degenerate-but-valid inputs (a chain without valid samples, a table with zero
/// draws) are not errors; they flow through as empty results.
#[derive(Debug, Error)]
pub enum TwalkError {
    /// A group or array requested from the store does not exist.
    #[error("missing key `{key}` in group `{group}`")]
    MissingKey { group: String, key: String },

    /// The store does not follow the expected layout.
    #[error("malformed store: {0}")]
    MalformedStore(String),

    /// A multiplicity that cannot be expanded into repeats.
    #[error("invalid multiplicity {value} at position {position}")]
    InvalidMultiplicity { position: usize, value: f64 },

    /// Two sequences that must be parallel have different lengths.
    #[error("length mismatch: expected {expected}, found {found}")]
    LengthMismatch { expected: usize, found: usize },

    /// A minimum length was requested over zero chains.
    #[error("no chains to align")]
    NoChains,

    /// Parameters in a posterior table do not share one shape.
    #[error("inconsistent shape: {0}")]
    InconsistentShape(String),

    /// The input path does not name a store this build can open.
    #[error("unsupported store format: {0}")]
    UnsupportedFormat(String),

    /// An expanded chain does not fit in memory.
    #[error("cannot allocate expanded chain: {0}")]
    Allocation(#[from] std::collections::TryReserveError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[cfg(feature = "hdf5")]
    #[error(transparent)]
    Hdf5(#[from] hdf5::Error),

    #[cfg(feature = "csv")]
    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[cfg(feature = "arrow")]
    #[error(transparent)]
    Arrow(#[from] arrow::error::ArrowError),

    #[cfg(feature = "parquet")]
    #[error(transparent)]
    Parquet(#[from] parquet::errors::ParquetError),

    #[cfg(feature = "plot")]
    #[error("plotting failed: {0}")]
    Plot(String),
}

pub type Result<T> = std::result::Result<T, TwalkError>;
