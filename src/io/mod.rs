//! File backends: stores to read T-Walk output from, and exporters for the
//! posterior table. Each backend sits behind a cargo feature of the same name.

#[cfg(feature = "arrow")]
pub mod arrow;

#[cfg(feature = "csv")]
pub mod csv;

#[cfg(feature = "hdf5")]
pub mod hdf5;

#[cfg(feature = "parquet")]
pub mod parquet;
