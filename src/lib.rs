//! Reshape T-Walk MCMC output into equally weighted, chain-aligned posterior tables.
//!
//! [`reader::TWalk`] loads a [`store::SampleStore`], drops invalid samples, splits
//! the stream by walker, expands multiplicities and truncates every walker to a
//! common length. The result is a [`posterior::Posterior`] with one
//! `(n_chains, n_draws)` array per primary parameter.

pub mod chains;
pub mod error;
pub mod io;
#[cfg(feature = "plot")]
pub mod plot;
pub mod posterior;
pub mod reader;
pub mod stats;
pub mod store;

pub use error::{Result, TwalkError};
pub use posterior::Posterior;
pub use reader::{Schema, TWalk};
