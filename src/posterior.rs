//! The posterior sample table: one `(n_chains, n_draws)` array per parameter.

use log::warn;
use ndarray::{Array2, Array3, ArrayView2};

use crate::error::{Result, TwalkError};

/// Equally weighted, chain-aligned posterior samples keyed by parameter short name.
///
/// Parameters keep the order in which they were inserted. Arrays are stored as
/// `draws[chain][draw]`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Posterior {
    params: Vec<(String, Array2<f64>)>,
}

impl Posterior {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a parameter. A name that is already present keeps its position and
    /// has its draws replaced.
    pub fn insert(&mut self, name: impl Into<String>, draws: Array2<f64>) {
        let name = name.into();
        match self.params.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => {
                warn!("Parameter `{name}` appears more than once; keeping the last one");
                *existing = draws;
            }
            None => self.params.push((name, draws)),
        }
    }

    pub fn get(&self, name: &str) -> Option<ArrayView2<'_, f64>> {
        self.params
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, d)| d.view())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.params.iter().map(|(n, _)| n.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, ArrayView2<'_, f64>)> {
        self.params.iter().map(|(n, d)| (n.as_str(), d.view()))
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Number of chains of the first parameter, or 0 for an empty table.
    pub fn n_chains(&self) -> usize {
        self.params.first().map_or(0, |(_, d)| d.nrows())
    }

    /// Packs every parameter into one `chain × draw × parameter` array.
    ///
    /// Fails with [`TwalkError::InconsistentShape`] if the parameters do not all
    /// share one `(n_chains, n_draws)` shape.
    pub fn to_array3(&self) -> Result<Array3<f64>> {
        let (n_chains, n_draws) = match self.params.first() {
            Some((_, d)) => d.dim(),
            None => (0, 0),
        };
        for (name, d) in &self.params {
            if d.dim() != (n_chains, n_draws) {
                return Err(TwalkError::InconsistentShape(format!(
                    "parameter `{name}` has shape {:?}, expected {:?}",
                    d.dim(),
                    (n_chains, n_draws)
                )));
            }
        }
        let n_params = self.params.len();
        Ok(Array3::from_shape_fn(
            (n_chains, n_draws, n_params),
            |(c, s, p)| self.params[p].1[[c, s]],
        ))
    }
}
