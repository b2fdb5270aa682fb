/*!
# T-Walk Reader

[`TWalk`] owns a [`SampleStore`] and the state derived from it at load time: the
validity mask, the filtered chain index, the number of walkers and the per-walker
multiplicities. Every array it hands out is an owned copy; nothing points back
into the store.

## Pipeline

- [`TWalk::get_array`]: drop invalid samples.
- [`TWalk::get_chains`]: de-interleave by walker.
- [`TWalk::get_equally_weighted_chains`]: expand by multiplicity.
- [`TWalk::to_posterior`]: align every primary parameter and collect the table.

## Example Usage

```rust
use twalk_reader::reader::TWalk;
use twalk_reader::store::MemoryStore;

let store = MemoryStore::new()
    .with_array("run", "chain_isvalid", vec![0.0, 1.0, 1.0, 1.0, 1.0])
    .with_array("run", "chain", vec![0.0, 0.0, 1.0, 0.0, 1.0])
    .with_array("run", "mult", vec![9.0, 1.0, 2.0, 1.0, 1.0])
    .with_array("run", "model::primary_parameters::mu", vec![-1.0, 0.1, 0.2, 0.3, 0.4]);

let twalk = TWalk::open(store).unwrap();
assert_eq!(twalk.n_chains(), 2);

let posterior = twalk.to_posterior().unwrap();
let mu = posterior.get("mu").unwrap();
assert_eq!(mu.shape(), &[2, 2]);
assert_eq!(mu.row(1).to_vec(), vec![0.2, 0.2]);
```
*/

use log::{debug, warn};

use crate::chains::{equal_length_stack, equally_weight, split_by_chain};
use crate::error::{Result, TwalkError};
use crate::posterior::Posterior;
use crate::store::SampleStore;

/// Key naming convention of a T-Walk store.
///
/// The default matches what the sampler writes. The active group is the last one
/// in the store unless [`Schema::with_group`] names another.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    pub group: Option<String>,
    pub validity_key: String,
    pub chain_key: String,
    pub mult_key: String,
    pub parameter_marker: String,
    pub excluded_suffix: String,
    pub separator: String,
}

impl Default for Schema {
    fn default() -> Self {
        Self {
            group: None,
            validity_key: "chain_isvalid".to_string(),
            chain_key: "chain".to_string(),
            mult_key: "mult".to_string(),
            parameter_marker: "::primary_parameters::".to_string(),
            excluded_suffix: "_isvalid".to_string(),
            separator: "::".to_string(),
        }
    }
}

impl Schema {
    /// Reads `group` instead of the last group in the store.
    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    /// Whether a key names a primary parameter.
    pub fn is_parameter(&self, key: &str) -> bool {
        key.contains(&self.parameter_marker) && !key.ends_with(&self.excluded_suffix)
    }

    /// The text after the last separator of a parameter key.
    pub fn short_name<'a>(&self, key: &'a str) -> &'a str {
        key.rsplit(self.separator.as_str()).next().unwrap_or(key)
    }
}

/// Reader over one group of a T-Walk sample store.
#[derive(Debug)]
pub struct TWalk<S: SampleStore> {
    store: S,
    schema: Schema,
    group: String,
    valid: Vec<bool>,
    chain: Vec<usize>,
    n_chains: usize,
    mults: Vec<Vec<i64>>,
}

impl<S: SampleStore> TWalk<S> {
    /// Loads `store` with the default [`Schema`].
    pub fn open(store: S) -> Result<Self> {
        Self::with_schema(store, Schema::default())
    }

    /// Loads `store`, selecting the active group and computing the validity mask,
    /// the chain index and the per-chain multiplicities.
    ///
    /// Every array in the group must have as many entries as the validity array.
    /// Chain ids must be integers below that length; multiplicities must be
    /// non-negative integers.
    pub fn with_schema(store: S, schema: Schema) -> Result<Self> {
        let group = select_group(&store, &schema)?;
        let keys = store.keys(&group)?;
        if keys.is_empty() {
            return Err(TwalkError::MalformedStore(format!(
                "group `{group}` contains no arrays"
            )));
        }

        let valid: Vec<bool> = store
            .read(&group, &schema.validity_key)?
            .into_iter()
            .map(|flag| flag == 1.0)
            .collect();
        for key in &keys {
            let len = store.read(&group, key)?.len();
            if len != valid.len() {
                return Err(TwalkError::MalformedStore(format!(
                    "array `{key}` has {len} entries but `{}` has {}",
                    schema.validity_key,
                    valid.len()
                )));
            }
        }

        let mut twalk = Self {
            store,
            schema,
            group,
            valid,
            chain: Vec::new(),
            n_chains: 0,
            mults: Vec::new(),
        };

        let limit = twalk.valid.len();
        twalk.chain = twalk
            .get_array(&twalk.schema.chain_key)?
            .into_iter()
            .map(|c| to_chain_index(c, limit))
            .collect::<Result<_>>()?;
        twalk.n_chains = match twalk.chain.iter().max() {
            Some(&c) => c.checked_add(1).ok_or_else(|| {
                TwalkError::MalformedStore(format!("chain index {c} is too large"))
            })?,
            None => 0,
        };

        // Invalid samples are checked too; positions refer to the raw array.
        let raw_mult: Vec<i64> = twalk
            .store
            .read(&twalk.group, &twalk.schema.mult_key)?
            .into_iter()
            .enumerate()
            .map(|(position, m)| to_multiplicity(position, m))
            .collect::<Result<_>>()?;
        let mult: Vec<i64> = raw_mult
            .into_iter()
            .zip(&twalk.valid)
            .filter_map(|(m, &ok)| ok.then_some(m))
            .collect();
        twalk.mults = split_by_chain(&mult, &twalk.chain, twalk.n_chains)?;

        debug!(
            "Loaded group `{}`: {} of {} samples valid, {} chains",
            twalk.group,
            twalk.chain.len(),
            twalk.valid.len(),
            twalk.n_chains
        );
        if twalk.n_chains == 0 {
            warn!("Group `{}` has no valid samples", twalk.group);
        }
        for (c, m) in twalk.mults.iter().enumerate() {
            if m.is_empty() {
                warn!("Chain {c} has no valid samples");
            }
        }

        Ok(twalk)
    }

    /// Name of the active group.
    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Validity flag of every raw sample.
    pub fn valid(&self) -> &[bool] {
        &self.valid
    }

    /// Walker id of every valid sample.
    pub fn chain(&self) -> &[usize] {
        &self.chain
    }

    pub fn n_chains(&self) -> usize {
        self.n_chains
    }

    /// Multiplicities of the valid samples, one sequence per walker.
    pub fn mults(&self) -> &[Vec<i64>] {
        &self.mults
    }

    /// Values of `key` at valid positions, in their original order.
    pub fn get_array(&self, key: &str) -> Result<Vec<f64>> {
        let raw = self.store.read(&self.group, key)?;
        if raw.len() != self.valid.len() {
            return Err(TwalkError::MalformedStore(format!(
                "array `{key}` has {} entries but `{}` has {}",
                raw.len(),
                self.schema.validity_key,
                self.valid.len()
            )));
        }
        Ok(raw
            .into_iter()
            .zip(&self.valid)
            .filter_map(|(v, &ok)| ok.then_some(v))
            .collect())
    }

    /// Valid values of `key`, one sequence per walker in ascending walker order.
    pub fn get_chains(&self, key: &str) -> Result<Vec<Vec<f64>>> {
        split_by_chain(&self.get_array(key)?, &self.chain, self.n_chains)
    }

    /// Valid values of `key` per walker, each state repeated by its multiplicity.
    pub fn get_equally_weighted_chains(&self, key: &str) -> Result<Vec<Vec<f64>>> {
        self.get_chains(key)?
            .iter()
            .zip(&self.mults)
            .map(|(values, mults)| equally_weight(values, mults))
            .collect()
    }

    /// Full keys of the primary parameters, in store order.
    pub fn get_param_names(&self) -> Result<Vec<String>> {
        Ok(self
            .store
            .keys(&self.group)?
            .into_iter()
            .filter(|k| self.schema.is_parameter(k))
            .collect())
    }

    /// Builds the posterior table from every primary parameter.
    ///
    /// Each parameter is truncated to its own shortest equally weighted chain.
    /// The first failing parameter aborts the whole assembly.
    pub fn to_posterior(&self) -> Result<Posterior> {
        let mut posterior = Posterior::new();
        for key in self.get_param_names()? {
            let draws = equal_length_stack(&self.get_equally_weighted_chains(&key)?)?;
            let name = self.schema.short_name(&key);
            debug!("Parameter `{name}`: {:?}", draws.dim());
            if draws.ncols() == 0 {
                warn!("Parameter `{name}` has no draws after chain alignment");
            }
            posterior.insert(name, draws);
        }
        Ok(posterior)
    }
}

fn select_group<S: SampleStore>(store: &S, schema: &Schema) -> Result<String> {
    let groups = store.groups()?;
    match &schema.group {
        Some(name) => groups
            .into_iter()
            .find(|g| g == name)
            .ok_or_else(|| TwalkError::MissingKey {
                group: "/".to_string(),
                key: name.clone(),
            }),
        None => groups
            .into_iter()
            .last()
            .ok_or_else(|| TwalkError::MalformedStore("store contains no groups".to_string())),
    }
}

/// A walker id must be an integer in `[0, limit)`, `limit` being the raw sample count.
fn to_chain_index(value: f64, limit: usize) -> Result<usize> {
    if value.is_finite() && value >= 0.0 && value.fract() == 0.0 && value < limit as f64 {
        Ok(value as usize)
    } else {
        Err(TwalkError::MalformedStore(format!(
            "chain index {value} is not an integer in [0, {limit})"
        )))
    }
}

fn to_multiplicity(position: usize, value: f64) -> Result<i64> {
    // i64::MAX as f64 rounds up to 2^63, which is already out of range.
    if value.is_finite() && value >= 0.0 && value.fract() == 0.0 && value < i64::MAX as f64 {
        Ok(value as i64)
    } else {
        Err(TwalkError::InvalidMultiplicity { position, value })
    }
}
