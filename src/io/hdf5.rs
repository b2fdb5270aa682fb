/*!
# HDF5 Sample Store

Reads the HDF5 files T-Walk writes: one top-level group per run, each holding
one-dimensional datasets indexed by raw sample. Enable via the `hdf5` feature.

Integer, unsigned, float and boolean datasets are all widened to `f64`. The file
is opened read-only and closed when the store is dropped.

```rust,no_run
use twalk_reader::io::hdf5::Hdf5Store;
use twalk_reader::reader::TWalk;

let twalk = TWalk::open(Hdf5Store::open("run.h5")?)?;
let posterior = twalk.to_posterior()?;
println!("{} parameters", posterior.len());
# Ok::<(), Box<dyn std::error::Error>>(())
```
*/

use std::path::Path;

use hdf5::types::TypeDescriptor;
use hdf5::{Dataset, File, Group};

use crate::error::{Result, TwalkError};
use crate::store::SampleStore;

/// A [`SampleStore`] backed by an HDF5 file.
pub struct Hdf5Store {
    file: File,
}

impl Hdf5Store {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self {
            file: File::open(path)?,
        })
    }

    fn group(&self, name: &str) -> Result<Group> {
        if !self.file.link_exists(name) {
            return Err(TwalkError::MissingKey {
                group: "/".to_string(),
                key: name.to_string(),
            });
        }
        self.file
            .group(name)
            .map_err(|e| TwalkError::MalformedStore(format!("`{name}` is not a group: {e}")))
    }
}

impl SampleStore for Hdf5Store {
    fn groups(&self) -> Result<Vec<String>> {
        Ok(self.file.member_names()?)
    }

    fn keys(&self, group: &str) -> Result<Vec<String>> {
        Ok(self.group(group)?.member_names()?)
    }

    fn read(&self, group: &str, key: &str) -> Result<Vec<f64>> {
        let parent = self.group(group)?;
        if !parent.link_exists(key) {
            return Err(TwalkError::MissingKey {
                group: group.to_string(),
                key: key.to_string(),
            });
        }
        read_widened(&parent.dataset(key)?, key)
    }
}

fn read_widened(dataset: &Dataset, key: &str) -> Result<Vec<f64>> {
    let values = match dataset.dtype()?.to_descriptor()? {
        TypeDescriptor::Float(_) => dataset.read_raw::<f64>()?,
        TypeDescriptor::Integer(_) => dataset
            .read_raw::<i64>()?
            .into_iter()
            .map(|v| v as f64)
            .collect(),
        TypeDescriptor::Unsigned(_) => dataset
            .read_raw::<u64>()?
            .into_iter()
            .map(|v| v as f64)
            .collect(),
        TypeDescriptor::Boolean => dataset
            .read_raw::<bool>()?
            .into_iter()
            .map(|v| if v { 1.0 } else { 0.0 })
            .collect(),
        other => {
            return Err(TwalkError::MalformedStore(format!(
                "dataset `{key}` has non-numeric type {other:?}"
            )))
        }
    };
    Ok(values)
}
