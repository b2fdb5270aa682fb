/*!
# CSV Store and Export

Two directions, both enabled via the `csv` feature:

- [`CsvStore`] reads a flat sample table, one column per key, as a store with a
  single group named after the file stem.
- [`save_csv`] writes a [`Posterior`] in long format, one row per chain and draw.

```rust
use twalk_reader::io::csv::save_csv;
use twalk_reader::posterior::Posterior;
use ndarray::arr2;

let mut posterior = Posterior::new();
posterior.insert("mu", arr2(&[[0.5, 0.7], [0.6, 0.4]]));
save_csv(&posterior, "/tmp/posterior.csv")?;
# Ok::<(), Box<dyn std::error::Error>>(())
```
*/

use std::fs::File;
use std::path::Path;

use csv::{Reader, Writer};
use ndarray::Axis;

use crate::error::{Result, TwalkError};
use crate::posterior::Posterior;
use crate::store::SampleStore;

/// A single-group [`SampleStore`] loaded from a CSV file with a header row.
///
/// Cells are parsed as floats; `true`/`false` (any case) read as 1 and 0.
#[derive(Debug, Clone, PartialEq)]
pub struct CsvStore {
    group: String,
    columns: Vec<(String, Vec<f64>)>,
}

impl CsvStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let group = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("samples")
            .to_string();

        let mut rdr = Reader::from_path(path)?;
        let mut columns: Vec<(String, Vec<f64>)> = rdr
            .headers()?
            .iter()
            .map(|h| (h.to_string(), Vec::new()))
            .collect();

        for (row, record) in rdr.records().enumerate() {
            let record = record?;
            for ((key, values), cell) in columns.iter_mut().zip(record.iter()) {
                values.push(parse_cell(cell).ok_or_else(|| {
                    TwalkError::MalformedStore(format!(
                        "column `{key}` row {row}: cannot parse `{cell}` as a number"
                    ))
                })?);
            }
        }

        Ok(Self { group, columns })
    }

    /// Name of the single group this store exposes.
    pub fn group_name(&self) -> &str {
        &self.group
    }
}

fn parse_cell(cell: &str) -> Option<f64> {
    let cell = cell.trim();
    if cell.eq_ignore_ascii_case("true") {
        Some(1.0)
    } else if cell.eq_ignore_ascii_case("false") {
        Some(0.0)
    } else {
        cell.parse().ok()
    }
}

impl SampleStore for CsvStore {
    fn groups(&self) -> Result<Vec<String>> {
        Ok(vec![self.group.clone()])
    }

    fn keys(&self, group: &str) -> Result<Vec<String>> {
        self.check_group(group)?;
        Ok(self.columns.iter().map(|(k, _)| k.clone()).collect())
    }

    fn read(&self, group: &str, key: &str) -> Result<Vec<f64>> {
        self.check_group(group)?;
        self.columns
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
            .ok_or_else(|| TwalkError::MissingKey {
                group: group.to_string(),
                key: key.to_string(),
            })
    }
}

impl CsvStore {
    fn check_group(&self, group: &str) -> Result<()> {
        if group == self.group {
            Ok(())
        } else {
            Err(TwalkError::MissingKey {
                group: "/".to_string(),
                key: group.to_string(),
            })
        }
    }
}

/**
Saves a posterior table as a CSV file.

The resulting file has a header row with `"chain"`, `"draw"` and one column per
parameter, followed by one row per chain and draw. An empty table produces just
the `"chain,draw"` header.

Fails with [`TwalkError::InconsistentShape`] if the parameters do not share one
`(n_chains, n_draws)` shape.
*/
pub fn save_csv<P: AsRef<Path>>(posterior: &Posterior, filename: P) -> Result<()> {
    let data = posterior.to_array3()?;
    let mut wtr = Writer::from_writer(File::create(filename)?);

    let mut header: Vec<String> = vec!["chain".to_string(), "draw".to_string()];
    header.extend(posterior.names().map(str::to_string));
    wtr.write_record(&header)?;

    for (chain_idx, chain) in data.axis_iter(Axis(0)).enumerate() {
        for (draw_idx, draw) in chain.axis_iter(Axis(0)).enumerate() {
            let mut row = vec![chain_idx.to_string(), draw_idx.to_string()];
            row.extend(draw.iter().map(|v| v.to_string()));
            wtr.write_record(&row)?;
        }
    }

    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::TWalk;
    use ndarray::arr2;
    use std::fs;
    use std::io::Write;
    use tempfile::{Builder, NamedTempFile};

    fn csv_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = Builder::new()
            .prefix("twalk_run")
            .suffix(".csv")
            .tempfile()
            .expect("Could not create temp file");
        file.write_all(contents.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_csv_store_reads_columns() {
        let file = csv_file(
            "chain_isvalid,chain,mult,m::primary_parameters::x\n\
             True,0,1,0.5\n\
             False,1,2,9.0\n\
             true,1,3,1.5\n",
        );
        let store = CsvStore::open(file.path()).unwrap();
        let group = store.group_name().to_string();
        assert!(group.starts_with("twalk_run"));

        assert_eq!(store.groups().unwrap(), vec![group.clone()]);
        assert_eq!(
            store.keys(&group).unwrap(),
            vec!["chain_isvalid", "chain", "mult", "m::primary_parameters::x"]
        );
        assert_eq!(store.read(&group, "chain_isvalid").unwrap(), vec![1.0, 0.0, 1.0]);
        assert!(matches!(
            store.read(&group, "nope"),
            Err(TwalkError::MissingKey { .. })
        ));
    }

    #[test]
    fn test_csv_store_through_reader() {
        let file = csv_file(
            "chain_isvalid,chain,mult,m::primary_parameters::x\n\
             1,0,2,0.5\n\
             0,1,2,9.0\n\
             1,1,3,1.5\n",
        );
        let twalk = TWalk::open(CsvStore::open(file.path()).unwrap()).unwrap();
        let post = twalk.to_posterior().unwrap();
        assert_eq!(post.get("x").unwrap(), arr2(&[[0.5, 0.5], [1.5, 1.5]]));
    }

    #[test]
    fn test_csv_store_rejects_text() {
        let file = csv_file("chain\nzero\n");
        assert!(matches!(
            CsvStore::open(file.path()),
            Err(TwalkError::MalformedStore(_))
        ));
    }

    #[test]
    fn test_save_csv_empty_posterior() {
        let file = NamedTempFile::new().expect("Could not create temp file");
        save_csv(&Posterior::new(), file.path()).unwrap();
        let contents = fs::read_to_string(file.path()).unwrap();
        assert_eq!(contents.trim(), "chain,draw");
    }

    #[test]
    fn test_save_csv_multi_chain() {
        let mut post = Posterior::new();
        post.insert("a", arr2(&[[1.0, 2.0], [3.0, 4.0]]));
        post.insert("b", arr2(&[[10.0, 20.0], [30.0, 40.0]]));

        let file = NamedTempFile::new().expect("Could not create temp file");
        save_csv(&post, file.path()).unwrap();

        let contents = fs::read_to_string(file.path()).unwrap();
        let expected = "\
chain,draw,a,b
0,0,1,10
0,1,2,20
1,0,3,30
1,1,4,40";
        assert_eq!(contents.trim(), expected);
    }

    #[test]
    fn test_save_csv_inconsistent_shapes() {
        let mut post = Posterior::new();
        post.insert("a", arr2(&[[1.0, 2.0]]));
        post.insert("b", arr2(&[[1.0]]));

        let file = NamedTempFile::new().expect("Could not create temp file");
        assert!(matches!(
            save_csv(&post, file.path()),
            Err(TwalkError::InconsistentShape(_))
        ));
    }
}
