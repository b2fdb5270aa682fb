//! Saves a [`Posterior`] as a Parquet file. Enable via the `parquet` feature.
//!
//! Uses the same long-format schema as [`crate::io::arrow`].

use std::fs::File;
use std::path::Path;

use parquet::{arrow::ArrowWriter, file::properties::WriterProperties};

use crate::error::Result;
use crate::io::arrow::posterior_batch;
use crate::posterior::Posterior;

/// Saves a posterior table to a Parquet file.
///
/// # Example
///
/// ```rust
/// use ndarray::arr2;
/// use twalk_reader::io::parquet::save_parquet;
/// use twalk_reader::posterior::Posterior;
///
/// let mut posterior = Posterior::new();
/// posterior.insert("mu", arr2(&[[42.0]]));
/// save_parquet(&posterior, "/tmp/posterior.parquet")?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn save_parquet<P: AsRef<Path>>(posterior: &Posterior, filename: P) -> Result<()> {
    let batch = posterior_batch(posterior)?;
    let file = File::create(filename)?;
    let props = WriterProperties::builder().build();
    let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(props))?;
    writer.write(&batch)?;
    // Close the writer to ensure metadata is written
    writer.close()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Float64Array, UInt32Array};
    use ndarray::arr2;
    use parquet::arrow::arrow_reader::ParquetRecordBatchReader;
    use tempfile::NamedTempFile;

    #[test]
    fn test_save_parquet_empty_posterior() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let file = NamedTempFile::new()?;
        save_parquet(&Posterior::new(), file.path())?;

        let mut reader = ParquetRecordBatchReader::try_new(File::open(file.path())?, 1024)?;
        assert!(reader.next().is_none());
        Ok(())
    }

    #[test]
    fn test_save_parquet_multi_chain() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let mut post = Posterior::new();
        post.insert("mu", arr2(&[[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]));

        let file = NamedTempFile::new()?;
        save_parquet(&post, file.path())?;

        let mut reader = ParquetRecordBatchReader::try_new(File::open(file.path())?, 1024)?;
        let batch = reader.next().expect("No record batch found")?;
        assert!(reader.next().is_none(), "Expected only one batch");
        assert_eq!(batch.num_rows(), 6);
        assert_eq!(batch.num_columns(), 3);

        let chain = batch
            .column(0)
            .as_any()
            .downcast_ref::<UInt32Array>()
            .unwrap();
        let mu = batch
            .column(2)
            .as_any()
            .downcast_ref::<Float64Array>()
            .unwrap();

        // Row 4: chain=1, draw=1, mu=5.0
        assert_eq!(chain.value(4), 1);
        assert!((mu.value(4) - 5.0).abs() < f64::EPSILON);
        Ok(())
    }
}
