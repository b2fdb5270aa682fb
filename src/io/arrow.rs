/*!
# Arrow Export

Saves a [`Posterior`] as an Apache Arrow IPC file. Enable via the `arrow` feature.

The schema is `chain` (UInt32), `draw` (UInt32) and one Float64 column per
parameter, with one row per chain and draw.
*/

use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use arrow::{
    array::{ArrayRef, Float64Builder, UInt32Builder},
    datatypes::{DataType, Field, Schema},
    ipc::writer::FileWriter,
    record_batch::RecordBatch,
};
use ndarray::Axis;

use crate::error::Result;
use crate::posterior::Posterior;

/// Builds the long-format record batch shared by the Arrow and Parquet exporters.
pub(crate) fn posterior_batch(posterior: &Posterior) -> Result<RecordBatch> {
    let data = posterior.to_array3()?;

    let mut fields = vec![
        Field::new("chain", DataType::UInt32, false),
        Field::new("draw", DataType::UInt32, false),
    ];
    fields.extend(
        posterior
            .names()
            .map(|name| Field::new(name, DataType::Float64, false)),
    );
    let schema = Arc::new(Schema::new(fields));

    let mut chain_builder = UInt32Builder::new();
    let mut draw_builder = UInt32Builder::new();
    let mut param_builders: Vec<Float64Builder> =
        (0..posterior.len()).map(|_| Float64Builder::new()).collect();

    for (chain_idx, chain) in data.axis_iter(Axis(0)).enumerate() {
        for (draw_idx, draw) in chain.axis_iter(Axis(0)).enumerate() {
            chain_builder.append_value(chain_idx as u32);
            draw_builder.append_value(draw_idx as u32);
            for (builder, &val) in param_builders.iter_mut().zip(draw.iter()) {
                builder.append_value(val);
            }
        }
    }

    let mut arrays = vec![
        Arc::new(chain_builder.finish()) as ArrayRef,
        Arc::new(draw_builder.finish()) as ArrayRef,
    ];
    arrays.extend(
        param_builders
            .into_iter()
            .map(|mut builder| Arc::new(builder.finish()) as ArrayRef),
    );
    Ok(RecordBatch::try_new(schema, arrays)?)
}

/// Saves a posterior table as an Arrow IPC file holding a single record batch.
pub fn save_arrow<P: AsRef<Path>>(posterior: &Posterior, filename: P) -> Result<()> {
    let batch = posterior_batch(posterior)?;
    let file = File::create(filename)?;
    let mut writer = FileWriter::try_new(file, &batch.schema())?;
    writer.write(&batch)?;
    writer.finish()?;
    Ok(())
}
