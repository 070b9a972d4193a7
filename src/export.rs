//! Flat CSV export of a captured series.
//!
//! Columns are `Signal,I,Q,R,Phi`. `R` is written doubled so the exported
//! column is the full amplitude in raw counts, and halved again on import.

use crate::sample::{Sample, SampleSeries};
use polars::prelude::*;
use std::io::{Cursor, Read, Write};

const SIGNAL_COLUMN_NAME: &str = "Signal";
const I_COLUMN_NAME: &str = "I";
const Q_COLUMN_NAME: &str = "Q";
const R_COLUMN_NAME: &str = "R";
const PHI_COLUMN_NAME: &str = "Phi";

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Column {column} has {nulls} missing value(s)")]
    MissingValues { column: &'static str, nulls: usize },
}

pub fn to_dataframe(series: &SampleSeries) -> Result<DataFrame, ExportError> {
    let column = |f: fn(&Sample) -> f64| series.iter().map(f).collect::<Vec<f64>>();

    let df = df!(
        SIGNAL_COLUMN_NAME => column(|s| s.signal),
        I_COLUMN_NAME => column(|s| s.i),
        Q_COLUMN_NAME => column(|s| s.q),
        R_COLUMN_NAME => column(|s| 2.0 * s.r),
        PHI_COLUMN_NAME => column(|s| s.phase),
    )?;
    Ok(df)
}

pub fn write_csv<W: Write>(series: &SampleSeries, writer: W) -> Result<(), ExportError> {
    let mut df = to_dataframe(series)?;
    CsvWriter::new(writer).include_header(true).finish(&mut df)?;
    log::debug!("Exported {} samples", df.height());
    Ok(())
}

/// Load a file written by [`write_csv`].
pub fn read_csv<R: Read>(mut reader: R) -> Result<SampleSeries, ExportError> {
    let mut data = Vec::new();
    reader.read_to_end(&mut data)?;

    let df = CsvReadOptions::default()
        .with_has_header(true)
        .into_reader_with_file_handle(Cursor::new(data))
        .finish()?;

    let values = |name: &'static str| -> Result<Vec<f64>, ExportError> {
        let column = df.column(name)?.cast(&DataType::Float64)?;
        let column = column.f64()?;
        if column.null_count() > 0 {
            return Err(ExportError::MissingValues {
                column: name,
                nulls: column.null_count(),
            });
        }
        Ok(column.into_no_null_iter().collect())
    };

    let signal = values(SIGNAL_COLUMN_NAME)?;
    let i = values(I_COLUMN_NAME)?;
    let q = values(Q_COLUMN_NAME)?;
    let r = values(R_COLUMN_NAME)?;
    let phase = values(PHI_COLUMN_NAME)?;

    Ok((0..df.height())
        .map(|n| Sample::new(signal[n], i[n], q[n], r[n] / 2.0, phase[n]))
        .collect())
}
