//! Gathering of per-chunk CCS ZMW metrics.
//!
//! CCS run on each chunk writes a gzipped JSON document `{"zmws": [...]}`.
//! Gathering concatenates the `zmws` arrays in chunk order. Entries are kept
//! as opaque JSON values.

use crate::diagnostics::Diagnostics;
use crate::{Error, Result};
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ZmwMetrics {
    pub zmws: Vec<Value>,
}

pub fn read_zmw_metrics(path: &Path) -> Result<ZmwMetrics> {
    let gz_in = GzDecoder::new(BufReader::new(File::open(path)?));
    let doc: Value = serde_json::from_reader(gz_in)?;

    match doc {
        Value::Object(mut fields) => match fields.remove("zmws") {
            Some(Value::Array(zmws)) => Ok(ZmwMetrics { zmws }),
            Some(_) => Err(Error::InvalidInput(format!(
                "{}: \"zmws\" is not an array",
                path.display()
            ))),
            None => Err(Error::InvalidInput(format!(
                "{}: missing \"zmws\"",
                path.display()
            ))),
        },
        _ => Err(Error::InvalidInput(format!(
            "{}: expected a JSON object",
            path.display()
        ))),
    }
}

pub fn write_zmw_metrics(path: &Path, metrics: &ZmwMetrics) -> Result<()> {
    let mut gz_out = GzEncoder::new(BufWriter::new(File::create(path)?), Compression::default());
    serde_json::to_writer(&mut gz_out, metrics)?;
    gz_out.finish()?.flush()?;
    Ok(())
}

/// Merge the ZMW metrics of every chunk into `output`. Returns the number of
/// ZMW entries written.
pub fn gather_zmw_chunks(
    chunks: &[PathBuf],
    output: &Path,
    diagnostics: &dyn Diagnostics,
) -> Result<usize> {
    let mut merged = ZmwMetrics::default();
    for chunk in chunks {
        let metrics = read_zmw_metrics(chunk)?;
        tracing::debug!("{}: {} ZMWs", chunk.display(), metrics.zmws.len());
        merged.zmws.extend(metrics.zmws);
    }

    write_zmw_metrics(output, &merged)?;
    diagnostics.gathered(output, chunks.len());
    Ok(merged.zmws.len())
}
