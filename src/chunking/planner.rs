use super::boundary::locate_boundaries;
use crate::formats::{PacBioIndex, PbiReader, index_path};
use crate::types::{Boundary, ByteRange};
use crate::{Error, Result};
use std::path::Path;

/// Where to cut a BAM file, as derived from its PacBio index.
#[derive(Debug)]
pub struct ChunkPlan {
    pub index: PacBioIndex,
    /// Boundaries at which each chunk starts, in file order
    pub starts: Vec<Boundary>,
    pub file_size: u64,
}

impl ChunkPlan {
    /// Compressed offsets at which the chunks start. The first one is the end
    /// of the BAM header.
    pub fn offsets(&self) -> Vec<u64> {
        self.starts.iter().map(|b| b.block_offset).collect()
    }

    pub fn header_len(&self) -> u64 {
        self.starts.first().map_or(0, |b| b.block_offset)
    }

    pub fn len(&self) -> usize {
        self.starts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.starts.is_empty()
    }

    /// Number of compressed bytes chunk `i` copies from the source
    pub fn chunk_len(&self, i: usize) -> u64 {
        let end = self
            .starts
            .get(i + 1)
            .map_or(self.file_size, |b| b.block_offset);
        end - self.starts[i].block_offset
    }

    /// Index positions of the records that end up in chunk `i`
    pub fn chunk_records(&self, i: usize) -> std::ops::Range<usize> {
        let end = self
            .starts
            .get(i + 1)
            .map_or(self.index.len(), |b| b.record_index);
        self.starts[i].record_index..end
    }

    pub fn byte_ranges(&self) -> Vec<ByteRange> {
        byte_ranges(&self.offsets(), self.file_size)
    }
}

/// Pick the boundaries that start each of at most `nchunks` chunks.
///
/// Boundaries are spread evenly: every `ceil(len / nchunks)`-th one is taken,
/// starting with the first. Asking for more chunks than there are boundaries
/// yields one chunk per boundary.
pub fn select_chunk_starts(boundaries: &[Boundary], nchunks: usize) -> Result<Vec<Boundary>> {
    if nchunks < 1 {
        return Err(Error::Configuration(format!(
            "number of chunks must be at least 1, got {}",
            nchunks
        )));
    }
    if boundaries.is_empty() {
        return Ok(Vec::new());
    }

    let nchunks = nchunks.min(boundaries.len());
    let per_chunk = boundaries.len().div_ceil(nchunks);

    Ok(boundaries
        .iter()
        .step_by(per_chunk)
        .take(nchunks)
        .copied()
        .collect())
}

/// Plan the split of `bam_path` into at most `nchunks` chunks using its
/// `.pbi` companion.
pub fn plan_chunks(bam_path: &Path, nchunks: usize) -> Result<ChunkPlan> {
    if nchunks < 1 {
        return Err(Error::Configuration(format!(
            "number of chunks must be at least 1, got {}",
            nchunks
        )));
    }

    let pbi_path = index_path(bam_path);
    if !pbi_path.exists() {
        return Err(Error::MissingIndex(pbi_path));
    }
    let file_size = std::fs::metadata(bam_path)?.len();
    let index = PbiReader::read(&pbi_path)?;

    if index.is_empty() {
        return Err(Error::InvalidIndex(format!(
            "{} lists no records",
            pbi_path.display()
        )));
    }

    // records must be in physical order for chunk lengths to be positive
    if let Some(w) = index
        .virtual_offsets()
        .windows(2)
        .find(|w| w[1].block_offset() < w[0].block_offset())
    {
        return Err(Error::InvalidIndex(format!(
            "{} is not in file order: record at {} follows {}",
            pbi_path.display(),
            w[1],
            w[0]
        )));
    }

    let boundaries = locate_boundaries(index.records());
    if let Some(last) = boundaries.last().filter(|b| b.block_offset >= file_size) {
        return Err(Error::InvalidIndex(format!(
            "{} points at offset {} past the end of {} ({} bytes)",
            pbi_path.display(),
            last.block_offset,
            bam_path.display(),
            file_size
        )));
    }
    let starts = select_chunk_starts(&boundaries, nchunks)?;

    tracing::debug!(
        "{}: {} records, {} ZMW block boundaries, header {} bytes",
        bam_path.display(),
        index.len(),
        boundaries.len(),
        index.header_len().unwrap_or(0)
    );

    Ok(ChunkPlan {
        index,
        starts,
        file_size,
    })
}

/// Compressed start offsets of at most `nchunks` chunks of `bam_path`.
pub fn plan_offsets(bam_path: &Path, nchunks: usize) -> Result<Vec<u64>> {
    Ok(plan_chunks(bam_path, nchunks)?.offsets())
}

/// Pair every chunk start with the byte before the next one. The last range
/// ends at `file_size`.
pub fn byte_ranges(offsets: &[u64], file_size: u64) -> Vec<ByteRange> {
    offsets
        .iter()
        .enumerate()
        .map(|(i, &start)| ByteRange {
            start,
            end: offsets.get(i + 1).map_or(file_size, |next| next - 1),
        })
        .collect()
}

/// Write the chunk byte ranges of `bam_path` as a `start\tend` table.
pub fn write_byte_ranges(
    bam_path: &Path,
    nchunks: usize,
    tsv_path: &Path,
) -> Result<Vec<ByteRange>> {
    let ranges = plan_chunks(bam_path, nchunks)?.byte_ranges();

    let mut writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .from_path(tsv_path)?;
    for range in &ranges {
        writer.serialize(range)?;
    }
    writer.flush()?;

    tracing::debug!("wrote {} byte ranges to {}", ranges.len(), tsv_path.display());
    Ok(ranges)
}

/// Read a table written by [`write_byte_ranges`].
pub fn read_byte_ranges(tsv_path: &Path) -> Result<Vec<ByteRange>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .from_path(tsv_path)?;

    let mut ranges = Vec::new();
    for result in reader.deserialize() {
        let range: ByteRange = result?;
        ranges.push(range);
    }
    Ok(ranges)
}
