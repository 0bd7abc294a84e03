use super::planner::plan_chunks;
use crate::bgzf::BGZF_TERMINATOR;
use crate::diagnostics::Diagnostics;
use crate::formats::{PbiWriter, index_path};
use crate::{Error, Result};
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// Naming and extras for the files written by [`split_bam`]
#[derive(Debug, Clone)]
pub struct SplitOptions {
    /// Output path prefix, may include directories
    pub prefix: String,
    /// Extension appended after `.chunk{i}`, empty for none
    pub extension: String,
    /// Also write a `.pbi` for every chunk
    pub write_index: bool,
}

impl Default for SplitOptions {
    fn default() -> Self {
        Self {
            prefix: "reads".to_string(),
            extension: "bam".to_string(),
            write_index: false,
        }
    }
}

impl SplitOptions {
    pub fn chunk_path(&self, i: usize) -> PathBuf {
        if self.extension.is_empty() {
            PathBuf::from(format!("{}.chunk{}", self.prefix, i))
        } else {
            PathBuf::from(format!("{}.chunk{}.{}", self.prefix, i, self.extension))
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ChunkInfo {
    pub path: PathBuf,
    /// Offset in the source of the first copied byte
    pub offset: u64,
    /// Bytes copied from the source, excluding header and terminator
    pub n_bytes: u64,
    pub n_records: usize,
}

/// Summary of a [`split_bam`] run
#[derive(Debug, Clone, Serialize)]
pub struct SplitReport {
    pub source: PathBuf,
    pub header_len: u64,
    pub chunks: Vec<ChunkInfo>,
}

impl SplitReport {
    pub fn n_chunks(&self) -> usize {
        self.chunks.len()
    }
}

fn read_header<R: Read + Seek>(bam_in: &mut R, header_n_bytes: u64) -> Result<Vec<u8>> {
    bam_in.seek(SeekFrom::Start(0))?;

    let mut header = Vec::new();
    bam_in.by_ref().take(header_n_bytes).read_to_end(&mut header)?;
    if header.len() as u64 != header_n_bytes {
        return Err(Error::Io(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!(
                "source ended after {} of {} header bytes",
                header.len(),
                header_n_bytes
            ),
        )));
    }
    Ok(header)
}

/// Header bytes, then `record_n_bytes` of the source from `offset`, then the
/// BGZF terminator.
fn write_chunk<R, W>(
    bam_in: &mut R,
    bam_out: &mut W,
    header: &[u8],
    offset: u64,
    record_n_bytes: u64,
) -> Result<()>
where
    R: Read + Seek,
    W: Write,
{
    bam_out.write_all(header)?;

    bam_in.seek(SeekFrom::Start(offset))?;
    let copied = io::copy(&mut bam_in.by_ref().take(record_n_bytes), bam_out)?;
    if copied != record_n_bytes {
        return Err(Error::Io(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!(
                "source ended after {} of {} bytes starting at offset {}",
                copied, record_n_bytes, offset
            ),
        )));
    }

    bam_out.write_all(&BGZF_TERMINATOR)?;
    Ok(())
}

/// Write a standalone BAM made of the first `header_n_bytes` of `bam_in`,
/// `record_n_bytes` copied from `offset`, and an EOF block.
pub fn extract_chunk<R: Read + Seek>(
    bam_in: &mut R,
    output: &Path,
    header_n_bytes: u64,
    offset: u64,
    record_n_bytes: u64,
) -> Result<()> {
    let header = read_header(bam_in, header_n_bytes)?;
    write_chunk_file(bam_in, output, &header, offset, record_n_bytes)
}

fn write_chunk_file<R: Read + Seek>(
    bam_in: &mut R,
    output: &Path,
    header: &[u8],
    offset: u64,
    record_n_bytes: u64,
) -> Result<()> {
    let mut bam_out = BufWriter::new(File::create(output)?);
    write_chunk(bam_in, &mut bam_out, header, offset, record_n_bytes)?;
    bam_out.flush()?;
    Ok(())
}

/// Split `bam_path` into at most `nchunks` BAM files cut at ZMW boundaries.
///
/// Chunk `i` holds the source bytes from its start offset up to the next
/// chunk's start; the last chunk runs to the end of the file, so it carries
/// the source's own EOF block ahead of the appended one.
pub fn split_bam(
    bam_path: &Path,
    nchunks: usize,
    options: &SplitOptions,
    diagnostics: &dyn Diagnostics,
) -> Result<SplitReport> {
    let plan = plan_chunks(bam_path, nchunks)?;
    let header_len = plan.header_len();
    diagnostics.planned(bam_path, plan.len());

    let mut bam_in = File::open(bam_path)?;
    let header = read_header(&mut bam_in, header_len)?;

    let mut chunks = Vec::with_capacity(plan.len());
    for (i, start) in plan.starts.iter().enumerate() {
        let path = options.chunk_path(i);
        let n_bytes = plan.chunk_len(i);
        let records = plan.chunk_records(i);

        diagnostics.writing_chunk(i, &path, start.block_offset, n_bytes);
        write_chunk_file(&mut bam_in, &path, &header, start.block_offset, n_bytes)?;

        if options.write_index {
            let chunk_index = plan
                .index
                .rebased(records.clone(), start.block_offset, header_len)?;
            PbiWriter::write(&index_path(&path), &chunk_index)?;
        }

        chunks.push(ChunkInfo {
            path,
            offset: start.block_offset,
            n_bytes,
            n_records: records.len(),
        });
    }

    Ok(SplitReport {
        source: bam_path.to_path_buf(),
        header_len,
        chunks,
    })
}
