use crate::bgzf::{BGZF_TERMINATOR, COPY_BLOCK_SIZE, ends_with_terminator};
use crate::diagnostics::Diagnostics;
use crate::{Error, Result};
use std::fs::File;
use std::io::{self, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

const TERMINATOR_LEN: u64 = BGZF_TERMINATOR.len() as u64;

/// Combine a header-only file and a records-only file, both cut from the same
/// BAM, into a complete BAM with an EOF block.
pub fn combine_with_header(header_file: &Path, chunk_file: &Path, output: &Path) -> Result<()> {
    let mut bam_out = BufWriter::new(File::create(output)?);

    {
        let mut header_in = File::open(header_file)?;
        io::copy(&mut header_in, &mut bam_out)?;
    }

    {
        let mut chunk_in = File::open(chunk_file)?;
        let mut buf = [0u8; COPY_BLOCK_SIZE];
        loop {
            let n = match chunk_in.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            };
            bam_out.write_all(&buf[..n])?;
        }
    }

    bam_out.write_all(&BGZF_TERMINATOR)?;
    bam_out.flush()?;

    tracing::debug!(
        "combined {} and {} into {}",
        header_file.display(),
        chunk_file.display(),
        output.display()
    );
    Ok(())
}

/// Reassemble chunk files written by the splitter into one BAM.
///
/// The header is taken from the first chunk and every other chunk must carry
/// the same header bytes. Each chunk contributes the bytes between its header
/// and its trailing EOF block, in the order given. An EOF block is appended
/// unless the last body already ends with one, so gathering every chunk of a
/// split reproduces the source byte for byte.
pub fn gather_chunks(
    chunks: &[PathBuf],
    header_n_bytes: u64,
    output: &Path,
    diagnostics: &dyn Diagnostics,
) -> Result<()> {
    if chunks.is_empty() {
        return Err(Error::InvalidInput("no chunk files to gather".to_string()));
    }

    let mut bam_out = BufWriter::new(File::create(output)?);
    let mut header: Option<Vec<u8>> = None;
    let mut ends_with_eof = false;

    for chunk in chunks {
        let mut chunk_in = File::open(chunk)?;
        let body_len = chunk_body_len(&mut chunk_in, chunk, header_n_bytes)?;

        chunk_in.seek(SeekFrom::Start(0))?;
        let mut chunk_header = Vec::new();
        copy_exact(&mut chunk_in, &mut chunk_header, header_n_bytes)?;
        match &header {
            None => {
                bam_out.write_all(&chunk_header)?;
                header = Some(chunk_header);
            }
            Some(first) if *first != chunk_header => {
                return Err(Error::InvalidInput(format!(
                    "{} has a different header than {}",
                    chunk.display(),
                    chunks[0].display()
                )));
            }
            Some(_) => {}
        }

        copy_exact(&mut chunk_in, &mut bam_out, body_len)?;

        ends_with_eof = body_ends_with_terminator(&mut chunk_in, header_n_bytes, body_len)?;
        tracing::debug!("gathered {} body bytes from {}", body_len, chunk.display());
    }

    if !ends_with_eof {
        bam_out.write_all(&BGZF_TERMINATOR)?;
    }
    bam_out.flush()?;

    diagnostics.gathered(output, chunks.len());
    Ok(())
}

/// Length of the region between the header and the trailing EOF block.
fn chunk_body_len(chunk_in: &mut File, path: &Path, header_n_bytes: u64) -> Result<u64> {
    let len = chunk_in.metadata()?.len();
    let min_len = header_n_bytes.checked_add(TERMINATOR_LEN).ok_or_else(|| {
        Error::InvalidInput(format!("header length {} is out of range", header_n_bytes))
    })?;
    if len < min_len {
        return Err(Error::InvalidInput(format!(
            "{} is {} bytes, too short for a {} byte header and an EOF block",
            path.display(),
            len,
            header_n_bytes
        )));
    }

    let mut tail = [0u8; BGZF_TERMINATOR.len()];
    chunk_in.seek(SeekFrom::Start(len - TERMINATOR_LEN))?;
    chunk_in.read_exact(&mut tail)?;
    if !ends_with_terminator(&tail) {
        return Err(Error::InvalidInput(format!(
            "{} does not end with a BGZF EOF block",
            path.display()
        )));
    }

    Ok(len - min_len)
}

fn body_ends_with_terminator(
    chunk_in: &mut File,
    header_n_bytes: u64,
    body_len: u64,
) -> Result<bool> {
    if body_len < TERMINATOR_LEN {
        return Ok(false);
    }
    let mut tail = [0u8; BGZF_TERMINATOR.len()];
    chunk_in.seek(SeekFrom::Start(header_n_bytes + body_len - TERMINATOR_LEN))?;
    chunk_in.read_exact(&mut tail)?;
    Ok(ends_with_terminator(&tail))
}

fn copy_exact<R: Read, W: Write>(reader: &mut R, writer: &mut W, n: u64) -> Result<()> {
    let copied = io::copy(&mut reader.by_ref().take(n), writer)?;
    if copied != n {
        return Err(Error::Io(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("expected {} bytes, found {}", n, copied),
        )));
    }
    Ok(())
}
