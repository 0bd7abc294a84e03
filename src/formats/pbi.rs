use crate::types::{IndexRecord, VirtualOffset};
use crate::{Error, Result};
use byteorder::{ByteOrder, LittleEndian, ReadBytesExt, WriteBytesExt};
use noodles::bgzf;
use std::fs::File;
use std::io::{self, Read, Write};
use std::ops::Range;
use std::path::{Path, PathBuf};

pub const PBI_MAGIC: [u8; 4] = *b"PBI\x01";

/// Version 3.0.1, the layout written by current PacBio software
pub const PBI_VERSION: u32 = 0x0003_0001;

const RESERVED_LEN: usize = 18;

/// Path of the PacBio index belonging to a BAM file (`<bam>.pbi`).
pub fn index_path(bam_path: &Path) -> PathBuf {
    let mut path = bam_path.as_os_str().to_owned();
    path.push(".pbi");
    PathBuf::from(path)
}

/// BasicData section of a PacBio BAM index.
///
/// All vectors are parallel and in the physical order of the records in the
/// BAM file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PacBioIndex {
    pub version: u32,
    pub flags: u16,
    pub rg_ids: Vec<i32>,
    pub q_starts: Vec<i32>,
    pub q_ends: Vec<i32>,
    pub hole_numbers: Vec<i32>,
    pub read_quals: Vec<f32>,
    pub ctxt_flags: Vec<u8>,
    pub virtual_offsets: Vec<VirtualOffset>,
}

impl PacBioIndex {
    /// Build a basic index from bare (hole number, offset) records. Per-read
    /// fields the splitter never looks at are zeroed.
    pub fn from_records<I>(records: I) -> Self
    where
        I: IntoIterator<Item = IndexRecord>,
    {
        let (hole_numbers, virtual_offsets): (Vec<i32>, Vec<VirtualOffset>) = records
            .into_iter()
            .map(|r| (r.group_id, r.virtual_offset))
            .unzip();
        let n = hole_numbers.len();

        Self {
            version: PBI_VERSION,
            flags: 0,
            rg_ids: vec![0; n],
            q_starts: vec![0; n],
            q_ends: vec![0; n],
            hole_numbers,
            read_quals: vec![0.0; n],
            ctxt_flags: vec![0; n],
            virtual_offsets,
        }
    }

    pub fn len(&self) -> usize {
        self.hole_numbers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hole_numbers.is_empty()
    }

    pub fn hole_numbers(&self) -> &[i32] {
        &self.hole_numbers
    }

    pub fn virtual_offsets(&self) -> &[VirtualOffset] {
        &self.virtual_offsets
    }

    pub fn records(&self) -> impl Iterator<Item = IndexRecord> + '_ {
        self.hole_numbers
            .iter()
            .zip(&self.virtual_offsets)
            .map(|(&group_id, &virtual_offset)| IndexRecord {
                group_id,
                virtual_offset,
            })
    }

    /// Number of bytes preceding the first record's compressed block, which is
    /// the BAM header. `None` for an index without records.
    pub fn header_len(&self) -> Option<u64> {
        self.virtual_offsets.first().map(|v| v.block_offset())
    }

    /// Index for a chunk file holding `records`, whose body was copied from
    /// `body_start` in the source and now starts at `header_len`.
    pub fn rebased(
        &self,
        records: Range<usize>,
        body_start: u64,
        header_len: u64,
    ) -> Result<Self> {
        let virtual_offsets = self.virtual_offsets[records.clone()]
            .iter()
            .map(|v| {
                let block = v
                    .block_offset()
                    .checked_sub(body_start)
                    .ok_or_else(|| {
                        Error::InvalidIndex(format!(
                            "record at {} precedes its chunk start {}",
                            v, body_start
                        ))
                    })?;
                Ok(VirtualOffset::new(block + header_len, v.in_block_offset()))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            version: self.version,
            // mapped, reference and barcode sections are not carried over
            flags: 0,
            rg_ids: self.rg_ids[records.clone()].to_vec(),
            q_starts: self.q_starts[records.clone()].to_vec(),
            q_ends: self.q_ends[records.clone()].to_vec(),
            hole_numbers: self.hole_numbers[records.clone()].to_vec(),
            read_quals: self.read_quals[records.clone()].to_vec(),
            ctxt_flags: self.ctxt_flags[records].to_vec(),
            virtual_offsets,
        })
    }
}

pub struct PbiReader;

impl PbiReader {
    /// Read the header and BasicData section of a `.pbi` file
    pub fn read(pbi_path: &Path) -> Result<PacBioIndex> {
        let file = File::open(pbi_path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => Error::MissingIndex(pbi_path.to_path_buf()),
            _ => Error::Io(e),
        })?;
        let mut reader = bgzf::Reader::new(file);

        let index = Self::read_basic_data(&mut reader).map_err(|e| match e.kind() {
            io::ErrorKind::UnexpectedEof => Error::InvalidIndex(format!(
                "{}: truncated index",
                pbi_path.display()
            )),
            io::ErrorKind::InvalidData => {
                Error::InvalidIndex(format!("{}: {}", pbi_path.display(), e))
            }
            _ => Error::Io(e),
        })?;

        tracing::debug!(
            "read {} records from {} (flags {:#06x})",
            index.len(),
            pbi_path.display(),
            index.flags
        );

        Ok(index)
    }

    fn read_basic_data<R: Read>(reader: &mut R) -> io::Result<PacBioIndex> {
        let mut magic = [0u8; 4];
        reader.read_exact(&mut magic)?;
        if magic != PBI_MAGIC {
            return Err(io::Error::new(io::ErrorKind::InvalidData, "bad magic"));
        }

        let version = reader.read_u32::<LittleEndian>()?;
        let flags = reader.read_u16::<LittleEndian>()?;
        let n_reads = reader.read_u32::<LittleEndian>()? as usize;
        let mut reserved = [0u8; RESERVED_LEN];
        reader.read_exact(&mut reserved)?;

        // arrays are read to the bytes actually present, so a header claiming
        // more reads than the file holds ends in UnexpectedEof
        let rg_ids = read_array(reader, n_reads, 4)?
            .chunks_exact(4)
            .map(LittleEndian::read_i32)
            .collect();
        let q_starts = read_array(reader, n_reads, 4)?
            .chunks_exact(4)
            .map(LittleEndian::read_i32)
            .collect();
        let q_ends = read_array(reader, n_reads, 4)?
            .chunks_exact(4)
            .map(LittleEndian::read_i32)
            .collect();
        let hole_numbers = read_array(reader, n_reads, 4)?
            .chunks_exact(4)
            .map(LittleEndian::read_i32)
            .collect();
        let read_quals = read_array(reader, n_reads, 4)?
            .chunks_exact(4)
            .map(LittleEndian::read_f32)
            .collect();
        let ctxt_flags = read_array(reader, n_reads, 1)?;
        let file_offsets: Vec<i64> = read_array(reader, n_reads, 8)?
            .chunks_exact(8)
            .map(LittleEndian::read_i64)
            .collect();

        let virtual_offsets = file_offsets
            .into_iter()
            .map(|v| {
                u64::try_from(v).map(VirtualOffset::from).map_err(|_| {
                    io::Error::new(
                        io::ErrorKind::InvalidData,
                        format!("negative file offset: {}", v),
                    )
                })
            })
            .collect::<io::Result<Vec<_>>>()?;

        Ok(PacBioIndex {
            version,
            flags,
            rg_ids,
            q_starts,
            q_ends,
            hole_numbers,
            read_quals,
            ctxt_flags,
            virtual_offsets,
        })
    }
}

/// Read `n` little-endian values of `width` bytes each as raw bytes.
fn read_array<R: Read>(reader: &mut R, n: usize, width: usize) -> io::Result<Vec<u8>> {
    let len = n
        .checked_mul(width)
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "record count overflows"))?;

    let mut buf = Vec::new();
    reader.by_ref().take(len as u64).read_to_end(&mut buf)?;
    if buf.len() != len {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("expected {} bytes, found {}", len, buf.len()),
        ));
    }
    Ok(buf)
}

pub struct PbiWriter;

impl PbiWriter {
    /// Write `index` as a BGZF-compressed `.pbi` holding only BasicData.
    pub fn write(pbi_path: &Path, index: &PacBioIndex) -> Result<()> {
        let file = File::create(pbi_path)?;
        let mut writer = bgzf::Writer::new(file);
        Self::write_basic_data(&mut writer, index)?;
        writer.finish()?;
        Ok(())
    }

    fn write_basic_data<W: Write>(writer: &mut W, index: &PacBioIndex) -> Result<()> {
        let n_reads = u32::try_from(index.len())
            .map_err(|_| Error::InvalidIndex(format!("too many records: {}", index.len())))?;

        writer.write_all(&PBI_MAGIC)?;
        writer.write_u32::<LittleEndian>(index.version)?;
        writer.write_u16::<LittleEndian>(index.flags)?;
        writer.write_u32::<LittleEndian>(n_reads)?;
        writer.write_all(&[0u8; RESERVED_LEN])?;

        for &v in &index.rg_ids {
            writer.write_i32::<LittleEndian>(v)?;
        }
        for &v in &index.q_starts {
            writer.write_i32::<LittleEndian>(v)?;
        }
        for &v in &index.q_ends {
            writer.write_i32::<LittleEndian>(v)?;
        }
        for &v in &index.hole_numbers {
            writer.write_i32::<LittleEndian>(v)?;
        }
        for &v in &index.read_quals {
            writer.write_f32::<LittleEndian>(v)?;
        }
        writer.write_all(&index.ctxt_flags)?;
        for &v in &index.virtual_offsets {
            let v = i64::try_from(v.get())
                .map_err(|_| Error::InvalidIndex(format!("file offset out of range: {}", v)))?;
            writer.write_i64::<LittleEndian>(v)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(group_id: i32, block: u64, in_block: u16) -> IndexRecord {
        IndexRecord {
            group_id,
            virtual_offset: VirtualOffset::new(block, in_block),
        }
    }

    #[test]
    fn test_index_path_appends_suffix() {
        assert_eq!(
            index_path(Path::new("data/movie.subreads.bam")),
            PathBuf::from("data/movie.subreads.bam.pbi")
        );
    }

    #[test]
    fn test_read_written_index() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reads.bam.pbi");
        let index = PacBioIndex::from_records(vec![
            record(4391, 1200, 0),
            record(4391, 1200, 640),
            record(4392, 3300, 0),
        ]);

        PbiWriter::write(&path, &index).unwrap();
        let read = PbiReader::read(&path).unwrap();

        assert_eq!(read, index);
        assert_eq!(read.header_len(), Some(1200));
        assert_eq!(read.hole_numbers(), &[4391, 4391, 4392]);
    }

    #[test]
    fn test_read_missing_index() {
        let dir = tempfile::tempdir().unwrap();
        let err = PbiReader::read(&dir.path().join("absent.bam.pbi")).unwrap_err();
        assert!(matches!(err, Error::MissingIndex(_)));
    }

    #[test]
    fn test_read_bad_magic() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.pbi");
        {
            let mut writer = bgzf::Writer::new(File::create(&path).unwrap());
            writer.write_all(b"BAI\x01 not a pacbio index").unwrap();
            writer.finish().unwrap();
        }
        let err = PbiReader::read(&path).unwrap_err();
        assert!(matches!(err, Error::InvalidIndex(_)));
    }

    #[test]
    fn test_read_truncated_index() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("short.pbi");
        {
            let mut writer = bgzf::Writer::new(File::create(&path).unwrap());
            writer.write_all(&PBI_MAGIC).unwrap();
            writer.write_u32::<LittleEndian>(PBI_VERSION).unwrap();
            writer.write_u16::<LittleEndian>(0).unwrap();
            writer.write_u32::<LittleEndian>(10).unwrap();
            writer.write_all(&[0u8; RESERVED_LEN]).unwrap();
            writer.write_i32::<LittleEndian>(1).unwrap();
            writer.finish().unwrap();
        }
        let err = PbiReader::read(&path).unwrap_err();
        assert!(matches!(err, Error::InvalidIndex(_)));
    }

    #[test]
    fn test_read_index_claiming_more_reads_than_present() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("huge.pbi");
        {
            let mut writer = bgzf::Writer::new(File::create(&path).unwrap());
            writer.write_all(&PBI_MAGIC).unwrap();
            writer.write_u32::<LittleEndian>(PBI_VERSION).unwrap();
            writer.write_u16::<LittleEndian>(0).unwrap();
            writer.write_u32::<LittleEndian>(u32::MAX).unwrap();
            writer.write_all(&[0u8; RESERVED_LEN]).unwrap();
            writer.write_all(&[0u8; 18]).unwrap();
            writer.finish().unwrap();
        }
        let err = PbiReader::read(&path).unwrap_err();
        assert!(matches!(err, Error::InvalidIndex(_)));
    }

    #[test]
    fn test_rebased_rejects_record_before_chunk_start() {
        let index = PacBioIndex::from_records(vec![record(1, 500, 0), record(1, 300, 0)]);

        let err = index.rebased(0..2, 500, 100).unwrap_err();
        assert!(matches!(err, Error::InvalidIndex(_)));
    }

    #[test]
    fn test_rebased_shifts_block_offsets() {
        let index = PacBioIndex::from_records(vec![
            record(1, 100, 0),
            record(2, 200, 0),
            record(2, 200, 96),
            record(3, 300, 0),
        ]);

        let chunk = index.rebased(1..3, 200, 100).unwrap();

        assert_eq!(chunk.len(), 2);
        assert_eq!(chunk.hole_numbers(), &[2, 2]);
        assert_eq!(
            chunk.virtual_offsets(),
            &[VirtualOffset::new(100, 0), VirtualOffset::new(100, 96)]
        );
    }
}
