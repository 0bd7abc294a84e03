//! Raw BGZF framing constants.
//!
//! Nothing here inflates data: chunk files are assembled by copying
//! compressed blocks verbatim, so only the end-of-file marker needs to be
//! known byte for byte.

/// Empty BGZF block that marks the logical end of a BGZF stream.
///
/// See section 4.1.2 of the SAM/BAM format specification.
pub const BGZF_TERMINATOR: [u8; 28] = [
    0x1f, 0x8b, 0x08, 0x04, 0x00, 0x00, 0x00, 0x00, 0x00, 0xff, 0x06, 0x00, 0x42, 0x43, 0x02, 0x00,
    0x1b, 0x00, 0x03, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
];

/// Buffer size used when streaming a records file into a recombined BAM
pub const COPY_BLOCK_SIZE: usize = 1024;

pub fn ends_with_terminator(bytes: &[u8]) -> bool {
    bytes.ends_with(&BGZF_TERMINATOR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    #[test]
    fn test_terminator_is_bgzf_block() {
        // gzip magic, FEXTRA, BC subfield, BSIZE = 27 (block length - 1)
        assert_eq!(&BGZF_TERMINATOR[..4], &[0x1f, 0x8b, 0x08, 0x04]);
        assert_eq!(&BGZF_TERMINATOR[12..14], b"BC");
        assert_eq!(
            u16::from_le_bytes([BGZF_TERMINATOR[16], BGZF_TERMINATOR[17]]) as usize,
            BGZF_TERMINATOR.len() - 1
        );
    }

    #[test]
    fn test_terminator_decompresses_to_nothing() {
        let mut reader = noodles::bgzf::Reader::new(&BGZF_TERMINATOR[..]);
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf).unwrap();
        assert!(buf.is_empty());
    }

    #[test]
    fn test_ends_with_terminator() {
        let mut bytes = b"header".to_vec();
        assert!(!ends_with_terminator(&bytes));
        bytes.extend_from_slice(&BGZF_TERMINATOR);
        assert!(ends_with_terminator(&bytes));
    }
}
