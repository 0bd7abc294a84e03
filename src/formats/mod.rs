//! Index readers for PacBio BAM files.
//!
//! The splitter never decodes BAM records. Everything it knows about record
//! placement comes from the PacBio index (`.pbi`), a BGZF-compressed file of
//! per-read arrays stored next to the BAM.
//!
//! - [`PbiReader`] - reads the BasicData section (hole numbers, virtual offsets)
//! - [`PbiWriter`] - writes a BasicData-only index, used for chunk indexes

mod pbi;

pub use pbi::{PBI_MAGIC, PBI_VERSION, PacBioIndex, PbiReader, PbiWriter, index_path};
