//! Splitting PacBio BAM files at ZMW boundaries without re-encoding.
//!
//! A BAM file is a series of BGZF blocks. As long as a cut falls on a block
//! start, any run of blocks can be prefixed with the original header blocks
//! and suffixed with an EOF block to form a valid BAM. The PacBio index gives
//! the virtual offset of every read, which is enough to find such cuts that
//! also keep each ZMW in one piece.
//!
//! - [`locate_boundaries`] - candidate cut points from the index
//! - [`plan_chunks`] / [`plan_offsets`] - evenly spaced cuts for N chunks
//! - [`write_byte_ranges`] - the cuts as a `start\tend` table
//! - [`extract_chunk`] / [`split_bam`] - write chunk files
//! - [`combine_with_header`] / [`gather_chunks`] - put pieces back together

mod boundary;
mod extract;
mod planner;
mod recombine;

pub use boundary::locate_boundaries;
pub use extract::{ChunkInfo, SplitOptions, SplitReport, extract_chunk, split_bam};
pub use planner::{
    ChunkPlan, byte_ranges, plan_chunks, plan_offsets, read_byte_ranges, select_chunk_starts,
    write_byte_ranges,
};
pub use recombine::{combine_with_header, gather_chunks};
