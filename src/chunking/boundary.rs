use crate::types::{Boundary, IndexRecord};

/// Find the records at which the BAM can be cut without splitting a ZMW or a
/// compressed block.
///
/// Records must be in physical file order, which holds for a `.pbi` read as
/// is. An index in any other order has to be sorted by virtual offset first.
///
/// The first record is always a boundary. After that, a record is one only if
/// it starts a new hole number *and* lives in a different compressed block
/// than its predecessor. A ZMW change inside a shared block is skipped, since
/// cutting there would split the block.
pub fn locate_boundaries<I>(records: I) -> Vec<Boundary>
where
    I: IntoIterator<Item = IndexRecord>,
{
    let mut boundaries = Vec::new();
    let mut previous: Option<(i32, u64)> = None;

    for (record_index, record) in records.into_iter().enumerate() {
        let block_offset = record.virtual_offset.block_offset();

        let is_boundary = match previous {
            None => true,
            Some((group_id, prev_block)) => {
                record.group_id != group_id && block_offset != prev_block
            }
        };

        if is_boundary {
            boundaries.push(Boundary {
                record_index,
                group_id: record.group_id,
                block_offset,
            });
        }

        previous = Some((record.group_id, block_offset));
    }

    boundaries
}
