//! The block allocation primitive.

use tern_ir::Block;

use crate::CompactError;

/// Source of the single block a compaction writes into.
///
/// Called once per pass with the planner's exact total. Failure is fatal
/// for the pass.
pub trait BlockAllocator: Sync {
    fn allocate(&self, size: usize) -> Result<Block, CompactError>;
}

/// Allocates from the global heap, reporting exhaustion as
/// [`CompactError::OutOfMemory`] instead of aborting.
#[derive(Copy, Clone, Debug, Default)]
pub struct HeapAllocator;

impl BlockAllocator for HeapAllocator {
    fn allocate(&self, size: usize) -> Result<Block, CompactError> {
        Block::try_zeroed(size).map_err(|_| CompactError::OutOfMemory { size })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heap_block_is_zeroed() {
        let block = HeapAllocator.allocate(24);
        assert!(matches!(&block, Ok(b) if b.len() == 24 && b.as_bytes().iter().all(|&x| x == 0)));
    }

    #[test]
    fn impossible_size_is_out_of_memory() {
        let size = usize::MAX;
        assert_eq!(
            HeapAllocator.allocate(size).map(|b| b.len()),
            Err(CompactError::OutOfMemory { size })
        );
    }
}
