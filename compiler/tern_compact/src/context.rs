//! Per-call compaction state.
//!
//! Everything one pass needs (ledger, running offset, reservation log,
//! target block, write tracking) lives in a [`CompactCtx`] that is created
//! for the pass and threaded by `&mut` through the planner and writer. No
//! state survives between passes, so independent functions may be compacted
//! on different threads, each with its own context.

use rustc_hash::FxHashSet;
use tern_ir::tree::FnTree;
use tern_ir::{Block, BlockOffset, NodeAddr, PackedFn};

use crate::ledger::{Ledger, NodeKind};
use crate::planner::Planner;
use crate::writer::Writer;
use crate::{BlockAllocator, CompactError};

/// One aligned slot the planner set aside.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Reservation {
    pub offset: BlockOffset,
    /// Aligned length in bytes.
    pub len: usize,
    pub kind: NodeKind,
    /// Elements covered; 1 for single nodes.
    pub count: usize,
}

impl Reservation {
    /// One past the last byte.
    #[inline]
    pub fn end(&self) -> usize {
        self.offset.index() + self.len
    }
}

/// Counters for one pass.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct CompactStats {
    pub block_bytes: usize,
    pub reservations: usize,
    pub ledger_entries: usize,
    /// Ledger lookups made by the writer.
    pub resolutions: usize,
    /// Bulk writes into the block; one per reservation.
    pub writes: usize,
    /// Original allocations dropped by the writer.
    pub released: usize,
}

/// State of one compaction pass.
#[derive(Debug, Default)]
pub struct CompactCtx {
    pub(crate) ledger: Ledger,
    /// Next free offset; only ever moves forward.
    pub(crate) cursor: usize,
    pub(crate) reservations: Vec<Reservation>,
    /// `referenced_loop` targets seen while planning, checked once the
    /// ledger is complete.
    pub(crate) loop_refs: Vec<NodeAddr>,
    /// Planned `while`/`for`/`switch` statements.
    pub(crate) loop_stmts: FxHashSet<NodeAddr>,
    block: Option<Block>,
    pub(crate) written: FxHashSet<BlockOffset>,
    pub(crate) stats: CompactStats,
}

impl CompactCtx {
    pub fn new() -> Self {
        CompactCtx::default()
    }

    /// Forget everything from a previous pass.
    pub fn reset(&mut self) {
        self.ledger.clear();
        self.cursor = 0;
        self.reservations.clear();
        self.loop_refs.clear();
        self.loop_stmts.clear();
        self.block = None;
        self.written.clear();
        self.stats = CompactStats::default();
    }

    /// Planning phase: reserve space for `tree` and fill the ledger.
    /// Reads the tree only. Returns the total block size.
    pub fn plan(&mut self, tree: &FnTree) -> Result<usize, CompactError> {
        self.reset();
        let total = Planner::new(self).plan_fn(tree)?;
        self.stats.reservations = self.reservations.len();
        self.stats.ledger_entries = self.ledger.len();
        Ok(total)
    }

    /// Obtain the block for the planned size. A block of any other length is
    /// refused here, before the writer releases anything.
    pub fn allocate(&mut self, allocator: &dyn BlockAllocator) -> Result<(), CompactError> {
        let block = allocator.allocate(self.cursor)?;
        if block.len() != self.cursor {
            return Err(CompactError::ShortBlock {
                requested: self.cursor,
                got: block.len(),
            });
        }
        self.stats.block_bytes = block.len();
        self.block = Some(block);
        Ok(())
    }

    /// Writing phase: move `tree` into the allocated block, dropping each
    /// original node once it and its pointer fields are written.
    pub fn write(&mut self, tree: FnTree) -> Result<PackedFn, CompactError> {
        let block = self.block.take().ok_or(CompactError::Unallocated)?;
        Writer::new(self, block).write_fn(tree)
    }

    /// Planned block size so far.
    #[inline]
    pub fn total_size(&self) -> usize {
        self.cursor
    }

    pub fn reservations(&self) -> &[Reservation] {
        &self.reservations
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn stats(&self) -> CompactStats {
        self.stats
    }
}
