//! Read-only views over a packed block.
//!
//! Views are `Copy` handles (block reference + offset) that decode records
//! on demand. They trust the block: a view built on a block that did not
//! come out of the compaction pass may panic on out-of-range offsets.

use std::ffi::CStr;

use super::record::{DeclRecord, ExprRecord, ScopeRecord, StmtRecord, SWITCH_LABEL_SIZE};
use super::{Block, BlockOffset, NULL_OFFSET};
use crate::tree::{ExprKind, SourceLoc, StmtKind};
use crate::TypeDesc;

fn record_bytes(block: &Block, at: BlockOffset, size: usize) -> &[u8] {
    &block.as_bytes()[at.index()..at.index() + size]
}

/// NUL-terminated text stored at `at`. Unterminated text reads as empty.
fn text_at(block: &Block, at: BlockOffset) -> &CStr {
    CStr::from_bytes_until_nul(&block.as_bytes()[at.index()..]).unwrap_or_default()
}

/// A scope record.
#[derive(Copy, Clone, Debug)]
pub struct ScopeView<'b> {
    block: &'b Block,
    at: BlockOffset,
}

impl<'b> ScopeView<'b> {
    pub fn new(block: &'b Block, at: BlockOffset) -> Self {
        ScopeView { block, at }
    }

    #[inline]
    pub fn offset(self) -> BlockOffset {
        self.at
    }

    pub fn record(self) -> ScopeRecord {
        ScopeRecord::decode(record_bytes(self.block, self.at, ScopeRecord::SIZE))
    }

    /// Local declarations, in declaration order.
    pub fn locals(self) -> impl ExactSizeIterator<Item = DeclView<'b>> {
        let rec = self.record();
        let block = self.block;
        let base = rec.syms.unwrap_or(BlockOffset::ZERO);
        let count = if rec.syms.is_some() { rec.nsyms } else { 0 };
        (0..to_count(count)).map(move |i| DeclView {
            block,
            at: base.add(i * DeclRecord::SIZE),
        })
    }

    pub fn stmts(self) -> impl ExactSizeIterator<Item = StmtView<'b>> {
        let rec = self.record();
        let block = self.block;
        let base = rec.stmts.unwrap_or(BlockOffset::ZERO);
        let count = if rec.stmts.is_some() { rec.nstmts } else { 0 };
        (0..to_count(count)).map(move |i| StmtView {
            block,
            at: base.add(i * StmtRecord::SIZE),
        })
    }

    pub fn stmt(self, index: usize) -> Option<StmtView<'b>> {
        self.stmts().nth(index)
    }
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "counts were written from in-memory collection lengths"
)]
fn to_count(raw: u64) -> usize {
    raw as usize
}

/// A declaration record.
#[derive(Copy, Clone, Debug)]
pub struct DeclView<'b> {
    block: &'b Block,
    at: BlockOffset,
}

impl<'b> DeclView<'b> {
    #[inline]
    pub fn offset(self) -> BlockOffset {
        self.at
    }

    pub fn record(self) -> DeclRecord {
        DeclRecord::decode(record_bytes(self.block, self.at, DeclRecord::SIZE))
    }

    pub fn name(self) -> &'b CStr {
        match self.record().name {
            Some(at) => text_at(self.block, at),
            None => c"",
        }
    }

    pub fn ty(self) -> TypeDesc {
        self.record().ty
    }
}

/// A statement record.
#[derive(Copy, Clone, Debug)]
pub struct StmtView<'b> {
    block: &'b Block,
    at: BlockOffset,
}

impl<'b> StmtView<'b> {
    #[inline]
    pub fn offset(self) -> BlockOffset {
        self.at
    }

    pub fn record(self) -> StmtRecord {
        StmtRecord::decode(record_bytes(self.block, self.at, StmtRecord::SIZE))
    }

    /// Statement kind; an undecodable discriminant reads as `nop`.
    pub fn kind(self) -> StmtKind {
        StmtKind::from_raw(self.record().kind).unwrap_or_default()
    }

    pub fn loc(self) -> Option<SourceLoc> {
        let raw = self.record().loc;
        (raw != NULL_OFFSET).then(|| SourceLoc::unpack(raw))
    }

    pub fn referenced_loop(self) -> Option<StmtView<'b>> {
        let block = self.block;
        self.record()
            .referenced_loop
            .map(|at| StmtView { block, at })
    }

    pub fn scope(self) -> Option<ScopeView<'b>> {
        let block = self.block;
        self.record().scope.map(|at| ScopeView { block, at })
    }

    pub fn expressions(self) -> impl Iterator<Item = ExprView<'b>> {
        let rec = self.record();
        let block = self.block;
        rec.expressions
            .into_iter()
            .take(rec.nexpr as usize)
            .flatten()
            .map(move |at| ExprView { block, at })
    }

    pub fn label(self) -> Option<&'b CStr> {
        let block = self.block;
        self.record().label.map(|at| text_at(block, at))
    }

    /// Switch-label indices, in order.
    pub fn switch_labels(self) -> impl ExactSizeIterator<Item = u64> + 'b {
        let rec = self.record();
        let block = self.block;
        let base = rec.switch_labels.unwrap_or(BlockOffset::ZERO);
        let count = if rec.switch_labels.is_some() {
            rec.nswitch
        } else {
            0
        };
        (0..to_count(count)).map(move |i| block.read_u64(base.add(i * SWITCH_LABEL_SIZE).index()))
    }
}

/// An expression record.
#[derive(Copy, Clone, Debug)]
pub struct ExprView<'b> {
    block: &'b Block,
    at: BlockOffset,
}

impl<'b> ExprView<'b> {
    #[inline]
    pub fn offset(self) -> BlockOffset {
        self.at
    }

    pub fn record(self) -> ExprRecord {
        ExprRecord::decode(record_bytes(self.block, self.at, ExprRecord::SIZE))
    }

    /// Expression kind; an undecodable discriminant reads as `int`.
    pub fn kind(self) -> ExprKind {
        ExprKind::from_raw(self.record().kind).unwrap_or_default()
    }

    pub fn value(self) -> u64 {
        self.record().value
    }

    pub fn ty(self) -> TypeDesc {
        self.record().ty
    }

    pub fn symname(self) -> Option<&'b CStr> {
        let block = self.block;
        self.record().symname.map(|at| text_at(block, at))
    }

    pub fn method_name(self) -> Option<&'b CStr> {
        let block = self.block;
        self.record().method_name.map(|at| text_at(block, at))
    }

    pub fn child(self, slot: usize) -> Option<ExprView<'b>> {
        let block = self.block;
        self.record()
            .children
            .get(slot)
            .copied()
            .flatten()
            .map(|at| ExprView { block, at })
    }

    /// Populated child slots, in slot order.
    pub fn children(self) -> impl Iterator<Item = (usize, ExprView<'b>)> {
        let block = self.block;
        self.record()
            .children
            .into_iter()
            .enumerate()
            .filter_map(move |(slot, at)| at.map(|at| (slot, ExprView { block, at })))
    }
}
