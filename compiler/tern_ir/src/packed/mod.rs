//! Packed single-block representation of a function body.
//!
//! # Memory Layout
//!
//! A [`Block`] is a zero-initialised byte buffer. Every node is a fixed-size
//! little-endian record (see [`record`]) placed at an 8-byte aligned
//! [`BlockOffset`]. Pointer fields are `u64` offsets from the block start,
//! with [`NULL_OFFSET`] standing for an absent field. Text is stored
//! NUL-terminated; switch-label indices are one `u64` each.
//!
//! | Record  | Size | Fields |
//! |---------|------|--------|
//! | type    | 16   | see [`TypeDesc::SIZE`](crate::TypeDesc::SIZE) |
//! | decl    | 48   | name, type, is_function, nargs, args, body |
//! | scope   | 32   | syms, nsyms, stmts, nstmts |
//! | stmt    | 88   | kind, nexpr, loc, loop, scope, expr[4], label, switch, nswitch |
//! | expr    | 112  | kind, value, type, symname, method, child[8] |
//!
//! Parents always sit at lower offsets than their children because the
//! planner reserves a node before recursing into it.

pub mod record;
mod view;

use std::collections::TryReserveError;
use std::fmt;

pub use view::{DeclView, ExprView, ScopeView, StmtView};

use crate::TypeDesc;

/// Alignment of every reservation in a block.
pub const ALIGN: usize = 8;

/// Stored pointer value for an absent field.
pub const NULL_OFFSET: u64 = u64::MAX;

/// Round `n` up to the next multiple of [`ALIGN`].
#[inline]
pub const fn align_up(n: usize) -> usize {
    (n + (ALIGN - 1)) & !(ALIGN - 1)
}

/// Byte offset of a record inside a [`Block`].
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct BlockOffset(u64);

impl BlockOffset {
    pub const ZERO: BlockOffset = BlockOffset(0);

    #[inline]
    pub const fn new(offset: usize) -> Self {
        BlockOffset(offset as u64)
    }

    /// Get the offset as an index into the block bytes.
    #[inline]
    #[expect(
        clippy::cast_possible_truncation,
        reason = "offsets are created from usize and never exceed the block length"
    )]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub const fn raw(self) -> u64 {
        self.0
    }

    /// Offset `bytes` further into the block.
    #[inline]
    #[must_use]
    pub const fn add(self, bytes: usize) -> Self {
        BlockOffset(self.0 + bytes as u64)
    }

    /// Encode an optional offset as a stored pointer.
    #[inline]
    pub const fn encode(offset: Option<BlockOffset>) -> u64 {
        match offset {
            Some(BlockOffset(raw)) => raw,
            None => NULL_OFFSET,
        }
    }

    /// Decode a stored pointer.
    #[inline]
    pub const fn decode(raw: u64) -> Option<BlockOffset> {
        if raw == NULL_OFFSET {
            None
        } else {
            Some(BlockOffset(raw))
        }
    }
}

impl fmt::Debug for BlockOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.0)
    }
}

impl fmt::Display for BlockOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.0)
    }
}

/// A write or read that falls outside the block.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct OutOfBlock {
    pub offset: usize,
    pub len: usize,
    pub block_len: usize,
}

impl fmt::Display for OutOfBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} bytes at offset {} fall outside a block of {} bytes",
            self.len, self.offset, self.block_len
        )
    }
}

impl std::error::Error for OutOfBlock {}

/// One contiguous, zero-initialised allocation.
#[derive(Clone, PartialEq, Eq)]
pub struct Block {
    bytes: Box<[u8]>,
}

impl Block {
    /// Allocate `size` zeroed bytes, reporting allocation failure instead of
    /// aborting.
    pub fn try_zeroed(size: usize) -> Result<Self, TryReserveError> {
        let mut bytes = Vec::new();
        bytes.try_reserve_exact(size)?;
        bytes.resize(size, 0);
        Ok(Block {
            bytes: bytes.into_boxed_slice(),
        })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Bytes `[offset, offset + len)`, if they lie inside the block.
    pub fn get(&self, offset: usize, len: usize) -> Option<&[u8]> {
        let end = offset.checked_add(len)?;
        self.bytes.get(offset..end)
    }

    /// Copy `data` to `offset`.
    pub fn write(&mut self, offset: usize, data: &[u8]) -> Result<(), OutOfBlock> {
        let block_len = self.bytes.len();
        let out = offset
            .checked_add(data.len())
            .and_then(|end| self.bytes.get_mut(offset..end))
            .ok_or(OutOfBlock {
                offset,
                len: data.len(),
                block_len,
            })?;
        out.copy_from_slice(data);
        Ok(())
    }

    /// Read a little-endian `u64` at `offset`.
    ///
    /// # Panics
    /// If the eight bytes are not inside the block.
    pub fn read_u64(&self, offset: usize) -> u64 {
        let mut raw = [0u8; 8];
        raw.copy_from_slice(&self.bytes[offset..offset + 8]);
        u64::from_le_bytes(raw)
    }
}

impl fmt::Debug for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Block").field("len", &self.len()).finish()
    }
}

/// A compacted function body: the block plus the root pointers into it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PackedFn {
    block: Block,
    scope: BlockOffset,
    args: Vec<BlockOffset>,
}

impl PackedFn {
    /// Assemble a packed body. `scope` must point at a scope record and each
    /// entry of `args` at a type record.
    pub fn new(block: Block, scope: BlockOffset, args: Vec<BlockOffset>) -> Self {
        PackedFn { block, scope, args }
    }

    #[inline]
    pub fn block(&self) -> &Block {
        &self.block
    }

    #[inline]
    pub fn scope_offset(&self) -> BlockOffset {
        self.scope
    }

    /// Argument type offsets in declaration order.
    #[inline]
    pub fn arg_offsets(&self) -> &[BlockOffset] {
        &self.args
    }

    /// The body scope.
    pub fn scope(&self) -> ScopeView<'_> {
        ScopeView::new(&self.block, self.scope)
    }

    /// Argument types in declaration order.
    pub fn arg_types(&self) -> impl ExactSizeIterator<Item = TypeDesc> + '_ {
        self.args.iter().map(|at| {
            TypeDesc::decode(&self.block.as_bytes()[at.index()..at.index() + TypeDesc::SIZE])
        })
    }
}

#[cfg(test)]
#[expect(
    clippy::unwrap_used,
    reason = "tests use unwrap for concise assertions"
)]
