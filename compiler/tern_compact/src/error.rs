//! Compaction errors.
//!
//! None of these is recoverable for the function being compacted. The
//! variants split into resource exhaustion ([`CompactError::OutOfMemory`],
//! [`CompactError::ShortBlock`], [`CompactError::BlockTooLarge`]), rejected input
//! ([`CompactError::MalformedTree`], [`CompactError::ConflictingRegistration`])
//! and internal contract violations (everything else), which indicate the
//! planner and writer disagree and must never occur on a well-formed tree.

use tern_ir::{BlockOffset, NodeAddr, OutOfBlock};
use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum CompactError {
    #[error("could not allocate a block of {size} bytes")]
    OutOfMemory { size: usize },

    /// The allocator returned a block whose length differs from the plan.
    #[error("requested a block of {requested} bytes, allocator returned {got}")]
    ShortBlock { requested: usize, got: usize },

    #[error("planned block of {size} bytes exceeds the limit of {limit} bytes")]
    BlockTooLarge { size: usize, limit: usize },

    #[error("malformed tree: {0}")]
    MalformedTree(#[from] Malformed),

    /// The same node was reached twice and planned at two places.
    #[error("{addr:?} planned at {first} and again at {second}")]
    ConflictingRegistration {
        addr: NodeAddr,
        first: BlockOffset,
        second: BlockOffset,
    },

    #[error("no planned offset for {addr:?}")]
    LedgerMiss { addr: NodeAddr },

    /// An array element resolved somewhere other than `base + i * stride`.
    #[error("{addr:?} resolved to {found}, expected {expected}")]
    LayoutMismatch {
        addr: NodeAddr,
        expected: BlockOffset,
        found: BlockOffset,
    },

    #[error(transparent)]
    OutOfBounds(#[from] OutOfBlock),

    #[error("offset {offset} written twice")]
    DoubleWrite { offset: BlockOffset },

    #[error("planned {planned} reservations but wrote {written}")]
    IncompleteWrite { planned: usize, written: usize },

    #[error("write started before a block was allocated")]
    Unallocated,

    #[error("function body was poisoned by an earlier failed compaction")]
    Poisoned,

    #[error("packed block failed verification: {0}")]
    Verification(String),
}

/// Input the pass refuses to compact.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum Malformed {
    #[error("local `{name}` declares a function body")]
    FunctionLocal { name: String },

    #[error("statement holds {count} expressions, at most {max} fit")]
    TooManyExpressions { count: usize, max: usize },

    #[error("loop reference {addr:?} points outside the function")]
    DanglingLoopRef { addr: NodeAddr },

    #[error("loop reference {addr:?} does not point at a statement")]
    LoopRefNotStatement { addr: NodeAddr },

    /// The target is a statement, but not a `while`, `for` or `switch`.
    #[error("loop reference {addr:?} points at a statement that is not a loop")]
    LoopRefNotLoop { addr: NodeAddr },
}
