//! Relocation ledger: original node address → planned block offset.
//!
//! Filled by the planner, read by the writer. Keys are [`NodeAddr`]
//! identities, so two nodes with equal contents (two locals both named
//! `x`) are always distinct entries.
//!
//! # Duplicates
//!
//! An address may be registered more than once as long as every
//! registration names the same offset; the first entry stands. Registering
//! an address at a *different* offset means the node was reached along two
//! paths, which the tree shape forbids, and is rejected.

use std::collections::hash_map::Entry;

use rustc_hash::FxHashMap;
use tern_ir::{BlockOffset, NodeAddr};

use crate::CompactError;

/// What kind of node a ledger entry or reservation stands for.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Scope,
    /// An element of a locals array.
    Decl,
    /// An element of a statement array.
    Stmt,
    Expr,
    /// NUL-terminated text.
    Text,
    /// An element of a switch-label index array.
    SwitchLabel,
    /// A function argument type.
    ArgType,
}

/// Where a registered node will live.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct LedgerEntry {
    pub offset: BlockOffset,
    pub kind: NodeKind,
}

/// Address-keyed relocation table for one pass.
#[derive(Debug, Default)]
pub struct Ledger {
    entries: FxHashMap<NodeAddr, LedgerEntry>,
    duplicates: usize,
}

impl Ledger {
    pub fn new() -> Self {
        Ledger::default()
    }

    /// Record that `addr` will be relocated to `offset`.
    pub fn register(
        &mut self,
        addr: NodeAddr,
        offset: BlockOffset,
        kind: NodeKind,
    ) -> Result<(), CompactError> {
        match self.entries.entry(addr) {
            Entry::Vacant(slot) => {
                slot.insert(LedgerEntry { offset, kind });
                Ok(())
            }
            Entry::Occupied(slot) if slot.get().offset == offset => {
                self.duplicates += 1;
                Ok(())
            }
            Entry::Occupied(slot) => Err(CompactError::ConflictingRegistration {
                addr,
                first: slot.get().offset,
                second: offset,
            }),
        }
    }

    /// Planned offset of `addr`.
    ///
    /// A miss means the caller walked a node the planner never saw.
    pub fn resolve(&self, addr: NodeAddr) -> Result<BlockOffset, CompactError> {
        self.entries
            .get(&addr)
            .map(|entry| entry.offset)
            .ok_or(CompactError::LedgerMiss { addr })
    }

    pub fn entry(&self, addr: NodeAddr) -> Option<LedgerEntry> {
        self.entries.get(&addr).copied()
    }

    /// Distinct addresses registered.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registrations that repeated an existing address at the same offset.
    pub fn duplicates(&self) -> usize {
        self.duplicates
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.duplicates = 0;
    }
}

#[cfg(test)]
#[expect(
    clippy::unwrap_used,
    reason = "tests use unwrap for concise assertions"
)]
