//! AST compaction for the Tern compiler.
//!
//! After a function is parsed its body is a tree of separate heap
//! allocations. This crate relocates the whole tree into one contiguous
//! [`Block`](tern_ir::Block), rewrites every internal reference as a block
//! offset, and releases the original allocations.
//!
//! # Pipeline
//!
//! One call of [`optimize_fn`] runs, on a fresh [`CompactCtx`]:
//!
//! 1. **Plan** ([`CompactCtx::plan`]): read-only walk that reserves an
//!    8-byte aligned slot for every node and records each node's address in
//!    the [`Ledger`]. Produces the exact block size.
//! 2. **Allocate** ([`CompactCtx::allocate`]): one [`BlockAllocator`] call.
//! 3. **Write** ([`CompactCtx::write`]): consuming walk, identical in shape
//!    to the plan, that encodes each node at its planned offset with every
//!    pointer field patched through the ledger, then drops the original.
//!
//! The declaration's body goes from `FnBody::Tree` to `FnBody::Packed` in
//! place. There is no shared state between calls, so [`optimize_all`]
//! compacts independent functions in parallel.
//!
//! # Failure
//!
//! Every [`CompactError`] is fatal for the function. Planning and allocation
//! failures leave the declaration untouched; a failure while writing leaves
//! it `FnBody::Poisoned`.
//!
//! # Debugging
//!
//! - `RUST_LOG=tern_compact=debug`: one line per compacted function.
//! - `RUST_LOG=tern_compact=trace`: every reservation the planner makes.
//! - `TERN_COMPACT_VERIFY=1`: verify each packed block after writing
//!   (see [`CompactOptions::from_env`]).

mod alloc;
mod context;
mod driver;
mod error;
mod ledger;
mod options;
mod planner;
mod stack;
pub mod verify;
mod writer;

#[cfg(test)]
mod test_helpers;

use std::sync::Once;

pub use alloc::{BlockAllocator, HeapAllocator};
pub use context::{CompactCtx, CompactStats, Reservation};
pub use driver::{optimize_all, optimize_fn, optimize_fn_with, CompactOutcome};
pub use error::{CompactError, Malformed};
pub use ledger::{Ledger, LedgerEntry, NodeKind};
pub use options::CompactOptions;
pub use verify::{verify_packed, VerifyReport};

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for debug output.
///
/// Call this once at startup. Safe to call multiple times.
/// Only installs a subscriber when `RUST_LOG` is set.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true))
                .with(filter)
                .init();
        }
    });
}
