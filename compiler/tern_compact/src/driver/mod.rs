//! Pass driver: plan, allocate, write for one function.

use rayon::prelude::*;
use tern_ir::{FnBody, SymDecl};

use crate::context::{CompactCtx, CompactStats};
use crate::verify::verify_packed;
use crate::{BlockAllocator, CompactError, CompactOptions, HeapAllocator};

/// What [`optimize_fn`] did.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CompactOutcome {
    /// The declaration is not a function; nothing to do.
    NotAFunction,
    /// The body was already packed; left as is.
    AlreadyCompacted,
    Compacted(CompactStats),
}

/// Compact `decl`'s body with default options and the heap allocator.
pub fn optimize_fn(decl: &mut SymDecl) -> Result<CompactOutcome, CompactError> {
    optimize_fn_with(decl, &CompactOptions::default(), &HeapAllocator)
}

/// Compact `decl`'s body into one block from `allocator`.
///
/// On success the body is `FnBody::Packed` and every original node has been
/// dropped. If planning or allocation fails the body is left exactly as it
/// was. If writing or verification fails the body is `FnBody::Poisoned`.
pub fn optimize_fn_with(
    decl: &mut SymDecl,
    options: &CompactOptions,
    allocator: &dyn BlockAllocator,
) -> Result<CompactOutcome, CompactError> {
    let SymDecl { name, func, .. } = decl;
    let Some(body) = func.as_mut() else {
        return Ok(CompactOutcome::NotAFunction);
    };
    let tree = match std::mem::replace(body, FnBody::Poisoned) {
        FnBody::Tree(tree) => tree,
        FnBody::Packed(packed) => {
            *body = FnBody::Packed(packed);
            return Ok(CompactOutcome::AlreadyCompacted);
        }
        FnBody::Poisoned => return Err(CompactError::Poisoned),
    };

    let mut cx = CompactCtx::new();
    let prepared = cx.plan(&tree).and_then(|size| {
        if size > options.max_block_bytes {
            return Err(CompactError::BlockTooLarge {
                size,
                limit: options.max_block_bytes,
            });
        }
        cx.allocate(allocator)
    });
    if let Err(err) = prepared {
        tracing::debug!(function = %name.to_string_lossy(), %err, "compaction not started");
        *body = FnBody::Tree(tree);
        return Err(err);
    }

    let packed = cx.write(tree)?;
    if options.verify {
        verify_packed(&packed)?;
    }
    *body = FnBody::Packed(packed);

    let stats = cx.stats();
    tracing::debug!(
        function = %name.to_string_lossy(),
        block_bytes = stats.block_bytes,
        ledger_entries = stats.ledger_entries,
        released = stats.released,
        "compacted function",
    );
    Ok(CompactOutcome::Compacted(stats))
}

/// Compact many declarations in parallel, one context each.
///
/// Results are in the order of `decls`.
pub fn optimize_all(
    decls: &mut [SymDecl],
    options: &CompactOptions,
    allocator: &dyn BlockAllocator,
) -> Vec<Result<CompactOutcome, CompactError>> {
    decls
        .par_iter_mut()
        .map(|decl| optimize_fn_with(decl, options, allocator))
        .collect()
}

#[cfg(test)]
#[expect(
    clippy::unwrap_used,
    reason = "tests use unwrap for concise assertions"
)]
