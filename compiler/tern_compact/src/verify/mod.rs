//! Structural checks on a packed block.
//!
//! Walks a [`PackedFn`] from its root pointers using only bounds-checked
//! reads and confirms the properties the executor relies on:
//!
//! - every pointer lands inside the block, on an 8-byte boundary;
//! - record kinds decode and expression slots agree with their counts;
//! - no record is reached twice, so cyclic pointers are rejected on first
//!   revisit rather than walked forever;
//! - no two reachable records overlap;
//! - reachable records cover the block exactly (no gaps, nothing unreached);
//! - every loop back-reference targets a `while`, `for` or `switch` record.

use rustc_hash::FxHashSet;
use tern_ir::packed::record::{
    DeclRecord, ExprRecord, ScopeRecord, StmtRecord, SWITCH_LABEL_SIZE,
};
use tern_ir::packed::{align_up, ALIGN};
use tern_ir::tree::STMT_MAX_EXPRESSIONS;
use tern_ir::{Block, BlockOffset, ExprKind, PackedFn, StmtKind, TypeDesc};

use crate::stack::ensure_sufficient_stack;
use crate::CompactError;

/// Summary of a successful verification.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct VerifyReport {
    /// Reachable records and arrays.
    pub spans: usize,
    pub statements: usize,
    pub expressions: usize,
}

/// Check `packed` and report what was reached.
pub fn verify_packed(packed: &PackedFn) -> Result<VerifyReport, CompactError> {
    let mut verifier = Verifier {
        block: packed.block(),
        spans: Vec::new(),
        claimed: FxHashSet::default(),
        stmt_starts: FxHashSet::default(),
        loop_stmts: FxHashSet::default(),
        loop_targets: Vec::new(),
        expressions: 0,
    };
    verifier.scope(packed.scope_offset())?;
    for &at in packed.arg_offsets() {
        verifier.span(at, TypeDesc::SIZE, "argument type")?;
    }
    verifier.finish()
}

#[derive(Copy, Clone, Debug)]
struct Span {
    start: usize,
    len: usize,
    what: &'static str,
}

struct Verifier<'b> {
    block: &'b Block,
    spans: Vec<Span>,
    /// Start offsets of every span claimed so far.
    claimed: FxHashSet<usize>,
    stmt_starts: FxHashSet<BlockOffset>,
    loop_stmts: FxHashSet<BlockOffset>,
    /// (referring statement, target)
    loop_targets: Vec<(BlockOffset, BlockOffset)>,
    expressions: usize,
}

fn fail(message: String) -> CompactError {
    CompactError::Verification(message)
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "counts larger than the block are rejected by the span check"
)]
fn count(raw: u64) -> usize {
    raw as usize
}

impl<'b> Verifier<'b> {
    /// Claim `len` bytes at `at` and return them.
    fn span(
        &mut self,
        at: BlockOffset,
        len: usize,
        what: &'static str,
    ) -> Result<&'b [u8], CompactError> {
        if at.index() % ALIGN != 0 {
            return Err(fail(format!("{what} at {at} is not {ALIGN}-byte aligned")));
        }
        let block: &'b Block = self.block;
        let bytes = block
            .get(at.index(), len)
            .ok_or_else(|| fail(format!("{what} at {at} ({len} bytes) leaves the block")))?;
        if !self.claimed.insert(at.index()) {
            return Err(fail(format!("{what} at {at} is reached twice")));
        }
        self.spans.push(Span {
            start: at.index(),
            len: align_up(len),
            what,
        });
        Ok(bytes)
    }

    /// Claim NUL-terminated text at `at`.
    fn text(&mut self, at: BlockOffset, what: &'static str) -> Result<(), CompactError> {
        let tail = self
            .block
            .as_bytes()
            .get(at.index()..)
            .ok_or_else(|| fail(format!("{what} at {at} leaves the block")))?;
        let len = tail
            .iter()
            .position(|&b| b == 0)
            .ok_or_else(|| fail(format!("{what} at {at} is not NUL-terminated")))?;
        self.span(at, len + 1, what)?;
        Ok(())
    }

    /// Claim an array of `n` records of `stride` bytes.
    fn array(
        &mut self,
        base: Option<BlockOffset>,
        n: u64,
        stride: usize,
        what: &'static str,
    ) -> Result<Option<BlockOffset>, CompactError> {
        match (base, n) {
            (None, 0) => Ok(None),
            (Some(base), n) if n > 0 => {
                let len = count(n)
                    .checked_mul(stride)
                    .ok_or_else(|| fail(format!("{what} at {base} has absurd length {n}")))?;
                self.span(base, len, what)?;
                Ok(Some(base))
            }
            (base, n) => Err(fail(format!("{what} pointer {base:?} disagrees with count {n}"))),
        }
    }

    fn scope(&mut self, at: BlockOffset) -> Result<(), CompactError> {
        ensure_sufficient_stack(|| {
            let rec = ScopeRecord::decode(self.span(at, ScopeRecord::SIZE, "scope")?);

            if let Some(base) = self.array(rec.syms, rec.nsyms, DeclRecord::SIZE, "locals")? {
                for i in 0..count(rec.nsyms) {
                    self.local(base.add(i * DeclRecord::SIZE))?;
                }
            }
            if let Some(base) = self.array(rec.stmts, rec.nstmts, StmtRecord::SIZE, "statements")? {
                for i in 0..count(rec.nstmts) {
                    self.stmt_start(base.add(i * StmtRecord::SIZE));
                }
                for i in 0..count(rec.nstmts) {
                    self.stmt(base.add(i * StmtRecord::SIZE))?;
                }
            }
            Ok(())
        })
    }

    fn local(&mut self, at: BlockOffset) -> Result<(), CompactError> {
        let bytes = self
            .block
            .get(at.index(), DeclRecord::SIZE)
            .ok_or_else(|| fail(format!("local at {at} leaves the block")))?;
        let rec = DeclRecord::decode(bytes);
        if rec.is_function || rec.args.is_some() || rec.body.is_some() {
            return Err(fail(format!("local at {at} carries function data")));
        }
        match rec.name {
            Some(name) => self.text(name, "local name"),
            None => Err(fail(format!("local at {at} has no name"))),
        }
    }

    fn stmt_start(&mut self, at: BlockOffset) {
        self.stmt_starts.insert(at);
    }

    fn stmt(&mut self, at: BlockOffset) -> Result<(), CompactError> {
        let bytes = self
            .block
            .get(at.index(), StmtRecord::SIZE)
            .ok_or_else(|| fail(format!("statement at {at} leaves the block")))?;
        let rec = StmtRecord::decode(bytes);
        let Some(kind) = StmtKind::from_raw(rec.kind) else {
            return Err(fail(format!("statement at {at} has unknown kind {}", rec.kind)));
        };
        if kind.is_loop_target() {
            self.loop_stmts.insert(at);
        }
        let nexpr = rec.nexpr as usize;
        if nexpr > STMT_MAX_EXPRESSIONS {
            return Err(fail(format!("statement at {at} claims {nexpr} expressions")));
        }
        for (slot, expr) in rec.expressions.iter().enumerate() {
            match (slot < nexpr, expr) {
                (true, Some(expr)) => self.expr(*expr)?,
                (false, None) => {}
                _ => {
                    return Err(fail(format!(
                        "statement at {at} expression slot {slot} disagrees with count {nexpr}"
                    )))
                }
            }
        }
        if let Some(target) = rec.referenced_loop {
            self.loop_targets.push((at, target));
        }
        if let Some(scope) = rec.scope {
            self.scope(scope)?;
        }
        if let Some(label) = rec.label {
            self.text(label, "label")?;
        }
        self.array(rec.switch_labels, rec.nswitch, SWITCH_LABEL_SIZE, "switch labels")?;
        Ok(())
    }

    fn expr(&mut self, at: BlockOffset) -> Result<(), CompactError> {
        ensure_sufficient_stack(|| {
            let rec = ExprRecord::decode(self.span(at, ExprRecord::SIZE, "expression")?);
            self.expressions += 1;
            if ExprKind::from_raw(rec.kind).is_none() {
                return Err(fail(format!("expression at {at} has unknown kind {}", rec.kind)));
            }
            if let Some(name) = rec.symname {
                self.text(name, "symbol name")?;
            }
            if let Some(name) = rec.method_name {
                self.text(name, "method name")?;
            }
            for child in rec.children.into_iter().flatten() {
                self.expr(child)?;
            }
            Ok(())
        })
    }

    fn finish(mut self) -> Result<VerifyReport, CompactError> {
        for &(from, target) in &self.loop_targets {
            if !self.stmt_starts.contains(&target) {
                return Err(fail(format!(
                    "statement at {from} refers to {target}, which is not a statement"
                )));
            }
            if !self.loop_stmts.contains(&target) {
                return Err(fail(format!(
                    "statement at {from} refers to {target}, which is not a loop"
                )));
            }
        }

        self.spans.sort_by_key(|s| s.start);
        let mut end = 0;
        for span in &self.spans {
            if span.start < end {
                return Err(fail(format!(
                    "{} at @{} overlaps the previous record ending at @{end}",
                    span.what, span.start
                )));
            }
            if span.start > end {
                return Err(fail(format!("unreached bytes @{end}..@{}", span.start)));
            }
            end = span.start + span.len;
        }
        if end != self.block.len() {
            return Err(fail(format!(
                "reachable records end at @{end}, block is {} bytes",
                self.block.len()
            )));
        }

        Ok(VerifyReport {
            spans: self.spans.len(),
            statements: self.stmt_starts.len(),
            expressions: self.expressions,
        })
    }
}

#[cfg(test)]
#[expect(
    clippy::unwrap_used,
    reason = "tests use unwrap for concise assertions"
)]
