//! Layout planner: the read-only first walk.
//!
//! Assigns every node a slot in the future block and records the node's
//! address in the ledger. A single cursor moves forward through the whole
//! walk; each reservation is rounded up to [`ALIGN`](tern_ir::packed::ALIGN)
//! before the next one begins.
//!
//! # Order
//!
//! A node's own record is reserved before any of its children, so parents
//! sit at lower offsets. Field order per node kind:
//!
//! - Scope: self, locals array, statement array
//! - Local: name (after the whole locals array)
//! - Statement: (self, as an array element), nested scope, expressions,
//!   label, switch-label array
//! - Expression: self, symbol name, method name, child slots in order
//! - Function: body scope, then each argument type
//!
//! The writer walks in exactly this order. Absent fields and empty arrays
//! reserve nothing and are never registered.

use std::ffi::CStr;

use tern_ir::packed::record::{DeclRecord, ExprRecord, ScopeRecord, StmtRecord, SWITCH_LABEL_SIZE};
use tern_ir::packed::align_up;
use tern_ir::tree::{FnTree, STMT_MAX_EXPRESSIONS};
use tern_ir::{BlockOffset, ExprNode, NodeAddr, Scope, Stmt, SymDecl, TypeDesc};

use crate::context::{CompactCtx, Reservation};
use crate::ledger::NodeKind;
use crate::stack::ensure_sufficient_stack;
use crate::{CompactError, Malformed};

pub(crate) struct Planner<'cx> {
    cx: &'cx mut CompactCtx,
}

impl<'cx> Planner<'cx> {
    pub(crate) fn new(cx: &'cx mut CompactCtx) -> Self {
        Planner { cx }
    }

    /// Plan a whole function. Returns the total block size.
    pub(crate) fn plan_fn(&mut self, tree: &FnTree) -> Result<usize, CompactError> {
        self.plan_scope(&tree.scope)?;
        for ty in &tree.args {
            self.push_plan(NodeAddr::of(&**ty), TypeDesc::SIZE, NodeKind::ArgType)?;
        }
        self.check_loop_refs()?;
        Ok(self.cx.cursor)
    }

    /// Set aside `len` bytes (rounded up) at the cursor.
    fn reserve(&mut self, len: usize, kind: NodeKind, count: usize) -> BlockOffset {
        let offset = BlockOffset::new(self.cx.cursor);
        let len = align_up(len);
        self.cx.cursor += len;
        self.cx.reservations.push(Reservation {
            offset,
            len,
            kind,
            count,
        });
        tracing::trace!(offset = offset.raw(), len, ?kind, count, "reserve");
        offset
    }

    /// Reserve a single node and register its address at that slot.
    fn push_plan(
        &mut self,
        addr: NodeAddr,
        size: usize,
        kind: NodeKind,
    ) -> Result<BlockOffset, CompactError> {
        let offset = self.reserve(size, kind, 1);
        self.cx.ledger.register(addr, offset, kind)?;
        Ok(offset)
    }

    /// Reserve `items.len()` contiguous slots of `stride` bytes. Every
    /// element is registered at `base + i * stride` before the cursor moves,
    /// so each can be resolved on its own.
    fn plan_array<T>(
        &mut self,
        items: &[T],
        stride: usize,
        kind: NodeKind,
    ) -> Result<BlockOffset, CompactError> {
        let base = BlockOffset::new(self.cx.cursor);
        for (i, item) in items.iter().enumerate() {
            self.cx
                .ledger
                .register(NodeAddr::of(item), base.add(i * stride), kind)?;
        }
        self.reserve(stride * items.len(), kind, items.len());
        Ok(base)
    }

    fn plan_text(&mut self, text: &CStr) -> Result<(), CompactError> {
        self.push_plan(
            NodeAddr::of_text(text),
            text.to_bytes_with_nul().len(),
            NodeKind::Text,
        )?;
        Ok(())
    }

    fn plan_scope(&mut self, scope: &Scope) -> Result<(), CompactError> {
        ensure_sufficient_stack(|| {
            self.push_plan(NodeAddr::of(scope), ScopeRecord::SIZE, NodeKind::Scope)?;
            if !scope.syms.is_empty() {
                self.plan_locals(&scope.syms)?;
            }
            if !scope.stmts.is_empty() {
                self.plan_stmts(&scope.stmts)?;
            }
            Ok(())
        })
    }

    fn plan_locals(&mut self, syms: &[SymDecl]) -> Result<(), CompactError> {
        self.plan_array(syms, DeclRecord::SIZE, NodeKind::Decl)?;
        for sym in syms {
            if sym.is_function() {
                return Err(Malformed::FunctionLocal {
                    name: sym.name.to_string_lossy().into_owned(),
                }
                .into());
            }
            self.plan_text(&sym.name)?;
        }
        Ok(())
    }

    fn plan_stmts(&mut self, stmts: &[Stmt]) -> Result<(), CompactError> {
        self.plan_array(stmts, StmtRecord::SIZE, NodeKind::Stmt)?;
        for stmt in stmts {
            if stmt.expressions.len() > STMT_MAX_EXPRESSIONS {
                return Err(Malformed::TooManyExpressions {
                    count: stmt.expressions.len(),
                    max: STMT_MAX_EXPRESSIONS,
                }
                .into());
            }
            if stmt.kind.is_loop_target() {
                self.cx.loop_stmts.insert(NodeAddr::of(stmt));
            }
            if let Some(target) = stmt.referenced_loop {
                self.cx.loop_refs.push(target);
            }
            if let Some(scope) = &stmt.scope {
                self.plan_scope(scope)?;
            }
            for expr in &stmt.expressions {
                self.plan_expr(expr)?;
            }
            if let Some(label) = &stmt.label {
                self.plan_text(label)?;
            }
            if !stmt.switch_labels.is_empty() {
                self.plan_array(&stmt.switch_labels, SWITCH_LABEL_SIZE, NodeKind::SwitchLabel)?;
            }
        }
        Ok(())
    }

    fn plan_expr(&mut self, node: &ExprNode) -> Result<(), CompactError> {
        ensure_sufficient_stack(|| {
            self.push_plan(NodeAddr::of(node), ExprRecord::SIZE, NodeKind::Expr)?;
            if let Some(name) = &node.symname {
                self.plan_text(name)?;
            }
            if let Some(name) = &node.method_name {
                self.plan_text(name)?;
            }
            for (_, child) in node.present_children() {
                self.plan_expr(child)?;
            }
            Ok(())
        })
    }

    /// Every loop back-reference must name a `while`, `for` or `switch`
    /// statement planned in this function; checked here so a bad reference
    /// fails before anything is released.
    fn check_loop_refs(&mut self) -> Result<(), CompactError> {
        for addr in std::mem::take(&mut self.cx.loop_refs) {
            match self.cx.ledger.entry(addr) {
                Some(entry) if entry.kind == NodeKind::Stmt => {
                    if !self.cx.loop_stmts.contains(&addr) {
                        return Err(Malformed::LoopRefNotLoop { addr }.into());
                    }
                }
                Some(_) => return Err(Malformed::LoopRefNotStatement { addr }.into()),
                None => return Err(Malformed::DanglingLoopRef { addr }.into()),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[expect(
    clippy::unwrap_used,
    reason = "tests use unwrap for concise assertions"
)]
