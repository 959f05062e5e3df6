//! Relocating writer: the consuming second walk.
//!
//! Visits nodes in exactly the planner's order. For each node it resolves
//! the node's own offset and every pointer field through the ledger, encodes
//! the record with those offsets, then recurses into the owned children and
//! finally drops the original. Nothing is dereferenced after it has been
//! dropped; the ledger is consulted by address value only.
//!
//! Arrays are encoded into one buffer and written with a single bulk write at
//! the array's base offset. Each element's own registered offset is still
//! resolved and must equal `base + i * stride`.

use std::ffi::CString;

use tern_ir::packed::record::{
    DeclRecord, ExprRecord, ScopeRecord, StmtRecord, SWITCH_LABEL_SIZE,
};
use tern_ir::packed::NULL_OFFSET;
use tern_ir::tree::{FnTree, EXPR_MAX_CHILDREN, STMT_MAX_EXPRESSIONS};
use tern_ir::{
    Block, BlockOffset, ExprNode, NodeAddr, PackedFn, Scope, SourceLoc, Stmt, SymDecl, TypeDesc,
};

use crate::context::CompactCtx;
use crate::stack::ensure_sufficient_stack;
use crate::CompactError;

pub(crate) struct Writer<'cx> {
    cx: &'cx mut CompactCtx,
    block: Block,
}

impl<'cx> Writer<'cx> {
    pub(crate) fn new(cx: &'cx mut CompactCtx, block: Block) -> Self {
        Writer { cx, block }
    }

    /// Write a whole function: body scope, then argument types.
    pub(crate) fn write_fn(mut self, tree: FnTree) -> Result<PackedFn, CompactError> {
        let FnTree { scope, args } = tree;
        let scope_at = self.write_scope(scope)?;

        let mut arg_offsets = Vec::with_capacity(args.len());
        for ty in args {
            arg_offsets.push(self.write_arg_type(ty)?);
        }

        let planned = self.cx.reservations.len();
        let written = self.cx.written.len();
        if planned != written {
            return Err(CompactError::IncompleteWrite { planned, written });
        }
        Ok(PackedFn::new(self.block, scope_at, arg_offsets))
    }

    fn resolve(&mut self, addr: NodeAddr) -> Result<BlockOffset, CompactError> {
        self.cx.stats.resolutions += 1;
        self.cx.ledger.resolve(addr)
    }

    /// Base offset of a non-empty array; empty arrays stay null.
    fn resolve_array<T>(&mut self, items: &[T]) -> Result<Option<BlockOffset>, CompactError> {
        if items.is_empty() {
            Ok(None)
        } else {
            self.resolve(NodeAddr::of_slice(items)).map(Some)
        }
    }

    /// Check that element `index` was planned where the bulk write puts it.
    fn check_element<T>(
        &mut self,
        item: &T,
        base: BlockOffset,
        index: usize,
        stride: usize,
    ) -> Result<(), CompactError> {
        let addr = NodeAddr::of(item);
        let found = self.resolve(addr)?;
        let expected = base.add(index * stride);
        if found == expected {
            Ok(())
        } else {
            Err(CompactError::LayoutMismatch {
                addr,
                expected,
                found,
            })
        }
    }

    /// Copy `data` into the block at a planned offset. Each offset is
    /// written once.
    fn emit(&mut self, at: BlockOffset, data: &[u8]) -> Result<(), CompactError> {
        if !self.cx.written.insert(at) {
            return Err(CompactError::DoubleWrite { offset: at });
        }
        self.block.write(at.index(), data)?;
        self.cx.stats.writes += 1;
        Ok(())
    }

    /// Drop an original allocation. Every reservation the planner made
    /// corresponds to exactly one release.
    fn release<T>(&mut self, original: T) {
        drop(original);
        self.cx.stats.released += 1;
    }

    fn write_text(&mut self, text: CString) -> Result<BlockOffset, CompactError> {
        let at = self.resolve(NodeAddr::of_text(&text))?;
        self.emit(at, text.as_bytes_with_nul())?;
        self.release(text);
        Ok(at)
    }

    fn write_arg_type(&mut self, ty: Box<TypeDesc>) -> Result<BlockOffset, CompactError> {
        let at = self.resolve(NodeAddr::of(&*ty))?;
        let mut rec = [0u8; TypeDesc::SIZE];
        ty.encode_into(&mut rec);
        self.emit(at, &rec)?;
        self.release(ty);
        Ok(at)
    }

    /// The scope node itself is released last, after both arrays.
    fn write_scope(&mut self, mut scope: Box<Scope>) -> Result<BlockOffset, CompactError> {
        ensure_sufficient_stack(|| {
            let at = self.resolve(NodeAddr::of(&*scope))?;
            let syms_at = self.resolve_array(&scope.syms)?;
            let stmts_at = self.resolve_array(&scope.stmts)?;

            let mut rec = [0u8; ScopeRecord::SIZE];
            ScopeRecord {
                syms: syms_at,
                nsyms: scope.syms.len() as u64,
                stmts: stmts_at,
                nstmts: scope.stmts.len() as u64,
            }
            .encode_into(&mut rec);
            self.emit(at, &rec)?;

            if let Some(base) = syms_at {
                self.write_locals(base, std::mem::take(&mut scope.syms))?;
            }
            if let Some(base) = stmts_at {
                self.write_stmts(base, std::mem::take(&mut scope.stmts))?;
            }
            self.release(scope);
            Ok(at)
        })
    }

    fn write_locals(&mut self, base: BlockOffset, syms: Vec<SymDecl>) -> Result<(), CompactError> {
        let stride = DeclRecord::SIZE;
        let mut buf = vec![0u8; syms.len() * stride];
        for (i, sym) in syms.iter().enumerate() {
            self.check_element(sym, base, i, stride)?;
            let name = self.resolve(NodeAddr::of_text(&sym.name))?;
            DeclRecord {
                name: Some(name),
                ty: sym.ty,
                ..DeclRecord::default()
            }
            .encode_into(&mut buf[i * stride..]);
        }
        self.emit(base, &buf)?;

        let mut syms = syms.into_iter();
        for sym in syms.by_ref() {
            self.write_text(sym.name)?;
        }
        self.release(syms);
        Ok(())
    }

    fn write_stmts(&mut self, base: BlockOffset, stmts: Vec<Stmt>) -> Result<(), CompactError> {
        let stride = StmtRecord::SIZE;
        let mut buf = vec![0u8; stmts.len() * stride];
        for (i, stmt) in stmts.iter().enumerate() {
            self.check_element(stmt, base, i, stride)?;
            let rec = self.stmt_record(stmt)?;
            rec.encode_into(&mut buf[i * stride..]);
        }
        self.emit(base, &buf)?;

        let mut stmts = stmts.into_iter();
        for stmt in stmts.by_ref() {
            let Stmt {
                scope,
                expressions,
                label,
                switch_labels,
                ..
            } = stmt;
            if let Some(scope) = scope {
                self.write_scope(scope)?;
            }
            for expr in expressions {
                self.write_expr(expr)?;
            }
            if let Some(label) = label {
                self.write_text(label)?;
            }
            if !switch_labels.is_empty() {
                self.write_switch_labels(switch_labels)?;
            }
        }
        self.release(stmts);
        Ok(())
    }

    /// Encode one statement with every pointer field resolved.
    fn stmt_record(&mut self, stmt: &Stmt) -> Result<StmtRecord, CompactError> {
        let referenced_loop = match stmt.referenced_loop {
            Some(target) => Some(self.resolve(target)?),
            None => None,
        };
        let scope = match stmt.scope.as_deref() {
            Some(scope) => Some(self.resolve(NodeAddr::of(scope))?),
            None => None,
        };
        let mut expressions = [None; STMT_MAX_EXPRESSIONS];
        for (slot, expr) in expressions.iter_mut().zip(&stmt.expressions) {
            *slot = Some(self.resolve(NodeAddr::of(&**expr))?);
        }
        let label = match stmt.label.as_deref() {
            Some(label) => Some(self.resolve(NodeAddr::of_text(label))?),
            None => None,
        };
        let switch_labels = self.resolve_array(&stmt.switch_labels)?;

        Ok(StmtRecord {
            kind: stmt.kind as u8,
            nexpr: u32::try_from(stmt.expressions.len()).unwrap_or(u32::MAX),
            loc: stmt.loc.map_or(NULL_OFFSET, SourceLoc::pack),
            referenced_loop,
            scope,
            expressions,
            label,
            switch_labels,
            nswitch: stmt.switch_labels.len() as u64,
        })
    }

    fn write_switch_labels(&mut self, labels: Vec<u64>) -> Result<(), CompactError> {
        let base = self.resolve(NodeAddr::of_slice(&labels))?;
        for (i, label) in labels.iter().enumerate() {
            self.check_element(label, base, i, SWITCH_LABEL_SIZE)?;
        }
        let bytes: Vec<u8> = labels.iter().flat_map(|l| l.to_le_bytes()).collect();
        self.emit(base, &bytes)?;
        self.release(labels);
        Ok(())
    }

    fn write_expr(&mut self, mut node: Box<ExprNode>) -> Result<BlockOffset, CompactError> {
        ensure_sufficient_stack(|| {
            let at = self.resolve(NodeAddr::of(&*node))?;
            let symname = match node.symname.as_deref() {
                Some(name) => Some(self.resolve(NodeAddr::of_text(name))?),
                None => None,
            };
            let method_name = match node.method_name.as_deref() {
                Some(name) => Some(self.resolve(NodeAddr::of_text(name))?),
                None => None,
            };
            let mut children = [None; EXPR_MAX_CHILDREN];
            for (slot, child) in children.iter_mut().zip(&node.children) {
                if let Some(child) = child {
                    *slot = Some(self.resolve(NodeAddr::of(&**child))?);
                }
            }

            let mut rec = [0u8; ExprRecord::SIZE];
            ExprRecord {
                kind: node.kind as u8,
                value: node.value,
                ty: node.ty,
                symname,
                method_name,
                children,
            }
            .encode_into(&mut rec);
            self.emit(at, &rec)?;

            if let Some(name) = node.symname.take() {
                self.write_text(name)?;
            }
            if let Some(name) = node.method_name.take() {
                self.write_text(name)?;
            }
            for child in &mut node.children {
                if let Some(child) = child.take() {
                    self.write_expr(child)?;
                }
            }
            self.release(node);
            Ok(at)
        })
    }
}

#[cfg(test)]
#[expect(
    clippy::unwrap_used,
    reason = "tests use unwrap for concise assertions"
)]
mod tests;
