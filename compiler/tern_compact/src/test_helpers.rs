//! Shared fixtures for unit tests.

use tern_ir::tree::FnTree;
use tern_ir::{
    BaseType, Block, ExprKind, ExprNode, FnBody, PackedFn, Scope, SourceLoc, Stmt, StmtKind,
    SymDecl, TypeDesc,
};

use crate::{BlockAllocator, CompactError};

pub(crate) const I64: TypeDesc = TypeDesc::scalar(BaseType::I64);
pub(crate) const U8: TypeDesc = TypeDesc::scalar(BaseType::U8);

/// Allocator that always reports exhaustion.
pub(crate) struct FailingAllocator;

impl BlockAllocator for FailingAllocator {
    fn allocate(&self, size: usize) -> Result<Block, CompactError> {
        Err(CompactError::OutOfMemory { size })
    }
}

/// Allocator that hands back half of what was asked for.
pub(crate) struct ShortAllocator;

impl BlockAllocator for ShortAllocator {
    fn allocate(&self, size: usize) -> Result<Block, CompactError> {
        Block::try_zeroed(size / 2).map_err(|_| CompactError::OutOfMemory { size })
    }
}

/// A function with `body` and the given argument types.
pub(crate) fn func(body: Scope, args: Vec<TypeDesc>) -> SymDecl {
    SymDecl::function(c"f", I64, args, body)
}

/// Borrow the scattered body of a function declaration.
pub(crate) fn tree(decl: &SymDecl) -> &FnTree {
    match &decl.func {
        Some(FnBody::Tree(tree)) => tree,
        other => panic!("expected a scattered body, found {other:?}"),
    }
}

/// Take the scattered body out of a function declaration.
pub(crate) fn take_tree(decl: &mut SymDecl) -> FnTree {
    match decl.func.take() {
        Some(FnBody::Tree(tree)) => tree,
        other => panic!("expected a scattered body, found {other:?}"),
    }
}

/// Borrow the packed body of a function declaration.
pub(crate) fn packed(decl: &SymDecl) -> &PackedFn {
    match &decl.func {
        Some(FnBody::Packed(packed)) => packed,
        other => panic!("expected a packed body, found {other:?}"),
    }
}

/// `lhs + rhs` over two integer leaves.
pub(crate) fn add(lhs: u64, rhs: u64) -> ExprNode {
    ExprNode::binary(ExprKind::Add, ExprNode::int(lhs, I64), ExprNode::int(rhs, I64)).with_ty(I64)
}

/// A `while` loop whose body breaks and continues back to it, followed by a
/// labelled switch, exercising every statement field.
pub(crate) fn busy_body() -> Scope {
    let mut body = Scope::new(
        vec![SymDecl::local(c"i", I64), SymDecl::local(c"s", U8.pointer_to())],
        vec![
            Stmt::new(StmtKind::While)
                .with_loc(SourceLoc::new(2, 1))
                .with_expr(ExprNode::binary(
                    ExprKind::Lt,
                    ExprNode::ident(c"i", I64),
                    ExprNode::int(10, I64),
                ))
                .with_scope(Scope::new(
                    vec![SymDecl::local(c"t", I64)],
                    vec![
                        Stmt::new(StmtKind::Expression).with_expr(
                            ExprNode::new(ExprKind::MethodCall)
                                .with_method(c"push")
                                .with_child(0, ExprNode::ident(c"s", U8.pointer_to()))
                                .with_child(2, ExprNode::int(7, U8)),
                        ),
                        Stmt::new(StmtKind::Break),
                        Stmt::new(StmtKind::Continue),
                    ],
                )),
            Stmt::new(StmtKind::Switch)
                .with_expr(ExprNode::ident(c"i", I64))
                .with_switch_labels([2, 3]),
            Stmt::new(StmtKind::Label).with_label(c"done"),
            Stmt::new(StmtKind::Goto).with_label(c"done"),
            Stmt::new(StmtKind::Return).with_expr(add(1, 2)),
        ],
    );
    let target = body.stmt_addr(0);
    if let Some(inner) = body.stmts[0].scope.as_deref_mut() {
        inner.stmts[1].referenced_loop = target;
        inner.stmts[2].referenced_loop = target;
    }
    body
}
