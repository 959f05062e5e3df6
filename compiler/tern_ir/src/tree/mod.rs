//! Scattered syntax tree, as produced by the parser.
//!
//! Every node owns its children through `Box`, `Vec` or `CString`, so the
//! tree shape is enforced by ownership: no node has two parents. Absent
//! optional fields are `None` and never reach the relocation ledger.
//!
//! Non-owning references are kept as plain values:
//! - [`SourceLoc`] indexes the parser's source-position table.
//! - `Stmt::referenced_loop` is the [`NodeAddr`] of an enclosing statement of
//!   the same function. Take it only after the tree is fully built.

mod kinds;

use std::ffi::{CStr, CString};

use smallvec::SmallVec;

use crate::packed::PackedFn;
use crate::{NodeAddr, TypeDesc};

pub use kinds::{ExprKind, StmtKind};

/// Child slots per expression node.
pub const EXPR_MAX_CHILDREN: usize = 8;

/// Expression slots per statement.
pub const STMT_MAX_EXPRESSIONS: usize = 4;

/// A position in the parser's source table.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct SourceLoc {
    pub line: u32,
    pub col: u32,
}

impl SourceLoc {
    #[inline]
    pub const fn new(line: u32, col: u32) -> Self {
        SourceLoc { line, col }
    }

    /// Pack into one `u64` (`line` high, `col` low).
    #[inline]
    pub const fn pack(self) -> u64 {
        ((self.line as u64) << 32) | self.col as u64
    }

    #[inline]
    #[expect(
        clippy::cast_possible_truncation,
        reason = "splitting a packed u64 into its two u32 halves"
    )]
    pub const fn unpack(raw: u64) -> Self {
        SourceLoc {
            line: (raw >> 32) as u32,
            col: raw as u32,
        }
    }
}

/// A named entity: a local variable, or a function.
#[derive(Debug)]
pub struct SymDecl {
    pub name: CString,
    pub ty: TypeDesc,
    /// Present iff this declaration is a function.
    pub func: Option<FnBody>,
}

impl SymDecl {
    /// A non-function declaration.
    pub fn local(name: &CStr, ty: TypeDesc) -> Self {
        SymDecl {
            name: name.to_owned(),
            ty,
            func: None,
        }
    }

    /// A function with a scattered body.
    pub fn function(name: &CStr, ret: TypeDesc, args: Vec<TypeDesc>, body: Scope) -> Self {
        SymDecl {
            name: name.to_owned(),
            ty: ret,
            func: Some(FnBody::Tree(FnTree {
                scope: Box::new(body),
                args: args.into_iter().map(Box::new).collect(),
            })),
        }
    }

    #[inline]
    pub fn is_function(&self) -> bool {
        self.func.is_some()
    }

    /// Argument count, or 0 for non-functions and poisoned bodies.
    pub fn nargs(&self) -> usize {
        match &self.func {
            Some(FnBody::Tree(tree)) => tree.args.len(),
            Some(FnBody::Packed(packed)) => packed.arg_offsets().len(),
            Some(FnBody::Poisoned) | None => 0,
        }
    }
}

/// A function body in one of its lifecycle shapes.
#[derive(Debug)]
pub enum FnBody {
    /// Parser output, not yet compacted.
    Tree(FnTree),
    /// Compacted into a single block.
    Packed(PackedFn),
    /// A compaction failed part-way through writing. The original nodes have
    /// been partly released; the function cannot be executed.
    Poisoned,
}

/// Scattered function body: scope tree plus argument types.
#[derive(Debug)]
pub struct FnTree {
    pub scope: Box<Scope>,
    /// One allocation per argument, in declaration order.
    pub args: Vec<Box<TypeDesc>>,
}

/// A lexical block.
#[derive(Debug, Default)]
pub struct Scope {
    pub syms: Vec<SymDecl>,
    pub stmts: Vec<Stmt>,
}

impl Scope {
    pub fn new(syms: Vec<SymDecl>, stmts: Vec<Stmt>) -> Self {
        Scope { syms, stmts }
    }

    /// Identity of statement `index`, for `referenced_loop`.
    pub fn stmt_addr(&self, index: usize) -> Option<NodeAddr> {
        self.stmts.get(index).map(NodeAddr::of)
    }
}

/// One executable unit.
#[derive(Debug, Default)]
pub struct Stmt {
    pub kind: StmtKind,
    pub loc: Option<SourceLoc>,
    /// Enclosing loop for `break`/`continue`. Not owned.
    pub referenced_loop: Option<NodeAddr>,
    pub scope: Option<Box<Scope>>,
    pub expressions: SmallVec<[Box<ExprNode>; STMT_MAX_EXPRESSIONS]>,
    pub label: Option<CString>,
    /// Indices of the `label` statements a `switch` dispatches to.
    pub switch_labels: Vec<u64>,
}

impl Stmt {
    pub fn new(kind: StmtKind) -> Self {
        Stmt {
            kind,
            ..Stmt::default()
        }
    }

    #[must_use]
    pub fn with_loc(mut self, loc: SourceLoc) -> Self {
        self.loc = Some(loc);
        self
    }

    #[must_use]
    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.scope = Some(Box::new(scope));
        self
    }

    #[must_use]
    pub fn with_expr(mut self, expr: ExprNode) -> Self {
        self.expressions.push(Box::new(expr));
        self
    }

    #[must_use]
    pub fn with_label(mut self, label: &CStr) -> Self {
        self.label = Some(label.to_owned());
        self
    }

    #[must_use]
    pub fn with_switch_labels(mut self, labels: impl IntoIterator<Item = u64>) -> Self {
        self.switch_labels = labels.into_iter().collect();
        self
    }
}

/// Expression tree node with bounded arity.
#[derive(Debug, Default)]
pub struct ExprNode {
    pub kind: ExprKind,
    /// Literal payload (integer value or `f64` bits).
    pub value: u64,
    pub ty: TypeDesc,
    pub symname: Option<CString>,
    pub method_name: Option<CString>,
    pub children: [Option<Box<ExprNode>>; EXPR_MAX_CHILDREN],
}

impl ExprNode {
    pub fn new(kind: ExprKind) -> Self {
        ExprNode {
            kind,
            ..ExprNode::default()
        }
    }

    pub fn int(value: u64, ty: TypeDesc) -> Self {
        ExprNode {
            kind: ExprKind::IntLit,
            value,
            ty,
            ..ExprNode::default()
        }
    }

    pub fn ident(name: &CStr, ty: TypeDesc) -> Self {
        ExprNode {
            kind: ExprKind::Ident,
            ty,
            symname: Some(name.to_owned()),
            ..ExprNode::default()
        }
    }

    pub fn binary(kind: ExprKind, lhs: ExprNode, rhs: ExprNode) -> Self {
        ExprNode::new(kind).with_child(0, lhs).with_child(1, rhs)
    }

    /// Put `child` in `slot`.
    ///
    /// # Panics
    /// If `slot >= EXPR_MAX_CHILDREN`.
    #[must_use]
    pub fn with_child(mut self, slot: usize, child: ExprNode) -> Self {
        self.children[slot] = Some(Box::new(child));
        self
    }

    #[must_use]
    pub fn with_symname(mut self, name: &CStr) -> Self {
        self.symname = Some(name.to_owned());
        self
    }

    #[must_use]
    pub fn with_method(mut self, name: &CStr) -> Self {
        self.method_name = Some(name.to_owned());
        self
    }

    #[must_use]
    pub fn with_ty(mut self, ty: TypeDesc) -> Self {
        self.ty = ty;
        self
    }

    /// Populated child slots, in slot order.
    pub fn present_children(&self) -> impl Iterator<Item = (usize, &ExprNode)> {
        self.children
            .iter()
            .enumerate()
            .filter_map(|(slot, child)| child.as_deref().map(|c| (slot, c)))
    }
}

#[cfg(test)]
mod tests;
