//! Structural text dumps.
//!
//! Renders a declaration, whether its body is scattered or packed, as the
//! same indented text. Offsets and addresses never appear in the output;
//! a `break`/`continue` names its target by pre-order statement number
//! (`s0`, `s1`, ...). Statements are numbered in a pass of their own before
//! printing, so a target later in the body still prints its number; only a
//! target outside the dumped scope prints as `loop=?`. Two dumps are equal exactly when the trees have the
//! same shape and contents, which is what compaction must preserve.
//!
//! ```text
//! fn sum(i64, i64) -> i64
//!   local acc: i64
//!   s0 while @2:5
//!     s1 break loop=s0
//!   s2 return
//!     add : i64
//!       [0] ident sym=acc : i64
//!       [1] int =1 : i64
//! ```

use std::ffi::CStr;
use std::fmt::Write;
use std::hash::Hash;

use rustc_hash::FxHashMap;

use crate::packed::{ExprView, ScopeView, StmtView};
use crate::tree::{ExprNode, FnBody, Scope, Stmt};
use crate::{BlockOffset, ExprKind, NodeAddr, SourceLoc, StmtKind, SymDecl, TypeDesc};

/// Dump a declaration and, for functions, its body.
pub fn dump_decl(decl: &SymDecl) -> String {
    let name = decl.name.to_string_lossy();
    match &decl.func {
        None => format!("let {name}: {}\n", decl.ty),
        Some(FnBody::Tree(tree)) => {
            let args: Vec<String> = tree.args.iter().map(ToString::to_string).collect();
            let mut out = format!("fn {name}({}) -> {}\n", args.join(", "), decl.ty);
            out.push_str(&dump_scope(&tree.scope, 1));
            out
        }
        Some(FnBody::Packed(packed)) => {
            let args: Vec<String> = packed.arg_types().map(|t| t.to_string()).collect();
            let mut out = format!("fn {name}({}) -> {}\n", args.join(", "), decl.ty);
            out.push_str(&dump_packed_scope(packed.scope(), 1));
            out
        }
        Some(FnBody::Poisoned) => format!("fn {name} <poisoned>\n"),
    }
}

/// Dump a scattered scope at the given indent depth.
pub fn dump_scope(scope: &Scope, depth: usize) -> String {
    let mut printer = Printer::<NodeAddr>::default();
    printer.number_tree(scope);
    printer.tree_scope(scope, depth);
    printer.out
}

/// Dump a packed scope at the given indent depth.
pub fn dump_packed_scope(scope: ScopeView<'_>, depth: usize) -> String {
    let mut printer = Printer::<BlockOffset>::default();
    printer.number_packed(scope);
    printer.packed_scope(scope, depth);
    printer.out
}

/// Shared line formatting, keyed by whatever identifies a statement in the
/// representation being printed.
struct Printer<K> {
    out: String,
    stmt_ids: FxHashMap<K, usize>,
}

impl<K> Default for Printer<K> {
    fn default() -> Self {
        Printer {
            out: String::new(),
            stmt_ids: FxHashMap::default(),
        }
    }
}

/// Fields of one statement line, independent of representation.
struct StmtLine<'a> {
    kind: StmtKind,
    loc: Option<SourceLoc>,
    label: Option<&'a CStr>,
    switch_labels: Vec<u64>,
}

/// Fields of one expression line.
struct ExprLine<'a> {
    kind: ExprKind,
    value: u64,
    ty: TypeDesc,
    symname: Option<&'a CStr>,
    method_name: Option<&'a CStr>,
}

impl<K: Hash + Eq> Printer<K> {
    fn indent(&mut self, depth: usize) {
        for _ in 0..depth {
            self.out.push_str("  ");
        }
    }

    fn local(&mut self, depth: usize, name: &CStr, ty: TypeDesc) {
        self.indent(depth);
        let _ = writeln!(self.out, "local {}: {ty}", name.to_string_lossy());
    }

    /// Give `key` the next pre-order number.
    fn number(&mut self, key: K) {
        let id = self.stmt_ids.len();
        self.stmt_ids.insert(key, id);
    }

    fn stmt(&mut self, depth: usize, key: &K, loop_key: Option<K>, line: &StmtLine<'_>) {
        self.indent(depth);
        match self.stmt_ids.get(key) {
            Some(id) => {
                let _ = write!(self.out, "s{id} {}", line.kind.name());
            }
            None => {
                let _ = write!(self.out, "s? {}", line.kind.name());
            }
        }
        if let Some(loc) = line.loc {
            let _ = write!(self.out, " @{}:{}", loc.line, loc.col);
        }
        if let Some(target) = loop_key {
            match self.stmt_ids.get(&target) {
                Some(n) => {
                    let _ = write!(self.out, " loop=s{n}");
                }
                None => self.out.push_str(" loop=?"),
            }
        }
        if let Some(label) = line.label {
            let _ = write!(self.out, " label={}", label.to_string_lossy());
        }
        if !line.switch_labels.is_empty() {
            let _ = write!(self.out, " switch={:?}", line.switch_labels);
        }
        self.out.push('\n');
    }

    fn expr(&mut self, depth: usize, slot: Option<usize>, line: &ExprLine<'_>) {
        self.indent(depth);
        if let Some(slot) = slot {
            let _ = write!(self.out, "[{slot}] ");
        }
        self.out.push_str(line.kind.name());
        if matches!(line.kind, ExprKind::IntLit | ExprKind::FloatLit) || line.value != 0 {
            let _ = write!(self.out, " ={}", line.value);
        }
        if let Some(sym) = line.symname {
            let _ = write!(self.out, " sym={}", sym.to_string_lossy());
        }
        if let Some(method) = line.method_name {
            let _ = write!(self.out, " method={}", method.to_string_lossy());
        }
        let _ = writeln!(self.out, " : {}", line.ty);
    }
}

impl Printer<NodeAddr> {
    fn number_tree(&mut self, scope: &Scope) {
        for stmt in &scope.stmts {
            self.number(NodeAddr::of(stmt));
            if let Some(inner) = &stmt.scope {
                self.number_tree(inner);
            }
        }
    }

    fn tree_scope(&mut self, scope: &Scope, depth: usize) {
        for sym in &scope.syms {
            self.local(depth, &sym.name, sym.ty);
        }
        for stmt in &scope.stmts {
            self.tree_stmt(stmt, depth);
        }
    }

    fn tree_stmt(&mut self, stmt: &Stmt, depth: usize) {
        let line = StmtLine {
            kind: stmt.kind,
            loc: stmt.loc,
            label: stmt.label.as_deref(),
            switch_labels: stmt.switch_labels.clone(),
        };
        self.stmt(depth, &NodeAddr::of(stmt), stmt.referenced_loop, &line);
        if let Some(scope) = &stmt.scope {
            self.tree_scope(scope, depth + 1);
        }
        for expr in &stmt.expressions {
            self.tree_expr(expr, None, depth + 1);
        }
    }

    fn tree_expr(&mut self, node: &ExprNode, slot: Option<usize>, depth: usize) {
        let line = ExprLine {
            kind: node.kind,
            value: node.value,
            ty: node.ty,
            symname: node.symname.as_deref(),
            method_name: node.method_name.as_deref(),
        };
        self.expr(depth, slot, &line);
        for (slot, child) in node.present_children() {
            self.tree_expr(child, Some(slot), depth + 1);
        }
    }
}

impl Printer<BlockOffset> {
    fn number_packed(&mut self, scope: ScopeView<'_>) {
        for stmt in scope.stmts() {
            self.number(stmt.offset());
            if let Some(inner) = stmt.scope() {
                self.number_packed(inner);
            }
        }
    }

    fn packed_scope(&mut self, scope: ScopeView<'_>, depth: usize) {
        for local in scope.locals() {
            self.local(depth, local.name(), local.ty());
        }
        for stmt in scope.stmts() {
            self.packed_stmt(stmt, depth);
        }
    }

    fn packed_stmt(&mut self, stmt: StmtView<'_>, depth: usize) {
        let line = StmtLine {
            kind: stmt.kind(),
            loc: stmt.loc(),
            label: stmt.label(),
            switch_labels: stmt.switch_labels().collect(),
        };
        let loop_key = stmt.referenced_loop().map(StmtView::offset);
        self.stmt(depth, &stmt.offset(), loop_key, &line);
        if let Some(scope) = stmt.scope() {
            self.packed_scope(scope, depth + 1);
        }
        for expr in stmt.expressions() {
            self.packed_expr(expr, None, depth + 1);
        }
    }

    fn packed_expr(&mut self, node: ExprView<'_>, slot: Option<usize>, depth: usize) {
        let line = ExprLine {
            kind: node.kind(),
            value: node.value(),
            ty: node.ty(),
            symname: node.symname(),
            method_name: node.method_name(),
        };
        self.expr(depth, slot, &line);
        for (slot, child) in node.children() {
            self.packed_expr(child, Some(slot), depth + 1);
        }
    }
}

#[cfg(test)]
mod tests;
