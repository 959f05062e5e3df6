//! Property-based tests for compaction.
//!
//! Random function bodies are generated as plain shapes, built into
//! scattered trees, compacted, and checked for:
//! 1. Equivalence: the packed body dumps to the same text as the tree
//! 2. Layout: the verifier accepts the block and it is exactly as large as
//!    the sum of the planner's reservations
//! 3. Release: every reservation corresponds to one dropped original

#![allow(clippy::unwrap_used, clippy::expect_used, reason = "Tests can panic")]
#![allow(
    clippy::needless_pass_by_value,
    clippy::redundant_closure_for_method_calls,
    reason = "Proptest macros generate code with these patterns"
)]

use std::ffi::CString;

use proptest::prelude::*;
use tern_compact::{
    optimize_fn_with, verify_packed, CompactCtx, CompactOptions, CompactOutcome, HeapAllocator,
};
use tern_ir::dump::dump_decl;
use tern_ir::{
    BaseType, ExprKind, ExprNode, FnBody, NodeAddr, Scope, SourceLoc, Stmt, StmtKind, SymDecl,
    TypeDesc,
};

// -- Shapes --

#[derive(Clone, Debug)]
struct ExprShape {
    kind: u8,
    value: u64,
    sym: Option<String>,
    method: Option<String>,
    children: Vec<(usize, ExprShape)>,
}

#[derive(Clone, Debug)]
struct StmtShape {
    kind: u8,
    loc: Option<(u32, u32)>,
    exprs: Vec<ExprShape>,
    label: Option<String>,
    switch_labels: Vec<u64>,
    body: Option<ScopeShape>,
}

#[derive(Clone, Debug)]
struct ScopeShape {
    locals: Vec<(String, u8)>,
    stmts: Vec<StmtShape>,
}

// -- Strategies --

fn name_strategy() -> impl Strategy<Value = String> {
    "[a-z_][a-z0-9_]{0,11}"
}

fn expr_strategy() -> impl Strategy<Value = ExprShape> {
    let leaf = (0u8..=32, any::<u64>(), prop::option::of(name_strategy())).prop_map(
        |(kind, value, sym)| ExprShape {
            kind,
            value,
            sym,
            method: None,
            children: Vec::new(),
        },
    );
    leaf.prop_recursive(4, 48, 3, |inner| {
        (
            0u8..=32,
            any::<u64>(),
            prop::option::of(name_strategy()),
            prop::option::of(name_strategy()),
            prop::collection::vec((0usize..8, inner), 0..=3),
        )
            .prop_map(|(kind, value, sym, method, children)| ExprShape {
                kind,
                value,
                sym,
                method,
                children,
            })
    })
}

fn stmt_strategy(
    body: BoxedStrategy<Option<ScopeShape>>,
) -> impl Strategy<Value = StmtShape> {
    (
        0u8..=12,
        prop::option::of((1u32..500, 1u32..120)),
        prop::collection::vec(expr_strategy(), 0..=4),
        prop::option::of(name_strategy()),
        prop::collection::vec(any::<u64>(), 0..4),
        body,
    )
        .prop_map(|(kind, loc, exprs, label, switch_labels, body)| StmtShape {
            kind,
            loc,
            exprs,
            label,
            switch_labels,
            body,
        })
}

fn locals_strategy() -> impl Strategy<Value = Vec<(String, u8)>> {
    prop::collection::vec((name_strategy(), 0u8..=11), 0..4)
}

fn scope_strategy() -> impl Strategy<Value = ScopeShape> {
    let leaf = (
        locals_strategy(),
        prop::collection::vec(stmt_strategy(Just(None).boxed()), 0..4),
    )
        .prop_map(|(locals, stmts)| ScopeShape { locals, stmts });
    leaf.prop_recursive(3, 24, 4, |inner| {
        (
            locals_strategy(),
            prop::collection::vec(stmt_strategy(prop::option::of(inner).boxed()), 0..4),
        )
            .prop_map(|(locals, stmts)| ScopeShape { locals, stmts })
    })
}

fn args_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(0u8..=11, 0..5)
}

// -- Building --

fn text(s: &str) -> CString {
    CString::new(s).unwrap()
}

fn ty(raw: u8) -> TypeDesc {
    TypeDesc::scalar(BaseType::from_raw(raw).unwrap_or_default())
}

fn build_expr(shape: &ExprShape) -> ExprNode {
    let mut node = ExprNode::new(ExprKind::from_raw(shape.kind).unwrap_or_default())
        .with_ty(ty(shape.kind % 12));
    node.value = shape.value;
    if let Some(sym) = &shape.sym {
        node = node.with_symname(&text(sym));
    }
    if let Some(method) = &shape.method {
        node = node.with_method(&text(method));
    }
    for (slot, child) in &shape.children {
        node = node.with_child(*slot, build_expr(child));
    }
    node
}

fn build_scope(shape: &ScopeShape) -> Scope {
    let syms = shape
        .locals
        .iter()
        .map(|(name, base)| SymDecl::local(&text(name), ty(*base)))
        .collect();
    let stmts = shape
        .stmts
        .iter()
        .map(|s| {
            let mut stmt = Stmt::new(StmtKind::from_raw(s.kind).unwrap_or_default());
            if let Some((line, col)) = s.loc {
                stmt = stmt.with_loc(SourceLoc::new(line, col));
            }
            for expr in &s.exprs {
                stmt = stmt.with_expr(build_expr(expr));
            }
            if let Some(label) = &s.label {
                stmt = stmt.with_label(&text(label));
            }
            if let Some(body) = &s.body {
                stmt = stmt.with_scope(build_scope(body));
            }
            stmt.with_switch_labels(s.switch_labels.clone())
        })
        .collect();
    Scope::new(syms, stmts)
}

/// Point every `break`/`continue` at its innermost enclosing loop target.
/// Runs after the tree is complete so statement addresses are final.
fn link_loops(scope: &mut Scope, enclosing: Option<NodeAddr>) {
    for i in 0..scope.stmts.len() {
        let addr = scope.stmt_addr(i);
        let stmt = &mut scope.stmts[i];
        if matches!(stmt.kind, StmtKind::Break | StmtKind::Continue) {
            stmt.referenced_loop = enclosing;
        }
        let inner = if stmt.kind.is_loop_target() {
            addr
        } else {
            enclosing
        };
        if let Some(body) = stmt.scope.as_deref_mut() {
            link_loops(body, inner);
        }
    }
}

fn build_fn(body: &ScopeShape, args: &[u8]) -> SymDecl {
    let mut scope = build_scope(body);
    link_loops(&mut scope, None);
    SymDecl::function(
        c"prop",
        TypeDesc::scalar(BaseType::I64),
        args.iter().map(|&a| ty(a)).collect(),
        scope,
    )
}

// -- Properties --

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn packed_body_dumps_like_the_tree(body in scope_strategy(), args in args_strategy()) {
        let mut decl = build_fn(&body, &args);
        let before = dump_decl(&decl);

        let outcome = optimize_fn_with(
            &mut decl,
            &CompactOptions::default().with_verify(true),
            &HeapAllocator,
        );
        prop_assert!(matches!(outcome, Ok(CompactOutcome::Compacted(_))), "{:?}", outcome);
        prop_assert_eq!(dump_decl(&decl), before);
    }

    #[test]
    fn block_is_exactly_the_reservations(body in scope_strategy(), args in args_strategy()) {
        let mut decl = build_fn(&body, &args);
        let Some(FnBody::Tree(tree)) = decl.func.take() else {
            panic!("fresh function has a scattered body");
        };

        let mut cx = CompactCtx::new();
        let size = cx.plan(&tree).unwrap();
        let reserved: usize = cx.reservations().iter().map(|r| r.len).sum();
        prop_assert_eq!(size, reserved);
        prop_assert!(cx.reservations().iter().all(|r| r.offset.index() % 8 == 0 && r.len % 8 == 0));

        cx.allocate(&HeapAllocator).unwrap();
        let packed = cx.write(tree).unwrap();
        let stats = cx.stats();
        prop_assert_eq!(packed.block().len(), size);
        prop_assert_eq!(stats.writes, stats.reservations);
        prop_assert_eq!(stats.released, stats.reservations);

        let report = verify_packed(&packed).unwrap();
        prop_assert_eq!(report.spans, stats.reservations);
        prop_assert_eq!(packed.arg_offsets().len(), args.len());
    }
}
