use crate::BaseType;

use super::*;

const I64: TypeDesc = TypeDesc::scalar(BaseType::I64);

#[test]
fn source_loc_packs_line_high() {
    let loc = SourceLoc::new(12, 7);
    assert_eq!(loc.pack(), (12u64 << 32) | 7);
    assert_eq!(SourceLoc::unpack(loc.pack()), loc);
}

#[test]
fn function_args_are_separate_allocations() {
    let decl = SymDecl::function(c"f", I64, vec![I64, I64], Scope::default());
    assert!(decl.is_function());
    assert_eq!(decl.nargs(), 2);

    let Some(FnBody::Tree(tree)) = &decl.func else {
        panic!("expected a scattered body");
    };
    assert_ne!(NodeAddr::of(&*tree.args[0]), NodeAddr::of(&*tree.args[1]));
}

#[test]
fn locals_are_not_functions() {
    let decl = SymDecl::local(c"x", I64);
    assert!(!decl.is_function());
    assert_eq!(decl.nargs(), 0);
}

#[test]
fn present_children_skips_empty_slots() {
    let node = ExprNode::new(ExprKind::Call)
        .with_child(0, ExprNode::int(1, I64))
        .with_child(3, ExprNode::int(2, I64));
    let slots: Vec<usize> = node.present_children().map(|(slot, _)| slot).collect();
    assert_eq!(slots, vec![0, 3]);
}

#[test]
fn stmt_addr_is_element_identity() {
    let scope = Scope::new(
        vec![],
        vec![Stmt::new(StmtKind::While), Stmt::new(StmtKind::Break)],
    );
    assert_eq!(scope.stmt_addr(0), Some(NodeAddr::of_slice(&scope.stmts)));
    assert_eq!(scope.stmt_addr(1), Some(NodeAddr::of(&scope.stmts[1])));
    assert_eq!(scope.stmt_addr(2), None);
}

#[test]
fn loop_targets() {
    assert!(StmtKind::While.is_loop_target());
    assert!(StmtKind::Switch.is_loop_target());
    assert!(!StmtKind::Break.is_loop_target());
}

#[test]
fn kinds_decode_their_discriminants() {
    for raw in 0..=12u8 {
        let kind = StmtKind::from_raw(raw);
        assert_eq!(kind.map(|k| k as u8), Some(raw));
    }
    assert_eq!(StmtKind::from_raw(13), None);
    assert_eq!(ExprKind::from_raw(ExprKind::Assign as u8), Some(ExprKind::Assign));
    assert_eq!(ExprKind::from_raw(33), None);
}
