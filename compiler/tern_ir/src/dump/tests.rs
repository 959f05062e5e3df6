use pretty_assertions::assert_eq;

use super::*;
use crate::tree::FnTree;
use crate::BaseType;

const I64: TypeDesc = TypeDesc::scalar(BaseType::I64);

fn sum_fn() -> SymDecl {
    let mut body = Scope::new(
        vec![SymDecl::local(c"acc", I64)],
        vec![
            Stmt::new(StmtKind::While)
                .with_loc(SourceLoc::new(2, 5))
                .with_scope(Scope::new(vec![], vec![Stmt::new(StmtKind::Break)])),
            Stmt::new(StmtKind::Return).with_expr(ExprNode::binary(
                ExprKind::Add,
                ExprNode::ident(c"acc", I64),
                ExprNode::int(1, I64),
            ).with_ty(I64)),
        ],
    );
    let target = body.stmt_addr(0);
    if let Some(scope) = body.stmts[0].scope.as_deref_mut() {
        scope.stmts[0].referenced_loop = target;
    }
    SymDecl::function(c"sum", I64, vec![I64, I64], body)
}

#[test]
fn dumps_scattered_function() {
    let expected = "\
fn sum(i64, i64) -> i64
  local acc: i64
  s0 while @2:5
    s1 break loop=s0
  s2 return
    add : i64
      [0] ident sym=acc : i64
      [1] int =1 : i64
";
    assert_eq!(dump_decl(&sum_fn()), expected);
}

#[test]
fn dumps_non_function() {
    let decl = SymDecl::local(c"g", TypeDesc::scalar(BaseType::U8).pointer_to());
    assert_eq!(dump_decl(&decl), "let g: *u8\n");
}

#[test]
fn dumps_poisoned_body() {
    let mut decl = sum_fn();
    decl.func = Some(FnBody::Poisoned);
    assert_eq!(dump_decl(&decl), "fn sum <poisoned>\n");
}

#[test]
fn unknown_loop_target_is_marked() {
    let outside = Stmt::new(StmtKind::For);
    let mut stmt = Stmt::new(StmtKind::Continue);
    stmt.referenced_loop = Some(NodeAddr::of(&outside));
    let scope = Scope::new(vec![], vec![stmt]);
    assert_eq!(dump_scope(&scope, 0), "s0 continue loop=?\n");
}

#[test]
fn later_loop_target_keeps_its_number() {
    let mut scope = Scope::new(
        vec![],
        vec![Stmt::new(StmtKind::Break), Stmt::new(StmtKind::While)],
    );
    scope.stmts[0].referenced_loop = scope.stmt_addr(1);
    assert_eq!(dump_scope(&scope, 0), "s0 break loop=s1\ns1 while\n");

    let mut other = Scope::new(
        vec![],
        vec![Stmt::new(StmtKind::Break), Stmt::new(StmtKind::While)],
    );
    other.stmts[0].referenced_loop = other.stmt_addr(0);
    assert_ne!(dump_scope(&scope, 0), dump_scope(&other, 0));
}

#[test]
fn labels_and_switches() {
    let scope = Scope::new(
        vec![],
        vec![
            Stmt::new(StmtKind::Switch)
                .with_expr(ExprNode::ident(c"k", I64))
                .with_switch_labels([1, 2]),
            Stmt::new(StmtKind::Label).with_label(c"one"),
            Stmt::new(StmtKind::Goto).with_label(c"one"),
        ],
    );
    let expected = "\
s0 switch switch=[1, 2]
  ident sym=k : i64
s1 label label=one
s2 goto label=one
";
    assert_eq!(dump_scope(&scope, 0), expected);
}

#[test]
fn method_call_names_method() {
    let tree = FnTree {
        scope: Box::new(Scope::new(
            vec![],
            vec![Stmt::new(StmtKind::Expression).with_expr(
                ExprNode::new(ExprKind::MethodCall)
                    .with_method(c"len")
                    .with_child(0, ExprNode::ident(c"s", I64)),
            )],
        )),
        args: vec![],
    };
    let expected = "\
s0 expr
  method method=len : void
    [0] ident sym=s : i64
";
    assert_eq!(dump_scope(&tree.scope, 0), expected);
}
