use pretty_assertions::assert_eq;
use tern_ir::dump::{dump_packed_scope, dump_scope};
use tern_ir::{Block, BlockOffset, NodeAddr, OutOfBlock, PackedFn, Scope, Stmt, StmtKind, SymDecl};

use super::Writer;
use crate::test_helpers::{busy_body, func, take_tree, tree, ShortAllocator, I64};
use crate::{CompactCtx, CompactError, HeapAllocator, NodeKind};

/// Plan, allocate and write `decl`'s body, returning the context for
/// inspection.
fn compact(decl: &mut SymDecl) -> (CompactCtx, PackedFn) {
    let mut cx = CompactCtx::new();
    cx.plan(tree(decl)).unwrap();
    cx.allocate(&HeapAllocator).unwrap();
    let packed = cx.write(take_tree(decl)).unwrap();
    (cx, packed)
}

#[test]
fn writes_every_reservation_once() {
    let mut decl = func(busy_body(), vec![I64]);
    let (cx, packed) = compact(&mut decl);
    let stats = cx.stats();

    assert_eq!(stats.writes, stats.reservations);
    assert_eq!(stats.released, stats.reservations);
    assert_eq!(stats.block_bytes, packed.block().len());
    assert_eq!(packed.block().len(), cx.total_size());
}

#[test]
fn packed_body_dumps_like_the_tree() {
    let mut decl = func(busy_body(), vec![]);
    let before = dump_scope(&tree(&decl).scope, 0);
    let (_, packed) = compact(&mut decl);

    assert_eq!(dump_packed_scope(packed.scope(), 0), before);
}

#[test]
fn loop_reference_points_at_packed_loop() {
    let mut decl = func(busy_body(), vec![]);
    let (_, packed) = compact(&mut decl);

    let while_stmt = packed.scope().stmt(0).unwrap();
    assert_eq!(while_stmt.kind(), StmtKind::While);
    let body = while_stmt.scope().unwrap();
    for i in [1, 2] {
        let target = body.stmt(i).unwrap().referenced_loop().unwrap();
        assert_eq!(target.offset(), while_stmt.offset());
    }
}

#[test]
fn empty_body_packs_to_scope_record() {
    let mut decl = func(Scope::default(), vec![]);
    let (cx, packed) = compact(&mut decl);

    assert_eq!(packed.block().len(), 32);
    assert_eq!(packed.scope().locals().len(), 0);
    assert_eq!(packed.scope().stmts().len(), 0);
    assert_eq!(cx.stats().released, 1);
}

#[test]
fn argument_types_keep_their_order() {
    let args = vec![I64, I64.pointer_to(), I64.array_of(3)];
    let mut decl = func(Scope::default(), args.clone());
    let (_, packed) = compact(&mut decl);

    assert_eq!(packed.arg_types().collect::<Vec<_>>(), args);
    let offsets = packed.arg_offsets();
    assert!(offsets.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn write_without_block_is_rejected() {
    let mut decl = func(Scope::default(), vec![]);
    let mut cx = CompactCtx::new();
    cx.plan(tree(&decl)).unwrap();

    assert_eq!(
        cx.write(take_tree(&mut decl)).unwrap_err(),
        CompactError::Unallocated
    );
}

#[test]
fn unplanned_tree_misses_the_ledger() {
    let planned = func(Scope::default(), vec![]);
    let mut other = func(
        Scope::new(vec![], vec![Stmt::new(StmtKind::Return)]),
        vec![],
    );
    let addr = NodeAddr::of(&*tree(&other).scope);

    let mut cx = CompactCtx::new();
    cx.plan(tree(&planned)).unwrap();
    cx.allocate(&HeapAllocator).unwrap();

    assert_eq!(
        cx.write(take_tree(&mut other)).unwrap_err(),
        CompactError::LedgerMiss { addr }
    );
}

#[test]
fn short_block_is_refused_before_writing() {
    let mut decl = func(Scope::new(vec![SymDecl::local(c"x", I64)], vec![]), vec![I64]);
    let mut cx = CompactCtx::new();
    let size = cx.plan(tree(&decl)).unwrap();

    assert_eq!(
        cx.allocate(&ShortAllocator),
        Err(CompactError::ShortBlock {
            requested: size,
            got: size / 2
        })
    );
    assert_eq!(
        cx.write(take_tree(&mut decl)).unwrap_err(),
        CompactError::Unallocated
    );
}

#[test]
fn missing_argument_is_an_incomplete_write() {
    let mut decl = func(Scope::default(), vec![I64, I64]);
    let mut cx = CompactCtx::new();
    cx.plan(tree(&decl)).unwrap();
    cx.allocate(&HeapAllocator).unwrap();

    let mut short = take_tree(&mut decl);
    short.args.pop();
    assert_eq!(
        cx.write(short).unwrap_err(),
        CompactError::IncompleteWrite {
            planned: 3,
            written: 2
        }
    );
}

#[test]
fn offset_written_twice_is_rejected() {
    let mut cx = CompactCtx::new();
    let mut writer = Writer::new(&mut cx, Block::try_zeroed(16).unwrap());

    writer.emit(BlockOffset::ZERO, &[1; 8]).unwrap();
    assert_eq!(
        writer.emit(BlockOffset::ZERO, &[2; 8]),
        Err(CompactError::DoubleWrite {
            offset: BlockOffset::ZERO
        })
    );
}

#[test]
fn write_past_the_block_is_rejected() {
    let mut cx = CompactCtx::new();
    let mut writer = Writer::new(&mut cx, Block::try_zeroed(16).unwrap());

    assert_eq!(
        writer.emit(BlockOffset::new(8), &[0; 16]),
        Err(CompactError::OutOfBounds(OutOfBlock {
            offset: 8,
            len: 16,
            block_len: 16
        }))
    );
}

#[test]
fn element_planned_off_stride_is_rejected() {
    let labels = vec![7u64, 8];
    let addr = NodeAddr::of(&labels[1]);
    let mut cx = CompactCtx::new();
    cx.ledger
        .register(addr, BlockOffset::new(40), NodeKind::SwitchLabel)
        .unwrap();
    let mut writer = Writer::new(&mut cx, Block::try_zeroed(64).unwrap());

    assert_eq!(
        writer.check_element(&labels[1], BlockOffset::new(16), 1, 8),
        Err(CompactError::LayoutMismatch {
            addr,
            expected: BlockOffset::new(24),
            found: BlockOffset::new(40)
        })
    );
}
