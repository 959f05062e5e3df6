//! Syntax tree types for the Tern compiler.
//!
//! A function body exists in two shapes over its lifetime:
//!
//! - **Scattered** ([`tree`]): what the parser produces. Every node is its
//!   own heap allocation (`Box`, `Vec`, `CString`) linked by ownership.
//!   Cheap to build incrementally, poor for cache locality.
//!
//! - **Packed** ([`packed`]): one contiguous [`Block`] holding fixed-layout
//!   records that refer to each other by [`BlockOffset`]. Produced by the
//!   compaction pass in `tern_compact` and walked read-only by the executor
//!   through the [`packed::ScopeView`] family of views.
//!
//! [`NodeAddr`] is the identity key that ties the two together: the planner
//! records where each scattered node will land, keyed by its address.
//!
//! [`dump`] renders either shape as the same indented text, so a round trip
//! through compaction can be checked for structural equivalence.

mod addr;
pub mod dump;
pub mod packed;
pub mod tree;
mod types;

pub use addr::NodeAddr;
pub use packed::{Block, BlockOffset, OutOfBlock, PackedFn};
pub use tree::{
    ExprKind, ExprNode, FnBody, FnTree, Scope, SourceLoc, Stmt, StmtKind, SymDecl,
    EXPR_MAX_CHILDREN, STMT_MAX_EXPRESSIONS,
};
pub use types::{BaseType, TypeDesc};
