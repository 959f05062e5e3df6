//! Fixed-layout records stored in a [`Block`](super::Block).
//!
//! Each record type knows its `SIZE` and how to encode itself into, and
//! decode itself from, exactly that many bytes. Pointer fields are
//! `Option<BlockOffset>` and use [`NULL_OFFSET`](super::NULL_OFFSET) when
//! absent. Kind discriminants stay raw `u8` here so a verifier can notice an
//! undecodable value instead of having it silently mapped.

use super::BlockOffset;
use crate::tree::{EXPR_MAX_CHILDREN, STMT_MAX_EXPRESSIONS};
use crate::TypeDesc;

#[inline]
fn put_u64(out: &mut [u8], at: usize, value: u64) {
    out[at..at + 8].copy_from_slice(&value.to_le_bytes());
}

#[inline]
fn put_u32(out: &mut [u8], at: usize, value: u32) {
    out[at..at + 4].copy_from_slice(&value.to_le_bytes());
}

#[inline]
fn put_ptr(out: &mut [u8], at: usize, ptr: Option<BlockOffset>) {
    put_u64(out, at, BlockOffset::encode(ptr));
}

#[inline]
fn get_u64(bytes: &[u8], at: usize) -> u64 {
    let mut raw = [0u8; 8];
    raw.copy_from_slice(&bytes[at..at + 8]);
    u64::from_le_bytes(raw)
}

#[inline]
fn get_u32(bytes: &[u8], at: usize) -> u32 {
    let mut raw = [0u8; 4];
    raw.copy_from_slice(&bytes[at..at + 4]);
    u32::from_le_bytes(raw)
}

#[inline]
fn get_ptr(bytes: &[u8], at: usize) -> Option<BlockOffset> {
    BlockOffset::decode(get_u64(bytes, at))
}

/// Declaration record.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct DeclRecord {
    pub name: Option<BlockOffset>,
    pub ty: TypeDesc,
    pub is_function: bool,
    pub nargs: u32,
    pub args: Option<BlockOffset>,
    pub body: Option<BlockOffset>,
}

impl DeclRecord {
    /// `name:8 | type:16 | is_function:1 | pad:3 | nargs:4 | args:8 | body:8`
    pub const SIZE: usize = 48;

    pub fn encode_into(&self, out: &mut [u8]) {
        let out = &mut out[..Self::SIZE];
        out.fill(0);
        put_ptr(out, 0, self.name);
        self.ty.encode_into(&mut out[8..24]);
        out[24] = u8::from(self.is_function);
        put_u32(out, 28, self.nargs);
        put_ptr(out, 32, self.args);
        put_ptr(out, 40, self.body);
    }

    pub fn decode(bytes: &[u8]) -> Self {
        DeclRecord {
            name: get_ptr(bytes, 0),
            ty: TypeDesc::decode(&bytes[8..24]),
            is_function: bytes[24] != 0,
            nargs: get_u32(bytes, 28),
            args: get_ptr(bytes, 32),
            body: get_ptr(bytes, 40),
        }
    }
}

/// Scope record.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ScopeRecord {
    pub syms: Option<BlockOffset>,
    pub nsyms: u64,
    pub stmts: Option<BlockOffset>,
    pub nstmts: u64,
}

impl ScopeRecord {
    /// `syms:8 | nsyms:8 | stmts:8 | nstmts:8`
    pub const SIZE: usize = 32;

    pub fn encode_into(&self, out: &mut [u8]) {
        put_ptr(out, 0, self.syms);
        put_u64(out, 8, self.nsyms);
        put_ptr(out, 16, self.stmts);
        put_u64(out, 24, self.nstmts);
    }

    pub fn decode(bytes: &[u8]) -> Self {
        ScopeRecord {
            syms: get_ptr(bytes, 0),
            nsyms: get_u64(bytes, 8),
            stmts: get_ptr(bytes, 16),
            nstmts: get_u64(bytes, 24),
        }
    }
}

/// Statement record.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct StmtRecord {
    pub kind: u8,
    pub nexpr: u32,
    /// Packed [`SourceLoc`](crate::SourceLoc), or `NULL_OFFSET` when absent.
    pub loc: u64,
    pub referenced_loop: Option<BlockOffset>,
    pub scope: Option<BlockOffset>,
    pub expressions: [Option<BlockOffset>; STMT_MAX_EXPRESSIONS],
    pub label: Option<BlockOffset>,
    pub switch_labels: Option<BlockOffset>,
    pub nswitch: u64,
}

impl StmtRecord {
    /// `kind:1 | pad:3 | nexpr:4 | loc:8 | loop:8 | scope:8 | expr:8x4 |
    /// label:8 | switch:8 | nswitch:8`
    pub const SIZE: usize = 88;

    const EXPRS: usize = 32;

    pub fn encode_into(&self, out: &mut [u8]) {
        let out = &mut out[..Self::SIZE];
        out.fill(0);
        out[0] = self.kind;
        put_u32(out, 4, self.nexpr);
        put_u64(out, 8, self.loc);
        put_ptr(out, 16, self.referenced_loop);
        put_ptr(out, 24, self.scope);
        for (i, expr) in self.expressions.iter().enumerate() {
            put_ptr(out, Self::EXPRS + 8 * i, *expr);
        }
        put_ptr(out, 64, self.label);
        put_ptr(out, 72, self.switch_labels);
        put_u64(out, 80, self.nswitch);
    }

    pub fn decode(bytes: &[u8]) -> Self {
        StmtRecord {
            kind: bytes[0],
            nexpr: get_u32(bytes, 4),
            loc: get_u64(bytes, 8),
            referenced_loop: get_ptr(bytes, 16),
            scope: get_ptr(bytes, 24),
            expressions: std::array::from_fn(|i| get_ptr(bytes, Self::EXPRS + 8 * i)),
            label: get_ptr(bytes, 64),
            switch_labels: get_ptr(bytes, 72),
            nswitch: get_u64(bytes, 80),
        }
    }
}

/// Expression record.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ExprRecord {
    pub kind: u8,
    pub value: u64,
    pub ty: TypeDesc,
    pub symname: Option<BlockOffset>,
    pub method_name: Option<BlockOffset>,
    pub children: [Option<BlockOffset>; EXPR_MAX_CHILDREN],
}

impl ExprRecord {
    /// `kind:1 | pad:7 | value:8 | type:16 | symname:8 | method:8 | child:8x8`
    pub const SIZE: usize = 112;

    const CHILDREN: usize = 48;

    pub fn encode_into(&self, out: &mut [u8]) {
        let out = &mut out[..Self::SIZE];
        out.fill(0);
        out[0] = self.kind;
        put_u64(out, 8, self.value);
        self.ty.encode_into(&mut out[16..32]);
        put_ptr(out, 32, self.symname);
        put_ptr(out, 40, self.method_name);
        for (i, child) in self.children.iter().enumerate() {
            put_ptr(out, Self::CHILDREN + 8 * i, *child);
        }
    }

    pub fn decode(bytes: &[u8]) -> Self {
        ExprRecord {
            kind: bytes[0],
            value: get_u64(bytes, 8),
            ty: TypeDesc::decode(&bytes[16..32]),
            symname: get_ptr(bytes, 32),
            method_name: get_ptr(bytes, 40),
            children: std::array::from_fn(|i| get_ptr(bytes, Self::CHILDREN + 8 * i)),
        }
    }
}

/// Size of one switch-label index.
pub const SWITCH_LABEL_SIZE: usize = 8;

// Record sizes must keep every array stride aligned.
const _: () = {
    assert!(DeclRecord::SIZE % super::ALIGN == 0);
    assert!(ScopeRecord::SIZE % super::ALIGN == 0);
    assert!(StmtRecord::SIZE == StmtRecord::EXPRS + 8 * STMT_MAX_EXPRESSIONS + 24);
    assert!(ExprRecord::SIZE == ExprRecord::CHILDREN + 8 * EXPR_MAX_CHILDREN);
    assert!(TypeDesc::SIZE % super::ALIGN == 0);
};
