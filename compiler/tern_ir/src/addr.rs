//! Node identity keys.

use std::ffi::CStr;
use std::fmt;

/// Address of a scattered node, used as an opaque identity key.
///
/// Two live nodes never share an address unless one is the first element of
/// an array whose base address is the other. The value is never turned back
/// into a pointer; it only keys the relocation ledger.
///
/// # Stability
/// Heap contents (`Box`, `Vec` buffer, `CString`) keep their address when the
/// owning handle moves. An element of a `Vec` keeps its address only while
/// the `Vec` is not reallocated, so identities must be taken after the tree
/// is fully built.
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct NodeAddr(usize);

impl NodeAddr {
    /// Identity of a node behind a reference.
    #[inline]
    pub fn of<T>(node: &T) -> Self {
        NodeAddr(std::ptr::from_ref(node).cast::<u8>() as usize)
    }

    /// Identity of the first element of a slice (the array base).
    #[inline]
    pub fn of_slice<T>(items: &[T]) -> Self {
        NodeAddr(items.as_ptr().cast::<u8>() as usize)
    }

    /// Identity of NUL-terminated text.
    #[inline]
    pub fn of_text(text: &CStr) -> Self {
        NodeAddr(text.as_ptr().cast::<u8>() as usize)
    }

    /// Get the raw address value.
    #[inline]
    pub const fn raw(self) -> usize {
        self.0
    }
}

impl fmt::Debug for NodeAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeAddr({:#x})", self.0)
    }
}
