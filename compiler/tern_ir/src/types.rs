//! Fixed-size type descriptors.
//!
//! A [`TypeDesc`] owns no pointers; it is copied verbatim wherever it lives
//! (inline in declarations and expressions, or as a standalone argument-type
//! allocation).

use std::fmt;

/// Primitive shape of a type before pointer and array modifiers.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum BaseType {
    #[default]
    Void = 0,
    U8 = 1,
    I8 = 2,
    U16 = 3,
    I16 = 4,
    U32 = 5,
    I32 = 6,
    U64 = 7,
    I64 = 8,
    F32 = 9,
    F64 = 10,
    /// A user struct, identified by `TypeDesc::struct_id`.
    Struct = 11,
}

impl BaseType {
    /// Decode a stored discriminant.
    pub const fn from_raw(raw: u8) -> Option<Self> {
        Some(match raw {
            0 => BaseType::Void,
            1 => BaseType::U8,
            2 => BaseType::I8,
            3 => BaseType::U16,
            4 => BaseType::I16,
            5 => BaseType::U32,
            6 => BaseType::I32,
            7 => BaseType::U64,
            8 => BaseType::I64,
            9 => BaseType::F32,
            10 => BaseType::F64,
            11 => BaseType::Struct,
            _ => return None,
        })
    }

    pub const fn name(self) -> &'static str {
        match self {
            BaseType::Void => "void",
            BaseType::U8 => "u8",
            BaseType::I8 => "i8",
            BaseType::U16 => "u16",
            BaseType::I16 => "i16",
            BaseType::U32 => "u32",
            BaseType::I32 => "i32",
            BaseType::U64 => "u64",
            BaseType::I64 => "i64",
            BaseType::F32 => "f32",
            BaseType::F64 => "f64",
            BaseType::Struct => "struct",
        }
    }
}

/// A value type: base, pointer depth, optional fixed array length.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct TypeDesc {
    pub base: BaseType,
    pub pointer_level: u8,
    /// Struct table index; meaningful only for [`BaseType::Struct`].
    pub struct_id: u32,
    /// Fixed array length, 0 for scalars.
    pub array_len: u64,
}

impl TypeDesc {
    /// Encoded size in bytes.
    ///
    /// Layout: `base:u8 | pointer_level:u8 | pad:2 | struct_id:u32 | array_len:u64`.
    pub const SIZE: usize = 16;

    pub const VOID: TypeDesc = TypeDesc::scalar(BaseType::Void);

    #[inline]
    pub const fn scalar(base: BaseType) -> Self {
        TypeDesc {
            base,
            pointer_level: 0,
            struct_id: 0,
            array_len: 0,
        }
    }

    /// Same type behind one more level of indirection.
    #[must_use]
    pub const fn pointer_to(self) -> Self {
        TypeDesc {
            pointer_level: self.pointer_level.saturating_add(1),
            ..self
        }
    }

    #[must_use]
    pub const fn array_of(self, len: u64) -> Self {
        TypeDesc {
            array_len: len,
            ..self
        }
    }

    /// Write the encoded form into `out[..SIZE]`.
    pub fn encode_into(&self, out: &mut [u8]) {
        out[0] = self.base as u8;
        out[1] = self.pointer_level;
        out[2..4].fill(0);
        out[4..8].copy_from_slice(&self.struct_id.to_le_bytes());
        out[8..16].copy_from_slice(&self.array_len.to_le_bytes());
    }

    /// Read the encoded form from `bytes[..SIZE]`.
    ///
    /// An unknown base discriminant decodes as `void`.
    pub fn decode(bytes: &[u8]) -> Self {
        let mut id = [0u8; 4];
        id.copy_from_slice(&bytes[4..8]);
        let mut len = [0u8; 8];
        len.copy_from_slice(&bytes[8..16]);
        TypeDesc {
            base: BaseType::from_raw(bytes[0]).unwrap_or_default(),
            pointer_level: bytes[1],
            struct_id: u32::from_le_bytes(id),
            array_len: u64::from_le_bytes(len),
        }
    }
}

impl fmt::Display for TypeDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for _ in 0..self.pointer_level {
            f.write_str("*")?;
        }
        if self.base == BaseType::Struct {
            write!(f, "struct#{}", self.struct_id)?;
        } else {
            f.write_str(self.base.name())?;
        }
        if self.array_len > 0 {
            write!(f, "[{}]", self.array_len)?;
        }
        Ok(())
    }
}
