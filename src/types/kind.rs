//! Native kinds - primitive C representations
//!
//! Sizes and alignments come from the target's own C types so that layouts
//! agree with the platform compiler.

use core::ffi::{c_long, c_ulong};
use core::mem::{align_of, size_of};
use std::fmt;

/// Storage type of a C `wchar_t`
#[cfg(windows)]
pub type WcharT = u16;
#[cfg(not(windows))]
pub type WcharT = u32;

/// C-compatible primitive representation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum NativeKind {
    Bool,
    Char,
    WChar,
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    I64,
    U64,
    /// C `long`, 4 bytes on Windows and pointer width elsewhere
    CLong,
    CULong,
    ISize,
    USize,
    F32,
    F64,
    /// Opaque `void *`
    Pointer,
    /// Nullable `char *`
    CharPtr,
    /// Nullable `wchar_t *`
    WCharPtr,
}

/// Semantic (language-level) category a native kind decodes to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SemanticType {
    Bool,
    Int,
    Float,
    Bytes,
    Text,
    Address,
}

impl NativeKind {
    pub const ALL: [NativeKind; 20] = [
        Self::Bool,
        Self::Char,
        Self::WChar,
        Self::I8,
        Self::U8,
        Self::I16,
        Self::U16,
        Self::I32,
        Self::U32,
        Self::I64,
        Self::U64,
        Self::CLong,
        Self::CULong,
        Self::ISize,
        Self::USize,
        Self::F32,
        Self::F64,
        Self::Pointer,
        Self::CharPtr,
        Self::WCharPtr,
    ];

    /// Size of type in bytes
    #[inline]
    pub const fn size(self) -> usize {
        match self {
            Self::Bool | Self::Char | Self::I8 | Self::U8 => 1,
            Self::I16 | Self::U16 => 2,
            Self::I32 | Self::U32 | Self::F32 => 4,
            Self::I64 | Self::U64 | Self::F64 => 8,
            Self::WChar => size_of::<WcharT>(),
            Self::CLong | Self::CULong => size_of::<c_long>(),
            Self::ISize | Self::USize | Self::Pointer | Self::CharPtr | Self::WCharPtr => {
                size_of::<usize>()
            }
        }
    }

    /// Alignment requirement inside an unpacked struct
    #[inline]
    pub const fn align(self) -> usize {
        match self {
            Self::Bool | Self::Char | Self::I8 | Self::U8 => 1,
            Self::I16 | Self::U16 => align_of::<u16>(),
            Self::I32 | Self::U32 => align_of::<u32>(),
            Self::F32 => align_of::<f32>(),
            Self::I64 | Self::U64 => align_of::<u64>(),
            Self::F64 => align_of::<f64>(),
            Self::WChar => align_of::<WcharT>(),
            Self::CLong | Self::CULong => align_of::<c_ulong>(),
            Self::ISize | Self::USize | Self::Pointer | Self::CharPtr | Self::WCharPtr => {
                align_of::<usize>()
            }
        }
    }

    /// Width in bits
    #[inline]
    pub const fn bits(self) -> u32 {
        (self.size() * 8) as u32
    }

    #[inline]
    pub const fn is_integral(self) -> bool {
        matches!(
            self,
            Self::I8
                | Self::U8
                | Self::I16
                | Self::U16
                | Self::I32
                | Self::U32
                | Self::I64
                | Self::U64
                | Self::CLong
                | Self::CULong
                | Self::ISize
                | Self::USize
        )
    }

    #[inline]
    pub const fn is_signed(self) -> bool {
        matches!(
            self,
            Self::I8 | Self::I16 | Self::I32 | Self::I64 | Self::CLong | Self::ISize
        )
    }

    #[inline]
    pub const fn is_float(self) -> bool {
        matches!(self, Self::F32 | Self::F64)
    }

    /// Pointer-valued kinds
    #[inline]
    pub const fn is_pointer(self) -> bool {
        matches!(self, Self::Pointer | Self::CharPtr | Self::WCharPtr)
    }

    /// Semantic type this kind decodes to
    pub const fn semantic(self) -> SemanticType {
        match self {
            Self::Bool => SemanticType::Bool,
            Self::Char | Self::CharPtr => SemanticType::Bytes,
            Self::WChar | Self::WCharPtr => SemanticType::Text,
            Self::F32 | Self::F64 => SemanticType::Float,
            Self::Pointer => SemanticType::Address,
            _ => SemanticType::Int,
        }
    }

    /// C spelling, used in diagnostics
    pub const fn c_name(self) -> &'static str {
        match self {
            Self::Bool => "_Bool",
            Self::Char => "char",
            Self::WChar => "wchar_t",
            Self::I8 => "int8_t",
            Self::U8 => "uint8_t",
            Self::I16 => "int16_t",
            Self::U16 => "uint16_t",
            Self::I32 => "int32_t",
            Self::U32 => "uint32_t",
            Self::I64 => "int64_t",
            Self::U64 => "uint64_t",
            Self::CLong => "long",
            Self::CULong => "unsigned long",
            Self::ISize => "ssize_t",
            Self::USize => "size_t",
            Self::F32 => "float",
            Self::F64 => "double",
            Self::Pointer => "void *",
            Self::CharPtr => "char *",
            Self::WCharPtr => "wchar_t *",
        }
    }
}

impl fmt::Display for NativeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.c_name())
    }
}

impl fmt::Display for SemanticType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Float => "float",
            Self::Bytes => "bytes",
            Self::Text => "str",
            Self::Address => "address",
        };
        f.write_str(name)
    }
}
