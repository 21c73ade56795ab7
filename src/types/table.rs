//! Static name table between C spellings and native kinds

use super::kind::{NativeKind, SemanticType};

struct Entry {
    name: &'static str,
    semantic: SemanticType,
    kind: NativeKind,
}

const fn entry(name: &'static str, kind: NativeKind) -> Entry {
    Entry {
        name,
        semantic: kind.semantic(),
        kind,
    }
}

// The first entry for a kind is its canonical name.
static TABLE: &[Entry] = &[
    entry("Bool", NativeKind::Bool),
    entry("Char", NativeKind::Char),
    entry("Wchar", NativeKind::WChar),
    entry("Int8", NativeKind::I8),
    entry("Byte", NativeKind::I8),
    entry("Uint8", NativeKind::U8),
    entry("Ubyte", NativeKind::U8),
    entry("Int16", NativeKind::I16),
    entry("Short", NativeKind::I16),
    entry("Uint16", NativeKind::U16),
    entry("Ushort", NativeKind::U16),
    entry("Int32", NativeKind::I32),
    entry("Int", NativeKind::I32),
    entry("Uint32", NativeKind::U32),
    entry("Uint", NativeKind::U32),
    entry("Int64", NativeKind::I64),
    entry("LongLong", NativeKind::I64),
    entry("Uint64", NativeKind::U64),
    entry("UlongLong", NativeKind::U64),
    entry("Long", NativeKind::CLong),
    entry("Ulong", NativeKind::CULong),
    entry("SsizeT", NativeKind::ISize),
    entry("SizeT", NativeKind::USize),
    entry("Float", NativeKind::F32),
    entry("Double", NativeKind::F64),
    entry("VoidPointer", NativeKind::Pointer),
    entry("CharPointer", NativeKind::CharPtr),
    entry("WcharPointer", NativeKind::WCharPtr),
];

/// Look up a C spelling
pub fn by_name(name: &str) -> Option<(SemanticType, NativeKind)> {
    TABLE
        .iter()
        .find(|e| e.name == name)
        .map(|e| (e.semantic, e.kind))
}

/// Canonical table name of a kind
pub fn name_of(kind: NativeKind) -> &'static str {
    TABLE
        .iter()
        .find(|e| e.kind == kind)
        .map(|e| e.name)
        .unwrap_or_else(|| kind.c_name())
}

/// All known spellings, in table order
pub fn names() -> impl Iterator<Item = &'static str> {
    TABLE.iter().map(|e| e.name)
}
