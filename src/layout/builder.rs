//! Offset assignment for C struct layouts

use serde::{Deserialize, Serialize};
use std::fmt;

/// Byte order of multi-byte scalars inside a struct buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ByteOrder {
    #[default]
    Native,
    Little,
    Big,
}

impl ByteOrder {
    /// Concrete order for the running target
    #[inline]
    pub const fn resolve(self) -> Self {
        match self {
            Self::Native => {
                if cfg!(target_endian = "little") {
                    Self::Little
                } else {
                    Self::Big
                }
            }
            other => other,
        }
    }

    #[inline]
    pub const fn is_little(self) -> bool {
        matches!(self.resolve(), Self::Little)
    }
}

/// Struct-level layout options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LayoutOptions {
    pub packed: bool,
    pub byte_order: ByteOrder,
}

impl LayoutOptions {
    pub const fn new(packed: bool, byte_order: ByteOrder) -> Self {
        Self { packed, byte_order }
    }
}

/// One field's reserved byte range
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSlot {
    pub name: String,
    pub offset: usize,
    pub size: usize,
    pub align: usize,
}

impl FieldSlot {
    #[inline]
    pub fn range(&self) -> std::ops::Range<usize> {
        self.offset..self.offset + self.size
    }
}

/// Computed memory plan of one struct type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    slots: Vec<FieldSlot>,
    size: usize,
    align: usize,
    options: LayoutOptions,
}

impl Layout {
    /// Compute a layout in one go from `(name, size, align)` triples
    pub fn compute<I, S>(fields: I, options: LayoutOptions) -> Self
    where
        I: IntoIterator<Item = (S, usize, usize)>,
        S: Into<String>,
    {
        let mut builder = LayoutBuilder::new(options);
        for (name, size, align) in fields {
            builder.push(name, size, align);
        }
        builder.finish()
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn align(&self) -> usize {
        self.align
    }

    #[inline]
    pub fn packed(&self) -> bool {
        self.options.packed
    }

    #[inline]
    pub fn byte_order(&self) -> ByteOrder {
        self.options.byte_order
    }

    #[inline]
    pub fn options(&self) -> LayoutOptions {
        self.options
    }

    pub fn slots(&self) -> &[FieldSlot] {
        &self.slots
    }

    pub fn field(&self, name: &str) -> Option<&FieldSlot> {
        self.slots.iter().find(|s| s.name == name)
    }

    /// Bytes not covered by any field
    pub fn padding(&self) -> usize {
        self.size - self.slots.iter().map(|s| s.size).sum::<usize>()
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "size={} align={} packed={} order={:?}",
            self.size, self.align, self.options.packed, self.options.byte_order
        )?;
        for slot in &self.slots {
            writeln!(f, "  +{:<4} {:<16} ({} bytes)", slot.offset, slot.name, slot.size)?;
        }
        Ok(())
    }
}

/// Incremental layout computation, one field at a time in declaration order
pub struct LayoutBuilder {
    options: LayoutOptions,
    offset: usize,
    align: usize,
    slots: Vec<FieldSlot>,
}

impl LayoutBuilder {
    pub fn new(options: LayoutOptions) -> Self {
        Self {
            options,
            offset: 0,
            align: 1,
            slots: Vec::new(),
        }
    }

    /// Place the next field and return its offset
    pub fn push(&mut self, name: impl Into<String>, size: usize, align: usize) -> usize {
        let align = align.max(1);
        if !self.options.packed {
            self.offset = align_up(self.offset, align);
        }
        let offset = self.offset;
        self.slots.push(FieldSlot {
            name: name.into(),
            offset,
            size,
            align,
        });
        self.offset += size;
        self.align = self.align.max(align);
        offset
    }

    /// Running offset, before tail padding
    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Packed structs are byte-aligned as a whole, like `#pragma pack(1)`
    pub fn finish(self) -> Layout {
        let (size, align) = if self.options.packed {
            (self.offset, 1)
        } else {
            (align_up(self.offset, self.align), self.align)
        };
        Layout {
            slots: self.slots,
            size,
            align,
            options: self.options,
        }
    }
}

/// Round `offset` up to a multiple of `align` (a power of two)
#[inline]
pub const fn align_up(offset: usize, align: usize) -> usize {
    (offset + align - 1) & !(align - 1)
}
