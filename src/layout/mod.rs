//! Layout builder - offsets, padding, packing and byte order
//!
//! Design: C layout rules computed once per struct type.
//! - Unpacked: each field at the next multiple of its alignment, total size
//!   rounded up to the largest field alignment
//! - Packed: fields back to back, no padding anywhere
//! - Byte order only changes how multi-byte scalars are stored

mod builder;
pub mod codec;

pub use builder::{align_up, ByteOrder, FieldSlot, Layout, LayoutBuilder, LayoutOptions};

#[cfg(test)]
mod tests;
