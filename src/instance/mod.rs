//! Struct instances - mutable buffers conforming to a struct descriptor
//!
//! Single-threaded by construction: handles are `Rc`-based and therefore
//! neither `Send` nor `Sync`. Share across threads by copying bytes out.

mod buffer;
mod handle;

pub use buffer::Buffer;
pub use handle::{StructInstance, StructPointer};
pub(crate) use handle::SharedBuffer;
