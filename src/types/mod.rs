//! Type mapping table - semantic types, native kinds and annotations
//!
//! Architecture:
//! - `kind.rs` - native kinds with platform sizes and alignments
//! - `table.rs` - static spelling table (`Uint8`, `Long`, `CharPointer`, ...)
//! - `annotation.rs` - declared annotations and their resolution
//! - `value.rs` - semantic values crossing the native boundary

mod annotation;
mod kind;
mod table;
mod value;

pub use annotation::{Annotation, Resolved};
pub use kind::{NativeKind, SemanticType, WcharT};
pub use table::{by_name, name_of, names};
pub use value::Value;
