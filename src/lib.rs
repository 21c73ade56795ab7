//! typed-ffi - typed bindings to native C structs and functions
//!
//! Struct types are declared once from annotated fields, compiled into a
//! descriptor (layout, accessors, defaults) and instantiated as mutable,
//! memory-backed values that native code can read through a pointer.
//! Library bindings resolve declared function signatures against a shared
//! library up front and marshal values across every call.
//!
//! ```ignore
//! use typed_ffi::{NativeKind, StructDecl, StructInstance};
//!
//! let pair = StructDecl::new("Pair")
//!     .field("a", NativeKind::U32)
//!     .field("b", NativeKind::U8)
//!     .build()?;
//! let p = StructInstance::zeroed(&pair);
//! p.set("b", 5678)?;
//! assert_eq!(p.get("b")?, 46.into());
//! ```

// Core modules
pub mod error;
pub mod types;
pub mod layout;
pub mod descriptor;
pub mod instance;
pub mod binder;
pub mod config;
pub mod logging;

// Re-export commonly used items
pub use error::{Error, Result};
pub use types::{Annotation, NativeKind, SemanticType, Value};
pub use layout::{ByteOrder, Layout, LayoutOptions};
pub use descriptor::{registry, FieldDecl, FieldDescriptor, StructDecl, StructDescriptor};
pub use instance::{StructInstance, StructPointer};
pub use binder::{
    BoundFunction, ForeignLibrary, FunctionDecl, LibraryDecl, NativeLibrary, SymbolSource,
    SymbolTable,
};
pub use config::{DeclFile, Settings};

/// Initialize logging from `TYPED_FFI_LOG_*` environment variables
pub fn init() {
    logging::init();
}
