//! Configuration - runtime settings and declarative type files
//!
//! Architecture:
//! - `settings.rs` - `typed-ffi.toml`: logging and library search paths
//! - `decl_file.rs` - struct and library declarations written in TOML

mod decl_file;
mod settings;

pub use decl_file::{DeclFile, FieldEntry, FunctionEntry, LibraryEntry, StructEntry};
pub use settings::{LibrarySettings, LoggingSettings, Settings, SETTINGS_FILE};
