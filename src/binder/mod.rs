//! Foreign signature binder - declared functions bound to native symbols
//!
//! Architecture:
//! - `library.rs` - symbol sources (`NativeLibrary` via libloading, `SymbolTable`)
//! - `signature.rs` - function declarations and their resolved signatures
//! - `marshal.rs` - per-argument storage and return decoding
//! - `call.rs` - prepared libffi call interfaces
//!
//! Binding is all-or-nothing: every declared symbol must resolve or no
//! library object is produced.

mod call;
mod library;
mod marshal;
mod signature;

pub use call::BoundFunction;
pub use library::{NativeLibrary, SymbolSource, SymbolTable};
pub use signature::{ArgKind, FunctionDecl, LibraryDecl, Signature};

use crate::error::{Error, Result};
use crate::types::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::info;

/// Library whose declared functions are all bound and callable
pub struct ForeignLibrary {
    name: String,
    // Declared before `source` so functions drop before the library unloads.
    functions: BTreeMap<String, BoundFunction>,
    source: Box<dyn SymbolSource>,
}

impl ForeignLibrary {
    /// Bind every function of `decl` against `source`
    ///
    /// # Safety
    /// Each resolved symbol must be a C-ABI function matching its declared
    /// signature.
    pub unsafe fn bind(source: Box<dyn SymbolSource>, decl: &LibraryDecl) -> Result<Self> {
        if decl.is_empty() {
            return Err(Error::EmptySpecification {
                library: decl.name.clone(),
            });
        }

        let _span = crate::traced_scope!("bind_library");
        let mut functions = BTreeMap::new();
        for function in &decl.functions {
            if functions.contains_key(&function.name) {
                return Err(Error::invalid_annotation(
                    format!("library {}", decl.name),
                    format!("function '{}' declared more than once", function.name),
                ));
            }
            let bound = BoundFunction::bind(function, source.as_ref())?;
            functions.insert(function.name.clone(), bound);
        }

        info!(
            library = %decl.name,
            origin = source.origin(),
            functions = functions.len(),
            "library bound"
        );
        Ok(Self {
            name: decl.name.clone(),
            functions,
            source,
        })
    }

    /// Open the shared library at `path` and bind `decl` against it
    ///
    /// # Safety
    /// See [`NativeLibrary::open`] and [`ForeignLibrary::bind`].
    pub unsafe fn open(path: impl AsRef<Path>, decl: &LibraryDecl) -> Result<Self> {
        let library = NativeLibrary::open(path)?;
        Self::bind(Box::new(library), decl)
    }

    /// Locate a library by base name and bind `decl` against it
    ///
    /// # Safety
    /// See [`NativeLibrary::open`] and [`ForeignLibrary::bind`].
    pub unsafe fn open_by_name(
        name: &str,
        search_paths: &[PathBuf],
        decl: &LibraryDecl,
    ) -> Result<Self> {
        let library = NativeLibrary::open_by_name(name, search_paths)?;
        Self::bind(Box::new(library), decl)
    }

    /// Call a bound function by name
    pub fn call(&self, function: &str, args: &[Value]) -> Result<Option<Value>> {
        self.function(function)
            .ok_or_else(|| Error::SymbolNotFound {
                symbol: function.to_string(),
                library: self.name.clone(),
            })?
            .call(args)
    }

    pub fn function(&self, name: &str) -> Option<&BoundFunction> {
        self.functions.get(name)
    }

    /// Bound function names, sorted
    pub fn function_names(&self) -> impl Iterator<Item = &str> {
        self.functions.keys().map(String::as_str)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Where the symbols came from (a path, a table name)
    pub fn origin(&self) -> &str {
        self.source.origin()
    }
}

impl std::fmt::Debug for ForeignLibrary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ForeignLibrary")
            .field("name", &self.name)
            .field("origin", &self.origin())
            .field("functions", &self.functions.keys().collect::<Vec<_>>())
            .finish()
    }
}
