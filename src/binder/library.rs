//! Native library loading and symbol resolution

use crate::error::{Error, Result};
use crate::logging::log_library_loaded;
use core::ffi::c_void;
use libloading::Library;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Anything that can turn a symbol name into a code address
pub trait SymbolSource: Send + Sync {
    /// Address of `symbol`, or `None` if it is not exported
    fn resolve(&self, symbol: &str) -> Option<*const c_void>;

    /// Human-readable origin for diagnostics (a path, a table name)
    fn origin(&self) -> &str;
}

/// Shared library opened from disk
pub struct NativeLibrary {
    library: Library,
    path: String,
}

impl NativeLibrary {
    /// Open the library at `path`
    ///
    /// # Safety
    /// Opening a library runs its initialisers; the library must be sound to
    /// load into this process.
    pub unsafe fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let library = Library::new(path).map_err(|e| Error::LibraryLoad {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        let path = path.display().to_string();
        log_library_loaded(&path);
        Ok(Self { library, path })
    }

    /// Open a library by base name, trying each search path in order and
    /// then the system loader
    ///
    /// # Safety
    /// See [`NativeLibrary::open`].
    pub unsafe fn open_by_name(name: &str, search_paths: &[PathBuf]) -> Result<Self> {
        let file_name = Self::platform_lib_name(name);

        for dir in search_paths {
            let candidate = dir.join(&file_name);
            if candidate.exists() {
                return Self::open(candidate);
            }
        }

        Self::open(&file_name)
    }

    /// Platform-specific file name for a library base name
    pub fn platform_lib_name(name: &str) -> String {
        #[cfg(target_os = "windows")]
        {
            format!("{}.dll", name)
        }
        #[cfg(target_os = "macos")]
        {
            format!("lib{}.dylib", name)
        }
        #[cfg(not(any(target_os = "windows", target_os = "macos")))]
        {
            format!("lib{}.so", name)
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

impl SymbolSource for NativeLibrary {
    fn resolve(&self, symbol: &str) -> Option<*const c_void> {
        let function = unsafe { self.library.get::<unsafe extern "C" fn()>(symbol.as_bytes()) }.ok()?;
        Some(*function as *const c_void)
    }

    fn origin(&self) -> &str {
        &self.path
    }
}

/// In-process symbol table, for host functions exposed under C names
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    name: String,
    entries: HashMap<String, usize>,
}

impl SymbolTable {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: HashMap::new(),
        }
    }

    /// Register `address` under `symbol`
    pub fn insert(&mut self, symbol: impl Into<String>, address: *const c_void) {
        self.entries.insert(symbol.into(), address as usize);
    }

    pub fn with(mut self, symbol: impl Into<String>, address: *const c_void) -> Self {
        self.insert(symbol, address);
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl SymbolSource for SymbolTable {
    fn resolve(&self, symbol: &str) -> Option<*const c_void> {
        self.entries.get(symbol).map(|&address| address as *const c_void)
    }

    fn origin(&self) -> &str {
        &self.name
    }
}
