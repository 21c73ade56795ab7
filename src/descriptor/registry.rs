//! Process-wide cache of declared struct types
//!
//! A struct type is compiled exactly once: the first `declare` for a name
//! builds and stores the descriptor, later calls for that name return the
//! cached one untouched.

use super::{StructDecl, StructDescriptor};
use crate::error::Result;
use dashmap::DashMap;
use once_cell::sync::Lazy;
use std::sync::Arc;
use tracing::debug;

static REGISTRY: Lazy<DashMap<String, Arc<StructDescriptor>>> = Lazy::new(DashMap::new);

/// Compile and register `decl`, or return the descriptor already declared
/// under its name
pub fn declare(decl: StructDecl) -> Result<Arc<StructDescriptor>> {
    if let Some(existing) = lookup(decl.name()) {
        debug!(target: "typed_ffi::descriptor", name = decl.name(), "struct type already declared");
        return Ok(existing);
    }

    let descriptor = decl.build()?;
    let entry = REGISTRY
        .entry(descriptor.name().to_string())
        .or_insert(descriptor);
    Ok(Arc::clone(entry.value()))
}

/// Find a declared struct type by name
pub fn lookup(name: &str) -> Option<Arc<StructDescriptor>> {
    REGISTRY.get(name).map(|entry| Arc::clone(entry.value()))
}

pub fn is_declared(name: &str) -> bool {
    REGISTRY.contains_key(name)
}

/// Names of all declared struct types, sorted
pub fn declared() -> Vec<String> {
    let mut names: Vec<String> = REGISTRY.iter().map(|e| e.key().clone()).collect();
    names.sort();
    names
}
