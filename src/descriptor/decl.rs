//! Struct declarations - the input of the compile step

use super::StructDescriptor;
use crate::error::Result;
use crate::layout::{ByteOrder, LayoutOptions};
use crate::types::{Annotation, Value};
use std::sync::Arc;

/// One declared field
#[derive(Debug, Clone)]
pub struct FieldDecl {
    pub name: String,
    pub annotation: Annotation,
    pub default: Option<Value>,
}

impl FieldDecl {
    pub fn new(name: impl Into<String>, annotation: impl Into<Annotation>) -> Self {
        Self {
            name: name.into(),
            annotation: annotation.into(),
            default: None,
        }
    }

    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }
}

/// Declarative description of one struct type
///
/// ```ignore
/// let pair = StructDecl::new("Pair")
///     .field("a", NativeKind::U32)
///     .field("b", NativeKind::U8)
///     .packed(true)
///     .build()?;
/// assert_eq!(pair.sizeof(), 5);
/// ```
#[derive(Debug, Clone)]
pub struct StructDecl {
    pub(crate) name: String,
    pub(crate) fields: Vec<FieldDecl>,
    pub(crate) options: LayoutOptions,
    pub(crate) base: Option<Arc<StructDescriptor>>,
}

impl StructDecl {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
            options: LayoutOptions::default(),
            base: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn field(mut self, name: impl Into<String>, annotation: impl Into<Annotation>) -> Self {
        self.fields.push(FieldDecl::new(name, annotation));
        self
    }

    pub fn field_with_default(
        mut self,
        name: impl Into<String>,
        annotation: impl Into<Annotation>,
        default: impl Into<Value>,
    ) -> Self {
        self.fields
            .push(FieldDecl::new(name, annotation).with_default(default));
        self
    }

    pub fn push(&mut self, field: FieldDecl) {
        self.fields.push(field);
    }

    pub fn packed(mut self, packed: bool) -> Self {
        self.options.packed = packed;
        self
    }

    pub fn byte_order(mut self, order: ByteOrder) -> Self {
        self.options.byte_order = order;
        self
    }

    pub fn options(mut self, options: LayoutOptions) -> Self {
        self.options = options;
        self
    }

    /// Start from the fields of `base`, which come first in memory
    pub fn extends(mut self, base: &Arc<StructDescriptor>) -> Self {
        self.base = Some(Arc::clone(base));
        self
    }

    /// Compile into an immutable descriptor
    pub fn build(self) -> Result<Arc<StructDescriptor>> {
        StructDescriptor::compile(self).map(Arc::new)
    }
}
