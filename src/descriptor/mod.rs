//! Struct descriptors - compiled, immutable blueprints of declared struct types
//!
//! Architecture:
//! - `decl.rs` - declarative input (`StructDecl`, `FieldDecl`)
//! - `field.rs` - per-field resolution against the kind table
//! - `accessor.rs` - per-field read/write plans bound at compile time
//! - `registry.rs` - process-wide cache of declared types by name

mod accessor;
mod decl;
mod field;
pub mod registry;

pub use accessor::{AccessTarget, FieldAccessor, FieldBytes};
pub use decl::{FieldDecl, StructDecl};
pub use field::{FieldDescriptor, FieldType};

use crate::error::{Error, Result};
use crate::layout::{Layout, LayoutBuilder};
use crate::logging::log_struct_compiled;
use crate::types::NativeKind;
use std::collections::HashMap;
use std::fmt;

/// Compiled struct type: layout, fields, defaults and accessors
#[derive(Debug)]
pub struct StructDescriptor {
    name: String,
    base: Option<String>,
    layout: Layout,
    fields: Vec<FieldDescriptor>,
    accessors: Vec<FieldAccessor>,
    index: HashMap<String, usize>,
    memory: std::alloc::Layout,
}

impl StructDescriptor {
    /// Compile step: resolve fields, lay them out, bind accessors, encode defaults
    pub(crate) fn compile(decl: StructDecl) -> Result<Self> {
        let StructDecl {
            name,
            fields: own_fields,
            options,
            base,
        } = decl;

        // Inherited fields come first; their defaults are re-encoded below in
        // case the extension uses a different byte order.
        let mut pending: Vec<FieldDecl> = Vec::new();
        if let Some(base) = &base {
            for field in &base.fields {
                pending.push(FieldDecl {
                    name: field.name.clone(),
                    annotation: field.annotation.clone(),
                    default: field.default_value(),
                });
            }
        }
        pending.extend(own_fields);

        let mut index = HashMap::with_capacity(pending.len());
        let mut builder = LayoutBuilder::new(options);
        let mut fields = Vec::with_capacity(pending.len());
        let mut accessors = Vec::with_capacity(pending.len());

        for (i, decl) in pending.iter().enumerate() {
            if index.insert(decl.name.clone(), i).is_some() {
                return Err(Error::DuplicateFieldType {
                    struct_name: name.clone(),
                    field: decl.name.clone(),
                });
            }

            let ty = FieldType::resolve(&name, &decl.name, &decl.annotation)?;
            let offset = builder.push(decl.name.clone(), ty.size(), ty.align());
            let target = match &ty {
                FieldType::Scalar(kind) => AccessTarget::Scalar {
                    kind: *kind,
                    order: options.byte_order,
                    pointee: None,
                },
                FieldType::StructPointer(desc) => AccessTarget::Scalar {
                    kind: NativeKind::Pointer,
                    order: options.byte_order,
                    pointee: Some(desc.clone()),
                },
                FieldType::Struct(desc) => AccessTarget::Nested(desc.clone()),
            };
            let accessor = FieldAccessor {
                offset,
                size: ty.size(),
                target,
            };

            let default = match &decl.default {
                Some(value) => {
                    let context = format!("default of {}.{}", name, decl.name);
                    Some(accessor.encode(value, &context)?.into_vec().into_boxed_slice())
                }
                None => None,
            };

            fields.push(FieldDescriptor {
                name: decl.name.clone(),
                annotation: decl.annotation.clone(),
                ty,
                byte_order: options.byte_order,
                default,
            });
            accessors.push(accessor);
        }

        let layout = builder.finish();
        let memory = std::alloc::Layout::from_size_align(layout.size(), layout.align())
            .map_err(|e| Error::invalid_annotation(name.clone(), e.to_string()))?;

        log_struct_compiled(&name, layout.size(), layout.align(), fields.len());

        Ok(Self {
            name,
            base: base.map(|b| b.name.clone()),
            layout,
            fields,
            accessors,
            index,
            memory,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name of the extended struct type, if any
    pub fn base_name(&self) -> Option<&str> {
        self.base.as_deref()
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Size in bytes, equivalent to C `sizeof`
    #[inline]
    pub fn sizeof(&self) -> usize {
        self.layout.size()
    }

    #[inline]
    pub fn align(&self) -> usize {
        self.layout.align()
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.field_index(name).map(|i| &self.fields[i])
    }

    #[inline]
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    #[inline]
    pub fn accessor(&self, index: usize) -> &FieldAccessor {
        &self.accessors[index]
    }

    pub(crate) fn memory_layout(&self) -> std::alloc::Layout {
        self.memory
    }

    pub(crate) fn unknown_field(&self, field: &str) -> Error {
        Error::UnknownField {
            struct_name: self.name.clone(),
            field: field.to_string(),
        }
    }
}

impl fmt::Display for StructDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "struct {}", self.name)?;
        if let Some(base) = &self.base {
            write!(f, " : {}", base)?;
        }
        writeln!(f, " {{")?;
        for (field, slot) in self.fields.iter().zip(self.layout.slots()) {
            writeln!(f, "    {}: {} @ {}", field.name, field.annotation, slot.offset)?;
        }
        write!(f, "}}")
    }
}
