//! Field descriptors - one declared field resolved against the kind table

use super::StructDescriptor;
use crate::error::{Error, Result};
use crate::instance::StructInstance;
use crate::layout::{codec, ByteOrder};
use crate::types::{Annotation, NativeKind, Resolved, Value};
use std::sync::Arc;

/// Storage class of a resolved field
#[derive(Debug, Clone)]
pub enum FieldType {
    Scalar(NativeKind),
    Struct(Arc<StructDescriptor>),
    /// Address of an instance of the given struct type
    StructPointer(Arc<StructDescriptor>),
}

impl FieldType {
    pub fn size(&self) -> usize {
        match self {
            Self::Scalar(kind) => kind.size(),
            Self::Struct(desc) => desc.sizeof(),
            Self::StructPointer(_) => NativeKind::Pointer.size(),
        }
    }

    pub fn align(&self) -> usize {
        match self {
            Self::Scalar(kind) => kind.align(),
            Self::Struct(desc) => desc.align(),
            Self::StructPointer(_) => NativeKind::Pointer.align(),
        }
    }

    /// Resolve a field annotation
    ///
    /// Any failure is reported as `InvalidFieldType`: bare semantic types,
    /// mismatched pairs, `void` and string pointers have no place inside a
    /// struct buffer.
    pub(crate) fn resolve(struct_name: &str, field: &str, annotation: &Annotation) -> Result<Self> {
        let rejected = || Error::InvalidFieldType {
            struct_name: struct_name.to_string(),
            field: field.to_string(),
            annotation: annotation.to_string(),
        };

        match annotation.resolve().map_err(|_| rejected())? {
            Resolved::Scalar(_, NativeKind::CharPtr | NativeKind::WCharPtr) | Resolved::Void => {
                Err(rejected())
            }
            Resolved::Scalar(_, kind) => Ok(Self::Scalar(kind)),
            Resolved::StructPointer(desc) => Ok(Self::StructPointer(desc)),
            Resolved::Struct(desc) => Ok(Self::Struct(desc)),
        }
    }
}

/// Compiled field: name, declared annotation, storage class and default
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    pub(crate) name: String,
    pub(crate) annotation: Annotation,
    pub(crate) ty: FieldType,
    pub(crate) byte_order: ByteOrder,
    /// Default encoded in the field's own byte order
    pub(crate) default: Option<Box<[u8]>>,
}

impl FieldDescriptor {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn annotation(&self) -> &Annotation {
        &self.annotation
    }

    pub fn field_type(&self) -> &FieldType {
        &self.ty
    }

    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }

    /// Declared default, decoded back into a value
    pub fn default_value(&self) -> Option<Value> {
        let bytes = self.default.as_deref()?;
        Some(match &self.ty {
            FieldType::Scalar(kind) => codec::decode(*kind, self.byte_order, bytes),
            FieldType::StructPointer(_) => codec::decode(NativeKind::Pointer, self.byte_order, bytes),
            FieldType::Struct(desc) => {
                Value::Struct(StructInstance::from_raw_parts(desc, bytes))
            }
        })
    }

    pub(crate) fn default_bytes(&self) -> Option<&[u8]> {
        self.default.as_deref()
    }
}
