//! Field accessors bound to offset, kind and byte order at compile time

use super::StructDescriptor;
use crate::error::{Error, Result};
use crate::layout::{codec, ByteOrder};
use crate::types::{NativeKind, Value};
use smallvec::SmallVec;
use std::ops::Range;
use std::sync::Arc;

/// Encoded bytes of one field, inline for every scalar kind
pub type FieldBytes = SmallVec<[u8; 16]>;

#[derive(Debug, Clone)]
pub enum AccessTarget {
    Scalar {
        kind: NativeKind,
        order: ByteOrder,
        /// Struct type a pointer field must point at
        pointee: Option<Arc<StructDescriptor>>,
    },
    Nested(Arc<StructDescriptor>),
}

/// Read/write plan of one field
#[derive(Debug, Clone)]
pub struct FieldAccessor {
    pub(crate) offset: usize,
    pub(crate) size: usize,
    pub(crate) target: AccessTarget,
}

impl FieldAccessor {
    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Byte range relative to the start of the owning struct
    #[inline]
    pub fn range(&self) -> Range<usize> {
        self.offset..self.offset + self.size
    }

    pub fn target(&self) -> &AccessTarget {
        &self.target
    }

    /// Nested struct descriptor, if this field holds a struct inline
    pub fn nested(&self) -> Option<&Arc<StructDescriptor>> {
        match &self.target {
            AccessTarget::Nested(desc) => Some(desc),
            AccessTarget::Scalar { .. } => None,
        }
    }

    /// Decode a scalar from the field's bytes
    #[inline]
    pub fn decode(&self, field: &[u8]) -> Option<Value> {
        match &self.target {
            AccessTarget::Scalar { kind, order, .. } => Some(codec::decode(*kind, *order, field)),
            AccessTarget::Nested(_) => None,
        }
    }

    /// Encode `value` into this field's byte image
    ///
    /// Nested structs are copied by value; the source must be an instance of
    /// the same declared type.
    pub fn encode(&self, value: &Value, context: &str) -> Result<FieldBytes> {
        match &self.target {
            AccessTarget::Scalar { kind, order, pointee } => {
                if let (Some(pointee), Value::Pointer(p)) = (pointee, value) {
                    if !Arc::ptr_eq(p.descriptor(), pointee) {
                        let found = format!("pointer to {}", p.descriptor().name());
                        let expected = format!("pointer to {}", pointee.name());
                        return Err(Error::type_mismatch(context, expected, found));
                    }
                }
                let mut bytes = FieldBytes::from_elem(0, self.size);
                codec::encode(*kind, *order, value, &mut bytes, context)?;
                Ok(bytes)
            }
            AccessTarget::Nested(desc) => match value {
                Value::Struct(src) if Arc::ptr_eq(src.descriptor(), desc) => {
                    Ok(FieldBytes::from_vec(src.to_bytes()))
                }
                other => Err(Error::type_mismatch(context, desc.name(), other.type_name())),
            },
        }
    }
}
