//! Type annotations and their resolution against the kind table

use super::kind::{NativeKind, SemanticType};
use super::table;
use crate::descriptor::StructDescriptor;
use crate::error::{Error, Result};
use std::fmt;
use std::sync::Arc;

/// Declared type of a struct field, parameter or return value
#[derive(Debug, Clone)]
pub enum Annotation {
    /// Semantic type paired with its native representation
    Scalar {
        semantic: SemanticType,
        kind: NativeKind,
    },
    /// Semantic type with no native representation attached
    Bare(SemanticType),
    /// Nested struct, stored inline
    Struct(Arc<StructDescriptor>),
    /// Pointer to a struct, stored as an address
    StructPointer(Arc<StructDescriptor>),
    /// No value
    Void,
}

/// Outcome of resolving an annotation
#[derive(Debug, Clone)]
pub enum Resolved {
    Scalar(SemanticType, NativeKind),
    Struct(Arc<StructDescriptor>),
    StructPointer(Arc<StructDescriptor>),
    Void,
}

impl Annotation {
    /// Scalar annotation carrying the kind's own semantic type
    pub const fn of(kind: NativeKind) -> Self {
        Self::Scalar {
            semantic: kind.semantic(),
            kind,
        }
    }

    /// Annotation for a table spelling such as `Uint8` or `CharPointer`
    pub fn named(name: &str) -> Option<Self> {
        table::by_name(name).map(|(semantic, kind)| Self::Scalar { semantic, kind })
    }

    pub fn nested(descriptor: &Arc<StructDescriptor>) -> Self {
        Self::Struct(Arc::clone(descriptor))
    }

    pub fn pointer_to(descriptor: &Arc<StructDescriptor>) -> Self {
        Self::StructPointer(Arc::clone(descriptor))
    }

    /// Resolve against the kind table
    ///
    /// Fails with `InvalidAnnotation` for bare semantic types and for scalar
    /// pairs whose semantic type does not match the native kind.
    pub fn resolve(&self) -> Result<Resolved> {
        match self {
            Self::Scalar { semantic, kind } => {
                if kind.semantic() != *semantic {
                    return Err(Error::invalid_annotation(
                        self.to_string(),
                        format!("{} values cannot be stored as {}", semantic, kind),
                    ));
                }
                Ok(Resolved::Scalar(*semantic, *kind))
            }
            Self::Bare(semantic) => Err(Error::invalid_annotation(
                self.to_string(),
                format!("{} must be annotated with a native kind", semantic),
            )),
            Self::Struct(desc) => Ok(Resolved::Struct(Arc::clone(desc))),
            Self::StructPointer(desc) => Ok(Resolved::StructPointer(Arc::clone(desc))),
            Self::Void => Ok(Resolved::Void),
        }
    }
}

impl From<NativeKind> for Annotation {
    fn from(kind: NativeKind) -> Self {
        Self::of(kind)
    }
}

impl fmt::Display for Annotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar { semantic, kind } if kind.semantic() == *semantic => {
                f.write_str(table::name_of(*kind))
            }
            Self::Scalar { semantic, kind } => write!(f, "{}[{}]", semantic, kind),
            Self::Bare(semantic) => write!(f, "{}", semantic),
            Self::Struct(desc) => f.write_str(desc.name()),
            Self::StructPointer(desc) => write!(f, "ptr<{}>", desc.name()),
            Self::Void => f.write_str("void"),
        }
    }
}

impl Resolved {
    /// Native kind for scalars and struct pointers
    pub fn native_kind(&self) -> Option<NativeKind> {
        match self {
            Self::Scalar(_, kind) => Some(*kind),
            Self::StructPointer(_) => Some(NativeKind::Pointer),
            Self::Struct(_) | Self::Void => None,
        }
    }
}
