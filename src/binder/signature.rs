//! Foreign function declarations and their resolved signatures

use crate::descriptor::{FieldType, StructDescriptor};
use crate::error::{Error, Result};
use crate::types::{Annotation, NativeKind, Resolved};
use std::fmt;
use std::sync::Arc;

/// Declared foreign function: ordered parameters and an optional return
#[derive(Debug, Clone)]
pub struct FunctionDecl {
    pub name: String,
    pub params: Vec<Annotation>,
    pub returns: Option<Annotation>,
}

impl FunctionDecl {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
            returns: None,
        }
    }

    pub fn param(mut self, annotation: impl Into<Annotation>) -> Self {
        self.params.push(annotation.into());
        self
    }

    pub fn params<I, A>(mut self, annotations: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<Annotation>,
    {
        self.params.extend(annotations.into_iter().map(Into::into));
        self
    }

    pub fn returns(mut self, annotation: impl Into<Annotation>) -> Self {
        self.returns = Some(annotation.into());
        self
    }
}

/// Set of functions expected in one native library
#[derive(Debug, Clone, Default)]
pub struct LibraryDecl {
    pub name: String,
    pub functions: Vec<FunctionDecl>,
}

impl LibraryDecl {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            functions: Vec::new(),
        }
    }

    pub fn function(mut self, function: FunctionDecl) -> Self {
        self.functions.push(function);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

/// How one argument or return value crosses the boundary
#[derive(Debug, Clone)]
pub enum ArgKind {
    Scalar(NativeKind),
    StructPointer(Arc<StructDescriptor>),
    StructValue(Arc<StructDescriptor>),
}

impl fmt::Display for ArgKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar(kind) => write!(f, "{}", kind),
            Self::StructPointer(desc) => write!(f, "struct {} *", desc.name()),
            Self::StructValue(desc) => write!(f, "struct {}", desc.name()),
        }
    }
}

/// Resolved signature of a declared function
#[derive(Debug, Clone)]
pub struct Signature {
    pub params: Vec<ArgKind>,
    pub returns: Option<ArgKind>,
}

impl Signature {
    /// Resolve every parameter and the return annotation
    pub fn resolve(decl: &FunctionDecl) -> Result<Self> {
        let mut params = Vec::with_capacity(decl.params.len());
        for (position, annotation) in decl.params.iter().enumerate() {
            let context = format!("parameter {} of {}", position, decl.name);
            match arg_kind(&context, annotation)? {
                Some(kind) => params.push(kind),
                None => {
                    return Err(Error::invalid_annotation(context, "parameters cannot be void"));
                }
            }
        }

        let returns = match &decl.returns {
            Some(annotation) => arg_kind(&format!("return of {}", decl.name), annotation)?,
            None => None,
        };

        Ok(Self { params, returns })
    }

    #[inline]
    pub fn arity(&self) -> usize {
        self.params.len()
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", param)?;
        }
        f.write_str(") -> ")?;
        match &self.returns {
            Some(ret) => write!(f, "{}", ret),
            None => f.write_str("void"),
        }
    }
}

fn arg_kind(context: &str, annotation: &Annotation) -> Result<Option<ArgKind>> {
    Ok(match annotation.resolve()? {
        Resolved::Scalar(_, kind) => Some(ArgKind::Scalar(kind)),
        Resolved::StructPointer(desc) => Some(ArgKind::StructPointer(desc)),
        Resolved::Struct(desc) => {
            if !passable_by_value(&desc) {
                return Err(Error::invalid_annotation(
                    context,
                    format!(
                        "struct {} cannot be passed by value (packed or empty); pass a pointer",
                        desc.name()
                    ),
                ));
            }
            Some(ArgKind::StructValue(desc))
        }
        Resolved::Void => None,
    })
}

/// By-value structs must follow natural alignment all the way down
fn passable_by_value(desc: &StructDescriptor) -> bool {
    !desc.layout().packed()
        && desc.field_count() > 0
        && desc.fields().iter().all(|field| match field.field_type() {
            FieldType::Scalar(_) | FieldType::StructPointer(_) => true,
            FieldType::Struct(nested) => passable_by_value(nested),
        })
}
