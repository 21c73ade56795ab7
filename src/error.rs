//! Error taxonomy shared by every component
//!
//! Declaration-time errors (annotations, field types, duplicate fields, missing
//! symbols, empty specifications) are raised while a struct type or a binder is
//! being built. The rest are local to one construction, field access or call.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("invalid type annotation for {context}: {reason}")]
    InvalidAnnotation { context: String, reason: String },

    #[error("field '{field}' of {struct_name} cannot have type {annotation}")]
    InvalidFieldType {
        struct_name: String,
        field: String,
        annotation: String,
    },

    #[error("{struct_name} defines field '{field}' more than once")]
    DuplicateFieldType { struct_name: String, field: String },

    #[error("{struct_name}() got multiple values for argument '{field}'")]
    DuplicateArgument { struct_name: String, field: String },

    #[error("{struct_name}() takes {expected} positional arguments but {given} were given")]
    TooManyArguments {
        struct_name: String,
        expected: usize,
        given: usize,
    },

    #[error("{struct_name}() got an unexpected keyword argument '{name}'")]
    UnknownArgument { struct_name: String, name: String },

    #[error("{struct_name} has no field '{field}'")]
    UnknownField { struct_name: String, field: String },

    #[error("symbol '{symbol}' not found in {library}")]
    SymbolNotFound { symbol: String, library: String },

    #[error("library specification '{library}' declares no functions")]
    EmptySpecification { library: String },

    #[error("type mismatch for {context}: expected {expected}, found {found}")]
    TypeMismatch {
        context: String,
        expected: String,
        found: String,
    },

    #[error("{function}() expects {expected} arguments, got {given}")]
    ArgumentCount {
        function: String,
        expected: usize,
        given: usize,
    },

    #[error("failed to load library '{path}': {message}")]
    LibraryLoad { path: String, message: String },

    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    pub(crate) fn invalid_annotation(context: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidAnnotation {
            context: context.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn type_mismatch(
        context: impl Into<String>,
        expected: impl ToString,
        found: impl ToString,
    ) -> Self {
        Self::TypeMismatch {
            context: context.into(),
            expected: expected.to_string(),
            found: found.to_string(),
        }
    }

    /// True for errors raised while declaring a struct type or binding a library
    pub fn is_declaration_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidAnnotation { .. }
                | Self::InvalidFieldType { .. }
                | Self::DuplicateFieldType { .. }
                | Self::SymbolNotFound { .. }
                | Self::EmptySpecification { .. }
        )
    }
}
