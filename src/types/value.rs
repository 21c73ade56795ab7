//! Semantic values read from and written to native memory

use super::kind::SemanticType;
use crate::instance::{StructInstance, StructPointer};
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    /// Any integer kind; wide enough for both `int64_t` and `uint64_t`
    Int(i128),
    Float(f64),
    /// Single C `char`
    Char(u8),
    /// Single `wchar_t`
    WChar(char),
    /// Raw address, `None` for null
    Address(Option<usize>),
    /// `char *` argument or result
    Bytes(Option<Vec<u8>>),
    /// `wchar_t *` argument or result
    Text(Option<String>),
    Struct(StructInstance),
    Pointer(StructPointer),
}

impl Value {
    /// Semantic category, `None` for struct values
    pub fn semantic(&self) -> Option<SemanticType> {
        match self {
            Self::Bool(_) => Some(SemanticType::Bool),
            Self::Int(_) => Some(SemanticType::Int),
            Self::Float(_) => Some(SemanticType::Float),
            Self::Char(_) | Self::Bytes(_) => Some(SemanticType::Bytes),
            Self::WChar(_) | Self::Text(_) => Some(SemanticType::Text),
            Self::Address(_) | Self::Pointer(_) => Some(SemanticType::Address),
            Self::Struct(_) => None,
        }
    }

    /// Short description for mismatch errors
    pub fn type_name(&self) -> String {
        match self {
            Self::Struct(s) => s.descriptor().name().to_string(),
            Self::Pointer(p) => format!("ptr<{}>", p.descriptor().name()),
            Self::Char(_) => "char".to_string(),
            Self::WChar(_) => "wchar".to_string(),
            other => other
                .semantic()
                .map(|s| s.to_string())
                .unwrap_or_default(),
        }
    }

    pub fn as_int(&self) -> Option<i128> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_struct(&self) -> Option<&StructInstance> {
        match self {
            Self::Struct(s) => Some(s),
            _ => None,
        }
    }

    pub fn into_struct(self) -> Option<StructInstance> {
        match self {
            Self::Struct(s) => Some(s),
            _ => None,
        }
    }

    pub fn null() -> Self {
        Self::Address(None)
    }

    pub fn bytes(data: impl Into<Vec<u8>>) -> Self {
        Self::Bytes(Some(data.into()))
    }

    pub fn text(data: impl Into<String>) -> Self {
        Self::Text(Some(data.into()))
    }
}

macro_rules! int_from {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Self::Int(v as i128)
                }
            }
        )*
    };
}

int_from!(i8, i16, i32, i64, u8, u16, u32, u64, isize, usize, i128);

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Self::Float(v as f64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<char> for Value {
    fn from(v: char) -> Self {
        Self::WChar(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Text(Some(v.to_string()))
    }
}

impl From<StructInstance> for Value {
    fn from(v: StructInstance) -> Self {
        Self::Struct(v)
    }
}

impl From<StructPointer> for Value {
    fn from(v: StructPointer) -> Self {
        Self::Pointer(v)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{}", v),
            Self::Int(v) => write!(f, "{}", v),
            Self::Float(v) => write!(f, "{:?}", v),
            Self::Char(v) => write!(f, "b'{}'", (*v as char).escape_default()),
            Self::WChar(v) => write!(f, "'{}'", v.escape_default()),
            Self::Address(Some(a)) => write!(f, "{:#x}", a),
            Self::Address(None) | Self::Bytes(None) | Self::Text(None) => f.write_str("None"),
            Self::Bytes(Some(b)) => write!(f, "b\"{}\"", b.escape_ascii()),
            Self::Text(Some(s)) => write!(f, "{:?}", s),
            Self::Struct(s) => write!(f, "{}", s),
            Self::Pointer(p) => write!(f, "<ptr {} at {:#x}>", p.descriptor().name(), p.address()),
        }
    }
}
