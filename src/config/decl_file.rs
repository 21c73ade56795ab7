//! Declaration files - struct types and library signatures in TOML
//!
//! ```toml
//! [[struct]]
//! name = "Pair"
//! byte_order = "little"
//! fields = [ { name = "a", type = "Uint32", default = 7 }, { name = "b", type = "Uint8" } ]
//!
//! [[library]]
//! name = "demo"
//! functions = [ { name = "sub_u8", params = ["Uint8", "Uint8"], returns = "Uint8" } ]
//! ```
//!
//! A type string is a table spelling, the name of a struct declared earlier
//! (in this file or through the registry), `ptr<Name>` or `void`.

use super::Settings;
use crate::binder::{ForeignLibrary, FunctionDecl, LibraryDecl};
use crate::descriptor::{registry, FieldDecl, StructDecl, StructDescriptor};
use crate::error::{Error, Result};
use crate::instance::StructInstance;
use crate::layout::ByteOrder;
use crate::types::{Annotation, NativeKind, Resolved, SemanticType, Value};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeclFile {
    #[serde(default, rename = "struct")]
    pub structs: Vec<StructEntry>,

    #[serde(default, rename = "library")]
    pub libraries: Vec<LibraryEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructEntry {
    pub name: String,

    #[serde(default)]
    pub packed: bool,

    #[serde(default)]
    pub byte_order: ByteOrder,

    #[serde(default)]
    pub extends: Option<String>,

    #[serde(default)]
    pub fields: Vec<FieldEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldEntry {
    pub name: String,

    #[serde(rename = "type")]
    pub ty: String,

    #[serde(default)]
    pub default: Option<toml::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LibraryEntry {
    pub name: String,

    /// Explicit library path; otherwise located by name
    #[serde(default)]
    pub path: Option<String>,

    #[serde(default)]
    pub functions: Vec<FunctionEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionEntry {
    pub name: String,

    #[serde(default)]
    pub params: Vec<String>,

    #[serde(default)]
    pub returns: Option<String>,
}

impl DeclFile {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read {}: {}", path.display(), e)))?;

        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| Error::Config(format!("failed to parse declarations: {}", e)))
    }

    /// Declare every struct through the registry, in file order
    pub fn declare_structs(&self) -> Result<Vec<Arc<StructDescriptor>>> {
        let mut scope = Scope::default();
        let mut declared = Vec::with_capacity(self.structs.len());

        for entry in &self.structs {
            let mut decl = StructDecl::new(&entry.name)
                .packed(entry.packed)
                .byte_order(entry.byte_order);

            if let Some(base) = &entry.extends {
                decl = decl.extends(&scope.struct_named(base, &entry.name)?);
            }

            for field in &entry.fields {
                let context = format!("{}.{}", entry.name, field.name);
                let annotation = scope.annotation(&field.ty, &context)?;
                let mut field_decl = FieldDecl::new(&field.name, annotation.clone());
                if let Some(default) = &field.default {
                    field_decl.default = Some(to_value(&annotation, default, &context)?);
                }
                decl.push(field_decl);
            }

            let descriptor = registry::declare(decl)?;
            scope.local.insert(entry.name.clone(), Arc::clone(&descriptor));
            declared.push(descriptor);
        }

        Ok(declared)
    }

    /// Function declarations of library `name`; struct types must already be
    /// declared
    pub fn library(&self, name: &str) -> Result<LibraryDecl> {
        let entry = self
            .libraries
            .iter()
            .find(|entry| entry.name == name)
            .ok_or_else(|| Error::Config(format!("no library '{}' declared", name)))?;

        let scope = Scope::default();
        let mut decl = LibraryDecl::new(&entry.name);
        for function in &entry.functions {
            let mut function_decl = FunctionDecl::new(&function.name);
            for (position, param) in function.params.iter().enumerate() {
                let context = format!("parameter {} of {}", position, function.name);
                function_decl = function_decl.param(scope.annotation(param, &context)?);
            }
            if let Some(returns) = &function.returns {
                let context = format!("return of {}", function.name);
                function_decl = function_decl.returns(scope.annotation(returns, &context)?);
            }
            decl = decl.function(function_decl);
        }

        Ok(decl)
    }

    /// Open library `name` and bind its declared functions
    ///
    /// An entry with a `path` opens exactly that file; otherwise the library
    /// is located by name through the configured search paths.
    ///
    /// # Safety
    /// See [`ForeignLibrary::open`].
    pub unsafe fn open_library(&self, name: &str, settings: &Settings) -> Result<ForeignLibrary> {
        let decl = self.library(name)?;
        let entry = self
            .libraries
            .iter()
            .find(|entry| entry.name == name)
            .ok_or_else(|| Error::Config(format!("no library '{}' declared", name)))?;

        match &entry.path {
            Some(path) => ForeignLibrary::open(path, &decl),
            None => ForeignLibrary::open_by_name(&entry.name, &settings.library.search_paths, &decl),
        }
    }

    /// Every library declaration in the file
    pub fn libraries(&self) -> Result<Vec<LibraryDecl>> {
        self.libraries.iter().map(|entry| self.library(&entry.name)).collect()
    }
}

/// Struct names visible while reading a file
#[derive(Default)]
struct Scope {
    local: HashMap<String, Arc<StructDescriptor>>,
}

impl Scope {
    fn struct_named(&self, name: &str, context: &str) -> Result<Arc<StructDescriptor>> {
        self.local
            .get(name)
            .cloned()
            .or_else(|| registry::lookup(name))
            .ok_or_else(|| Error::invalid_annotation(context, format!("unknown struct type '{}'", name)))
    }

    fn annotation(&self, spelling: &str, context: &str) -> Result<Annotation> {
        let spelling = spelling.trim();
        if spelling == "void" {
            return Ok(Annotation::Void);
        }
        if let Some(annotation) = Annotation::named(spelling) {
            return Ok(annotation);
        }
        if let Some(inner) = spelling
            .strip_prefix("ptr<")
            .and_then(|rest| rest.strip_suffix('>'))
        {
            return Ok(Annotation::pointer_to(&self.struct_named(inner.trim(), context)?));
        }
        self.struct_named(spelling, context)
            .map(|desc| Annotation::nested(&desc))
            .map_err(|_| Error::invalid_annotation(context, format!("unknown type '{}'", spelling)))
    }
}

/// Convert a TOML default into a value of the annotated type
fn to_value(annotation: &Annotation, raw: &toml::Value, context: &str) -> Result<Value> {
    let mismatch = |expected: &dyn std::fmt::Display| {
        Error::type_mismatch(context, expected, raw.type_str())
    };

    match annotation.resolve()? {
        Resolved::Scalar(semantic, kind) => match (semantic, raw) {
            (SemanticType::Bool, toml::Value::Boolean(b)) => Ok(Value::Bool(*b)),
            (SemanticType::Int, toml::Value::Integer(i)) => Ok(Value::Int(*i as i128)),
            (SemanticType::Float, toml::Value::Float(f)) => Ok(Value::Float(*f)),
            (SemanticType::Float, toml::Value::Integer(i)) => Ok(Value::Float(*i as f64)),
            (SemanticType::Bytes, toml::Value::String(s)) if kind == NativeKind::Char => {
                match s.as_bytes() {
                    [byte] => Ok(Value::Char(*byte)),
                    _ => Err(mismatch(&"single-byte string")),
                }
            }
            (SemanticType::Text, toml::Value::String(s)) if kind == NativeKind::WChar => {
                let mut chars = s.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Ok(Value::WChar(c)),
                    _ => Err(mismatch(&"single-character string")),
                }
            }
            (SemanticType::Address, toml::Value::Integer(0)) => Ok(Value::Address(None)),
            (SemanticType::Address, toml::Value::Integer(i)) if *i > 0 => {
                Ok(Value::Address(Some(*i as usize)))
            }
            _ => Err(mismatch(&semantic)),
        },
        Resolved::Struct(desc) => match raw {
            toml::Value::Table(table) => {
                let mut named = Vec::with_capacity(table.len());
                for (field, raw) in table {
                    let index = desc.field_index(field).ok_or_else(|| desc.unknown_field(field))?;
                    let nested_context = format!("{}.{}", context, field);
                    let value =
                        to_value(desc.fields()[index].annotation(), raw, &nested_context)?;
                    named.push((field.as_str(), value));
                }
                StructInstance::new(&desc, Vec::new(), named).map(Value::Struct)
            }
            _ => Err(mismatch(&format!("table for {}", desc.name()))),
        },
        Resolved::StructPointer(_) => match raw {
            toml::Value::Integer(0) => Ok(Value::Address(None)),
            _ => Err(mismatch(&"0 (null pointer)")),
        },
        Resolved::Void => Err(Error::invalid_annotation(context, "fields cannot be void")),
    }
}
