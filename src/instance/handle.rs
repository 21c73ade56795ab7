//! Struct instances - live, memory-backed values of a declared struct type
//!
//! An owned instance holds the only allocation. Reading a nested struct field
//! yields a view: a handle onto the same allocation at the field's offset.
//! Each instance keeps a weak side table of the views it has handed out, keyed
//! by field index, so repeated reads return the identical handle while any
//! copy of it is alive. The table lives and dies with the instance.

use super::buffer::Buffer;
use crate::descriptor::{FieldBytes, StructDescriptor};
use crate::error::{Error, Result};
use crate::types::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::Arc;

pub(crate) type SharedBuffer = Rc<RefCell<Buffer>>;

struct Inner {
    descriptor: Arc<StructDescriptor>,
    buffer: SharedBuffer,
    /// Start of this instance inside `buffer` (non-zero only for views)
    offset: usize,
    view: bool,
    views: RefCell<HashMap<usize, Weak<Inner>>>,
}

/// Handle to a struct instance; clones alias the same instance
#[derive(Clone)]
pub struct StructInstance {
    inner: Rc<Inner>,
}

impl StructInstance {
    fn from_buffer(descriptor: &Arc<StructDescriptor>, buffer: Buffer) -> Self {
        Self {
            inner: Rc::new(Inner {
                descriptor: Arc::clone(descriptor),
                buffer: Rc::new(RefCell::new(buffer)),
                offset: 0,
                view: false,
                views: RefCell::new(HashMap::new()),
            }),
        }
    }

    /// All bytes zero; declared defaults are not applied
    pub fn zeroed(descriptor: &Arc<StructDescriptor>) -> Self {
        Self::from_buffer(descriptor, Buffer::zeroed(descriptor.memory_layout()))
    }

    /// Construct with defaults, then positional values in declaration order,
    /// then named values
    pub fn new<I, K>(
        descriptor: &Arc<StructDescriptor>,
        positional: Vec<Value>,
        named: I,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = (K, Value)>,
        K: AsRef<str>,
    {
        let expected = descriptor.field_count();
        if positional.len() > expected {
            return Err(Error::TooManyArguments {
                struct_name: descriptor.name().to_string(),
                expected,
                given: positional.len(),
            });
        }

        let instance = Self::zeroed(descriptor);
        instance.apply_defaults();

        let mut used = vec![false; expected];
        for (index, value) in positional.into_iter().enumerate() {
            used[index] = true;
            instance.set_index(index, value)?;
        }

        for (name, value) in named {
            let name = name.as_ref();
            let index = descriptor
                .field_index(name)
                .ok_or_else(|| Error::UnknownArgument {
                    struct_name: descriptor.name().to_string(),
                    name: name.to_string(),
                })?;
            if std::mem::replace(&mut used[index], true) {
                return Err(Error::DuplicateArgument {
                    struct_name: descriptor.name().to_string(),
                    field: name.to_string(),
                });
            }
            instance.set_index(index, value)?;
        }

        Ok(instance)
    }

    /// Construct from positional values only
    pub fn with_values(descriptor: &Arc<StructDescriptor>, positional: Vec<Value>) -> Result<Self> {
        Self::new(descriptor, positional, std::iter::empty::<(&str, Value)>())
    }

    /// Construct with defaults applied and no explicit values
    pub fn with_defaults(descriptor: &Arc<StructDescriptor>) -> Self {
        let instance = Self::zeroed(descriptor);
        instance.apply_defaults();
        instance
    }

    /// Owned instance holding a copy of `bytes`
    pub fn from_bytes(descriptor: &Arc<StructDescriptor>, bytes: &[u8]) -> Result<Self> {
        if bytes.len() != descriptor.sizeof() {
            return Err(Error::type_mismatch(
                format!("bytes of {}", descriptor.name()),
                format!("{} bytes", descriptor.sizeof()),
                format!("{} bytes", bytes.len()),
            ));
        }
        Ok(Self::from_raw_parts(descriptor, bytes))
    }

    /// `bytes.len()` must equal the struct size
    pub(crate) fn from_raw_parts(descriptor: &Arc<StructDescriptor>, bytes: &[u8]) -> Self {
        Self::from_buffer(
            descriptor,
            Buffer::from_bytes(descriptor.memory_layout(), bytes),
        )
    }

    fn apply_defaults(&self) {
        let mut buffer = self.inner.buffer.borrow_mut();
        let bytes = buffer.as_mut_slice();
        for (index, field) in self.inner.descriptor.fields().iter().enumerate() {
            if let Some(default) = field.default_bytes() {
                let range = self.absolute(index);
                bytes[range].copy_from_slice(default);
            }
        }
    }

    #[inline]
    pub fn descriptor(&self) -> &Arc<StructDescriptor> {
        &self.inner.descriptor
    }

    /// True if this handle is a view into an enclosing instance
    #[inline]
    pub fn is_view(&self) -> bool {
        self.inner.view
    }

    /// Handle identity
    #[inline]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Absolute byte range of field `index` inside the shared buffer
    #[inline]
    fn absolute(&self, index: usize) -> std::ops::Range<usize> {
        let range = self.inner.descriptor.accessor(index).range();
        range.start + self.inner.offset..range.end + self.inner.offset
    }

    fn index_of(&self, field: &str) -> Result<usize> {
        self.inner
            .descriptor
            .field_index(field)
            .ok_or_else(|| self.inner.descriptor.unknown_field(field))
    }

    /// Read a field; nested structs come back as live views
    pub fn get(&self, field: &str) -> Result<Value> {
        let index = self.index_of(field)?;
        Ok(self.get_index(index))
    }

    /// Read the field at declaration position `index`
    ///
    /// Panics if `index` is out of range.
    pub fn get_index(&self, index: usize) -> Value {
        let accessor = self.inner.descriptor.accessor(index);
        if let Some(nested) = accessor.nested() {
            return Value::Struct(self.view(index, nested));
        }

        let buffer = self.inner.buffer.borrow();
        let field = &buffer.as_slice()[self.absolute(index)];
        accessor.decode(field).unwrap_or(Value::Address(None))
    }

    fn view(&self, index: usize, nested: &Arc<StructDescriptor>) -> StructInstance {
        let mut views = self.inner.views.borrow_mut();
        if let Some(inner) = views.get(&index).and_then(Weak::upgrade) {
            return StructInstance { inner };
        }

        let inner = Rc::new(Inner {
            descriptor: Arc::clone(nested),
            buffer: Rc::clone(&self.inner.buffer),
            offset: self.absolute(index).start,
            view: true,
            views: RefCell::new(HashMap::new()),
        });
        views.insert(index, Rc::downgrade(&inner));
        StructInstance { inner }
    }

    /// Write a field; integers are truncated to the field width, nested
    /// structs are copied in by value
    pub fn set(&self, field: &str, value: impl Into<Value>) -> Result<()> {
        let index = self.index_of(field)?;
        self.set_index(index, value.into())
    }

    /// Write the field at declaration position `index`
    pub fn set_index(&self, index: usize, value: Value) -> Result<()> {
        let descriptor = &self.inner.descriptor;
        let field = &descriptor.fields()[index];
        let context = format!("{}.{}", descriptor.name(), field.name());
        // Encode before borrowing: the source may alias this buffer.
        let encoded: FieldBytes = descriptor.accessor(index).encode(&value, &context)?;

        let mut buffer = self.inner.buffer.borrow_mut();
        buffer.as_mut_slice()[self.absolute(index)].copy_from_slice(&encoded);
        Ok(())
    }

    /// True iff same declared type and byte-identical contents
    pub fn equals(&self, other: &StructInstance) -> bool {
        Arc::ptr_eq(self.descriptor(), other.descriptor()) && self.to_bytes() == other.to_bytes()
    }

    /// Copy of this instance's bytes
    pub fn to_bytes(&self) -> Vec<u8> {
        self.with_bytes(|bytes| bytes.to_vec())
    }

    /// Borrow this instance's bytes
    pub fn with_bytes<R>(&self, f: impl FnOnce(&[u8]) -> R) -> R {
        let buffer = self.inner.buffer.borrow();
        let start = self.inner.offset;
        f(&buffer.as_slice()[start..start + self.inner.descriptor.sizeof()])
    }

    /// Independent owned copy
    pub fn duplicate(&self) -> StructInstance {
        self.with_bytes(|bytes| Self::from_raw_parts(&self.inner.descriptor, bytes))
    }

    /// Reference suitable for a pointer-to-struct parameter; aliases this
    /// instance's memory
    pub fn as_pointer(&self) -> StructPointer {
        StructPointer {
            descriptor: Arc::clone(&self.inner.descriptor),
            buffer: Rc::clone(&self.inner.buffer),
            offset: self.inner.offset,
        }
    }

    /// Field names paired with their current values
    pub fn values(&self) -> Vec<(String, Value)> {
        let descriptor = &self.inner.descriptor;
        descriptor
            .field_names()
            .enumerate()
            .map(|(index, name)| (name.to_string(), self.get_index(index)))
            .collect()
    }
}

impl PartialEq for StructInstance {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other)
    }
}

impl fmt::Display for StructInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.inner.descriptor.name())?;
        for (i, (name, value)) in self.values().iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}={}", name, value)?;
        }
        f.write_str(")")
    }
}

impl fmt::Debug for StructInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StructInstance")
            .field("type", &self.inner.descriptor.name())
            .field("view", &self.inner.view)
            .field("bytes", &self.to_bytes())
            .finish()
    }
}

/// Aliasing reference to a struct instance's memory
///
/// Keeps the underlying allocation alive; never copies.
#[derive(Clone)]
pub struct StructPointer {
    descriptor: Arc<StructDescriptor>,
    buffer: SharedBuffer,
    offset: usize,
}

impl StructPointer {
    pub fn descriptor(&self) -> &Arc<StructDescriptor> {
        &self.descriptor
    }

    /// Address of the first byte of the struct
    pub fn address(&self) -> usize {
        self.as_mut_ptr() as usize
    }

    pub fn as_mut_ptr(&self) -> *mut u8 {
        let base = self.buffer.borrow().as_ptr();
        base.wrapping_add(self.offset)
    }

    pub(crate) fn shared_buffer(&self) -> &SharedBuffer {
        &self.buffer
    }
}

impl PartialEq for StructPointer {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.descriptor, &other.descriptor) && self.address() == other.address()
    }
}

impl fmt::Debug for StructPointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StructPointer")
            .field("type", &self.descriptor.name())
            .field("address", &format_args!("{:#x}", self.address()))
            .finish()
    }
}
