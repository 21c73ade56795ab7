//! Argument and return marshalling between values and native storage
//!
//! Each argument is encoded into its own aligned slot; libffi reads the slots
//! through an array of pointers. Anything a slot points at (C strings, wide
//! strings, struct buffers) is kept alive next to it for the whole call.

use super::signature::ArgKind;
use crate::descriptor::{FieldType, StructDescriptor};
use crate::error::{Error, Result};
use crate::instance::{Buffer, SharedBuffer, StructInstance};
use crate::layout::{codec, ByteOrder};
use crate::types::{NativeKind, Value, WcharT};
use core::ffi::{c_char, c_void, CStr};
use libffi::middle::Type;
use std::ffi::CString;
use std::sync::Arc;

/// Storage for any scalar, including a full `ffi_arg` return register
type ScalarSlot = [u64; 2];

/// libffi type of one argument or return value
pub(crate) fn ffi_type(kind: &ArgKind) -> Type {
    match kind {
        ArgKind::Scalar(kind) => scalar_type(*kind),
        ArgKind::StructPointer(_) => Type::pointer(),
        ArgKind::StructValue(desc) => struct_type(desc),
    }
}

fn scalar_type(kind: NativeKind) -> Type {
    match kind {
        NativeKind::Bool | NativeKind::U8 => Type::u8(),
        NativeKind::Char | NativeKind::I8 => Type::i8(),
        NativeKind::I16 => Type::i16(),
        NativeKind::U16 => Type::u16(),
        NativeKind::I32 => Type::i32(),
        NativeKind::U32 => Type::u32(),
        NativeKind::I64 => Type::i64(),
        NativeKind::U64 => Type::u64(),
        NativeKind::WChar if kind.size() == 2 => Type::u16(),
        NativeKind::WChar => Type::u32(),
        NativeKind::CLong if kind.size() == 8 => Type::i64(),
        NativeKind::CLong => Type::i32(),
        NativeKind::CULong if kind.size() == 8 => Type::u64(),
        NativeKind::CULong => Type::u32(),
        NativeKind::ISize => Type::isize(),
        NativeKind::USize => Type::usize(),
        NativeKind::F32 => Type::f32(),
        NativeKind::F64 => Type::f64(),
        NativeKind::Pointer | NativeKind::CharPtr | NativeKind::WCharPtr => Type::pointer(),
    }
}

fn struct_type(desc: &StructDescriptor) -> Type {
    Type::structure(desc.fields().iter().map(|field| match field.field_type() {
        FieldType::Scalar(kind) => scalar_type(*kind),
        FieldType::Struct(nested) => struct_type(nested),
        FieldType::StructPointer(_) => Type::pointer(),
    }))
}

/// Memory needed to receive a return value
pub(crate) fn return_layout(kind: Option<&ArgKind>) -> Result<std::alloc::Layout> {
    match kind {
        Some(ArgKind::StructValue(desc)) => {
            let scalar = std::alloc::Layout::new::<ScalarSlot>();
            std::alloc::Layout::from_size_align(
                desc.sizeof().max(scalar.size()),
                desc.align().max(scalar.align()),
            )
            .map_err(|e| {
                Error::invalid_annotation(format!("return of struct {}", desc.name()), e.to_string())
            })
        }
        _ => Ok(std::alloc::Layout::new::<ScalarSlot>()),
    }
}

/// Memory an argument slot points into; held, never read
#[allow(dead_code)]
enum KeepAlive {
    Bytes(CString),
    Wide(Vec<WcharT>),
    Struct(SharedBuffer),
}

/// One marshalled argument
pub(crate) struct ArgSlot {
    storage: Buffer,
    _keep: Option<KeepAlive>,
}

impl ArgSlot {
    /// Address handed to libffi
    #[inline]
    pub(crate) fn as_ptr(&self) -> *mut c_void {
        self.storage.as_ptr() as *mut c_void
    }

    fn scalar(kind: NativeKind, value: &Value, context: &str) -> Result<Self> {
        let mut storage = Buffer::zeroed(std::alloc::Layout::new::<ScalarSlot>());
        codec::encode(
            kind,
            ByteOrder::Native,
            value,
            &mut storage.as_mut_slice()[..kind.size()],
            context,
        )?;
        Ok(Self {
            storage,
            _keep: None,
        })
    }

    fn address(address: usize, keep: Option<KeepAlive>, context: &str) -> Result<Self> {
        let mut slot = Self::scalar(NativeKind::Pointer, &Value::Address(Some(address)), context)?;
        slot._keep = keep;
        Ok(slot)
    }
}

/// Encode one argument value for a parameter of kind `kind`
pub(crate) fn marshal(kind: &ArgKind, value: &Value, context: &str) -> Result<ArgSlot> {
    match (kind, value) {
        (ArgKind::Scalar(NativeKind::CharPtr), Value::Bytes(Some(bytes))) => {
            let owned = CString::new(bytes.clone())
                .map_err(|_| Error::type_mismatch(context, "bytes without NUL", "bytes with NUL"))?;
            let address = owned.as_ptr() as usize;
            ArgSlot::address(address, Some(KeepAlive::Bytes(owned)), context)
        }
        (ArgKind::Scalar(NativeKind::CharPtr), Value::Bytes(None)) => {
            ArgSlot::address(0, None, context)
        }
        (ArgKind::Scalar(NativeKind::WCharPtr), Value::Text(Some(text))) => {
            let wide = to_wide(text, context)?;
            let address = wide.as_ptr() as usize;
            ArgSlot::address(address, Some(KeepAlive::Wide(wide)), context)
        }
        (ArgKind::Scalar(NativeKind::WCharPtr), Value::Text(None)) => {
            ArgSlot::address(0, None, context)
        }
        (ArgKind::Scalar(NativeKind::Pointer), Value::Pointer(pointer)) => ArgSlot::address(
            pointer.address(),
            Some(KeepAlive::Struct(pointer.shared_buffer().clone())),
            context,
        ),
        (ArgKind::Scalar(kind), value) => ArgSlot::scalar(*kind, value, context),

        (ArgKind::StructPointer(desc), Value::Pointer(pointer))
            if Arc::ptr_eq(pointer.descriptor(), desc) =>
        {
            ArgSlot::address(
                pointer.address(),
                Some(KeepAlive::Struct(pointer.shared_buffer().clone())),
                context,
            )
        }
        (ArgKind::StructPointer(desc), Value::Struct(instance))
            if Arc::ptr_eq(instance.descriptor(), desc) =>
        {
            let pointer = instance.as_pointer();
            ArgSlot::address(
                pointer.address(),
                Some(KeepAlive::Struct(pointer.shared_buffer().clone())),
                context,
            )
        }
        (ArgKind::StructPointer(_), Value::Address(address)) => {
            ArgSlot::address(address.unwrap_or(0), None, context)
        }

        (ArgKind::StructValue(desc), Value::Struct(instance))
            if Arc::ptr_eq(instance.descriptor(), desc) =>
        {
            let storage = instance
                .with_bytes(|bytes| Buffer::from_bytes(desc.memory_layout(), bytes));
            Ok(ArgSlot {
                storage,
                _keep: None,
            })
        }

        (kind, value) => Err(Error::type_mismatch(context, kind, value.type_name())),
    }
}

#[cfg(windows)]
fn to_wide(text: &str, _context: &str) -> Result<Vec<WcharT>> {
    Ok(text.encode_utf16().chain(Some(0)).collect())
}

#[cfg(not(windows))]
fn to_wide(text: &str, context: &str) -> Result<Vec<WcharT>> {
    if text.contains('\0') {
        return Err(Error::type_mismatch(context, "text without NUL", "text with NUL"));
    }
    Ok(text.chars().map(|c| c as WcharT).chain(Some(0)).collect())
}

/// Decode a return value out of the receive buffer
/// Bytes holding an integral return: one `ffi_arg` register, or the full
/// value when it is wider (64-bit integers on 32-bit targets)
#[inline]
pub(crate) fn return_word_width(kind: NativeKind) -> usize {
    kind.size().max(std::mem::size_of::<usize>())
}

pub(crate) fn unmarshal(kind: &ArgKind, ret: &Buffer) -> Value {
    let bytes = ret.as_slice();
    match kind {
        ArgKind::Scalar(kind) if kind.is_float() => {
            codec::decode(*kind, ByteOrder::Native, &bytes[..kind.size()])
        }
        ArgKind::Scalar(kind) => {
            // Integral results arrive widened to a full register
            let word = codec::read_uint(ByteOrder::Native, &bytes[..return_word_width(*kind)]);
            let mut narrow = [0u8; 8];
            codec::write_uint(ByteOrder::Native, word, &mut narrow[..kind.size()]);
            let value = codec::decode(*kind, ByteOrder::Native, &narrow[..kind.size()]);
            match (kind, value) {
                (NativeKind::CharPtr, Value::Address(address)) => {
                    Value::Bytes(address.map(|a| read_c_string(a as *const c_char)))
                }
                (NativeKind::WCharPtr, Value::Address(address)) => {
                    Value::Text(address.map(|a| read_wide_string(a as *const WcharT)))
                }
                (_, value) => value,
            }
        }
        ArgKind::StructPointer(_) => {
            let word = codec::read_uint(ByteOrder::Native, &bytes[..std::mem::size_of::<usize>()]);
            match word as usize {
                0 => Value::Address(None),
                address => Value::Address(Some(address)),
            }
        }
        ArgKind::StructValue(desc) => {
            Value::Struct(StructInstance::from_raw_parts(desc, &bytes[..desc.sizeof()]))
        }
    }
}

fn read_c_string(ptr: *const c_char) -> Vec<u8> {
    unsafe { CStr::from_ptr(ptr) }.to_bytes().to_vec()
}

fn read_wide_string(ptr: *const WcharT) -> String {
    let mut units = Vec::new();
    let mut cursor = ptr;
    unsafe {
        while *cursor != 0 {
            units.push(*cursor);
            cursor = cursor.add(1);
        }
    }
    decode_wide(&units)
}

#[cfg(windows)]
fn decode_wide(units: &[WcharT]) -> String {
    String::from_utf16_lossy(units)
}

#[cfg(not(windows))]
fn decode_wide(units: &[WcharT]) -> String {
    units
        .iter()
        .map(|&u| char::from_u32(u).unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect()
}
