//! Scalar codec - semantic values to and from native bytes
//!
//! Every function works on the field's own byte range; callers slice the
//! struct buffer first so a scalar can never touch a neighbour.

use super::builder::ByteOrder;
use crate::error::{Error, Result};
use crate::types::{NativeKind, Value};

/// Write the low `dst.len()` bytes of `raw` in the given order
#[inline]
pub fn write_uint(order: ByteOrder, raw: u64, dst: &mut [u8]) {
    let n = dst.len();
    debug_assert!(n <= 8);
    if order.is_little() {
        dst.copy_from_slice(&raw.to_le_bytes()[..n]);
    } else {
        dst.copy_from_slice(&raw.to_be_bytes()[8 - n..]);
    }
}

/// Read `src.len()` bytes as an unsigned integer in the given order
#[inline]
pub fn read_uint(order: ByteOrder, src: &[u8]) -> u64 {
    let n = src.len();
    debug_assert!(n <= 8);
    let mut wide = [0u8; 8];
    if order.is_little() {
        wide[..n].copy_from_slice(src);
        u64::from_le_bytes(wide)
    } else {
        wide[8 - n..].copy_from_slice(src);
        u64::from_be_bytes(wide)
    }
}

/// Reduce `value` to the range of an integral kind: modulo `2^w`, then
/// sign-extended for signed kinds
pub fn truncate(kind: NativeKind, value: i128) -> i128 {
    let bits = kind.bits();
    let raw = (value as u128) & mask(bits);
    if kind.is_signed() && raw >> (bits - 1) & 1 == 1 {
        (raw | !mask(bits)) as i128
    } else {
        raw as i128
    }
}

#[inline]
fn mask(bits: u32) -> u128 {
    if bits >= 128 {
        u128::MAX
    } else {
        (1u128 << bits) - 1
    }
}

/// Encode `value` into `dst`, which must be exactly `kind.size()` bytes
pub fn encode(
    kind: NativeKind,
    order: ByteOrder,
    value: &Value,
    dst: &mut [u8],
    context: &str,
) -> Result<()> {
    debug_assert_eq!(dst.len(), kind.size());
    let mismatch = || Error::type_mismatch(context, kind.semantic(), value.type_name());

    match kind {
        NativeKind::Bool => match value {
            Value::Bool(b) => dst[0] = *b as u8,
            _ => return Err(mismatch()),
        },
        NativeKind::Char => match value {
            Value::Char(c) => dst[0] = *c,
            Value::Bytes(Some(b)) if b.len() == 1 => dst[0] = b[0],
            _ => return Err(mismatch()),
        },
        NativeKind::WChar => match value {
            Value::WChar(c) => {
                let code = *c as u32;
                if kind.size() < 4 && code > u16::MAX as u32 {
                    return Err(Error::type_mismatch(context, "BMP character", value));
                }
                write_uint(order, code as u64, dst);
            }
            _ => return Err(mismatch()),
        },
        NativeKind::F32 => match value {
            Value::Float(f) => write_uint(order, (*f as f32).to_bits() as u64, dst),
            Value::Int(i) => write_uint(order, (*i as f32).to_bits() as u64, dst),
            _ => return Err(mismatch()),
        },
        NativeKind::F64 => match value {
            Value::Float(f) => write_uint(order, f.to_bits(), dst),
            Value::Int(i) => write_uint(order, (*i as f64).to_bits(), dst),
            _ => return Err(mismatch()),
        },
        NativeKind::Pointer | NativeKind::CharPtr | NativeKind::WCharPtr => match value {
            Value::Address(addr) => write_uint(order, addr.unwrap_or(0) as u64, dst),
            Value::Pointer(p) => write_uint(order, p.address() as u64, dst),
            _ => return Err(mismatch()),
        },
        _ => match value {
            Value::Int(i) => write_uint(order, truncate(kind, *i) as u64, dst),
            _ => return Err(mismatch()),
        },
    }
    Ok(())
}

/// Decode the bytes of one scalar
pub fn decode(kind: NativeKind, order: ByteOrder, src: &[u8]) -> Value {
    debug_assert_eq!(src.len(), kind.size());
    match kind {
        NativeKind::Bool => Value::Bool(src[0] != 0),
        NativeKind::Char => Value::Char(src[0]),
        NativeKind::WChar => {
            let code = read_uint(order, src) as u32;
            Value::WChar(char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER))
        }
        NativeKind::F32 => Value::Float(f32::from_bits(read_uint(order, src) as u32) as f64),
        NativeKind::F64 => Value::Float(f64::from_bits(read_uint(order, src))),
        NativeKind::Pointer | NativeKind::CharPtr | NativeKind::WCharPtr => {
            match read_uint(order, src) as usize {
                0 => Value::Address(None),
                addr => Value::Address(Some(addr)),
            }
        }
        _ => Value::Int(truncate(kind, read_uint(order, src) as i128)),
    }
}
