//! Layout tests
//!
//! Test suite organized by component:
//! - Builder: offsets, tail padding and packing
//! - Codec: truncation, sign extension and byte order
//! - Properties: layout invariants over arbitrary field lists

#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::types::{NativeKind, Value};
    use proptest::prelude::*;

    fn unpacked() -> LayoutOptions {
        LayoutOptions::default()
    }

    fn packed() -> LayoutOptions {
        LayoutOptions::new(true, ByteOrder::Native)
    }

    // ===== Builder Tests =====

    #[test]
    fn u32_then_u8_pads_to_eight() {
        let layout = Layout::compute([("a", 4, 4), ("b", 1, 1)], unpacked());
        assert_eq!(layout.size(), 8);
        assert_eq!(layout.align(), 4);
        assert_eq!(layout.field("a").unwrap().offset, 0);
        assert_eq!(layout.field("b").unwrap().offset, 4);
        assert_eq!(layout.padding(), 3);
    }

    #[test]
    fn u32_then_u8_packed_is_five() {
        let layout = Layout::compute([("a", 4, 4), ("b", 1, 1)], packed());
        assert_eq!(layout.size(), 5);
        assert_eq!(layout.align(), 1);
        assert_eq!(layout.padding(), 0);
        assert!(layout.packed());
    }

    #[test]
    fn interior_padding() {
        let layout = Layout::compute([("a", 1, 1), ("b", 8, 8), ("c", 2, 2)], unpacked());
        assert_eq!(layout.field("b").unwrap().offset, 8);
        assert_eq!(layout.field("c").unwrap().offset, 16);
        assert_eq!(layout.size(), 24);
    }

    #[test]
    fn empty_struct_has_size_zero() {
        let layout = Layout::compute(Vec::<(&str, usize, usize)>::new(), unpacked());
        assert_eq!(layout.size(), 0);
        assert_eq!(layout.align(), 1);
    }

    #[test]
    fn builder_reports_running_offset() {
        let mut builder = LayoutBuilder::new(unpacked());
        assert_eq!(builder.push("a", 1, 1), 0);
        assert_eq!(builder.offset(), 1);
        assert_eq!(builder.push("b", 2, 2), 2);
        assert_eq!(builder.offset(), 4);
    }

    #[test]
    fn align_up_rounds() {
        assert_eq!(align_up(0, 8), 0);
        assert_eq!(align_up(1, 8), 8);
        assert_eq!(align_up(9, 4), 12);
        assert_eq!(align_up(12, 4), 12);
    }

    #[test]
    fn native_order_resolves_to_target() {
        let expected = if cfg!(target_endian = "little") {
            ByteOrder::Little
        } else {
            ByteOrder::Big
        };
        assert_eq!(ByteOrder::Native.resolve(), expected);
        assert_eq!(ByteOrder::Big.resolve(), ByteOrder::Big);
    }

    // ===== Codec Tests =====

    #[test]
    fn write_to_u8_truncates() {
        let mut byte = [0u8; 1];
        codec::encode(NativeKind::U8, ByteOrder::Native, &Value::Int(5678), &mut byte, "t").unwrap();
        assert_eq!(byte, [46]);
        assert_eq!(codec::decode(NativeKind::U8, ByteOrder::Native, &byte), Value::Int(5678 & 0xFF));
    }

    #[test]
    fn signed_reads_sign_extend() {
        assert_eq!(codec::truncate(NativeKind::I8, 255), -1);
        assert_eq!(codec::truncate(NativeKind::I8, 128), -128);
        assert_eq!(codec::truncate(NativeKind::U8, -1), 255);
        assert_eq!(codec::truncate(NativeKind::I16, 0x1_8000), -0x8000);
        assert_eq!(codec::truncate(NativeKind::U64, -1), u64::MAX as i128);
    }

    #[test]
    fn little_and_big_endian_bytes() {
        let value = Value::Int(0x1234_5678);
        let mut le = [0u8; 4];
        let mut be = [0u8; 4];
        codec::encode(NativeKind::U32, ByteOrder::Little, &value, &mut le, "t").unwrap();
        codec::encode(NativeKind::U32, ByteOrder::Big, &value, &mut be, "t").unwrap();
        assert_eq!(le, [0x78, 0x56, 0x34, 0x12]);
        assert_eq!(be, [0x12, 0x34, 0x56, 0x78]);
        assert_eq!(codec::decode(NativeKind::U32, ByteOrder::Big, &be), value);
    }

    #[test]
    fn float_accepts_integers() {
        let mut bytes = [0u8; 8];
        codec::encode(NativeKind::F64, ByteOrder::Native, &Value::Int(3), &mut bytes, "t").unwrap();
        assert_eq!(codec::decode(NativeKind::F64, ByteOrder::Native, &bytes), Value::Float(3.0));
    }

    #[test]
    fn f32_rounds_through_single_precision() {
        let mut bytes = [0u8; 4];
        codec::encode(NativeKind::F32, ByteOrder::Big, &Value::Float(0.1), &mut bytes, "t").unwrap();
        let decoded = codec::decode(NativeKind::F32, ByteOrder::Big, &bytes);
        assert_eq!(decoded, Value::Float(0.1f32 as f64));
    }

    #[test]
    fn null_pointer_decodes_to_none() {
        let bytes = [0u8; std::mem::size_of::<usize>()];
        assert_eq!(
            codec::decode(NativeKind::Pointer, ByteOrder::Native, &bytes),
            Value::Address(None)
        );
    }

    #[test]
    fn wrong_semantic_type_is_mismatch() {
        let mut bytes = [0u8; 4];
        let err = codec::encode(NativeKind::I32, ByteOrder::Native, &Value::Float(1.0), &mut bytes, "P.x")
            .unwrap_err();
        assert!(matches!(err, crate::Error::TypeMismatch { .. }));
        let mut flag = [0u8; 1];
        assert!(codec::encode(NativeKind::Bool, ByteOrder::Native, &Value::Int(1), &mut flag, "P.f").is_err());
    }

    #[test]
    fn char_accepts_single_byte() {
        let mut byte = [0u8; 1];
        codec::encode(NativeKind::Char, ByteOrder::Native, &Value::bytes(b"x".to_vec()), &mut byte, "t").unwrap();
        assert_eq!(byte, [b'x']);
        assert!(codec::encode(NativeKind::Char, ByteOrder::Native, &Value::bytes(b"xy".to_vec()), &mut byte, "t").is_err());
    }

    // ===== Property Tests =====

    fn field_strategy() -> impl Strategy<Value = Vec<(usize, usize)>> {
        prop::collection::vec(
            prop::sample::select(vec![(1usize, 1usize), (2, 2), (4, 4), (8, 8), (12, 4), (3, 1)]),
            0..12,
        )
    }

    proptest! {
        #[test]
        fn unpacked_offsets_are_aligned_and_disjoint(fields in field_strategy()) {
            let layout = Layout::compute(
                fields.iter().enumerate().map(|(i, &(size, align))| (format!("f{}", i), size, align)),
                unpacked(),
            );
            let mut end = 0;
            for slot in layout.slots() {
                prop_assert_eq!(slot.offset % slot.align, 0);
                prop_assert!(slot.offset >= end);
                end = slot.offset + slot.size;
            }
            prop_assert!(layout.size() >= end);
            prop_assert_eq!(layout.size() % layout.align(), 0);
        }

        #[test]
        fn packed_size_is_sum_of_fields(fields in field_strategy()) {
            let layout = Layout::compute(
                fields.iter().enumerate().map(|(i, &(size, align))| (format!("f{}", i), size, align)),
                packed(),
            );
            prop_assert_eq!(layout.size(), fields.iter().map(|f| f.0).sum::<usize>());
            prop_assert_eq!(layout.padding(), 0);
        }

        #[test]
        fn truncation_is_modular(value in any::<i64>()) {
            let wide = value as i128;
            prop_assert_eq!(codec::truncate(NativeKind::U8, wide), (value as u8) as i128);
            prop_assert_eq!(codec::truncate(NativeKind::I16, wide), (value as i16) as i128);
            prop_assert_eq!(codec::truncate(NativeKind::U32, wide), (value as u32) as i128);
        }

        #[test]
        fn byte_order_round_trip(value in any::<u64>(), big in any::<bool>()) {
            let order = if big { ByteOrder::Big } else { ByteOrder::Little };
            let mut bytes = [0u8; 8];
            codec::write_uint(order, value, &mut bytes);
            prop_assert_eq!(codec::read_uint(order, &bytes), value);
            if big {
                prop_assert_eq!(bytes, value.to_be_bytes());
            } else {
                prop_assert_eq!(bytes, value.to_le_bytes());
            }
        }
    }
}
