use std::sync::Arc;
use typed_ffi::{
    registry, Annotation, ByteOrder, DeclFile, Error, NativeKind, StructDecl, StructDescriptor,
    StructInstance, Value,
};

fn proxy() -> Arc<StructDescriptor> {
    registry::declare(
        StructDecl::new("Proxy")
            .field("uint", Annotation::named("Uint32").unwrap())
            .field("char", Annotation::named("Uint8").unwrap()),
    )
    .unwrap()
}

#[test]
fn test_read() {
    let p = StructInstance::zeroed(&proxy());
    assert_eq!(p.get("uint").unwrap(), Value::Int(0));
    assert_eq!(p.get("char").unwrap(), Value::Int(0));
}

#[test]
fn test_write() {
    let p = StructInstance::zeroed(&proxy());
    p.set("uint", 1234).unwrap();
    p.set("char", 5678).unwrap();
    assert_eq!(p.get("uint").unwrap(), Value::Int(1234));
    assert_eq!(p.get("char").unwrap(), Value::Int(5678 & 0xFF));
}

#[test]
fn test_missing() {
    let p = StructInstance::zeroed(&proxy());
    assert!(matches!(p.get("missing"), Err(Error::UnknownField { .. })));
}

#[test]
fn test_registry_returns_same_type() {
    let a = proxy();
    let b = proxy();
    assert!(Arc::ptr_eq(&a, &b));
    assert!(StructInstance::zeroed(&a).equals(&StructInstance::zeroed(&b)));
}

#[test]
fn test_buffer_matches_repr_c() {
    #[repr(C)]
    struct Mixed {
        a: u8,
        b: f64,
        c: u16,
        d: i32,
    }

    let desc = StructDecl::new("Mixed")
        .field("a", NativeKind::U8)
        .field("b", NativeKind::F64)
        .field("c", NativeKind::U16)
        .field("d", NativeKind::I32)
        .build()
        .unwrap();
    assert_eq!(desc.sizeof(), std::mem::size_of::<Mixed>());
    assert_eq!(desc.align(), std::mem::align_of::<Mixed>());

    let s = StructInstance::with_values(
        &desc,
        vec![Value::Int(3), Value::Float(0.25), Value::Int(513), Value::Int(-9)],
    )
    .unwrap();
    let native = unsafe { &*(s.as_pointer().as_mut_ptr() as *const Mixed) };
    assert_eq!(native.a, 3);
    assert_eq!(native.b, 0.25);
    assert_eq!(native.c, 513);
    assert_eq!(native.d, -9);
}

#[test]
fn test_network_header_is_big_endian() {
    let header = StructDecl::new("Header")
        .field("magic", NativeKind::U16)
        .field("length", NativeKind::U32)
        .packed(true)
        .byte_order(ByteOrder::Big)
        .build()
        .unwrap();
    let h = StructInstance::new(
        &header,
        vec![Value::Int(0xCAFE)],
        [("length", Value::Int(0x0102_0304))],
    )
    .unwrap();
    assert_eq!(h.to_bytes(), vec![0xCA, 0xFE, 0x01, 0x02, 0x03, 0x04]);

    let parsed = StructInstance::from_bytes(&header, &h.to_bytes()).unwrap();
    assert!(parsed.equals(&h));
    assert_eq!(parsed.to_string(), "Header(magic=51966, length=16909060)");
}

#[test]
fn test_nested_views_share_memory() {
    let vec2 = StructDecl::new("Vec2")
        .field("x", NativeKind::F32)
        .field("y", NativeKind::F32)
        .build()
        .unwrap();
    let body = StructDecl::new("Body")
        .field("position", Annotation::nested(&vec2))
        .field("velocity", Annotation::nested(&vec2))
        .build()
        .unwrap();

    let b = StructInstance::zeroed(&body);
    let position = b.get("position").unwrap().into_struct().unwrap();
    let velocity = b.get("velocity").unwrap().into_struct().unwrap();
    assert!(!position.ptr_eq(&velocity));
    velocity.set("x", 2.0).unwrap();

    b.set("position", velocity.clone()).unwrap();
    assert_eq!(position.get("x").unwrap(), Value::Float(2.0));
    assert!(position.equals(&velocity));
    assert!(b.get("position").unwrap().into_struct().unwrap().ptr_eq(&position));
}

#[test]
fn test_extension_with_defaults() {
    let base = StructDecl::new("Shape")
        .field_with_default("sides", NativeKind::U8, 3)
        .build()
        .unwrap();
    let colored = StructDecl::new("ColoredShape")
        .extends(&base)
        .field_with_default("rgb", NativeKind::U32, 0x00FF_00u32)
        .build()
        .unwrap();

    let s = StructInstance::with_defaults(&colored);
    assert_eq!(s.get("sides").unwrap(), Value::Int(3));
    assert_eq!(s.get("rgb").unwrap(), Value::Int(0x00FF_00));

    let err = StructInstance::with_values(
        &colored,
        vec![Value::Int(1), Value::Int(2), Value::Int(3)],
    )
    .unwrap_err();
    assert!(matches!(err, Error::TooManyArguments { expected: 2, given: 3, .. }));
}

#[test]
fn test_declaration_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("types.toml");
    std::fs::write(
        &path,
        r#"
[[struct]]
name = "FileTuple"
byte_order = "little"
fields = [
    { name = "a", type = "Uint16", default = 1 },
    { name = "b", type = "Uint16", default = 2 },
]
"#,
    )
    .unwrap();

    let declared = DeclFile::load(&path).unwrap().declare_structs().unwrap();
    let tuple = StructInstance::with_defaults(&declared[0]);
    assert_eq!(tuple.to_bytes(), vec![1, 0, 2, 0]);
    assert!(Arc::ptr_eq(&declared[0], &registry::lookup("FileTuple").unwrap()));
}
