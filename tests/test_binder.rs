use core::ffi::c_void;
use typed_ffi::{
    Annotation, Error, ForeignLibrary, FunctionDecl, LibraryDecl, NativeKind, StructDecl,
    StructInstance, SymbolTable, Value,
};

macro_rules! tuple_fns {
    ($($struct_name:ident, $swap_fn:ident, $ty:ty;)*) => {
        $(
            #[repr(C)]
            pub struct $struct_name {
                pub a: $ty,
                pub b: $ty,
            }

            pub unsafe extern "C" fn $swap_fn(s: *mut $struct_name) {
                let s = &mut *s;
                std::mem::swap(&mut s.a, &mut s.b);
            }
        )*
    };
}

macro_rules! sub_fns {
    ($($name:ident, $ty:ty, $sub:ident;)*) => {
        $(
            pub extern "C" fn $name(x: $ty, y: $ty) -> $ty {
                x.$sub(y)
            }
        )*
    };
}

tuple_fns! {
    U8Tuple, swap_u8_tuple, u8;
    U16Tuple, swap_u16_tuple, u16;
    U32Tuple, swap_u32_tuple, u32;
    U64Tuple, swap_u64_tuple, u64;
    I8Tuple, swap_i8_tuple, i8;
    I16Tuple, swap_i16_tuple, i16;
    I32Tuple, swap_i32_tuple, i32;
    I64Tuple, swap_i64_tuple, i64;
    F32Tuple, swap_f32_tuple, f32;
    F64Tuple, swap_f64_tuple, f64;
}

trait CSub {
    fn sub_c(self, rhs: Self) -> Self;
}

macro_rules! wrapping_sub {
    ($($ty:ty),*) => { $(impl CSub for $ty { fn sub_c(self, rhs: Self) -> Self { self.wrapping_sub(rhs) } })* };
}
macro_rules! float_sub {
    ($($ty:ty),*) => { $(impl CSub for $ty { fn sub_c(self, rhs: Self) -> Self { self - rhs } })* };
}
wrapping_sub!(u8, u16, u32, u64, i8, i16, i32, i64);
float_sub!(f32, f64);

sub_fns! {
    sub_u8, u8, sub_c;
    sub_u16, u16, sub_c;
    sub_u32, u32, sub_c;
    sub_u64, u64, sub_c;
    sub_i8, i8, sub_c;
    sub_i16, i16, sub_c;
    sub_i32, i32, sub_c;
    sub_i64, i64, sub_c;
    sub_f32, f32, sub_c;
    sub_f64, f64, sub_c;
}

#[repr(C)]
#[derive(Clone, Copy)]
pub struct Point {
    x: i32,
    y: i64,
}

pub extern "C" fn point_sum(p: Point) -> i64 {
    p.x as i64 + p.y
}

pub extern "C" fn point_make(x: i32, y: i64) -> Point {
    Point { x, y }
}

const KINDS: [(&str, NativeKind); 10] = [
    ("u8", NativeKind::U8),
    ("u16", NativeKind::U16),
    ("u32", NativeKind::U32),
    ("u64", NativeKind::U64),
    ("i8", NativeKind::I8),
    ("i16", NativeKind::I16),
    ("i32", NativeKind::I32),
    ("i64", NativeKind::I64),
    ("f32", NativeKind::F32),
    ("f64", NativeKind::F64),
];

fn testlib() -> SymbolTable {
    SymbolTable::new("testlib")
        .with("swap_u8_tuple", swap_u8_tuple as *const c_void)
        .with("swap_u16_tuple", swap_u16_tuple as *const c_void)
        .with("swap_u32_tuple", swap_u32_tuple as *const c_void)
        .with("swap_u64_tuple", swap_u64_tuple as *const c_void)
        .with("swap_i8_tuple", swap_i8_tuple as *const c_void)
        .with("swap_i16_tuple", swap_i16_tuple as *const c_void)
        .with("swap_i32_tuple", swap_i32_tuple as *const c_void)
        .with("swap_i64_tuple", swap_i64_tuple as *const c_void)
        .with("swap_f32_tuple", swap_f32_tuple as *const c_void)
        .with("swap_f64_tuple", swap_f64_tuple as *const c_void)
        .with("sub_u8", sub_u8 as *const c_void)
        .with("sub_u16", sub_u16 as *const c_void)
        .with("sub_u32", sub_u32 as *const c_void)
        .with("sub_u64", sub_u64 as *const c_void)
        .with("sub_i8", sub_i8 as *const c_void)
        .with("sub_i16", sub_i16 as *const c_void)
        .with("sub_i32", sub_i32 as *const c_void)
        .with("sub_i64", sub_i64 as *const c_void)
        .with("sub_f32", sub_f32 as *const c_void)
        .with("sub_f64", sub_f64 as *const c_void)
        .with("point_sum", point_sum as *const c_void)
        .with("point_make", point_make as *const c_void)
}

fn sub_library() -> ForeignLibrary {
    let mut decl = LibraryDecl::new("testlib");
    for (suffix, kind) in KINDS {
        decl = decl.function(
            FunctionDecl::new(format!("sub_{}", suffix))
                .params([kind, kind])
                .returns(kind),
        );
    }
    unsafe { ForeignLibrary::bind(Box::new(testlib()), &decl) }.unwrap()
}

#[test]
fn test_sub_every_kind() {
    let lib = sub_library();
    for (suffix, kind) in KINDS {
        let name = format!("sub_{}", suffix);
        let (x, y, expected) = if kind.is_float() {
            (Value::Float(5.5), Value::Float(2.0), Value::Float(3.5))
        } else {
            (Value::Int(9), Value::Int(4), Value::Int(5))
        };
        assert_eq!(lib.call(&name, &[x, y]).unwrap(), Some(expected), "{}", name);
    }
}

#[test]
fn test_sub_wraps_unsigned() {
    let lib = sub_library();
    assert_eq!(
        lib.call("sub_u8", &[Value::Int(1), Value::Int(2)]).unwrap(),
        Some(Value::Int(255))
    );
    assert_eq!(
        lib.call("sub_u64", &[Value::Int(0), Value::Int(1)]).unwrap(),
        Some(Value::Int(u64::MAX as i128))
    );
    assert_eq!(
        lib.call("sub_i16", &[Value::Int(-32768), Value::Int(1)]).unwrap(),
        Some(Value::Int(32767))
    );
}

#[test]
fn test_swap_tuples_through_pointer() {
    for (suffix, kind) in KINDS {
        let tuple = StructDecl::new(format!("{}Tuple", suffix.to_uppercase()))
            .field("a", kind)
            .field("b", kind)
            .build()
            .unwrap();
        let name = format!("swap_{}_tuple", suffix);
        let decl = LibraryDecl::new("testlib")
            .function(FunctionDecl::new(name.clone()).param(Annotation::pointer_to(&tuple)));
        let lib = unsafe { ForeignLibrary::bind(Box::new(testlib()), &decl) }.unwrap();

        let (a, b) = if kind.is_float() {
            (Value::Float(1.5), Value::Float(-2.25))
        } else {
            (Value::Int(1), Value::Int(2))
        };
        let s = StructInstance::with_values(&tuple, vec![a.clone(), b.clone()]).unwrap();
        assert_eq!(lib.call(&name, &[s.as_pointer().into()]).unwrap(), None);
        assert_eq!(s.get("a").unwrap(), b, "{}", name);
        assert_eq!(s.get("b").unwrap(), a, "{}", name);
    }
}

#[test]
fn test_swap_nested_view_in_place() {
    let tuple = StructDecl::new("NestedU16Tuple")
        .field("a", NativeKind::U16)
        .field("b", NativeKind::U16)
        .build()
        .unwrap();
    let holder = StructDecl::new("Holder")
        .field("tag", NativeKind::U8)
        .field("pair", Annotation::nested(&tuple))
        .build()
        .unwrap();
    let decl = LibraryDecl::new("testlib")
        .function(FunctionDecl::new("swap_u16_tuple").param(Annotation::pointer_to(&tuple)));
    let lib = unsafe { ForeignLibrary::bind(Box::new(testlib()), &decl) }.unwrap();

    let h = StructInstance::zeroed(&holder);
    let pair = h.get("pair").unwrap().into_struct().unwrap();
    pair.set("a", 7).unwrap();
    pair.set("b", 9).unwrap();
    lib.call("swap_u16_tuple", &[pair.clone().into()]).unwrap();

    assert_eq!(pair.get("a").unwrap(), Value::Int(9));
    assert_eq!(h.get("tag").unwrap(), Value::Int(0));
}

#[test]
fn test_struct_by_value() {
    let point = StructDecl::new("Point")
        .field("x", NativeKind::I32)
        .field("y", NativeKind::I64)
        .build()
        .unwrap();
    assert_eq!(point.sizeof(), std::mem::size_of::<Point>());

    let decl = LibraryDecl::new("testlib")
        .function(
            FunctionDecl::new("point_sum")
                .param(Annotation::nested(&point))
                .returns(NativeKind::I64),
        )
        .function(
            FunctionDecl::new("point_make")
                .params([NativeKind::I32, NativeKind::I64])
                .returns(Annotation::nested(&point)),
        );
    let lib = unsafe { ForeignLibrary::bind(Box::new(testlib()), &decl) }.unwrap();

    let p = StructInstance::with_values(&point, vec![Value::Int(-3), Value::Int(10)]).unwrap();
    assert_eq!(lib.call("point_sum", &[p.into()]).unwrap(), Some(Value::Int(7)));

    let made = lib
        .call("point_make", &[Value::Int(4), Value::Int(1 << 40)])
        .unwrap()
        .and_then(Value::into_struct)
        .unwrap();
    assert_eq!(made.get("x").unwrap(), Value::Int(4));
    assert_eq!(made.get("y").unwrap(), Value::Int(1 << 40));
    assert!(!made.is_view());
}

#[test]
fn test_empty_specification() {
    let err = unsafe { ForeignLibrary::bind(Box::new(testlib()), &LibraryDecl::new("testlib")) }
        .unwrap_err();
    assert!(matches!(err, Error::EmptySpecification { .. }));
    assert!(err.is_declaration_error());
}

#[test]
fn test_symbol_not_found() {
    let decl = LibraryDecl::new("testlib").function(FunctionDecl::new("sub_i128"));
    let err = unsafe { ForeignLibrary::bind(Box::new(testlib()), &decl) }.unwrap_err();
    assert!(matches!(err, Error::SymbolNotFound { ref symbol, .. } if symbol == "sub_i128"));
}

#[cfg(target_os = "linux")]
mod libm {
    use super::*;
    use typed_ffi::NativeLibrary;

    fn open_libm(decl: &LibraryDecl) -> Option<typed_ffi::Result<ForeignLibrary>> {
        match unsafe { NativeLibrary::open("libm.so.6") } {
            Ok(library) => Some(unsafe { ForeignLibrary::bind(Box::new(library), decl) }),
            Err(err) => {
                eprintln!("Skipping libm test: {}", err);
                None
            }
        }
    }

    #[test]
    fn test_libm_cos() {
        let decl = LibraryDecl::new("m").function(
            FunctionDecl::new("cos")
                .param(NativeKind::F64)
                .returns(NativeKind::F64),
        );
        let Some(lib) = open_libm(&decl) else { return };
        let lib = lib.unwrap();
        assert_eq!(lib.call("cos", &[Value::Float(0.0)]).unwrap(), Some(Value::Float(1.0)));
    }

    #[test]
    fn test_libm_missing_symbol() {
        let decl = LibraryDecl::new("m")
            .function(FunctionDecl::new("cos").param(NativeKind::F64).returns(NativeKind::F64))
            .function(FunctionDecl::new("definitely_not_in_libm"));
        let Some(result) = open_libm(&decl) else { return };
        assert!(matches!(result, Err(Error::SymbolNotFound { .. })));
    }
}
