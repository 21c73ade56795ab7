//! Aligned, zero-filled byte storage
//!
//! Design: one allocation per owned struct instance, aligned for the struct
//! so native code can dereference a pointer to it.

use std::alloc::{alloc_zeroed, dealloc, handle_alloc_error, Layout};
use std::ptr::NonNull;

pub struct Buffer {
    ptr: NonNull<u8>,
    layout: Layout,
}

impl Buffer {
    /// Allocate `layout.size()` zero bytes
    pub fn zeroed(layout: Layout) -> Self {
        if layout.size() == 0 {
            // Zero-sized: no allocation, just a well-aligned dangling pointer
            let ptr = NonNull::new(layout.align() as *mut u8).unwrap_or(NonNull::dangling());
            return Self { ptr, layout };
        }

        let start = unsafe { alloc_zeroed(layout) };
        match NonNull::new(start) {
            Some(ptr) => Self { ptr, layout },
            None => handle_alloc_error(layout),
        }
    }

    /// Allocate and fill from `bytes`, which must match the layout size
    pub fn from_bytes(layout: Layout, bytes: &[u8]) -> Self {
        let mut buffer = Self::zeroed(layout);
        buffer.as_mut_slice().copy_from_slice(bytes);
        buffer
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.layout.size()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.layout.size() == 0
    }

    #[inline]
    pub fn align(&self) -> usize {
        self.layout.align()
    }

    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.layout.size()) }
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        unsafe { std::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.layout.size()) }
    }

    /// Start address, stable for the buffer's lifetime
    #[inline]
    pub fn as_ptr(&self) -> *mut u8 {
        self.ptr.as_ptr()
    }
}

impl Drop for Buffer {
    fn drop(&mut self) {
        if self.layout.size() != 0 {
            unsafe {
                dealloc(self.ptr.as_ptr(), self.layout);
            }
        }
    }
}

impl std::fmt::Debug for Buffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Buffer")
            .field("len", &self.len())
            .field("align", &self.align())
            .field("address", &self.ptr)
            .finish()
    }
}
