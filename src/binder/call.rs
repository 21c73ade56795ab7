//! Bound foreign functions - one prepared call interface per symbol

use super::library::SymbolSource;
use super::marshal::{self, ArgSlot};
use super::signature::{FunctionDecl, Signature};
use crate::error::{Error, Result};
use crate::instance::Buffer;
use crate::logging::{log_ffi_call, log_ffi_error, log_ffi_return, log_symbol_bound};
use crate::types::Value;
use core::ffi::c_void;
use libffi::middle::{Cif, CodePtr};
use libffi::raw;
use smallvec::SmallVec;
use std::time::Instant;

/// Function symbol resolved and prepared for calling
pub struct BoundFunction {
    name: String,
    signature: Signature,
    cif: Cif,
    code: CodePtr,
    ret_layout: std::alloc::Layout,
}

// SAFETY: the cif and its type graph are prepared once in `bind` and never
// mutated afterwards; `ffi_call` only reads them. The code pointer is an
// immutable address. Argument and return storage is per call.
unsafe impl Send for BoundFunction {}
unsafe impl Sync for BoundFunction {}

impl BoundFunction {
    /// Resolve `decl` against `source` and prepare its call interface
    ///
    /// # Safety
    /// The symbol must really be a C-ABI function with exactly the declared
    /// signature; nothing can verify this.
    pub unsafe fn bind(decl: &FunctionDecl, source: &dyn SymbolSource) -> Result<Self> {
        let signature = Signature::resolve(decl)?;

        let address = source
            .resolve(&decl.name)
            .ok_or_else(|| Error::SymbolNotFound {
                symbol: decl.name.clone(),
                library: source.origin().to_string(),
            })?;

        let cif = match &signature.returns {
            Some(ret) => Cif::new(
                signature.params.iter().map(marshal::ffi_type),
                marshal::ffi_type(ret),
            ),
            None => Cif::new(
                signature.params.iter().map(marshal::ffi_type),
                libffi::middle::Type::void(),
            ),
        };
        let ret_layout = marshal::return_layout(signature.returns.as_ref())?;

        log_symbol_bound(&decl.name, source.origin(), &signature.to_string());
        Ok(Self {
            name: decl.name.clone(),
            signature,
            cif,
            code: CodePtr(address as *mut c_void),
            ret_layout,
        })
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    #[inline]
    pub fn arity(&self) -> usize {
        self.signature.arity()
    }

    /// Marshal `args`, call the native function, and unmarshal its result
    ///
    /// Returns `None` for void functions.
    pub fn call(&self, args: &[Value]) -> Result<Option<Value>> {
        let result = self.call_inner(args);
        if let Err(err) = &result {
            log_ffi_error(&self.name, err);
        }
        result
    }

    fn call_inner(&self, args: &[Value]) -> Result<Option<Value>> {
        if args.len() != self.arity() {
            return Err(Error::ArgumentCount {
                function: self.name.clone(),
                expected: self.arity(),
                given: args.len(),
            });
        }

        let mut slots: SmallVec<[ArgSlot; 8]> = SmallVec::with_capacity(args.len());
        for (position, (kind, value)) in self.signature.params.iter().zip(args).enumerate() {
            let context = format!("argument {} of {}", position, self.name);
            slots.push(marshal::marshal(kind, value, &context)?);
        }
        let mut raw_args: SmallVec<[*mut c_void; 8]> = slots.iter().map(ArgSlot::as_ptr).collect();

        let ret = Buffer::zeroed(self.ret_layout);
        log_ffi_call(&self.name, args.len());
        let start = Instant::now();
        // Slots and everything they point at outlive the call.
        unsafe {
            raw::ffi_call(
                self.cif.as_raw_ptr(),
                Some(*self.code.as_safe_fun()),
                ret.as_ptr() as *mut c_void,
                raw_args.as_mut_ptr(),
            );
        }
        log_ffi_return(&self.name, start.elapsed());

        Ok(self
            .signature
            .returns
            .as_ref()
            .map(|kind| marshal::unmarshal(kind, &ret)))
    }
}

impl std::fmt::Debug for BoundFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundFunction")
            .field("name", &self.name)
            .field("signature", &format_args!("{}", self.signature))
            .finish()
    }
}
