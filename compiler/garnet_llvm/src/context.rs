//! Minimal LLVM context for one output module.
//!
//! `SimpleCx` pairs the LLVM context with the module being emitted and keeps
//! the handful of machine types every payload helper needs. Everything
//! Garnet-specific (program, caches, runtime declarations) lives one level
//! up in [`CompilerState`](crate::state::CompilerState), which borrows a
//! `SimpleCx` through its `IrBuilder`.
//!
//! The split keeps the LLVM `Context` owner outside the compiler state, so
//! tests can create a context, build into it, and inspect the module after
//! the state has been consumed by `finish`.

use inkwell::context::Context;
use inkwell::module::Module;
use inkwell::types::{BasicMetadataTypeEnum, BasicTypeEnum, FunctionType, IntType, PointerType};
use inkwell::types::{FloatType, StructType, VoidType};
use inkwell::AddressSpace;

/// LLVM context, module and commonly used types.
pub struct SimpleCx<'ll> {
    /// The LLVM context (owns all LLVM types and values).
    pub llcx: &'ll Context,
    /// The LLVM module being compiled.
    pub llmod: Module<'ll>,
    /// Opaque pointer type.
    pub ptr_type: PointerType<'ll>,
    /// Machine word; every runtime value is one of these.
    pub isize_ty: IntType<'ll>,
}

impl<'ll> SimpleCx<'ll> {
    /// Create a new module named `module_name` in `context`.
    #[must_use]
    pub fn new(context: &'ll Context, module_name: &str) -> Self {
        let llmod = context.create_module(module_name);
        let ptr_type = context.ptr_type(AddressSpace::default());
        let isize_ty = context.i64_type(); // 64-bit target

        Self {
            llcx: context,
            llmod,
            ptr_type,
            isize_ty,
        }
    }

    #[inline]
    pub fn type_i1(&self) -> IntType<'ll> {
        self.llcx.bool_type()
    }

    #[inline]
    pub fn type_i32(&self) -> IntType<'ll> {
        self.llcx.i32_type()
    }

    #[inline]
    pub fn type_i64(&self) -> IntType<'ll> {
        self.isize_ty
    }

    #[inline]
    pub fn type_f64(&self) -> FloatType<'ll> {
        self.llcx.f64_type()
    }

    #[inline]
    pub fn type_void(&self) -> VoidType<'ll> {
        self.llcx.void_type()
    }

    #[inline]
    pub fn type_ptr(&self) -> PointerType<'ll> {
        self.ptr_type
    }

    /// Create an anonymous struct type from fields.
    pub fn type_struct(&self, fields: &[BasicTypeEnum<'ll>], packed: bool) -> StructType<'ll> {
        self.llcx.struct_type(fields, packed)
    }

    /// Create a void-returning function type.
    pub fn type_void_func(&self, args: &[BasicMetadataTypeEnum<'ll>]) -> FunctionType<'ll> {
        self.type_void().fn_type(args, false)
    }
}
