//! Runtime ABI declarations.
//!
//! Declares every entry point of the Garnet runtime library as an external
//! function. Generated code only ever reaches the runtime through these
//! names; they are resolved at link time (AOT) or through symbol mapping
//! (JIT tests).
//!
//! Runtime values are machine words (`i64`), booleans produced by
//! predicates are `i1`, and stack-frame descriptors and control-frame
//! handles are opaque pointers.

use rustc_hash::FxHashMap;

use super::ir_builder::IrBuilder;
use super::value_id::{FunctionId, LLVMTypeId};
use crate::type_test::FAST_TYPE_TESTS;

/// Handles of the declared runtime functions, looked up by symbol name.
pub struct RuntimeFunctions {
    functions: FxHashMap<&'static str, FunctionId>,
}

impl RuntimeFunctions {
    /// The declared function named `name`.
    ///
    /// Panics if `name` is not part of the runtime ABI; every caller in
    /// this crate uses a fixed name, so a miss is an internal error.
    pub fn get(&self, name: &str) -> FunctionId {
        match self.functions.get(name) {
            Some(&func) => func,
            None => crate::ice!("runtime function `{name}` was never declared"),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    fn declare(
        &mut self,
        builder: &mut IrBuilder<'_, '_>,
        name: &'static str,
        params: &[LLVMTypeId],
        ret: Option<LLVMTypeId>,
    ) -> FunctionId {
        let func = builder.declare_extern_function(name, params, ret);
        self.functions.insert(name, func);
        func
    }

    /// All declared names.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.functions.keys().copied()
    }
}

/// Declare the whole runtime ABI in the builder's module.
///
/// Call this once per module before any method is compiled.
pub fn declare_runtime(builder: &mut IrBuilder<'_, '_>) -> RuntimeFunctions {
    let void = None;
    let value = builder.i64_type();
    let i32_ty = builder.i32_type();
    let f64_ty = builder.f64_type();
    let bool_ty = builder.bool_type();
    let ptr_ty = builder.ptr_type();

    let mut rt = RuntimeFunctions {
        functions: FxHashMap::default(),
    };

    // -- Immediates --
    for name in [
        "garnet_undef",
        "garnet_nil",
        "garnet_true",
        "garnet_false",
        "garnet_top_self",
    ] {
        rt.declare(builder, name, &[], Some(value));
    }

    // -- Construction --
    rt.declare(builder, "garnet_box_int", &[value], Some(value));
    rt.declare(builder, "garnet_box_float", &[f64_ty], Some(value));
    rt.declare(builder, "garnet_str_new", &[ptr_ty, value], Some(value));
    rt.declare(builder, "garnet_str_new_frozen", &[ptr_ty, value], Some(value));
    rt.declare(builder, "garnet_id_intern", &[ptr_ty, value], Some(value));
    rt.declare(builder, "garnet_id_to_sym", &[value], Some(value));
    rt.declare(builder, "garnet_bool_box", &[bool_ty], Some(value));

    // -- Predicates --
    rt.declare(builder, "garnet_is_undef", &[value], Some(bool_ty));
    rt.declare(builder, "garnet_is_truthy", &[value], Some(bool_ty));
    rt.declare(builder, "garnet_isa", &[value, value], Some(bool_ty));
    rt.declare(builder, "garnet_isa_class_of", &[value, value], Some(bool_ty));
    for &(_, name) in FAST_TYPE_TESTS {
        rt.declare(builder, name, &[value], Some(bool_ty));
    }

    // -- Constants --
    rt.declare(builder, "garnet_get_class", &[ptr_ty, value], Some(value));
    rt.declare(builder, "garnet_get_constant", &[ptr_ty, value], Some(value));
    rt.declare(builder, "garnet_const_set", &[value, ptr_ty, value, value], void);

    // -- Fields --
    rt.declare(builder, "garnet_gvar_get", &[ptr_ty], Some(value));
    rt.declare(builder, "garnet_gvar_set", &[ptr_ty, value], void);
    rt.declare(builder, "garnet_cvar_get", &[value, value], Some(value));
    rt.declare(builder, "garnet_cvar_set", &[value, value, value], void);
    rt.declare(builder, "garnet_ivar_get", &[value, value], Some(value));
    rt.declare(builder, "garnet_ivar_set", &[value, value, value], void);

    // -- Closures --
    rt.declare(builder, "garnet_closure_alloc", &[i32_ty], Some(value));
    rt.declare(builder, "garnet_closure_elem", &[value, i32_ty], Some(ptr_ty));

    // -- Arguments --
    rt.declare(builder, "garnet_kwargs_rest", &[value], Some(value));
    rt.declare(builder, "garnet_kwargs_assert_empty", &[value], void);
    rt.declare(builder, "garnet_kwarg_get", &[value, value], Some(value));
    rt.declare(builder, "garnet_rest_args", &[i32_ty, i32_ty, ptr_ty], Some(value));

    // -- Control --
    let raise_arity = rt.declare(builder, "garnet_raise_arity", &[i32_ty, i32_ty, i32_ty], void);
    builder.add_noreturn_attribute(raise_arity);
    builder.add_cold_attribute(raise_arity);
    let set_line = rt.declare(builder, "garnet_set_line", &[i32_ty, ptr_ty], void);
    builder.add_nounwind_attribute(set_line);
    rt.declare(
        builder,
        "garnet_frame_alloc",
        &[value, value, value, value, value, i32_ty, i32_ty],
        Some(ptr_ty),
    );
    rt.declare(builder, "garnet_frame_set", &[ptr_ty], Some(ptr_ty));

    tracing::debug!(count = rt.len(), "declared runtime ABI");
    rt
}
