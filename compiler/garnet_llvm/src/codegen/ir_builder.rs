//! ID-based LLVM instruction builder.
//!
//! `IrBuilder` wraps inkwell's `Builder`, stores all LLVM values in a
//! `ValueArena`, and exposes only opaque ID types to callers.
//!
//! # Method Organization
//!
//! | Category | Methods |
//! |----------|---------|
//! | Constants | `const_i32`, `const_i64`, `const_f64`, `const_bool`, `const_null_ptr` |
//! | Memory | `create_entry_alloca`, `load`, `store`, `struct_gep` |
//! | Integer ops | `or`, `icmp_slt`, `icmp_sgt` |
//! | Control flow | `br`, `cond_br`, `ret`, `ret_void`, `unreachable` |
//! | Calls | `call`, `call_expect_i1` |
//! | Phi nodes | `phi`, `add_phi_incoming` |
//! | Types | `register_type`, `bool_type`, `i32_type`, `i64_type`, ... |
//! | Blocks | `append_block`, `position_at_end`, `current_block`, ... |
//! | Functions | `declare_function`, `declare_internal_void_function`, ... |
//! | Globals | `add_internal_global`, `add_c_string_global`, `emit_global_ctors` |

use inkwell::attributes::{Attribute, AttributeLoc};
use inkwell::basic_block::BasicBlock;
use inkwell::builder::Builder as InkwellBuilder;
use inkwell::intrinsics::Intrinsic;
use inkwell::module::Linkage;
use inkwell::types::{BasicMetadataTypeEnum, BasicType, BasicTypeEnum};
use inkwell::values::{BasicValue, BasicValueEnum, FunctionValue, UnnamedAddress};
use inkwell::IntPredicate;

use crate::context::SimpleCx;

use super::value_id::{BlockId, FunctionId, LLVMTypeId, ValueArena, ValueId};

/// One `llvm.global_ctors` entry: priority, initializer, associated global.
#[derive(Clone, Copy, Debug)]
pub struct CtorEntry {
    pub priority: u32,
    pub function: FunctionId,
    pub data: ValueId,
}

/// ID-based LLVM IR builder.
///
/// Two lifetimes:
/// - `'ctx`: The LLVM context lifetime (from `Context::create()`).
/// - `'scx`: The borrow lifetime of the `SimpleCx` reference.
///
/// These are separate to avoid drop-checker issues where `IrBuilder`
/// and `SimpleCx` are local variables in the same scope.
pub struct IrBuilder<'scx, 'ctx> {
    builder: InkwellBuilder<'ctx>,
    scx: &'scx SimpleCx<'ctx>,
    arena: ValueArena<'ctx>,
    /// Currently-active function (set by `set_current_function`).
    current_function: Option<FunctionId>,
    /// Currently-active basic block (tracked for save/restore).
    current_block: Option<BlockId>,
}

impl<'scx, 'ctx> IrBuilder<'scx, 'ctx> {
    pub fn new(scx: &'scx SimpleCx<'ctx>) -> Self {
        Self {
            builder: scx.llcx.create_builder(),
            scx,
            arena: ValueArena::new(),
            current_function: None,
            current_block: None,
        }
    }

    /// Access the underlying `SimpleCx` for direct LLVM context operations.
    #[inline]
    pub fn scx(&self) -> &'scx SimpleCx<'ctx> {
        self.scx
    }

    // -----------------------------------------------------------------------
    // Constants
    // -----------------------------------------------------------------------

    #[inline]
    pub fn const_i32(&mut self, val: i32) -> ValueId {
        let v = self.scx.type_i32().const_int(val as u64, val < 0);
        self.arena.push_value(v.into())
    }

    #[inline]
    pub fn const_i64(&mut self, val: i64) -> ValueId {
        let v = self.scx.type_i64().const_int(val as u64, val < 0);
        self.arena.push_value(v.into())
    }

    #[inline]
    pub fn const_f64(&mut self, val: f64) -> ValueId {
        let v = self.scx.type_f64().const_float(val);
        self.arena.push_value(v.into())
    }

    #[inline]
    pub fn const_bool(&mut self, val: bool) -> ValueId {
        let v = self.scx.type_i1().const_int(u64::from(val), false);
        self.arena.push_value(v.into())
    }

    #[inline]
    pub fn const_null_ptr(&mut self) -> ValueId {
        let v = self.scx.type_ptr().const_null();
        self.arena.push_value(v.into())
    }

    // -----------------------------------------------------------------------
    // Memory
    // -----------------------------------------------------------------------

    /// Build an alloca at the start of `function`'s first block.
    ///
    /// Keeps every stack slot in the entry block so `mem2reg` can promote
    /// it. The current insertion point is preserved.
    pub fn create_entry_alloca(
        &mut self,
        function: FunctionId,
        name: &str,
        ty: LLVMTypeId,
    ) -> ValueId {
        let func_val = self.arena.get_function(function);
        let llvm_ty = self.arena.get_type(ty);

        let entry = func_val
            .get_first_basic_block()
            .expect("function has entry block");

        let saved_block = self.current_block;

        if let Some(first_instr) = entry.get_first_instruction() {
            self.builder.position_before(&first_instr);
        } else {
            self.builder.position_at_end(entry);
        }

        let ptr = self.builder.build_alloca(llvm_ty, name).expect("alloca");

        if let Some(block_id) = saved_block {
            let bb = self.arena.get_block(block_id);
            self.builder.position_at_end(bb);
        }

        self.arena.push_value(ptr.into())
    }

    pub fn load(&mut self, ty: LLVMTypeId, ptr: ValueId, name: &str) -> ValueId {
        let llvm_ty = self.arena.get_type(ty);
        let ptr_val = self.arena.get_value(ptr).into_pointer_value();
        let v = self
            .builder
            .build_load(llvm_ty, ptr_val, name)
            .expect("load");
        self.arena.push_value(v)
    }

    pub fn store(&mut self, val: ValueId, ptr: ValueId) {
        let v = self.arena.get_value(val);
        let p = self.arena.get_value(ptr).into_pointer_value();
        self.builder.build_store(p, v).expect("store");
    }

    /// Build a struct GEP (field access by index).
    pub fn struct_gep(
        &mut self,
        struct_ty: LLVMTypeId,
        ptr: ValueId,
        index: u32,
        name: &str,
    ) -> ValueId {
        let BasicTypeEnum::StructType(struct_t) = self.arena.get_type(struct_ty) else {
            crate::ice!("struct_gep on non-struct type {struct_ty:?}");
        };
        let ptr_val = self.arena.get_value(ptr).into_pointer_value();
        let v = self
            .builder
            .build_struct_gep(struct_t, ptr_val, index, name)
            .expect("struct_gep");
        self.arena.push_value(v.into())
    }

    // -----------------------------------------------------------------------
    // Integer operations
    // -----------------------------------------------------------------------

    /// Build bitwise OR.
    pub fn or(&mut self, lhs: ValueId, rhs: ValueId, name: &str) -> ValueId {
        let l = self.arena.get_value(lhs);
        let r = self.arena.get_value(rhs);
        debug_assert!(
            l.is_int_value() && r.is_int_value(),
            "or requires int operands"
        );
        let v = self
            .builder
            .build_or(l.into_int_value(), r.into_int_value(), name)
            .expect("or");
        self.arena.push_value(v.into())
    }

    fn icmp_impl(&mut self, pred: IntPredicate, lhs: ValueId, rhs: ValueId, name: &str) -> ValueId {
        let l = self.arena.get_value(lhs);
        let r = self.arena.get_value(rhs);
        debug_assert!(
            l.is_int_value() && r.is_int_value(),
            "icmp requires int operands"
        );
        let v = self
            .builder
            .build_int_compare(pred, l.into_int_value(), r.into_int_value(), name)
            .expect("icmp");
        self.arena.push_value(v.into())
    }

    /// Signed less than.
    pub fn icmp_slt(&mut self, lhs: ValueId, rhs: ValueId, name: &str) -> ValueId {
        self.icmp_impl(IntPredicate::SLT, lhs, rhs, name)
    }

    /// Signed greater than.
    pub fn icmp_sgt(&mut self, lhs: ValueId, rhs: ValueId, name: &str) -> ValueId {
        self.icmp_impl(IntPredicate::SGT, lhs, rhs, name)
    }

    // -----------------------------------------------------------------------
    // Control flow
    // -----------------------------------------------------------------------

    pub fn br(&mut self, dest: BlockId) {
        let bb = self.arena.get_block(dest);
        self.builder
            .build_unconditional_branch(bb)
            .expect("build_br");
    }

    pub fn cond_br(&mut self, cond: ValueId, then_bb: BlockId, else_bb: BlockId) {
        let c = self.arena.get_value(cond).into_int_value();
        let then_block = self.arena.get_block(then_bb);
        let else_block = self.arena.get_block(else_bb);
        self.builder
            .build_conditional_branch(c, then_block, else_block)
            .expect("build_cond_br");
    }

    pub fn ret(&mut self, val: ValueId) {
        let v = self.arena.get_value(val);
        self.builder.build_return(Some(&v)).expect("build_return");
    }

    pub fn ret_void(&mut self) {
        self.builder.build_return(None).expect("build_return");
    }

    pub fn unreachable(&mut self) {
        self.builder.build_unreachable().expect("build_unreachable");
    }

    // -----------------------------------------------------------------------
    // Calls
    // -----------------------------------------------------------------------

    /// Build a direct function call.
    ///
    /// Returns `None` for void-returning functions.
    pub fn call(&mut self, callee: FunctionId, args: &[ValueId], name: &str) -> Option<ValueId> {
        let func = self.arena.get_function(callee);
        let arg_vals: Vec<inkwell::values::BasicMetadataValueEnum<'ctx>> = args
            .iter()
            .map(|&id| self.arena.get_value(id).into())
            .collect();
        let call_val = self
            .builder
            .build_call(func, &arg_vals, name)
            .expect("call");
        call_val
            .try_as_basic_value()
            .basic()
            .map(|v| self.arena.push_value(v))
    }

    /// Call `llvm.expect.i1(cond, expected)`.
    ///
    /// The result is `cond` itself; the call only carries the branch hint.
    pub fn call_expect_i1(&mut self, cond: ValueId, expected: bool, name: &str) -> ValueId {
        let intrinsic = Intrinsic::find("llvm.expect").expect("llvm.expect intrinsic exists");
        let decl = intrinsic
            .get_declaration(&self.scx.llmod, &[self.scx.type_i1().into()])
            .expect("llvm.expect.i1 declaration");
        let func = self.arena.push_function(decl);
        let expected = self.const_bool(expected);
        self.call(func, &[cond, expected], name)
            .expect("llvm.expect returns a value")
    }

    // -----------------------------------------------------------------------
    // Phi nodes
    // -----------------------------------------------------------------------

    /// Build an empty phi node. Incoming edges are added with
    /// `add_phi_incoming`.
    pub fn phi(&mut self, ty: LLVMTypeId, name: &str) -> ValueId {
        let llvm_ty = self.arena.get_type(ty);
        let phi = self.builder.build_phi(llvm_ty, name).expect("phi");
        self.arena.push_value(phi.as_basic_value())
    }

    /// Add incoming values to a phi node created by `phi`.
    pub fn add_phi_incoming(&mut self, phi: ValueId, incoming: &[(ValueId, BlockId)]) {
        use inkwell::values::AsValueRef;

        let phi_val = self.arena.get_value(phi);

        // SAFETY: `phi_val` was created by `build_phi` and stored via
        // `as_basic_value()`. The underlying LLVMValueRef is still a phi.
        let raw_phi = unsafe { inkwell::values::PhiValue::new(phi_val.as_value_ref()) };

        let vals: Vec<BasicValueEnum<'ctx>> = incoming
            .iter()
            .map(|&(v, _)| self.arena.get_value(v))
            .collect();
        let blocks: Vec<BasicBlock<'ctx>> = incoming
            .iter()
            .map(|&(_, b)| self.arena.get_block(b))
            .collect();

        let refs: Vec<(&dyn BasicValue<'ctx>, BasicBlock<'ctx>)> = vals
            .iter()
            .zip(blocks.iter())
            .map(|(v, &b)| (v as &dyn BasicValue<'ctx>, b))
            .collect();
        raw_phi.add_incoming(&refs);
    }

    // -----------------------------------------------------------------------
    // Type registration
    // -----------------------------------------------------------------------

    /// Register an LLVM type in the arena.
    pub fn register_type(&mut self, ty: BasicTypeEnum<'ctx>) -> LLVMTypeId {
        self.arena.push_type(ty)
    }

    #[inline]
    pub fn bool_type(&mut self) -> LLVMTypeId {
        self.arena.push_type(self.scx.type_i1().into())
    }

    #[inline]
    pub fn i32_type(&mut self) -> LLVMTypeId {
        self.arena.push_type(self.scx.type_i32().into())
    }

    #[inline]
    pub fn i64_type(&mut self) -> LLVMTypeId {
        self.arena.push_type(self.scx.type_i64().into())
    }

    #[inline]
    pub fn f64_type(&mut self) -> LLVMTypeId {
        self.arena.push_type(self.scx.type_f64().into())
    }

    #[inline]
    pub fn ptr_type(&mut self) -> LLVMTypeId {
        self.arena.push_type(self.scx.type_ptr().into())
    }

    // -----------------------------------------------------------------------
    // Block management
    // -----------------------------------------------------------------------

    /// Append a new basic block to a function.
    pub fn append_block(&mut self, function: FunctionId, name: &str) -> BlockId {
        let func = self.arena.get_function(function);
        let bb = self.scx.llcx.append_basic_block(func, name);
        self.arena.push_block(bb)
    }

    /// Position the builder at the end of a basic block.
    pub fn position_at_end(&mut self, block: BlockId) {
        let bb = self.arena.get_block(block);
        self.builder.position_at_end(bb);
        self.current_block = Some(block);
    }

    #[inline]
    pub fn current_block(&self) -> Option<BlockId> {
        self.current_block
    }

    /// Check if the current block is already terminated.
    pub fn current_block_terminated(&self) -> bool {
        self.current_block
            .is_some_and(|id| self.arena.get_block(id).get_terminator().is_some())
    }

    pub fn block_has_terminator(&self, block: BlockId) -> bool {
        self.arena.get_block(block).get_terminator().is_some()
    }

    /// The function the insertion point currently belongs to.
    ///
    /// Read from LLVM rather than from `current_function`, so it reflects
    /// where instructions will actually land.
    pub fn insertion_function(&self) -> Option<FunctionValue<'ctx>> {
        self.builder.get_insert_block().and_then(|bb| bb.get_parent())
    }

    // -----------------------------------------------------------------------
    // Position management
    // -----------------------------------------------------------------------

    /// Save the current builder position, returning the block ID.
    ///
    /// Call `restore_position` with the returned ID to restore.
    #[inline]
    pub fn save_position(&self) -> Option<BlockId> {
        self.current_block
    }

    /// Restore builder position to a previously saved block.
    pub fn restore_position(&mut self, saved: Option<BlockId>) {
        if let Some(block_id) = saved {
            let bb = self.arena.get_block(block_id);
            self.builder.position_at_end(bb);
            self.current_block = Some(block_id);
        }
    }

    // -----------------------------------------------------------------------
    // Function management
    // -----------------------------------------------------------------------

    pub fn set_current_function(&mut self, func: Option<FunctionId>) {
        self.current_function = func;
    }

    #[inline]
    pub fn current_function(&self) -> Option<FunctionId> {
        self.current_function
    }

    /// Get the inkwell `FunctionValue` for any function ID.
    pub fn get_function_value(&self, id: FunctionId) -> FunctionValue<'ctx> {
        self.arena.get_function(id)
    }

    /// Number of function handles issued so far.
    #[cfg(test)]
    pub(crate) fn function_count(&self) -> usize {
        self.arena.function_count()
    }

    /// Get a function parameter as a `ValueId`.
    pub fn get_param(&mut self, func: FunctionId, param_index: u32) -> ValueId {
        let func_val = self.arena.get_function(func);
        let param = func_val
            .get_nth_param(param_index)
            .expect("parameter index out of bounds");
        self.arena.push_value(param)
    }

    /// Set the debug name of a value.
    pub fn set_value_name(&self, val: ValueId, name: &str) {
        self.arena.get_value(val).set_name(name);
    }

    /// Declare a function in the LLVM module.
    pub fn declare_function(
        &mut self,
        name: &str,
        param_types: &[LLVMTypeId],
        return_type: LLVMTypeId,
    ) -> FunctionId {
        let ret_ty = self.arena.get_type(return_type);
        let param_tys: Vec<BasicMetadataTypeEnum<'ctx>> = param_types
            .iter()
            .map(|&id| self.arena.get_type(id).into())
            .collect();
        let fn_type = ret_ty.fn_type(&param_tys, false);
        let func = self.scx.llmod.add_function(name, fn_type, None);
        self.arena.push_function(func)
    }

    /// Declare an internal `void()` function, used for module-load
    /// initializers.
    pub fn declare_internal_void_function(&mut self, name: &str) -> FunctionId {
        let fn_type = self.scx.type_void_func(&[]);
        let func = self
            .scx
            .llmod
            .add_function(name, fn_type, Some(Linkage::Internal));
        self.arena.push_function(func)
    }

    /// Declare an external function with `External` linkage.
    ///
    /// Used for runtime ABI entry points, which are resolved at link time
    /// (AOT) or through symbol mapping (JIT). Reuses an existing declaration
    /// of the same name.
    pub fn declare_extern_function(
        &mut self,
        name: &str,
        param_types: &[LLVMTypeId],
        return_type: Option<LLVMTypeId>,
    ) -> FunctionId {
        if let Some(func) = self.scx.llmod.get_function(name) {
            return self.arena.push_function(func);
        }

        let param_tys: Vec<BasicMetadataTypeEnum<'ctx>> = param_types
            .iter()
            .map(|&id| self.arena.get_type(id).into())
            .collect();

        let fn_type = match return_type {
            Some(ret_id) => self.arena.get_type(ret_id).fn_type(&param_tys, false),
            None => self.scx.type_void_func(&param_tys),
        };

        let func = self
            .scx
            .llmod
            .add_function(name, fn_type, Some(Linkage::External));
        self.arena.push_function(func)
    }

    // -----------------------------------------------------------------------
    // Function attributes
    // -----------------------------------------------------------------------

    fn add_function_attribute(&mut self, func: FunctionId, name: &str) {
        let f = self.arena.get_function(func);
        let kind = Attribute::get_named_enum_kind_id(name);
        let attr = self.scx.llcx.create_enum_attribute(kind, 0);
        f.add_attribute(AttributeLoc::Function, attr);
    }

    /// Add the `cold` attribute: calls are treated as unlikely.
    pub fn add_cold_attribute(&mut self, func: FunctionId) {
        self.add_function_attribute(func, "cold");
    }

    /// Add the `noreturn` attribute.
    pub fn add_noreturn_attribute(&mut self, func: FunctionId) {
        self.add_function_attribute(func, "noreturn");
    }

    /// Add the `nounwind` attribute.
    pub fn add_nounwind_attribute(&mut self, func: FunctionId) {
        self.add_function_attribute(func, "nounwind");
    }

    // -----------------------------------------------------------------------
    // Globals
    // -----------------------------------------------------------------------

    /// Define an internal, `unnamed_addr`, 8-aligned mutable global of type
    /// `ty` initialized to `init`. Returns a pointer to it.
    pub fn add_internal_global(&mut self, name: &str, ty: LLVMTypeId, init: ValueId) -> ValueId {
        let llvm_ty = self.arena.get_type(ty);
        let init_val = self.arena.get_value(init);
        let global = self.scx.llmod.add_global(llvm_ty, None, name);
        global.set_linkage(Linkage::Internal);
        global.set_unnamed_address(UnnamedAddress::Global);
        global.set_alignment(8);
        global.set_initializer(&init_val);
        self.arena.push_value(global.as_pointer_value().into())
    }

    /// Define a private constant null-terminated byte string and return a
    /// pointer to its first byte.
    pub fn add_c_string_global(&mut self, name: &str, text: &str) -> ValueId {
        let bytes = self.scx.llcx.const_string(text.as_bytes(), true);
        let global = self.scx.llmod.add_global(bytes.get_type(), None, name);
        global.set_linkage(Linkage::Private);
        global.set_constant(true);
        global.set_unnamed_address(UnnamedAddress::Global);
        global.set_alignment(1);
        global.set_initializer(&bytes);
        self.arena.push_value(global.as_pointer_value().into())
    }

    /// Emit `@llvm.global_ctors` with one `{ i32, ptr, ptr }` entry per
    /// `entries` element, in order. Does nothing for an empty list.
    pub fn emit_global_ctors(&mut self, entries: &[CtorEntry]) {
        if entries.is_empty() {
            return;
        }
        let scx = self.scx;
        let entry_ty = scx.type_struct(
            &[
                scx.type_i32().into(),
                scx.type_ptr().into(),
                scx.type_ptr().into(),
            ],
            false,
        );
        let elements: Vec<_> = entries
            .iter()
            .map(|entry| {
                let function = self
                    .arena
                    .get_function(entry.function)
                    .as_global_value()
                    .as_pointer_value();
                let data = self.arena.get_value(entry.data);
                entry_ty.const_named_struct(&[
                    scx.type_i32()
                        .const_int(u64::from(entry.priority), false)
                        .into(),
                    function.into(),
                    data,
                ])
            })
            .collect();
        let array = entry_ty.const_array(&elements);
        let global = scx.llmod.add_global(
            entry_ty.array_type(elements.len() as u32),
            None,
            "llvm.global_ctors",
        );
        global.set_linkage(Linkage::Appending);
        global.set_initializer(&array);
    }
}

#[cfg(test)]
mod tests;
