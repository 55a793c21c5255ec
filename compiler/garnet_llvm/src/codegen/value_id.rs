//! Opaque ID newtypes and the `ValueArena` behind `IrBuilder`.
//!
//! Every LLVM value, type, block and function the payload layer touches is
//! stored in a `ValueArena` and referenced by a `Copy` handle. Callers never
//! see inkwell's `'ctx` lifetime, which lets `MethodContext`, `MethodEntry`
//! and the global cache hold handles without borrowing the builder.
//!
//! Each ID is a `u32` index into the corresponding arena `Vec`.

use inkwell::basic_block::BasicBlock;
use inkwell::types::BasicTypeEnum;
use inkwell::values::{BasicValueEnum, FunctionValue};

/// Handle to an LLVM value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ValueId(u32);

/// Handle to an LLVM type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LLVMTypeId(u32);

/// Handle to an LLVM basic block.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BlockId(u32);

/// Handle to an LLVM function.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FunctionId(u32);

/// Stores LLVM values behind opaque IDs.
///
/// Internal to `IrBuilder`. Handles are only meaningful for the arena that
/// produced them; there is no removal, so a handle stays valid for the
/// builder's whole lifetime.
pub(crate) struct ValueArena<'ctx> {
    values: Vec<BasicValueEnum<'ctx>>,
    types: Vec<BasicTypeEnum<'ctx>>,
    blocks: Vec<BasicBlock<'ctx>>,
    functions: Vec<FunctionValue<'ctx>>,
}

impl<'ctx> ValueArena<'ctx> {
    pub(crate) fn new() -> Self {
        Self {
            values: Vec::new(),
            types: Vec::new(),
            blocks: Vec::new(),
            functions: Vec::new(),
        }
    }

    #[inline]
    pub(crate) fn push_value(&mut self, val: BasicValueEnum<'ctx>) -> ValueId {
        let id = self.values.len();
        self.values.push(val);
        ValueId(id as u32)
    }

    #[inline]
    pub(crate) fn get_value(&self, id: ValueId) -> BasicValueEnum<'ctx> {
        debug_assert!(
            (id.0 as usize) < self.values.len(),
            "ValueId {} out of bounds (arena has {} values)",
            id.0,
            self.values.len()
        );
        self.values[id.0 as usize]
    }

    #[inline]
    pub(crate) fn push_type(&mut self, ty: BasicTypeEnum<'ctx>) -> LLVMTypeId {
        let id = self.types.len();
        self.types.push(ty);
        LLVMTypeId(id as u32)
    }

    #[inline]
    pub(crate) fn get_type(&self, id: LLVMTypeId) -> BasicTypeEnum<'ctx> {
        debug_assert!(
            (id.0 as usize) < self.types.len(),
            "LLVMTypeId {} out of bounds (arena has {} types)",
            id.0,
            self.types.len()
        );
        self.types[id.0 as usize]
    }

    #[inline]
    pub(crate) fn push_block(&mut self, bb: BasicBlock<'ctx>) -> BlockId {
        let id = self.blocks.len();
        self.blocks.push(bb);
        BlockId(id as u32)
    }

    #[inline]
    pub(crate) fn get_block(&self, id: BlockId) -> BasicBlock<'ctx> {
        debug_assert!(
            (id.0 as usize) < self.blocks.len(),
            "BlockId {} out of bounds (arena has {} blocks)",
            id.0,
            self.blocks.len()
        );
        self.blocks[id.0 as usize]
    }

    #[inline]
    pub(crate) fn push_function(&mut self, func: FunctionValue<'ctx>) -> FunctionId {
        let id = self.functions.len();
        self.functions.push(func);
        FunctionId(id as u32)
    }

    #[inline]
    pub(crate) fn get_function(&self, id: FunctionId) -> FunctionValue<'ctx> {
        debug_assert!(
            (id.0 as usize) < self.functions.len(),
            "FunctionId {} out of bounds (arena has {} functions)",
            id.0,
            self.functions.len()
        );
        self.functions[id.0 as usize]
    }

    #[cfg(test)]
    pub(crate) fn function_count(&self) -> usize {
        self.functions.len()
    }
}
