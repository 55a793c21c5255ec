//! Low-level LLVM plumbing shared by every payload helper.
//!
//! - [`value_id`]: opaque handles and the arena behind them
//! - [`ir_builder`]: ID-based instruction builder over inkwell
//! - [`runtime_decl`]: declarations of the runtime ABI

pub mod ir_builder;
pub mod runtime_decl;
pub mod value_id;

pub use ir_builder::{CtorEntry, IrBuilder};
pub use runtime_decl::{declare_runtime, RuntimeFunctions};
pub use value_id::{BlockId, FunctionId, LLVMTypeId, ValueId};
