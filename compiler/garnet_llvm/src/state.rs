//! The per-module compilation context.
//!
//! `CompilerState` owns everything one compilation unit mutates: the
//! instruction builder (and through it the output module), the runtime ABI
//! handles, and the global cache table. It borrows the checked program
//! immutably, so several units can share one `Program`.
//!
//! All cache mutation goes through `&mut CompilerState`; there is no
//! interior locking.

use std::path::Path;

use garnet_ir::Program;
use tracing::{debug, instrument};

use crate::cache::GlobalCache;
use crate::codegen::{declare_runtime, CtorEntry, IrBuilder, LLVMTypeId, RuntimeFunctions, ValueId};
use crate::config::CodegenConfig;
use crate::context::SimpleCx;
use crate::error::CodegenError;

/// Types used throughout the runtime ABI, registered once per module.
#[derive(Clone, Copy, Debug)]
pub(crate) struct AbiTypes {
    /// A runtime value (tagged machine word).
    pub value: LLVMTypeId,
    pub bool: LLVMTypeId,
    pub i32: LLVMTypeId,
    pub ptr: LLVMTypeId,
    /// `{ i64 }`, the layout of a private variable slot.
    pub slot: LLVMTypeId,
}

impl AbiTypes {
    fn register(irb: &mut IrBuilder<'_, '_>) -> Self {
        let scx = irb.scx();
        let slot = irb.register_type(scx.type_struct(&[scx.type_i64().into()], false).into());
        Self {
            value: irb.i64_type(),
            bool: irb.bool_type(),
            i32: irb.i32_type(),
            ptr: irb.ptr_type(),
            slot,
        }
    }
}

/// Compilation context for one output module.
///
/// Lifetimes:
/// - `'a`: the borrowed checked program.
/// - `'scx` / `'ctx`: as for [`IrBuilder`].
pub struct CompilerState<'a, 'scx, 'ctx> {
    pub(crate) irb: IrBuilder<'scx, 'ctx>,
    pub(crate) program: &'a Program,
    pub(crate) runtime: RuntimeFunctions,
    pub(crate) cache: GlobalCache,
    pub(crate) types: AbiTypes,
    config: CodegenConfig,
    finished: bool,
}

impl<'a, 'scx, 'ctx> CompilerState<'a, 'scx, 'ctx> {
    /// Create the context and declare the runtime ABI in `scx`'s module.
    pub fn new(scx: &'scx SimpleCx<'ctx>, program: &'a Program, config: CodegenConfig) -> Self {
        let mut irb = IrBuilder::new(scx);
        let runtime = declare_runtime(&mut irb);
        let types = AbiTypes::register(&mut irb);
        Self {
            irb,
            program,
            runtime,
            cache: GlobalCache::new(),
            types,
            config,
            finished: false,
        }
    }

    /// The instruction builder, for statement lowering layered on top.
    pub fn builder(&mut self) -> &mut IrBuilder<'scx, 'ctx> {
        &mut self.irb
    }

    pub fn program(&self) -> &'a Program {
        self.program
    }

    pub fn config(&self) -> &CodegenConfig {
        &self.config
    }

    /// The global cache table (read-only; entries are created through
    /// `get_or_create` and `load_cached`).
    pub fn cache(&self) -> &GlobalCache {
        &self.cache
    }

    pub fn runtime(&self) -> &RuntimeFunctions {
        &self.runtime
    }

    /// Call the runtime function `name`.
    pub(crate) fn call_runtime(&mut self, name: &str, args: &[ValueId], label: &str) -> Option<ValueId> {
        let func = self.runtime.get(name);
        self.irb.call(func, args, label)
    }

    /// Call the runtime function `name`, which must return a value.
    pub(crate) fn call_runtime_value(&mut self, name: &str, args: &[ValueId], label: &str) -> ValueId {
        match self.call_runtime(name, args, label) {
            Some(value) => value,
            None => crate::ice!("runtime function `{name}` returns void"),
        }
    }

    /// Finish the module: register every cache initializer in
    /// `llvm.global_ctors`, optionally dump the IR, and verify it.
    ///
    /// Must be called exactly once, after the last method.
    #[instrument(skip(self), level = "debug")]
    pub fn finish(&mut self) -> Result<(), CodegenError> {
        if self.finished {
            crate::ice!("module finished twice");
        }
        self.finished = true;

        let priority = self.config.ctor_priority;
        let entries: Vec<CtorEntry> = self
            .cache
            .cells()
            .map(|cell| CtorEntry {
                priority,
                function: cell.initializer,
                data: cell.global,
            })
            .collect();
        debug!(initializers = entries.len(), "registering module initializers");
        self.irb.emit_global_ctors(&entries);

        let module = &self.irb.scx().llmod;
        if self.config.dump_ir {
            eprintln!("{}", module.print_to_string().to_string());
        }
        if self.config.verify {
            module.verify().map_err(|err| CodegenError::Verification {
                module: module.get_name().to_string_lossy().into_owned(),
                message: err.to_string(),
            })?;
        }
        Ok(())
    }

    /// Write the module's textual IR to `path`.
    pub fn write_ir(&self, path: &Path) -> Result<(), CodegenError> {
        self.irb
            .scx()
            .llmod
            .print_to_file(path)
            .map_err(|err| CodegenError::ir_emission(path, err.to_string()))
    }
}
