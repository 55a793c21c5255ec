//! Per-method compilation context.
//!
//! A [`MethodContext`] is created when a method starts compiling and lives
//! until it is finished. It resolves the storage of every local once, up
//! front, from the upstream [`MethodShape`]: aliased locals dispatch to a
//! field or constant, captured locals live in the closure environment,
//! and everything else gets a private stack slot.
//!
//! Compiled methods share one native signature:
//!
//! ```text
//! i64 @func_<Owner#name>(i32 %argc, ptr %argv, i64 %self)
//! ```

use garnet_ir::{Alias, LocalVariable, MethodShape, ParamSpec, SourceBlockId, SymbolId};
use rustc_hash::FxHashMap;
use tracing::{debug, instrument};

use crate::cache::MethodEntry;
use crate::codegen::{FunctionId, ValueId};
use crate::state::CompilerState;

/// Where a local variable lives.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum VariableStorage {
    /// A `{ i64 }` stack slot in the method's entry block.
    Private { slot: ValueId },
    /// An element of the closure environment shared with nested blocks.
    Closure { index: u32 },
    /// A synonym for a field or constant.
    Alias(Alias),
}

/// Incoming arguments of a compiled method.
#[derive(Copy, Clone, Debug)]
pub struct MethodArgs {
    pub argc: ValueId,
    pub argv: ValueId,
    pub receiver: ValueId,
}

/// State of one method being compiled.
pub struct MethodContext {
    pub(crate) symbol: SymbolId,
    pub(crate) function: FunctionId,
    pub(crate) entry: MethodEntry,
    pub(crate) params: ParamSpec,
    args: MethodArgs,
    storage: FxHashMap<LocalVariable, VariableStorage>,
    captured_count: u32,
    closure_envs: Vec<Option<ValueId>>,
    /// Entry-block slot holding the control-frame handle, once installed.
    pub(crate) frame_slot: Option<ValueId>,
    /// Line of the last emitted line-number update.
    pub(crate) last_line: Option<u32>,
}

impl MethodContext {
    #[inline]
    pub fn symbol(&self) -> SymbolId {
        self.symbol
    }

    #[inline]
    pub fn function(&self) -> FunctionId {
        self.function
    }

    #[inline]
    pub fn args(&self) -> MethodArgs {
        self.args
    }

    pub fn params(&self) -> &ParamSpec {
        &self.params
    }

    /// The entry capability, for cached loads made by statement lowering.
    pub fn entry_mut(&mut self) -> &mut MethodEntry {
        &mut self.entry
    }

    /// How `local` is stored. Panics for a local the method never declared.
    pub fn storage(&self, local: LocalVariable) -> VariableStorage {
        match self.storage.get(&local) {
            Some(&storage) => storage,
            None => crate::ice!("local {local:?} is not declared in method {:?}", self.symbol),
        }
    }

    /// Number of locals living in the closure environment.
    pub fn captured_count(&self) -> u32 {
        self.captured_count
    }

    /// Install the closure environment handle for `block`.
    pub fn set_closure_env(&mut self, block: SourceBlockId, env: ValueId) {
        match self.closure_envs.get_mut(block.index()) {
            Some(slot) => *slot = Some(env),
            None => crate::ice!(
                "block {block:?} out of range for method {:?} ({} blocks)",
                self.symbol,
                self.closure_envs.len()
            ),
        }
    }

    /// The closure environment handle of `block`.
    pub fn closure_env(&self, block: SourceBlockId) -> ValueId {
        match self.closure_envs.get(block.index()).copied().flatten() {
            Some(env) => env,
            None => crate::ice!(
                "captured variable accessed in block {block:?} of {:?} with no closure environment",
                self.symbol
            ),
        }
    }
}

impl CompilerState<'_, '_, '_> {
    /// Declare the native function for `shape`'s method and start compiling
    /// it. The builder is left at the start of the method body, with
    /// `self` already bound.
    #[instrument(skip(self, shape), fields(method = ?shape.symbol), level = "debug")]
    pub fn begin_method(&mut self, shape: &MethodShape) -> MethodContext {
        let program = self.program;
        if !program.symbols.is_method(shape.symbol) {
            crate::ice!("begin_method on non-method symbol {:?}", shape.symbol);
        }
        let name = format!(
            "func_{}",
            program.symbols.unique_method_name(&program.interner, shape.symbol)
        );
        let types = self.types;
        let function = self
            .irb
            .declare_function(&name, &[types.i32, types.ptr, types.value], types.value);
        let entry = MethodEntry::open(&mut self.irb, function, "body");

        let args = MethodArgs {
            argc: self.irb.get_param(function, 0),
            argv: self.irb.get_param(function, 1),
            receiver: self.irb.get_param(function, 2),
        };
        self.irb.set_value_name(args.argc, "argc");
        self.irb.set_value_name(args.argv, "argv");
        self.irb.set_value_name(args.receiver, "selfRaw");

        let (storage, captured_count) = self.resolve_storage(shape, function);
        let mut ctx = MethodContext {
            symbol: shape.symbol,
            function,
            entry,
            params: shape.params.clone(),
            args,
            storage,
            captured_count,
            closure_envs: vec![None; shape.block_count as usize + 1],
            frame_slot: None,
            last_line: None,
        };
        self.var_set(&mut ctx, LocalVariable::SELF, args.receiver, SourceBlockId::MAIN);
        debug!(function = %name, captured = captured_count, "began method");
        ctx
    }

    /// Finish the method: close its entry block.
    ///
    /// The body must already end in a terminator.
    pub fn finish_method(&mut self, ctx: &mut MethodContext) {
        if !self.irb.current_block_terminated() {
            crate::ice!("method {:?} finished with an open block", ctx.symbol);
        }
        self.seal_entry(&mut ctx.entry);
        self.irb.set_current_function(None);
    }

    /// Allocate the main body's closure environment, sized for every
    /// captured local, and install it.
    pub fn alloc_closure_env(&mut self, ctx: &mut MethodContext) -> ValueId {
        let count = self.irb.const_i32(ctx.captured_count as i32);
        let env = self.call_runtime_value("garnet_closure_alloc", &[count], "closureEnv");
        ctx.set_closure_env(SourceBlockId::MAIN, env);
        env
    }

    fn resolve_storage(
        &mut self,
        shape: &MethodShape,
        function: FunctionId,
    ) -> (FxHashMap<LocalVariable, VariableStorage>, u32) {
        let mut storage = FxHashMap::default();

        for (&local, &alias) in &shape.aliases {
            if shape.escaped.contains(&local) {
                crate::ice!(
                    "local {local:?} of {:?} is both an alias and captured",
                    shape.symbol
                );
            }
            storage.insert(local, VariableStorage::Alias(alias));
        }

        let mut captured: Vec<LocalVariable> = shape
            .escaped
            .iter()
            .copied()
            .filter(|local| !local.is_self())
            .collect();
        captured.sort_unstable();
        for (index, &local) in captured.iter().enumerate() {
            storage.insert(
                local,
                VariableStorage::Closure {
                    index: index as u32,
                },
            );
        }

        let privates = std::iter::once(LocalVariable::SELF).chain(shape.locals.iter().copied());
        for local in privates {
            if storage.contains_key(&local) {
                continue;
            }
            let name = if local.is_self() {
                "self"
            } else {
                self.program.interner.lookup(local.name)
            };
            let slot = self.irb.create_entry_alloca(function, name, self.types.slot);
            storage.insert(local, VariableStorage::Private { slot });
        }

        (storage, captured.len() as u32)
    }
}
