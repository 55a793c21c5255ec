//! Process-wide cached values.
//!
//! Interned identifiers, frozen string literals and stack-frame
//! descriptors are computed once per process, at module-load time, and
//! then read by every method that needs them. Each cached value lives in an
//! internal global cell with its own initializer function; `finish`
//! registers the initializers in `llvm.global_ctors`.
//!
//! Inside a method, a cell is loaded once, in the method's entry
//! initializer block, and the loaded value is reused for the rest of the
//! method. [`MethodEntry`] is the capability that names that block.
//!
//! ```text
//! define i64 @func_Foo#bar(...) {
//! entryInitializers:            ; cached loads land here
//!   %id_count = load i64, ptr @id.count
//!   br label %body
//! body:                         ; user code
//!   ...
//! }
//! ```

use std::fmt;

use rustc_hash::FxHashMap;
use tracing::{debug, trace};

use crate::codegen::{BlockId, FunctionId, IrBuilder, LLVMTypeId, ValueId};
use crate::state::CompilerState;

/// Kind of value held by a cache cell.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum CacheKind {
    /// A frozen string built from a literal.
    FrozenString,
    /// An interned identifier.
    InternedId,
    /// A method's stack-frame descriptor.
    StackFrame,
}

impl CacheKind {
    fn global_prefix(self) -> &'static str {
        match self {
            CacheKind::FrozenString => "frozen",
            CacheKind::InternedId => "id",
            CacheKind::StackFrame => "frame",
        }
    }

    fn load_prefix(self) -> &'static str {
        match self {
            CacheKind::FrozenString => "str",
            CacheKind::InternedId => "id",
            CacheKind::StackFrame => "stackFrame",
        }
    }
}

/// Identity of a cache cell: two requests with equal keys share one cell.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub kind: CacheKind,
    pub key: String,
}

impl CacheKey {
    pub fn new(kind: CacheKind, key: impl Into<String>) -> Self {
        Self {
            kind,
            key: key.into(),
        }
    }

    pub fn frozen_string(text: &str) -> Self {
        Self::new(CacheKind::FrozenString, text)
    }

    pub fn interned_id(name: &str) -> Self {
        Self::new(CacheKind::InternedId, name)
    }

    /// Key for the frame of the method printed as `method` (`Foo#bar`).
    pub fn stack_frame(method: &str) -> Self {
        Self::new(CacheKind::StackFrame, method)
    }

    /// Name of the global cell.
    pub fn global_name(&self) -> String {
        format!("{}.{}", self.kind.global_prefix(), self.key)
    }

    /// Name given to the in-method load of the cell.
    pub fn load_name(&self) -> String {
        format!("{}_{}", self.kind.load_prefix(), self.key)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({})", self.kind, self.key)
    }
}

/// A created cache cell.
#[derive(Clone, Debug)]
pub struct GlobalCell {
    /// Pointer to the global.
    pub global: ValueId,
    /// Type stored in the global.
    pub ty: LLVMTypeId,
    /// The `void()` function that fills the global at load time.
    pub initializer: FunctionId,
    pub name: String,
}

/// All cache cells of one module, in creation order.
#[derive(Default)]
pub struct GlobalCache {
    cells: FxHashMap<CacheKey, GlobalCell>,
    order: Vec<CacheKey>,
    c_strings: FxHashMap<String, ValueId>,
}

impl GlobalCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &CacheKey) -> Option<&GlobalCell> {
        self.cells.get(key)
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        self.cells.contains_key(key)
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Number of initializers to run at module load. Every cell has
    /// exactly one.
    pub fn initializer_count(&self) -> usize {
        self.order.len()
    }

    /// Number of pooled C-string literals.
    pub fn c_string_count(&self) -> usize {
        self.c_strings.len()
    }

    /// Cells in creation order.
    pub fn cells(&self) -> impl Iterator<Item = &GlobalCell> + '_ {
        self.order.iter().map(|key| &self.cells[key])
    }

    fn insert(&mut self, key: CacheKey, cell: GlobalCell) {
        self.order.push(key.clone());
        self.cells.insert(key, cell);
    }
}

/// The entry initializer block of one function.
///
/// Created when a method (or cache initializer) starts; cached loads for
/// that function are appended to `block`, and each cell is loaded at most
/// once. Sealing branches from `block` to `body`.
#[derive(Debug)]
pub struct MethodEntry {
    function: FunctionId,
    block: BlockId,
    body: BlockId,
    loaded: FxHashMap<CacheKey, ValueId>,
    sealed: bool,
}

impl MethodEntry {
    /// Append the entry initializer block and the body block `body_name`
    /// to `function`, leaving the builder at the start of the body.
    pub(crate) fn open(irb: &mut IrBuilder<'_, '_>, function: FunctionId, body_name: &str) -> Self {
        let block = irb.append_block(function, "entryInitializers");
        let body = irb.append_block(function, body_name);
        irb.position_at_end(body);
        irb.set_current_function(Some(function));
        Self {
            function,
            block,
            body,
            loaded: FxHashMap::default(),
            sealed: false,
        }
    }

    #[inline]
    pub fn function(&self) -> FunctionId {
        self.function
    }

    #[inline]
    pub fn block(&self) -> BlockId {
        self.block
    }

    #[inline]
    pub fn body(&self) -> BlockId {
        self.body
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    /// Number of distinct cells loaded in this function.
    pub fn loaded_count(&self) -> usize {
        self.loaded.len()
    }
}

impl CompilerState<'_, '_, '_> {
    /// Return the cell for `key`, creating it on first request.
    ///
    /// On creation, `populate` runs inside the cell's fresh initializer
    /// function (with its own [`MethodEntry`]) and must return the value to
    /// store. A later request with an equal key returns the same cell and
    /// does not run `populate`. The builder position is preserved.
    pub fn get_or_create(
        &mut self,
        key: &CacheKey,
        populate: impl FnOnce(&mut Self, &mut MethodEntry) -> ValueId,
    ) -> GlobalCell {
        if let Some(cell) = self.cache.get(key) {
            return cell.clone();
        }

        let name = key.global_name();
        let (ty, zero) = match key.kind {
            CacheKind::StackFrame => (self.types.ptr, self.irb.const_null_ptr()),
            CacheKind::FrozenString | CacheKind::InternedId => {
                (self.types.value, self.irb.const_i64(0))
            }
        };
        let global = self.irb.add_internal_global(&name, ty, zero);
        let initializer = self
            .irb
            .declare_internal_void_function(&format!("init.{name}"));

        let saved_block = self.irb.save_position();
        let saved_function = self.irb.current_function();

        let mut init_entry = MethodEntry::open(&mut self.irb, initializer, "constr");
        let value = populate(self, &mut init_entry);
        self.irb.store(value, global);
        self.irb.ret_void();
        self.seal_entry(&mut init_entry);

        self.irb.restore_position(saved_block);
        self.irb.set_current_function(saved_function);

        let cell = GlobalCell {
            global,
            ty,
            initializer,
            name,
        };
        debug!(%key, global = %cell.name, "created cache cell");
        self.cache.insert(key.clone(), cell.clone());
        cell
    }

    /// Load the cell for `key` in `entry`'s function.
    ///
    /// The load is placed at the end of the entry initializer block and
    /// memoized, so a method reads each cell once no matter how many times
    /// it asks. The builder must currently be inside `entry`'s function.
    pub fn load_cached(
        &mut self,
        entry: &mut MethodEntry,
        key: &CacheKey,
        populate: impl FnOnce(&mut Self, &mut MethodEntry) -> ValueId,
    ) -> ValueId {
        let expected = self.irb.get_function_value(entry.function);
        match self.irb.insertion_function() {
            Some(current) if current == expected => {}
            Some(current) => crate::ice!(
                "cached load of {key} emitted from `{}` with the entry block of `{}`",
                current.get_name().to_string_lossy(),
                expected.get_name().to_string_lossy()
            ),
            None => crate::ice!("cached load of {key} with no insertion point"),
        }
        if entry.sealed {
            crate::ice!(
                "cached load of {key} after the entry block of `{}` was sealed",
                expected.get_name().to_string_lossy()
            );
        }

        if let Some(&value) = entry.loaded.get(key) {
            trace!(%key, "reusing cached load");
            return value;
        }

        let cell = self.get_or_create(key, populate);
        let saved = self.irb.save_position();
        self.irb.position_at_end(entry.block);
        let value = self.irb.load(cell.ty, cell.global, &key.load_name());
        self.irb.restore_position(saved);

        entry.loaded.insert(key.clone(), value);
        value
    }

    /// Close `entry` by branching from the initializer block to the body.
    pub fn seal_entry(&mut self, entry: &mut MethodEntry) {
        if entry.sealed {
            crate::ice!("entry block sealed twice");
        }
        let saved = self.irb.save_position();
        self.irb.position_at_end(entry.block);
        self.irb.br(entry.body);
        self.irb.restore_position(saved);
        entry.sealed = true;
    }

    /// Pointer to a private null-terminated copy of `text`, one global per
    /// distinct string.
    pub fn c_string(&mut self, text: &str) -> ValueId {
        if let Some(&ptr) = self.cache.c_strings.get(text) {
            return ptr;
        }
        let ptr = self.irb.add_c_string_global(&format!("str.{text}"), text);
        self.cache.c_strings.insert(text.to_owned(), ptr);
        ptr
    }

    /// The frozen string for `text`, cached for the process lifetime.
    pub fn frozen_string(&mut self, entry: &mut MethodEntry, text: &str) -> ValueId {
        self.load_cached(entry, &CacheKey::frozen_string(text), |state, _| {
            state.c_ptr_to_string(text, true)
        })
    }

    /// The interned identifier for `name`, cached for the process lifetime.
    pub fn interned_id(&mut self, entry: &mut MethodEntry, name: &str) -> ValueId {
        self.load_cached(entry, &CacheKey::interned_id(name), |state, _| {
            state.intern_id(name)
        })
    }
}
