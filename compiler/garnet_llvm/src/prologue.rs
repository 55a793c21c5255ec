//! Method prologue: frame installation, argument checks and extraction,
//! and line tracking.
//!
//! A compiled method runs, in order:
//! 1. `set_stack_frame`: install the method's cached frame descriptor.
//! 2. `check_arity`: reject a wrong positional argument count.
//! 3. `extract_keyword_args`: pull declared keywords out of the trailing
//!    keyword hash and reject (or collect) the rest.
//! 4. `read_rest_args`: collect surplus positionals into an array.
//!
//! `set_line_number` is then called before each statement.

use garnet_ir::{Loc, SymbolId};
use tracing::{instrument, trace};

use crate::cache::CacheKey;
use crate::codegen::ValueId;
use crate::method::MethodContext;
use crate::state::CompilerState;

/// Name the runtime reports for a file's top-level code.
pub const TOP_LEVEL_FRAME_NAME: &str = "<top (required)>";

/// `max` passed to `garnet_raise_arity` when there is no upper bound.
pub const UNBOUNDED_ARITY: i32 = -1;

/// The incoming positional argument count.
#[derive(Copy, Clone, Debug)]
pub enum ArgCount {
    /// Known at compile time (e.g. a direct call with a fixed argument list).
    Static(u32),
    /// An `i32` runtime value.
    Dynamic(ValueId),
}

/// Values produced by keyword extraction.
#[derive(Clone, Debug)]
pub struct KeywordArgs {
    /// One value per declared keyword, in declaration order. A missing key
    /// reads as the runtime's undef marker.
    pub values: Vec<ValueId>,
    /// The remaining keywords, for a method with a keyword splat.
    pub rest: Option<ValueId>,
}

impl CompilerState<'_, '_, '_> {
    /// Install the method's stack-frame descriptor as the current frame.
    ///
    /// The descriptor is built once per process (by a module initializer)
    /// and loaded in the method's entry block. The returned control-frame
    /// handle is also kept in an entry-block slot for `set_line_number`.
    #[instrument(skip(self, ctx), level = "debug")]
    pub fn set_stack_frame(&mut self, ctx: &mut MethodContext) -> ValueId {
        let program = self.program;
        let method = ctx.symbol;
        let key = CacheKey::stack_frame(&program.symbols.unique_method_name(&program.interner, method));
        let frame = self.load_cached(&mut ctx.entry, &key, |state, _| {
            state.allocate_stack_frame(method)
        });
        let handle = self.call_runtime_value("garnet_frame_set", &[frame], "controlFrame");

        let slot = match ctx.frame_slot {
            Some(slot) => slot,
            None => {
                let slot = self
                    .irb
                    .create_entry_alloca(ctx.function, "lineNumberPtr", self.types.ptr);
                ctx.frame_slot = Some(slot);
                slot
            }
        };
        self.irb.store(handle, slot);
        handle
    }

    /// Body of the stack-frame cache initializer for `method`.
    fn allocate_stack_frame(&mut self, method: SymbolId) -> ValueId {
        let program = self.program;
        let symbols = &program.symbols;
        let name = if symbols.is_static_init(method) {
            TOP_LEVEL_FRAME_NAME
        } else {
            symbols.short_name(&program.interner, method)
        };
        let loc = symbols.loc(method);
        let file = program.file_path(loc);

        let owner = self.get_constant(symbols.owner(method));
        let name_value = self.c_ptr_to_string(name, true);
        let name_id = self.intern_id(name);
        let file_value = self.c_ptr_to_string(file, true);
        // TODO: resolve the absolute path once FileTable records the project root.
        let realpath_value = self.c_ptr_to_string(file, true);
        let start_line = self.irb.const_i32(loc.start_line as i32);
        let end_line = self.irb.const_i32(loc.end_line as i32);

        trace!(method = name, file, "allocating stack frame");
        self.call_runtime_value(
            "garnet_frame_alloc",
            &[
                owner,
                name_value,
                name_id,
                file_value,
                realpath_value,
                start_line,
                end_line,
            ],
            "stackFrame",
        )
    }

    /// Raise an arity error unless `argc` is within the method's declared
    /// positional range. Methods with a rest parameter have no upper bound.
    pub fn check_arity(&mut self, ctx: &MethodContext, argc: ArgCount) {
        let min = ctx.params.min_positional;
        let max = (!ctx.params.has_rest).then_some(ctx.params.max_positional);
        let max_arg = max.map_or(UNBOUNDED_ARITY, |max| max as i32);

        match argc {
            ArgCount::Static(n) => {
                if n >= min && max.map_or(true, |max| n <= max) {
                    trace!(n, min, ?max, "static arity check elided");
                    return;
                }
                let argc = self.irb.const_i32(n as i32);
                self.raise_arity(argc, min as i32, max_arg);
                // Keep emitting into a fresh, unreachable block.
                let dead = self.irb.append_block(ctx.function, "afterArityError");
                self.irb.position_at_end(dead);
            }
            ArgCount::Dynamic(argc) => {
                let min_value = self.irb.const_i32(min as i32);
                let mut mismatch = self.irb.icmp_slt(argc, min_value, "tooFewArgs");
                if let Some(max) = max {
                    let max_value = self.irb.const_i32(max as i32);
                    let too_many = self.irb.icmp_sgt(argc, max_value, "tooManyArgs");
                    mismatch = self.irb.or(mismatch, too_many, "arityMismatch");
                }
                let mismatch = self.expect_bool(mismatch, false);

                let error_block = self.irb.append_block(ctx.function, "arityError");
                let ok_block = self.irb.append_block(ctx.function, "arityOk");
                self.irb.cond_br(mismatch, error_block, ok_block);

                self.irb.position_at_end(error_block);
                self.raise_arity(argc, min as i32, max_arg);

                self.irb.position_at_end(ok_block);
            }
        }
    }

    /// Extract the declared keywords from the trailing keyword `hash`.
    ///
    /// Each fetch removes its key, so what is left afterwards is exactly
    /// the unknown keywords: collected for a keyword splat, rejected
    /// otherwise.
    pub fn extract_keyword_args(&mut self, ctx: &mut MethodContext, hash: ValueId) -> KeywordArgs {
        let program = self.program;
        let keywords = ctx.params.keywords.clone();
        let mut values = Vec::with_capacity(keywords.len());
        for keyword in keywords {
            let name = program.interner.lookup(keyword);
            let id = self.interned_id(&mut ctx.entry, name);
            let sym = self.id_to_symbol(id);
            values.push(self.call_runtime_value("garnet_kwarg_get", &[hash, sym], "kwArg"));
        }

        let rest = if ctx.params.has_keyword_splat {
            Some(self.call_runtime_value("garnet_kwargs_rest", &[hash], "kwRest"))
        } else {
            self.call_runtime("garnet_kwargs_assert_empty", &[hash], "");
            None
        };
        KeywordArgs { values, rest }
    }

    /// Collect the positionals after the first `max_positional` into an
    /// array.
    pub fn read_rest_args(&mut self, max_positional: u32, argc: ValueId, argv: ValueId) -> ValueId {
        let max = self.irb.const_i32(max_positional as i32);
        self.call_runtime_value("garnet_rest_args", &[max, argc, argv], "restArgs")
    }

    /// Report the statement at `loc` as the current line.
    ///
    /// Emits nothing for a missing location or an unchanged line. The
    /// runtime receives the offset from the method's first line.
    pub fn set_line_number(&mut self, ctx: &mut MethodContext, loc: Loc) {
        if !loc.exists() {
            return;
        }
        let line = loc.start_line;
        if ctx.last_line == Some(line) {
            return;
        }
        let Some(slot) = ctx.frame_slot else {
            crate::ice!("line update in {:?} before its stack frame was installed", ctx.symbol);
        };

        let method_start = self.program.symbols.loc(ctx.symbol).start_line;
        let offset = self.irb.const_i32(line as i32 - method_start as i32);
        let handle = self.irb.load(self.types.ptr, slot, "frameHandle");
        self.call_runtime("garnet_set_line", &[offset, handle], "");
        ctx.last_line = Some(line);
    }
}
