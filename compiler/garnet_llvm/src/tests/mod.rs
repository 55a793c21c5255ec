//! Shared fixtures for the codegen tests.
//!
//! Every test builds its own LLVM context and `CompilerState` over a
//! [`Fixture`] program. `with_state` does that setup; JIT-executed tests
//! additionally map the runtime doubles from [`runtime`].

mod jit;

use garnet_ir::{FileId, Loc, LocalVariable, MethodShape, Program, SymbolId};
use inkwell::execution_engine::ExecutionEngine;
use inkwell::targets::{InitializationConfig, Target};
use inkwell::values::AnyValue;
use inkwell::OptimizationLevel;

use crate::codegen::ValueId;
use crate::{CodegenConfig, CompilerState, MethodContext, SimpleCx};

/// A small checked program:
///
/// ```text
/// # app/models/foo.rb
/// class Foo                  # Foo
///   LIMIT = 10               # Foo::LIMIT
///   Elem = type_member       # Foo::Elem
///   @@instances              # class variable
///   @name                    # instance variable
///   module Inner; end        # Foo::Inner
///
///   def bar(...)  # lines 3-9
///   def self.build  # lines 11-13
/// end
/// $stdout
/// <top (required)>  # lines 1-20
/// ```
pub(crate) struct Fixture {
    pub program: Program,
    pub file: FileId,
    pub foo: SymbolId,
    pub foo_singleton: SymbolId,
    pub inner: SymbolId,
    pub bar: SymbolId,
    pub build: SymbolId,
    pub static_init: SymbolId,
    pub limit: SymbolId,
    pub elem: SymbolId,
    pub instances: SymbolId,
    pub name_field: SymbolId,
    pub stdout: SymbolId,
}

impl Fixture {
    pub fn new() -> Self {
        let mut program = Program::new();
        let file = program.files.add(program.interner.intern("app/models/foo.rb"));

        let interner = &program.interner;
        let symbols = &mut program.symbols;
        let foo = symbols.enter_class(SymbolId::ROOT, interner.intern("Foo"));
        let foo_singleton = symbols.singleton_class(interner, foo);
        let inner = symbols.enter_class(foo, interner.intern("Inner"));
        let bar = symbols.enter_method(foo, interner.intern("bar"), Loc::new(file, 3, 9));
        let build = symbols.enter_method(foo_singleton, interner.intern("build"), Loc::new(file, 11, 13));
        let static_init = symbols.enter_static_init(interner, SymbolId::ROOT, Loc::new(file, 1, 20));
        let limit = symbols.enter_static_field(foo, interner.intern("LIMIT"));
        let elem = symbols.enter_type_member(foo, interner.intern("Elem"));
        let instances = symbols.enter_field(foo, interner.intern("@@instances"));
        let name_field = symbols.enter_field(foo, interner.intern("@name"));
        let stdout = symbols.enter_global_field(interner.intern("$stdout"));

        Self {
            program,
            file,
            foo,
            foo_singleton,
            inner,
            bar,
            build,
            static_init,
            limit,
            elem,
            instances,
            name_field,
            stdout,
        }
    }

    /// The first binding of the local `name`.
    pub fn local(&self, name: &str) -> LocalVariable {
        LocalVariable::new(self.program.interner.intern(name), 0)
    }

    /// `Foo#bar` with no locals besides `self`.
    pub fn bar_shape(&self) -> MethodShape {
        MethodShape::new(self.bar)
    }
}

/// Run `f` against a fresh compilation unit for `fixture`.
pub(crate) fn with_state<R>(fixture: &Fixture, f: impl FnOnce(&mut CompilerState<'_, '_, '_>) -> R) -> R {
    crate::init_tracing();
    let context = inkwell::context::Context::create();
    let scx = SimpleCx::new(&context, "test");
    let mut state = CompilerState::new(&scx, &fixture.program, CodegenConfig::new("test"));
    f(&mut state)
}

/// Textual IR of the whole module.
pub(crate) fn module_ir(state: &CompilerState<'_, '_, '_>) -> String {
    state.irb.scx().llmod.print_to_string().to_string()
}

/// Textual IR of one function.
pub(crate) fn function_ir(state: &CompilerState<'_, '_, '_>, name: &str) -> String {
    let function = state
        .irb
        .scx()
        .llmod
        .get_function(name)
        .unwrap_or_else(|| panic!("no function `{name}` in module"));
    function.print_to_string().to_string()
}

/// Return `value` from the method being compiled and close it.
pub(crate) fn end_method(state: &mut CompilerState<'_, '_, '_>, ctx: &mut MethodContext, value: ValueId) {
    state.irb.ret(value);
    state.finish_method(ctx);
}

/// Compile one method whose body is produced by `body` (which returns the
/// value to return), finish the module, and return the method's IR.
pub(crate) fn compile_method(
    fixture: &Fixture,
    shape: &MethodShape,
    body: impl FnOnce(&mut CompilerState<'_, '_, '_>, &mut MethodContext) -> ValueId,
) -> String {
    with_state(fixture, |state| {
        let mut ctx = state.begin_method(shape);
        let result = body(state, &mut ctx);
        end_method(state, &mut ctx, result);
        state.finish().unwrap();
        let program = &fixture.program;
        let name = format!("func_{}", program.symbols.unique_method_name(&program.interner, shape.symbol));
        function_ir(state, &name)
    })
}

/// Count the lines of `ir` containing `needle`.
pub(crate) fn count_lines(ir: &str, needle: &str) -> usize {
    ir.lines().filter(|line| line.contains(needle)).count()
}

/// Finish the module and create a JIT engine for it, with the runtime
/// doubles mapped and every module initializer already run.
pub(crate) fn jit<'ctx>(state: &mut CompilerState<'_, '_, 'ctx>) -> ExecutionEngine<'ctx> {
    Target::initialize_native(&InitializationConfig::default()).unwrap();
    state.finish().unwrap();
    let module = &state.irb.scx().llmod;
    let ee = module
        .create_jit_execution_engine(OptimizationLevel::None)
        .unwrap();
    runtime::map_runtime(&ee, module);
    ee.run_static_constructors();
    ee
}
