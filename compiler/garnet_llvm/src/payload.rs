//! Small ABI-call helpers.
//!
//! Each helper lowers one primitive runtime operation (an immediate, a
//! boxing conversion, a truthiness test, a constant lookup) to a single
//! call into the runtime. Nothing here is cached; callers that want
//! process-lifetime caching go through [`crate::cache`].

use garnet_ir::SymbolId;

use crate::codegen::ValueId;
use crate::state::CompilerState;

impl CompilerState<'_, '_, '_> {
    // -- Immediates --

    /// The runtime's "no value" marker (distinct from `nil`).
    pub fn undef(&mut self) -> ValueId {
        self.call_runtime_value("garnet_undef", &[], "undef")
    }

    pub fn nil(&mut self) -> ValueId {
        self.call_runtime_value("garnet_nil", &[], "nil")
    }

    pub fn true_value(&mut self) -> ValueId {
        self.call_runtime_value("garnet_true", &[], "true")
    }

    pub fn false_value(&mut self) -> ValueId {
        self.call_runtime_value("garnet_false", &[], "false")
    }

    /// The top-level `main` object.
    pub fn top_self(&mut self) -> ValueId {
        self.call_runtime_value("garnet_top_self", &[], "topSelf")
    }

    // -- Construction --

    pub fn box_int(&mut self, value: i64) -> ValueId {
        let raw = self.irb.const_i64(value);
        self.call_runtime_value("garnet_box_int", &[raw], "rawInt")
    }

    pub fn box_float(&mut self, value: f64) -> ValueId {
        let raw = self.irb.const_f64(value);
        self.call_runtime_value("garnet_box_float", &[raw], "rawFloat")
    }

    /// A fresh (mutable) string with the contents of `text`.
    pub fn box_string(&mut self, text: &str) -> ValueId {
        self.c_ptr_to_string(text, false)
    }

    /// Build a string from a pooled C literal, frozen or not.
    pub(crate) fn c_ptr_to_string(&mut self, text: &str, frozen: bool) -> ValueId {
        let ptr = self.c_string(text);
        let len = self.irb.const_i64(text.len() as i64);
        let func = if frozen {
            "garnet_str_new_frozen"
        } else {
            "garnet_str_new"
        };
        self.call_runtime_value(func, &[ptr, len], "rawStr")
    }

    /// Intern `name` now, without caching. Used by cache initializers.
    pub(crate) fn intern_id(&mut self, name: &str) -> ValueId {
        let ptr = self.c_string(name);
        let len = self.irb.const_i64(name.len() as i64);
        self.call_runtime_value("garnet_id_intern", &[ptr, len], "rawId")
    }

    /// The symbol object for an interned identifier.
    pub fn id_to_symbol(&mut self, id: ValueId) -> ValueId {
        self.call_runtime_value("garnet_id_to_sym", &[id], "rawSym")
    }

    /// Box an `i1` as the runtime's `true`/`false`.
    pub fn bool_to_value(&mut self, cond: ValueId) -> ValueId {
        self.call_runtime_value("garnet_bool_box", &[cond], "boxedBool")
    }

    // -- Predicates --

    pub fn is_undef(&mut self, value: ValueId) -> ValueId {
        self.call_runtime_value("garnet_is_undef", &[value], "isUndef")
    }

    /// `i1` truthiness: everything except `nil` and `false`.
    pub fn is_truthy(&mut self, value: ValueId) -> ValueId {
        self.call_runtime_value("garnet_is_truthy", &[value], "cond")
    }

    /// Attach a branch-probability hint to `cond`.
    pub fn expect_bool(&mut self, cond: ValueId, expected: bool) -> ValueId {
        self.irb.call_expect_i1(cond, expected, "expected")
    }

    // -- Constants --

    /// Look up the class, module or constant `symbol` by its qualified
    /// path. The root scope resolves to `Object`.
    pub fn get_constant(&mut self, symbol: SymbolId) -> ValueId {
        let program = self.program;
        let symbols = &program.symbols;
        if !(symbols.is_class_or_module(symbol)
            || symbols.is_static_field(symbol)
            || symbols.is_type_member(symbol))
        {
            crate::ice!(
                "constant lookup of non-constant symbol {symbol:?} ({:?})",
                symbols.data(symbol).kind
            );
        }
        let symbol = if symbol == SymbolId::ROOT || symbol == SymbolId::ROOT_SINGLETON {
            SymbolId::OBJECT
        } else {
            symbol
        };
        let path = symbols.show_full_name(&program.interner, symbol);
        debug_assert!(!path.starts_with("::"), "constant paths are never absolute");

        let func = if symbols.is_class_or_module(symbol) {
            "garnet_get_class"
        } else {
            "garnet_get_constant"
        };
        let ptr = self.c_string(&path);
        let len = self.irb.const_i64(path.len() as i64);
        self.call_runtime_value(func, &[ptr, len], "const")
    }

    // -- Raising --

    /// Raise an arity error. Control does not return: the current block is
    /// terminated with `unreachable`.
    pub fn raise_arity(&mut self, argc: ValueId, min: i32, max: i32) {
        let min = self.irb.const_i32(min);
        let max = self.irb.const_i32(max);
        self.call_runtime("garnet_raise_arity", &[argc, min, max], "");
        self.irb.unreachable();
    }
}
