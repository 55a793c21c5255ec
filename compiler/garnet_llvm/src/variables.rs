//! Reading and writing local variables.
//!
//! Storage was resolved when the method began (see [`crate::method`]);
//! here each access dispatches on it:
//!
//! | Storage | Read | Write |
//! |---------|------|-------|
//! | `Private` | load field 0 of the slot | store field 0 of the slot |
//! | `Closure` | load through `garnet_closure_elem` | store through `garnet_closure_elem` |
//! | `Alias(Constant)` | constant lookup | `garnet_const_set` on the owner |
//! | `Alias(GlobalField)` | `garnet_gvar_get` | `garnet_gvar_set` |
//! | `Alias(ClassField)` | `garnet_cvar_get` | `garnet_cvar_set` |
//! | `Alias(InstanceField)` | `garnet_ivar_get` on `self` | `garnet_ivar_set` on `self` |

use garnet_ir::{Alias, AliasKind, LocalVariable, SourceBlockId};
use tracing::trace;

use crate::codegen::ValueId;
use crate::method::{MethodContext, VariableStorage};
use crate::state::CompilerState;

impl CompilerState<'_, '_, '_> {
    /// Read `local` as seen from `block` of the current method.
    pub fn var_get(&mut self, ctx: &mut MethodContext, local: LocalVariable, block: SourceBlockId) -> ValueId {
        match ctx.storage(local) {
            VariableStorage::Alias(alias) => self.alias_get(ctx, alias, block),
            VariableStorage::Closure { index } => {
                let elem = self.closure_elem(ctx, index, block);
                self.irb.load(self.types.value, elem, "capturedLocal")
            }
            VariableStorage::Private { slot } => {
                let field = self.irb.struct_gep(self.types.slot, slot, 0, "");
                self.irb.load(self.types.value, field, "")
            }
        }
    }

    /// Write `value` to `local` as seen from `block` of the current method.
    pub fn var_set(
        &mut self,
        ctx: &mut MethodContext,
        local: LocalVariable,
        value: ValueId,
        block: SourceBlockId,
    ) {
        match ctx.storage(local) {
            VariableStorage::Alias(alias) => self.alias_set(ctx, alias, value, block),
            VariableStorage::Closure { index } => {
                let elem = self.closure_elem(ctx, index, block);
                self.irb.store(value, elem);
            }
            VariableStorage::Private { slot } => {
                let field = self.irb.struct_gep(self.types.slot, slot, 0, "");
                self.irb.store(value, field);
            }
        }
    }

    fn closure_elem(&mut self, ctx: &MethodContext, index: u32, block: SourceBlockId) -> ValueId {
        let env = ctx.closure_env(block);
        let index = self.irb.const_i32(index as i32);
        self.call_runtime_value("garnet_closure_elem", &[env, index], "closureElem")
    }

    fn alias_get(&mut self, ctx: &mut MethodContext, alias: Alias, block: SourceBlockId) -> ValueId {
        trace!(?alias, "reading alias");
        match alias.kind {
            AliasKind::Constant => self.get_constant(alias.target),
            AliasKind::GlobalField => {
                let name = self.field_name(alias);
                let name = self.c_string(name);
                self.call_runtime_value("garnet_gvar_get", &[name], "gvar")
            }
            AliasKind::ClassField => {
                let class = self.class_field_owner(ctx);
                let id = self.field_id(ctx, alias);
                self.call_runtime_value("garnet_cvar_get", &[class, id], "cvar")
            }
            AliasKind::InstanceField => {
                let receiver = self.var_get(ctx, LocalVariable::SELF, block);
                let id = self.field_id(ctx, alias);
                self.call_runtime_value("garnet_ivar_get", &[receiver, id], "ivar")
            }
        }
    }

    fn alias_set(&mut self, ctx: &mut MethodContext, alias: Alias, value: ValueId, block: SourceBlockId) {
        trace!(?alias, "writing alias");
        match alias.kind {
            AliasKind::Constant => {
                let program = self.program;
                let owner = self.get_constant(program.symbols.owner(alias.target));
                let name = program.symbols.short_name(&program.interner, alias.target);
                let name_ptr = self.c_string(name);
                let name_len = self.irb.const_i64(name.len() as i64);
                self.call_runtime("garnet_const_set", &[owner, name_ptr, name_len, value], "");
            }
            AliasKind::GlobalField => {
                let name = self.field_name(alias);
                let name = self.c_string(name);
                self.call_runtime("garnet_gvar_set", &[name, value], "");
            }
            AliasKind::ClassField => {
                let class = self.class_field_owner(ctx);
                let id = self.field_id(ctx, alias);
                self.call_runtime("garnet_cvar_set", &[class, id, value], "");
            }
            AliasKind::InstanceField => {
                let receiver = self.var_get(ctx, LocalVariable::SELF, block);
                let id = self.field_id(ctx, alias);
                self.call_runtime("garnet_ivar_set", &[receiver, id, value], "");
            }
        }
    }

    /// Short name of a field alias's target (`$stdout`, `@@count`, `@name`).
    fn field_name(&self, alias: Alias) -> &'static str {
        let program = self.program;
        let symbols = &program.symbols;
        let expected = match alias.kind {
            AliasKind::GlobalField => symbols.is_global_field(alias.target),
            AliasKind::ClassField => symbols.is_static_field(alias.target) || symbols.is_field(alias.target),
            AliasKind::InstanceField => symbols.is_field(alias.target),
            AliasKind::Constant => false,
        };
        if !expected {
            crate::ice!(
                "{:?} alias points at {:?} ({:?})",
                alias.kind,
                alias.target,
                symbols.data(alias.target).kind
            );
        }
        program.interner.lookup(symbols.name(alias.target).shown())
    }

    /// The cached identifier of a field alias's name.
    fn field_id(&mut self, ctx: &mut MethodContext, alias: Alias) -> ValueId {
        let name = self.field_name(alias);
        self.interned_id(&mut ctx.entry, name)
    }

    /// The concrete class owning class variables of the current method:
    /// the top attached class of the method's owner.
    fn class_field_owner(&mut self, ctx: &MethodContext) -> ValueId {
        let symbols = &self.program.symbols;
        let class = symbols.top_attached_class(symbols.owner(ctx.symbol));
        self.get_constant(class)
    }
}
