//! Local variable identities and field aliases.

use crate::{Name, SymbolId};

/// Identity of one source-level local binding within a method.
///
/// `unique` separates shadowed bindings that share a name (block
/// parameters, re-declared locals).
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LocalVariable {
    pub name: Name,
    pub unique: u32,
}

impl LocalVariable {
    /// The reserved receiver binding. Its name is never looked up; the
    /// sentinel `unique` keeps it apart from any user local.
    pub const SELF: LocalVariable = LocalVariable {
        name: Name::EMPTY,
        unique: u32::MAX,
    };

    pub const fn new(name: Name, unique: u32) -> Self {
        Self { name, unique }
    }

    #[inline]
    pub fn is_self(self) -> bool {
        self == Self::SELF
    }
}

/// Which kind of object field an aliased local stands for.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum AliasKind {
    /// A class, module or constant path.
    Constant,
    /// `$global`
    GlobalField,
    /// `@@class_var`
    ClassField,
    /// `@instance_var`
    InstanceField,
}

/// A local that is really a synonym for a field or constant.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Alias {
    pub kind: AliasKind,
    pub target: SymbolId,
}

impl Alias {
    pub const fn constant(target: SymbolId) -> Self {
        Self {
            kind: AliasKind::Constant,
            target,
        }
    }

    pub const fn global_field(target: SymbolId) -> Self {
        Self {
            kind: AliasKind::GlobalField,
            target,
        }
    }

    pub const fn class_field(target: SymbolId) -> Self {
        Self {
            kind: AliasKind::ClassField,
            target,
        }
    }

    pub const fn instance_field(target: SymbolId) -> Self {
        Self {
            kind: AliasKind::InstanceField,
            target,
        }
    }
}
