//! Per-method facts the resolver hands to the backend.
//!
//! Storage classification (private vs. captured) and field aliases are
//! computed upstream; the backend only consumes them.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::{Alias, LocalVariable, Name, SymbolId};

/// Identifies the main body of a method (`0`) or one of its nested block
/// literals (`1..=block_count`).
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SourceBlockId(pub u32);

impl SourceBlockId {
    pub const MAIN: SourceBlockId = SourceBlockId(0);

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Declared parameters of a method.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ParamSpec {
    /// Required positional parameters.
    pub min_positional: u32,
    /// Required plus optional positional parameters.
    pub max_positional: u32,
    /// `*rest`
    pub has_rest: bool,
    /// Declared keyword parameters, in declaration order.
    pub keywords: Vec<Name>,
    /// `**kwargs`
    pub has_keyword_splat: bool,
}

impl ParamSpec {
    /// Positional parameters only.
    pub fn positional(min: u32, max: u32) -> Self {
        debug_assert!(min <= max, "min arity above max arity");
        Self {
            min_positional: min,
            max_positional: max,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_rest(mut self) -> Self {
        self.has_rest = true;
        self
    }

    #[must_use]
    pub fn with_keyword(mut self, name: Name) -> Self {
        self.keywords.push(name);
        self
    }

    #[must_use]
    pub fn with_keyword_splat(mut self) -> Self {
        self.has_keyword_splat = true;
        self
    }
}

/// Everything the backend needs to know about one method before lowering
/// its body.
#[derive(Clone, Debug)]
pub struct MethodShape {
    pub symbol: SymbolId,
    /// All ordinary locals (private or captured), in declaration order.
    pub locals: Vec<LocalVariable>,
    /// Locals captured by a nested block.
    pub escaped: FxHashSet<LocalVariable>,
    /// Locals that stand for a field or constant.
    pub aliases: FxHashMap<LocalVariable, Alias>,
    /// Number of nested block literals.
    pub block_count: u32,
    pub params: ParamSpec,
}

impl MethodShape {
    pub fn new(symbol: SymbolId) -> Self {
        Self {
            symbol,
            locals: Vec::new(),
            escaped: FxHashSet::default(),
            aliases: FxHashMap::default(),
            block_count: 0,
            params: ParamSpec::default(),
        }
    }

    #[must_use]
    pub fn with_local(mut self, local: LocalVariable) -> Self {
        if !self.locals.contains(&local) {
            self.locals.push(local);
        }
        self
    }

    /// Add a local captured by a nested block.
    #[must_use]
    pub fn with_escaped(mut self, local: LocalVariable) -> Self {
        self = self.with_local(local);
        self.escaped.insert(local);
        self
    }

    #[must_use]
    pub fn with_alias(mut self, local: LocalVariable, alias: Alias) -> Self {
        self.aliases.insert(local, alias);
        self
    }

    #[must_use]
    pub fn with_blocks(mut self, count: u32) -> Self {
        self.block_count = count;
        self
    }

    #[must_use]
    pub fn with_params(mut self, params: ParamSpec) -> Self {
        self.params = params;
        self
    }
}
