//! Symbol table of the checked program.
//!
//! Every class, module, method, constant and field the resolver knows about
//! is a [`SymbolId`] into a [`SymbolTable`]. The backend only queries it:
//! owner, name, kind, attached class of singleton classes, and method
//! locations.
//!
//! The first [`SymbolId::WELL_KNOWN_COUNT`] ids are fixed: the root scope, its
//! singleton, `Object`, the built-in classes and the synthetic numbered proc
//! classes `Proc0..Proc10`.

use rustc_hash::FxHashMap;

use crate::{Loc, Name, StringInterner};

/// Index of a symbol in a [`SymbolTable`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SymbolId(u32);

impl SymbolId {
    pub const ROOT: Self = Self(0);
    pub const ROOT_SINGLETON: Self = Self(1);
    pub const OBJECT: Self = Self(2);
    pub const UNTYPED: Self = Self(3);
    pub const ARRAY: Self = Self(4);
    pub const HASH: Self = Self(5);
    pub const STRING: Self = Self(6);
    pub const SYMBOL: Self = Self(7);
    pub const INTEGER: Self = Self(8);
    pub const FLOAT: Self = Self(9);
    pub const RATIONAL: Self = Self(10);
    pub const REGEXP: Self = Self(11);
    pub const PROC: Self = Self(12);
    pub const NIL_CLASS: Self = Self(13);
    pub const TRUE_CLASS: Self = Self(14);
    pub const FALSE_CLASS: Self = Self(15);
    /// `Proc0`, the first synthetic numbered proc class.
    pub const PROC0: Self = Self(16);
    /// Highest numbered proc arity with a dedicated symbol.
    pub const MAX_PROC_ARITY: u32 = 10;
    /// `Proc10`, the last synthetic numbered proc class.
    pub const LAST_PROC: Self = Self(16 + Self::MAX_PROC_ARITY);
    /// Number of symbols every table starts with.
    pub const WELL_KNOWN_COUNT: u32 = Self::LAST_PROC.0 + 1;

    /// The numbered proc class for `arity` arguments.
    pub fn numbered_proc(arity: u32) -> Option<Self> {
        (arity <= Self::MAX_PROC_ARITY).then(|| Self(Self::PROC0.0 + arity))
    }

    /// True for `Proc0..Proc10`.
    #[inline]
    pub fn is_numbered_proc(self) -> bool {
        (Self::PROC0.0..=Self::LAST_PROC.0).contains(&self.0)
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

/// Name of a symbol.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum SymbolName {
    /// A name as written in source.
    Plain(Name),
    /// A compiler-generated name derived from `original`; shown as
    /// `original` in anything user-visible.
    Unique { original: Name, num: u32 },
}

impl SymbolName {
    /// The user-visible part of the name.
    #[inline]
    pub fn shown(self) -> Name {
        match self {
            SymbolName::Plain(name) | SymbolName::Unique { original: name, .. } => name,
        }
    }
}

/// What a symbol denotes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SymbolKind {
    /// A class or module. Singleton classes record the class they belong
    /// to in `attached_class`.
    ClassOrModule {
        attached_class: Option<SymbolId>,
        singleton_class: Option<SymbolId>,
    },
    /// A method. `static_init` marks a file's top-level body.
    Method { loc: Loc, static_init: bool },
    /// A constant holding a value (`FOO = 1`).
    StaticField,
    /// A generic type member of a class.
    TypeMember,
    /// An instance variable (`@x`) or class variable (`@@x`).
    Field,
    /// A global variable (`$x`).
    GlobalField,
}

/// Everything the table records about one symbol.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SymbolData {
    pub name: SymbolName,
    pub owner: SymbolId,
    pub kind: SymbolKind,
}

/// The checked program's symbols.
pub struct SymbolTable {
    symbols: Vec<SymbolData>,
    members: FxHashMap<(SymbolId, SymbolName), SymbolId>,
}

impl SymbolTable {
    /// Create a table holding only the well-known symbols.
    pub fn new(interner: &StringInterner) -> Self {
        let mut table = Self {
            symbols: Vec::with_capacity(SymbolId::WELL_KNOWN_COUNT as usize * 4),
            members: FxHashMap::default(),
        };

        let root = table.push(SymbolName::Plain(interner.intern("<root>")), SymbolId::ROOT, class_kind(None));
        debug_assert_eq!(root, SymbolId::ROOT);
        let root_singleton = table.push(
            SymbolName::Plain(interner.intern("<Class:<root>>")),
            SymbolId::ROOT,
            class_kind(Some(SymbolId::ROOT)),
        );
        debug_assert_eq!(root_singleton, SymbolId::ROOT_SINGLETON);
        table.set_singleton(SymbolId::ROOT, SymbolId::ROOT_SINGLETON);

        let builtins = [
            (SymbolId::OBJECT, "Object"),
            (SymbolId::UNTYPED, "untyped"),
            (SymbolId::ARRAY, "Array"),
            (SymbolId::HASH, "Hash"),
            (SymbolId::STRING, "String"),
            (SymbolId::SYMBOL, "Symbol"),
            (SymbolId::INTEGER, "Integer"),
            (SymbolId::FLOAT, "Float"),
            (SymbolId::RATIONAL, "Rational"),
            (SymbolId::REGEXP, "Regexp"),
            (SymbolId::PROC, "Proc"),
            (SymbolId::NIL_CLASS, "NilClass"),
            (SymbolId::TRUE_CLASS, "TrueClass"),
            (SymbolId::FALSE_CLASS, "FalseClass"),
        ];
        for (expected, name) in builtins {
            let id = table.enter_class(SymbolId::ROOT, interner.intern(name));
            debug_assert_eq!(id, expected, "well-known symbol {name} out of order");
        }

        for arity in 0..=SymbolId::MAX_PROC_ARITY {
            let id = table.enter_class(SymbolId::ROOT, interner.intern(&format!("Proc{arity}")));
            debug_assert_eq!(Some(id), SymbolId::numbered_proc(arity));
        }

        table
    }

    fn push(&mut self, name: SymbolName, owner: SymbolId, kind: SymbolKind) -> SymbolId {
        let id = SymbolId(u32::try_from(self.symbols.len()).unwrap_or_else(|_| panic!("symbol table overflow")));
        self.symbols.push(SymbolData { name, owner, kind });
        self.members.insert((owner, name), id);
        id
    }

    fn enter(&mut self, owner: SymbolId, name: SymbolName, kind: SymbolKind) -> SymbolId {
        if let Some(&existing) = self.members.get(&(owner, name)) {
            return existing;
        }
        self.push(name, owner, kind)
    }

    fn set_singleton(&mut self, class: SymbolId, singleton: SymbolId) {
        if let SymbolKind::ClassOrModule { singleton_class, .. } = &mut self.symbols[class.0 as usize].kind {
            *singleton_class = Some(singleton);
        }
    }

    /// Enter (or find) a class or module named `name` inside `owner`.
    pub fn enter_class(&mut self, owner: SymbolId, name: Name) -> SymbolId {
        self.enter(owner, SymbolName::Plain(name), class_kind(None))
    }

    /// The singleton class (metaclass) of `class`, created on first request.
    ///
    /// # Panics
    /// Panics if `class` is not a class or module.
    pub fn singleton_class(&mut self, interner: &StringInterner, class: SymbolId) -> SymbolId {
        let data = self.data(class).clone();
        match data.kind {
            SymbolKind::ClassOrModule {
                singleton_class: Some(singleton),
                ..
            } => singleton,
            SymbolKind::ClassOrModule { .. } => {
                let shown = interner.lookup(data.name.shown());
                let name = SymbolName::Plain(interner.intern(&format!("<Class:{shown}>")));
                let singleton = self.enter(class, name, class_kind(Some(class)));
                self.set_singleton(class, singleton);
                singleton
            }
            other => panic!("singleton_class of non-class symbol {class:?} ({other:?})"),
        }
    }

    /// Enter a method named `name` on `owner`.
    pub fn enter_method(&mut self, owner: SymbolId, name: Name, loc: Loc) -> SymbolId {
        self.enter(
            owner,
            SymbolName::Plain(name),
            SymbolKind::Method {
                loc,
                static_init: false,
            },
        )
    }

    /// Enter the top-level body of a file as a static-init method on `owner`.
    pub fn enter_static_init(&mut self, interner: &StringInterner, owner: SymbolId, loc: Loc) -> SymbolId {
        let original = interner.intern("<static-init>");
        let num = loc.file().map_or(0, |file| file.raw());
        self.enter(
            owner,
            SymbolName::Unique { original, num },
            SymbolKind::Method {
                loc,
                static_init: true,
            },
        )
    }

    /// Enter a constant holding a value.
    pub fn enter_static_field(&mut self, owner: SymbolId, name: Name) -> SymbolId {
        self.enter(owner, SymbolName::Plain(name), SymbolKind::StaticField)
    }

    /// Enter a generic type member.
    pub fn enter_type_member(&mut self, owner: SymbolId, name: Name) -> SymbolId {
        self.enter(owner, SymbolName::Plain(name), SymbolKind::TypeMember)
    }

    /// Enter an instance or class variable of `owner`.
    pub fn enter_field(&mut self, owner: SymbolId, name: Name) -> SymbolId {
        self.enter(owner, SymbolName::Plain(name), SymbolKind::Field)
    }

    /// Enter a global variable.
    pub fn enter_global_field(&mut self, name: Name) -> SymbolId {
        self.enter(SymbolId::ROOT, SymbolName::Plain(name), SymbolKind::GlobalField)
    }

    /// Give an existing symbol a compiler-generated name shown as `original`.
    pub fn enter_unique_class(&mut self, owner: SymbolId, original: Name, num: u32) -> SymbolId {
        self.enter(owner, SymbolName::Unique { original, num }, class_kind(None))
    }

    /// Look up a member of `owner` by its plain name.
    pub fn lookup_member(&self, owner: SymbolId, name: Name) -> Option<SymbolId> {
        self.members.get(&(owner, SymbolName::Plain(name))).copied()
    }

    // -- Queries --

    /// All data for a symbol.
    ///
    /// # Panics
    /// Panics if `id` did not come from this table.
    #[inline]
    pub fn data(&self, id: SymbolId) -> &SymbolData {
        &self.symbols[id.0 as usize]
    }

    #[inline]
    pub fn owner(&self, id: SymbolId) -> SymbolId {
        self.data(id).owner
    }

    #[inline]
    pub fn name(&self, id: SymbolId) -> SymbolName {
        self.data(id).name
    }

    pub fn is_class_or_module(&self, id: SymbolId) -> bool {
        matches!(self.data(id).kind, SymbolKind::ClassOrModule { .. })
    }

    pub fn is_method(&self, id: SymbolId) -> bool {
        matches!(self.data(id).kind, SymbolKind::Method { .. })
    }

    pub fn is_static_field(&self, id: SymbolId) -> bool {
        matches!(self.data(id).kind, SymbolKind::StaticField)
    }

    pub fn is_type_member(&self, id: SymbolId) -> bool {
        matches!(self.data(id).kind, SymbolKind::TypeMember)
    }

    pub fn is_field(&self, id: SymbolId) -> bool {
        matches!(self.data(id).kind, SymbolKind::Field)
    }

    pub fn is_global_field(&self, id: SymbolId) -> bool {
        matches!(self.data(id).kind, SymbolKind::GlobalField)
    }

    /// For a singleton class, the class it is the metaclass of.
    pub fn attached_class(&self, id: SymbolId) -> Option<SymbolId> {
        match self.data(id).kind {
            SymbolKind::ClassOrModule { attached_class, .. } => attached_class,
            _ => None,
        }
    }

    /// Follow `attached_class` until reaching a class that is not a
    /// singleton. For an ordinary class this is the class itself.
    pub fn top_attached_class(&self, id: SymbolId) -> SymbolId {
        let mut current = id;
        while let Some(attached) = self.attached_class(current) {
            current = attached;
        }
        current
    }

    /// Source location of a method, or `Loc::NONE` for other symbols.
    pub fn loc(&self, id: SymbolId) -> Loc {
        match self.data(id).kind {
            SymbolKind::Method { loc, .. } => loc,
            _ => Loc::NONE,
        }
    }

    /// True for a file's top-level body.
    pub fn is_static_init(&self, id: SymbolId) -> bool {
        matches!(self.data(id).kind, SymbolKind::Method { static_init: true, .. })
    }

    /// The user-visible short name of a symbol.
    pub fn short_name<'i>(&self, interner: &'i StringInterner, id: SymbolId) -> &'i str {
        interner.lookup(self.name(id).shown())
    }

    /// `Outer::Inner`-style path of a class or constant. Members of the root
    /// scope print without a prefix.
    pub fn show_full_name(&self, interner: &StringInterner, id: SymbolId) -> String {
        let owner = self.owner(id);
        let short = self.short_name(interner, id);
        if id == SymbolId::ROOT || owner == SymbolId::ROOT {
            short.to_owned()
        } else {
            format!("{}::{short}", self.show_full_name(interner, owner))
        }
    }

    /// `Owner#name` for instance methods, `Owner.name` for methods defined
    /// on a singleton class.
    pub fn show_method(&self, interner: &StringInterner, method: SymbolId) -> String {
        let owner = self.owner(method);
        let short = self.short_name(interner, method);
        match self.attached_class(owner) {
            Some(attached) => format!("{}.{short}", self.show_full_name(interner, attached)),
            None => format!("{}#{short}", self.show_full_name(interner, owner)),
        }
    }

    /// `show_method`, except that a unique name keeps its number
    /// (`<root>#<static-init>$2`), so distinct methods never share a name.
    /// Used for native symbols and cache keys.
    pub fn unique_method_name(&self, interner: &StringInterner, method: SymbolId) -> String {
        let shown = self.show_method(interner, method);
        match self.name(method) {
            SymbolName::Plain(_) => shown,
            SymbolName::Unique { num, .. } => format!("{shown}${num}"),
        }
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

fn class_kind(attached_class: Option<SymbolId>) -> SymbolKind {
    SymbolKind::ClassOrModule {
        attached_class,
        singleton_class: None,
    }
}
