//! Garnet IR - the checked program as the backend sees it
//!
//! This crate holds the data the resolver and type checker hand to the
//! native backend:
//! - Names for interned identifiers and paths
//! - The symbol table (classes, methods, constants, fields)
//! - Source files and line-granular locations
//! - Local variable identities and field aliases
//! - Static types used for runtime type tests
//! - Per-method shapes (storage classification, parameters)
//!
//! # Design Philosophy
//!
//! - **Intern Everything**: strings become `Name(u32)`, symbols `SymbolId(u32)`
//! - **Upstream decides**: capture analysis and alias resolution arrive as
//!   input; nothing here inspects method bodies

mod interner;
mod loc;
mod local;
mod method_shape;
mod name;
mod program;
mod static_type;
mod symbols;

pub use interner::{InternError, StringInterner};
pub use loc::{FileId, FileTable, Loc, SourceFile};
pub use local::{Alias, AliasKind, LocalVariable};
pub use method_shape::{MethodShape, ParamSpec, SourceBlockId};
pub use name::Name;
pub use program::Program;
pub use static_type::StaticType;
pub use symbols::{SymbolData, SymbolId, SymbolKind, SymbolName, SymbolTable};
