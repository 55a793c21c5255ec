//! The checked program: everything the front end produced that the backend
//! reads while compiling a module.

use crate::{FileTable, StringInterner, SymbolTable};

/// Interned names, symbols and source files of one checked program.
///
/// The backend borrows it immutably; several compilation units may share
/// one `Program`.
pub struct Program {
    pub interner: StringInterner,
    pub symbols: SymbolTable,
    pub files: FileTable,
}

impl Program {
    /// A program holding only the well-known symbols.
    pub fn new() -> Self {
        let interner = StringInterner::new();
        let symbols = SymbolTable::new(&interner);
        Self {
            interner,
            symbols,
            files: FileTable::new(),
        }
    }

    /// Path of the file containing `loc`, or `""` for synthesized code.
    pub fn file_path(&self, loc: crate::Loc) -> &'static str {
        loc.file()
            .map_or("", |file| self.interner.lookup(self.files.get(file).path))
    }
}

impl Default for Program {
    fn default() -> Self {
        Self::new()
    }
}
