//! Source files and line-granular locations.
//!
//! The backend only needs lines: stack-frame descriptors carry a method's
//! first and last line, and line tracking reports offsets from the first.

use crate::Name;

/// Index of a source file in a [`FileTable`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct FileId(u32);

impl FileId {
    /// The raw index.
    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

/// One source file known to the checked program.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceFile {
    /// Path as given to the front end (relative to the project root).
    pub path: Name,
}

/// All source files of the checked program.
#[derive(Default, Debug)]
pub struct FileTable {
    files: Vec<SourceFile>,
}

impl FileTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a file by path, returning its id.
    pub fn add(&mut self, path: Name) -> FileId {
        let index = self
            .files
            .iter()
            .position(|f| f.path == path)
            .unwrap_or_else(|| {
                self.files.push(SourceFile { path });
                self.files.len() - 1
            });
        FileId(u32::try_from(index).unwrap_or_else(|_| panic!("too many source files")))
    }

    /// Look up a file.
    ///
    /// # Panics
    /// Panics if `id` did not come from this table.
    pub fn get(&self, id: FileId) -> &SourceFile {
        &self.files[id.0 as usize]
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// A source range at line granularity. Lines are 1-based.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Loc {
    file: Option<FileId>,
    pub start_line: u32,
    pub end_line: u32,
}

impl Loc {
    /// Location of synthesized code.
    pub const NONE: Loc = Loc {
        file: None,
        start_line: 0,
        end_line: 0,
    };

    pub fn new(file: FileId, start_line: u32, end_line: u32) -> Self {
        debug_assert!(start_line <= end_line, "inverted source range");
        Self {
            file: Some(file),
            start_line,
            end_line,
        }
    }

    /// A single-line location.
    pub fn line(file: FileId, line: u32) -> Self {
        Self::new(file, line, line)
    }

    #[inline]
    pub fn exists(self) -> bool {
        self.file.is_some()
    }

    #[inline]
    pub fn file(self) -> Option<FileId> {
        self.file
    }
}
