//! Source locations and the file table they point into.
//!
//! A [`SourceLocation`] is a single `u32` offset into one flat address
//! space shared by every file the translation has seen. Each file
//! occupies `[base, base + size]` of that space; offset 0 is reserved so
//! the zero location can mean "no location".

use std::fmt;

use crate::ids::to_u32;
use crate::FileId;

/// Encoded position in the translation's source address space.
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord, Default)]
#[repr(transparent)]
pub struct SourceLocation(u32);

impl SourceLocation {
    pub const INVALID: Self = Self(0);

    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn is_valid(self) -> bool {
        self.0 != 0
    }

    /// Location `delta` bytes further into the same file.
    #[inline]
    #[must_use]
    pub const fn offset_by(self, delta: u32) -> Self {
        Self(self.0 + delta)
    }
}

impl fmt::Debug for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(f, "loc:{}", self.0)
        } else {
            f.write_str("loc:<invalid>")
        }
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub struct SourceRange {
    pub begin: SourceLocation,
    pub end: SourceLocation,
}

impl SourceRange {
    pub const fn new(begin: SourceLocation, end: SourceLocation) -> Self {
        Self { begin, end }
    }

    pub const fn point(loc: SourceLocation) -> Self {
        Self { begin: loc, end: loc }
    }
}

/// One file registered with the [`SourceManager`].
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct FileEntry {
    pub name: String,
    /// First location of the file.
    pub base: u32,
    pub size: u32,
}

impl FileEntry {
    /// Whether `loc` falls inside this file (the end-of-file position included).
    #[inline]
    pub fn contains(&self, loc: SourceLocation) -> bool {
        loc.0 >= self.base && loc.0 <= self.base + self.size
    }
}

#[derive(Clone, Debug)]
pub struct SourceManager {
    files: Vec<FileEntry>,
    next_offset: u32,
}

impl Default for SourceManager {
    fn default() -> Self {
        Self::new()
    }
}

impl SourceManager {
    pub fn new() -> Self {
        SourceManager {
            files: Vec::new(),
            next_offset: 1,
        }
    }

    /// Register a file of `size` bytes, reserving its slice of the
    /// location space.
    pub fn create_file(&mut self, name: impl Into<String>, size: u32) -> FileId {
        let id = FileId::new(to_u32(self.files.len(), "source files"));
        let base = self.next_offset;
        // One extra slot for the end-of-file location.
        self.next_offset = base
            .checked_add(size)
            .and_then(|n| n.checked_add(1))
            .unwrap_or_else(|| panic!("source location space exhausted"));
        self.files.push(FileEntry {
            name: name.into(),
            base,
            size,
        });
        id
    }

    #[inline]
    pub fn file(&self, id: FileId) -> &FileEntry {
        &self.files[id.index()]
    }

    #[inline]
    pub fn files(&self) -> &[FileEntry] {
        &self.files
    }

    /// First offset not yet handed out.
    #[inline]
    pub fn next_offset(&self) -> u32 {
        self.next_offset
    }

    /// Location of byte `offset` in `file`.
    pub fn location(&self, file: FileId, offset: u32) -> SourceLocation {
        let entry = self.file(file);
        assert!(
            offset <= entry.size,
            "offset {offset} is past the end of {} ({} bytes)",
            entry.name,
            entry.size
        );
        SourceLocation(entry.base + offset)
    }

    /// File containing `loc`, by binary search over the file bases.
    pub fn file_for_location(&self, loc: SourceLocation) -> Option<FileId> {
        if !loc.is_valid() {
            return None;
        }
        let idx = self.files.partition_point(|f| f.base <= loc.0);
        let idx = idx.checked_sub(1)?;
        self.files[idx]
            .contains(loc)
            .then(|| FileId::new(to_u32(idx, "source files")))
    }

    /// Split `loc` into its file and the byte offset within it.
    pub fn decompose(&self, loc: SourceLocation) -> Option<(FileId, u32)> {
        let file = self.file_for_location(loc)?;
        Some((file, loc.0 - self.file(file).base))
    }
}

#[cfg(test)]
mod tests;
