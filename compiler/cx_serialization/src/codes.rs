//! Block IDs and record codes of the AST file format.
//!
//! Declaration, statement and type record codes are derived from the node
//! class registries, so adding a node class assigns its record code too.

use cx_ir::{DeclClass, StmtClass, TypeClass};

/// First four bytes of every AST file.
pub const SIGNATURE: [u8; 4] = *b"CPCH";

/// Files with another major version are rejected.
pub const VERSION_MAJOR: u32 = 1;
pub const VERSION_MINOR: u32 = 0;

// Block IDs. 0..=7 are reserved by the bitstream container.
pub const CONTROL_BLOCK_ID: u32 = 8;
pub const AST_BLOCK_ID: u32 = 9;
pub const SOURCE_MANAGER_BLOCK_ID: u32 = 10;
pub const PREPROCESSOR_BLOCK_ID: u32 = 11;
pub const SUBMODULE_BLOCK_ID: u32 = 12;
pub const DECLTYPES_BLOCK_ID: u32 = 13;

/// Control block records.
pub mod control {
    /// `[major, minor, module kind]`
    pub const METADATA: u32 = 1;
    /// Module name, as a char6 array when it fits.
    pub const MODULE_NAME: u32 = 2;
    /// `[is_direct, base per ID space..., source base]` + name blob: a
    /// loaded module and the global bases the writer saw for it.
    pub const IMPORT: u32 = 3;
}

/// AST block records.
pub mod ast {
    /// `[bit offset...]` of each local type record.
    pub const TYPE_OFFSET: u32 = 1;
    /// `[bit offset...]` of each local decl record.
    pub const DECL_OFFSET: u32 = 2;
    /// `[local base, count]` per ID space.
    pub const ID_SPACES: u32 = 3;
    /// `[count]` + NUL-separated identifier blob.
    pub const IDENTIFIER_TABLE: u32 = 4;
    /// `[num_args, num_pieces, piece...]...`
    pub const SELECTOR_TABLE: u32 = 5;
    /// `[decl...]` top-level decls of the translation unit.
    pub const TU_DECLS: u32 = 6;
    /// `[count]` + NUL-separated names of the lookup table; followed by
    /// [`LOOKUP_DECLS`].
    pub const NAME_LOOKUP: u32 = 7;
    /// `[global decl, bit offset]...` for imported decls rewritten here.
    pub const DECL_REPLACEMENTS: u32 = 8;
    /// `[bit offset...]` of each function body, by body ordinal.
    pub const FUNCTION_BODY_OFFSETS: u32 = 9;
    /// `[num_decls, decl...]...` one run per [`NAME_LOOKUP`] name, in order.
    pub const LOOKUP_DECLS: u32 = 10;
    /// `[first decl, latest decl]...` for chains that started in an
    /// imported module and continue here.
    pub const CHAIN_LATEST: u32 = 11;
}

/// Source manager block records.
pub mod source {
    /// `[base, size]` + file name blob.
    pub const SOURCE_FILE: u32 = 1;
}

/// Preprocessor block records.
pub mod preprocessor {
    /// `[name, begin, end, is_function_like, param...]`
    pub const MACRO_DEFINITION: u32 = 1;
    /// `[name, definition, begin, end]`
    pub const MACRO_EXPANSION: u32 = 2;
    /// `[kind, begin, end, start of the imported file or 0]` + file name blob.
    pub const INCLUSION_DIRECTIVE: u32 = 3;
}

/// Submodule block records.
pub mod submodule {
    /// `[parent, is_explicit]` + name blob.
    pub const DEFINITION: u32 = 1;
    /// `[file location...]` headers of the preceding definition.
    pub const HEADERS: u32 = 2;
}

pub const TYPE_CODE_BASE: u32 = 16;
pub const DECL_CODE_BASE: u32 = 32;
pub const STMT_CODE_BASE: u32 = 64;

/// Ends one full statement in the statement stream.
pub const STMT_STOP: u32 = 1;
/// An absent child.
pub const STMT_NULL_PTR: u32 = 2;
/// `[index]` a child already read in this full statement.
pub const STMT_REF_PTR: u32 = 3;

#[inline]
pub fn type_code(class: TypeClass) -> u32 {
    TYPE_CODE_BASE + u32::from(class.raw())
}

#[inline]
pub fn decl_code(class: DeclClass) -> u32 {
    DECL_CODE_BASE + u32::from(class.raw())
}

#[inline]
pub fn stmt_code(class: StmtClass) -> u32 {
    STMT_CODE_BASE + u32::from(class.raw())
}

pub fn type_class_for_code(code: u32) -> Option<TypeClass> {
    class_for(code, TYPE_CODE_BASE).and_then(TypeClass::from_raw)
}

pub fn decl_class_for_code(code: u32) -> Option<DeclClass> {
    class_for(code, DECL_CODE_BASE).and_then(DeclClass::from_raw)
}

pub fn stmt_class_for_code(code: u32) -> Option<StmtClass> {
    class_for(code, STMT_CODE_BASE).and_then(StmtClass::from_raw)
}

fn class_for(code: u32, base: u32) -> Option<u8> {
    code.checked_sub(base).and_then(|raw| u8::try_from(raw).ok())
}

#[cfg(test)]
mod tests;
