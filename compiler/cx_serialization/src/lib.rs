//! cx serialization - relocatable AST files
//!
//! An AST file is one serialized snapshot of a translation (a precompiled
//! header, a preamble or a module). This crate writes and reads them:
//! - Bitstream container with blocks, records and abbreviations
//! - Per-module local ID spaces remapped into translation-wide global IDs
//! - Lazy loading: declarations, types and function bodies are read on
//!   first use
//! - Redeclaration chains spanning several module files
//! - A global module index for skipping modules during name lookup
//!
//! # Loading model
//!
//! Loading is single-threaded and recursive. A declaration is registered
//! as an empty shell before its fields are read, so a reference cycle
//! (A's context needs B, B's type needs A) ends at the shell instead of
//! recursing forever. Cross references that cannot be wired up yet are
//! queued and patched once the outermost load finishes.

pub mod bitstream;
pub mod codes;
mod error;
mod global_index;
pub mod ids;
mod module_file;
mod module_manager;
mod range_map;
mod reader;
mod redecl;
mod writer;

pub use error::SerializationError;
pub use global_index::{GlobalModuleIndex, IndexedModule};
pub use ids::{
    DeclIdx, IdSpaceKind, IdentIdx, MacroIdx, PreprocessedEntityIdx, SelectorIdx, SourceOffset,
    SubmoduleIdx, TypeIdx,
};
pub use module_file::{
    IdSpace, ImportRecord, ModuleFile, ModuleKind, RemapEntry, SelectorRecord, SourceFileRecord,
    SubmoduleRecord,
};
pub use module_manager::{
    ImportedEntities, ModuleCache, ModuleIndex, ModuleManager, MODULE_FILE_EXTENSION,
};
pub use range_map::ContinuousRangeMap;
pub use reader::{AstReader, DeclLoadState, ReaderOptions};
pub use redecl::{recency_key, ForwardRef, PendingPrevious, RedeclarationChainResolver};
pub use writer::{AstWriter, WriterOptions};

pub(crate) type Result<T, E = SerializationError> = std::result::Result<T, E>;
