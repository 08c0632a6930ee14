//! The `build-index` command: load AST files and write a global module
//! index over them.

use std::path::{Path, PathBuf};

use cx_ir::AstContext;
use cx_serialization::{AstReader, GlobalModuleIndex, ReaderOptions, SerializationError};

use super::cache_files;

/// Index every module in `files` (and whatever they import) and write
/// the index to `out`.
#[tracing::instrument(level = "debug", skip_all, fields(out = %out.display(), files = files.len()))]
pub fn build_index(out: &Path, files: &[PathBuf]) -> Result<GlobalModuleIndex, SerializationError> {
    let (cache, names) = cache_files(files)?;
    let mut ctx = AstContext::default();
    let mut reader = AstReader::new(&mut ctx, ReaderOptions::default());
    for name in &names {
        reader.load_module(name, &cache)?;
    }
    let index = GlobalModuleIndex::from_manager(reader.manager());
    index.write(out)?;
    tracing::debug!(
        modules = index.modules().len(),
        identifiers = index.num_identifiers(),
        "wrote global module index"
    );
    Ok(index)
}
