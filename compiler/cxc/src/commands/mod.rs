//! Command handlers for the cxc CLI.
//!
//! Each submodule implements one subcommand. Handlers return what they
//! found; printing and exit codes belong to `main`.

use std::path::{Path, PathBuf};

use cx_serialization::{ModuleCache, SerializationError};

mod build_index;
mod dump_decls;
mod module_info;

pub use build_index::build_index;
pub use dump_decls::{dump_decls, DeclSummary, DumpOutput};
pub use module_info::{module_info, ModuleInfo};

/// Register every file in `paths` with a fresh cache; returns the cache
/// and the module names in argument order.
pub(crate) fn cache_files(
    paths: &[PathBuf],
) -> Result<(ModuleCache, Vec<String>), SerializationError> {
    let mut cache = ModuleCache::new();
    let mut names = Vec::with_capacity(paths.len());
    for path in paths {
        names.push(cache.insert_file(path)?);
    }
    Ok((cache, names))
}

/// Directory holding `path`, searched for imports no file names.
pub(crate) fn parent_dir(path: &Path) -> Option<PathBuf> {
    path.parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
}
