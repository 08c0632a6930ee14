//! The `dump-decls` command: load a module and list its top-level
//! declarations.

use std::fmt;
use std::path::{Path, PathBuf};

use cx_diagnostic::Diagnostic;
use cx_ir::{AstContext, DeclClass, DeclId, FunctionBody};
use cx_serialization::{AstReader, ReaderOptions, SerializationError};

use super::{cache_files, parent_dir};

/// One line of `dump-decls` output.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeclSummary {
    pub class: DeclClass,
    pub name: String,
    /// Spelled type of a value declaration.
    pub ty: Option<String>,
    pub has_body: bool,
    /// Declarations of the same entity, this one included.
    pub redecls: usize,
}

#[derive(Debug)]
pub struct DumpOutput {
    pub module: String,
    pub decls: Vec<DeclSummary>,
    /// Warnings raised while loading.
    pub warnings: Vec<Diagnostic>,
}

/// Load the module in `path`, with `deps` supplying its imports, and
/// summarize its top-level declarations.
#[tracing::instrument(level = "debug", skip_all, fields(path = %path.display()))]
pub fn dump_decls(path: &Path, deps: &[PathBuf]) -> Result<DumpOutput, SerializationError> {
    let mut files = deps.to_vec();
    files.push(path.to_path_buf());
    let (mut cache, names) = cache_files(&files)?;
    if let Some(dir) = parent_dir(path) {
        cache = cache.with_directory(dir);
    }
    let module = names.last().cloned().unwrap_or_default();

    let mut ctx = AstContext::default();
    let mut reader = AstReader::new(&mut ctx, ReaderOptions::default());
    let index = reader.load_module(&module, &cache)?;
    let decls = reader.load_top_level_decls(index)?;
    tracing::debug!(module = %module, decls = decls.len(), "loaded top-level declarations");
    let warnings = reader.take_diagnostics();
    let ctx = reader.context();
    Ok(DumpOutput {
        module,
        decls: decls.into_iter().map(|d| summarize(ctx, d)).collect(),
        warnings,
    })
}

fn summarize(ctx: &AstContext, d: DeclId) -> DeclSummary {
    let decl = ctx.decl(d);
    DeclSummary {
        class: decl.class(),
        name: ctx.decl_name(d).to_owned(),
        ty: decl.value_type().map(|ty| {
            match ctx.types.builtin_kind(ty) {
                Some(builtin) => format!("{builtin:?}"),
                None => ctx.types.class(ty.ty).to_string(),
            }
        }),
        has_body: decl
            .data
            .function()
            .is_some_and(|f| !matches!(f.body, FunctionBody::None)),
        redecls: ctx.redecls(d).count(),
    }
}

impl fmt::Display for DeclSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.class, self.name)?;
        if let Some(ty) = &self.ty {
            write!(f, " : {ty}")?;
        }
        if self.has_body {
            f.write_str(" {...}")?;
        }
        if self.redecls > 1 {
            write!(f, " ({} declarations)", self.redecls)?;
        }
        Ok(())
    }
}
