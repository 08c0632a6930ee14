//! Loading AST files into an [`AstContext`].
//!
//! Loading a module parses its tables and assigns its global ID ranges;
//! nothing in the DECLTYPES block is decoded yet. Declarations and types
//! are materialized the first time something asks for their global ID,
//! and function bodies the first time [`AstReader::function_body`] is
//! called (unless lazy bodies are turned off).
//!
//! # Load states
//!
//! A declaration goes `NotLoaded -> Loading -> Loaded -> Linked`. The
//! shell is registered (`Loading`) before any field is read, so a
//! reference cycle ends at the shell. Once the outermost request returns,
//! queued redeclarations are loaded, every touched chain is settled and
//! forward references are patched; every declaration loaded in that round
//! is then `Linked`.
//!
//! # Failure
//!
//! Malformed input is fatal. An error raised while a declaration, type,
//! body or module registration is half read rolls back the declarations of
//! that request, is reported through [`AstReader::diagnostics`], and leaves
//! the reader failed: every later request returns
//! [`SerializationError::ReaderFailed`] instead of handing out declarations
//! that were built from a corrupt file.

mod decl;
mod stmt;
mod types;

use cx_diagnostic::{Diagnostic, DiagnosticQueue, ErrorCode, ErrorGuaranteed};
use cx_ir::preprocessor::{InclusionKind, PreprocessedEntity};
use cx_ir::{
    AstContext, DeclId, FunctionBody, MacroDefinition, MacroId, Name, PreprocessedEntityId,
    QualType, SelectorId, SourceLocation, SourceRange, StmtId, SubmoduleId, TypeId,
};
use cx_stack::ensure_sufficient_stack;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::bitstream::{BitstreamCursor, Record, RecordFields, SavedStreamPosition};
use crate::codes::{self, preprocessor};
use crate::global_index::GlobalModuleIndex;
use crate::ids::{
    DeclIdx, IdSpaceKind, IdentIdx, MacroIdx, PreprocessedEntityIdx, SelectorIdx, SourceOffset,
    SubmoduleIdx, TypeIdx, PREDEF_DECL_NULL, PREDEF_DECL_TRANSLATION_UNIT,
};
use crate::module_file::{ModuleFile, RemapEntry};
use crate::module_manager::{ModuleCache, ModuleIndex, ModuleManager};
use crate::redecl::RedeclarationChainResolver;
use crate::{Result, SerializationError};

#[derive(Copy, Clone, Debug)]
pub struct ReaderOptions {
    /// Defer function bodies until [`AstReader::function_body`] asks.
    pub lazy_function_bodies: bool,
    /// Reject records with fields left over after decoding.
    pub validate_record_lengths: bool,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        ReaderOptions {
            lazy_function_bodies: true,
            validate_record_lengths: true,
        }
    }
}

/// How far loading a declaration has progressed.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum DeclLoadState {
    NotLoaded,
    /// Registered as a shell; its fields are being read.
    Loading(DeclId),
    /// Fields read, chain and shared state not settled yet.
    Loaded(DeclId),
    /// Part of a settled redeclaration chain.
    Linked(DeclId),
}

impl DeclLoadState {
    pub fn decl(self) -> Option<DeclId> {
        match self {
            DeclLoadState::NotLoaded => None,
            DeclLoadState::Loading(d) | DeclLoadState::Loaded(d) | DeclLoadState::Linked(d) => {
                Some(d)
            }
        }
    }
}

/// Reads AST files into one translation.
pub struct AstReader<'c> {
    ctx: &'c mut AstContext,
    options: ReaderOptions,
    manager: ModuleManager,
    /// Positioned inside each module's DECLTYPES block, by module index.
    cursors: Vec<BitstreamCursor>,
    resolver: RedeclarationChainResolver,
    decls: FxHashMap<u32, DeclLoadState>,
    /// Declarations loaded since the chains were last settled.
    unlinked: Vec<u32>,
    types: FxHashMap<u32, TypeId>,
    selectors: FxHashMap<u32, SelectorId>,
    macros: FxHashMap<u32, MacroId>,
    entities: FxHashMap<u32, PreprocessedEntityId>,
    submodules: FxHashMap<u32, SubmoduleId>,
    /// Loaded declarations this reader added to the translation unit.
    attached: FxHashSet<DeclId>,
    /// Nesting of public entry points; chains settle when it drops to 0.
    depth: u32,
    /// Reads started and not finished; non-zero after an error means the
    /// error interrupted one.
    in_flight: u32,
    failed: Option<ErrorGuaranteed>,
    diagnostics: DiagnosticQueue,
}

impl<'c> AstReader<'c> {
    pub fn new(ctx: &'c mut AstContext, options: ReaderOptions) -> Self {
        AstReader {
            ctx,
            options,
            manager: ModuleManager::new(),
            cursors: Vec::new(),
            resolver: RedeclarationChainResolver::new(),
            decls: FxHashMap::default(),
            unlinked: Vec::new(),
            types: FxHashMap::default(),
            selectors: FxHashMap::default(),
            macros: FxHashMap::default(),
            entities: FxHashMap::default(),
            submodules: FxHashMap::default(),
            attached: FxHashSet::default(),
            depth: 0,
            in_flight: 0,
            failed: None,
            diagnostics: DiagnosticQueue::new(),
        }
    }

    #[inline]
    pub fn context(&self) -> &AstContext {
        self.ctx
    }

    #[inline]
    pub fn context_mut(&mut self) -> &mut AstContext {
        self.ctx
    }

    #[inline]
    pub fn manager(&self) -> &ModuleManager {
        &self.manager
    }

    #[inline]
    pub fn options(&self) -> ReaderOptions {
        self.options
    }

    /// Warnings raised while loading and the errors that aborted a load.
    #[inline]
    pub fn diagnostics(&self) -> &DiagnosticQueue {
        &self.diagnostics
    }

    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        self.diagnostics.flush()
    }

    /// Proof of the error that stopped this reader, if one did.
    #[inline]
    pub fn failure(&self) -> Option<ErrorGuaranteed> {
        self.failed
    }

    // === Modules ===

    /// Load module `name` and, first, everything it imports.
    #[tracing::instrument(level = "debug", skip(self, cache))]
    pub fn load_module(&mut self, name: &str, cache: &ModuleCache) -> Result<ModuleIndex> {
        let index = self.scoped(Some(name), |r| r.load_module_tree(name, cache, &mut Vec::new()))?;
        self.manager.mark_direct(index);
        Ok(index)
    }

    fn load_module_tree(
        &mut self,
        name: &str,
        cache: &ModuleCache,
        loading: &mut Vec<String>,
    ) -> Result<ModuleIndex> {
        if let Some(index) = self.manager.lookup(name) {
            tracing::debug!(module = name, "module already loaded");
            return Ok(index);
        }
        if loading.iter().any(|n| n == name) {
            return Err(SerializationError::DuplicateLoad { name: name.to_owned() });
        }
        let mut module = ModuleFile::parse(cache.get(name)?)?;
        if module.name != name {
            return Err(SerializationError::malformed(format!(
                "AST file for `{name}` names itself `{}`",
                module.name
            )));
        }

        loading.push(name.to_owned());
        let imports: Vec<String> = module.imports.iter().map(|i| i.name.clone()).collect();
        for import in &imports {
            self.load_module_tree(import, cache, loading)?;
        }
        loading.pop();

        self.map_source_files(&mut module);
        module.ident_names = module.identifiers.iter().map(|s| self.ctx.idents.intern(s)).collect();
        let cursor = module.decls_cursor.clone();
        let index = self.manager.add(module)?;
        debug_assert_eq!(index.index(), self.cursors.len());
        self.cursors.push(cursor);
        self.tracked(|r| r.register_module(index))?;
        Ok(index)
    }

    fn register_module(&mut self, index: ModuleIndex) -> Result<()> {
        self.register_identifiers(index);
        self.register_selectors(index)?;
        self.register_macros(index)?;
        self.register_entities(index)?;
        self.register_submodules(index)?;
        self.apply_overrides(index)
    }

    /// Give the module's files a fresh slice of the location space.
    fn map_source_files(&mut self, module: &mut ModuleFile) {
        let start = self.ctx.sources.next_offset();
        let mut remap = module.source_remap.builder();
        for file in &module.source_files {
            let id = self.ctx.sources.create_file(file.name.clone(), file.size);
            remap.insert(
                file.base,
                RemapEntry {
                    target: self.ctx.sources.file(id).base,
                    len: file.size + 1,
                },
            );
            self.manager.imported.files.insert(id);
        }
        remap.finish();
        module.source_start = start;
        module.source_span = self.ctx.sources.next_offset() - start;
    }

    fn register_identifiers(&mut self, index: ModuleIndex) {
        let module = self.manager.get(index);
        let base = module.space(IdSpaceKind::Identifier).base;
        let names: Vec<Name> = module.ident_names.clone();
        for (i, name) in names.into_iter().enumerate() {
            self.manager.imported.record_ident(name, base + i as u32);
        }
    }

    fn register_selectors(&mut self, index: ModuleIndex) -> Result<()> {
        let module = self.manager.get(index);
        let base = module.space(IdSpaceKind::Selector).base;
        let selectors = module.selectors.clone();
        for (i, sel) in selectors.into_iter().enumerate() {
            let pieces = sel
                .pieces
                .iter()
                .map(|&p| self.ident_from(index, p))
                .collect::<Result<Vec<_>>>()?;
            let id = self.ctx.selectors.intern(&pieces, sel.num_args);
            let global = base + i as u32;
            self.selectors.insert(global, id);
            self.manager.imported.record_selector(id, global);
        }
        Ok(())
    }

    fn register_macros(&mut self, index: ModuleIndex) -> Result<()> {
        let module = self.manager.get(index);
        let base = module.space(IdSpaceKind::Macro).base;
        let records = module.macros.clone();
        for (i, record) in records.iter().enumerate() {
            let mut f = record.fields();
            let name = self.read_ident(index, &mut f)?;
            let range = self.read_range(index, &mut f)?;
            let is_function_like = f.next_bool()?;
            let params = f
                .remaining()
                .iter()
                .map(|&p| self.ident_from(index, narrow(p)?))
                .collect::<Result<Vec<_>>>()?;
            let id = self.ctx.preprocessing.add_macro(MacroDefinition {
                name,
                range,
                params,
                is_function_like,
            });
            let global = base + i as u32;
            self.macros.insert(global, id);
            self.manager.imported.record_macro(id, global);
        }
        Ok(())
    }

    fn register_entities(&mut self, index: ModuleIndex) -> Result<()> {
        let module = self.manager.get(index);
        let base = module.space(IdSpaceKind::PreprocessedEntity).base;
        let records = module.entities.clone();
        for (i, record) in records.iter().enumerate() {
            let mut f = record.fields();
            let entity = match record.code {
                preprocessor::MACRO_EXPANSION => {
                    let name = self.read_ident(index, &mut f)?;
                    let definition = match f.next_u32()? {
                        0 => None,
                        raw => {
                            let global =
                                self.manager.get(index).resolve(IdSpaceKind::Macro, raw)?;
                            Some(self.macro_by_global(global)?)
                        }
                    };
                    let range = self.read_range(index, &mut f)?;
                    PreprocessedEntity::MacroExpansion {
                        name,
                        definition,
                        range,
                    }
                }
                preprocessor::INCLUSION_DIRECTIVE => {
                    let kind = f.next_enum("inclusion kind", InclusionKind::from_raw)?;
                    let range = self.read_range(index, &mut f)?;
                    let imported_file = match self.read_loc(index, &mut f)? {
                        loc if loc.is_valid() => Some(self.file_at(loc)?),
                        _ => None,
                    };
                    let file_name = String::from_utf8(record.blob()?.to_vec()).map_err(|_| {
                        SerializationError::malformed("inclusion file name is not UTF-8")
                    })?;
                    PreprocessedEntity::InclusionDirective {
                        file_name,
                        kind,
                        range,
                        imported_file,
                    }
                }
                code => {
                    return Err(SerializationError::malformed(format!(
                        "record {code} is not a preprocessed entity"
                    )))
                }
            };
            self.finish_record(&f)?;
            let id = self.ctx.preprocessing.add_entity(entity);
            let global = base + i as u32;
            self.entities.insert(global, id);
            self.manager.imported.record_entity(id, global);
        }
        Ok(())
    }

    fn register_submodules(&mut self, index: ModuleIndex) -> Result<()> {
        let module = self.manager.get(index);
        let base = module.space(IdSpaceKind::Submodule).base;
        let records = module.submodules.clone();
        for (i, sub) in records.into_iter().enumerate() {
            let parent = match sub.parent {
                0 => None,
                raw => {
                    let global = self.manager.get(index).resolve(IdSpaceKind::Submodule, raw)?;
                    Some(self.submodule_by_global(global)?)
                }
            };
            let mut headers = Vec::with_capacity(sub.headers.len());
            for raw in sub.headers {
                let loc = self.manager.get(index).resolve_location(raw)?;
                headers.push(self.file_at(loc)?);
            }
            let id = self.ctx.submodules.create(sub.name, parent, sub.is_explicit);
            self.ctx.submodules.get_mut(id).headers = headers;
            let global = base + i as u32;
            self.submodules.insert(global, id);
            self.manager.imported.record_submodule(id, global);
        }
        Ok(())
    }

    /// Replacements and chain extensions that concern declarations loaded
    /// before this module arrived.
    fn apply_overrides(&mut self, index: ModuleIndex) -> Result<()> {
        let module = self.manager.get(index);
        let mut replaced = Vec::new();
        for &(decl, _) in &module.replacements {
            replaced.push(module.resolve(IdSpaceKind::Decl, decl)?);
        }
        let mut extended = Vec::new();
        for &(first, latest) in &module.chain_latest {
            extended.push((
                module.resolve(IdSpaceKind::Decl, first)?,
                module.resolve(IdSpaceKind::Decl, latest)?,
            ));
        }
        let name = module.name.clone();

        for global in replaced {
            if self.decls.contains_key(&global) {
                tracing::debug!(
                    module = %name,
                    decl = global,
                    "replacement for an already loaded declaration ignored"
                );
                self.diagnostics.add(
                    Diagnostic::warning(ErrorCode::W9001)
                        .with_message(format!(
                            "module `{name}` replaces declaration {global}, \
                             which was already loaded"
                        ))
                        .with_note(
                            "the loaded declaration is kept; \
                             the replacement applies to later loads only",
                        ),
                );
            }
        }
        for (first, latest) in extended {
            if let Some(first) = self.decls.get(&first).and_then(|s| s.decl()) {
                self.resolver.queue_latest(first, latest);
            }
        }
        Ok(())
    }

    // === Entry points ===

    /// Run `f` as one public request. The outermost request settles
    /// chains when `f` succeeds and reports the error when it fails.
    /// `module` names the file the request is about, if any.
    fn scoped<T>(
        &mut self,
        module: Option<&str>,
        f: impl FnOnce(&mut Self) -> Result<T>,
    ) -> Result<T> {
        if self.failed.is_some() {
            return Err(SerializationError::ReaderFailed);
        }
        self.depth += 1;
        let result = ensure_sufficient_stack(|| f(self));
        self.depth -= 1;
        if self.depth > 0 {
            return result;
        }
        result
            .and_then(|value| self.tracked(Self::settle).map(|()| value))
            .map_err(|e| self.abort(e, module))
    }

    /// Run one read that leaves partial state behind if it fails.
    fn tracked<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        self.in_flight += 1;
        let value = f(self)?;
        self.in_flight -= 1;
        Ok(value)
    }

    /// Report the error ending the outermost request. If it interrupted a
    /// read, forget what that request loaded and stop serving requests.
    #[cold]
    fn abort(&mut self, error: SerializationError, module: Option<&str>) -> SerializationError {
        let guarantee = self.diagnostics.emit_error(error.to_diagnostic(module));
        if self.in_flight > 0 {
            self.in_flight = 0;
            self.roll_back();
            self.failed = Some(guarantee);
            tracing::debug!(%error, "load failed partway; reader stopped");
        }
        error
    }

    /// Drop the declarations loaded since chains were last settled.
    fn roll_back(&mut self) {
        let tu = self.ctx.translation_unit();
        for global in std::mem::take(&mut self.unlinked) {
            if let Some(d) = self.decls.remove(&global).and_then(DeclLoadState::decl) {
                if self.attached.remove(&d) {
                    self.ctx.remove_decl(tu, d);
                }
            }
        }
        self.resolver.clear();
    }

    /// Load queued redeclarations, settle every touched chain and patch
    /// forward references.
    ///
    /// Every public request does this when it returns; calling it directly
    /// only matters after the context was changed by hand.
    pub fn finish_pending_actions(&mut self) -> Result<()> {
        self.scoped(None, |_| Ok(()))
    }

    #[tracing::instrument(level = "debug", skip_all)]
    fn settle(&mut self) -> Result<()> {
        self.depth += 1;
        let result = self.drain_pending();
        self.depth -= 1;
        result?;
        self.resolver.finish(self.ctx)?;
        for global in std::mem::take(&mut self.unlinked) {
            if let Some(DeclLoadState::Loaded(d)) = self.decls.get(&global).copied() {
                self.decls.insert(global, DeclLoadState::Linked(d));
            }
        }
        Ok(())
    }

    /// Load what the resolver queued until nothing new is queued. Each
    /// loaded predecessor may queue its own, so a chain is walked one
    /// record per round instead of one stack frame per declaration.
    fn drain_pending(&mut self) -> Result<()> {
        while self.resolver.has_pending() {
            for (first, global) in self.resolver.take_pending() {
                let decl = self.decl_by_global(global)?;
                if decl != first {
                    self.resolver.note_candidate(first, decl);
                }
            }
            for pending in self.resolver.take_pending_previous() {
                let prev = self.decl_by_global(pending.prev)?;
                self.resolver.link_previous(self.ctx, pending.decl, pending.first, prev)?;
            }
        }
        Ok(())
    }

    /// Declaration with global ID `id`, loading it if needed.
    pub fn get_decl(&mut self, id: DeclIdx) -> Result<DeclId> {
        self.scoped(None, |r| r.decl_by_global(id.raw()))
    }

    pub fn decl_state(&self, id: DeclIdx) -> DeclLoadState {
        self.decls.get(&id.raw()).copied().unwrap_or(DeclLoadState::NotLoaded)
    }

    /// Global ID a loaded declaration came from.
    pub fn global_decl_id(&self, decl: DeclId) -> Option<DeclIdx> {
        self.ctx.decl(decl).origin.map(|o| DeclIdx::new(o.raw()))
    }

    pub fn get_type(&mut self, id: TypeIdx) -> Result<QualType> {
        self.scoped(None, |r| r.qual_type_by_global(id))
    }

    pub fn get_identifier(&self, id: IdentIdx) -> Result<Name> {
        if id.is_none() {
            return Ok(Name::EMPTY);
        }
        self.ident_by_global(id.raw())
    }

    pub fn get_selector(&self, id: SelectorIdx) -> Result<SelectorId> {
        lookup(&self.selectors, IdSpaceKind::Selector, id.raw())
    }

    pub fn get_macro(&self, id: MacroIdx) -> Result<MacroId> {
        self.macro_by_global(id.raw())
    }

    pub fn get_preprocessed_entity(
        &self,
        id: PreprocessedEntityIdx,
    ) -> Result<PreprocessedEntityId> {
        lookup(&self.entities, IdSpaceKind::PreprocessedEntity, id.raw())
    }

    pub fn get_submodule(&self, id: SubmoduleIdx) -> Result<SubmoduleId> {
        self.submodule_by_global(id.raw())
    }

    /// Translate a location written in module `index`.
    pub fn read_source_location(
        &self,
        index: ModuleIndex,
        offset: SourceOffset,
    ) -> Result<SourceLocation> {
        self.manager.get(index).resolve_location(offset.raw())
    }

    /// Top-level declarations module `index` lists for the translation
    /// unit, loaded.
    pub fn load_top_level_decls(&mut self, index: ModuleIndex) -> Result<Vec<DeclId>> {
        self.scoped(None, |r| {
            let module = r.manager.get(index);
            let globals = module
                .tu_decls
                .iter()
                .map(|&d| module.resolve(IdSpaceKind::Decl, d))
                .collect::<Result<Vec<_>>>()?;
            globals.into_iter().map(|g| r.decl_by_global(g)).collect()
        })
    }

    /// Top-level declarations named `name` in every loaded module. With
    /// an index, modules it does not list for the name are skipped.
    #[tracing::instrument(level = "debug", skip(self, index))]
    pub fn lookup_name(
        &mut self,
        name: &str,
        index: Option<&GlobalModuleIndex>,
    ) -> Result<Vec<DeclId>> {
        let mut globals = Vec::new();
        let mut skipped = 0usize;
        for (_, module) in self.manager.iter() {
            let ruled_out = index
                .is_some_and(|ix| ix.covers(&module.name) && !ix.may_contain(&module.name, name));
            if ruled_out {
                skipped += 1;
                continue;
            }
            if let Some(ids) = module.lookup.get(name) {
                for &id in ids {
                    globals.push(module.resolve(IdSpaceKind::Decl, id)?);
                }
            }
        }
        tracing::debug!(candidates = globals.len(), skipped, "name lookup");
        self.scoped(None, |r| {
            let mut found = Vec::with_capacity(globals.len());
            let mut seen = FxHashSet::default();
            for global in globals {
                let decl = r.decl_by_global(global)?;
                if seen.insert(decl) {
                    found.push(decl);
                }
            }
            Ok(found)
        })
    }

    /// Body of function `decl`, loading a deferred one.
    pub fn function_body(&mut self, decl: DeclId) -> Result<Option<StmtId>> {
        let offset = match self.ctx.decl(decl).data.function().map(|f| f.body) {
            Some(FunctionBody::Present(body)) => return Ok(Some(body)),
            Some(FunctionBody::Deferred(offset)) => offset,
            Some(FunctionBody::None) | None => return Ok(None),
        };
        let module = ModuleIndex::new(offset.source);
        if module.index() >= self.cursors.len() {
            return Err(SerializationError::malformed(format!(
                "deferred body of declaration {} names unknown module {module}",
                decl.raw()
            )));
        }
        let body = self.scoped(None, |r| r.tracked(|r| r.read_body(module, offset.bit)))?;
        if let Some(f) = self.ctx.decl_mut(decl).data.function_mut() {
            f.body = FunctionBody::Present(body);
        }
        tracing::trace!(decl = decl.raw(), body = body.raw(), "loaded function body");
        Ok(Some(body))
    }

    /// Every specialization of `template`, loading those still known only
    /// by ID.
    pub fn template_specializations(&mut self, template: DeclId) -> Result<Vec<DeclId>> {
        let first = self.ctx.first_decl(template);
        let Some(common) = self.ctx.decl(first).data.template().and_then(|t| t.common) else {
            return Ok(Vec::new());
        };
        let lazy = std::mem::take(&mut self.ctx.template_common_mut(common).lazy_specializations);
        if !lazy.is_empty() {
            let loaded = self.scoped(None, |r| {
                lazy.iter()
                    .map(|ext| r.decl_by_global(ext.raw()))
                    .collect::<Result<Vec<_>>>()
            });
            let loaded = match loaded {
                Ok(loaded) => loaded,
                Err(e) => {
                    self.ctx.template_common_mut(common).lazy_specializations = lazy;
                    return Err(e);
                }
            };
            let specs = &mut self.ctx.template_common_mut(common).specializations;
            let mut known: FxHashSet<DeclId> = specs.iter().copied().collect();
            for spec in loaded {
                if known.insert(spec) {
                    specs.push(spec);
                }
            }
        }
        Ok(self.ctx.template_common(common).specializations.clone())
    }

    // === Global IDs ===

    pub(crate) fn decl_by_global(&mut self, global: u32) -> Result<DeclId> {
        if global == PREDEF_DECL_NULL.raw() {
            return Ok(DeclId::INVALID);
        }
        if global == PREDEF_DECL_TRANSLATION_UNIT.raw() {
            return Ok(self.ctx.translation_unit());
        }
        if let Some(d) = self.decls.get(&global).and_then(|s| s.decl()) {
            return Ok(d);
        }
        ensure_sufficient_stack(|| self.tracked(|r| r.read_decl(global)))
    }

    fn qual_type_by_global(&mut self, idx: TypeIdx) -> Result<QualType> {
        if idx.is_null() {
            return Ok(QualType::NULL);
        }
        if let Some(ty) = idx.as_builtin() {
            return Ok(QualType::new(ty, idx.quals()));
        }
        let ty = self.type_by_global(idx.index())?;
        Ok(QualType::new(ty, idx.quals()))
    }

    fn type_by_global(&mut self, global: u32) -> Result<TypeId> {
        if let Some(&ty) = self.types.get(&global) {
            return Ok(ty);
        }
        let ty = ensure_sufficient_stack(|| self.tracked(|r| r.read_type(global)))?;
        self.types.insert(global, ty);
        self.manager.imported.record_type(ty, global);
        Ok(ty)
    }

    fn ident_by_global(&self, global: u32) -> Result<Name> {
        let (index, local) = self.manager.resolve_global_ident(global)?;
        self.manager
            .get(index)
            .ident_names
            .get(local as usize)
            .copied()
            .ok_or(SerializationError::UnknownGlobalId {
                space: IdSpaceKind::Identifier,
                id: global,
            })
    }

    fn macro_by_global(&self, global: u32) -> Result<MacroId> {
        lookup(&self.macros, IdSpaceKind::Macro, global)
    }

    fn submodule_by_global(&self, global: u32) -> Result<SubmoduleId> {
        lookup(&self.submodules, IdSpaceKind::Submodule, global)
    }

    fn file_at(&self, loc: SourceLocation) -> Result<cx_ir::FileId> {
        self.ctx
            .sources
            .file_for_location(loc)
            .ok_or_else(|| {
                SerializationError::malformed(format!(
                    "location {} is not inside a file",
                    loc.raw()
                ))
            })
    }

    // === Module-local references ===

    fn ident_from(&self, index: ModuleIndex, raw: u32) -> Result<Name> {
        if raw == 0 {
            return Ok(Name::EMPTY);
        }
        let global = self.manager.get(index).resolve(IdSpaceKind::Identifier, raw)?;
        self.ident_by_global(global)
    }

    pub(super) fn read_ident(&self, index: ModuleIndex, f: &mut RecordFields<'_>) -> Result<Name> {
        let raw = f.next_u32()?;
        self.ident_from(index, raw)
    }

    pub(super) fn read_loc(
        &self,
        index: ModuleIndex,
        f: &mut RecordFields<'_>,
    ) -> Result<SourceLocation> {
        let raw = f.next_u32()?;
        self.manager.get(index).resolve_location(raw)
    }

    pub(super) fn read_range(
        &self,
        index: ModuleIndex,
        f: &mut RecordFields<'_>,
    ) -> Result<SourceRange> {
        let begin = self.read_loc(index, f)?;
        let end = self.read_loc(index, f)?;
        Ok(SourceRange::new(begin, end))
    }

    pub(super) fn read_decl_ref(
        &mut self,
        index: ModuleIndex,
        f: &mut RecordFields<'_>,
    ) -> Result<DeclId> {
        let raw = f.next_u32()?;
        let global = self.manager.get(index).resolve(IdSpaceKind::Decl, raw)?;
        self.decl_by_global(global)
    }

    pub(super) fn read_opt_decl_ref(
        &mut self,
        index: ModuleIndex,
        f: &mut RecordFields<'_>,
    ) -> Result<Option<DeclId>> {
        let d = self.read_decl_ref(index, f)?;
        Ok(d.is_valid().then_some(d))
    }

    /// Global ID of a declaration reference, without loading it.
    pub(super) fn read_decl_global(
        &self,
        index: ModuleIndex,
        f: &mut RecordFields<'_>,
    ) -> Result<u32> {
        let raw = f.next_u32()?;
        self.manager.get(index).resolve(IdSpaceKind::Decl, raw)
    }

    pub(super) fn read_type_ref(
        &mut self,
        index: ModuleIndex,
        f: &mut RecordFields<'_>,
    ) -> Result<QualType> {
        let idx = TypeIdx::from_raw(f.next_u32()?);
        if idx.is_null() || idx.as_builtin().is_some() {
            return self.qual_type_by_global(idx);
        }
        let global = self.manager.get(index).resolve_type(idx)?;
        self.qual_type_by_global(global)
    }

    pub(super) fn read_selector(
        &self,
        index: ModuleIndex,
        f: &mut RecordFields<'_>,
    ) -> Result<SelectorId> {
        let raw = f.next_u32()?;
        let global = self.manager.get(index).resolve(IdSpaceKind::Selector, raw)?;
        lookup(&self.selectors, IdSpaceKind::Selector, global)
    }

    pub(super) fn read_opt_submodule(
        &self,
        index: ModuleIndex,
        f: &mut RecordFields<'_>,
    ) -> Result<Option<SubmoduleId>> {
        match f.next_u32()? {
            0 => Ok(None),
            raw => {
                let global = self.manager.get(index).resolve(IdSpaceKind::Submodule, raw)?;
                self.submodule_by_global(global).map(Some)
            }
        }
    }

    pub(super) fn finish_record(&self, f: &RecordFields<'_>) -> Result<()> {
        if self.options.validate_record_lengths {
            f.finish()
        } else {
            Ok(())
        }
    }

    // === Stream access ===

    /// The record at `bit` in module `index`.
    pub(super) fn fetch_record(&mut self, index: ModuleIndex, bit: u64) -> Result<Record> {
        let mut cursor = SavedStreamPosition::new(&mut self.cursors[index.index()]);
        cursor.jump_to_bit(bit)?;
        cursor.read_next_record()
    }

    /// The decl record at `bit` and the statement groups following it.
    pub(super) fn fetch_decl(
        &mut self,
        index: ModuleIndex,
        bit: u64,
    ) -> Result<(Record, Vec<Vec<Record>>)> {
        let mut cursor = SavedStreamPosition::new(&mut self.cursors[index.index()]);
        cursor.jump_to_bit(bit)?;
        let record = cursor.read_next_record()?;
        let num_groups = record
            .values
            .last()
            .copied()
            .ok_or(SerializationError::RecordLengthMismatch {
                code: record.code,
                expected: 1,
                found: 0,
            })?;
        let mut groups = Vec::new();
        for _ in 0..num_groups {
            groups.push(read_group(&mut cursor)?);
        }
        Ok((record, groups))
    }

    /// The statement group at `bit` in module `index`.
    pub(super) fn fetch_group(&mut self, index: ModuleIndex, bit: u64) -> Result<Vec<Record>> {
        let mut cursor = SavedStreamPosition::new(&mut self.cursors[index.index()]);
        cursor.jump_to_bit(bit)?;
        read_group(&mut cursor)
    }

    fn read_body(&mut self, index: ModuleIndex, bit: u64) -> Result<StmtId> {
        let records = self.fetch_group(index, bit)?;
        self.build_stmt(index, records)
    }

    /// Where the body with 1-based ordinal `ordinal` of module `index`
    /// starts.
    pub(super) fn body_offset(&self, index: ModuleIndex, ordinal: usize) -> Result<u64> {
        let module = self.manager.get(index);
        ordinal
            .checked_sub(1)
            .and_then(|i| module.body_offsets.get(i).copied())
            .ok_or_else(|| {
                SerializationError::malformed(format!(
                    "function body {ordinal} is missing from `{}`",
                    module.name
                ))
            })
    }

    /// Add a loaded top-level declaration to the translation unit once.
    pub(super) fn attach_to_translation_unit(&mut self, decl: DeclId) {
        if self.attached.insert(decl) {
            let tu = self.ctx.translation_unit();
            self.ctx.add_decl(tu, decl);
        }
    }
}

/// Records of one statement group, up to and excluding its STOP.
fn read_group(cursor: &mut BitstreamCursor) -> Result<Vec<Record>> {
    let mut records = Vec::new();
    loop {
        let record = cursor.read_next_record()?;
        if record.code == codes::STMT_STOP {
            return Ok(records);
        }
        records.push(record);
    }
}

fn lookup<T: Copy>(map: &FxHashMap<u32, T>, space: IdSpaceKind, global: u32) -> Result<T> {
    map.get(&global)
        .copied()
        .ok_or(SerializationError::UnknownGlobalId { space, id: global })
}

fn narrow(v: u64) -> Result<u32> {
    u32::try_from(v)
        .map_err(|_| SerializationError::malformed(format!("ID {v} does not fit 32 bits")))
}
