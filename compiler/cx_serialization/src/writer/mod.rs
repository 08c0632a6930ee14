//! Writing a translation out as an AST file.
//!
//! The writer numbers every entity the translation owns from the next
//! free global ID of each space, so a reader that loads the same imports
//! in the same order sees exactly the IDs written here. Entities that came
//! from loaded modules keep the global IDs the reader gave them, and the
//! IMPORT records tell a future reader where each import's range started.
//!
//! # Layout
//!
//! ```text
//! signature
//! CONTROL         metadata, module name, imports
//! SOURCE_MANAGER  files created by this translation
//! PREPROCESSOR    macro definitions, expansions, inclusions
//! SUBMODULE       submodule tree
//! AST             ID spaces, names, DECLTYPES block, offset tables,
//!                 top-level decls, lookup table, replacements
//! ```
//!
//! Type and declaration records live in the DECLTYPES block and are only
//! reached through their offsets, which is what lets the reader load them
//! one at a time.

mod decl;
mod stmt;
mod types;

pub(crate) use decl::{REDECL_FIRST, REDECL_PREVIOUS, REDECL_SOLE};
pub(crate) use stmt::{
    DESIGNATOR_ARRAY, DESIGNATOR_FIELD, DESIGNATOR_RANGE, QUALIFIER_GLOBAL, QUALIFIER_NAMESPACE,
    QUALIFIER_TYPE, TARG_DECLARATION, TARG_EXPRESSION, TARG_INTEGRAL, TARG_NULL, TARG_NULLPTR,
    TARG_TYPE,
};

use std::hash::Hash;

use cx_ir::preprocessor::PreprocessedEntity;
use cx_ir::{
    AstContext, DeclFlags, DeclId, FileId, MacroId, Name, NodeRef, PreprocessedEntityId, QualType,
    SelectorId, SourceLocation, StmtId, SubmoduleId, TypeId,
};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::bitstream::{is_char6, Abbrev, AbbrevOp, BitstreamWriter};
use crate::codes::{self, ast, control, preprocessor, source, submodule};
use crate::ids::{to_u32, IdSpaceKind, TypeIdx, PREDEF_DECL_TRANSLATION_UNIT};
use crate::module_file::{join_names, ModuleKind};
use crate::module_manager::{ImportedEntities, ModuleManager};
use crate::{Result, SerializationError};

/// Abbreviation width of the blocks the writer opens.
const BLOCK_CODE_WIDTH: u32 = 4;
const DECLTYPES_CODE_WIDTH: u32 = 5;

#[derive(Copy, Clone, Debug)]
pub struct WriterOptions {
    /// Emit compact layouts for the most common records.
    pub use_abbreviations: bool,
    pub module_kind: ModuleKind,
}

impl Default for WriterOptions {
    fn default() -> Self {
        WriterOptions {
            use_abbreviations: true,
            module_kind: ModuleKind::Module,
        }
    }
}

/// IDs the writer hands out in one space, in the order it handed them.
#[derive(Debug)]
struct LocalIds<K> {
    base: u32,
    ids: FxHashMap<K, u32>,
    order: Vec<K>,
}

impl<K: Copy + Eq + Hash> LocalIds<K> {
    fn new(base: u32) -> Self {
        LocalIds {
            base,
            ids: FxHashMap::default(),
            order: Vec::new(),
        }
    }

    fn assign(&mut self, key: K, what: &str) {
        let id = self.base + to_u32(self.order.len(), what);
        self.ids.insert(key, id);
        self.order.push(key);
    }

    fn get(&self, key: K) -> Option<u32> {
        self.ids.get(&key).copied()
    }

    fn count(&self) -> u32 {
        to_u32(self.order.len(), "local entities")
    }
}

/// Abbreviations defined at the top of the DECLTYPES block, keyed by the
/// record code they encode.
#[derive(Debug, Default)]
struct RecordAbbrevs {
    by_code: FxHashMap<u32, Vec<(u32, Abbrev)>>,
}

impl RecordAbbrevs {
    /// First abbreviation for `code` that can encode `vals` exactly.
    fn find(&self, code: u32, vals: &[u64]) -> Option<u32> {
        self.by_code
            .get(&code)?
            .iter()
            .find(|(_, abbrev)| fits(abbrev, vals))
            .map(|&(id, _)| id)
    }
}

/// Whether `vals` (the code excluded) match a scalar-only abbreviation.
fn fits(abbrev: &Abbrev, vals: &[u64]) -> bool {
    let ops = &abbrev.ops()[1..];
    ops.len() == vals.len()
        && ops.iter().zip(vals).all(|(op, &v)| match *op {
            AbbrevOp::Literal(lit) => lit == v,
            AbbrevOp::Fixed(width) => width >= 64 || v >> width == 0,
            AbbrevOp::Vbr(_) => true,
            AbbrevOp::Char6 => u8::try_from(v).is_ok_and(is_char6),
            AbbrevOp::Array | AbbrevOp::Blob => false,
        })
}

/// Serializes one [`AstContext`] into AST file bytes.
pub struct AstWriter<'a> {
    ctx: &'a AstContext,
    manager: Option<&'a ModuleManager>,
    options: WriterOptions,
    stream: BitstreamWriter,
    abbrevs: RecordAbbrevs,
    decls: LocalIds<DeclId>,
    types: LocalIds<TypeId>,
    idents: LocalIds<Name>,
    selectors: LocalIds<SelectorId>,
    macros: LocalIds<MacroId>,
    entities: LocalIds<PreprocessedEntityId>,
    submodules: LocalIds<SubmoduleId>,
    /// Imported decls this file carries a newer record for.
    replaced: Vec<DeclId>,
    /// Function bodies waiting to be written, by body ordinal.
    pending_bodies: Vec<StmtId>,
}

impl<'a> AstWriter<'a> {
    /// Writer for `ctx`. Pass the manager the translation loaded its
    /// modules through, if any; its imports are recorded and its entities
    /// are referenced rather than written again.
    pub fn new(
        ctx: &'a AstContext,
        manager: Option<&'a ModuleManager>,
        options: WriterOptions,
    ) -> Self {
        let base =
            |space: IdSpaceKind| manager.map_or(space.num_predefined(), |m| m.next_global(space));
        let mut writer = AstWriter {
            ctx,
            manager,
            options,
            stream: BitstreamWriter::new(),
            abbrevs: RecordAbbrevs::default(),
            decls: LocalIds::new(base(IdSpaceKind::Decl)),
            types: LocalIds::new(base(IdSpaceKind::Type)),
            idents: LocalIds::new(base(IdSpaceKind::Identifier)),
            selectors: LocalIds::new(base(IdSpaceKind::Selector)),
            macros: LocalIds::new(base(IdSpaceKind::Macro)),
            entities: LocalIds::new(base(IdSpaceKind::PreprocessedEntity)),
            submodules: LocalIds::new(base(IdSpaceKind::Submodule)),
            replaced: Vec::new(),
            pending_bodies: Vec::new(),
        };
        writer.number_entities();
        writer
    }

    fn imported(&self) -> Option<&'a ImportedEntities> {
        self.manager.map(|m| &m.imported)
    }

    fn number_entities(&mut self) {
        let ctx = self.ctx;
        let imported = self.imported();
        let tu = ctx.translation_unit();

        for i in 0..ctx.num_decls() {
            let id = DeclId::new(to_u32(i, "declarations"));
            if id == tu {
                continue;
            }
            if ctx.decl(id).origin.is_some() {
                if self.needs_replacement(id) {
                    self.replaced.push(id);
                }
                continue;
            }
            self.decls.assign(id, "declarations");
        }

        for (id, _) in ctx.types.iter() {
            if id.is_builtin() || imported.is_some_and(|m| m.types.contains_key(&id)) {
                continue;
            }
            self.types.assign(id, "types");
        }

        for (name, _) in ctx.idents.iter() {
            if name.is_empty() || imported.is_some_and(|m| m.idents.contains_key(&name)) {
                continue;
            }
            self.idents.assign(name, "identifiers");
        }

        for i in 0..ctx.selectors.len() {
            let id = SelectorId::new(to_u32(i, "selectors"));
            if !imported.is_some_and(|m| m.selectors.contains_key(&id)) {
                self.selectors.assign(id, "selectors");
            }
        }

        for i in 0..ctx.preprocessing.macros().len() {
            let id = MacroId::new(to_u32(i, "macros"));
            if !imported.is_some_and(|m| m.macros.contains_key(&id)) {
                self.macros.assign(id, "macros");
            }
        }

        for i in 0..ctx.preprocessing.entities().len() {
            let id = PreprocessedEntityId::new(to_u32(i, "preprocessed entities"));
            if !imported.is_some_and(|m| m.entities.contains_key(&id)) {
                self.entities.assign(id, "preprocessed entities");
            }
        }

        for (id, _) in ctx.submodules.iter() {
            if !imported.is_some_and(|m| m.submodules.contains_key(&id)) {
                self.submodules.assign(id, "submodules");
            }
        }
    }

    /// An imported decl gets a new record when it was changed after
    /// loading or when this translation added members to it.
    fn needs_replacement(&self, id: DeclId) -> bool {
        let decl = self.ctx.decl(id);
        decl.flags.contains(DeclFlags::MODIFIED)
            || self
                .ctx
                .decls_in(id)
                .iter()
                .any(|&m| self.ctx.decl(m).origin.is_none())
    }

    /// Serialize the translation as module `name`.
    #[tracing::instrument(level = "debug", skip_all, fields(module = name))]
    pub fn write_module(mut self, name: &str) -> Result<Vec<u8>> {
        for b in codes::SIGNATURE {
            self.stream.emit(u32::from(b), 8);
        }
        self.write_control_block(name);
        self.write_source_block();
        self.write_preprocessor_block()?;
        self.write_submodule_block()?;
        self.write_ast_block()?;

        tracing::debug!(
            decls = self.decls.count(),
            types = self.types.count(),
            identifiers = self.idents.count(),
            replaced = self.replaced.len(),
            "wrote AST file"
        );
        Ok(self.stream.finish())
    }

    fn write_control_block(&mut self, name: &str) {
        let w = &mut self.stream;
        w.enter_subblock(codes::CONTROL_BLOCK_ID, BLOCK_CODE_WIDTH);
        w.emit_record(
            control::METADATA,
            &[
                u64::from(codes::VERSION_MAJOR),
                u64::from(codes::VERSION_MINOR),
                u64::from(self.options.module_kind.raw()),
            ],
        );

        let text: Vec<u64> = name.bytes().map(u64::from).collect();
        if name.bytes().all(is_char6) {
            let abbrev = w.emit_abbrev(Abbrev::new(&[
                AbbrevOp::Literal(u64::from(control::MODULE_NAME)),
                AbbrevOp::Array,
                AbbrevOp::Char6,
            ]));
            w.emit_record_with_abbrev(abbrev, control::MODULE_NAME, &text);
        } else {
            w.emit_record(control::MODULE_NAME, &text);
        }

        if let Some(manager) = self.manager.filter(|m| !m.is_empty()) {
            let mut ops = vec![AbbrevOp::Literal(u64::from(control::IMPORT)), AbbrevOp::Fixed(1)];
            ops.extend(std::iter::repeat(AbbrevOp::Vbr(6)).take(IdSpaceKind::COUNT + 1));
            ops.push(AbbrevOp::Blob);
            let abbrev = w.emit_abbrev(Abbrev::new(&ops));
            for (index, module) in manager.iter() {
                let mut vals = Vec::with_capacity(IdSpaceKind::COUNT + 2);
                vals.push(u64::from(manager.is_direct(index)));
                vals.extend(IdSpaceKind::ALL.map(|k| u64::from(module.space(k).base)));
                vals.push(u64::from(module.source_start));
                w.emit_record_with_blob(abbrev, control::IMPORT, &vals, module.name.as_bytes());
            }
        }
        w.exit_block();
    }

    fn is_imported_file(&self, file: FileId) -> bool {
        self.imported().is_some_and(|m| m.files.contains(&file))
    }

    fn write_source_block(&mut self) {
        let files: Vec<usize> = (0..self.ctx.sources.files().len())
            .filter(|&i| !self.is_imported_file(FileId::new(to_u32(i, "source files"))))
            .collect();
        let w = &mut self.stream;
        w.enter_subblock(codes::SOURCE_MANAGER_BLOCK_ID, BLOCK_CODE_WIDTH);
        let abbrev = w.emit_abbrev(Abbrev::new(&[
            AbbrevOp::Literal(u64::from(source::SOURCE_FILE)),
            AbbrevOp::Vbr(6),
            AbbrevOp::Vbr(6),
            AbbrevOp::Blob,
        ]));
        for i in files {
            let file = &self.ctx.sources.files()[i];
            w.emit_record_with_blob(
                abbrev,
                source::SOURCE_FILE,
                &[u64::from(file.base), u64::from(file.size)],
                file.name.as_bytes(),
            );
        }
        w.exit_block();
    }

    fn write_preprocessor_block(&mut self) -> Result<()> {
        let ctx = self.ctx;
        let mut records: Vec<(u32, Vec<u64>, Option<&str>)> = Vec::new();
        for &id in &self.macros.order {
            let def = ctx.preprocessing.macro_def(id);
            let mut vals = vec![
                self.ident_ref(def.name)?,
                loc(def.range.begin),
                loc(def.range.end),
                u64::from(def.is_function_like),
            ];
            for &param in &def.params {
                vals.push(self.ident_ref(param)?);
            }
            records.push((preprocessor::MACRO_DEFINITION, vals, None));
        }
        for &id in &self.entities.order {
            match ctx.preprocessing.entity(id) {
                PreprocessedEntity::MacroExpansion {
                    name,
                    definition,
                    range,
                } => {
                    let definition = match definition {
                        Some(m) => self.macro_ref(*m)?,
                        None => 0,
                    };
                    records.push((
                        preprocessor::MACRO_EXPANSION,
                        vec![self.ident_ref(*name)?, definition, loc(range.begin), loc(range.end)],
                        None,
                    ));
                }
                PreprocessedEntity::InclusionDirective {
                    file_name,
                    kind,
                    range,
                    imported_file,
                } => {
                    let file = imported_file.map_or(0, |f| u64::from(ctx.sources.file(f).base));
                    records.push((
                        preprocessor::INCLUSION_DIRECTIVE,
                        vec![u64::from(kind.raw()), loc(range.begin), loc(range.end), file],
                        Some(file_name.as_str()),
                    ));
                }
            }
        }

        let w = &mut self.stream;
        w.enter_subblock(codes::PREPROCESSOR_BLOCK_ID, BLOCK_CODE_WIDTH);
        let inclusion = w.emit_abbrev(Abbrev::new(&[
            AbbrevOp::Literal(u64::from(preprocessor::INCLUSION_DIRECTIVE)),
            AbbrevOp::Fixed(2),
            AbbrevOp::Vbr(6),
            AbbrevOp::Vbr(6),
            AbbrevOp::Vbr(6),
            AbbrevOp::Blob,
        ]));
        for (code, vals, blob) in records {
            match blob {
                Some(name) => w.emit_record_with_blob(inclusion, code, &vals, name.as_bytes()),
                None => w.emit_record(code, &vals),
            }
        }
        w.exit_block();
        Ok(())
    }

    fn write_submodule_block(&mut self) -> Result<()> {
        let ctx = self.ctx;
        let mut records = Vec::with_capacity(self.submodules.order.len());
        for &id in &self.submodules.order {
            let module = ctx.submodules.get(id);
            let parent = match module.parent {
                Some(p) => self.submodule_ref(p)?,
                None => 0,
            };
            let headers: Vec<u64> = module
                .headers
                .iter()
                .map(|&f| u64::from(ctx.sources.file(f).base))
                .collect();
            records.push((module.name.as_str(), [parent, u64::from(module.is_explicit)], headers));
        }

        let w = &mut self.stream;
        w.enter_subblock(codes::SUBMODULE_BLOCK_ID, BLOCK_CODE_WIDTH);
        let definition = w.emit_abbrev(Abbrev::new(&[
            AbbrevOp::Literal(u64::from(submodule::DEFINITION)),
            AbbrevOp::Vbr(6),
            AbbrevOp::Fixed(1),
            AbbrevOp::Blob,
        ]));
        for (name, vals, headers) in records {
            w.emit_record_with_blob(definition, submodule::DEFINITION, &vals, name.as_bytes());
            if !headers.is_empty() {
                w.emit_record(submodule::HEADERS, &headers);
            }
        }
        w.exit_block();
        Ok(())
    }

    fn write_ast_block(&mut self) -> Result<()> {
        self.stream.enter_subblock(codes::AST_BLOCK_ID, BLOCK_CODE_WIDTH);

        let spaces: Vec<u64> = [
            (self.decls.base, self.decls.count()),
            (self.types.base, self.types.count()),
            (self.idents.base, self.idents.count()),
            (self.selectors.base, self.selectors.count()),
            (self.macros.base, self.macros.count()),
            (self.entities.base, self.entities.count()),
            (self.submodules.base, self.submodules.count()),
        ]
        .into_iter()
        .flat_map(|(base, count)| [u64::from(base), u64::from(count)])
        .collect();
        self.stream.emit_record(ast::ID_SPACES, &spaces);

        let names = join_names(self.idents.order.iter().map(|&n| self.ctx.idents.as_str(n)));
        let blob_abbrev = |w: &mut BitstreamWriter, code: u32| {
            w.emit_abbrev(Abbrev::new(&[
                AbbrevOp::Literal(u64::from(code)),
                AbbrevOp::Vbr(6),
                AbbrevOp::Blob,
            ]))
        };
        let idents = blob_abbrev(&mut self.stream, ast::IDENTIFIER_TABLE);
        self.stream.emit_record_with_blob(
            idents,
            ast::IDENTIFIER_TABLE,
            &[u64::from(self.idents.count())],
            &names,
        );

        let mut selectors = Vec::new();
        for &id in &self.selectors.order {
            let sel = self.ctx.selectors.get(id);
            selectors.push(u64::from(sel.num_args));
            selectors.push(sel.pieces.len() as u64);
            for &piece in sel.pieces.iter() {
                selectors.push(self.ident_ref(piece)?);
            }
        }
        self.stream.emit_record(ast::SELECTOR_TABLE, &selectors);

        let (type_offsets, decl_offsets, body_offsets, replacements) =
            self.write_decltypes_block()?;
        self.stream.emit_record(ast::TYPE_OFFSET, &type_offsets);
        self.stream.emit_record(ast::DECL_OFFSET, &decl_offsets);
        self.stream.emit_record(ast::FUNCTION_BODY_OFFSETS, &body_offsets);

        let (tu_decls, lookup) = self.top_level_decls()?;
        self.stream.emit_record(ast::TU_DECLS, &tu_decls);
        let lookup_abbrev = blob_abbrev(&mut self.stream, ast::NAME_LOOKUP);
        let lookup_names = join_names(lookup.iter().map(|(name, _)| name.as_str()));
        self.stream.emit_record_with_blob(
            lookup_abbrev,
            ast::NAME_LOOKUP,
            &[lookup.len() as u64],
            &lookup_names,
        );
        let lookup_decls: Vec<u64> = lookup
            .iter()
            .flat_map(|(_, ids)| std::iter::once(ids.len() as u64).chain(ids.iter().copied()))
            .collect();
        self.stream.emit_record(ast::LOOKUP_DECLS, &lookup_decls);

        if !replacements.is_empty() {
            self.stream.emit_record(ast::DECL_REPLACEMENTS, &replacements);
        }
        let chain_latest = self.chain_latest()?;
        if !chain_latest.is_empty() {
            self.stream.emit_record(ast::CHAIN_LATEST, &chain_latest);
        }
        self.stream.exit_block();
        Ok(())
    }

    /// Type records, decl records with their statement groups, then
    /// function bodies. Returns the offset tables.
    #[allow(clippy::type_complexity, reason = "four parallel offset tables")]
    fn write_decltypes_block(&mut self) -> Result<(Vec<u64>, Vec<u64>, Vec<u64>, Vec<u64>)> {
        self.stream.enter_subblock(codes::DECLTYPES_BLOCK_ID, DECLTYPES_CODE_WIDTH);
        if self.options.use_abbreviations {
            self.define_record_abbrevs();
        }

        let mut type_offsets = Vec::with_capacity(self.types.order.len());
        for i in 0..self.types.order.len() {
            type_offsets.push(self.stream.current_bit());
            self.write_type(self.types.order[i])?;
        }

        let mut decl_offsets = Vec::with_capacity(self.decls.order.len());
        for i in 0..self.decls.order.len() {
            decl_offsets.push(self.stream.current_bit());
            self.write_decl(self.decls.order[i])?;
        }

        let mut replacements = Vec::with_capacity(self.replaced.len() * 2);
        for i in 0..self.replaced.len() {
            let id = self.replaced[i];
            replacements.push(self.decl_ref(id)?);
            replacements.push(self.stream.current_bit());
            self.write_decl(id)?;
        }

        let bodies = std::mem::take(&mut self.pending_bodies);
        let mut body_offsets = Vec::with_capacity(bodies.len());
        for body in bodies {
            body_offsets.push(self.stream.current_bit());
            self.write_stmt_group(NodeRef::Stmt(body))?;
        }

        self.stream.exit_block();
        Ok((type_offsets, decl_offsets, body_offsets, replacements))
    }

    fn define_record_abbrevs(&mut self) {
        for abbrev in stmt::expr_abbrevs().into_iter().chain(decl::decl_abbrevs()) {
            let code = match abbrev.ops()[0] {
                AbbrevOp::Literal(code) => code as u32,
                _ => unreachable!("record abbreviations start with their code"),
            };
            let id = self.stream.emit_abbrev(abbrev.clone());
            self.abbrevs.by_code.entry(code).or_default().push((id, abbrev));
        }
    }

    /// Emit `vals` as record `code`, abbreviated when a layout fits.
    fn emit(&mut self, code: u32, vals: &[u64]) {
        match self.abbrevs.find(code, vals) {
            Some(id) => self.stream.emit_record_with_abbrev(id, code, vals),
            None => self.stream.emit_record(code, vals),
        }
    }

    /// Local members of the translation unit and the lookup table built
    /// from their names, in declaration order.
    fn top_level_decls(&self) -> Result<(Vec<u64>, Vec<(String, Vec<u64>)>)> {
        let ctx = self.ctx;
        let mut tu_decls = Vec::new();
        let mut lookup: Vec<(String, Vec<u64>)> = Vec::new();
        let mut slots: FxHashMap<Name, usize> = FxHashMap::default();
        for &member in ctx.decls_in(ctx.translation_unit()) {
            if ctx.decl(member).origin.is_some() {
                continue;
            }
            let id = self.decl_ref(member)?;
            tu_decls.push(id);
            let name = ctx.decl(member).name();
            if name.is_empty() {
                continue;
            }
            let slot = *slots.entry(name).or_insert_with(|| {
                lookup.push((ctx.idents.as_str(name).to_owned(), Vec::new()));
                lookup.len() - 1
            });
            lookup[slot].1.push(id);
        }
        Ok((tu_decls, lookup))
    }

    /// `[first, latest]` for chains that started in an imported module
    /// and whose latest declaration belongs to this translation.
    fn chain_latest(&self) -> Result<Vec<u64>> {
        let ctx = self.ctx;
        let mut firsts: Vec<DeclId> = Vec::new();
        let mut seen = FxHashSet::default();
        for &d in &self.decls.order {
            if !ctx.decl(d).class().is_redeclarable() {
                continue;
            }
            let first = ctx.first_decl(d);
            if ctx.decl(first).origin.is_some() && seen.insert(first) {
                firsts.push(first);
            }
        }
        let mut out = Vec::with_capacity(firsts.len() * 2);
        for first in firsts {
            let latest = ctx.most_recent_decl(first);
            if ctx.decl(latest).origin.is_none() {
                out.push(self.decl_ref(first)?);
                out.push(self.decl_ref(latest)?);
            }
        }
        Ok(out)
    }

    // === ID references ===

    fn decl_ref(&self, d: DeclId) -> Result<u64> {
        if !d.is_valid() {
            return Ok(0);
        }
        if d == self.ctx.translation_unit() {
            return Ok(u64::from(PREDEF_DECL_TRANSLATION_UNIT.raw()));
        }
        if let Some(origin) = self.ctx.decl(d).origin {
            return Ok(u64::from(origin.raw()));
        }
        self.decls
            .get(d)
            .map(u64::from)
            .ok_or(SerializationError::UnmappedEntity {
                space: IdSpaceKind::Decl,
                index: d.raw(),
            })
    }

    fn opt_decl_ref(&self, d: Option<DeclId>) -> Result<u64> {
        d.map_or(Ok(0), |d| self.decl_ref(d))
    }

    fn type_ref(&self, qt: QualType) -> Result<u64> {
        if qt.is_null() {
            return Ok(u64::from(TypeIdx::NULL.raw()));
        }
        if qt.ty.is_builtin() {
            return Ok(u64::from(TypeIdx::builtin(qt.ty, qt.quals).raw()));
        }
        let index = self
            .imported()
            .and_then(|m| m.types.get(&qt.ty).copied())
            .or_else(|| self.types.get(qt.ty))
            .ok_or(SerializationError::UnmappedEntity {
                space: IdSpaceKind::Type,
                index: qt.ty.raw(),
            })?;
        Ok(u64::from(TypeIdx::new(index, qt.quals).raw()))
    }

    fn ident_ref(&self, name: Name) -> Result<u64> {
        if name.is_empty() {
            return Ok(0);
        }
        self.imported()
            .and_then(|m| m.idents.get(&name).copied())
            .or_else(|| self.idents.get(name))
            .map(u64::from)
            .ok_or(SerializationError::UnmappedEntity {
                space: IdSpaceKind::Identifier,
                index: name.raw(),
            })
    }

    fn selector_ref(&self, id: SelectorId) -> Result<u64> {
        self.imported()
            .and_then(|m| m.selectors.get(&id).copied())
            .or_else(|| self.selectors.get(id))
            .map(u64::from)
            .ok_or(SerializationError::UnmappedEntity {
                space: IdSpaceKind::Selector,
                index: id.raw(),
            })
    }

    fn macro_ref(&self, id: MacroId) -> Result<u64> {
        self.imported()
            .and_then(|m| m.macros.get(&id).copied())
            .or_else(|| self.macros.get(id))
            .map(u64::from)
            .ok_or(SerializationError::UnmappedEntity {
                space: IdSpaceKind::Macro,
                index: id.raw(),
            })
    }

    fn submodule_ref(&self, id: SubmoduleId) -> Result<u64> {
        self.imported()
            .and_then(|m| m.submodules.get(&id).copied())
            .or_else(|| self.submodules.get(id))
            .map(u64::from)
            .ok_or(SerializationError::UnmappedEntity {
                space: IdSpaceKind::Submodule,
                index: id.raw(),
            })
    }
}

#[inline]
fn loc(l: SourceLocation) -> u64 {
    u64::from(l.raw())
}

/// `value + 1`, or 0 for `None`.
#[inline]
fn opt_u32(v: Option<u32>) -> u64 {
    v.map_or(0, |v| u64::from(v) + 1)
}
