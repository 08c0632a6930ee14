//! The translation-unit arena.
//!
//! [`AstContext`] owns every node of one translation: expressions,
//! statements, declarations, the trailing pools, types and the name
//! tables. Nodes are appended once and never freed; passes refer to them
//! by index.
//!
//! Construction lives in submodules: [`exprs`] has the expression
//! factories, [`decls`] the declaration factories and redeclaration
//! chain operations, [`layout`] the size and record layout queries.

mod decls;
mod exprs;
mod layout;

pub use decls::Redecls;
pub use exprs::NameRefParts;
pub use layout::RecordLayout;

use crate::decl::{Decl, DeclData, DeclFlags, RecordDefinitionData, Redeclarable, TemplateCommon};
use crate::expr::{CallData, Expr, ExprKind};
use crate::ident::{IdentifierTable, SelectorTable};
use crate::ids::to_u32;
use crate::node_class::{DeclClass, StmtClass};
use crate::preprocessor::PreprocessingRecord;
use crate::source::{SourceLocation, SourceManager, SourceRange};
use crate::stmt::{Stmt, StmtKind};
use crate::submodule::SubmoduleTable;
use crate::target::{LangOptions, TargetInfo};
use crate::trailing::{
    BaseSpecifier, Designator, NestedNameSpecifier, TemplateArgumentLoc, TrailingStorage,
};
use crate::types::TypePool;
use crate::{
    DeclId, DefinitionDataId, ExprId, QualType, StmtId, TemplateCommonId,
};

/// Owner of every node in one translation.
#[derive(Clone, Debug)]
pub struct AstContext {
    pub lang: LangOptions,
    pub target: TargetInfo,
    pub types: TypePool,
    pub idents: IdentifierTable,
    pub selectors: SelectorTable,
    pub sources: SourceManager,
    pub preprocessing: PreprocessingRecord,
    pub submodules: SubmoduleTable,
    pub trailing: TrailingStorage,
    exprs: Vec<Expr>,
    stmts: Vec<Stmt>,
    decls: Vec<Decl>,
    definition_data: Vec<RecordDefinitionData>,
    template_commons: Vec<TemplateCommon>,
    translation_unit: DeclId,
}

impl Default for AstContext {
    fn default() -> Self {
        Self::new(LangOptions::default(), TargetInfo::default())
    }
}

impl AstContext {
    pub fn new(lang: LangOptions, target: TargetInfo) -> Self {
        let mut ctx = AstContext {
            lang,
            target,
            types: TypePool::new(),
            idents: IdentifierTable::new(),
            selectors: SelectorTable::new(),
            sources: SourceManager::new(),
            preprocessing: PreprocessingRecord::default(),
            submodules: SubmoduleTable::default(),
            trailing: TrailingStorage::new(),
            exprs: Vec::with_capacity(256),
            stmts: Vec::with_capacity(64),
            decls: Vec::with_capacity(64),
            definition_data: Vec::new(),
            template_commons: Vec::new(),
            translation_unit: DeclId::INVALID,
        };
        ctx.translation_unit = ctx.alloc_decl(Decl::new(
            DeclData::TranslationUnit(Default::default()),
            DeclId::INVALID,
            SourceLocation::INVALID,
        ));
        ctx
    }

    #[inline]
    pub fn translation_unit(&self) -> DeclId {
        self.translation_unit
    }

    // === Expressions ===

    #[inline]
    pub fn expr(&self, id: ExprId) -> &Expr {
        &self.exprs[id.index()]
    }

    /// Mutable access for this crate's builders. Other crates change an
    /// expression only through setters such as [`AstContext::set_expr_type`],
    /// which cannot change its kind and so its trailing storage.
    #[inline]
    pub(crate) fn expr_mut(&mut self, id: ExprId) -> &mut Expr {
        &mut self.exprs[id.index()]
    }

    #[inline]
    pub fn num_exprs(&self) -> usize {
        self.exprs.len()
    }

    /// Change an expression's type, stripping references.
    pub fn set_expr_type(&mut self, id: ExprId, ty: QualType) {
        let ty = self.types.non_reference_type(ty);
        self.exprs[id.index()].ty = ty;
    }

    /// Re-insert an expression whose header was stored elsewhere (an AST
    /// file). The stored header is trusted but its invariants are
    /// checked.
    ///
    /// # Panics
    /// Panics if the type is a reference or the dependence bits are
    /// inconsistent.
    pub fn restore_expr(&mut self, expr: Expr) -> ExprId {
        assert!(
            expr.ty.is_null() || !self.types.is_reference_type(expr.ty),
            "expression type must not be a reference type"
        );
        assert!(
            expr.dependence.is_consistent(),
            "dependent expression is missing instantiation dependence"
        );
        self.push_expr(expr)
    }

    fn push_expr(&mut self, expr: Expr) -> ExprId {
        let id = ExprId::new(to_u32(self.exprs.len(), "expressions"));
        self.exprs.push(expr);
        id
    }

    // === Statements ===

    pub fn alloc_stmt(&mut self, kind: StmtKind, loc: SourceLocation) -> StmtId {
        let id = StmtId::new(to_u32(self.stmts.len(), "statements"));
        self.stmts.push(Stmt::new(kind, loc));
        id
    }

    /// `{ body... }`.
    pub fn create_compound(
        &mut self,
        body: &[StmtId],
        lbrace: SourceLocation,
        rbrace: SourceLocation,
    ) -> StmtId {
        let body = self.trailing.alloc_stmts(body);
        self.alloc_stmt(StmtKind::Compound { body, rbrace }, lbrace)
    }

    #[inline]
    pub fn stmt(&self, id: StmtId) -> &Stmt {
        &self.stmts[id.index()]
    }

    #[inline]
    pub fn stmt_mut(&mut self, id: StmtId) -> &mut Stmt {
        &mut self.stmts[id.index()]
    }

    #[inline]
    pub fn num_stmts(&self) -> usize {
        self.stmts.len()
    }

    /// Statements of a compound statement.
    ///
    /// # Panics
    /// Panics if `id` is not a `CompoundStmt`.
    pub fn compound_body(&self, id: StmtId) -> &[StmtId] {
        match &self.stmt(id).kind {
            StmtKind::Compound { body, .. } => self.trailing.stmts(*body),
            other => panic!("compound_body on {}", other.class()),
        }
    }

    // === Declarations ===

    /// Append a declaration. Redeclarable kinds start as the sole member
    /// of their own chain.
    pub fn alloc_decl(&mut self, mut decl: Decl) -> DeclId {
        let id = DeclId::new(to_u32(self.decls.len(), "declarations"));
        if decl.redecl.is_none() && decl.class().is_redeclarable() {
            decl.redecl = Some(Redeclarable::first_of_chain(id));
        }
        self.decls.push(decl);
        id
    }

    #[inline]
    pub fn decl(&self, id: DeclId) -> &Decl {
        &self.decls[id.index()]
    }

    #[inline]
    pub fn decl_mut(&mut self, id: DeclId) -> &mut Decl {
        &mut self.decls[id.index()]
    }

    #[inline]
    pub fn num_decls(&self) -> usize {
        self.decls.len()
    }

    /// Register `member` as lexically nested in `dc`.
    ///
    /// # Panics
    /// Panics if `dc` is not a declaration context.
    pub fn add_decl(&mut self, dc: DeclId, member: DeclId) {
        let class = self.decl(dc).class();
        match self.decls[dc.index()].data.context_mut() {
            Some(ctx) => ctx.decls.push(member),
            None => panic!("{class} is not a declaration context"),
        }
    }

    /// Take `member` out of `dc`'s lexical members.
    pub fn remove_decl(&mut self, dc: DeclId, member: DeclId) {
        if let Some(ctx) = self.decls[dc.index()].data.context_mut() {
            ctx.decls.retain(|&d| d != member);
        }
    }

    /// Lexical members of a declaration context, in declaration order.
    pub fn decls_in(&self, dc: DeclId) -> &[DeclId] {
        self.decl(dc)
            .data
            .context()
            .map_or(&[], |c| c.decls.as_slice())
    }

    /// Flag an imported declaration as changed so the next AST file
    /// written replaces it.
    pub fn mark_decl_modified(&mut self, id: DeclId) {
        let decl = &mut self.decls[id.index()];
        if decl.flags.contains(DeclFlags::FROM_AST_FILE) {
            decl.flags |= DeclFlags::MODIFIED;
        }
    }

    /// Name of a declaration as a string.
    pub fn decl_name(&self, id: DeclId) -> &str {
        self.idents.as_str(self.decl(id).name())
    }

    // === Shared chain state ===

    pub fn alloc_definition_data(&mut self, data: RecordDefinitionData) -> DefinitionDataId {
        let id = DefinitionDataId::new(to_u32(self.definition_data.len(), "definition data"));
        self.definition_data.push(data);
        id
    }

    #[inline]
    pub fn definition_data(&self, id: DefinitionDataId) -> &RecordDefinitionData {
        &self.definition_data[id.index()]
    }

    #[inline]
    pub fn definition_data_mut(&mut self, id: DefinitionDataId) -> &mut RecordDefinitionData {
        &mut self.definition_data[id.index()]
    }

    pub fn alloc_template_common(&mut self, common: TemplateCommon) -> TemplateCommonId {
        let id = TemplateCommonId::new(to_u32(self.template_commons.len(), "template commons"));
        self.template_commons.push(common);
        id
    }

    #[inline]
    pub fn template_common(&self, id: TemplateCommonId) -> &TemplateCommon {
        &self.template_commons[id.index()]
    }

    #[inline]
    pub fn template_common_mut(&mut self, id: TemplateCommonId) -> &mut TemplateCommon {
        &mut self.template_commons[id.index()]
    }

    // === Trailing accessors ===

    fn call_data(&self, id: ExprId) -> &CallData {
        let expr = self.expr(id);
        match expr.as_call() {
            Some(c) => c,
            None => panic!("expected a call expression, found {}", expr.class()),
        }
    }

    pub fn callee(&self, id: ExprId) -> ExprId {
        self.call_data(id).callee
    }

    pub fn call_args(&self, id: ExprId) -> &[ExprId] {
        self.trailing.exprs(self.call_data(id).args)
    }

    pub fn num_args(&self, id: ExprId) -> usize {
        self.call_data(id).args.len()
    }

    /// Argument `i` of a call.
    ///
    /// # Panics
    /// Panics if `i` is not below the argument count.
    pub fn call_arg(&self, id: ExprId, i: usize) -> ExprId {
        let args = self.call_args(id);
        assert!(i < args.len(), "argument index {i} out of range ({} arguments)", args.len());
        args[i]
    }

    pub fn inits(&self, id: ExprId) -> &[ExprId] {
        match &self.expr(id).kind {
            ExprKind::InitList { inits, .. } => self.trailing.exprs(*inits),
            other => panic!("inits on {}", other.class()),
        }
    }

    /// Initializer `i` of an initializer list.
    ///
    /// # Panics
    /// Panics if `i` is out of range.
    pub fn init(&self, id: ExprId, i: usize) -> ExprId {
        let inits = self.inits(id);
        assert!(i < inits.len(), "initializer index {i} out of range ({} inits)", inits.len());
        inits[i]
    }

    pub fn designators(&self, id: ExprId) -> &[Designator] {
        match &self.expr(id).kind {
            ExprKind::DesignatedInit { designators, .. } => self.trailing.designators(*designators),
            other => panic!("designators on {}", other.class()),
        }
    }

    /// Initializer of a designated initializer.
    pub fn designated_init_value(&self, id: ExprId) -> ExprId {
        self.subexprs(id)[0]
    }

    /// Operand list of nodes that keep their operands in one trailing
    /// range (atomic builtins, vector shuffles, designated initializers).
    pub fn subexprs(&self, id: ExprId) -> &[ExprId] {
        match &self.expr(id).kind {
            ExprKind::Atomic { subexprs, .. }
            | ExprKind::ShuffleVector { subexprs, .. }
            | ExprKind::DesignatedInit { subexprs, .. } => self.trailing.exprs(*subexprs),
            ExprKind::Construct { args, .. } => self.trailing.exprs(*args),
            other => panic!("subexprs on {}", other.class()),
        }
    }

    pub fn assoc_exprs(&self, id: ExprId) -> &[ExprId] {
        match &self.expr(id).kind {
            ExprKind::GenericSelection { assoc_exprs, .. } => self.trailing.exprs(*assoc_exprs),
            other => panic!("assoc_exprs on {}", other.class()),
        }
    }

    pub fn assoc_types(&self, id: ExprId) -> &[QualType] {
        match &self.expr(id).kind {
            ExprKind::GenericSelection { assoc_types, .. } => self.trailing.types(*assoc_types),
            other => panic!("assoc_types on {}", other.class()),
        }
    }

    /// Chosen association of a non-dependent generic selection.
    pub fn generic_result(&self, id: ExprId) -> Option<ExprId> {
        match &self.expr(id).kind {
            ExprKind::GenericSelection {
                assoc_exprs,
                result_index,
                ..
            } => result_index.map(|i| self.trailing.exprs(*assoc_exprs)[i as usize]),
            _ => None,
        }
    }

    /// Explicit template arguments of a name reference.
    pub fn template_args(&self, id: ExprId) -> &[TemplateArgumentLoc] {
        match self.expr(id).kind.trailing_layout() {
            Some(layout) => self.trailing.template_args_of(layout),
            None => &[],
        }
    }

    pub fn qualifier(&self, id: ExprId) -> Option<(NestedNameSpecifier, SourceRange)> {
        self.trailing.qualifier(self.expr(id).kind.trailing_layout()?)
    }

    pub fn found_decl(&self, id: ExprId) -> Option<DeclId> {
        self.trailing.found_decl(self.expr(id).kind.trailing_layout()?)
    }

    /// Base path of a derived-to-base or base-to-derived cast.
    pub fn base_path(&self, id: ExprId) -> &[BaseSpecifier] {
        match self.expr(id).as_cast() {
            Some(c) => self.trailing.base_path(c.path),
            None => &[],
        }
    }

    /// Whether `id` has the given class, for quick checks in tests and
    /// passes.
    pub fn is_expr_class(&self, id: ExprId, class: StmtClass) -> bool {
        self.expr(id).class() == class
    }

    pub fn is_decl_class(&self, id: DeclId, class: DeclClass) -> bool {
        self.decl(id).class() == class
    }
}

#[cfg(test)]
mod tests;
