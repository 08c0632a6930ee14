//! Statement groups.
//!
//! Records arrive in post order, so each node finds its children on top
//! of a stack, last child first. Null records push an empty slot and
//! back-references push a node built earlier in the same group.

use cx_ir::expr::{
    AtomicOp, BinaryOp, CallData, CastData, CastKind, CharacterKind, DeclRefData, ExplicitCastStyle,
    MemberData, OverloadedOperator, PredefinedIdent, TraitArg, UnaryOp, UnaryTrait,
};
use cx_ir::stmt::StmtKind;
use cx_ir::trailing::{
    Designator, ExplicitTemplateArgs, NestedNameSpecifier, TemplateArgument, TemplateArgumentLoc,
    TrailingLayout, TrailingSections,
};
use cx_ir::{
    BasePathRange, DeclData, Expr, ExprDependence, ExprId, ExprKind, ExprObjectKind, ExprValueKind,
    NodeRef, StmtClass, StmtId,
};

use super::AstReader;
use crate::bitstream::{Record, RecordFields};
use crate::codes;
use crate::module_manager::ModuleIndex;
use crate::writer::{
    DESIGNATOR_ARRAY, DESIGNATOR_FIELD, DESIGNATOR_RANGE, QUALIFIER_GLOBAL, QUALIFIER_NAMESPACE,
    QUALIFIER_TYPE, TARG_DECLARATION, TARG_EXPRESSION, TARG_INTEGRAL, TARG_NULL, TARG_NULLPTR,
    TARG_TYPE,
};
use crate::{Result, SerializationError};

/// Children of the node being built, popped in reverse order.
struct Operands<'s> {
    stack: &'s mut Vec<Option<NodeRef>>,
    code: u32,
}

impl Operands<'_> {
    fn pop(&mut self) -> Result<Option<NodeRef>> {
        self.stack
            .pop()
            .ok_or(SerializationError::StmtStackUnderflow { code: self.code })
    }

    fn opt_expr(&mut self) -> Result<Option<ExprId>> {
        match self.pop()? {
            None => Ok(None),
            Some(NodeRef::Expr(e)) => Ok(Some(e)),
            Some(NodeRef::Stmt(_)) => Err(self.mismatch("an expression")),
        }
    }

    fn expr(&mut self) -> Result<ExprId> {
        self.opt_expr()?.ok_or_else(|| self.mismatch("an expression"))
    }

    fn opt_stmt(&mut self) -> Result<Option<StmtId>> {
        match self.pop()? {
            None => Ok(None),
            Some(NodeRef::Stmt(s)) => Ok(Some(s)),
            Some(NodeRef::Expr(_)) => Err(self.mismatch("a statement")),
        }
    }

    fn stmt(&mut self) -> Result<StmtId> {
        self.opt_stmt()?.ok_or_else(|| self.mismatch("a statement"))
    }

    fn exprs(&mut self, n: usize) -> Result<Vec<ExprId>> {
        let mut out = (0..n).map(|_| self.expr()).collect::<Result<Vec<_>>>()?;
        out.reverse();
        Ok(out)
    }

    fn stmts(&mut self, n: usize) -> Result<Vec<StmtId>> {
        let mut out = (0..n).map(|_| self.stmt()).collect::<Result<Vec<_>>>()?;
        out.reverse();
        Ok(out)
    }

    fn mismatch(&self, expected: &str) -> SerializationError {
        SerializationError::malformed(format!("record {} expected {expected} operand", self.code))
    }
}

impl AstReader<'_> {
    /// Rebuild a statement group whose root is a statement.
    pub(super) fn build_stmt(&mut self, m: ModuleIndex, records: Vec<Record>) -> Result<StmtId> {
        match self.build_group(m, records)? {
            NodeRef::Stmt(s) => Ok(s),
            NodeRef::Expr(_) => Err(SerializationError::malformed(
                "statement group has an expression at its root",
            )),
        }
    }

    /// Rebuild a statement group whose root is an expression.
    pub(super) fn build_expr(&mut self, m: ModuleIndex, records: Vec<Record>) -> Result<ExprId> {
        match self.build_group(m, records)? {
            NodeRef::Expr(e) => Ok(e),
            NodeRef::Stmt(_) => Err(SerializationError::malformed(
                "expression group has a statement at its root",
            )),
        }
    }

    fn build_group(&mut self, m: ModuleIndex, records: Vec<Record>) -> Result<NodeRef> {
        let mut stack: Vec<Option<NodeRef>> = Vec::new();
        let mut nodes: Vec<NodeRef> = Vec::new();

        for record in records {
            match record.code {
                codes::STMT_NULL_PTR => stack.push(None),
                codes::STMT_REF_PTR => {
                    let mut f = record.fields();
                    let index = f.next_usize()?;
                    let node = nodes.get(index).copied().ok_or_else(|| {
                        SerializationError::malformed(format!(
                            "back-reference to unwritten node {index}"
                        ))
                    })?;
                    stack.push(Some(node));
                }
                code => {
                    let class = codes::stmt_class_for_code(code)
                        .ok_or(SerializationError::UnknownStmtCode { code })?;
                    let mut ops = Operands { stack: &mut stack, code };
                    let node = if class.is_expr() {
                        NodeRef::Expr(self.read_expr(m, class, &record, &mut ops)?)
                    } else {
                        NodeRef::Stmt(self.read_stmt(m, class, &record, &mut ops)?)
                    };
                    nodes.push(node);
                    stack.push(Some(node));
                }
            }
        }

        match stack.as_slice() {
            [Some(root)] => {
                tracing::trace!(nodes = nodes.len(), module = %m, "rebuilt statement group");
                Ok(*root)
            }
            [] => Err(SerializationError::malformed("empty statement group")),
            _ => Err(SerializationError::malformed(format!(
                "statement group leaves {} nodes on the stack",
                stack.len()
            ))),
        }
    }

    fn read_expr(
        &mut self,
        m: ModuleIndex,
        class: StmtClass,
        record: &Record,
        ops: &mut Operands<'_>,
    ) -> Result<ExprId> {
        let mut f = record.fields();
        let f = &mut f;
        let ty = self.read_type_ref(m, f)?;
        let loc = self.read_loc(m, f)?;
        let value_kind = f.next_enum("value kind", ExprValueKind::from_raw)?;
        let object_kind = f.next_enum("object kind", ExprObjectKind::from_raw)?;
        let dependence = f.next_enum("expression dependence", |v| {
            u8::try_from(v).ok().and_then(ExprDependence::from_bits)
        })?;

        let kind = match class {
            StmtClass::IntegerLiteral => ExprKind::IntegerLiteral { value: f.next_u64()? },
            StmtClass::CharacterLiteral => ExprKind::CharacterLiteral {
                value: f.next_u32()?,
                kind: f.next_enum("character kind", CharacterKind::from_raw)?,
            },
            StmtClass::FloatingLiteral => ExprKind::FloatingLiteral {
                value: f64::from_bits(f.next_u64()?),
                exact: f.next_bool()?,
            },
            StmtClass::StringLiteral => {
                let kind = f.next_enum("character kind", CharacterKind::from_raw)?;
                let len = f.next_usize()?;
                let bytes = (0..len)
                    .map(|_| f.next_enum("string byte", |v| u8::try_from(v).ok()))
                    .collect::<Result<Vec<u8>>>()?;
                ExprKind::StringLiteral {
                    bytes: bytes.into_boxed_slice(),
                    kind,
                }
            }
            StmtClass::CXXBoolLiteral => ExprKind::BoolLiteral { value: f.next_bool()? },
            StmtClass::CXXNullPtrLiteral => ExprKind::NullPtrLiteral,
            StmtClass::ImplicitValueInitExpr => ExprKind::ImplicitValueInit,
            StmtClass::PredefinedExpr => ExprKind::Predefined {
                ident: f.next_enum("predefined identifier", PredefinedIdent::from_raw)?,
            },
            StmtClass::DeclRefExpr => {
                let decl = self.read_decl_ref(m, f)?;
                let refers_to_enclosing_local = f.next_bool()?;
                let had_multiple_candidates = f.next_bool()?;
                ExprKind::DeclRef(DeclRefData {
                    decl,
                    trailing: self.read_name_sections(m, f, ops)?,
                    refers_to_enclosing_local,
                    had_multiple_candidates,
                })
            }
            StmtClass::CXXThisExpr => ExprKind::This { implicit: f.next_bool()? },
            StmtClass::ObjCSelectorExpr => ExprKind::ObjCSelector {
                selector: self.read_selector(m, f)?,
            },
            StmtClass::ParenExpr => ExprKind::Paren {
                rparen: self.read_loc(m, f)?,
                sub: ops.expr()?,
            },
            StmtClass::UnaryOperator => ExprKind::Unary {
                op: f.next_enum("unary operator", UnaryOp::from_raw)?,
                sub: ops.expr()?,
            },
            StmtClass::BinaryOperator => {
                let rhs = ops.expr()?;
                ExprKind::Binary {
                    op: f.next_enum("binary operator", BinaryOp::from_raw)?,
                    lhs: ops.expr()?,
                    rhs,
                }
            }
            StmtClass::CompoundAssignOperator => {
                let rhs = ops.expr()?;
                ExprKind::CompoundAssign {
                    op: f.next_enum("binary operator", BinaryOp::from_raw)?,
                    lhs: ops.expr()?,
                    rhs,
                    computation_lhs: self.read_type_ref(m, f)?,
                    computation_result: self.read_type_ref(m, f)?,
                }
            }
            StmtClass::ConditionalOperator => {
                let rhs = ops.expr()?;
                let lhs = ops.expr()?;
                ExprKind::Conditional {
                    cond: ops.expr()?,
                    lhs,
                    rhs,
                }
            }
            StmtClass::ArraySubscriptExpr => {
                let rhs = ops.expr()?;
                ExprKind::ArraySubscript {
                    lhs: ops.expr()?,
                    rhs,
                    rbracket: self.read_loc(m, f)?,
                }
            }
            StmtClass::UnaryExprOrTypeTraitExpr => {
                let kind = f.next_enum("type trait", UnaryTrait::from_raw)?;
                let arg = if f.next_bool()? {
                    TraitArg::Expr(ops.expr()?)
                } else {
                    TraitArg::Type(self.read_type_ref(m, f)?)
                };
                ExprKind::UnaryExprOrTypeTrait { kind, arg }
            }
            StmtClass::ImplicitCastExpr => {
                let kind = f.next_enum("cast kind", CastKind::from_raw)?;
                let path = self.read_base_path(m, f)?;
                ExprKind::ImplicitCast(CastData {
                    kind,
                    sub: ops.expr()?,
                    path,
                })
            }
            StmtClass::CStyleCastExpr
            | StmtClass::CXXFunctionalCastExpr
            | StmtClass::CXXStaticCastExpr
            | StmtClass::CXXReinterpretCastExpr
            | StmtClass::CXXConstCastExpr => {
                let style = match class {
                    StmtClass::CStyleCastExpr => ExplicitCastStyle::CStyle,
                    StmtClass::CXXFunctionalCastExpr => ExplicitCastStyle::Functional,
                    StmtClass::CXXStaticCastExpr => ExplicitCastStyle::Static,
                    StmtClass::CXXReinterpretCastExpr => ExplicitCastStyle::Reinterpret,
                    _ => ExplicitCastStyle::Const,
                };
                let kind = f.next_enum("cast kind", CastKind::from_raw)?;
                let written = self.read_type_ref(m, f)?;
                let path = self.read_base_path(m, f)?;
                ExprKind::ExplicitCast {
                    style,
                    cast: CastData {
                        kind,
                        sub: ops.expr()?,
                        path,
                    },
                    written,
                }
            }
            StmtClass::CallExpr | StmtClass::CXXMemberCallExpr | StmtClass::CXXOperatorCallExpr => {
                let nargs = f.next_usize()?;
                let rparen = self.read_loc(m, f)?;
                let args = ops.exprs(nargs)?;
                let call = CallData {
                    callee: ops.expr()?,
                    args: self.ctx.trailing.alloc_exprs(&args),
                    rparen,
                };
                match class {
                    StmtClass::CallExpr => ExprKind::Call(call),
                    StmtClass::CXXMemberCallExpr => ExprKind::MemberCall(call),
                    _ => ExprKind::OperatorCall {
                        op: f.next_enum("overloaded operator", OverloadedOperator::from_raw)?,
                        call,
                    },
                }
            }
            StmtClass::MemberExpr => {
                let member = self.read_decl_ref(m, f)?;
                let is_arrow = f.next_bool()?;
                // Template argument expressions sit above the base.
                let trailing = self.read_name_sections(m, f, ops)?;
                ExprKind::Member(MemberData {
                    base: ops.expr()?,
                    member,
                    is_arrow,
                    trailing,
                })
            }
            StmtClass::InitListExpr => {
                let n = f.next_usize()?;
                let union_field = self.read_opt_decl_ref(m, f)?;
                let lbrace = self.read_loc(m, f)?;
                let rbrace = self.read_loc(m, f)?;
                let filler = ops.opt_expr()?;
                let inits = ops.exprs(n)?;
                ExprKind::InitList {
                    inits: self.ctx.trailing.alloc_exprs(&inits),
                    filler,
                    union_field,
                    lbrace,
                    rbrace,
                }
            }
            StmtClass::DesignatedInitExpr => {
                let n = f.next_usize()?;
                let eq_loc = self.read_loc(m, f)?;
                let gnu_syntax = f.next_bool()?;
                let ndesig = f.next_count()?;
                let mut designators = Vec::with_capacity(ndesig);
                for _ in 0..ndesig {
                    designators.push(self.read_designator(m, f)?);
                }
                let subexprs = ops.exprs(n)?;
                ExprKind::DesignatedInit {
                    designators: self.ctx.trailing.alloc_designators(&designators),
                    subexprs: self.ctx.trailing.alloc_exprs(&subexprs),
                    eq_loc,
                    gnu_syntax,
                }
            }
            StmtClass::CompoundLiteralExpr => ExprKind::CompoundLiteral {
                init: ops.expr()?,
                written: self.read_type_ref(m, f)?,
                file_scope: f.next_bool()?,
            },
            StmtClass::GenericSelectionExpr => {
                let n = f.next_count()?;
                let result_index = next_opt_u32(f)?;
                let mut assoc_types = Vec::with_capacity(n);
                for _ in 0..n {
                    assoc_types.push(self.read_type_ref(m, f)?);
                }
                let assoc_exprs = ops.exprs(n)?;
                ExprKind::GenericSelection {
                    controlling: ops.expr()?,
                    assoc_types: self.ctx.trailing.alloc_types(&assoc_types),
                    assoc_exprs: self.ctx.trailing.alloc_exprs(&assoc_exprs),
                    result_index,
                }
            }
            StmtClass::AtomicExpr => {
                let op = f.next_enum("atomic operation", AtomicOp::from_raw)?;
                let n = f.next_usize()?;
                let rparen = self.read_loc(m, f)?;
                let subexprs = ops.exprs(n)?;
                ExprKind::Atomic {
                    op,
                    subexprs: self.ctx.trailing.alloc_exprs(&subexprs),
                    rparen,
                }
            }
            StmtClass::ShuffleVectorExpr => {
                let n = f.next_usize()?;
                let rparen = self.read_loc(m, f)?;
                let subexprs = ops.exprs(n)?;
                ExprKind::ShuffleVector {
                    subexprs: self.ctx.trailing.alloc_exprs(&subexprs),
                    rparen,
                }
            }
            StmtClass::ConvertVectorExpr => ExprKind::ConvertVector {
                src: ops.expr()?,
                written: self.read_type_ref(m, f)?,
            },
            StmtClass::ExtVectorElementExpr => ExprKind::ExtVectorElement {
                base: ops.expr()?,
                accessor: self.read_ident(m, f)?,
            },
            StmtClass::ChooseExpr => {
                let rhs = ops.expr()?;
                let lhs = ops.expr()?;
                ExprKind::Choose {
                    cond: ops.expr()?,
                    lhs,
                    rhs,
                    cond_true: f.next_bool()?,
                }
            }
            StmtClass::VAArgExpr => ExprKind::VAArg {
                sub: ops.expr()?,
                written: self.read_type_ref(m, f)?,
            },
            StmtClass::StmtExpr => ExprKind::StmtExpr { body: ops.stmt()? },
            StmtClass::AddrLabelExpr => ExprKind::AddrLabel {
                label: self.read_decl_ref(m, f)?,
            },
            StmtClass::CXXConstructExpr => {
                let ctor = self.read_decl_ref(m, f)?;
                let n = f.next_usize()?;
                let args = ops.exprs(n)?;
                ExprKind::Construct {
                    ctor,
                    args: self.ctx.trailing.alloc_exprs(&args),
                    elidable: f.next_bool()?,
                    zero_init: f.next_bool()?,
                }
            }
            StmtClass::CXXDefaultArgExpr => ExprKind::DefaultArg {
                param: self.read_decl_ref(m, f)?,
            },
            StmtClass::MaterializeTemporaryExpr => ExprKind::MaterializeTemporary {
                sub: ops.expr()?,
                extended_by: self.read_opt_decl_ref(m, f)?,
            },
            StmtClass::OpaqueValueExpr => ExprKind::OpaqueValue {
                source: ops.opt_expr()?,
            },
            StmtClass::PackExpansionExpr => ExprKind::PackExpansion {
                pattern: ops.expr()?,
                num_expansions: next_opt_u32(f)?,
            },
            StmtClass::SizeOfPackExpr => ExprKind::SizeOfPack {
                pack: self.read_decl_ref(m, f)?,
                length: next_opt_u32(f)?,
            },
            _ => {
                return Err(SerializationError::malformed(format!(
                    "{class} is not an expression"
                )))
            }
        };
        self.finish_record(f)?;

        if !dependence.is_consistent() {
            return Err(SerializationError::malformed(format!(
                "{class} is type or value dependent without instantiation dependence"
            )));
        }
        if !ty.is_null() && self.ctx.types.is_reference_type(ty) {
            return Err(SerializationError::malformed(format!("{class} has a reference type")));
        }
        Ok(self
            .ctx
            .restore_expr(Expr::from_parts(kind, ty, loc, value_kind, object_kind, dependence)))
    }

    fn read_stmt(
        &mut self,
        m: ModuleIndex,
        class: StmtClass,
        record: &Record,
        ops: &mut Operands<'_>,
    ) -> Result<StmtId> {
        let mut f = record.fields();
        let f = &mut f;
        let loc = self.read_loc(m, f)?;
        let mut label = None;

        let kind = match class {
            StmtClass::NullStmt => StmtKind::Null,
            StmtClass::ContinueStmt => StmtKind::Continue,
            StmtClass::BreakStmt => StmtKind::Break,
            StmtClass::CompoundStmt => {
                let n = f.next_usize()?;
                let rbrace = self.read_loc(m, f)?;
                let body = ops.stmts(n)?;
                StmtKind::Compound {
                    body: self.ctx.trailing.alloc_stmts(&body),
                    rbrace,
                }
            }
            StmtClass::DeclStmt => {
                let n = f.next_count()?;
                let mut decls = Vec::with_capacity(n);
                for _ in 0..n {
                    decls.push(self.read_decl_ref(m, f)?);
                }
                StmtKind::Decl { decls }
            }
            StmtClass::ExprStmt => StmtKind::Expr(ops.expr()?),
            StmtClass::LabelStmt => {
                let decl = self.read_decl_ref(m, f)?;
                label = Some(decl);
                StmtKind::Label { decl, sub: ops.stmt()? }
            }
            StmtClass::IfStmt => {
                let else_ = ops.opt_stmt()?;
                let then = ops.stmt()?;
                StmtKind::If {
                    cond: ops.expr()?,
                    then,
                    else_,
                    cond_var: self.read_opt_decl_ref(m, f)?,
                }
            }
            StmtClass::SwitchStmt | StmtClass::WhileStmt => {
                let body = ops.stmt()?;
                let cond = ops.expr()?;
                let cond_var = self.read_opt_decl_ref(m, f)?;
                if class == StmtClass::SwitchStmt {
                    StmtKind::Switch { cond_var, cond, body }
                } else {
                    StmtKind::While { cond_var, cond, body }
                }
            }
            StmtClass::CaseStmt => {
                let sub = ops.stmt()?;
                let rhs = ops.opt_expr()?;
                StmtKind::Case {
                    lhs: ops.expr()?,
                    rhs,
                    sub,
                }
            }
            StmtClass::DefaultStmt => StmtKind::Default { sub: ops.stmt()? },
            StmtClass::DoStmt => {
                let cond = ops.expr()?;
                StmtKind::Do {
                    body: ops.stmt()?,
                    cond,
                }
            }
            StmtClass::ForStmt => {
                let body = ops.stmt()?;
                let inc = ops.opt_expr()?;
                let cond = ops.opt_expr()?;
                StmtKind::For {
                    init: ops.opt_stmt()?,
                    cond_var: self.read_opt_decl_ref(m, f)?,
                    cond,
                    inc,
                    body,
                }
            }
            StmtClass::GotoStmt => StmtKind::Goto {
                label: self.read_decl_ref(m, f)?,
            },
            StmtClass::ReturnStmt => StmtKind::Return {
                value: ops.opt_expr()?,
                nrvo_candidate: self.read_opt_decl_ref(m, f)?,
            },
            _ => return Err(SerializationError::malformed(format!("{class} is not a statement"))),
        };
        self.finish_record(f)?;

        let id = self.ctx.alloc_stmt(kind, loc);
        if let Some(decl) = label {
            if let DeclData::Label(data) = &mut self.ctx.decl_mut(decl).data {
                data.stmt = Some(id);
            }
        }
        Ok(id)
    }

    /// Optional sections of a name reference; expression template
    /// arguments are taken from `ops`.
    fn read_name_sections(
        &mut self,
        m: ModuleIndex,
        f: &mut RecordFields<'_>,
        ops: &mut Operands<'_>,
    ) -> Result<TrailingLayout> {
        let present = f.next_enum("trailing sections", |v| {
            u8::try_from(v).ok().and_then(TrailingSections::from_bits)
        })?;

        let qualifier = if present.contains(TrailingSections::HAS_QUALIFIER) {
            let specifier = match f.next_u64()? {
                QUALIFIER_GLOBAL => NestedNameSpecifier::Global,
                QUALIFIER_NAMESPACE => NestedNameSpecifier::Namespace(self.read_decl_ref(m, f)?),
                QUALIFIER_TYPE => NestedNameSpecifier::Type(self.read_type_ref(m, f)?),
                tag => {
                    return Err(SerializationError::malformed(format!(
                        "unknown qualifier tag {tag}"
                    )))
                }
            };
            Some((specifier, self.read_range(m, f)?))
        } else {
            None
        };

        let found = if present.contains(TrailingSections::HAS_FOUND_DECL) {
            Some(self.read_decl_ref(m, f)?)
        } else {
            None
        };

        let template_args = if present.contains(TrailingSections::HAS_TEMPLATE_ARGS) {
            let langle = self.read_loc(m, f)?;
            let rangle = self.read_loc(m, f)?;
            let n = f.next_count()?;
            let mut args = Vec::with_capacity(n);
            let mut expr_slots = Vec::new();
            for i in 0..n {
                let arg = match f.next_u64()? {
                    TARG_NULL => TemplateArgument::Null,
                    TARG_TYPE => TemplateArgument::Type(self.read_type_ref(m, f)?),
                    TARG_DECLARATION => TemplateArgument::Declaration(self.read_decl_ref(m, f)?),
                    TARG_NULLPTR => TemplateArgument::NullPtr(self.read_type_ref(m, f)?),
                    TARG_INTEGRAL => TemplateArgument::Integral {
                        value: f.next_i64()?,
                        ty: self.read_type_ref(m, f)?,
                    },
                    TARG_EXPRESSION => {
                        expr_slots.push(i);
                        TemplateArgument::Expression(ExprId::INVALID)
                    }
                    tag => {
                        return Err(SerializationError::malformed(format!(
                            "unknown template argument tag {tag}"
                        )))
                    }
                };
                args.push(TemplateArgumentLoc {
                    arg,
                    loc: self.read_loc(m, f)?,
                });
            }
            for (slot, e) in expr_slots.iter().zip(ops.exprs(expr_slots.len())?) {
                args[*slot].arg = TemplateArgument::Expression(e);
            }
            Some(ExplicitTemplateArgs {
                args: self.ctx.trailing.alloc_template_args(&args),
                langle,
                rangle,
            })
        } else {
            None
        };

        Ok(self.ctx.trailing.alloc_sections(qualifier, found, template_args))
    }

    fn read_base_path(
        &mut self,
        m: ModuleIndex,
        f: &mut RecordFields<'_>,
    ) -> Result<BasePathRange> {
        let n = f.next_count()?;
        let mut path = Vec::with_capacity(n);
        for _ in 0..n {
            path.push(self.read_base_specifier(m, f)?);
        }
        Ok(self.ctx.trailing.alloc_base_path(&path))
    }

    fn read_designator(&mut self, m: ModuleIndex, f: &mut RecordFields<'_>) -> Result<Designator> {
        Ok(match f.next_u64()? {
            DESIGNATOR_FIELD => Designator::Field {
                name: self.read_ident(m, f)?,
                field: self.read_decl_ref(m, f)?,
                dot_loc: self.read_loc(m, f)?,
                field_loc: self.read_loc(m, f)?,
            },
            DESIGNATOR_ARRAY => Designator::Array {
                index: f.next_u32()?,
                lbracket: self.read_loc(m, f)?,
                rbracket: self.read_loc(m, f)?,
            },
            DESIGNATOR_RANGE => Designator::ArrayRange {
                index: f.next_u32()?,
                lbracket: self.read_loc(m, f)?,
                ellipsis: self.read_loc(m, f)?,
                rbracket: self.read_loc(m, f)?,
            },
            tag => {
                return Err(SerializationError::malformed(format!(
                    "unknown designator tag {tag}"
                )))
            }
        })
    }
}

fn next_opt_u32(f: &mut RecordFields<'_>) -> Result<Option<u32>> {
    Ok(f.next_u32()?.checked_sub(1))
}
