//! Statement groups.
//!
//! A group is one tree of statements and expressions written in post
//! order: every node's children come before the node, so the reader can
//! rebuild the tree with a stack. An absent optional child is a
//! `STMT_NULL_PTR` record, a node already written earlier in the group is
//! a `STMT_REF_PTR` back-reference, and `STMT_STOP` ends the group.

use cx_ir::expr::TraitArg;
use cx_ir::stmt::StmtKind;
use cx_ir::trailing::{Designator, NestedNameSpecifier, TemplateArgument, TrailingLayout};
use cx_ir::{BasePathRange, Expr, ExprKind, ExprRange, NodeRef, StmtClass, StmtId};
use cx_stack::ensure_sufficient_stack;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use super::{loc, opt_u32, AstWriter};
use crate::bitstream::{encode_signed, Abbrev, AbbrevOp};
use crate::codes;
use crate::Result;

/// Tags of a nested-name-specifier.
pub(crate) const QUALIFIER_GLOBAL: u64 = 0;
pub(crate) const QUALIFIER_NAMESPACE: u64 = 1;
pub(crate) const QUALIFIER_TYPE: u64 = 2;

/// Tags of a template argument.
pub(crate) const TARG_NULL: u64 = 0;
pub(crate) const TARG_TYPE: u64 = 1;
pub(crate) const TARG_DECLARATION: u64 = 2;
pub(crate) const TARG_NULLPTR: u64 = 3;
pub(crate) const TARG_INTEGRAL: u64 = 4;
pub(crate) const TARG_EXPRESSION: u64 = 5;

/// Tags of a designator.
pub(crate) const DESIGNATOR_FIELD: u64 = 0;
pub(crate) const DESIGNATOR_ARRAY: u64 = 1;
pub(crate) const DESIGNATOR_RANGE: u64 = 2;

type Children = SmallVec<[Option<NodeRef>; 4]>;

/// Layout of the expression header: type, location, value kind, object
/// kind, dependence.
fn expr_header_ops(class: StmtClass) -> Vec<AbbrevOp> {
    vec![
        AbbrevOp::Literal(u64::from(codes::stmt_code(class))),
        AbbrevOp::Vbr(6),
        AbbrevOp::Vbr(6),
        AbbrevOp::Fixed(2),
        AbbrevOp::Fixed(2),
        AbbrevOp::Fixed(4),
    ]
}

/// Layouts for the three expressions that dominate real code: integer
/// literals, plain references to a declaration, and implicit casts with
/// no base path.
pub(super) fn expr_abbrevs() -> Vec<Abbrev> {
    let mut int = expr_header_ops(StmtClass::IntegerLiteral);
    int.push(AbbrevOp::Vbr(8));

    let mut decl_ref = expr_header_ops(StmtClass::DeclRefExpr);
    decl_ref.extend([
        AbbrevOp::Vbr(6),
        AbbrevOp::Fixed(1),
        AbbrevOp::Fixed(1),
        AbbrevOp::Literal(0),
    ]);

    let mut cast = expr_header_ops(StmtClass::ImplicitCastExpr);
    cast.extend([AbbrevOp::Fixed(6), AbbrevOp::Literal(0)]);

    vec![Abbrev::new(&int), Abbrev::new(&decl_ref), Abbrev::new(&cast)]
}

/// Nodes written so far in the current group, by position.
#[derive(Default)]
struct GroupState {
    written: FxHashMap<NodeRef, u32>,
    next: u32,
}

impl AstWriter<'_> {
    pub(super) fn write_stmt_group(&mut self, root: NodeRef) -> Result<()> {
        let mut group = GroupState::default();
        self.write_node(Some(root), &mut group)?;
        self.stream.emit_record(codes::STMT_STOP, &[]);
        Ok(())
    }

    fn write_node(&mut self, node: Option<NodeRef>, group: &mut GroupState) -> Result<()> {
        let Some(node) = node else {
            self.stream.emit_record(codes::STMT_NULL_PTR, &[]);
            return Ok(());
        };
        if let Some(&index) = group.written.get(&node) {
            self.stream.emit_record(codes::STMT_REF_PTR, &[u64::from(index)]);
            return Ok(());
        }

        let (code, children, vals) = match node {
            NodeRef::Stmt(id) => self.stmt_parts(id)?,
            NodeRef::Expr(id) => self.expr_parts(self.ctx.expr(id))?,
        };
        for child in children {
            ensure_sufficient_stack(|| self.write_node(child, group))?;
        }
        self.emit(code, &vals);
        group.written.insert(node, group.next);
        group.next += 1;
        Ok(())
    }

    fn expr_range(&self, range: ExprRange, children: &mut Children) {
        children.extend(self.ctx.trailing.exprs(range).iter().map(|&e| Some(NodeRef::Expr(e))));
    }

    fn base_path(&self, path: BasePathRange, vals: &mut Vec<u64>) -> Result<()> {
        let path = self.ctx.trailing.base_path(path);
        vals.push(path.len() as u64);
        for base in path {
            vals.push(self.type_ref(base.ty)?);
            vals.push(u64::from(base.is_virtual));
            vals.push(u64::from(base.access.raw()));
            vals.push(loc(base.range.begin));
            vals.push(loc(base.range.end));
        }
        Ok(())
    }

    /// Optional sections of a name reference. Expression template
    /// arguments become children; everything else is a field.
    fn name_sections(
        &self,
        layout: TrailingLayout,
        vals: &mut Vec<u64>,
        children: &mut Children,
    ) -> Result<()> {
        let trailing = &self.ctx.trailing;
        vals.push(u64::from(layout.present.bits()));
        if let Some((specifier, range)) = trailing.qualifier(layout) {
            match specifier {
                NestedNameSpecifier::Global => vals.push(QUALIFIER_GLOBAL),
                NestedNameSpecifier::Namespace(ns) => {
                    vals.push(QUALIFIER_NAMESPACE);
                    vals.push(self.decl_ref(ns)?);
                }
                NestedNameSpecifier::Type(ty) => {
                    vals.push(QUALIFIER_TYPE);
                    vals.push(self.type_ref(ty)?);
                }
            }
            vals.push(loc(range.begin));
            vals.push(loc(range.end));
        }
        if let Some(found) = trailing.found_decl(layout) {
            vals.push(self.decl_ref(found)?);
        }
        if let Some(targs) = trailing.explicit_template_args(layout) {
            vals.push(loc(targs.langle));
            vals.push(loc(targs.rangle));
            let args = trailing.template_args(targs.args);
            vals.push(args.len() as u64);
            for arg in args {
                match arg.arg {
                    TemplateArgument::Null => vals.push(TARG_NULL),
                    TemplateArgument::Type(ty) => {
                        vals.push(TARG_TYPE);
                        vals.push(self.type_ref(ty)?);
                    }
                    TemplateArgument::Declaration(d) => {
                        vals.push(TARG_DECLARATION);
                        vals.push(self.decl_ref(d)?);
                    }
                    TemplateArgument::NullPtr(ty) => {
                        vals.push(TARG_NULLPTR);
                        vals.push(self.type_ref(ty)?);
                    }
                    TemplateArgument::Integral { value, ty } => {
                        vals.push(TARG_INTEGRAL);
                        vals.push(encode_signed(value));
                        vals.push(self.type_ref(ty)?);
                    }
                    TemplateArgument::Expression(e) => {
                        vals.push(TARG_EXPRESSION);
                        children.push(Some(NodeRef::Expr(e)));
                    }
                }
                vals.push(loc(arg.loc));
            }
        }
        Ok(())
    }

    fn expr_parts(&self, e: &Expr) -> Result<(u32, Children, Vec<u64>)> {
        let ctx = self.ctx;
        let mut children = Children::new();
        let mut vals = vec![
            self.type_ref(e.ty())?,
            loc(e.loc()),
            u64::from(e.value_kind().raw()),
            u64::from(e.object_kind().raw()),
            u64::from(e.dependence().bits()),
        ];
        let expr = |id| Some(NodeRef::Expr(id));

        match &e.kind {
            ExprKind::IntegerLiteral { value } => vals.push(*value),
            ExprKind::CharacterLiteral { value, kind } => {
                vals.push(u64::from(*value));
                vals.push(u64::from(kind.raw()));
            }
            ExprKind::FloatingLiteral { value, exact } => {
                vals.push(value.to_bits());
                vals.push(u64::from(*exact));
            }
            ExprKind::StringLiteral { bytes, kind } => {
                vals.push(u64::from(kind.raw()));
                vals.push(bytes.len() as u64);
                vals.extend(bytes.iter().map(|&b| u64::from(b)));
            }
            ExprKind::BoolLiteral { value } => vals.push(u64::from(*value)),
            ExprKind::NullPtrLiteral | ExprKind::ImplicitValueInit => {}
            ExprKind::Predefined { ident } => vals.push(u64::from(ident.raw())),
            ExprKind::DeclRef(d) => {
                vals.push(self.decl_ref(d.decl)?);
                vals.push(u64::from(d.refers_to_enclosing_local));
                vals.push(u64::from(d.had_multiple_candidates));
                self.name_sections(d.trailing, &mut vals, &mut children)?;
            }
            ExprKind::This { implicit } => vals.push(u64::from(*implicit)),
            ExprKind::ObjCSelector { selector } => vals.push(self.selector_ref(*selector)?),
            ExprKind::Paren { sub, rparen } => {
                children.push(expr(*sub));
                vals.push(loc(*rparen));
            }
            ExprKind::Unary { op, sub } => {
                children.push(expr(*sub));
                vals.push(u64::from(op.raw()));
            }
            ExprKind::Binary { op, lhs, rhs } => {
                children.extend([expr(*lhs), expr(*rhs)]);
                vals.push(u64::from(op.raw()));
            }
            ExprKind::CompoundAssign {
                op,
                lhs,
                rhs,
                computation_lhs,
                computation_result,
            } => {
                children.extend([expr(*lhs), expr(*rhs)]);
                vals.push(u64::from(op.raw()));
                vals.push(self.type_ref(*computation_lhs)?);
                vals.push(self.type_ref(*computation_result)?);
            }
            ExprKind::Conditional { cond, lhs, rhs } => {
                children.extend([expr(*cond), expr(*lhs), expr(*rhs)])
            }
            ExprKind::ArraySubscript { lhs, rhs, rbracket } => {
                children.extend([expr(*lhs), expr(*rhs)]);
                vals.push(loc(*rbracket));
            }
            ExprKind::UnaryExprOrTypeTrait { kind, arg } => {
                vals.push(u64::from(kind.raw()));
                match arg {
                    TraitArg::Expr(sub) => {
                        children.push(expr(*sub));
                        vals.push(1);
                    }
                    TraitArg::Type(ty) => {
                        vals.push(0);
                        vals.push(self.type_ref(*ty)?);
                    }
                }
            }
            ExprKind::ImplicitCast(cast) => {
                children.push(expr(cast.sub));
                vals.push(u64::from(cast.kind.raw()));
                self.base_path(cast.path, &mut vals)?;
            }
            ExprKind::ExplicitCast { cast, written, .. } => {
                children.push(expr(cast.sub));
                vals.push(u64::from(cast.kind.raw()));
                vals.push(self.type_ref(*written)?);
                self.base_path(cast.path, &mut vals)?;
            }
            ExprKind::Call(call)
            | ExprKind::MemberCall(call)
            | ExprKind::OperatorCall { call, .. } => {
                children.push(expr(call.callee));
                self.expr_range(call.args, &mut children);
                vals.push(call.args.len() as u64);
                vals.push(loc(call.rparen));
                if let ExprKind::OperatorCall { op, .. } = &e.kind {
                    vals.push(u64::from(op.raw()));
                }
            }
            ExprKind::Member(m) => {
                children.push(expr(m.base));
                vals.push(self.decl_ref(m.member)?);
                vals.push(u64::from(m.is_arrow));
                self.name_sections(m.trailing, &mut vals, &mut children)?;
            }
            ExprKind::InitList {
                inits,
                filler,
                union_field,
                lbrace,
                rbrace,
            } => {
                self.expr_range(*inits, &mut children);
                children.push(filler.map(NodeRef::Expr));
                vals.push(inits.len() as u64);
                vals.push(self.opt_decl_ref(*union_field)?);
                vals.push(loc(*lbrace));
                vals.push(loc(*rbrace));
            }
            ExprKind::DesignatedInit {
                designators,
                subexprs,
                eq_loc,
                gnu_syntax,
            } => {
                self.expr_range(*subexprs, &mut children);
                vals.push(subexprs.len() as u64);
                vals.push(loc(*eq_loc));
                vals.push(u64::from(*gnu_syntax));
                let designators = ctx.trailing.designators(*designators);
                vals.push(designators.len() as u64);
                for d in designators {
                    match *d {
                        Designator::Field {
                            name,
                            field,
                            dot_loc,
                            field_loc,
                        } => {
                            vals.push(DESIGNATOR_FIELD);
                            vals.push(self.ident_ref(name)?);
                            vals.push(self.decl_ref(field)?);
                            vals.push(loc(dot_loc));
                            vals.push(loc(field_loc));
                        }
                        Designator::Array {
                            index,
                            lbracket,
                            rbracket,
                        } => {
                            vals.push(DESIGNATOR_ARRAY);
                            vals.push(u64::from(index));
                            vals.push(loc(lbracket));
                            vals.push(loc(rbracket));
                        }
                        Designator::ArrayRange {
                            index,
                            lbracket,
                            ellipsis,
                            rbracket,
                        } => {
                            vals.push(DESIGNATOR_RANGE);
                            vals.push(u64::from(index));
                            vals.push(loc(lbracket));
                            vals.push(loc(ellipsis));
                            vals.push(loc(rbracket));
                        }
                    }
                }
            }
            ExprKind::CompoundLiteral {
                init,
                written,
                file_scope,
            } => {
                children.push(expr(*init));
                vals.push(self.type_ref(*written)?);
                vals.push(u64::from(*file_scope));
            }
            ExprKind::GenericSelection {
                controlling,
                assoc_types,
                assoc_exprs,
                result_index,
            } => {
                children.push(expr(*controlling));
                self.expr_range(*assoc_exprs, &mut children);
                vals.push(assoc_exprs.len() as u64);
                vals.push(opt_u32(*result_index));
                for &ty in ctx.trailing.types(*assoc_types) {
                    vals.push(self.type_ref(ty)?);
                }
            }
            ExprKind::Atomic { op, subexprs, rparen } => {
                self.expr_range(*subexprs, &mut children);
                vals.push(u64::from(op.raw()));
                vals.push(subexprs.len() as u64);
                vals.push(loc(*rparen));
            }
            ExprKind::ShuffleVector { subexprs, rparen } => {
                self.expr_range(*subexprs, &mut children);
                vals.push(subexprs.len() as u64);
                vals.push(loc(*rparen));
            }
            ExprKind::ConvertVector { src, written } => {
                children.push(expr(*src));
                vals.push(self.type_ref(*written)?);
            }
            ExprKind::ExtVectorElement { base, accessor } => {
                children.push(expr(*base));
                vals.push(self.ident_ref(*accessor)?);
            }
            ExprKind::Choose {
                cond,
                lhs,
                rhs,
                cond_true,
            } => {
                children.extend([expr(*cond), expr(*lhs), expr(*rhs)]);
                vals.push(u64::from(*cond_true));
            }
            ExprKind::VAArg { sub, written } => {
                children.push(expr(*sub));
                vals.push(self.type_ref(*written)?);
            }
            ExprKind::StmtExpr { body } => children.push(Some(NodeRef::Stmt(*body))),
            ExprKind::AddrLabel { label } => vals.push(self.decl_ref(*label)?),
            ExprKind::Construct {
                ctor,
                args,
                elidable,
                zero_init,
            } => {
                self.expr_range(*args, &mut children);
                vals.push(self.decl_ref(*ctor)?);
                vals.push(args.len() as u64);
                vals.push(u64::from(*elidable));
                vals.push(u64::from(*zero_init));
            }
            ExprKind::DefaultArg { param } => vals.push(self.decl_ref(*param)?),
            ExprKind::MaterializeTemporary { sub, extended_by } => {
                children.push(expr(*sub));
                vals.push(self.opt_decl_ref(*extended_by)?);
            }
            ExprKind::OpaqueValue { source } => children.push(source.map(NodeRef::Expr)),
            ExprKind::PackExpansion {
                pattern,
                num_expansions,
            } => {
                children.push(expr(*pattern));
                vals.push(opt_u32(*num_expansions));
            }
            ExprKind::SizeOfPack { pack, length } => {
                vals.push(self.decl_ref(*pack)?);
                vals.push(opt_u32(*length));
            }
        }
        Ok((codes::stmt_code(e.class()), children, vals))
    }

    fn stmt_parts(&self, id: StmtId) -> Result<(u32, Children, Vec<u64>)> {
        let stmt = self.ctx.stmt(id);
        let mut children = Children::new();
        let mut vals = vec![loc(stmt.loc)];
        let expr = |id| Some(NodeRef::Expr(id));
        let sub = |id| Some(NodeRef::Stmt(id));

        match &stmt.kind {
            StmtKind::Null | StmtKind::Continue | StmtKind::Break => {}
            StmtKind::Compound { body, rbrace } => {
                let body = self.ctx.trailing.stmts(*body);
                children.extend(body.iter().map(|&s| sub(s)));
                vals.push(body.len() as u64);
                vals.push(loc(*rbrace));
            }
            StmtKind::Decl { decls } => {
                vals.push(decls.len() as u64);
                for &d in decls {
                    vals.push(self.decl_ref(d)?);
                }
            }
            StmtKind::Expr(e) => children.push(expr(*e)),
            StmtKind::Label { decl, sub: s } => {
                children.push(sub(*s));
                vals.push(self.decl_ref(*decl)?);
            }
            StmtKind::If {
                cond_var,
                cond,
                then,
                else_,
            } => {
                children.extend([expr(*cond), sub(*then), else_.map(NodeRef::Stmt)]);
                vals.push(self.opt_decl_ref(*cond_var)?);
            }
            StmtKind::Switch { cond_var, cond, body }
            | StmtKind::While { cond_var, cond, body } => {
                children.extend([expr(*cond), sub(*body)]);
                vals.push(self.opt_decl_ref(*cond_var)?);
            }
            StmtKind::Case { lhs, rhs, sub: s } => {
                children.extend([expr(*lhs), rhs.map(NodeRef::Expr), sub(*s)]);
            }
            StmtKind::Default { sub: s } => children.push(sub(*s)),
            StmtKind::Do { body, cond } => children.extend([sub(*body), expr(*cond)]),
            StmtKind::For {
                init,
                cond_var,
                cond,
                inc,
                body,
            } => {
                children.extend([
                    init.map(NodeRef::Stmt),
                    cond.map(NodeRef::Expr),
                    inc.map(NodeRef::Expr),
                    sub(*body),
                ]);
                vals.push(self.opt_decl_ref(*cond_var)?);
            }
            StmtKind::Goto { label } => vals.push(self.decl_ref(*label)?),
            StmtKind::Return { value, nrvo_candidate } => {
                children.push(value.map(NodeRef::Expr));
                vals.push(self.opt_decl_ref(*nrvo_candidate)?);
            }
        }
        Ok((codes::stmt_code(stmt.kind.class()), children, vals))
    }
}
