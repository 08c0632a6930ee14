//! Expression factories.
//!
//! Each factory lays out the node's trailing data first, then hands the
//! finished [`ExprKind`] to [`AstContext::alloc_expr`], which strips
//! reference types and derives dependence from the type and children.

use crate::children::expr_children;
use crate::decl::DeclData;
use crate::expr::{
    AtomicOp, BinaryOp, CallData, CastData, CastKind, CharacterKind, DeclRefData,
    ExplicitCastStyle, Expr, ExprDependence, ExprKind, ExprObjectKind, ExprValueKind,
    MemberData, OverloadedOperator, PredefinedIdent, TraitArg, UnaryOp, UnaryTrait,
};
use crate::node_class::DeclClass;
use crate::source::{SourceLocation, SourceRange};
use crate::trailing::{
    BaseSpecifier, Designator, ExplicitTemplateArgs, NestedNameSpecifier, TemplateArgument,
    TemplateArgumentLoc, TrailingLayout,
};
use crate::types::{TypeFlags, TypeId, TypeKind};
use crate::{AstContext, DeclId, ExprId, Name, NodeRef, QualType, SelectorId, StmtId};

/// Optional name-qualification parts of a `DeclRefExpr` or `MemberExpr`.
#[derive(Clone, Debug, Default)]
pub struct NameRefParts {
    pub qualifier: Option<(NestedNameSpecifier, SourceRange)>,
    pub found_decl: Option<DeclId>,
    pub template_args: Option<(Vec<TemplateArgumentLoc>, SourceLocation, SourceLocation)>,
}

impl NameRefParts {
    pub fn none() -> Self {
        Self::default()
    }
}

impl AstContext {
    /// Allocate an expression node.
    ///
    /// The stored type is `ty` with any reference stripped; value and
    /// object kind are taken as given; dependence is computed.
    pub fn alloc_expr(
        &mut self,
        kind: ExprKind,
        ty: QualType,
        value_kind: ExprValueKind,
        object_kind: ExprObjectKind,
        loc: SourceLocation,
    ) -> ExprId {
        let ty = if ty.is_null() {
            ty
        } else {
            self.types.non_reference_type(ty)
        };
        let dependence = self.compute_dependence(&kind, ty);
        self.push_expr(Expr::from_parts(
            kind,
            ty,
            loc,
            value_kind,
            object_kind,
            dependence,
        ))
    }

    fn compute_dependence(&self, kind: &ExprKind, ty: QualType) -> ExprDependence {
        let mut dep = ExprDependence::empty();
        if !ty.is_null() {
            let flags = self.types.flags(ty.ty);
            if flags.contains(TypeFlags::DEPENDENT) {
                dep |= ExprDependence::TYPE | ExprDependence::VALUE;
            }
            if flags.contains(TypeFlags::INSTANTIATION_DEPENDENT) {
                dep |= ExprDependence::INSTANTIATION;
            }
            if flags.contains(TypeFlags::CONTAINS_UNEXPANDED_PACK) {
                dep |= ExprDependence::UNEXPANDED_PACK;
            }
        }
        for child in expr_children(&self.trailing, kind) {
            if let NodeRef::Expr(e) = child {
                dep |= self.expr(e).dependence.as_child();
            }
        }

        match kind {
            ExprKind::DeclRef(d) => {
                dep |= self.decl_ref_dependence(d.decl);
                dep |= self.template_args_dependence(d.trailing);
            }
            ExprKind::Member(m) => dep |= self.template_args_dependence(m.trailing),
            ExprKind::UnaryExprOrTypeTrait {
                arg: TraitArg::Type(t),
                ..
            } => {
                let flags = self.types.flags(t.ty);
                if flags.contains(TypeFlags::DEPENDENT) {
                    dep |= ExprDependence::VALUE;
                }
                if flags.contains(TypeFlags::CONTAINS_UNEXPANDED_PACK) {
                    dep |= ExprDependence::UNEXPANDED_PACK;
                }
            }
            ExprKind::GenericSelection {
                result_index: None,
                ..
            } => dep |= ExprDependence::TYPE | ExprDependence::VALUE,
            ExprKind::PackExpansion { .. } => dep -= ExprDependence::UNEXPANDED_PACK,
            ExprKind::SizeOfPack { length, .. } => {
                dep -= ExprDependence::UNEXPANDED_PACK;
                if length.is_none() {
                    dep |= ExprDependence::VALUE;
                }
            }
            _ => {}
        }
        dep.normalized()
    }

    fn decl_ref_dependence(&self, decl: DeclId) -> ExprDependence {
        match &self.decl(decl).data {
            DeclData::NonTypeTemplateParm(p) => {
                let mut dep = ExprDependence::VALUE;
                if p.pack {
                    dep |= ExprDependence::UNEXPANDED_PACK;
                }
                dep
            }
            DeclData::EnumConstant(c) => match c.init {
                Some(init) => self.expr(init).dependence & ExprDependence::VALUE,
                None => ExprDependence::empty(),
            },
            _ => ExprDependence::empty(),
        }
    }

    fn template_args_dependence(&self, layout: TrailingLayout) -> ExprDependence {
        let mut dep = ExprDependence::empty();
        for arg in self.trailing.template_args_of(layout) {
            let arg_dep = match arg.arg {
                TemplateArgument::Type(t)
                | TemplateArgument::NullPtr(t)
                | TemplateArgument::Integral { ty: t, .. } => {
                    let flags = self.types.flags(t.ty);
                    let mut d = ExprDependence::empty();
                    if flags.intersects(TypeFlags::DEPENDENT | TypeFlags::INSTANTIATION_DEPENDENT) {
                        d |= ExprDependence::VALUE;
                    }
                    if flags.contains(TypeFlags::CONTAINS_UNEXPANDED_PACK) {
                        d |= ExprDependence::UNEXPANDED_PACK;
                    }
                    d
                }
                TemplateArgument::Expression(e) => self.expr(e).dependence.as_child(),
                TemplateArgument::Null | TemplateArgument::Declaration(_) => {
                    ExprDependence::empty()
                }
            };
            dep |= arg_dep;
        }
        dep
    }

    fn alloc_name_ref_parts(&mut self, parts: NameRefParts) -> TrailingLayout {
        let template_args = parts.template_args.map(|(args, langle, rangle)| {
            let args = self.trailing.alloc_template_args(&args);
            ExplicitTemplateArgs {
                args,
                langle,
                rangle,
            }
        });
        self.trailing
            .alloc_sections(parts.qualifier, parts.found_decl, template_args)
    }

    fn rvalue(&mut self, kind: ExprKind, ty: QualType, loc: SourceLocation) -> ExprId {
        self.alloc_expr(
            kind,
            ty,
            ExprValueKind::RValue,
            ExprObjectKind::Ordinary,
            loc,
        )
    }

    // === Literals ===

    pub fn create_integer_literal(
        &mut self,
        value: u64,
        ty: QualType,
        loc: SourceLocation,
    ) -> ExprId {
        assert!(
            self.types.is_integer_type(ty),
            "integer literal must have integer type"
        );
        self.rvalue(ExprKind::IntegerLiteral { value }, ty, loc)
    }

    /// Character literal; the type follows the literal's encoding.
    pub fn create_character_literal(
        &mut self,
        value: u32,
        kind: CharacterKind,
        loc: SourceLocation,
    ) -> ExprId {
        let ty = match kind {
            CharacterKind::Ascii | CharacterKind::Utf8 if self.lang.cplusplus => TypeId::CHAR,
            CharacterKind::Ascii | CharacterKind::Utf8 | CharacterKind::Wide => TypeId::INT,
            CharacterKind::Utf16 => TypeId::USHORT,
            CharacterKind::Utf32 => TypeId::UINT,
        };
        self.rvalue(ExprKind::CharacterLiteral { value, kind }, ty.into(), loc)
    }

    pub fn create_floating_literal(
        &mut self,
        value: f64,
        ty: QualType,
        loc: SourceLocation,
    ) -> ExprId {
        self.rvalue(ExprKind::FloatingLiteral { value, exact: true }, ty, loc)
    }

    /// String literal of type `char[N + 1]` (`const char` in C++).
    pub fn create_string_literal(
        &mut self,
        bytes: &[u8],
        kind: CharacterKind,
        loc: SourceLocation,
    ) -> ExprId {
        let mut elem = QualType::from(TypeId::CHAR);
        if self.lang.cplusplus {
            elem = elem.with_const();
        }
        let ty = self.types.constant_array(elem, bytes.len() as u64 + 1);
        self.alloc_expr(
            ExprKind::StringLiteral {
                bytes: bytes.into(),
                kind,
            },
            ty,
            ExprValueKind::LValue,
            ExprObjectKind::Ordinary,
            loc,
        )
    }

    pub fn create_bool_literal(&mut self, value: bool, loc: SourceLocation) -> ExprId {
        self.rvalue(ExprKind::BoolLiteral { value }, TypeId::BOOL.into(), loc)
    }

    pub fn create_nullptr_literal(&mut self, loc: SourceLocation) -> ExprId {
        self.rvalue(ExprKind::NullPtrLiteral, TypeId::NULLPTR.into(), loc)
    }

    /// `__func__` and friends, typed as the caller computed.
    pub fn create_predefined(
        &mut self,
        ident: PredefinedIdent,
        ty: QualType,
        loc: SourceLocation,
    ) -> ExprId {
        self.alloc_expr(
            ExprKind::Predefined { ident },
            ty,
            ExprValueKind::LValue,
            ExprObjectKind::Ordinary,
            loc,
        )
    }

    // === Names ===

    /// Reference to `decl`. Type and value kind follow from the
    /// declaration.
    pub fn create_decl_ref(
        &mut self,
        decl: DeclId,
        loc: SourceLocation,
        parts: NameRefParts,
    ) -> ExprId {
        let d = self.decl(decl);
        let class = d.class();
        let decl_ty = d.value_type().unwrap_or_else(|| {
            panic!("{class} cannot be referenced by a DeclRefExpr")
        });
        let value_kind = match class {
            DeclClass::EnumConstant => ExprValueKind::RValue,
            DeclClass::NonTypeTemplateParm => {
                if self.types.is_reference_type(decl_ty) {
                    ExprValueKind::LValue
                } else {
                    ExprValueKind::RValue
                }
            }
            c if c.is_function() && !self.lang.cplusplus => ExprValueKind::RValue,
            _ => ExprValueKind::LValue,
        };
        let trailing = self.alloc_name_ref_parts(parts);
        self.alloc_expr(
            ExprKind::DeclRef(DeclRefData {
                decl,
                trailing,
                refers_to_enclosing_local: false,
                had_multiple_candidates: false,
            }),
            decl_ty,
            value_kind,
            ExprObjectKind::Ordinary,
            loc,
        )
    }

    /// `base.member` or `base->member`.
    pub fn create_member(
        &mut self,
        base: ExprId,
        member: DeclId,
        is_arrow: bool,
        parts: NameRefParts,
        loc: SourceLocation,
    ) -> ExprId {
        let base_expr = self.expr(base);
        let base_vk = base_expr.value_kind;
        let base_quals = if is_arrow {
            self.types
                .pointee(base_expr.ty)
                .map(|p| p.quals)
                .unwrap_or_default()
        } else {
            base_expr.ty.quals
        };

        let m = self.decl(member);
        let mut ty = m.value_type().unwrap_or_else(|| panic!("{} is not a member", m.class()));
        let (value_kind, object_kind) = match &m.data {
            DeclData::Field(f) => {
                if !f.mutable {
                    ty.quals |= base_quals;
                }
                let vk = if is_arrow || base_vk == ExprValueKind::LValue {
                    ExprValueKind::LValue
                } else if self.lang.cplusplus {
                    ExprValueKind::XValue
                } else {
                    ExprValueKind::RValue
                };
                let ok = if f.bit_width.is_some() {
                    ExprObjectKind::BitField
                } else {
                    ExprObjectKind::Ordinary
                };
                (vk, ok)
            }
            DeclData::Var(_) => (ExprValueKind::LValue, ExprObjectKind::Ordinary),
            _ => (ExprValueKind::RValue, ExprObjectKind::Ordinary),
        };

        let trailing = self.alloc_name_ref_parts(parts);
        self.alloc_expr(
            ExprKind::Member(MemberData {
                base,
                member,
                is_arrow,
                trailing,
            }),
            ty,
            value_kind,
            object_kind,
            loc,
        )
    }

    pub fn create_this(&mut self, ty: QualType, implicit: bool, loc: SourceLocation) -> ExprId {
        self.rvalue(ExprKind::This { implicit }, ty, loc)
    }

    pub fn create_selector_expr(&mut self, selector: SelectorId, loc: SourceLocation) -> ExprId {
        self.rvalue(ExprKind::ObjCSelector { selector }, TypeId::OBJC_SEL.into(), loc)
    }

    // === Operators ===

    pub fn create_paren(
        &mut self,
        sub: ExprId,
        lparen: SourceLocation,
        rparen: SourceLocation,
    ) -> ExprId {
        let e = self.expr(sub);
        let (ty, vk, ok) = (e.ty, e.value_kind, e.object_kind);
        self.alloc_expr(ExprKind::Paren { sub, rparen }, ty, vk, ok, lparen)
    }

    /// Unary operator with a caller-computed result type.
    pub fn create_unary(
        &mut self,
        op: UnaryOp,
        sub: ExprId,
        ty: QualType,
        loc: SourceLocation,
    ) -> ExprId {
        let e = self.expr(sub);
        let (vk, ok) = match op {
            UnaryOp::Deref => (ExprValueKind::LValue, ExprObjectKind::Ordinary),
            UnaryOp::PreInc | UnaryOp::PreDec if self.lang.cplusplus => {
                (ExprValueKind::LValue, e.object_kind)
            }
            UnaryOp::Extension | UnaryOp::Real | UnaryOp::Imag => (e.value_kind, e.object_kind),
            _ => (ExprValueKind::RValue, ExprObjectKind::Ordinary),
        };
        self.alloc_expr(ExprKind::Unary { op, sub }, ty, vk, ok, loc)
    }

    /// Binary operator with a caller-computed result type. Compound
    /// assignments go through [`create_compound_assign`](Self::create_compound_assign).
    pub fn create_binary(
        &mut self,
        op: BinaryOp,
        lhs: ExprId,
        rhs: ExprId,
        ty: QualType,
        loc: SourceLocation,
    ) -> ExprId {
        assert!(
            !op.is_compound_assignment(),
            "compound assignment {} needs create_compound_assign",
            op.spelling()
        );
        let (vk, ok) = if self.lang.cplusplus {
            match op {
                BinaryOp::Assign => (ExprValueKind::LValue, self.expr(lhs).object_kind),
                BinaryOp::Comma => {
                    let r = self.expr(rhs);
                    (r.value_kind, r.object_kind)
                }
                _ => (ExprValueKind::RValue, ExprObjectKind::Ordinary),
            }
        } else {
            (ExprValueKind::RValue, ExprObjectKind::Ordinary)
        };
        self.alloc_expr(ExprKind::Binary { op, lhs, rhs }, ty, vk, ok, loc)
    }

    pub fn create_compound_assign(
        &mut self,
        op: BinaryOp,
        lhs: ExprId,
        rhs: ExprId,
        computation_lhs: QualType,
        computation_result: QualType,
        loc: SourceLocation,
    ) -> ExprId {
        assert!(op.is_compound_assignment(), "{} is not a compound assignment", op.spelling());
        let l = self.expr(lhs);
        let (ty, ok) = (l.ty, l.object_kind);
        let vk = if self.lang.cplusplus {
            ExprValueKind::LValue
        } else {
            ExprValueKind::RValue
        };
        self.alloc_expr(
            ExprKind::CompoundAssign {
                op,
                lhs,
                rhs,
                computation_lhs,
                computation_result,
            },
            ty,
            vk,
            ok,
            loc,
        )
    }

    pub fn create_conditional(
        &mut self,
        cond: ExprId,
        lhs: ExprId,
        rhs: ExprId,
        ty: QualType,
        loc: SourceLocation,
    ) -> ExprId {
        let (l, r) = (self.expr(lhs), self.expr(rhs));
        let vk = if self.lang.cplusplus && l.value_kind == r.value_kind && l.is_glvalue() {
            l.value_kind
        } else {
            ExprValueKind::RValue
        };
        let ok = if vk != ExprValueKind::RValue
            && (l.object_kind == ExprObjectKind::BitField
                || r.object_kind == ExprObjectKind::BitField)
        {
            ExprObjectKind::BitField
        } else {
            ExprObjectKind::Ordinary
        };
        self.alloc_expr(ExprKind::Conditional { cond, lhs, rhs }, ty, vk, ok, loc)
    }

    pub fn create_array_subscript(
        &mut self,
        lhs: ExprId,
        rhs: ExprId,
        ty: QualType,
        loc: SourceLocation,
        rbracket: SourceLocation,
    ) -> ExprId {
        let base = self.expr(lhs);
        let (vk, ok) = if self.types.is_vector(base.ty) {
            (base.value_kind, ExprObjectKind::VectorComponent)
        } else {
            (ExprValueKind::LValue, ExprObjectKind::Ordinary)
        };
        self.alloc_expr(ExprKind::ArraySubscript { lhs, rhs, rbracket }, ty, vk, ok, loc)
    }

    /// `sizeof`, `alignof` or `vec_step`, of type `unsigned long`.
    pub fn create_unary_trait(
        &mut self,
        kind: UnaryTrait,
        arg: TraitArg,
        loc: SourceLocation,
    ) -> ExprId {
        self.rvalue(
            ExprKind::UnaryExprOrTypeTrait { kind, arg },
            TypeId::ULONG.into(),
            loc,
        )
    }

    // === Casts ===

    pub fn create_implicit_cast(
        &mut self,
        kind: CastKind,
        sub: ExprId,
        path: &[BaseSpecifier],
        ty: QualType,
        value_kind: ExprValueKind,
    ) -> ExprId {
        assert!(
            path.is_empty() || kind.has_base_path(),
            "{kind:?} cast cannot carry a base path"
        );
        let path = self.trailing.alloc_base_path(path);
        let loc = self.expr(sub).loc;
        self.alloc_expr(
            ExprKind::ImplicitCast(CastData { kind, sub, path }),
            ty,
            value_kind,
            ExprObjectKind::Ordinary,
            loc,
        )
    }

    /// Explicit cast to `written`. The value kind follows the written
    /// type: lvalue references give lvalues, rvalue references xvalues.
    pub fn create_explicit_cast(
        &mut self,
        style: ExplicitCastStyle,
        kind: CastKind,
        sub: ExprId,
        path: &[BaseSpecifier],
        written: QualType,
        loc: SourceLocation,
    ) -> ExprId {
        assert!(
            path.is_empty() || kind.has_base_path(),
            "{kind:?} cast cannot carry a base path"
        );
        let vk = self.value_kind_for_written_type(written);
        let path = self.trailing.alloc_base_path(path);
        self.alloc_expr(
            ExprKind::ExplicitCast {
                style,
                cast: CastData { kind, sub, path },
                written,
            },
            written,
            vk,
            ExprObjectKind::Ordinary,
            loc,
        )
    }

    fn value_kind_for_written_type(&self, written: QualType) -> ExprValueKind {
        if !self.lang.cplusplus {
            return ExprValueKind::RValue;
        }
        match self.types.kind(self.types.canonical(written).ty) {
            TypeKind::LValueReference(_) => ExprValueKind::LValue,
            TypeKind::RValueReference(p) if self.types.is_function(*p) => ExprValueKind::LValue,
            TypeKind::RValueReference(_) => ExprValueKind::XValue,
            _ => ExprValueKind::RValue,
        }
    }

    // === Calls ===

    /// Result type and value kind of calling `callee`.
    fn call_result(&self, callee: ExprId) -> (QualType, ExprValueKind) {
        let callee_ty = self.expr(callee).ty;
        if self.types.is_dependent(callee_ty) {
            return (TypeId::DEPENDENT.into(), ExprValueKind::RValue);
        }
        let fn_ty = if self.types.is_function(callee_ty) {
            callee_ty
        } else {
            self.types
                .pointee(callee_ty)
                .unwrap_or_else(|| panic!("callee of type {callee_ty:?} is not callable"))
        };
        let result = self
            .types
            .function_result(fn_ty)
            .unwrap_or_else(|| panic!("callee of type {callee_ty:?} is not callable"));
        (result, self.value_kind_for_written_type(result))
    }

    fn alloc_call(
        &mut self,
        callee: ExprId,
        args: &[ExprId],
        rparen: SourceLocation,
    ) -> (CallData, QualType, ExprValueKind) {
        let (ty, vk) = self.call_result(callee);
        let args = self.trailing.alloc_exprs(args);
        (CallData { callee, args, rparen }, ty, vk)
    }

    /// `callee(args...)`. The argument count is fixed here.
    pub fn create_call(
        &mut self,
        callee: ExprId,
        args: &[ExprId],
        rparen: SourceLocation,
    ) -> ExprId {
        let loc = self.expr(callee).loc;
        let (call, ty, vk) = self.alloc_call(callee, args, rparen);
        self.alloc_expr(ExprKind::Call(call), ty, vk, ExprObjectKind::Ordinary, loc)
    }

    /// `obj.method(args...)`; `callee` is the `MemberExpr`.
    pub fn create_member_call(
        &mut self,
        callee: ExprId,
        args: &[ExprId],
        rparen: SourceLocation,
    ) -> ExprId {
        let loc = self.expr(callee).loc;
        let (call, ty, vk) = self.alloc_call(callee, args, rparen);
        self.alloc_expr(ExprKind::MemberCall(call), ty, vk, ExprObjectKind::Ordinary, loc)
    }

    pub fn create_operator_call(
        &mut self,
        op: OverloadedOperator,
        callee: ExprId,
        args: &[ExprId],
        loc: SourceLocation,
    ) -> ExprId {
        let (call, ty, vk) = self.alloc_call(callee, args, loc);
        self.alloc_expr(
            ExprKind::OperatorCall { op, call },
            ty,
            vk,
            ExprObjectKind::Ordinary,
            loc,
        )
    }

    // === Initializers ===

    pub fn create_init_list(
        &mut self,
        inits: &[ExprId],
        filler: Option<ExprId>,
        ty: QualType,
        lbrace: SourceLocation,
        rbrace: SourceLocation,
    ) -> ExprId {
        let inits = self.trailing.alloc_exprs(inits);
        self.rvalue(
            ExprKind::InitList {
                inits,
                filler,
                union_field: None,
                lbrace,
                rbrace,
            },
            ty,
            lbrace,
        )
    }

    /// Record which union member an initializer list initializes.
    pub fn set_initialized_field_in_union(&mut self, list: ExprId, field: DeclId) {
        match &mut self.expr_mut(list).kind {
            ExprKind::InitList { union_field, .. } => *union_field = Some(field),
            other => panic!("set_initialized_field_in_union on {}", other.class()),
        }
    }

    /// Designated initializer. Array designators index into
    /// `index_exprs`.
    pub fn create_designated_init(
        &mut self,
        designators: &[Designator],
        index_exprs: &[ExprId],
        init: ExprId,
        gnu_syntax: bool,
        eq_loc: SourceLocation,
    ) -> ExprId {
        for d in designators {
            if let Designator::Array { index, .. } | Designator::ArrayRange { index, .. } = *d {
                let needed = match d {
                    Designator::ArrayRange { .. } => index as usize + 2,
                    _ => index as usize + 1,
                };
                assert!(
                    needed <= index_exprs.len(),
                    "designator index {index} out of range ({} index expressions)",
                    index_exprs.len()
                );
            }
        }
        let mut subexprs = Vec::with_capacity(index_exprs.len() + 1);
        subexprs.push(init);
        subexprs.extend_from_slice(index_exprs);
        let subexprs = self.trailing.alloc_exprs(&subexprs);
        let designators = self.trailing.alloc_designators(designators);
        let ty = self.expr(init).ty;
        self.rvalue(
            ExprKind::DesignatedInit {
                designators,
                subexprs,
                eq_loc,
                gnu_syntax,
            },
            ty,
            eq_loc,
        )
    }

    /// Index expression of an array designator. A range designator's end
    /// is at `index + 1`.
    pub fn designator_index_expr(&self, id: ExprId, index: u32) -> ExprId {
        let subs = self.subexprs(id);
        let pos = index as usize + 1;
        assert!(pos < subs.len(), "designator index {index} out of range");
        subs[pos]
    }

    pub fn create_implicit_value_init(&mut self, ty: QualType) -> ExprId {
        self.rvalue(ExprKind::ImplicitValueInit, ty, SourceLocation::INVALID)
    }

    pub fn create_compound_literal(
        &mut self,
        written: QualType,
        init: ExprId,
        file_scope: bool,
        loc: SourceLocation,
    ) -> ExprId {
        let vk = if self.lang.cplusplus {
            ExprValueKind::RValue
        } else {
            ExprValueKind::LValue
        };
        self.alloc_expr(
            ExprKind::CompoundLiteral {
                init,
                written,
                file_scope,
            },
            written,
            vk,
            ExprObjectKind::Ordinary,
            loc,
        )
    }

    /// `_Generic(controlling, T1: e1, ..., default: eN)`. A null type
    /// marks the default association; `result_index` is `None` while the
    /// controlling expression is dependent.
    pub fn create_generic_selection(
        &mut self,
        controlling: ExprId,
        assoc_types: &[QualType],
        assoc_exprs: &[ExprId],
        result_index: Option<u32>,
        loc: SourceLocation,
    ) -> ExprId {
        assert_eq!(
            assoc_types.len(),
            assoc_exprs.len(),
            "generic selection needs one type per association"
        );
        let (ty, vk, ok) = match result_index {
            Some(i) => {
                let chosen = self.expr(assoc_exprs[i as usize]);
                (chosen.ty, chosen.value_kind, chosen.object_kind)
            }
            None => (
                TypeId::DEPENDENT.into(),
                ExprValueKind::RValue,
                ExprObjectKind::Ordinary,
            ),
        };
        let assoc_types = self.trailing.alloc_types(assoc_types);
        let assoc_exprs = self.trailing.alloc_exprs(assoc_exprs);
        self.alloc_expr(
            ExprKind::GenericSelection {
                controlling,
                assoc_types,
                assoc_exprs,
                result_index,
            },
            ty,
            vk,
            ok,
            loc,
        )
    }

    // === Builtins ===

    pub fn create_atomic(
        &mut self,
        op: AtomicOp,
        subexprs: &[ExprId],
        ty: QualType,
        loc: SourceLocation,
        rparen: SourceLocation,
    ) -> ExprId {
        assert_eq!(
            subexprs.len(),
            op.num_subexprs(),
            "{op:?} takes {} operands",
            op.num_subexprs()
        );
        let subexprs = self.trailing.alloc_exprs(subexprs);
        self.rvalue(ExprKind::Atomic { op, subexprs, rparen }, ty, loc)
    }

    pub fn create_shuffle_vector(
        &mut self,
        subexprs: &[ExprId],
        ty: QualType,
        loc: SourceLocation,
        rparen: SourceLocation,
    ) -> ExprId {
        let subexprs = self.trailing.alloc_exprs(subexprs);
        self.rvalue(ExprKind::ShuffleVector { subexprs, rparen }, ty, loc)
    }

    pub fn create_convert_vector(
        &mut self,
        src: ExprId,
        written: QualType,
        loc: SourceLocation,
    ) -> ExprId {
        self.rvalue(ExprKind::ConvertVector { src, written }, written, loc)
    }

    /// `v.xyz`. Accessing through a pointer yields an lvalue; otherwise
    /// the base's value kind carries over.
    pub fn create_ext_vector_element(
        &mut self,
        base: ExprId,
        accessor: Name,
        ty: QualType,
        loc: SourceLocation,
    ) -> ExprId {
        let b = self.expr(base);
        let vk = if self.types.is_pointer(b.ty) {
            ExprValueKind::LValue
        } else {
            b.value_kind
        };
        self.alloc_expr(
            ExprKind::ExtVectorElement { base, accessor },
            ty,
            vk,
            ExprObjectKind::VectorComponent,
            loc,
        )
    }

    /// `__builtin_choose_expr`; takes on the chosen operand's type and
    /// value kind.
    pub fn create_choose(
        &mut self,
        cond: ExprId,
        lhs: ExprId,
        rhs: ExprId,
        cond_true: bool,
        loc: SourceLocation,
    ) -> ExprId {
        let chosen = self.expr(if cond_true { lhs } else { rhs });
        let (ty, vk, ok) = (chosen.ty, chosen.value_kind, chosen.object_kind);
        self.alloc_expr(
            ExprKind::Choose {
                cond,
                lhs,
                rhs,
                cond_true,
            },
            ty,
            vk,
            ok,
            loc,
        )
    }

    pub fn create_va_arg(&mut self, sub: ExprId, written: QualType, loc: SourceLocation) -> ExprId {
        let vk = self.value_kind_for_written_type(written);
        self.alloc_expr(
            ExprKind::VAArg { sub, written },
            written,
            vk,
            ExprObjectKind::Ordinary,
            loc,
        )
    }

    pub fn create_stmt_expr(&mut self, body: StmtId, ty: QualType, loc: SourceLocation) -> ExprId {
        self.rvalue(ExprKind::StmtExpr { body }, ty, loc)
    }

    /// `&&label`, of type `void *`.
    pub fn create_addr_label(&mut self, label: DeclId, loc: SourceLocation) -> ExprId {
        let ty = self.types.pointer(TypeId::VOID.into());
        self.rvalue(ExprKind::AddrLabel { label }, ty, loc)
    }

    // === C++ ===

    pub fn create_construct(
        &mut self,
        ctor: DeclId,
        args: &[ExprId],
        ty: QualType,
        elidable: bool,
        zero_init: bool,
        loc: SourceLocation,
    ) -> ExprId {
        let args = self.trailing.alloc_exprs(args);
        self.rvalue(
            ExprKind::Construct {
                ctor,
                args,
                elidable,
                zero_init,
            },
            ty,
            loc,
        )
    }

    /// Use of `param`'s default argument at a call site.
    pub fn create_default_arg(&mut self, param: DeclId, loc: SourceLocation) -> ExprId {
        let ty = self
            .decl(param)
            .value_type()
            .unwrap_or_else(|| panic!("default argument of a non-parameter"));
        let vk = self.value_kind_for_written_type(ty);
        self.alloc_expr(
            ExprKind::DefaultArg { param },
            ty,
            vk,
            ExprObjectKind::Ordinary,
            loc,
        )
    }

    /// Materialize `sub` into a temporary bound to a reference.
    pub fn create_materialize_temporary(
        &mut self,
        sub: ExprId,
        bound_to_lvalue_reference: bool,
        extended_by: Option<DeclId>,
    ) -> ExprId {
        let e = self.expr(sub);
        let (ty, loc) = (e.ty, e.loc);
        let vk = if bound_to_lvalue_reference {
            ExprValueKind::LValue
        } else {
            ExprValueKind::XValue
        };
        self.alloc_expr(
            ExprKind::MaterializeTemporary { sub, extended_by },
            ty,
            vk,
            ExprObjectKind::Ordinary,
            loc,
        )
    }

    pub fn create_opaque_value(
        &mut self,
        ty: QualType,
        vk: ExprValueKind,
        ok: ExprObjectKind,
        source: Option<ExprId>,
        loc: SourceLocation,
    ) -> ExprId {
        self.alloc_expr(ExprKind::OpaqueValue { source }, ty, vk, ok, loc)
    }

    /// `pattern...`.
    pub fn create_pack_expansion(
        &mut self,
        pattern: ExprId,
        num_expansions: Option<u32>,
        loc: SourceLocation,
    ) -> ExprId {
        let p = self.expr(pattern);
        let (ty, vk, ok) = (p.ty, p.value_kind, p.object_kind);
        self.alloc_expr(
            ExprKind::PackExpansion {
                pattern,
                num_expansions,
            },
            ty,
            vk,
            ok,
            loc,
        )
    }

    /// `sizeof...(pack)`; `length` is known once the pack is expanded.
    pub fn create_size_of_pack(
        &mut self,
        pack: DeclId,
        length: Option<u32>,
        loc: SourceLocation,
    ) -> ExprId {
        self.rvalue(ExprKind::SizeOfPack { pack, length }, TypeId::ULONG.into(), loc)
    }
}
