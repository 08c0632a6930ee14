//! Value-category classification.
//!
//! The stored value kind of an expression is what semantic analysis
//! decided; classification refines it into the categories diagnostics
//! need (function designators, `void` lvalues, class temporaries, vector
//! swizzles with repeated components) and answers whether an lvalue can
//! be assigned to.

use crate::decl::{DeclData, DefinitionFlags};
use crate::expr::{BinaryOp, ExprKind, ExprObjectKind, ExprValueKind, UnaryOp};
use crate::source::SourceLocation;
use crate::types::TypeKind;
use crate::{AstContext, DeclId, ExprId, QualType};

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum ClassificationKind {
    LValue,
    XValue,
    /// A function designator in C.
    Function,
    Void,
    /// `*p` where `p` is `void *`.
    AddressableVoid,
    /// A vector swizzle naming one component twice (`v.xx`).
    DuplicateVectorComponents,
    /// A non-static member function named without calling it.
    MemberFunction,
    /// A sub-object of an Objective-C property access.
    SubObjCPropertySetting,
    ClassTemporary,
    ArrayTemporary,
    PRValue,
}

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum Modifiable {
    Untested,
    Modifiable,
    RValue,
    Function,
    /// An rvalue cast of an lvalue (`(int)x = 1`) without the GNU
    /// extension enabled.
    LValueCast,
    NoSetterProperty,
    ConstQualified,
    ArrayType,
    IncompleteType,
}

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct Classification {
    kind: ClassificationKind,
    modifiable: Modifiable,
}

impl Classification {
    #[inline]
    pub fn kind(self) -> ClassificationKind {
        self.kind
    }

    #[inline]
    pub fn modifiable(self) -> Modifiable {
        self.modifiable
    }

    #[inline]
    pub fn is_lvalue(self) -> bool {
        self.kind == ClassificationKind::LValue
    }

    #[inline]
    pub fn is_xvalue(self) -> bool {
        self.kind == ClassificationKind::XValue
    }

    #[inline]
    pub fn is_glvalue(self) -> bool {
        self.kind <= ClassificationKind::XValue
    }

    #[inline]
    pub fn is_prvalue(self) -> bool {
        self.kind >= ClassificationKind::Function
    }

    #[inline]
    pub fn is_modifiable(self) -> bool {
        self.modifiable == Modifiable::Modifiable
    }
}

/// Classify `e` without the modifiability test.
pub fn classify(ctx: &AstContext, e: ExprId) -> Classification {
    Classification {
        kind: classify_kind(ctx, e),
        modifiable: Modifiable::Untested,
    }
}

/// Classify `e` and test whether it can be assigned to. `loc` is moved to
/// the offending cast for [`Modifiable::LValueCast`].
pub fn classify_modifiable(
    ctx: &AstContext,
    e: ExprId,
    loc: &mut SourceLocation,
) -> Classification {
    let kind = classify_kind(ctx, e);
    Classification {
        kind,
        modifiable: modifiability(ctx, e, kind, loc),
    }
}

pub fn is_lvalue(ctx: &AstContext, e: ExprId) -> bool {
    classify(ctx, e).is_lvalue()
}

pub fn is_xvalue(ctx: &AstContext, e: ExprId) -> bool {
    classify(ctx, e).is_xvalue()
}

pub fn is_prvalue(ctx: &AstContext, e: ExprId) -> bool {
    classify(ctx, e).is_prvalue()
}

pub fn is_glvalue(ctx: &AstContext, e: ExprId) -> bool {
    classify(ctx, e).is_glvalue()
}

pub fn is_modifiable_lvalue(ctx: &AstContext, e: ExprId) -> bool {
    let mut loc = ctx.expr(e).loc();
    classify_modifiable(ctx, e, &mut loc).is_modifiable()
}

fn classify_kind(ctx: &AstContext, e: ExprId) -> ClassificationKind {
    let mut kind = classify_internal(ctx, e);
    if !ctx.lang.cplusplus {
        let ty = ctx.expr(e).ty();
        if ctx.types.is_function(ty) {
            kind = ClassificationKind::Function;
        } else if ctx.types.is_void(ty) && ty.quals.is_empty() {
            kind = if kind == ClassificationKind::LValue {
                ClassificationKind::AddressableVoid
            } else {
                ClassificationKind::Void
            };
        }
    }
    kind
}

fn classify_temporary(ctx: &AstContext, ty: QualType) -> ClassificationKind {
    if ctx.types.is_record(ty) {
        ClassificationKind::ClassTemporary
    } else if ctx.types.is_array(ty) {
        ClassificationKind::ArrayTemporary
    } else {
        ClassificationKind::PRValue
    }
}

fn classify_value_kind(ctx: &AstContext, e: ExprId) -> ClassificationKind {
    let expr = ctx.expr(e);
    match expr.value_kind() {
        ExprValueKind::LValue => ClassificationKind::LValue,
        ExprValueKind::XValue => ClassificationKind::XValue,
        ExprValueKind::RValue if ctx.lang.cplusplus => classify_temporary(ctx, expr.ty()),
        ExprValueKind::RValue => ClassificationKind::PRValue,
    }
}

/// Category of an unnamed result of type `written` (calls and explicit
/// casts): references decide in C++, everything is a prvalue in C.
fn classify_unnamed(ctx: &AstContext, written: QualType) -> ClassificationKind {
    if !ctx.lang.cplusplus {
        return ClassificationKind::PRValue;
    }
    match ctx.types.kind(ctx.types.canonical(written).ty) {
        TypeKind::LValueReference(_) => ClassificationKind::LValue,
        TypeKind::RValueReference(p) if ctx.types.is_function(*p) => ClassificationKind::LValue,
        TypeKind::RValueReference(_) => ClassificationKind::XValue,
        _ => classify_temporary(ctx, written),
    }
}

fn classify_decl(ctx: &AstContext, decl: DeclId) -> ClassificationKind {
    let d = ctx.decl(decl);
    if let Some(m) = d.data.method() {
        return if m.method_flags.contains(crate::decl::MethodFlags::STATIC) {
            ClassificationKind::LValue
        } else {
            ClassificationKind::MemberFunction
        };
    }
    let is_lvalue = match &d.data {
        DeclData::NonTypeTemplateParm(p) => {
            let ty = p.declarator.value.ty;
            ctx.types.is_reference_type(ty) || ctx.types.is_record(ty)
        }
        DeclData::Var(_) | DeclData::ParmVar(_) | DeclData::Field(_) => true,
        DeclData::Function(_) | DeclData::FunctionTemplate(_) => ctx.lang.cplusplus,
        _ => false,
    };
    if is_lvalue {
        ClassificationKind::LValue
    } else {
        ClassificationKind::PRValue
    }
}

fn classify_internal(ctx: &AstContext, e: ExprId) -> ClassificationKind {
    let lang = &ctx.lang;
    let expr = ctx.expr(e);
    match &expr.kind {
        ExprKind::StringLiteral { .. } | ExprKind::Predefined { .. } => ClassificationKind::LValue,
        ExprKind::CompoundLiteral { .. } => {
            if lang.cplusplus {
                classify_temporary(ctx, expr.ty())
            } else {
                ClassificationKind::LValue
            }
        }

        ExprKind::IntegerLiteral { .. }
        | ExprKind::CharacterLiteral { .. }
        | ExprKind::FloatingLiteral { .. }
        | ExprKind::BoolLiteral { .. }
        | ExprKind::NullPtrLiteral
        | ExprKind::ImplicitValueInit
        | ExprKind::UnaryExprOrTypeTrait { .. }
        | ExprKind::AddrLabel { .. }
        | ExprKind::This { .. }
        | ExprKind::SizeOfPack { .. }
        | ExprKind::ObjCSelector { .. }
        | ExprKind::Atomic { .. }
        | ExprKind::ShuffleVector { .. }
        | ExprKind::ConvertVector { .. } => ClassificationKind::PRValue,

        ExprKind::Paren { sub, .. } => classify_internal(ctx, *sub),
        ExprKind::GenericSelection { .. } => match ctx.generic_result(e) {
            Some(r) => classify_internal(ctx, r),
            None => ClassificationKind::PRValue,
        },
        ExprKind::Choose {
            lhs, rhs, cond_true, ..
        } => classify_internal(ctx, if *cond_true { *lhs } else { *rhs }),
        ExprKind::DesignatedInit { .. } => classify_internal(ctx, ctx.designated_init_value(e)),
        ExprKind::DefaultArg { param } => match &ctx.decl(*param).data {
            DeclData::ParmVar(p) => match p.default_arg {
                Some(d) => classify_internal(ctx, d),
                None => classify_value_kind(ctx, e),
            },
            _ => classify_value_kind(ctx, e),
        },
        ExprKind::PackExpansion { pattern, .. } => classify_internal(ctx, *pattern),

        ExprKind::Binary { op, lhs, rhs } => {
            if !lang.cplusplus {
                return ClassificationKind::PRValue;
            }
            match op {
                _ if op.is_assignment() => ClassificationKind::LValue,
                BinaryOp::Comma => classify_internal(ctx, *rhs),
                BinaryOp::PtrMemD if ctx.types.is_function(expr.ty()) => {
                    ClassificationKind::MemberFunction
                }
                BinaryOp::PtrMemD => classify_internal(ctx, *lhs),
                BinaryOp::PtrMemI if ctx.types.is_function(expr.ty()) => {
                    ClassificationKind::MemberFunction
                }
                BinaryOp::PtrMemI => ClassificationKind::LValue,
                _ => ClassificationKind::PRValue,
            }
        }
        ExprKind::CompoundAssign { .. } => {
            if lang.cplusplus {
                ClassificationKind::LValue
            } else {
                ClassificationKind::PRValue
            }
        }

        ExprKind::OpaqueValue { .. } | ExprKind::ImplicitCast(_) => classify_value_kind(ctx, e),

        ExprKind::Unary { op, sub } => match op {
            UnaryOp::Deref => ClassificationKind::LValue,
            UnaryOp::Extension => classify_internal(ctx, *sub),
            UnaryOp::Real | UnaryOp::Imag => {
                let k = classify_internal(ctx, ctx.ignore_parens(*sub));
                if k != ClassificationKind::LValue {
                    return k;
                }
                if ctx.expr(*sub).object_kind() == ExprObjectKind::PropertySetter {
                    return ClassificationKind::SubObjCPropertySetting;
                }
                ClassificationKind::LValue
            }
            UnaryOp::PreInc | UnaryOp::PreDec if lang.cplusplus => ClassificationKind::LValue,
            _ => ClassificationKind::PRValue,
        },

        ExprKind::ArraySubscript { lhs, .. } => {
            if ctx.types.is_vector(ctx.expr(*lhs).ty()) {
                classify_internal(ctx, *lhs)
            } else {
                ClassificationKind::LValue
            }
        }

        ExprKind::DeclRef(d) => classify_decl(ctx, d.decl),
        ExprKind::Member(m) => classify_member(ctx, m.base, m.member, m.is_arrow),

        ExprKind::Conditional { lhs, rhs, .. } => {
            if !lang.cplusplus {
                return ClassificationKind::PRValue;
            }
            if ctx.types.is_void(ctx.expr(*lhs).ty()) || ctx.types.is_void(ctx.expr(*rhs).ty()) {
                return ClassificationKind::PRValue;
            }
            let l = classify_internal(ctx, *lhs);
            if l == classify_internal(ctx, *rhs) {
                l
            } else {
                ClassificationKind::PRValue
            }
        }

        ExprKind::Call(c) | ExprKind::MemberCall(c) | ExprKind::OperatorCall { call: c, .. } => {
            classify_unnamed(ctx, call_return_type(ctx, c.callee, expr.ty()))
        }
        ExprKind::ExplicitCast { written, .. } => classify_unnamed(ctx, *written),
        ExprKind::VAArg { written, .. } => classify_unnamed(ctx, *written),

        ExprKind::ExtVectorElement { base, .. } => {
            if contains_duplicate_elements(ctx, e) {
                ClassificationKind::DuplicateVectorComponents
            } else if ctx.types.is_pointer(ctx.expr(*base).ty()) {
                ClassificationKind::LValue
            } else {
                classify_internal(ctx, *base)
            }
        }

        ExprKind::StmtExpr { body } => {
            let last = ctx.compound_body(*body).last().and_then(|&s| match ctx.stmt(s).kind {
                crate::stmt::StmtKind::Expr(x) => Some(x),
                _ => None,
            });
            match last {
                Some(x) => classify_unnamed(ctx, ctx.expr(x).ty()),
                None => ClassificationKind::PRValue,
            }
        }

        ExprKind::MaterializeTemporary { .. } => {
            if expr.value_kind() == ExprValueKind::LValue {
                ClassificationKind::LValue
            } else {
                ClassificationKind::XValue
            }
        }

        ExprKind::InitList { .. } => {
            if expr.is_prvalue() {
                ClassificationKind::PRValue
            } else {
                match ctx.inits(e) {
                    [single] => classify_internal(ctx, *single),
                    _ => classify_value_kind(ctx, e),
                }
            }
        }

        ExprKind::Construct { .. } => {
            if lang.cplusplus {
                classify_temporary(ctx, expr.ty())
            } else {
                ClassificationKind::PRValue
            }
        }
    }
}

/// Declared return type of the callee, references kept.
fn call_return_type(ctx: &AstContext, callee: ExprId, fallback: QualType) -> QualType {
    let ty = ctx.expr(callee).ty();
    let fn_ty = if ctx.types.is_function(ty) {
        Some(ty)
    } else {
        ctx.types.pointee(ty)
    };
    fn_ty
        .and_then(|f| ctx.types.function_result(f))
        .unwrap_or(fallback)
}

fn classify_member(
    ctx: &AstContext,
    base: ExprId,
    member: DeclId,
    is_arrow: bool,
) -> ClassificationKind {
    if !ctx.lang.cplusplus {
        if is_arrow {
            return ClassificationKind::LValue;
        }
        let base = ctx.ignore_parens(base);
        if ctx.expr(base).object_kind() == ExprObjectKind::PropertySetter {
            return ClassificationKind::SubObjCPropertySetting;
        }
        return classify_internal(ctx, base);
    }

    let m = ctx.decl(member);
    if let Some(ty) = m.value_type() {
        if ctx.types.is_reference_type(ty) {
            return ClassificationKind::LValue;
        }
    }
    match &m.data {
        DeclData::Var(_) => ClassificationKind::LValue,
        DeclData::Field(_) => {
            if is_arrow {
                return ClassificationKind::LValue;
            }
            if ctx.expr(ctx.ignore_paren_imp_casts(base)).object_kind()
                == ExprObjectKind::PropertySetter
            {
                return ClassificationKind::SubObjCPropertySetting;
            }
            classify_internal(ctx, base)
        }
        data => match data.method() {
            Some(method) if method.method_flags.contains(crate::decl::MethodFlags::STATIC) => {
                ClassificationKind::LValue
            }
            Some(_) => ClassificationKind::MemberFunction,
            None => ClassificationKind::PRValue,
        },
    }
}

/// Whether a swizzle names some component more than once.
pub fn contains_duplicate_elements(ctx: &AstContext, e: ExprId) -> bool {
    let ExprKind::ExtVectorElement { accessor, .. } = &ctx.expr(e).kind else {
        return false;
    };
    let name = ctx.idents.as_str(*accessor);
    if matches!(name, "hi" | "lo" | "even" | "odd") {
        return false;
    }
    let hex = name.strip_prefix('s').or_else(|| name.strip_prefix('S'));
    let indices: Vec<u32> = if let Some(hex) = hex {
        hex.chars().filter_map(|c| c.to_digit(16)).collect()
    } else {
        name.chars()
            .filter_map(|c| match c {
                'x' | 'r' => Some(0),
                'y' | 'g' => Some(1),
                'z' | 'b' => Some(2),
                'w' | 'a' => Some(3),
                _ => None,
            })
            .collect()
    };
    let mut seen = 0u32;
    for i in indices {
        if seen & (1 << i) != 0 {
            return true;
        }
        seen |= 1 << i;
    }
    false
}

fn modifiability(
    ctx: &AstContext,
    e: ExprId,
    kind: ClassificationKind,
    loc: &mut SourceLocation,
) -> Modifiable {
    if kind == ClassificationKind::PRValue {
        let inner = ctx.ignore_parens(e);
        if let ExprKind::ExplicitCast { cast, .. } = &ctx.expr(inner).kind {
            let sub = ctx.ignore_paren_imp_casts(cast.sub);
            if classify(ctx, sub).is_lvalue() {
                if ctx.lang.lvalue_cast_extension {
                    return Modifiable::Modifiable;
                }
                *loc = ctx.expr(inner).loc();
                return Modifiable::LValueCast;
            }
        }
    }
    if kind != ClassificationKind::LValue {
        return Modifiable::RValue;
    }

    let expr = ctx.expr(e);
    let ty = ctx.types.canonical(expr.ty());
    if ctx.lang.cplusplus && ctx.types.is_function(ty) {
        return Modifiable::Function;
    }
    if expr.object_kind() == ExprObjectKind::PropertySetter && ty.is_const_qualified() {
        // A read-only property has no setter to assign through.
        return Modifiable::NoSetterProperty;
    }
    if ty.is_const_qualified() {
        return Modifiable::ConstQualified;
    }
    if ctx.types.is_array(ty) {
        return Modifiable::ArrayType;
    }
    if ctx.types.is_function(ty) || ctx.is_incomplete_type(ty) {
        return Modifiable::IncompleteType;
    }
    if let Some(record) = ctx.types.as_record(ty) {
        if ctx
            .record_definition(record)
            .is_some_and(|d| d.flags.contains(DefinitionFlags::HAS_CONST_FIELDS))
        {
            return Modifiable::ConstQualified;
        }
    }
    Modifiable::Modifiable
}

#[cfg(test)]
mod tests;
