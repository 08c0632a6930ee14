//! Strict integer-constant-expression checking.
//!
//! This is a structural walk separate from folding: an expression can
//! fold to a constant and still not be an ICE (`(int)&x`, a call to a
//! builtin, a comma in C++). Only after the walk accepts the expression
//! is it folded for its value.

use cx_stack::ensure_sufficient_stack;

use crate::apvalue::ApsInt;
use crate::decl::{DeclData, VarFlags};
use crate::diag::DiagKind;
use crate::evaluate::evaluate_as_int;
use crate::expr::{BinaryOp, CastKind, ExprKind, UnaryOp};
use crate::source::SourceLocation;
use crate::types::TypeKind;
use crate::{AstContext, ExprId, QualType};

/// How close an expression is to being an ICE. Ordered from best to
/// worst.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum IceKind {
    Ice,
    /// An ICE only if the offending part is never evaluated (C99 comma
    /// operators, division by zero in an untaken branch).
    IceIfUnevaluated,
    NotIce,
}

/// Why an expression is not an ICE, and where.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct IceDiag {
    pub kind: IceKind,
    pub loc: SourceLocation,
    pub reason: DiagKind,
}

impl IceDiag {
    const OK: IceDiag = IceDiag {
        kind: IceKind::Ice,
        loc: SourceLocation::INVALID,
        reason: DiagKind::NotConstant,
    };

    fn new(kind: IceKind, loc: SourceLocation, reason: DiagKind) -> Self {
        IceDiag { kind, loc, reason }
    }

    fn worst(self, other: IceDiag) -> IceDiag {
        if other.kind > self.kind {
            other
        } else {
            self
        }
    }
}

/// Value of `e` if it is an integer constant expression.
pub fn is_integer_constant_expr(ctx: &AstContext, e: ExprId) -> Result<ApsInt, IceDiag> {
    let diag = check_ice(ctx, e);
    if diag.kind != IceKind::Ice {
        return Err(diag);
    }
    let loc = ctx.expr(e).loc();
    evaluate_as_int(ctx, e).ok_or(IceDiag::new(IceKind::NotIce, loc, DiagKind::NotConstant))
}

/// Structural ICE check of `e`.
pub fn check_ice(ctx: &AstContext, e: ExprId) -> IceDiag {
    ensure_sufficient_stack(|| check(ctx, e))
}

fn is_integral_or_enum(ctx: &AstContext, qt: QualType) -> bool {
    ctx.types.is_integer_type(qt)
        || matches!(ctx.types.kind(ctx.types.canonical(qt).ty), TypeKind::Enum(_))
}

fn check(ctx: &AstContext, e: ExprId) -> IceDiag {
    let expr = ctx.expr(e);
    let loc = expr.loc();
    let not_ice = |reason| IceDiag::new(IceKind::NotIce, loc, reason);

    if expr.is_value_dependent() || expr.is_type_dependent() {
        return not_ice(DiagKind::Dependent);
    }
    if !is_integral_or_enum(ctx, expr.ty()) {
        return not_ice(DiagKind::NotIntegral);
    }

    match &expr.kind {
        ExprKind::IntegerLiteral { .. }
        | ExprKind::CharacterLiteral { .. }
        | ExprKind::BoolLiteral { .. }
        | ExprKind::UnaryExprOrTypeTrait { .. }
        | ExprKind::SizeOfPack { .. } => IceDiag::OK,

        ExprKind::Paren { sub, .. } => check_ice(ctx, *sub),
        ExprKind::GenericSelection { .. } => match ctx.generic_result(e) {
            Some(r) => check_ice(ctx, r),
            None => not_ice(DiagKind::Dependent),
        },
        ExprKind::Choose {
            cond,
            lhs,
            rhs,
            cond_true,
        } => {
            let c = check_ice(ctx, *cond);
            if c.kind == IceKind::NotIce {
                return c;
            }
            c.worst(check_ice(ctx, if *cond_true { *lhs } else { *rhs }))
        }

        ExprKind::DeclRef(d) => match &ctx.decl(d.decl).data {
            DeclData::EnumConstant(_) | DeclData::NonTypeTemplateParm(_) => IceDiag::OK,
            DeclData::Var(v) => {
                // C++ [expr.const]: a const integral variable initialized
                // with a constant expression.
                let ty = v.declarator.value.ty;
                let usable = ctx.lang.cplusplus
                    && (ty.is_const_qualified() || v.flags.contains(VarFlags::CONSTEXPR));
                match v.init {
                    Some(init) if usable => {
                        let r = check_ice(ctx, init);
                        if r.kind == IceKind::Ice {
                            r
                        } else {
                            not_ice(DiagKind::ReadOfNonConstVariable)
                        }
                    }
                    _ => not_ice(DiagKind::ReadOfNonConstVariable),
                }
            }
            _ => not_ice(DiagKind::NotConstant),
        },

        ExprKind::Unary { op, sub } => match op {
            UnaryOp::PostInc
            | UnaryOp::PostDec
            | UnaryOp::PreInc
            | UnaryOp::PreDec
            | UnaryOp::AddrOf
            | UnaryOp::Deref => not_ice(DiagKind::NotConstant),
            UnaryOp::Extension
            | UnaryOp::LNot
            | UnaryOp::Plus
            | UnaryOp::Minus
            | UnaryOp::Not
            | UnaryOp::Real
            | UnaryOp::Imag => check_ice(ctx, *sub),
        },

        ExprKind::Binary { op, lhs, rhs } => check_binary(ctx, e, *op, *lhs, *rhs),
        ExprKind::CompoundAssign { .. } => not_ice(DiagKind::SideEffects),

        ExprKind::Conditional { cond, lhs, rhs } => {
            let c = check_ice(ctx, *cond);
            if c.kind == IceKind::NotIce {
                return c;
            }
            let t = check_ice(ctx, *lhs);
            let f = check_ice(ctx, *rhs);
            if t.kind == IceKind::NotIce {
                return t;
            }
            if f.kind == IceKind::NotIce {
                return f;
            }
            if c.kind == IceKind::IceIfUnevaluated {
                return c;
            }
            if t.kind == IceKind::Ice && f.kind == IceKind::Ice {
                return IceDiag::OK;
            }
            // Only the taken branch decides.
            match evaluate_as_int(ctx, *cond) {
                Some(v) if v.is_zero() => f,
                _ => t,
            }
        }

        ExprKind::ImplicitCast(c) | ExprKind::ExplicitCast { cast: c, .. } => {
            let sub = ctx.expr(c.sub);
            let explicit = matches!(expr.kind, ExprKind::ExplicitCast { .. });
            if explicit
                && c.kind == CastKind::FloatingToIntegral
                && matches!(
                    ctx.expr(ctx.ignore_paren_imp_casts(c.sub)).kind,
                    ExprKind::FloatingLiteral { .. }
                )
            {
                // `(int)3.5` is allowed.
                return IceDiag::OK;
            }
            match c.kind {
                CastKind::NoOp
                | CastKind::LValueToRValue
                | CastKind::IntegralCast
                | CastKind::IntegralToBoolean
                | CastKind::AtomicToNonAtomic
                | CastKind::NonAtomicToAtomic => {}
                CastKind::FloatingToIntegral | CastKind::FloatingToBoolean => {
                    return not_ice(DiagKind::FloatInIce);
                }
                _ => return not_ice(DiagKind::InvalidCastInIce),
            }
            if !is_integral_or_enum(ctx, sub.ty()) {
                return not_ice(DiagKind::InvalidCastInIce);
            }
            check_ice(ctx, c.sub)
        }

        ExprKind::Call(_) | ExprKind::MemberCall(_) | ExprKind::OperatorCall { .. } => {
            not_ice(DiagKind::NonConstexprCall)
        }
        ExprKind::DefaultArg { param } => match &ctx.decl(*param).data {
            DeclData::ParmVar(p) => match p.default_arg {
                Some(d) => check_ice(ctx, d),
                None => not_ice(DiagKind::NotConstant),
            },
            _ => not_ice(DiagKind::NotConstant),
        },
        _ => not_ice(DiagKind::NotConstant),
    }
}

fn check_binary(ctx: &AstContext, e: ExprId, op: BinaryOp, lhs: ExprId, rhs: ExprId) -> IceDiag {
    let loc = ctx.expr(e).loc();
    if op.is_assignment() {
        return IceDiag::new(IceKind::NotIce, loc, DiagKind::SideEffects);
    }
    if op.is_ptr_mem() {
        return IceDiag::new(IceKind::NotIce, loc, DiagKind::NotConstant);
    }

    let l = check_ice(ctx, lhs);
    let r = check_ice(ctx, rhs);

    match op {
        BinaryOp::Comma => {
            if ctx.lang.c99 && !ctx.lang.cplusplus {
                if l.kind == IceKind::Ice && r.kind == IceKind::Ice {
                    return IceDiag::new(IceKind::IceIfUnevaluated, loc, DiagKind::CommaInIce);
                }
                l.worst(r)
            } else {
                IceDiag::new(IceKind::NotIce, loc, DiagKind::CommaInIce)
            }
        }
        BinaryOp::Div | BinaryOp::Rem => {
            let worst = l.worst(r);
            if worst.kind != IceKind::Ice {
                return worst;
            }
            let Some(divisor) = evaluate_as_int(ctx, rhs) else {
                return IceDiag::new(IceKind::NotIce, loc, DiagKind::NotConstant);
            };
            if divisor.is_zero() {
                return IceDiag::new(IceKind::IceIfUnevaluated, loc, DiagKind::DivideByZero);
            }
            if divisor.signed && divisor.value == -1 {
                if let Some(dividend) = evaluate_as_int(ctx, lhs) {
                    if dividend.is_min_signed() {
                        return IceDiag::new(IceKind::IceIfUnevaluated, loc, DiagKind::NotConstant);
                    }
                }
            }
            IceDiag::OK
        }
        BinaryOp::LAnd | BinaryOp::LOr => {
            if l.kind == IceKind::NotIce {
                return l;
            }
            if l.kind == IceKind::Ice && r.kind != IceKind::Ice {
                // A right operand that is never evaluated does not count.
                if let Some(v) = evaluate_as_int(ctx, lhs) {
                    let short_circuits = (op == BinaryOp::LAnd) == v.is_zero();
                    if short_circuits {
                        return l;
                    }
                }
            }
            l.worst(r)
        }
        _ => l.worst(r),
    }
}

#[cfg(test)]
mod tests;
