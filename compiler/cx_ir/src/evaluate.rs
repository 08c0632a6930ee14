//! Permissive constant folding.
//!
//! [`evaluate`] folds whatever it can: it looks through casts, folds
//! arithmetic on integers, floats and simple pointer offsets, and keeps
//! going past operands with side effects when the result does not depend
//! on them (the left side of a comma). The strict integer-constant
//! check lives in [`crate::ice`].

use cx_stack::ensure_sufficient_stack;

use crate::apvalue::{APValue, ApsInt, LValueBase};
use crate::decl::DeclData;
use crate::diag::{DiagKind, PartialDiagnostic};
use crate::expr::{BinaryOp, CastKind, ExprKind, TraitArg, UnaryOp, UnaryTrait};
use crate::types::{BuiltinKind, TypeKind};
use crate::{AstContext, ExprId, QualType};

/// Outcome of [`evaluate`].
#[derive(Clone, PartialEq, Debug, Default)]
pub struct EvalResult {
    pub value: Option<APValue>,
    /// Some part of the expression would have side effects when run.
    pub has_side_effects: bool,
    /// Why evaluation stopped, when it did.
    pub diag: Option<PartialDiagnostic>,
}

/// Width and signedness of an integral (or pointer) type.
pub(crate) fn int_format(ctx: &AstContext, qt: QualType) -> (u32, bool) {
    let t = &ctx.target;
    let qt = ctx.types.canonical(qt);
    match ctx.types.kind(qt.ty) {
        TypeKind::Builtin(b) => match b {
            BuiltinKind::Bool => (1, false),
            BuiltinKind::Char => (t.char_width, t.char_is_signed),
            BuiltinKind::SChar => (t.char_width, true),
            BuiltinKind::UChar => (t.char_width, false),
            BuiltinKind::Short => (t.short_width, true),
            BuiltinKind::UShort => (t.short_width, false),
            BuiltinKind::Int => (t.int_width, true),
            BuiltinKind::UInt => (t.int_width, false),
            BuiltinKind::Long => (t.long_width, true),
            BuiltinKind::ULong => (t.long_width, false),
            BuiltinKind::LongLong => (t.long_long_width, true),
            BuiltinKind::ULongLong => (t.long_long_width, false),
            _ => (t.pointer_width, false),
        },
        TypeKind::Enum(d) => match &ctx.decl(*d).data {
            DeclData::Enum(e) if !e.integer_type.is_null() => int_format(ctx, e.integer_type),
            _ => (t.int_width, true),
        },
        _ => (t.pointer_width, false),
    }
}

/// Fold `e` as far as possible.
pub fn evaluate(ctx: &AstContext, e: ExprId) -> EvalResult {
    let mut ev = Evaluator {
        ctx,
        side_effects: false,
        diag: None,
    };
    let value = ev.eval(e);
    EvalResult {
        value,
        has_side_effects: ev.side_effects,
        diag: ev.diag,
    }
}

/// Integer value of `e`, if it folds without side effects.
pub fn evaluate_as_int(ctx: &AstContext, e: ExprId) -> Option<ApsInt> {
    let r = evaluate(ctx, e);
    if r.has_side_effects {
        return None;
    }
    r.value?.as_int()
}

/// Truth value of `e` used as a condition.
pub fn evaluate_as_boolean_condition(ctx: &AstContext, e: ExprId) -> Option<bool> {
    let r = evaluate(ctx, e);
    if r.has_side_effects {
        return None;
    }
    r.value?.to_bool()
}

/// Whether `e` folds to a value without side effects.
pub fn is_evaluatable(ctx: &AstContext, e: ExprId) -> bool {
    let r = evaluate(ctx, e);
    r.value.is_some() && !r.has_side_effects
}

struct Evaluator<'a> {
    ctx: &'a AstContext,
    side_effects: bool,
    diag: Option<PartialDiagnostic>,
}

impl Evaluator<'_> {
    fn fail(&mut self, kind: DiagKind, e: ExprId) -> Option<APValue> {
        if self.diag.is_none() {
            self.diag = Some(PartialDiagnostic::new(kind, self.ctx.expr(e).loc()));
        }
        None
    }

    fn side_effect(&mut self, e: ExprId) -> Option<APValue> {
        self.side_effects = true;
        self.fail(DiagKind::SideEffects, e)
    }

    fn int_of(&self, value: i128, qt: QualType) -> APValue {
        let (width, signed) = int_format(self.ctx, qt);
        APValue::Int(ApsInt::new(value, width, signed))
    }

    fn eval(&mut self, e: ExprId) -> Option<APValue> {
        ensure_sufficient_stack(|| self.eval_inner(e))
    }

    fn eval_inner(&mut self, e: ExprId) -> Option<APValue> {
        let ctx = self.ctx;
        let expr = ctx.expr(e);
        if expr.is_value_dependent() || expr.is_type_dependent() {
            return self.fail(DiagKind::Dependent, e);
        }
        let ty = expr.ty();
        match &expr.kind {
            ExprKind::IntegerLiteral { value } => Some(self.int_of(i128::from(*value), ty)),
            ExprKind::CharacterLiteral { value, .. } => Some(self.int_of(i128::from(*value), ty)),
            ExprKind::BoolLiteral { value } => Some(self.int_of(i128::from(*value), ty)),
            ExprKind::FloatingLiteral { value, .. } => Some(APValue::Float(*value)),
            ExprKind::NullPtrLiteral => Some(APValue::LValue {
                base: LValueBase::Null,
                offset: 0,
            }),
            ExprKind::StringLiteral { .. } | ExprKind::CompoundLiteral { .. } => {
                Some(APValue::LValue {
                    base: LValueBase::Expr(e),
                    offset: 0,
                })
            }
            ExprKind::Paren { sub, .. } => self.eval(*sub),
            ExprKind::Choose {
                lhs, rhs, cond_true, ..
            } => self.eval(if *cond_true { *lhs } else { *rhs }),
            ExprKind::GenericSelection { .. } => match ctx.generic_result(e) {
                Some(r) => self.eval(r),
                None => self.fail(DiagKind::Dependent, e),
            },
            ExprKind::DeclRef(d) => self.eval_decl_ref(e, d.decl),
            ExprKind::Unary { op, sub } => self.eval_unary(e, *op, *sub),
            ExprKind::Binary { op, lhs, rhs } => self.eval_binary(e, *op, *lhs, *rhs),
            ExprKind::CompoundAssign { .. } => self.side_effect(e),
            ExprKind::Conditional { cond, lhs, rhs } => {
                let c = self.eval(*cond)?.to_bool()?;
                self.eval(if c { *lhs } else { *rhs })
            }
            ExprKind::ImplicitCast(c) | ExprKind::ExplicitCast { cast: c, .. } => {
                self.eval_cast(e, c.kind, c.sub, ty)
            }
            ExprKind::UnaryExprOrTypeTrait { kind, arg } => self.eval_trait(e, *kind, *arg),
            ExprKind::Call(_) | ExprKind::MemberCall(_) | ExprKind::OperatorCall { .. } => {
                self.side_effects = true;
                self.fail(DiagKind::NonConstexprCall, e)
            }
            ExprKind::SizeOfPack {
                length: Some(n), ..
            } => Some(self.int_of(i128::from(*n), ty)),
            ExprKind::ImplicitValueInit => self.zero_of(e, ty),
            ExprKind::OpaqueValue { source: Some(s) } => self.eval(*s),
            ExprKind::MaterializeTemporary { sub, .. } => self.eval(*sub),
            ExprKind::DefaultArg { param } => match &ctx.decl(*param).data {
                DeclData::ParmVar(p) => match p.default_arg {
                    Some(d) => self.eval(d),
                    None => self.fail(DiagKind::NotConstant, e),
                },
                _ => self.fail(DiagKind::NotConstant, e),
            },
            ExprKind::InitList { .. } => self.eval_init_list(e, ty),
            _ => self.fail(DiagKind::NotConstant, e),
        }
    }

    fn zero_of(&mut self, e: ExprId, ty: QualType) -> Option<APValue> {
        let types = &self.ctx.types;
        if types.is_integer_type(ty) {
            Some(self.int_of(0, ty))
        } else if types.is_real_floating(ty) {
            Some(APValue::Float(0.0))
        } else if types.is_pointer(ty) {
            Some(APValue::LValue {
                base: LValueBase::Null,
                offset: 0,
            })
        } else {
            self.fail(DiagKind::NotConstant, e)
        }
    }

    fn eval_init_list(&mut self, e: ExprId, ty: QualType) -> Option<APValue> {
        let inits = self.ctx.inits(e);
        if self.ctx.types.is_vector(ty) {
            let mut elems = Vec::with_capacity(inits.len());
            for &i in inits {
                elems.push(self.eval(i)?);
            }
            return Some(APValue::Vector(elems));
        }
        match inits {
            [] => self.zero_of(e, ty),
            [single] if self.ctx.types.is_scalar_type(ty) => self.eval(*single),
            _ => self.fail(DiagKind::NotConstant, e),
        }
    }

    fn eval_decl_ref(&mut self, e: ExprId, decl: crate::DeclId) -> Option<APValue> {
        let ctx = self.ctx;
        let d = ctx.decl(decl);
        match &d.data {
            DeclData::EnumConstant(c) => {
                Some(self.int_of(i128::from(c.int_value), ctx.expr(e).ty()))
            }
            _ if d.class().is_function() => Some(APValue::LValue {
                base: LValueBase::Decl(decl),
                offset: 0,
            }),
            DeclData::Var(_) | DeclData::ParmVar(_) => {
                let Some(var) = d.data.var() else {
                    return self.fail(DiagKind::NotConstant, e);
                };
                let ty = var.declarator.value.ty;
                let readable = ty.is_const_qualified()
                    || var.flags.contains(crate::decl::VarFlags::CONSTEXPR);
                match var.init {
                    Some(init) if readable => self.eval(init),
                    _ => self.fail(DiagKind::ReadOfNonConstVariable, e),
                }
            }
            _ => self.fail(DiagKind::NotConstant, e),
        }
    }

    /// Evaluate `e` as an lvalue: the object it designates.
    fn eval_lvalue(&mut self, e: ExprId) -> Option<APValue> {
        let ctx = self.ctx;
        match &ctx.expr(e).kind {
            ExprKind::DeclRef(d) => Some(APValue::LValue {
                base: LValueBase::Decl(d.decl),
                offset: 0,
            }),
            ExprKind::StringLiteral { .. } | ExprKind::CompoundLiteral { .. } => {
                Some(APValue::LValue {
                    base: LValueBase::Expr(e),
                    offset: 0,
                })
            }
            ExprKind::Paren { sub, .. } => self.eval_lvalue(*sub),
            ExprKind::Unary {
                op: UnaryOp::Deref,
                sub,
            } => self.eval(*sub),
            ExprKind::ArraySubscript { lhs, rhs, .. } => {
                let base = self.eval(*lhs)?;
                let index = self.eval(*rhs)?.as_int()?;
                let elem = ctx.type_size(ctx.expr(e).ty());
                offset_lvalue(base, index.value, elem)
            }
            _ => self.fail(DiagKind::NotConstant, e),
        }
    }

    fn eval_unary(&mut self, e: ExprId, op: UnaryOp, sub: ExprId) -> Option<APValue> {
        let ty = self.ctx.expr(e).ty();
        match op {
            UnaryOp::PostInc | UnaryOp::PostDec | UnaryOp::PreInc | UnaryOp::PreDec => {
                self.side_effect(e)
            }
            UnaryOp::AddrOf => self.eval_lvalue(sub),
            UnaryOp::Deref => self.fail(DiagKind::NotConstant, e),
            UnaryOp::Extension | UnaryOp::Plus | UnaryOp::Real => self.eval(sub),
            UnaryOp::Imag => match self.eval(sub)? {
                APValue::Int(_) => Some(self.int_of(0, ty)),
                APValue::Float(_) => Some(APValue::Float(0.0)),
                _ => self.fail(DiagKind::NotConstant, e),
            },
            UnaryOp::Minus => match self.eval(sub)? {
                APValue::Int(i) => Some(APValue::Int(i.wrapping_neg())),
                APValue::Float(f) => Some(APValue::Float(-f)),
                _ => self.fail(DiagKind::NotConstant, e),
            },
            UnaryOp::Not => match self.eval(sub)? {
                APValue::Int(i) => Some(APValue::Int(i.not())),
                _ => self.fail(DiagKind::NotConstant, e),
            },
            UnaryOp::LNot => {
                let b = self.eval(sub)?.to_bool()?;
                Some(self.int_of(i128::from(!b), ty))
            }
        }
    }

    fn eval_binary(
        &mut self,
        e: ExprId,
        op: BinaryOp,
        lhs: ExprId,
        rhs: ExprId,
    ) -> Option<APValue> {
        let ty = self.ctx.expr(e).ty();
        match op {
            BinaryOp::Comma => {
                // The left operand only matters for its side effects.
                if self.eval(lhs).is_none() {
                    self.side_effects = true;
                    self.diag = None;
                }
                return self.eval(rhs);
            }
            BinaryOp::LAnd | BinaryOp::LOr => {
                let l = self.eval(lhs)?.to_bool()?;
                if l == (op == BinaryOp::LOr) {
                    return Some(self.int_of(i128::from(l), ty));
                }
                let r = self.eval(rhs)?.to_bool()?;
                return Some(self.int_of(i128::from(r), ty));
            }
            _ if op.is_assignment() => return self.side_effect(e),
            BinaryOp::PtrMemD | BinaryOp::PtrMemI => return self.fail(DiagKind::NotConstant, e),
            _ => {}
        }

        let l = self.eval(lhs)?;
        let r = self.eval(rhs)?;
        match (l, r) {
            (APValue::Int(a), APValue::Int(b)) => self.int_binary(e, op, a, b, ty),
            (APValue::Float(a), APValue::Float(b)) => self.float_binary(e, op, a, b, ty),
            (base @ APValue::LValue { .. }, APValue::Int(i))
                if matches!(op, BinaryOp::Add | BinaryOp::Sub) =>
            {
                let delta = if op == BinaryOp::Sub { -i.value } else { i.value };
                let elem = self.pointee_size(ty)?;
                offset_lvalue(base, delta, elem)
            }
            (APValue::Int(i), base @ APValue::LValue { .. }) if op == BinaryOp::Add => {
                let elem = self.pointee_size(self.ctx.expr(rhs).ty())?;
                offset_lvalue(base, i.value, elem)
            }
            (
                APValue::LValue {
                    base: b1,
                    offset: o1,
                },
                APValue::LValue {
                    base: b2,
                    offset: o2,
                },
            ) if b1 == b2 => match op {
                BinaryOp::Eq => Some(self.int_of(i128::from(o1 == o2), ty)),
                BinaryOp::Ne => Some(self.int_of(i128::from(o1 != o2), ty)),
                BinaryOp::Sub => {
                    let elem = self.pointee_size(self.ctx.expr(lhs).ty())?;
                    let elem = i64::try_from(elem).ok().filter(|&s| s > 0)?;
                    Some(self.int_of(i128::from((o1 - o2) / elem), ty))
                }
                _ => self.fail(DiagKind::NotConstant, e),
            },
            _ => self.fail(DiagKind::NotConstant, e),
        }
    }

    fn pointee_size(&self, ptr: QualType) -> Option<u64> {
        let types = &self.ctx.types;
        let pointee = types.pointee(ptr)?;
        if types.is_void(pointee) || types.is_function(pointee) {
            // GNU arithmetic on void and function pointers steps by one.
            return Some(1);
        }
        if self.ctx.is_incomplete_type(pointee) {
            return None;
        }
        Some(self.ctx.type_size(pointee))
    }

    fn int_binary(
        &mut self,
        e: ExprId,
        op: BinaryOp,
        a: ApsInt,
        b: ApsInt,
        ty: QualType,
    ) -> Option<APValue> {
        let v = match op {
            BinaryOp::Mul => a.wrapping_mul(b),
            BinaryOp::Add => a.wrapping_add(b),
            BinaryOp::Sub => a.wrapping_sub(b),
            BinaryOp::Div => match a.checked_div(b) {
                Some(v) => v,
                None => return self.fail(DiagKind::DivideByZero, e),
            },
            BinaryOp::Rem => match a.checked_rem(b) {
                Some(v) => v,
                None => return self.fail(DiagKind::DivideByZero, e),
            },
            BinaryOp::Shl => match a.checked_shl(b) {
                Some(v) => v,
                None => return self.fail(DiagKind::ShiftOutOfRange, e),
            },
            BinaryOp::Shr => match a.checked_shr(b) {
                Some(v) => v,
                None => return self.fail(DiagKind::ShiftOutOfRange, e),
            },
            BinaryOp::And => a.bitand(b),
            BinaryOp::Xor => a.bitxor(b),
            BinaryOp::Or => a.bitor(b),
            BinaryOp::Lt => return Some(self.int_of(i128::from(a.value < b.value), ty)),
            BinaryOp::Gt => return Some(self.int_of(i128::from(a.value > b.value), ty)),
            BinaryOp::Le => return Some(self.int_of(i128::from(a.value <= b.value), ty)),
            BinaryOp::Ge => return Some(self.int_of(i128::from(a.value >= b.value), ty)),
            BinaryOp::Eq => return Some(self.int_of(i128::from(a.value == b.value), ty)),
            BinaryOp::Ne => return Some(self.int_of(i128::from(a.value != b.value), ty)),
            _ => return self.fail(DiagKind::NotConstant, e),
        };
        // Operands are already converted to the result type; re-apply its
        // format so shifts of narrower left operands land correctly.
        let (width, signed) = int_format(self.ctx, ty);
        Some(APValue::Int(v.convert(width, signed)))
    }

    fn float_binary(
        &mut self,
        e: ExprId,
        op: BinaryOp,
        a: f64,
        b: f64,
        ty: QualType,
    ) -> Option<APValue> {
        let v = match op {
            BinaryOp::Mul => a * b,
            BinaryOp::Div => a / b,
            BinaryOp::Add => a + b,
            BinaryOp::Sub => a - b,
            BinaryOp::Lt => return Some(self.int_of(i128::from(a < b), ty)),
            BinaryOp::Gt => return Some(self.int_of(i128::from(a > b), ty)),
            BinaryOp::Le => return Some(self.int_of(i128::from(a <= b), ty)),
            BinaryOp::Ge => return Some(self.int_of(i128::from(a >= b), ty)),
            BinaryOp::Eq => return Some(self.int_of(i128::from(a == b), ty)),
            BinaryOp::Ne => return Some(self.int_of(i128::from(a != b), ty)),
            _ => return self.fail(DiagKind::NotConstant, e),
        };
        Some(APValue::Float(v))
    }

    fn eval_cast(
        &mut self,
        e: ExprId,
        kind: CastKind,
        sub: ExprId,
        ty: QualType,
    ) -> Option<APValue> {
        match kind {
            CastKind::ArrayToPointerDecay | CastKind::FunctionToPointerDecay => {
                self.eval_lvalue(sub)
            }
            CastKind::NullToPointer => Some(APValue::LValue {
                base: LValueBase::Null,
                offset: 0,
            }),
            CastKind::ToVoid => {
                self.eval(sub)?;
                Some(APValue::Void)
            }
            CastKind::LValueToRValue
            | CastKind::NoOp
            | CastKind::BitCast
            | CastKind::AtomicToNonAtomic
            | CastKind::NonAtomicToAtomic => self.eval(sub),
            CastKind::IntegralCast => {
                let i = self.eval(sub)?.as_int()?;
                let (width, signed) = int_format(self.ctx, ty);
                Some(APValue::Int(i.convert(width, signed)))
            }
            CastKind::IntegralToBoolean
            | CastKind::FloatingToBoolean
            | CastKind::PointerToBoolean => {
                let b = self.eval(sub)?.to_bool()?;
                Some(self.int_of(i128::from(b), ty))
            }
            CastKind::IntegralToFloating => {
                let i = self.eval(sub)?.as_int()?;
                Some(APValue::Float(i.value as f64))
            }
            CastKind::FloatingToIntegral => {
                let f = self.eval(sub)?.as_float()?;
                if !f.is_finite() {
                    return self.fail(DiagKind::NotConstant, e);
                }
                Some(self.int_of(f.trunc() as i128, ty))
            }
            CastKind::FloatingCast => {
                let f = self.eval(sub)?.as_float()?;
                let f = if self.ctx.types.builtin_kind(ty) == Some(BuiltinKind::Float) {
                    f64::from(f as f32)
                } else {
                    f
                };
                Some(APValue::Float(f))
            }
            CastKind::IntegralToPointer => {
                let i = self.eval(sub)?.as_int()?;
                Some(APValue::LValue {
                    base: LValueBase::Null,
                    offset: i.to_i64(),
                })
            }
            CastKind::PointerToIntegral => match self.eval(sub)? {
                APValue::LValue {
                    base: LValueBase::Null,
                    offset,
                } => Some(self.int_of(i128::from(offset), ty)),
                _ => self.fail(DiagKind::NotConstant, e),
            },
            CastKind::VectorSplat => {
                let v = self.eval(sub)?;
                let n = self.ctx.types.vector_len(ty)?;
                Some(APValue::Vector(vec![v; n as usize]))
            }
            _ => self.fail(DiagKind::NotConstant, e),
        }
    }

    fn eval_trait(&mut self, e: ExprId, kind: UnaryTrait, arg: TraitArg) -> Option<APValue> {
        let ctx = self.ctx;
        let arg_ty = match arg {
            TraitArg::Type(t) => t,
            TraitArg::Expr(x) => ctx.expr(x).ty(),
        };
        let result_ty = ctx.expr(e).ty();
        if ctx.types.is_dependent(arg_ty) {
            return self.fail(DiagKind::Dependent, e);
        }
        let arg_ty = ctx.types.non_reference_type(arg_ty);
        match kind {
            UnaryTrait::VecStep => {
                let n = ctx.types.vector_len(arg_ty).unwrap_or(1);
                Some(self.int_of(i128::from(n), result_ty))
            }
            UnaryTrait::SizeOf | UnaryTrait::AlignOf => {
                if ctx.types.is_function(arg_ty) || ctx.is_incomplete_type(arg_ty) {
                    return self.fail(DiagKind::NotConstant, e);
                }
                let v = if kind == UnaryTrait::SizeOf {
                    ctx.type_size(arg_ty)
                } else {
                    ctx.type_align(arg_ty)
                };
                Some(self.int_of(i128::from(v), result_ty))
            }
        }
    }
}

fn offset_lvalue(base: APValue, index: i128, elem_size: u64) -> Option<APValue> {
    let APValue::LValue { base, offset } = base else {
        return None;
    };
    let delta = i64::try_from(index).ok()?.checked_mul(i64::try_from(elem_size).ok()?)?;
    Some(APValue::LValue {
        base,
        offset: offset.checked_add(delta)?,
    })
}

#[cfg(test)]
mod tests;
