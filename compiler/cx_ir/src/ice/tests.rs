use pretty_assertions::assert_eq;

use super::*;
use crate::decl::StorageClass;
use crate::expr::{ExplicitCastStyle, ExprValueKind};
use crate::target::{LangOptions, TargetInfo};
use crate::types::TypeId;
use crate::NameRefParts;

fn int() -> QualType {
    TypeId::INT.into()
}

fn lit(ctx: &mut AstContext, v: u64) -> ExprId {
    ctx.create_integer_literal(v, int(), SourceLocation::from_raw(v as u32 + 1))
}

fn bin(ctx: &mut AstContext, op: BinaryOp, l: ExprId, r: ExprId) -> ExprId {
    ctx.create_binary(op, l, r, int(), SourceLocation::from_raw(100))
}

fn c99() -> AstContext {
    AstContext::new(LangOptions::c99(), TargetInfo::default())
}

#[test]
fn literal_arithmetic_is_an_ice() {
    let mut ctx = AstContext::default();
    let a = lit(&mut ctx, 6);
    let b = lit(&mut ctx, 7);
    let product = bin(&mut ctx, BinaryOp::Mul, a, b);
    assert_eq!(is_integer_constant_expr(&ctx, product).map(|v| v.value), Ok(42));
}

#[test]
fn comma_is_ice_if_unevaluated_in_c99() {
    let mut ctx = c99();
    let a = lit(&mut ctx, 1);
    let b = lit(&mut ctx, 2);
    let comma = bin(&mut ctx, BinaryOp::Comma, a, b);
    let diag = check_ice(&ctx, comma);
    assert_eq!(diag.kind, IceKind::IceIfUnevaluated);
    assert_eq!(diag.reason, DiagKind::CommaInIce);
    assert_eq!(diag.loc, SourceLocation::from_raw(100));
    assert!(is_integer_constant_expr(&ctx, comma).is_err());
}

#[test]
fn comma_is_never_an_ice_in_cplusplus() {
    let mut ctx = AstContext::default();
    let a = lit(&mut ctx, 1);
    let b = lit(&mut ctx, 2);
    let comma = bin(&mut ctx, BinaryOp::Comma, a, b);
    assert_eq!(check_ice(&ctx, comma).kind, IceKind::NotIce);
}

#[test]
fn division_by_zero_is_ice_if_unevaluated() {
    let mut ctx = AstContext::default();
    let one = lit(&mut ctx, 1);
    let zero = lit(&mut ctx, 0);
    let div = bin(&mut ctx, BinaryOp::Div, one, zero);
    let diag = check_ice(&ctx, div);
    assert_eq!(diag.kind, IceKind::IceIfUnevaluated);
    assert_eq!(diag.reason, DiagKind::DivideByZero);
}

#[test]
fn short_circuit_hides_the_unevaluated_side() {
    let mut ctx = AstContext::default();
    let zero = lit(&mut ctx, 0);
    let one = lit(&mut ctx, 1);
    let div = bin(&mut ctx, BinaryOp::Div, one, zero);
    let and = bin(&mut ctx, BinaryOp::LAnd, zero, div);
    assert_eq!(is_integer_constant_expr(&ctx, and).map(|v| v.value), Ok(0));

    // With a true left side the division is evaluated.
    let taken = bin(&mut ctx, BinaryOp::LAnd, one, div);
    assert_eq!(check_ice(&ctx, taken).kind, IceKind::IceIfUnevaluated);
}

#[test]
fn conditional_only_checks_the_taken_arm() {
    let mut ctx = AstContext::default();
    let one = lit(&mut ctx, 1);
    let zero = lit(&mut ctx, 0);
    let two = lit(&mut ctx, 2);
    let div = bin(&mut ctx, BinaryOp::Div, one, zero);
    let c = ctx.create_conditional(one, two, div, int(), SourceLocation::INVALID);
    assert_eq!(is_integer_constant_expr(&ctx, c).map(|v| v.value), Ok(2));

    let other = ctx.create_conditional(zero, two, div, int(), SourceLocation::INVALID);
    assert_eq!(check_ice(&ctx, other).kind, IceKind::IceIfUnevaluated);
}

#[test]
fn int_min_divided_by_minus_one_is_not_usable() {
    let mut ctx = AstContext::default();
    let min = lit(&mut ctx, 0x8000_0000);
    let one = lit(&mut ctx, 1);
    let minus_one = ctx.create_unary(UnaryOp::Minus, one, int(), SourceLocation::INVALID);
    let div = bin(&mut ctx, BinaryOp::Div, min, minus_one);
    assert_eq!(check_ice(&ctx, div).kind, IceKind::IceIfUnevaluated);
}

#[test]
fn const_variable_is_an_ice_only_in_cplusplus() {
    for (lang, expected) in [
        (LangOptions::default(), IceKind::Ice),
        (LangOptions::c99(), IceKind::NotIce),
    ] {
        let mut ctx = AstContext::new(lang, TargetInfo::default());
        let tu = ctx.translation_unit();
        let init = lit(&mut ctx, 3);
        let v = ctx.create_var(
            tu,
            "n",
            int().with_const(),
            StorageClass::None,
            SourceLocation::INVALID,
        );
        if let Some(var) = ctx.decl_mut(v).data.var_mut() {
            var.init = Some(init);
        }
        let r = ctx.create_decl_ref(v, SourceLocation::INVALID, NameRefParts::none());
        let rv = ctx.create_implicit_cast(
            CastKind::LValueToRValue,
            r,
            &[],
            int(),
            ExprValueKind::RValue,
        );
        assert_eq!(check_ice(&ctx, rv).kind, expected);
    }
}

#[test]
fn explicit_cast_of_floating_literal_is_allowed() {
    let mut ctx = AstContext::default();
    let f = ctx.create_floating_literal(3.5, TypeId::DOUBLE.into(), SourceLocation::INVALID);
    let cast = ctx.create_explicit_cast(
        ExplicitCastStyle::CStyle,
        CastKind::FloatingToIntegral,
        f,
        &[],
        int(),
        SourceLocation::INVALID,
    );
    assert_eq!(is_integer_constant_expr(&ctx, cast).map(|v| v.value), Ok(3));

    // An implicit conversion of a floating expression is not.
    let g = ctx.create_floating_literal(1.0, TypeId::DOUBLE.into(), SourceLocation::INVALID);
    let h = ctx.create_floating_literal(2.0, TypeId::DOUBLE.into(), SourceLocation::INVALID);
    let sum = ctx.create_binary(
        BinaryOp::Add,
        g,
        h,
        TypeId::DOUBLE.into(),
        SourceLocation::INVALID,
    );
    let conv = ctx.create_implicit_cast(
        CastKind::FloatingToIntegral,
        sum,
        &[],
        int(),
        ExprValueKind::RValue,
    );
    assert_eq!(check_ice(&ctx, conv).reason, DiagKind::FloatInIce);
}

#[test]
fn non_integral_expressions_are_rejected() {
    let mut ctx = AstContext::default();
    let f = ctx.create_floating_literal(1.0, TypeId::DOUBLE.into(), SourceLocation::INVALID);
    let diag = check_ice(&ctx, f);
    assert_eq!(diag.kind, IceKind::NotIce);
    assert_eq!(diag.reason, DiagKind::NotIntegral);
}

#[test]
fn assignment_and_calls_are_not_ices() {
    let mut ctx = AstContext::default();
    let tu = ctx.translation_unit();
    let fty = ctx.types.function(int(), &[], false);
    let f = ctx.create_function(tu, "f", fty, &[], StorageClass::None, SourceLocation::INVALID);
    let callee = ctx.create_decl_ref(f, SourceLocation::INVALID, NameRefParts::none());
    let call = ctx.create_call(callee, &[], SourceLocation::INVALID);
    assert_eq!(check_ice(&ctx, call).reason, DiagKind::NonConstexprCall);

    let x = ctx.create_var(tu, "x", int(), StorageClass::None, SourceLocation::INVALID);
    let xr = ctx.create_decl_ref(x, SourceLocation::INVALID, NameRefParts::none());
    let one = lit(&mut ctx, 1);
    let assign = bin(&mut ctx, BinaryOp::Assign, xr, one);
    assert_eq!(check_ice(&ctx, assign).reason, DiagKind::SideEffects);
}

#[test]
fn ice_kinds_order_best_first() {
    assert!(IceKind::Ice < IceKind::IceIfUnevaluated);
    assert!(IceKind::IceIfUnevaluated < IceKind::NotIce);
}
