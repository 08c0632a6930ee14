use pretty_assertions::assert_eq;

use super::*;
use crate::decl::{StorageClass, VarFlags};
use crate::expr::{CharacterKind, ExprValueKind};
use crate::types::TypeId;
use crate::{NameRefParts, SourceLocation};

fn int() -> QualType {
    TypeId::INT.into()
}

fn lit(ctx: &mut AstContext, v: u64) -> ExprId {
    ctx.create_integer_literal(v, int(), SourceLocation::INVALID)
}

fn bin(ctx: &mut AstContext, op: BinaryOp, l: ExprId, r: ExprId) -> ExprId {
    ctx.create_binary(op, l, r, int(), SourceLocation::INVALID)
}

fn int_value(ctx: &AstContext, e: ExprId) -> Option<i128> {
    evaluate_as_int(ctx, e).map(|v| v.value)
}

/// `const int name = value;` plus a reference to it.
fn const_var_ref(ctx: &mut AstContext, name: &str, value: u64, is_const: bool) -> ExprId {
    let tu = ctx.translation_unit();
    let init = lit(ctx, value);
    let ty = if is_const { int().with_const() } else { int() };
    let v = ctx.create_var(tu, name, ty, StorageClass::None, SourceLocation::INVALID);
    if let Some(var) = ctx.decl_mut(v).data.var_mut() {
        var.init = Some(init);
    }
    let r = ctx.create_decl_ref(v, SourceLocation::INVALID, NameRefParts::none());
    ctx.create_implicit_cast(CastKind::LValueToRValue, r, &[], int(), ExprValueKind::RValue)
}

#[test]
fn folds_integer_arithmetic() {
    let mut ctx = AstContext::default();
    let two = lit(&mut ctx, 2);
    let three = lit(&mut ctx, 3);
    let four = lit(&mut ctx, 4);
    let product = bin(&mut ctx, BinaryOp::Mul, three, four);
    let sum = bin(&mut ctx, BinaryOp::Add, two, product);
    assert_eq!(int_value(&ctx, sum), Some(14));
    assert!(is_evaluatable(&ctx, sum));
}

#[test]
fn signed_overflow_wraps_to_width() {
    let mut ctx = AstContext::default();
    let max = lit(&mut ctx, i32::MAX as u64);
    let one = lit(&mut ctx, 1);
    let sum = bin(&mut ctx, BinaryOp::Add, max, one);
    assert_eq!(int_value(&ctx, sum), Some(i128::from(i32::MIN)));
}

#[test]
fn division_by_zero_reports_a_note() {
    let mut ctx = AstContext::default();
    let one = lit(&mut ctx, 1);
    let zero = lit(&mut ctx, 0);
    let div = bin(&mut ctx, BinaryOp::Div, one, zero);
    let r = evaluate(&ctx, div);
    assert_eq!(r.value, None);
    assert_eq!(r.diag.map(|d| d.kind), Some(DiagKind::DivideByZero));
}

#[test]
fn oversized_shift_reports_a_note() {
    let mut ctx = AstContext::default();
    let one = lit(&mut ctx, 1);
    let amount = lit(&mut ctx, 40);
    let shl = bin(&mut ctx, BinaryOp::Shl, one, amount);
    assert_eq!(
        evaluate(&ctx, shl).diag.map(|d| d.kind),
        Some(DiagKind::ShiftOutOfRange)
    );
}

#[test]
fn comma_keeps_going_past_side_effects() {
    let mut ctx = AstContext::default();
    let tu = ctx.translation_unit();
    let x = ctx.create_var(tu, "x", int(), StorageClass::None, SourceLocation::INVALID);
    let xr = ctx.create_decl_ref(x, SourceLocation::INVALID, NameRefParts::none());
    let one = lit(&mut ctx, 1);
    let assign = bin(&mut ctx, BinaryOp::Assign, xr, one);
    let two = lit(&mut ctx, 2);
    let comma = bin(&mut ctx, BinaryOp::Comma, assign, two);

    let r = evaluate(&ctx, comma);
    assert_eq!(r.value.and_then(|v| v.as_int()).map(|v| v.value), Some(2));
    assert!(r.has_side_effects);
    assert_eq!(r.diag, None);
    assert_eq!(evaluate_as_int(&ctx, comma), None);
    assert!(!is_evaluatable(&ctx, comma));
}

#[test]
fn logical_operators_short_circuit() {
    let mut ctx = AstContext::default();
    let zero = lit(&mut ctx, 0);
    let one = lit(&mut ctx, 1);
    let bad = bin(&mut ctx, BinaryOp::Div, one, zero);
    let and = bin(&mut ctx, BinaryOp::LAnd, zero, bad);
    assert_eq!(int_value(&ctx, and), Some(0));
    let or = bin(&mut ctx, BinaryOp::LOr, one, bad);
    assert_eq!(int_value(&ctx, or), Some(1));
}

#[test]
fn const_variables_are_read_through() {
    let mut ctx = AstContext::default();
    let n = const_var_ref(&mut ctx, "n", 5, true);
    assert_eq!(int_value(&ctx, n), Some(5));

    let m = const_var_ref(&mut ctx, "m", 5, false);
    let r = evaluate(&ctx, m);
    assert_eq!(r.value, None);
    assert_eq!(r.diag.map(|d| d.kind), Some(DiagKind::ReadOfNonConstVariable));
}

#[test]
fn constexpr_variable_is_readable() {
    let mut ctx = AstContext::default();
    let tu = ctx.translation_unit();
    let init = lit(&mut ctx, 9);
    let v = ctx.create_var(tu, "k", int(), StorageClass::None, SourceLocation::INVALID);
    if let Some(var) = ctx.decl_mut(v).data.var_mut() {
        var.init = Some(init);
        var.flags |= VarFlags::CONSTEXPR;
    }
    let r = ctx.create_decl_ref(v, SourceLocation::INVALID, NameRefParts::none());
    assert_eq!(int_value(&ctx, r), Some(9));
}

#[test]
fn enum_constants_fold() {
    let mut ctx = AstContext::default();
    let tu = ctx.translation_unit();
    let e = ctx.create_enum(tu, "E", int(), SourceLocation::INVALID);
    let ety = ctx.types.enum_type(e);
    let c = ctx.create_enum_constant(e, "B", ety, None, -3, SourceLocation::INVALID);
    let r = ctx.create_decl_ref(c, SourceLocation::INVALID, NameRefParts::none());
    assert_eq!(int_value(&ctx, r), Some(-3));
}

#[test]
fn sizeof_and_alignof_use_the_target() {
    let mut ctx = AstContext::default();
    let size = ctx.create_unary_trait(
        UnaryTrait::SizeOf,
        TraitArg::Type(TypeId::LONG_DOUBLE.into()),
        SourceLocation::INVALID,
    );
    let align = ctx.create_unary_trait(
        UnaryTrait::AlignOf,
        TraitArg::Type(TypeId::DOUBLE.into()),
        SourceLocation::INVALID,
    );
    assert_eq!(int_value(&ctx, size), Some(16));
    assert_eq!(int_value(&ctx, align), Some(8));

    let void_size = ctx.create_unary_trait(
        UnaryTrait::SizeOf,
        TraitArg::Type(TypeId::VOID.into()),
        SourceLocation::INVALID,
    );
    assert_eq!(int_value(&ctx, void_size), None);
}

#[test]
fn calls_are_not_constant() {
    let mut ctx = AstContext::default();
    let tu = ctx.translation_unit();
    let fty = ctx.types.function(int(), &[], false);
    let f = ctx.create_function(tu, "f", fty, &[], StorageClass::None, SourceLocation::INVALID);
    let callee = ctx.create_decl_ref(f, SourceLocation::INVALID, NameRefParts::none());
    let call = ctx.create_call(callee, &[], SourceLocation::INVALID);
    let r = evaluate(&ctx, call);
    assert!(r.has_side_effects);
    assert_eq!(r.diag.map(|d| d.kind), Some(DiagKind::NonConstexprCall));
}

#[test]
fn integral_cast_truncates() {
    let mut ctx = AstContext::default();
    let big = lit(&mut ctx, 300);
    let narrowed = ctx.create_implicit_cast(
        CastKind::IntegralCast,
        big,
        &[],
        TypeId::UCHAR.into(),
        ExprValueKind::RValue,
    );
    assert_eq!(int_value(&ctx, narrowed), Some(44));
}

#[test]
fn floating_folds_and_converts() {
    let mut ctx = AstContext::default();
    let f = ctx.create_floating_literal(2.75, TypeId::DOUBLE.into(), SourceLocation::INVALID);
    let to_int = ctx.create_implicit_cast(
        CastKind::FloatingToIntegral,
        f,
        &[],
        int(),
        ExprValueKind::RValue,
    );
    assert_eq!(int_value(&ctx, to_int), Some(2));
    assert_eq!(evaluate(&ctx, f).value.and_then(|v| v.as_float()), Some(2.75));
}

#[test]
fn pointer_arithmetic_on_string_literal() {
    let mut ctx = AstContext::default();
    let s = ctx.create_string_literal(b"abc", CharacterKind::Ascii, SourceLocation::INVALID);
    let char_ptr = ctx.types.pointer(QualType::from(TypeId::CHAR).with_const());
    let decayed = ctx.create_implicit_cast(
        CastKind::ArrayToPointerDecay,
        s,
        &[],
        char_ptr,
        ExprValueKind::RValue,
    );
    let two = lit(&mut ctx, 2);
    let plus = ctx.create_binary(BinaryOp::Add, decayed, two, char_ptr, SourceLocation::INVALID);
    assert_eq!(
        evaluate(&ctx, plus).value,
        Some(APValue::LValue {
            base: LValueBase::Expr(s),
            offset: 2,
        })
    );
    assert_eq!(evaluate_as_boolean_condition(&ctx, plus), Some(true));
}

#[test]
fn null_pointer_is_false() {
    let mut ctx = AstContext::default();
    let null = ctx.create_nullptr_literal(SourceLocation::INVALID);
    assert_eq!(evaluate_as_boolean_condition(&ctx, null), Some(false));
}

#[test]
fn conditional_picks_one_arm() {
    let mut ctx = AstContext::default();
    let cond = lit(&mut ctx, 0);
    let one = lit(&mut ctx, 1);
    let zero = lit(&mut ctx, 0);
    let bad = bin(&mut ctx, BinaryOp::Div, one, zero);
    let seven = lit(&mut ctx, 7);
    let c = ctx.create_conditional(cond, bad, seven, int(), SourceLocation::INVALID);
    assert_eq!(int_value(&ctx, c), Some(7));
}

#[test]
fn dependent_expressions_do_not_fold() {
    let mut ctx = AstContext::default();
    let tu = ctx.translation_unit();
    let n = ctx.create_non_type_template_parm(tu, "N", int(), 0, 0, false, SourceLocation::INVALID);
    let r = ctx.create_decl_ref(n, SourceLocation::INVALID, NameRefParts::none());
    let res = evaluate(&ctx, r);
    assert_eq!(res.value, None);
    assert_eq!(res.diag.map(|d| d.kind), Some(DiagKind::Dependent));
}

#[test]
fn deeply_nested_expression_does_not_overflow() {
    let mut ctx = AstContext::default();
    let mut e = lit(&mut ctx, 1);
    for _ in 0..50_000 {
        e = ctx.create_unary(UnaryOp::Minus, e, int(), SourceLocation::INVALID);
    }
    assert_eq!(int_value(&ctx, e), Some(1));
}
