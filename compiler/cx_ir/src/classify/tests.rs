use pretty_assertions::assert_eq;

use super::*;
use crate::decl::{MethodFlags, StorageClass, TagKind};
use crate::expr::{CastKind, ExplicitCastStyle};
use crate::target::{LangOptions, TargetInfo};
use crate::types::TypeId;
use crate::NameRefParts;

fn int() -> QualType {
    TypeId::INT.into()
}

fn c99() -> AstContext {
    AstContext::new(LangOptions::c99(), TargetInfo::default())
}

fn var_ref(ctx: &mut AstContext, name: &str, ty: QualType) -> ExprId {
    let tu = ctx.translation_unit();
    let v = ctx.create_var(tu, name, ty, StorageClass::None, SourceLocation::INVALID);
    ctx.create_decl_ref(v, SourceLocation::INVALID, NameRefParts::none())
}

fn function_ref(ctx: &mut AstContext, result: QualType) -> ExprId {
    let tu = ctx.translation_unit();
    let fty = ctx.types.function(result, &[], false);
    let f = ctx.create_function(tu, "f", fty, &[], StorageClass::None, SourceLocation::INVALID);
    ctx.create_decl_ref(f, SourceLocation::INVALID, NameRefParts::none())
}

fn modifiable(ctx: &AstContext, e: ExprId) -> Modifiable {
    let mut loc = ctx.expr(e).loc();
    classify_modifiable(ctx, e, &mut loc).modifiable()
}

#[test]
fn variables_are_modifiable_lvalues() {
    let mut ctx = AstContext::default();
    let x = var_ref(&mut ctx, "x", int());
    let c = classify(&ctx, x);
    assert_eq!(c.kind(), ClassificationKind::LValue);
    assert_eq!(c.modifiable(), Modifiable::Untested);
    assert!(c.is_glvalue());
    assert!(!c.is_prvalue());
    assert!(is_modifiable_lvalue(&ctx, x));
}

#[test]
fn const_and_array_lvalues_are_not_modifiable() {
    let mut ctx = AstContext::default();
    let k = var_ref(&mut ctx, "k", int().with_const());
    assert_eq!(modifiable(&ctx, k), Modifiable::ConstQualified);

    let arr_ty = ctx.types.constant_array(int(), 4);
    let arr = var_ref(&mut ctx, "a", arr_ty);
    assert!(is_lvalue(&ctx, arr));
    assert_eq!(modifiable(&ctx, arr), Modifiable::ArrayType);
}

#[test]
fn record_with_const_field_is_const_qualified() {
    let mut ctx = AstContext::default();
    let tu = ctx.translation_unit();
    let record = ctx.create_record(tu, TagKind::Struct, "S", SourceLocation::INVALID);
    ctx.complete_record_definition(record, Vec::new(), DefinitionFlags::HAS_CONST_FIELDS);
    let sty = ctx.types.record(record);
    let s = var_ref(&mut ctx, "s", sty);
    assert_eq!(modifiable(&ctx, s), Modifiable::ConstQualified);
}

#[test]
fn literals_are_prvalues() {
    let mut ctx = AstContext::default();
    let one = ctx.create_integer_literal(1, int(), SourceLocation::INVALID);
    assert!(is_prvalue(&ctx, one));
    assert_eq!(modifiable(&ctx, one), Modifiable::RValue);

    let s = ctx.create_string_literal(
        b"hi",
        crate::expr::CharacterKind::Ascii,
        SourceLocation::INVALID,
    );
    assert!(is_lvalue(&ctx, s));
}

#[test]
fn function_designators_depend_on_language() {
    let mut c = c99();
    let f = function_ref(&mut c, int());
    assert_eq!(classify(&c, f).kind(), ClassificationKind::Function);
    assert_eq!(modifiable(&c, f), Modifiable::RValue);

    let mut cxx = AstContext::default();
    let f = function_ref(&mut cxx, int());
    assert_eq!(classify(&cxx, f).kind(), ClassificationKind::LValue);
    assert_eq!(modifiable(&cxx, f), Modifiable::Function);
}

#[test]
fn dereferenced_void_pointer_is_addressable_void_in_c() {
    let mut ctx = c99();
    let void_ptr = ctx.types.pointer(TypeId::VOID.into());
    let p = var_ref(&mut ctx, "p", void_ptr);
    let deref = ctx.create_unary(UnaryOp::Deref, p, TypeId::VOID.into(), SourceLocation::INVALID);
    assert_eq!(classify(&ctx, deref).kind(), ClassificationKind::AddressableVoid);
}

#[test]
fn assignment_result_is_an_lvalue_only_in_cplusplus() {
    for (lang, expected) in [
        (LangOptions::default(), ClassificationKind::LValue),
        (LangOptions::c99(), ClassificationKind::PRValue),
    ] {
        let mut ctx = AstContext::new(lang, TargetInfo::default());
        let x = var_ref(&mut ctx, "x", int());
        let one = ctx.create_integer_literal(1, int(), SourceLocation::INVALID);
        let assign = ctx.create_binary(BinaryOp::Assign, x, one, int(), SourceLocation::INVALID);
        assert_eq!(classify(&ctx, assign).kind(), expected);
    }
}

#[test]
fn call_category_follows_declared_return_type() {
    let mut ctx = AstContext::default();
    let lref = ctx.types.lvalue_reference(int());
    let rref = ctx.types.rvalue_reference(int());

    let f = function_ref(&mut ctx, lref);
    let call = ctx.create_call(f, &[], SourceLocation::INVALID);
    assert_eq!(classify(&ctx, call).kind(), ClassificationKind::LValue);

    let g = function_ref(&mut ctx, rref);
    let call = ctx.create_call(g, &[], SourceLocation::INVALID);
    assert_eq!(classify(&ctx, call).kind(), ClassificationKind::XValue);
    assert!(is_xvalue(&ctx, call));
    assert!(is_glvalue(&ctx, call));

    let tu = ctx.translation_unit();
    let record = ctx.create_record(tu, TagKind::Class, "C", SourceLocation::INVALID);
    let cty = ctx.types.record(record);
    let h = function_ref(&mut ctx, cty);
    let call = ctx.create_call(h, &[], SourceLocation::INVALID);
    assert_eq!(classify(&ctx, call).kind(), ClassificationKind::ClassTemporary);
}

#[test]
fn lvalue_cast_reports_the_cast_location() {
    let mut ctx = AstContext::default();
    let x = var_ref(&mut ctx, "x", int());
    let rv = ctx.create_implicit_cast(
        CastKind::LValueToRValue,
        x,
        &[],
        int(),
        ExprValueKind::RValue,
    );
    let cast_loc = SourceLocation::from_raw(42);
    let cast = ctx.create_explicit_cast(
        ExplicitCastStyle::CStyle,
        CastKind::NoOp,
        rv,
        &[],
        int(),
        cast_loc,
    );

    let mut loc = SourceLocation::INVALID;
    let c = classify_modifiable(&ctx, cast, &mut loc);
    assert_eq!(c.modifiable(), Modifiable::LValueCast);
    assert_eq!(loc, cast_loc);

    ctx.lang.lvalue_cast_extension = true;
    assert!(is_modifiable_lvalue(&ctx, cast));
}

#[test]
fn materialized_temporaries() {
    let mut ctx = AstContext::default();
    let one = ctx.create_integer_literal(1, int(), SourceLocation::INVALID);
    let bound = ctx.create_materialize_temporary(one, true, None);
    let moved = ctx.create_materialize_temporary(one, false, None);
    assert_eq!(classify(&ctx, bound).kind(), ClassificationKind::LValue);
    assert_eq!(classify(&ctx, moved).kind(), ClassificationKind::XValue);
}

#[test]
fn conditional_keeps_common_category() {
    let mut ctx = AstContext::default();
    let cond = ctx.create_integer_literal(1, int(), SourceLocation::INVALID);
    let a = var_ref(&mut ctx, "a", int());
    let b = var_ref(&mut ctx, "b", int());
    let both = ctx.create_conditional(cond, a, b, int(), SourceLocation::INVALID);
    assert_eq!(classify(&ctx, both).kind(), ClassificationKind::LValue);

    let lit = ctx.create_integer_literal(2, int(), SourceLocation::INVALID);
    let mixed = ctx.create_conditional(cond, a, lit, int(), SourceLocation::INVALID);
    assert_eq!(classify(&ctx, mixed).kind(), ClassificationKind::PRValue);
}

#[test]
fn member_functions_need_a_call() {
    let mut ctx = AstContext::default();
    let tu = ctx.translation_unit();
    let record = ctx.create_record(tu, TagKind::Struct, "S", SourceLocation::INVALID);
    let fty = ctx.types.function(int(), &[], false);
    let m = ctx.create_method(record, "m", fty, &[], MethodFlags::empty(), SourceLocation::INVALID);
    let sm = ctx.create_method(
        record,
        "sm",
        fty,
        &[],
        MethodFlags::STATIC,
        SourceLocation::INVALID,
    );
    let sty = ctx.types.record(record);
    let s = var_ref(&mut ctx, "s", sty);

    let member = ctx.create_member(s, m, false, NameRefParts::none(), SourceLocation::INVALID);
    assert_eq!(classify(&ctx, member).kind(), ClassificationKind::MemberFunction);
    let static_member = ctx.create_member(
        s,
        sm,
        false,
        NameRefParts::none(),
        SourceLocation::INVALID,
    );
    assert_eq!(classify(&ctx, static_member).kind(), ClassificationKind::LValue);
}

#[test]
fn vector_swizzles() {
    let mut ctx = AstContext::default();
    let float4 = ctx.types.ext_vector(TypeId::FLOAT.into(), 4);
    let float2 = ctx.types.ext_vector(TypeId::FLOAT.into(), 2);
    let v = var_ref(&mut ctx, "v", float4);

    let swizzle = |ctx: &mut AstContext, name: &str| {
        let accessor = ctx.idents.intern(name);
        ctx.create_ext_vector_element(v, accessor, float2, SourceLocation::INVALID)
    };
    let xy = swizzle(&mut ctx, "xy");
    let xx = swizzle(&mut ctx, "xx");
    let s00 = swizzle(&mut ctx, "s00");
    let s01 = swizzle(&mut ctx, "s01");
    let hi = swizzle(&mut ctx, "hi");

    assert_eq!(classify(&ctx, xy).kind(), ClassificationKind::LValue);
    assert_eq!(classify(&ctx, xx).kind(), ClassificationKind::DuplicateVectorComponents);
    assert!(contains_duplicate_elements(&ctx, s00));
    assert!(!contains_duplicate_elements(&ctx, s01));
    assert!(!contains_duplicate_elements(&ctx, hi));
    assert!(!contains_duplicate_elements(&ctx, v));
}

#[test]
fn classification_order_splits_glvalues_from_prvalues() {
    let kinds = [
        ClassificationKind::LValue,
        ClassificationKind::XValue,
        ClassificationKind::Function,
        ClassificationKind::PRValue,
    ];
    let glvalues: Vec<bool> = kinds.iter().map(|&k| k <= ClassificationKind::XValue).collect();
    assert_eq!(glvalues, vec![true, true, false, false]);
}
