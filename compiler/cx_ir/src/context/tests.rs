use pretty_assertions::assert_eq;
use proptest::prelude::*;

use super::*;
use crate::decl::{DefinitionFlags, MethodFlags, StorageClass, TagKind};
use crate::expr::{
    BinaryOp, CharacterKind, ExprDependence, ExprObjectKind, ExprValueKind, TraitArg, UnaryTrait,
};
use crate::trailing::{Designator, NestedNameSpecifier, TemplateArgument};
use crate::types::{Qualifiers, TypeId};
use crate::{NameRefParts, TargetInfo};

fn loc(n: u32) -> SourceLocation {
    SourceLocation::from_raw(n)
}

fn int() -> QualType {
    TypeId::INT.into()
}

fn lit(ctx: &mut AstContext, v: u64) -> ExprId {
    ctx.create_integer_literal(v, int(), loc(1))
}

fn int_var(ctx: &mut AstContext, name: &str) -> DeclId {
    let tu = ctx.translation_unit();
    ctx.create_var(tu, name, int(), StorageClass::None, loc(1))
}

// === Expression headers ===

#[test]
fn decl_ref_strips_reference_type() {
    let mut ctx = AstContext::default();
    let tu = ctx.translation_unit();
    let int_ref = ctx.types.lvalue_reference(int());
    let x = ctx.create_var(tu, "x", int_ref, StorageClass::None, loc(3));
    let r = ctx.create_decl_ref(x, loc(4), NameRefParts::none());

    let e = ctx.expr(r);
    assert_eq!(e.ty(), int());
    assert!(e.is_lvalue());
    assert_eq!(e.loc(), loc(4));
}

#[test]
fn set_expr_type_strips_reference_type() {
    let mut ctx = AstContext::default();
    let one = lit(&mut ctx, 1);
    let long_ref = ctx.types.rvalue_reference(TypeId::LONG.into());
    ctx.set_expr_type(one, long_ref);
    assert_eq!(ctx.expr(one).ty(), QualType::from(TypeId::LONG));
}

#[test]
#[should_panic(expected = "must not be a reference type")]
fn restore_expr_rejects_reference_type() {
    let mut ctx = AstContext::default();
    let int_ref = ctx.types.lvalue_reference(int());
    ctx.restore_expr(Expr::from_parts(
        ExprKind::IntegerLiteral { value: 0 },
        int_ref,
        loc(1),
        ExprValueKind::RValue,
        ExprObjectKind::Ordinary,
        ExprDependence::empty(),
    ));
}

#[test]
#[should_panic(expected = "missing instantiation dependence")]
fn restore_expr_rejects_inconsistent_dependence() {
    let mut ctx = AstContext::default();
    ctx.restore_expr(Expr::from_parts(
        ExprKind::IntegerLiteral { value: 0 },
        int(),
        loc(1),
        ExprValueKind::RValue,
        ExprObjectKind::Ordinary,
        ExprDependence::VALUE,
    ));
}

#[test]
fn enum_constant_reference_is_prvalue() {
    let mut ctx = AstContext::default();
    let tu = ctx.translation_unit();
    let e = ctx.create_enum(tu, "Color", int(), loc(1));
    let ty = ctx.types.enum_type(e);
    let red = ctx.create_enum_constant(e, "Red", ty, None, 0, loc(2));
    let r = ctx.create_decl_ref(red, loc(3), NameRefParts::none());
    assert!(ctx.expr(r).is_prvalue());
}

#[test]
fn function_reference_value_kind_depends_on_language() {
    for (lang, lvalue) in [(LangOptions::default(), true), (LangOptions::c99(), false)] {
        let mut ctx = AstContext::new(lang, TargetInfo::default());
        let tu = ctx.translation_unit();
        let fty = ctx.types.function(int(), &[], false);
        let f = ctx.create_function(tu, "f", fty, &[], StorageClass::None, loc(1));
        let r = ctx.create_decl_ref(f, loc(2), NameRefParts::none());
        assert_eq!(ctx.expr(r).is_lvalue(), lvalue);
    }
}

#[test]
fn character_literal_type_follows_encoding() {
    let mut cpp = AstContext::default();
    let a = cpp.create_character_literal(u32::from(b'a'), CharacterKind::Ascii, loc(1));
    assert_eq!(cpp.expr(a).ty(), QualType::from(TypeId::CHAR));

    let mut c = AstContext::new(LangOptions::c99(), TargetInfo::default());
    let a = c.create_character_literal(u32::from(b'a'), CharacterKind::Ascii, loc(1));
    assert_eq!(c.expr(a).ty(), int());
    let u = c.create_character_literal(0x20ac, CharacterKind::Utf16, loc(1));
    assert_eq!(c.expr(u).ty(), QualType::from(TypeId::USHORT));
}

#[test]
fn string_literal_is_const_char_array_lvalue() {
    let mut ctx = AstContext::default();
    let s = ctx.create_string_literal(b"abc", CharacterKind::Ascii, loc(1));
    let e = ctx.expr(s);
    assert!(e.is_lvalue());
    let element = ctx.types.element_type(e.ty()).unwrap_or(QualType::NULL);
    assert!(element.is_const_qualified());
    assert_eq!(ctx.type_size(e.ty()), 4);
}

#[test]
fn member_of_const_object_is_const() {
    let mut ctx = AstContext::default();
    let tu = ctx.translation_unit();
    let s = ctx.create_record(tu, TagKind::Struct, "S", loc(1));
    let a = ctx.create_field(s, "a", int(), None, loc(2));
    let width = lit(&mut ctx, 3);
    let b = ctx.create_field(s, "b", int(), Some(width), loc(3));
    ctx.complete_record_definition(s, Vec::new(), DefinitionFlags::empty());
    let sty = ctx.types.record(s);
    let obj = ctx.create_var(tu, "obj", sty.with_const(), StorageClass::None, loc(4));

    let base = ctx.create_decl_ref(obj, loc(5), NameRefParts::none());
    let ma = ctx.create_member(base, a, false, NameRefParts::none(), loc(6));
    assert!(ctx.expr(ma).ty().is_const_qualified());
    assert!(ctx.expr(ma).is_lvalue());
    assert_eq!(ctx.expr(ma).object_kind(), ExprObjectKind::Ordinary);

    let base = ctx.create_decl_ref(obj, loc(5), NameRefParts::none());
    let mb = ctx.create_member(base, b, false, NameRefParts::none(), loc(7));
    assert_eq!(ctx.expr(mb).object_kind(), ExprObjectKind::BitField);
}

#[test]
fn member_of_prvalue_is_xvalue_in_cplusplus() {
    let mut ctx = AstContext::default();
    let tu = ctx.translation_unit();
    let s = ctx.create_record(tu, TagKind::Struct, "S", loc(1));
    let a = ctx.create_field(s, "a", int(), None, loc(2));
    ctx.complete_record_definition(s, Vec::new(), DefinitionFlags::empty());
    let sty = ctx.types.record(s);
    let tmp = ctx.create_opaque_value(
        sty,
        ExprValueKind::RValue,
        ExprObjectKind::Ordinary,
        None,
        loc(3),
    );
    let m = ctx.create_member(tmp, a, false, NameRefParts::none(), loc(4));
    assert!(ctx.expr(m).is_xvalue());
}

// === Dependence ===

#[test]
fn literals_are_not_dependent() {
    let mut ctx = AstContext::default();
    let a = lit(&mut ctx, 1);
    let b = lit(&mut ctx, 2);
    let sum = ctx.create_binary(BinaryOp::Add, a, b, int(), loc(1));
    assert_eq!(ctx.expr(sum).dependence(), ExprDependence::empty());
}

#[test]
fn reference_to_dependent_type_is_type_and_value_dependent() {
    let mut ctx = AstContext::default();
    let tu = ctx.translation_unit();
    let parm = ctx.create_template_type_parm(tu, "T", 0, 0, false, loc(1));
    let t = match &ctx.decl(parm).data {
        DeclData::TemplateTypeParm(p) => p.ty,
        other => panic!("unexpected {}", other.class()),
    };
    let var = ctx.create_var(tu, "t", t, StorageClass::None, loc(2));
    let r = ctx.create_decl_ref(var, loc(3), NameRefParts::none());
    assert_eq!(
        ctx.expr(r).dependence(),
        ExprDependence::TYPE | ExprDependence::VALUE | ExprDependence::INSTANTIATION
    );

    // sizeof(t) has a known type but an unknown value.
    let size = ctx.create_unary_trait(UnaryTrait::SizeOf, TraitArg::Expr(r), loc(4));
    assert_eq!(
        ctx.expr(size).dependence(),
        ExprDependence::VALUE | ExprDependence::INSTANTIATION
    );
    let size_of_type = ctx.create_unary_trait(UnaryTrait::SizeOf, TraitArg::Type(t), loc(4));
    assert!(ctx.expr(size_of_type).is_value_dependent());
    assert!(!ctx.expr(size_of_type).is_type_dependent());
}

#[test]
fn non_type_template_parameter_is_value_dependent() {
    let mut ctx = AstContext::default();
    let tu = ctx.translation_unit();
    let n = ctx.create_non_type_template_parm(tu, "N", int(), 0, 0, false, loc(1));
    let r = ctx.create_decl_ref(n, loc(2), NameRefParts::none());
    assert!(ctx.expr(r).is_prvalue());
    assert_eq!(
        ctx.expr(r).dependence(),
        ExprDependence::VALUE | ExprDependence::INSTANTIATION
    );

    let one = lit(&mut ctx, 1);
    let sum = ctx.create_binary(BinaryOp::Add, r, one, int(), loc(3));
    assert!(ctx.expr(sum).is_value_dependent());
    assert!(!ctx.expr(sum).is_type_dependent());
}

#[test]
fn pack_expansion_consumes_unexpanded_pack() {
    let mut ctx = AstContext::default();
    let tu = ctx.translation_unit();
    let parm = ctx.create_template_type_parm(tu, "Ts", 0, 0, true, loc(1));
    let ts = match &ctx.decl(parm).data {
        DeclData::TemplateTypeParm(p) => p.ty,
        other => panic!("unexpected {}", other.class()),
    };
    let args = ctx.create_var(tu, "args", ts, StorageClass::None, loc(2));
    let r = ctx.create_decl_ref(args, loc(3), NameRefParts::none());
    assert!(ctx.expr(r).contains_unexpanded_parameter_pack());

    let expansion = ctx.create_pack_expansion(r, None, loc(4));
    let e = ctx.expr(expansion);
    assert!(!e.contains_unexpanded_parameter_pack());
    assert!(e.is_type_dependent());

    let count = ctx.create_size_of_pack(parm, None, loc(5));
    assert!(ctx.expr(count).is_value_dependent());
    assert!(!ctx.expr(count).contains_unexpanded_parameter_pack());
    let known = ctx.create_size_of_pack(parm, Some(3), loc(5));
    assert_eq!(ctx.expr(known).dependence(), ExprDependence::empty());
}

#[test]
fn dependent_template_argument_makes_reference_value_dependent() {
    let mut ctx = AstContext::default();
    let tu = ctx.translation_unit();
    let parm = ctx.create_template_type_parm(tu, "T", 0, 0, false, loc(1));
    let t = match &ctx.decl(parm).data {
        DeclData::TemplateTypeParm(p) => p.ty,
        other => panic!("unexpected {}", other.class()),
    };
    let fty = ctx.types.function(int(), &[], false);
    let f = ctx.create_function(tu, "f", fty, &[], StorageClass::None, loc(2));
    let parts = NameRefParts {
        template_args: Some((
            vec![TemplateArgumentLoc {
                arg: TemplateArgument::Type(t),
                loc: loc(4),
            }],
            loc(3),
            loc(5),
        )),
        ..NameRefParts::none()
    };
    let r = ctx.create_decl_ref(f, loc(2), parts);
    assert!(ctx.expr(r).is_value_dependent());
    assert!(!ctx.expr(r).is_type_dependent());
}

#[test]
fn unresolved_generic_selection_is_dependent() {
    let mut ctx = AstContext::default();
    let controlling = lit(&mut ctx, 0);
    let a = lit(&mut ctx, 1);
    let b = lit(&mut ctx, 2);
    let types = [int(), QualType::NULL];
    let sel = ctx.create_generic_selection(controlling, &types, &[a, b], None, loc(1));
    assert!(ctx.expr(sel).is_type_dependent());
    assert_eq!(ctx.generic_result(sel), None);

    let resolved = ctx.create_generic_selection(controlling, &types, &[a, b], Some(1), loc(1));
    assert_eq!(ctx.generic_result(resolved), Some(b));
    assert_eq!(ctx.assoc_types(resolved), &types);
    assert!(!ctx.expr(resolved).is_type_dependent());
}

fn leaf_strategy() -> impl Strategy<Value = bool> {
    // true: reference to a value-dependent parameter; false: a literal.
    any::<bool>()
}

proptest! {
    #[test]
    fn dependence_is_always_consistent(leaves in prop::collection::vec(leaf_strategy(), 1..12)) {
        let mut ctx = AstContext::default();
        let tu = ctx.translation_unit();
        let n = ctx.create_non_type_template_parm(tu, "N", int(), 0, 0, false, loc(1));
        let mut acc: Option<ExprId> = None;
        let mut any_dependent = false;
        for dependent in leaves {
            any_dependent |= dependent;
            let leaf = if dependent {
                ctx.create_decl_ref(n, loc(2), NameRefParts::none())
            } else {
                lit(&mut ctx, 7)
            };
            acc = Some(match acc {
                None => leaf,
                Some(lhs) => ctx.create_binary(BinaryOp::Mul, lhs, leaf, int(), loc(3)),
            });
        }
        let root = acc.unwrap_or(ExprId::INVALID);
        let dep = ctx.expr(root).dependence();
        prop_assert!(dep.is_consistent());
        prop_assert_eq!(dep.contains(ExprDependence::VALUE), any_dependent);
        prop_assert!(!dep.contains(ExprDependence::TYPE));
    }
}

// === Trailing data ===

#[test]
fn call_arguments_are_fixed_at_creation() {
    let mut ctx = AstContext::default();
    let tu = ctx.translation_unit();
    let fty = ctx.types.function(int(), &[int(), int()], false);
    let f = ctx.create_function(tu, "f", fty, &[], StorageClass::None, loc(1));
    let callee = ctx.create_decl_ref(f, loc(2), NameRefParts::none());
    let a = lit(&mut ctx, 1);
    let b = lit(&mut ctx, 2);
    let call = ctx.create_call(callee, &[a, b], loc(9));

    assert_eq!(ctx.callee(call), callee);
    assert_eq!(ctx.call_args(call), &[a, b]);
    assert_eq!(ctx.num_args(call), 2);
    assert_eq!(ctx.call_arg(call, 1), b);
    assert_eq!(ctx.expr(call).ty(), int());
    assert!(ctx.expr(call).is_prvalue());
}

#[test]
#[should_panic(expected = "argument index 2 out of range")]
fn call_argument_out_of_range_panics() {
    let mut ctx = AstContext::default();
    let tu = ctx.translation_unit();
    let fty = ctx.types.function(int(), &[int(), int()], false);
    let f = ctx.create_function(tu, "f", fty, &[], StorageClass::None, loc(1));
    let callee = ctx.create_decl_ref(f, loc(2), NameRefParts::none());
    let a = lit(&mut ctx, 1);
    let b = lit(&mut ctx, 2);
    let call = ctx.create_call(callee, &[a, b], loc(9));
    ctx.call_arg(call, 2);
}

#[test]
fn call_returning_reference_is_lvalue() {
    let mut ctx = AstContext::default();
    let tu = ctx.translation_unit();
    let int_ref = ctx.types.lvalue_reference(int());
    let fty = ctx.types.function(int_ref, &[], false);
    let f = ctx.create_function(tu, "f", fty, &[], StorageClass::None, loc(1));
    let callee = ctx.create_decl_ref(f, loc(2), NameRefParts::none());
    let call = ctx.create_call(callee, &[], loc(3));
    assert!(ctx.expr(call).is_lvalue());
    assert_eq!(ctx.expr(call).ty(), int());
}

#[test]
fn name_reference_sections_are_addressable() {
    let mut ctx = AstContext::default();
    let tu = ctx.translation_unit();
    let ns = ctx.create_namespace(tu, "ns", false, loc(1));
    let x = ctx.create_var(ns, "x", int(), StorageClass::None, loc(2));
    let range = SourceRange::new(loc(10), loc(13));
    let parts = NameRefParts {
        qualifier: Some((NestedNameSpecifier::Namespace(ns), range)),
        template_args: Some((
            vec![TemplateArgumentLoc {
                arg: TemplateArgument::Integral { value: 4, ty: int() },
                loc: loc(16),
            }],
            loc(15),
            loc(17),
        )),
        ..NameRefParts::none()
    };
    let r = ctx.create_decl_ref(x, loc(14), parts);

    assert_eq!(
        ctx.qualifier(r),
        Some((NestedNameSpecifier::Namespace(ns), range))
    );
    assert_eq!(ctx.found_decl(r), None);
    assert_eq!(ctx.template_args(r).len(), 1);
    assert_eq!(
        ctx.template_args(r)[0].arg,
        TemplateArgument::Integral { value: 4, ty: int() }
    );

    let plain = ctx.create_decl_ref(x, loc(20), NameRefParts::none());
    assert_eq!(ctx.qualifier(plain), None);
    assert!(ctx.template_args(plain).is_empty());
}

#[test]
fn designated_initializer_indices() {
    let mut ctx = AstContext::default();
    let lo = lit(&mut ctx, 1);
    let hi = lit(&mut ctx, 4);
    let at = lit(&mut ctx, 7);
    let value = lit(&mut ctx, 42);
    let designators = [
        Designator::ArrayRange {
            index: 0,
            lbracket: loc(1),
            ellipsis: loc(2),
            rbracket: loc(3),
        },
        Designator::Array {
            index: 2,
            lbracket: loc(4),
            rbracket: loc(5),
        },
    ];
    let d = ctx.create_designated_init(&designators, &[lo, hi, at], value, false, loc(6));

    assert_eq!(ctx.designated_init_value(d), value);
    assert_eq!(ctx.designator_index_expr(d, 0), lo);
    assert_eq!(ctx.designator_index_expr(d, 1), hi);
    assert_eq!(ctx.designator_index_expr(d, 2), at);
    assert_eq!(ctx.designators(d), &designators);
    assert_eq!(ctx.expr(d).ty(), int());
}

#[test]
#[should_panic(expected = "designator index 1 out of range")]
fn designator_index_must_have_an_expression() {
    let mut ctx = AstContext::default();
    let value = lit(&mut ctx, 42);
    let idx = lit(&mut ctx, 0);
    let designators = [Designator::Array {
        index: 1,
        lbracket: loc(1),
        rbracket: loc(2),
    }];
    ctx.create_designated_init(&designators, &[idx], value, false, loc(3));
}

#[test]
fn init_list_union_field() {
    let mut ctx = AstContext::default();
    let tu = ctx.translation_unit();
    let u = ctx.create_record(tu, TagKind::Union, "U", loc(1));
    let f = ctx.create_field(u, "f", int(), None, loc(2));
    ctx.complete_record_definition(u, Vec::new(), DefinitionFlags::empty());
    let uty = ctx.types.record(u);
    let one = lit(&mut ctx, 1);
    let list = ctx.create_init_list(&[one], None, uty, loc(3), loc(4));
    ctx.set_initialized_field_in_union(list, f);

    assert_eq!(ctx.inits(list), &[one]);
    assert_eq!(ctx.init(list, 0), one);
    match &ctx.expr(list).kind {
        ExprKind::InitList { union_field, .. } => assert_eq!(*union_field, Some(f)),
        other => panic!("unexpected {}", other.class()),
    }
}

// === Declarations ===

#[test]
fn declarations_join_their_context() {
    let mut ctx = AstContext::default();
    let tu = ctx.translation_unit();
    let ns = ctx.create_namespace(tu, "n", true, loc(1));
    let v = ctx.create_var(ns, "v", int(), StorageClass::Static, loc(2));

    assert_eq!(ctx.decls_in(tu), &[ns]);
    assert_eq!(ctx.decls_in(ns), &[v]);
    assert_eq!(ctx.decl(v).decl_context(), ns);
    assert_eq!(ctx.decl_name(v), "v");
    assert!(ctx.is_decl_class(ns, DeclClass::Namespace));
}

#[test]
fn parameters_are_adopted_by_their_function() {
    let mut ctx = AstContext::default();
    let tu = ctx.translation_unit();
    let p0 = ctx.create_parm("a", int(), 0, loc(1));
    let p1 = ctx.create_parm("b", int(), 1, loc(2));
    let fty = ctx.types.function(int(), &[int(), int()], false);
    let f = ctx.create_function(tu, "f", fty, &[p0, p1], StorageClass::None, loc(3));
    assert_eq!(ctx.decl(p0).decl_context(), f);
    assert_eq!(ctx.decl(p1).lexical_decl_context(), f);
    assert_eq!(ctx.decl(f).data.function().map(|d| d.params.clone()), Some(vec![p0, p1]));
}

#[test]
fn mark_modified_only_applies_to_imported_decls() {
    let mut ctx = AstContext::default();
    let local = int_var(&mut ctx, "local");
    let imported = int_var(&mut ctx, "imported");
    ctx.decl_mut(imported).flags |= DeclFlags::FROM_AST_FILE;

    ctx.mark_decl_modified(local);
    ctx.mark_decl_modified(imported);
    assert!(!ctx.decl(local).flags.contains(DeclFlags::MODIFIED));
    assert!(ctx.decl(imported).flags.contains(DeclFlags::MODIFIED));
}

#[test]
fn redeclaration_chain_walks_every_declaration() {
    let mut ctx = AstContext::default();
    let tu = ctx.translation_unit();
    let fty = ctx.types.function(int(), &[], false);
    let d1 = ctx.create_function(tu, "f", fty, &[], StorageClass::None, loc(1));
    let d2 = ctx.create_function(tu, "f", fty, &[], StorageClass::None, loc(2));
    let d3 = ctx.create_function(tu, "f", fty, &[], StorageClass::None, loc(3));
    ctx.set_previous_decl(d2, d1);
    ctx.set_previous_decl(d3, d2);

    assert_eq!(ctx.first_decl(d3), d1);
    assert_eq!(ctx.most_recent_decl(d1), d3);
    assert_eq!(ctx.most_recent_decl(d2), d3);
    assert_eq!(ctx.previous_decl(d3), Some(d2));
    assert_eq!(ctx.previous_decl(d1), None);

    assert_eq!(ctx.redecls(d3).collect::<Vec<_>>(), vec![d3, d2, d1]);
    assert_eq!(ctx.redecls(d1).collect::<Vec<_>>(), vec![d1, d3, d2]);
    assert_eq!(ctx.redecls(d2).collect::<Vec<_>>(), vec![d2, d1, d3]);
}

#[test]
fn single_declaration_is_its_own_chain() {
    let mut ctx = AstContext::default();
    let v = int_var(&mut ctx, "v");
    assert_eq!(ctx.first_decl(v), v);
    assert_eq!(ctx.most_recent_decl(v), v);
    assert_eq!(ctx.redecls(v).collect::<Vec<_>>(), vec![v]);
}

#[test]
fn non_redeclarable_decls_have_no_chain() {
    let mut ctx = AstContext::default();
    let tu = ctx.translation_unit();
    let s = ctx.create_record(tu, TagKind::Struct, "S", loc(1));
    let field = ctx.create_field(s, "a", int(), None, loc(2));
    assert_eq!(ctx.decl(field).redecl, None);
    assert_eq!(ctx.first_decl(field), field);
    assert_eq!(ctx.redecls(field).collect::<Vec<_>>(), vec![field]);
}

#[test]
#[should_panic(expected = "redeclaration of a different kind of entity")]
fn chaining_different_kinds_panics() {
    let mut ctx = AstContext::default();
    let tu = ctx.translation_unit();
    let v = int_var(&mut ctx, "x");
    let fty = ctx.types.function(int(), &[], false);
    let f = ctx.create_function(tu, "x", fty, &[], StorageClass::None, loc(1));
    ctx.set_previous_decl(f, v);
}

#[test]
fn definition_is_found_from_any_redeclaration() {
    let mut ctx = AstContext::default();
    let tu = ctx.translation_unit();
    let fwd = ctx.create_record(tu, TagKind::Class, "C", loc(1));
    let def = ctx.create_record(tu, TagKind::Class, "C", loc(2));
    ctx.set_previous_decl(def, fwd);
    let data = ctx.complete_record_definition(def, Vec::new(), DefinitionFlags::EMPTY);
    let later = ctx.create_record(tu, TagKind::Class, "C", loc(3));
    ctx.set_previous_decl(later, def);

    assert_eq!(ctx.definition_of(fwd), Some(def));
    assert_eq!(ctx.definition_of(later), Some(def));
    for d in [fwd, def, later] {
        match &ctx.decl(d).data {
            DeclData::Record(r) => assert_eq!(r.definition, Some(data)),
            other => panic!("unexpected {}", other.class()),
        }
    }
    assert_eq!(
        ctx.record_definition(fwd).map(|d| d.definition),
        Some(def)
    );
}

#[test]
fn template_state_is_shared_along_the_chain() {
    let mut ctx = AstContext::default();
    let tu = ctx.translation_unit();
    let pattern1 = ctx.create_record(tu, TagKind::Struct, "V", loc(1));
    let t1 = ctx.create_class_template(tu, &[], pattern1, loc(1));
    let pattern2 = ctx.create_record(tu, TagKind::Struct, "V", loc(2));
    let t2 = ctx.create_class_template(tu, &[], pattern2, loc(2));
    ctx.set_previous_decl(t2, t1);

    let spec = ctx.create_record(tu, TagKind::Struct, "V", loc(3));
    ctx.add_specialization(t2, spec);
    ctx.add_specialization(t1, spec);

    let common = ctx.get_or_create_template_common(t1);
    assert_eq!(ctx.get_or_create_template_common(t2), common);
    assert_eq!(ctx.template_common(common).specializations, vec![spec]);
}

#[test]
fn function_template_marks_its_pattern() {
    let mut ctx = AstContext::default();
    let tu = ctx.translation_unit();
    let parm = ctx.create_template_type_parm(tu, "T", 0, 0, false, loc(1));
    let fty = ctx.types.function(int(), &[], false);
    let f = ctx.create_function(tu, "g", fty, &[], StorageClass::None, loc(2));
    let t = ctx.create_function_template(tu, &[parm], f, loc(1));
    assert_eq!(ctx.decl(f).data.function().and_then(|d| d.described_template), Some(t));
    assert_eq!(ctx.decl_name(t), "g");
}

#[test]
fn method_lives_in_its_record() {
    let mut ctx = AstContext::default();
    let tu = ctx.translation_unit();
    let s = ctx.create_record(tu, TagKind::Class, "S", loc(1));
    let fty = ctx.types.function(TypeId::VOID.into(), &[], false);
    let m = ctx.create_method(s, "m", fty, &[], MethodFlags::CONST, loc(2));
    assert_eq!(ctx.decls_in(s), &[m]);
    assert!(ctx.decl(m).data.method().is_some_and(|d| d.method_flags.contains(MethodFlags::CONST)));
}

// === Layout ===

fn define_struct(
    ctx: &mut AstContext,
    kind: TagKind,
    fields: &[(QualType, Option<u64>)],
) -> DeclId {
    let tu = ctx.translation_unit();
    let s = ctx.create_record(tu, kind, "S", loc(1));
    for (i, &(ty, width)) in fields.iter().enumerate() {
        let width = width.map(|w| lit(ctx, w));
        ctx.create_field(s, &format!("f{i}"), ty, width, loc(2));
    }
    ctx.complete_record_definition(s, Vec::new(), DefinitionFlags::empty());
    s
}

#[test]
fn struct_fields_are_aligned() {
    let mut ctx = AstContext::default();
    let s = define_struct(
        &mut ctx,
        TagKind::Struct,
        &[(TypeId::CHAR.into(), None), (int(), None), (TypeId::SHORT.into(), None)],
    );
    let layout = ctx.record_layout(s);
    assert_eq!(
        layout,
        RecordLayout {
            size: 12,
            align: 4,
            field_offsets: vec![0, 32, 64],
        }
    );
}

#[test]
fn long_long_alignment_follows_target() {
    let fields = [(TypeId::CHAR.into(), None), (TypeId::LONG_LONG.into(), None)];

    let mut x64 = AstContext::default();
    let s = define_struct(&mut x64, TagKind::Struct, &fields);
    assert_eq!(x64.record_layout(s).size, 16);

    let mut x86 = AstContext::new(LangOptions::default(), TargetInfo::i386());
    let s = define_struct(&mut x86, TagKind::Struct, &fields);
    let layout = x86.record_layout(s);
    assert_eq!(layout.size, 12);
    assert_eq!(layout.align, 4);
}

#[test]
fn bit_fields_pack_within_storage_units() {
    let mut ctx = AstContext::default();
    let s = define_struct(
        &mut ctx,
        TagKind::Struct,
        &[(int(), Some(3)), (int(), Some(4)), (int(), Some(30))],
    );
    let layout = ctx.record_layout(s);
    assert_eq!(layout.field_offsets, vec![0, 3, 32]);
    assert_eq!(layout.size, 8);
}

#[test]
fn zero_width_bit_field_closes_the_unit() {
    let mut ctx = AstContext::default();
    let s = define_struct(
        &mut ctx,
        TagKind::Struct,
        &[(int(), Some(1)), (int(), Some(0)), (int(), Some(1))],
    );
    assert_eq!(ctx.record_layout(s).field_offsets, vec![0, 32, 32]);
}

#[test]
fn union_members_overlap() {
    let mut ctx = AstContext::default();
    let u = define_struct(
        &mut ctx,
        TagKind::Union,
        &[(TypeId::CHAR.into(), None), (TypeId::DOUBLE.into(), None)],
    );
    let layout = ctx.record_layout(u);
    assert_eq!(layout.field_offsets, vec![0, 0]);
    assert_eq!(layout.size, 8);
    assert_eq!(layout.align, 8);
}

#[test]
fn empty_class_has_size_one_in_cplusplus() {
    let mut ctx = AstContext::default();
    let s = define_struct(&mut ctx, TagKind::Struct, &[]);
    assert_eq!(ctx.record_layout(s).size, 1);

    let mut c = AstContext::new(LangOptions::c99(), TargetInfo::default());
    let s = define_struct(&mut c, TagKind::Struct, &[]);
    assert_eq!(c.record_layout(s).size, 0);
}

#[test]
fn incomplete_types() {
    let mut ctx = AstContext::default();
    let tu = ctx.translation_unit();
    let fwd = ctx.create_record(tu, TagKind::Struct, "F", loc(1));
    let fwd_ty = ctx.types.record(fwd);
    let unknown_bound = ctx.types.incomplete_array(int());

    assert!(ctx.is_incomplete_type(TypeId::VOID.into()));
    assert!(ctx.is_incomplete_type(fwd_ty));
    assert!(ctx.is_incomplete_type(unknown_bound));
    assert!(!ctx.is_incomplete_type(int()));

    ctx.complete_record_definition(fwd, Vec::new(), DefinitionFlags::empty());
    assert!(!ctx.is_incomplete_type(fwd_ty));
}

#[test]
fn typedef_sizes_follow_the_underlying_type() {
    let mut ctx = AstContext::default();
    let tu = ctx.translation_unit();
    let (_, size_t) = ctx.create_typedef(tu, "size_t", TypeId::ULONG.into(), loc(1));
    let volatile = QualType::new(size_t.ty, Qualifiers::VOLATILE);
    assert_eq!(ctx.type_size(volatile), 8);
    assert_eq!(ctx.type_align(size_t), 8);
}

#[test]
#[should_panic(expected = "layout of incomplete class 'S'")]
fn layout_of_incomplete_class_panics() {
    let mut ctx = AstContext::default();
    let tu = ctx.translation_unit();
    let s = ctx.create_record(tu, TagKind::Struct, "S", loc(1));
    ctx.record_layout(s);
}
