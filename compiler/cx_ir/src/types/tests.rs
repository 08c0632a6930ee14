use pretty_assertions::assert_eq;

use super::*;

#[test]
fn builtins_at_fixed_indices() {
    let pool = TypePool::new();
    assert_eq!(pool.len(), TypeId::FIRST_DYNAMIC as usize);
    assert_eq!(pool.kind(TypeId::INT), &TypeKind::Builtin(BuiltinKind::Int));
    assert_eq!(pool.kind(TypeId::OBJC_SEL), &TypeKind::Builtin(BuiltinKind::ObjCSel));
    for b in BuiltinKind::ALL {
        assert_eq!(BuiltinKind::from_type_id(b.type_id()), Some(b));
    }
}

#[test]
fn interning_deduplicates() {
    let mut pool = TypePool::new();
    let p1 = pool.pointer(TypeId::INT.into());
    let p2 = pool.pointer(TypeId::INT.into());
    let p3 = pool.pointer(QualType::unqualified(TypeId::INT).with_const());
    assert_eq!(p1, p2);
    assert_ne!(p1, p3);
}

#[test]
fn arithmetic_flags() {
    let pool = TypePool::new();
    assert!(pool.is_integer_type(TypeId::INT.into()));
    assert!(pool.is_arithmetic_type(TypeId::DOUBLE.into()));
    assert!(pool.is_real_floating(TypeId::FLOAT.into()));
    assert!(!pool.is_integer_type(TypeId::FLOAT.into()));
    assert!(!pool.is_scalar_type(TypeId::VOID.into()));
    assert!(pool.is_signed_integer(TypeId::INT.into(), true));
    assert!(!pool.is_signed_integer(TypeId::UINT.into(), true));
    assert!(!pool.is_signed_integer(TypeId::CHAR.into(), false));
}

#[test]
fn references_are_flagged_and_strippable() {
    let mut pool = TypePool::new();
    let int = QualType::from(TypeId::INT).with_const();
    let lref = pool.lvalue_reference(int);
    let rref = pool.rvalue_reference(int);
    assert!(pool.is_reference_type(lref));
    assert!(pool.is_reference_type(rref));
    assert!(!pool.is_reference_type(int));
    assert_eq!(pool.non_reference_type(lref), int);
    assert_eq!(pool.non_reference_type(int), int);
}

#[test]
fn dependence_propagates_through_components() {
    let mut pool = TypePool::new();
    let t = pool.template_type_parm(0, 0, false, DeclId::new(5));
    let ptr = pool.pointer(t);
    let arr = pool.constant_array(ptr, 4);
    let fun = pool.function(TypeId::VOID.into(), &[arr], false);

    assert!(pool.is_dependent(t));
    assert!(pool.is_dependent(fun));
    assert!(!pool.flags(fun.ty).contains(TypeFlags::CONTAINS_UNEXPANDED_PACK));
}

#[test]
fn pack_expansion_consumes_unexpanded_pack() {
    let mut pool = TypePool::new();
    let pack = pool.template_type_parm(0, 0, true, DeclId::new(1));
    assert!(pool.flags(pack.ty).contains(TypeFlags::CONTAINS_UNEXPANDED_PACK));
    let expansion = pool.pack_expansion(pack);
    let f = pool.flags(expansion.ty);
    assert!(!f.contains(TypeFlags::CONTAINS_UNEXPANDED_PACK));
    assert!(f.contains(TypeFlags::DEPENDENT));
}

#[test]
fn typedef_canonicalizes_and_merges_qualifiers() {
    let mut pool = TypePool::new();
    let inner = pool.typedef(DeclId::new(1), QualType::from(TypeId::INT).with_const());
    let outer = pool.typedef(DeclId::new(2), inner);
    let volatile_outer = QualType::new(outer.ty, Qualifiers::VOLATILE);

    let canon = pool.canonical(volatile_outer);
    assert_eq!(canon.ty, TypeId::INT);
    assert_eq!(canon.quals, Qualifiers::CONST | Qualifiers::VOLATILE);
    assert!(pool.is_integer_type(outer));
}

#[test]
fn element_and_vector_queries() {
    let mut pool = TypePool::new();
    let v = pool.ext_vector(TypeId::FLOAT.into(), 4);
    assert_eq!(pool.vector_len(v), Some(4));
    assert_eq!(pool.element_type(v), Some(TypeId::FLOAT.into()));
    assert!(pool.is_ext_vector(v));
    assert_eq!(pool.vector_len(TypeId::INT.into()), None);
    assert_eq!(pool.class(v.ty), TypeClass::ExtVector);
}
