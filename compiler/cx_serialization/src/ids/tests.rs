use pretty_assertions::assert_eq;
use proptest::prelude::*;

use super::*;

#[test]
fn predefined_counts() {
    assert_eq!(IdSpaceKind::Decl.num_predefined(), 2);
    assert_eq!(IdSpaceKind::Type.num_predefined(), 20);
    for kind in &IdSpaceKind::ALL[2..] {
        assert_eq!(kind.num_predefined(), 1, "{kind}");
    }
    assert_eq!(PREDEF_DECL_TRANSLATION_UNIT.raw(), 1);
    assert!(PREDEF_DECL_NULL.is_none());
}

#[test]
fn space_indices_are_dense() {
    for (i, kind) in IdSpaceKind::ALL.iter().enumerate() {
        assert_eq!(kind.index(), i);
    }
    assert_eq!(IdSpaceKind::COUNT, 7);
}

#[test]
fn builtin_type_references() {
    let int = TypeIdx::builtin(TypeId::INT, Qualifiers::empty());
    assert_eq!(int.index(), TypeId::INT.raw() + 1);
    assert_eq!(int.as_builtin(), Some(TypeId::INT));

    let void = TypeIdx::builtin(TypeId::VOID, Qualifiers::CONST);
    assert_eq!(void.as_builtin(), Some(TypeId::VOID));
    assert_eq!(void.quals(), Qualifiers::CONST);

    assert!(TypeIdx::NULL.is_null());
    assert_eq!(TypeIdx::NULL.as_builtin(), None);
    assert_eq!(TypeIdx::new(NUM_PREDEF_TYPE_IDS, Qualifiers::empty()).as_builtin(), None);
}

#[test]
#[should_panic(expected = "does not fit")]
fn oversized_type_index_panics() {
    let _ = TypeIdx::new(u32::MAX >> 2, Qualifiers::empty());
}

proptest! {
    #[test]
    fn type_reference_keeps_index_and_quals(index in 0u32..(1 << 29), bits in 0u8..8) {
        let quals = Qualifiers::from_bits_truncate(bits);
        let t = TypeIdx::new(index, quals);
        prop_assert_eq!(t.index(), index);
        prop_assert_eq!(t.quals(), quals);
        prop_assert_eq!(TypeIdx::from_raw(t.raw()), t);
        prop_assert_eq!(t.with_index(7).quals(), quals);
    }
}
