use pretty_assertions::assert_eq;

use super::*;

#[test]
fn record_code_ranges_do_not_overlap() {
    let last_type = type_code(*TypeClass::ALL.last().unwrap_or(&TypeClass::Builtin));
    assert!(last_type < DECL_CODE_BASE);
    let last_decl = decl_code(*DeclClass::ALL.last().unwrap_or(&DeclClass::TranslationUnit));
    assert!(last_decl < STMT_CODE_BASE);
    assert!(STMT_REF_PTR < TYPE_CODE_BASE);
}

#[test]
fn codes_round_trip_through_classes() {
    for &class in StmtClass::ALL {
        assert_eq!(stmt_class_for_code(stmt_code(class)), Some(class));
    }
    for &class in DeclClass::ALL {
        assert_eq!(decl_class_for_code(decl_code(class)), Some(class));
    }
    for &class in TypeClass::ALL {
        assert_eq!(type_class_for_code(type_code(class)), Some(class));
    }
}

#[test]
fn unknown_codes_map_to_nothing() {
    assert_eq!(stmt_class_for_code(STMT_STOP), None);
    assert_eq!(stmt_class_for_code(STMT_CODE_BASE + 200), None);
    assert_eq!(decl_class_for_code(DECL_CODE_BASE + 31), None);
    assert_eq!(type_class_for_code(3), None);
}

#[test]
fn block_ids_are_distinct() {
    let ids = [
        CONTROL_BLOCK_ID,
        AST_BLOCK_ID,
        SOURCE_MANAGER_BLOCK_ID,
        PREPROCESSOR_BLOCK_ID,
        SUBMODULE_BLOCK_ID,
        DECLTYPES_BLOCK_ID,
    ];
    let mut sorted = ids.to_vec();
    sorted.dedup();
    assert_eq!(sorted.len(), ids.len());
    assert!(ids.iter().all(|&id| id >= 8));
}
