use super::*;

#[test]
fn index_validity() {
    let id = DeclId::new(7);
    assert!(id.is_valid());
    assert_eq!(id.index(), 7);
    assert_eq!(id.raw(), 7);
    assert!(!DeclId::INVALID.is_valid());
    assert!(!ExprId::default().is_valid());
}

#[test]
fn index_debug_format() {
    assert_eq!(format!("{:?}", ExprId::new(3)), "ExprId(3)");
    assert_eq!(format!("{:?}", StmtId::INVALID), "StmtId::INVALID");
}

#[test]
fn range_indices() {
    let range = ExprRange::new(10, 3);
    assert!(!range.is_empty());
    assert_eq!(range.len(), 3);
    assert_eq!(range.indices().collect::<Vec<_>>(), vec![10, 11, 12]);
    assert_eq!(format!("{range:?}"), "ExprRange(10..13)");
}

#[test]
fn empty_range() {
    assert!(DesignatorRange::EMPTY.is_empty());
    assert_eq!(TemplateArgRange::default().indices().count(), 0);
}

#[test]
fn node_ref_projections() {
    let e = NodeRef::from(ExprId::new(1));
    let s = NodeRef::from(StmtId::new(2));
    assert_eq!(e.as_expr(), Some(ExprId::new(1)));
    assert_eq!(e.as_stmt(), None);
    assert_eq!(s.as_stmt(), Some(StmtId::new(2)));
}

#[test]
fn index_sizes() {
    assert_eq!(std::mem::size_of::<ExprId>(), 4);
    assert_eq!(std::mem::size_of::<ExprRange>(), 8);
}

#[test]
#[should_panic(expected = "too long")]
fn oversized_list_panics() {
    let _ = to_u16(70_000, "argument list");
}
