use pretty_assertions::assert_eq;

use super::*;

#[test]
fn full_name_joins_the_parent_chain() {
    let mut table = SubmoduleTable::default();
    let top = table.create("Top", None, false);
    let sub = table.create("Sub", Some(top), true);
    let leaf = table.create("Leaf", Some(sub), false);

    assert_eq!(table.full_name(top), "Top");
    assert_eq!(table.full_name(leaf), "Top.Sub.Leaf");
    assert_eq!(table.len(), 3);
    assert!(table.get(sub).is_explicit);
}

#[test]
fn iteration_follows_creation_order() {
    let mut table = SubmoduleTable::default();
    let a = table.create("A", None, false);
    let b = table.create("B", Some(a), false);
    let ids: Vec<SubmoduleId> = table.iter().map(|(id, _)| id).collect();
    assert_eq!(ids, vec![a, b]);
}
