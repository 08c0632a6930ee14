use pretty_assertions::assert_eq;

use super::*;

#[test]
fn interning_is_stable() {
    let mut idents = IdentifierTable::new();
    let a = idents.intern("alpha");
    let b = idents.intern("beta");
    assert_ne!(a, b);
    assert_eq!(idents.intern("alpha"), a);
    assert_eq!(idents.as_str(b), "beta");
    assert_eq!(idents.get("gamma"), None);
}

#[test]
fn empty_name_is_preinterned() {
    let idents = IdentifierTable::new();
    assert_eq!(idents.get(""), Some(Name::EMPTY));
    assert!(idents.is_empty());
}

#[test]
fn selectors_render_like_source() {
    let mut idents = IdentifierTable::new();
    let init = idents.intern("initWithFoo");
    let bar = idents.intern("bar");
    let count = idents.intern("count");

    let mut sels = SelectorTable::new();
    let keyword = sels.intern(&[init, bar], 2);
    let nullary = sels.intern(&[count], 0);

    assert_eq!(sels.display(keyword, &idents), "initWithFoo:bar:");
    assert_eq!(sels.display(nullary, &idents), "count");
    assert_eq!(sels.intern(&[init, bar], 2), keyword);
    assert_eq!(sels.len(), 2);
}
