use pretty_assertions::assert_eq;

use super::*;

#[test]
fn zero_location_is_invalid() {
    assert!(!SourceLocation::INVALID.is_valid());
    assert!(SourceLocation::from_raw(1).is_valid());
    assert_eq!(format!("{:?}", SourceLocation::INVALID), "loc:<invalid>");
}

#[test]
fn files_get_disjoint_slices() {
    let mut sm = SourceManager::new();
    let a = sm.create_file("a.h", 10);
    let b = sm.create_file("b.h", 5);

    assert_eq!(sm.file(a).base, 1);
    assert_eq!(sm.file(b).base, 12);
    assert_eq!(sm.next_offset(), 18);
}

#[test]
fn decompose_finds_owning_file() {
    let mut sm = SourceManager::new();
    let a = sm.create_file("a.h", 10);
    let b = sm.create_file("b.h", 5);

    let loc = sm.location(b, 3);
    assert_eq!(sm.decompose(loc), Some((b, 3)));
    assert_eq!(sm.decompose(sm.location(a, 10)), Some((a, 10)));
    assert_eq!(sm.decompose(SourceLocation::INVALID), None);
    assert_eq!(sm.decompose(SourceLocation::from_raw(1000)), None);
}

#[test]
#[should_panic(expected = "past the end")]
fn location_past_end_panics() {
    let mut sm = SourceManager::new();
    let a = sm.create_file("a.h", 4);
    let _ = sm.location(a, 5);
}
