use pretty_assertions::assert_eq;

use super::*;
use crate::TypeId;

#[test]
fn empty_ranges_do_not_touch_pools() {
    let mut storage = TrailingStorage::new();
    let range = storage.alloc_exprs(&[]);
    assert_eq!(range, ExprRange::EMPTY);
    assert!(storage.exprs(range).is_empty());
    // A bogus empty range is still safe.
    assert!(storage.exprs(ExprRange::new(999, 0)).is_empty());
}

#[test]
fn ranges_are_contiguous_and_ordered() {
    let mut storage = TrailingStorage::new();
    let a = storage.alloc_exprs(&[ExprId::new(1), ExprId::new(2)]);
    let b = storage.alloc_exprs(&[ExprId::new(7)]);
    assert_eq!(storage.exprs(a), &[ExprId::new(1), ExprId::new(2)]);
    assert_eq!(storage.exprs(b), &[ExprId::new(7)]);
    assert_eq!(b.start, 2);
}

#[test]
#[should_panic]
fn reading_past_a_range_panics() {
    let mut storage = TrailingStorage::new();
    let r = storage.alloc_exprs(&[ExprId::new(1)]);
    let _ = storage.exprs(r)[1];
}

#[test]
fn slot_offsets_skip_absent_sections() {
    let layout = TrailingLayout {
        present: TrailingSections::HAS_QUALIFIER | TrailingSections::HAS_TEMPLATE_ARGS,
        start: 10,
    };
    assert_eq!(layout.slot(TrailingSections::HAS_QUALIFIER), Some(10));
    assert_eq!(layout.slot(TrailingSections::HAS_FOUND_DECL), None);
    assert_eq!(layout.slot(TrailingSections::HAS_TEMPLATE_ARGS), Some(11));
    assert_eq!(layout.len(), 2);
}

#[test]
fn sections_round_trip_through_the_pool() {
    let mut storage = TrailingStorage::new();
    let args = storage.alloc_template_args(&[TemplateArgumentLoc {
        arg: TemplateArgument::Type(TypeId::INT.into()),
        loc: SourceLocation::from_raw(5),
    }]);

    let only_found = storage.alloc_sections(None, Some(DeclId::new(3)), None);
    let all = storage.alloc_sections(
        Some((NestedNameSpecifier::Global, SourceRange::default())),
        Some(DeclId::new(4)),
        Some(ExplicitTemplateArgs {
            args,
            langle: SourceLocation::from_raw(1),
            rangle: SourceLocation::from_raw(2),
        }),
    );

    assert_eq!(storage.found_decl(only_found), Some(DeclId::new(3)));
    assert_eq!(storage.qualifier(only_found), None);
    assert_eq!(storage.found_decl(all), Some(DeclId::new(4)));
    assert_eq!(
        storage.qualifier(all).map(|(s, _)| s),
        Some(NestedNameSpecifier::Global)
    );
    assert_eq!(storage.template_args_of(all).len(), 1);
    assert!(storage.template_args_of(only_found).is_empty());
}

#[test]
fn no_sections_yields_none_layout() {
    let mut storage = TrailingStorage::new();
    assert_eq!(storage.alloc_sections(None, None, None), TrailingLayout::NONE);
}
