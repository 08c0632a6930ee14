use pretty_assertions::assert_eq;
use proptest::prelude::*;

use super::*;

#[test]
fn find_picks_greatest_start_not_above_key() {
    let mut map = ContinuousRangeMap::new();
    map.insert(10u32, "a");
    map.insert(20, "b");
    map.insert(35, "c");

    assert_eq!(map.find(9), None);
    assert_eq!(map.find(10), Some((10, &"a")));
    assert_eq!(map.find(19), Some((10, &"a")));
    assert_eq!(map.find(20), Some((20, &"b")));
    assert_eq!(map.find(u32::MAX), Some((35, &"c")));
}

#[test]
fn empty_map_finds_nothing() {
    let map: ContinuousRangeMap<u32, ()> = ContinuousRangeMap::new();
    assert!(map.is_empty());
    assert_eq!(map.find(0), None);
}

#[test]
#[should_panic(expected = "inserted in order")]
fn out_of_order_insert_panics() {
    let mut map = ContinuousRangeMap::new();
    map.insert(5u32, ());
    map.insert(5, ());
}

#[test]
fn builder_sorts_and_keeps_first_duplicate() {
    let mut map = ContinuousRangeMap::new();
    map.insert(100u32, "existing");
    {
        let mut b = map.builder();
        b.insert(50, "second");
        b.insert(100, "dropped");
        b.insert(0, "first");
        b.insert(50, "dropped too");
        b.finish();
    }
    let entries: Vec<_> = map.iter().map(|(k, v)| (k, *v)).collect();
    assert_eq!(entries, vec![(0, "first"), (50, "second"), (100, "existing")]);
}

proptest! {
    #[test]
    fn find_is_order_independent(
        starts in proptest::collection::vec(0u32..1000, 1..20),
        key in 0u32..1100,
    ) {
        let mut forward = ContinuousRangeMap::new();
        {
            let mut b = forward.builder();
            for &s in &starts {
                b.insert(s, s);
            }
        }
        let mut backward = ContinuousRangeMap::new();
        {
            let mut b = backward.builder();
            for &s in starts.iter().rev() {
                b.insert(s, s);
            }
        }
        prop_assert_eq!(forward.find(key), backward.find(key));
        let expected = starts.iter().copied().filter(|&s| s <= key).max();
        prop_assert_eq!(forward.find(key).map(|(k, _)| k), expected);
    }
}
