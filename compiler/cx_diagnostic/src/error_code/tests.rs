use pretty_assertions::assert_eq;

use super::*;

#[test]
fn display_matches_name() {
    assert_eq!(ErrorCode::E1002.to_string(), "E1002");
    assert_eq!(ErrorCode::E9005.as_str(), "E9005");
}

#[test]
fn ranges_are_disjoint() {
    for code in ErrorCode::ALL {
        let ranges = [
            code.is_eval_error(),
            code.is_ice_error(),
            code.is_serialization_error(),
            code.is_warning(),
        ];
        assert_eq!(
            ranges.iter().filter(|&&r| r).count(),
            1,
            "{code} must be in exactly one range"
        );
    }
}

#[test]
fn parse_round_trips_every_code() {
    for &code in ErrorCode::ALL {
        assert_eq!(code.as_str().parse::<ErrorCode>(), Ok(code));
    }
    assert_eq!("e9001".parse::<ErrorCode>(), Ok(ErrorCode::E9001));
    assert_eq!("E0000".parse::<ErrorCode>(), Err(()));
}

#[test]
fn all_is_sorted_and_unique() {
    let names: Vec<&str> = ErrorCode::ALL.iter().map(ErrorCode::as_str).collect();
    let mut sorted = names.clone();
    sorted.sort_unstable();
    sorted.dedup();
    assert_eq!(names, sorted);
}
