use pretty_assertions::assert_eq;
use proptest::prelude::*;

use super::*;

fn i32v(v: i128) -> ApsInt {
    ApsInt::new(v, 32, true)
}

fn u32v(v: i128) -> ApsInt {
    ApsInt::new(v, 32, false)
}

#[test]
fn construction_truncates_to_width() {
    assert_eq!(ApsInt::new(0x1ff, 8, false).value, 0xff);
    assert_eq!(ApsInt::new(0xff, 8, true).value, -1);
    assert_eq!(ApsInt::new(-1, 16, false).value, 0xffff);
    assert_eq!(ApsInt::from_bool(true, 1).value, 1);
}

#[test]
fn signed_overflow_wraps() {
    let max = i32v(i128::from(i32::MAX));
    assert_eq!(max.wrapping_add(i32v(1)).value, i128::from(i32::MIN));
    assert!(i32v(i128::from(i32::MIN)).is_min_signed());
    assert!(!u32v(0x8000_0000).is_min_signed());
}

#[test]
fn unsigned_negation_wraps() {
    assert_eq!(u32v(1).wrapping_neg().value, 0xffff_ffff);
    assert!(!u32v(1).wrapping_neg().is_negative());
}

#[test]
fn division_by_zero_is_rejected() {
    assert_eq!(i32v(7).checked_div(i32v(0)), None);
    assert_eq!(i32v(7).checked_rem(i32v(0)), None);
    assert_eq!(i32v(-7).checked_div(i32v(2)).map(|v| v.value), Some(-3));
    assert_eq!(i32v(-7).checked_rem(i32v(2)).map(|v| v.value), Some(-1));
}

#[test]
fn int_min_divided_by_minus_one_wraps() {
    let min = i32v(i128::from(i32::MIN));
    assert_eq!(min.checked_div(i32v(-1)).map(|v| v.value), Some(i128::from(i32::MIN)));
}

#[test]
fn shifts_reject_out_of_range_amounts() {
    assert_eq!(i32v(1).checked_shl(i32v(32)), None);
    assert_eq!(i32v(1).checked_shl(i32v(-1)), None);
    assert_eq!(i32v(1).checked_shl(i32v(31)).map(|v| v.value), Some(i128::from(i32::MIN)));
    assert_eq!(i32v(-8).checked_shr(i32v(1)).map(|v| v.value), Some(-4));
    assert_eq!(u32v(0x8000_0000).checked_shr(i32v(31)).map(|v| v.value), Some(1));
}

#[test]
fn conversion_changes_interpretation() {
    let minus_one = i32v(-1);
    assert_eq!(minus_one.convert(32, false).value, 0xffff_ffff);
    assert_eq!(minus_one.convert(64, true).value, -1);
    assert_eq!(u32v(0x1_0000).convert(16, false).value, 0);
}

#[test]
fn truth_values() {
    assert_eq!(APValue::Int(i32v(0)).to_bool(), Some(false));
    assert_eq!(APValue::Float(0.5).to_bool(), Some(true));
    assert_eq!(
        APValue::LValue {
            base: LValueBase::Null,
            offset: 0
        }
        .to_bool(),
        Some(false)
    );
    assert_eq!(
        APValue::LValue {
            base: LValueBase::Decl(DeclId::new(3)),
            offset: 0
        }
        .to_bool(),
        Some(true)
    );
    assert_eq!(APValue::Void.to_bool(), None);
}

proptest! {
    #[test]
    fn arithmetic_matches_native_i32(a in any::<i32>(), b in any::<i32>()) {
        let (x, y) = (i32v(i128::from(a)), i32v(i128::from(b)));
        prop_assert_eq!(x.wrapping_add(y).value, i128::from(a.wrapping_add(b)));
        prop_assert_eq!(x.wrapping_sub(y).value, i128::from(a.wrapping_sub(b)));
        prop_assert_eq!(x.wrapping_mul(y).value, i128::from(a.wrapping_mul(b)));
        prop_assert_eq!(x.bitxor(y).value, i128::from(a ^ b));
        if b != 0 {
            prop_assert_eq!(x.checked_div(y).map(|v| v.value), Some(i128::from(a.wrapping_div(b))));
        }
    }

    #[test]
    fn arithmetic_matches_native_u16(a in any::<u16>(), b in any::<u16>()) {
        let x = ApsInt::new(i128::from(a), 16, false);
        let y = ApsInt::new(i128::from(b), 16, false);
        prop_assert_eq!(x.wrapping_sub(y).value, i128::from(a.wrapping_sub(b)));
        prop_assert_eq!(x.not().value, i128::from(!a));
    }
}
