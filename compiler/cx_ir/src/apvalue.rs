//! Values produced by constant evaluation.

use std::cmp::Ordering;
use std::fmt;

use crate::{DeclId, ExprId};

/// Fixed-width integer with explicit signedness. Arithmetic wraps at
/// `width` bits.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct ApsInt {
    pub value: i128,
    pub width: u32,
    pub signed: bool,
}

impl ApsInt {
    /// `value` truncated to `width` bits and reinterpreted per `signed`.
    pub fn new(value: i128, width: u32, signed: bool) -> Self {
        assert!(width > 0 && width <= 128, "integer width {width} out of range");
        ApsInt {
            value: truncate(value, width, signed),
            width,
            signed,
        }
    }

    pub fn from_bool(b: bool, width: u32) -> Self {
        Self::new(i128::from(b), width, false)
    }

    #[inline]
    pub fn is_zero(self) -> bool {
        self.value == 0
    }

    #[inline]
    pub fn is_negative(self) -> bool {
        self.value < 0
    }

    /// Signed minimum of the width (`INT_MIN` for 32 bits).
    pub fn is_min_signed(self) -> bool {
        self.signed && self.width < 128 && self.value == -(1i128 << (self.width - 1))
    }

    pub fn to_i64(self) -> i64 {
        self.value as i64
    }

    /// Convert to another width and signedness (C integral conversion).
    #[must_use]
    pub fn convert(self, width: u32, signed: bool) -> Self {
        Self::new(self.value, width, signed)
    }

    #[must_use]
    pub fn wrapping_add(self, rhs: Self) -> Self {
        self.with(self.value.wrapping_add(rhs.value))
    }

    #[must_use]
    pub fn wrapping_sub(self, rhs: Self) -> Self {
        self.with(self.value.wrapping_sub(rhs.value))
    }

    #[must_use]
    pub fn wrapping_mul(self, rhs: Self) -> Self {
        self.with(self.value.wrapping_mul(rhs.value))
    }

    #[must_use]
    pub fn wrapping_neg(self) -> Self {
        self.with(self.value.wrapping_neg())
    }

    /// `None` on division by zero.
    pub fn checked_div(self, rhs: Self) -> Option<Self> {
        if rhs.is_zero() {
            return None;
        }
        Some(self.with(self.value.wrapping_div(rhs.value)))
    }

    pub fn checked_rem(self, rhs: Self) -> Option<Self> {
        if rhs.is_zero() {
            return None;
        }
        Some(self.with(self.value.wrapping_rem(rhs.value)))
    }

    /// `None` when the shift amount is negative or not below the width.
    pub fn checked_shl(self, amount: Self) -> Option<Self> {
        let n = self.shift_amount(amount)?;
        Some(self.with(self.value.wrapping_shl(n)))
    }

    pub fn checked_shr(self, amount: Self) -> Option<Self> {
        let n = self.shift_amount(amount)?;
        // Values are stored normalized, so an arithmetic shift is right
        // for signed and a logical one for unsigned.
        Some(self.with(self.value >> n))
    }

    fn shift_amount(self, amount: Self) -> Option<u32> {
        u32::try_from(amount.value).ok().filter(|&n| n < self.width)
    }

    #[must_use]
    pub fn bitand(self, rhs: Self) -> Self {
        self.with(self.value & rhs.value)
    }

    #[must_use]
    pub fn bitor(self, rhs: Self) -> Self {
        self.with(self.value | rhs.value)
    }

    #[must_use]
    pub fn bitxor(self, rhs: Self) -> Self {
        self.with(self.value ^ rhs.value)
    }

    #[must_use]
    pub fn not(self) -> Self {
        self.with(!self.value)
    }

    fn with(self, value: i128) -> Self {
        Self::new(value, self.width, self.signed)
    }
}

impl PartialOrd for ApsInt {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.value.cmp(&other.value))
    }
}

impl fmt::Display for ApsInt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

fn truncate(value: i128, width: u32, signed: bool) -> i128 {
    if width >= 128 {
        return value;
    }
    let mask = (1i128 << width) - 1;
    let bits = value & mask;
    if signed && bits >> (width - 1) & 1 == 1 {
        bits - (1i128 << width)
    } else {
        bits
    }
}

/// What an lvalue designates.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum LValueBase {
    /// The null pointer, or an integer cast to a pointer.
    Null,
    Decl(DeclId),
    /// A string or compound literal.
    Expr(ExprId),
}

#[derive(Clone, PartialEq, Debug)]
pub enum APValue {
    Int(ApsInt),
    Float(f64),
    /// `offset` is in bytes.
    LValue { base: LValueBase, offset: i64 },
    Vector(Vec<APValue>),
    Void,
}

impl APValue {
    pub fn as_int(&self) -> Option<ApsInt> {
        match self {
            APValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            APValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Truth value in a condition; `None` for vectors and `void`.
    pub fn to_bool(&self) -> Option<bool> {
        match self {
            APValue::Int(i) => Some(!i.is_zero()),
            APValue::Float(f) => Some(*f != 0.0),
            APValue::LValue { base, offset } => Some(*base != LValueBase::Null || *offset != 0),
            APValue::Vector(_) | APValue::Void => None,
        }
    }
}

#[cfg(test)]
mod tests;
