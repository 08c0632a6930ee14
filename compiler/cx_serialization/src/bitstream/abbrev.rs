//! Abbreviation definitions.
//!
//! An abbreviation describes the shape of a record: a list of operands,
//! one per field, where the record code counts as the first field. Records
//! emitted through an abbreviation drop the per-field VBR6 framing and
//! literal fields vanish from the stream entirely.

use smallvec::SmallVec;

/// One operand of an abbreviation.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum AbbrevOp {
    /// Field always holds this value; nothing is emitted.
    Literal(u64),
    /// Fixed-width field.
    Fixed(u32),
    /// Variable-width field with the given chunk width.
    Vbr(u32),
    /// Count-prefixed sequence of the operand that follows it. Must be the
    /// second-to-last operand.
    Array,
    /// Six-bit character `[a-zA-Z0-9._]`.
    Char6,
    /// Length-prefixed, 32-bit aligned byte blob. Must be last.
    Blob,
}

impl AbbrevOp {
    pub(crate) const ENCODING_FIXED: u64 = 1;
    pub(crate) const ENCODING_VBR: u64 = 2;
    pub(crate) const ENCODING_ARRAY: u64 = 3;
    pub(crate) const ENCODING_CHAR6: u64 = 4;
    pub(crate) const ENCODING_BLOB: u64 = 5;

    /// Whether this operand carries a single scalar field.
    pub fn is_scalar(self) -> bool {
        matches!(
            self,
            AbbrevOp::Literal(_) | AbbrevOp::Fixed(_) | AbbrevOp::Vbr(_) | AbbrevOp::Char6
        )
    }
}

#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct Abbrev {
    ops: SmallVec<[AbbrevOp; 8]>,
}

impl Abbrev {
    /// # Panics
    /// Panics if an `Array` is not followed by exactly one scalar element
    /// operand, or a `Blob` is not the final operand.
    pub fn new(ops: &[AbbrevOp]) -> Self {
        for (i, op) in ops.iter().enumerate() {
            match op {
                AbbrevOp::Array => assert!(
                    i + 2 == ops.len() && ops[i + 1].is_scalar(),
                    "array operand must be followed by exactly one element operand"
                ),
                AbbrevOp::Blob => assert!(i + 1 == ops.len(), "blob operand must be last"),
                AbbrevOp::Fixed(w) | AbbrevOp::Vbr(w) => {
                    assert!(*w <= 64, "operand width {w} exceeds 64 bits");
                }
                AbbrevOp::Literal(_) | AbbrevOp::Char6 => {}
            }
        }
        Self {
            ops: SmallVec::from_slice(ops),
        }
    }

    /// Build without shape checks; the reader validates as it decodes.
    pub(crate) fn from_ops(ops: SmallVec<[AbbrevOp; 8]>) -> Self {
        Self { ops }
    }

    #[inline]
    pub fn ops(&self) -> &[AbbrevOp] {
        &self.ops
    }

    /// Whether the record has a trailing blob.
    pub fn has_blob(&self) -> bool {
        matches!(self.ops.last(), Some(AbbrevOp::Blob))
    }
}

#[inline]
pub fn is_char6(c: u8) -> bool {
    c.is_ascii_alphanumeric() || c == b'.' || c == b'_'
}

/// # Panics
/// Panics if `c` is not a char6 character.
pub fn encode_char6(c: u8) -> u32 {
    match c {
        b'a'..=b'z' => u32::from(c - b'a'),
        b'A'..=b'Z' => u32::from(c - b'A') + 26,
        b'0'..=b'9' => u32::from(c - b'0') + 52,
        b'.' => 62,
        b'_' => 63,
        _ => panic!("{:?} is not a char6 character", char::from(c)),
    }
}

pub fn decode_char6(v: u64) -> u8 {
    match v & 63 {
        v @ 0..=25 => b'a' + v as u8,
        v @ 26..=51 => b'A' + (v - 26) as u8,
        v @ 52..=61 => b'0' + (v - 52) as u8,
        62 => b'.',
        _ => b'_',
    }
}
