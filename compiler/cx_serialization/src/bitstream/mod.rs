//! Bitstream container.
//!
//! The container is a sequence of nested blocks. Each block opens with its
//! ID, the bit width of the abbreviation IDs used inside it and its length
//! in 32-bit words, so a reader can skip a whole block without decoding it.
//! Inside a block every entry starts with an abbreviation ID:
//!
//! | ID | Entry                                       |
//! |----|---------------------------------------------|
//! | 0  | `END_BLOCK`                                 |
//! | 1  | `ENTER_SUBBLOCK`                            |
//! | 2  | `DEFINE_ABBREV` (scoped to the block)       |
//! | 3  | unabbreviated record: code, count, VBR6s    |
//! | 4+ | record laid out by a defined abbreviation   |
//!
//! Values are little-endian, LSB first. A VBR-n value is split into
//! `n - 1` bit chunks, each with a continuation bit on top.

mod abbrev;
mod cursor;
mod writer;

pub use abbrev::{decode_char6, encode_char6, is_char6, Abbrev, AbbrevOp};
pub use cursor::{BitstreamCursor, SavedStreamPosition};
pub use writer::BitstreamWriter;

use crate::{Result, SerializationError};

pub const END_BLOCK: u32 = 0;
pub const ENTER_SUBBLOCK: u32 = 1;
pub const DEFINE_ABBREV: u32 = 2;
pub const UNABBREV_RECORD: u32 = 3;
pub const FIRST_APPLICATION_ABBREV: u32 = 4;

/// Abbreviation width outside of any block.
pub const TOP_LEVEL_CODE_WIDTH: u32 = 2;

/// What [`BitstreamCursor::advance`] found.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Entry {
    /// The current block ended; the cursor is back in its parent.
    EndBlock,
    /// A nested block with this ID starts; enter or skip it next.
    SubBlock(u32),
    /// A record introduced by this abbreviation ID; read it next.
    Record(u32),
}

/// A decoded record.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Record {
    pub code: u32,
    pub values: Vec<u64>,
    pub blob: Option<Vec<u8>>,
}

impl Record {
    pub fn fields(&self) -> RecordFields<'_> {
        RecordFields {
            code: self.code,
            values: &self.values,
            pos: 0,
        }
    }

    pub fn blob(&self) -> Result<&[u8]> {
        self.blob.as_deref().ok_or_else(|| {
            SerializationError::malformed(format!("record {} is missing its blob", self.code))
        })
    }
}

/// Sequential reader over a record's fields.
#[derive(Clone, Debug)]
pub struct RecordFields<'r> {
    code: u32,
    values: &'r [u64],
    pos: usize,
}

impl<'r> RecordFields<'r> {
    pub fn new(code: u32, values: &'r [u64]) -> Self {
        Self { code, values, pos: 0 }
    }

    #[inline]
    pub fn code(&self) -> u32 {
        self.code
    }

    pub fn next_u64(&mut self) -> Result<u64> {
        let v = self
            .values
            .get(self.pos)
            .copied()
            .ok_or(SerializationError::RecordLengthMismatch {
                code: self.code,
                expected: self.pos + 1,
                found: self.values.len(),
            })?;
        self.pos += 1;
        Ok(v)
    }

    pub fn next_u32(&mut self) -> Result<u32> {
        let v = self.next_u64()?;
        u32::try_from(v).map_err(|_| {
            SerializationError::malformed(format!(
                "field {} of record {} does not fit 32 bits",
                self.pos - 1,
                self.code
            ))
        })
    }

    pub fn next_usize(&mut self) -> Result<usize> {
        self.next_u32().map(|v| v as usize)
    }

    /// Element count of a list stored in the fields that follow. Every
    /// element takes at least one field, so a count larger than what is
    /// left is rejected before anything is allocated for it.
    pub fn next_count(&mut self) -> Result<usize> {
        let n = self.next_usize()?;
        let left = self.values.len() - self.pos;
        if n > left {
            return Err(SerializationError::malformed(format!(
                "record {} announces {n} list elements but has {left} fields left",
                self.code
            )));
        }
        Ok(n)
    }

    pub fn next_bool(&mut self) -> Result<bool> {
        match self.next_u64()? {
            0 => Ok(false),
            1 => Ok(true),
            v => Err(SerializationError::malformed(format!(
                "field {} of record {} is {v}, expected a flag",
                self.pos - 1,
                self.code
            ))),
        }
    }

    pub fn next_i64(&mut self) -> Result<i64> {
        self.next_u64().map(decode_signed)
    }

    /// Next field decoded by `from_raw`; `what` names the enum in the
    /// error.
    pub fn next_enum<T>(
        &mut self,
        what: &str,
        from_raw: impl FnOnce(u64) -> Option<T>,
    ) -> Result<T> {
        let v = self.next_u64()?;
        from_raw(v).ok_or_else(|| {
            SerializationError::malformed(format!(
                "{v} is not a valid {what} in record {}",
                self.code
            ))
        })
    }

    /// Take the next `n` fields at once.
    pub fn take(&mut self, n: usize) -> Result<&'r [u64]> {
        let end = self.pos.checked_add(n).filter(|&e| e <= self.values.len()).ok_or(
            SerializationError::RecordLengthMismatch {
                code: self.code,
                expected: self.pos.saturating_add(n),
                found: self.values.len(),
            },
        )?;
        let out = &self.values[self.pos..end];
        self.pos = end;
        Ok(out)
    }

    #[inline]
    pub fn remaining(&self) -> &'r [u64] {
        &self.values[self.pos..]
    }

    #[inline]
    pub fn is_exhausted(&self) -> bool {
        self.pos >= self.values.len()
    }

    /// Require that every field was consumed.
    pub fn finish(&self) -> Result<()> {
        if self.pos == self.values.len() {
            Ok(())
        } else {
            Err(SerializationError::RecordLengthMismatch {
                code: self.code,
                expected: self.pos,
                found: self.values.len(),
            })
        }
    }
}

/// Zigzag-encode a signed value so small magnitudes stay short as VBR.
#[inline]
pub fn encode_signed(v: i64) -> u64 {
    ((v << 1) ^ (v >> 63)) as u64
}

#[inline]
pub fn decode_signed(v: u64) -> i64 {
    ((v >> 1) as i64) ^ -((v & 1) as i64)
}

#[cfg(test)]
mod tests;
