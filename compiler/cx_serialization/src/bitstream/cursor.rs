//! Bit-level reading.

use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use smallvec::SmallVec;

use super::abbrev::{decode_char6, Abbrev, AbbrevOp};
use super::{
    Entry, Record, DEFINE_ABBREV, END_BLOCK, ENTER_SUBBLOCK, FIRST_APPLICATION_ABBREV,
    TOP_LEVEL_CODE_WIDTH, UNABBREV_RECORD,
};
use crate::{Result, SerializationError};

#[derive(Clone)]
struct CursorScope {
    prev_code_width: u32,
    prev_abbrevs: Vec<Arc<Abbrev>>,
    end_bit: u64,
}

/// Read position in a bitstream.
///
/// Cloning is cheap: the buffer and abbreviations are shared. A clone made
/// inside a block keeps that block's abbreviations, so it can later jump to
/// any record offset in the block and decode it.
#[derive(Clone)]
pub struct BitstreamCursor {
    data: Arc<[u8]>,
    bit: u64,
    code_width: u32,
    abbrevs: Vec<Arc<Abbrev>>,
    scopes: Vec<CursorScope>,
}

impl BitstreamCursor {
    pub fn new(data: Arc<[u8]>) -> Self {
        BitstreamCursor {
            data,
            bit: 0,
            code_width: TOP_LEVEL_CODE_WIDTH,
            abbrevs: Vec::new(),
            scopes: Vec::new(),
        }
    }

    #[inline]
    fn size_in_bits(&self) -> u64 {
        self.data.len() as u64 * 8
    }

    #[inline]
    pub fn current_bit(&self) -> u64 {
        self.bit
    }

    #[inline]
    pub fn at_end(&self) -> bool {
        self.bit >= self.size_in_bits()
    }

    /// Nesting depth of the block the cursor is in (0 at top level).
    #[inline]
    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    pub fn jump_to_bit(&mut self, bit: u64) -> Result<()> {
        if bit > self.size_in_bits() {
            return Err(SerializationError::UnexpectedEof { bit });
        }
        self.bit = bit;
        Ok(())
    }

    /// Read `width` bits, LSB first.
    pub fn read(&mut self, width: u32) -> Result<u64> {
        debug_assert!(width <= 64, "read width {width} exceeds 64 bits");
        if self.bit + u64::from(width) > self.size_in_bits() {
            return Err(SerializationError::UnexpectedEof { bit: self.bit });
        }
        let mut result = 0u64;
        let mut got = 0;
        while got < width {
            let byte = self.data[(self.bit / 8) as usize];
            let offset = (self.bit % 8) as u32;
            let take = (8 - offset).min(width - got);
            let chunk = (u64::from(byte) >> offset) & ((1u64 << take) - 1);
            result |= chunk << got;
            got += take;
            self.bit += u64::from(take);
        }
        Ok(result)
    }

    pub fn read_vbr(&mut self, width: u32) -> Result<u32> {
        let v = self.read_vbr64(width)?;
        u32::try_from(v)
            .map_err(|_| SerializationError::malformed(format!("VBR value {v} exceeds 32 bits")))
    }

    pub fn read_vbr64(&mut self, width: u32) -> Result<u64> {
        if width < 2 {
            return Err(SerializationError::malformed(format!("VBR width {width} is too small")));
        }
        let hi = 1u64 << (width - 1);
        let mut result = 0u64;
        let mut shift = 0u32;
        loop {
            let piece = self.read(width)?;
            result |= (piece & (hi - 1)) << shift;
            if piece & hi == 0 {
                return Ok(result);
            }
            shift += width - 1;
            if shift >= 64 {
                return Err(SerializationError::malformed("VBR value exceeds 64 bits"));
            }
        }
    }

    #[inline]
    pub fn read_code(&mut self) -> Result<u32> {
        Ok(self.read(self.code_width)? as u32)
    }

    fn align32(&mut self) {
        self.bit = (self.bit + 31) & !31;
    }

    /// Read the next structural entry. Abbreviation definitions are
    /// consumed here and never surface.
    pub fn advance(&mut self) -> Result<Entry> {
        loop {
            match self.read_code()? {
                END_BLOCK => {
                    self.align32();
                    let scope = self
                        .scopes
                        .pop()
                        .ok_or_else(|| SerializationError::malformed("END_BLOCK at top level"))?;
                    self.code_width = scope.prev_code_width;
                    self.abbrevs = scope.prev_abbrevs;
                    return Ok(Entry::EndBlock);
                }
                ENTER_SUBBLOCK => return Ok(Entry::SubBlock(self.read_vbr(8)?)),
                DEFINE_ABBREV => self.read_abbrev_definition()?,
                id => return Ok(Entry::Record(id)),
            }
        }
    }

    /// Enter the block whose ID [`advance`](Self::advance) just returned.
    pub fn enter_subblock(&mut self) -> Result<()> {
        let width = self.read_vbr(4)?;
        if !(1..=32).contains(&width) {
            return Err(SerializationError::malformed(format!(
                "block abbreviation width {width} out of range"
            )));
        }
        self.align32();
        let words = self.read(32)?;
        let end_bit = self.bit + words * 32;
        if end_bit > self.size_in_bits() {
            return Err(SerializationError::UnexpectedEof { bit: end_bit });
        }
        self.scopes.push(CursorScope {
            prev_code_width: self.code_width,
            prev_abbrevs: std::mem::take(&mut self.abbrevs),
            end_bit,
        });
        self.code_width = width;
        Ok(())
    }

    /// Skip the block whose ID [`advance`](Self::advance) just returned.
    pub fn skip_block(&mut self) -> Result<()> {
        self.read_vbr(4)?;
        self.align32();
        let words = self.read(32)?;
        self.jump_to_bit(self.bit + words * 32)
    }

    /// Leave the current block without reading the rest of it.
    pub fn leave_block(&mut self) -> Result<()> {
        let scope = self
            .scopes
            .pop()
            .ok_or_else(|| SerializationError::malformed("no block to leave"))?;
        self.bit = scope.end_bit;
        self.code_width = scope.prev_code_width;
        self.abbrevs = scope.prev_abbrevs;
        Ok(())
    }

    /// Consume the abbreviation definitions at the current position and
    /// stop before the first entry that is not one.
    pub fn read_abbrevs(&mut self) -> Result<()> {
        loop {
            let start = self.bit;
            if self.at_end() || self.read_code()? != DEFINE_ABBREV {
                self.bit = start;
                return Ok(());
            }
            self.read_abbrev_definition()?;
        }
    }

    fn read_abbrev_definition(&mut self) -> Result<()> {
        let num_ops = self.read_vbr(5)?;
        let mut ops: SmallVec<[AbbrevOp; 8]> = SmallVec::new();
        for _ in 0..num_ops {
            if self.read(1)? == 1 {
                ops.push(AbbrevOp::Literal(self.read_vbr64(8)?));
                continue;
            }
            let op = match self.read(3)? {
                AbbrevOp::ENCODING_FIXED => AbbrevOp::Fixed(self.read_vbr(5)?),
                AbbrevOp::ENCODING_VBR => AbbrevOp::Vbr(self.read_vbr(5)?),
                AbbrevOp::ENCODING_ARRAY => AbbrevOp::Array,
                AbbrevOp::ENCODING_CHAR6 => AbbrevOp::Char6,
                AbbrevOp::ENCODING_BLOB => AbbrevOp::Blob,
                other => {
                    return Err(SerializationError::malformed(format!(
                        "unknown abbreviation operand encoding {other}"
                    )))
                }
            };
            if let AbbrevOp::Fixed(w) | AbbrevOp::Vbr(w) = op {
                if w > 64 || (matches!(op, AbbrevOp::Vbr(_)) && w < 2) {
                    return Err(SerializationError::malformed(format!(
                        "abbreviation operand width {w} out of range"
                    )));
                }
            }
            ops.push(op);
        }
        self.abbrevs.push(Arc::new(Abbrev::from_ops(ops)));
        Ok(())
    }

    /// Decode the record introduced by `abbrev_id`.
    pub fn read_record(&mut self, abbrev_id: u32) -> Result<Record> {
        if abbrev_id == UNABBREV_RECORD {
            let code = self.read_vbr(6)?;
            let count = self.read_vbr(6)?;
            self.check_room(u64::from(count) * 6)?;
            let mut values = Vec::with_capacity(count as usize);
            for _ in 0..count {
                values.push(self.read_vbr64(6)?);
            }
            return Ok(Record {
                code,
                values,
                blob: None,
            });
        }

        let abbrev = abbrev_id
            .checked_sub(FIRST_APPLICATION_ABBREV)
            .and_then(|i| self.abbrevs.get(i as usize))
            .cloned()
            .ok_or_else(|| {
                SerializationError::malformed(format!("abbreviation {abbrev_id} is not defined"))
            })?;
        let ops = abbrev.ops();
        let mut fields = Vec::with_capacity(ops.len());
        let mut blob = None;
        let mut i = 0;
        while i < ops.len() {
            match ops[i] {
                AbbrevOp::Array => {
                    let elt = *ops.get(i + 1).ok_or_else(|| {
                        SerializationError::malformed("array operand without element type")
                    })?;
                    let count = self.read_vbr(6)?;
                    self.check_room(u64::from(count))?;
                    for _ in 0..count {
                        fields.push(self.read_scalar(elt)?);
                    }
                    i += 2;
                }
                AbbrevOp::Blob => {
                    let len = self.read_vbr(6)?;
                    self.align32();
                    self.check_room(u64::from(len) * 8)?;
                    let start = (self.bit / 8) as usize;
                    blob = Some(self.data[start..start + len as usize].to_vec());
                    self.bit += u64::from(len) * 8;
                    self.align32();
                    i += 1;
                }
                op => {
                    fields.push(self.read_scalar(op)?);
                    i += 1;
                }
            }
        }
        if fields.is_empty() {
            return Err(SerializationError::malformed(format!(
                "abbreviation {abbrev_id} has no record code"
            )));
        }
        let code = u32::try_from(fields.remove(0))
            .map_err(|_| SerializationError::malformed("record code exceeds 32 bits"))?;
        Ok(Record {
            code,
            values: fields,
            blob,
        })
    }

    /// Read the next entry, which must be a record.
    pub fn read_next_record(&mut self) -> Result<Record> {
        match self.advance()? {
            Entry::Record(id) => self.read_record(id),
            Entry::EndBlock => {
                Err(SerializationError::malformed("expected a record, found END_BLOCK"))
            }
            Entry::SubBlock(id) => Err(SerializationError::malformed(format!(
                "expected a record, found block {id}"
            ))),
        }
    }

    fn read_scalar(&mut self, op: AbbrevOp) -> Result<u64> {
        match op {
            AbbrevOp::Literal(v) => Ok(v),
            AbbrevOp::Fixed(w) => self.read(w),
            AbbrevOp::Vbr(w) => self.read_vbr64(w),
            AbbrevOp::Char6 => Ok(u64::from(decode_char6(self.read(6)?))),
            AbbrevOp::Array | AbbrevOp::Blob => Err(SerializationError::malformed(format!(
                "{op:?} cannot be an array element"
            ))),
        }
    }

    fn check_room(&self, bits: u64) -> Result<()> {
        if self.bit.saturating_add(bits) > self.size_in_bits() {
            Err(SerializationError::UnexpectedEof { bit: self.bit })
        } else {
            Ok(())
        }
    }
}

/// Restores a cursor's bit position when dropped.
///
/// Every out-of-line read (a decl record, a lazily loaded body) jumps
/// through one of these, so the enclosing reader resumes where it was no
/// matter how the nested read exits.
pub struct SavedStreamPosition<'c> {
    cursor: &'c mut BitstreamCursor,
    saved: u64,
}

impl<'c> SavedStreamPosition<'c> {
    pub fn new(cursor: &'c mut BitstreamCursor) -> Self {
        let saved = cursor.current_bit();
        Self { cursor, saved }
    }
}

impl Deref for SavedStreamPosition<'_> {
    type Target = BitstreamCursor;

    fn deref(&self) -> &BitstreamCursor {
        &*self.cursor
    }
}

impl DerefMut for SavedStreamPosition<'_> {
    fn deref_mut(&mut self) -> &mut BitstreamCursor {
        &mut *self.cursor
    }
}

impl Drop for SavedStreamPosition<'_> {
    fn drop(&mut self) {
        self.cursor.bit = self.saved;
    }
}
