//! Bit-level emission.

use super::abbrev::{encode_char6, Abbrev, AbbrevOp};
use super::{
    DEFINE_ABBREV, END_BLOCK, ENTER_SUBBLOCK, FIRST_APPLICATION_ABBREV, TOP_LEVEL_CODE_WIDTH,
    UNABBREV_RECORD,
};

struct BlockScope {
    prev_code_width: u32,
    /// Index of the placeholder word that receives the block length.
    size_word: usize,
    prev_abbrevs: Vec<Abbrev>,
}

/// Appends bits LSB-first into little-endian 32-bit words.
pub struct BitstreamWriter {
    words: Vec<u32>,
    cur_word: u32,
    cur_bit: u32,
    code_width: u32,
    abbrevs: Vec<Abbrev>,
    scopes: Vec<BlockScope>,
}

impl Default for BitstreamWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl BitstreamWriter {
    pub fn new() -> Self {
        BitstreamWriter {
            words: Vec::with_capacity(1024),
            cur_word: 0,
            cur_bit: 0,
            code_width: TOP_LEVEL_CODE_WIDTH,
            abbrevs: Vec::new(),
            scopes: Vec::new(),
        }
    }

    /// Absolute position of the next bit to be written.
    #[inline]
    pub fn current_bit(&self) -> u64 {
        self.words.len() as u64 * 32 + u64::from(self.cur_bit)
    }

    /// Emit the low `width` bits of `val`.
    ///
    /// # Panics
    /// Panics if `width > 32` or `val` does not fit in `width` bits.
    pub fn emit(&mut self, val: u32, width: u32) {
        assert!(width <= 32, "fixed field width {width} exceeds 32 bits");
        if width == 0 {
            return;
        }
        assert!(
            width == 32 || val >> width == 0,
            "value {val} does not fit in {width} bits"
        );
        let acc = u64::from(self.cur_word) | (u64::from(val) << self.cur_bit);
        let total = self.cur_bit + width;
        if total >= 32 {
            self.words.push(acc as u32);
            self.cur_word = (acc >> 32) as u32;
            self.cur_bit = total - 32;
        } else {
            self.cur_word = acc as u32;
            self.cur_bit = total;
        }
    }

    pub fn emit64(&mut self, val: u64, width: u32) {
        if width <= 32 {
            self.emit(val as u32, width);
        } else {
            self.emit(val as u32, 32);
            self.emit((val >> 32) as u32, width - 32);
        }
    }

    pub fn emit_vbr(&mut self, mut val: u32, width: u32) {
        let threshold = 1u32 << (width - 1);
        while val >= threshold {
            self.emit((val & (threshold - 1)) | threshold, width);
            val >>= width - 1;
        }
        self.emit(val, width);
    }

    pub fn emit_vbr64(&mut self, mut val: u64, width: u32) {
        if let Ok(small) = u32::try_from(val) {
            self.emit_vbr(small, width);
            return;
        }
        let threshold = 1u64 << (width - 1);
        while val >= threshold {
            self.emit(((val & (threshold - 1)) | threshold) as u32, width);
            val >>= width - 1;
        }
        self.emit(val as u32, width);
    }

    /// Pad with zero bits to the next 32-bit boundary.
    pub fn align32(&mut self) {
        if self.cur_bit > 0 {
            self.words.push(self.cur_word);
            self.cur_word = 0;
            self.cur_bit = 0;
        }
    }

    #[inline]
    fn emit_code(&mut self, code: u32) {
        self.emit(code, self.code_width);
    }

    pub fn enter_subblock(&mut self, block_id: u32, code_width: u32) {
        assert!(
            (1..=32).contains(&code_width),
            "abbreviation width {code_width} out of range"
        );
        self.emit_code(ENTER_SUBBLOCK);
        self.emit_vbr(block_id, 8);
        self.emit_vbr(code_width, 4);
        self.align32();
        let size_word = self.words.len();
        self.words.push(0);
        self.scopes.push(BlockScope {
            prev_code_width: self.code_width,
            size_word,
            prev_abbrevs: std::mem::take(&mut self.abbrevs),
        });
        self.code_width = code_width;
    }

    /// Close the innermost block and backpatch its length in words.
    ///
    /// # Panics
    /// Panics if no block is open.
    pub fn exit_block(&mut self) {
        self.emit_code(END_BLOCK);
        self.align32();
        let scope = self
            .scopes
            .pop()
            .unwrap_or_else(|| panic!("exit_block without a matching enter_subblock"));
        let size = self.words.len() - scope.size_word - 1;
        self.words[scope.size_word] = u32::try_from(size)
            .unwrap_or_else(|_| panic!("block of {size} words is too large"));
        self.code_width = scope.prev_code_width;
        self.abbrevs = scope.prev_abbrevs;
    }

    /// Define an abbreviation in the current block and return its ID.
    pub fn emit_abbrev(&mut self, abbrev: Abbrev) -> u32 {
        self.emit_code(DEFINE_ABBREV);
        self.emit_vbr(abbrev.ops().len() as u32, 5);
        for &op in abbrev.ops() {
            match op {
                AbbrevOp::Literal(v) => {
                    self.emit(1, 1);
                    self.emit_vbr64(v, 8);
                }
                AbbrevOp::Fixed(w) => {
                    self.emit(0, 1);
                    self.emit64(AbbrevOp::ENCODING_FIXED, 3);
                    self.emit_vbr(w, 5);
                }
                AbbrevOp::Vbr(w) => {
                    self.emit(0, 1);
                    self.emit64(AbbrevOp::ENCODING_VBR, 3);
                    self.emit_vbr(w, 5);
                }
                AbbrevOp::Array => {
                    self.emit(0, 1);
                    self.emit64(AbbrevOp::ENCODING_ARRAY, 3);
                }
                AbbrevOp::Char6 => {
                    self.emit(0, 1);
                    self.emit64(AbbrevOp::ENCODING_CHAR6, 3);
                }
                AbbrevOp::Blob => {
                    self.emit(0, 1);
                    self.emit64(AbbrevOp::ENCODING_BLOB, 3);
                }
            }
        }
        self.abbrevs.push(abbrev);
        self.abbrevs.len() as u32 - 1 + FIRST_APPLICATION_ABBREV
    }

    /// Emit a record without an abbreviation: code, count and every
    /// field as VBR6.
    pub fn emit_record(&mut self, code: u32, vals: &[u64]) {
        self.emit_code(UNABBREV_RECORD);
        self.emit_vbr(code, 6);
        self.emit_vbr(vals.len() as u32, 6);
        for &v in vals {
            self.emit_vbr64(v, 6);
        }
    }

    pub fn emit_record_with_abbrev(&mut self, abbrev_id: u32, code: u32, vals: &[u64]) {
        self.emit_abbreviated(abbrev_id, code, vals, None);
    }

    /// Emit a record whose abbreviation ends in a blob operand.
    pub fn emit_record_with_blob(&mut self, abbrev_id: u32, code: u32, vals: &[u64], blob: &[u8]) {
        self.emit_abbreviated(abbrev_id, code, vals, Some(blob));
    }

    fn emit_abbreviated(&mut self, abbrev_id: u32, code: u32, vals: &[u64], blob: Option<&[u8]>) {
        let index = abbrev_id
            .checked_sub(FIRST_APPLICATION_ABBREV)
            .map(|i| i as usize)
            .filter(|&i| i < self.abbrevs.len())
            .unwrap_or_else(|| panic!("abbreviation {abbrev_id} is not defined in this block"));
        let ops: Vec<AbbrevOp> = self.abbrevs[index].ops().to_vec();
        self.emit_code(abbrev_id);

        let mut fields = std::iter::once(u64::from(code)).chain(vals.iter().copied());
        let mut i = 0;
        while i < ops.len() {
            match ops[i] {
                AbbrevOp::Array => {
                    let elt = ops[i + 1];
                    let rest: Vec<u64> = fields.by_ref().collect();
                    self.emit_vbr(rest.len() as u32, 6);
                    for v in rest {
                        self.emit_scalar(elt, v);
                    }
                    i += 2;
                }
                AbbrevOp::Blob => {
                    let bytes = blob
                        .unwrap_or_else(|| panic!("abbreviation {abbrev_id} expects a blob"));
                    self.emit_vbr(bytes.len() as u32, 6);
                    self.align32();
                    for &b in bytes {
                        self.emit(u32::from(b), 8);
                    }
                    self.align32();
                    i += 1;
                }
                op => {
                    let v = fields.next().unwrap_or_else(|| {
                        panic!("record {code} is shorter than abbreviation {abbrev_id}")
                    });
                    self.emit_scalar(op, v);
                    i += 1;
                }
            }
        }
        assert!(
            fields.next().is_none(),
            "record {code} has more fields than abbreviation {abbrev_id}"
        );
    }

    fn emit_scalar(&mut self, op: AbbrevOp, v: u64) {
        match op {
            AbbrevOp::Literal(lit) => {
                assert_eq!(lit, v, "literal operand does not match the record field");
            }
            AbbrevOp::Fixed(w) => self.emit64(v, w),
            AbbrevOp::Vbr(w) => self.emit_vbr64(v, w),
            AbbrevOp::Char6 => self.emit(encode_char6(v as u8), 6),
            AbbrevOp::Array | AbbrevOp::Blob => {
                panic!("{op:?} cannot encode a single field")
            }
        }
    }

    /// Flush and return the stream as little-endian bytes.
    ///
    /// # Panics
    /// Panics if a block is still open.
    pub fn finish(mut self) -> Vec<u8> {
        assert!(self.scopes.is_empty(), "{} blocks left open", self.scopes.len());
        self.align32();
        let mut out = Vec::with_capacity(self.words.len() * 4);
        for w in self.words {
            out.extend_from_slice(&w.to_le_bytes());
        }
        out
    }
}
