#![allow(clippy::unwrap_used, clippy::expect_used, reason = "Tests can panic")]

use std::sync::Arc;

use pretty_assertions::assert_eq;
use proptest::prelude::*;

use super::*;

fn cursor(bytes: Vec<u8>) -> BitstreamCursor {
    BitstreamCursor::new(Arc::from(bytes))
}

#[test]
fn fixed_fields_pack_lsb_first() {
    let mut w = BitstreamWriter::new();
    w.emit(0b101, 3);
    w.emit(0b1, 1);
    w.emit(0xAB, 8);
    let bytes = w.finish();
    assert_eq!(bytes.len(), 4);
    assert_eq!(bytes[0], 0b1011_1101);
    assert_eq!(bytes[1], 0b0000_1010);

    let mut c = cursor(bytes);
    assert_eq!(c.read(3).unwrap(), 0b101);
    assert_eq!(c.read(1).unwrap(), 1);
    assert_eq!(c.read(8).unwrap(), 0xAB);
}

#[test]
fn vbr_chunks_carry_continuation_bits() {
    let mut w = BitstreamWriter::new();
    // 40 = 0b101000: low chunk 0b01000 with continuation, then 0b1.
    w.emit_vbr(40, 6);
    assert_eq!(w.current_bit(), 12);
    let mut c = cursor(w.finish());
    assert_eq!(c.read(6).unwrap(), 0b10_1000);
    assert_eq!(c.read(6).unwrap(), 0b00_0001);
}

#[test]
fn read_past_end_is_an_error() {
    let mut c = cursor(vec![0xFF]);
    assert_eq!(c.read(8).unwrap(), 0xFF);
    assert!(matches!(
        c.read(1),
        Err(SerializationError::UnexpectedEof { bit: 8 })
    ));
}

#[test]
fn overlong_vbr_is_malformed() {
    let mut c = cursor(vec![0xFF; 16]);
    assert!(matches!(
        c.read_vbr64(6),
        Err(SerializationError::MalformedBlock { .. })
    ));
}

#[test]
fn blocks_can_be_entered_or_skipped() {
    let mut w = BitstreamWriter::new();
    w.enter_subblock(8, 3);
    w.emit_record(1, &[10, 20, 30]);
    w.enter_subblock(9, 4);
    w.emit_record(7, &[u64::MAX]);
    w.exit_block();
    w.exit_block();
    w.enter_subblock(10, 3);
    w.emit_record(2, &[]);
    w.exit_block();
    let bytes = w.finish();

    let mut c = cursor(bytes.clone());
    assert_eq!(c.advance().unwrap(), Entry::SubBlock(8));
    c.enter_subblock().unwrap();
    assert_eq!(c.depth(), 1);
    let rec = c.read_next_record().unwrap();
    assert_eq!(rec.code, 1);
    assert_eq!(rec.values, vec![10, 20, 30]);
    assert_eq!(c.advance().unwrap(), Entry::SubBlock(9));
    c.enter_subblock().unwrap();
    assert_eq!(c.read_next_record().unwrap().values, vec![u64::MAX]);
    assert_eq!(c.advance().unwrap(), Entry::EndBlock);
    assert_eq!(c.advance().unwrap(), Entry::EndBlock);
    assert_eq!(c.depth(), 0);
    assert_eq!(c.advance().unwrap(), Entry::SubBlock(10));

    let mut skipping = cursor(bytes);
    assert_eq!(skipping.advance().unwrap(), Entry::SubBlock(8));
    skipping.skip_block().unwrap();
    assert_eq!(skipping.advance().unwrap(), Entry::SubBlock(10));
    skipping.enter_subblock().unwrap();
    assert_eq!(skipping.read_next_record().unwrap().code, 2);
    assert_eq!(skipping.advance().unwrap(), Entry::EndBlock);
    assert!(skipping.at_end());
}

#[test]
fn abbreviated_records_decode_like_unabbreviated_ones() {
    let mut w = BitstreamWriter::new();
    w.enter_subblock(8, 4);
    let fields = w.emit_abbrev(Abbrev::new(&[
        AbbrevOp::Literal(5),
        AbbrevOp::Fixed(3),
        AbbrevOp::Array,
        AbbrevOp::Vbr(6),
    ]));
    let name = w.emit_abbrev(Abbrev::new(&[
        AbbrevOp::Literal(6),
        AbbrevOp::Array,
        AbbrevOp::Char6,
    ]));
    let blob = w.emit_abbrev(Abbrev::new(&[
        AbbrevOp::Literal(7),
        AbbrevOp::Vbr(6),
        AbbrevOp::Blob,
    ]));
    assert_eq!((fields, name, blob), (4, 5, 6));
    w.emit_record_with_abbrev(fields, 5, &[6, 1, 2, 300]);
    let text: Vec<u64> = b"Mod_1.h".iter().map(|&b| u64::from(b)).collect();
    w.emit_record_with_abbrev(name, 6, &text);
    w.emit_record_with_blob(blob, 7, &[99], b"hello\0world");
    w.emit_record(8, &[1]);
    w.exit_block();

    let mut c = cursor(w.finish());
    assert_eq!(c.advance().unwrap(), Entry::SubBlock(8));
    c.enter_subblock().unwrap();
    let r = c.read_next_record().unwrap();
    assert_eq!((r.code, r.values), (5, vec![6, 1, 2, 300]));
    let r = c.read_next_record().unwrap();
    assert_eq!(r.code, 6);
    let decoded: Vec<u8> = r.values.iter().map(|&v| v as u8).collect();
    assert_eq!(decoded, b"Mod_1.h".to_vec());
    let r = c.read_next_record().unwrap();
    assert_eq!(r.values, vec![99]);
    assert_eq!(r.blob().unwrap(), b"hello\0world");
    assert_eq!(c.read_next_record().unwrap().code, 8);
}

#[test]
fn abbreviations_are_scoped_to_their_block() {
    let mut w = BitstreamWriter::new();
    w.enter_subblock(8, 4);
    let id = w.emit_abbrev(Abbrev::new(&[AbbrevOp::Literal(1), AbbrevOp::Vbr(6)]));
    w.enter_subblock(9, 4);
    w.emit_record(2, &[3]);
    w.exit_block();
    w.emit_record_with_abbrev(id, 1, &[42]);
    w.exit_block();

    let mut c = cursor(w.finish());
    c.advance().unwrap();
    c.enter_subblock().unwrap();
    assert_eq!(c.advance().unwrap(), Entry::SubBlock(9));
    c.enter_subblock().unwrap();
    assert!(c.read_record(4).is_err());
    assert_eq!(c.read_next_record().unwrap().values, vec![3]);
    assert_eq!(c.advance().unwrap(), Entry::EndBlock);
    assert_eq!(c.read_next_record().unwrap().values, vec![42]);
}

#[test]
fn read_abbrevs_then_jump_to_a_recorded_offset() {
    let mut w = BitstreamWriter::new();
    w.enter_subblock(13, 4);
    let id = w.emit_abbrev(Abbrev::new(&[
        AbbrevOp::Literal(40),
        AbbrevOp::Array,
        AbbrevOp::Vbr(6),
    ]));
    w.emit_record(1, &[0]);
    let offset = w.current_bit();
    w.emit_record_with_abbrev(id, 40, &[7, 8]);
    w.exit_block();
    w.enter_subblock(14, 2);
    w.exit_block();

    let mut c = cursor(w.finish());
    assert_eq!(c.advance().unwrap(), Entry::SubBlock(13));
    c.enter_subblock().unwrap();
    c.read_abbrevs().unwrap();
    let mut decls = c.clone();
    c.leave_block().unwrap();
    assert_eq!(c.advance().unwrap(), Entry::SubBlock(14));

    decls.jump_to_bit(offset).unwrap();
    let r = decls.read_next_record().unwrap();
    assert_eq!((r.code, r.values), (40, vec![7, 8]));
}

#[test]
fn saved_position_restores_on_drop() {
    let mut w = BitstreamWriter::new();
    for v in 0..8 {
        w.emit(v, 8);
    }
    let mut c = cursor(w.finish());
    c.read(8).unwrap();
    {
        let mut saved = SavedStreamPosition::new(&mut c);
        saved.jump_to_bit(40).unwrap();
        assert_eq!(saved.read(8).unwrap(), 5);
    }
    assert_eq!(c.current_bit(), 8);
    assert_eq!(c.read(8).unwrap(), 1);
}

#[test]
fn saved_position_restores_on_error() {
    let mut c = cursor(vec![1, 2, 3, 4]);
    let result: Result<u64> = (|| {
        let mut saved = SavedStreamPosition::new(&mut c);
        saved.read(16)?;
        saved.read(64)
    })();
    assert!(result.is_err());
    assert_eq!(c.current_bit(), 0);
}

#[test]
fn record_fields_check_length_and_ranges() {
    let values = [1, 0, 2, encode_signed(-5), u64::from(u32::MAX) + 1];
    let mut f = RecordFields::new(9, &values);
    assert!(f.next_bool().unwrap());
    assert!(!f.next_bool().unwrap());
    assert!(f.next_bool().is_err());
    assert_eq!(f.next_i64().unwrap(), -5);
    assert!(f.next_u32().is_err());
    assert!(f.is_exhausted());
    assert!(matches!(
        f.next_u64(),
        Err(SerializationError::RecordLengthMismatch {
            code: 9,
            expected: 6,
            found: 5
        })
    ));

    let mut partial = RecordFields::new(3, &values);
    partial.take(2).unwrap();
    assert!(matches!(
        partial.finish(),
        Err(SerializationError::RecordLengthMismatch {
            code: 3,
            expected: 2,
            found: 5
        })
    ));
    assert!(partial.take(10).is_err());
}

#[test]
fn list_count_cannot_exceed_the_fields_left() {
    let values = [2, 10, 11];
    let mut f = RecordFields::new(4, &values);
    assert_eq!(f.next_count().unwrap(), 2);

    let values = [u64::from(u32::MAX), 10, 11];
    let mut f = RecordFields::new(4, &values);
    assert!(matches!(f.next_count(), Err(SerializationError::MalformedBlock { .. })));
}

#[test]
fn end_block_at_top_level_is_malformed() {
    let mut w = BitstreamWriter::new();
    w.emit(END_BLOCK, TOP_LEVEL_CODE_WIDTH);
    let mut c = cursor(w.finish());
    assert!(matches!(
        c.advance(),
        Err(SerializationError::MalformedBlock { .. })
    ));
}

#[test]
fn char6_alphabet() {
    for c in b"azAZ09._".iter().copied() {
        assert!(is_char6(c));
        assert_eq!(decode_char6(u64::from(encode_char6(c))), c);
    }
    assert!(!is_char6(b'-'));
    assert!(!is_char6(b'/'));
}

#[test]
#[should_panic(expected = "blob operand must be last")]
fn blob_must_be_last() {
    let _ = Abbrev::new(&[AbbrevOp::Blob, AbbrevOp::Vbr(6)]);
}

proptest! {
    #[test]
    fn mixed_fields_round_trip(
        values in proptest::collection::vec((any::<u64>(), 2u32..=32, 1u32..=64), 1..40),
    ) {
        let mut w = BitstreamWriter::new();
        for &(v, vbr_width, fixed_width) in &values {
            w.emit_vbr64(v, vbr_width);
            let masked = if fixed_width == 64 { v } else { v & ((1u64 << fixed_width) - 1) };
            w.emit64(masked, fixed_width);
        }
        let mut c = cursor(w.finish());
        for &(v, vbr_width, fixed_width) in &values {
            prop_assert_eq!(c.read_vbr64(vbr_width).unwrap(), v);
            let masked = if fixed_width == 64 { v } else { v & ((1u64 << fixed_width) - 1) };
            prop_assert_eq!(c.read(fixed_width).unwrap(), masked);
        }
    }

    #[test]
    fn zigzag_round_trips(v in any::<i64>()) {
        prop_assert_eq!(decode_signed(encode_signed(v)), v);
    }

    #[test]
    fn records_round_trip(
        code in 0u32..10_000,
        vals in proptest::collection::vec(any::<u64>(), 0..30),
    ) {
        let mut w = BitstreamWriter::new();
        w.enter_subblock(8, 3);
        w.emit_record(code, &vals);
        w.exit_block();
        let mut c = cursor(w.finish());
        prop_assert_eq!(c.advance().unwrap(), Entry::SubBlock(8));
        c.enter_subblock().unwrap();
        let rec = c.read_next_record().unwrap();
        prop_assert_eq!(rec.code, code);
        prop_assert_eq!(rec.values, vals);
    }
}
