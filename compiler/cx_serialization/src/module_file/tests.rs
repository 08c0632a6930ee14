#![allow(clippy::unwrap_used, clippy::expect_used, reason = "Tests can panic")]

use std::sync::Arc;

use pretty_assertions::assert_eq;

use super::*;
use crate::bitstream::{Abbrev, AbbrevOp, BitstreamWriter};

/// Smallest file `parse` accepts: a control block and an empty AST block.
fn minimal_file(name: &str, major: u32, extra_ast: impl FnOnce(&mut BitstreamWriter)) -> Arc<[u8]> {
    let mut w = BitstreamWriter::new();
    for b in codes::SIGNATURE {
        w.emit(u32::from(b), 8);
    }
    w.enter_subblock(codes::CONTROL_BLOCK_ID, 3);
    w.emit_record(control::METADATA, &[u64::from(major), 0, u64::from(ModuleKind::Module.raw())]);
    let name: Vec<u64> = name.bytes().map(u64::from).collect();
    w.emit_record(control::MODULE_NAME, &name);
    w.exit_block();
    w.enter_subblock(codes::AST_BLOCK_ID, 4);
    w.emit_record(ast::ID_SPACES, &[0; IdSpaceKind::COUNT * 2]);
    extra_ast(&mut w);
    w.exit_block();
    Arc::from(w.finish())
}

#[test]
fn parses_header_and_name() {
    let file = ModuleFile::parse(minimal_file("core", codes::VERSION_MAJOR, |_| {})).unwrap();
    assert_eq!(file.name, "core");
    assert_eq!(file.kind, ModuleKind::Module);
    assert_eq!(file.version, (codes::VERSION_MAJOR, 0));
    assert!(file.imports.is_empty());
    assert_eq!(file.num_top_level_decls(), 0);
}

#[test]
fn peek_name_reads_only_the_control_block() {
    let mut bytes = minimal_file("peeked", codes::VERSION_MAJOR, |_| {}).to_vec();
    // Corrupt everything after the control block; peeking must not care.
    let len = bytes.len();
    bytes[len - 4..].fill(0xFF);
    assert_eq!(ModuleFile::peek_name(Arc::from(bytes)).unwrap(), "peeked");
}

#[test]
fn wrong_signature_is_rejected() {
    let err = ModuleFile::parse(Arc::from(b"NOPE\0\0\0\0".to_vec())).unwrap_err();
    assert!(matches!(err, SerializationError::BadSignature { found, .. } if found == b"NOPE"));

    let err = ModuleFile::parse(Arc::from(b"CP".to_vec())).unwrap_err();
    assert!(matches!(err, SerializationError::BadSignature { found, .. } if found == b"CP"));
}

#[test]
fn other_major_version_is_rejected() {
    let err = ModuleFile::parse(minimal_file("old", codes::VERSION_MAJOR + 1, |_| {})).unwrap_err();
    assert!(matches!(
        err,
        SerializationError::VersionMismatch { found_major, .. }
            if found_major == codes::VERSION_MAJOR + 1
    ));
}

#[test]
fn table_length_must_match_declared_count() {
    let bytes = minimal_file("short", codes::VERSION_MAJOR, |w| {
        // Overrides the zeroed ID space record: 2 decls declared, none stored.
        let mut spaces = [0u64; IdSpaceKind::COUNT * 2];
        spaces[0] = 2;
        spaces[1] = 2;
        w.emit_record(ast::ID_SPACES, &spaces);
    });
    let err = ModuleFile::parse(bytes).unwrap_err();
    assert!(matches!(err, SerializationError::MalformedBlock { .. }), "{err}");
}

#[test]
fn unknown_ast_record_is_malformed() {
    let bytes = minimal_file("odd", codes::VERSION_MAJOR, |w| w.emit_record(900, &[1]));
    assert!(matches!(
        ModuleFile::parse(bytes),
        Err(SerializationError::MalformedBlock { .. })
    ));
}

#[test]
fn identifier_table_and_lookup_are_decoded() {
    let bytes = minimal_file("names", codes::VERSION_MAJOR, |w| {
        let mut spaces = [0u64; IdSpaceKind::COUNT * 2];
        let ident = IdSpaceKind::Identifier.index() * 2;
        spaces[ident] = 1;
        spaces[ident + 1] = 2;
        w.emit_record(ast::ID_SPACES, &spaces);
        let blob = w.emit_abbrev(Abbrev::new(&[
            AbbrevOp::Literal(u64::from(ast::IDENTIFIER_TABLE)),
            AbbrevOp::Vbr(6),
            AbbrevOp::Blob,
        ]));
        w.emit_record_with_blob(blob, ast::IDENTIFIER_TABLE, &[2], &join_names(["alpha", "beta"]));
        let lookup = w.emit_abbrev(Abbrev::new(&[
            AbbrevOp::Literal(u64::from(ast::NAME_LOOKUP)),
            AbbrevOp::Vbr(6),
            AbbrevOp::Blob,
        ]));
        w.emit_record_with_blob(lookup, ast::NAME_LOOKUP, &[1], &join_names(["alpha"]));
        w.emit_record(ast::LOOKUP_DECLS, &[2, 5, 6]);
    });
    let file = ModuleFile::parse(bytes).unwrap();
    assert_eq!(file.identifiers, vec!["alpha".to_owned(), "beta".to_owned()]);
    assert_eq!(file.lookup.get("alpha"), Some(&vec![5, 6]));
}

#[test]
fn lookup_names_without_decls_are_malformed() {
    let bytes = minimal_file("half", codes::VERSION_MAJOR, |w| {
        let lookup = w.emit_abbrev(Abbrev::new(&[
            AbbrevOp::Literal(u64::from(ast::NAME_LOOKUP)),
            AbbrevOp::Vbr(6),
            AbbrevOp::Blob,
        ]));
        w.emit_record_with_blob(lookup, ast::NAME_LOOKUP, &[1], &join_names(["x"]));
    });
    assert!(ModuleFile::parse(bytes).is_err());
}

#[test]
fn id_space_resolution() {
    let mut space = IdSpace {
        base: 40,
        local_base: 2,
        count: 3,
        remap: ContinuousRangeMap::new(),
    };
    space.remap.insert(2, RemapEntry { target: 40, len: 3 });
    space.remap.insert(10, RemapEntry { target: 2, len: 4 });

    assert_eq!(space.resolve(IdSpaceKind::Decl, 1).unwrap(), 1);
    assert_eq!(space.resolve(IdSpaceKind::Decl, 2).unwrap(), 40);
    assert_eq!(space.resolve(IdSpaceKind::Decl, 4).unwrap(), 42);
    assert_eq!(space.resolve(IdSpaceKind::Decl, 13).unwrap(), 5);
    assert!(matches!(
        space.resolve(IdSpaceKind::Decl, 5),
        Err(SerializationError::UnknownGlobalId { id: 5, .. })
    ));
    assert!(space.resolve(IdSpaceKind::Decl, 14).is_err());

    assert_eq!(space.local_index(41), Some(1));
    assert_eq!(space.local_index(43), None);
    assert_eq!(space.local_index(3), None);
}

#[test]
fn names_blob_rejects_truncation_and_trailing_bytes() {
    assert_eq!(split_names(b"a\0bc\0", 2).unwrap(), vec!["a", "bc"]);
    assert!(split_names(b"a\0bc", 2).is_err());
    assert!(split_names(b"a\0bc\0d", 2).is_err());
    assert_eq!(split_names(b"", 0).unwrap(), Vec::<String>::new());
}

#[test]
fn module_kind_raw_values() {
    for kind in ModuleKind::ALL {
        assert_eq!(ModuleKind::from_raw(u64::from(kind.raw())), Some(kind));
    }
    assert_eq!(ModuleKind::from_raw(4), None);
    assert_eq!(ModuleKind::MainFile.to_string(), "main-file");
}
